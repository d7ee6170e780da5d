//! Drives the reqwest client against an in-process scan service.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::extract::{Multipart, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use markguard_core::{
    ApiClient, ClientConfig, ClientError, ScanService, ScanSession,
};
use markguard_model::{
    AggregateStats, ImageUpload, PendingSubmission, ScanHistoryPage, Verdict,
};
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Default)]
struct ServiceState {
    stats: AggregateStats,
    uploads: Vec<(String, Option<String>, usize)>,
    history_queries: Vec<(u32, u32)>,
}

type Shared = Arc<Mutex<ServiceState>>;

async fn stats(State(state): State<Shared>) -> Json<AggregateStats> {
    Json(state.lock().stats)
}

async fn scan(
    State(state): State<Shared>,
    mut multipart: Multipart,
) -> Response {
    let mut part_number = None;
    let mut file_name = None;
    let mut file_len = None;
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                file_name = field.file_name().map(str::to_string);
                file_len = field.bytes().await.ok().map(|b| b.len());
            }
            Some("part_number") => part_number = field.text().await.ok(),
            _ => {}
        }
    }
    let (Some(part_number), Some(file_len)) = (part_number, file_len) else {
        return StatusCode::UNPROCESSABLE_ENTITY.into_response();
    };

    match part_number.as_str() {
        "BOOM" => return StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        "GARBLED" => return (StatusCode::OK, "not json").into_response(),
        _ => {}
    }

    let genuine = part_number.starts_with("NE");
    {
        let mut state = state.lock();
        state
            .uploads
            .push((part_number.clone(), file_name, file_len));
        state.stats.total_scanned += 1;
        if genuine {
            state.stats.genuine += 1;
        } else {
            state.stats.counterfeit += 1;
        }
        state.stats.yield_rate = state.stats.genuine as f64 * 100.0
            / state.stats.total_scanned as f64;
    }

    let body = if genuine {
        json!({
            "file_id": "9b1f6c2a-1111-2222-3333-444455556666",
            "part_number": part_number,
            "status": "PASS",
            "confidence": 93.127,
            "explanation": "Marking and logo consistent with manufacturer.",
            "detected_data": {
                "manufacturer": "Texas Instruments",
                "expected_logo": "TI",
                "image_quality": "Good",
                "detected_texts": ["NE555", "TI"]
            }
        })
    } else {
        json!({
            "file_id": "0c4d7e8f-aaaa-bbbb-cccc-ddddeeeeffff",
            "part_number": part_number,
            "status": "FAIL",
            "confidence": 41.5,
            "issues": ["Logo mismatch", "Blacktopping detected"]
        })
    };
    Json(body).into_response()
}

#[derive(Deserialize)]
struct HistoryQuery {
    page: u32,
    limit: u32,
}

async fn history(
    State(state): State<Shared>,
    Query(query): Query<HistoryQuery>,
) -> Json<serde_json::Value> {
    state.lock().history_queries.push((query.page, query.limit));
    Json(json!({ "scans": [], "total": 0 }))
}

async fn serve() -> Result<(String, Shared)> {
    let state = Shared::default();
    let app = Router::new()
        .route("/api/v1/stats", get(stats))
        .route("/api/v1/scan-ic", post(scan))
        .route("/api/v1/history", get(history))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}"), state))
}

fn submission(part_number: &str) -> PendingSubmission {
    PendingSubmission {
        image: ImageUpload::new("chip.png", vec![0x89, 0x50, 0x4e, 0x47]),
        part_number: part_number.to_string(),
    }
}

async fn client(base_url: &str) -> Result<ApiClient> {
    Ok(ApiClient::new(&ClientConfig::with_base_url(base_url)?)?)
}

#[tokio::test]
async fn scan_posts_multipart_and_decodes_verdict() -> Result<()> {
    let (base_url, state) = serve().await?;
    let api = client(&base_url).await?;

    let response = api.submit_scan(&submission("NE555DR")).await?;
    assert_eq!(Verdict::from_status(&response.status), Verdict::Genuine);
    assert_eq!(response.confidence, 93.127);

    let uploads = state.lock().uploads.clone();
    assert_eq!(
        uploads,
        vec![("NE555DR".to_string(), Some("chip.png".to_string()), 4)]
    );

    let stats = api.fetch_stats().await?;
    assert_eq!(stats.total_scanned, 1);
    assert_eq!(stats.genuine, 1);
    assert_eq!(stats.yield_rate, 100.0);
    Ok(())
}

#[tokio::test]
async fn server_error_is_a_status_failure() -> Result<()> {
    let (base_url, state) = serve().await?;
    let api = client(&base_url).await?;

    let err = api.submit_scan(&submission("BOOM")).await.unwrap_err();

    assert!(matches!(
        err,
        ClientError::Status { status, .. } if status.as_u16() == 500
    ));
    assert_eq!(state.lock().stats.total_scanned, 0);
    Ok(())
}

#[tokio::test]
async fn malformed_success_body_is_a_failure() -> Result<()> {
    let (base_url, _state) = serve().await?;
    let api = client(&base_url).await?;

    let err = api.submit_scan(&submission("GARBLED")).await.unwrap_err();

    assert!(matches!(err, ClientError::Decode(_)));
    Ok(())
}

#[tokio::test]
async fn unreachable_service_is_a_transport_failure() -> Result<()> {
    // Bind and drop to get a port nothing listens on.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
        listener.local_addr()?.port()
    };
    let api = client(&format!("127.0.0.1:{port}")).await?;

    let err = api.fetch_stats().await.unwrap_err();

    assert!(matches!(err, ClientError::Transport(_)));
    Ok(())
}

#[tokio::test]
async fn history_sends_paging_query() -> Result<()> {
    let (base_url, state) = serve().await?;
    let api = client(&base_url).await?;

    let page = api
        .fetch_history(
            ScanHistoryPage::DEFAULT_PAGE,
            ScanHistoryPage::DEFAULT_LIMIT,
        )
        .await?;

    assert!(page.is_empty());
    assert_eq!(state.lock().history_queries, vec![(1, 10)]);
    Ok(())
}

#[tokio::test]
async fn session_dashboard_follows_a_counterfeit_scan() -> Result<()> {
    let (base_url, _state) = serve().await?;
    let config = ClientConfig::with_base_url(&base_url)?;
    let session = ScanSession::start(&config)?;
    let mut stats = session.subscribe_stats();

    session.select_image(ImageUpload::new("fake.jpg", vec![1, 2, 3]));
    session.set_part_number("LM358");
    let result = session.orchestrator().submit().await?;

    assert_eq!(result.verdict, Verdict::Counterfeit);
    assert_eq!(result.issues.len(), 2);
    assert!(result.detected_fields.manufacturer.is_none());

    // The burst lands well before the next periodic tick.
    tokio::time::timeout(
        Duration::from_millis(1500),
        stats.wait_for(|snapshot| snapshot.stats.counterfeit == 1),
    )
    .await??;
    assert_eq!(session.synchronizer().snapshot().stats.total_scanned, 1);

    session.shutdown().await;
    Ok(())
}
