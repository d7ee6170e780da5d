use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Binary authenticity classification shown to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Genuine,
    Counterfeit,
}

impl Verdict {
    /// Token whose presence in the service status marks a part as genuine.
    pub const PASS_TOKEN: &'static str = "PASS";

    /// Classifies a free-text status from the scan service.
    ///
    /// The service does not publish a closed set of statuses. Any status
    /// containing `PASS` (case-sensitive, anywhere in the string) is genuine
    /// and everything else is counterfeit, including statuses such as
    /// `PENDING` that are not verdicts at all.
    pub fn from_status(status: &str) -> Self {
        if status.contains(Self::PASS_TOKEN) {
            Verdict::Genuine
        } else {
            Verdict::Counterfeit
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Genuine => "GENUINE",
            Verdict::Counterfeit => "COUNTERFEIT",
        }
    }

    pub fn is_genuine(&self) -> bool {
        matches!(self, Verdict::Genuine)
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of a successful `POST /api/v1/scan-ic`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResponse {
    pub file_id: String,
    pub part_number: String,
    pub status: String,
    pub confidence: f64,
    #[serde(default)]
    pub issues: Option<Vec<String>>,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub detected_data: Option<DetectedData>,
}

/// Optional detection details reported alongside a verdict.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectedData {
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub expected_logo: Option<String>,
    #[serde(default)]
    pub image_quality: Option<String>,
    #[serde(default, deserialize_with = "lenient_texts")]
    pub detected_texts: Option<Vec<String>>,
}

/// `detected_texts` is only meaningful as a list of strings; any other shape
/// is treated as absent rather than failing the whole response.
fn lenient_texts<'de, D>(
    deserializer: D,
) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Array(items)) => Some(
            items
                .into_iter()
                .map(|item| match item {
                    serde_json::Value::String(text) => text,
                    other => other.to_string(),
                })
                .collect(),
        ),
        _ => None,
    })
}

/// Detection fields as held by the client. Empty strings from the service
/// are normalised to `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetectedFields {
    pub manufacturer: Option<String>,
    pub expected_logo: Option<String>,
    pub image_quality: Option<String>,
    pub detected_texts: Option<Vec<String>>,
}

impl From<DetectedData> for DetectedFields {
    fn from(data: DetectedData) -> Self {
        fn non_empty(value: Option<String>) -> Option<String> {
            value.filter(|v| !v.is_empty())
        }

        Self {
            manufacturer: non_empty(data.manufacturer),
            expected_logo: non_empty(data.expected_logo),
            image_quality: non_empty(data.image_quality),
            detected_texts: data.detected_texts,
        }
    }
}

/// Outcome of one successful submission, replaced wholesale by the next.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanResult {
    pub scan_id: String,
    pub part_number: String,
    pub verdict: Verdict,
    /// Percentage as received; display rounds to two decimals.
    pub confidence: f64,
    pub issues: Vec<String>,
    pub explanation: String,
    pub detected_fields: DetectedFields,
    pub observed_at: DateTime<Utc>,
}

impl ScanResult {
    pub fn from_response(
        response: ScanResponse,
        observed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            verdict: Verdict::from_status(&response.status),
            scan_id: response.file_id,
            part_number: response.part_number,
            confidence: response.confidence,
            issues: response.issues.unwrap_or_default(),
            explanation: response.explanation.unwrap_or_default(),
            detected_fields: response
                .detected_data
                .map(DetectedFields::from)
                .unwrap_or_default(),
            observed_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pass_substring_is_genuine() {
        assert_eq!(Verdict::from_status("PASS"), Verdict::Genuine);
        assert_eq!(
            Verdict::from_status("PASS-with-minor-flags"),
            Verdict::Genuine
        );
        assert_eq!(Verdict::from_status("BYPASS"), Verdict::Genuine);
    }

    #[test]
    fn everything_else_is_counterfeit() {
        assert_eq!(Verdict::from_status("FAIL"), Verdict::Counterfeit);
        assert_eq!(Verdict::from_status("PENDING"), Verdict::Counterfeit);
        assert_eq!(Verdict::from_status(""), Verdict::Counterfeit);
        // Case-sensitive as received.
        assert_eq!(Verdict::from_status("pass"), Verdict::Counterfeit);
    }

    #[test]
    fn minimal_response_fills_defaults() {
        let response: ScanResponse = serde_json::from_str(
            r#"{"file_id":"abc","part_number":"NE555DR",
                "status":"FAIL","confidence":12.5}"#,
        )
        .unwrap();
        let result = ScanResult::from_response(response, Utc::now());

        assert_eq!(result.verdict, Verdict::Counterfeit);
        assert!(result.issues.is_empty());
        assert!(result.explanation.is_empty());
        assert_eq!(result.detected_fields, DetectedFields::default());
    }

    #[test]
    fn missing_status_is_malformed() {
        let parsed = serde_json::from_str::<ScanResponse>(
            r#"{"file_id":"abc","part_number":"NE555DR","confidence":12.5}"#,
        );
        assert!(parsed.is_err());
    }

    #[test]
    fn non_list_detected_texts_is_absent() {
        let data: DetectedData = serde_json::from_str(
            r#"{"manufacturer":"TI","detected_texts":"NE555"}"#,
        )
        .unwrap();
        assert_eq!(data.manufacturer.as_deref(), Some("TI"));
        assert!(data.detected_texts.is_none());
    }

    #[test]
    fn empty_strings_become_absent_fields() {
        let fields = DetectedFields::from(DetectedData {
            manufacturer: Some(String::new()),
            expected_logo: Some("TI".into()),
            image_quality: None,
            detected_texts: Some(vec!["NE555".into()]),
        });
        assert!(fields.manufacturer.is_none());
        assert_eq!(fields.expected_logo.as_deref(), Some("TI"));
        assert_eq!(fields.detected_texts, Some(vec!["NE555".to_string()]));
    }
}
