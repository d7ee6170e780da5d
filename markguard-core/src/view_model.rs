//! Display-ready projections of session state.
//!
//! View models turn model values into the exact strings the view shows, so
//! every renderer agrees on placeholders, rounding and grouping.

use chrono::Local;
use markguard_model::{ScanResult, StatsSnapshot, Verdict};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::orchestrator::SessionView;

pub const UNKNOWN: &str = "Unknown";
pub const NOT_AVAILABLE: &str = "N/A";
pub const NONE: &str = "None";

const SCAN_ID_PREFIX_LEN: usize = 8;
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Groups thousands with commas: `1234567` becomes `1,234,567`.
pub fn format_count(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Percentage exactly as received, without padding: `70%`, `66.67%`.
pub fn format_percent(value: f64) -> String {
    format!("{value}%")
}

const CONFIDENCE_DP: u32 = 2;

/// Two-decimal rounding used for confidence: `87.456` becomes `87.46`.
///
/// Rounds the exact value of the float, with exact midpoints going away
/// from zero (`87.125` becomes `87.13`).
pub fn format_confidence(value: f64) -> String {
    match Decimal::from_f64_retain(value) {
        Some(exact) => {
            let mut rounded = exact.round_dp_with_strategy(
                CONFIDENCE_DP,
                RoundingStrategy::MidpointAwayFromZero,
            );
            rounded.rescale(CONFIDENCE_DP);
            rounded.to_string()
        }
        // NaN and infinities
        None => format!("{value:.2}"),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardView {
    pub total_scanned: String,
    pub genuine: String,
    pub counterfeit: String,
    pub yield_rate: String,
    pub updated_at: Option<String>,
}

impl From<&StatsSnapshot> for DashboardView {
    fn from(snapshot: &StatsSnapshot) -> Self {
        let stats = &snapshot.stats;
        Self {
            total_scanned: format_count(stats.total_scanned),
            genuine: format_count(stats.genuine),
            counterfeit: format_count(stats.counterfeit),
            yield_rate: format_percent(stats.yield_rate),
            updated_at: snapshot.observed_at.map(|at| {
                at.with_timezone(&Local).format(TIME_FORMAT).to_string()
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormView {
    pub image_label: String,
    pub part_number: String,
    pub submit_label: &'static str,
    pub submit_enabled: bool,
}

impl From<&SessionView> for FormView {
    fn from(view: &SessionView) -> Self {
        Self {
            image_label: view
                .image_name
                .clone()
                .unwrap_or_else(|| "Choose Image".to_string()),
            part_number: view.part_number.clone(),
            submit_label: if view.busy {
                "⏳ Scanning..."
            } else {
                "🔍 Scan IC"
            },
            submit_enabled: !view.busy,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultPanelView {
    pub verdict: Verdict,
    pub headline: String,
    pub confidence: String,
    pub explanation: String,
    pub part_number: String,
    pub scan_id: String,
    pub observed_at: String,
    pub manufacturer: String,
    pub expected_logo: String,
    pub image_quality: String,
    pub detected_text: String,
    pub issues: Vec<String>,
}

impl From<&ScanResult> for ResultPanelView {
    fn from(result: &ScanResult) -> Self {
        let fields = &result.detected_fields;
        let mark = if result.verdict.is_genuine() {
            "✅"
        } else {
            "❌"
        };
        Self {
            verdict: result.verdict,
            headline: format!("{mark} {}", result.verdict),
            confidence: format_confidence(result.confidence),
            explanation: result.explanation.clone(),
            part_number: result.part_number.clone(),
            scan_id: short_scan_id(&result.scan_id),
            observed_at: result
                .observed_at
                .with_timezone(&Local)
                .format(TIME_FORMAT)
                .to_string(),
            manufacturer: fields
                .manufacturer
                .clone()
                .unwrap_or_else(|| UNKNOWN.to_string()),
            expected_logo: fields
                .expected_logo
                .clone()
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            image_quality: fields
                .image_quality
                .clone()
                .unwrap_or_else(|| UNKNOWN.to_string()),
            detected_text: match &fields.detected_texts {
                Some(texts) if !texts.is_empty() => texts.join(", "),
                _ => NONE.to_string(),
            },
            issues: result.issues.clone(),
        }
    }
}

impl ResultPanelView {
    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }
}

fn short_scan_id(scan_id: &str) -> String {
    let prefix: String = scan_id.chars().take(SCAN_ID_PREFIX_LEN).collect();
    format!("{prefix}...")
}
