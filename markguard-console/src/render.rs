//! Plain-text rendering of the view models.

use std::fmt::Write;

use markguard_core::view_model::{DashboardView, FormView, ResultPanelView};
use markguard_model::ScanHistoryPage;

pub fn dashboard(view: &DashboardView) -> String {
    let mut out = format!(
        "Total Scanned: {} | Genuine ICs: {} | Counterfeit Found: {} \
         | Yield Rate: {}",
        view.total_scanned, view.genuine, view.counterfeit, view.yield_rate
    );
    if let Some(at) = &view.updated_at {
        let _ = write!(out, "  (as of {at})");
    }
    out
}

pub fn form(view: &FormView) -> String {
    let part = if view.part_number.is_empty() {
        "-"
    } else {
        view.part_number.as_str()
    };
    format!(
        "Image: {} | Part Number: {} | [{}]",
        view.image_label, part, view.submit_label
    )
}

pub fn result_panel(view: &ResultPanelView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Scan Result");
    let _ = writeln!(out, "  {}", view.headline);
    let _ = writeln!(out, "  Confidence: {}%", view.confidence);
    let _ = writeln!(out, "  AI Analysis: {}", view.explanation);
    let _ = writeln!(out, "  Part Number: {}", view.part_number);
    let _ = writeln!(out, "  Scan ID: {}", view.scan_id);
    let _ = writeln!(out, "  Time: {}", view.observed_at);
    let _ = writeln!(out, "  Detection Details:");
    let _ = writeln!(out, "    Manufacturer: {}", view.manufacturer);
    let _ = writeln!(out, "    Expected Logo: {}", view.expected_logo);
    let _ = writeln!(out, "    Image Quality: {}", view.image_quality);
    let _ = write!(out, "    Detected Text: {}", view.detected_text);
    if view.has_issues() {
        let _ = write!(out, "\n  Issues Found:");
        for issue in &view.issues {
            let _ = write!(out, "\n    - {issue}");
        }
    }
    out
}

pub fn history(page_number: u32, page: &ScanHistoryPage) -> String {
    if page.is_empty() {
        return format!(
            "History page {page_number}: no scans ({} total)",
            page.total
        );
    }
    let mut out = format!("History page {page_number} ({} total)", page.total);
    for scan in &page.scans {
        let _ = write!(
            out,
            "\n  {}  {}  {}  {:.2}%",
            scan.file_id, scan.part_number, scan.status, scan.confidence
        );
    }
    out
}
