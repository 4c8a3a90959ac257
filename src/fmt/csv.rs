use chrono::{NaiveDate, SecondsFormat};

use crate::domain::target::Target;

pub const HEADER: &str = "URL,Status,Latency (ms),Last Check,Details";

/// Quote a field, doubling any embedded quotes.
fn quoted(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// One CSV row for a target. Suspended targets always read "Suspended".
pub fn render_row(t: &Target) -> String {
    let last_check = t
        .last_checked_at()
        .map(|ts| ts.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_else(|| "N/A".to_string());
    format!(
        "{},{},{},{},{}",
        quoted(t.address()),
        t.status(),
        t.latency_ms(),
        last_check,
        t.status_code()
    )
}

/// Full report: header plus one row per target, in board order.
pub fn to_csv(targets: &[Target]) -> String {
    let mut out = String::with_capacity(64 * (targets.len() + 1));
    out.push_str(HEADER);
    out.push('\n');
    for t in targets {
        out.push_str(&render_row(t));
        out.push('\n');
    }
    out
}

/// Default download name for a report taken on `date`.
pub fn report_file_name(date: NaiveDate) -> String {
    format!("monitor_report_{}.csv", date.format("%Y-%m-%d"))
}
