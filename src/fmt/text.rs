use chrono::{DateTime, Local};
use console::style;

use crate::domain::target::{Capability, Snapshot, Target, TargetStatus};
use crate::stats::Stats;

fn symbol(status: TargetStatus) -> console::StyledObject<&'static str> {
    match status {
        TargetStatus::Online => style("✓").green().bold(),
        TargetStatus::Offline => style("✗").red().bold(),
        TargetStatus::Suspended => style("⏸").yellow().bold(),
        TargetStatus::Pending => style("○").dim(),
    }
}

/// One board line: symbol, address, label, latency, code and check time.
pub fn render_target(t: &Target, capability: Capability) -> String {
    let label = capability.label(t.status());
    let label = match t.status() {
        TargetStatus::Online => style(label).green(),
        TargetStatus::Offline => style(label).red(),
        TargetStatus::Suspended => style(label).yellow(),
        TargetStatus::Pending => style(label).dim(),
    };
    let latency = if t.last_checked_at().is_some() {
        format!("{:>6} ms", t.latency_ms())
    } else {
        format!("{:>6}   ", "-")
    };
    let checked = t
        .last_checked_at()
        .map(|ts| DateTime::<Local>::from(ts).format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string());

    let mut line = format!(
        "{} {:<50} {:<22} {} {:>3} {}",
        symbol(t.status()),
        style(t.address()).bold(),
        label,
        style(latency).cyan(),
        t.status_code(),
        style(checked).dim()
    );
    if t.status() == TargetStatus::Offline
        && let Some(detail) = t.detail()
    {
        line.push_str(&format!("\n    {}", style(detail).red().dim()));
    }
    line
}

pub fn render_stats(stats: &Stats) -> String {
    format!(
        "{} {}  {} {}  {} {}",
        style("Online:").cyan().bold(),
        style(stats.online).green(),
        style("Offline:").cyan().bold(),
        style(stats.offline).red(),
        style("Total:").cyan().bold(),
        stats.total
    )
}

/// Render the whole board, one line per target followed by the counts.
pub fn render_board(snapshot: &Snapshot) -> String {
    let mut out = format!(
        "{} {} targets ({})\n",
        style("Checked").bold(),
        snapshot.targets.len(),
        snapshot.capability
    );
    for t in &snapshot.targets {
        out.push_str(&render_target(t, snapshot.capability));
        out.push('\n');
    }
    out.push_str(&render_stats(&snapshot.stats));
    out
}
