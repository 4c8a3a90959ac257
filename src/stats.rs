use crate::domain::target::{Target, TargetStatus};
use serde::Serialize;

/// Board-wide counts. Suspended targets count toward `total` only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub online: usize,
    pub offline: usize,
    pub total: usize,
}

/// Recount everything from current target state.
pub fn compute_stats(targets: &[Target]) -> Stats {
    let active = targets.iter().filter(|t| !t.is_suspended());
    let (online, offline) = active.fold((0, 0), |(on, off), t| match t.status() {
        TargetStatus::Online => (on + 1, off),
        TargetStatus::Offline => (on, off + 1),
        _ => (on, off),
    });
    Stats {
        online,
        offline,
        total: targets.len(),
    }
}
