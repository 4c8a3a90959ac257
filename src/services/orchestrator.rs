use chrono::Utc;
use futures::future::join_all;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, Semaphore, watch};
use tracing::{debug, info, instrument, warn};

use super::registry::{Reconciled, TargetRegistry};
use crate::adapters::{Transport, build_transport};
use crate::config::Settings;
use crate::domain::target::{
    Capability, Dispatch, Progress, Snapshot, SuspendChange, TargetStatus, TargetUpdate,
};
use crate::error::PulseError;
use crate::stats::{Stats, compute_stats};

/// Summary of one finished check cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub dispatched: usize,
    pub recorded: usize,
    pub discarded: usize,
    pub stats: Stats,
    pub elapsed: Duration,
}

struct BoardState {
    registry: TargetRegistry,
    progress: Progress,
    stats: Stats,
}

impl BoardState {
    fn snapshot(&self, capability: Capability) -> Snapshot {
        Snapshot {
            targets: self.registry.list().to_vec(),
            stats: self.stats,
            progress: self.progress,
            capability,
        }
    }
}

/// Clears the running flag however the cycle ends.
struct CycleGuard<'a>(&'a AtomicBool);

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Drives check cycles over a target registry.
///
/// All probes of a cycle are joined on the caller's task. Registry writes,
/// progress and stats change only under `state`, which is never held while a
/// probe is in flight.
pub struct Monitor {
    state: Mutex<BoardState>,
    transport: Arc<dyn Transport>,
    limiter: Option<Semaphore>,
    cycle_running: AtomicBool,
    snapshots: watch::Sender<Snapshot>,
}

impl Monitor {
    pub fn new(registry: TargetRegistry, transport: Arc<dyn Transport>) -> Self {
        let state = BoardState {
            stats: compute_stats(registry.list()),
            registry,
            progress: Progress::default(),
        };
        let (snapshots, _) = watch::channel(state.snapshot(transport.capability()));
        Self {
            state: Mutex::new(state),
            transport,
            limiter: None,
            cycle_running: AtomicBool::new(false),
            snapshots,
        }
    }

    /// Build a monitor from settings: seeds targets, applies initial
    /// maintenance flags and picks the transport.
    pub fn from_settings(settings: &Settings) -> Result<Self, PulseError> {
        settings.validate()?;
        if settings.targets.is_empty() {
            return Err(PulseError::NoTargets);
        }
        let mut registry = TargetRegistry::from_addresses(settings.targets.iter().cloned());
        for address in &settings.suspended {
            let Some(index) = registry.position(address) else {
                continue;
            };
            if registry.get(index).is_some_and(|t| !t.is_suspended()) {
                registry.toggle_suspend(index)?;
            }
        }
        let transport = build_transport(&settings.probe)?;
        Ok(Self::new(registry, transport).with_max_in_flight(settings.probe.max_in_flight))
    }

    /// Gate dispatch behind a semaphore. Zero keeps fan-out unbounded.
    pub fn with_max_in_flight(mut self, max: usize) -> Self {
        self.limiter = (max > 0).then(|| Semaphore::new(max));
        self
    }

    pub fn capability(&self) -> Capability {
        self.transport.capability()
    }

    pub fn is_running(&self) -> bool {
        self.cycle_running.load(Ordering::Acquire)
    }

    pub async fn snapshot(&self) -> Snapshot {
        self.state.lock().await.snapshot(self.capability())
    }

    /// Receiver that sees a fresh snapshot after every state change.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshots.subscribe()
    }

    /// Probe every non-suspended target once and wait for all of them.
    ///
    /// Returns [`PulseError::CycleInProgress`] if another cycle has not
    /// finished yet; the running cycle is left untouched.
    #[instrument(skip(self))]
    pub async fn run_cycle(&self) -> Result<CycleReport, PulseError> {
        if self.cycle_running.swap(true, Ordering::AcqRel) {
            return Err(PulseError::CycleInProgress);
        }
        let _guard = CycleGuard(&self.cycle_running);
        let start = Instant::now();

        let dispatch = {
            let mut state = self.state.lock().await;
            let dispatch = state.registry.begin_cycle();
            state.progress = Progress {
                completed: 0,
                total: dispatch.len(),
                running: true,
            };
            state.stats = compute_stats(state.registry.list());
            self.publish(&state);
            dispatch
        };
        let dispatched = dispatch.len();
        info!(dispatched, capability = %self.capability(), "check cycle started");

        let outcomes = join_all(
            dispatch
                .into_iter()
                .map(|d| self.probe_and_reconcile(d, true)),
        )
        .await;
        let recorded = outcomes
            .iter()
            .filter(|o| matches!(o, Reconciled::Recorded(_)))
            .count();

        let stats = {
            let mut state = self.state.lock().await;
            state.progress.running = false;
            self.publish(&state);
            state.stats
        };

        let report = CycleReport {
            dispatched,
            recorded,
            discarded: dispatched - recorded,
            stats,
            elapsed: start.elapsed(),
        };
        info!(
            online = stats.online,
            offline = stats.offline,
            discarded = report.discarded,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "check cycle completed"
        );
        Ok(report)
    }

    /// Flip maintenance on target `index`. Resuming runs exactly one
    /// re-probe of that target before returning.
    #[instrument(skip(self))]
    pub async fn toggle_suspend(&self, index: usize) -> Result<SuspendChange, PulseError> {
        let change = {
            let mut state = self.state.lock().await;
            let change = state.registry.toggle_suspend(index)?;
            state.stats = compute_stats(state.registry.list());
            self.publish(&state);
            change
        };

        match &change {
            SuspendChange::Suspended => info!(index, "target suspended"),
            SuspendChange::Resumed(dispatch) => {
                info!(index, address = %dispatch.address, "target resumed, re-probing");
                self.probe_and_reconcile(dispatch.clone(), false).await;
            }
        }
        Ok(change)
    }

    /// Probe one dispatched target and fold the result in. `counted` probes
    /// advance cycle progress even when their result is discarded.
    async fn probe_and_reconcile(&self, dispatch: Dispatch, counted: bool) -> Reconciled {
        let _permit = match &self.limiter {
            Some(limiter) => limiter.acquire().await.ok(),
            None => None,
        };
        let result = self.transport.probe(&dispatch.address).await;
        let update = TargetUpdate::from_probe(dispatch.generation, &result, Utc::now());

        let mut state = self.state.lock().await;
        let outcome = match state.registry.set(dispatch.index, update) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(index = dispatch.index, error = %e, "probe result has no target");
                Reconciled::Discarded
            }
        };
        if counted {
            state.progress.completed += 1;
        }
        state.stats = compute_stats(state.registry.list());
        self.publish(&state);
        drop(state);

        match outcome {
            Reconciled::Recorded(TargetStatus::Offline) => warn!(
                address = %dispatch.address,
                code = result.status_code,
                detail = result.detail().unwrap_or(""),
                "target offline"
            ),
            Reconciled::Recorded(status) => debug!(
                address = %dispatch.address,
                %status,
                latency_ms = result.latency_ms,
                "target checked"
            ),
            Reconciled::Discarded => {
                debug!(address = %dispatch.address, "result discarded, target changed in flight")
            }
        }
        outcome
    }

    fn publish(&self, state: &BoardState) {
        self.snapshots.send_replace(state.snapshot(self.capability()));
    }
}
