use crate::domain::target::{Dispatch, SuspendChange, Target, TargetStatus, TargetUpdate};
use crate::error::PulseError;

/// Whether a completed probe made it into the registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reconciled {
    Recorded(TargetStatus),
    /// Target was suspended or re-dispatched while the probe was in flight.
    Discarded,
}

/// The fixed, ordered set of monitored targets. Index order is the
/// configured order and never changes during a run.
#[derive(Clone, Debug, Default)]
pub struct TargetRegistry {
    targets: Vec<Target>,
}

impl TargetRegistry {
    pub fn from_addresses<I, S>(addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            targets: addresses.into_iter().map(Target::new).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn list(&self) -> &[Target] {
        &self.targets
    }

    pub fn get(&self, index: usize) -> Option<&Target> {
        self.targets.get(index)
    }

    pub fn position(&self, address: &str) -> Option<usize> {
        self.targets.iter().position(|t| t.address() == address)
    }

    /// Apply a probe outcome to target `index`. The update is dropped when
    /// the target is suspended or its generation moved on since dispatch.
    pub fn set(&mut self, index: usize, update: TargetUpdate) -> Result<Reconciled, PulseError> {
        let target = self
            .targets
            .get_mut(index)
            .ok_or(PulseError::UnknownTarget(index))?;
        if target.is_suspended() || target.generation() != update.generation {
            return Ok(Reconciled::Discarded);
        }
        let status = update.status;
        target.apply(update);
        Ok(Reconciled::Recorded(status))
    }

    /// Reset every active target to Pending and hand out one dispatch each.
    /// Suspended targets are left exactly as they are.
    pub fn begin_cycle(&mut self) -> Vec<Dispatch> {
        self.targets
            .iter_mut()
            .enumerate()
            .filter(|(_, t)| !t.is_suspended())
            .map(|(index, t)| {
                t.set_status(TargetStatus::Pending);
                Dispatch {
                    index,
                    address: t.address().to_string(),
                    generation: t.bump_generation(),
                }
            })
            .collect()
    }

    /// Flip the maintenance flag of target `index`.
    pub fn toggle_suspend(&mut self, index: usize) -> Result<SuspendChange, PulseError> {
        let target = self
            .targets
            .get_mut(index)
            .ok_or(PulseError::UnknownTarget(index))?;
        let generation = target.bump_generation();
        if target.is_suspended() {
            target.set_status(TargetStatus::Pending);
            Ok(SuspendChange::Resumed(Dispatch {
                index,
                address: target.address().to_string(),
                generation,
            }))
        } else {
            target.set_status(TargetStatus::Suspended);
            Ok(SuspendChange::Suspended)
        }
    }
}
