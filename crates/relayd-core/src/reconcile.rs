//! Belief tracking and the write-decision engine.
//!
//! The belief is the gateway's record of the last relay state it confirmed
//! was written to the module. An incoming partial request is merged over
//! the belief to get the full desired state; a device write happens only
//! when the belief is unknown, the target bitmask changed, or a non-zero
//! state has gone unconfirmed for longer than the drift interval. The
//! belief is committed only after a confirmed write, so a failed write
//! retains the last confirmed state, not the attempted one.

use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::error::Result;
use crate::session::slot::{ModuleConnector, SessionSlot};
use crate::states::RelayStates;

/// Last confirmed module state, if any.
#[derive(Debug, Clone, Copy, Default)]
pub struct Belief {
    current: Option<RelayStates>,
    last_written_at: Option<Instant>,
}

impl Belief {
    /// The last confirmed state, or `None` while unknown.
    pub fn current(&self) -> Option<RelayStates> {
        self.current
    }

    /// True until the first confirmed write.
    pub fn is_unknown(&self) -> bool {
        self.current.is_none()
    }

    /// Time since the last confirmed write.
    pub fn age(&self, now: Instant) -> Option<Duration> {
        self.last_written_at.map(|written| now.duration_since(written))
    }

    fn commit(&mut self, states: RelayStates, at: Instant) {
        self.current = Some(states);
        self.last_written_at = Some(at);
    }
}

/// Merges requests into the belief and drives module writes.
#[derive(Debug)]
pub struct Reconciler {
    belief: Belief,
    drift_interval: Duration,
}

impl Reconciler {
    /// Create a reconciler with unknown belief.
    pub fn new(drift_interval: Duration) -> Self {
        Self {
            belief: Belief::default(),
            drift_interval,
        }
    }

    /// The current belief.
    pub fn belief(&self) -> &Belief {
        &self.belief
    }

    /// Apply one incoming partial request.
    ///
    /// Returns whether a module write was performed. On write failure the
    /// slot is cleared and the belief left unchanged.
    pub async fn handle_request<C: ModuleConnector>(
        &mut self,
        incoming: RelayStates,
        slot: &mut SessionSlot<C>,
    ) -> Result<bool> {
        let now = Instant::now();
        let desired = self
            .belief
            .current
            .unwrap_or_default()
            .merge(&incoming);

        if !self.write_required(&desired, now) {
            debug!(desired = %desired, "no module write required");
            return Ok(false);
        }

        let bitmask = desired.writeall_bitmask();
        let session = slot.ensure_ready().await?;
        match session.write_all_states(bitmask).await {
            Ok(()) => {
                self.belief.commit(desired, now);
                info!(bitmask = format_args!("{:02x}", bitmask), "module state confirmed");
                Ok(true)
            }
            Err(e) => {
                slot.on_write_failure().await;
                Err(e)
            }
        }
    }

    /// A write is required when the belief is unknown, the target bitmask
    /// differs from the confirmed one, or a non-zero target has gone
    /// unconfirmed past the drift interval. The last condition is the only
    /// recovery path against the module silently losing state.
    fn write_required(&self, desired: &RelayStates, now: Instant) -> bool {
        let Some(current) = self.belief.current else {
            return true;
        };

        let target = desired.writeall_bitmask();
        if target != current.writeall_bitmask() {
            return true;
        }

        target != 0
            && self
                .belief
                .age(now)
                .is_some_and(|age| age >= self.drift_interval)
    }
}
