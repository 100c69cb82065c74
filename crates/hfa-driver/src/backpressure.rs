//! Inflight target and admission
//!
//! One pending and one active work unit per core. The same number sizes the
//! job arena and the work buffer, so pool capacity and the concurrency
//! ceiling cannot drift apart.

use crate::error::{HfaError, Result};
use hfa_chip::Topology;

/// Concurrency ceiling for one device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backpressure {
    inflight_target: usize,
}

impl Backpressure {
    /// Derive the ceiling from a topology: `chips × cores × 2`
    ///
    /// # Errors
    ///
    /// Returns `HfaError::AllocationFailed` if the product does not fit in
    /// the host's address space.
    pub fn from_topology(topology: &Topology) -> Result<Self> {
        let target = topology
            .inflight_target()
            .and_then(|t| usize::try_from(t).ok())
            .ok_or(HfaError::allocation_failed("inflight entries", usize::MAX))?;

        Ok(Self {
            inflight_target: target,
        })
    }

    /// Maximum number of jobs allowed on the active queue
    #[must_use]
    pub const fn inflight_target(&self) -> usize {
        self.inflight_target
    }

    /// Total job objects to allocate
    #[must_use]
    pub const fn job_count(&self) -> usize {
        self.inflight_target
    }

    /// Work buffer length
    #[must_use]
    pub const fn max_work(&self) -> usize {
        self.inflight_target
    }

    /// `true` if one more job may go active while `active` are outstanding
    #[must_use]
    pub const fn admits(&self, active: usize) -> bool {
        active < self.inflight_target
    }

    /// Jobs that may still be started
    #[must_use]
    pub const fn headroom(&self, active: usize) -> usize {
        self.inflight_target.saturating_sub(active)
    }
}
