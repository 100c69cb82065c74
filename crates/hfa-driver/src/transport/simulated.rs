// SPDX-License-Identifier: AGPL-3.0-only

//! Simulated transport
//!
//! Stands in for a USB board so the attach path can run in CI and from the
//! CLI without hardware. Reports a fixed topology, or fails its reset on
//! request.

use crate::error::{HfaError, Result};
use crate::transport::{ResetReport, Transport};
use hfa_chip::Topology;

/// Transport that answers the reset exchange from a stored report
#[derive(Debug, Clone)]
pub struct SimulatedTransport {
    report: ResetReport,
    present: bool,
    fail_reset: Option<String>,
    resets: u32,
    last_baud: Option<u32>,
}

impl SimulatedTransport {
    /// Board with the given topology
    pub const fn new(topology: Topology) -> Self {
        Self::from_report(ResetReport::from_topology(&topology))
    }

    /// Board that reports exactly `report`, including unknown device types
    pub const fn from_report(report: ResetReport) -> Self {
        Self {
            report,
            present: true,
            fail_reset: None,
            resets: 0,
            last_baud: None,
        }
    }

    /// Make every reset fail with `reason`
    #[must_use]
    pub fn failing(mut self, reason: impl Into<String>) -> Self {
        self.fail_reset = Some(reason.into());
        self
    }

    /// Mark the board as unplugged
    #[must_use]
    pub fn unplugged(mut self) -> Self {
        self.present = false;
        self
    }

    /// Number of reset exchanges run so far
    pub const fn resets(&self) -> u32 {
        self.resets
    }

    /// Baud rate used by the most recent reset
    pub const fn last_baud(&self) -> Option<u32> {
        self.last_baud
    }
}

impl Transport for SimulatedTransport {
    fn is_present(&self) -> bool {
        self.present
    }

    fn reset(&mut self, baud_rate: u32) -> Result<ResetReport> {
        self.resets += 1;
        self.last_baud = Some(baud_rate);

        if let Some(reason) = &self.fail_reset {
            return Err(HfaError::invalid_state(reason.clone()));
        }

        tracing::debug!(
            "Simulated reset at {baud_rate} baud: {} chip(s), {} core(s), type {}",
            self.report.chips,
            self.report.cores_per_chip,
            self.report.device_type
        );
        Ok(self.report)
    }

    fn name(&self) -> &str {
        "simulated"
    }
}
