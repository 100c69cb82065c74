//! Upstream transport interface
//!
//! The USB layer (enumeration, packet I/O, the reset handshake) is not part
//! of this crate. All the attach path needs from it is a device that is
//! present and a reset exchange that reports the board's shape.

pub mod simulated;

pub use simulated::SimulatedTransport;

use crate::error::Result;
use hfa_chip::{DeviceVariant, Topology};
use std::fmt::Debug;

/// What the reset / detect exchange reports about a board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetReport {
    /// Hashing chips on the board
    pub chips: u32,
    /// Cores per chip
    pub cores_per_chip: u32,
    /// Raw device-type code (see `hfa_chip::usb::device_type`)
    pub device_type: u8,
}

impl ResetReport {
    /// Report describing an existing topology
    #[must_use]
    pub const fn from_topology(topology: &Topology) -> Self {
        Self {
            chips: topology.chips(),
            cores_per_chip: topology.cores_per_chip(),
            device_type: topology.variant().device_type(),
        }
    }

    /// Board topology implied by this report
    #[must_use]
    pub const fn topology(&self) -> Topology {
        Topology::new(
            self.chips,
            self.cores_per_chip,
            DeviceVariant::from_device_type(self.device_type),
        )
    }
}

/// Link to one opened board
pub trait Transport: Debug + Send {
    /// `false` once the device has gone away (unplugged, failed init)
    fn is_present(&self) -> bool;

    /// Run the reset / detect exchange at the given baud rate
    ///
    /// # Errors
    ///
    /// Returns error if the handshake fails. The device must then not be
    /// registered.
    fn reset(&mut self, baud_rate: u32) -> Result<ResetReport>;

    /// Short name for logs
    fn name(&self) -> &str;
}
