//! Attach-time resource planner for HashFast USB hashing accelerators.
//!
//! When a board attaches, its reset exchange reports how many chips it has,
//! how many cores each chip carries and which variant it is. From that this
//! crate derives everything the dispatch loop needs before the first work
//! unit goes out:
//!
//! ```text
//! Topology ─┬─ CoreMatrix        chips × cores, all enabled
//!           ├─ Backpressure      inflight_target = chips × cores × 2
//!           ├─ JobArena          inflight_target jobs, all inactive
//!           └─ WorkBuffer        inflight_target slots
//!                    ↓
//!            DeviceRegistry[id]  → dispatch loop
//! ```
//!
//! # Quick start
//!
//! ```
//! use hfa_driver::{attach, AttachConfig, DeviceRegistry, SimulatedTransport};
//! use hfa_chip::{DeviceVariant, Topology};
//!
//! # fn main() -> hfa_driver::Result<()> {
//! let mut registry = DeviceRegistry::new();
//! let mut board = SimulatedTransport::new(Topology::new(4, 96, DeviceVariant::Generic));
//!
//! let dev = attach(&mut registry, 0, &mut board, &AttachConfig::default())?;
//! assert_eq!(dev.inflight_target(), 768);
//!
//! let job = dev.jobs()?.acquire().expect("fresh arena has free jobs");
//! dev.jobs()?.release(job)?;
//! # Ok(())
//! # }
//! ```
//!
//! The USB transport, the hash search loop and statistics reporting live
//! outside this crate; [`Transport`] is the only seam to the hardware.

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]

pub mod arena;
mod attach;
mod backpressure;
mod config;
pub mod cores;
mod device;
mod error;
mod registry;
pub mod transport;
pub mod work;

/// Board constants (re-exported from hfa-chip).
pub mod board {
    pub use hfa_chip::tuning::{
        hash_loops, DEFAULT_MAX_SEARCH_DIFFICULTY, FAST_FPGA_HASH_LOOPS, FULL_NONCE_RANGE,
        NUM_SEQUENCE, SLOW_FPGA_HASH_LOOPS,
    };
    pub use hfa_chip::usb::{
        device_type, lsusb_filter, DEFAULT_BAUD_RATE, HASHFAST_PRODUCT_ID, HASHFAST_VENDOR_ID,
        MINER_THREADS, USB_PACKET_SIZE,
    };
    pub use hfa_chip::{DeviceVariant, Topology};
}

pub use arena::{Job, JobArena, JobId, Queue};
pub use attach::{attach, attach_next};
pub use backpressure::Backpressure;
pub use config::{AttachConfig, ENV_BAUD_RATE, ENV_MAX_SEARCH_DIFFICULTY};
pub use cores::{Core, CoreMatrix};
pub use device::{Device, DeviceSummary};
pub use error::{HfaError, Result};
pub use registry::DeviceRegistry;
pub use transport::{ResetReport, SimulatedTransport, Transport};
pub use work::{WorkBuffer, WorkItem};

/// Commonly used types.
pub mod prelude {
    pub use crate::{
        attach, AttachConfig, Device, DeviceRegistry, HfaError, JobArena, JobId, Queue, Result,
        SimulatedTransport, Transport, WorkBuffer,
    };
    pub use hfa_chip::{DeviceVariant, Topology};
}
