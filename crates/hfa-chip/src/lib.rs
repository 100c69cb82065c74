//! Board model for HashFast USB hashing accelerators.
//!
//! This crate has **no dependencies** and **no hardware access**. It is a
//! pure model of the boards: USB identifiers and link constants, the device
//! variants, the chip × core topology reported at reset, and the per-variant
//! work-unit tuning.
//!
//! # Crate organisation
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`usb`] | Vendor/product IDs, packet size, default baud rate, [`usb::DeviceVariant`] |
//! | [`topology`] | [`topology::Topology`]: chips, cores per chip, variant |
//! | [`tuning`] | Hash loops per work unit, sequence space size |

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod topology;
pub mod tuning;
pub mod usb;

pub use topology::Topology;
pub use usb::DeviceVariant;
