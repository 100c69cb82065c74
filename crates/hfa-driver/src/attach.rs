//! Attach path
//!
//! ```text
//! registry grow → reset exchange → Device::build → register → hand off
//! ```
//!
//! The registry is grown before the board is touched, matching the host's
//! device counter. A reset failure discards the device and leaves every
//! other registered device as it was.

use std::sync::Arc;

use crate::config::AttachConfig;
use crate::device::Device;
use crate::error::{HfaError, Result};
use crate::registry::DeviceRegistry;
use crate::transport::Transport;

/// Attach one board under `device_id`
///
/// # Errors
///
/// - `HfaError::AllocationFailed` if the registry or any pool cannot be
///   allocated. Fatal: the caller should stop attaching devices.
/// - `HfaError::ResetFailed` if the board is gone or its reset exchange
///   fails. Nothing is registered.
/// - `HfaError::AlreadyRegistered` if `device_id` is taken.
pub fn attach(
    registry: &mut DeviceRegistry,
    device_id: usize,
    transport: &mut dyn Transport,
    config: &AttachConfig,
) -> Result<Arc<Device>> {
    tracing::debug!("Attaching device {device_id} via {} transport", transport.name());

    registry.reserve(device_id)?;
    if registry.lookup(device_id).is_some() {
        return Err(HfaError::AlreadyRegistered { device_id });
    }

    if !transport.is_present() {
        tracing::warn!("Device {device_id} vanished before reset");
        return Err(HfaError::reset_failed(device_id, "device not present"));
    }

    let report = transport.reset(config.baud_rate).map_err(|e| {
        tracing::warn!("Reset failed for device {device_id}: {e}");
        HfaError::reset_failed(device_id, e.to_string())
    })?;

    let device = Arc::new(Device::build(device_id, report.topology(), config.clone())?);
    registry.register(device_id, Arc::clone(&device))?;

    tracing::info!("Attached device {device_id}: {}", device.topology());
    Ok(device)
}

/// Attach under the next id the registry would hand out
///
/// # Errors
///
/// See [`attach`].
pub fn attach_next(
    registry: &mut DeviceRegistry,
    transport: &mut dyn Transport,
    config: &AttachConfig,
) -> Result<Arc<Device>> {
    let id = registry.next_id();
    attach(registry, id, transport, config)
}
