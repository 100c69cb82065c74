//! Device registry
//!
//! Devices are indexed by the small dense id the host hands out at attach.
//! Growing the table for a new id never touches entries stored under other
//! ids.

use std::sync::Arc;

use crate::device::Device;
use crate::error::{HfaError, Result};

/// Id-indexed table of attached devices
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    slots: Vec<Option<Arc<Device>>>,
}

impl DeviceRegistry {
    /// Empty registry
    #[must_use]
    pub const fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Grow so that `id` has a slot
    ///
    /// # Errors
    ///
    /// Returns `HfaError::AllocationFailed` if the table cannot grow. The
    /// existing entries are untouched in that case, but callers should treat
    /// it as fatal for every device.
    pub fn reserve(&mut self, id: usize) -> Result<()> {
        let needed = id
            .checked_add(1)
            .ok_or(HfaError::allocation_failed("registry slots", usize::MAX))?;
        if needed <= self.slots.len() {
            return Ok(());
        }
        let extra = needed - self.slots.len();
        self.slots
            .try_reserve(extra)
            .map_err(|_| HfaError::allocation_failed("registry slots", needed))?;
        self.slots.resize_with(needed, || None);
        Ok(())
    }

    /// Store a device under `id`, growing the table if needed
    ///
    /// # Errors
    ///
    /// Returns `HfaError::AlreadyRegistered` if `id` is taken,
    /// `HfaError::InvalidState` if the device was built for another id, and
    /// `HfaError::AllocationFailed` if the table cannot grow.
    pub fn register(&mut self, id: usize, device: Arc<Device>) -> Result<()> {
        if device.id() != id {
            return Err(HfaError::invalid_state(format!(
                "device {} cannot be registered as {id}",
                device.id()
            )));
        }
        if self.lookup(id).is_some() {
            tracing::warn!("Refusing to register device {id} twice");
            return Err(HfaError::AlreadyRegistered { device_id: id });
        }

        self.reserve(id)?;
        self.slots[id] = Some(device);
        tracing::debug!("Registered device {id}");
        Ok(())
    }

    /// Device registered under `id`
    #[must_use]
    pub fn lookup(&self, id: usize) -> Option<Arc<Device>> {
        self.slots.get(id).and_then(Clone::clone)
    }

    /// Detach the device under `id`. The slot stays, empty.
    pub fn remove(&mut self, id: usize) -> Option<Arc<Device>> {
        let device = self.slots.get_mut(id).and_then(Option::take);
        if device.is_some() {
            tracing::info!("Detached device {id}");
        }
        device
    }

    /// Id the host counter would hand out next
    #[must_use]
    pub fn next_id(&self) -> usize {
        self.slots.len()
    }

    /// Number of registered devices
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// `true` if no device is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Registered devices in id order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Device>> {
        self.slots.iter().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AttachConfig;
    use hfa_chip::Topology;

    fn device(id: usize) -> Arc<Device> {
        Arc::new(Device::build(id, Topology::MINIMAL, AttachConfig::default()).unwrap())
    }

    #[test]
    fn sparse_ids() {
        let mut reg = DeviceRegistry::new();
        let d0 = device(0);
        let d2 = device(2);
        let d5 = device(5);

        reg.register(0, Arc::clone(&d0)).unwrap();
        reg.register(2, Arc::clone(&d2)).unwrap();
        assert!(Arc::ptr_eq(&reg.lookup(0).unwrap(), &d0));
        reg.register(5, Arc::clone(&d5)).unwrap();

        for missing in [1, 3, 4, 6, 100] {
            assert!(reg.lookup(missing).is_none(), "id {missing}");
        }
        assert!(Arc::ptr_eq(&reg.lookup(0).unwrap(), &d0));
        assert!(Arc::ptr_eq(&reg.lookup(2).unwrap(), &d2));
        assert!(Arc::ptr_eq(&reg.lookup(5).unwrap(), &d5));
        assert_eq!(reg.len(), 3);
        assert_eq!(reg.next_id(), 6);
        assert_eq!(reg.iter().map(|d| d.id()).collect::<Vec<_>>(), vec![0, 2, 5]);
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let mut reg = DeviceRegistry::new();
        let first = device(1);
        reg.register(1, Arc::clone(&first)).unwrap();
        assert!(matches!(
            reg.register(1, device(1)),
            Err(HfaError::AlreadyRegistered { device_id: 1 })
        ));
        assert!(Arc::ptr_eq(&reg.lookup(1).unwrap(), &first));
    }

    #[test]
    fn id_mismatch_is_rejected() {
        let mut reg = DeviceRegistry::new();
        assert!(matches!(reg.register(4, device(3)), Err(HfaError::InvalidState { .. })));
        assert!(reg.is_empty());
        assert_eq!(reg.next_id(), 0);
    }

    #[test]
    fn remove_leaves_others() {
        let mut reg = DeviceRegistry::new();
        reg.register(0, device(0)).unwrap();
        reg.register(1, device(1)).unwrap();

        assert_eq!(reg.remove(0).map(|d| d.id()), Some(0));
        assert!(reg.remove(0).is_none());
        assert!(reg.lookup(0).is_none());
        assert_eq!(reg.lookup(1).map(|d| d.id()), Some(1));
        assert_eq!(reg.next_id(), 2);

        // a freed id can be reused
        reg.register(0, device(0)).unwrap();
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn reserve_does_not_register() {
        let mut reg = DeviceRegistry::new();
        reg.reserve(3).unwrap();
        assert_eq!(reg.next_id(), 4);
        assert!(reg.is_empty());
        assert!(reg.reserve(usize::MAX).unwrap_err().is_fatal());
    }
}
