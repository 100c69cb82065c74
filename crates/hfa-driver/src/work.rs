//! Work item storage
//!
//! Fixed-length slot array sized to the inflight target. Jobs refer to
//! slots by index; slots are never created or destroyed after allocation.

use bytes::Bytes;

use crate::error::{HfaError, Result};
use hfa_chip::tuning::NUM_SEQUENCE;

/// One unit of work handed to a core
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    /// Sequence number the device reports back on completion
    pub sequence: u16,
    /// Opaque work payload (header data, midstate, ...)
    pub data: Bytes,
}

impl WorkItem {
    /// Work item for `sequence` carrying `data`
    pub fn new(sequence: u16, data: impl Into<Bytes>) -> Self {
        Self {
            sequence,
            data: data.into(),
        }
    }
}

/// Fixed-capacity backing store for work items
#[derive(Debug)]
pub struct WorkBuffer {
    slots: Vec<Option<WorkItem>>,
    num_sequence: u16,
}

impl WorkBuffer {
    /// Allocate `len` empty slots
    ///
    /// # Errors
    ///
    /// Returns `HfaError::AllocationFailed` if the buffer cannot be allocated.
    pub fn allocate(len: usize) -> Result<Self> {
        let mut slots: Vec<Option<WorkItem>> = Vec::new();
        slots
            .try_reserve_exact(len)
            .map_err(|_| HfaError::allocation_failed("work entries", len))?;
        slots.resize_with(len, || None);

        tracing::debug!("Allocated space for {len} work entries");

        Ok(Self {
            slots,
            num_sequence: NUM_SEQUENCE,
        })
    }

    /// Number of slots
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// `true` if the buffer has no slots
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Size of the sequence-number space
    #[must_use]
    pub const fn num_sequence(&self) -> u16 {
        self.num_sequence
    }

    /// Fold a running counter into the sequence space
    #[must_use]
    pub fn wrap_sequence(&self, counter: u64) -> u16 {
        // num_sequence fits in u16, so the remainder does too
        u16::try_from(counter % u64::from(self.num_sequence)).unwrap_or(0)
    }

    /// Work item in a slot
    #[must_use]
    pub fn get(&self, slot: usize) -> Option<&WorkItem> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    /// Put a work item into a slot, returning what was there
    ///
    /// # Errors
    ///
    /// Returns `HfaError::SlotOutOfRange` if `slot >= len()`.
    pub fn store(&mut self, slot: usize, item: WorkItem) -> Result<Option<WorkItem>> {
        let len = self.slots.len();
        let entry = self
            .slots
            .get_mut(slot)
            .ok_or(HfaError::SlotOutOfRange { slot, len })?;
        Ok(entry.replace(item))
    }

    /// Empty a slot, returning its work item
    ///
    /// # Errors
    ///
    /// Returns `HfaError::SlotOutOfRange` if `slot >= len()`.
    pub fn take(&mut self, slot: usize) -> Result<Option<WorkItem>> {
        let len = self.slots.len();
        self.slots
            .get_mut(slot)
            .map(Option::take)
            .ok_or(HfaError::SlotOutOfRange { slot, len })
    }

    /// First empty slot, if any
    #[must_use]
    pub fn first_free(&self) -> Option<usize> {
        self.slots.iter().position(Option::is_none)
    }

    /// Number of slots holding work
    #[must_use]
    pub fn occupied(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Empty every slot. Length is unchanged.
    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|s| *s = None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(sequence: u16) -> WorkItem {
        WorkItem::new(sequence, Bytes::from_static(b"\x00\x01\x02\x03"))
    }

    #[test]
    fn allocated_empty_with_fixed_length() {
        let buf = WorkBuffer::allocate(8).unwrap();
        assert_eq!(buf.len(), 8);
        assert_eq!(buf.occupied(), 0);
        assert_eq!(buf.num_sequence(), 1024);
        assert_eq!(buf.first_free(), Some(0));
    }

    #[test]
    fn store_and_take() {
        let mut buf = WorkBuffer::allocate(2).unwrap();
        assert_eq!(buf.store(1, item(5)).unwrap(), None);
        assert_eq!(buf.get(1).map(|w| w.sequence), Some(5));
        assert_eq!(buf.first_free(), Some(0));

        let prev = buf.store(1, item(6)).unwrap();
        assert_eq!(prev.map(|w| w.sequence), Some(5));

        assert_eq!(buf.take(1).unwrap().map(|w| w.sequence), Some(6));
        assert_eq!(buf.take(1).unwrap(), None);
        assert_eq!(buf.len(), 2);
    }

    #[test]
    fn out_of_range_slot() {
        let mut buf = WorkBuffer::allocate(2).unwrap();
        assert!(buf.get(2).is_none());
        assert!(matches!(
            buf.store(2, item(0)),
            Err(HfaError::SlotOutOfRange { slot: 2, len: 2 })
        ));
        assert!(buf.take(9).is_err());
    }

    #[test]
    fn zero_length_buffer() {
        let mut buf = WorkBuffer::allocate(0).unwrap();
        assert!(buf.is_empty());
        assert_eq!(buf.first_free(), None);
        assert!(buf.store(0, item(0)).is_err());
    }

    #[test]
    fn clear_keeps_length() {
        let mut buf = WorkBuffer::allocate(3).unwrap();
        buf.store(0, item(1)).unwrap();
        buf.store(2, item(2)).unwrap();
        assert_eq!(buf.occupied(), 2);
        buf.clear();
        assert_eq!(buf.occupied(), 0);
        assert_eq!(buf.len(), 3);
    }

    #[test]
    fn sequence_wraps() {
        let buf = WorkBuffer::allocate(1).unwrap();
        assert_eq!(buf.wrap_sequence(0), 0);
        assert_eq!(buf.wrap_sequence(1023), 1023);
        assert_eq!(buf.wrap_sequence(1024), 0);
        assert_eq!(buf.wrap_sequence(5000), 5000 % 1024);
    }
}
