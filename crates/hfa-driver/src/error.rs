//! Error types for accelerator attach and pool operations

use thiserror::Error;

/// Result type alias for driver operations
pub type Result<T> = std::result::Result<T, HfaError>;

/// Errors that can occur while sizing, attaching or driving a device
#[derive(Debug, Error)]
pub enum HfaError {
    /// A setup-time allocation could not be satisfied
    #[error("Failed to allocate {count} {what}")]
    AllocationFailed {
        /// What was being allocated
        what: &'static str,
        /// Number of elements requested (saturated on overflow)
        count: usize,
    },

    /// Reset / detect exchange with the device failed
    #[error("Reset failed for device {device_id}: {reason}")]
    ResetFailed {
        /// Host-assigned device id
        device_id: usize,
        /// Reason for failure
        reason: String,
    },

    /// A device is already registered under this id
    #[error("Device {device_id} is already registered")]
    AlreadyRegistered {
        /// Host-assigned device id
        device_id: usize,
    },

    /// Job is not on the active queue
    #[error("Job {job} is not active")]
    JobNotActive {
        /// Arena index of the job
        job: usize,
    },

    /// Job id was issued by a different arena
    #[error("Job {job} belongs to another arena")]
    ForeignJob {
        /// Arena index of the job
        job: usize,
    },

    /// Job index past the end of this arena
    #[error("Job {job} out of range (arena holds {capacity} jobs)")]
    JobOutOfRange {
        /// Arena index of the job
        job: usize,
        /// Number of jobs in the arena
        capacity: usize,
    },

    /// Work buffer slot index out of range
    #[error("Work slot {slot} out of range (buffer holds {len} slots)")]
    SlotOutOfRange {
        /// Requested slot
        slot: usize,
        /// Buffer length
        len: usize,
    },

    /// Core address outside the chip × core grid
    #[error("Core {chip}:{core} out of range")]
    CoreOutOfRange {
        /// Chip index
        chip: u32,
        /// Core index within the chip
        core: u32,
    },

    /// Device is in an invalid state
    #[error("Device in invalid state: {state}")]
    InvalidState {
        /// Current state description
        state: String,
    },
}

impl HfaError {
    /// Create an allocation failure error
    pub const fn allocation_failed(what: &'static str, count: usize) -> Self {
        Self::AllocationFailed { what, count }
    }

    /// Create a reset failed error
    pub fn reset_failed(device_id: usize, reason: impl Into<String>) -> Self {
        Self::ResetFailed {
            device_id,
            reason: reason.into(),
        }
    }

    /// Create an invalid state error
    pub fn invalid_state(state: impl Into<String>) -> Self {
        Self::InvalidState {
            state: state.into(),
        }
    }

    /// `true` for failures that leave no usable device and must abort the
    /// whole attach sequence rather than just the one device.
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::AllocationFailed { .. })
    }
}
