//! Per-device sizing and pool bundle
//!
//! A [`Device`] is built in one go from a topology: core matrix, inflight
//! target, job arena, then work buffer. Any failure drops everything built
//! so far, so a half-sized device never exists.
//!
//! Once built the device is shared as `Arc<Device>`. The job arena and work
//! buffer each sit behind a `Mutex` and the core matrix behind an `RwLock`,
//! giving one exclusive mutator per structure whatever threads the
//! dispatch loop runs on.

use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::arena::JobArena;
use crate::backpressure::Backpressure;
use crate::config::AttachConfig;
use crate::cores::CoreMatrix;
use crate::error::{HfaError, Result};
use crate::work::WorkBuffer;
use hfa_chip::{DeviceVariant, Topology};

/// One attached accelerator and the resources sized for it
#[derive(Debug)]
pub struct Device {
    id: usize,
    topology: Topology,
    config: AttachConfig,
    hash_loops: u64,
    backpressure: Backpressure,
    cores: RwLock<CoreMatrix>,
    jobs: Mutex<JobArena>,
    work: Mutex<WorkBuffer>,
}

impl Device {
    /// Size and allocate every resource for a board
    ///
    /// # Errors
    ///
    /// Returns `HfaError::AllocationFailed` if any pool cannot be allocated.
    pub fn build(id: usize, topology: Topology, config: AttachConfig) -> Result<Self> {
        let backpressure = Backpressure::from_topology(&topology)?;
        let hash_loops = topology.hash_loops();

        tracing::info!(
            "Hashfast detect: chips {} cores {} inflight_target {} entries",
            topology.chips(),
            topology.cores_per_chip(),
            backpressure.inflight_target()
        );

        let cores = CoreMatrix::allocate(&topology)?;

        let jobs = JobArena::allocate(backpressure.job_count())?;
        tracing::info!("Hashfast detect: allocated {} job entries", jobs.capacity());

        let work = WorkBuffer::allocate(backpressure.max_work())?;
        tracing::info!(
            "Hashfast detect: allocated space for {} work entries",
            work.len()
        );

        if topology.is_empty() {
            tracing::warn!("Device {id} reports no cores; it will never accept work");
        }

        Ok(Self {
            id,
            topology,
            config,
            hash_loops,
            backpressure,
            cores: RwLock::new(cores),
            jobs: Mutex::new(jobs),
            work: Mutex::new(work),
        })
    }

    /// Host-assigned device id
    #[must_use]
    pub const fn id(&self) -> usize {
        self.id
    }

    /// Board topology
    #[must_use]
    pub const fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Board variant
    #[must_use]
    pub const fn variant(&self) -> DeviceVariant {
        self.topology.variant()
    }

    /// Configuration the device was attached with
    #[must_use]
    pub const fn config(&self) -> &AttachConfig {
        &self.config
    }

    /// Control link baud rate
    #[must_use]
    pub const fn baud_rate(&self) -> u32 {
        self.config.baud_rate
    }

    /// Hash loops per work unit (0 = full nonce range)
    #[must_use]
    pub const fn hash_loops(&self) -> u64 {
        self.hash_loops
    }

    /// Concurrency ceiling
    #[must_use]
    pub const fn backpressure(&self) -> &Backpressure {
        &self.backpressure
    }

    /// Maximum number of active jobs
    #[must_use]
    pub const fn inflight_target(&self) -> usize {
        self.backpressure.inflight_target()
    }

    /// Read access to the core matrix
    ///
    /// # Errors
    ///
    /// Returns `HfaError::InvalidState` if a writer panicked.
    pub fn cores(&self) -> Result<RwLockReadGuard<'_, CoreMatrix>> {
        self.cores.read().map_err(|_| self.poisoned("core matrix"))
    }

    /// Write access to the core matrix
    ///
    /// # Errors
    ///
    /// Returns `HfaError::InvalidState` if a writer panicked.
    pub fn cores_mut(&self) -> Result<RwLockWriteGuard<'_, CoreMatrix>> {
        self.cores.write().map_err(|_| self.poisoned("core matrix"))
    }

    /// Exclusive access to the job arena
    ///
    /// # Errors
    ///
    /// Returns `HfaError::InvalidState` if a holder panicked.
    pub fn jobs(&self) -> Result<MutexGuard<'_, JobArena>> {
        self.jobs.lock().map_err(|_| self.poisoned("job arena"))
    }

    /// Exclusive access to the work buffer
    ///
    /// # Errors
    ///
    /// Returns `HfaError::InvalidState` if a holder panicked.
    pub fn work(&self) -> Result<MutexGuard<'_, WorkBuffer>> {
        self.work.lock().map_err(|_| self.poisoned("work buffer"))
    }

    /// Snapshot of sizing facts and pool occupancy
    ///
    /// # Errors
    ///
    /// Returns `HfaError::InvalidState` if a lock is poisoned.
    pub fn summary(&self) -> Result<DeviceSummary> {
        let enabled_cores = self.cores()?.enabled_count();
        let (active_jobs, inactive_jobs) = {
            let jobs = self.jobs()?;
            (jobs.active_count(), jobs.inactive_count())
        };
        let work_len = self.work()?.len();

        Ok(DeviceSummary {
            id: self.id,
            topology: self.topology,
            baud_rate: self.config.baud_rate,
            hash_loops: self.hash_loops,
            inflight_target: self.inflight_target(),
            enabled_cores,
            active_jobs,
            inactive_jobs,
            work_len,
        })
    }

    fn poisoned(&self, what: &str) -> HfaError {
        HfaError::invalid_state(format!("device {}: {what} lock poisoned", self.id))
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        tracing::debug!("Releasing resources for device {}", self.id);
    }
}

/// Plain-data view of a device for statistics and reporting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSummary {
    /// Host-assigned device id
    pub id: usize,
    /// Board topology
    pub topology: Topology,
    /// Control link baud rate
    pub baud_rate: u32,
    /// Hash loops per work unit
    pub hash_loops: u64,
    /// Concurrency ceiling
    pub inflight_target: usize,
    /// Cores currently enabled
    pub enabled_cores: usize,
    /// Jobs on the active queue
    pub active_jobs: usize,
    /// Jobs on the inactive queue
    pub inactive_jobs: usize,
    /// Work buffer length
    pub work_len: usize,
}

impl std::fmt::Display for DeviceSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "HFA {}: {} @ {} baud, hash_loops {}, ",
            self.id, self.topology, self.baud_rate, self.hash_loops
        )?;
        write!(
            f,
            "inflight {}/{} (free {}), cores enabled {}, work slots {}",
            self.active_jobs,
            self.inflight_target,
            self.inactive_jobs,
            self.enabled_cores,
            self.work_len
        )
    }
}
