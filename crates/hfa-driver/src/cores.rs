//! Per-core runtime state
//!
//! A chip × core grid built from the board topology. Every core starts
//! enabled; fault handling outside this crate may switch cores off.

use crate::error::{HfaError, Result};
use hfa_chip::Topology;

/// Runtime flags for a single hashing core
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Core {
    /// Core accepts work
    pub enabled: bool,
}

impl Default for Core {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Chip × core grid, stored row-major (one row per chip)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreMatrix {
    chips: u32,
    cores_per_chip: u32,
    cores: Vec<Core>,
}

impl CoreMatrix {
    /// Allocate the grid for a topology, all cores enabled
    ///
    /// # Errors
    ///
    /// Returns `HfaError::AllocationFailed` if the grid cannot be allocated.
    /// There is no partially allocated matrix.
    pub fn allocate(topology: &Topology) -> Result<Self> {
        let chips = topology.chips();
        let cores_per_chip = topology.cores_per_chip();

        let total = topology
            .total_cores()
            .ok_or(HfaError::allocation_failed("cores", usize::MAX))?;
        let total = usize::try_from(total)
            .map_err(|_| HfaError::allocation_failed("cores", usize::MAX))?;

        let mut cores: Vec<Core> = Vec::new();
        cores
            .try_reserve_exact(total)
            .map_err(|_| HfaError::allocation_failed("cores", total))?;
        cores.resize(total, Core::default());

        tracing::debug!("Allocated core matrix: {chips} chip(s) × {cores_per_chip} core(s)");

        Ok(Self {
            chips,
            cores_per_chip,
            cores,
        })
    }

    /// Number of rows (chips)
    #[must_use]
    pub const fn chips(&self) -> u32 {
        self.chips
    }

    /// Number of columns (cores per chip)
    #[must_use]
    pub const fn cores_per_chip(&self) -> u32 {
        self.cores_per_chip
    }

    /// Total number of cores in the grid
    #[must_use]
    pub fn len(&self) -> usize {
        self.cores.len()
    }

    /// `true` if the grid has no cores
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cores.is_empty()
    }

    fn offset(&self, chip: u32, core: u32) -> Option<usize> {
        if chip >= self.chips || core >= self.cores_per_chip {
            return None;
        }
        let chip = usize::try_from(chip).ok()?;
        let core = usize::try_from(core).ok()?;
        let stride = usize::try_from(self.cores_per_chip).ok()?;
        Some(chip * stride + core)
    }

    /// Core at (chip, core), if in range
    #[must_use]
    pub fn get(&self, chip: u32, core: u32) -> Option<&Core> {
        self.offset(chip, core).map(|i| &self.cores[i])
    }

    /// One chip's cores, if the chip exists
    #[must_use]
    pub fn row(&self, chip: u32) -> Option<&[Core]> {
        if chip >= self.chips {
            return None;
        }
        let chip = usize::try_from(chip).ok()?;
        let stride = usize::try_from(self.cores_per_chip).ok()?;
        let start = chip * stride;
        Some(&self.cores[start..start + stride])
    }

    /// Iterate rows, one slice per chip
    pub fn rows(&self) -> impl Iterator<Item = &[Core]> {
        // one slice per chip, empty when there are no cores per chip
        let stride = usize::try_from(self.cores_per_chip).unwrap_or(0);
        let chips = usize::try_from(self.chips).unwrap_or(0);
        (0..chips).map(move |chip| &self.cores[chip * stride..(chip + 1) * stride])
    }

    /// Enable or disable one core
    ///
    /// # Errors
    ///
    /// Returns `HfaError::CoreOutOfRange` if the address is outside the grid.
    pub fn set_enabled(&mut self, chip: u32, core: u32, enabled: bool) -> Result<()> {
        let i = self
            .offset(chip, core)
            .ok_or(HfaError::CoreOutOfRange { chip, core })?;
        if self.cores[i].enabled != enabled {
            tracing::debug!(
                "Core {chip}:{core} {}",
                if enabled { "enabled" } else { "disabled" }
            );
        }
        self.cores[i].enabled = enabled;
        Ok(())
    }

    /// Disable one core
    ///
    /// # Errors
    ///
    /// Returns `HfaError::CoreOutOfRange` if the address is outside the grid.
    pub fn disable(&mut self, chip: u32, core: u32) -> Result<()> {
        self.set_enabled(chip, core, false)
    }

    /// `true` if the core exists and is enabled
    #[must_use]
    pub fn is_enabled(&self, chip: u32, core: u32) -> bool {
        self.get(chip, core).is_some_and(|c| c.enabled)
    }

    /// Number of enabled cores
    #[must_use]
    pub fn enabled_count(&self) -> usize {
        self.cores.iter().filter(|c| c.enabled).count()
    }
}
