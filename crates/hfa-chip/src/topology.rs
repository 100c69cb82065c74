//! Board topology as reported by the reset exchange.
//!
//! All downstream sizing (core matrix, job pool, work buffer, inflight
//! target) is a pure function of the three fields held here.

use crate::tuning;
use crate::usb::DeviceVariant;

/// Chip × core shape of one attached board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Topology {
    chips: u32,
    cores_per_chip: u32,
    variant: DeviceVariant,
}

impl Topology {
    /// Single-chip, single-core G1 board. Smallest useful shape.
    pub const MINIMAL: Self = Self::new(1, 1, DeviceVariant::Generic);

    /// Build a topology. Zero chips or zero cores is allowed and yields a
    /// board with no capacity.
    #[must_use]
    pub const fn new(chips: u32, cores_per_chip: u32, variant: DeviceVariant) -> Self {
        Self {
            chips,
            cores_per_chip,
            variant,
        }
    }

    /// Number of hashing chips on the board.
    #[must_use]
    pub const fn chips(&self) -> u32 {
        self.chips
    }

    /// Cores on each chip.
    #[must_use]
    pub const fn cores_per_chip(&self) -> u32 {
        self.cores_per_chip
    }

    /// Board variant.
    #[must_use]
    pub const fn variant(&self) -> DeviceVariant {
        self.variant
    }

    /// Total cores on the board, `None` on overflow.
    #[must_use]
    pub const fn total_cores(&self) -> Option<u32> {
        self.chips.checked_mul(self.cores_per_chip)
    }

    /// Work units budgeted per core: one pending, one active.
    pub const SLOTS_PER_CORE: u32 = 2;

    /// Inflight target, `chips × cores × 2`. `None` on overflow.
    #[must_use]
    pub const fn inflight_target(&self) -> Option<u32> {
        match self.total_cores() {
            Some(cores) => cores.checked_mul(Self::SLOTS_PER_CORE),
            None => None,
        }
    }

    /// Hash loops per work unit for this board (see [`tuning::hash_loops`]).
    #[must_use]
    pub const fn hash_loops(&self) -> u64 {
        tuning::hash_loops(self.variant, self.cores_per_chip)
    }

    /// `true` when the board has no cores at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.chips == 0 || self.cores_per_chip == 0
    }
}

impl std::fmt::Display for Topology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} with {} chip(s) × {} core(s)",
            self.variant, self.chips, self.cores_per_chip
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inflight_target_is_two_per_core() {
        for chips in 0..6 {
            for cores in 0..10 {
                let t = Topology::new(chips, cores, DeviceVariant::Generic);
                assert_eq!(t.inflight_target(), Some(chips * cores * 2));
            }
        }
    }

    #[test]
    fn minimal_board() {
        assert_eq!(Topology::MINIMAL.inflight_target(), Some(2));
        assert!(!Topology::MINIMAL.is_empty());
    }

    #[test]
    fn zero_sized_board_is_empty_not_broken() {
        let t = Topology::new(0, 96, DeviceVariant::Generic);
        assert!(t.is_empty());
        assert_eq!(t.inflight_target(), Some(0));
    }

    #[test]
    fn overflow_is_detected() {
        let t = Topology::new(u32::MAX, 2, DeviceVariant::Generic);
        assert_eq!(t.total_cores(), None);
        assert_eq!(t.inflight_target(), None);

        let t = Topology::new(u32::MAX / 2 + 1, 1, DeviceVariant::Generic);
        assert!(t.total_cores().is_some());
        assert_eq!(t.inflight_target(), None);
    }
}
