//! Per-variant work-unit tuning.
//!
//! A work unit tells a chip how much of the nonce space to search before
//! reporting back. The FPGA boards cannot cover the full 32-bit range in a
//! reasonable time, so they get a fixed loop count instead.

use crate::usb::DeviceVariant;

/// Hash loops for the full nonce range. Encoded as zero on the wire.
pub const FULL_NONCE_RANGE: u64 = 0;

/// ExpressAGX, and Virtex 7 in the fast configuration.
pub const FAST_FPGA_HASH_LOOPS: u64 = 1 << 26;

/// Virtex 7 in the slow configuration.
pub const SLOW_FPGA_HASH_LOOPS: u64 = 1 << 30;

/// Virtex 7 boards with more cores than this run the fast configuration.
pub const VIRTEX7_FAST_CORE_THRESHOLD: u32 = 5;

/// Size of the sequence-number space used to correlate completions with
/// work-buffer slots.
pub const NUM_SEQUENCE: u16 = 1024;

/// Max search difficulty programmed at detect time.
pub const DEFAULT_MAX_SEARCH_DIFFICULTY: u32 = 12;

/// Hash loops per work unit for a variant and core count.
///
/// | Variant | hash loops |
/// |---------|------------|
/// | Generic | 0 (full range) |
/// | ExpressAGX | 2^26 |
/// | Virtex7, cores > 5 | 2^26 |
/// | Virtex7, cores ≤ 5 | 2^30 |
#[must_use]
pub const fn hash_loops(variant: DeviceVariant, cores_per_chip: u32) -> u64 {
    match variant {
        DeviceVariant::Generic => FULL_NONCE_RANGE,
        DeviceVariant::ExpressAgx => FAST_FPGA_HASH_LOOPS,
        DeviceVariant::Virtex7 => {
            if cores_per_chip > VIRTEX7_FAST_CORE_THRESHOLD {
                FAST_FPGA_HASH_LOOPS
            } else {
                SLOW_FPGA_HASH_LOOPS
            }
        }
    }
}
