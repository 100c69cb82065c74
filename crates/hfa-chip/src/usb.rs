//! USB identifiers, link constants and device variants.
//!
//! The transport itself lives outside this workspace; these are the numbers
//! it is configured with before the reset exchange runs.

/// HashFast vendor ID.
pub const HASHFAST_VENDOR_ID: u16 = 0x297C;

/// Product ID shared by the HashFast boards.
pub const HASHFAST_PRODUCT_ID: u16 = 0x0001;

/// Preferred USB bulk packet size in bytes.
pub const USB_PACKET_SIZE: usize = 512;

/// Miner threads spawned per attached board.
pub const MINER_THREADS: usize = 1;

/// Baud rate of the control link when nothing else is configured.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Raw device-type codes reported by the reset exchange.
pub mod device_type {
    /// G1 production board.
    pub const G1: u8 = 0;
    /// ExpressAGX FPGA development board.
    pub const EXPRESS_AGX: u8 = 1;
    /// Xilinx VC709 (Virtex 7) FPGA board.
    pub const VC709: u8 = 2;
}

/// Format a `vendor:product` string for use with `lsusb -d`.
#[must_use]
pub fn lsusb_filter() -> String {
    format!("{HASHFAST_VENDOR_ID:04x}:{HASHFAST_PRODUCT_ID:04x}")
}

/// Device variant reported at reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DeviceVariant {
    /// G1 ASIC board, and anything we do not recognise.
    #[default]
    Generic,
    /// ExpressAGX FPGA board.
    ExpressAgx,
    /// Virtex 7 (VC709) FPGA board.
    Virtex7,
}

impl DeviceVariant {
    /// Identify variant from the raw device-type code. Unknown codes fall
    /// back to [`DeviceVariant::Generic`].
    #[must_use]
    pub const fn from_device_type(code: u8) -> Self {
        match code {
            device_type::EXPRESS_AGX => Self::ExpressAgx,
            device_type::VC709 => Self::Virtex7,
            _ => Self::Generic,
        }
    }

    /// Raw device-type code for this variant.
    #[must_use]
    pub const fn device_type(&self) -> u8 {
        match self {
            Self::Generic => device_type::G1,
            Self::ExpressAgx => device_type::EXPRESS_AGX,
            Self::Virtex7 => device_type::VC709,
        }
    }

    /// Short lowercase name, as accepted on the command line.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Generic => "generic",
            Self::ExpressAgx => "express-agx",
            Self::Virtex7 => "virtex7",
        }
    }

    /// Parse a variant name. Accepts the [`DeviceVariant::name`] spellings
    /// plus the board names `g1` and `vc709`.
    #[must_use]
    pub fn from_name(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "generic" | "g1" => Some(Self::Generic),
            "express-agx" | "expressagx" | "agx" => Some(Self::ExpressAgx),
            "virtex7" | "vc709" | "v7" => Some(Self::Virtex7),
            _ => None,
        }
    }
}

impl std::fmt::Display for DeviceVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Generic => write!(f, "G1"),
            Self::ExpressAgx => write!(f, "ExpressAGX"),
            Self::Virtex7 => write!(f, "Virtex7 (VC709)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_device_type_is_generic() {
        assert_eq!(DeviceVariant::from_device_type(0), DeviceVariant::Generic);
        assert_eq!(DeviceVariant::from_device_type(0x7F), DeviceVariant::Generic);
        assert_eq!(DeviceVariant::from_device_type(1), DeviceVariant::ExpressAgx);
        assert_eq!(DeviceVariant::from_device_type(2), DeviceVariant::Virtex7);
    }

    #[test]
    fn names_parse_back() {
        for v in [DeviceVariant::Generic, DeviceVariant::ExpressAgx, DeviceVariant::Virtex7] {
            assert_eq!(DeviceVariant::from_name(v.name()), Some(v));
            assert_eq!(DeviceVariant::from_device_type(v.device_type()), v);
        }
        assert_eq!(DeviceVariant::from_name("VC709"), Some(DeviceVariant::Virtex7));
        assert_eq!(DeviceVariant::from_name("bogus"), None);
    }

    #[test]
    fn lsusb_filter_format() {
        assert_eq!(lsusb_filter(), "297c:0001");
    }
}
