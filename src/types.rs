use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Width of a single machine identifier in bytes.
pub const IDENTIFIER_LEN: usize = 6;

/// Byte used to pad identifiers and padding slots.
pub const FILLER_BYTE: u8 = 42;

const TAG_SHIFT: u8 = 5;
const TAG_MASK: u8 = 0b111;
const RESERVED_BIT: u8 = 1 << 4;
const NIBBLE_MASK: u8 = 0x0F;

/// Algorithm used to derive an identifier from hardware facts.
///
/// The discriminant is the 3-bit tag burned into the header byte.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[repr(u8)]
pub enum Strategy {
    /// Disk serial XOR adapter MAC, one identifier per (disk, adapter) pair.
    #[default]
    Default = 0,
    Ethernet = 1,
    IpAddress = 2,
    DiskNumber = 3,
    DiskLabel = 4,
    /// Only ever produced as padding.
    Unknown = 5,
}

impl Strategy {
    /// Every strategy that can generate identifiers.
    pub const GENERATING: [Strategy; 5] = [
        Strategy::Default,
        Strategy::Ethernet,
        Strategy::IpAddress,
        Strategy::DiskNumber,
        Strategy::DiskLabel,
    ];

    pub const fn tag(self) -> u8 {
        self as u8
    }

    /// Maps a 3-bit tag back to a strategy. Tags 6 and 7 are unassigned and read as `Unknown`.
    pub fn from_tag(tag: u8) -> Strategy {
        match tag & TAG_MASK {
            0 => Strategy::Default,
            1 => Strategy::Ethernet,
            2 => Strategy::IpAddress,
            3 => Strategy::DiskNumber,
            4 => Strategy::DiskLabel,
            _ => Strategy::Unknown,
        }
    }

    pub fn is_unknown(self) -> bool {
        self == Strategy::Unknown
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Default => "default",
            Strategy::Ethernet => "ethernet",
            Strategy::IpAddress => "ip-address",
            Strategy::DiskNumber => "disk-number",
            Strategy::DiskLabel => "disk-label",
            Strategy::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown strategy '{0}' (expected one of: default, ethernet, ip-address, disk-number, disk-label)")]
pub struct ParseStrategyError(String);

impl FromStr for Strategy {
    type Err = ParseStrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "default" => Ok(Strategy::Default),
            "ethernet" | "mac" => Ok(Strategy::Ethernet),
            "ip-address" | "ip" => Ok(Strategy::IpAddress),
            "disk-number" | "disk" => Ok(Strategy::DiskNumber),
            "disk-label" | "label" => Ok(Strategy::DiskLabel),
            _ => Err(ParseStrategyError(s.to_string())),
        }
    }
}

/// Unpacked form of an identifier's first byte.
///
/// Layout, most significant bit first: 3 bits strategy tag, 1 reserved bit
/// (parity, never set), 4 bits of payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub strategy_tag: u8,
    pub reserved: bool,
    pub nibble: u8,
}

impl Header {
    pub fn unpack(byte: u8) -> Self {
        Self {
            strategy_tag: (byte >> TAG_SHIFT) & TAG_MASK,
            reserved: byte & RESERVED_BIT != 0,
            nibble: byte & NIBBLE_MASK,
        }
    }

    pub fn pack(self) -> u8 {
        let mut byte = (self.strategy_tag & TAG_MASK) << TAG_SHIFT;
        if self.reserved {
            byte |= RESERVED_BIT;
        }
        byte | (self.nibble & NIBBLE_MASK)
    }

    pub fn strategy(self) -> Strategy {
        Strategy::from_tag(self.strategy_tag)
    }
}

/// A 6-byte machine fingerprint fragment carrying its strategy in the header byte.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Identifier([u8; IDENTIFIER_LEN]);

impl Identifier {
    pub const fn from_bytes(bytes: [u8; IDENTIFIER_LEN]) -> Self {
        Self(bytes)
    }

    /// Slot used when fewer identifiers exist than were requested.
    pub fn padding() -> Self {
        let mut bytes = [FILLER_BYTE; IDENTIFIER_LEN];
        bytes[0] = Header {
            strategy_tag: Strategy::Unknown.tag(),
            reserved: false,
            nibble: 0,
        }
        .pack();
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; IDENTIFIER_LEN] {
        &self.0
    }

    pub fn header(&self) -> Header {
        Header::unpack(self.0[0])
    }

    pub fn strategy(&self) -> Strategy {
        self.header().strategy()
    }

    /// Stamps `strategy` into the header, keeping the low nibble and clearing the reserved bit.
    pub fn tagged(self, strategy: Strategy) -> Self {
        let mut bytes = self.0;
        bytes[0] = Header {
            strategy_tag: strategy.tag(),
            reserved: false,
            nibble: self.header().nibble,
        }
        .pack();
        Self(bytes)
    }

    pub fn is_padding(&self) -> bool {
        *self == Self::padding()
    }
}

impl From<[u8; IDENTIFIER_LEN]> for Identifier {
    fn from(bytes: [u8; IDENTIFIER_LEN]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identifier({} [{}])", self, self.strategy())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_pack_unpack() {
        let header = Header::unpack(0b1011_0110);
        assert_eq!(header.strategy_tag, 0b101);
        assert!(header.reserved);
        assert_eq!(header.nibble, 0b0110);
        assert_eq!(header.pack(), 0b1011_0110);
    }

    #[test]
    fn test_tagging_keeps_nibble_and_clears_reserved() {
        let id = Identifier::from_bytes([0xFF, 1, 2, 3, 4, 5]).tagged(Strategy::DiskNumber);
        assert_eq!(id.as_bytes()[0] >> 5, Strategy::DiskNumber.tag());
        assert_eq!(id.as_bytes()[0] & 0x0F, 0x0F);
        assert!(!id.header().reserved);
        assert_eq!(&id.as_bytes()[1..], &[1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_padding_layout() {
        let pad = Identifier::padding();
        assert_eq!(pad.as_bytes(), &[0xA0, 42, 42, 42, 42, 42]);
        assert_eq!(pad.strategy(), Strategy::Unknown);
        assert!(pad.is_padding());
    }

    #[test]
    fn test_unassigned_tags_are_unknown() {
        assert_eq!(Strategy::from_tag(6), Strategy::Unknown);
        assert_eq!(Strategy::from_tag(7), Strategy::Unknown);
        for strategy in Strategy::GENERATING {
            assert_eq!(Strategy::from_tag(strategy.tag()), strategy);
        }
    }

    #[test]
    fn test_all_zero_identifier_is_default_strategy() {
        assert_eq!(Identifier::default().strategy(), Strategy::Default);
    }

    #[test]
    fn test_strategy_parse() {
        assert_eq!("disk-label".parse::<Strategy>().unwrap(), Strategy::DiskLabel);
        assert_eq!("IP_ADDRESS".parse::<Strategy>().unwrap(), Strategy::IpAddress);
        assert_eq!("mac".parse::<Strategy>().unwrap(), Strategy::Ethernet);
        assert!("unknown".parse::<Strategy>().is_err());
        assert_eq!(Strategy::DiskNumber.to_string(), "disk-number");
    }
}
