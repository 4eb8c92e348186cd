use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use thiserror::Error;

use crate::types::IDENTIFIER_LEN;

/// Failure to enumerate hardware.
#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("failed to run {tool}: {source}")]
    Spawn {
        tool: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} exited with {status}: {stderr}")]
    Command {
        tool: &'static str,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("failed to parse {tool} output: {message}")]
    Parse { tool: &'static str, message: String },

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("hardware enumeration is not supported on {0}")]
    Unsupported(&'static str),

    #[error("{0}")]
    Unavailable(String),
}

/// A storage device as reported by the inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskInfo {
    pub name: String,
    #[serde(with = "text_bytes")]
    pub serial: Vec<u8>,
    #[serde(with = "text_bytes", default)]
    pub label: Vec<u8>,
}

impl DiskInfo {
    pub fn new(name: impl Into<String>, serial: impl Into<Vec<u8>>, label: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            serial: serial.into(),
            label: label.into(),
        }
    }

    /// Serial bytes 2..8; the leading two bytes are skipped.
    pub fn serial_payload(&self) -> [u8; IDENTIFIER_LEN] {
        payload(&self.serial, 2)
    }

    pub fn label_payload(&self) -> [u8; IDENTIFIER_LEN] {
        payload(&self.label, 0)
    }
}

/// A network adapter as reported by the inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterInfo {
    pub name: String,
    #[serde(with = "mac_text")]
    pub mac_address: Vec<u8>,
    pub ipv4_address: Ipv4Addr,
}

impl AdapterInfo {
    pub fn new(name: impl Into<String>, mac_address: impl Into<Vec<u8>>, ipv4_address: Ipv4Addr) -> Self {
        Self {
            name: name.into(),
            mac_address: mac_address.into(),
            ipv4_address,
        }
    }

    /// MAC bytes 2..8; the leading two bytes are skipped.
    pub fn mac_payload(&self) -> [u8; IDENTIFIER_LEN] {
        payload(&self.mac_address, 2)
    }

    /// The four address octets followed by two filler bytes.
    pub fn ip_payload(&self) -> [u8; IDENTIFIER_LEN] {
        let mut out = [crate::types::FILLER_BYTE; IDENTIFIER_LEN];
        out[..4].copy_from_slice(&self.ipv4_address.octets());
        out
    }
}

/// Source of hardware facts. Implementations only read; the core copies what it needs.
pub trait Inventory {
    fn disks(&self) -> Result<Vec<DiskInfo>, InventoryError>;

    fn adapters(&self) -> Result<Vec<AdapterInfo>, InventoryError>;
}

impl<T: Inventory + ?Sized> Inventory for &T {
    fn disks(&self) -> Result<Vec<DiskInfo>, InventoryError> {
        (**self).disks()
    }

    fn adapters(&self) -> Result<Vec<AdapterInfo>, InventoryError> {
        (**self).adapters()
    }
}

impl<T: Inventory + ?Sized> Inventory for Box<T> {
    fn disks(&self) -> Result<Vec<DiskInfo>, InventoryError> {
        (**self).disks()
    }

    fn adapters(&self) -> Result<Vec<AdapterInfo>, InventoryError> {
        (**self).adapters()
    }
}

// Six bytes starting at `skip`; missing source bytes read as zero.
fn payload(source: &[u8], skip: usize) -> [u8; IDENTIFIER_LEN] {
    let mut out = [0u8; IDENTIFIER_LEN];
    for (dst, src) in out.iter_mut().zip(source.iter().skip(skip)) {
        *dst = *src;
    }
    out
}

/// Parses `aa:bb:cc:dd:ee:ff` (also `-` separated) into bytes.
pub fn parse_mac(text: &str) -> Option<Vec<u8>> {
    let bytes = text
        .trim()
        .split(|c| c == ':' || c == '-')
        .map(|part| u8::from_str_radix(part, 16).ok())
        .collect::<Option<Vec<u8>>>()?;
    if bytes.len() < 6 {
        return None;
    }
    Some(bytes)
}

pub fn format_mac(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(":")
}

// Readable text when the bytes are UTF-8, otherwise an array of byte values.
mod text_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Text(String),
        Raw(Vec<u8>),
    }

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        match std::str::from_utf8(bytes) {
            Ok(text) => serializer.serialize_str(text),
            Err(_) => serializer.collect_seq(bytes),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        Ok(match Repr::deserialize(deserializer)? {
            Repr::Text(text) => text.into_bytes(),
            Repr::Raw(bytes) => bytes,
        })
    }
}

mod mac_text {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_mac(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        super::parse_mac(&text)
            .ok_or_else(|| de::Error::custom(format!("invalid MAC address '{}'", text)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serial_payload_skips_two_bytes() {
        let disk = DiskInfo::new("sda", *b"\0\0SN1234", "VOL001");
        assert_eq!(&disk.serial_payload(), b"SN1234");
        assert_eq!(&disk.label_payload(), b"VOL001");
    }

    #[test]
    fn test_short_sources_are_zero_filled() {
        let disk = DiskInfo::new("sdb", "ABC", "BOOT");
        assert_eq!(disk.serial_payload(), [b'C', 0, 0, 0, 0, 0]);
        assert_eq!(&disk.label_payload(), b"BOOT\0\0");
    }

    #[test]
    fn test_adapter_payloads() {
        let adapter = AdapterInfo::new(
            "eth0",
            vec![0x00, 0x1a, 0x2b, 0x3c, 0x4d, 0x5e],
            Ipv4Addr::new(192, 168, 1, 20),
        );
        assert_eq!(adapter.mac_payload(), [0x2b, 0x3c, 0x4d, 0x5e, 0, 0]);
        assert_eq!(adapter.ip_payload(), [192, 168, 1, 20, 42, 42]);
    }

    #[test]
    fn test_parse_mac() {
        assert_eq!(
            parse_mac("00:1A:2b:3c:4d:5e"),
            Some(vec![0x00, 0x1a, 0x2b, 0x3c, 0x4d, 0x5e])
        );
        assert_eq!(parse_mac("00-1a-2b-3c-4d-5e").map(|m| m.len()), Some(6));
        assert_eq!(parse_mac("00:1a:2b"), None);
        assert_eq!(parse_mac("zz:1a:2b:3c:4d:5e"), None);
        assert_eq!(format_mac(&[0, 0x1a, 0xff]), "00:1a:ff");
    }
}
