use serde::Deserialize;
use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::process::Command;
use tracing::{debug, warn};

use super::inventory::{parse_mac, AdapterInfo, DiskInfo, Inventory, InventoryError};

/// Inventory backed by the running host.
///
/// Linux reads adapters from sysfs and `ip`, whole disks from `lsblk`. macOS
/// parses `ifconfig` and `diskutil`. Other platforms report `Unsupported`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemInventory;

impl SystemInventory {
    pub fn new() -> Self {
        Self
    }
}

impl Inventory for SystemInventory {
    fn disks(&self) -> Result<Vec<DiskInfo>, InventoryError> {
        let disks = if cfg!(target_os = "linux") {
            let output = run("lsblk", &["-J", "-o", LSBLK_COLUMNS])?;
            parse_lsblk(&output)?
        } else if cfg!(target_os = "macos") {
            let output = run("diskutil", &["info", "-all"])?;
            parse_diskutil(&output)
        } else {
            return Err(InventoryError::Unsupported(std::env::consts::OS));
        };
        debug!("Found {} disks", disks.len());
        Ok(disks)
    }

    fn adapters(&self) -> Result<Vec<AdapterInfo>, InventoryError> {
        let adapters = if cfg!(target_os = "linux") {
            linux_adapters()?
        } else if cfg!(target_os = "macos") {
            let output = run("ifconfig", &[])?;
            parse_ifconfig(&output)
        } else {
            return Err(InventoryError::Unsupported(std::env::consts::OS));
        };
        debug!("Found {} network adapters", adapters.len());
        Ok(adapters)
    }
}

fn run(tool: &'static str, args: &[&str]) -> Result<String, InventoryError> {
    let output = Command::new(tool)
        .args(args)
        .output()
        .map_err(|source| InventoryError::Spawn { tool, source })?;

    if !output.status.success() {
        return Err(InventoryError::Command {
            tool,
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn linux_adapters() -> Result<Vec<AdapterInfo>, InventoryError> {
    const SYS_NET: &str = "/sys/class/net";

    let entries = std::fs::read_dir(SYS_NET).map_err(|source| InventoryError::Io {
        path: SYS_NET.to_string(),
        source,
    })?;

    let mut names: Vec<String> = entries
        .flatten()
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| name != "lo")
        .collect();
    names.sort();

    let addresses = match run("ip", &["-o", "-4", "addr", "show"]) {
        Ok(output) => parse_ip_addr(&output),
        Err(e) => {
            warn!("Could not read IPv4 addresses: {}", e);
            HashMap::new()
        }
    };

    let mut adapters = Vec::new();
    for name in names {
        let path = format!("{}/{}/address", SYS_NET, name);
        let Ok(text) = std::fs::read_to_string(&path) else {
            continue;
        };
        let Some(mac) = parse_mac(&text) else {
            continue;
        };
        if mac.iter().all(|b| *b == 0) {
            continue;
        }
        let ipv4 = addresses.get(&name).copied().unwrap_or(Ipv4Addr::UNSPECIFIED);
        adapters.push(AdapterInfo::new(name, mac, ipv4));
    }
    Ok(adapters)
}

/// Parses `ip -o -4 addr show`: first IPv4 address per interface.
pub(crate) fn parse_ip_addr(output: &str) -> HashMap<String, Ipv4Addr> {
    let mut addresses = HashMap::new();
    for line in output.lines() {
        // "2: eth0    inet 10.0.0.5/24 brd 10.0.0.255 scope global eth0\ ..."
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 4 || fields[2] != "inet" {
            continue;
        }
        let name = fields[1].trim_end_matches(':').to_string();
        let addr = fields[3].split('/').next().unwrap_or_default();
        if let Ok(ip) = addr.parse::<Ipv4Addr>() {
            addresses.entry(name).or_insert(ip);
        }
    }
    addresses
}

const LSBLK_COLUMNS: &str = "NAME,TYPE,SERIAL,UUID,LABEL";

#[derive(Debug, Deserialize)]
struct LsblkOutput {
    blockdevices: Vec<LsblkDevice>,
}

#[derive(Debug, Deserialize)]
struct LsblkDevice {
    name: String,
    #[serde(rename = "type")]
    kind: Option<String>,
    serial: Option<String>,
    uuid: Option<String>,
    label: Option<String>,
    #[serde(default)]
    children: Vec<LsblkDevice>,
}

impl LsblkDevice {
    fn is_disk(&self) -> bool {
        self.kind.as_deref() == Some("disk")
    }

    // Depth-first: the device itself, then its partitions.
    fn first_of<F>(&self, field: F) -> Option<String>
    where
        F: Fn(&LsblkDevice) -> &Option<String> + Copy,
    {
        non_empty(field(self).clone())
            .or_else(|| self.children.iter().find_map(|child| child.first_of(field)))
    }
}

/// Parses the `lsblk -J` tree, one entry per whole disk.
///
/// Partitions, loop devices and optical drives are not disks. A disk without a
/// hardware serial (common for virtual disks) falls back to the first filesystem
/// UUID on it; with neither it is skipped. The label is the first one found on
/// the disk or its partitions.
pub(crate) fn parse_lsblk(output: &str) -> Result<Vec<DiskInfo>, InventoryError> {
    let parsed: LsblkOutput = serde_json::from_str(output).map_err(|e| InventoryError::Parse {
        tool: "lsblk",
        message: e.to_string(),
    })?;

    let disks = parsed
        .blockdevices
        .into_iter()
        .filter(LsblkDevice::is_disk)
        .filter_map(|device| {
            let serial = non_empty(device.serial.clone()).or_else(|| device.first_of(|d| &d.uuid))?;
            let label = device.first_of(|d| &d.label).unwrap_or_default();
            Some(DiskInfo::new(device.name, serial, label))
        })
        .collect();
    Ok(disks)
}

/// Parses `diskutil info -all`, one section per device.
pub(crate) fn parse_diskutil(output: &str) -> Vec<DiskInfo> {
    let mut disks = Vec::new();
    for section in output.split("**********") {
        let mut fields = HashMap::new();
        for line in section.lines() {
            if let Some((key, value)) = line.split_once(':') {
                fields.insert(key.trim(), value.trim());
            }
        }
        let Some(name) = fields.get("Device Identifier") else {
            continue;
        };
        let serial = ["Volume UUID", "Disk / Partition UUID"]
            .iter()
            .find_map(|key| fields.get(key).filter(|v| !v.is_empty()));
        let Some(serial) = serial else {
            continue;
        };
        let label = fields
            .get("Volume Name")
            .filter(|v| !v.starts_with("Not applicable"))
            .copied()
            .unwrap_or_default();
        disks.push(DiskInfo::new(*name, *serial, label));
    }
    disks
}

/// Parses BSD-style `ifconfig` output. Interfaces without an `ether` line are skipped.
pub(crate) fn parse_ifconfig(output: &str) -> Vec<AdapterInfo> {
    let mut adapters = Vec::new();
    let mut current: Option<(String, Option<Vec<u8>>, Option<Ipv4Addr>)> = None;

    let mut flush = |entry: Option<(String, Option<Vec<u8>>, Option<Ipv4Addr>)>| {
        if let Some((name, Some(mac), ip)) = entry {
            if name != "lo0" && mac.iter().any(|b| *b != 0) {
                adapters.push(AdapterInfo::new(name, mac, ip.unwrap_or(Ipv4Addr::UNSPECIFIED)));
            }
        }
    };

    for line in output.lines() {
        if !line.starts_with(char::is_whitespace) && !line.is_empty() {
            flush(current.take());
            let name = line.split(':').next().unwrap_or_default().to_string();
            current = Some((name, None, None));
            continue;
        }
        let Some((_, mac, ip)) = current.as_mut() else {
            continue;
        };
        let mut words = line.split_whitespace();
        match words.next() {
            Some("ether") => *mac = words.next().and_then(parse_mac),
            Some("inet") if ip.is_none() => *ip = words.next().and_then(|w| w.parse().ok()),
            _ => {}
        }
    }
    flush(current.take());
    adapters
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
