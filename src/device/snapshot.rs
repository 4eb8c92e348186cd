use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

use super::inventory::{AdapterInfo, DiskInfo, Inventory, InventoryError};

/// A frozen hardware inventory, stored as TOML.
///
/// Lets a license authority issue a signature on behalf of a machine it has a
/// snapshot of, and serves as a fixture wherever a live host is not wanted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventorySnapshot {
    #[serde(default)]
    pub disks: Vec<DiskInfo>,
    #[serde(default)]
    pub adapters: Vec<AdapterInfo>,
}

impl InventorySnapshot {
    pub fn new(disks: Vec<DiskInfo>, adapters: Vec<AdapterInfo>) -> Self {
        Self { disks, adapters }
    }

    /// Reads every fact from `inventory` once.
    pub fn capture(inventory: &dyn Inventory) -> Result<Self, InventoryError> {
        Ok(Self {
            disks: inventory.disks()?,
            adapters: inventory.adapters()?,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read inventory snapshot {:?}", path))?;

        let snapshot: InventorySnapshot = toml::from_str(&text)
            .with_context(|| format!("Failed to parse inventory snapshot {:?}", path))?;

        info!(
            "Loaded inventory snapshot: {} disks, {} adapters",
            snapshot.disks.len(),
            snapshot.adapters.len()
        );
        Ok(snapshot)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize inventory snapshot")
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_toml()?).context("Failed to write inventory snapshot")?;
        Ok(())
    }
}

impl Inventory for InventorySnapshot {
    fn disks(&self) -> Result<Vec<DiskInfo>, InventoryError> {
        Ok(self.disks.clone())
    }

    fn adapters(&self) -> Result<Vec<AdapterInfo>, InventoryError> {
        Ok(self.adapters.clone())
    }
}
