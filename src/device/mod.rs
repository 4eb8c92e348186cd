pub mod fingerprint;
pub mod inventory;
pub mod snapshot;

pub use fingerprint::SystemInventory;
pub use inventory::{AdapterInfo, DiskInfo, Inventory, InventoryError};
pub use snapshot::InventorySnapshot;
