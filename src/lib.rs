//! Hardware-bound machine signatures for node-locked licensing.
//!
//! A machine derives 6-byte [`Identifier`]s from its disks and network adapters
//! under a [`Strategy`], packs two of them into a [`Signature`]
//! (`XXXX-XXXX-XXXX-XXXX`) and later checks that a presented signature still
//! matches its hardware.
//!
//! ```no_run
//! use pc_signature::{IdentifierGenerator, SignatureIssuer, SignatureValidator, Strategy, SystemInventory};
//!
//! let generator = IdentifierGenerator::new(SystemInventory::new());
//! let signature = SignatureIssuer::issue(&generator, Strategy::DiskNumber)?;
//! let verdict = SignatureValidator::validate(&generator, signature.as_str())?;
//! assert!(verdict.is_ok());
//! # Ok::<(), pc_signature::Error>(())
//! ```

pub mod config;
pub mod device;
pub mod error;
pub mod signature;
pub mod types;

pub use device::{AdapterInfo, DiskInfo, Inventory, InventoryError, InventorySnapshot, SystemInventory};
pub use error::{Error, SignatureError};
pub use signature::{IdentifierGenerator, Signature, SignatureIssuer, SignatureValidator, Verdict};
pub use types::{Header, Identifier, Strategy, FILLER_BYTE, IDENTIFIER_LEN};
