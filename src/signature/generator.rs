use tracing::{debug, warn};

use crate::device::Inventory;
use crate::error::Error;
use crate::types::{Identifier, Strategy, IDENTIFIER_LEN};

/// Derives the machine identifiers for a strategy from an [`Inventory`].
pub struct IdentifierGenerator<I> {
    inventory: I,
}

impl<I: Inventory> IdentifierGenerator<I> {
    pub fn new(inventory: I) -> Self {
        Self { inventory }
    }

    pub fn inventory(&self) -> &I {
        &self.inventory
    }

    /// Number of identifiers `strategy` yields on this machine.
    pub fn required_count(&self, strategy: Strategy) -> Result<usize, Error> {
        self.generate(strategy, None)
    }

    /// Two-phase generation.
    ///
    /// With `None` the required count is returned and nothing is generated.
    /// With `Some(out)` the identifiers are written to the front of `out`, every
    /// remaining slot becomes [`Identifier::padding`], and the number of real
    /// identifiers is returned. If `out` is shorter than the required count the
    /// call fails with [`Error::BufferTooSmall`] and `out` is left untouched.
    pub fn generate(
        &self,
        strategy: Strategy,
        out: Option<&mut [Identifier]>,
    ) -> Result<usize, Error> {
        let Some(out) = out else {
            return self.count(strategy);
        };

        let identifiers = self.payloads(strategy)?;
        if identifiers.len() > out.len() {
            return Err(Error::BufferTooSmall {
                required: identifiers.len(),
                capacity: out.len(),
            });
        }

        for (slot, payload) in out.iter_mut().zip(&identifiers) {
            *slot = Identifier::from_bytes(*payload).tagged(strategy);
        }
        for slot in out.iter_mut().skip(identifiers.len()) {
            *slot = Identifier::padding();
        }

        debug!(
            "Generated {} identifiers with strategy {} ({} padding slots)",
            identifiers.len(),
            strategy,
            out.len() - identifiers.len()
        );
        Ok(identifiers.len())
    }

    /// Counts, allocates and fills; the result holds only real identifiers.
    pub fn generate_all(&self, strategy: Strategy) -> Result<Vec<Identifier>, Error> {
        let required = self.required_count(strategy)?;
        let mut identifiers = vec![Identifier::padding(); required];
        let produced = self.generate(strategy, Some(identifiers.as_mut_slice()))?;
        if produced != required {
            warn!(
                "Hardware changed between count and fill: expected {} identifiers, got {}",
                required, produced
            );
        }
        identifiers.truncate(produced);
        Ok(identifiers)
    }

    fn count(&self, strategy: Strategy) -> Result<usize, Error> {
        match strategy {
            Strategy::Default => {
                let adapters = self.inventory.adapters()?.len();
                let disks = self.inventory.disks()?.len();
                Ok(disks * adapters)
            }
            Strategy::Ethernet | Strategy::IpAddress => Ok(self.inventory.adapters()?.len()),
            Strategy::DiskNumber | Strategy::DiskLabel => Ok(self.inventory.disks()?.len()),
            Strategy::Unknown => Err(Error::UnsupportedStrategy(strategy)),
        }
    }

    // Untagged payloads in output order.
    fn payloads(&self, strategy: Strategy) -> Result<Vec<[u8; IDENTIFIER_LEN]>, Error> {
        let payloads = match strategy {
            Strategy::Default => {
                let adapters = self.inventory.adapters()?;
                let disks = self.inventory.disks()?;
                let mut payloads = Vec::with_capacity(disks.len() * adapters.len());
                for disk in &disks {
                    let serial = disk.serial_payload();
                    for adapter in &adapters {
                        let mac = adapter.mac_payload();
                        let mut payload = [0u8; IDENTIFIER_LEN];
                        for (k, byte) in payload.iter_mut().enumerate() {
                            *byte = serial[k] ^ mac[k];
                        }
                        payloads.push(payload);
                    }
                }
                payloads
            }
            Strategy::Ethernet => self
                .inventory
                .adapters()?
                .iter()
                .map(|adapter| adapter.mac_payload())
                .collect(),
            Strategy::IpAddress => self
                .inventory
                .adapters()?
                .iter()
                .map(|adapter| adapter.ip_payload())
                .collect(),
            Strategy::DiskNumber => self
                .inventory
                .disks()?
                .iter()
                .map(|disk| disk.serial_payload())
                .collect(),
            Strategy::DiskLabel => self
                .inventory
                .disks()?
                .iter()
                .map(|disk| disk.label_payload())
                .collect(),
            Strategy::Unknown => return Err(Error::UnsupportedStrategy(strategy)),
        };
        Ok(payloads)
    }
}
