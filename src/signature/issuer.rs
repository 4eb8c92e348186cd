use tracing::{debug, info};

use super::codec::Signature;
use super::generator::IdentifierGenerator;
use crate::device::Inventory;
use crate::error::Error;
use crate::types::{Identifier, Strategy};

/// A signature always carries two identifiers.
const PAIR: usize = 2;

pub struct SignatureIssuer;

impl SignatureIssuer {
    /// Produce the signature of the current machine under `strategy`.
    ///
    /// Machines with a single identifier get a padding slot in second position.
    pub fn issue<I: Inventory>(
        generator: &IdentifierGenerator<I>,
        strategy: Strategy,
    ) -> Result<Signature, Error> {
        let required = generator.required_count(strategy)?;
        if required == 0 {
            return Err(Error::NoIdentifiers(strategy));
        }

        let mut identifiers = vec![Identifier::padding(); required.max(PAIR)];
        let produced = generator.generate(strategy, Some(identifiers.as_mut_slice()))?;
        debug!("Issuing from {} of {} identifiers", produced.min(PAIR), produced);

        let signature = Signature::encode(&identifiers[0], &identifiers[1])?;
        info!("Issued signature {} with strategy {}", signature, strategy);
        Ok(signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{AdapterInfo, DiskInfo, InventoryError, InventorySnapshot};
    use std::cell::Cell;
    use std::net::Ipv4Addr;

    fn single_disk() -> InventorySnapshot {
        InventorySnapshot::new(vec![DiskInfo::new("sda", *b"\0\0SN1234", "VOL001")], vec![])
    }

    /// Disks come and go: each enumeration returns the next count.
    struct ChangingDisks {
        counts: Vec<usize>,
        calls: Cell<usize>,
    }

    impl Inventory for ChangingDisks {
        fn disks(&self) -> Result<Vec<DiskInfo>, InventoryError> {
            let call = self.calls.get();
            self.calls.set(call + 1);
            let count = self.counts[call.min(self.counts.len() - 1)];
            Ok((0..count)
                .map(|i| DiskInfo::new(format!("sd{}", i), format!("..DISK{:02}", i), ""))
                .collect())
        }

        fn adapters(&self) -> Result<Vec<AdapterInfo>, InventoryError> {
            Ok(vec![])
        }
    }

    fn changing(counts: &[usize]) -> IdentifierGenerator<ChangingDisks> {
        IdentifierGenerator::new(ChangingDisks {
            counts: counts.to_vec(),
            calls: Cell::new(0),
        })
    }

    #[test]
    fn test_issue_pads_single_identifier() {
        let generator = IdentifierGenerator::new(single_disk());
        let signature = SignatureIssuer::issue(&generator, Strategy::DiskNumber).unwrap();

        let (first, second) = signature.decode().unwrap();
        assert_eq!(first.strategy(), Strategy::DiskNumber);
        assert_eq!(&first.as_bytes()[1..], b"N1234");
        assert!(second.is_padding());
    }

    #[test]
    fn test_issue_uses_first_two_identifiers() {
        let inventory = InventorySnapshot::new(
            vec![
                DiskInfo::new("sda", "..AAAAAA", "ONE"),
                DiskInfo::new("sdb", "..BBBBBB", "TWO"),
                DiskInfo::new("sdc", "..CCCCCC", "THREE"),
            ],
            vec![],
        );
        let generator = IdentifierGenerator::new(&inventory);
        let signature = SignatureIssuer::issue(&generator, Strategy::DiskNumber).unwrap();

        let all = generator.generate_all(Strategy::DiskNumber).unwrap();
        assert_eq!(signature.decode().unwrap(), (all[0], all[1]));
    }

    #[test]
    fn test_issue_fails_without_hardware() {
        let generator = IdentifierGenerator::new(single_disk());
        let err = SignatureIssuer::issue(&generator, Strategy::Ethernet).unwrap_err();
        assert!(matches!(err, Error::NoIdentifiers(Strategy::Ethernet)));
    }

    #[test]
    fn test_issue_rejects_unknown_strategy() {
        let generator = IdentifierGenerator::new(single_disk());
        let err = SignatureIssuer::issue(&generator, Strategy::Unknown).unwrap_err();
        assert!(matches!(err, Error::UnsupportedStrategy(Strategy::Unknown)));
    }

    #[test]
    fn test_issue_is_stable() {
        let inventory = InventorySnapshot::new(
            vec![],
            vec![AdapterInfo::new(
                "eth0",
                vec![0x00, 0x1a, 0x2b, 0x3c, 0x4d, 0x5e],
                Ipv4Addr::new(10, 1, 2, 3),
            )],
        );
        let generator = IdentifierGenerator::new(inventory);
        let a = SignatureIssuer::issue(&generator, Strategy::IpAddress).unwrap();
        let b = SignatureIssuer::issue(&generator, Strategy::IpAddress).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_issue_pads_when_disks_disappear_before_fill() {
        for counts in [[3, 1], [2, 1]] {
            let signature = SignatureIssuer::issue(&changing(&counts), Strategy::DiskNumber).unwrap();
            let (first, second) = signature.decode().unwrap();
            assert_eq!(first.strategy(), Strategy::DiskNumber);
            assert_eq!(&first.as_bytes()[1..], b"ISK00");
            assert!(second.is_padding(), "counts {:?}", counts);
        }
    }

    #[test]
    fn test_issue_fails_when_disks_appear_before_fill() {
        let err = SignatureIssuer::issue(&changing(&[1, 3]), Strategy::DiskNumber).unwrap_err();
        assert!(err.is_buffer_too_small());
    }
}
