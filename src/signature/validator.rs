use std::fmt;
use tracing::{debug, info, warn};

use super::codec::Signature;
use super::generator::IdentifierGenerator;
use crate::device::Inventory;
use crate::error::Error;
use crate::types::{Identifier, Strategy};

/// Outcome of checking a signature against the current machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// At least one identifier matches this machine.
    LicenseOk,
    /// An identifier claims no strategy.
    LicenseMalformed,
    /// Well formed, but issued for different hardware.
    IdentifiersMismatch,
}

impl Verdict {
    pub fn is_ok(self) -> bool {
        self == Verdict::LicenseOk
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Verdict::LicenseOk => "license ok",
            Verdict::LicenseMalformed => "license malformed",
            Verdict::IdentifiersMismatch => "identifiers mismatch",
        };
        f.write_str(text)
    }
}

/// Reserved for a tamper check on the header parity bit. Always passes.
pub fn parity_check(_signature: &Signature) -> bool {
    true
}

pub struct SignatureValidator;

impl SignatureValidator {
    /// Parse `text` and validate it. Shape and decode failures are errors, not verdicts.
    pub fn validate<I: Inventory>(
        generator: &IdentifierGenerator<I>,
        text: &str,
    ) -> Result<Verdict, Error> {
        let signature: Signature = text.parse()?;
        Self::validate_signature(generator, &signature)
    }

    /// Check `signature` against identifiers regenerated from the current hardware.
    ///
    /// Identifiers are tried in order and either one matching is enough, so a
    /// machine with one replaced disk still validates. Padding slots are skipped;
    /// any other identifier without a strategy makes the signature malformed.
    pub fn validate_signature<I: Inventory>(
        generator: &IdentifierGenerator<I>,
        signature: &Signature,
    ) -> Result<Verdict, Error> {
        let (first, second) = signature.decode()?;

        if !parity_check(signature) {
            return Ok(Verdict::LicenseMalformed);
        }

        // Padding slots are filler from issuance, not claims about the hardware.
        let presented: Vec<Identifier> = [first, second]
            .into_iter()
            .filter(|id| !id.is_padding())
            .collect();
        if presented.is_empty() {
            warn!("Signature {} holds only padding", signature);
            return Ok(Verdict::LicenseMalformed);
        }

        let mut regenerated: Option<(Strategy, Vec<Identifier>)> = None;

        for identifier in presented {
            let strategy = identifier.strategy();
            if strategy.is_unknown() {
                warn!("Signature {} carries an identifier without strategy", signature);
                return Ok(Verdict::LicenseMalformed);
            }

            let cached = matches!(&regenerated, Some((s, _)) if *s == strategy);
            if !cached {
                let candidates = generator.generate_all(strategy)?;
                debug!(
                    "Regenerated {} identifiers with strategy {}",
                    candidates.len(),
                    strategy
                );
                regenerated = Some((strategy, candidates));
            }

            let candidates = regenerated
                .as_ref()
                .map(|(_, candidates)| candidates.as_slice())
                .unwrap_or_default();
            if candidates.contains(&identifier) {
                info!("Signature {} matches this machine ({})", signature, strategy);
                return Ok(Verdict::LicenseOk);
            }
        }

        info!("Signature {} does not match this machine", signature);
        Ok(Verdict::IdentifiersMismatch)
    }
}
