use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, SignatureError};
use crate::types::{Identifier, IDENTIFIER_LEN};

const GROUPS: usize = 4;
const GROUP_LEN: usize = 4;
/// Base64 characters carried by a signature (12 bytes, no padding).
pub const SIGNATURE_TEXT_LEN: usize = GROUPS * GROUP_LEN;
/// Length of the dashed form `XXXX-XXXX-XXXX-XXXX`.
pub const SIGNATURE_LEN: usize = SIGNATURE_TEXT_LEN + GROUPS - 1;

/// Two identifiers in shareable text form, `XXXX-XXXX-XXXX-XXXX`.
///
/// A `Signature` value always has the dashed shape and only base64 characters in
/// its groups. It is a plain transcoding of the identifier bytes, not a
/// cryptographic signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature(String);

impl Signature {
    pub fn encode(first: &Identifier, second: &Identifier) -> Result<Self, Error> {
        let mut concat = [0u8; IDENTIFIER_LEN * 2];
        concat[..IDENTIFIER_LEN].copy_from_slice(first.as_bytes());
        concat[IDENTIFIER_LEN..].copy_from_slice(second.as_bytes());

        let text = STANDARD.encode(concat);
        if text.len() > SIGNATURE_TEXT_LEN {
            return Err(Error::BufferTooSmall {
                required: text.len(),
                capacity: SIGNATURE_TEXT_LEN,
            });
        }

        let groups: Vec<&str> = (0..GROUPS)
            .map(|i| &text[i * GROUP_LEN..(i + 1) * GROUP_LEN])
            .collect();
        Ok(Self(groups.join("-")))
    }

    pub fn decode(&self) -> Result<(Identifier, Identifier), Error> {
        let text: String = self.0.split('-').collect();
        let bytes = STANDARD.decode(text.as_bytes()).map_err(SignatureError::from)?;

        if bytes.len() > IDENTIFIER_LEN * 2 {
            return Err(Error::BufferTooSmall {
                required: bytes.len(),
                capacity: IDENTIFIER_LEN * 2,
            });
        }
        if bytes.len() < IDENTIFIER_LEN * 2 {
            return Err(SignatureError::Truncated(bytes.len()).into());
        }

        let mut first = [0u8; IDENTIFIER_LEN];
        let mut second = [0u8; IDENTIFIER_LEN];
        first.copy_from_slice(&bytes[..IDENTIFIER_LEN]);
        second.copy_from_slice(&bytes[IDENTIFIER_LEN..]);
        Ok((Identifier::from_bytes(first), Identifier::from_bytes(second)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Signature {
    type Err = SignatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let len = s.chars().count();
        if len != SIGNATURE_LEN {
            return Err(SignatureError::InvalidLength {
                expected: SIGNATURE_LEN,
                actual: len,
            });
        }

        for (position, character) in s.chars().enumerate() {
            let is_separator = position % (GROUP_LEN + 1) == GROUP_LEN;
            if is_separator {
                if character != '-' {
                    return Err(SignatureError::MissingSeparator(position));
                }
            } else if !is_base64_symbol(character) {
                return Err(SignatureError::InvalidCharacter { character, position });
            }
        }

        Ok(Self(s.to_string()))
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_base64_symbol(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '+' || c == '/'
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Strategy;

    fn id(bytes: [u8; 6]) -> Identifier {
        Identifier::from_bytes(bytes)
    }

    #[test]
    fn test_known_encoding() {
        let signature = Signature::encode(&id(*b"abcdef"), &id(*b"ghijkl")).unwrap();
        // base64("abcdefghijkl") = "YWJjZGVmZ2hpamts"
        assert_eq!(signature.as_str(), "YWJj-ZGVm-Z2hp-amts");
        assert_eq!(signature.as_str().len(), SIGNATURE_LEN);
    }

    #[test]
    fn test_round_trip_every_byte_in_every_position() {
        // Each column is a bijection of `h`, so across the loop every byte value
        // lands in every one of the twelve positions.
        for h in 0..=255u8 {
            let a = id([h, h ^ 0x55, h.wrapping_add(1), h.wrapping_mul(3), !h, h.rotate_left(3)]);
            let b = id([
                h.wrapping_add(0x80),
                h.rotate_right(1),
                h.wrapping_mul(5),
                h ^ 0xa5,
                h.wrapping_sub(7),
                !h.rotate_left(4),
            ]);
            let signature = Signature::encode(&a, &b).unwrap();
            let reparsed: Signature = signature.to_string().parse().unwrap();
            assert_eq!(reparsed.decode().unwrap(), (a, b), "header {:#04x}", h);
        }
    }

    #[test]
    fn test_round_trip_tagged_and_padding() {
        for strategy in Strategy::GENERATING {
            let a = id([0x6f, 0xfb, 0xfe, 0x00, 0x7f, 0x80]).tagged(strategy);
            let signature = Signature::encode(&a, &Identifier::padding()).unwrap();
            let (first, second) = signature.decode().unwrap();
            assert_eq!(first.strategy(), strategy);
            assert_eq!(first, a);
            assert!(second.is_padding());
        }
    }

    #[test]
    fn test_parse_rejects_bad_shape() {
        assert_eq!(
            "YWJj-ZGVm-Z2hp".parse::<Signature>(),
            Err(SignatureError::InvalidLength { expected: 19, actual: 14 })
        );
        assert_eq!(
            "YWJj_ZGVm-Z2hp-amts".parse::<Signature>(),
            Err(SignatureError::MissingSeparator(4))
        );
        assert_eq!(
            "YWJj-ZG=m-Z2hp-amts".parse::<Signature>(),
            Err(SignatureError::InvalidCharacter { character: '=', position: 7 })
        );
        assert!("YWJjZGVmZ2hpamts---".parse::<Signature>().is_err());
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let signature: Signature = "  YWJj-ZGVm-Z2hp-amts\n".parse().unwrap();
        assert_eq!(signature.to_string(), "YWJj-ZGVm-Z2hp-amts");
    }

    #[test]
    fn test_decode_all_ones() {
        let signature: Signature = "////-////-////-////".parse().unwrap();
        let (a, b) = signature.decode().unwrap();
        assert_eq!(a, id([0xff; 6]));
        assert_eq!(b, id([0xff; 6]));
    }
}
