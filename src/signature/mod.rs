pub mod codec;
pub mod generator;
pub mod issuer;
pub mod validator;

pub use codec::{Signature, SIGNATURE_LEN};
pub use generator::IdentifierGenerator;
pub use issuer::SignatureIssuer;
pub use validator::{parity_check, SignatureValidator, Verdict};
