use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a principal string.
#[derive(Debug, thiserror::Error)]
pub enum PrincipalError {
    #[error("principal must start with 'p'")]
    InvalidPrefix,
    #[error("principal must be {expected} characters, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("principal payload is not valid hexadecimal")]
    InvalidHex(#[from] hex::FromHexError),
    #[error("principal payload must be exactly 32 bytes")]
    InvalidPayloadLength,
}

/// Number of raw bytes contained in a principal.
pub const PRINCIPAL_BYTES: usize = 32;
/// Expected string length of an encoded principal (prefix + 64 hex chars).
pub const PRINCIPAL_STRING_LENGTH: usize = 1 + PRINCIPAL_BYTES * 2;

/// Identity of an account, administrator or collaborator.
///
/// Privileged operations take the calling principal explicitly instead of
/// reading it from an ambient execution context.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Principal(pub [u8; PRINCIPAL_BYTES]);

impl Principal {
    /// The null principal. Never a valid owner, tax wallet or collaborator.
    pub const ZERO: Self = Self([0u8; PRINCIPAL_BYTES]);

    pub const fn from_bytes(bytes: [u8; PRINCIPAL_BYTES]) -> Self {
        Self(bytes)
    }

    /// Deterministic principal derived from a human label (BLAKE3 of the label).
    pub fn from_label(label: &str) -> Self {
        Self(*blake3::hash(label.as_bytes()).as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; PRINCIPAL_BYTES] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; PRINCIPAL_BYTES]
    }

    /// `p` followed by the lowercase hex payload.
    pub fn encode(&self) -> String {
        let mut encoded = String::with_capacity(PRINCIPAL_STRING_LENGTH);
        encoded.push('p');
        encoded.push_str(&hex::encode(self.0));
        encoded
    }

    pub fn decode(value: &str) -> Result<Self, PrincipalError> {
        if !value.starts_with('p') {
            return Err(PrincipalError::InvalidPrefix);
        }

        if value.len() != PRINCIPAL_STRING_LENGTH {
            return Err(PrincipalError::InvalidLength {
                expected: PRINCIPAL_STRING_LENGTH,
                actual: value.len(),
            });
        }

        let decoded = hex::decode(&value[1..])?;
        let bytes: [u8; PRINCIPAL_BYTES] = decoded
            .try_into()
            .map_err(|_| PrincipalError::InvalidPayloadLength)?;

        Ok(Self(bytes))
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Principal(p{}…)", hex::encode(&self.0[..4]))
    }
}

impl FromStr for Principal {
    type Err = PrincipalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

impl From<[u8; PRINCIPAL_BYTES]> for Principal {
    fn from(value: [u8; PRINCIPAL_BYTES]) -> Self {
        Principal(value)
    }
}

impl From<Principal> for String {
    fn from(value: Principal) -> Self {
        value.encode()
    }
}

impl TryFrom<String> for Principal {
    type Error = PrincipalError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Principal::decode(&value)
    }
}
