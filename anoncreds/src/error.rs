use anoncreds_utils::error::UtilsError;
use cks_accumulator::error::RevocationError;
use cl_signatures::error::CLError;
use serde::Serialize;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    InvalidInput,
    CryptoVerificationFailed,
    KeyCorrectnessProofInvalid,
    RevocationRegistryFull,
    RevocationStateInvalid,
    /// Attribute names or values don't match those of the schema, credential or proof
    AttributeMismatch,
    Unexpected,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Error {
    pub kind: ErrorKind,
    pub message: String,
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::InvalidInput => "Invalid input",
            Self::CryptoVerificationFailed => "Cryptographic verification failed",
            Self::KeyCorrectnessProofInvalid => "Invalid key correctness proof",
            Self::RevocationRegistryFull => "Revocation registry is full",
            Self::RevocationStateInvalid => "Invalid revocation state",
            Self::AttributeMismatch => "Attribute mismatch",
            Self::Unexpected => "Unexpected error",
        })
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}: {}", self.kind, self.message)
        }
    }
}

impl std::error::Error for Error {}

/// Error of the given kind with a formatted message
macro_rules! err_msg {
    ($kind: ident, $($arg: tt)+) => {
        $crate::error::Error::new($crate::error::ErrorKind::$kind, format!($($arg)+))
    };
}

impl From<CLError> for Error {
    fn from(e: CLError) -> Self {
        let kind = match &e {
            CLError::InvalidKeyCorrectnessProof => ErrorKind::KeyCorrectnessProofInvalid,
            CLError::InvalidBlindedLinkSecretCorrectnessProof
            | CLError::InvalidSignatureCorrectnessProof
            | CLError::InvalidSignature
            | CLError::InvalidSignatureExponent => ErrorKind::CryptoVerificationFailed,
            CLError::AttributeSetMismatch
            | CLError::UnknownAttribute(_)
            | CLError::MissingAttributeValue(_) => ErrorKind::AttributeMismatch,
            _ => ErrorKind::InvalidInput,
        };
        Self::new(kind, format!("{:?}", e))
    }
}

impl From<RevocationError> for Error {
    fn from(e: RevocationError) -> Self {
        let kind = match &e {
            RevocationError::InvalidWitness | RevocationError::InvalidSignature => {
                ErrorKind::CryptoVerificationFailed
            }
            RevocationError::TailsHashMismatch | RevocationError::IndexOutOfRange(..) => {
                ErrorKind::RevocationStateInvalid
            }
            RevocationError::Serialization(_) => ErrorKind::Unexpected,
            _ => ErrorKind::InvalidInput,
        };
        Self::new(kind, format!("{:?}", e))
    }
}

impl From<UtilsError> for Error {
    fn from(e: UtilsError) -> Self {
        Self::new(ErrorKind::Unexpected, format!("{:?}", e))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::new(ErrorKind::InvalidInput, e.to_string())
    }
}
