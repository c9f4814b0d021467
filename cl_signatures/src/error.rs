use ark_std::string::String;
use anoncreds_utils::error::UtilsError;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CLError {
    /// Keys need at least 1 attribute besides the link secret
    NoAttributes,
    DuplicateAttribute(String),
    /// Attribute name collides with the name reserved for the link secret
    ReservedAttributeName(String),
    InvalidPublicKey,
    /// The safe primes given for key generation aren't safe primes or are equal
    InvalidSafePrime,
    UnknownAttribute(String),
    MissingAttributeValue(String),
    /// The set of attribute values doesn't match the set of attributes of the key
    AttributeSetMismatch,
    InvalidKeyCorrectnessProof,
    InvalidBlindedLinkSecretCorrectnessProof,
    InvalidSignatureCorrectnessProof,
    InvalidSignature,
    /// Exponent `e` of the signature isn't a prime in the expected range
    InvalidSignatureExponent,
    PredicateNotSatisfied(String),
    PredicateOnRevealedAttribute(String),
    /// The difference of a predicate is too large to be decomposed
    PredicateValueOutOfRange(String),
    RevealedAttributesMismatch,
    /// Response for a predicate's attribute differs from the one in the equality proof
    PredicateResponseMismatch(String),
    MalformedProof,
    UtilsError(UtilsError),
}

impl From<UtilsError> for CLError {
    fn from(e: UtilsError) -> Self {
        Self::UtilsError(e)
    }
}
