use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum UtilsError {
    /// Modulus of a modular operation was 0
    ZeroModulus,
    /// The element has no inverse modulo the given modulus
    NotInvertible,
    /// Requested bit length can't produce the asked number
    InvalidBitLength(u64),
    /// No prime was found in the given number of attempts
    PrimeGenerationFailed(usize),
    EmptyRange,
}
