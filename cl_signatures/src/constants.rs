//! Bit lengths of the values sampled by the scheme. These are the AnonCreds parameters for a 2048
//! bit modulus.

/// Link secret
pub const LINK_SECRET_BITS: u64 = 256;
/// The signature exponent `e` is a prime in `[2^E_START_BITS, 2^E_START_BITS + 2^E_RANGE_BITS)`
pub const E_START_BITS: u64 = 596;
pub const E_RANGE_BITS: u64 = 119;
/// Each of the 2 safe primes of the modulus
pub const PRIME_BITS: u64 = 1024;
/// Blinding factor of the link secret commitment
pub const V_PRIME_BITS: u64 = 2128;
/// Issuer's share of the signature's `v`
pub const V_PRIME_PRIME_BITS: u64 = 2724;
/// Randomness for hidden attributes in the proof of knowledge of a signature
pub const M_TILDE_BITS: u64 = 592;
pub const E_TILDE_BITS: u64 = 456;
pub const V_TILDE_BITS: u64 = 3060;
/// Randomness for the squares of a predicate proof
pub const U_TILDE_BITS: u64 = 592;
/// Randomness for the link secret in the blinding correctness proof
pub const LINK_SECRET_TILDE_BITS: u64 = 593;
pub const V_PRIME_TILDE_BITS: u64 = 673;
pub const R_TILDE_BITS: u64 = 672;
pub const ALPHA_TILDE_BITS: u64 = 2787;
/// Nonces of offers, requests and presentation requests
pub const NONCE_BITS: u64 = 80;
/// Number of squares a predicate's difference is decomposed into
pub const FOUR_SQUARES: usize = 4;

/// Name under which the link secret is signed, the base for it is `r["master_secret"]`
pub const LINK_SECRET_NAME: &str = "master_secret";
