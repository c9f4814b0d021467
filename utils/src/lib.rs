#![cfg_attr(not(feature = "std"), no_std)]

//! Common code for the AnonCreds crates.
//!
//! - [`bn`] has arbitrary precision integer arithmetic modulo an RSA modulus along with conversion
//!   to and from prime field elements.
//! - [`primes`] has primality testing, prime and safe-prime generation.
//! - [`hashing_utils`] hashes byte strings to integers and to curve points.
//! - [`serde_utils`] has serde adapters for arkworks objects and big integers.

#[macro_use]
pub mod macros;
pub mod bn;
pub mod error;
pub mod hashing_utils;
pub mod primes;
pub mod serde_utils;
