pub mod fixtures;
pub mod primes;
#[macro_use]
pub mod serialization;
