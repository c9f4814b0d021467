//! Primality testing and generation of primes, safe primes and primes in an interval.
//!
//! Candidates are first checked for divisibility by small primes and then by Miller-Rabin with
//! bases derived from a hash of the candidate so that testing is deterministic for a given number.

use crate::{bn::rand_bits_exact, error::UtilsError};
use ark_std::rand::RngCore;
use digest::Digest;
use num_bigint::{BigUint, RandBigInt};
use num_integer::Integer;
use num_traits::{One, ToPrimitive, Zero};
use sha2::Sha256;

/// Rounds of Miller-Rabin. The error probability for a random candidate is far below `2^-80`
pub const MILLER_RABIN_ROUNDS: usize = 40;

/// Attempts made before giving up on finding a prime in an interval
pub const MAX_PRIME_ATTEMPTS: usize = 100_000;

const SMALL_PRIMES: [u32; 167] = [
    3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89, 97,
    101, 103, 107, 109, 113, 127, 131, 137, 139, 149, 151, 157, 163, 167, 173, 179, 181, 191, 193,
    197, 199, 211, 223, 227, 229, 233, 239, 241, 251, 257, 263, 269, 271, 277, 281, 283, 293, 307,
    311, 313, 317, 331, 337, 347, 349, 353, 359, 367, 373, 379, 383, 389, 397, 401, 409, 419, 421,
    431, 433, 439, 443, 449, 457, 461, 463, 467, 479, 487, 491, 499, 503, 509, 521, 523, 541, 547,
    557, 563, 569, 571, 577, 587, 593, 599, 601, 607, 613, 617, 619, 631, 641, 643, 647, 653, 659,
    661, 673, 677, 683, 691, 701, 709, 719, 727, 733, 739, 743, 751, 757, 761, 769, 773, 787, 797,
    809, 811, 821, 823, 827, 829, 839, 853, 857, 859, 863, 877, 881, 883, 887, 907, 911, 919, 929,
    937, 941, 947, 953, 967, 971, 977, 983, 991, 997,
];

/// Outcome of trial division by the small primes
enum TrialDivision {
    /// The number is itself one of the small primes
    Prime,
    Composite,
    Unknown,
}

fn trial_division(n: &BigUint) -> TrialDivision {
    if n.is_even() {
        return if *n == BigUint::from(2u8) {
            TrialDivision::Prime
        } else {
            TrialDivision::Composite
        };
    }
    for p in SMALL_PRIMES {
        // `n % p` fits in a u32 since p does
        let r = (n % p).to_u32().unwrap_or(1);
        if r == 0 {
            return if *n == BigUint::from(p) {
                TrialDivision::Prime
            } else {
                TrialDivision::Composite
            };
        }
    }
    TrialDivision::Unknown
}

/// One round of Miller-Rabin for odd `n > 3` with `n - 1 = d * 2^s`
fn miller_rabin_round(n: &BigUint, n_minus_1: &BigUint, d: &BigUint, s: u64, a: &BigUint) -> bool {
    let mut x = a.modpow(d, n);
    if x.is_one() || x == *n_minus_1 {
        return true;
    }
    for _ in 1..s {
        x = x.modpow(&BigUint::from(2u8), n);
        if x == *n_minus_1 {
            return true;
        }
        if x.is_one() {
            return false;
        }
    }
    false
}

/// Base for the `round`-th Miller-Rabin iteration, in `[2, n - 2]`
fn witness_base(n: &BigUint, round: usize) -> BigUint {
    let mut hasher = Sha256::new();
    hasher.update(n.to_bytes_be());
    hasher.update((round as u64).to_be_bytes());
    let h = BigUint::from_bytes_be(&hasher.finalize());
    // n > 997 here so n - 3 > 0
    (h % (n - 3u8)) + 2u8
}

/// Returns true if `n` is prime with overwhelming probability.
pub fn is_prime(n: &BigUint) -> bool {
    if *n < BigUint::from(2u8) {
        return false;
    }
    match trial_division(n) {
        TrialDivision::Prime => return true,
        TrialDivision::Composite => return false,
        TrialDivision::Unknown => (),
    }
    // Every n < 997^2 without a small factor is prime
    if *n < BigUint::from(997u32 * 997u32) {
        return true;
    }
    let n_minus_1 = n - 1u8;
    let s = n_minus_1.trailing_zeros().unwrap_or(0);
    let d = &n_minus_1 >> s;
    (0..MILLER_RABIN_ROUNDS)
        .all(|i| miller_rabin_round(n, &n_minus_1, &d, s, &witness_base(n, i)))
}

/// Random prime of exactly `bits` bits
pub fn generate_prime<R: RngCore>(rng: &mut R, bits: u64) -> Result<BigUint, UtilsError> {
    if bits < 2 {
        return Err(UtilsError::InvalidBitLength(bits));
    }
    loop {
        let mut candidate = rand_bits_exact(rng, bits)?;
        candidate.set_bit(0, true);
        if is_prime(&candidate) {
            return Ok(candidate);
        }
    }
}

/// Random safe prime `p = 2q + 1` of exactly `bits` bits, where `q` is also prime.
pub fn generate_safe_prime<R: RngCore>(rng: &mut R, bits: u64) -> Result<BigUint, UtilsError> {
    if bits < 3 {
        return Err(UtilsError::InvalidBitLength(bits));
    }
    loop {
        let mut q = rand_bits_exact(rng, bits - 1)?;
        q.set_bit(0, true);
        let p: BigUint = (&q << 1u8) + 1u8;
        // For p and q > 997, both must be free of small factors. Checking q first is cheaper as
        // most candidates fail there
        if q > BigUint::from(997u32) && !sieve_pair(&q, &p) {
            continue;
        }
        if is_prime(&q) && is_prime(&p) {
            return Ok(p);
        }
    }
}

fn sieve_pair(q: &BigUint, p: &BigUint) -> bool {
    SMALL_PRIMES.iter().all(|sp| {
        !(q % *sp).is_zero() && !(p % *sp).is_zero()
    })
}

/// Returns true if `p` is a safe prime, i.e. `p` and `(p - 1) / 2` are prime
pub fn is_safe_prime(p: &BigUint) -> bool {
    if *p < BigUint::from(5u8) {
        return false;
    }
    let q: BigUint = (p - 1u8) >> 1u8;
    is_prime(&q) && is_prime(p)
}

/// Random prime in the interval `[start, end)`
pub fn generate_prime_in_range<R: RngCore>(
    rng: &mut R,
    start: &BigUint,
    end: &BigUint,
) -> Result<BigUint, UtilsError> {
    if start >= end {
        return Err(UtilsError::EmptyRange);
    }
    for _ in 0..MAX_PRIME_ATTEMPTS {
        let mut candidate = rng.gen_biguint_range(start, end);
        candidate.set_bit(0, true);
        if candidate < *end && is_prime(&candidate) {
            return Ok(candidate);
        }
    }
    Err(UtilsError::PrimeGenerationFailed(MAX_PRIME_ATTEMPTS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_std::rand::{rngs::StdRng, SeedableRng};
    use core::str::FromStr;

    #[test]
    fn known_primes_and_composites() {
        for p in [2u32, 3, 5, 997, 1009, 7919, 104729, 2147483647] {
            assert!(is_prime(&BigUint::from(p)), "{}", p);
        }
        // Carmichael numbers and a product of 2 large primes
        for c in [0u64, 1, 4, 561, 1105, 8911, 999_983 * 1_000_003] {
            assert!(!is_prime(&BigUint::from(c)), "{}", c);
        }
        let m127 = (BigUint::one() << 127u8) - 1u8;
        assert!(is_prime(&m127));
        assert!(!is_prime(&(&m127 * &m127)));
    }

    #[test]
    fn safe_primes() {
        let mut rng = StdRng::seed_from_u64(0u64);
        let p = generate_safe_prime(&mut rng, 128).unwrap();
        assert_eq!(p.bits(), 128);
        assert!(is_safe_prime(&p));

        let p = BigUint::from_str("256250560732891434694417412787562680539").unwrap();
        assert!(is_safe_prime(&p));
        // 2 * 11 + 1 = 23 is safe but 29 is not
        assert!(is_safe_prime(&BigUint::from(23u8)));
        assert!(!is_safe_prime(&BigUint::from(29u8)));
    }

    #[test]
    fn prime_in_range() {
        let mut rng = StdRng::seed_from_u64(0u64);
        let start = BigUint::one() << 596u32;
        let end = &start + (BigUint::one() << 119u32);
        let e = generate_prime_in_range(&mut rng, &start, &end).unwrap();
        assert!(e >= start && e < end);
        assert!(is_prime(&e));

        let p = generate_prime(&mut rng, 256).unwrap();
        assert_eq!(p.bits(), 256);
        assert!(is_prime(&p));

        assert!(generate_prime_in_range(&mut rng, &end, &start).is_err());
    }
}
