//! Arithmetic over arbitrary precision integers. The CL signature scheme works in the group of
//! quadratic residues modulo an RSA modulus so most operations here take the modulus explicitly.
//! Exponents can be negative, in which case the result is the inverse of the positive power.

use crate::error::UtilsError;
use ark_ff::{BigInteger, PrimeField};
use ark_std::{rand::RngCore, vec::Vec};
use num_bigint::{BigInt, BigUint, RandBigInt, Sign};
use num_integer::Integer;
use num_traits::{One, Zero};

/// Uniformly random integer in `[0, 2^bits)`
pub fn rand_bits<R: RngCore>(rng: &mut R, bits: u64) -> BigUint {
    rng.gen_biguint(bits)
}

/// Uniformly random integer of exactly `bits` bits, i.e. with the top bit set
pub fn rand_bits_exact<R: RngCore>(rng: &mut R, bits: u64) -> Result<BigUint, UtilsError> {
    if bits == 0 {
        return Err(UtilsError::InvalidBitLength(bits));
    }
    let mut n = rng.gen_biguint(bits - 1);
    n.set_bit(bits - 1, true);
    Ok(n)
}

/// Uniformly random integer in `[0, bound)`
pub fn rand_range<R: RngCore>(rng: &mut R, bound: &BigUint) -> Result<BigUint, UtilsError> {
    if bound.is_zero() {
        return Err(UtilsError::EmptyRange);
    }
    Ok(rng.gen_biguint_below(bound))
}

/// Uniformly random quadratic residue modulo `n`
pub fn rand_qr<R: RngCore>(rng: &mut R, n: &BigUint) -> Result<BigUint, UtilsError> {
    let x = rand_range(rng, n)?;
    Ok(x.modpow(&BigUint::from(2u8), n))
}

/// `base^exp mod modulus` where `exp` can be negative.
pub fn mod_exp(base: &BigUint, exp: &BigInt, modulus: &BigUint) -> Result<BigUint, UtilsError> {
    if modulus.is_zero() {
        return Err(UtilsError::ZeroModulus);
    }
    let r = base.modpow(exp.magnitude(), modulus);
    match exp.sign() {
        Sign::Minus => mod_inverse(&r, modulus),
        _ => Ok(r),
    }
}

/// `base^exp mod modulus` for a non-negative exponent
pub fn mod_pow(base: &BigUint, exp: &BigUint, modulus: &BigUint) -> Result<BigUint, UtilsError> {
    if modulus.is_zero() {
        return Err(UtilsError::ZeroModulus);
    }
    Ok(base.modpow(exp, modulus))
}

/// Inverse of `a` modulo `m`, errors when `gcd(a, m) != 1`
pub fn mod_inverse(a: &BigUint, m: &BigUint) -> Result<BigUint, UtilsError> {
    if m.is_zero() {
        return Err(UtilsError::ZeroModulus);
    }
    let m = BigInt::from(m.clone());
    let e = BigInt::from(a.clone()).extended_gcd(&m);
    if !e.gcd.is_one() {
        return Err(UtilsError::NotInvertible);
    }
    Ok(signed_mod(&e.x, &m))
}

/// `a / b mod m`
pub fn mod_div(a: &BigUint, b: &BigUint, m: &BigUint) -> Result<BigUint, UtilsError> {
    let b_inv = mod_inverse(b, m)?;
    Ok((a * b_inv) % m)
}

/// `a * b mod m`
pub fn mod_mul(a: &BigUint, b: &BigUint, m: &BigUint) -> Result<BigUint, UtilsError> {
    if m.is_zero() {
        return Err(UtilsError::ZeroModulus);
    }
    Ok((a * b) % m)
}

/// Product of `bases[i]^exps[i] mod modulus` over all pairs
pub fn multi_mod_exp<'a, I>(pairs: I, modulus: &BigUint) -> Result<BigUint, UtilsError>
where
    I: IntoIterator<Item = (&'a BigUint, &'a BigInt)>,
{
    let mut acc = BigUint::one();
    for (b, e) in pairs {
        acc = (acc * mod_exp(b, e, modulus)?) % modulus;
    }
    Ok(acc)
}

fn signed_mod(a: &BigInt, m: &BigInt) -> BigUint {
    a.mod_floor(m).into_parts().1
}

/// Least non-negative residue of the signed integer `a` modulo `m`
pub fn reduce_signed(a: &BigInt, m: &BigUint) -> Result<BigUint, UtilsError> {
    if m.is_zero() {
        return Err(UtilsError::ZeroModulus);
    }
    Ok(signed_mod(a, &BigInt::from(m.clone())))
}

/// Interprets `n` as a field element, reducing it modulo the field order
pub fn field_elem_from_int<F: PrimeField>(n: &BigUint) -> F {
    F::from_be_bytes_mod_order(&n.to_bytes_be())
}

/// Canonical integer representation of a field element
pub fn int_from_field_elem<F: PrimeField>(f: &F) -> BigUint {
    BigUint::from_bytes_be(&f.into_bigint().to_bytes_be())
}

/// Order of the prime field as an integer
pub fn field_order<F: PrimeField>() -> BigUint {
    BigUint::from_bytes_be(&F::MODULUS.to_bytes_be())
}

/// Big-endian bytes, the encoding hashed when an integer takes part in a challenge
pub fn to_bytes(n: &BigUint) -> Vec<u8> {
    n.to_bytes_be()
}

/// Big-endian bytes of a signed integer's magnitude prefixed with a sign byte
pub fn signed_to_bytes(n: &BigInt) -> Vec<u8> {
    let (sign, bytes) = n.to_bytes_be();
    let mut out = Vec::with_capacity(bytes.len() + 1);
    out.push(if sign == Sign::Minus { 1 } else { 0 });
    out.extend_from_slice(&bytes);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bls12_381::Fr;
    use ark_std::{
        rand::{rngs::StdRng, SeedableRng},
        UniformRand,
    };

    #[test]
    fn inverse_and_negative_exponent() {
        let mut rng = StdRng::seed_from_u64(0u64);
        // 1019 * 1031
        let n = BigUint::from(1019u32 * 1031u32);
        for _ in 0..20 {
            let a = rand_qr(&mut rng, &n).unwrap();
            if a.is_zero() || !a.gcd(&n).is_one() {
                continue;
            }
            let a_inv = mod_inverse(&a, &n).unwrap();
            assert!(((&a * &a_inv) % &n).is_one());

            let e = BigInt::from(rand_bits(&mut rng, 40));
            let pos = mod_exp(&a, &e, &n).unwrap();
            let neg = mod_exp(&a, &(-e), &n).unwrap();
            assert!(((pos * neg) % &n).is_one());
        }

        assert_eq!(
            mod_inverse(&BigUint::from(1019u32), &n),
            Err(UtilsError::NotInvertible)
        );
        assert_eq!(
            mod_exp(&BigUint::from(3u8), &BigInt::from(2), &BigUint::zero()),
            Err(UtilsError::ZeroModulus)
        );
    }

    #[test]
    fn random_bit_lengths() {
        let mut rng = StdRng::seed_from_u64(0u64);
        for bits in [1u64, 7, 80, 2724] {
            let n = rand_bits_exact(&mut rng, bits).unwrap();
            assert_eq!(n.bits(), bits);
            assert!(rand_bits(&mut rng, bits).bits() <= bits);
        }
        assert!(rand_bits_exact(&mut rng, 0).is_err());
        assert!(rand_range(&mut rng, &BigUint::zero()).is_err());
    }

    #[test]
    fn field_conversion() {
        let mut rng = StdRng::seed_from_u64(0u64);
        let f = Fr::rand(&mut rng);
        let n = int_from_field_elem(&f);
        assert_eq!(field_elem_from_int::<Fr>(&n), f);

        // Reduction modulo the order
        let order = field_order::<Fr>();
        assert_eq!(field_elem_from_int::<Fr>(&(&n + &order)), f);
        assert!(n < order);
    }

    #[test]
    fn signed_reduction() {
        let m = BigUint::from(7u8);
        assert_eq!(reduce_signed(&BigInt::from(-1), &m).unwrap(), BigUint::from(6u8));
        assert_eq!(reduce_signed(&BigInt::from(15), &m).unwrap(), BigUint::from(1u8));
        assert_eq!(signed_to_bytes(&BigInt::from(-5)), vec![1, 5]);
    }
}
