//! The CL signature `(A, e, v)` on attributes `m_i`, the link secret `ms` and the credential
//! context `m2` satisfies `Z = A^e * s^v * rctxt^{m2} * r_ms^{ms} * prod(r_i^{m_i})`.
//!
//! The issuer only knows the commitment `u = s^{v'} * r_ms^{ms}` so it signs with its share `v''`
//! and proves that `A` was computed correctly. The holder sets `v = v' + v''`.

use crate::{
    constants::{E_RANGE_BITS, E_START_BITS, LINK_SECRET_NAME, V_PRIME_PRIME_BITS},
    error::CLError,
    setup::{PrimaryPublicKey, PrimarySecretKey},
};
use anoncreds_utils::{
    bn::{mod_div, mod_exp, mod_inverse, mod_pow, rand_bits_exact, rand_range, reduce_signed, to_bytes},
    hashing_utils::hash_to_int,
    primes::{generate_prime_in_range, is_prime},
    serde_utils::DecimalString,
};
use ark_std::{cfg_iter, collections::BTreeMap, rand::RngCore, string::String, vec::Vec};
use log::{debug, trace};
use num_bigint::{BigInt, BigUint};
use num_traits::One;
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use sha2::Sha256;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimarySignature {
    #[serde_as(as = "DecimalString")]
    pub m_2: BigUint,
    #[serde_as(as = "DecimalString")]
    pub a: BigUint,
    #[serde_as(as = "DecimalString")]
    pub e: BigUint,
    /// `v''` when issued, `v' + v''` once processed by the holder
    #[serde_as(as = "DecimalString")]
    pub v: BigUint,
}

#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureCorrectnessProof {
    #[serde_as(as = "DecimalString")]
    pub se: BigUint,
    #[serde_as(as = "DecimalString")]
    pub c: BigUint,
}

/// Lower bound of `e`
pub fn e_start() -> BigUint {
    BigUint::one() << E_START_BITS
}

fn e_end() -> BigUint {
    e_start() + (BigUint::one() << E_RANGE_BITS)
}

/// `prod(r_i^{m_i})` over the given values, all of which must have a base in the key
fn product_of_bases(
    pk: &PrimaryPublicKey,
    values: &BTreeMap<String, BigUint>,
) -> Result<BigUint, CLError> {
    let powers = cfg_iter!(values)
        .map(|(k, m)| -> Result<BigUint, CLError> { Ok(mod_pow(pk.base_for(k)?, m, &pk.n)?) })
        .collect::<Result<Vec<_>, CLError>>()?;
    Ok(powers
        .into_iter()
        .fold(BigUint::one(), |acc, p| (acc * p) % &pk.n))
}

/// Checks that `values` has exactly the attributes of the key, other than the link secret
fn check_values(pk: &PrimaryPublicKey, values: &BTreeMap<String, BigUint>) -> Result<(), CLError> {
    if values.len() + 1 != pk.r.len() || !pk.attribute_names().all(|a| values.contains_key(a)) {
        return Err(CLError::AttributeSetMismatch);
    }
    Ok(())
}

/// `Q = Z / (s^v * u * rctxt^{m2} * prod(r_i^{m_i}))`
fn compute_q(
    pk: &PrimaryPublicKey,
    u: &BigUint,
    values: &BTreeMap<String, BigUint>,
    m_2: &BigUint,
    v: &BigUint,
) -> Result<BigUint, CLError> {
    let mut denominator = (mod_pow(&pk.s, v, &pk.n)? * u) % &pk.n;
    denominator = (denominator * mod_pow(&pk.rctxt, m_2, &pk.n)?) % &pk.n;
    denominator = (denominator * product_of_bases(pk, values)?) % &pk.n;
    Ok(mod_div(&pk.z, &denominator, &pk.n)?)
}

fn correctness_challenge(q: &BigUint, a: &BigUint, a_cap: &BigUint, nonce: &BigUint) -> BigUint {
    hash_to_int::<Sha256, _, _>([to_bytes(q), to_bytes(a), to_bytes(a_cap), to_bytes(nonce)])
}

impl PrimarySignature {
    /// Sign the attribute `values`, the blinded link secret `u` and the credential context `m_2`.
    /// `nonce` is the nonce of the holder's request and binds the correctness proof to it.
    pub fn new<R: RngCore>(
        rng: &mut R,
        pk: &PrimaryPublicKey,
        sk: &PrimarySecretKey,
        u: &BigUint,
        values: &BTreeMap<String, BigUint>,
        m_2: &BigUint,
        nonce: &BigUint,
    ) -> Result<(Self, SignatureCorrectnessProof), CLError> {
        trace!(
            "PrimarySignature::new: >>> u: {:?}, values: {:?}, m_2: {:?}",
            u,
            values,
            m_2
        );
        check_values(pk, values)?;
        let v = rand_bits_exact(rng, V_PRIME_PRIME_BITS)?;
        let e = generate_prime_in_range(rng, &e_start(), &e_end())?;
        let q = compute_q(pk, u, values, m_2, &v)?;

        let order = sk.group_order();
        let e_inverse = mod_inverse(&e, &order)?;
        let a = mod_pow(&q, &e_inverse, &pk.n)?;

        let r = rand_range(rng, &order)?;
        let a_cap = mod_pow(&q, &r, &pk.n)?;
        let c = correctness_challenge(&q, &a, &a_cap, nonce);
        let se = reduce_signed(
            &(BigInt::from(r) - BigInt::from(&c * &e_inverse)),
            &order,
        )?;

        let signature = Self { m_2: m_2.clone(), a, e, v };
        trace!("PrimarySignature::new: <<< signature: {:?}", signature);
        Ok((signature, SignatureCorrectnessProof { se, c }))
    }

    /// Add the holder's blinding factor `v'` to the issuer's `v''`
    pub fn unblind(&mut self, v_prime: &BigUint) {
        self.v += v_prime;
    }

    /// Verify the signature given all attribute values and the link secret
    pub fn verify(
        &self,
        pk: &PrimaryPublicKey,
        values: &BTreeMap<String, BigUint>,
        link_secret: &BigUint,
    ) -> Result<(), CLError> {
        check_values(pk, values)?;
        self.check_e()?;
        let mut rhs = (mod_pow(&self.a, &self.e, &pk.n)? * mod_pow(&pk.s, &self.v, &pk.n)?) % &pk.n;
        rhs = (rhs * mod_pow(&pk.rctxt, &self.m_2, &pk.n)?) % &pk.n;
        rhs = (rhs * mod_pow(pk.base_for(LINK_SECRET_NAME)?, link_secret, &pk.n)?) % &pk.n;
        rhs = (rhs * product_of_bases(pk, values)?) % &pk.n;
        if rhs != pk.z {
            debug!("PrimarySignature::verify: signature doesn't verify");
            return Err(CLError::InvalidSignature);
        }
        Ok(())
    }

    fn check_e(&self) -> Result<(), CLError> {
        if self.e < e_start() || self.e >= e_end() || !is_prime(&self.e) {
            return Err(CLError::InvalidSignatureExponent);
        }
        Ok(())
    }
}

impl SignatureCorrectnessProof {
    /// Verified by the holder on receiving a signature, before unblinding. `u` is the blinded
    /// link secret of its request and `nonce` the request's nonce.
    pub fn verify(
        &self,
        signature: &PrimarySignature,
        pk: &PrimaryPublicKey,
        u: &BigUint,
        values: &BTreeMap<String, BigUint>,
        nonce: &BigUint,
    ) -> Result<(), CLError> {
        trace!("SignatureCorrectnessProof::verify: >>> proof: {:?}", self);
        check_values(pk, values)?;
        signature.check_e()?;
        let q = compute_q(pk, u, values, &signature.m_2, &signature.v)?;
        if mod_pow(&signature.a, &signature.e, &pk.n)? != q {
            return Err(CLError::InvalidSignatureCorrectnessProof);
        }
        let exp = BigInt::from(self.c.clone()) + BigInt::from(&self.se * &signature.e);
        let a_cap = mod_exp(&signature.a, &exp, &pk.n)?;
        if correctness_challenge(&q, &signature.a, &a_cap, nonce) != self.c {
            return Err(CLError::InvalidSignatureCorrectnessProof);
        }
        trace!("SignatureCorrectnessProof::verify: <<<");
        Ok(())
    }
}
