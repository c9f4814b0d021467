//! Keys of the issuer and the proof that they are correctly formed.
//!
//! The modulus is `n = P * Q` for safe primes `P = 2p' + 1` and `Q = 2q' + 1` and all bases are
//! random quadratic residues so they generate the subgroup of order `p'q'`. The secret key is
//! `(p', q')`. For each attribute and for the link secret there is a base `r_i = s^{x_i}`, and
//! `z = s^{x_z}`, `rctxt = s^{x_rctxt}` for random `x`s.
//!
//! The key correctness proof is a Schnorr proof of knowledge of the discrete logs `x_z` and `x_i`
//! of `z` and the `r_i` to the base `s`, convincing the holder that all bases lie in the group
//! generated by `s` which is needed for the hiding property of the link secret's commitment.

use crate::{
    constants::{LINK_SECRET_NAME, PRIME_BITS},
    error::CLError,
};
use anoncreds_utils::{
    bn::{mod_exp, mod_pow, rand_qr, rand_range, to_bytes},
    hashing_utils::hash_to_int,
    primes::{generate_safe_prime, is_safe_prime},
    serde_utils::{DecimalString, NamedIntegers},
};
use ark_std::{
    cfg_iter,
    collections::{BTreeMap, BTreeSet},
    rand::RngCore,
    string::{String, ToString},
    vec::Vec,
};
use log::trace;
use num_bigint::{BigInt, BigUint};
use num_integer::Integer;
use num_traits::One;
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use sha2::Sha256;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Parameters of key generation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialKeyConfig {
    /// Size of each of the safe primes, the modulus is twice as large
    pub prime_bits: u64,
}

impl Default for CredentialKeyConfig {
    fn default() -> Self {
        Self {
            prime_bits: PRIME_BITS,
        }
    }
}

#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryPublicKey {
    #[serde_as(as = "DecimalString")]
    pub n: BigUint,
    #[serde_as(as = "DecimalString")]
    pub s: BigUint,
    /// Base per attribute, including the link secret
    #[serde_as(as = "BTreeMap<_, DecimalString>")]
    pub r: BTreeMap<String, BigUint>,
    #[serde_as(as = "DecimalString")]
    pub rctxt: BigUint,
    #[serde_as(as = "DecimalString")]
    pub z: BigUint,
}

/// `p'` and `q'`, halves of the safe primes
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimarySecretKey {
    #[serde_as(as = "DecimalString")]
    pub p: BigUint,
    #[serde_as(as = "DecimalString")]
    pub q: BigUint,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryKeypair {
    pub public_key: PrimaryPublicKey,
    pub secret_key: PrimarySecretKey,
}

#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyCorrectnessProof {
    #[serde_as(as = "DecimalString")]
    pub c: BigUint,
    #[serde_as(as = "DecimalString")]
    pub xz_cap: BigUint,
    #[serde_as(as = "NamedIntegers")]
    pub xr_cap: BTreeMap<String, BigUint>,
}

impl PrimarySecretKey {
    /// Order `p'q'` of the group of quadratic residues
    pub fn group_order(&self) -> BigUint {
        &self.p * &self.q
    }

    /// Random exponent in `[2, p'q' + 1]`
    fn gen_x<R: RngCore>(&self, rng: &mut R) -> Result<BigUint, CLError> {
        Ok(rand_range(rng, &self.group_order())? + 2u8)
    }
}

impl PrimaryPublicKey {
    /// Checks that the modulus is an odd integer larger than 1 and the bases lie in `(0, n)`.
    /// Anything received from another party must be checked before use.
    pub fn is_valid(&self) -> bool {
        let one = BigUint::one();
        if self.n <= one || self.n.is_even() {
            return false;
        }
        let in_range = |x: &BigUint| *x > BigUint::from(0u8) && *x < self.n;
        in_range(&self.s)
            && in_range(&self.z)
            && in_range(&self.rctxt)
            && !self.r.is_empty()
            && self.r.values().all(in_range)
            && self.r.contains_key(LINK_SECRET_NAME)
    }

    /// Names of the signed attributes, excluding the link secret
    pub fn attribute_names(&self) -> impl Iterator<Item = &String> {
        self.r.keys().filter(|k| k.as_str() != LINK_SECRET_NAME)
    }

    pub fn base_for(&self, attribute: &str) -> Result<&BigUint, CLError> {
        self.r
            .get(attribute)
            .ok_or_else(|| CLError::UnknownAttribute(attribute.to_string()))
    }
}

impl PrimaryKeypair {
    /// Generate keys for the given attributes with fresh safe primes. Returns the keys and the
    /// proof of their correctness.
    pub fn generate<R: RngCore>(
        rng: &mut R,
        attributes: &[String],
        config: &CredentialKeyConfig,
    ) -> Result<(Self, KeyCorrectnessProof), CLError> {
        trace!(
            "PrimaryKeypair::generate: >>> attributes: {:?}, config: {:?}",
            attributes,
            config
        );
        check_attribute_names(attributes)?;
        let p_safe = generate_safe_prime(rng, config.prime_bits)?;
        let mut q_safe = generate_safe_prime(rng, config.prime_bits)?;
        while q_safe == p_safe {
            q_safe = generate_safe_prime(rng, config.prime_bits)?;
        }
        Self::generate_with_safe_primes(rng, attributes, &p_safe, &q_safe)
    }

    /// Generate keys for the given attributes using the given safe primes. Finding safe primes
    /// is by far the most expensive part of key generation so they may be generated separately.
    pub fn generate_with_safe_primes<R: RngCore>(
        rng: &mut R,
        attributes: &[String],
        p_safe: &BigUint,
        q_safe: &BigUint,
    ) -> Result<(Self, KeyCorrectnessProof), CLError> {
        check_attribute_names(attributes)?;
        if p_safe == q_safe || !is_safe_prime(p_safe) || !is_safe_prime(q_safe) {
            return Err(CLError::InvalidSafePrime);
        }
        let secret_key = PrimarySecretKey {
            p: (p_safe - 1u8) >> 1u8,
            q: (q_safe - 1u8) >> 1u8,
        };
        let n = p_safe * q_safe;
        let s = rand_qr(rng, &n)?;

        let mut xr = BTreeMap::new();
        for attr in attributes
            .iter()
            .map(|a| a.as_str())
            .chain([LINK_SECRET_NAME])
        {
            xr.insert(attr.to_string(), secret_key.gen_x(rng)?);
        }
        let r = cfg_iter!(xr)
            .map(|(k, x)| -> Result<(String, BigUint), CLError> {
                Ok((k.clone(), mod_pow(&s, x, &n)?))
            })
            .collect::<Result<BTreeMap<_, _>, CLError>>()?;

        let xz = secret_key.gen_x(rng)?;
        let z = mod_pow(&s, &xz, &n)?;
        let rctxt = mod_pow(&s, &secret_key.gen_x(rng)?, &n)?;

        let public_key = PrimaryPublicKey {
            n,
            s,
            r,
            rctxt,
            z,
        };
        let proof = KeyCorrectnessProof::new(rng, &public_key, &secret_key, &xz, &xr)?;
        trace!("PrimaryKeypair::generate: <<< public_key: {:?}", public_key);
        Ok((
            Self {
                public_key,
                secret_key,
            },
            proof,
        ))
    }
}

impl KeyCorrectnessProof {
    fn new<R: RngCore>(
        rng: &mut R,
        pk: &PrimaryPublicKey,
        sk: &PrimarySecretKey,
        xz: &BigUint,
        xr: &BTreeMap<String, BigUint>,
    ) -> Result<Self, CLError> {
        let xz_tilde = sk.gen_x(rng)?;
        let mut xr_tilde = BTreeMap::new();
        for k in xr.keys() {
            xr_tilde.insert(k.clone(), sk.gen_x(rng)?);
        }
        let z_tilde = mod_pow(&pk.s, &xz_tilde, &pk.n)?;
        let r_tilde = cfg_iter!(xr_tilde)
            .map(|(k, x)| -> Result<(String, BigUint), CLError> {
                Ok((k.clone(), mod_pow(&pk.s, x, &pk.n)?))
            })
            .collect::<Result<BTreeMap<_, _>, CLError>>()?;

        let c = Self::challenge(pk, &z_tilde, &r_tilde);
        let xz_cap = &c * xz + xz_tilde;
        let xr_cap = xr
            .iter()
            .map(|(k, x)| -> Result<(String, BigUint), CLError> {
                let x_tilde = xr_tilde
                    .get(k)
                    .ok_or_else(|| CLError::UnknownAttribute(k.clone()))?;
                Ok((k.clone(), &c * x + x_tilde))
            })
            .collect::<Result<BTreeMap<_, _>, CLError>>()?;
        Ok(Self { c, xz_cap, xr_cap })
    }

    /// Verify the proof for the given public key. Also checks that the key is well formed.
    pub fn verify(&self, pk: &PrimaryPublicKey) -> Result<(), CLError> {
        trace!("KeyCorrectnessProof::verify: >>> pk: {:?}, proof: {:?}", pk, self);
        if !pk.is_valid() {
            return Err(CLError::InvalidPublicKey);
        }
        // Must be a proof about each base
        if self.xr_cap.len() != pk.r.len() || !pk.r.keys().all(|k| self.xr_cap.contains_key(k)) {
            return Err(CLError::InvalidKeyCorrectnessProof);
        }
        let minus_c = -BigInt::from(self.c.clone());
        let z_cap = (mod_exp(&pk.z, &minus_c, &pk.n)? * mod_pow(&pk.s, &self.xz_cap, &pk.n)?)
            % &pk.n;
        let r_cap = cfg_iter!(self.xr_cap)
            .map(|(k, xr_cap)| -> Result<(String, BigUint), CLError> {
                let r = pk.base_for(k)?;
                let r_cap = (mod_exp(r, &minus_c, &pk.n)? * mod_pow(&pk.s, xr_cap, &pk.n)?) % &pk.n;
                Ok((k.clone(), r_cap))
            })
            .collect::<Result<BTreeMap<_, _>, CLError>>()?;
        if Self::challenge(pk, &z_cap, &r_cap) != self.c {
            return Err(CLError::InvalidKeyCorrectnessProof);
        }
        trace!("KeyCorrectnessProof::verify: <<<");
        Ok(())
    }

    fn challenge(
        pk: &PrimaryPublicKey,
        z_tilde: &BigUint,
        r_tilde: &BTreeMap<String, BigUint>,
    ) -> BigUint {
        let mut values: Vec<Vec<u8>> = Vec::with_capacity(2 * pk.r.len() + 2);
        values.push(to_bytes(&pk.z));
        values.extend(pk.r.values().map(to_bytes));
        values.push(to_bytes(z_tilde));
        values.extend(r_tilde.values().map(to_bytes));
        hash_to_int::<Sha256, _, _>(values)
    }
}

fn check_attribute_names(attributes: &[String]) -> Result<(), CLError> {
    if attributes.is_empty() {
        return Err(CLError::NoAttributes);
    }
    let mut seen = BTreeSet::new();
    for a in attributes {
        if a == LINK_SECRET_NAME {
            return Err(CLError::ReservedAttributeName(a.clone()));
        }
        if !seen.insert(a) {
            return Err(CLError::DuplicateAttribute(a.clone()));
        }
    }
    Ok(())
}
