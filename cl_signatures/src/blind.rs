//! Commitment to the link secret sent in a credential request, `u = s^{v'} * r_ms^{ms}`, and the
//! holder's proof of knowledge of `v'` and `ms`. The proof's challenge includes the offer's nonce
//! so a request can't be replayed for another offer.

use crate::{
    constants::{LINK_SECRET_NAME, LINK_SECRET_TILDE_BITS, V_PRIME_BITS, V_PRIME_TILDE_BITS},
    error::CLError,
    setup::PrimaryPublicKey,
};
use anoncreds_utils::{
    bn::{mod_exp, mod_pow, rand_bits, to_bytes},
    hashing_utils::hash_to_int,
    serde_utils::DecimalString,
};
use ark_std::{collections::BTreeMap, rand::RngCore, string::String};
use log::trace;
use num_bigint::{BigInt, BigUint};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use sha2::Sha256;

#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlindedLinkSecret {
    #[serde_as(as = "DecimalString")]
    pub u: BigUint,
}

/// Kept by the holder to unblind the issued signature
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkSecretBlindingFactors {
    #[serde_as(as = "DecimalString")]
    pub v_prime: BigUint,
}

#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlindedLinkSecretCorrectnessProof {
    #[serde_as(as = "DecimalString")]
    pub c: BigUint,
    #[serde_as(as = "DecimalString")]
    pub v_dash_cap: BigUint,
    #[serde_as(as = "BTreeMap<_, DecimalString>")]
    pub m_caps: BTreeMap<String, BigUint>,
}

impl BlindedLinkSecret {
    /// Commit to the link secret and prove knowledge of the opening, binding the proof to the
    /// offer's `nonce`.
    pub fn new<R: RngCore>(
        rng: &mut R,
        pk: &PrimaryPublicKey,
        link_secret: &BigUint,
        nonce: &BigUint,
    ) -> Result<
        (
            Self,
            LinkSecretBlindingFactors,
            BlindedLinkSecretCorrectnessProof,
        ),
        CLError,
    > {
        trace!("BlindedLinkSecret::new: >>> nonce: {:?}", nonce);
        let r_ms = pk.base_for(LINK_SECRET_NAME)?;
        let factors = LinkSecretBlindingFactors {
            v_prime: rand_bits(rng, V_PRIME_BITS),
        };
        let Self { u } = factors.blind(pk, link_secret)?;
        let v_prime = &factors.v_prime;

        let v_dash_tilde = rand_bits(rng, V_PRIME_TILDE_BITS);
        let m_tilde = rand_bits(rng, LINK_SECRET_TILDE_BITS);
        let u_tilde =
            (mod_pow(&pk.s, &v_dash_tilde, &pk.n)? * mod_pow(r_ms, &m_tilde, &pk.n)?) % &pk.n;
        let c = hash_to_int::<Sha256, _, _>([to_bytes(&u), to_bytes(&u_tilde), to_bytes(nonce)]);

        let v_dash_cap = &c * v_prime + v_dash_tilde;
        let mut m_caps = BTreeMap::new();
        m_caps.insert(LINK_SECRET_NAME.into(), &c * link_secret + m_tilde);

        trace!("BlindedLinkSecret::new: <<< u: {:?}", u);
        Ok((
            Self { u },
            factors,
            BlindedLinkSecretCorrectnessProof {
                c,
                v_dash_cap,
                m_caps,
            },
        ))
    }
}

impl LinkSecretBlindingFactors {
    /// The commitment `s^{v'} * r_ms^{ms}` these factors open, recomputed by the holder to check
    /// the issuer's signature correctness proof
    pub fn blind(
        &self,
        pk: &PrimaryPublicKey,
        link_secret: &BigUint,
    ) -> Result<BlindedLinkSecret, CLError> {
        let r_ms = pk.base_for(LINK_SECRET_NAME)?;
        let u = (mod_pow(&pk.s, &self.v_prime, &pk.n)? * mod_pow(r_ms, link_secret, &pk.n)?)
            % &pk.n;
        Ok(BlindedLinkSecret { u })
    }
}

impl BlindedLinkSecretCorrectnessProof {
    /// Verified by the issuer before signing. `nonce` is the nonce of the issuer's offer.
    pub fn verify(
        &self,
        pk: &PrimaryPublicKey,
        blinded: &BlindedLinkSecret,
        nonce: &BigUint,
    ) -> Result<(), CLError> {
        trace!(
            "BlindedLinkSecretCorrectnessProof::verify: >>> blinded: {:?}, nonce: {:?}",
            blinded,
            nonce
        );
        if self.m_caps.len() != 1 || !self.m_caps.contains_key(LINK_SECRET_NAME) {
            return Err(CLError::InvalidBlindedLinkSecretCorrectnessProof);
        }
        if blinded.u >= pk.n {
            return Err(CLError::InvalidBlindedLinkSecretCorrectnessProof);
        }
        let minus_c = -BigInt::from(self.c.clone());
        let mut u_cap = (mod_exp(&blinded.u, &minus_c, &pk.n)
            .map_err(|_| CLError::InvalidBlindedLinkSecretCorrectnessProof)?
            * mod_pow(&pk.s, &self.v_dash_cap, &pk.n)?)
            % &pk.n;
        for (attr, m_cap) in &self.m_caps {
            u_cap = (u_cap * mod_pow(pk.base_for(attr)?, m_cap, &pk.n)?) % &pk.n;
        }
        let c = hash_to_int::<Sha256, _, _>([
            to_bytes(&blinded.u),
            to_bytes(&u_cap),
            to_bytes(nonce),
        ]);
        if c != self.c {
            return Err(CLError::InvalidBlindedLinkSecretCorrectnessProof);
        }
        trace!("BlindedLinkSecretCorrectnessProof::verify: <<<");
        Ok(())
    }
}
