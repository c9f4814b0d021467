//! Keys of the revocation scheme.
//!
//! An issuer supporting revocation has one [`RevocationKeypair`] per credential definition. The
//! secret key `(x, sk)` signs registry indices, the public key is `pk = g * sk` and `y = h_cap * x`.
//! Each revocation registry created for the definition has its own secret `gamma`, known only to the
//! issuer, and the public value `z = e(g, g_dash)^{gamma^{L+1}}` where `L` is the registry's capacity.

use crate::{accumulator::check_max_cred_num, error::RevocationError};
use anoncreds_utils::{
    concat_slices, hashing_utils::affine_group_elem_from_try_and_incr, serde_utils::ArkObjectBytes,
};
use ark_ec::{
    pairing::{Pairing, PairingOutput},
    AffineRepr,
};
use ark_ff::{Field, PrimeField};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_std::{rand::RngCore, UniformRand};
use digest::Digest;
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Generators shared by all registries of a credential definition. `g`, `h`, `h0`, `h1`, `h2` and
/// `htilde` are in group G1, the others in G2.
#[serde_as]
#[derive(
    Clone, PartialEq, Eq, Debug, CanonicalSerialize, CanonicalDeserialize, Serialize, Deserialize,
)]
pub struct RevocationParams<E: Pairing> {
    #[serde_as(as = "ArkObjectBytes")]
    pub g: E::G1Affine,
    #[serde_as(as = "ArkObjectBytes")]
    pub g_dash: E::G2Affine,
    #[serde_as(as = "ArkObjectBytes")]
    pub h: E::G1Affine,
    #[serde_as(as = "ArkObjectBytes")]
    pub h0: E::G1Affine,
    #[serde_as(as = "ArkObjectBytes")]
    pub h1: E::G1Affine,
    #[serde_as(as = "ArkObjectBytes")]
    pub h2: E::G1Affine,
    #[serde_as(as = "ArkObjectBytes")]
    pub htilde: E::G1Affine,
    #[serde_as(as = "ArkObjectBytes")]
    pub h_cap: E::G2Affine,
    #[serde_as(as = "ArkObjectBytes")]
    pub u: E::G2Affine,
}

#[serde_as]
#[derive(
    Clone,
    PartialEq,
    Eq,
    Debug,
    CanonicalSerialize,
    CanonicalDeserialize,
    Zeroize,
    ZeroizeOnDrop,
    Serialize,
    Deserialize,
)]
pub struct RevocationSecretKey<F: PrimeField> {
    #[serde_as(as = "ArkObjectBytes")]
    pub x: F,
    #[serde_as(as = "ArkObjectBytes")]
    pub sk: F,
}

#[serde_as]
#[derive(
    Clone, PartialEq, Eq, Debug, CanonicalSerialize, CanonicalDeserialize, Serialize, Deserialize,
)]
pub struct RevocationPublicKey<E: Pairing> {
    #[serde_as(as = "ArkObjectBytes")]
    pub pk: E::G1Affine,
    #[serde_as(as = "ArkObjectBytes")]
    pub y: E::G2Affine,
}

#[derive(
    Clone, PartialEq, Eq, Debug, CanonicalSerialize, CanonicalDeserialize, Serialize, Deserialize,
)]
#[serde(bound = "")]
pub struct RevocationKeypair<E: Pairing> {
    pub secret_key: RevocationSecretKey<E::ScalarField>,
    pub public_key: RevocationPublicKey<E>,
}

/// `gamma` of a registry
#[serde_as]
#[derive(
    Clone,
    PartialEq,
    Eq,
    Debug,
    CanonicalSerialize,
    CanonicalDeserialize,
    Zeroize,
    ZeroizeOnDrop,
    Serialize,
    Deserialize,
)]
pub struct RegistrySecretKey<F: PrimeField>(#[serde_as(as = "ArkObjectBytes")] pub F);

/// Public value `z` of a registry against which witnesses are checked
#[serde_as]
#[derive(
    Clone, PartialEq, Eq, Debug, CanonicalSerialize, CanonicalDeserialize, Serialize, Deserialize,
)]
pub struct AccumulatorPublicKey<E: Pairing> {
    #[serde_as(as = "ArkObjectBytes")]
    pub z: PairingOutput<E>,
}

impl<E: Pairing> RevocationParams<E> {
    /// Generate params by hashing a known string. The hash function is vulnerable to timing
    /// attack but since all this is public knowledge, it is fine.
    pub fn new<D: Digest>(label: &[u8]) -> Self {
        let g1 = |name: &[u8]| {
            affine_group_elem_from_try_and_incr::<E::G1Affine, D>(&concat_slices![label, name])
        };
        let g2 = |name: &[u8]| {
            affine_group_elem_from_try_and_incr::<E::G2Affine, D>(&concat_slices![label, name])
        };
        Self {
            g: g1(b" : g"),
            g_dash: g2(b" : g_dash"),
            h: g1(b" : h"),
            h0: g1(b" : h0"),
            h1: g1(b" : h1"),
            h2: g1(b" : h2"),
            htilde: g1(b" : htilde"),
            h_cap: g2(b" : h_cap"),
            u: g2(b" : u"),
        }
    }

    pub fn generate_using_rng<R: RngCore>(rng: &mut R) -> Self {
        Self {
            g: E::G1::rand(rng).into(),
            g_dash: E::G2::rand(rng).into(),
            h: E::G1::rand(rng).into(),
            h0: E::G1::rand(rng).into(),
            h1: E::G1::rand(rng).into(),
            h2: E::G1::rand(rng).into(),
            htilde: E::G1::rand(rng).into(),
            h_cap: E::G2::rand(rng).into(),
            u: E::G2::rand(rng).into(),
        }
    }

    /// None of the generators should be the identity. Params received from another party must be
    /// checked before use.
    pub fn is_valid(&self) -> bool {
        ![self.g, self.h, self.h0, self.h1, self.h2, self.htilde]
            .iter()
            .any(|p| p.is_zero())
            && ![self.g_dash, self.h_cap, self.u].iter().any(|p| p.is_zero())
    }
}

impl<F: PrimeField> RevocationSecretKey<F> {
    pub fn new<R: RngCore>(rng: &mut R) -> Self {
        Self {
            x: F::rand(rng),
            sk: F::rand(rng),
        }
    }
}

impl<E: Pairing> RevocationPublicKey<E> {
    pub fn generate_using_secret_key(
        secret_key: &RevocationSecretKey<E::ScalarField>,
        params: &RevocationParams<E>,
    ) -> Self {
        Self {
            pk: (params.g * secret_key.sk).into(),
            y: (params.h_cap * secret_key.x).into(),
        }
    }

    pub fn is_valid(&self) -> bool {
        !(self.pk.is_zero() || self.y.is_zero())
    }
}

impl<E: Pairing> RevocationKeypair<E> {
    pub fn generate<R: RngCore>(rng: &mut R, params: &RevocationParams<E>) -> Self {
        let secret_key = RevocationSecretKey::new(rng);
        let public_key = RevocationPublicKey::generate_using_secret_key(&secret_key, params);
        Self {
            secret_key,
            public_key,
        }
    }
}

impl<F: PrimeField> RegistrySecretKey<F> {
    pub fn new<R: RngCore>(rng: &mut R) -> Self {
        Self(F::rand(rng))
    }

    /// `gamma^i`
    pub fn power(&self, i: u64) -> F {
        self.0.pow([i])
    }
}

impl<E: Pairing> AccumulatorPublicKey<E> {
    /// `z = e(g, g_dash)^{gamma^{L+1}}` for a registry of capacity `max_cred_num`
    pub fn new(
        registry_secret: &RegistrySecretKey<E::ScalarField>,
        params: &RevocationParams<E>,
        max_cred_num: u32,
    ) -> Result<Self, RevocationError> {
        check_max_cred_num(max_cred_num)?;
        let gamma_l1 = registry_secret.power(max_cred_num as u64 + 1);
        Ok(Self {
            z: E::pairing(params.g, params.g_dash * gamma_l1),
        })
    }
}
