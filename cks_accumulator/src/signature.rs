//! Issuer's signature on a registry index and the credential context `m2`.
//!
//! For index `i` with `g_i = g * gamma^i` the signature is
//! - `sigma = (h0 + h1 * m2 + ur + g_i + h2 * vr'') * 1/(x + c)` where `ur = h2 * vr'` is the
//!   holder's blinded secret, so after unblinding `sigma = (h0 + h1 * m2 + h2 * vr + g_i) * 1/(x + c)`,
//! - `sigma_i = g_dash * 1/(sk + gamma^i)` and `u_i = u * gamma^i`, which tie `g_i` to the issuer's
//!   key and to the registry's tails.

use crate::{
    accumulator::{check_index, Accumulator},
    error::RevocationError,
    setup::{
        AccumulatorPublicKey, RegistrySecretKey, RevocationParams, RevocationPublicKey,
        RevocationSecretKey,
    },
    witness::Witness,
};
use anoncreds_utils::{pairing_product, serde_utils::ArkObjectBytes};
use ark_ec::{pairing::Pairing, AffineRepr, CurveGroup};
use ark_ff::{Field, PrimeField, Zero};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_std::{ops::Neg, rand::RngCore, UniformRand};
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Blinding factor `vr'` kept by the holder
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
pub struct RevocationBlindingFactor<F: PrimeField> {
    #[serde_as(as = "ArkObjectBytes")]
    pub vr_prime: F,
}

/// `ur = h2 * vr'` sent in the credential request
#[serde_as]
#[derive(
    Clone, PartialEq, Eq, Debug, CanonicalSerialize, CanonicalDeserialize, Serialize, Deserialize,
)]
pub struct BlindedRevocationSecret<E: Pairing> {
    #[serde_as(as = "ArkObjectBytes")]
    pub ur: E::G1Affine,
}

#[serde_as]
#[derive(
    Clone, PartialEq, Eq, Debug, CanonicalSerialize, CanonicalDeserialize, Serialize, Deserialize,
)]
pub struct WitnessSignature<E: Pairing> {
    #[serde_as(as = "ArkObjectBytes")]
    pub sigma_i: E::G2Affine,
    #[serde_as(as = "ArkObjectBytes")]
    pub u_i: E::G2Affine,
}

#[serde_as]
#[derive(
    Clone, PartialEq, Eq, Debug, CanonicalSerialize, CanonicalDeserialize, Serialize, Deserialize,
)]
pub struct NonRevocationSignature<E: Pairing> {
    #[serde_as(as = "ArkObjectBytes")]
    pub sigma: E::G1Affine,
    #[serde_as(as = "ArkObjectBytes")]
    pub c: E::ScalarField,
    /// Issuer's share `vr''`, the holder adds its `vr'`
    #[serde_as(as = "ArkObjectBytes")]
    pub vr_prime_prime: E::ScalarField,
    #[serde(bound = "")]
    pub witness_signature: WitnessSignature<E>,
    #[serde_as(as = "ArkObjectBytes")]
    pub g_i: E::G1Affine,
    pub i: u32,
    #[serde_as(as = "ArkObjectBytes")]
    pub m2: E::ScalarField,
}

impl<E: Pairing> BlindedRevocationSecret<E> {
    pub fn new<R: RngCore>(
        rng: &mut R,
        params: &RevocationParams<E>,
    ) -> (Self, RevocationBlindingFactor<E::ScalarField>) {
        let vr_prime = E::ScalarField::rand(rng);
        (
            Self {
                ur: (params.h2 * vr_prime).into_affine(),
            },
            RevocationBlindingFactor { vr_prime },
        )
    }
}

impl<E: Pairing> NonRevocationSignature<E> {
    /// Sign registry index `index` of a registry of capacity `max_cred_num` for a credential with
    /// context `m2` and holder's blinded secret `blinded`
    pub fn new<R: RngCore>(
        rng: &mut R,
        params: &RevocationParams<E>,
        secret_key: &RevocationSecretKey<E::ScalarField>,
        registry_secret: &RegistrySecretKey<E::ScalarField>,
        max_cred_num: u32,
        index: u32,
        m2: E::ScalarField,
        blinded: &BlindedRevocationSecret<E>,
    ) -> Result<Self, RevocationError> {
        trace!("NonRevocationSignature::new: >>> index: {}", index);
        check_index(index, max_cred_num)?;
        let gamma_i = registry_secret.power(index as u64);
        let sk_gamma = (secret_key.sk + gamma_i)
            .inverse()
            .ok_or(RevocationError::ZeroDenominator)?;

        let mut c = E::ScalarField::rand(rng);
        while (secret_key.x + c).is_zero() {
            c = E::ScalarField::rand(rng);
        }
        let x_c = (secret_key.x + c)
            .inverse()
            .ok_or(RevocationError::ZeroDenominator)?;
        let vr_prime_prime = E::ScalarField::rand(rng);

        let g_i = (params.g * gamma_i).into_affine();
        let sigma = ((params.h1 * m2) + params.h0 + blinded.ur + g_i + params.h2 * vr_prime_prime)
            * x_c;
        let witness_signature = WitnessSignature {
            sigma_i: (params.g_dash * sk_gamma).into_affine(),
            u_i: (params.u * gamma_i).into_affine(),
        };
        trace!("NonRevocationSignature::new: <<<");
        Ok(Self {
            sigma: sigma.into_affine(),
            c,
            vr_prime_prime,
            witness_signature,
            g_i,
            i: index,
            m2,
        })
    }

    /// Holder adds its blinding factor so that `vr'' = vr' + vr''`
    pub fn unblind(&mut self, factor: &RevocationBlindingFactor<E::ScalarField>) {
        self.vr_prime_prime += factor.vr_prime;
    }

    /// Checks an unblinded signature and that `witness` is valid for `accumulator`
    pub fn verify(
        &self,
        params: &RevocationParams<E>,
        public_key: &RevocationPublicKey<E>,
        accum_key: &AccumulatorPublicKey<E>,
        accumulator: &Accumulator<E>,
        witness: &Witness<E>,
    ) -> Result<(), RevocationError> {
        self.verify_witness(params, accum_key, accumulator, witness)?;

        // e(pk + g_i, sigma_i) == e(g, g_dash)
        let pk_g_i = (public_key.pk + self.g_i).into_affine();
        let check = pairing_product!(
            pk_g_i, self.witness_signature.sigma_i;
            params.g.into_group().neg(), params.g_dash
        );
        if !check.is_zero() {
            debug!("NonRevocationSignature::verify: sigma_i doesn't verify");
            return Err(RevocationError::InvalidSignature);
        }

        // e(sigma, y + h_cap * c) == e(h0 + h1 * m2 + h2 * vr + g_i, h_cap)
        let y_c = public_key.y + params.h_cap * self.c;
        let rhs =
            params.h1 * self.m2 + params.h0 + params.h2 * self.vr_prime_prime + self.g_i;
        let check = pairing_product!(
            self.sigma, y_c;
            rhs.neg(), params.h_cap
        );
        if !check.is_zero() {
            debug!("NonRevocationSignature::verify: sigma doesn't verify");
            return Err(RevocationError::InvalidSignature);
        }

        // e(g_i, u) == e(g, u_i)
        let check = pairing_product!(
            self.g_i, params.u;
            params.g.into_group().neg(), self.witness_signature.u_i
        );
        if !check.is_zero() {
            debug!("NonRevocationSignature::verify: u_i doesn't verify");
            return Err(RevocationError::InvalidSignature);
        }
        Ok(())
    }

    /// Checks `e(g_i, acc) - e(g, omega) == z`, i.e. the index is in the accumulator
    pub fn verify_witness(
        &self,
        params: &RevocationParams<E>,
        accum_key: &AccumulatorPublicKey<E>,
        accumulator: &Accumulator<E>,
        witness: &Witness<E>,
    ) -> Result<(), RevocationError> {
        let lhs = pairing_product!(
            self.g_i, accumulator.0;
            params.g.into_group().neg(), witness.omega
        );
        if lhs != accum_key.z {
            debug!(
                "NonRevocationSignature::verify_witness: witness invalid for index {}",
                self.i
            );
            return Err(RevocationError::InvalidWitness);
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{setup::RevocationKeypair, tails::Tails};
    use ark_bls12_381::{Bls12_381, Fr};
    use ark_std::{
        collections::BTreeSet,
        rand::{rngs::StdRng, SeedableRng},
    };
    use test_utils::test_serialization;

    /// Everything an issuer and a holder have for one registry
    pub struct Setup {
        pub params: RevocationParams<Bls12_381>,
        pub keypair: RevocationKeypair<Bls12_381>,
        pub gamma: RegistrySecretKey<Fr>,
        pub accum_key: AccumulatorPublicKey<Bls12_381>,
        pub tails: Tails<Bls12_381>,
        pub max: u32,
    }

    pub fn setup(rng: &mut StdRng, max: u32) -> Setup {
        let params = RevocationParams::<Bls12_381>::generate_using_rng(rng);
        let keypair = RevocationKeypair::generate(rng, &params);
        let gamma = RegistrySecretKey::<Fr>::new(rng);
        let accum_key = AccumulatorPublicKey::new(&gamma, &params, max).unwrap();
        let tails = Tails::generate(&params, &gamma, max).unwrap();
        Setup {
            params,
            keypair,
            gamma,
            accum_key,
            tails,
            max,
        }
    }

    /// Issue an unblinded signature for `index`
    pub fn issue(rng: &mut StdRng, s: &Setup, index: u32, m2: Fr) -> NonRevocationSignature<Bls12_381> {
        let (blinded, factor) = BlindedRevocationSecret::new(rng, &s.params);
        let mut sig = NonRevocationSignature::new(
            rng,
            &s.params,
            &s.keypair.secret_key,
            &s.gamma,
            s.max,
            index,
            m2,
            &blinded,
        )
        .unwrap();
        sig.unblind(&factor);
        sig
    }

    #[test]
    fn signature_and_witness() {
        let mut rng = StdRng::seed_from_u64(0u64);
        let s = setup(&mut rng, 5);
        let issued: BTreeSet<u32> = [2, 3].into_iter().collect();
        let acc = Accumulator::from_issued(&issued, &s.tails).unwrap();
        let m2 = Fr::rand(&mut rng);
        let sig = issue(&mut rng, &s, 3, m2);
        let witness = Witness::new(3, &issued, &s.tails).unwrap();
        sig.verify(&s.params, &s.keypair.public_key, &s.accum_key, &acc, &witness)
            .unwrap();

        // Still blinded
        let (blinded, _) = BlindedRevocationSecret::new(&mut rng, &s.params);
        let blinded_sig = NonRevocationSignature::new(
            &mut rng,
            &s.params,
            &s.keypair.secret_key,
            &s.gamma,
            s.max,
            3,
            m2,
            &blinded,
        )
        .unwrap();
        assert!(matches!(
            blinded_sig.verify(&s.params, &s.keypair.public_key, &s.accum_key, &acc, &witness),
            Err(RevocationError::InvalidSignature)
        ));

        // Different context
        let mut bad = sig.clone();
        bad.m2 += Fr::from(1u64);
        assert!(matches!(
            bad.verify(&s.params, &s.keypair.public_key, &s.accum_key, &acc, &witness),
            Err(RevocationError::InvalidSignature)
        ));

        // Revoked
        let acc_2 = acc.update(&[], &[3], &s.tails).unwrap();
        assert!(matches!(
            sig.verify(&s.params, &s.keypair.public_key, &s.accum_key, &acc_2, &witness),
            Err(RevocationError::InvalidWitness)
        ));

        // Other issuer
        let other = RevocationKeypair::generate(&mut rng, &s.params);
        assert!(matches!(
            sig.verify(&s.params, &other.public_key, &s.accum_key, &acc, &witness),
            Err(RevocationError::InvalidSignature)
        ));

        assert!(matches!(
            NonRevocationSignature::new(
                &mut rng,
                &s.params,
                &s.keypair.secret_key,
                &s.gamma,
                s.max,
                6,
                m2,
                &blinded,
            ),
            Err(RevocationError::IndexOutOfRange(6, 5))
        ));

        test_serialization!(NonRevocationSignature<Bls12_381>, sig);
        test_serialization!(BlindedRevocationSecret<Bls12_381>, blinded);
    }
}
