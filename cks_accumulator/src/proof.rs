//! Proof that the holder has a non-revocation signature on some index `i` and a witness for `i` in
//! the current accumulator, without revealing `i`, the signature or the witness.
//!
//! The holder commits to the signature's components with fresh randomness
//! ```text
//! E = h*rho + htilde*o          D = g*r + htilde*o'
//! A = sigma + htilde*rho        G = g_i + htilde*r
//! W = omega + h_cap*r'          S = sigma_i + h_cap*r''      U = u_i + h_cap*r'''
//! ```
//! and proves knowledge of `rho, o, c, o', m = rho*c, m' = r*r'', t = o*c, t' = o'*r'', m2, s = vr,
//! r, r', r'', r'''` satisfying 8 relations between the commitments and the public values. As in
//! the other proofs of knowledge in this workspace, `init` produces the commitments to the
//! randomness ("tau list") and the caller combines them with those of other proofs into one
//! challenge. The randomness for `m2` is supplied by the caller so that the response for `m2` can
//! be compared with that of the proof of the credential's CL signature.

use crate::{
    accumulator::Accumulator,
    error::RevocationError,
    setup::{AccumulatorPublicKey, RevocationParams, RevocationPublicKey},
    signature::NonRevocationSignature,
    witness::Witness,
};
use anoncreds_utils::{pairing_product, serde_utils::ArkObjectBytes};
use ark_ec::{
    pairing::{Pairing, PairingOutput},
    AffineRepr, CurveGroup,
};
use ark_ff::{PrimeField, Zero};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_std::{ops::Neg, rand::RngCore, vec, vec::Vec, UniformRand};
use log::trace;
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Commitments `E, D, A, G` in G1 and `W, S, U` in G2
#[serde_as]
#[derive(
    Clone, PartialEq, Eq, Debug, CanonicalSerialize, CanonicalDeserialize, Serialize, Deserialize,
)]
pub struct NonRevocProofCList<E: Pairing> {
    #[serde_as(as = "ArkObjectBytes")]
    pub e: E::G1Affine,
    #[serde_as(as = "ArkObjectBytes")]
    pub d: E::G1Affine,
    #[serde_as(as = "ArkObjectBytes")]
    pub a: E::G1Affine,
    #[serde_as(as = "ArkObjectBytes")]
    pub g: E::G1Affine,
    #[serde_as(as = "ArkObjectBytes")]
    pub w: E::G2Affine,
    #[serde_as(as = "ArkObjectBytes")]
    pub s: E::G2Affine,
    #[serde_as(as = "ArkObjectBytes")]
    pub u: E::G2Affine,
}

/// The witnesses of the proof. The prover holds 2 of these, the values and the randomness, and the
/// proof carries the responses in the same shape.
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
pub struct NonRevocProofXList<F: PrimeField> {
    #[serde_as(as = "ArkObjectBytes")]
    pub rho: F,
    #[serde_as(as = "ArkObjectBytes")]
    pub o: F,
    #[serde_as(as = "ArkObjectBytes")]
    pub c: F,
    #[serde_as(as = "ArkObjectBytes")]
    pub o_prime: F,
    #[serde_as(as = "ArkObjectBytes")]
    pub m: F,
    #[serde_as(as = "ArkObjectBytes")]
    pub m_prime: F,
    #[serde_as(as = "ArkObjectBytes")]
    pub t: F,
    #[serde_as(as = "ArkObjectBytes")]
    pub t_prime: F,
    #[serde_as(as = "ArkObjectBytes")]
    pub m2: F,
    #[serde_as(as = "ArkObjectBytes")]
    pub s: F,
    #[serde_as(as = "ArkObjectBytes")]
    pub r: F,
    #[serde_as(as = "ArkObjectBytes")]
    pub r_prime: F,
    #[serde_as(as = "ArkObjectBytes")]
    pub r_prime_prime: F,
    #[serde_as(as = "ArkObjectBytes")]
    pub r_prime_prime_prime: F,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct NonRevocProofProtocol<E: Pairing> {
    c_list: NonRevocProofCList<E>,
    x_list: NonRevocProofXList<E::ScalarField>,
    x_tilde: NonRevocProofXList<E::ScalarField>,
    tau: TauValues<E>,
}

#[derive(
    Clone, PartialEq, Eq, Debug, CanonicalSerialize, CanonicalDeserialize, Serialize, Deserialize,
)]
#[serde(bound = "")]
pub struct NonRevocProof<E: Pairing> {
    pub x_list: NonRevocProofXList<E::ScalarField>,
    pub c_list: NonRevocProofCList<E>,
}

/// Values `T1` to `T8` of the 8 relations
#[derive(Clone, PartialEq, Eq, Debug)]
struct TauValues<E: Pairing> {
    t1: E::G1,
    t2: E::G1,
    t3: PairingOutput<E>,
    t4: PairingOutput<E>,
    t5: E::G1,
    t6: E::G1,
    t7: PairingOutput<E>,
    t8: PairingOutput<E>,
}

/// Public values the relations are over
struct Statement<'a, E: Pairing> {
    params: &'a RevocationParams<E>,
    public_key: &'a RevocationPublicKey<E>,
    accumulator: &'a Accumulator<E>,
    c_list: &'a NonRevocProofCList<E>,
}

impl<E: Pairing> NonRevocProofProtocol<E> {
    /// `m2_tilde` must be the randomness for `m2` used in the proof of the CL signature, reduced
    /// modulo the group order. The witness isn't checked here, a witness not valid for
    /// `accumulator` gives a proof that doesn't verify.
    pub fn init<R: RngCore>(
        rng: &mut R,
        params: &RevocationParams<E>,
        public_key: &RevocationPublicKey<E>,
        accumulator: &Accumulator<E>,
        signature: &NonRevocationSignature<E>,
        witness: &Witness<E>,
        m2_tilde: E::ScalarField,
    ) -> Result<Self, RevocationError> {
        trace!("NonRevocProofProtocol::init: >>> index: {}", signature.i);

        let rho = E::ScalarField::rand(rng);
        let o = E::ScalarField::rand(rng);
        let o_prime = E::ScalarField::rand(rng);
        let r = E::ScalarField::rand(rng);
        let r_prime = E::ScalarField::rand(rng);
        let r_prime_prime = E::ScalarField::rand(rng);
        let r_prime_prime_prime = E::ScalarField::rand(rng);

        let c_list = NonRevocProofCList {
            e: (params.h * rho + params.htilde * o).into_affine(),
            d: (params.g * r + params.htilde * o_prime).into_affine(),
            a: (signature.sigma + params.htilde * rho).into_affine(),
            g: (signature.g_i + params.htilde * r).into_affine(),
            w: (witness.omega + params.h_cap * r_prime).into_affine(),
            s: (signature.witness_signature.sigma_i + params.h_cap * r_prime_prime).into_affine(),
            u: (signature.witness_signature.u_i + params.h_cap * r_prime_prime_prime)
                .into_affine(),
        };
        let x_list = NonRevocProofXList {
            rho,
            o,
            c: signature.c,
            o_prime,
            m: rho * signature.c,
            m_prime: r * r_prime_prime,
            t: o * signature.c,
            t_prime: o_prime * r_prime_prime,
            m2: signature.m2,
            s: signature.vr_prime_prime,
            r,
            r_prime,
            r_prime_prime,
            r_prime_prime_prime,
        };
        let mut x_tilde = NonRevocProofXList::rand(rng);
        x_tilde.m2 = m2_tilde;

        let tau = Statement {
            params,
            public_key,
            accumulator,
            c_list: &c_list,
        }
        .tau_values(&x_tilde);
        trace!("NonRevocProofProtocol::init: <<<");
        Ok(Self {
            c_list,
            x_list,
            x_tilde,
            tau,
        })
    }

    pub fn c_list(&self) -> Result<Vec<Vec<u8>>, RevocationError> {
        self.c_list.to_bytes()
    }

    pub fn tau_list(&self) -> Result<Vec<Vec<u8>>, RevocationError> {
        self.tau.to_bytes()
    }

    pub fn gen_proof(self, challenge: &E::ScalarField) -> NonRevocProof<E> {
        NonRevocProof {
            x_list: self.x_tilde.response(&self.x_list, challenge),
            c_list: self.c_list.clone(),
        }
    }
}

impl<E: Pairing> NonRevocProof<E> {
    pub fn c_list(&self) -> Result<Vec<Vec<u8>>, RevocationError> {
        self.c_list.to_bytes()
    }

    /// Response for the credential context `m2`
    pub fn m2_cap(&self) -> &E::ScalarField {
        &self.x_list.m2
    }

    /// Recomputes the tau list for `challenge` against the given accumulator. The caller compares
    /// the challenge it computes from the returned list with `challenge`.
    pub fn verify_and_get_tau_list(
        &self,
        params: &RevocationParams<E>,
        public_key: &RevocationPublicKey<E>,
        accum_key: &AccumulatorPublicKey<E>,
        accumulator: &Accumulator<E>,
        challenge: &E::ScalarField,
    ) -> Result<Vec<Vec<u8>>, RevocationError> {
        trace!("NonRevocProof::verify_and_get_tau_list: >>>");
        if !params.is_valid() {
            return Err(RevocationError::InvalidParams);
        }
        if !public_key.is_valid() {
            return Err(RevocationError::InvalidPublicKey);
        }
        let statement = Statement {
            params,
            public_key,
            accumulator,
            c_list: &self.c_list,
        };
        let calc = statement.tau_values(&self.x_list);
        let expected = statement.expected_values(accum_key);
        let tau = TauValues {
            t1: calc.t1 - expected.t1 * challenge,
            t2: calc.t2 - expected.t2 * challenge,
            t3: calc.t3 - expected.t3 * challenge,
            t4: calc.t4 - expected.t4 * challenge,
            t5: calc.t5 - expected.t5 * challenge,
            t6: calc.t6 - expected.t6 * challenge,
            t7: calc.t7 - expected.t7 * challenge,
            t8: calc.t8 - expected.t8 * challenge,
        };
        trace!("NonRevocProof::verify_and_get_tau_list: <<<");
        tau.to_bytes()
    }
}

impl<F: PrimeField> NonRevocProofXList<F> {
    fn rand<R: RngCore>(rng: &mut R) -> Self {
        Self {
            rho: F::rand(rng),
            o: F::rand(rng),
            c: F::rand(rng),
            o_prime: F::rand(rng),
            m: F::rand(rng),
            m_prime: F::rand(rng),
            t: F::rand(rng),
            t_prime: F::rand(rng),
            m2: F::rand(rng),
            s: F::rand(rng),
            r: F::rand(rng),
            r_prime: F::rand(rng),
            r_prime_prime: F::rand(rng),
            r_prime_prime_prime: F::rand(rng),
        }
    }

    /// `self + challenge * witnesses`, field by field
    fn response(&self, witnesses: &Self, challenge: &F) -> Self {
        let resp = |t: &F, x: &F| *t + *challenge * x;
        Self {
            rho: resp(&self.rho, &witnesses.rho),
            o: resp(&self.o, &witnesses.o),
            c: resp(&self.c, &witnesses.c),
            o_prime: resp(&self.o_prime, &witnesses.o_prime),
            m: resp(&self.m, &witnesses.m),
            m_prime: resp(&self.m_prime, &witnesses.m_prime),
            t: resp(&self.t, &witnesses.t),
            t_prime: resp(&self.t_prime, &witnesses.t_prime),
            m2: resp(&self.m2, &witnesses.m2),
            s: resp(&self.s, &witnesses.s),
            r: resp(&self.r, &witnesses.r),
            r_prime: resp(&self.r_prime, &witnesses.r_prime),
            r_prime_prime: resp(&self.r_prime_prime, &witnesses.r_prime_prime),
            r_prime_prime_prime: resp(&self.r_prime_prime_prime, &witnesses.r_prime_prime_prime),
        }
    }
}

impl<E: Pairing> NonRevocProofCList<E> {
    /// Compressed encodings in the order `E, D, A, G, W, S, U`
    pub fn to_bytes(&self) -> Result<Vec<Vec<u8>>, RevocationError> {
        let mut list = Vec::with_capacity(7);
        for p in [&self.e, &self.d, &self.a, &self.g] {
            list.push(compressed(p)?);
        }
        for p in [&self.w, &self.s, &self.u] {
            list.push(compressed(p)?);
        }
        Ok(list)
    }
}

impl<E: Pairing> TauValues<E> {
    /// Compressed encodings in the order `T1` to `T8`
    fn to_bytes(&self) -> Result<Vec<Vec<u8>>, RevocationError> {
        Ok(vec![
            compressed(&self.t1.into_affine())?,
            compressed(&self.t2.into_affine())?,
            compressed(&self.t3)?,
            compressed(&self.t4)?,
            compressed(&self.t5.into_affine())?,
            compressed(&self.t6.into_affine())?,
            compressed(&self.t7)?,
            compressed(&self.t8)?,
        ])
    }
}

impl<'a, E: Pairing> Statement<'a, E> {
    /// Left hand sides of the relations evaluated at `x`
    fn tau_values(&self, x: &NonRevocProofXList<E::ScalarField>) -> TauValues<E> {
        let p = self.params;
        let cl = self.c_list;
        let htilde = p.htilde.into_group();
        let g_neg = p.g.into_group().neg();

        let t1 = p.h * x.rho + htilde * x.o;
        let t2 = cl.e * x.c - p.h * x.m - htilde * x.t;
        // e(A, h_cap)^c * e(htilde, h_cap)^{r-m} * e(h1, h_cap)^{-m2} * e(h2, h_cap)^{-s} * e(htilde, y)^{-rho}
        let t3_g1 = cl.a * x.c + htilde * (x.r - x.m) - p.h1 * x.m2 - p.h2 * x.s;
        let t3 = pairing_product!(
            t3_g1, p.h_cap;
            htilde * x.rho.neg(), self.public_key.y
        );
        let t4 = pairing_product!(
            htilde * x.r, self.accumulator.0;
            g_neg * x.r_prime, p.h_cap
        );
        let t5 = p.g * x.r + htilde * x.o_prime;
        let t6 = cl.d * x.r_prime_prime - p.g * x.m_prime - htilde * x.t_prime;
        let pk_g = self.public_key.pk.into_group() + cl.g;
        let t7 = pairing_product!(
            pk_g * x.r_prime_prime - htilde * x.m_prime, p.h_cap;
            htilde * x.r, cl.s
        );
        let t8 = pairing_product!(
            htilde * x.r, p.u;
            g_neg * x.r_prime_prime_prime, p.h_cap
        );
        TauValues {
            t1,
            t2,
            t3,
            t4,
            t5,
            t6,
            t7,
            t8,
        }
    }

    /// What the left hand sides evaluate to at the prover's witnesses
    fn expected_values(&self, accum_key: &AccumulatorPublicKey<E>) -> TauValues<E> {
        let p = self.params;
        let cl = self.c_list;
        let g_neg = p.g.into_group().neg();

        let t3 = pairing_product!(
            p.h0 + cl.g, p.h_cap;
            cl.a.into_group().neg(), self.public_key.y
        );
        let t4 = pairing_product!(
            cl.g, self.accumulator.0;
            g_neg, cl.w
        ) - accum_key.z;
        let t7 = pairing_product!(
            self.public_key.pk + cl.g, cl.s;
            g_neg, p.g_dash
        );
        let t8 = pairing_product!(
            cl.g, p.u;
            g_neg, cl.u
        );
        TauValues {
            t1: cl.e.into_group(),
            t2: E::G1::zero(),
            t3,
            t4,
            t5: cl.d.into_group(),
            t6: E::G1::zero(),
            t7,
            t8,
        }
    }
}

fn compressed<T: CanonicalSerialize>(t: &T) -> Result<Vec<u8>, RevocationError> {
    let mut bytes = Vec::with_capacity(t.compressed_size());
    t.serialize_compressed(&mut bytes)?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::tests::{issue, setup};
    use ark_bls12_381::{Bls12_381, Fr};
    use ark_std::{
        collections::BTreeSet,
        rand::{rngs::StdRng, SeedableRng},
    };
    use digest::Digest;
    use sha2::Sha256;
    use test_utils::test_serialization;

    fn challenge(taus: &[Vec<u8>], c_list: &[Vec<u8>]) -> Fr {
        let mut hasher = Sha256::new();
        for b in taus.iter().chain(c_list) {
            hasher.update(b);
        }
        Fr::from_be_bytes_mod_order(&hasher.finalize())
    }

    #[test]
    fn non_revocation_proof() {
        let mut rng = StdRng::seed_from_u64(0u64);
        let s = setup(&mut rng, 6);
        let issued: BTreeSet<u32> = [1, 2, 4, 6].into_iter().collect();
        let acc = Accumulator::from_issued(&issued, &s.tails).unwrap();
        let m2 = Fr::rand(&mut rng);
        let sig = issue(&mut rng, &s, 4, m2);
        let witness = Witness::new(4, &issued, &s.tails).unwrap();
        let pk = &s.keypair.public_key;

        let m2_tilde = Fr::rand(&mut rng);
        let protocol = NonRevocProofProtocol::init(
            &mut rng,
            &s.params,
            pk,
            &acc,
            &sig,
            &witness,
            m2_tilde,
        )
        .unwrap();
        let c_list = protocol.c_list().unwrap();
        assert_eq!(c_list.len(), 7);
        let taus = protocol.tau_list().unwrap();
        assert_eq!(taus.len(), 8);
        let c = challenge(&taus, &c_list);
        let proof = protocol.gen_proof(&c);
        assert_eq!(*proof.m2_cap(), m2_tilde + c * m2);

        let recomputed = proof
            .verify_and_get_tau_list(&s.params, pk, &s.accum_key, &acc, &c)
            .unwrap();
        assert_eq!(recomputed, taus);
        assert_eq!(challenge(&recomputed, &proof.c_list().unwrap()), c);

        // After revoking 4, the old proof doesn't verify against the new accumulator and neither
        // does a new one
        let acc_2 = acc.update(&[], &[4], &s.tails).unwrap();
        let taus_2 = proof
            .verify_and_get_tau_list(&s.params, pk, &s.accum_key, &acc_2, &c)
            .unwrap();
        assert_ne!(challenge(&taus_2, &proof.c_list().unwrap()), c);
        let w_2 = witness.update(4, &[], &[4], &s.tails).unwrap();
        assert!(sig
            .verify_witness(&s.params, &s.accum_key, &acc_2, &w_2)
            .is_err());
        let protocol =
            NonRevocProofProtocol::init(&mut rng, &s.params, pk, &acc_2, &sig, &w_2, m2_tilde)
                .unwrap();
        let c_list_2 = protocol.c_list().unwrap();
        let c_2 = challenge(&protocol.tau_list().unwrap(), &c_list_2);
        let revoked_proof = protocol.gen_proof(&c_2);
        let taus_2 = revoked_proof
            .verify_and_get_tau_list(&s.params, pk, &s.accum_key, &acc_2, &c_2)
            .unwrap();
        assert_ne!(challenge(&taus_2, &c_list_2), c_2);

        // Revoking another index and updating the witness keeps the proof possible
        let acc_3 = acc.update(&[3], &[6], &s.tails).unwrap();
        let w_3 = witness.update(4, &[3], &[6], &s.tails).unwrap();
        let protocol = NonRevocProofProtocol::init(
            &mut rng,
            &s.params,
            pk,
            &acc_3,
            &sig,
            &w_3,
            m2_tilde,
        )
        .unwrap();
        let c_list = protocol.c_list().unwrap();
        let c = challenge(&protocol.tau_list().unwrap(), &c_list);
        let proof_3 = protocol.gen_proof(&c);
        let taus = proof_3
            .verify_and_get_tau_list(&s.params, pk, &s.accum_key, &acc_3, &c)
            .unwrap();
        assert_eq!(challenge(&taus, &c_list), c);

        // Tampered response
        let mut bad = proof_3.clone();
        bad.x_list.m2 += Fr::from(1u64);
        let taus = bad
            .verify_and_get_tau_list(&s.params, pk, &s.accum_key, &acc_3, &c)
            .unwrap();
        assert_ne!(challenge(&taus, &c_list), c);

        test_serialization!(NonRevocProof<Bls12_381>, proof_3);
    }
}
