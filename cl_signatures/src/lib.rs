#![cfg_attr(not(feature = "std"), no_std)]
#![allow(non_snake_case)]

//! Camenisch-Lysyanskaya signatures in the group of quadratic residues modulo an RSA modulus as
//! used by AnonCreds.
//!
//! - Key generation with a proof that the keys are correctly formed, [`setup`].
//! - Blind issuance. The holder commits to its link secret and proves knowledge of it, the issuer
//!   signs the commitment along with the known attributes and proves that the signature was
//!   correctly computed, [`blind`] and [`signature`].
//! - Proof of knowledge of a signature that reveals some attributes and hides others, proving
//!   inequalities about hidden attributes via a decomposition in four squares, [`proof`].
//!
//! Every Fiat-Shamir challenge is SHA-256 of the concatenated big-endian encodings of the
//! commitments, interpreted as an integer. In a presentation, proofs of several signatures (and
//! of non-revocation) share one challenge so this crate exposes the commitments ("tau list") and
//! the public values ("c list") of a proof and lets the caller compute the challenge.

pub mod blind;
pub mod constants;
pub mod error;
pub mod proof;
pub mod setup;
pub mod signature;

pub mod prelude {
    pub use crate::{
        blind::{BlindedLinkSecret, BlindedLinkSecretCorrectnessProof, LinkSecretBlindingFactors},
        error::CLError,
        proof::{
            predicate::{Predicate, PredicateType},
            PrimaryProof, PrimaryProofProtocol,
        },
        setup::{CredentialKeyConfig, KeyCorrectnessProof, PrimaryKeypair, PrimaryPublicKey, PrimarySecretKey},
        signature::{PrimarySignature, SignatureCorrectnessProof},
    };
}
