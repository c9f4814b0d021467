#![cfg_attr(not(feature = "std"), no_std)]
#![allow(non_snake_case)]

//! Revocation for AnonCreds credentials according to the paper: [An Accumulator Based on Bilinear Maps and Efficient Revocation for Anonymous Credentials](https://eprint.iacr.org/2008/539)
//! by Camenisch, Kohlweiss and Soriente.
//! Provides
//! - keys of the issuer and of each revocation registry, [`setup`].
//! - tails of a registry and a trait [`TailsAccessor`] to read them from wherever they are stored.
//! - the [`Accumulator`] over issued indices and the holder's [`Witness`], both updatable when
//!   indices are issued or revoked.
//! - the issuer's [`NonRevocationSignature`] on a registry index, issued blindly.
//! - a zero knowledge proof that the holder's index is in the accumulator, [`NonRevocProofProtocol`].
//!
//! Registry indices are 1-based, a registry of capacity `L` has indices `1..=L`.
//!
//! [`TailsAccessor`]: crate::tails::TailsAccessor
//! [`Accumulator`]: crate::accumulator::Accumulator
//! [`Witness`]: crate::witness::Witness
//! [`NonRevocationSignature`]: crate::signature::NonRevocationSignature
//! [`NonRevocProofProtocol`]: crate::proof::NonRevocProofProtocol

pub mod accumulator;
pub mod error;
pub mod proof;
pub mod setup;
pub mod signature;
pub mod tails;
pub mod witness;

pub mod prelude {
    pub use crate::{
        accumulator::{check_index, check_max_cred_num, index_delta, Accumulator, MAX_CRED_NUM},
        error::RevocationError,
        proof::{NonRevocProof, NonRevocProofProtocol},
        setup::*,
        signature::*,
        tails::{check_tails, tails_hash, verify_tails_hash, Tails, TailsAccessor},
        witness::Witness,
    };
}
