//! Tails of a registry of capacity `L` are `g_dash * gamma^i` for `i` in `[1, 2L]` except `L+1`.
//! They are public and needed to compute accumulators and witnesses, but they are large so the
//! issuer publishes them separately from the registry definition along with their hash.
//!
//! Storage of tails is up to the caller, everything here reads them through [`TailsAccessor`].

use crate::{
    accumulator::check_max_cred_num,
    error::RevocationError,
    setup::{RegistrySecretKey, RevocationParams},
};
use ark_ec::{pairing::Pairing, AffineRepr, CurveGroup};
use ark_ff::{One, Zero};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_std::{cfg_iter, string::String, vec::Vec};
use digest::Digest;
use log::trace;
use sha2::Sha256;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Read access to the tails of a registry. Tails are read concurrently when the `parallel` feature
/// is enabled.
pub trait TailsAccessor<E: Pairing>: Sync {
    /// Capacity `L` of the registry the tails are for
    fn max_cred_num(&self) -> u32;

    /// Tail at `position` which is in `[1, 2L]` and not `L+1`
    fn access_tail(&self, position: u32) -> Result<E::G2Affine, RevocationError>;
}

/// All tails of a registry held in memory
#[derive(Clone, PartialEq, Eq, Debug, CanonicalSerialize, CanonicalDeserialize)]
pub struct Tails<E: Pairing> {
    max_cred_num: u32,
    /// Tail at position `i` is at index `i-1`. Index `L` is the identity.
    tails: Vec<E::G2Affine>,
}

impl<E: Pairing> Tails<E> {
    /// Generate the tails for a registry of capacity `max_cred_num`
    pub fn generate(
        params: &RevocationParams<E>,
        registry_secret: &RegistrySecretKey<E::ScalarField>,
        max_cred_num: u32,
    ) -> Result<Self, RevocationError> {
        trace!("Tails::generate: >>> max_cred_num: {}", max_cred_num);
        check_max_cred_num(max_cred_num)?;
        let count = 2 * max_cred_num as usize;
        let mut powers = Vec::with_capacity(count);
        let mut power = E::ScalarField::one();
        for _ in 0..count {
            power *= registry_secret.0;
            powers.push(power);
        }
        powers[max_cred_num as usize] = E::ScalarField::zero();
        let tails = cfg_iter!(powers)
            .map(|p| params.g_dash * *p)
            .collect::<Vec<_>>();
        let tails = E::G2::normalize_batch(&tails);
        trace!("Tails::generate: <<<");
        Ok(Self {
            max_cred_num,
            tails,
        })
    }

    /// Hex encoded SHA-256 of the compressed tails in order
    pub fn hash(&self) -> Result<String, RevocationError> {
        tails_hash::<E, _>(self)
    }

    pub fn len(&self) -> usize {
        self.tails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tails.is_empty()
    }
}

impl<E: Pairing> TailsAccessor<E> for Tails<E> {
    fn max_cred_num(&self) -> u32 {
        self.max_cred_num
    }

    fn access_tail(&self, position: u32) -> Result<E::G2Affine, RevocationError> {
        if position == 0 || Some(position) == self.max_cred_num.checked_add(1) {
            return Err(RevocationError::TailNotFound(position));
        }
        self.tails
            .get(position as usize - 1)
            .copied()
            .ok_or(RevocationError::TailNotFound(position))
    }
}

/// Hash of the tails readable through `accessor`, hex encoded SHA-256 of all tails in order
pub fn tails_hash<E: Pairing, T: TailsAccessor<E>>(accessor: &T) -> Result<String, RevocationError> {
    let max = accessor.max_cred_num();
    check_max_cred_num(max)?;
    let mut hasher = Sha256::new();
    let mut bytes = Vec::new();
    for position in (1..=2 * max).filter(|p| *p != max + 1) {
        bytes.clear();
        accessor
            .access_tail(position)?
            .serialize_compressed(&mut bytes)?;
        hasher.update(&bytes);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Checks that the tails readable through `accessor` have the hash published with the registry
pub fn verify_tails_hash<E: Pairing, T: TailsAccessor<E>>(
    accessor: &T,
    expected: &str,
) -> Result<(), RevocationError> {
    if tails_hash::<E, T>(accessor)? != expected {
        return Err(RevocationError::TailsHashMismatch);
    }
    Ok(())
}

/// Checks that the tails are for a registry of the given capacity and none is the identity
pub fn check_tails<E: Pairing, T: TailsAccessor<E>>(
    accessor: &T,
    max_cred_num: u32,
) -> Result<(), RevocationError> {
    check_max_cred_num(max_cred_num)?;
    if accessor.max_cred_num() != max_cred_num {
        return Err(RevocationError::InvalidTailsCount(
            2 * accessor.max_cred_num() as usize,
            max_cred_num,
        ));
    }
    for position in (1..=2 * max_cred_num).filter(|p| *p != max_cred_num + 1) {
        if accessor.access_tail(position)?.is_zero() {
            return Err(RevocationError::TailNotFound(position));
        }
    }
    Ok(())
}
