//! The accumulator of a registry of capacity `L` is the sum of tails `L+1-j` over all issued and not
//! revoked indices `j`. It changes whenever credentials are issued or revoked and each such version
//! is published by the issuer.

use crate::{error::RevocationError, tails::TailsAccessor};
use anoncreds_utils::serde_utils::ArkObjectBytes;
use ark_ec::{pairing::Pairing, AffineRepr, CurveGroup};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_std::collections::BTreeSet;
use log::trace;
use serde::{Deserialize, Serialize};
use serde_with::serde_as;

#[serde_as]
#[derive(
    Clone,
    Copy,
    PartialEq,
    Eq,
    Debug,
    CanonicalSerialize,
    CanonicalDeserialize,
    Serialize,
    Deserialize,
)]
pub struct Accumulator<E: Pairing>(#[serde_as(as = "ArkObjectBytes")] pub E::G2Affine);

/// Checks that `index` is a valid index for a registry of capacity `max_cred_num`
/// Largest registry capacity. Tail positions go up to `2L` and must fit in a `u32`.
pub const MAX_CRED_NUM: u32 = u32::MAX / 2;

pub fn check_max_cred_num(max_cred_num: u32) -> Result<(), RevocationError> {
    if max_cred_num == 0 || max_cred_num > MAX_CRED_NUM {
        return Err(RevocationError::InvalidMaxCredNum(max_cred_num));
    }
    Ok(())
}

pub fn check_index(index: u32, max_cred_num: u32) -> Result<(), RevocationError> {
    if index == 0 || index > max_cred_num {
        return Err(RevocationError::IndexOutOfRange(index, max_cred_num));
    }
    Ok(())
}

impl<E: Pairing> Accumulator<E> {
    /// Accumulator with no issued index
    pub fn empty() -> Self {
        Self(E::G2Affine::zero())
    }

    /// Accumulator over the given issued indices
    pub fn from_issued<'a, T: TailsAccessor<E>>(
        issued: impl IntoIterator<Item = &'a u32>,
        tails: &T,
    ) -> Result<Self, RevocationError> {
        Self::empty().update(issued, [], tails)
    }

    /// New accumulator after adding `issued` and removing `revoked`. `issued` must not be present
    /// and `revoked` must be present in the current accumulator, which the caller's record of
    /// indices guarantees.
    pub fn update<'a, 'b, T: TailsAccessor<E>>(
        &self,
        issued: impl IntoIterator<Item = &'a u32>,
        revoked: impl IntoIterator<Item = &'b u32>,
        tails: &T,
    ) -> Result<Self, RevocationError> {
        let max = tails.max_cred_num();
        check_max_cred_num(max)?;
        let mut acc = self.0.into_group();
        for j in issued {
            check_index(*j, max)?;
            acc += tails.access_tail(max + 1 - *j)?;
        }
        for j in revoked {
            check_index(*j, max)?;
            acc -= tails.access_tail(max + 1 - *j)?;
        }
        let acc = Self(acc.into_affine());
        trace!("Accumulator::update: <<< accumulator: {:?}", acc);
        Ok(acc)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_zero()
    }
}

impl<E: Pairing> Default for Accumulator<E> {
    fn default() -> Self {
        Self::empty()
    }
}

/// Indices in `new` but not in `old` and indices in `old` but not in `new`
pub fn index_delta(old: &BTreeSet<u32>, new: &BTreeSet<u32>) -> (BTreeSet<u32>, BTreeSet<u32>) {
    (
        new.difference(old).copied().collect(),
        old.difference(new).copied().collect(),
    )
}
