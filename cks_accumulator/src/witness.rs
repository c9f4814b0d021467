//! Witness of index `i` in an accumulator is the sum of tails `L+1-j+i` over all issued and not
//! revoked indices `j` other than `i`. It satisfies `e(g_i, acc) - e(g, omega) = z` where
//! `g_i = g * gamma^i`, which the holder proves in zero knowledge without revealing `i`.

use crate::{
    accumulator::{check_index, check_max_cred_num},
    error::RevocationError, tails::TailsAccessor};
use anoncreds_utils::serde_utils::ArkObjectBytes;
use ark_ec::{pairing::Pairing, AffineRepr, CurveGroup};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_std::{cfg_into_iter, vec::Vec, Zero};
use log::trace;
use serde::{Deserialize, Serialize};
use serde_with::serde_as;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

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
pub struct Witness<E: Pairing> {
    #[serde_as(as = "ArkObjectBytes")]
    pub omega: E::G2Affine,
}

impl<E: Pairing> Witness<E> {
    /// Witness for `index` given all issued indices
    pub fn new<'a, T: TailsAccessor<E>>(
        index: u32,
        issued: impl IntoIterator<Item = &'a u32>,
        tails: &T,
    ) -> Result<Self, RevocationError> {
        trace!("Witness::new: >>> index: {}", index);
        Self {
            omega: E::G2Affine::zero(),
        }
        .update(index, issued, [], tails)
    }

    /// Witness after the given indices have been issued and revoked. As with the accumulator,
    /// `issued` must be new and `revoked` must have been issued. `index` itself is skipped.
    pub fn update<'a, 'b, T: TailsAccessor<E>>(
        &self,
        index: u32,
        issued: impl IntoIterator<Item = &'a u32>,
        revoked: impl IntoIterator<Item = &'b u32>,
        tails: &T,
    ) -> Result<Self, RevocationError> {
        let max = tails.max_cred_num();
        check_max_cred_num(max)?;
        check_index(index, max)?;
        let positions = |indices: Vec<u32>| -> Result<Vec<u32>, RevocationError> {
            indices
                .into_iter()
                .filter(|j| *j != index)
                .map(|j| {
                    check_index(j, max)?;
                    Ok(max + 1 - j + index)
                })
                .collect()
        };
        let added = positions(issued.into_iter().copied().collect())?;
        let removed = positions(revoked.into_iter().copied().collect())?;

        let sum = |positions: Vec<u32>| -> Result<E::G2, RevocationError> {
            let tails = cfg_into_iter!(positions)
                .map(|p| tails.access_tail(p))
                .collect::<Result<Vec<_>, RevocationError>>()?;
            Ok(tails.into_iter().fold(E::G2::zero(), |acc, t| acc + t))
        };
        let omega = self.omega.into_group() + sum(added)? - sum(removed)?;
        Ok(Self {
            omega: omega.into_affine(),
        })
    }
}
