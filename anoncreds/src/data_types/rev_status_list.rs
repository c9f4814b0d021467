//! State of every index of a revocation registry along with the accumulator over the issued ones.
//! Each change is a new version with a greater timestamp, published by the issuer. Holders and
//! verifiers refer to a version by its timestamp.

use super::Curve;
use crate::error::Result;
use cks_accumulator::{
    accumulator::{check_index, check_max_cred_num, Accumulator},
    tails::TailsAccessor,
};
use log::trace;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialStatus {
    Unissued,
    Issued,
    Revoked,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevocationStatusList {
    pub rev_reg_def_id: String,
    pub issuer_id: String,
    /// Status of index `i` is at position `i-1`
    pub revocation_list: Vec<CredentialStatus>,
    pub current_accumulator: Accumulator<Curve>,
    /// Seconds since the Unix epoch
    pub timestamp: u64,
}

impl RevocationStatusList {
    /// List with every index unissued and the empty accumulator
    pub fn new(
        rev_reg_def_id: impl Into<String>,
        issuer_id: impl Into<String>,
        max_cred_num: u32,
        timestamp: u64,
    ) -> Result<Self> {
        check_max_cred_num(max_cred_num)?;
        Ok(Self {
            rev_reg_def_id: rev_reg_def_id.into(),
            issuer_id: issuer_id.into(),
            revocation_list: vec![CredentialStatus::Unissued; max_cred_num as usize],
            current_accumulator: Accumulator::empty(),
            timestamp,
        })
    }

    pub fn max_cred_num(&self) -> u32 {
        self.revocation_list.len() as u32
    }

    pub fn status(&self, index: u32) -> Result<CredentialStatus> {
        check_index(index, self.max_cred_num())?;
        Ok(self.revocation_list[index as usize - 1])
    }

    pub fn issued_indices(&self) -> BTreeSet<u32> {
        self.indices_with(CredentialStatus::Issued)
    }

    pub fn revoked_indices(&self) -> BTreeSet<u32> {
        self.indices_with(CredentialStatus::Revoked)
    }

    pub fn next_unissued_index(&self) -> Option<u32> {
        self.revocation_list
            .iter()
            .position(|s| *s == CredentialStatus::Unissued)
            .map(|p| p as u32 + 1)
    }

    /// Marks the next unissued index as issued, returning it
    pub(crate) fn allocate<T: TailsAccessor<Curve>>(
        &mut self,
        tails: &T,
        timestamp: u64,
    ) -> Result<u32> {
        let index = self.next_unissued_index().ok_or_else(|| {
            err_msg!(
                RevocationRegistryFull,
                "All {} indices of registry {} are used",
                self.max_cred_num(),
                self.rev_reg_def_id
            )
        })?;
        self.check_timestamp(timestamp)?;
        let accumulator = self.current_accumulator.update(&[index], &[], tails)?;
        self.revocation_list[index as usize - 1] = CredentialStatus::Issued;
        self.current_accumulator = accumulator;
        self.timestamp = timestamp;
        trace!(
            "RevocationStatusList::allocate: <<< index: {}, timestamp: {}",
            index,
            timestamp
        );
        Ok(index)
    }

    /// Revokes issued indices and issues again revoked ones. Nothing changes on error.
    pub(crate) fn update<T: TailsAccessor<Curve>>(
        &mut self,
        issued: &BTreeSet<u32>,
        revoked: &BTreeSet<u32>,
        tails: &T,
        timestamp: u64,
    ) -> Result<()> {
        trace!(
            "RevocationStatusList::update: >>> issued: {:?}, revoked: {:?}, timestamp: {}",
            issued,
            revoked,
            timestamp
        );
        self.check_timestamp(timestamp)?;
        if let Some(i) = issued.intersection(revoked).next() {
            return Err(err_msg!(InvalidInput, "Index {} both issued and revoked", i));
        }
        for i in issued {
            if self.status(*i)? != CredentialStatus::Revoked {
                return Err(err_msg!(InvalidInput, "Index {} is not revoked", i));
            }
        }
        for i in revoked {
            if self.status(*i)? != CredentialStatus::Issued {
                return Err(err_msg!(InvalidInput, "Index {} is not issued", i));
            }
        }
        let accumulator = self.current_accumulator.update(issued, revoked, tails)?;
        for i in issued {
            self.revocation_list[*i as usize - 1] = CredentialStatus::Issued;
        }
        for i in revoked {
            self.revocation_list[*i as usize - 1] = CredentialStatus::Revoked;
        }
        self.current_accumulator = accumulator;
        self.timestamp = timestamp;
        Ok(())
    }

    fn check_timestamp(&self, timestamp: u64) -> Result<()> {
        if timestamp <= self.timestamp {
            return Err(err_msg!(
                InvalidInput,
                "Timestamp {} is not after the current version's {}",
                timestamp,
                self.timestamp
            ));
        }
        Ok(())
    }

    fn indices_with(&self, status: CredentialStatus) -> BTreeSet<u32> {
        self.revocation_list
            .iter()
            .enumerate()
            .filter(|(_, s)| **s == status)
            .map(|(p, _)| p as u32 + 1)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use ark_std::rand::{rngs::StdRng, SeedableRng};
    use cks_accumulator::{
        accumulator::MAX_CRED_NUM,
        setup::{RegistrySecretKey, RevocationParams},
        tails::Tails,
    };

    #[test]
    fn status_list_versions() {
        let mut rng = StdRng::seed_from_u64(0u64);
        let params = RevocationParams::<Curve>::generate_using_rng(&mut rng);
        let gamma = RegistrySecretKey::new(&mut rng);
        let tails = Tails::generate(&params, &gamma, 3).unwrap();

        let mut list = RevocationStatusList::new("rev_reg", "issuer", 3, 10).unwrap();
        assert!(list.current_accumulator.is_empty());
        assert_eq!(list.next_unissued_index(), Some(1));

        assert_eq!(list.allocate(&tails, 11).unwrap(), 1);
        assert_eq!(list.allocate(&tails, 12).unwrap(), 2);
        // Timestamps only increase
        assert_eq!(
            list.allocate(&tails, 12).unwrap_err().kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(list.allocate(&tails, 13).unwrap(), 3);
        assert_eq!(
            list.allocate(&tails, 14).unwrap_err().kind(),
            ErrorKind::RevocationRegistryFull
        );
        assert_eq!(list.issued_indices(), [1, 2, 3].into_iter().collect());
        let all = list.current_accumulator;

        let before = list.clone();
        let two: BTreeSet<u32> = [2].into_iter().collect();
        let none = BTreeSet::new();
        list.update(&none, &two, &tails, 20).unwrap();
        assert_eq!(list.status(2).unwrap(), CredentialStatus::Revoked);
        assert_eq!(list.revoked_indices(), two);
        assert_ne!(list.current_accumulator, all);

        // Revoking a revoked index and issuing an issued one are rejected and change nothing
        let after = list.clone();
        assert!(list.update(&none, &two, &tails, 21).is_err());
        let one: BTreeSet<u32> = [1].into_iter().collect();
        assert!(list.update(&one, &none, &tails, 21).is_err());
        assert!(list.update(&two, &two, &tails, 21).is_err());
        assert_eq!(list, after);

        list.update(&two, &none, &tails, 21).unwrap();
        assert_eq!(list.current_accumulator, all);
        assert_eq!(list.revocation_list, before.revocation_list);

        let four: BTreeSet<u32> = [4].into_iter().collect();
        assert_eq!(
            list.update(&none, &four, &tails, 22).unwrap_err().kind(),
            ErrorKind::RevocationStateInvalid
        );

        let unissued = RevocationStatusList::new("rev_reg", "issuer", 3, 10).unwrap();
        assert!(unissued
            .clone()
            .update(&none, &one, &tails, 11)
            .is_err());
        assert!(unissued.clone().update(&one, &none, &tails, 11).is_err());
        assert!(RevocationStatusList::new("rev_reg", "issuer", 0, 10).is_err());
        assert_eq!(
            RevocationStatusList::new("rev_reg", "issuer", MAX_CRED_NUM + 1, 10)
                .unwrap_err()
                .kind(),
            ErrorKind::InvalidInput
        );

        let json = serde_json::to_string(&list).unwrap();
        assert!(json.contains("\"revocation_list\":[\"issued\",\"issued\",\"issued\"]"));
        assert_eq!(
            serde_json::from_str::<RevocationStatusList>(&json).unwrap(),
            list
        );
    }
}
