use super::Curve;
use cks_accumulator::{accumulator::Accumulator, witness::Witness};
use serde::{Deserialize, Serialize};

/// Holder's witness for its credential's index against one version of the status list
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRevocationState {
    pub witness: Witness<Curve>,
    pub rev_reg: Accumulator<Curve>,
    pub timestamp: u64,
}
