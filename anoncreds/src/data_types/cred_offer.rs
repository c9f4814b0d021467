use super::{cred_def::CredentialKeyCorrectnessProof, nonce::Nonce};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialOffer {
    pub schema_id: String,
    pub cred_def_id: String,
    pub key_correctness_proof: CredentialKeyCorrectnessProof,
    pub nonce: Nonce,
}
