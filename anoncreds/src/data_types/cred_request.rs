use super::{nonce::Nonce, Curve, Scalar};
use cks_accumulator::signature::{BlindedRevocationSecret, RevocationBlindingFactor};
use cl_signatures::blind::{
    BlindedLinkSecret, BlindedLinkSecretCorrectnessProof, LinkSecretBlindingFactors,
};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entropy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prover_did: Option<String>,
    pub cred_def_id: String,
    pub blinded_ms: BlindedLinkSecret,
    pub blinded_ms_correctness_proof: BlindedLinkSecretCorrectnessProof,
    /// Present when the credential definition supports revocation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blinded_revocation_secret: Option<BlindedRevocationSecret<Curve>>,
    pub nonce: Nonce,
}

/// Kept by the holder until the credential arrives
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRequestMetadata {
    pub link_secret_blinding_data: LinkSecretBlindingFactors,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revocation_blinding_data: Option<RevocationBlindingFactor<Scalar>>,
    pub nonce: Nonce,
    pub link_secret_name: String,
}

impl CredentialRequest {
    /// Entropy or DID the credential's context is derived from. Exactly one of them is set in a
    /// well formed request.
    pub fn prover_id(&self) -> crate::error::Result<&str> {
        match (&self.entropy, &self.prover_did) {
            (Some(e), None) => Ok(e),
            (None, Some(d)) => Ok(d),
            _ => Err(err_msg!(
                InvalidInput,
                "Credential request must have exactly one of entropy and prover_did"
            )),
        }
    }
}
