use super::{Curve, Scalar};
use cks_accumulator::setup::{RevocationParams, RevocationPublicKey, RevocationSecretKey};
use cl_signatures::setup::{
    CredentialKeyConfig, KeyCorrectnessProof, PrimaryPublicKey, PrimarySecretKey,
};
use serde::{Deserialize, Serialize};
use std::fmt;

pub type CredentialKeyCorrectnessProof = KeyCorrectnessProof;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignatureType {
    CL,
}

impl fmt::Display for SignatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CL")
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialDefinition {
    pub schema_id: String,
    pub signature_type: SignatureType,
    pub tag: String,
    pub value: CredentialDefinitionData,
    pub issuer_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialDefinitionData {
    pub primary: PrimaryPublicKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revocation: Option<CredentialRevocationPublicKey>,
}

/// Generators and the issuer's public key for revocation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRevocationPublicKey {
    pub params: RevocationParams<Curve>,
    pub public_key: RevocationPublicKey<Curve>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialDefinitionPrivate {
    pub primary: PrimarySecretKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revocation: Option<RevocationSecretKey<Scalar>>,
}

/// Options of credential definition creation
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialDefinitionConfig {
    pub support_revocation: bool,
    #[serde(flatten)]
    pub key: CredentialKeyConfig,
}

impl CredentialDefinition {
    pub fn support_revocation(&self) -> bool {
        self.value.revocation.is_some()
    }

    /// Revocation keys, an error when the definition doesn't support revocation
    pub fn revocation_key(&self) -> crate::error::Result<&CredentialRevocationPublicKey> {
        self.value.revocation.as_ref().ok_or_else(|| {
            err_msg!(
                InvalidInput,
                "Credential definition for schema {} doesn't support revocation",
                self.schema_id
            )
        })
    }
}

impl CredentialDefinitionConfig {
    pub fn new(support_revocation: bool) -> Self {
        Self {
            support_revocation,
            ..Default::default()
        }
    }
}
