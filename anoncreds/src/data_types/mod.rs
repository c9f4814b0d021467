//! Objects exchanged between issuer, holder and verifier, and the private objects each of them
//! keeps. All of them serialize to JSON, big integers as decimal strings and group elements as
//! their compressed encoding.

pub mod cred_def;
pub mod cred_offer;
pub mod cred_request;
pub mod credential;
pub mod link_secret;
pub mod nonce;
pub mod pres_request;
pub mod presentation;
pub mod rev_reg_def;
pub mod rev_state;
pub mod rev_status_list;
pub mod schema;

use crate::error::Result;
use serde::{de::DeserializeOwned, Serialize};

/// Pairing used for revocation
pub type Curve = ark_bls12_381::Bls12_381;
pub type Scalar = ark_bls12_381::Fr;

/// Typed JSON entry point of every object
pub trait JsonObject: Serialize + DeserializeOwned {
    fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

macro_rules! impl_json_object {
    ($($t: ty),+) => {
        $(impl $crate::data_types::JsonObject for $t {})+
    };
}

impl_json_object!(
    schema::Schema,
    cred_def::CredentialDefinition,
    cred_def::CredentialDefinitionPrivate,
    cred_def::CredentialKeyCorrectnessProof,
    cred_offer::CredentialOffer,
    cred_request::CredentialRequest,
    cred_request::CredentialRequestMetadata,
    credential::Credential,
    link_secret::LinkSecret,
    nonce::Nonce,
    rev_reg_def::RevocationRegistryDefinition,
    rev_reg_def::RevocationRegistryDefinitionPrivate,
    rev_status_list::RevocationStatusList,
    rev_state::CredentialRevocationState,
    pres_request::PresentationRequest,
    presentation::Presentation
);

/// Attribute names are compared ignoring case and spaces
pub fn attr_common_view(name: &str) -> String {
    name.replace(' ', "").to_lowercase()
}
