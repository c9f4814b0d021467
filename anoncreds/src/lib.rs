#![allow(non_snake_case)]

//! AnonCreds: anonymous credentials over CL signatures with revocation through a pairing based
//! accumulator.
//!
//! Three roles exchange JSON serializable objects, see [`data_types`]:
//! - the issuer publishes schemas, credential definitions and revocation registries, issues
//!   credentials blindly and revokes them by publishing new versions of a registry's status list,
//!   [`issuer`].
//! - the holder requests credentials bound to its link secret, keeps them along with a witness of
//!   non-revocation, and answers presentation requests with one zero knowledge proof covering all
//!   the credentials it uses, [`prover`].
//! - the verifier checks a presentation against its request and the public objects, [`verifier`].
//!
//! Every operation taking randomness takes the RNG as its first argument.

#[macro_use]
pub mod error;
pub mod config;
pub mod data_types;
pub mod encoding;
pub mod issuer;
pub mod prover;
pub mod verifier;

pub mod prelude {
    pub use crate::{
        config::VerifierConfig,
        data_types::{
            cred_def::{
                CredentialDefinition, CredentialDefinitionConfig, CredentialDefinitionPrivate,
                CredentialKeyCorrectnessProof, SignatureType,
            },
            cred_offer::CredentialOffer,
            cred_request::{CredentialRequest, CredentialRequestMetadata},
            credential::{Credential, CredentialValues, MakeCredentialValues},
            link_secret::LinkSecret,
            nonce::Nonce,
            pres_request::{
                AttributeInfo, NonRevokedInterval, PredicateInfo, PresentationRequest, Restriction,
            },
            presentation::Presentation,
            rev_reg_def::{
                RegistryType, RevocationRegistryDefinition, RevocationRegistryDefinitionPrivate,
            },
            rev_state::CredentialRevocationState,
            rev_status_list::{CredentialStatus, RevocationStatusList},
            schema::{AttributeNames, Schema},
            JsonObject,
        },
        encoding::encode_credential_attribute,
        error::{Error, ErrorKind, Result},
        issuer::*,
        prover::*,
        verifier::*,
    };
    pub use cks_accumulator::tails::{Tails, TailsAccessor};
    pub use cl_signatures::proof::predicate::PredicateType;
}
