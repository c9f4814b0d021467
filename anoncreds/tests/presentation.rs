use anoncreds::{error::ErrorKind, prelude::*};
use ark_std::rand::{rngs::StdRng, SeedableRng};
use std::collections::BTreeMap;
use test_utils::fixtures::{gvt_values, setup_issuer, Issuer, GVT_ATTRIBUTES};

fn request(json: &str) -> PresentationRequest {
    PresentationRequest::from_json(json).unwrap()
}

fn public_objects<'a>(issuers: &[&'a Issuer]) -> (BTreeMap<String, &'a Schema>, BTreeMap<String, &'a CredentialDefinition>) {
    (
        issuers.iter().map(|i| (i.schema_id.clone(), &i.schema)).collect(),
        issuers
            .iter()
            .map(|i| (i.cred_def_id.clone(), &i.cred_def))
            .collect(),
    )
}

fn config() -> VerifierConfig {
    VerifierConfig {
        reference_time: Some(1_000),
        ..Default::default()
    }
}

#[test]
fn reveal_name_and_prove_age() {
    let mut rng = StdRng::seed_from_u64(0u64);
    let mut issuer = setup_issuer(&mut rng, "gvt", &GVT_ATTRIBUTES, None, 0, false);
    let link_secret = create_link_secret(&mut rng);
    let credential = issuer.issue(&mut rng, &link_secret, &gvt_values("Alice", "28"), 0);
    verify_credential_signature(&credential, &issuer.cred_def, &link_secret).unwrap();

    let pres_req = request(
        r#"{
            "nonce": "123432421212",
            "name": "pres_req_1",
            "version": "0.1",
            "requested_attributes": {
                "attr1_referent": {"name": "name", "restrictions": [{"schema_name": "gvt"}]},
                "attr2_referent": {"name": "sex"}
            },
            "requested_predicates": {
                "predicate1_referent": {"name": "age", "p_type": ">=", "p_value": 18}
            }
        }"#,
    );
    let (schemas, cred_defs) = public_objects(&[&issuer]);

    let mut present = PresentCredentials::new();
    present
        .add_credential(&credential, None)
        .add_requested_attribute("attr1_referent", true)
        .add_requested_attribute("attr2_referent", false)
        .add_requested_predicate("predicate1_referent");
    let presentation = create_presentation(
        &mut rng,
        &pres_req,
        present,
        None,
        &link_secret,
        &schemas,
        &cred_defs,
    )
    .unwrap();

    let revealed = &presentation.requested_proof.revealed_attrs["attr1_referent"];
    assert_eq!(revealed.raw, "Alice");
    assert_eq!(revealed.encoded, encode_credential_attribute("Alice"));
    assert_eq!(
        presentation.requested_proof.unrevealed_attrs["attr2_referent"].sub_proof_index,
        0
    );
    assert!(presentation.identifiers[0].timestamp.is_none());
    assert!(verify_presentation(
        &presentation,
        &pres_req,
        &schemas,
        &cred_defs,
        None,
        None,
        &config()
    )
    .unwrap());

    // Verification is repeatable and survives JSON
    let presentation = Presentation::from_json(&presentation.to_json().unwrap()).unwrap();
    assert!(verify_presentation(
        &presentation,
        &pres_req,
        &schemas,
        &cred_defs,
        None,
        None,
        &config()
    )
    .unwrap());

    // Another request's nonce
    let mut other = pres_req.clone();
    other.nonce = Nonce::new(&mut rng);
    assert!(!verify_presentation(
        &presentation,
        &other,
        &schemas,
        &cred_defs,
        None,
        None,
        &config()
    )
    .unwrap());

    // Revealed value changed along with its encoding
    let mut tampered = presentation.clone();
    let attr = tampered
        .requested_proof
        .revealed_attrs
        .get_mut("attr1_referent")
        .unwrap();
    attr.raw = "Mallory".to_string();
    attr.encoded = encode_credential_attribute("Mallory");
    assert!(!verify_presentation(
        &tampered,
        &pres_req,
        &schemas,
        &cred_defs,
        None,
        None,
        &config()
    )
    .unwrap());

    // Raw value that doesn't encode to the revealed value
    let mut tampered = presentation.clone();
    tampered
        .requested_proof
        .revealed_attrs
        .get_mut("attr1_referent")
        .unwrap()
        .raw = "Mallory".to_string();
    assert_eq!(
        verify_presentation(
            &tampered,
            &pres_req,
            &schemas,
            &cred_defs,
            None,
            None,
            &config()
        )
        .unwrap_err()
        .kind(),
        ErrorKind::AttributeMismatch
    );

    // A stricter predicate than the proven one
    let mut stricter = pres_req.clone();
    stricter
        .requested_predicates
        .get_mut("predicate1_referent")
        .unwrap()
        .p_value = 21;
    assert!(!verify_presentation(
        &presentation,
        &stricter,
        &schemas,
        &cred_defs,
        None,
        None,
        &config()
    )
    .unwrap());

    // Changed challenge
    let mut tampered = presentation.clone();
    tampered.proof.aggregated_proof.c_hash += 1u32;
    assert!(!verify_presentation(
        &tampered,
        &pres_req,
        &schemas,
        &cred_defs,
        None,
        None,
        &config()
    )
    .unwrap());

    // Restriction the credential doesn't satisfy
    let mut restricted = pres_req.clone();
    restricted
        .requested_attributes
        .get_mut("attr1_referent")
        .unwrap()
        .restrictions = Some(vec![Restriction {
        issuer_id: Some("did:example:other".to_string()),
        ..Default::default()
    }]);
    assert_eq!(
        verify_presentation(
            &presentation,
            &restricted,
            &schemas,
            &cred_defs,
            None,
            None,
            &config()
        )
        .unwrap_err()
        .kind(),
        ErrorKind::InvalidInput
    );
}

#[test]
fn unsatisfied_predicate_and_missing_referents() {
    let mut rng = StdRng::seed_from_u64(0u64);
    let mut issuer = setup_issuer(&mut rng, "gvt", &GVT_ATTRIBUTES, None, 0, false);
    let link_secret = create_link_secret(&mut rng);
    let credential = issuer.issue(&mut rng, &link_secret, &gvt_values("Bob", "16"), 0);
    let (schemas, cred_defs) = public_objects(&[&issuer]);

    let pres_req = request(
        r#"{
            "nonce": "98765",
            "name": "adult",
            "version": "0.1",
            "requested_attributes": {"name": {"name": "name"}},
            "requested_predicates": {
                "adult": {"name": "age", "p_type": ">=", "p_value": 18},
                "child": {"name": "age", "p_type": "<", "p_value": 18}
            }
        }"#,
    );

    let mut present = PresentCredentials::new();
    present
        .add_credential(&credential, None)
        .add_requested_attribute("name", true)
        .add_requested_predicate("adult")
        .add_requested_predicate("child");
    assert_eq!(
        create_presentation(
            &mut rng,
            &pres_req,
            present,
            None,
            &link_secret,
            &schemas,
            &cred_defs
        )
        .unwrap_err()
        .kind(),
        ErrorKind::InvalidInput
    );

    // A predicate left unanswered
    let mut present = PresentCredentials::new();
    present
        .add_credential(&credential, None)
        .add_requested_attribute("name", true)
        .add_requested_predicate("child");
    assert!(create_presentation(
        &mut rng,
        &pres_req,
        present,
        None,
        &link_secret,
        &schemas,
        &cred_defs
    )
    .is_err());

    // Presenting with another link secret than the credential's
    let other = create_link_secret(&mut rng);
    let mut one = pres_req.clone();
    one.requested_predicates.remove("adult");
    let mut present = PresentCredentials::new();
    present
        .add_credential(&credential, None)
        .add_requested_attribute("name", true)
        .add_requested_predicate("child");
    let presentation =
        create_presentation(&mut rng, &one, present, None, &other, &schemas, &cred_defs).unwrap();
    assert!(!verify_presentation(
        &presentation,
        &one,
        &schemas,
        &cred_defs,
        None,
        None,
        &config()
    )
    .unwrap());
}

#[test]
fn groups_self_attested_and_two_issuers() {
    let mut rng = StdRng::seed_from_u64(0u64);
    let mut gvt = setup_issuer(&mut rng, "gvt", &GVT_ATTRIBUTES, None, 0, false);
    let mut xyz = setup_issuer(&mut rng, "xyz", &["status", "period"], None, 0, true);
    let link_secret = create_link_secret(&mut rng);
    let gvt_cred = gvt.issue(&mut rng, &link_secret, &gvt_values("Alice", "28"), 0);
    let xyz_cred = xyz.issue(
        &mut rng,
        &link_secret,
        &[("status", "partial"), ("period", "8")],
        0,
    );
    let (schemas, cred_defs) = public_objects(&[&gvt, &xyz]);

    let pres_req = request(
        r#"{
            "nonce": "1122334455",
            "name": "combined",
            "version": "1.0",
            "requested_attributes": {
                "identity": {"names": ["name", "sex"], "restrictions": [{"schema_name": "gvt"}]},
                "status": {"name": "status", "restrictions": [{"schema_name": "xyz"}]},
                "phone": {"name": "phone"}
            },
            "requested_predicates": {
                "period": {"name": "period", "p_type": ">", "p_value": 5},
                "height": {"name": "height", "p_type": "<=", "p_value": 200}
            }
        }"#,
    );
    let mut present = PresentCredentials::new();
    present
        .add_credential(&gvt_cred, None)
        .add_requested_attribute("identity", true)
        .add_requested_predicate("height");
    present
        .add_credential(&xyz_cred, None)
        .add_requested_attribute("status", true)
        .add_requested_predicate("period");
    let self_attested = [("phone".to_string(), "8-800-300".to_string())]
        .into_iter()
        .collect::<BTreeMap<_, _>>();
    let presentation = create_presentation(
        &mut rng,
        &pres_req,
        present,
        Some(self_attested.clone()),
        &link_secret,
        &schemas,
        &cred_defs,
    )
    .unwrap();

    let rp = &presentation.requested_proof;
    assert_eq!(rp.revealed_attr_groups["identity"].values["sex"].raw, "female");
    assert_eq!(rp.revealed_attrs["status"].sub_proof_index, 1);
    assert_eq!(rp.predicates["period"].sub_proof_index, 1);
    assert_eq!(rp.self_attested_attrs, self_attested);
    assert_eq!(presentation.identifiers[1].cred_def_id, xyz.cred_def_id);
    assert!(verify_presentation(
        &presentation,
        &pres_req,
        &schemas,
        &cred_defs,
        None,
        None,
        &config()
    )
    .unwrap());

    let strict = VerifierConfig {
        accept_self_attested: false,
        ..config()
    };
    assert!(verify_presentation(
        &presentation,
        &pres_req,
        &schemas,
        &cred_defs,
        None,
        None,
        &strict
    )
    .is_err());

    // Sub-proofs swapped between credentials
    let mut swapped = presentation.clone();
    swapped.proof.proofs.swap(0, 1);
    assert!(verify_presentation(
        &swapped,
        &pres_req,
        &schemas,
        &cred_defs,
        None,
        None,
        &config()
    )
    .map_or(true, |valid| !valid));

    // Missing credential definition
    let (_, only_gvt) = public_objects(&[&gvt]);
    assert_eq!(
        verify_presentation(
            &presentation,
            &pres_req,
            &schemas,
            &only_gvt,
            None,
            None,
            &config()
        )
        .unwrap_err()
        .kind(),
        ErrorKind::InvalidInput
    );

    // A referent answered by a credential can't also be self attested
    let mut present = PresentCredentials::new();
    present
        .add_credential(&gvt_cred, None)
        .add_requested_attribute("identity", true)
        .add_requested_predicate("height");
    present
        .add_credential(&xyz_cred, None)
        .add_requested_attribute("status", true)
        .add_requested_predicate("period");
    let mut twice = self_attested;
    twice.insert("status".to_string(), "full".to_string());
    assert!(create_presentation(
        &mut rng,
        &pres_req,
        present,
        Some(twice),
        &link_secret,
        &schemas,
        &cred_defs,
    )
    .is_err());
}
