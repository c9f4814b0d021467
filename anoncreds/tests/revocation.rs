use anoncreds::{error::ErrorKind, prelude::*};
use ark_std::rand::{rngs::StdRng, SeedableRng};
use std::collections::BTreeMap;
use test_utils::fixtures::{gvt_values, setup_issuer, Issuer, GVT_ATTRIBUTES};

const CREATED: u64 = 10;

fn pres_req(nonce: &str, interval: &str) -> PresentationRequest {
    PresentationRequest::from_json(&format!(
        r#"{{
            "nonce": "{}",
            "name": "revocation",
            "version": "1.0",
            "requested_attributes": {{"name": {{"name": "name"}}}},
            "requested_predicates": {{"age": {{"name": "age", "p_type": ">=", "p_value": 18}}}},
            "non_revoked": {}
        }}"#,
        nonce, interval
    ))
    .unwrap()
}

fn present(
    rng: &mut StdRng,
    issuer: &Issuer,
    request: &PresentationRequest,
    credential: &Credential,
    state: Option<&CredentialRevocationState>,
    link_secret: &LinkSecret,
) -> anoncreds::error::Result<Presentation> {
    let schemas: BTreeMap<String, &Schema> =
        [(issuer.schema_id.clone(), &issuer.schema)].into_iter().collect();
    let cred_defs: BTreeMap<String, &CredentialDefinition> =
        [(issuer.cred_def_id.clone(), &issuer.cred_def)].into_iter().collect();
    let mut credentials = PresentCredentials::new();
    credentials
        .add_credential(credential, state)
        .add_requested_attribute("name", true)
        .add_requested_predicate("age");
    create_presentation(
        rng,
        request,
        credentials,
        None,
        link_secret,
        &schemas,
        &cred_defs,
    )
}

fn verify(
    issuer: &Issuer,
    request: &PresentationRequest,
    presentation: &Presentation,
    lists: &[&RevocationStatusList],
) -> anoncreds::error::Result<bool> {
    let schemas: BTreeMap<String, &Schema> =
        [(issuer.schema_id.clone(), &issuer.schema)].into_iter().collect();
    let cred_defs: BTreeMap<String, &CredentialDefinition> =
        [(issuer.cred_def_id.clone(), &issuer.cred_def)].into_iter().collect();
    let registry = issuer.registry();
    let rev_reg_defs: BTreeMap<String, &RevocationRegistryDefinition> =
        [(registry.id.clone(), &registry.def)].into_iter().collect();
    verify_presentation(
        presentation,
        request,
        &schemas,
        &cred_defs,
        Some(&rev_reg_defs),
        Some(lists),
        &VerifierConfig {
            reference_time: Some(1_000),
            ..Default::default()
        },
    )
}

#[test]
fn revoke_and_reissue() {
    let mut rng = StdRng::seed_from_u64(0u64);
    let mut issuer = setup_issuer(&mut rng, "gvt", &GVT_ATTRIBUTES, Some(5), CREATED, false);
    let alice_secret = create_link_secret(&mut rng);
    let bob_secret = create_link_secret(&mut rng);

    let alice = issuer.issue(&mut rng, &alice_secret, &gvt_values("Alice", "28"), 100);
    let list_100 = issuer.registry().status_list.clone();
    let bob = issuer.issue(&mut rng, &bob_secret, &gvt_values("Bob", "30"), 110);
    let list_110 = issuer.registry().status_list.clone();
    assert_eq!(alice.rev_reg_index, Some(1));
    assert_eq!(bob.rev_reg_index, Some(2));

    let registry = issuer.registry();
    let alice_100 = create_or_update_revocation_state(
        &registry.tails,
        &registry.def,
        &list_100,
        1,
        None,
    )
    .unwrap();
    assert_eq!(alice_100.timestamp, 100);
    assert_eq!(Some(alice_100.rev_reg), alice.rev_reg);
    let bob_110 =
        create_or_update_revocation_state(&registry.tails, &registry.def, &list_110, 2, None)
            .unwrap();
    // Bob's credential changed the accumulator, Alice's witness follows
    let alice_110 = create_or_update_revocation_state(
        &registry.tails,
        &registry.def,
        &list_110,
        1,
        Some((&alice_100, &list_100)),
    )
    .unwrap();
    assert_eq!(
        alice_110,
        create_or_update_revocation_state(&registry.tails, &registry.def, &list_110, 1, None)
            .unwrap()
    );

    let request = pres_req("1000001", r#"{"to": 150}"#);
    let presentation = present(
        &mut rng,
        &issuer,
        &request,
        &alice,
        Some(&alice_110),
        &alice_secret,
    )
    .unwrap();
    assert_eq!(presentation.identifiers[0].timestamp, Some(110));
    assert!(presentation.proof.proofs[0].non_revoc_proof.is_some());
    assert!(verify(&issuer, &request, &presentation, &[&list_100, &list_110]).unwrap());
    // The status list version of the proof is needed
    assert_eq!(
        verify(&issuer, &request, &presentation, &[&list_100])
            .unwrap_err()
            .kind(),
        ErrorKind::RevocationStateInvalid
    );
    // Proven against another accumulator than the one of its timestamp
    let mut wrong = list_100.clone();
    wrong.timestamp = 110;
    assert!(!verify(&issuer, &request, &presentation, &[&wrong]).unwrap());

    // Non-revocation is needed when the request asks for it
    assert!(present(&mut rng, &issuer, &request, &alice, None, &alice_secret).is_err());
    let mut stripped = presentation.clone();
    stripped.proof.proofs[0].non_revoc_proof = None;
    stripped.identifiers[0].timestamp = None;
    assert_eq!(
        verify(&issuer, &request, &stripped, &[&list_110])
            .unwrap_err()
            .kind(),
        ErrorKind::RevocationStateInvalid
    );

    // Alice is revoked
    let list_200 = issuer.update_registry(&[], &[1], 200);
    let registry = issuer.registry();
    assert_eq!(
        create_or_update_revocation_state(
            &registry.tails,
            &registry.def,
            &list_200,
            1,
            Some((&alice_110, &list_110)),
        )
        .unwrap_err()
        .kind(),
        ErrorKind::RevocationStateInvalid
    );
    let bob_200 = create_or_update_revocation_state(
        &registry.tails,
        &registry.def,
        &list_200,
        2,
        Some((&bob_110, &list_110)),
    )
    .unwrap();

    // Before the revocation Alice's proof still holds, requests about later times reject it
    assert!(verify(&issuer, &request, &presentation, &[&list_110]).unwrap());
    let later = pres_req("1000002", r#"{"from": 200}"#);
    let presentation = present(
        &mut rng,
        &issuer,
        &later,
        &alice,
        Some(&alice_110),
        &alice_secret,
    )
    .unwrap();
    assert_eq!(
        verify(&issuer, &later, &presentation, &[&list_110, &list_200])
            .unwrap_err()
            .kind(),
        ErrorKind::RevocationStateInvalid
    );
    // Dropping the registry from the identifier doesn't lift the requirement
    let unchecked = pres_req("1000002", "null");
    let mut presentation = present(
        &mut rng,
        &issuer,
        &unchecked,
        &alice,
        None,
        &alice_secret,
    )
    .unwrap();
    assert!(presentation.proof.proofs[0].non_revoc_proof.is_none());
    assert_eq!(
        verify(&issuer, &later, &presentation, &[&list_200])
            .unwrap_err()
            .kind(),
        ErrorKind::RevocationStateInvalid
    );
    presentation.identifiers[0].rev_reg_id = None;
    assert_eq!(
        verify(&issuer, &later, &presentation, &[&list_200])
            .unwrap_err()
            .kind(),
        ErrorKind::RevocationStateInvalid
    );
    // Without an interval the registry still has to match the credential definition
    assert_eq!(
        verify(&issuer, &unchecked, &presentation, &[&list_200])
            .unwrap_err()
            .kind(),
        ErrorKind::InvalidInput
    );

    // An old witness claimed for the new accumulator doesn't verify
    let forged = CredentialRevocationState {
        witness: alice_110.witness.clone(),
        rev_reg: list_200.current_accumulator,
        timestamp: 200,
    };
    let presentation =
        present(&mut rng, &issuer, &later, &alice, Some(&forged), &alice_secret).unwrap();
    assert!(!verify(&issuer, &later, &presentation, &[&list_200]).unwrap());

    let presentation =
        present(&mut rng, &issuer, &later, &bob, Some(&bob_200), &bob_secret).unwrap();
    assert!(verify(&issuer, &later, &presentation, &[&list_200]).unwrap());

    // Issued again
    let list_300 = issuer.update_registry(&[1], &[], 300);
    let registry = issuer.registry();
    let alice_300 = create_or_update_revocation_state(
        &registry.tails,
        &registry.def,
        &list_300,
        1,
        Some((&alice_110, &list_110)),
    )
    .unwrap();
    assert_eq!(list_300.current_accumulator, list_110.current_accumulator);
    let presentation = present(
        &mut rng,
        &issuer,
        &later,
        &alice,
        Some(&alice_300),
        &alice_secret,
    )
    .unwrap();
    assert!(verify(&issuer, &later, &presentation, &[&list_200, &list_300]).unwrap());

    // Timestamps too far ahead of the verifier's clock
    let future = issuer.update_registry(&[], &[2], 5_000);
    let registry = issuer.registry();
    let alice_future = create_or_update_revocation_state(
        &registry.tails,
        &registry.def,
        &future,
        1,
        Some((&alice_300, &list_300)),
    )
    .unwrap();
    let presentation = present(
        &mut rng,
        &issuer,
        &later,
        &alice,
        Some(&alice_future),
        &alice_secret,
    )
    .unwrap();
    assert_eq!(
        verify(&issuer, &later, &presentation, &[&future])
            .unwrap_err()
            .kind(),
        ErrorKind::RevocationStateInvalid
    );
}

#[test]
fn revocation_state_checks() {
    let mut rng = StdRng::seed_from_u64(1u64);
    let mut issuer = setup_issuer(&mut rng, "gvt", &GVT_ATTRIBUTES, Some(3), CREATED, false);
    let link_secret = create_link_secret(&mut rng);
    let credential = issuer.issue(&mut rng, &link_secret, &gvt_values("Alice", "28"), 20);
    let list_20 = issuer.registry().status_list.clone();
    let registry = issuer.registry();

    // Unissued index
    assert_eq!(
        create_or_update_revocation_state(&registry.tails, &registry.def, &list_20, 2, None)
            .unwrap_err()
            .kind(),
        ErrorKind::RevocationStateInvalid
    );
    // Index outside the registry
    assert!(
        create_or_update_revocation_state(&registry.tails, &registry.def, &list_20, 4, None)
            .is_err()
    );

    // Tails of another registry
    let (_, _, other_tails) = create_revocation_registry_def(
        &mut rng,
        &issuer.cred_def,
        &issuer.cred_def_id,
        "other",
        RegistryType::CL_ACCUM,
        3,
        "/tmp/other",
    )
    .unwrap();
    assert_eq!(
        create_or_update_revocation_state(&other_tails, &registry.def, &list_20, 1, None)
            .unwrap_err()
            .kind(),
        ErrorKind::RevocationStateInvalid
    );

    let state =
        create_or_update_revocation_state(&registry.tails, &registry.def, &list_20, 1, None)
            .unwrap();
    let json = state.to_json().unwrap();
    assert_eq!(CredentialRevocationState::from_json(&json).unwrap(), state);

    // The previous status list must be the one of the previous state
    let empty = create_revocation_status_list(&registry.id, &registry.def, CREATED).unwrap();
    assert_eq!(
        create_or_update_revocation_state(
            &registry.tails,
            &registry.def,
            &list_20,
            1,
            Some((&state, &empty)),
        )
        .unwrap_err()
        .kind(),
        ErrorKind::RevocationStateInvalid
    );

    // A revocable credential presented without non-revocation when the request doesn't ask
    let request = pres_req("42", "null");
    assert!(request.non_revoked.is_none());
    let presentation = present(&mut rng, &issuer, &request, &credential, None, &link_secret).unwrap();
    assert!(presentation.proof.proofs[0].non_revoc_proof.is_none());
    assert!(verify(&issuer, &request, &presentation, &[]).unwrap());
}
