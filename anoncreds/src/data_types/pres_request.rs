use super::{attr_common_view, nonce::Nonce};
use crate::error::Result;
use cl_signatures::proof::predicate::PredicateType;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresentationRequest {
    pub nonce: Nonce,
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub requested_attributes: BTreeMap<String, AttributeInfo>,
    #[serde(default)]
    pub requested_predicates: BTreeMap<String, PredicateInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub non_revoked: Option<NonRevokedInterval>,
}

/// A single attribute (`name`) or a group of attributes of the same credential (`names`)
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub names: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restrictions: Option<Vec<Restriction>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub non_revoked: Option<NonRevokedInterval>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredicateInfo {
    pub name: String,
    pub p_type: PredicateType,
    pub p_value: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restrictions: Option<Vec<Restriction>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub non_revoked: Option<NonRevokedInterval>,
}

/// Conditions on the credential used for a referent. A restriction holds when every field that
/// is set matches, a list of restrictions holds when any of them does.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Restriction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_issuer_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cred_def_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rev_reg_id: Option<String>,
}

/// Interval of timestamps, both ends included
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonRevokedInterval {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<u64>,
}

/// Values of the credential a restriction is checked against
#[derive(Clone, Copy, Debug)]
pub struct RestrictionSubject<'a> {
    pub schema_id: &'a str,
    pub schema_issuer_id: &'a str,
    pub schema_name: &'a str,
    pub schema_version: &'a str,
    pub issuer_id: &'a str,
    pub cred_def_id: &'a str,
    pub rev_reg_id: Option<&'a str>,
}

impl PresentationRequest {
    /// Checks every referent asks for something and no attribute group repeats a name
    pub fn validate(&self) -> Result<()> {
        if self.requested_attributes.is_empty() && self.requested_predicates.is_empty() {
            return Err(err_msg!(InvalidInput, "Presentation request asks for nothing"));
        }
        for (referent, info) in &self.requested_attributes {
            let names = info.names()?;
            let unique: BTreeSet<String> = names.iter().map(|n| attr_common_view(n)).collect();
            if unique.len() != names.len() {
                return Err(err_msg!(
                    InvalidInput,
                    "Attribute group {} repeats a name",
                    referent
                ));
            }
        }
        for (referent, info) in &self.requested_predicates {
            if info.name.is_empty() {
                return Err(err_msg!(InvalidInput, "Predicate {} has no name", referent));
            }
        }
        Ok(())
    }

    /// Interval applying to an attribute or predicate referent, the referent's own before the
    /// request's
    pub fn interval_for(&self, own: &Option<NonRevokedInterval>) -> Option<NonRevokedInterval> {
        own.or(self.non_revoked)
    }
}

impl AttributeInfo {
    pub fn single(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn group(names: &[&str]) -> Self {
        Self {
            names: Some(names.iter().map(|n| n.to_string()).collect()),
            ..Default::default()
        }
    }

    /// The requested names, exactly one of `name` and `names` must be set
    pub fn names(&self) -> Result<Vec<&String>> {
        match (&self.name, &self.names) {
            (Some(n), None) => Ok(vec![n]),
            (None, Some(ns)) if !ns.is_empty() => Ok(ns.iter().collect()),
            _ => Err(err_msg!(
                InvalidInput,
                "Requested attribute must have exactly one of name and a non empty names"
            )),
        }
    }

    pub fn is_group(&self) -> bool {
        self.names.is_some()
    }
}

impl NonRevokedInterval {
    pub fn contains(&self, timestamp: u64) -> bool {
        self.from.map_or(true, |f| f <= timestamp) && self.to.map_or(true, |t| timestamp <= t)
    }
}

impl Restriction {
    pub fn matches(&self, subject: &RestrictionSubject) -> bool {
        fn eq(expected: &Option<String>, actual: &str) -> bool {
            expected.as_deref().map_or(true, |e| e == actual)
        }
        eq(&self.schema_id, subject.schema_id)
            && eq(&self.schema_issuer_id, subject.schema_issuer_id)
            && eq(&self.schema_name, subject.schema_name)
            && eq(&self.schema_version, subject.schema_version)
            && eq(&self.issuer_id, subject.issuer_id)
            && eq(&self.cred_def_id, subject.cred_def_id)
            && self
                .rev_reg_id
                .as_deref()
                .map_or(true, |e| subject.rev_reg_id == Some(e))
    }
}

/// Whether a credential satisfies a referent's restrictions. No restrictions always hold, an
/// empty list never does.
pub fn restrictions_hold(restrictions: &Option<Vec<Restriction>>, subject: &RestrictionSubject) -> bool {
    match restrictions {
        None => true,
        Some(r) => r.iter().any(|r| r.matches(subject)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_types::JsonObject;

    #[test]
    fn request_json() {
        let json = r#"{
            "nonce": "1234567890",
            "name": "proof",
            "version": "1.0",
            "requested_attributes": {
                "attr1": {"name": "name", "restrictions": [{"cred_def_id": "creddef:1"}]},
                "group": {"names": ["name", "age"]}
            },
            "requested_predicates": {
                "pred1": {"name": "age", "p_type": ">=", "p_value": 18}
            },
            "non_revoked": {"to": 100}
        }"#;
        let req = PresentationRequest::from_json(json).unwrap();
        req.validate().unwrap();
        assert_eq!(req.requested_predicates["pred1"].p_type, PredicateType::GE);
        assert!(req.requested_attributes["group"].is_group());
        assert_eq!(
            req.interval_for(&None),
            Some(NonRevokedInterval { from: None, to: Some(100) })
        );
        let own = Some(NonRevokedInterval { from: Some(5), to: None });
        assert_eq!(req.interval_for(&own), own);
        assert_eq!(
            PresentationRequest::from_json(&req.to_json().unwrap()).unwrap(),
            req
        );

        let mut bad = req.clone();
        bad.requested_attributes
            .insert("x".into(), AttributeInfo::group(&["a", "A"]));
        assert!(bad.validate().is_err());
        let mut bad = req.clone();
        bad.requested_attributes.insert(
            "x".into(),
            AttributeInfo {
                name: Some("a".into()),
                names: Some(vec!["b".into()]),
                ..Default::default()
            },
        );
        assert!(bad.validate().is_err());
    }

    #[test]
    fn restrictions_and_intervals() {
        let subject = RestrictionSubject {
            schema_id: "schema:1",
            schema_issuer_id: "issuer:1",
            schema_name: "basic",
            schema_version: "1.0",
            issuer_id: "issuer:2",
            cred_def_id: "creddef:1",
            rev_reg_id: None,
        };
        assert!(restrictions_hold(&None, &subject));
        assert!(!restrictions_hold(&Some(vec![]), &subject));
        let r = Restriction {
            schema_name: Some("basic".into()),
            issuer_id: Some("issuer:2".into()),
            ..Default::default()
        };
        assert!(restrictions_hold(&Some(vec![r.clone()]), &subject));
        let other = Restriction {
            rev_reg_id: Some("revreg:1".into()),
            ..Default::default()
        };
        assert!(!other.matches(&subject));
        assert!(restrictions_hold(&Some(vec![other, r]), &subject));

        let i = NonRevokedInterval { from: Some(10), to: Some(20) };
        assert!(i.contains(10) && i.contains(20));
        assert!(!i.contains(9) && !i.contains(21));
        assert!(NonRevokedInterval::default().contains(0));
    }
}
