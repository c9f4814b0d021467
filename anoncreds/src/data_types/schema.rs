use super::attr_common_view;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub name: String,
    pub version: String,
    pub attr_names: AttributeNames,
    pub issuer_id: String,
}

/// Attribute names of a schema in the order the issuer gave them
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeNames(pub Vec<String>);

impl Schema {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        issuer_id: impl Into<String>,
        attr_names: AttributeNames,
    ) -> Result<Self> {
        let schema = Self {
            name: name.into(),
            version: version.into(),
            attr_names,
            issuer_id: issuer_id.into(),
        };
        schema.validate()?;
        Ok(schema)
    }

    /// Checks the schema has at least 1 attribute, no 2 the same in their common view
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() || self.version.is_empty() {
            return Err(err_msg!(InvalidInput, "Schema needs a name and a version"));
        }
        if self.attr_names.0.is_empty() {
            return Err(err_msg!(InvalidInput, "Schema has no attributes"));
        }
        let mut seen = BTreeSet::new();
        for name in &self.attr_names.0 {
            if !seen.insert(attr_common_view(name)) {
                return Err(err_msg!(InvalidInput, "Duplicate attribute {:?}", name));
            }
        }
        Ok(())
    }

    /// Attribute names in their common view, these are the names the issuer's keys are for
    pub fn common_attr_names(&self) -> BTreeSet<String> {
        self.attr_names.0.iter().map(|n| attr_common_view(n)).collect()
    }
}

impl From<&[&str]> for AttributeNames {
    fn from(names: &[&str]) -> Self {
        Self(names.iter().map(|n| n.to_string()).collect())
    }
}

impl From<Vec<String>> for AttributeNames {
    fn from(names: Vec<String>) -> Self {
        Self(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{data_types::JsonObject, error::ErrorKind};

    #[test]
    fn schema_validation() {
        let names: &[&str] = &["name", "age", "First Name"];
        let schema = Schema::new("basic", "1.0", "did:example:issuer", names.into()).unwrap();
        assert_eq!(
            schema.common_attr_names().into_iter().collect::<Vec<_>>(),
            vec!["age", "firstname", "name"]
        );
        let json = schema.to_json().unwrap();
        assert!(json.contains("\"attr_names\":[\"name\",\"age\",\"First Name\"]"));
        assert!(json.contains("\"issuer_id\""));
        assert_eq!(Schema::from_json(&json).unwrap(), schema);

        let names: &[&str] = &["name", "Na me"];
        assert_eq!(
            Schema::new("basic", "1.0", "did:example:issuer", names.into())
                .unwrap_err()
                .kind(),
            ErrorKind::InvalidInput
        );
        let names: &[&str] = &[];
        assert!(Schema::new("basic", "1.0", "did:example:issuer", names.into()).is_err());

        // Deserialized objects are checked separately
        let bad = Schema::from_json(
            r#"{"name":"s","version":"1","attr_names":["a","A"],"issuer_id":"i"}"#,
        )
        .unwrap();
        assert!(bad.validate().is_err());
    }
}
