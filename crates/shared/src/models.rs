//! Records defined by the remote service and consumed as-is.

use serde::{Deserialize, Serialize};

/// The name fields a user, member or author record may carry.
///
/// Depending on the endpoint, either the split form or `fullName` (or both,
/// or neither) is present.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PersonName {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

impl PersonName {
    pub fn split(first: impl Into<String>, last: impl Into<String>) -> Self {
        Self {
            first_name: Some(first.into()),
            last_name: Some(last.into()),
            full_name: None,
        }
    }

    pub fn full(full: impl Into<String>) -> Self {
        Self {
            full_name: Some(full.into()),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_camel_case_fields() {
        let name: PersonName =
            serde_json::from_str(r#"{"firstName":"Ada","lastName":"Lovelace"}"#).unwrap();
        assert_eq!(name, PersonName::split("Ada", "Lovelace"));

        let name: PersonName = serde_json::from_str(r#"{"fullName":"Ada L."}"#).unwrap();
        assert_eq!(name.full_name.as_deref(), Some("Ada L."));
        assert!(name.first_name.is_none());
    }
}
