//! # Identity Normalizer
//!
//! Participants arrive with heterogeneous identifiers (ACS users, phone
//! numbers, Teams users, anything else the backend invents). Everything in
//! the engine keys on one flat string, produced here.

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A participant identifier as the session provider emits it.
///
/// Deserialization goes through [`TryFrom<Value>`] so that a `kind` this
/// engine has never heard of still yields [`Identifier::Unknown`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "camelCase", try_from = "Value")]
pub enum Identifier {
    #[serde(rename_all = "camelCase")]
    CommunicationUser { communication_user_id: String },
    #[serde(rename_all = "camelCase")]
    PhoneNumber {
        phone_number: String,
        #[serde(default)]
        raw_id: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    MicrosoftTeamsUser {
        microsoft_teams_user_id: String,
        #[serde(default)]
        raw_id: Option<String>,
        #[serde(default)]
        is_anonymous: bool,
    },
    /// Any kind the engine does not recognize. Only the generic `id` is kept.
    Unknown { id: String },
}

impl Identifier {
    pub fn communication_user(id: impl Into<String>) -> Self {
        Identifier::CommunicationUser {
            communication_user_id: id.into(),
        }
    }
}

impl TryFrom<Value> for Identifier {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let field = |name: &str| value.get(name).and_then(Value::as_str).map(str::to_string);
        let kind = field("kind").ok_or("identifier has no kind")?;
        let required =
            |name: &str| field(name).ok_or_else(|| format!("{kind} identifier has no {name}"));

        let identifier = match kind.as_str() {
            "communicationUser" => Identifier::CommunicationUser {
                communication_user_id: required("communicationUserId")?,
            },
            "phoneNumber" => Identifier::PhoneNumber {
                phone_number: required("phoneNumber")?,
                raw_id: field("rawId"),
            },
            "microsoftTeamsUser" => Identifier::MicrosoftTeamsUser {
                microsoft_teams_user_id: required("microsoftTeamsUserId")?,
                raw_id: field("rawId"),
                is_anonymous: value
                    .get("isAnonymous")
                    .and_then(Value::as_bool)
                    .unwrap_or(false),
            },
            other => {
                if other != "unknown" {
                    debug!("Unrecognized identifier kind {:?}, keeping its id", other);
                }
                Identifier::Unknown {
                    id: required("id")?,
                }
            }
        };
        Ok(identifier)
    }
}

/// Resolves an identifier to its canonical flat string. Total: never fails.
pub fn flatten(identifier: &Identifier) -> String {
    match identifier {
        Identifier::CommunicationUser {
            communication_user_id,
        } => communication_user_id.clone(),
        Identifier::PhoneNumber { phone_number, .. } => phone_number.clone(),
        Identifier::MicrosoftTeamsUser {
            microsoft_teams_user_id,
            ..
        } => microsoft_teams_user_id.clone(),
        Identifier::Unknown { id } => id.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten_uses_kind_specific_field() {
        assert_eq!(flatten(&Identifier::communication_user("8:acs:1")), "8:acs:1");
        assert_eq!(
            flatten(&Identifier::PhoneNumber {
                phone_number: "+15550100".into(),
                raw_id: Some("4:+15550100".into()),
            }),
            "+15550100"
        );
        assert_eq!(
            flatten(&Identifier::MicrosoftTeamsUser {
                microsoft_teams_user_id: "teams-42".into(),
                raw_id: None,
                is_anonymous: false,
            }),
            "teams-42"
        );
    }

    #[test]
    fn test_flatten_unknown_falls_back_to_id() {
        let id = Identifier::Unknown { id: "28:bot".into() };
        assert_eq!(flatten(&id), "28:bot");
    }

    #[test]
    fn test_identifier_deserializes_from_kind_tag() {
        let json = r#"{"kind":"phoneNumber","phoneNumber":"+15550100"}"#;
        let id: Identifier = serde_json::from_str(json).unwrap();
        assert_eq!(flatten(&id), "+15550100");

        let json = r#"{"kind":"communicationUser","communicationUserId":"8:acs:7"}"#;
        let id: Identifier = serde_json::from_str(json).unwrap();
        assert_eq!(id, Identifier::communication_user("8:acs:7"));
    }

    #[test]
    fn test_unrecognized_kind_deserializes_as_unknown() {
        let json = r#"{"kind":"microsoftBot","id":"28:bot-1","botId":"bot-1"}"#;
        let id: Identifier = serde_json::from_str(json).unwrap();
        assert_eq!(id, Identifier::Unknown { id: "28:bot-1".into() });
        assert_eq!(flatten(&id), "28:bot-1");
    }

    #[test]
    fn test_teams_user_fields_and_missing_required_field() {
        let json = r#"{"kind":"microsoftTeamsUser","microsoftTeamsUserId":"t-1","isAnonymous":true}"#;
        let id: Identifier = serde_json::from_str(json).unwrap();
        assert_eq!(
            id,
            Identifier::MicrosoftTeamsUser {
                microsoft_teams_user_id: "t-1".into(),
                raw_id: None,
                is_anonymous: true,
            }
        );

        let err = serde_json::from_str::<Identifier>(r#"{"kind":"phoneNumber"}"#).unwrap_err();
        assert!(err.to_string().contains("phoneNumber identifier has no phoneNumber"));
        assert!(serde_json::from_str::<Identifier>(r#"{"id":"x"}"#).is_err());
    }

    #[test]
    fn test_serialized_identifier_reads_back() {
        let id = Identifier::PhoneNumber {
            phone_number: "+15550100".into(),
            raw_id: Some("4:+15550100".into()),
        };
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(serde_json::from_str::<Identifier>(&json).unwrap(), id);
    }
}
