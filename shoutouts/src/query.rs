//! List filter built from query string parameters

use mongodb::bson::{doc, Document};
use serde::{Deserialize, Serialize};

use crate::model::Shoutout;

/// Query string of `GET /shoutouts`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListParams {
    /// Only shoutouts addressed to this recipient
    #[serde(rename = "to-name", default, skip_serializing_if = "Option::is_none")]
    pub to_name: Option<String>,

    /// Shoutouts sent or received by this person
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub me: Option<String>,
}

/// Predicate selecting shoutouts for a list request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ShoutoutFilter {
    /// Every record
    #[default]
    All,
    /// Records whose `to` equals the name
    Recipient(String),
    /// Records whose `to` or `from` equals the name
    Participant(String),
}

impl ShoutoutFilter {
    /// Build the predicate from the two optional parameters.
    ///
    /// The recipient wins when both are given. Empty values count as absent.
    pub fn from_params(to_name: Option<&str>, me: Option<&str>) -> Self {
        match (non_empty(to_name), non_empty(me)) {
            (Some(to), _) => Self::Recipient(to.to_string()),
            (None, Some(me)) => Self::Participant(me.to_string()),
            (None, None) => Self::All,
        }
    }

    /// Render as a MongoDB filter document
    pub fn to_document(&self) -> Document {
        match self {
            Self::All => Document::new(),
            Self::Recipient(to) => doc! { "to": to.as_str() },
            Self::Participant(name) => doc! {
                "$or": [
                    { "to": name.as_str() },
                    { "from": name.as_str() },
                ]
            },
        }
    }

    /// Evaluate the predicate against a record
    pub fn matches(&self, shoutout: &Shoutout) -> bool {
        match self {
            Self::All => true,
            Self::Recipient(to) => shoutout.to.as_deref() == Some(to.as_str()),
            Self::Participant(name) => {
                shoutout.to.as_deref() == Some(name.as_str())
                    || shoutout.from.as_deref() == Some(name.as_str())
            }
        }
    }
}

impl From<&ListParams> for ShoutoutFilter {
    fn from(params: &ListParams) -> Self {
        Self::from_params(params.to_name.as_deref(), params.me.as_deref())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_params_matches_everything() {
        let filter = ShoutoutFilter::from_params(None, None);
        assert_eq!(filter, ShoutoutFilter::All);
        assert_eq!(filter.to_document(), Document::new());
        assert!(filter.matches(&Shoutout::default()));
    }

    #[test]
    fn test_recipient_takes_precedence_over_participant() {
        let filter = ShoutoutFilter::from_params(Some("Alice"), Some("Bob"));
        assert_eq!(filter, ShoutoutFilter::Recipient("Alice".to_string()));
        assert_eq!(filter.to_document(), doc! { "to": "Alice" });

        assert!(filter.matches(&Shoutout::new("Alice", "Carol")));
        assert!(!filter.matches(&Shoutout::new("Carol", "Bob")));
    }

    #[test]
    fn test_participant_matches_either_side() {
        let filter = ShoutoutFilter::from_params(None, Some("Bob"));
        assert_eq!(
            filter.to_document(),
            doc! { "$or": [ { "to": "Bob" }, { "from": "Bob" } ] }
        );

        assert!(filter.matches(&Shoutout::new("Bob", "Alice")));
        assert!(filter.matches(&Shoutout::new("Alice", "Bob")));
        assert!(!filter.matches(&Shoutout::new("Alice", "Carol")));
    }

    #[test]
    fn test_matching_is_exact() {
        let filter = ShoutoutFilter::Recipient("alice".to_string());
        assert!(!filter.matches(&Shoutout::new("Alice", "Bob")));
        assert!(!filter.matches(&Shoutout::new("alice smith", "Bob")));
    }

    #[test]
    fn test_empty_values_count_as_absent() {
        assert_eq!(
            ShoutoutFilter::from_params(Some(""), Some("Bob")),
            ShoutoutFilter::Participant("Bob".to_string())
        );
        assert_eq!(
            ShoutoutFilter::from_params(Some(""), Some("")),
            ShoutoutFilter::All
        );
    }

    #[test]
    fn test_list_params_use_hyphenated_name() {
        let params: ListParams = serde_json::from_str(r#"{"to-name":"Alice"}"#).unwrap();
        assert_eq!(params.to_name.as_deref(), Some("Alice"));
        assert_eq!(
            ShoutoutFilter::from(&params),
            ShoutoutFilter::Recipient("Alice".to_string())
        );
    }
}
