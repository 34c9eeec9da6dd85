//! Shoutout records as exchanged with clients and persisted
//!
//! The record keeps `to` and `from` as typed fields and carries every other
//! client-supplied field in [`Shoutout::extra`], so bodies round-trip
//! unchanged through create, get and replace.

use std::fmt;
use std::str::FromStr;

use mongodb::bson::oid::{self, ObjectId};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Storage-assigned identifier of a shoutout
///
/// Wraps a MongoDB ObjectId and is rendered on the wire as its
/// 24-character lowercase hex form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShoutoutId(ObjectId);

impl ShoutoutId {
    /// Generate a fresh identifier
    #[must_use]
    pub fn new() -> Self {
        Self(ObjectId::new())
    }

    /// Returns the underlying ObjectId
    #[must_use]
    pub fn object_id(&self) -> ObjectId {
        self.0
    }
}

impl Default for ShoutoutId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ObjectId> for ShoutoutId {
    fn from(oid: ObjectId) -> Self {
        Self(oid)
    }
}

impl fmt::Display for ShoutoutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_hex())
    }
}

impl FromStr for ShoutoutId {
    type Err = oid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ObjectId::parse_str(s).map(Self)
    }
}

impl Serialize for ShoutoutId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_hex())
    }
}

impl<'de> Deserialize<'de> for ShoutoutId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        hex.parse().map_err(de::Error::custom)
    }
}

/// One shoutout document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Shoutout {
    /// Identifier, absent until the record is stored
    #[serde(
        rename = "_id",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_client_id"
    )]
    pub id: Option<ShoutoutId>,

    /// Recipient name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,

    /// Sender name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,

    /// Any other fields, kept as sent
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Shoutout {
    /// Create a record from a recipient and a sender
    pub fn new(to: impl Into<String>, from: impl Into<String>) -> Self {
        Self {
            id: None,
            to: Some(to.into()),
            from: Some(from.into()),
            extra: Map::new(),
        }
    }

    /// Attach an extra free-form field
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Set the identifier
    pub fn with_id(mut self, id: ShoutoutId) -> Self {
        self.id = Some(id);
        self
    }

    /// Drop any identifier, e.g. one a client put into a request body
    pub fn without_id(mut self) -> Self {
        self.id = None;
        self
    }
}

/// Client bodies may carry any `_id`; it is discarded before storage, so
/// anything that is not a valid hex ObjectId reads as absent.
fn deserialize_client_id<'de, D>(deserializer: D) -> Result<Option<ShoutoutId>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(Value::as_str)
        .and_then(|hex| hex.parse().ok()))
}

/// One entry of the top-five aggregation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientCount {
    /// The group key: the recipient name, or null for records without `to`
    #[serde(rename = "_id")]
    pub recipient: Option<String>,

    /// Number of shoutouts received
    pub count: i64,
}

impl RecipientCount {
    pub fn new(recipient: impl Into<String>, count: i64) -> Self {
        Self {
            recipient: Some(recipient.into()),
            count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_id_parses_hex_and_displays_it_back() {
        let hex = "64b7f0c2a1d3e4f5a6b7c8d9";
        let id: ShoutoutId = hex.parse().unwrap();
        assert_eq!(id.to_string(), hex);
    }

    #[test]
    fn test_id_rejects_malformed_input() {
        assert!("not-an-id".parse::<ShoutoutId>().is_err());
        assert!("64b7f0c2a1d3e4f5a6b7c8d".parse::<ShoutoutId>().is_err());
    }

    #[test]
    fn test_id_serializes_as_plain_string() {
        let id: ShoutoutId = "64b7f0c2a1d3e4f5a6b7c8d9".parse().unwrap();
        let shoutout = Shoutout::new("Alice", "Bob").with_id(id);
        let value = serde_json::to_value(&shoutout).unwrap();
        assert_eq!(
            value,
            json!({ "_id": "64b7f0c2a1d3e4f5a6b7c8d9", "to": "Alice", "from": "Bob" })
        );
    }

    #[test]
    fn test_extra_fields_round_trip() {
        let body = json!({
            "to": "Alice",
            "from": "Bob",
            "text": "Great demo!",
            "likes": 3,
        });
        let shoutout: Shoutout = serde_json::from_value(body.clone()).unwrap();
        assert_eq!(shoutout.to.as_deref(), Some("Alice"));
        assert_eq!(shoutout.extra.get("text"), Some(&json!("Great demo!")));
        assert_eq!(serde_json::to_value(&shoutout).unwrap(), body);
    }

    #[test]
    fn test_client_id_that_is_not_an_object_id_is_ignored() {
        let shoutout: Shoutout =
            serde_json::from_value(json!({ "_id": 42, "to": "Alice" })).unwrap();
        assert_eq!(shoutout.id, None);
        assert!(!shoutout.extra.contains_key("_id"));
    }

    #[test]
    fn test_missing_participants_are_allowed() {
        let shoutout: Shoutout = serde_json::from_value(json!({ "text": "hi" })).unwrap();
        assert_eq!(shoutout.to, None);
        assert_eq!(shoutout.from, None);
        assert_eq!(serde_json::to_value(&shoutout).unwrap(), json!({ "text": "hi" }));
    }

    #[test]
    fn test_recipient_count_shape() {
        let value = serde_json::to_value(RecipientCount::new("Alice", 3)).unwrap();
        assert_eq!(value, json!({ "_id": "Alice", "count": 3 }));

        let missing = RecipientCount {
            recipient: None,
            count: 1,
        };
        assert_eq!(
            serde_json::to_value(missing).unwrap(),
            json!({ "_id": null, "count": 1 })
        );
    }
}
