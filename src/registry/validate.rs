//! Field validation for incoming entries
//!
//! Fields are checked in a fixed order and the first failure wins:
//!
//! ```text
//! id -> topic -> type -> address -> name
//! ```
//!
//! A registration with a bad topic therefore reports `Invalid topic` no
//! matter what the type and address look like.

use serde_json::{Map, Value};
use uuid::Uuid;

use super::config::RegistryConfig;
use super::entry::{Address, EntryType, RegistryEntry};
use super::error::ValidationError;

const MIN_TOPIC_LEN: usize = 2;
const MAX_TOPIC_LEN: usize = 256;
const MAX_NAME_LEN: usize = 256;
const UUID_HYPHENATED_LEN: usize = 36;

/// Unvalidated entry as received from a client
///
/// Every field is optional and loosely typed so that a missing field and a
/// field of the wrong JSON type produce the same validation error.
#[derive(Debug, Clone, Default)]
pub struct EntryDraft {
    pub id: Option<Value>,
    pub name: Option<Value>,
    pub topic: Option<Value>,
    pub entry_type: Option<Value>,
    pub address: Option<Value>,
}

impl EntryDraft {
    /// Build a draft from the `entry` member of a request
    ///
    /// Anything that is not an object yields an empty draft. `address` wins
    /// over `addr` when both are present.
    pub fn from_value(value: Option<&Value>) -> Self {
        match value {
            Some(Value::Object(obj)) => Self::from_object(obj),
            _ => Self::default(),
        }
    }

    fn from_object(obj: &Map<String, Value>) -> Self {
        Self {
            id: obj.get("id").cloned(),
            name: obj.get("name").cloned(),
            topic: obj.get("topic").cloned(),
            entry_type: obj.get("type").cloned(),
            address: obj.get("address").or_else(|| obj.get("addr")).cloned(),
        }
    }

    /// Run the ordered checks and produce a typed entry
    pub fn validate(&self, config: &RegistryConfig) -> Result<RegistryEntry, ValidationError> {
        let id = parse_id(self.id.as_ref())?;
        let topic = parse_topic(self.topic.as_ref(), config)?;
        let entry_type = parse_entry_type(self.entry_type.as_ref())?;
        let address = parse_address(self.address.as_ref())?;
        let name = parse_name(self.name.as_ref())?;

        Ok(RegistryEntry {
            id,
            name,
            topic,
            entry_type,
            address,
        })
    }
}

/// UUID in the 36 character hyphenated form, lowercase hex only
pub fn parse_id(value: Option<&Value>) -> Result<Uuid, ValidationError> {
    let s = value
        .and_then(Value::as_str)
        .ok_or(ValidationError::InvalidId)?;
    if s.len() != UUID_HYPHENATED_LEN {
        return Err(ValidationError::InvalidId);
    }
    let well_formed = s.bytes().enumerate().all(|(i, b)| match i {
        8 | 13 | 18 | 23 => b == b'-',
        _ => b.is_ascii_digit() || (b'a'..=b'f').contains(&b),
    });
    if !well_formed {
        return Err(ValidationError::InvalidId);
    }
    Uuid::parse_str(s).map_err(|_| ValidationError::InvalidId)
}

/// Lowercase topic of `[a-z][a-z._-]*` that is not reserved
pub fn parse_topic(
    value: Option<&Value>,
    config: &RegistryConfig,
) -> Result<String, ValidationError> {
    let topic = value
        .and_then(Value::as_str)
        .ok_or(ValidationError::InvalidTopic)?;

    if !(MIN_TOPIC_LEN..=MAX_TOPIC_LEN).contains(&topic.len()) {
        return Err(ValidationError::InvalidTopic);
    }
    let mut bytes = topic.bytes();
    match bytes.next() {
        Some(b) if b.is_ascii_lowercase() => {}
        _ => return Err(ValidationError::InvalidTopic),
    }
    if !bytes.all(|b| b.is_ascii_lowercase() || matches!(b, b'.' | b'_' | b'-')) {
        return Err(ValidationError::InvalidTopic);
    }
    if config.is_reserved_topic(topic) {
        return Err(ValidationError::InvalidTopic);
    }

    Ok(topic.to_string())
}

pub fn parse_entry_type(value: Option<&Value>) -> Result<EntryType, ValidationError> {
    value
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok())
        .ok_or(ValidationError::InvalidType)
}

pub fn parse_address(value: Option<&Value>) -> Result<Address, ValidationError> {
    value
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok())
        .ok_or(ValidationError::InvalidAddress)
}

pub fn parse_name(value: Option<&Value>) -> Result<String, ValidationError> {
    match value.and_then(Value::as_str) {
        Some(name) if !name.is_empty() && name.chars().count() <= MAX_NAME_LEN => {
            Ok(name.to_string())
        }
        _ => Err(ValidationError::InvalidName),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const ID: &str = "1b4e28ba-2fa1-41d2-883f-0016d3cca427";

    fn draft(value: Value) -> EntryDraft {
        EntryDraft::from_value(Some(&value))
    }

    fn check(value: Value) -> Result<RegistryEntry, ValidationError> {
        draft(value).validate(&RegistryConfig::default())
    }

    #[test]
    fn test_valid_entry() {
        let entry = check(json!({
            "id": ID,
            "name": "front camera",
            "topic": "camera.front",
            "type": "streamer",
            "address": "10.0.0.2:10102",
        }))
        .unwrap();

        assert_eq!(entry.id.to_string(), ID);
        assert_eq!(entry.name, "front camera");
        assert_eq!(entry.topic, "camera.front");
        assert_eq!(entry.entry_type, EntryType::Streamer);
        assert_eq!(entry.address, Address::new("10.0.0.2", 10102));
    }

    #[test]
    fn test_empty_entry_reports_id() {
        assert_eq!(check(json!({})), Err(ValidationError::InvalidId));
        assert_eq!(
            EntryDraft::from_value(None).validate(&RegistryConfig::default()),
            Err(ValidationError::InvalidId)
        );
        assert_eq!(check(json!("not an object")), Err(ValidationError::InvalidId));
    }

    #[test]
    fn test_invalid_ids() {
        for id in [
            json!("1234"),
            json!(42),
            json!(null),
            json!("1b4e28ba2fa141d2883f0016d3cca427"),
            json!("{1b4e28ba-2fa1-41d2-883f-0016d3cca427}"),
            json!("1b4e28ba-2fa1-41d2-883f-0016d3cca42g"),
        ] {
            assert_eq!(
                check(json!({"id": id.clone(), "topic": "camera"})),
                Err(ValidationError::InvalidId),
                "id {:?}",
                id
            );
        }
    }

    #[test]
    fn test_uppercase_id_rejected() {
        assert_eq!(
            parse_id(Some(&json!(ID.to_uppercase()))),
            Err(ValidationError::InvalidId)
        );
        assert_eq!(
            parse_id(Some(&json!("1B4E28BA-2fa1-41d2-883f-0016d3cca427"))),
            Err(ValidationError::InvalidId)
        );
        // Hyphens in the wrong place
        assert_eq!(
            parse_id(Some(&json!("1b4e28ba2-fa1-41d2-883f-0016d3cca427"))),
            Err(ValidationError::InvalidId)
        );
        assert!(parse_id(Some(&json!(ID))).is_ok());
    }

    #[test]
    fn test_reserved_topic_short_circuits() {
        // Same answer whether or not type and address are present
        let bare = check(json!({"id": ID, "name": "n", "topic": "registry"}));
        let full = check(json!({
            "id": ID,
            "name": "n",
            "topic": "registry",
            "type": "messagelink",
            "address": "nowhere",
        }));

        assert_eq!(bare, Err(ValidationError::InvalidTopic));
        assert_eq!(full, Err(ValidationError::InvalidTopic));
    }

    #[test]
    fn test_topic_rules() {
        let config = RegistryConfig::default();
        for good in ["ab", "camera", "camera.front", "motor-controller", "camera_front", "a._-"] {
            assert!(parse_topic(Some(&json!(good)), &config).is_ok(), "{}", good);
        }
        for bad in ["a", "Camera", "1camera", ".camera", "_camera", "cam era", "camera/x"] {
            assert_eq!(
                parse_topic(Some(&json!(bad)), &config),
                Err(ValidationError::InvalidTopic),
                "{}",
                bad
            );
        }
        let longest = "a".repeat(256);
        assert!(parse_topic(Some(&json!(longest)), &config).is_ok());
        let long = "a".repeat(257);
        assert!(parse_topic(Some(&json!(long)), &config).is_err());
        assert!(parse_topic(None, &config).is_err());
    }

    #[test]
    fn test_custom_reserved_topic() {
        let config = RegistryConfig::default().reserve_topic("admin");
        assert_eq!(
            parse_topic(Some(&json!("admin")), &config),
            Err(ValidationError::InvalidTopic)
        );
    }

    #[test]
    fn test_type_checked_after_topic() {
        assert_eq!(
            check(json!({"id": ID, "topic": "camera", "type": "messagelink"})),
            Err(ValidationError::InvalidType)
        );
        assert_eq!(
            check(json!({"id": ID, "topic": "camera"})),
            Err(ValidationError::InvalidType)
        );
    }

    #[test]
    fn test_address_checked_after_type() {
        assert_eq!(
            check(json!({"id": ID, "topic": "camera", "type": "service"})),
            Err(ValidationError::InvalidAddress)
        );
        assert_eq!(
            check(json!({
                "id": ID,
                "topic": "camera",
                "type": "service",
                "address": "no-port",
            })),
            Err(ValidationError::InvalidAddress)
        );
    }

    #[test]
    fn test_name_checked_last() {
        assert_eq!(
            check(json!({
                "id": ID,
                "topic": "camera",
                "type": "service",
                "address": "127.0.0.1:80",
            })),
            Err(ValidationError::InvalidName)
        );
        assert_eq!(
            check(json!({
                "id": ID,
                "name": "",
                "topic": "camera",
                "type": "service",
                "address": "127.0.0.1:80",
            })),
            Err(ValidationError::InvalidName)
        );
    }

    #[test]
    fn test_addr_alias() {
        let entry = check(json!({
            "id": ID,
            "name": "hub",
            "topic": "camera",
            "type": "messagehub",
            "addr": "127.0.0.1:10105",
        }))
        .unwrap();
        assert_eq!(entry.address.port, 10105);
    }

    #[test]
    fn test_address_and_addr_both_present() {
        let entry = check(json!({
            "id": ID,
            "name": "hub",
            "topic": "camera",
            "type": "messagehub",
            "address": "127.0.0.1:10105",
            "addr": "127.0.0.1:10106",
        }))
        .unwrap();
        assert_eq!(entry.id.to_string(), ID);
        assert_eq!(entry.address.port, 10105);
    }

    #[test]
    fn test_wrong_field_types_do_not_hide_id() {
        // A mistyped later field is reported in order, not as a bad id
        assert_eq!(
            check(json!({"id": ID, "topic": 5, "type": [], "address": {}})),
            Err(ValidationError::InvalidTopic)
        );
    }
}
