//! Request parsing
//!
//! A text message is parsed once into a [`Request`] and then matched; the
//! handlers never probe raw JSON themselves.

use serde_json::{Map, Value};

use crate::registry::EntryDraft;

/// A request received on an open connection
#[derive(Debug, Clone)]
pub enum Request {
    /// `{"request": "list"}`
    List,
    /// `{"request": "register", "entry": {...}}`
    Register(EntryDraft),
    /// `{"request": "unregister", "id": "..."}`
    Unregister { id: Option<Value> },
    /// `{"request": "update-address", "id": "...", "address": "..."}`
    UpdateAddress {
        id: Option<Value>,
        address: Option<Value>,
    },
    /// Anything else, including text that is not a JSON object
    Unrecognized(Option<String>),
}

impl Request {
    /// Parse a text message
    ///
    /// With `lenient_quotes`, a message that is not valid JSON but contains
    /// no double quotes is retried with single quotes turned into double
    /// quotes, so `{'request':'list'}` is understood.
    pub fn parse(text: &str, lenient_quotes: bool) -> Self {
        let value = match serde_json::from_str::<Value>(text) {
            Ok(value) => value,
            Err(_) if lenient_quotes && text.contains('\'') && !text.contains('"') => {
                match serde_json::from_str::<Value>(&text.replace('\'', "\"")) {
                    Ok(value) => value,
                    Err(_) => return Request::Unrecognized(None),
                }
            }
            Err(_) => return Request::Unrecognized(None),
        };

        match value {
            Value::Object(obj) => Self::from_object(obj),
            _ => Request::Unrecognized(None),
        }
    }

    fn from_object(mut obj: Map<String, Value>) -> Self {
        let name = match obj.get("request").and_then(Value::as_str) {
            Some(name) => name.to_string(),
            None => return Request::Unrecognized(None),
        };

        match name.as_str() {
            "list" => Request::List,
            "register" => Request::Register(EntryDraft::from_value(obj.get("entry"))),
            "unregister" => Request::Unregister {
                id: obj.remove("id"),
            },
            "update-address" => {
                let address = obj.remove("address").or_else(|| obj.remove("addr"));
                Request::UpdateAddress {
                    id: obj.remove("id"),
                    address,
                }
            }
            _ => Request::Unrecognized(Some(name)),
        }
    }

    /// Short name for logging
    pub fn kind(&self) -> &str {
        match self {
            Request::List => "list",
            Request::Register(_) => "register",
            Request::Unregister { .. } => "unregister",
            Request::UpdateAddress { .. } => "update-address",
            Request::Unrecognized(Some(name)) => name.as_str(),
            Request::Unrecognized(None) => "?",
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_parse_list() {
        assert!(matches!(Request::parse(r#"{"request": "list"}"#, false), Request::List));
    }

    #[test]
    fn test_parse_register() {
        let req = Request::parse(
            r#"{"request": "register", "entry": {"id": "x", "topic": "camera"}}"#,
            false,
        );
        match req {
            Request::Register(draft) => {
                assert_eq!(draft.id, Some(json!("x")));
                assert_eq!(draft.topic, Some(json!("camera")));
                assert!(draft.entry_type.is_none());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_register_without_entry() {
        match Request::parse(r#"{"request": "register"}"#, false) {
            Request::Register(draft) => assert!(draft.id.is_none()),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_unregister_and_update() {
        match Request::parse(r#"{"request": "unregister", "id": "abc"}"#, false) {
            Request::Unregister { id } => assert_eq!(id, Some(json!("abc"))),
            other => panic!("unexpected {:?}", other),
        }

        match Request::parse(
            r#"{"request": "update-address", "id": "abc", "addr": "127.0.0.1:1"}"#,
            false,
        ) {
            Request::UpdateAddress { id, address } => {
                assert_eq!(id, Some(json!("abc")));
                assert_eq!(address, Some(json!("127.0.0.1:1")));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unknown_request() {
        let req = Request::parse(r#"{"request": "xxxx"}"#, false);
        assert!(matches!(req, Request::Unrecognized(Some(ref n)) if n == "xxxx"));
        assert_eq!(req.kind(), "xxxx");
    }

    #[test]
    fn test_malformed_input() {
        for text in ["", "not json", "[1, 2]", "\"list\"", r#"{"request": 5}"#, r#"{"id": 1}"#] {
            assert!(
                matches!(Request::parse(text, true), Request::Unrecognized(_)),
                "{:?}",
                text
            );
        }
    }

    #[test]
    fn test_lenient_quotes() {
        assert!(matches!(Request::parse("{'request':'list'}", true), Request::List));
        assert!(matches!(
            Request::parse("{'request':'list'}", false),
            Request::Unrecognized(None)
        ));
        // Mixed quoting is not rewritten
        assert!(matches!(
            Request::parse(r#"{'request':"list"}"#, true),
            Request::Unrecognized(None)
        ));
    }
}
