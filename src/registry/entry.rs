//! Registry entry types
//!
//! An entry describes one listening endpoint: who it is (`id`, `name`), what
//! it carries (`topic`), what kind of endpoint it is (`type`) and where to
//! reach it (`address`).

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

/// Kind of endpoint an entry describes
///
/// Only endpoints that listen on an address can be registered. Link-side
/// kinds (`datalink`, `messagelink`, `streamerlink`) connect to one of these
/// and are not registrable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    Datahub,
    Messagehub,
    Service,
    Streamer,
}

impl EntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Datahub => "datahub",
            EntryType::Messagehub => "messagehub",
            EntryType::Service => "service",
            EntryType::Streamer => "streamer",
        }
    }
}

impl FromStr for EntryType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "datahub" => Ok(EntryType::Datahub),
            "messagehub" => Ok(EntryType::Messagehub),
            "service" => Ok(EntryType::Service),
            "streamer" => Ok(EntryType::Streamer),
            _ => Err(()),
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Network address of an endpoint: `[scheme://]host:port`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address {
    /// Optional scheme, e.g. `ws`
    pub scheme: Option<String>,
    /// IPv4 literal, DNS name, or IPv6 literal (without brackets)
    pub host: String,
    pub port: u16,
}

impl Address {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            scheme: None,
            host: host.into(),
            port,
        }
    }

    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = Some(scheme.into());
        self
    }
}

/// Address string did not match `[scheme://]host:port`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressParseError;

impl fmt::Display for AddressParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("invalid address")
    }
}

impl std::error::Error for AddressParseError {}

impl FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (scheme, rest) = match s.split_once("://") {
            Some((scheme, rest)) => {
                if !is_valid_scheme(scheme) {
                    return Err(AddressParseError);
                }
                (Some(scheme.to_ascii_lowercase()), rest)
            }
            None => (None, s),
        };

        let (host, port) = if let Some(bracketed) = rest.strip_prefix('[') {
            let (v6, after) = bracketed.split_once(']').ok_or(AddressParseError)?;
            v6.parse::<Ipv6Addr>().map_err(|_| AddressParseError)?;
            let port = after.strip_prefix(':').ok_or(AddressParseError)?;
            (v6, port)
        } else {
            let (host, port) = rest.rsplit_once(':').ok_or(AddressParseError)?;
            if !is_valid_host(host) {
                return Err(AddressParseError);
            }
            (host, port)
        };

        if port.is_empty() || !port.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AddressParseError);
        }
        let port: u16 = port.parse().map_err(|_| AddressParseError)?;
        if port == 0 {
            return Err(AddressParseError);
        }

        Ok(Self {
            scheme,
            host: host.to_string(),
            port,
        })
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref scheme) = self.scheme {
            write!(f, "{}://", scheme)?;
        }
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

fn is_valid_scheme(scheme: &str) -> bool {
    let mut chars = scheme.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

fn is_valid_host(host: &str) -> bool {
    if host.is_empty() || host.len() > 253 {
        return false;
    }
    if host.parse::<Ipv4Addr>().is_ok() {
        return true;
    }
    // All-numeric dotted strings that are not valid IPv4 (e.g. 300.1.1.1)
    if host.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
        return false;
    }
    host.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
    })
}

/// A validated registry entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub id: Uuid,
    pub name: String,
    pub topic: String,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    pub address: Address,
}

impl RegistryEntry {
    pub fn new(
        id: Uuid,
        name: impl Into<String>,
        topic: impl Into<String>,
        entry_type: EntryType,
        address: Address,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            topic: topic.into(),
            entry_type,
            address,
        }
    }
}
