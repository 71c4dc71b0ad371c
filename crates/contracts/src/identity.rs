//! Identity - cheap-to-clone registry key
//!
//! `kind` plus the parameters that distinguish two entries of that kind,
//! rendered as `kind:key` (or `kind` alone for singleton kinds).

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Registry identity of a channel, forwarder or computer.
///
/// Uses `Arc<str>` internally so cloning only bumps a reference count.
///
/// # Examples
/// ```
/// use contracts::Identity;
///
/// let id: Identity = "tcp:localhost:7001".parse().unwrap();
/// assert_eq!(id.kind(), "tcp");
/// assert_eq!(id.key(), Some("localhost:7001"));
/// assert_eq!(id.to_string(), "tcp:localhost:7001");
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity {
    kind: Arc<str>,
    key: Option<Arc<str>>,
}

impl Identity {
    /// Identity distinguished by a parameter key
    pub fn new(kind: &str, key: impl AsRef<str>) -> Self {
        Self {
            kind: Arc::from(kind),
            key: Some(Arc::from(key.as_ref())),
        }
    }

    /// Identity of a kind that may only exist once
    pub fn singleton(kind: &str) -> Self {
        Self {
            kind: Arc::from(kind),
            key: None,
        }
    }

    #[inline]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    #[inline]
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.key {
            Some(key) => write!(f, "{}:{}", self.kind, key),
            None => f.write_str(&self.kind),
        }
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({self})")
    }
}

impl FromStr for Identity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("empty identity".to_string());
        }
        Ok(match s.split_once(':') {
            Some((kind, key)) if !kind.is_empty() && !key.is_empty() => Identity::new(kind, key),
            Some(_) => return Err(format!("malformed identity '{s}'")),
            None => Identity::singleton(s),
        })
    }
}

impl Serialize for Identity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Identity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
