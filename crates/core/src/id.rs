//! Identities of managed objects.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EntityError;

/// Identity of an object, unique within its entity type.
///
/// Identities are opaque to the tracking layer: they are only compared, hashed and
/// displayed. Equality of identities defines object equality for identity-map purposes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Identity {
    Int(i64),
    Uuid(Uuid),
    Text(String),
}

impl Identity {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Identity::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Identity::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl core::fmt::Display for Identity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Identity::Int(v) => core::fmt::Display::fmt(v, f),
            Identity::Uuid(v) => core::fmt::Display::fmt(v, f),
            Identity::Text(v) => f.write_str(v),
        }
    }
}

macro_rules! impl_int_identity {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Identity {
                fn from(value: $t) -> Self {
                    Identity::Int(i64::from(value))
                }
            }
        )*
    };
}

impl_int_identity!(i8, i16, i32, i64, u8, u16, u32);

impl From<Uuid> for Identity {
    fn from(value: Uuid) -> Self {
        Identity::Uuid(value)
    }
}

impl From<String> for Identity {
    fn from(value: String) -> Self {
        Identity::Text(value)
    }
}

impl From<&str> for Identity {
    fn from(value: &str) -> Self {
        Identity::Text(value.to_string())
    }
}

impl TryFrom<serde_json::Value> for Identity {
    type Error = EntityError;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        serde_json::from_value(value).map_err(|e| EntityError::invalid_identity(e.to_string()))
    }
}

/// Parses integers first, then UUIDs, falling back to text.
impl FromStr for Identity {
    type Err = EntityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(EntityError::invalid_identity("identity cannot be empty"));
        }
        if let Ok(v) = s.parse::<i64>() {
            return Ok(Identity::Int(v));
        }
        if let Ok(v) = Uuid::from_str(s) {
            return Ok(Identity::Uuid(v));
        }
        Ok(Identity::Text(s.to_string()))
    }
}

/// `(entity type, identity)` pair addressing one object across all types.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ObjectKey {
    entity_type: &'static str,
    identity: Identity,
}

impl ObjectKey {
    pub fn new(entity_type: &'static str, identity: impl Into<Identity>) -> Self {
        Self {
            entity_type,
            identity: identity.into(),
        }
    }

    pub fn entity_type(&self) -> &'static str {
        self.entity_type
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }
}

impl core::fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}#{}", self.entity_type, self.identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_integers_uuids_and_text() {
        assert_eq!("123".parse::<Identity>().unwrap(), Identity::Int(123));
        let uuid = Uuid::now_v7();
        assert_eq!(uuid.to_string().parse::<Identity>().unwrap(), Identity::Uuid(uuid));
        assert_eq!(
            "sku-1".parse::<Identity>().unwrap(),
            Identity::Text("sku-1".to_string())
        );
        assert!("".parse::<Identity>().is_err());
    }

    #[test]
    fn serializes_untagged() {
        assert_eq!(serde_json::to_value(Identity::from(7)).unwrap(), serde_json::json!(7));
        assert_eq!(
            Identity::try_from(serde_json::json!("abc")).unwrap(),
            Identity::from("abc")
        );
    }

    #[test]
    fn keys_of_different_types_are_distinct() {
        let a = ObjectKey::new("user", 1);
        let b = ObjectKey::new("group", 1);
        assert_ne!(a, b);
        assert_eq!(a.to_string(), "user#1");
    }
}
