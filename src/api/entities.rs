//! Domain payloads
//!
//! The data layer only interprets `id`; every other field the backend sends is
//! kept verbatim in `fields` so screens can read what they need without this
//! crate tracking the backend schema.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Record identifier; the backend uses both numeric ids and string ids
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Number(i64),
    Text(String),
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Number(n) => write!(f, "{n}"),
            EntityId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for EntityId {
    fn from(id: i64) -> Self {
        EntityId::Number(id)
    }
}

impl From<i32> for EntityId {
    fn from(id: i32) -> Self {
        EntityId::Number(id.into())
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        EntityId::Text(id.to_string())
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        EntityId::Text(id)
    }
}

/// Anything addressable by an [`EntityId`]
pub trait HasId {
    fn id(&self) -> &EntityId;
}

macro_rules! entity {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        pub struct $name {
            pub id: EntityId,
            #[serde(flatten)]
            pub fields: Map<String, Value>,
        }

        impl $name {
            pub fn new(id: impl Into<EntityId>) -> Self {
                Self {
                    id: id.into(),
                    fields: Map::new(),
                }
            }

            /// Builder-style field setter
            pub fn with(mut self, field: &str, value: impl Into<Value>) -> Self {
                self.fields.insert(field.to_string(), value.into());
                self
            }

            pub fn get(&self, field: &str) -> Option<&Value> {
                self.fields.get(field)
            }

            /// A string field, if present and a string
            pub fn get_str(&self, field: &str) -> Option<&str> {
                self.fields.get(field).and_then(Value::as_str)
            }
        }

        impl HasId for $name {
            fn id(&self) -> &EntityId {
                &self.id
            }
        }
    };
}

entity!(
    /// A customer, professional or admin account
    User
);
entity!(
    /// A professional's public profile
    Professional
);
entity!(
    /// A bookable service offering
    Service
);
entity!(
    /// A customer booking of a service
    Booking
);
entity!(Category);
entity!(Location);
entity!(
    /// A CMS content block, addressed by its `key` field
    Content
);
entity!(Announcement);
