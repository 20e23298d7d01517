use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// JSON member holding the identity key.
pub const KEY_FIELD: &str = "_key";

/// JSON member holding the human-readable name.
pub const NAME_FIELD: &str = "name";

/// The Domain record.
///
/// Only the identity key and the name are typed; every other member is
/// carried through untouched in `attributes`. A zero-valued Domain
/// serializes to `{}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    #[serde(
        rename = "_key",
        default,
        deserialize_with = "empty_key_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub key: Option<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

/// An empty `_key` is treated as absent so the record still gets a key assigned.
fn empty_key_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let key = Option::<String>::deserialize(deserializer)?;
    Ok(key.filter(|k| !k.is_empty()))
}

impl Domain {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_attribute(mut self, field: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(field.into(), value);
        self
    }

    /// The record as JSON without its identity key.
    pub fn content(&self) -> Result<Value, serde_json::Error> {
        let mut value = serde_json::to_value(self)?;
        if let Value::Object(members) = &mut value {
            members.remove(KEY_FIELD);
        }
        Ok(value)
    }

    /// Best-effort decode of a stored JSON payload.
    ///
    /// A strict decode is tried first. When it fails and the payload is still
    /// a JSON object, string-typed `_key`/`name` members are kept and every
    /// other member lands in `attributes`. The strict decode error is handed
    /// back with whatever could be salvaged.
    pub fn from_json_lossy(text: &str) -> (Self, Option<serde_json::Error>) {
        let err = match serde_json::from_str::<Domain>(text) {
            Ok(domain) => return (domain, None),
            Err(err) => err,
        };

        let mut domain = Domain::default();
        if let Ok(Value::Object(members)) = serde_json::from_str::<Value>(text) {
            for (field, value) in members {
                match field.as_str() {
                    KEY_FIELD => {
                        if let Value::String(key) = value {
                            domain.key = Some(key).filter(|k| !k.is_empty());
                        }
                    }
                    NAME_FIELD => {
                        if let Value::String(name) = value {
                            domain.name = name;
                        }
                    }
                    _ => {
                        domain.attributes.insert(field, value);
                    }
                }
            }
        }

        (domain, Some(err))
    }
}
