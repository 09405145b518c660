//! Attribute store and reflection
//!
//! The attribute store is the single source of truth for element
//! configuration; typed properties are derived views over it. Setters
//! short-circuit on equality so a no-op write never produces a change
//! notification.

use serde_json::{Map, Value};

/// Well-known attribute names
pub mod names {
    pub const SRC: &str = "src";
    pub const TYPE: &str = "type";
    pub const STREAM_TYPE: &str = "stream-type";
    pub const PLAYBACK_ID: &str = "playback-id";
    pub const PREFER_PLAYBACK: &str = "prefer-playback";
    pub const DEBUG: &str = "debug";
    pub const ENV_KEY: &str = "env-key";
    pub const BEACON_DOMAIN: &str = "beacon-domain";
    pub const METADATA_URL: &str = "metadata-url";
    pub const MAX_RESOLUTION: &str = "max-resolution";

    /// Prefix for wildcard analytics metadata attributes
    pub const METADATA_PREFIX: &str = "metadata-";
}

/// A single applied attribute mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeChange {
    pub name: String,
    pub old: Option<String>,
    pub new: Option<String>,
}

/// Ordered attribute name -> value map
///
/// Boolean attributes follow content-attribute semantics: presence
/// (any value, including "") is true, absence is false.
#[derive(Debug, Clone, Default)]
pub struct AttributeStore {
    entries: Vec<(String, String)>,
}

impl AttributeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read an attribute value
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Write an attribute, returning the change or `None` when the
    /// value is already current
    pub fn set(&mut self, name: &str, value: &str) -> Option<AttributeChange> {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) if v == value => None,
            Some((_, v)) => {
                let old = std::mem::replace(v, value.to_string());
                Some(AttributeChange {
                    name: name.to_string(),
                    old: Some(old),
                    new: Some(value.to_string()),
                })
            }
            None => {
                self.entries.push((name.to_string(), value.to_string()));
                Some(AttributeChange {
                    name: name.to_string(),
                    old: None,
                    new: Some(value.to_string()),
                })
            }
        }
    }

    /// Remove an attribute, returning the change or `None` when it was
    /// already absent
    pub fn remove(&mut self, name: &str) -> Option<AttributeChange> {
        let idx = self.entries.iter().position(|(n, _)| n == name)?;
        let (name, old) = self.entries.remove(idx);
        Some(AttributeChange {
            name,
            old: Some(old),
            new: None,
        })
    }

    /// Boolean attribute view: present (any value) = true
    pub fn get_bool(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Boolean attribute write: true writes "", false removes
    pub fn set_bool(&mut self, name: &str, value: bool) -> Option<AttributeChange> {
        if value {
            if self.get(name).is_some() {
                // presence already reflects true; do not clobber the value
                return None;
            }
            self.set(name, "")
        } else {
            self.remove(name)
        }
    }

    /// Iterate attributes in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Collect all `metadata-*` attributes into snake_cased fields
    ///
    /// `metadata-sub-property-id` becomes `sub_property_id`. The
    /// reserved `metadata-url` attribute is not a metadata field.
    pub fn metadata_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        for (name, value) in self.iter() {
            if name == names::METADATA_URL {
                continue;
            }
            if let Some(field) = metadata_field_name(name) {
                fields.insert(field, Value::String(value.to_string()));
            }
        }
        fields
    }
}

/// Map a `metadata-*` attribute name to its snake_cased field name
pub fn metadata_field_name(attr: &str) -> Option<String> {
    let rest = attr.strip_prefix(names::METADATA_PREFIX)?;
    if rest.is_empty() {
        return None;
    }
    Some(rest.replace('-', "_"))
}
