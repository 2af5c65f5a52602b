//! Value object abstraction and the frozen open map.

use std::fmt::Debug;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::guard::GuardError;

/// An immutable object compared by the structure of its props.
///
/// Implementors keep their props in private fields and expose read-only
/// accessors only, so a value object can never change after construction.
pub trait ValueObject {
    /// The record describing this value.
    type Props: PartialEq + Debug;

    /// Returns the props of this value object.
    fn props(&self) -> &Self::Props;

    /// Compares props deeply. An absent `other` is never equal.
    fn equals(&self, other: Option<&Self>) -> bool {
        other.is_some_and(|other| self.props() == other.props())
    }
}

/// A frozen, string-keyed map of JSON values.
///
/// Used for open-ended props (task payloads, results, metadata, extra
/// provider settings). The map is shared and read-only; [`OpenMap::to_map`]
/// hands out an independent copy when a caller needs to build a variant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OpenMap(Arc<Map<String, Value>>);

impl OpenMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Freezes an existing map.
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(Arc::new(map))
    }

    /// Freezes a JSON value, which must be an object.
    pub fn from_value(value: Value, argument_name: &str) -> Result<Self, GuardError> {
        let Value::Object(map) = value else {
            return Err(GuardError::NotAnObject {
                argument: argument_name.to_string(),
            });
        };
        Ok(Self::from_map(map))
    }

    /// Returns the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Looks up a nested value by RFC 6901 JSON pointer (e.g.
    /// `/config/model`). The pointer must start with `/`.
    pub fn pointer(&self, pointer: &str) -> Option<&Value> {
        let path = pointer.strip_prefix('/')?;
        let (head, tail) = match path.find('/') {
            Some(at) => path.split_at(at),
            None => (path, ""),
        };
        let value = self.0.get(&head.replace("~1", "/").replace("~0", "~"))?;
        if tail.is_empty() {
            Some(value)
        } else {
            value.pointer(tail)
        }
    }

    /// Returns true if `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Iterates over entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the map has no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns an independent, mutable copy of the entries.
    pub fn to_map(&self) -> Map<String, Value> {
        self.0.as_ref().clone()
    }

    /// Returns the map as a JSON object value.
    pub fn to_value(&self) -> Value {
        Value::Object(self.to_map())
    }
}

impl From<Map<String, Value>> for OpenMap {
    fn from(map: Map<String, Value>) -> Self {
        Self::from_map(map)
    }
}

impl Serialize for OpenMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.as_ref().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for OpenMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Map::deserialize(deserializer).map(Self::from_map)
    }
}
