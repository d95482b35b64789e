//! Per-node property dictionaries
//!
//! A `PropertyModel` is an ordered key/value mapping stored as a flat
//! `Tree` (one row per key) so the same model/view machinery drives
//! property panels. Schema models have a fixed key set; open models grow on
//! demand.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use uuid::Uuid;

use crate::error::{CodeLinkError, Result};
use crate::tree::Tree;

/// Standard keys every node carries
pub mod keys {
    pub const NAME: &str = "Name";
    pub const X: &str = "X";
    pub const Y: &str = "Y";
    pub const WIDTH: &str = "Width";
    pub const HEIGHT: &str = "Height";
    pub const COLOR: &str = "Color";
    pub const COLLAPSED: &str = "Collapsed";
    /// Type tag written next to the properties on save
    pub const CLASS: &str = "Class";
}

/// A typed property value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Number(f64),
    Text(String),
    Tuple(Vec<PropertyValue>),
    /// Identifier of another entity
    Reference {
        #[serde(rename = "Ref")]
        target: Uuid,
    },
}

impl PropertyValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            PropertyValue::Number(n) => Some(*n),
            PropertyValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<f64> for PropertyValue {
    fn from(n: f64) -> Self {
        PropertyValue::Number(n)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Bool(b)
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::Text(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::Text(s)
    }
}

impl From<Uuid> for PropertyValue {
    fn from(target: Uuid) -> Self {
        PropertyValue::Reference { target }
    }
}

/// One row of a property model
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub key: String,
    pub value: PropertyValue,
}

/// Ordered key/value mapping
#[derive(Debug, Clone)]
pub struct PropertyModel {
    rows: Tree<Property>,
    constrained: bool,
}

impl PropertyModel {
    /// A model whose key set is fixed to `entries`
    pub fn schema<K, V, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<PropertyValue>,
    {
        let mut model = Self::open();
        for (key, value) in entries {
            model.define(key, value);
        }
        model.constrained = true;
        model
    }

    /// A model that accepts any key
    pub fn open() -> Self {
        Self {
            rows: Tree::new(Property {
                key: String::new(),
                value: PropertyValue::Tuple(Vec::new()),
            }),
            constrained: false,
        }
    }

    /// Whether `set` rejects unknown keys
    pub fn is_constrained(&self) -> bool {
        self.constrained
    }

    fn row(&self, key: &str) -> Option<crate::tree::ItemKey> {
        self.rows
            .children(None)
            .iter()
            .copied()
            .find(|&item| self.rows.get(item).is_some_and(|p| p.key == key))
    }

    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.row(key).and_then(|item| self.rows.get(item)).map(|p| &p.value)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.row(key).is_some()
    }

    /// Update `key`, returning whether the stored value changed
    ///
    /// Schema models reject keys they don't define with `InvalidKey`; open
    /// models insert them.
    pub fn set(&mut self, key: &str, value: impl Into<PropertyValue>) -> Result<bool> {
        let value = value.into();
        match self.row(key) {
            Some(item) => {
                let Some(property) = self.rows.get_mut(item) else {
                    return Err(CodeLinkError::InvalidKey(key.to_string()));
                };
                if property.value == value {
                    return Ok(false);
                }
                property.value = value;
                Ok(true)
            }
            None if self.constrained => Err(CodeLinkError::InvalidKey(key.to_string())),
            None => {
                self.append(key.to_string(), value);
                Ok(true)
            }
        }
    }

    /// Insert or overwrite `key` regardless of the schema
    ///
    /// Used for keys that legitimately grow the set, such as socket option flags.
    pub fn define(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) {
        let key = key.into();
        let value = value.into();
        match self.row(&key).and_then(|item| self.rows.get_mut(item)) {
            Some(property) => property.value = value,
            None => self.append(key, value),
        }
    }

    fn append(&mut self, key: String, value: PropertyValue) {
        if let Err(e) = self.rows.append_child(Property { key, value }, None) {
            log::debug!("property row not appended: {}", e);
        }
    }

    /// Keys in declaration order
    pub fn keys(&self) -> Vec<&str> {
        self.iter().map(|(key, _)| key).collect()
    }

    /// Entries in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.rows
            .children(None)
            .iter()
            .filter_map(|&item| self.rows.get(item))
            .map(|p| (p.key.as_str(), &p.value))
    }

    pub fn len(&self) -> usize {
        self.rows.child_count(None)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flat JSON object keyed by property name
    pub fn to_dict(&self) -> Result<Map<String, JsonValue>> {
        self.iter()
            .map(|(key, value)| Ok((key.to_string(), serde_json::to_value(value)?)))
            .collect()
    }

    /// Apply a dictionary produced by [`to_dict`](Self::to_dict)
    ///
    /// Entries go through `set`, so schema models reject unknown keys.
    pub fn load_dict(&mut self, dict: &Map<String, JsonValue>) -> Result<()> {
        for (key, value) in dict {
            let value: PropertyValue = serde_json::from_value(value.clone())?;
            self.set(key, value)?;
        }
        Ok(())
    }

    /// Build an open model from a dictionary
    pub fn from_dict(dict: &Map<String, JsonValue>) -> Result<Self> {
        let mut model = Self::open();
        model.load_dict(dict)?;
        Ok(model)
    }
}

impl Default for PropertyModel {
    fn default() -> Self {
        Self::open()
    }
}

impl PartialEq for PropertyModel {
    fn eq(&self, other: &Self) -> bool {
        self.constrained == other.constrained && self.iter().eq(other.iter())
    }
}
