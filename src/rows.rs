//! # Row data model.
//!
//! A [`Row`] is an ordered mapping from field name to JSON value. Rows within
//! one batch share no required schema beyond what the destination's consumers
//! expect; field order is preserved on iteration and serialization, so a log
//! written as `pid, name, cmdline` reads back in that order.

use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

/// Ordered field → value mapping carried through the journal.
///
/// `set` on an existing field updates the value in place and keeps the
/// field's original position. Cloning is cheap relative to batch sizes
/// (field names are shared `Arc<str>`s).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Row {
    fields: Vec<(Arc<str>, Value)>,
}

impl Row {
    /// Creates an empty row.
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Builder-style field setter.
    ///
    /// # Example
    /// ```
    /// use rowjournal::Row;
    ///
    /// let row = Row::new().with("pid", 42).with("name", "init");
    /// assert_eq!(row.len(), 2);
    /// ```
    pub fn with(mut self, field: impl Into<Arc<str>>, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    /// Sets a field, replacing the value in place if the field exists.
    pub fn set(&mut self, field: impl Into<Arc<str>>, value: impl Into<Value>) {
        let field = field.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(name, _)| *name == field) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((field, value)),
        }
    }

    /// Returns the value for `field`, if present.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(name, _)| name.as_ref() == field)
            .map(|(_, value)| value)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when the row carries no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_ref(), value))
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name.as_ref(), value)?;
        }
        map.end()
    }
}
