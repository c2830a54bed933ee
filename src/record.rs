//! Generic record model for the conversion engine.
//!
//! A [`Record`] is built incrementally by a spec parser: fields are registered
//! with their configuration payloads as the parser learns about them, then raw
//! data chunks are appended under source element keys. Closing the record runs
//! its finalizer (if any) and makes the result eligible for conversion.

use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::error::ConvertError;
use crate::registry::FormatRegistry;

/// One named attribute of a record.
///
/// Holds the opaque configuration payload supplied when the field was first
/// registered, plus the per-element value store. Values are append-only and
/// keep their arrival order; absent element keys initialize to an empty
/// sequence on first append.
#[derive(Debug, Clone)]
pub struct Field {
    config: JsonValue,
    values: IndexMap<String, Vec<String>>,
}

impl Field {
    fn new(config: JsonValue) -> Self {
        Self {
            config,
            values: IndexMap::new(),
        }
    }

    /// The configuration payload fixed at first registration.
    pub fn config(&self) -> &JsonValue {
        &self.config
    }

    /// Values appended under the given element key, in arrival order.
    ///
    /// Returns an empty slice for element keys that never received data.
    pub fn values(&self, element: &str) -> &[String] {
        self.values.get(element).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Iterate over all element keys that received data, in first-append order.
    pub fn elements(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Whether any element of this field received data.
    pub fn has_values(&self) -> bool {
        self.values.values().any(|v| !v.is_empty())
    }

    fn push(&mut self, element: &str, data: &str) {
        self.values
            .entry(element.to_string())
            .or_default()
            .push(data.to_string());
    }
}

/// Transform invoked exactly once when a record is closed.
///
/// The finalizer may pass the record through unchanged, suppress it (empty
/// result), or split it into several derived records.
pub type Finalizer = Box<dyn FnOnce(Record) -> Vec<Record>>;

/// One logical unit being converted.
///
/// Fields keep their first-registration order. The `id` is a diagnostic
/// identifier assigned by the parser; it is not otherwise load-bearing.
pub struct Record {
    id: String,
    fields: IndexMap<String, Field>,
    finalizer: Option<Finalizer>,
}

impl Record {
    /// Create an empty record with a diagnostic identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: IndexMap::new(),
            finalizer: None,
        }
    }

    /// Create an empty record with a finalizer to run at close time.
    pub fn with_finalizer(id: impl Into<String>, finalizer: Finalizer) -> Self {
        Self {
            id: id.into(),
            fields: IndexMap::new(),
            finalizer: Some(finalizer),
        }
    }

    /// Diagnostic identifier for this record.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Register a single field with its configuration payload.
    ///
    /// A field's config is fixed the first time the field is registered;
    /// later registrations under the same name are no-ops and the original
    /// config is retained.
    pub fn register_field(&mut self, name: &str, config: &JsonValue) {
        self.fields
            .entry(name.to_string())
            .or_insert_with(|| Field::new(config.clone()));
    }

    /// Register every field in `configs` that is not already present.
    ///
    /// Fields are registered in iteration order, so the map's order becomes
    /// the record's field order for names seen here first.
    pub fn register_fields(&mut self, configs: &IndexMap<String, JsonValue>) {
        for (name, config) in configs {
            self.register_field(name, config);
        }
    }

    /// Append a raw data chunk under `element` to every registered field.
    ///
    /// Incoming data is broadcast to all fields known at this point rather
    /// than routed to one; output converters narrow each field down to the
    /// elements its configuration lists. Appending before any field is
    /// registered writes nothing.
    pub fn append(&mut self, element: &str, data: &str) {
        let value = data.trim();
        for (name, field) in self.fields.iter_mut() {
            if !value.is_empty() {
                debug!(record = %self.id, field = %name, element, value, "append");
            }
            field.push(element, data);
        }
    }

    /// Look up a registered field by name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    /// All registered fields, in first-registration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of registered fields.
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Whether any registered field received data.
    pub fn has_values(&self) -> bool {
        self.fields.values().any(Field::has_values)
    }

    /// Close the record, running the finalizer exactly once if present.
    ///
    /// Consumes the record, so a record cannot be closed twice. Without a
    /// finalizer the record passes through unchanged.
    pub fn close(mut self) -> Vec<Record> {
        match self.finalizer.take() {
            Some(finalize) => finalize(self),
            None => vec![self],
        }
    }

    /// Convert this closed record through the output plugin registered for
    /// `format`.
    ///
    /// Fails with [`ConvertError::UnknownFormat`] if no output plugin is
    /// registered under the tag.
    pub fn convert(
        &self,
        registry: &FormatRegistry,
        format: &str,
    ) -> Result<Vec<String>, ConvertError> {
        registry.output(format)?.convert(self)
    }
}
