//! Target table loader and typed configuration views.
//!
//! Loads the target table from YAML and exposes typed views of the payloads
//! for the parsers and converters that need structure. The core itself treats
//! target payloads as opaque.

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use serde_yaml::Value as YamlValue;

use crate::error::ConvertError;
use crate::record::Field;

/// Externally-loaded mapping from target identifier to configuration payload.
///
/// Consumed, never mutated. Payloads stay as raw YAML values; use
/// [`TargetSpec::from_payload`] to get a typed view of one spec's section.
#[derive(Debug, Clone)]
pub struct TargetTable {
    targets: IndexMap<String, YamlValue>,
}

impl TargetTable {
    /// Load a target table from a YAML file.
    ///
    /// # Arguments
    /// * `path` - Path to the target table, e.g. `config.yaml`
    ///
    /// # Errors
    /// Returns [`ConvertError::Config`] if the file is unreadable, not valid
    /// YAML, or not a mapping of target ids to payloads.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConvertError> {
        let path = path.as_ref();

        let contents = fs::read_to_string(path).map_err(|e| {
            ConvertError::Config(format!(
                "failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml_str(&contents)
    }

    /// Parse a target table from a YAML string.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConvertError> {
        let value: YamlValue = serde_yaml::from_str(yaml)
            .map_err(|e| ConvertError::Config(format!("failed to parse YAML: {}", e)))?;

        let mapping = value.as_mapping().ok_or_else(|| {
            ConvertError::Config("target table must be a mapping of target ids".to_string())
        })?;

        let mut targets = IndexMap::new();
        for (key, payload) in mapping {
            let target = key.as_str().ok_or_else(|| {
                ConvertError::Config(format!("target id must be a string, got: {:?}", key))
            })?;
            targets.insert(target.to_string(), payload.clone());
        }

        Ok(Self { targets })
    }

    /// Build a table from pre-parsed payloads. Useful for tests.
    pub fn from_targets(targets: IndexMap<String, YamlValue>) -> Self {
        Self { targets }
    }

    /// Get the payload for a target id.
    pub fn get(&self, target: &str) -> Option<&YamlValue> {
        self.targets.get(target)
    }

    /// Whether a target id is present.
    pub fn has_target(&self, target: &str) -> bool {
        self.targets.contains_key(target)
    }

    /// All target ids, in table order.
    pub fn target_ids(&self) -> Vec<&str> {
        self.targets.keys().map(String::as_str).collect()
    }
}

/// Typed view of one spec's parameters within a target payload.
///
/// A target payload holds one section per spec it parameterizes:
///
/// ```yaml
/// generic:
///   sisis:
///     record_leader: "0000"
///     fields:
///       title:
///         elements: ["0331"]
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct TargetSpec {
    /// Source tag that opens a new record, for specs with explicit leaders.
    #[serde(default)]
    pub record_leader: Option<String>,

    /// Field configurations, in table order. Each value is the opaque payload
    /// stored on the record's field at registration time.
    #[serde(default)]
    pub fields: IndexMap<String, JsonValue>,
}

impl TargetSpec {
    /// Extract and deserialize the `spec` section of a target payload.
    ///
    /// # Errors
    /// Returns [`ConvertError::Config`] if the payload has no section for the
    /// spec or the section does not deserialize.
    pub fn from_payload(payload: &YamlValue, spec: &str) -> Result<Self, ConvertError> {
        let section = payload.get(spec).ok_or_else(|| {
            ConvertError::Config(format!("target has no section for spec: {}", spec))
        })?;

        serde_yaml::from_value(section.clone()).map_err(|e| {
            ConvertError::Config(format!("invalid section for spec {}: {}", spec, e))
        })
    }

    /// An empty spec section. Useful for tests and pass-through parsing.
    pub fn empty() -> Self {
        Self {
            record_leader: None,
            fields: IndexMap::new(),
        }
    }
}

/// Typed view of one field's configuration payload.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldSpec {
    /// Source element tags this field draws from, in priority order.
    pub elements: Vec<String>,

    /// Separator used when a converter joins the field's values.
    #[serde(default)]
    pub join: Option<String>,
}

impl FieldSpec {
    /// Deserialize a field's opaque configuration payload.
    pub fn from_config(config: &JsonValue) -> Result<Self, ConvertError> {
        serde_json::from_value(config.clone())
            .map_err(|e| ConvertError::Config(format!("invalid field config: {}", e)))
    }

    /// Collect the field's values for the configured elements, element order
    /// first, arrival order within an element.
    pub fn collect<'a>(&self, field: &'a Field) -> Vec<&'a str> {
        let mut values = Vec::new();
        for element in &self.elements {
            for value in field.values(element) {
                let value = value.trim();
                if !value.is_empty() {
                    values.push(value);
                }
            }
        }
        values
    }

    /// Separator for joined output, defaulting to a single space.
    pub fn separator(&self) -> &str {
        self.join.as_deref().unwrap_or(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const TABLE: &str = r#"
generic:
  midos:
    fields:
      title:
        elements: ["TI"]
      person:
        elements: ["AU", "ED"]
        join: "; "
generic.midos:
  midos:
    fields:
      term:
        elements: ["TI", "AU"]
"#;

    #[test]
    fn test_from_yaml_str() {
        let table = TargetTable::from_yaml_str(TABLE).unwrap();

        assert!(table.has_target("generic"));
        assert!(table.has_target("generic.midos"));
        assert!(!table.has_target("generic.midos:xml"));
        assert_eq!(table.target_ids(), ["generic", "generic.midos"]);
    }

    #[test]
    fn test_rejects_non_mapping_table() {
        let err = TargetTable::from_yaml_str("- just\n- a\n- list\n");
        assert!(matches!(err, Err(ConvertError::Config(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(TABLE.as_bytes()).unwrap();

        let table = TargetTable::load_from_file(file.path()).unwrap();
        assert!(table.has_target("generic"));
    }

    #[test]
    fn test_load_from_missing_file() {
        let err = TargetTable::load_from_file("no/such/config.yaml");
        assert!(matches!(err, Err(ConvertError::Config(_))));
    }

    #[test]
    fn test_target_spec_view_preserves_field_order() {
        let table = TargetTable::from_yaml_str(TABLE).unwrap();
        let spec = TargetSpec::from_payload(table.get("generic").unwrap(), "midos").unwrap();

        let names: Vec<&String> = spec.fields.keys().collect();
        assert_eq!(names, ["title", "person"]);
        assert!(spec.record_leader.is_none());
    }

    #[test]
    fn test_target_spec_missing_section() {
        let table = TargetTable::from_yaml_str(TABLE).unwrap();
        let err = TargetSpec::from_payload(table.get("generic").unwrap(), "sisis");
        assert!(matches!(err, Err(ConvertError::Config(_))));
    }

    #[test]
    fn test_field_spec_view() {
        let table = TargetTable::from_yaml_str(TABLE).unwrap();
        let spec = TargetSpec::from_payload(table.get("generic").unwrap(), "midos").unwrap();

        let person = FieldSpec::from_config(&spec.fields["person"]).unwrap();
        assert_eq!(person.elements, ["AU", "ED"]);
        assert_eq!(person.separator(), "; ");

        let title = FieldSpec::from_config(&spec.fields["title"]).unwrap();
        assert_eq!(title.separator(), " ");
    }

    #[test]
    fn test_field_spec_collect_filters_by_element() {
        let mut record = crate::record::Record::new("r1");
        record.register_field("person", &serde_json::json!({ "elements": ["AU", "ED"] }));
        record.append("TI", "A title");
        record.append("AU", "Smith, J.");
        record.append("ED", "  Jones, K.  ");
        record.append("AU", "");

        let field = record.field("person").unwrap();
        let spec = FieldSpec::from_config(field.config()).unwrap();

        // Broadcast put TI data into the field too; collect narrows to the
        // configured elements and drops blank values.
        assert_eq!(spec.collect(field), ["Smith, J.", "Jones, K."]);
    }
}
