//! MIDOS database output.
//!
//! Emits one MIDOS record block per input record: a `TAG: value` line per
//! non-empty field, values joined with the field's configured separator, and
//! the `&&&` record terminator. Blocks stream out as records complete.

use crate::error::ConvertError;
use crate::record::Record;
use crate::registry::OutputFormat;
use crate::runtime::FieldSpec;

const RECORD_TERMINATOR: &str = "&&&";

/// Output plugin producing MIDOS record blocks.
pub struct MidosOut;

impl MidosOut {
    pub const TAG: &'static str = "midos";
}

impl OutputFormat for MidosOut {
    fn tag(&self) -> &'static str {
        Self::TAG
    }

    fn convert(&self, record: &Record) -> Result<Vec<String>, ConvertError> {
        let mut lines = Vec::new();
        for (name, field) in record.fields() {
            let spec = FieldSpec::from_config(field.config())?;
            let values = spec.collect(field);
            if values.is_empty() {
                continue;
            }
            lines.push(format!(
                "{}: {}",
                name.to_uppercase(),
                values.join(spec.separator())
            ));
        }
        lines.push(RECORD_TERMINATOR.to_string());
        Ok(lines)
    }
}
