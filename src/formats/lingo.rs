//! Lingo dictionary word list output.
//!
//! Emits one line per configured field value. Word lists require global
//! uniqueness and ordering across the corpus, so this format runs under the
//! deferred discipline: the pipeline collects every record first, then sorts
//! and deduplicates the flattened lines.

use crate::error::ConvertError;
use crate::record::Record;
use crate::registry::{OutputFormat, OutputMode};
use crate::runtime::FieldSpec;

/// Output plugin producing lingo dictionary word lists.
pub struct Lingo;

impl Lingo {
    pub const TAG: &'static str = "lingo";
}

impl OutputFormat for Lingo {
    fn tag(&self) -> &'static str {
        Self::TAG
    }

    fn mode(&self) -> OutputMode {
        OutputMode::Deferred
    }

    fn convert(&self, record: &Record) -> Result<Vec<String>, ConvertError> {
        let mut lines = Vec::new();
        for (_, field) in record.fields() {
            let spec = FieldSpec::from_config(field.config())?;
            for value in spec.collect(field) {
                lines.push(value.to_string());
            }
        }
        Ok(lines)
    }
}
