//! Target configuration cascade.
//!
//! A single target table holds configuration profiles narrowed by spec and/or
//! format alongside a generic fallback per logical target. Resolution probes
//! the table from the most specific candidate to the least specific one.

use serde_yaml::Value as YamlValue;
use tracing::debug;

use crate::error::ConvertError;
use crate::runtime::config_loader::TargetTable;

/// Resolve which target configuration applies to a conversion run.
///
/// With an explicit target, exactly that key is tried and nothing else.
/// Otherwise three candidates are built from `base` (the fallback, or
/// `"generic"`), the spec, and the format:
///
/// 1. `base.spec:format`
/// 2. `base.spec`
/// 3. `base`
///
/// and probed in that order; the first one present in the table wins.
///
/// # Returns
/// The winning target id and a borrowed configuration payload.
///
/// # Errors
/// [`ConvertError::ConfigNotFound`] naming the explicit target, or the base
/// when no cascade candidate matched.
pub fn resolve_target<'a>(
    explicit: Option<&str>,
    fallback: Option<&str>,
    spec: &str,
    format: &str,
    table: &'a TargetTable,
) -> Result<(String, &'a YamlValue), ConvertError> {
    if let Some(target) = explicit {
        return match table.get(target) {
            Some(payload) => Ok((target.to_string(), payload)),
            None => Err(ConvertError::ConfigNotFound(target.to_string())),
        };
    }

    let base = fallback.unwrap_or("generic");
    let candidates = [
        format!("{}.{}:{}", base, spec, format),
        format!("{}.{}", base, spec),
        base.to_string(),
    ];

    for candidate in candidates {
        if let Some(payload) = table.get(&candidate) {
            debug!(target = %candidate, "resolved target");
            return Ok((candidate, payload));
        }
    }

    Err(ConvertError::ConfigNotFound(base.to_string()))
}
