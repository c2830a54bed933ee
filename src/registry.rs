//! Format registry and converter plugin contracts.
//!
//! Converter plugins live in two independent namespaces, one for input specs
//! and one for output formats; a tag may appear in both without collision.
//! The registry is populated once at startup (see [`FormatRegistry::builtin`])
//! and is read-only afterwards. Registering the same (capability, tag) pair
//! twice is a configuration error, not a runtime one.

use std::collections::HashMap;
use std::fmt;
use std::io::{BufRead, Write};

use crate::error::ConvertError;
use crate::record::Record;
use crate::runtime::TargetSpec;

/// Which converter namespace a tag belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Input,
    Output,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Input => write!(f, "input"),
            Capability::Output => write!(f, "output"),
        }
    }
}

/// Emission discipline an output format requires.
///
/// Streaming is the default: records are converted and written one at a time.
/// Deferred buffers the whole corpus, then sorts and deduplicates the
/// flattened output lines. Raw converts records into a shared envelope that
/// is opened once per run and always terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    #[default]
    Streaming,
    Deferred,
    Raw,
}

/// Input-capable converter plugin: parses a spec into records.
pub trait InputFormat: Send + Sync {
    /// Registry tag for this spec (short lowercase name).
    fn tag(&self) -> &'static str;

    /// Parse `reader`, invoking `emit` once per completed record.
    ///
    /// Records must be emitted in source order. The parser owns record
    /// construction: it registers the target's configured fields, appends
    /// data chunks under source element keys, and closes each record before
    /// handing it over.
    fn parse(
        &self,
        target: &TargetSpec,
        reader: &mut dyn BufRead,
        emit: &mut dyn FnMut(Record) -> Result<(), ConvertError>,
    ) -> Result<(), ConvertError>;
}

/// Output-capable converter plugin: turns closed records into output.
pub trait OutputFormat: Send + Sync {
    /// Registry tag for this format (short lowercase name).
    fn tag(&self) -> &'static str;

    /// Emission discipline this format requires.
    fn mode(&self) -> OutputMode {
        OutputMode::Streaming
    }

    /// Convert one closed record into zero or more output lines.
    ///
    /// Used directly by the streaming and deferred disciplines; the default
    /// raw-mode [`OutputFormat::write_record`] also goes through here.
    fn convert(&self, record: &Record) -> Result<Vec<String>, ConvertError>;

    /// Open the shared envelope (raw discipline only).
    fn begin(&self, _out: &mut dyn Write) -> Result<(), ConvertError> {
        Ok(())
    }

    /// Convert one record into the open envelope (raw discipline only).
    fn write_record(&self, record: &Record, out: &mut dyn Write) -> Result<(), ConvertError> {
        for line in self.convert(record)? {
            writeln!(out, "{}", line)?;
        }
        Ok(())
    }

    /// Terminate the shared envelope (raw discipline only).
    ///
    /// The pipeline guarantees this runs exactly once per run, on error
    /// paths included.
    fn end(&self, _out: &mut dyn Write) -> Result<(), ConvertError> {
        Ok(())
    }
}

/// Registry mapping (capability, tag) to a converter plugin.
pub struct FormatRegistry {
    inputs: HashMap<String, Box<dyn InputFormat>>,
    outputs: HashMap<String, Box<dyn OutputFormat>>,
}

impl FormatRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            inputs: HashMap::new(),
            outputs: HashMap::new(),
        }
    }

    /// Registry pre-populated with every built-in plugin.
    pub fn builtin() -> Self {
        let mut registry = Self::new();

        let loaded: [Result<(), ConvertError>; 5] = [
            registry.register_input(Box::new(crate::specs::Midos)),
            registry.register_input(Box::new(crate::specs::Sisis)),
            registry.register_output(Box::new(crate::formats::Lingo)),
            registry.register_output(Box::new(crate::formats::MidosOut)),
            registry.register_output(Box::new(crate::formats::Xml)),
        ];
        for result in loaded {
            // Built-in tags are distinct by construction.
            debug_assert!(result.is_ok());
        }

        registry
    }

    /// Register an input plugin under its tag.
    ///
    /// Fails with [`ConvertError::Config`] if the tag is already taken in
    /// the input namespace.
    pub fn register_input(&mut self, plugin: Box<dyn InputFormat>) -> Result<(), ConvertError> {
        let tag = plugin.tag().to_string();
        if self.inputs.contains_key(&tag) {
            return Err(ConvertError::Config(format!(
                "duplicate input format tag: {}",
                tag
            )));
        }
        self.inputs.insert(tag, plugin);
        Ok(())
    }

    /// Register an output plugin under its tag.
    ///
    /// Fails with [`ConvertError::Config`] if the tag is already taken in
    /// the output namespace.
    pub fn register_output(&mut self, plugin: Box<dyn OutputFormat>) -> Result<(), ConvertError> {
        let tag = plugin.tag().to_string();
        if self.outputs.contains_key(&tag) {
            return Err(ConvertError::Config(format!(
                "duplicate output format tag: {}",
                tag
            )));
        }
        self.outputs.insert(tag, plugin);
        Ok(())
    }

    /// Look up the input plugin registered under `tag`.
    pub fn input(&self, tag: &str) -> Result<&dyn InputFormat, ConvertError> {
        self.inputs
            .get(tag)
            .map(|plugin| &**plugin)
            .ok_or_else(|| ConvertError::UnknownFormat {
                capability: Capability::Input,
                tag: tag.to_string(),
            })
    }

    /// Look up the output plugin registered under `tag`.
    pub fn output(&self, tag: &str) -> Result<&dyn OutputFormat, ConvertError> {
        self.outputs
            .get(tag)
            .map(|plugin| &**plugin)
            .ok_or_else(|| ConvertError::UnknownFormat {
                capability: Capability::Output,
                tag: tag.to_string(),
            })
    }

    /// Whether an input plugin is registered under `tag`.
    pub fn has_input(&self, tag: &str) -> bool {
        self.inputs.contains_key(tag)
    }

    /// Whether an output plugin is registered under `tag`.
    pub fn has_output(&self, tag: &str) -> bool {
        self.outputs.contains_key(tag)
    }

    /// Registered input tags, sorted.
    pub fn input_tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.inputs.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }

    /// Registered output tags, sorted.
    pub fn output_tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.outputs.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::new()
    }
}
