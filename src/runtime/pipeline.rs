//! Conversion pipeline and output-emission strategies.
//!
//! The pipeline binds a resolved target to an input parser and an output
//! converter, then drives parse, convert, and emit under the discipline the
//! output format declares: streaming (write each record as it completes),
//! deferred (buffer the corpus, then sort and deduplicate the flattened
//! output), or raw (convert into a shared envelope that is opened once and
//! always terminated).

use std::io::{BufRead, Write};

use tracing::info;

use crate::error::ConvertError;
use crate::record::Record;
use crate::registry::{FormatRegistry, InputFormat, OutputFormat, OutputMode};
use crate::runtime::config_loader::{TargetSpec, TargetTable};
use crate::runtime::target_resolver::resolve_target;

/// Parameters of one conversion run.
#[derive(Debug, Clone)]
pub struct RunOptions<'a> {
    /// Input spec tag.
    pub spec: &'a str,
    /// Output format tag.
    pub format: &'a str,
    /// Explicit target override; disables the cascade.
    pub target: Option<&'a str>,
    /// Cascade base, usually derived from the input filename.
    pub target_fallback: Option<&'a str>,
}

/// Counters reported after a run.
///
/// `lines` counts lines written by the streaming and deferred disciplines;
/// raw-mode formats write into their envelope directly, so only `records` is
/// meaningful there.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Records emitted by the parser (after finalizers).
    pub records: usize,
    /// Output lines written.
    pub lines: usize,
}

/// Drives parse, convert, and emit for one conversion run.
pub struct Pipeline<'a> {
    registry: &'a FormatRegistry,
    table: &'a TargetTable,
}

impl<'a> Pipeline<'a> {
    /// Create a pipeline over a populated registry and a loaded target table.
    pub fn new(registry: &'a FormatRegistry, table: &'a TargetTable) -> Self {
        Self { registry, table }
    }

    /// Run one conversion: resolve the target, bind the plugins, and emit
    /// under the output format's discipline.
    ///
    /// # Errors
    /// [`ConvertError::InvalidSpec`] / [`ConvertError::InvalidFormat`] for
    /// unregistered tags, [`ConvertError::ConfigNotFound`] when no target
    /// matches, and any parser, converter, or I/O error. All abort the run.
    pub fn run(
        &self,
        opts: &RunOptions<'_>,
        reader: &mut dyn BufRead,
        writer: &mut dyn Write,
    ) -> Result<RunStats, ConvertError> {
        if !self.registry.has_input(opts.spec) {
            return Err(ConvertError::InvalidSpec(opts.spec.to_string()));
        }
        if !self.registry.has_output(opts.format) {
            return Err(ConvertError::InvalidFormat(opts.format.to_string()));
        }

        let (target_id, payload) = resolve_target(
            opts.target,
            opts.target_fallback,
            opts.spec,
            opts.format,
            self.table,
        )?;
        let target = TargetSpec::from_payload(payload, opts.spec)?;

        let parser = self.registry.input(opts.spec)?;
        let converter = self.registry.output(opts.format)?;

        info!(
            target = %target_id,
            spec = opts.spec,
            format = opts.format,
            mode = ?converter.mode(),
            "starting conversion"
        );

        let stats = match converter.mode() {
            OutputMode::Streaming => {
                self.run_streaming(parser, converter, &target, reader, writer)?
            }
            OutputMode::Deferred => self.run_deferred(parser, converter, &target, reader, writer)?,
            OutputMode::Raw => self.run_raw(parser, converter, &target, reader, writer)?,
        };

        info!(records = stats.records, lines = stats.lines, "conversion complete");
        Ok(stats)
    }

    /// Convert and write each record as the parser completes it.
    ///
    /// Memory use is independent of record count; nothing is buffered beyond
    /// the record in flight.
    fn run_streaming(
        &self,
        parser: &dyn InputFormat,
        converter: &dyn OutputFormat,
        target: &TargetSpec,
        reader: &mut dyn BufRead,
        writer: &mut dyn Write,
    ) -> Result<RunStats, ConvertError> {
        let mut stats = RunStats::default();

        let mut emit = |record: Record| -> Result<(), ConvertError> {
            stats.records += 1;
            for line in converter.convert(&record)? {
                writeln!(writer, "{}", line)?;
                stats.lines += 1;
            }
            Ok(())
        };
        parser.parse(target, reader, &mut emit)?;

        writer.flush()?;
        Ok(stats)
    }

    /// Parse the whole corpus first, then write the flattened, sorted,
    /// deduplicated output lines.
    fn run_deferred(
        &self,
        parser: &dyn InputFormat,
        converter: &dyn OutputFormat,
        target: &TargetSpec,
        reader: &mut dyn BufRead,
        writer: &mut dyn Write,
    ) -> Result<RunStats, ConvertError> {
        let mut records = Vec::new();

        let mut emit = |record: Record| -> Result<(), ConvertError> {
            records.push(record);
            Ok(())
        };
        parser.parse(target, reader, &mut emit)?;

        let mut lines = Vec::new();
        for record in &records {
            lines.extend(converter.convert(record)?);
        }
        lines.sort();
        lines.dedup();

        for line in &lines {
            writeln!(writer, "{}", line)?;
        }
        writer.flush()?;

        Ok(RunStats {
            records: records.len(),
            lines: lines.len(),
        })
    }

    /// Convert each record into a shared envelope.
    ///
    /// The envelope is opened once and terminated exactly once on every exit
    /// path, a parser or converter error included.
    fn run_raw(
        &self,
        parser: &dyn InputFormat,
        converter: &dyn OutputFormat,
        target: &TargetSpec,
        reader: &mut dyn BufRead,
        writer: &mut dyn Write,
    ) -> Result<RunStats, ConvertError> {
        let mut stats = RunStats::default();

        converter.begin(writer)?;

        let mut emit = |record: Record| -> Result<(), ConvertError> {
            stats.records += 1;
            converter.write_record(&record, &mut *writer)
        };
        let parsed = parser.parse(target, reader, &mut emit);

        let ended = converter.end(writer);
        parsed?;
        ended?;

        writer.flush()?;
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use serde_json::json;

    // One record per input line, with a single "value" field holding the
    // line under element "V".
    struct LineSpec;

    impl InputFormat for LineSpec {
        fn tag(&self) -> &'static str {
            "line"
        }

        fn parse(
            &self,
            _target: &TargetSpec,
            reader: &mut dyn BufRead,
            emit: &mut dyn FnMut(Record) -> Result<(), ConvertError>,
        ) -> Result<(), ConvertError> {
            let mut configs = IndexMap::new();
            configs.insert("value".to_string(), json!({ "elements": ["V"] }));

            for (index, line) in reader.lines().enumerate() {
                let line = line?;
                let mut record = Record::new((index + 1).to_string());
                record.register_fields(&configs);
                record.append("V", &line);
                for closed in record.close() {
                    emit(closed)?;
                }
            }
            Ok(())
        }
    }

    struct PlainOut(OutputMode);

    impl OutputFormat for PlainOut {
        fn tag(&self) -> &'static str {
            "plain"
        }

        fn mode(&self) -> OutputMode {
            self.0
        }

        fn convert(&self, record: &Record) -> Result<Vec<String>, ConvertError> {
            let field = record.field("value").expect("registered");
            Ok(field.values("V").to_vec())
        }
    }

    fn registry(mode: OutputMode) -> FormatRegistry {
        let mut registry = FormatRegistry::new();
        registry.register_input(Box::new(LineSpec)).unwrap();
        registry.register_output(Box::new(PlainOut(mode))).unwrap();
        registry
    }

    fn table() -> TargetTable {
        TargetTable::from_yaml_str("generic:\n  line: {}\n").unwrap()
    }

    fn opts() -> RunOptions<'static> {
        RunOptions {
            spec: "line",
            format: "plain",
            target: None,
            target_fallback: None,
        }
    }

    #[test]
    fn test_unregistered_spec_fails_fast() {
        let registry = registry(OutputMode::Streaming);
        let table = table();
        let pipeline = Pipeline::new(&registry, &table);

        let mut input = "x\n".as_bytes();
        let mut output = Vec::new();
        let err = pipeline.run(
            &RunOptions { spec: "nope", ..opts() },
            &mut input,
            &mut output,
        );
        assert!(matches!(err, Err(ConvertError::InvalidSpec(s)) if s == "nope"));
    }

    #[test]
    fn test_unregistered_format_fails_fast() {
        let registry = registry(OutputMode::Streaming);
        let table = table();
        let pipeline = Pipeline::new(&registry, &table);

        let mut input = "x\n".as_bytes();
        let mut output = Vec::new();
        let err = pipeline.run(
            &RunOptions { format: "nope", ..opts() },
            &mut input,
            &mut output,
        );
        assert!(matches!(err, Err(ConvertError::InvalidFormat(s)) if s == "nope"));
    }

    #[test]
    fn test_streaming_writes_in_parse_order() {
        let registry = registry(OutputMode::Streaming);
        let table = table();
        let pipeline = Pipeline::new(&registry, &table);

        let mut input = "b\na\na\nc\n".as_bytes();
        let mut output = Vec::new();
        let stats = pipeline.run(&opts(), &mut input, &mut output).unwrap();

        assert_eq!(stats, RunStats { records: 4, lines: 4 });
        assert_eq!(String::from_utf8(output).unwrap(), "b\na\na\nc\n");
    }

    #[test]
    fn test_deferred_sorts_and_dedups() {
        let registry = registry(OutputMode::Deferred);
        let table = table();
        let pipeline = Pipeline::new(&registry, &table);

        let mut input = "b\na\na\nc\n".as_bytes();
        let mut output = Vec::new();
        let stats = pipeline.run(&opts(), &mut input, &mut output).unwrap();

        assert_eq!(stats, RunStats { records: 4, lines: 3 });
        assert_eq!(String::from_utf8(output).unwrap(), "a\nb\nc\n");
    }
}
