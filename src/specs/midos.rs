//! MIDOS database export parser.
//!
//! MIDOS exports are line oriented: `TAG: value` field lines, records
//! terminated by a `&&&` line. Bare continuation lines carry on the most
//! recent field tag. Records that accumulated no data are suppressed at
//! close time.

use std::io::BufRead;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ConvertError;
use crate::record::Record;
use crate::registry::InputFormat;
use crate::runtime::TargetSpec;

static FIELD_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z][A-Za-z0-9_-]*):\s?(.*)$").unwrap());

const RECORD_TERMINATOR: &str = "&&&";

/// Input plugin for MIDOS database exports.
pub struct Midos;

impl Midos {
    pub const TAG: &'static str = "midos";
}

impl InputFormat for Midos {
    fn tag(&self) -> &'static str {
        Self::TAG
    }

    fn parse(
        &self,
        target: &TargetSpec,
        reader: &mut dyn BufRead,
        emit: &mut dyn FnMut(Record) -> Result<(), ConvertError>,
    ) -> Result<(), ConvertError> {
        let mut current: Option<Record> = None;
        let mut element: Option<String> = None;
        let mut sequence = 0usize;

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim_end();

            if line == RECORD_TERMINATOR {
                if let Some(record) = current.take() {
                    for closed in record.close() {
                        emit(closed)?;
                    }
                }
                element = None;
                continue;
            }

            if line.is_empty() {
                continue;
            }

            if let Some(caps) = FIELD_LINE.captures(line) {
                let record = current.get_or_insert_with(|| {
                    sequence += 1;
                    let mut record = empty_suppressing_record(sequence);
                    record.register_fields(&target.fields);
                    record
                });

                let tag = caps[1].to_uppercase();
                record.append(&tag, &caps[2]);
                element = Some(tag);
            } else {
                // Continuation line: same element as the preceding field line.
                match (current.as_mut(), element.as_deref()) {
                    (Some(record), Some(tag)) => record.append(tag, line),
                    _ => {
                        return Err(ConvertError::NoRecord {
                            spec: Self::TAG.to_string(),
                            line: index + 1,
                        })
                    }
                }
            }
        }

        // Trailing record without a terminator.
        if let Some(record) = current.take() {
            for closed in record.close() {
                emit(closed)?;
            }
        }

        Ok(())
    }
}

fn empty_suppressing_record(sequence: usize) -> Record {
    Record::with_finalizer(
        sequence.to_string(),
        Box::new(|record| {
            if record.has_values() {
                vec![record]
            } else {
                vec![]
            }
        }),
    )
}
