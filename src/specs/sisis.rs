//! SISIS-SunRise export parser.
//!
//! SISIS exports carry numbered field lines (`0331:Title`). A line with the
//! record-leader tag opens a new record; the leader defaults to `0000` and
//! can be overridden per target via `record_leader`.

use std::io::BufRead;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use crate::error::ConvertError;
use crate::record::Record;
use crate::registry::InputFormat;
use crate::runtime::TargetSpec;

static FIELD_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{3,4})\s*:\s?(.*)$").unwrap());

const DEFAULT_LEADER: &str = "0000";

/// Input plugin for SISIS-SunRise exports.
pub struct Sisis;

impl Sisis {
    pub const TAG: &'static str = "sisis";
}

impl InputFormat for Sisis {
    fn tag(&self) -> &'static str {
        Self::TAG
    }

    fn parse(
        &self,
        target: &TargetSpec,
        reader: &mut dyn BufRead,
        emit: &mut dyn FnMut(Record) -> Result<(), ConvertError>,
    ) -> Result<(), ConvertError> {
        let leader = target.record_leader.as_deref().unwrap_or(DEFAULT_LEADER);

        let mut current: Option<Record> = None;
        let mut sequence = 0usize;

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim_end();

            if line.is_empty() {
                continue;
            }

            let Some(caps) = FIELD_LINE.captures(line) else {
                warn!(line = index + 1, "skipping unrecognized line");
                continue;
            };
            let tag = &caps[1];
            let data = &caps[2];

            if tag == leader {
                if let Some(record) = current.take() {
                    for closed in record.close() {
                        emit(closed)?;
                    }
                }

                sequence += 1;
                let mut record = Record::new(sequence.to_string());
                record.register_fields(&target.fields);
                record.append(tag, data);
                current = Some(record);
            } else {
                match current.as_mut() {
                    Some(record) => record.append(tag, data),
                    None => {
                        return Err(ConvertError::NoRecord {
                            spec: Self::TAG.to_string(),
                            line: index + 1,
                        })
                    }
                }
            }
        }

        if let Some(record) = current.take() {
            for closed in record.close() {
                emit(closed)?;
            }
        }

        Ok(())
    }
}
