//! XML document output.
//!
//! Records are embedded in a shared `<records>` envelope, so this format
//! runs under the raw discipline: the pipeline opens the envelope once,
//! converts each record into it, and terminates it on every exit path.

use std::io::Write;

use crate::error::ConvertError;
use crate::record::Record;
use crate::registry::{OutputFormat, OutputMode};
use crate::runtime::FieldSpec;

/// Output plugin producing an XML document.
pub struct Xml;

impl Xml {
    pub const TAG: &'static str = "xml";
}

impl OutputFormat for Xml {
    fn tag(&self) -> &'static str {
        Self::TAG
    }

    fn mode(&self) -> OutputMode {
        OutputMode::Raw
    }

    fn convert(&self, record: &Record) -> Result<Vec<String>, ConvertError> {
        let mut lines = vec![format!(r#"  <record id="{}">"#, escape(record.id()))];

        for (name, field) in record.fields() {
            let spec = FieldSpec::from_config(field.config())?;
            if spec.collect(field).is_empty() {
                continue;
            }

            lines.push(format!(r#"    <field name="{}">"#, escape(name)));
            for element in &spec.elements {
                for value in field.values(element) {
                    let value = value.trim();
                    if value.is_empty() {
                        continue;
                    }
                    lines.push(format!(
                        r#"      <value element="{}">{}</value>"#,
                        escape(element),
                        escape(value)
                    ));
                }
            }
            lines.push("    </field>".to_string());
        }

        lines.push("  </record>".to_string());
        Ok(lines)
    }

    fn begin(&self, out: &mut dyn Write) -> Result<(), ConvertError> {
        writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
        writeln!(out, "<records>")?;
        Ok(())
    }

    fn end(&self, out: &mut dyn Write) -> Result<(), ConvertError> {
        writeln!(out, "</records>")?;
        Ok(())
    }
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_element() {
        let mut record = Record::new("7");
        record.register_field("title", &json!({ "elements": ["TI"] }));
        record.append("TI", "Tom & Jerry <uncut>");

        let lines = Xml.convert(&record).unwrap();
        assert_eq!(lines[0], r#"  <record id="7">"#);
        assert_eq!(lines[1], r#"    <field name="title">"#);
        assert_eq!(
            lines[2],
            r#"      <value element="TI">Tom &amp; Jerry &lt;uncut&gt;</value>"#
        );
        assert_eq!(lines[3], "    </field>");
        assert_eq!(lines[4], "  </record>");
    }

    #[test]
    fn test_envelope_frames_document() {
        let mut out = Vec::new();
        Xml.begin(&mut out).unwrap();
        Xml.end(&mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<records>\n</records>\n"
        );
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape(r#"a<b>&"c'"#), "a&lt;b&gt;&amp;&quot;c&apos;");
    }
}
