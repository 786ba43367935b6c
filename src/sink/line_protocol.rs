//! InfluxDB line protocol output.
//!
//! Each field group becomes one line:
//!
//! ```text
//! docker_cpu,id=8dfafdbc3a40,image=nginx,name=web count=4u,total_usage=100u 1704067200000000000
//! ```
//!
//! Unsigned values carry the `u` suffix, signed deltas the `i` suffix. Timestamps are
//! nanoseconds since the UNIX epoch.

use std::io::Write;

use time::OffsetDateTime;

use super::Accumulator;
use crate::container::ContainerTags;
use crate::error::ResultOkLogExt;
use crate::stats::{FieldValue, Fields};

#[derive(Debug)]
pub struct LineProtocolWriter<W> {
    prefix: String,
    writer: W,
}

impl<W: Write> LineProtocolWriter<W> {
    /// Creates a writer whose measurements are named `<prefix>_<group>`.
    pub fn new(writer: W, prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            writer,
        }
    }

    pub fn flush(&mut self) {
        self.writer.flush().ok_log();
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_line(
        &mut self,
        group: &str,
        fields: &Fields,
        tags: &ContainerTags,
        timestamp: OffsetDateTime,
    ) -> std::io::Result<()> {
        let w = &mut self.writer;

        write!(w, "{}_{}", escape(&self.prefix, &[',', ' ']), group)?;
        for (key, value) in tags.pairs() {
            // empty tag values are not allowed
            if !value.is_empty() {
                write!(w, ",{key}={}", escape(value, &[',', '=', ' ']))?;
            }
        }

        let mut separator = ' ';
        for (key, value) in fields {
            match value {
                FieldValue::Unsigned(v) => write!(w, "{separator}{key}={v}u")?,
                FieldValue::Integer(v) => write!(w, "{separator}{key}={v}i")?,
            }
            separator = ',';
        }

        writeln!(w, " {}", timestamp.unix_timestamp_nanos())
    }
}

fn escape(value: &str, special: &[char]) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if c == '\\' || special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

impl<W: Write> Accumulator for LineProtocolWriter<W> {
    fn add_fields(
        &mut self,
        group: &str,
        fields: Fields,
        tags: &ContainerTags,
        timestamp: OffsetDateTime,
    ) {
        // a line without fields is invalid
        if fields.is_empty() {
            return;
        }
        self.write_line(group, &fields, tags, timestamp).ok_log();
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;
    use crate::container::ContainerID;

    fn render(group: &str, fields: Fields, tags: &ContainerTags) -> String {
        let mut writer = LineProtocolWriter::new(Vec::new(), "docker");
        writer.add_fields(group, fields, tags, datetime!(2024-01-01 0:00:00 UTC));
        String::from_utf8(writer.into_inner()).unwrap()
    }

    #[test]
    fn renders_cpu_line() {
        let tags = ContainerTags::new(
            ContainerID::new("8dfafdbc3a40").unwrap(),
            "nginx",
            &["/web".to_owned()],
        );
        let fields = Fields::from([
            ("count", FieldValue::Unsigned(4)),
            ("total_delta", FieldValue::Integer(-20)),
        ]);

        assert_eq!(
            render("cpu", fields, &tags),
            "docker_cpu,id=8dfafdbc3a40,image=nginx,name=web count=4u,total_delta=-20i 1704067200000000000\n"
        );
    }

    #[test]
    fn tag_values_are_escaped() {
        let tags = ContainerTags::new(
            ContainerID::new("abc").unwrap(),
            "",
            &["/my app,v=1".to_owned()],
        );
        let fields = Fields::from([("rx_bytes", FieldValue::Unsigned(1))]);

        assert_eq!(
            render("network", fields, &tags),
            "docker_network,id=abc,name=my\\ app\\,v\\=1 rx_bytes=1u 1704067200000000000\n"
        );
    }

    #[test]
    fn empty_group_is_skipped() {
        let tags = ContainerTags::new(ContainerID::new("abc").unwrap(), "redis", &[]);
        assert_eq!(render("memory", Fields::new(), &tags), "");
    }
}
