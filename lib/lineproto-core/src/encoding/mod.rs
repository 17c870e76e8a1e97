//! Line protocol encoding.
//!
//! A point is encoded as a single line, without a trailing newline:
//!
//! ```text
//! <measurement>[,<tag key>=<tag value>]* <field key>=<field value>[,<field key>=<field value>]*[ <timestamp>]
//! ```
//!
//! Tags and fields are written in ascending key order, absent field values are skipped, and the timestamp, if any, is
//! written in nanoseconds.
use std::fmt;

use foldhash::fast::RandomState;
use hashbrown::HashMap;

use crate::data_model::{FieldValue, Point};

pub mod escape;
use self::escape::{write_escaped_key, write_escaped_string};

pub mod number;
use self::number::{write_float, write_integer};

/// Display adapter that renders a [`Point`] as line protocol.
pub struct LineProtocol<'a> {
    point: &'a Point,
}

impl<'a> LineProtocol<'a> {
    /// Creates a new `LineProtocol` for the given point.
    pub fn new(point: &'a Point) -> Self {
        Self { point }
    }
}

impl fmt::Display for LineProtocol<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_escaped_key(f, self.point.measurement())?;
        write_point_body(f, self.point)
    }
}

/// A line protocol encoder with a per-measurement buffer cache.
///
/// Each distinct measurement gets its own buffer, which starts with the escaped measurement name. Encoding a point
/// truncates its buffer back to that prefix and writes the rest of the line after it, so neither the measurement name
/// nor the buffer's allocation is redone for repeated measurements.
///
/// Encoders are not shared: each worker should own one. The cache grows with every distinct measurement encoded and is
/// only ever emptied by [`clear`][Self::clear].
#[derive(Default)]
pub struct LineProtocolEncoder {
    buffers: HashMap<String, MeasurementBuffer, RandomState>,
}

impl LineProtocolEncoder {
    /// Creates a new, empty `LineProtocolEncoder`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Encodes the given point, returning the encoded line.
    ///
    /// The returned line borrows the encoder's buffer for the point's measurement, and is overwritten by the next
    /// encode of the same measurement.
    pub fn encode(&mut self, point: &Point) -> &str {
        let buffer = self
            .buffers
            .entry_ref(point.measurement())
            .or_insert_with(|| MeasurementBuffer::new(point.measurement()));

        buffer.reset_for_use();
        // Writing into a `String` cannot fail.
        let _ = write_point_body(&mut buffer.buf, point);
        &buffer.buf
    }

    /// Returns the number of measurements with a cached buffer.
    pub fn cached_measurements(&self) -> usize {
        self.buffers.len()
    }

    /// Drops every cached buffer.
    pub fn clear(&mut self) {
        self.buffers.clear();
    }
}

impl fmt::Debug for LineProtocolEncoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LineProtocolEncoder")
            .field("cached_measurements", &self.buffers.len())
            .finish()
    }
}

struct MeasurementBuffer {
    buf: String,
    prefix_len: usize,
}

impl MeasurementBuffer {
    fn new(measurement: &str) -> Self {
        let mut buf = String::with_capacity(measurement.len() + 64);
        let _ = write_escaped_key(&mut buf, measurement);
        let prefix_len = buf.len();
        Self { buf, prefix_len }
    }

    fn reset_for_use(&mut self) {
        self.buf.truncate(self.prefix_len);
    }
}

/// Writes everything after the measurement name: tags, fields, and the timestamp.
fn write_point_body<W>(writer: &mut W, point: &Point) -> fmt::Result
where
    W: fmt::Write + ?Sized,
{
    for (key, value) in point.tags() {
        writer.write_char(',')?;
        write_escaped_key(writer, key)?;
        writer.write_char('=')?;
        write_escaped_key(writer, value)?;
    }

    let mut separator = ' ';
    for (key, value) in point.fields() {
        let Some(value) = value else {
            continue;
        };

        writer.write_char(separator)?;
        separator = ',';

        write_escaped_key(writer, key)?;
        writer.write_char('=')?;
        write_field_value(writer, value)?;
    }

    if let Some(time) = point.time() {
        write!(writer, " {}", time.as_nanos())?;
    }

    Ok(())
}

fn write_field_value<W>(writer: &mut W, value: &FieldValue) -> fmt::Result
where
    W: fmt::Write + ?Sized,
{
    match value {
        FieldValue::Boolean(value) => writer.write_str(if *value { "true" } else { "false" }),
        FieldValue::Integer(value) => write_integer(writer, *value),
        FieldValue::Float(value) => write_float(writer, *value),
        FieldValue::String(value) => {
            writer.write_char('"')?;
            write_escaped_string(writer, value)?;
            writer.write_char('"')
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use similar_asserts::assert_eq;

    use super::*;
    use crate::{
        data_model::{Builder, Precision},
        pooling::{BuilderPool as _, NoPool},
    };

    fn builder(measurement: &str) -> Builder {
        NoPool::new().create_builder(measurement).unwrap()
    }

    #[test]
    fn basic_lines() {
        let point = builder("cpu").tag("host", "serverA").add_field("value", 0.64).build().unwrap();
        assert_eq!(point.line_protocol(), "cpu,host=serverA value=0.64");

        let point = builder("cpu").tag("host", "").add_field("value", 1.0).build().unwrap();
        assert_eq!(point.line_protocol(), "cpu value=1.0");

        let point = builder("cpu").add_field("count", 5).build().unwrap();
        assert_eq!(point.line_protocol(), "cpu count=5i");

        let point = builder("cpu")
            .add_field("value", 1.0)
            .time(1000, Precision::Nanoseconds)
            .build()
            .unwrap();
        assert_eq!(point.line_protocol(), "cpu value=1.0 1000");
    }

    #[test]
    fn all_field_types() {
        let point = builder("disk")
            .add_field("free", 1024u32)
            .add_field("healthy", true)
            .add_field("label", "say \"hi\" C:\\")
            .add_field("ratio", 0.5f32)
            .build()
            .unwrap();

        assert_eq!(
            point.line_protocol(),
            r#"disk free=1024i,healthy=true,label="say \"hi\" C:\\",ratio=0.5"#
        );
    }

    #[test]
    fn escaping() {
        let point = builder("my cpu")
            .tag("host name", "a,b=c")
            .add_field("load avg", "x y,z=w")
            .build()
            .unwrap();

        assert_eq!(
            point.line_protocol(),
            r#"my\ cpu,host\ name=a\,b\=c load\ avg="x y,z=w""#
        );
    }

    #[test]
    fn absent_fields_are_skipped() {
        let point = builder("cpu")
            .add_optional_field("a", None::<i64>)
            .unwrap()
            .add_field("b", 1)
            .add_optional_field("c", None::<bool>)
            .unwrap()
            .add_field("d", 2)
            .build()
            .unwrap();

        assert_eq!(point.line_protocol(), "cpu b=1i,d=2i");
    }

    #[test]
    fn timestamp_is_nanoseconds() {
        let point = builder("cpu").add_field("v", 1).time(3, Precision::Seconds).build().unwrap();
        assert_eq!(point.line_protocol(), "cpu v=1i 3000000000");

        let point = builder("cpu").add_field("v", 1).time(i64::MAX, Precision::Days).build().unwrap();
        assert_eq!(point.line_protocol(), format!("cpu v=1i {}", i64::MAX));
    }

    #[test]
    fn extreme_floats_stay_plain() {
        let point = builder("m").add_field("tiny", 1e-10).add_field("huge", 1e22).build().unwrap();
        assert_eq!(point.line_protocol(), "m huge=10000000000000000000000.0,tiny=0.0000000001");
    }

    #[test]
    fn encoder_reuses_measurement_buffers() {
        let mut encoder = LineProtocolEncoder::new();

        let first = builder("cpu").tag("host", "a").add_field("v", 1).build().unwrap();
        let second = builder("cpu").add_field("v", 2).time(5, Precision::Nanoseconds).build().unwrap();
        let third = builder("mem used").add_field("v", 3).build().unwrap();

        assert_eq!(encoder.encode(&first), "cpu,host=a v=1i");
        assert_eq!(encoder.encode(&second), "cpu v=2i 5");
        assert_eq!(encoder.encode(&third), "mem\\ used v=3i");
        assert_eq!(encoder.cached_measurements(), 2);

        // A shorter line after a longer one must not leave stale bytes behind.
        assert_eq!(encoder.encode(&first), "cpu,host=a v=1i");

        encoder.clear();
        assert_eq!(encoder.cached_measurements(), 0);
        assert_eq!(encoder.encode(&third), third.line_protocol());
    }

    proptest! {
        #[test]
        fn property_test_tag_order_is_sorted(tags in proptest::collection::vec(("[a-z]{1,8}", "[a-z]{1,8}"), 1..16)) {
            let mut forward = builder("m");
            for (k, v) in &tags {
                forward = forward.tag(k.as_str(), v.as_str());
            }
            let forward = forward.add_field("f", 1).build().unwrap();

            let line = forward.line_protocol();
            let tag_section = line.split(' ').next().unwrap();
            let keys = tag_section.split(',').skip(1).map(|kv| kv.split('=').next().unwrap().to_string()).collect::<Vec<_>>();
            let mut sorted = keys.clone();
            sorted.sort();
            sorted.dedup();
            prop_assert_eq!(keys, sorted);
        }

        #[test]
        fn property_test_insertion_order_does_not_matter(tags in proptest::collection::btree_map("[a-z ,=]{1,8}", "[a-z ,=]{1,8}", 1..16)) {
            let forward = builder("m").tags_from(tags.clone()).add_field("f", 1).build().unwrap();
            let reverse = builder("m").tags_from(tags.into_iter().rev()).add_field("f", 1).build().unwrap();

            let mut encoder = LineProtocolEncoder::new();
            let encoded = encoder.encode(&forward).to_string();
            prop_assert_eq!(encoded, reverse.line_protocol());
        }
    }
}
