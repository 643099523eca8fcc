//! Sub-object and sub-array builders plus the capability traits for
//! caller-supplied value types.
//!
//! [`Dict`] and [`Arr`] are independent builders with their own buffers;
//! their finished, brace/bracket-wrapped content is spliced into the parent
//! buffer at the call site, which supports arbitrary nesting depth.
//!
//! Two embedding capabilities exist for user types:
//! - [`ObjectEncode`]: "append my fields", used both under a key
//!   (`object`) and directly into the current object (`embed_object`)
//! - [`ArrayEncode`]: "append my elements", used under a key (`array_of`)
//!
//! A value exposing neither capability goes through the serde fallback.

use std::net::IpAddr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::encode::{self, DurationFormat, TimeFormat};

/// Capability: a value that can append its own fields into an object.
pub trait ObjectEncode {
    /// Append this value's fields to the given builder and return it.
    fn encode_object(&self, obj: Dict) -> Dict;
}

/// Capability: a value that can append its own elements into an array.
pub trait ArrayEncode {
    /// Append this value's elements to the given builder and return it.
    fn encode_array(&self, arr: Arr) -> Arr;
}

/// Builder for a nested JSON object.
///
/// Holds the unwrapped inner content; the parent adds the braces when the
/// dict is spliced in.
#[derive(Debug, Default)]
pub struct Dict {
    buf: Vec<u8>,
}

impl Dict {
    /// Create an empty dict builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a string field.
    pub fn str(mut self, key: &str, value: &str) -> Self {
        encode::append_key(&mut self.buf, key);
        encode::append_json_string(&mut self.buf, value);
        self
    }

    /// Add a signed integer field.
    pub fn int(mut self, key: &str, value: i64) -> Self {
        encode::append_key(&mut self.buf, key);
        encode::append_i64(&mut self.buf, value);
        self
    }

    /// Add an unsigned integer field.
    pub fn uint(mut self, key: &str, value: u64) -> Self {
        encode::append_key(&mut self.buf, key);
        encode::append_u64(&mut self.buf, value);
        self
    }

    /// Add a float field.
    pub fn float(mut self, key: &str, value: f64) -> Self {
        encode::append_key(&mut self.buf, key);
        encode::append_f64(&mut self.buf, value);
        self
    }

    /// Add a boolean field.
    pub fn bool(mut self, key: &str, value: bool) -> Self {
        encode::append_key(&mut self.buf, key);
        encode::append_bool(&mut self.buf, value);
        self
    }

    /// Add a timestamp field in the default format.
    pub fn time(self, key: &str, value: &DateTime<Utc>) -> Self {
        self.time_with(key, value, TimeFormat::default())
    }

    /// Add a timestamp field in an explicit format.
    ///
    /// Dicts are built standalone, so unlike the context and event paths they
    /// take the format at the call site rather than from a logger.
    pub fn time_with(mut self, key: &str, value: &DateTime<Utc>, format: TimeFormat) -> Self {
        encode::append_key(&mut self.buf, key);
        encode::append_time(&mut self.buf, value, format);
        self
    }

    /// Add a duration field in the default format.
    pub fn dur(self, key: &str, value: Duration) -> Self {
        self.dur_with(key, value, DurationFormat::default())
    }

    /// Add a duration field in an explicit format.
    pub fn dur_with(mut self, key: &str, value: Duration, format: DurationFormat) -> Self {
        encode::append_key(&mut self.buf, key);
        encode::append_duration(&mut self.buf, value, format);
        self
    }

    /// Add an IP address field.
    pub fn ip(mut self, key: &str, value: IpAddr) -> Self {
        encode::append_key(&mut self.buf, key);
        encode::append_ip(&mut self.buf, value);
        self
    }

    /// Add a hardware address field.
    pub fn mac(mut self, key: &str, octets: &[u8]) -> Self {
        encode::append_key(&mut self.buf, key);
        encode::append_mac(&mut self.buf, octets);
        self
    }

    /// Add a nested dict under the given key.
    pub fn dict(mut self, key: &str, value: Dict) -> Self {
        encode::append_key(&mut self.buf, key);
        value.write_wrapped(&mut self.buf);
        self
    }

    /// Add a nested array under the given key.
    pub fn array(mut self, key: &str, value: Arr) -> Self {
        encode::append_key(&mut self.buf, key);
        value.write_wrapped(&mut self.buf);
        self
    }

    /// Add a value exposing the object capability as a nested object.
    pub fn object<T: ObjectEncode + ?Sized>(mut self, key: &str, value: &T) -> Self {
        encode::append_key(&mut self.buf, key);
        value.encode_object(Dict::new()).write_wrapped(&mut self.buf);
        self
    }

    /// Add an arbitrary value via the serde fallback.
    pub fn any<T: Serialize + ?Sized>(mut self, key: &str, value: &T) -> Self {
        encode::append_key(&mut self.buf, key);
        encode::append_serde(&mut self.buf, value);
        self
    }

    /// Whether any field has been added yet.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Write this dict's content into `buf` wrapped in braces.
    pub(crate) fn write_wrapped(self, buf: &mut Vec<u8>) {
        buf.push(b'{');
        buf.extend_from_slice(&self.buf);
        buf.push(b'}');
    }

    /// Write this dict's fields directly into `buf` with no wrapping key,
    /// joining onto any existing entries.
    pub(crate) fn write_embedded(self, buf: &mut Vec<u8>) {
        if self.buf.is_empty() {
            return;
        }
        if !buf.is_empty() {
            buf.push(b',');
        }
        buf.extend_from_slice(&self.buf);
    }
}

impl ObjectEncode for Dict {
    fn encode_object(&self, obj: Dict) -> Dict {
        let mut obj = obj;
        if !self.buf.is_empty() {
            if !obj.buf.is_empty() {
                obj.buf.push(b',');
            }
            obj.buf.extend_from_slice(&self.buf);
        }
        obj
    }
}

/// Builder for a nested JSON array.
#[derive(Debug, Default)]
pub struct Arr {
    buf: Vec<u8>,
}

impl Arr {
    /// Create an empty array builder.
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    fn sep(&mut self) {
        if !self.buf.is_empty() {
            self.buf.push(b',');
        }
    }

    /// Append a string element.
    pub fn str(mut self, value: &str) -> Self {
        self.sep();
        encode::append_json_string(&mut self.buf, value);
        self
    }

    /// Append a signed integer element.
    pub fn int(mut self, value: i64) -> Self {
        self.sep();
        encode::append_i64(&mut self.buf, value);
        self
    }

    /// Append an unsigned integer element.
    pub fn uint(mut self, value: u64) -> Self {
        self.sep();
        encode::append_u64(&mut self.buf, value);
        self
    }

    /// Append a float element.
    pub fn float(mut self, value: f64) -> Self {
        self.sep();
        encode::append_f64(&mut self.buf, value);
        self
    }

    /// Append a boolean element.
    pub fn bool(mut self, value: bool) -> Self {
        self.sep();
        encode::append_bool(&mut self.buf, value);
        self
    }

    /// Append a timestamp element in the default format.
    pub fn time(self, value: &DateTime<Utc>) -> Self {
        self.time_with(value, TimeFormat::default())
    }

    /// Append a timestamp element in an explicit format.
    pub fn time_with(mut self, value: &DateTime<Utc>, format: TimeFormat) -> Self {
        self.sep();
        encode::append_time(&mut self.buf, value, format);
        self
    }

    /// Append a duration element in the default format.
    pub fn dur(self, value: Duration) -> Self {
        self.dur_with(value, DurationFormat::default())
    }

    /// Append a duration element in an explicit format.
    pub fn dur_with(mut self, value: Duration, format: DurationFormat) -> Self {
        self.sep();
        encode::append_duration(&mut self.buf, value, format);
        self
    }

    /// Append an IP address element.
    pub fn ip(mut self, value: IpAddr) -> Self {
        self.sep();
        encode::append_ip(&mut self.buf, value);
        self
    }

    /// Append a nested object element built from a dict.
    pub fn dict(mut self, value: Dict) -> Self {
        self.sep();
        value.write_wrapped(&mut self.buf);
        self
    }

    /// Append a value exposing the object capability as an object element.
    pub fn object<T: ObjectEncode + ?Sized>(mut self, value: &T) -> Self {
        self.sep();
        value.encode_object(Dict::new()).write_wrapped(&mut self.buf);
        self
    }

    /// Append an arbitrary element via the serde fallback.
    pub fn any<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        self.sep();
        encode::append_serde(&mut self.buf, value);
        self
    }

    /// Whether any element has been added yet.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Write this array's content into `buf` wrapped in brackets.
    pub(crate) fn write_wrapped(self, buf: &mut Vec<u8>) {
        buf.push(b'[');
        buf.extend_from_slice(&self.buf);
        buf.push(b']');
    }
}

impl ArrayEncode for Arr {
    fn encode_array(&self, arr: Arr) -> Arr {
        let mut arr = arr;
        if !self.buf.is_empty() {
            if !arr.buf.is_empty() {
                arr.buf.push(b',');
            }
            arr.buf.extend_from_slice(&self.buf);
        }
        arr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wrapped_dict(d: Dict) -> String {
        let mut buf = Vec::new();
        d.write_wrapped(&mut buf);
        String::from_utf8(buf).unwrap()
    }

    fn wrapped_arr(a: Arr) -> String {
        let mut buf = Vec::new();
        a.write_wrapped(&mut buf);
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_dict_fields() {
        let d = Dict::new().str("bar", "baz").int("n", 1);
        assert_eq!(wrapped_dict(d), r#"{"bar":"baz","n":1}"#);
    }

    #[test]
    fn test_empty_dict() {
        assert_eq!(wrapped_dict(Dict::new()), "{}");
    }

    #[test]
    fn test_nested_dict_and_array() {
        let d = Dict::new()
            .dict("inner", Dict::new().bool("ok", true))
            .array("xs", Arr::new().int(1).int(2));
        assert_eq!(wrapped_dict(d), r#"{"inner":{"ok":true},"xs":[1,2]}"#);
    }

    #[test]
    fn test_array_mixed_elements() {
        let a = Arr::new()
            .str("baz")
            .int(1)
            .dict(Dict::new().str("bar", "baz").int("n", 1));
        assert_eq!(wrapped_arr(a), r#"["baz",1,{"bar":"baz","n":1}]"#);
    }

    #[test]
    fn test_explicit_time_and_duration_formats() {
        use chrono::TimeZone;

        let t = Utc.with_ymd_and_hms(2020, 1, 2, 3, 4, 5).unwrap();
        let d = Dict::new()
            .time_with("at", &t, TimeFormat::UnixSeconds)
            .dur_with("took", Duration::from_secs(10), DurationFormat::Micros);
        assert_eq!(wrapped_dict(d), r#"{"at":1577934245,"took":10000000}"#);

        let a = Arr::new()
            .time_with(&t, TimeFormat::UnixMillis)
            .dur_with(Duration::from_secs(10), DurationFormat::Nanos);
        assert_eq!(wrapped_arr(a), r#"[1577934245000,10000000000]"#);
    }

    #[test]
    fn test_object_capability() {
        struct Point {
            x: i64,
            y: i64,
        }
        impl ObjectEncode for Point {
            fn encode_object(&self, obj: Dict) -> Dict {
                obj.int("x", self.x).int("y", self.y)
            }
        }
        let d = Dict::new().object("p", &Point { x: 1, y: 2 });
        assert_eq!(wrapped_dict(d), r#"{"p":{"x":1,"y":2}}"#);
    }

    #[test]
    fn test_embedded_dict_joins_entries() {
        let mut buf: Vec<u8> = br#""foo":"bar""#.to_vec();
        Dict::new().str("price", "$64.49").write_embedded(&mut buf);
        assert_eq!(buf, br#""foo":"bar","price":"$64.49""#);
    }
}
