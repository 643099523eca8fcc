//! Low-level typed field encoding - mission critical.
//!
//! Every builder in this crate (context, event, dict, array) funnels through
//! these append functions. They write `"key":value` bytes straight into a
//! growing buffer that holds the *inner content* of a JSON object: entries
//! are comma-separated, there are no enclosing braces, and wrapping the
//! buffer in `{}` must always yield valid JSON.
//!
//! Performance characteristics:
//! - Numbers are formatted directly into the target buffer (no intermediate
//!   `String` allocation)
//! - String escaping copies unescaped runs in chunks rather than per byte
//! - The serde fallback is the only general-purpose marshaler, and a failing
//!   value degrades to a descriptive error string instead of aborting the
//!   record

use std::io::Write as _;
use std::net::IpAddr;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

/// Encoding applied to timestamp fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeFormat {
    /// RFC 3339 with second precision and a `Z` suffix (e.g. `2026-08-26T12:00:00Z`).
    #[default]
    Rfc3339,
    /// Integer seconds since the Unix epoch.
    UnixSeconds,
    /// Integer milliseconds since the Unix epoch.
    UnixMillis,
}

/// Encoding applied to duration fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DurationFormat {
    /// Integer milliseconds.
    #[default]
    Millis,
    /// Integer microseconds.
    Micros,
    /// Integer nanoseconds.
    Nanos,
    /// Fractional seconds.
    Seconds,
}

/// Appends `"key":` to the buffer, inserting the entry separator first when
/// the buffer already holds content.
///
/// Interior entries never get or lose separators regardless of insertion
/// order because the decision depends only on the buffer being non-empty.
#[inline]
pub(crate) fn append_key(buf: &mut Vec<u8>, key: &str) {
    if !buf.is_empty() {
        buf.push(b',');
    }
    append_json_string(buf, key);
    buf.push(b':');
}

/// Appends a JSON-escaped, quoted string.
///
/// Escapes `"` and `\`, uses the short forms for `\n`/`\r`/`\t`, and falls
/// back to `\u00XX` for the remaining control bytes. Multi-byte UTF-8
/// sequences pass through untouched (every byte of them is >= 0x80).
pub(crate) fn append_json_string(buf: &mut Vec<u8>, s: &str) {
    buf.push(b'"');
    let bytes = s.as_bytes();
    let mut start = 0;
    for (i, &b) in bytes.iter().enumerate() {
        if b >= 0x20 && b != b'"' && b != b'\\' {
            continue;
        }
        buf.extend_from_slice(&bytes[start..i]);
        match b {
            b'"' => buf.extend_from_slice(b"\\\""),
            b'\\' => buf.extend_from_slice(b"\\\\"),
            b'\n' => buf.extend_from_slice(b"\\n"),
            b'\r' => buf.extend_from_slice(b"\\r"),
            b'\t' => buf.extend_from_slice(b"\\t"),
            _ => {
                let _ = write!(buf, "\\u{:04x}", b);
            }
        }
        start = i + 1;
    }
    buf.extend_from_slice(&bytes[start..]);
    buf.push(b'"');
}

/// Appends a signed integer in decimal form.
#[inline]
pub(crate) fn append_i64(buf: &mut Vec<u8>, value: i64) {
    let _ = write!(buf, "{value}");
}

/// Appends an unsigned integer in decimal form.
#[inline]
pub(crate) fn append_u64(buf: &mut Vec<u8>, value: u64) {
    let _ = write!(buf, "{value}");
}

/// Appends a float.
///
/// JSON has no representation for non-finite values, so NaN and the
/// infinities are written as quoted strings.
pub(crate) fn append_f64(buf: &mut Vec<u8>, value: f64) {
    if value.is_nan() {
        buf.extend_from_slice(b"\"NaN\"");
    } else if value.is_infinite() {
        if value.is_sign_positive() {
            buf.extend_from_slice(b"\"+Inf\"");
        } else {
            buf.extend_from_slice(b"\"-Inf\"");
        }
    } else {
        let _ = write!(buf, "{value}");
    }
}

/// Appends a boolean literal.
#[inline]
pub(crate) fn append_bool(buf: &mut Vec<u8>, value: bool) {
    buf.extend_from_slice(if value { b"true" } else { b"false" });
}

/// Appends a timestamp in the given format.
pub(crate) fn append_time(buf: &mut Vec<u8>, value: &DateTime<Utc>, format: TimeFormat) {
    match format {
        TimeFormat::Rfc3339 => {
            append_json_string(buf, &value.to_rfc3339_opts(SecondsFormat::Secs, true));
        }
        TimeFormat::UnixSeconds => append_i64(buf, value.timestamp()),
        TimeFormat::UnixMillis => append_i64(buf, value.timestamp_millis()),
    }
}

/// Appends a duration in the given format.
pub(crate) fn append_duration(buf: &mut Vec<u8>, value: Duration, format: DurationFormat) {
    match format {
        DurationFormat::Millis => append_u64(buf, value.as_millis() as u64),
        DurationFormat::Micros => append_u64(buf, value.as_micros() as u64),
        DurationFormat::Nanos => append_u64(buf, value.as_nanos() as u64),
        DurationFormat::Seconds => append_f64(buf, value.as_secs_f64()),
    }
}

/// Appends an IP address in canonical textual form, quoted.
pub(crate) fn append_ip(buf: &mut Vec<u8>, value: IpAddr) {
    buf.push(b'"');
    let _ = write!(buf, "{value}");
    buf.push(b'"');
}

/// Appends a CIDR prefix (`address/len`) in canonical textual form, quoted.
pub(crate) fn append_ip_prefix(buf: &mut Vec<u8>, addr: IpAddr, prefix_len: u8) {
    buf.push(b'"');
    let _ = write!(buf, "{addr}/{prefix_len}");
    buf.push(b'"');
}

/// Appends a hardware address as colon-separated hex pairs, quoted.
pub(crate) fn append_mac(buf: &mut Vec<u8>, octets: &[u8]) {
    buf.push(b'"');
    for (i, octet) in octets.iter().enumerate() {
        if i > 0 {
            buf.push(b':');
        }
        let _ = write!(buf, "{octet:02x}");
    }
    buf.push(b'"');
}

/// Appends an arbitrary value via the serde fallback.
///
/// This path never aborts the caller: if serialization fails the partial
/// output is rolled back and a descriptive error string is written in the
/// value's place, so the surrounding record is still produced.
pub(crate) fn append_serde<T: Serialize + ?Sized>(buf: &mut Vec<u8>, value: &T) {
    let mark = buf.len();
    if let Err(err) = serde_json::to_writer(&mut *buf, value) {
        buf.truncate(mark);
        append_json_string(buf, &format!("marshaling error: {err}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn encoded(f: impl FnOnce(&mut Vec<u8>)) -> String {
        let mut buf = Vec::new();
        f(&mut buf);
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_key_separator_rules() {
        let mut buf = Vec::new();
        append_key(&mut buf, "a");
        append_bool(&mut buf, true);
        append_key(&mut buf, "b");
        append_bool(&mut buf, false);
        assert_eq!(buf, b"\"a\":true,\"b\":false");
    }

    #[test]
    fn test_string_escaping() {
        assert_eq!(encoded(|b| append_json_string(b, "plain")), "\"plain\"");
        assert_eq!(encoded(|b| append_json_string(b, "say \"hi\"")), r#""say \"hi\"""#);
        assert_eq!(encoded(|b| append_json_string(b, "a\\b")), r#""a\\b""#);
        assert_eq!(encoded(|b| append_json_string(b, "line\nbreak")), r#""line\nbreak""#);
        assert_eq!(encoded(|b| append_json_string(b, "\x01")), "\"\\u0001\"");
        assert_eq!(encoded(|b| append_json_string(b, "héllo")), "\"héllo\"");
    }

    #[test]
    fn test_numbers() {
        assert_eq!(encoded(|b| append_i64(b, -42)), "-42");
        assert_eq!(encoded(|b| append_u64(b, u64::MAX)), u64::MAX.to_string());
        assert_eq!(encoded(|b| append_f64(b, 1.5)), "1.5");
        assert_eq!(encoded(|b| append_f64(b, f64::NAN)), "\"NaN\"");
        assert_eq!(encoded(|b| append_f64(b, f64::INFINITY)), "\"+Inf\"");
        assert_eq!(encoded(|b| append_f64(b, f64::NEG_INFINITY)), "\"-Inf\"");
    }

    #[test]
    fn test_time_formats() {
        let t = Utc.with_ymd_and_hms(2020, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(
            encoded(|b| append_time(b, &t, TimeFormat::Rfc3339)),
            "\"2020-01-02T03:04:05Z\""
        );
        assert_eq!(
            encoded(|b| append_time(b, &t, TimeFormat::UnixSeconds)),
            t.timestamp().to_string()
        );
        assert_eq!(
            encoded(|b| append_time(b, &t, TimeFormat::UnixMillis)),
            t.timestamp_millis().to_string()
        );
    }

    #[test]
    fn test_duration_formats() {
        let d = Duration::from_secs(10);
        assert_eq!(encoded(|b| append_duration(b, d, DurationFormat::Millis)), "10000");
        assert_eq!(encoded(|b| append_duration(b, d, DurationFormat::Micros)), "10000000");
        assert_eq!(encoded(|b| append_duration(b, d, DurationFormat::Seconds)), "10");
    }

    #[test]
    fn test_addresses() {
        let v4: IpAddr = "192.168.0.100".parse().unwrap();
        let v6: IpAddr = "::1".parse().unwrap();
        assert_eq!(encoded(|b| append_ip(b, v4)), "\"192.168.0.100\"");
        assert_eq!(encoded(|b| append_ip(b, v6)), "\"::1\"");
        assert_eq!(
            encoded(|b| append_ip_prefix(b, "192.168.0.0".parse().unwrap(), 24)),
            "\"192.168.0.0/24\""
        );
        assert_eq!(
            encoded(|b| append_mac(b, &[0x00, 0x14, 0x22, 0x01, 0x23, 0x45])),
            "\"00:14:22:01:23:45\""
        );
    }

    #[test]
    fn test_serde_fallback_success() {
        #[derive(serde::Serialize)]
        struct Obj {
            name: &'static str,
        }
        assert_eq!(
            encoded(|b| append_serde(b, &Obj { name: "john" })),
            r#"{"name":"john"}"#
        );
    }

    #[test]
    fn test_serde_fallback_failure_rolls_back() {
        struct Broken;
        impl Serialize for Broken {
            fn serialize<S: serde::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
                Err(serde::ser::Error::custom("boom"))
            }
        }
        let mut buf = Vec::new();
        append_key(&mut buf, "bad");
        append_serde(&mut buf, &Broken);
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            r#""bad":"marshaling error: boom""#
        );
    }
}
