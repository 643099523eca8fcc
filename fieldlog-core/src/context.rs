//! Context builder: accumulates fields destined for a derived logger.
//!
//! `Logger::with()` hands out a `Context` over a *private copy* of the
//! parent logger's frozen bytes; every field method appends to that copy,
//! so the parent is never affected and stays safe for concurrent use while
//! the derivation is in flight. `Context::logger()` freezes the buffer
//! (running the dedup engine first when one was requested) into a new,
//! independent logger.

use std::net::IpAddr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::dedup::{self, DedupMode};
use crate::encode::{self, DurationFormat, TimeFormat};
use crate::logger::Logger;
use crate::object::{Arr, ArrayEncode, Dict, ObjectEncode};

/// Fluent builder for a derived logger's context fields.
#[derive(Debug)]
pub struct Context {
    logger: Logger,
    buf: Vec<u8>,
    dedup: DedupMode,
    time_format: TimeFormat,
    duration_format: DurationFormat,
}

impl Context {
    pub(crate) fn new(logger: Logger) -> Self {
        let buf = logger.context_bytes().to_vec();
        let (time_format, duration_format) = logger.formats();
        Self {
            logger,
            buf,
            dedup: DedupMode::Off,
            time_format,
            duration_format,
        }
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

    /// Add a timestamp field in the parent logger's time format.
    pub fn time(mut self, key: &str, value: &DateTime<Utc>) -> Self {
        encode::append_key(&mut self.buf, key);
        encode::append_time(&mut self.buf, value, self.time_format);
        self
    }

    /// Add a duration field in the parent logger's duration format.
    pub fn dur(mut self, key: &str, value: Duration) -> Self {
        encode::append_key(&mut self.buf, key);
        encode::append_duration(&mut self.buf, value, self.duration_format);
        self
    }

    /// Add an array of durations in the parent logger's duration format.
    pub fn durs(mut self, key: &str, values: &[Duration]) -> Self {
        encode::append_key(&mut self.buf, key);
        self.buf.push(b'[');
        for (i, &value) in values.iter().enumerate() {
            if i > 0 {
                self.buf.push(b',');
            }
            encode::append_duration(&mut self.buf, value, self.duration_format);
        }
        self.buf.push(b']');
        self
    }

    /// Add an IP address field in canonical textual form.
    pub fn ip(mut self, key: &str, value: IpAddr) -> Self {
        encode::append_key(&mut self.buf, key);
        encode::append_ip(&mut self.buf, value);
        self
    }

    /// Add a CIDR prefix field (`address/len`).
    pub fn ip_prefix(mut self, key: &str, addr: IpAddr, prefix_len: u8) -> Self {
        encode::append_key(&mut self.buf, key);
        encode::append_ip_prefix(&mut self.buf, addr, prefix_len);
        self
    }

    /// Add a hardware address field as colon-separated hex pairs.
    pub fn mac(mut self, key: &str, octets: &[u8]) -> Self {
        encode::append_key(&mut self.buf, key);
        encode::append_mac(&mut self.buf, octets);
        self
    }

    /// Add a nested object built from a dict.
    pub fn dict(mut self, key: &str, value: Dict) -> Self {
        encode::append_key(&mut self.buf, key);
        value.write_wrapped(&mut self.buf);
        self
    }

    /// Add a nested array built from an array builder.
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

    /// Add a value exposing the array capability as a nested array.
    pub fn array_of<T: ArrayEncode + ?Sized>(mut self, key: &str, value: &T) -> Self {
        encode::append_key(&mut self.buf, key);
        value.encode_array(Arr::new()).write_wrapped(&mut self.buf);
        self
    }

    /// Append a value's fields directly into the context, with no wrapping key.
    pub fn embed_object<T: ObjectEncode + ?Sized>(mut self, value: &T) -> Self {
        value.encode_object(Dict::new()).write_embedded(&mut self.buf);
        self
    }

    /// Add an arbitrary value via the serde fallback.
    ///
    /// A value that fails to serialize is written as a descriptive error
    /// string; the context is still usable.
    pub fn any<T: Serialize + ?Sized>(mut self, key: &str, value: &T) -> Self {
        encode::append_key(&mut self.buf, key);
        encode::append_serde(&mut self.buf, value);
        self
    }

    /// Add a sequence of key/value pairs, each value through the serde
    /// fallback, in iteration order.
    pub fn fields<I, K, V>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Serialize,
    {
        for (key, value) in entries {
            encode::append_key(&mut self.buf, key.as_ref());
            encode::append_serde(&mut self.buf, &value);
        }
        self
    }

    /// Add an `"error"` string field from any error value.
    pub fn err(self, error: &dyn std::error::Error) -> Self {
        self.str("error", &error.to_string())
    }

    /// Collapse duplicate top-level keys when the context is frozen.
    pub fn dedup(mut self) -> Self {
        self.dedup = DedupMode::Shallow;
        self
    }

    /// Collapse duplicate keys at every depth when the context is frozen.
    pub fn dedup_deep(mut self) -> Self {
        self.dedup = DedupMode::Deep;
        self
    }

    /// Freeze the accumulated fields into a new, independent logger.
    ///
    /// The parent logger is unaffected; both remain safe for concurrent use.
    pub fn logger(self) -> Logger {
        let buf = dedup::apply(self.dedup, self.buf);
        self.logger.with_context(buf)
    }
}
