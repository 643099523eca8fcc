//! Single-use record builders.
//!
//! An `Event` is owned by exactly one execution context from creation
//! through finalization. Its buffer comes from the shared reuse pool, is
//! seeded with the level field and the owning logger's context bytes, and
//! goes back to the pool when the event drops.
//!
//! Finalization (`msg`/`send`) is terminal: it runs the hook pipeline,
//! appends the message field, applies the requested dedup pass over the
//! whole buffer, and writes the wrapped record to the sink in one call. A
//! sent flag makes any further mutation a no-op, second finalizes included,
//! so the pool is never corrupted and nothing is written twice.
//!
//! A call filtered out by level or sampling yields a *dead* event: a
//! degenerate instance with no buffer, whose every operation is a no-op.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::dedup::{self, DedupMode};
use crate::encode::{self, DurationFormat, TimeFormat};
use crate::error::{FieldlogError, FieldlogResult};
use crate::hook::Hook;
use crate::level::Level;
use crate::object::{Arr, ArrayEncode, Dict, ObjectEncode};
use crate::pool;
use crate::sink::Sink;

/// Builder for one log record.
pub struct Event {
    buf: Vec<u8>,
    level: Level,
    dedup: DedupMode,
    enabled: bool,
    sent: bool,
    finalizing: bool,
    sink: Option<Arc<dyn Sink>>,
    hooks: Arc<[Arc<dyn Hook>]>,
    time_format: TimeFormat,
    duration_format: DurationFormat,
}

impl Event {
    /// A live event seeded with the level field and the context bytes.
    pub(crate) fn live(
        level: Level,
        context: &[u8],
        sink: Arc<dyn Sink>,
        hooks: Arc<[Arc<dyn Hook>]>,
        time_format: TimeFormat,
        duration_format: DurationFormat,
    ) -> Self {
        let mut buf = pool::checkout();
        if level.is_levelled() {
            encode::append_key(&mut buf, "level");
            encode::append_json_string(&mut buf, level.as_str());
        }
        if !context.is_empty() {
            if !buf.is_empty() {
                buf.push(b',');
            }
            buf.extend_from_slice(context);
        }
        Self {
            buf,
            level,
            dedup: DedupMode::Off,
            enabled: true,
            sent: false,
            finalizing: false,
            sink: Some(sink),
            hooks,
            time_format,
            duration_format,
        }
    }

    /// A dead event: level-filtered or sampled out. Holds no buffer and
    /// performs no work.
    pub(crate) fn dead(level: Level) -> Self {
        Self {
            buf: Vec::new(),
            level,
            dedup: DedupMode::Off,
            enabled: false,
            sent: false,
            finalizing: false,
            sink: None,
            hooks: Arc::from(Vec::new()),
            time_format: TimeFormat::default(),
            duration_format: DurationFormat::default(),
        }
    }

    /// Whether this event will produce a record when finalized.
    pub fn is_enabled(&self) -> bool {
        self.enabled && !self.sent
    }

    #[inline]
    fn live_mut(&mut self) -> Option<&mut Vec<u8>> {
        if self.enabled && !self.sent {
            Some(&mut self.buf)
        } else {
            None
        }
    }

    /// Add a string field.
    pub fn str(&mut self, key: &str, value: &str) -> &mut Self {
        if let Some(buf) = self.live_mut() {
            encode::append_key(buf, key);
            encode::append_json_string(buf, value);
        }
        self
    }

    /// Add a signed integer field.
    pub fn int(&mut self, key: &str, value: i64) -> &mut Self {
        if let Some(buf) = self.live_mut() {
            encode::append_key(buf, key);
            encode::append_i64(buf, value);
        }
        self
    }

    /// Add an unsigned integer field.
    pub fn uint(&mut self, key: &str, value: u64) -> &mut Self {
        if let Some(buf) = self.live_mut() {
            encode::append_key(buf, key);
            encode::append_u64(buf, value);
        }
        self
    }

    /// Add a float field.
    pub fn float(&mut self, key: &str, value: f64) -> &mut Self {
        if let Some(buf) = self.live_mut() {
            encode::append_key(buf, key);
            encode::append_f64(buf, value);
        }
        self
    }

    /// Add a boolean field.
    pub fn bool(&mut self, key: &str, value: bool) -> &mut Self {
        if let Some(buf) = self.live_mut() {
            encode::append_key(buf, key);
            encode::append_bool(buf, value);
        }
        self
    }

    /// Add a timestamp field in the owning logger's time format.
    pub fn time(&mut self, key: &str, value: &DateTime<Utc>) -> &mut Self {
        let format = self.time_format;
        if let Some(buf) = self.live_mut() {
            encode::append_key(buf, key);
            encode::append_time(buf, value, format);
        }
        self
    }

    /// Add a `"time"` field holding the current UTC time.
    pub fn timestamp(&mut self) -> &mut Self {
        let now = Utc::now();
        self.time("time", &now)
    }

    /// Add a duration field in the owning logger's duration format.
    pub fn dur(&mut self, key: &str, value: Duration) -> &mut Self {
        let format = self.duration_format;
        if let Some(buf) = self.live_mut() {
            encode::append_key(buf, key);
            encode::append_duration(buf, value, format);
        }
        self
    }

    /// Add an array of durations in the owning logger's duration format.
    pub fn durs(&mut self, key: &str, values: &[Duration]) -> &mut Self {
        let format = self.duration_format;
        if let Some(buf) = self.live_mut() {
            encode::append_key(buf, key);
            buf.push(b'[');
            for (i, &value) in values.iter().enumerate() {
                if i > 0 {
                    buf.push(b',');
                }
                encode::append_duration(buf, value, format);
            }
            buf.push(b']');
        }
        self
    }

    /// Add an IP address field in canonical textual form.
    pub fn ip(&mut self, key: &str, value: IpAddr) -> &mut Self {
        if let Some(buf) = self.live_mut() {
            encode::append_key(buf, key);
            encode::append_ip(buf, value);
        }
        self
    }

    /// Add a CIDR prefix field (`address/len`).
    pub fn ip_prefix(&mut self, key: &str, addr: IpAddr, prefix_len: u8) -> &mut Self {
        if let Some(buf) = self.live_mut() {
            encode::append_key(buf, key);
            encode::append_ip_prefix(buf, addr, prefix_len);
        }
        self
    }

    /// Add a hardware address field as colon-separated hex pairs.
    pub fn mac(&mut self, key: &str, octets: &[u8]) -> &mut Self {
        if let Some(buf) = self.live_mut() {
            encode::append_key(buf, key);
            encode::append_mac(buf, octets);
        }
        self
    }

    /// Add a nested object built from a dict.
    pub fn dict(&mut self, key: &str, value: Dict) -> &mut Self {
        if let Some(buf) = self.live_mut() {
            encode::append_key(buf, key);
            value.write_wrapped(buf);
        }
        self
    }

    /// Add a nested array built from an array builder.
    pub fn array(&mut self, key: &str, value: Arr) -> &mut Self {
        if let Some(buf) = self.live_mut() {
            encode::append_key(buf, key);
            value.write_wrapped(buf);
        }
        self
    }

    /// Add a value exposing the object capability as a nested object.
    pub fn object<T: ObjectEncode + ?Sized>(&mut self, key: &str, value: &T) -> &mut Self {
        if self.is_enabled() {
            let dict = value.encode_object(Dict::new());
            encode::append_key(&mut self.buf, key);
            dict.write_wrapped(&mut self.buf);
        }
        self
    }

    /// Add a value exposing the array capability as a nested array.
    pub fn array_of<T: ArrayEncode + ?Sized>(&mut self, key: &str, value: &T) -> &mut Self {
        if self.is_enabled() {
            let arr = value.encode_array(Arr::new());
            encode::append_key(&mut self.buf, key);
            arr.write_wrapped(&mut self.buf);
        }
        self
    }

    /// Append a value's fields directly into this record, with no wrapping key.
    pub fn embed_object<T: ObjectEncode + ?Sized>(&mut self, value: &T) -> &mut Self {
        if self.is_enabled() {
            value.encode_object(Dict::new()).write_embedded(&mut self.buf);
        }
        self
    }

    /// Add an arbitrary value via the serde fallback.
    ///
    /// A value that fails to serialize is written as a descriptive error
    /// string; the record is still produced.
    pub fn any<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> &mut Self {
        if let Some(buf) = self.live_mut() {
            encode::append_key(buf, key);
            encode::append_serde(buf, value);
        }
        self
    }

    /// Add a sequence of key/value pairs, each value through the serde
    /// fallback, in iteration order.
    pub fn fields<I, K, V>(&mut self, entries: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Serialize,
    {
        if self.is_enabled() {
            for (key, value) in entries {
                encode::append_key(&mut self.buf, key.as_ref());
                encode::append_serde(&mut self.buf, &value);
            }
        }
        self
    }

    /// Add an `"error"` string field from any error value.
    pub fn err(&mut self, error: &dyn std::error::Error) -> &mut Self {
        self.str("error", &error.to_string())
    }

    /// Collapse duplicate top-level keys when this event is finalized.
    pub fn dedup(&mut self) -> &mut Self {
        if self.is_enabled() {
            self.dedup = DedupMode::Shallow;
        }
        self
    }

    /// Collapse duplicate keys at every depth when this event is finalized.
    pub fn dedup_deep(&mut self) -> &mut Self {
        if self.is_enabled() {
            self.dedup = DedupMode::Deep;
        }
        self
    }

    /// Finalize with a message, discarding any sink error.
    ///
    /// A caller that cares about delivery uses [`Event::try_msg`] instead.
    pub fn msg(&mut self, message: &str) {
        let _ = self.try_msg(message);
    }

    /// Finalize with an empty message, discarding any sink error.
    pub fn send(&mut self) {
        let _ = self.try_msg("");
    }

    /// Finalize with a message, reporting the sink's verdict.
    ///
    /// Runs the hook pipeline, appends the message field last, applies the
    /// requested dedup pass over the whole buffer, and writes the wrapped
    /// record to the sink in a single call. Calling this twice, or on a
    /// dead event, is a no-op returning `Ok`.
    pub fn try_msg(&mut self, message: &str) -> FieldlogResult<()> {
        if !self.enabled || self.sent || self.finalizing {
            return Ok(());
        }
        // Guards re-entry from a hook that calls a finalizer on the event it
        // was handed, while still allowing field appends from hooks.
        self.finalizing = true;

        // Hooks run after all user fields and before the message, so their
        // fields land between the event fields and the message.
        let hooks = Arc::clone(&self.hooks);
        let level = self.level;
        for hook in hooks.iter() {
            hook.run(self, level, message);
        }
        self.sent = true;

        encode::append_key(&mut self.buf, "message");
        encode::append_json_string(&mut self.buf, message);

        if self.dedup != DedupMode::Off {
            let buf = std::mem::take(&mut self.buf);
            self.buf = dedup::apply(self.dedup, buf);
        }

        let mut record = Vec::with_capacity(self.buf.len() + 3);
        record.push(b'{');
        record.extend_from_slice(&self.buf);
        record.push(b'}');
        record.push(b'\n');

        let Some(sink) = &self.sink else {
            return Ok(());
        };
        let written = sink.write_record(&record).map_err(FieldlogError::from)?;
        if written < record.len() {
            return Err(FieldlogError::short_write(written, record.len()));
        }
        Ok(())
    }
}

impl std::fmt::Debug for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Event")
            .field("level", &self.level)
            .field("enabled", &self.enabled)
            .field("sent", &self.sent)
            .field("buffered_bytes", &self.buf.len())
            .finish()
    }
}

impl Drop for Event {
    fn drop(&mut self) {
        if self.enabled {
            pool::restore(std::mem::take(&mut self.buf));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::Logger;
    use crate::sink::CaptureSink;

    #[test]
    fn test_double_finalize_writes_once() {
        let sink = CaptureSink::new();
        let log = Logger::new(sink.clone());
        let mut event = log.info();
        event.str("a", "1");
        event.msg("first");
        event.str("b", "2");
        event.msg("second");
        assert_eq!(sink.write_count(), 1);
        assert_eq!(
            sink.contents(),
            "{\"level\":\"info\",\"a\":\"1\",\"message\":\"first\"}\n"
        );
    }

    #[test]
    fn test_hook_calling_finalizer_does_not_reenter() {
        let sink = CaptureSink::new();
        let log = Logger::new(sink.clone()).hook(
            |event: &mut Event, _level: Level, _msg: &str| {
                event.str("from_hook", "yes");
                // A finalizer call from inside the pipeline must be inert.
                event.msg("hijacked");
            },
        );
        log.info().str("a", "1").msg("outer");
        assert_eq!(sink.write_count(), 1);
        assert_eq!(
            sink.contents(),
            "{\"level\":\"info\",\"a\":\"1\",\"from_hook\":\"yes\",\"message\":\"outer\"}\n"
        );
    }

    #[test]
    fn test_dead_event_is_all_noops() {
        let mut event = Event::dead(Level::Info);
        event.str("a", "1").int("n", 2);
        assert!(!event.is_enabled());
        assert!(event.try_msg("dropped").is_ok());
    }

    #[test]
    fn test_send_emits_empty_message() {
        let sink = CaptureSink::new();
        let log = Logger::new(sink.clone());
        log.info().str("foo", "bar").send();
        assert_eq!(
            sink.contents(),
            "{\"level\":\"info\",\"foo\":\"bar\",\"message\":\"\"}\n"
        );
    }

    #[test]
    fn test_try_msg_surfaces_sink_failure() {
        struct FailSink;
        impl Sink for FailSink {
            fn write_record(&self, _: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone"))
            }
        }
        let log = Logger::new(FailSink);
        let err = log.info().try_msg("lost").unwrap_err();
        assert!(matches!(err, FieldlogError::Sink { .. }));
    }

    #[test]
    fn test_try_msg_surfaces_short_write() {
        struct HalfSink;
        impl Sink for HalfSink {
            fn write_record(&self, record: &[u8]) -> std::io::Result<usize> {
                Ok(record.len() / 2)
            }
        }
        let log = Logger::new(HalfSink);
        let err = log.info().try_msg("truncated").unwrap_err();
        assert!(matches!(err, FieldlogError::ShortWrite { .. }));
    }
}
