//! Immutable, shareable logger values.
//!
//! A `Logger` bundles frozen context bytes, a minimum level, an optional
//! sampler, an ordered hook list, and a sink reference. It is fully
//! immutable after construction: every derivation (`with`, `level`,
//! `sample`, `hook`, `output`) returns a new value referencing new or
//! shared-immutable data, never mutating the receiver. That makes cloning
//! cheap (reference-count bumps) and sharing across threads lock-free.

use std::fmt;
use std::io;
use std::sync::Arc;

use crate::context::Context;
use crate::encode::{DurationFormat, TimeFormat};
use crate::event::Event;
use crate::hook::Hook;
use crate::level::Level;
use crate::sampler::Sampler;
use crate::sink::Sink;

/// Handle for emitting structured records to one sink.
#[derive(Clone)]
pub struct Logger {
    sink: Arc<dyn Sink>,
    context: Arc<[u8]>,
    level: Level,
    sampler: Option<Arc<dyn Sampler>>,
    hooks: Arc<[Arc<dyn Hook>]>,
    time_format: TimeFormat,
    duration_format: DurationFormat,
}

impl Logger {
    /// Create a logger writing to `sink` with an empty context and the
    /// lowest threshold (everything passes).
    pub fn new<S: Sink + 'static>(sink: S) -> Self {
        Self {
            sink: Arc::new(sink),
            context: Arc::from(Vec::new()),
            level: Level::Trace,
            sampler: None,
            hooks: Arc::from(Vec::new()),
            time_format: TimeFormat::default(),
            duration_format: DurationFormat::default(),
        }
    }

    /// Derive a logger writing to a different sink.
    pub fn output<S: Sink + 'static>(&self, sink: S) -> Logger {
        let mut derived = self.clone();
        derived.sink = Arc::new(sink);
        derived
    }

    /// Derive a logger with a new minimum level.
    pub fn level(&self, level: Level) -> Logger {
        let mut derived = self.clone();
        derived.level = level;
        derived
    }

    /// Derive a logger gated by `sampler`.
    ///
    /// The sampler's state (e.g. a call counter) is shared by the derived
    /// logger and all of its clones.
    pub fn sample<S: Sampler + 'static>(&self, sampler: S) -> Logger {
        let mut derived = self.clone();
        derived.sampler = Some(Arc::new(sampler));
        derived
    }

    /// Derive a logger with `hook` appended to the hook pipeline.
    pub fn hook<H: Hook + 'static>(&self, hook: H) -> Logger {
        let mut hooks: Vec<Arc<dyn Hook>> = self.hooks.to_vec();
        hooks.push(Arc::new(hook));
        let mut derived = self.clone();
        derived.hooks = Arc::from(hooks);
        derived
    }

    /// Derive a logger whose timestamp fields use `format`.
    pub fn time_format(&self, format: TimeFormat) -> Logger {
        let mut derived = self.clone();
        derived.time_format = format;
        derived
    }

    /// Derive a logger whose duration fields use `format`.
    pub fn duration_format(&self, format: DurationFormat) -> Logger {
        let mut derived = self.clone();
        derived.duration_format = format;
        derived
    }

    /// Start a context builder over a private copy of this logger's bytes.
    pub fn with(&self) -> Context {
        Context::new(self.clone())
    }

    /// Event at trace level.
    pub fn trace(&self) -> Event {
        self.new_event(Level::Trace)
    }

    /// Event at debug level.
    pub fn debug(&self) -> Event {
        self.new_event(Level::Debug)
    }

    /// Event at info level.
    pub fn info(&self) -> Event {
        self.new_event(Level::Info)
    }

    /// Event at warn level.
    pub fn warn(&self) -> Event {
        self.new_event(Level::Warn)
    }

    /// Event at error level.
    pub fn error(&self) -> Event {
        self.new_event(Level::Error)
    }

    /// Event at fatal level.
    ///
    /// Emits the record only; terminating the process is the caller's
    /// decision, not this core's.
    pub fn fatal(&self) -> Event {
        self.new_event(Level::Fatal)
    }

    /// Event with no level field.
    ///
    /// Bypasses the threshold check entirely but still passes the sampler.
    pub fn log(&self) -> Event {
        self.new_event(Level::NoLevel)
    }

    /// Event at an explicit level, threshold-gated like the per-severity
    /// entry points.
    pub fn with_level(&self, level: Level) -> Event {
        self.new_event(level)
    }

    /// Debug-level shorthand: emit `message` with no extra fields.
    pub fn print(&self, message: &str) {
        self.debug().msg(message);
    }

    pub(crate) fn context_bytes(&self) -> &[u8] {
        &self.context
    }

    pub(crate) fn formats(&self) -> (TimeFormat, DurationFormat) {
        (self.time_format, self.duration_format)
    }

    /// Derive a logger with `buf` as its frozen context.
    pub(crate) fn with_context(&self, buf: Vec<u8>) -> Logger {
        let mut derived = self.clone();
        derived.context = Arc::from(buf);
        derived
    }

    fn level_enabled(&self, level: Level) -> bool {
        self.level != Level::Disabled && level != Level::Disabled && level >= self.level
    }

    fn new_event(&self, level: Level) -> Event {
        if level != Level::NoLevel && !self.level_enabled(level) {
            return Event::dead(level);
        }
        if let Some(sampler) = &self.sampler {
            if !sampler.sample(level) {
                return Event::dead(level);
            }
        }
        Event::live(
            level,
            &self.context,
            Arc::clone(&self.sink),
            Arc::clone(&self.hooks),
            self.time_format,
            self.duration_format,
        )
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("level", &self.level)
            .field("context_bytes", &self.context.len())
            .field("hooks", &self.hooks.len())
            .field("sampled", &self.sampler.is_some())
            .finish()
    }
}

/// Adapter for foreign text loggers: each write becomes one record with no
/// level field, with a single trailing newline trimmed from the message.
impl io::Write for Logger {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = buf.len();
        let message = match buf.last() {
            Some(b'\n') => &buf[..n - 1],
            _ => buf,
        };
        self.log().msg(&String::from_utf8_lossy(message));
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
