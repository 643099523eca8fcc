//! fieldlog-core: allocation-conscious structured JSON logging.
//!
//! This library is the field-encoding and event-construction core of a
//! structured logger: a fluent chain of typed field additions becomes one
//! well-formed JSON record, written to a byte sink in a single call.
//!
//! # Features
//!
//! - **Hand-rolled field encoder**: typed values become `"key":value` bytes
//!   directly in the record buffer, no intermediate value tree
//! - **Immutable loggers**: every derivation returns a new value, so loggers
//!   are shared across threads without locking
//! - **Pooled events**: per-call buffers come from a bounded reuse pool;
//!   steady-state logging allocates nothing
//! - **Level and sampling gates**: filtered calls cost only the decision
//! - **Hook pipeline**: ordered mutators that add fields between the user's
//!   fields and the message
//! - **Duplicate-key collapsing**: shallow and deep byte-span rewrites that
//!   keep the last value at the first position, without re-parsing
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use fieldlog_core::prelude::*;
//!
//! let log = Logger::new(StdoutSink)
//!     .with()
//!     .str("service", "billing")
//!     .logger();
//!
//! log.info().str("order", "ord-17").msg("charge accepted");
//! // {"level":"info","service":"billing","order":"ord-17","message":"charge accepted"}
//! ```
//!
//! # Module Organization
//!
//! - [`encode`]: low-level typed field encoding into record buffers
//! - [`level`]: severity levels and threshold ordering
//! - [`object`]: `Dict`/`Arr` sub-builders and the embedding capabilities
//! - [`context`]: context builder for deriving loggers
//! - [`logger`]: immutable logger values and entry points
//! - [`event`]: single-use, pooled record builders
//! - [`sampler`]: pass/drop sampling
//! - [`hook`]: ordered event mutators
//! - [`dedup`]: duplicate-key collapsing engine
//! - [`sink`]: the byte sink boundary
//! - [`error`]: typed error handling

pub mod context;
pub mod dedup;
pub mod encode;
pub mod error;
pub mod event;
pub mod hook;
pub mod level;
pub mod logger;
pub mod object;
pub mod prelude;
pub mod sampler;
pub mod sink;

mod pool;

// ============================================================================
// Explicit Re-exports (avoiding glob imports for clear API surface)
// ============================================================================

// Logger surface
pub use context::Context;
pub use event::Event;
pub use level::Level;
pub use logger::Logger;

// Gating
pub use hook::Hook;
pub use sampler::{BasicSampler, Sampler};

// Nested values and capabilities
pub use object::{Arr, ArrayEncode, Dict, ObjectEncode};

// Dedup engine
pub use dedup::{dedup, dedup_deep, DedupMode};

// Encoding formats
pub use encode::{DurationFormat, TimeFormat};

// Sinks
pub use sink::{CaptureSink, Sink, StderrSink, StdoutSink, SyncWriter};

// Error types
pub use error::{FieldlogError, FieldlogResult};
