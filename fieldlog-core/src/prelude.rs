//! Prelude module for convenient imports.
//!
//! Import commonly used types with a single line:
//!
//! ```rust,ignore
//! use fieldlog_core::prelude::*;
//! ```
//!
//! This provides the types needed for everyday logging without polluting
//! the namespace with rarely-used items.

// Logger surface
pub use crate::context::Context;
pub use crate::event::Event;
pub use crate::level::Level;
pub use crate::logger::Logger;

// Gating
pub use crate::hook::Hook;
pub use crate::sampler::{BasicSampler, Sampler};

// Nested values and capabilities
pub use crate::object::{Arr, ArrayEncode, Dict, ObjectEncode};

// Encoding formats
pub use crate::encode::{DurationFormat, TimeFormat};

// Sinks
pub use crate::sink::{CaptureSink, Sink, StderrSink, StdoutSink, SyncWriter};

// Errors
pub use crate::error::{FieldlogError, FieldlogResult};
