//! Lifecycle event reporting.
//!
//! The reconciler takes its logger as an explicit [`EventSink`] dependency
//! instead of writing to shared process-wide output state.

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
