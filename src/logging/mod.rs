//! Structured logging for the binary and a tracing-backed detection observer.

mod format;
mod observer;

pub use format::StructuredLogger;
pub use observer::TracingObserver;
