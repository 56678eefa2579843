//! Observability subsystem.
//!
//! Configuration code emits `tracing` events (`debug` summaries of decode and
//! validation, `warn` for ignored values); `logging.rs` installs the
//! subscriber that renders them.

pub mod logging;
