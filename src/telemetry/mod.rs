//! Structured logging setup.
//!
//! The proxy emits structured logs via the `tracing` crate; this module
//! only owns the `log_config.level` → filter mapping and the subscriber
//! install, matching the scope spec.md carves out for "log formatter
//! setup" (an external collaborator, only its configuration contract
//! matters here).

pub mod logging;

pub use logging::{init_subscriber, log_level_filter};
