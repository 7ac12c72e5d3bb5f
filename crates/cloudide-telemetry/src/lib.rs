#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

//! Telemetry primitives shared across the Cloud IDE web workspace.
//!
//! Layout: `init.rs` (subscriber installation), `context.rs` (process span),
//! `metrics.rs` (Prometheus counters for the dev server), `error.rs`
//! (`TelemetryError`).

pub mod context;
pub mod error;
pub mod init;
pub mod metrics;

pub use context::{RUNTIME_SPAN, RuntimeContext};
pub use error::{Result, TelemetryError};
pub use init::{
    DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, build_sha, init_logging, log_format_from_str,
};
pub use metrics::{Metrics, MetricsSnapshot};
