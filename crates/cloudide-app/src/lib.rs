#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    unreachable_pub,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

//! Cloud IDE bootstrap wiring.
//!
//! Layout: `settings.rs` (environment and flags), `bootstrap.rs` (client
//! mount and dev-server assembly), `error.rs` (`AppError`).

/// Client mount and dev-server assembly.
pub mod bootstrap;
/// Application error types.
pub mod error;
/// Environment and command-line settings.
pub mod settings;

pub use bootstrap::{Application, Runtime, assemble, load_devserver_config, run_app};
pub use error::{AppError, AppResult};
pub use settings::{AppSettings, Cli};
