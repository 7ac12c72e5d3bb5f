#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

//! Build-mode aware configuration for the Cloud IDE web client.
//!
//! Layout: `model.rs` (build mode, client endpoints, public path),
//! `devserver.rs` (reverse-proxy and static asset settings), `validate.rs`
//! (field checks), `defaults.rs` (baked-in origins and ports).

pub mod defaults;
pub mod devserver;
pub mod error;
pub mod model;
pub mod validate;

pub use devserver::{DevServerConfig, ProxyRoute};
pub use error::{ConfigError, ConfigResult};
pub use model::{BuildMode, ClientEndpoints, public_path, resolve_client_endpoints};
