#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

//! Development server for the Cloud IDE portal bundle.
//!
//! Layout: `server.rs` (router assembly, serve loop), `proxy.rs` (reverse
//! proxy by literal prefix), `host.rs` (`Host` allow-list), `assets.rs`
//! (static bundle under the public path), `request_id.rs` (`x-request-id`
//! layers), `error.rs` (`DevServerError`).

mod assets;
pub mod error;
mod host;
mod proxy;
mod request_id;
mod server;

pub use assets::INDEX_DOCUMENT;
pub use error::{DevServerError, DevServerResult};
pub use proxy::MAX_FORWARD_BODY;
pub use server::{DevServer, HEALTH_PATH, METRICS_PATH};
