#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

//! Client runtime for the Cloud IDE portal.
//!
//! Layout: `client.rs` (shared HTTP client), `interceptor.rs` (middleware
//! chain), `auth.rs` / `guard.rs` (bearer token and failure-status stages),
//! `session.rs`, `navigation.rs`, `notify.rs` (collaborators the stages act
//! on), `api.rs` (typed portal calls), `date.rs` (display formatting).

pub mod api;
pub mod auth;
pub mod client;
pub mod date;
pub mod error;
pub mod guard;
pub mod i18n;
pub mod interceptor;
pub mod navigation;
pub mod notify;
pub mod request;
pub mod session;

pub use api::{Envelope, PortalApi, PortalCode};
pub use auth::BearerTokenInterceptor;
pub use client::{ClientServices, HttpClient, HttpClientBuilder};
pub use date::{display_date, format_date, format_date_in};
pub use error::{ClientError, ClientResult};
pub use guard::StatusGuard;
pub use i18n::{LocaleCode, TranslationBundle};
pub use interceptor::{InterceptorChain, LoggingInterceptor, RequestInterceptor, ResponseInterceptor};
pub use navigation::{LOGIN_ROUTE, MemoryRouter, Navigator};
pub use notify::{Notification, NotificationCenter, NotificationKind, Notifier};
pub use request::{ApiResponse, RequestDescriptor};
pub use session::{MemorySessionStore, SESSION_TOKEN_KEY, SessionStore, session_token};
