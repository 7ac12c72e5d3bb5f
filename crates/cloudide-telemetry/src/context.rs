//! Process-wide `runtime` span.
//!
//! Every event logged while the guard is alive nests under one span carrying
//! the build mode, the public asset path and the build SHA. The span is owned
//! by the guard and closes when it drops.

use tracing::Span;
use tracing::span::EnteredSpan;

use crate::init::build_sha;

/// Name of the process-wide span.
pub const RUNTIME_SPAN: &str = "runtime";

/// Keeps the `runtime` span entered until dropped.
#[must_use = "the runtime span closes when the context is dropped"]
pub struct RuntimeContext {
    entered: EnteredSpan,
}

impl RuntimeContext {
    /// Open and enter the `runtime` span for `mode` served at `public_path`.
    pub fn enter(mode: &str, public_path: &str) -> Self {
        let span = tracing::info_span!(
            RUNTIME_SPAN,
            mode = %mode,
            public_path = %public_path,
            build_sha = %build_sha(),
        );
        Self {
            entered: span.entered(),
        }
    }

    /// The entered span.
    #[must_use]
    pub fn span(&self) -> &Span {
        &self.entered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_span_is_current_while_entered() {
        let subscriber = tracing_subscriber::registry();
        tracing::subscriber::with_default(subscriber, || {
            let context = RuntimeContext::enter("development", "/");
            let metadata = context.span().metadata().expect("span is enabled");
            assert_eq!(metadata.name(), RUNTIME_SPAN);
            for field in ["mode", "public_path", "build_sha"] {
                assert!(metadata.fields().field(field).is_some(), "{field}");
            }
            assert_eq!(Span::current().id(), context.span().id());

            drop(context);
            assert!(Span::current().is_none());
        });
    }
}
