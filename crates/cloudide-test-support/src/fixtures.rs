//! Test fixtures: ephemeral HTTP servers, temporary static sites and
//! deterministic environment lookups.

use std::collections::HashMap;
use std::fs;
use std::net::SocketAddr;

use axum::Router;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Router served on a loopback port; aborted when dropped.
#[derive(Debug)]
pub struct SpawnedServer {
    /// Bound address.
    pub addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl SpawnedServer {
    /// `http://` base URL for the server, without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for SpawnedServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Serve `router` on `127.0.0.1:0` in a background task.
///
/// # Errors
///
/// Returns an error when the loopback listener cannot be bound.
pub async fn spawn_router(router: Router) -> anyhow::Result<SpawnedServer> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let handle = tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    Ok(SpawnedServer { addr, handle })
}

/// Loopback address nothing is listening on.
///
/// # Errors
///
/// Returns an error when a probe listener cannot be bound.
pub fn unused_addr() -> anyhow::Result<SocketAddr> {
    let probe = std::net::TcpListener::bind("127.0.0.1:0")?;
    Ok(probe.local_addr()?)
}

/// Temporary directory populated with `(relative path, contents)` pairs.
///
/// # Errors
///
/// Returns an error when a file or parent directory cannot be written.
pub fn static_site(files: &[(&str, &str)]) -> anyhow::Result<TempDir> {
    let dir = tempfile::tempdir()?;
    for (path, contents) in files {
        let target = dir.path().join(path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(target, contents)?;
    }
    Ok(dir)
}

/// Environment lookup closure backed by fixed pairs.
#[must_use]
pub fn env_lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}
