//! Application detection and the browser-exit wait primitive.
//!
//! Detection results are memoized in an explicit [`DetectionCache`] that
//! is created per run and passed by reference into the engine, so tests
//! can simulate "browser installed" vs "not installed" without
//! cross-test leakage.

use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::{sleep, timeout};
use tracing::{debug, info};

use super::exec::run_command;

/// How often to re-check whether a browser process has exited
pub const PROCESS_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// How long to wait for a browser to exit before giving up
pub const PROCESS_EXIT_TIMEOUT: Duration = Duration::from_secs(60);

/// Settle delay after the process disappears, before touching its
/// databases
pub const PROCESS_SETTLE_DELAY: Duration = Duration::from_millis(1000);

/// Per-run memo of boolean detection facts keyed by a stable string.
///
/// `Other` (application not installed) is terminal for a
/// (machine, application) pair within one process run; the cache is what
/// makes that invariant hold without hidden module-level state.
#[derive(Debug, Default)]
pub struct DetectionCache {
    inner: Mutex<HashMap<String, bool>>,
}

impl DetectionCache {
    /// Empty cache
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a memoized fact
    #[must_use]
    pub fn get(&self, key: &str) -> Option<bool> {
        self.inner.lock().ok().and_then(|m| m.get(key).copied())
    }

    /// Record a fact
    pub fn put(&self, key: &str, value: bool) {
        if let Ok(mut m) = self.inner.lock() {
            m.insert(key.to_string(), value);
        }
    }

    /// Memoize the result of an async probe
    pub async fn get_or_probe<F, Fut>(&self, key: &str, probe: F) -> bool
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = bool>,
    {
        if let Some(cached) = self.get(key) {
            return cached;
        }
        let value = probe().await;
        self.put(key, value);
        value
    }
}

/// True if any of the given paths exists.
#[must_use]
pub fn any_path_exists(paths: &[PathBuf]) -> bool {
    paths.iter().any(|p| p.exists())
}

/// Check whether a process with the given name is currently running.
pub async fn is_process_running(name: &str) -> bool {
    if cfg!(windows) {
        // tasklist prints the image name when at least one match exists
        match run_command("tasklist", &["/FI", &format!("IMAGENAME eq {name}.exe")]).await {
            Ok(out) => out.success && out.stdout.to_lowercase().contains(&name.to_lowercase()),
            Err(_) => false,
        }
    } else {
        match run_command("pgrep", &["-x", name]).await {
            Ok(out) => out.success,
            Err(_) => false,
        }
    }
}

/// Wait for the named process to exit, polling at a fixed interval.
///
/// Returns `true` when the process is gone (after the settle delay),
/// `false` when it is still running at the deadline. Cancellable: the
/// whole wait is bounded by `deadline`, and the caller holds no locks
/// while waiting.
pub async fn wait_for_process_exit(name: &str, deadline: Duration) -> bool {
    let waited = timeout(deadline, async {
        while is_process_running(name).await {
            debug!(process = name, "waiting for process to exit");
            sleep(PROCESS_POLL_INTERVAL).await;
        }
    })
    .await;

    match waited {
        Ok(()) => {
            // Give the browser a moment to flush and close its databases.
            sleep(PROCESS_SETTLE_DELAY).await;
            true
        }
        Err(_) => {
            info!(process = name, "process still running at deadline");
            false
        }
    }
}
