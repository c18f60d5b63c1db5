//! NSS database adapter: Firefox everywhere, Chromium on Linux.
//!
//! Firefox ignores the OS trust store and keeps one certificate database
//! per profile; Chromium on Linux reads the shared `~/.pki/nssdb`. There
//! can be zero, one, or many databases, and a mutation must land in all
//! of them: the aggregate is `trusted` only if every database succeeds.
//!
//! The NSS `certutil` tool may itself be missing. Installing it through a
//! package manager is an explicit opt-in; when declined the store reports
//! `unknown` with an actionable reason instead of failing silently.
//!
//! A database open in a running browser must not be mutated. The adapter
//! waits for the owning process to exit (bounded poll plus settle delay)
//! before touching anything.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use devca_core::{StoreName, StoreStatus};

use super::adapter::{CertContext, TrustStoreAdapter};
use super::detect::{
    any_path_exists, wait_for_process_exit, DetectionCache, PROCESS_EXIT_TIMEOUT,
};
use super::exec::{binary_available, run_command};
use crate::inspect::bundle_contains_certificate;

/// Homebrew install locations for unlinked nss
const BREW_NSS_PATHS: &[&str] = &[
    "/usr/local/opt/nss/bin/certutil",
    "/opt/homebrew/opt/nss/bin/certutil",
];

/// Which NSS-backed browser this adapter manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserKind {
    /// Firefox profile databases
    Firefox,
    /// Chromium's shared `~/.pki/nssdb` (Linux builds)
    Chromium,
}

impl BrowserKind {
    /// Store name this browser maps to in reports
    #[must_use]
    pub const fn store_name(self) -> StoreName {
        match self {
            Self::Firefox => StoreName::Firefox,
            Self::Chromium => StoreName::Chrome,
        }
    }

    /// Process image name to wait on before mutating
    #[must_use]
    pub const fn process_name(self) -> &'static str {
        match self {
            Self::Firefox => "firefox",
            Self::Chromium => "chrome",
        }
    }

    /// Cache key for the installed-application memo
    #[must_use]
    pub const fn detection_key(self) -> &'static str {
        match self {
            Self::Firefox => "firefox-installed",
            Self::Chromium => "chromium-installed",
        }
    }

    /// Directories that may hold profile databases, relative to home
    fn profile_roots(self, home: &Path) -> Vec<PathBuf> {
        match self {
            Self::Firefox => vec![
                home.join(".mozilla/firefox"),
                home.join("Library/Application Support/Firefox/Profiles"),
                home.join("AppData/Roaming/Mozilla/Firefox/Profiles"),
            ],
            Self::Chromium => vec![home.join(".pki/nssdb")],
        }
    }

    /// Filesystem traces that mean the application is installed
    fn install_markers(self, home: &Path) -> Vec<PathBuf> {
        match self {
            Self::Firefox => {
                let mut markers = self.profile_roots(home);
                markers.push(PathBuf::from("/Applications/Firefox.app"));
                markers.push(PathBuf::from("/usr/bin/firefox"));
                markers.push(PathBuf::from("C:\\Program Files\\Mozilla Firefox"));
                markers
            }
            Self::Chromium => vec![
                home.join(".pki/nssdb"),
                PathBuf::from("/usr/bin/google-chrome"),
                PathBuf::from("/usr/bin/chromium"),
                PathBuf::from("/usr/bin/chromium-browser"),
            ],
        }
    }
}

/// One discovered certificate database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NssDatabase {
    /// Directory holding the database files
    pub dir: PathBuf,
    /// True for the legacy cert8 (dbm) format
    pub legacy: bool,
}

impl NssDatabase {
    /// Database argument as certutil expects it
    #[must_use]
    pub fn dir_arg(&self) -> String {
        let prefix = if self.legacy { "dbm" } else { "sql" };
        format!("{prefix}:{}", self.dir.display())
    }
}

/// Enumerate certificate databases under a set of profile roots.
///
/// A root that is itself a database directory (chromium's nssdb) counts;
/// otherwise each immediate subdirectory is checked (one per Firefox
/// profile).
#[must_use]
pub fn enumerate_databases(roots: &[PathBuf]) -> Vec<NssDatabase> {
    let mut found = Vec::new();
    for root in roots {
        if !root.exists() {
            continue;
        }
        if let Some(db) = database_at(root) {
            found.push(db);
            continue;
        }
        let Ok(entries) = std::fs::read_dir(root) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                if let Some(db) = database_at(&path) {
                    found.push(db);
                }
            }
        }
    }
    found
}

fn database_at(dir: &Path) -> Option<NssDatabase> {
    if dir.join("cert9.db").exists() {
        Some(NssDatabase {
            dir: dir.to_path_buf(),
            legacy: false,
        })
    } else if dir.join("cert8.db").exists() {
        Some(NssDatabase {
            dir: dir.to_path_buf(),
            legacy: true,
        })
    } else {
        None
    }
}

/// Adapter for one NSS-backed browser.
pub struct NssAdapter {
    browser: BrowserKind,
    cache: Arc<DetectionCache>,
    dynamic_install: bool,
    home: PathBuf,
}

impl NssAdapter {
    /// Adapter rooted at the real home directory.
    #[must_use]
    pub fn new(browser: BrowserKind, cache: Arc<DetectionCache>, dynamic_install: bool) -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::with_home(browser, cache, dynamic_install, home)
    }

    /// Adapter rooted at an explicit home directory (tests).
    #[must_use]
    pub fn with_home(
        browser: BrowserKind,
        cache: Arc<DetectionCache>,
        dynamic_install: bool,
        home: impl Into<PathBuf>,
    ) -> Self {
        Self {
            browser,
            cache,
            dynamic_install,
            home: home.into(),
        }
    }

    async fn app_installed(&self) -> bool {
        let browser = self.browser;
        let markers = browser.install_markers(&self.home);
        self.cache
            .get_or_probe(browser.detection_key(), || async move {
                if any_path_exists(&markers) {
                    return true;
                }
                binary_available(browser.process_name(), "--version").await
            })
            .await
    }

    /// Locate a usable NSS certutil, optionally installing it.
    async fn nss_tool(&self) -> Result<String, String> {
        if self.cache.get("nss-tool-available") == Some(true) {
            return Ok(self.resolved_tool());
        }

        if self.tool_present().await {
            self.cache.put("nss-tool-available", true);
            return Ok(self.resolved_tool());
        }

        if !self.dynamic_install {
            return Err(
                "certutil (NSS) not available; install it (brew install nss / apt install \
                 libnss3-tools) or enable nss_dynamic_install"
                    .to_string(),
            );
        }

        if cfg!(target_os = "macos") {
            info!("installing nss via homebrew (nss_dynamic_install)");
            match run_command("brew", &["install", "nss"]).await {
                Ok(out) if out.success => {
                    self.cache.put("nss-tool-available", true);
                    return Ok(self.resolved_tool());
                }
                Ok(out) => return Err(format!("brew install nss failed: {}", out.diagnostic())),
                Err(e) => return Err(format!("homebrew not available: {e}")),
            }
        }

        Err(
            "certutil (NSS) not available and dynamic install is unsupported on this \
             platform; install libnss3-tools manually"
                .to_string(),
        )
    }

    async fn tool_present(&self) -> bool {
        if binary_available("certutil", "-H").await {
            // Windows ships its own unrelated certutil; the NSS one
            // understands -H without erroring out on spawn either way,
            // so presence on PATH is good enough off-Windows.
            if !cfg!(windows) {
                return true;
            }
        }
        BREW_NSS_PATHS.iter().any(|p| Path::new(p).exists())
    }

    fn resolved_tool(&self) -> String {
        for p in BREW_NSS_PATHS {
            if Path::new(p).exists() {
                return (*p).to_string();
            }
        }
        "certutil".to_string()
    }

    fn databases(&self) -> Vec<NssDatabase> {
        enumerate_databases(&self.browser.profile_roots(&self.home))
    }

    async fn db_contains(
        &self,
        tool: &str,
        db: &NssDatabase,
        cert: &CertContext,
    ) -> Result<bool, String> {
        let dir_arg = db.dir_arg();
        let out = run_command(
            tool,
            &["-L", "-d", &dir_arg, "-n", &cert.common_name, "-a"],
        )
        .await
        .map_err(|e| e.to_string())?;
        if !out.success {
            // Unknown nickname exits non-zero; that is a clean absent.
            return Ok(false);
        }
        Ok(bundle_contains_certificate(&out.stdout, &cert.certificate_pem))
    }

    /// Block mutation until the owning browser has exited.
    async fn ensure_browser_closed(&self) -> Result<(), String> {
        let process = self.browser.process_name();
        if wait_for_process_exit(process, PROCESS_EXIT_TIMEOUT).await {
            Ok(())
        } else {
            Err(format!(
                "{process} is still running; close it so its certificate database can be \
                 modified safely"
            ))
        }
    }
}

#[async_trait]
impl TrustStoreAdapter for NssAdapter {
    fn name(&self) -> StoreName {
        self.browser.store_name()
    }

    async fn query(&self, cert: &CertContext) -> StoreStatus {
        if !self.app_installed().await {
            return StoreStatus::other(format!(
                "{} not installed",
                self.browser.process_name()
            ));
        }
        let tool = match self.nss_tool().await {
            Ok(t) => t,
            Err(e) => return StoreStatus::unknown(e),
        };

        let databases = self.databases();
        if databases.is_empty() {
            return StoreStatus::not_trusted("no NSS profile databases found");
        }

        for db in &databases {
            match self.db_contains(&tool, db, cert).await {
                Ok(true) => {}
                Ok(false) => {
                    return StoreStatus::not_trusted(format!(
                        "certificate absent or outdated in {}",
                        db.dir.display()
                    ))
                }
                Err(e) => return StoreStatus::unknown(format!("certutil query failed: {e}")),
            }
        }
        StoreStatus::trusted(format!(
            "certificate present in all {} profile database(s)",
            databases.len()
        ))
    }

    async fn add(&self, cert: &CertContext) -> StoreStatus {
        if !self.app_installed().await {
            return StoreStatus::other(format!(
                "{} not installed",
                self.browser.process_name()
            ));
        }
        let tool = match self.nss_tool().await {
            Ok(t) => t,
            Err(e) => return StoreStatus::unknown(e),
        };
        let databases = self.databases();
        if databases.is_empty() {
            return StoreStatus::not_trusted("no NSS profile databases found");
        }
        if let Err(e) = self.ensure_browser_closed().await {
            return StoreStatus::unknown(e);
        }

        let path = cert.certificate_path.to_string_lossy().into_owned();
        let mut added = 0_usize;
        for db in &databases {
            match self.db_contains(&tool, db, cert).await {
                Ok(true) => continue,
                Ok(false) | Err(_) => {}
            }
            let dir_arg = db.dir_arg();
            let out = match run_command(
                &tool,
                &[
                    "-A",
                    "-d",
                    &dir_arg,
                    "-t",
                    "C,,",
                    "-n",
                    &cert.common_name,
                    "-i",
                    &path,
                ],
            )
            .await
            {
                Ok(out) => out,
                Err(e) => return StoreStatus::unknown(format!("certutil not runnable: {e}")),
            };
            if !out.success {
                warn!(db = %db.dir.display(), diagnostic = %out.diagnostic(), "nss add failed");
                return StoreStatus::not_trusted(format!(
                    "add failed for {}: {}",
                    db.dir.display(),
                    out.diagnostic()
                ));
            }
            added += 1;
        }
        debug!(added, total = databases.len(), "nss databases updated");
        StoreStatus::trusted(format!(
            "certificate trusted in all {} profile database(s)",
            databases.len()
        ))
    }

    async fn remove(&self, cert: &CertContext) -> StoreStatus {
        if !self.app_installed().await {
            return StoreStatus::other(format!(
                "{} not installed",
                self.browser.process_name()
            ));
        }
        let tool = match self.nss_tool().await {
            Ok(t) => t,
            Err(e) => return StoreStatus::unknown(e),
        };
        let databases = self.databases();
        if databases.is_empty() {
            return StoreStatus::not_trusted("no NSS profile databases found");
        }
        if let Err(e) = self.ensure_browser_closed().await {
            return StoreStatus::unknown(e);
        }

        for db in &databases {
            match self.db_contains(&tool, db, cert).await {
                Ok(false) => continue,
                Ok(true) | Err(_) => {}
            }
            let dir_arg = db.dir_arg();
            let out = match run_command(
                &tool,
                &["-D", "-d", &dir_arg, "-n", &cert.common_name],
            )
            .await
            {
                Ok(out) => out,
                Err(e) => return StoreStatus::unknown(format!("certutil not runnable: {e}")),
            };
            if !out.success {
                return StoreStatus::unknown(format!(
                    "remove failed for {}: {}",
                    db.dir.display(),
                    out.diagnostic()
                ));
            }
        }
        StoreStatus::not_trusted("certificate removed from profile databases")
    }
}
