//! The uniform capability contract every trust store adapter implements.

use async_trait::async_trait;
use std::path::PathBuf;

use devca_core::{StoreName, StoreStatus};

/// Everything an adapter needs to know about the certificate being
/// reconciled.
#[derive(Debug, Clone)]
pub struct CertContext {
    /// PEM of the certificate
    pub certificate_pem: String,
    /// Path to the certificate file on disk (tools take file arguments)
    pub certificate_path: PathBuf,
    /// Subject common name, used as the store nickname
    pub common_name: String,
}

/// One trust store's query/add/remove capability.
///
/// Contract shared by every implementation:
///
/// - `query` is side-effect-free and returns `Other` immediately when the
///   owning application is not detected; no destructive action is ever
///   attempted against an undetected application.
/// - `add` is idempotent: already trusted returns `Trusted` without
///   re-adding, and repeated attempts while untrusted are safe.
/// - `remove` is idempotent: removing an absent entry returns
///   `NotTrusted`, not an error.
#[async_trait]
pub trait TrustStoreAdapter: Send + Sync {
    /// Which store this adapter manages
    fn name(&self) -> StoreName;

    /// Determine the certificate's current trust state in this store
    async fn query(&self, cert: &CertContext) -> StoreStatus;

    /// Ensure the certificate is trusted in this store
    async fn add(&self, cert: &CertContext) -> StoreStatus;

    /// Ensure the certificate is absent from this store
    async fn remove(&self, cert: &CertContext) -> StoreStatus;
}
