//! Multi-store trust reconciliation.
//!
//! Stores are independent: one adapter per store, all driven in parallel,
//! each failure confined to its own report entry. The engine never aborts
//! a sweep because one store misbehaved.

pub mod adapter;
pub mod detect;
pub mod exec;
pub mod linux;
pub mod macos;
pub mod nss;
pub mod platform;
pub mod windows;

pub use adapter::{CertContext, TrustStoreAdapter};
pub use detect::DetectionCache;
pub use platform::{adapters_for, Platform};

use futures_util::future::join_all;
use tracing::{debug, info};

use devca_core::{StoreStatus, TrustReport};

/// Drives one operation across every configured store adapter.
pub struct TrustEngine {
    adapters: Vec<Box<dyn TrustStoreAdapter>>,
}

impl TrustEngine {
    /// Engine over an explicit adapter set.
    #[must_use]
    pub fn new(adapters: Vec<Box<dyn TrustStoreAdapter>>) -> Self {
        Self { adapters }
    }

    /// Whether any adapters are configured at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    /// Query the certificate's state in every store, in parallel.
    pub async fn query_all(&self, cert: &CertContext) -> TrustReport {
        let statuses = join_all(self.adapters.iter().map(|a| a.query(cert))).await;
        self.collect(statuses)
    }

    /// Ensure the certificate is trusted in every store.
    ///
    /// When a prior report is given, entries that are already settled
    /// (`trusted`, or `other` because the application is not installed)
    /// are carried forward untouched; only the remaining stores are
    /// attempted. Without a prior report every store is attempted.
    pub async fn add_all(&self, cert: &CertContext, prior: Option<&TrustReport>) -> TrustReport {
        let mut report = TrustReport::new();
        let mut pending = Vec::new();

        for adapter in &self.adapters {
            let carried = prior
                .and_then(|r| r.get(adapter.name()))
                .filter(|s| s.status.is_settled())
                .cloned();
            match carried {
                Some(status) => {
                    debug!(store = %adapter.name(), status = %status.status, "carrying settled entry forward");
                    report.insert(adapter.name(), status);
                }
                None => pending.push(adapter),
            }
        }

        let statuses = join_all(pending.iter().map(|a| a.add(cert))).await;
        for (adapter, status) in pending.iter().zip(statuses) {
            report.insert(adapter.name(), status);
        }
        info!(trusted = report.trusted_stores().len(), total = report.len(), "trust sweep complete");
        report
    }

    /// Remove the certificate from every store.
    pub async fn remove_all(&self, cert: &CertContext) -> TrustReport {
        let statuses = join_all(self.adapters.iter().map(|a| a.remove(cert))).await;
        self.collect(statuses)
    }

    /// Report for a certificate no store was asked about, with a uniform
    /// reason (trust disabled, or a fresh certificate not yet swept).
    /// Every store reads `not_trusted`: nothing has been added anywhere.
    #[must_use]
    pub fn untried_report(&self, reason: &str) -> TrustReport {
        let mut report = TrustReport::new();
        for adapter in &self.adapters {
            report.insert(adapter.name(), StoreStatus::not_trusted(reason));
        }
        report
    }

    fn collect(&self, statuses: Vec<StoreStatus>) -> TrustReport {
        let mut report = TrustReport::new();
        for (adapter, status) in self.adapters.iter().zip(statuses) {
            report.insert(adapter.name(), status);
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use devca_core::{StoreName, TrustStatus};
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct FakeAdapter {
        store: StoreName,
        outcome: TrustStatus,
        adds: Arc<AtomicUsize>,
    }

    impl FakeAdapter {
        fn boxed(store: StoreName, outcome: TrustStatus, adds: &Arc<AtomicUsize>) -> Box<Self> {
            Box::new(Self {
                store,
                outcome,
                adds: Arc::clone(adds),
            })
        }

        fn status(&self) -> StoreStatus {
            match self.outcome {
                TrustStatus::Trusted => StoreStatus::trusted("ok"),
                TrustStatus::NotTrusted => StoreStatus::not_trusted("nope"),
                TrustStatus::Unknown => StoreStatus::unknown("tooling missing"),
                TrustStatus::Other => StoreStatus::other("not installed"),
            }
        }
    }

    #[async_trait]
    impl TrustStoreAdapter for FakeAdapter {
        fn name(&self) -> StoreName {
            self.store
        }

        async fn query(&self, _cert: &CertContext) -> StoreStatus {
            self.status()
        }

        async fn add(&self, _cert: &CertContext) -> StoreStatus {
            self.adds.fetch_add(1, Ordering::SeqCst);
            self.status()
        }

        async fn remove(&self, _cert: &CertContext) -> StoreStatus {
            StoreStatus::not_trusted("removed")
        }
    }

    fn cert() -> CertContext {
        CertContext {
            certificate_pem: String::new(),
            certificate_path: PathBuf::from("/tmp/ca.crt"),
            common_name: "Engine Test CA".to_string(),
        }
    }

    #[tokio::test]
    async fn test_add_all_without_prior_attempts_every_store() {
        let adds = Arc::new(AtomicUsize::new(0));
        let engine = TrustEngine::new(vec![
            FakeAdapter::boxed(StoreName::Mac, TrustStatus::Trusted, &adds),
            FakeAdapter::boxed(StoreName::Firefox, TrustStatus::NotTrusted, &adds),
        ]);

        let report = engine.add_all(&cert(), None).await;
        assert_eq!(adds.load(Ordering::SeqCst), 2);
        assert_eq!(report.len(), 2);
        assert_eq!(report.trusted_stores(), [StoreName::Mac]);
    }

    #[tokio::test]
    async fn test_add_all_carries_settled_entries_forward() {
        let adds = Arc::new(AtomicUsize::new(0));
        let engine = TrustEngine::new(vec![
            FakeAdapter::boxed(StoreName::Mac, TrustStatus::Trusted, &adds),
            FakeAdapter::boxed(StoreName::Firefox, TrustStatus::Trusted, &adds),
            FakeAdapter::boxed(StoreName::Chrome, TrustStatus::Other, &adds),
        ]);

        let mut prior = TrustReport::new();
        prior.insert(StoreName::Mac, StoreStatus::trusted("from last run"));
        prior.insert(StoreName::Firefox, StoreStatus::not_trusted("failed last run"));
        prior.insert(StoreName::Chrome, StoreStatus::other("not installed"));

        let report = engine.add_all(&cert(), Some(&prior)).await;

        // Only the unsettled Firefox entry is re-attempted.
        assert_eq!(adds.load(Ordering::SeqCst), 1);
        assert_eq!(report.get(StoreName::Mac).unwrap().reason, "from last run");
        assert_eq!(
            report.get(StoreName::Chrome).unwrap().status,
            TrustStatus::Other
        );
        assert_eq!(
            report.get(StoreName::Firefox).unwrap().status,
            TrustStatus::Trusted
        );
    }

    #[tokio::test]
    async fn test_unknown_is_retried() {
        let adds = Arc::new(AtomicUsize::new(0));
        let engine = TrustEngine::new(vec![FakeAdapter::boxed(
            StoreName::Firefox,
            TrustStatus::Unknown,
            &adds,
        )]);

        let mut prior = TrustReport::new();
        prior.insert(StoreName::Firefox, StoreStatus::unknown("tooling missing"));

        let _ = engine.add_all(&cert(), Some(&prior)).await;
        assert_eq!(adds.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_untried_report_covers_all_stores() {
        let adds = Arc::new(AtomicUsize::new(0));
        let engine = TrustEngine::new(vec![
            FakeAdapter::boxed(StoreName::Mac, TrustStatus::Trusted, &adds),
            FakeAdapter::boxed(StoreName::Firefox, TrustStatus::Trusted, &adds),
        ]);

        let report = engine.untried_report("trust was not attempted");
        assert_eq!(report.len(), 2);
        assert!(report
            .iter()
            .all(|(_, s)| s.status == TrustStatus::NotTrusted));
        assert_eq!(adds.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_remove_all_reports_every_store() {
        let adds = Arc::new(AtomicUsize::new(0));
        let engine = TrustEngine::new(vec![
            FakeAdapter::boxed(StoreName::Mac, TrustStatus::Trusted, &adds),
            FakeAdapter::boxed(StoreName::Linux, TrustStatus::Trusted, &adds),
        ]);

        let report = engine.remove_all(&cert()).await;
        assert_eq!(report.len(), 2);
        assert!(report
            .iter()
            .all(|(_, s)| s.status == TrustStatus::NotTrusted));
    }

}
