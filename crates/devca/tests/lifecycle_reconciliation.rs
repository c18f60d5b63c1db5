//! End-to-end lifecycle plus trust reconciliation with in-memory store
//! adapters: verifies the untrust-before-regenerate ordering and that
//! reuse passes only touch stores that still need work.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Duration;
use tempfile::TempDir;

use devca::{
    AuthorityState, AuthorityStore, CaLifecycleManager, CertContext, LeafCertificateIssuer,
    TrustEngine, TrustStoreAdapter,
};
use devca_core::{
    AuthorityOptions, CertificateRequest, StoreName, StoreStatus, SubjectAttributes, TrustStatus,
};

/// Adapter over an in-memory "store": a slot holding the trusted PEM.
struct MemoryStoreAdapter {
    name: StoreName,
    trusted_pem: Arc<Mutex<Option<String>>>,
    log: Arc<Mutex<Vec<String>>>,
}

impl MemoryStoreAdapter {
    fn new(name: StoreName, log: &Arc<Mutex<Vec<String>>>) -> (Box<Self>, Arc<Mutex<Option<String>>>) {
        let slot = Arc::new(Mutex::new(None));
        let adapter = Box::new(Self {
            name,
            trusted_pem: Arc::clone(&slot),
            log: Arc::clone(log),
        });
        (adapter, slot)
    }

    fn record(&self, op: &str) {
        self.log.lock().unwrap().push(format!("{op}:{}", self.name));
    }
}

#[async_trait]
impl TrustStoreAdapter for MemoryStoreAdapter {
    fn name(&self) -> StoreName {
        self.name
    }

    async fn query(&self, cert: &CertContext) -> StoreStatus {
        self.record("query");
        match self.trusted_pem.lock().unwrap().as_deref() {
            Some(pem) if pem == cert.certificate_pem => StoreStatus::trusted("present"),
            _ => StoreStatus::not_trusted("absent"),
        }
    }

    async fn add(&self, cert: &CertContext) -> StoreStatus {
        self.record("add");
        *self.trusted_pem.lock().unwrap() = Some(cert.certificate_pem.clone());
        StoreStatus::trusted("added")
    }

    async fn remove(&self, _cert: &CertContext) -> StoreStatus {
        self.record("remove");
        *self.trusted_pem.lock().unwrap() = None;
        StoreStatus::not_trusted("removed")
    }
}

fn options(common_name: &str) -> AuthorityOptions {
    AuthorityOptions {
        subject: SubjectAttributes::new(common_name),
        try_to_trust: true,
        ..AuthorityOptions::default()
    }
}

#[tokio::test]
async fn test_install_trusts_every_store() {
    let dir = TempDir::new().unwrap();
    let log = Arc::new(Mutex::new(Vec::new()));
    let (mac, mac_slot) = MemoryStoreAdapter::new(StoreName::Mac, &log);
    let (firefox, firefox_slot) = MemoryStoreAdapter::new(StoreName::Firefox, &log);

    let mgr = CaLifecycleManager::new(
        AuthorityStore::at_dir(dir.path(), "devca"),
        TrustEngine::new(vec![mac, firefox]),
        options("Sweep CA"),
    );

    let ensured = mgr.ensure_authority().await.unwrap();
    assert_eq!(ensured.state, AuthorityState::Created);
    assert_eq!(
        ensured.trust.trusted_stores(),
        [StoreName::Mac, StoreName::Firefox]
    );
    assert_eq!(
        mac_slot.lock().unwrap().as_deref(),
        Some(ensured.record.certificate_pem.as_str())
    );
    assert_eq!(
        firefox_slot.lock().unwrap().as_deref(),
        Some(ensured.record.certificate_pem.as_str())
    );
}

#[tokio::test]
async fn test_reuse_pass_skips_already_trusted_stores() {
    let dir = TempDir::new().unwrap();
    let log = Arc::new(Mutex::new(Vec::new()));

    {
        let (mac, _) = MemoryStoreAdapter::new(StoreName::Mac, &log);
        let mgr = CaLifecycleManager::new(
            AuthorityStore::at_dir(dir.path(), "devca"),
            TrustEngine::new(vec![mac]),
            options("Steady CA"),
        );
        mgr.ensure_authority().await.unwrap();
    }

    // Fresh adapter whose slot already holds the persisted root, as if a
    // previous run trusted it.
    let (mac, slot) = MemoryStoreAdapter::new(StoreName::Mac, &log);
    let store = AuthorityStore::at_dir(dir.path(), "devca");
    *slot.lock().unwrap() = Some(store.load().unwrap().certificate_pem);
    log.lock().unwrap().clear();

    let mgr = CaLifecycleManager::new(store, TrustEngine::new(vec![mac]), options("Steady CA"));
    let ensured = mgr.ensure_authority().await.unwrap();

    assert_eq!(ensured.state, AuthorityState::Reused);
    let ops = log.lock().unwrap().clone();
    assert!(ops.contains(&"query:mac".to_string()));
    assert!(!ops.contains(&"add:mac".to_string()), "settled store re-added: {ops:?}");
}

#[tokio::test]
async fn test_reuse_with_trust_disabled_reports_actual_state() {
    let dir = TempDir::new().unwrap();
    let log = Arc::new(Mutex::new(Vec::new()));

    {
        let (mac, _) = MemoryStoreAdapter::new(StoreName::Mac, &log);
        let mgr = CaLifecycleManager::new(
            AuthorityStore::at_dir(dir.path(), "devca"),
            TrustEngine::new(vec![mac]),
            options("Query Only CA"),
        );
        mgr.ensure_authority().await.unwrap();
    }

    // The store already trusts the persisted root; a reuse pass with
    // provisioning off must still report that, from a real query.
    let (mac, slot) = MemoryStoreAdapter::new(StoreName::Mac, &log);
    let store = AuthorityStore::at_dir(dir.path(), "devca");
    *slot.lock().unwrap() = Some(store.load().unwrap().certificate_pem);
    log.lock().unwrap().clear();

    let opts = AuthorityOptions {
        subject: SubjectAttributes::new("Query Only CA"),
        try_to_trust: false,
        ..AuthorityOptions::default()
    };
    let mgr = CaLifecycleManager::new(store, TrustEngine::new(vec![mac]), opts);
    let ensured = mgr.ensure_authority().await.unwrap();

    assert_eq!(ensured.state, AuthorityState::Reused);
    assert_eq!(
        ensured.trust.get(StoreName::Mac).unwrap().status,
        TrustStatus::Trusted
    );
    let ops = log.lock().unwrap().clone();
    assert!(ops.contains(&"query:mac".to_string()));
    assert!(!ops.contains(&"add:mac".to_string()), "provisioning ran while disabled: {ops:?}");
}

#[tokio::test]
async fn test_regeneration_untrusts_old_root_first() {
    let dir = TempDir::new().unwrap();
    let log = Arc::new(Mutex::new(Vec::new()));

    {
        let (mac, _) = MemoryStoreAdapter::new(StoreName::Mac, &log);
        let mgr = CaLifecycleManager::new(
            AuthorityStore::at_dir(dir.path(), "devca"),
            TrustEngine::new(vec![mac]),
            options("Old Name CA"),
        );
        mgr.ensure_authority().await.unwrap();
    }
    log.lock().unwrap().clear();

    // Changed common name forces regeneration.
    let (mac, slot) = MemoryStoreAdapter::new(StoreName::Mac, &log);
    let mgr = CaLifecycleManager::new(
        AuthorityStore::at_dir(dir.path(), "devca"),
        TrustEngine::new(vec![mac]),
        options("New Name CA"),
    );
    let ensured = mgr.ensure_authority().await.unwrap();

    assert_eq!(ensured.state, AuthorityState::AttributesDrifted);
    let ops = log.lock().unwrap().clone();
    let remove_pos = ops.iter().position(|o| o == "remove:mac").unwrap();
    let add_pos = ops.iter().position(|o| o == "add:mac").unwrap();
    assert!(remove_pos < add_pos, "remove must precede the new add: {ops:?}");
    assert_eq!(
        slot.lock().unwrap().as_deref(),
        Some(ensured.record.certificate_pem.as_str())
    );
}

#[tokio::test]
async fn test_uninstall_withdraws_and_deletes() {
    let dir = TempDir::new().unwrap();
    let log = Arc::new(Mutex::new(Vec::new()));
    let (mac, slot) = MemoryStoreAdapter::new(StoreName::Mac, &log);

    let mgr = CaLifecycleManager::new(
        AuthorityStore::at_dir(dir.path(), "devca"),
        TrustEngine::new(vec![mac]),
        options("Gone CA"),
    );
    mgr.ensure_authority().await.unwrap();
    assert!(slot.lock().unwrap().is_some());

    let report = mgr.uninstall().await.unwrap();
    assert!(slot.lock().unwrap().is_none());
    assert_eq!(
        report.get(StoreName::Mac).unwrap().status,
        TrustStatus::NotTrusted
    );
    assert!(!mgr.store().locate().exists);
}

#[tokio::test]
async fn test_issuance_against_installed_authority() {
    let dir = TempDir::new().unwrap();
    let mgr = CaLifecycleManager::new(
        AuthorityStore::at_dir(dir.path(), "devca"),
        TrustEngine::new(Vec::new()),
        AuthorityOptions {
            subject: SubjectAttributes::new("Issuing CA"),
            ..AuthorityOptions::default()
        },
    );
    mgr.ensure_authority().await.unwrap();

    let store = AuthorityStore::at_dir(dir.path(), "devca");
    let issuer = LeafCertificateIssuer::new(&store);
    let issued = issuer
        .issue(&CertificateRequest::for_hostnames(["myapp.local"]))
        .unwrap();

    assert_eq!(issued.serial, 1);
    assert!(issued.covered_names.contains(&"localhost".to_string()));

    let leaf = devca::inspect_certificate_pem(&issued.certificate_pem, "leaf").unwrap();
    let root = devca::inspect_certificate_pem(
        &store.load().unwrap().certificate_pem,
        "root",
    )
    .unwrap();
    assert_eq!(leaf.serial, vec![1]);
    assert!(root.not_after > leaf.not_after);
}
