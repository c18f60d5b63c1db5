//! Root authority lifecycle: load, validate, reuse or regenerate, trust.
//!
//! Every ensure pass runs the same checks against the persisted root:
//! parseability, expiry, the about-to-expire ratio, and subject or
//! duration drift against the requested options. Any failed check
//! untrusts the old root first and regenerates; the decision is reported
//! as a closed [`AuthorityState`] so callers can explain what happened.

use chrono::Duration;
use tracing::{info, warn};

use devca_core::{clamp_root_duration, AuthorityOptions, Result, TrustReport};

use crate::factory::CertificateFactory;
use crate::inspect::{inspect_certificate_pem, CertificateFacts};
use crate::store::{AuthorityPaths, AuthorityRecord, AuthorityStore};
use crate::trust::{CertContext, TrustEngine};

/// Drift tolerance when comparing the persisted validity window against
/// the requested one; absorbs the issuance backdate.
const DURATION_DRIFT_TOLERANCE: Duration = Duration::days(1);

/// Why the ensure pass produced the authority it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorityState {
    /// No usable authority existed; a fresh one was created
    Created,
    /// The persisted authority passed every check and was reused
    Reused,
    /// The persisted authority had expired and was replaced
    Expired,
    /// Remaining lifetime fell below the configured ratio
    AboutToExpire,
    /// Subject attributes or validity length no longer match the request
    AttributesDrifted,
}

impl AuthorityState {
    /// True when this ensure pass minted a new root.
    #[must_use]
    pub const fn is_new(self) -> bool {
        !matches!(self, Self::Reused)
    }
}

/// Outcome of one ensure pass.
#[derive(Debug)]
pub struct EnsuredAuthority {
    /// The authority now on disk
    pub record: AuthorityRecord,
    /// Resolved file locations
    pub paths: AuthorityPaths,
    /// What the ensure pass decided and why
    pub state: AuthorityState,
    /// Trust state across the configured stores
    pub trust: TrustReport,
}

/// Owns the reuse-or-regenerate decision and the trust sweeps around it.
pub struct CaLifecycleManager {
    store: AuthorityStore,
    engine: TrustEngine,
    options: AuthorityOptions,
}

impl CaLifecycleManager {
    /// Manager over an explicit store, engine, and options.
    #[must_use]
    pub fn new(store: AuthorityStore, engine: TrustEngine, options: AuthorityOptions) -> Self {
        Self {
            store,
            engine,
            options,
        }
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &AuthorityStore {
        &self.store
    }

    /// Make sure a valid, matching root authority exists, regenerating if
    /// necessary, and reconcile its trust state.
    pub async fn ensure_authority(&self) -> Result<EnsuredAuthority> {
        let state = match self.store.load() {
            None => AuthorityState::Created,
            Some(existing) => match self.evaluate(&existing) {
                AuthorityState::Reused => {
                    let paths = self.store.locate();
                    let trust = self.trust_reused(&existing, &paths).await;
                    return Ok(EnsuredAuthority {
                        record: existing,
                        paths,
                        state: AuthorityState::Reused,
                        trust,
                    });
                }
                reason => {
                    info!(reason = ?reason, "persisted authority rejected, regenerating");
                    self.untrust_existing(&existing).await;
                    reason
                }
            },
        };

        let record = self.regenerate()?;
        let paths = self.store.locate();
        let trust = if self.options.try_to_trust {
            let context = self.context(&record, &paths);
            let report = self.engine.add_all(&context, None).await;
            for (store, reason) in report.warnings() {
                warn!(store = %store, reason, "store did not accept the new authority");
            }
            report
        } else {
            self.engine
                .untried_report("certificate is new and trust was not attempted")
        };

        Ok(EnsuredAuthority {
            record,
            paths,
            state,
            trust,
        })
    }

    /// Remove the authority from every store, then delete its files.
    ///
    /// Returns the per-store removal report; empty when no authority was
    /// persisted in the first place.
    pub async fn uninstall(&self) -> Result<TrustReport> {
        let report = match self.store.load() {
            Some(existing) => {
                let paths = self.store.locate();
                let context = self.context(&existing, &paths);
                self.engine.remove_all(&context).await
            }
            None => TrustReport::new(),
        };
        self.store.delete()?;
        Ok(report)
    }

    /// Run the reuse checks against a persisted authority.
    fn evaluate(&self, existing: &AuthorityRecord) -> AuthorityState {
        let paths = self.store.locate();
        let facts = match inspect_certificate_pem(
            &existing.certificate_pem,
            &paths.certificate_path.to_string_lossy(),
        ) {
            Ok(facts) => facts,
            Err(e) => {
                warn!(error = %e, "persisted root certificate unparseable");
                return AuthorityState::AttributesDrifted;
            }
        };

        if facts.remaining() <= Duration::zero() {
            return AuthorityState::Expired;
        }
        if self.about_to_expire(&facts) {
            return AuthorityState::AboutToExpire;
        }
        if self.drifted(&facts) {
            return AuthorityState::AttributesDrifted;
        }
        AuthorityState::Reused
    }

    fn about_to_expire(&self, facts: &CertificateFacts) -> bool {
        let total = facts.total().num_seconds();
        if total <= 0 {
            return true;
        }
        #[allow(clippy::cast_precision_loss)]
        let fraction = facts.remaining().num_seconds() as f64 / total as f64;
        fraction < self.options.about_to_expire_ratio
    }

    fn drifted(&self, facts: &CertificateFacts) -> bool {
        if facts.subject != self.options.subject {
            return true;
        }
        let expected = match clamp_root_duration(self.options.validity) {
            Ok(clamped) => clamped.effective,
            Err(_) => return true,
        };
        let delta = facts.total() - expected;
        delta.abs() > DURATION_DRIFT_TOLERANCE
    }

    async fn untrust_existing(&self, existing: &AuthorityRecord) {
        let paths = self.store.locate();
        let context = self.context(existing, &paths);
        let report = self.engine.remove_all(&context).await;
        for (store, status) in report.iter() {
            info!(store = %store, status = %status.status, "old authority removal");
        }
    }

    fn regenerate(&self) -> Result<AuthorityRecord> {
        let clamped = clamp_root_duration(self.options.validity)?;
        if let Some(message) = &clamped.message {
            warn!("{message}");
        }

        let material =
            CertificateFactory::create_root(&self.options.subject, clamped.effective, 0)?;
        let record = AuthorityRecord {
            certificate_pem: material.certificate_pem,
            private_key_pem: material.private_key_pem,
            serial_number: 0,
        };
        self.store.save(&record)?;
        info!(
            common_name = %self.options.subject.common_name,
            "root authority generated"
        );
        Ok(record)
    }

    /// Trust sweep for a reused authority.
    ///
    /// Queries run even when trust provisioning is disabled: the query is
    /// side-effect-free and the report should state what the stores
    /// actually hold, not what the options allowed.
    async fn trust_reused(
        &self,
        existing: &AuthorityRecord,
        paths: &AuthorityPaths,
    ) -> TrustReport {
        let context = self.context(existing, paths);
        let current = self.engine.query_all(&context).await;
        if !self.options.try_to_trust {
            return current;
        }
        self.engine.add_all(&context, Some(&current)).await
    }

    fn context(&self, record: &AuthorityRecord, paths: &AuthorityPaths) -> CertContext {
        CertContext {
            certificate_pem: record.certificate_pem.clone(),
            certificate_path: paths.certificate_path.clone(),
            common_name: self.subject_common_name(record),
        }
    }

    /// Common name as persisted, falling back to the requested one when
    /// the stored certificate cannot be parsed.
    fn subject_common_name(&self, record: &AuthorityRecord) -> String {
        inspect_certificate_pem(&record.certificate_pem, "persisted root")
            .map_or_else(
                |_| self.options.subject.common_name.clone(),
                |facts| facts.subject.common_name,
            )
    }
}
