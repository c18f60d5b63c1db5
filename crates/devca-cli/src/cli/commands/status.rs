//! `devca status` - show the authority and its per-store trust state.

use std::sync::Arc;

use anyhow::Result;
use colored::Colorize;

use devca::{
    adapters_for, inspect_certificate_pem, AuthorityStore, CertContext, DetectionCache,
    Platform, TrustEngine, DEFAULT_AUTHORITY_NAME,
};
use devca_core::describe_expiry;

use super::{print_report, Context};

pub async fn execute(ctx: Context) -> Result<()> {
    let store = AuthorityStore::new(DEFAULT_AUTHORITY_NAME)?;
    let Some(record) = store.load() else {
        if ctx.json {
            println!("{}", serde_json::json!({ "installed": false }));
        } else {
            println!("No certificate authority installed. Run `devca install` first.");
        }
        return Ok(());
    };

    let paths = store.locate();
    let facts = inspect_certificate_pem(&record.certificate_pem, "persisted root")?;

    let cache = Arc::new(DetectionCache::new());
    let engine = TrustEngine::new(adapters_for(Platform::current(), &cache, false));
    let report = engine
        .query_all(&CertContext {
            certificate_pem: record.certificate_pem.clone(),
            certificate_path: paths.certificate_path.clone(),
            common_name: facts.subject.common_name.clone(),
        })
        .await;

    if ctx.json {
        let value = serde_json::json!({
            "installed": true,
            "common_name": facts.subject.common_name,
            "not_after": facts.not_after.to_rfc3339(),
            "serial_number": record.serial_number,
            "certificate_path": paths.certificate_path,
            "trust": report,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("{}", facts.subject.common_name.bold());
    println!("  {}", describe_expiry(facts.not_after));
    println!("  Last serial: {}", record.serial_number);
    println!("  Certificate: {}", paths.certificate_path.display());
    println!();
    print_report(ctx, &report);
    Ok(())
}
