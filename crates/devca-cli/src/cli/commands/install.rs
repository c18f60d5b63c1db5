//! `devca install` - create and trust the root certificate authority.

use anyhow::Result;
use chrono::Duration;
use colored::Colorize;

use devca::{install_certificate_authority, AuthorityState};
use devca_core::AuthorityOptions;

use super::{print_report, Context};
use crate::cli::args::InstallArgs;

pub async fn execute(ctx: Context, args: InstallArgs) -> Result<()> {
    let mut options = AuthorityOptions::default();
    if let Some(common_name) = args.common_name {
        options.subject.common_name = common_name;
    }
    if let Some(organization) = args.organization {
        options.subject.organization = Some(organization);
    }
    if let Some(days) = args.validity_days {
        options.validity = Duration::days(days);
    }
    options.try_to_trust = !args.no_trust;
    options.nss_dynamic_install = args.install_nss_tools;

    let ensured = install_certificate_authority(&options).await?;

    if ctx.json {
        let value = serde_json::json!({
            "state": format!("{:?}", ensured.state),
            "is_new": ensured.state.is_new(),
            "certificate_path": ensured.paths.certificate_path,
            "trust": ensured.trust,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    let headline = match ensured.state {
        AuthorityState::Created => "Created a new certificate authority.",
        AuthorityState::Reused => "Existing certificate authority is valid, reusing it.",
        AuthorityState::Expired => "Previous authority had expired; generated a replacement.",
        AuthorityState::AboutToExpire => {
            "Previous authority was close to expiry; generated a replacement."
        }
        AuthorityState::AttributesDrifted => {
            "Previous authority no longer matched the requested attributes; \
             generated a replacement."
        }
    };
    println!("{}", headline.bold());
    println!(
        "Certificate: {}",
        ensured.paths.certificate_path.display()
    );
    println!();
    print_report(ctx, &ensured.trust);

    if options.try_to_trust && !ensured.trust.warnings().is_empty() {
        println!();
        println!(
            "{}",
            "Some stores did not accept the certificate; see reasons above.".yellow()
        );
        println!(
            "{}",
            devca::manual_trust_instructions(
                devca::Platform::current(),
                &ensured.paths.certificate_path
            )
        );
    }
    Ok(())
}
