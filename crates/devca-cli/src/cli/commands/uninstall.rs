//! `devca uninstall` - withdraw the authority everywhere and delete it.

use anyhow::Result;
use colored::Colorize;

use devca::uninstall_certificate_authority;
use devca_core::AuthorityOptions;

use super::{print_report, Context};
use crate::cli::args::UninstallArgs;

pub async fn execute(ctx: Context, args: UninstallArgs) -> Result<()> {
    let options = AuthorityOptions {
        nss_dynamic_install: args.install_nss_tools,
        ..AuthorityOptions::default()
    };

    let report = uninstall_certificate_authority(&options).await?;

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if report.is_empty() {
        println!("No certificate authority was installed.");
    } else {
        println!("{}", "Certificate authority removed.".bold());
        print_report(ctx, &report);
    }
    Ok(())
}
