//! Command-line argument definitions using clap.

use clap::{Args, Parser, Subcommand};

/// Locally-trusted development certificates
///
/// Installs a per-user root CA, trusts it in the OS and browser trust
/// stores, and issues leaf certificates for local hostnames.
#[derive(Parser, Debug)]
#[command(name = "devca")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Emit machine-readable JSON instead of human output
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase verbosity
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the root CA (if needed) and trust it everywhere
    Install(InstallArgs),

    /// Withdraw the root CA from every store and delete it
    Uninstall(UninstallArgs),

    /// Issue a leaf certificate for one or more local hostnames
    Issue(IssueArgs),

    /// Show the authority and its per-store trust state
    Status,
}

#[derive(Args, Debug)]
pub struct InstallArgs {
    /// Common name for the root certificate
    #[arg(long)]
    pub common_name: Option<String>,

    /// Organization for the root certificate
    #[arg(long)]
    pub organization: Option<String>,

    /// Root validity in days (clamped to 25 years)
    #[arg(long)]
    pub validity_days: Option<i64>,

    /// Create the authority without touching any trust store
    #[arg(long)]
    pub no_trust: bool,

    /// Allow installing the NSS certutil tool via a package manager when
    /// it is missing
    #[arg(long)]
    pub install_nss_tools: bool,
}

#[derive(Args, Debug)]
pub struct UninstallArgs {
    /// Allow installing the NSS certutil tool via a package manager when
    /// it is missing
    #[arg(long)]
    pub install_nss_tools: bool,
}

#[derive(Args, Debug)]
pub struct IssueArgs {
    /// Hostnames, IP addresses, or URIs the certificate should cover
    #[arg(required = true)]
    pub names: Vec<String>,

    /// Leaf validity in days (clamped to 397)
    #[arg(long)]
    pub validity_days: Option<i64>,

    /// Common name override; defaults to the first name
    #[arg(long)]
    pub common_name: Option<String>,

    /// Organization for the leaf certificate
    #[arg(long)]
    pub organization: Option<String>,

    /// Directory to write the certificate and key into
    #[arg(long, default_value = ".")]
    pub out_dir: std::path::PathBuf,
}
