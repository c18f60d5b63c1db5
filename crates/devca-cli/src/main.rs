//! devca - locally-trusted development certificates
//!
//! Install a per-user root CA, trust it everywhere, and mint leaf
//! certificates for local hostnames.

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    devca_cli::run().await
}
