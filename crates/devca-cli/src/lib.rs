//! # devca-cli
//!
//! Command-line front end for the devca local certificate authority.
//!
//! - `devca install` creates (or refreshes) the root CA and pushes it
//!   into every applicable trust store
//! - `devca issue` mints a leaf certificate for local hostnames
//! - `devca status` shows the authority and its per-store trust state
//! - `devca uninstall` withdraws the root everywhere and deletes it

pub mod cli;

pub use cli::run;
