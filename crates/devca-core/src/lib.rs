//! Core types and validity policy for the devca local certificate authority.
//!
//! This crate provides the foundational pieces used across the devca
//! workspace:
//!
//! - **Types**: subject attributes, alt-name classification, the trust
//!   status taxonomy and per-run [`TrustReport`]
//! - **Errors**: the [`CaError`] taxonomy shared by every layer
//! - **Validity policy**: pure lifetime clamping and expiry formatting
//!
//! # Example
//!
//! ```rust,ignore
//! use devca_core::{clamp_leaf_duration, AltName, Result};
//! use chrono::Duration;
//!
//! fn leaf_lifetime() -> Result<Duration> {
//!     Ok(clamp_leaf_duration(Duration::days(825))?.effective)
//! }
//! ```

mod error;
pub mod types;
pub mod validity;

pub use error::{CaError, Result};
pub use types::*;
pub use validity::{
    clamp_leaf_duration, clamp_root_duration, describe_expiry, format_duration, ClampedDuration,
    MAX_LEAF_VALIDITY_DAYS, MAX_ROOT_VALIDITY_DAYS,
};
