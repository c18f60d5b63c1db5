//! Validity policy: lifetime caps and human-readable expiry messages.
//!
//! Pure functions, no I/O. Root validity is capped at 25 years; leaf
//! validity at 397 days, the ceiling browsers accept for server
//! certificates.

use chrono::{DateTime, Duration, Utc};

use crate::error::{CaError, Result};

/// Maximum root CA validity (25 years)
pub const MAX_ROOT_VALIDITY_DAYS: i64 = 25 * 365;

/// Maximum leaf validity (industry ceiling)
pub const MAX_LEAF_VALIDITY_DAYS: i64 = 397;

/// Result of clamping a requested validity duration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClampedDuration {
    /// The duration the caller asked for
    pub requested: Duration,
    /// The duration that will actually be used
    pub effective: Duration,
    /// True when the cap was applied
    pub clamped: bool,
    /// Explanation when the cap was applied
    pub message: Option<String>,
}

impl ClampedDuration {
    /// Returns true when the request was honored unchanged
    #[must_use]
    pub const fn ok(&self) -> bool {
        !self.clamped
    }
}

/// Clamp a requested root CA validity to the 25-year maximum.
///
/// # Errors
///
/// Returns [`CaError::InvalidDuration`] when the request is zero or
/// negative; a non-positive lifetime is caller error, not something to
/// silently correct.
pub fn clamp_root_duration(requested: Duration) -> Result<ClampedDuration> {
    clamp(requested, Duration::days(MAX_ROOT_VALIDITY_DAYS), "root CA")
}

/// Clamp a requested leaf validity to the 397-day maximum.
///
/// # Errors
///
/// Returns [`CaError::InvalidDuration`] when the request is zero or
/// negative.
pub fn clamp_leaf_duration(requested: Duration) -> Result<ClampedDuration> {
    clamp(
        requested,
        Duration::days(MAX_LEAF_VALIDITY_DAYS),
        "leaf certificate",
    )
}

fn clamp(requested: Duration, cap: Duration, what: &str) -> Result<ClampedDuration> {
    if requested <= Duration::zero() {
        return Err(CaError::InvalidDuration(format!(
            "{what} validity must be positive, got {}",
            format_duration(requested)
        )));
    }

    if requested > cap {
        return Ok(ClampedDuration {
            requested,
            effective: cap,
            clamped: true,
            message: Some(format!(
                "requested {what} validity of {} exceeds the maximum of {}; clamping",
                format_duration(requested),
                format_duration(cap)
            )),
        });
    }

    Ok(ClampedDuration {
        requested,
        effective: requested,
        clamped: false,
        message: None,
    })
}

/// Render a duration in the largest sensible unit.
#[must_use]
pub fn format_duration(d: Duration) -> String {
    let days = d.num_days();
    if days.abs() >= 730 {
        format!("{} years", days / 365)
    } else if days.abs() >= 2 {
        format!("{days} days")
    } else {
        format!("{} hours", d.num_hours())
    }
}

/// Describe when a certificate expires relative to now.
#[must_use]
pub fn describe_expiry(not_after: DateTime<Utc>) -> String {
    let remaining = not_after - Utc::now();
    if remaining <= Duration::zero() {
        format!("expired {} ago", format_duration(-remaining))
    } else {
        format!("expires in {}", format_duration(remaining))
    }
}
