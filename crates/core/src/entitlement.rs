//! Free-tier quota policy and the derived entitlement snapshot.
//!
//! An [`Entitlement`] is never stored. It is recomputed from the user's
//! `scene_count` / `is_paid` columns and the configured [`QuotaPolicy`]
//! every time a session is read or a generation is attempted.

use serde::Serialize;

use crate::error::CoreError;

/// Free generations granted to unpaid users when nothing is configured.
pub const DEFAULT_FREE_SCENE_LIMIT: u32 = 3;

/// Configuration value that disables the free-tier ceiling.
pub const UNLIMITED: &str = "unlimited";

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// How many generations an unpaid user may perform.
///
/// `free_limit == None` means no ceiling at all (typically development).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaPolicy {
    pub free_limit: Option<u32>,
}

impl Default for QuotaPolicy {
    fn default() -> Self {
        Self::limited(DEFAULT_FREE_SCENE_LIMIT)
    }
}

impl QuotaPolicy {
    pub const fn limited(free_limit: u32) -> Self {
        Self {
            free_limit: Some(free_limit),
        }
    }

    pub const fn unlimited() -> Self {
        Self { free_limit: None }
    }

    /// Parse a `FREE_SCENE_LIMIT` value: a non-negative integer or `unlimited`.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case(UNLIMITED) {
            return Ok(Self::unlimited());
        }
        raw.parse::<u32>().map(Self::limited).map_err(|_| {
            CoreError::Validation(format!(
                "Invalid free scene limit '{raw}'. Expected a non-negative integer or '{UNLIMITED}'"
            ))
        })
    }

    /// Derive the entitlement for a user with the given counters.
    ///
    /// Denial is strict: a user whose count has reached the limit may not
    /// generate again. Paid users are never limited.
    pub fn evaluate(&self, scene_count: i32, is_paid: bool) -> Entitlement {
        let used = u32::try_from(scene_count).unwrap_or(0);
        let (can_upload, remaining_uploads) = match (is_paid, self.free_limit) {
            (true, _) | (false, None) => (true, None),
            (false, Some(limit)) => (used < limit, Some(limit.saturating_sub(used))),
        };

        Entitlement {
            scene_count,
            is_paid,
            can_upload,
            remaining_uploads,
            degraded: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Whether a user may generate one more asset, and how many remain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Entitlement {
    pub scene_count: i32,
    pub is_paid: bool,
    pub can_upload: bool,
    /// `None` serialises as `null` and means unbounded.
    pub remaining_uploads: Option<u32>,
    /// Set when the counters could not be read and this snapshot is the
    /// conservative fallback.
    #[serde(skip)]
    pub degraded: bool,
}

impl Entitlement {
    /// Fallback used when the user's counters cannot be read: no access.
    pub fn unavailable() -> Self {
        Self {
            scene_count: 0,
            is_paid: false,
            can_upload: false,
            remaining_uploads: Some(0),
            degraded: true,
        }
    }
}
