//! Object keys for stored assets.
//!
//! Keys are namespaced by purpose and made unique with a millisecond
//! timestamp plus a random suffix:
//! `uploads/1734567890123-k3J9aQ0pZx1m.png`.

use std::fmt;

use rand::Rng;

/// Length of the random alphanumeric suffix.
pub const SUFFIX_LENGTH: usize = 12;

/// What a stored object is for. Becomes the first key segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoragePurpose {
    /// Caller-supplied input images.
    Uploads,
    /// Generated 3D assets.
    Outputs,
    /// Images produced from a text prompt.
    Generated,
    /// Images produced by prompt-driven editing.
    Edited,
}

impl StoragePurpose {
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Uploads => "uploads",
            Self::Outputs => "outputs",
            Self::Generated => "generated",
            Self::Edited => "edited",
        }
    }
}

/// A validated, slash-separated object key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey(String);

impl StorageKey {
    /// Build a fresh key for `purpose` with the given file extension.
    pub fn generate(purpose: StoragePurpose, extension: &str) -> Self {
        let suffix: String = rand::rng()
            .sample_iter(&rand::distr::Alphanumeric)
            .take(SUFFIX_LENGTH)
            .map(char::from)
            .collect();
        let millis = chrono::Utc::now().timestamp_millis();
        Self(format!("{}/{millis}-{suffix}.{extension}", purpose.prefix()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
