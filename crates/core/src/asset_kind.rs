//! Closed set of 3D asset format tags.
//!
//! Every generated result is tagged with exactly one [`AssetKind`]. The tag
//! decides how the asset is stored (extension, content type) and how a
//! viewer loads it (see [`AssetFamily`]).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Format tag of a generated 3D asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    /// Gaussian splats serialised as a binary PLY file.
    Ply,
    /// Gaussian splats in the compact `.splat` layout.
    Splat,
    /// Binary glTF mesh.
    Glb,
    /// JSON glTF mesh.
    Gltf,
}

/// Broad representation family of an [`AssetKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetFamily {
    /// Point-based splat cloud, loaded progressively.
    Splat,
    /// Triangle mesh, loaded in one piece.
    Mesh,
}

/// All known kinds, in declaration order.
pub const ALL_ASSET_KINDS: &[AssetKind] =
    &[AssetKind::Ply, AssetKind::Splat, AssetKind::Glb, AssetKind::Gltf];

impl AssetKind {
    /// Database / wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ply => "ply",
            Self::Splat => "splat",
            Self::Glb => "glb",
            Self::Gltf => "gltf",
        }
    }

    pub fn family(self) -> AssetFamily {
        match self {
            Self::Ply | Self::Splat => AssetFamily::Splat,
            Self::Glb | Self::Gltf => AssetFamily::Mesh,
        }
    }

    /// File extension used for storage keys (no leading dot).
    pub fn extension(self) -> &'static str {
        self.as_str()
    }

    /// MIME type sent to the asset store.
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Ply | Self::Splat => "application/octet-stream",
            Self::Glb => "model/gltf-binary",
            Self::Gltf => "model/gltf+json",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ply" => Ok(Self::Ply),
            "splat" => Ok(Self::Splat),
            "glb" => Ok(Self::Glb),
            "gltf" => Ok(Self::Gltf),
            other => Err(CoreError::Validation(format!(
                "Unknown asset kind '{other}'. Must be one of: ply, splat, glb, gltf"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips_every_kind() {
        for kind in ALL_ASSET_KINDS {
            assert_eq!(kind.as_str().parse::<AssetKind>().unwrap(), *kind);
        }
    }

    #[test]
    fn parse_rejects_unknown_tag() {
        assert!("obj".parse::<AssetKind>().is_err());
        assert!("PLY".parse::<AssetKind>().is_err());
    }

    #[test]
    fn families_split_splats_from_meshes() {
        assert_eq!(AssetKind::Ply.family(), AssetFamily::Splat);
        assert_eq!(AssetKind::Splat.family(), AssetFamily::Splat);
        assert_eq!(AssetKind::Glb.family(), AssetFamily::Mesh);
        assert_eq!(AssetKind::Gltf.family(), AssetFamily::Mesh);
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(serde_json::to_string(&AssetKind::Glb).unwrap(), "\"glb\"");
    }
}
