//! Loader strategies and the geometry that follows a completed load.
//!
//! Splat clouds stream in and report progress as they go. Meshes arrive in
//! one piece and are then centred and scaled so every model opens at the
//! same apparent size.

use glam::{Mat4, Vec3};
use serde::Serialize;
use splatforge_core::asset_kind::{AssetFamily, AssetKind};

/// Largest extent of a mesh after fit-to-view, in world units.
pub const TARGET_VIEW_SIZE: f32 = 2.0;

/// How an asset is brought into the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadStrategy {
    /// Progressive reveal driven by upstream progress callbacks.
    Streaming,
    /// Whole-file load followed by a fit-to-view transform.
    Full,
}

impl LoadStrategy {
    pub fn for_kind(kind: AssetKind) -> Self {
        match kind.family() {
            AssetFamily::Splat => Self::Streaming,
            AssetFamily::Mesh => Self::Full,
        }
    }
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Load progress in percent. Clamped to `0..=100` and never decreases.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Progress(f32);

impl Progress {
    pub const COMPLETE: f32 = 100.0;

    pub fn value(self) -> f32 {
        self.0
    }

    pub fn is_complete(self) -> bool {
        self.0 >= Self::COMPLETE
    }

    /// Fold an upstream report into the running value and return the result.
    /// Non-finite reports are dropped.
    pub fn report(&mut self, raw: f32) -> f32 {
        if raw.is_finite() {
            self.0 = self.0.max(raw.clamp(0.0, Self::COMPLETE));
        }
        self.0
    }

    pub fn complete(&mut self) {
        self.0 = Self::COMPLETE;
    }
}

// ---------------------------------------------------------------------------
// Bounding box and fit-to-view
// ---------------------------------------------------------------------------

/// Axis-aligned bounding box of a loaded mesh.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds {
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Smallest box containing every point, or `None` for no points.
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        Some(points.fold(Self::new(first, first), |b, p| Self {
            min: b.min.min(p),
            max: b.max.max(p),
        }))
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn largest_extent(&self) -> f32 {
        self.size().max_element()
    }
}

/// Translation then uniform scale that centres a model at the origin with
/// its largest extent equal to [`TARGET_VIEW_SIZE`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FitTransform {
    pub translation: Vec3,
    pub scale: f32,
}

impl Default for FitTransform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            scale: 1.0,
        }
    }
}

impl FitTransform {
    pub fn for_bounds(bounds: &Bounds) -> Self {
        let extent = bounds.largest_extent();
        // A zero-size box is centred but not scaled.
        let scale = if extent.is_finite() && extent > f32::EPSILON {
            TARGET_VIEW_SIZE / extent
        } else {
            1.0
        };
        Self {
            translation: -bounds.center(),
            scale,
        }
    }

    pub fn apply(&self, point: Vec3) -> Vec3 {
        (point + self.translation) * self.scale
    }

    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale(Vec3::splat(self.scale)) * Mat4::from_translation(self.translation)
    }
}
