//! Viewer lifecycle state machine.
//!
//! ```text
//! Idle -> Loading -> Ready
//!            \-> Error
//! any state -> Disposed
//! Loading | Ready | Error -> Idle (reset)
//! ```
//!
//! Loader callbacks can land after the host has torn the view down, so every
//! event method is a no-op once the session is disposed. Graphics resources
//! are registered as they are created and handed back by [`ViewerSession::dispose`]
//! for the host to free.

use serde::Serialize;
use splatforge_core::asset_kind::AssetKind;

use crate::camera::{CameraMode, CameraPose, CameraRig};
use crate::error::ViewerError;
use crate::keyboard::{Key, KeyboardRig};
use crate::loader::{Bounds, FitTransform, LoadStrategy, Progress};

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum ViewerState {
    Idle,
    Loading { progress: f32 },
    Ready,
    Error { message: String },
    Disposed,
}

impl ViewerState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading { .. } => "loading",
            Self::Ready => "ready",
            Self::Error { .. } => "error",
            Self::Disposed => "disposed",
        }
    }
}

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceKind {
    RenderTarget,
    ControlListener,
    FrameCallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ResourceHandle(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Resource {
    pub handle: ResourceHandle,
    pub kind: ResourceKind,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct ViewerSession {
    state: ViewerState,
    kind: Option<AssetKind>,
    strategy: Option<LoadStrategy>,
    progress: Progress,
    fit: FitTransform,
    camera: CameraRig,
    keys: KeyboardRig,
    resources: Vec<Resource>,
    next_handle: u64,
}

impl Default for ViewerSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewerSession {
    pub fn new() -> Self {
        Self {
            state: ViewerState::Idle,
            kind: None,
            strategy: None,
            progress: Progress::default(),
            fit: FitTransform::default(),
            camera: CameraRig::default(),
            keys: KeyboardRig::default(),
            resources: Vec::new(),
            next_handle: 1,
        }
    }

    pub fn state(&self) -> &ViewerState {
        &self.state
    }

    pub fn asset_kind(&self) -> Option<AssetKind> {
        self.kind
    }

    pub fn strategy(&self) -> Option<LoadStrategy> {
        self.strategy
    }

    pub fn progress(&self) -> f32 {
        self.progress.value()
    }

    /// Model transform for a mesh load; identity for splats.
    pub fn fit(&self) -> FitTransform {
        self.fit
    }

    pub fn camera(&self) -> &CameraRig {
        &self.camera
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn is_disposed(&self) -> bool {
        self.state == ViewerState::Disposed
    }

    // -- lifecycle ----------------------------------------------------------

    /// Begin loading an asset. Only valid from `Idle`.
    pub fn load(&mut self, kind: AssetKind) -> Result<LoadStrategy, ViewerError> {
        self.require(&["idle"], "start a load")?;

        let strategy = LoadStrategy::for_kind(kind);
        self.kind = Some(kind);
        self.strategy = Some(strategy);
        self.progress = Progress::default();
        self.fit = FitTransform::default();
        self.state = ViewerState::Loading {
            progress: self.progress.value(),
        };
        tracing::debug!(kind = %kind, ?strategy, "Viewer load started");
        Ok(strategy)
    }

    /// Upstream progress report for a streaming load. Returns the
    /// resulting progress, or `None` when the report does not apply.
    pub fn on_progress(&mut self, percent: f32) -> Option<f32> {
        if !matches!(self.state, ViewerState::Loading { .. })
            || self.strategy != Some(LoadStrategy::Streaming)
        {
            return None;
        }
        let progress = self.progress.report(percent);
        self.state = ViewerState::Loading { progress };
        Some(progress)
    }

    /// The loader finished. Mesh loads pass their bounding box so the model
    /// can be fitted to the view.
    pub fn on_loaded(&mut self, bounds: Option<Bounds>) -> Result<(), ViewerError> {
        if self.is_disposed() {
            tracing::debug!("Viewer load completed after dispose; ignoring");
            return Ok(());
        }
        self.require(&["loading"], "finish a load")?;

        if self.strategy == Some(LoadStrategy::Full) {
            self.fit = bounds
                .as_ref()
                .map(FitTransform::for_bounds)
                .unwrap_or_default();
        }
        self.progress.complete();
        self.camera.reset();
        self.state = ViewerState::Ready;
        tracing::debug!(kind = ?self.kind, scale = self.fit.scale, "Viewer ready");
        Ok(())
    }

    /// The loader failed. There is no retry; the host calls
    /// [`reset`](Self::reset) and loads again.
    pub fn on_failed(&mut self, message: impl Into<String>) -> Result<(), ViewerError> {
        let message = message.into();
        if self.is_disposed() {
            tracing::debug!(%message, "Viewer load failed after dispose; ignoring");
            return Ok(());
        }
        self.require(&["loading"], "fail a load")?;

        tracing::warn!(kind = ?self.kind, %message, "Viewer load failed");
        self.keys.blur();
        self.state = ViewerState::Error { message };
        Ok(())
    }

    /// Return to `Idle` for a fresh load. Registered resources are kept;
    /// they belong to the view, not to the asset.
    pub fn reset(&mut self) -> Result<(), ViewerError> {
        self.require(&["idle", "loading", "ready", "error"], "reset")?;
        self.kind = None;
        self.strategy = None;
        self.progress = Progress::default();
        self.fit = FitTransform::default();
        self.camera.reset();
        self.keys.blur();
        self.state = ViewerState::Idle;
        Ok(())
    }

    /// Tear the view down from any state and hand back every registered
    /// resource for release. A second call returns nothing.
    pub fn dispose(&mut self) -> Vec<Resource> {
        if self.is_disposed() {
            return Vec::new();
        }
        let released = std::mem::take(&mut self.resources);
        tracing::debug!(from = self.state.name(), released = released.len(), "Viewer disposed");
        self.keys.blur();
        self.state = ViewerState::Disposed;
        released
    }

    // -- resources ----------------------------------------------------------

    pub fn register(&mut self, kind: ResourceKind) -> Result<ResourceHandle, ViewerError> {
        if self.is_disposed() {
            return Err(ViewerError::Disposed);
        }
        let handle = ResourceHandle(self.next_handle);
        self.next_handle += 1;
        self.resources.push(Resource { handle, kind });
        Ok(handle)
    }

    /// Forget a resource the host has already freed itself.
    pub fn release(&mut self, handle: ResourceHandle) -> Option<Resource> {
        let index = self.resources.iter().position(|r| r.handle == handle)?;
        Some(self.resources.remove(index))
    }

    // -- input and frames ---------------------------------------------------

    /// Switch camera mode. Only meaningful once the asset is displayed.
    pub fn set_camera_mode(&mut self, mode: CameraMode, now: f64) -> bool {
        if self.state != ViewerState::Ready {
            return false;
        }
        if mode == CameraMode::Video {
            self.keys.blur();
        }
        self.camera.set_mode(mode, now);
        true
    }

    pub fn rotate(&mut self, d_azimuth: f32, d_polar: f32) -> bool {
        self.state == ViewerState::Ready && self.camera.rotate(d_azimuth, d_polar)
    }

    pub fn pan(&mut self, dx: f32, dy: f32) -> bool {
        self.state == ViewerState::Ready && self.camera.pan(dx, dy)
    }

    pub fn zoom(&mut self, delta: f32) -> bool {
        self.state == ViewerState::Ready && self.camera.zoom(delta)
    }

    /// Key-down. Ignored unless interactive navigation is live.
    pub fn key_down(&mut self, key: Key) -> bool {
        if self.state != ViewerState::Ready || self.camera.mode() != CameraMode::Interactive {
            return false;
        }
        self.keys.press(key);
        true
    }

    pub fn key_up(&mut self, key: Key) {
        self.keys.release(key);
    }

    pub fn blur(&mut self) {
        self.keys.blur();
    }

    pub fn keys(&self) -> &KeyboardRig {
        &self.keys
    }

    /// Advance one animation frame and return the pose to render, or `None`
    /// when there is nothing to draw.
    pub fn frame(&mut self, now: f64) -> Option<CameraPose> {
        if self.state != ViewerState::Ready {
            return None;
        }
        let keys = &self.keys;
        self.camera.drive(|orbit| {
            keys.apply(orbit);
        });
        Some(self.camera.pose(now))
    }

    fn require(&self, allowed: &[&str], action: &'static str) -> Result<(), ViewerError> {
        let state = self.state.name();
        if allowed.contains(&state) {
            Ok(())
        } else if self.is_disposed() {
            Err(ViewerError::Disposed)
        } else {
            Err(ViewerError::InvalidTransition { action, state })
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use glam::Vec3;

    use super::*;
    use crate::loader::TARGET_VIEW_SIZE;

    fn ready(kind: AssetKind) -> ViewerSession {
        let mut session = ViewerSession::new();
        session.load(kind).unwrap();
        session.on_loaded(None).unwrap();
        session
    }

    #[test]
    fn starts_idle() {
        let mut session = ViewerSession::new();
        assert_eq!(*session.state(), ViewerState::Idle);
        assert_eq!(session.strategy(), None);
        assert!(session.frame(0.0).is_none());
    }

    #[test]
    fn splat_load_streams_progress_then_pins_to_complete() {
        let mut session = ViewerSession::new();
        assert_eq!(session.load(AssetKind::Ply).unwrap(), LoadStrategy::Streaming);

        assert_eq!(session.on_progress(30.0), Some(30.0));
        assert_eq!(session.on_progress(10.0), Some(30.0));
        assert_eq!(session.on_progress(95.5), Some(95.5));
        assert_eq!(*session.state(), ViewerState::Loading { progress: 95.5 });

        session.on_loaded(None).unwrap();
        assert_eq!(*session.state(), ViewerState::Ready);
        assert_eq!(session.progress(), 100.0);
        assert_eq!(session.fit(), FitTransform::default());
    }

    #[test]
    fn mesh_load_ignores_progress_and_fits_to_view() {
        let mut session = ViewerSession::new();
        assert_eq!(session.load(AssetKind::Glb).unwrap(), LoadStrategy::Full);
        assert_eq!(session.on_progress(50.0), None);
        assert_eq!(session.progress(), 0.0);

        let bounds = Bounds::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(4.0, 1.0, 1.0));
        session.on_loaded(Some(bounds)).unwrap();

        assert_eq!(*session.state(), ViewerState::Ready);
        assert_eq!(session.progress(), 100.0);
        assert!((session.fit().scale - TARGET_VIEW_SIZE / 4.0).abs() < 1e-6);
        assert!(session.fit().apply(bounds.center()).abs_diff_eq(Vec3::ZERO, 1e-6));
    }

    #[test]
    fn load_only_from_idle() {
        let mut session = ready(AssetKind::Ply);
        assert_matches!(
            session.load(AssetKind::Glb),
            Err(ViewerError::InvalidTransition { state: "ready", .. })
        );
    }

    #[test]
    fn failure_moves_to_error_and_reset_allows_reload() {
        let mut session = ViewerSession::new();
        session.load(AssetKind::Splat).unwrap();
        session.on_progress(20.0);
        session.on_failed("Network error while fetching model").unwrap();

        assert_eq!(
            *session.state(),
            ViewerState::Error {
                message: "Network error while fetching model".into()
            }
        );
        assert_matches!(session.load(AssetKind::Splat), Err(_));
        assert_matches!(session.on_loaded(None), Err(_));

        session.reset().unwrap();
        assert_eq!(*session.state(), ViewerState::Idle);
        assert_eq!(session.load(AssetKind::Splat).unwrap(), LoadStrategy::Streaming);
        assert_eq!(session.progress(), 0.0);
    }

    #[test]
    fn dispose_mid_load_releases_resources_and_ignores_late_events() {
        let mut session = ViewerSession::new();
        let target = session.register(ResourceKind::RenderTarget).unwrap();
        session.register(ResourceKind::ControlListener).unwrap();
        session.register(ResourceKind::FrameCallback).unwrap();
        session.load(AssetKind::Ply).unwrap();
        session.on_progress(40.0);

        let released = session.dispose();
        assert_eq!(released.len(), 3);
        assert_eq!(released[0].handle, target);
        assert!(session.resources().is_empty());
        assert_eq!(*session.state(), ViewerState::Disposed);

        assert_eq!(session.on_progress(80.0), None);
        assert!(session.on_loaded(None).is_ok());
        assert!(session.on_failed("late").is_ok());
        assert_eq!(*session.state(), ViewerState::Disposed);
        assert!(session.frame(1.0).is_none());
        assert!(session.dispose().is_empty());
    }

    #[test]
    fn disposed_session_rejects_new_work() {
        let mut session = ready(AssetKind::Glb);
        session.dispose();
        assert_matches!(session.register(ResourceKind::FrameCallback), Err(ViewerError::Disposed));
        assert_matches!(session.reset(), Err(ViewerError::Disposed));
        assert_matches!(session.load(AssetKind::Glb), Err(ViewerError::Disposed));
        assert!(!session.rotate(1.0, 0.0));
    }

    #[test]
    fn released_resources_are_not_returned_again() {
        let mut session = ViewerSession::new();
        let listener = session.register(ResourceKind::ControlListener).unwrap();
        assert_eq!(session.release(listener).map(|r| r.kind), Some(ResourceKind::ControlListener));
        assert!(session.release(listener).is_none());
        assert!(session.dispose().is_empty());
    }

    #[test]
    fn input_is_ignored_until_ready() {
        let mut session = ViewerSession::new();
        session.load(AssetKind::Ply).unwrap();
        assert!(!session.rotate(0.5, 0.0));
        assert!(!session.key_down(Key::Forward));
        assert!(!session.set_camera_mode(CameraMode::Video, 0.0));
        assert!(session.frame(0.0).is_none());
    }

    #[test]
    fn held_keys_move_the_camera_each_frame() {
        let mut session = ready(AssetKind::Ply);
        let start = session.frame(0.0).unwrap();

        assert!(session.key_down(Key::Up));
        let one = session.frame(0.016).unwrap();
        let two = session.frame(0.033).unwrap();
        assert!(one.target.y > start.target.y);
        assert!(two.target.y > one.target.y);

        session.key_up(Key::Up);
        let idle = session.frame(0.05).unwrap();
        assert_eq!(idle, two);
    }

    #[test]
    fn blur_stops_stuck_keys() {
        let mut session = ready(AssetKind::Ply);
        session.key_down(Key::Forward);
        session.blur();
        let before = session.frame(0.0).unwrap();
        assert_eq!(session.frame(1.0).unwrap(), before);
    }

    #[test]
    fn video_mode_disables_keyboard_and_pointer() {
        let mut session = ready(AssetKind::Glb);
        session.key_down(Key::Forward);
        assert!(session.set_camera_mode(CameraMode::Video, 2.0));
        assert!(!session.keys().any_held());
        assert!(!session.key_down(Key::Back));
        assert!(!session.zoom(1.0));

        let a = session.frame(5.0).unwrap();
        let b = session.frame(5.0).unwrap();
        assert_eq!(a, b);

        assert!(session.set_camera_mode(CameraMode::Interactive, 6.0));
        assert!(session.zoom(1.0));
    }

    #[test]
    fn state_serializes_with_tag() {
        let json = serde_json::to_value(ViewerState::Loading { progress: 12.5 }).unwrap();
        assert_eq!(json, serde_json::json!({"state": "loading", "progress": 12.5}));
    }
}
