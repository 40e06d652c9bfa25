//! Client-side viewer session for generated 3D assets.
//!
//! A [`ViewerSession`] owns the load/display/dispose lifecycle of one asset
//! and the camera that navigates it. Rendering itself is the host's job: the
//! session tells the host what to draw from (a [`CameraPose`], a
//! [`FitTransform`]) and which graphics resources to free on teardown.
//!
//! Time is always passed in by the caller as seconds on a monotonic clock,
//! so every camera path is reproducible from its inputs.

pub mod camera;
pub mod error;
pub mod keyboard;
pub mod loader;
pub mod session;

pub use camera::{CameraMode, CameraPose, CameraRig, OrbitRig, VideoPath};
pub use error::ViewerError;
pub use keyboard::{Key, KeyboardRig};
pub use loader::{Bounds, FitTransform, LoadStrategy, Progress, TARGET_VIEW_SIZE};
pub use session::{Resource, ResourceHandle, ResourceKind, ViewerSession, ViewerState};
