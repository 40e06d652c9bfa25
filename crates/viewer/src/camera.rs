//! Dual-mode camera: an interactive orbit rig and a timed "video" path.
//!
//! The orbit rig stores spherical coordinates around a target point with Y
//! up: `azimuth` turns around the Y axis and `polar` is measured down from
//! +Y. Exactly one [`CameraMode`] drives the pose at a time; pointer input
//! reaching the rig while in video mode is dropped.

use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI, TAU};

use glam::Vec3;
use serde::Serialize;

// ---------------------------------------------------------------------------
// Limits and tuning
// ---------------------------------------------------------------------------

/// Polar angle limits, keeping the camera off the poles so it never flips.
pub const MIN_POLAR: f32 = 0.1;
pub const MAX_POLAR: f32 = PI - 0.1;

/// Orbit distance limits.
pub const MIN_DISTANCE: f32 = 0.5;
pub const MAX_DISTANCE: f32 = 20.0;

pub const DEFAULT_DISTANCE: f32 = 4.0;

/// Pan speed per pointer unit, relative to the current distance.
const PAN_SPEED: f32 = 0.002;

/// Video-mode orbit speed, radians per second.
pub const VIDEO_ORBIT_SPEED: f32 = 0.15;
/// Peak vertical pan of the target in video mode.
pub const VIDEO_PAN_AMPLITUDE: f32 = 0.25;
pub const VIDEO_PAN_PERIOD_SECS: f32 = 12.0;
/// Positional drift components as `(amplitude, angular frequency)`.
pub const VIDEO_DRIFT: [(f32, f32); 2] = [(0.04, 0.7), (0.015, 2.3)];

/// What the host renders from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CameraPose {
    pub position: Vec3,
    pub target: Vec3,
}

// ---------------------------------------------------------------------------
// Orbit rig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OrbitRig {
    pub target: Vec3,
    pub distance: f32,
    pub azimuth: f32,
    pub polar: f32,
}

impl Default for OrbitRig {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            distance: DEFAULT_DISTANCE,
            azimuth: FRAC_PI_4,
            polar: FRAC_PI_2 - 0.2,
        }
    }
}

impl OrbitRig {
    pub fn position(&self) -> Vec3 {
        let offset = Vec3::new(
            self.polar.sin() * self.azimuth.cos(),
            self.polar.cos(),
            self.polar.sin() * self.azimuth.sin(),
        );
        self.target + offset * self.distance
    }

    pub fn pose(&self) -> CameraPose {
        CameraPose {
            position: self.position(),
            target: self.target,
        }
    }

    /// Unit vector from the camera to the target.
    pub fn forward(&self) -> Vec3 {
        (self.target - self.position()).normalize_or_zero()
    }

    /// Forward direction projected onto the ground plane.
    pub fn ground_forward(&self) -> Vec3 {
        Vec3::new(-self.azimuth.cos(), 0.0, -self.azimuth.sin())
    }

    pub fn right(&self) -> Vec3 {
        self.forward().cross(Vec3::Y).normalize_or_zero()
    }

    pub fn up(&self) -> Vec3 {
        self.right().cross(self.forward())
    }

    pub fn rotate(&mut self, d_azimuth: f32, d_polar: f32) {
        self.azimuth = (self.azimuth + d_azimuth).rem_euclid(TAU);
        self.polar = (self.polar + d_polar).clamp(MIN_POLAR, MAX_POLAR);
    }

    /// Move the target in the view plane. Deltas are in pointer units.
    pub fn pan(&mut self, dx: f32, dy: f32) {
        let scale = self.distance * PAN_SPEED;
        self.target += self.up() * (dy * scale) - self.right() * (dx * scale);
    }

    /// Positive deltas move the camera closer.
    pub fn zoom(&mut self, delta: f32) {
        self.distance = (self.distance - delta).clamp(MIN_DISTANCE, MAX_DISTANCE);
    }
}

// ---------------------------------------------------------------------------
// Video path
// ---------------------------------------------------------------------------

/// Parametric camera path, a pure function of time since it started.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VideoPath {
    origin: OrbitRig,
    entered_at: f64,
}

impl VideoPath {
    pub fn start(origin: OrbitRig, now: f64) -> Self {
        Self {
            origin,
            entered_at: now,
        }
    }

    pub fn entered_at(&self) -> f64 {
        self.entered_at
    }

    /// Pose at `now`. Starts exactly at the origin pose; times before the
    /// start are treated as the start.
    pub fn pose_at(&self, now: f64) -> CameraPose {
        let t = (now - self.entered_at).max(0.0) as f32;

        let mut orbit = self.origin;
        orbit.azimuth += VIDEO_ORBIT_SPEED * t;
        orbit.target.y += VIDEO_PAN_AMPLITUDE * (TAU * t / VIDEO_PAN_PERIOD_SECS).sin();

        let drift: Vec3 = VIDEO_DRIFT
            .iter()
            .map(|&(amplitude, freq)| {
                let phase = freq * t;
                Vec3::new(phase.sin(), (phase * 1.5).sin(), (phase * 0.5).sin()) * amplitude
            })
            .sum();

        CameraPose {
            position: orbit.position() + drift,
            target: orbit.target,
        }
    }
}

// ---------------------------------------------------------------------------
// Mode switching
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraMode {
    Interactive,
    Video,
}

#[derive(Debug, Clone, Default)]
pub struct CameraRig {
    orbit: OrbitRig,
    video: Option<VideoPath>,
}

impl CameraRig {
    pub fn mode(&self) -> CameraMode {
        if self.video.is_some() {
            CameraMode::Video
        } else {
            CameraMode::Interactive
        }
    }

    pub fn orbit(&self) -> &OrbitRig {
        &self.orbit
    }

    /// The orbit rig, only while it is the active driver.
    pub fn interactive_mut(&mut self) -> Option<&mut OrbitRig> {
        match self.video {
            None => Some(&mut self.orbit),
            Some(_) => None,
        }
    }

    /// Switch mode. Entering video starts its clock at `now`; entering
    /// interactive resumes the orbit from where it was left.
    pub fn set_mode(&mut self, mode: CameraMode, now: f64) {
        match (mode, self.video) {
            (CameraMode::Video, None) => self.video = Some(VideoPath::start(self.orbit, now)),
            (CameraMode::Interactive, Some(_)) => self.video = None,
            _ => {}
        }
    }

    /// Point the orbit back at the origin at the default framing.
    pub fn reset(&mut self) {
        self.orbit = OrbitRig::default();
        self.video = None;
    }

    pub fn pose(&self, now: f64) -> CameraPose {
        match &self.video {
            Some(path) => path.pose_at(now),
            None => self.orbit.pose(),
        }
    }

    pub fn rotate(&mut self, d_azimuth: f32, d_polar: f32) -> bool {
        self.drive(|orbit| orbit.rotate(d_azimuth, d_polar))
    }

    pub fn pan(&mut self, dx: f32, dy: f32) -> bool {
        self.drive(|orbit| orbit.pan(dx, dy))
    }

    pub fn zoom(&mut self, delta: f32) -> bool {
        self.drive(|orbit| orbit.zoom(delta))
    }

    /// Apply `input` to the orbit if it is driving. Returns whether it was.
    pub fn drive(&mut self, input: impl FnOnce(&mut OrbitRig)) -> bool {
        match self.interactive_mut() {
            Some(orbit) => {
                input(orbit);
                true
            }
            None => false,
        }
    }
}
