//! Held-key camera movement.
//!
//! Each held key applies one fixed step per rendered frame, independent of
//! frame time. Steps move the orbit target, so the camera travels with it.

use serde::Serialize;

use crate::camera::OrbitRig;

/// World units moved per frame by forward/back/up/down.
pub const MOVE_STEP: f32 = 0.05;
/// Radians turned per frame by left/right.
pub const TURN_STEP: f32 = 0.03;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Key {
    Forward,
    Back,
    Left,
    Right,
    Up,
    Down,
}

const ALL_KEYS: [Key; 6] = [Key::Forward, Key::Back, Key::Left, Key::Right, Key::Up, Key::Down];

impl Key {
    /// Map a DOM `KeyboardEvent.code` to a movement key.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "KeyW" | "ArrowUp" => Some(Self::Forward),
            "KeyS" | "ArrowDown" => Some(Self::Back),
            "KeyA" | "ArrowLeft" => Some(Self::Left),
            "KeyD" | "ArrowRight" => Some(Self::Right),
            "KeyE" | "PageUp" => Some(Self::Up),
            "KeyQ" | "PageDown" => Some(Self::Down),
            _ => None,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Default)]
pub struct KeyboardRig {
    held: [bool; 6],
}

impl KeyboardRig {
    pub fn press(&mut self, key: Key) {
        self.held[key.index()] = true;
    }

    pub fn release(&mut self, key: Key) {
        self.held[key.index()] = false;
    }

    /// Forget every held key. Called when the window loses focus, since the
    /// matching key-up events will never arrive.
    pub fn blur(&mut self) {
        self.held = [false; 6];
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held[key.index()]
    }

    pub fn any_held(&self) -> bool {
        self.held.iter().any(|&h| h)
    }

    /// Apply one frame of movement for every held key. Returns whether
    /// anything moved.
    pub fn apply(&self, orbit: &mut OrbitRig) -> bool {
        let mut moved = false;
        for key in ALL_KEYS.into_iter().filter(|&k| self.is_held(k)) {
            match key {
                Key::Forward => orbit.target += orbit.ground_forward() * MOVE_STEP,
                Key::Back => orbit.target -= orbit.ground_forward() * MOVE_STEP,
                Key::Left => orbit.rotate(TURN_STEP, 0.0),
                Key::Right => orbit.rotate(-TURN_STEP, 0.0),
                Key::Up => orbit.target.y += MOVE_STEP,
                Key::Down => orbit.target.y -= MOVE_STEP,
            }
            moved = true;
        }
        moved
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;

    #[test]
    fn codes_map_to_keys() {
        assert_eq!(Key::from_code("KeyW"), Some(Key::Forward));
        assert_eq!(Key::from_code("ArrowLeft"), Some(Key::Left));
        assert_eq!(Key::from_code("KeyQ"), Some(Key::Down));
        assert_eq!(Key::from_code("Enter"), None);
    }

    #[test]
    fn nothing_moves_without_held_keys() {
        let rig = KeyboardRig::default();
        let mut orbit = OrbitRig::default();
        assert!(!rig.apply(&mut orbit));
        assert_eq!(orbit, OrbitRig::default());
    }

    #[test]
    fn forward_moves_target_along_ground() {
        let mut rig = KeyboardRig::default();
        rig.press(Key::Forward);
        let mut orbit = OrbitRig::default();
        let start = orbit.target;
        assert!(rig.apply(&mut orbit));

        let moved = orbit.target - start;
        assert!((moved.length() - MOVE_STEP).abs() < 1e-5);
        assert_eq!(moved.y, 0.0);
        assert!(moved.dot(OrbitRig::default().forward()) > 0.0);
    }

    #[test]
    fn step_is_fixed_per_frame() {
        let mut rig = KeyboardRig::default();
        rig.press(Key::Up);
        let mut orbit = OrbitRig::default();
        for _ in 0..4 {
            rig.apply(&mut orbit);
        }
        assert!(orbit.target.abs_diff_eq(Vec3::new(0.0, 4.0 * MOVE_STEP, 0.0), 1e-5));
    }

    #[test]
    fn left_and_right_turn_the_orbit() {
        let mut rig = KeyboardRig::default();
        rig.press(Key::Left);
        let mut orbit = OrbitRig::default();
        rig.apply(&mut orbit);
        assert!((orbit.azimuth - (OrbitRig::default().azimuth + TURN_STEP)).abs() < 1e-6);
        assert_eq!(orbit.target, Vec3::ZERO);
    }

    #[test]
    fn release_and_blur_clear_keys() {
        let mut rig = KeyboardRig::default();
        rig.press(Key::Forward);
        rig.press(Key::Down);
        rig.release(Key::Forward);
        assert!(!rig.is_held(Key::Forward));
        assert!(rig.is_held(Key::Down));

        rig.blur();
        assert!(!rig.any_held());
    }
}
