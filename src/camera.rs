//! Camera for the rotating point-cloud view.

use glam::{Vec2, Vec3};

/// Smallest allowed zoom scale (pixels per attractor unit).
pub const MIN_SCALE: f32 = 10.0;
/// Largest allowed zoom scale.
pub const MAX_SCALE: f32 = 400.0;
/// Default zoom scale.
pub const DEFAULT_SCALE: f32 = 20.0;
/// Ambient rotation applied each frame while the user is not panning.
pub const AMBIENT_ROTATION: f32 = 0.005;

/// Camera transform fed to the compositor.
///
/// The camera orbits the vertical axis; `angle` is an unbounded
/// accumulator and wraps implicitly through the trig functions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    /// Rotation about the vertical axis in radians.
    pub angle: f32,
    /// Zoom in pixels per attractor unit, kept in `[MIN_SCALE, MAX_SCALE]`.
    scale: f32,
    /// Screen-space center of the frame image in pixels.
    center: Vec2,
}

impl CameraState {
    /// Create a camera centred on a square frame image of `side` pixels.
    pub fn new(side: u32) -> Self {
        let half = (side / 2) as f32;
        Self {
            angle: 0.0,
            scale: DEFAULT_SCALE,
            center: Vec2::splat(half),
        }
    }

    /// Current zoom scale.
    #[inline]
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Set the zoom scale, clamped to the allowed range. NaN is ignored.
    pub fn set_scale(&mut self, scale: f32) {
        if !scale.is_nan() {
            self.scale = clamp_scale(scale);
        }
    }

    /// Fixed screen-space center.
    #[inline]
    pub fn center(&self) -> Vec2 {
        self.center
    }

    /// End-of-frame update: rotate by `step` unless the user is panning.
    pub fn advance(&mut self, panning: bool, step: f32) {
        if !panning {
            self.angle += step;
        }
    }

    /// Project an attractor-space point to frame pixels.
    ///
    /// Rotates about the y axis by `angle`, scales, flips y so that up is
    /// up on screen, and translates to `center`.
    pub fn project(&self, p: Vec3) -> Vec2 {
        let (sin, cos) = self.angle.sin_cos();
        let x = p.x * cos - p.z * sin;
        let y = p.y;
        self.center + Vec2::new(x, -y) * self.scale
    }
}

/// Clamp a scale into `[MIN_SCALE, MAX_SCALE]`. NaN falls back to the minimum.
pub fn clamp_scale(scale: f32) -> f32 {
    if scale.is_nan() {
        MIN_SCALE
    } else {
        scale.clamp(MIN_SCALE, MAX_SCALE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_from_resolution() {
        let camera = CameraState::new(1024);
        assert_eq!(camera.center(), Vec2::new(512.0, 512.0));
        assert_eq!(camera.scale(), DEFAULT_SCALE);
        assert_eq!(camera.angle, 0.0);
    }

    #[test]
    fn test_scale_clamped() {
        let mut camera = CameraState::new(100);
        camera.set_scale(1000.0);
        assert_eq!(camera.scale(), MAX_SCALE);
        camera.set_scale(f32::NAN);
        assert_eq!(camera.scale(), MAX_SCALE);
        camera.set_scale(0.1);
        assert_eq!(camera.scale(), MIN_SCALE);
        camera.set_scale(f32::INFINITY);
        assert_eq!(camera.scale(), MAX_SCALE);
    }

    #[test]
    fn test_advance_respects_panning() {
        let mut camera = CameraState::new(100);
        camera.advance(true, AMBIENT_ROTATION);
        assert_eq!(camera.angle, 0.0);
        camera.advance(false, AMBIENT_ROTATION);
        assert_eq!(camera.angle, AMBIENT_ROTATION);
    }

    #[test]
    fn test_project_origin_lands_on_center() {
        let mut camera = CameraState::new(200);
        camera.angle = 1.3;
        assert_eq!(camera.project(Vec3::ZERO), Vec2::new(100.0, 100.0));
    }

    #[test]
    fn test_project_rotation() {
        let mut camera = CameraState::new(200);
        camera.set_scale(10.0);
        let p = Vec3::new(1.0, 2.0, 0.0);
        let screen = camera.project(p);
        assert!((screen.x - 110.0).abs() < 1e-4);
        assert!((screen.y - 80.0).abs() < 1e-4);

        // a quarter turn swings +z onto the x axis
        camera.angle = -std::f32::consts::FRAC_PI_2;
        let screen = camera.project(Vec3::new(0.0, 0.0, 1.0));
        assert!((screen.x - 110.0).abs() < 1e-4);
    }
}
