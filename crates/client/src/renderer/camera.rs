//! Orbit camera with damped input.
//!
//! Yaw/pitch/distance around a fixed target. Pointer input drives goal
//! values and the rendered values ease toward them every frame, so motion
//! keeps gliding briefly after the pointer stops. The pitch clamp keeps the
//! camera at or above the horizon; panning is not supported.

use glam::{Mat4, Vec3};

use nashira_core::config::CameraConfig;

/// Orbit camera state.
pub struct OrbitCamera {
    /// Point the camera looks at and orbits.
    target: Vec3,

    // Rendered spherical coordinates.
    yaw: f32,
    pitch: f32,
    distance: f32,

    // Input-driven goals the rendered values ease toward.
    goal_yaw: f32,
    goal_pitch: f32,
    goal_distance: f32,

    fov: f32,
    aspect: f32,
    near: f32,
    far: f32,
    min_distance: f32,
    max_distance: f32,

    // Cached matrices.
    view_matrix: Mat4,
    projection_matrix: Mat4,
    position: Vec3,
}

impl OrbitCamera {
    /// Easing rate toward the goal values, per second.
    const DAMPING: f32 = 8.0;
    /// Radians of orbit per pixel of drag.
    const ROTATE_SPEED: f32 = 0.005;
    /// Distance factor per wheel step.
    const ZOOM_STEP: f32 = 0.9;
    /// Pitch clamp: never below the horizon, never exactly overhead.
    const MIN_PITCH: f32 = 0.0;
    const MAX_PITCH: f32 = std::f32::consts::FRAC_PI_2 - 0.01;

    pub fn new(config: &CameraConfig, aspect: f32) -> Self {
        let target = Vec3::ZERO;
        let offset = config.eye - target;
        let distance = offset
            .length()
            .clamp(config.min_distance, config.max_distance);
        let yaw = offset.x.atan2(offset.z);
        let pitch = (offset.y / offset.length())
            .asin()
            .clamp(Self::MIN_PITCH, Self::MAX_PITCH);

        let mut camera = Self {
            target,
            yaw,
            pitch,
            distance,
            goal_yaw: yaw,
            goal_pitch: pitch,
            goal_distance: distance,
            fov: config.fov_degrees.to_radians(),
            aspect,
            near: config.near,
            far: config.far,
            min_distance: config.min_distance,
            max_distance: config.max_distance,
            view_matrix: Mat4::IDENTITY,
            projection_matrix: Mat4::IDENTITY,
            position: Vec3::ZERO,
        };
        camera.update_matrices();
        camera
    }

    /// Apply a pointer drag of `(dx, dy)` pixels.
    pub fn orbit(&mut self, dx: f32, dy: f32) {
        self.goal_yaw -= dx * Self::ROTATE_SPEED;
        self.goal_pitch =
            (self.goal_pitch + dy * Self::ROTATE_SPEED).clamp(Self::MIN_PITCH, Self::MAX_PITCH);
    }

    /// Apply `steps` wheel clicks of zoom (positive zooms in).
    pub fn zoom(&mut self, steps: f32) {
        self.goal_distance = (self.goal_distance * Self::ZOOM_STEP.powf(steps))
            .clamp(self.min_distance, self.max_distance);
    }

    /// Ease the rendered values toward the goals and refresh the matrices.
    pub fn update(&mut self, dt: f32) {
        let k = 1.0 - (-Self::DAMPING * dt).exp();
        self.yaw += (self.goal_yaw - self.yaw) * k;
        self.pitch += (self.goal_pitch - self.pitch) * k;
        self.distance += (self.goal_distance - self.distance) * k;
        self.update_matrices();
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
        self.update_matrices();
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.view_matrix
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection_matrix
    }

    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix * self.view_matrix
    }

    fn update_matrices(&mut self) {
        let offset = Vec3::new(
            self.pitch.cos() * self.yaw.sin(),
            self.pitch.sin(),
            self.pitch.cos() * self.yaw.cos(),
        ) * self.distance;
        self.position = self.target + offset;

        self.view_matrix = Mat4::look_at_rh(self.position, self.target, Vec3::Y);
        self.projection_matrix =
            Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_camera() -> OrbitCamera {
        OrbitCamera::new(&CameraConfig::default(), 16.0 / 9.0)
    }

    #[test]
    fn initial_placement_matches_config() {
        let camera = test_camera();
        let eye = CameraConfig::default().eye;
        assert!((camera.distance() - eye.length()).abs() < 1e-4);
        assert!((camera.position() - eye).length() < 1e-3);
    }

    #[test]
    fn pitch_never_drops_below_horizon() {
        let mut camera = test_camera();
        // Drag hard downward, then settle.
        camera.orbit(0.0, -10_000.0);
        for _ in 0..300 {
            camera.update(1.0 / 60.0);
        }
        assert!(camera.pitch() >= 0.0);

        camera.orbit(0.0, 10_000.0);
        for _ in 0..300 {
            camera.update(1.0 / 60.0);
        }
        assert!(camera.pitch() <= std::f32::consts::FRAC_PI_2);
    }

    #[test]
    fn damping_converges_to_goal() {
        let mut camera = test_camera();
        let before = camera.position();
        camera.orbit(200.0, 0.0);
        // One frame moves only part of the way.
        camera.update(1.0 / 60.0);
        let partial = camera.position();
        assert!((partial - before).length() > 0.0);
        // Many frames settle on the goal.
        for _ in 0..600 {
            camera.update(1.0 / 60.0);
        }
        let settled = camera.position();
        camera.update(1.0 / 60.0);
        assert!((camera.position() - settled).length() < 1e-3);
    }

    #[test]
    fn zoom_clamps_to_configured_range() {
        let config = CameraConfig::default();
        let mut camera = test_camera();
        camera.zoom(1_000.0);
        for _ in 0..600 {
            camera.update(1.0 / 60.0);
        }
        assert!(camera.distance() >= config.min_distance - 1e-3);

        camera.zoom(-1_000.0);
        for _ in 0..600 {
            camera.update(1.0 / 60.0);
        }
        assert!(camera.distance() <= config.max_distance + 1e-3);
    }

    #[test]
    fn aspect_updates_projection() {
        let mut camera = test_camera();
        let before = camera.projection_matrix();
        camera.set_aspect(4.0 / 3.0);
        assert_ne!(before, camera.projection_matrix());
        assert_eq!(camera.aspect(), 4.0 / 3.0);
    }
}
