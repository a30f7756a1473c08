use cgmath::{EuclideanSpace, InnerSpace, Point3, Vector3};

use super::view::Camera;

/// Orbits a target at a distance, steering a look-at [`Camera`].
///
/// Pitch and yaw are in radians; pitch 0 and yaw 0 put the eye on the +Z side
/// of the target.
#[derive(Debug, Clone, Copy)]
pub struct OrbitCamera {
    pub distance: f32,
    pub pitch: f32,
    pub yaw: f32,
    pub target: Point3<f32>,
    pub bounds: OrbitCameraBounds,
    eye: Point3<f32>,
}

impl OrbitCamera {
    pub fn new(distance: f32, pitch: f32, yaw: f32, target: Point3<f32>) -> Self {
        let mut camera = Self {
            distance,
            pitch,
            yaw,
            target,
            bounds: OrbitCameraBounds::default(),
            eye: target,
        };
        camera.update();
        camera
    }

    pub fn eye(&self) -> Point3<f32> {
        self.eye
    }

    pub fn set_distance(&mut self, distance: f32) {
        self.distance = distance.clamp(
            self.bounds.min_distance.unwrap_or(f32::EPSILON),
            self.bounds.max_distance.unwrap_or(f32::MAX),
        );
        self.update();
    }

    /// Zooms proportionally to the current distance
    pub fn add_distance(&mut self, delta: f32) {
        let corrected_zoom = f32::log10(self.distance.max(1.0 + f32::EPSILON)) * delta;
        self.set_distance(self.distance + corrected_zoom);
    }

    pub fn set_pitch(&mut self, pitch: f32) {
        self.pitch = pitch.clamp(self.bounds.min_pitch, self.bounds.max_pitch);
        self.update();
    }

    pub fn add_pitch(&mut self, delta: f32) {
        self.set_pitch(self.pitch + delta);
    }

    pub fn set_yaw(&mut self, yaw: f32) {
        let mut bounded_yaw = yaw;
        if let Some(min_yaw) = self.bounds.min_yaw {
            bounded_yaw = bounded_yaw.max(min_yaw);
        }
        if let Some(max_yaw) = self.bounds.max_yaw {
            bounded_yaw = bounded_yaw.min(max_yaw);
        }
        self.yaw = bounded_yaw;
        self.update();
    }

    pub fn add_yaw(&mut self, delta: f32) {
        self.set_yaw(self.yaw + delta);
    }

    /// Pans eye and target together in the view plane.
    /// `delta.0` moves right, `delta.1` moves up.
    pub fn pan(&mut self, delta: (f32, f32), world_up: Vector3<f32>) {
        let forward = (self.target - self.eye).normalize();
        let right = forward.cross(world_up).normalize();
        let up = right.cross(forward).normalize();

        // Scaled by distance for a consistent feel at every zoom level
        let pan_scale = self.distance * 0.1;
        let movement = right * delta.0 * pan_scale + up * delta.1 * pan_scale;

        self.eye += movement;
        self.target += movement;
    }

    /// Moves `camera` to the orbit eye, facing the target
    pub fn apply(&self, camera: &mut Camera) {
        camera.position = self.eye;
        camera.look_at(self.target);
    }

    fn update(&mut self) {
        self.eye =
            calculate_cartesian_eye_position(self.pitch, self.yaw, self.distance, self.target);
    }
}

#[derive(Debug, Clone, Copy)]
pub struct OrbitCameraBounds {
    pub min_distance: Option<f32>,
    pub max_distance: Option<f32>,
    pub min_pitch: f32,
    pub max_pitch: f32,
    pub min_yaw: Option<f32>,
    pub max_yaw: Option<f32>,
}

impl Default for OrbitCameraBounds {
    fn default() -> Self {
        Self {
            min_distance: None,
            max_distance: Some(100.0),
            min_pitch: -std::f32::consts::FRAC_PI_2 + f32::EPSILON,
            max_pitch: std::f32::consts::FRAC_PI_2 - f32::EPSILON,
            min_yaw: None,
            max_yaw: None,
        }
    }
}

fn calculate_cartesian_eye_position(
    pitch: f32,
    yaw: f32,
    distance: f32,
    target: Point3<f32>,
) -> Point3<f32> {
    target
        + Vector3::new(
            distance * yaw.sin() * pitch.cos(),
            distance * pitch.sin(),
            distance * yaw.cos() * pitch.cos(),
        )
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::new(8.0, 0.4, 0.2, Point3::origin())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Matrix4, SquareMatrix};

    #[test]
    fn test_zero_angles_put_eye_on_positive_z() {
        let orbit = OrbitCamera::new(5.0, 0.0, 0.0, Point3::new(1.0, 0.0, 0.0));
        let eye = orbit.eye();
        approx::assert_abs_diff_eq!(eye.x, 1.0, epsilon = 1e-6);
        approx::assert_abs_diff_eq!(eye.z, 5.0, epsilon = 1e-6);
    }

    #[test]
    fn test_bounds_clamp_distance_and_pitch() {
        let mut orbit = OrbitCamera::default();
        orbit.set_distance(1000.0);
        assert_eq!(orbit.distance, 100.0);

        orbit.set_pitch(10.0);
        assert!(orbit.pitch < std::f32::consts::FRAC_PI_2);

        orbit.bounds.max_yaw = Some(1.0);
        orbit.add_yaw(5.0);
        assert_eq!(orbit.yaw, 1.0);
    }

    #[test]
    fn test_apply_drives_look_at_camera() {
        let orbit = OrbitCamera::new(3.0, 0.0, 0.0, Point3::origin());
        let mut camera = Camera::new(Matrix4::identity());
        orbit.apply(&mut camera);

        assert_eq!(camera.position, orbit.eye());
        let front = camera.front();
        approx::assert_abs_diff_eq!(front.z, -1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_pan_moves_eye_and_target_together() {
        let mut orbit = OrbitCamera::new(10.0, 0.0, 0.0, Point3::origin());
        let offset_before = orbit.eye() - orbit.target;
        orbit.pan((1.0, 0.0), Vector3::unit_y());

        assert_eq!(orbit.eye() - orbit.target, offset_before);
        approx::assert_abs_diff_eq!(orbit.target.x, 1.0, epsilon = 1e-6);
    }
}
