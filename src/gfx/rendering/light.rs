use cgmath::{Point3, Vector3};

/// Light source parameters shared by directional, point and spot lights.
///
/// Cutoff angles are stored in degrees and sent to shaders as cosines.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Light {
    pub position: Point3<f32>,
    pub direction: Vector3<f32>,
    pub ambient: Vector3<f32>,
    pub diffuse: Vector3<f32>,
    pub specular: Vector3<f32>,
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
    /// Inner spot cone half-angle, degrees
    pub cut_off: f32,
    /// Outer spot cone half-angle, degrees
    pub outer_cut_off: f32,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            position: Point3::new(0.0, 0.0, 0.0),
            direction: Vector3::new(0.0, 0.0, -1.0),
            ambient: Vector3::new(0.1, 0.1, 0.1),
            diffuse: Vector3::new(0.8, 0.8, 0.8),
            specular: Vector3::new(1.0, 1.0, 1.0),
            constant: 1.0,
            linear: 0.09,
            quadratic: 0.032,
            cut_off: 12.5,
            outer_cut_off: 17.5,
        }
    }
}

impl Light {
    pub fn point(position: Point3<f32>) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn spot(position: Point3<f32>, direction: Vector3<f32>) -> Self {
        Self {
            position,
            direction,
            ..Default::default()
        }
    }

    /// Builder pattern: Set ambient, diffuse and specular colour at once
    pub fn with_colors(
        mut self,
        ambient: Vector3<f32>,
        diffuse: Vector3<f32>,
        specular: Vector3<f32>,
    ) -> Self {
        self.ambient = ambient;
        self.diffuse = diffuse;
        self.specular = specular;
        self
    }

    /// Builder pattern: Set spot cone angles in degrees
    pub fn with_cutoffs(mut self, inner: f32, outer: f32) -> Self {
        self.cut_off = inner;
        self.outer_cut_off = outer;
        self
    }

    pub fn cut_off_cos(&self) -> f32 {
        self.cut_off.to_radians().cos()
    }

    pub fn outer_cut_off_cos(&self) -> f32 {
        self.outer_cut_off.to_radians().cos()
    }
}
