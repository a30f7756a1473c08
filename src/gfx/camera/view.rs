use cgmath::{
    perspective, Angle, Deg, EuclideanSpace, InnerSpace, Matrix3, Matrix4, Point3, SquareMatrix,
    Vector3,
};

/// Maps OpenGL clip-space depth (-1..1) to wgpu's (0..1)
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Pitch limit of free-look cameras, short of straight up or down
const MAX_PITCH: Deg<f32> = Deg(89.0);

/// How the camera's viewing direction is defined
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Orientation {
    /// Always faces `target`
    LookAt { target: Point3<f32> },
    /// Faces the direction given by yaw (around up) and pitch
    FreeLook { yaw: Deg<f32>, pitch: Deg<f32> },
}

/// View and projection source for every draw.
///
/// The projection is fixed at construction. The view matrix is rebuilt from
/// position and orientation on every call, with `transform` applied after it.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Camera {
    pub position: Point3<f32>,
    pub world_up: Vector3<f32>,
    pub orientation: Orientation,
    /// Extra model transform multiplied onto the view, identity by default
    pub transform: Matrix4<f32>,
    projection: Matrix4<f32>,
}

impl Camera {
    /// A free-look camera at the origin facing -Z
    pub fn new(projection: Matrix4<f32>) -> Self {
        Self {
            position: Point3::origin(),
            world_up: Vector3::unit_y(),
            orientation: Orientation::FreeLook {
                yaw: Deg(-90.0),
                pitch: Deg(0.0),
            },
            transform: Matrix4::identity(),
            projection,
        }
    }

    /// Perspective projection corrected for wgpu's depth range
    pub fn perspective(fovy: Deg<f32>, aspect: f32, znear: f32, zfar: f32) -> Self {
        Self::new(OPENGL_TO_WGPU_MATRIX * perspective(fovy, aspect, znear, zfar))
    }

    /// Builder pattern: Set position
    pub fn with_position(mut self, position: Point3<f32>) -> Self {
        self.position = position;
        self
    }

    /// Builder pattern: Face a fixed target
    pub fn looking_at(mut self, target: Point3<f32>) -> Self {
        self.orientation = Orientation::LookAt { target };
        self
    }

    pub fn look_at(&mut self, target: Point3<f32>) {
        self.orientation = Orientation::LookAt { target };
    }

    /// Switches to free-look, with pitch limited to +-89 degrees
    pub fn set_yaw_pitch(&mut self, yaw: Deg<f32>, pitch: Deg<f32>) {
        let pitch = Deg(pitch.0.clamp(-MAX_PITCH.0, MAX_PITCH.0));
        self.orientation = Orientation::FreeLook { yaw, pitch };
    }

    pub fn projection(&self) -> Matrix4<f32> {
        self.projection
    }

    /// Unit viewing direction
    pub fn front(&self) -> Vector3<f32> {
        match self.orientation {
            Orientation::LookAt { target } => {
                let direction = target - self.position;
                if direction.magnitude2() > 0.0 {
                    direction.normalize()
                } else {
                    -Vector3::unit_z()
                }
            }
            Orientation::FreeLook { yaw, pitch } => Vector3::new(
                yaw.cos() * pitch.cos(),
                pitch.sin(),
                yaw.sin() * pitch.cos(),
            )
            .normalize(),
        }
    }

    pub fn right(&self) -> Vector3<f32> {
        self.front().cross(self.world_up).normalize()
    }

    pub fn up(&self) -> Vector3<f32> {
        self.right().cross(self.front()).normalize()
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        let view = match self.orientation {
            Orientation::LookAt { target } => {
                Matrix4::look_at_rh(self.position, target, self.world_up)
            }
            Orientation::FreeLook { .. } => {
                Matrix4::look_at_rh(self.position, self.position + self.front(), self.up())
            }
        };
        view * self.transform
    }

    /// View matrix without its translation, for backgrounds at infinity
    pub fn rotation_only_view(&self) -> Matrix4<f32> {
        let view = self.view_matrix();
        Matrix4::from(Matrix3::from_cols(
            view.x.truncate(),
            view.y.truncate(),
            view.z.truncate(),
        ))
    }
}
