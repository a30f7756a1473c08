pub mod orbit_camera;
pub mod view;

// Re-export main types
pub use orbit_camera::{OrbitCamera, OrbitCameraBounds};
pub use view::{Camera, Orientation, OPENGL_TO_WGPU_MATRIX};
