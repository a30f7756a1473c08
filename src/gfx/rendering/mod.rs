// src/gfx/rendering/mod.rs
//! Drawing and the GPU backend
//!
//! Shader program abstraction, lights, the uniform binding conventions, the
//! two draw paths ([`MeshDrawer`] and [`SpriteBatcher`]) and the wgpu device.

pub mod instance;
pub mod light;
pub mod mesh_drawer;
pub mod shader;
pub mod sprite_batcher;
pub mod uniforms;
pub mod wgpu_device;

// Re-export main types
pub use instance::InstanceTransform;
pub use light::Light;
pub use mesh_drawer::MeshDrawer;
pub use shader::{ProgramId, ShaderProgram, UniformProgram, UniformValue};
pub use sprite_batcher::SpriteBatcher;
pub use wgpu_device::{DeviceConfig, DeviceError, WgpuDevice};
