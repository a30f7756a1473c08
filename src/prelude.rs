//! # Glint Prelude
//!
//! Commonly used types in one import:
//!
//! ```rust
//! use glint::prelude::*;
//!
//! let sheet = SpriteSheet::fixed_size(4, 4);
//! assert_eq!(sheet.len(), 16);
//! ```

// Device layer
pub use crate::gfx::device::{GraphicsDevice, MeshHandle, RecordingDevice, TextureHandle};

// Resources
pub use crate::gfx::resources::{Image, Material, MaterialId, ResourceCache, Texture, TextureKind};

// Scene
pub use crate::gfx::geometry::{
    generate_cube, generate_plane, generate_quad, generate_skybox, GeometryData,
};
pub use crate::gfx::scene::{
    AnimatedSprite, Mesh, Model, SceneImporter, Sprite, SpriteSheet, Vertex,
};

// Rendering
pub use crate::gfx::camera::{Camera, OrbitCamera};
pub use crate::gfx::rendering::{
    DeviceConfig, Light, MeshDrawer, ShaderProgram, SpriteBatcher, UniformProgram, WgpuDevice,
};
