//! # Graphics Module
//!
//! Everything between asset files and draw commands.
//!
//! ## Architecture Overview
//!
//! - **Device** ([`device`]) - the [`GraphicsDevice`] trait and a recording implementation
//! - **Resources** ([`resources`]) - textures, materials and the [`ResourceCache`]
//! - **Scene** ([`scene`]) - meshes, models, sprites and the [`SceneImporter`]
//! - **Rendering** ([`rendering`]) - [`MeshDrawer`], [`SpriteBatcher`], lights,
//!   shaders and the wgpu device
//! - **Camera** ([`camera`]) - view/projection and an orbit controller
//! - **Geometry** ([`geometry`]) - procedural primitives
//!
//! ## Usage
//!
//! ```no_run
//! use cgmath::{Deg, Matrix4, Point3, SquareMatrix};
//! use glint::gfx::{Camera, MeshDrawer, RecordingDevice, ResourceCache, SceneImporter};
//! use glint::gfx::resources::Material;
//! use glint::gfx::rendering::UniformProgram;
//!
//! let mut device = RecordingDevice::new();
//! let mut cache = ResourceCache::new();
//! let program = UniformProgram::shared("lit");
//!
//! let importer = SceneImporter::new(program.clone());
//! let mut model = importer.import("assets/crate.obj", &mut cache, &mut device);
//! model.upload(&mut device);
//!
//! let camera = Camera::perspective(Deg(45.0), 16.0 / 9.0, 0.1, 100.0)
//!     .with_position(Point3::new(0.0, 1.0, 5.0))
//!     .looking_at(Point3::new(0.0, 0.0, 0.0));
//! let fallback = Material::new(program);
//! MeshDrawer::render_model(&mut device, &camera, &model, &cache, &fallback, &Matrix4::identity());
//! ```

pub mod camera;
pub mod device;
pub mod geometry;
pub mod rendering;
pub mod resources;
pub mod scene;

// Re-export commonly used types
pub use camera::{Camera, OrbitCamera};
pub use device::{GraphicsDevice, RecordingDevice};
pub use rendering::{MeshDrawer, SpriteBatcher, WgpuDevice};
pub use resources::ResourceCache;
pub use scene::SceneImporter;
