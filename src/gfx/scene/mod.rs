//! # Scene Module
//!
//! Mesh data and everything that produces it: the vertex format, meshes and
//! models, the scene importer with its OBJ and glTF parsers, and sprites.
//!
//! ## Key Components
//!
//! - [`Vertex`] - position, normal and texture coordinate
//! - [`Mesh`] / [`Model`] - vertex data plus device handle and material id
//! - [`SceneImporter`] - external scene file to [`Model`]
//! - [`Sprite`], [`SpriteSheet`], [`AnimatedSprite`] - textured quads
//!
//! ## Usage
//!
//! ```no_run
//! use glint::gfx::device::RecordingDevice;
//! use glint::gfx::rendering::shader::UniformProgram;
//! use glint::gfx::resources::cache::ResourceCache;
//! use glint::gfx::scene::SceneImporter;
//!
//! let mut device = RecordingDevice::new();
//! let mut cache = ResourceCache::new();
//! let importer = SceneImporter::new(UniformProgram::shared("lit"));
//!
//! let mut model = importer.import("assets/backpack.obj", &mut cache, &mut device);
//! model.upload(&mut device);
//! ```

pub mod gltf_parser;
pub mod importer;
pub mod mesh;
pub mod obj_parser;
pub mod parsed;
pub mod sprite;
pub mod vertex;

pub use importer::SceneImporter;
pub use mesh::{Mesh, Model};
pub use parsed::{ImportError, ParsedScene, PostProcess, SceneParser};
pub use sprite::{AnimatedSprite, Sprite, SpriteSheet};
pub use vertex::Vertex;
