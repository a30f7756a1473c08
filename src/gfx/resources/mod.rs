// src/gfx/resources/mod.rs
//! GPU resource management
//!
//! Textures, materials and the cache that deduplicates their uploads.

pub mod cache;
pub mod material;
pub mod texture;
pub mod texture_resource;

// Re-export main types
pub use cache::ResourceCache;
pub use material::{Material, MaterialId};
pub use texture::{DecodedImage, Image, ImageCrateDecoder, ImageDecoder, Texture, TextureKind};
pub use texture_resource::{TextureResource, TextureSettings};
