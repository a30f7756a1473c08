//! # Procedural Geometry Generation
//!
//! This module provides functions to generate common primitive shapes
//! procedurally, so demos need no model files for basic shapes.
//!
//! ## Supported Primitives
//!
//! - **Cube**: Unit cube, 36 vertices, non-indexed
//! - **Skybox**: Position-only cube for cube-map backgrounds
//! - **Quad**: Unit quad of two triangles, the base of every sprite
//! - **Plane**: Subdivided plane, indexed
//! - **Screen quad**: Quad covering normalized device coordinates
//!
//! ## Usage
//!
//! ```rust
//! use glint::gfx::geometry::{generate_cube, generate_plane};
//!
//! let cube = generate_cube().to_mesh();
//! assert_eq!(cube.vertices.len(), 36);
//!
//! let plane = generate_plane(10.0, 10.0, 4, 4);
//! assert_eq!(plane.triangle_count(), 32);
//! ```

pub mod primitives;

pub use primitives::*;

use crate::gfx::scene::mesh::Mesh;
use crate::gfx::scene::vertex::Vertex;

/// Represents generated geometry data ready for GPU upload
#[derive(Debug, Clone, Default)]
pub struct GeometryData {
    /// Vertex positions (x, y, z)
    pub vertices: Vec<[f32; 3]>,
    /// Texture coordinates (u, v)
    pub tex_coords: Vec<[f32; 2]>,
    /// Normal vectors (x, y, z)
    pub normals: Vec<[f32; 3]>,
    /// Triangle indices (counter-clockwise winding); empty for triangle lists
    pub indices: Vec<u32>,
}

impl GeometryData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        if self.indices.is_empty() {
            self.vertices.len() / 3
        } else {
            self.indices.len() / 3
        }
    }

    /// Expands indexed geometry into a plain triangle list
    pub fn unindexed(self) -> Self {
        if self.indices.is_empty() {
            return self;
        }

        let pick = |i: &u32| *i as usize;
        Self {
            vertices: self
                .indices
                .iter()
                .filter_map(|i| self.vertices.get(pick(i)).copied())
                .collect(),
            tex_coords: self
                .indices
                .iter()
                .filter_map(|i| self.tex_coords.get(pick(i)).copied())
                .collect(),
            normals: self
                .indices
                .iter()
                .filter_map(|i| self.normals.get(pick(i)).copied())
                .collect(),
            indices: Vec::new(),
        }
    }

    /// Interleaves into a [`Mesh`]; missing normals default to +Y and missing
    /// texture coordinates to (0, 0).
    pub fn to_mesh(&self) -> Mesh {
        let vertices = self
            .vertices
            .iter()
            .enumerate()
            .map(|(i, &position)| {
                Vertex::new(
                    position,
                    self.normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]),
                    self.tex_coords.get(i).copied().unwrap_or_default(),
                )
            })
            .collect();

        Mesh::new(vertices, self.indices.clone())
    }
}
