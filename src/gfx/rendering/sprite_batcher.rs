//! Batched sprite rendering
//!
//! All sprites sharing a material are flattened into one vertex stream plus a
//! parallel transform stream and drawn with a single non-indexed draw. The
//! device buffers for a material are allocated on its first batch and
//! overwritten on every later one.

use std::borrow::Borrow;
use std::collections::HashMap;

use cgmath::Matrix4;

use super::instance::InstanceTransform;
use super::uniforms::{bind_camera, bind_material};
use crate::gfx::camera::Camera;
use crate::gfx::device::{GraphicsDevice, MeshHandle};
use crate::gfx::resources::cache::ResourceCache;
use crate::gfx::resources::material::MaterialId;
use crate::gfx::scene::sprite::Sprite;
use crate::gfx::scene::vertex::Vertex;

#[derive(Debug, Default)]
pub struct SpriteBatcher {
    batches: HashMap<MaterialId, MeshHandle>,
}

impl SpriteBatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of materials with allocated batch buffers
    pub fn batch_count(&self) -> usize {
        self.batches.len()
    }

    pub fn batch_handle(&self, material_id: MaterialId) -> Option<MeshHandle> {
        self.batches.get(&material_id).copied()
    }

    /// Draws `sprites`, sprite `i` placed by `transforms[i]`, with the
    /// material `material_id` resolves to.
    pub fn render<S: Borrow<Sprite>>(
        &mut self,
        device: &mut dyn GraphicsDevice,
        camera: &Camera,
        sprites: &[S],
        material_id: MaterialId,
        cache: &ResourceCache,
        transforms: &[Matrix4<f32>],
    ) {
        let (vertices, instance_transforms) = flatten_batch(sprites, transforms);
        if vertices.is_empty() {
            log::debug!("Nothing to batch for {material_id}");
            return;
        }

        let material = cache.get_material(material_id);
        let Some(program) = material.program.clone() else {
            log::warn!("Skipping sprite batch: {material_id} has no program");
            return;
        };

        let handle = match self.batches.get(&material_id) {
            Some(&handle) => {
                device.write_batch_buffers(handle, &vertices, &instance_transforms);
                handle
            }
            None => {
                let handle = device.create_batch_buffers(&vertices, &instance_transforms);
                log::debug!("Allocated sprite batch {handle} for {material_id}");
                self.batches.insert(material_id, handle);
                handle
            }
        };

        device.use_program(&program);
        bind_material(device, program.as_ref(), &material);
        bind_camera(program.as_ref(), camera);

        device.bind_mesh(handle);
        device.draw_arrays(vertices.len() as u32);
    }
}

/// Concatenates sprite vertices in order, repeating each sprite's transform
/// once per vertex. Only the prefix where both lists have entries is used.
pub fn flatten_batch<S: Borrow<Sprite>>(
    sprites: &[S],
    transforms: &[Matrix4<f32>],
) -> (Vec<Vertex>, Vec<InstanceTransform>) {
    if sprites.len() != transforms.len() {
        log::warn!(
            "Sprite batch has {} sprites but {} transforms, batching the first {}",
            sprites.len(),
            transforms.len(),
            sprites.len().min(transforms.len())
        );
    }

    let mut vertices = Vec::new();
    let mut instance_transforms = Vec::new();
    for (sprite, transform) in sprites.iter().zip(transforms) {
        let sprite_vertices = &sprite.borrow().mesh.vertices;
        vertices.extend_from_slice(sprite_vertices);
        let instance = InstanceTransform::from_matrix(transform);
        instance_transforms.extend(std::iter::repeat(instance).take(sprite_vertices.len()));
    }
    (vertices, instance_transforms)
}
