//! Uniform names and the binding steps shared by both draw paths
//!
//! Lit programs read their inputs from these exact names.

use std::collections::HashMap;

use cgmath::{EuclideanSpace, Transform};

use super::light::Light;
use super::shader::ShaderProgram;
use crate::gfx::camera::Camera;
use crate::gfx::device::{GraphicsDevice, TextureTarget};
use crate::gfx::resources::material::Material;
use crate::gfx::resources::texture::TextureKind;

pub const MATERIAL_SHININESS: &str = "material.shininess";
pub const VIEW_POS: &str = "viewPos";
pub const VIEW: &str = "view";
pub const PROJECTION: &str = "projection";
pub const MODEL: &str = "model";
pub const SKYBOX: &str = "skybox";
pub const SINGLE_LIGHT: &str = "light";
pub const POINT_LIGHTS: &str = "pointLights";
pub const SPOT_LIGHTS: &str = "spotLights";
pub const POINT_LIGHT_COUNT: &str = "nbPointLight";
pub const SPOT_LIGHT_COUNT: &str = "nbSpotLight";

/// Hands out sampler uniform names per texture kind, numbered from 1 in the
/// order textures are bound: `material.texture_diffuse1`,
/// `material.texture_diffuse2`, `material.texture_specular1`, ...
#[derive(Debug, Default)]
pub struct SamplerSlots {
    counters: HashMap<TextureKind, u32>,
}

impl SamplerSlots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_name(&mut self, kind: TextureKind) -> String {
        let counter = self.counters.entry(kind).or_insert(0);
        *counter += 1;
        format!("material.{}{}", kind.sampler_prefix(), counter)
    }
}

/// `light.position`, `pointLights[2].position`, ...
pub fn light_field(prefix: &str, field: &str) -> String {
    format!("{prefix}.{field}")
}

pub fn light_array_prefix(array: &str, index: usize) -> String {
    format!("{array}[{index}]")
}

/// Binds the material's textures to consecutive units and sets its samplers
/// and shininess on `program`.
pub(crate) fn bind_material(
    device: &mut dyn GraphicsDevice,
    program: &dyn ShaderProgram,
    material: &Material,
) {
    let mut slots = SamplerSlots::new();
    for (unit, texture) in material.textures.iter().enumerate() {
        let unit = unit as u32;
        device.bind_texture(unit, TextureTarget::D2, texture.handle);
        program.set_int(&slots.next_name(texture.kind), unit as i32);
    }
    program.set_float(MATERIAL_SHININESS, material.shininess);
}

pub(crate) fn bind_camera(program: &dyn ShaderProgram, camera: &Camera) {
    program.set_vec3(VIEW_POS, camera.position.to_vec());
    program.set_mat4(VIEW, &camera.view_matrix());
    program.set_mat4(PROJECTION, &camera.projection());
}

/// Writes every light field under `prefix`, with the position moved into
/// view space.
pub(crate) fn write_light(
    program: &dyn ShaderProgram,
    prefix: &str,
    light: &Light,
    camera: &Camera,
) {
    let view_position = camera.view_matrix().transform_point(light.position);

    program.set_vec3(&light_field(prefix, "position"), view_position.to_vec());
    program.set_vec3(&light_field(prefix, "direction"), light.direction);
    program.set_vec3(&light_field(prefix, "ambient"), light.ambient);
    program.set_vec3(&light_field(prefix, "diffuse"), light.diffuse);
    program.set_vec3(&light_field(prefix, "specular"), light.specular);
    program.set_float(&light_field(prefix, "constant"), light.constant);
    program.set_float(&light_field(prefix, "linear"), light.linear);
    program.set_float(&light_field(prefix, "quadratic"), light.quadratic);
    program.set_float(&light_field(prefix, "cutOff"), light.cut_off_cos());
    program.set_float(&light_field(prefix, "outerCutOff"), light.outer_cut_off_cos());
}
