//! Single-mesh draw path
//!
//! Every draw binds, in order: program, material textures and samplers,
//! camera uniforms, model transform, mesh buffers; then issues one indexed
//! or triangle-list draw. Lights are written straight into a program and
//! stay set for every later draw with it.

use std::rc::Rc;

use cgmath::Matrix4;

use super::light::Light;
use super::shader::ShaderProgram;
use super::uniforms::{
    bind_camera, bind_material, light_array_prefix, write_light, MODEL, POINT_LIGHTS,
    POINT_LIGHT_COUNT, PROJECTION, SINGLE_LIGHT, SKYBOX, SPOT_LIGHTS, SPOT_LIGHT_COUNT, VIEW,
};
use crate::gfx::camera::Camera;
use crate::gfx::device::{DepthCompare, GraphicsDevice, TextureHandle, TextureTarget};
use crate::gfx::resources::cache::ResourceCache;
use crate::gfx::resources::material::Material;
use crate::gfx::scene::mesh::{Mesh, Model};

/// Stateless mesh renderer
pub struct MeshDrawer;

impl MeshDrawer {
    /// Sets the single `light` uniform block, position in view space
    pub fn use_light(program: &dyn ShaderProgram, light: &Light, camera: &Camera) {
        write_light(program, SINGLE_LIGHT, light, camera);
    }

    /// Fills `pointLights[i]` and sets `nbPointLight`
    pub fn add_point_lights(program: &dyn ShaderProgram, lights: &[Light], camera: &Camera) {
        Self::write_light_array(program, POINT_LIGHTS, POINT_LIGHT_COUNT, lights, camera);
    }

    /// Fills `spotLights[i]` and sets `nbSpotLight`
    pub fn add_spot_lights(program: &dyn ShaderProgram, lights: &[Light], camera: &Camera) {
        Self::write_light_array(program, SPOT_LIGHTS, SPOT_LIGHT_COUNT, lights, camera);
    }

    fn write_light_array(
        program: &dyn ShaderProgram,
        array: &str,
        count_uniform: &str,
        lights: &[Light],
        camera: &Camera,
    ) {
        for (index, light) in lights.iter().enumerate() {
            write_light(program, &light_array_prefix(array, index), light, camera);
        }
        program.set_int(count_uniform, lights.len() as i32);
    }

    /// Draws `mesh` with its material's own program
    pub fn render(
        device: &mut dyn GraphicsDevice,
        camera: &Camera,
        mesh: &Mesh,
        material: &Material,
        transform: &Matrix4<f32>,
    ) {
        let Some(program) = &material.program else {
            log::warn!("Skipping {}: material has no program", mesh.handle());
            return;
        };
        Self::render_with_program(device, camera, mesh, material, program, transform);
    }

    /// Draws `mesh` with `program` instead of the material's program
    pub fn render_with_program(
        device: &mut dyn GraphicsDevice,
        camera: &Camera,
        mesh: &Mesh,
        material: &Material,
        program: &Rc<dyn ShaderProgram>,
        transform: &Matrix4<f32>,
    ) {
        if !mesh.is_uploaded() {
            log::warn!(
                "Skipping mesh of {} vertices: never uploaded",
                mesh.vertices.len()
            );
            return;
        }

        device.use_program(program);
        bind_material(device, program.as_ref(), material);
        bind_camera(program.as_ref(), camera);
        program.set_mat4(MODEL, transform);

        device.bind_mesh(mesh.handle());
        if mesh.is_indexed() {
            device.draw_indexed(mesh.element_count());
        } else {
            device.draw_arrays(mesh.element_count());
        }
    }

    /// Draws every mesh of `model`, each with the material its id resolves
    /// to; meshes without a material id use `default_material`.
    pub fn render_model(
        device: &mut dyn GraphicsDevice,
        camera: &Camera,
        model: &Model,
        cache: &ResourceCache,
        default_material: &Material,
        transform: &Matrix4<f32>,
    ) {
        for mesh in &model.meshes {
            let resolved;
            let material = match mesh.material_id {
                Some(id) => {
                    resolved = cache.get_material(id);
                    &resolved
                }
                None => default_material,
            };
            Self::render(device, camera, mesh, material, transform);
        }
    }

    /// Draws a cube-mapped background behind everything already drawn.
    ///
    /// Uses the rotation-only view so the box never moves with the camera, and
    /// compares depth with less-or-equal for the duration of the draw.
    pub fn render_skybox(
        device: &mut dyn GraphicsDevice,
        camera: &Camera,
        mesh: &Mesh,
        program: &Rc<dyn ShaderProgram>,
        cube_map: TextureHandle,
    ) {
        if !mesh.is_uploaded() {
            log::warn!("Skipping skybox: mesh never uploaded");
            return;
        }

        device.set_depth_compare(DepthCompare::LessEqual);
        device.use_program(program);
        program.set_mat4(VIEW, &camera.rotation_only_view());
        program.set_mat4(PROJECTION, &camera.projection());

        device.bind_texture(0, TextureTarget::Cube, cube_map);
        program.set_int(SKYBOX, 0);

        device.bind_mesh(mesh.handle());
        if mesh.is_indexed() {
            device.draw_indexed(mesh.element_count());
        } else {
            device.draw_arrays(mesh.element_count());
        }
        device.set_depth_compare(DepthCompare::Less);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::device::{DrawKind, RecordingDevice};
    use crate::gfx::geometry::{generate_cube, generate_plane, generate_skybox};
    use crate::gfx::rendering::shader::{UniformProgram, UniformValue};
    use crate::gfx::resources::texture::{Texture, TextureKind};
    use cgmath::{Deg, EuclideanSpace, Point3, SquareMatrix, Vector3};

    fn camera() -> Camera {
        Camera::perspective(Deg(45.0), 1.0, 0.1, 100.0)
            .with_position(Point3::new(0.0, 0.0, 5.0))
            .looking_at(Point3::origin())
    }

    fn program() -> (Rc<UniformProgram>, Rc<dyn ShaderProgram>) {
        let program = Rc::new(UniformProgram::new("lit"));
        let shared: Rc<dyn ShaderProgram> = program.clone();
        (program, shared)
    }

    fn uploaded(mut mesh: Mesh, device: &mut RecordingDevice) -> Mesh {
        mesh.upload(device);
        mesh
    }

    #[test]
    fn test_render_binds_textures_by_kind() {
        let mut device = RecordingDevice::new();
        let (_, shared) = program();
        let mesh = uploaded(generate_plane(1.0, 1.0, 1, 1).to_mesh(), &mut device);
        let material = Material::new(shared)
            .with_shininess(16.0)
            .with_texture(Texture::new(TextureHandle(11), TextureKind::Diffuse))
            .with_texture(Texture::new(TextureHandle(12), TextureKind::Specular))
            .with_texture(Texture::new(TextureHandle(13), TextureKind::Diffuse));

        MeshDrawer::render(&mut device, &camera(), &mesh, &material, &Matrix4::identity());

        let calls = device.draw_calls();
        assert_eq!(calls.len(), 1);
        let call = &calls[0];
        assert_eq!(call.kind, DrawKind::Indexed { index_count: 6 });
        assert_eq!(call.mesh, mesh.handle());

        let uniform = |name: &str| call.uniforms.get(name).copied();
        assert_eq!(uniform("material.texture_diffuse1"), Some(UniformValue::Int(0)));
        assert_eq!(uniform("material.texture_specular1"), Some(UniformValue::Int(1)));
        assert_eq!(uniform("material.texture_diffuse2"), Some(UniformValue::Int(2)));
        assert_eq!(uniform("material.shininess"), Some(UniformValue::Float(16.0)));
        assert_eq!(uniform("viewPos"), Some(UniformValue::Vec3([0.0, 0.0, 5.0])));
        assert!(uniform("view").is_some());
        assert!(uniform("projection").is_some());
        assert_eq!(
            uniform("model").and_then(|v| v.as_mat4()),
            Some(Matrix4::identity())
        );
        assert_eq!(call.texture_on_unit(2).map(|b| b.texture), Some(TextureHandle(13)));
    }

    #[test]
    fn test_render_with_program_overrides_material_program() {
        let mut device = RecordingDevice::new();
        let (material_program, material_shared) = program();
        let (override_program, override_shared) = program();
        let mesh = uploaded(generate_plane(1.0, 1.0, 1, 1).to_mesh(), &mut device);
        let material = Material::new(material_shared)
            .with_shininess(8.0)
            .with_texture(Texture::new(TextureHandle(21), TextureKind::Diffuse));
        let transform = Matrix4::from_translation(Vector3::new(1.0, 2.0, 3.0));

        MeshDrawer::render_with_program(
            &mut device,
            &camera(),
            &mesh,
            &material,
            &override_shared,
            &transform,
        );

        let calls = device.draw_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].program, Some(override_shared.id()));
        assert_eq!(calls[0].texture_on_unit(0).map(|b| b.texture), Some(TextureHandle(21)));
        assert_eq!(
            override_program.get("model").and_then(|v| v.as_mat4()),
            Some(transform)
        );
        assert_eq!(
            override_program.get("material.shininess"),
            Some(UniformValue::Float(8.0))
        );
        assert!(material_program.get("model").is_none());
        assert!(material_program.get("material.texture_diffuse1").is_none());
    }

    #[test]
    fn test_unindexed_mesh_draws_arrays() {
        let mut device = RecordingDevice::new();
        let (_, shared) = program();
        let mesh = uploaded(generate_cube().to_mesh(), &mut device);

        let material = Material::new(shared);
        MeshDrawer::render(&mut device, &camera(), &mesh, &material, &Matrix4::identity());

        assert_eq!(device.draw_calls()[0].kind, DrawKind::Arrays { vertex_count: 36 });
    }

    #[test]
    fn test_unusable_draws_are_skipped() {
        let mut device = RecordingDevice::new();
        let (_, shared) = program();
        let never_uploaded = generate_cube().to_mesh();

        MeshDrawer::render(
            &mut device,
            &camera(),
            &never_uploaded,
            &Material::new(shared),
            &Matrix4::identity(),
        );

        let mesh = uploaded(generate_cube().to_mesh(), &mut device);
        let material = Material::default();
        MeshDrawer::render(&mut device, &camera(), &mesh, &material, &Matrix4::identity());

        assert!(device.draw_calls().is_empty());
    }

    #[test]
    fn test_render_model_falls_back_to_default_material() {
        let mut device = RecordingDevice::new();
        let mut cache = ResourceCache::new();
        let (_, imported_program) = program();
        let (_, default_program) = program();

        let id = cache.add_material(Material::new(imported_program.clone()));
        let mut model = Model::new(vec![
            generate_cube().to_mesh().with_material(id),
            generate_cube().to_mesh(),
        ]);
        model.upload(&mut device);

        MeshDrawer::render_model(
            &mut device,
            &camera(),
            &model,
            &cache,
            &Material::new(default_program.clone()),
            &Matrix4::identity(),
        );

        let programs: Vec<_> = device.draw_calls().iter().map(|c| c.program).collect();
        assert_eq!(
            programs,
            vec![Some(imported_program.id()), Some(default_program.id())]
        );
    }

    #[test]
    fn test_skybox_uses_rotation_only_view_and_restores_depth() {
        let mut device = RecordingDevice::new();
        let (_, shared) = program();
        let mesh = uploaded(generate_skybox().to_mesh(), &mut device);

        MeshDrawer::render_skybox(&mut device, &camera(), &mesh, &shared, TextureHandle(7));

        let call = &device.draw_calls()[0];
        assert_eq!(call.depth_compare, DepthCompare::LessEqual);
        let binding = call.texture_on_unit(0).unwrap();
        assert_eq!(binding.target, TextureTarget::Cube);
        assert_eq!(binding.texture, TextureHandle(7));
        assert_eq!(call.uniforms.get("skybox"), Some(&UniformValue::Int(0)));

        let view = call.uniforms.get("view").and_then(|v| v.as_mat4()).unwrap();
        assert_eq!(view.w.truncate(), Vector3::new(0.0, 0.0, 0.0));

        assert_eq!(device.depth_compare(), DepthCompare::Less);
    }

    #[test]
    fn test_single_light_uniforms() {
        let (program, _) = program();
        let light = Light::point(Point3::new(0.0, 0.0, 0.0)).with_cutoffs(60.0, 90.0);

        MeshDrawer::use_light(program.as_ref(), &light, &camera());

        // The origin sits 5 units in front of the camera
        let position = program.get("light.position").and_then(|v| v.as_vec3()).unwrap();
        approx::assert_abs_diff_eq!(position[2], -5.0, epsilon = 1e-5);
        let cut_off = program.get("light.cutOff").and_then(|v| v.as_float()).unwrap();
        approx::assert_abs_diff_eq!(cut_off, 0.5, epsilon = 1e-6);
        assert_eq!(program.get("light.constant"), Some(UniformValue::Float(1.0)));
        assert!(program.get("light.outerCutOff").is_some());
        assert!(program.get("light.direction").is_some());
    }

    #[test]
    fn test_light_arrays_set_fields_and_count() {
        let (program, _) = program();
        let lights = [Light::default(), Light::point(Point3::new(1.0, 2.0, 3.0))];

        MeshDrawer::add_point_lights(program.as_ref(), &lights, &camera());
        MeshDrawer::add_spot_lights(program.as_ref(), &lights[..1], &camera());

        assert_eq!(program.get("nbPointLight"), Some(UniformValue::Int(2)));
        assert_eq!(program.get("nbSpotLight"), Some(UniformValue::Int(1)));
        for field in ["position", "ambient", "diffuse", "specular", "linear", "quadratic"] {
            assert!(program.get(&format!("pointLights[1].{field}")).is_some(), "{field}");
        }
        assert!(program.get("spotLights[0].cutOff").is_some());
        assert!(program.get("spotLights[1].cutOff").is_none());
    }
}
