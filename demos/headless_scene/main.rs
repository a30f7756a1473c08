//! Headless frame
//!
//! Imports a scene file, draws it lit by one point light next to a batch of
//! sprites and a skybox, and prints the draw calls the frame produced.
//!
//! ```text
//! RUST_LOG=debug cargo run --example headless_scene -- assets/crate.obj
//! ```

use anyhow::Context;
use cgmath::{Deg, Matrix4, Point3, SquareMatrix, Vector3};
use glint::gfx::rendering::uniforms::POINT_LIGHT_COUNT;
use glint::prelude::*;

fn main() -> anyhow::Result<()> {
    glint::init_logging();

    let scene_path = std::env::args()
        .nth(1)
        .context("usage: headless_scene <scene.obj|scene.gltf>")?;

    let mut device = RecordingDevice::new();
    let mut cache = ResourceCache::new();
    let lit = UniformProgram::shared("lit");
    let sprite_program = UniformProgram::shared("sprite");
    let skybox_program = UniformProgram::shared("skybox");

    let mut model = SceneImporter::new(lit.clone()).import(&scene_path, &mut cache, &mut device);
    model.upload(&mut device);

    let mut skybox = generate_skybox().to_mesh();
    skybox.upload(&mut device);
    let cube_map = cache.load_texture_cube(
        &mut device,
        &mut ["right", "left", "top", "bottom", "front", "back"]
            .map(|face| Image::new(format!("assets/skybox/{face}.jpg"), false)),
    );

    let mut orbit = OrbitCamera::new(6.0, 0.3, 0.5, Point3::new(0.0, 0.0, 0.0));
    let mut camera = Camera::perspective(Deg(45.0), 16.0 / 9.0, 0.1, 100.0);
    orbit.add_yaw(0.25);
    orbit.apply(&mut camera);

    let lights = [
        Light::point(Point3::new(2.0, 3.0, 2.0)),
        Light::point(Point3::new(-2.0, 1.0, -1.0)).with_colors(
            Vector3::new(0.05, 0.0, 0.0),
            Vector3::new(0.8, 0.2, 0.2),
            Vector3::new(1.0, 1.0, 1.0),
        ),
    ];
    MeshDrawer::add_point_lights(lit.as_ref(), &lights, &camera);
    MeshDrawer::render_model(
        &mut device,
        &camera,
        &model,
        &cache,
        &Material::new(lit.clone()),
        &Matrix4::identity(),
    );

    let sheet = SpriteSheet::fixed_size(4, 4);
    let mut walk = AnimatedSprite::new(vec![(0, 0), (1, 0), (2, 0), (3, 0)]);
    walk.advance(0.25, 0.1);
    let frame = walk
        .current()
        .and_then(|(x, y)| sheet.cell(x, y))
        .context("animation frame outside the sheet")?;

    let sprite_material = cache.add_material(Material::new(sprite_program));
    let mut batcher = SpriteBatcher::new();
    let transforms: Vec<_> = (0..3)
        .map(|i| Matrix4::from_translation(Vector3::new(i as f32 - 1.0, 2.0, 0.0)))
        .collect();
    batcher.render(
        &mut device,
        &camera,
        &[frame, frame, frame],
        sprite_material,
        &cache,
        &transforms,
    );

    MeshDrawer::render_skybox(&mut device, &camera, &skybox, &skybox_program, cube_map.handle);

    println!(
        "{} meshes, {} materials, {} textures, {} point lights",
        model.meshes.len(),
        cache.material_count(),
        cache.texture_count(),
        lit.snapshot().get(POINT_LIGHT_COUNT).and_then(|v| v.as_int()).unwrap_or(0)
    );
    for (i, call) in device.take_draw_calls().iter().enumerate() {
        println!(
            "draw {i}: {} {:?}, {} textures, depth {:?}",
            call.mesh,
            call.kind,
            call.textures.len(),
            call.depth_compare
        );
    }
    Ok(())
}
