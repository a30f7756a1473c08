//! Wavefront OBJ/MTL parsing through `tobj`

use std::path::Path;

use super::parsed::{
    apply_post_process, ImportError, ParsedScene, PostProcess, SceneMaterial, SceneMesh,
    SceneNode, SceneParser, TextureRef,
};

/// Reads OBJ files with their MTL libraries.
///
/// OBJ has no hierarchy: every object in the file becomes a mesh of a single
/// childless root node. A missing or broken MTL library is logged and the
/// meshes keep their material indices unresolved.
#[derive(Copy, Clone, Debug, Default)]
pub struct ObjParser;

impl SceneParser for ObjParser {
    fn parse(&self, path: &Path, post_process: PostProcess) -> Result<ParsedScene, ImportError> {
        if !post_process.triangulate {
            log::debug!("Triangulating '{}' anyway: polygons cannot be drawn", path.display());
        }
        let (models, materials) = tobj::load_obj(
            path,
            &tobj::LoadOptions {
                triangulate: true,
                single_index: true,
                ..Default::default()
            },
        )?;

        let materials = materials.unwrap_or_else(|err| {
            log::warn!("No usable MTL library for '{}': {err}", path.display());
            Vec::new()
        });

        let mut scene = ParsedScene::default();

        for model in &models {
            let mut mesh = convert_mesh(&model.name, &model.mesh);
            if mesh.material_index.is_some_and(|i| i >= materials.len()) {
                mesh.material_index = None;
            }
            apply_post_process(&mut mesh, post_process);
            scene.meshes.push(mesh);
        }

        scene.materials = materials.iter().map(convert_material).collect();

        let root = scene.add_node(SceneNode {
            meshes: (0..scene.meshes.len()).collect(),
            children: Vec::new(),
        });
        scene.root = Some(root);

        Ok(scene)
    }
}

fn convert_mesh(name: &str, mesh: &tobj::Mesh) -> SceneMesh {
    let positions = mesh
        .positions
        .chunks_exact(3)
        .map(|p| [p[0], p[1], p[2]])
        .collect();

    let normals = mesh
        .normals
        .chunks_exact(3)
        .map(|n| [n[0], n[1], n[2]])
        .collect();

    let tex_coords = if mesh.texcoords.is_empty() {
        None
    } else {
        Some(
            mesh.texcoords
                .chunks_exact(2)
                .map(|t| [t[0], t[1]])
                .collect(),
        )
    };

    // Loaded with triangulation on, so every face has three indices
    let faces = mesh.indices.chunks_exact(3).map(<[u32]>::to_vec).collect();

    SceneMesh {
        name: name.to_string(),
        positions,
        normals,
        tex_coords,
        faces,
        material_index: mesh.material_id,
    }
}

fn convert_material(material: &tobj::Material) -> SceneMaterial {
    SceneMaterial {
        name: material.name.clone(),
        shininess: material.shininess,
        diffuse: material
            .diffuse_texture
            .iter()
            .map(|path| TextureRef::External(path.clone()))
            .collect(),
        specular: material
            .specular_texture
            .iter()
            .map(|path| TextureRef::External(path.clone()))
            .collect(),
    }
}
