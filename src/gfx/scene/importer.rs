//! # Scene Importer
//!
//! Turns an external scene file into a [`Model`]: parse, walk the node tree
//! depth-first, extract every mesh, and resolve each referenced material's
//! textures through the [`ResourceCache`].
//!
//! Import never fails loudly. An unreadable file, a parser error or a scene
//! without a root node is logged and yields an empty model.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::rc::Rc;

use super::gltf_parser::GltfParser;
use super::mesh::{Mesh, Model};
use super::obj_parser::ObjParser;
use super::parsed::{ImportError, ParsedScene, PostProcess, SceneMesh, SceneParser, TextureRef};
use super::vertex::Vertex;
use crate::gfx::device::GraphicsDevice;
use crate::gfx::rendering::shader::ShaderProgram;
use crate::gfx::resources::cache::ResourceCache;
use crate::gfx::resources::material::{Material, MaterialId, DEFAULT_SHININESS};
use crate::gfx::resources::texture::{Image, Texture, TextureKind};

/// Imports scene files, giving every imported material the same program.
#[derive(Debug)]
pub struct SceneImporter {
    program: Rc<dyn ShaderProgram>,
    post_process: PostProcess,
    flip_textures: bool,
}

impl SceneImporter {
    pub fn new(program: Rc<dyn ShaderProgram>) -> Self {
        Self {
            program,
            post_process: PostProcess::default(),
            flip_textures: true,
        }
    }

    pub fn with_post_process(mut self, post_process: PostProcess) -> Self {
        self.post_process = post_process;
        self
    }

    /// Whether texture images are stored bottom row first (the default),
    /// matching texture coordinates with a bottom-left origin.
    pub fn with_flip_textures(mut self, flip: bool) -> Self {
        self.flip_textures = flip;
        self
    }

    pub fn post_process(&self) -> PostProcess {
        self.post_process
    }

    /// Picks a parser from the file extension
    pub fn parser_for(path: &Path) -> Result<Box<dyn SceneParser>, ImportError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "obj" => Ok(Box::new(ObjParser)),
            "gltf" | "glb" => Ok(Box::new(GltfParser)),
            _ => Err(ImportError::UnsupportedFormat(path.display().to_string())),
        }
    }

    pub fn import(
        &self,
        path: impl AsRef<Path>,
        cache: &mut ResourceCache,
        device: &mut dyn GraphicsDevice,
    ) -> Model {
        let path = path.as_ref();
        match Self::parser_for(path) {
            Ok(parser) => self.import_with(parser.as_ref(), path, cache, device),
            Err(err) => {
                log::error!("Failed to import '{}': {err}", path.display());
                Model::default()
            }
        }
    }

    /// Imports with an explicit parser instead of choosing one by extension
    pub fn import_with(
        &self,
        parser: &dyn SceneParser,
        path: &Path,
        cache: &mut ResourceCache,
        device: &mut dyn GraphicsDevice,
    ) -> Model {
        match self.try_import(parser, path, cache, device) {
            Ok(model) => {
                log::info!(
                    "Imported '{}': {} meshes, {} triangles, {} materials in cache",
                    path.display(),
                    model.meshes.len(),
                    model.triangle_count(),
                    cache.material_count()
                );
                model
            }
            Err(err) => {
                log::error!("Failed to import '{}': {err}", path.display());
                Model::default()
            }
        }
    }

    fn try_import(
        &self,
        parser: &dyn SceneParser,
        path: &Path,
        cache: &mut ResourceCache,
        device: &mut dyn GraphicsDevice,
    ) -> Result<Model, ImportError> {
        let scene = parser.parse(path, self.post_process)?;
        let root = scene.root.ok_or(ImportError::MissingRoot)?;

        // Scene material index -> cache id, so meshes sharing a material share an id
        let mut resolved: HashMap<usize, Option<MaterialId>> = HashMap::new();
        let mut visited = HashSet::new();
        let mut meshes = Vec::new();
        let mut stack = vec![root];

        while let Some(node_id) = stack.pop() {
            if !visited.insert(node_id) {
                log::warn!("Node {} is reachable twice; skipping", node_id.0);
                continue;
            }
            let Some(node) = scene.node(node_id) else {
                log::warn!("Dangling node reference {}", node_id.0);
                continue;
            };

            for &mesh_index in &node.meshes {
                let Some(source) = scene.meshes.get(mesh_index) else {
                    log::warn!("Node {} references missing mesh {mesh_index}", node_id.0);
                    continue;
                };

                let mut mesh = extract_mesh(source);
                if let Some(material_index) = source.material_index {
                    mesh.material_id = *resolved.entry(material_index).or_insert_with(|| {
                        self.resolve_material(&scene, material_index, path, cache, device)
                    });
                }
                meshes.push(mesh);
            }

            // Reversed so the first child is visited next
            stack.extend(node.children.iter().rev());
        }

        Ok(Model::new(meshes))
    }

    fn resolve_material(
        &self,
        scene: &ParsedScene,
        index: usize,
        path: &Path,
        cache: &mut ResourceCache,
        device: &mut dyn GraphicsDevice,
    ) -> Option<MaterialId> {
        let Some(source) = scene.materials.get(index) else {
            log::warn!("Mesh references missing material {index}");
            return None;
        };

        let mut material = Material::new(Rc::clone(&self.program))
            .with_shininess(source.shininess.unwrap_or(DEFAULT_SHININESS));

        for (references, kind) in [
            (&source.diffuse, TextureKind::Diffuse),
            (&source.specular, TextureKind::Specular),
        ] {
            for reference in references {
                let texture = self.load_texture(reference, path, cache, device);
                material.textures.push(texture.with_kind(kind));
            }
        }

        log::debug!(
            "Material '{}' resolved with {} textures",
            source.name,
            material.textures.len()
        );
        Some(cache.add_material(material))
    }

    fn load_texture(
        &self,
        reference: &TextureRef,
        scene_path: &Path,
        cache: &mut ResourceCache,
        device: &mut dyn GraphicsDevice,
    ) -> Texture {
        match reference {
            TextureRef::External(relative) => {
                let directory = scene_path.parent().unwrap_or_else(|| Path::new(""));
                let full_path = directory.join(relative);
                let mut image = Image::new(full_path.to_string_lossy(), self.flip_textures);
                cache.load_texture_2d(device, &mut image)
            }
            TextureRef::Embedded { key, bytes } => {
                let cache_key = format!("{}#{key}", scene_path.display());
                cache.load_embedded_texture_2d(device, &cache_key, bytes, self.flip_textures)
            }
        }
    }
}

/// Interleaves a parsed mesh into vertices and one flat index list
fn extract_mesh(source: &SceneMesh) -> Mesh {
    let vertices = source
        .positions
        .iter()
        .enumerate()
        .map(|(i, &position)| {
            let normal = source.normals.get(i).copied().unwrap_or_default();
            let tex_coords = source
                .tex_coords
                .as_ref()
                .and_then(|t| t.get(i).copied())
                .unwrap_or_default();
            Vertex::new(position, normal, tex_coords)
        })
        .collect();

    let indices = source.faces.iter().flatten().copied().collect();

    Mesh::new(vertices, indices)
}
