//! glTF 2.0 parsing through the `gltf` crate
//!
//! Buffers may come from the GLB binary chunk, a base64 data URI or an
//! external file next to the scene. Images stored in buffer views or data
//! URIs are reported as embedded bytes keyed `*<image index>`; images referenced
//! by path stay external. Relative URIs are percent-decoded before use.
//!
//! Strip and fan primitives are unrolled into triangle lists; point and line
//! primitives are skipped.

use std::borrow::Cow;
use std::fs;
use std::path::Path;

use gltf::mesh::Mode;

use base64::Engine as _;

use super::parsed::{
    apply_post_process, ImportError, NodeId, ParsedScene, PostProcess, SceneMaterial, SceneMesh,
    SceneNode, SceneParser, TextureRef,
};

#[derive(Copy, Clone, Debug, Default)]
pub struct GltfParser;

impl SceneParser for GltfParser {
    fn parse(&self, path: &Path, post_process: PostProcess) -> Result<ParsedScene, ImportError> {
        let gltf::Gltf { document, blob } = gltf::Gltf::open(path)?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        let buffers = load_buffers(&document, blob, base)?;

        let mut scene = ParsedScene::default();

        // Each triangle primitive becomes one mesh
        let mut primitives_of_mesh = Vec::new();
        for mesh in document.meshes() {
            let mut indices = Vec::new();
            for primitive in mesh.primitives() {
                let Some(mut scene_mesh) = read_primitive(&mesh, &primitive, &buffers) else {
                    log::warn!(
                        "Skipping {:?} primitive of mesh {}: not a triangle mode",
                        primitive.mode(),
                        mesh.index()
                    );
                    continue;
                };
                apply_post_process(&mut scene_mesh, post_process);
                indices.push(scene.meshes.len());
                scene.meshes.push(scene_mesh);
            }
            primitives_of_mesh.push(indices);
        }

        // glTF node i keeps index i; the synthetic root comes last
        for node in document.nodes() {
            scene.nodes.push(SceneNode {
                meshes: node
                    .mesh()
                    .and_then(|m| primitives_of_mesh.get(m.index()).cloned())
                    .unwrap_or_default(),
                children: node.children().map(|c| NodeId(c.index())).collect(),
            });
        }

        if let Some(root_scene) = document.default_scene().or_else(|| document.scenes().next()) {
            let root = scene.add_node(SceneNode {
                meshes: Vec::new(),
                children: root_scene.nodes().map(|n| NodeId(n.index())).collect(),
            });
            scene.root = Some(root);
        }

        for material in document.materials() {
            scene.materials.push(read_material(&material, &buffers)?);
        }

        Ok(scene)
    }
}

fn load_buffers(
    document: &gltf::Document,
    mut blob: Option<Vec<u8>>,
    base: &Path,
) -> Result<Vec<Vec<u8>>, ImportError> {
    document
        .buffers()
        .map(|buffer| match buffer.source() {
            gltf::buffer::Source::Bin => blob
                .take()
                .ok_or(ImportError::MissingBinaryChunk(buffer.index())),
            gltf::buffer::Source::Uri(uri) => read_uri(uri, base),
        })
        .collect()
}

fn read_uri(uri: &str, base: &Path) -> Result<Vec<u8>, ImportError> {
    match decode_data_uri(uri) {
        Some(decoded) => decoded,
        None => {
            let path = base.join(&*percent_decode(uri)?);
            fs::read(&path).map_err(|source| ImportError::Io { path, source })
        }
    }
}

fn percent_decode(uri: &str) -> Result<Cow<'_, str>, ImportError> {
    urlencoding::decode(uri).map_err(|_| ImportError::InvalidUri(uri.to_string()))
}

/// `None` when `uri` is not a data URI
fn decode_data_uri(uri: &str) -> Option<Result<Vec<u8>, ImportError>> {
    let payload = uri.strip_prefix("data:")?;
    let (_, data) = payload.split_once(',')?;
    Some(
        base64::engine::general_purpose::STANDARD
            .decode(data)
            .map_err(ImportError::from),
    )
}

/// `None` when the primitive is not made of triangles
fn read_primitive(
    mesh: &gltf::Mesh<'_>,
    primitive: &gltf::Primitive<'_>,
    buffers: &[Vec<u8>],
) -> Option<SceneMesh> {
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));

    let positions: Vec<[f32; 3]> = reader
        .read_positions()
        .map(|p| p.collect())
        .unwrap_or_default();
    let normals = reader
        .read_normals()
        .map(|n| n.collect())
        .unwrap_or_default();
    let tex_coords = reader
        .read_tex_coords(0)
        .map(|t| t.into_f32().collect());

    let indices: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..positions.len() as u32).collect(),
    };
    let faces = triangle_faces(primitive.mode(), &indices)?;

    Some(SceneMesh {
        name: mesh.name().unwrap_or_default().to_string(),
        positions,
        normals,
        tex_coords,
        faces,
        material_index: primitive.material().index(),
    })
}

/// Unrolls triangle lists, strips and fans into separate faces, keeping the
/// winding of the first triangle.
fn triangle_faces(mode: Mode, indices: &[u32]) -> Option<Vec<Vec<u32>>> {
    let faces = match mode {
        Mode::Triangles => indices.chunks_exact(3).map(<[u32]>::to_vec).collect(),
        Mode::TriangleStrip => indices
            .windows(3)
            .enumerate()
            .map(|(i, w)| {
                if i % 2 == 0 {
                    vec![w[0], w[1], w[2]]
                } else {
                    vec![w[0], w[2], w[1]]
                }
            })
            .collect(),
        Mode::TriangleFan => match indices.split_first() {
            Some((&center, rim)) => rim.windows(2).map(|w| vec![center, w[0], w[1]]).collect(),
            None => Vec::new(),
        },
        _ => return None,
    };
    Some(faces)
}

fn read_material(
    material: &gltf::Material<'_>,
    buffers: &[Vec<u8>],
) -> Result<SceneMaterial, ImportError> {
    let diffuse = material
        .pbr_metallic_roughness()
        .base_color_texture()
        .map(|info| image_ref(info.texture().source(), buffers))
        .transpose()?;

    let specular = material
        .specular()
        .and_then(|s| s.specular_texture())
        .map(|info| image_ref(info.texture().source(), buffers))
        .transpose()?;

    Ok(SceneMaterial {
        name: material.name().unwrap_or_default().to_string(),
        shininess: None,
        diffuse: diffuse.into_iter().collect(),
        specular: specular.into_iter().collect(),
    })
}

fn image_ref(image: gltf::Image<'_>, buffers: &[Vec<u8>]) -> Result<TextureRef, ImportError> {
    let key = format!("*{}", image.index());

    match image.source() {
        gltf::image::Source::View { view, .. } => {
            let buffer = view.buffer().index();
            let bytes = buffers
                .get(buffer)
                .and_then(|b| b.get(view.offset()..view.offset() + view.length()))
                .ok_or(ImportError::MissingBinaryChunk(buffer))?;
            Ok(TextureRef::Embedded {
                key,
                bytes: bytes.to_vec(),
            })
        }
        gltf::image::Source::Uri { uri, .. } => match decode_data_uri(uri) {
            Some(bytes) => Ok(TextureRef::Embedded { key, bytes: bytes? }),
            None => Ok(TextureRef::External(percent_decode(uri)?.into_owned())),
        },
    }
}
