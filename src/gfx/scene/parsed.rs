//! Format-neutral scene description produced by the scene parsers
//!
//! Nodes live in a flat arena and reference each other and their meshes by
//! index, so the importer can walk the tree with plain handles.

use std::path::{Path, PathBuf};

use thiserror::Error;

use super::mesh::Mesh;

/// Index of a node within [`ParsedScene::nodes`]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SceneNode {
    /// Indices into [`ParsedScene::meshes`]
    pub meshes: Vec<usize>,
    pub children: Vec<NodeId>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SceneMesh {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    /// Empty when the file carries no normals
    pub normals: Vec<[f32; 3]>,
    /// First texture coordinate channel, if any
    pub tex_coords: Option<Vec<[f32; 2]>>,
    /// Index lists of each face, triangles after triangulation
    pub faces: Vec<Vec<u32>>,
    pub material_index: Option<usize>,
}

/// Where a material's texture comes from
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TextureRef {
    /// Path as written in the file, relative to the scene file's directory
    External(String),
    /// Encoded image bytes stored inside the scene file
    Embedded { key: String, bytes: Vec<u8> },
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SceneMaterial {
    pub name: String,
    pub shininess: Option<f32>,
    pub diffuse: Vec<TextureRef>,
    pub specular: Vec<TextureRef>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParsedScene {
    pub nodes: Vec<SceneNode>,
    pub root: Option<NodeId>,
    pub meshes: Vec<SceneMesh>,
    pub materials: Vec<SceneMaterial>,
}

impl ParsedScene {
    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id.0)
    }

    pub fn add_node(&mut self, node: SceneNode) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }
}

/// Processing applied by parsers while reading a file
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PostProcess {
    /// Split polygons into triangles. Meshes are drawn as triangle lists, so
    /// the OBJ and glTF parsers split faces even when this is cleared.
    pub triangulate: bool,
    /// Fill in averaged face normals where the file has none
    pub generate_normals: bool,
    /// Flip the v texture coordinate (v' = 1 - v)
    pub flip_uvs: bool,
}

impl Default for PostProcess {
    fn default() -> Self {
        Self {
            triangulate: true,
            generate_normals: true,
            flip_uvs: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to read '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("OBJ parse error: {0}")]
    Obj(#[from] tobj::LoadError),

    #[error("glTF parse error: {0}")]
    Gltf(#[from] gltf::Error),

    #[error("invalid base64 data URI: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("URI '{0}' is not valid percent-encoded UTF-8")]
    InvalidUri(String),

    #[error("glTF buffer {0} refers to a missing binary chunk")]
    MissingBinaryChunk(usize),

    #[error("no scene parser for '{0}'")]
    UnsupportedFormat(String),

    #[error("scene has no root node")]
    MissingRoot,
}

/// Reads a scene file into a [`ParsedScene`]
pub trait SceneParser {
    fn parse(&self, path: &Path, post_process: PostProcess) -> Result<ParsedScene, ImportError>;
}

/// Applies the flags parsers share: normal generation and uv flipping.
pub fn apply_post_process(mesh: &mut SceneMesh, post_process: PostProcess) {
    if post_process.generate_normals && mesh.normals.len() != mesh.positions.len() {
        let indices: Vec<u32> = mesh
            .faces
            .iter()
            .filter(|f| f.len() == 3)
            .flatten()
            .copied()
            .collect();
        mesh.normals = Mesh::calculate_face_normals(&mesh.positions, &indices);
    }

    if post_process.flip_uvs {
        if let Some(tex_coords) = &mut mesh.tex_coords {
            for uv in tex_coords.iter_mut() {
                uv[1] = 1.0 - uv[1];
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad_mesh() -> SceneMesh {
        SceneMesh {
            name: "quad".into(),
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
            normals: Vec::new(),
            tex_coords: Some(vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.25]]),
            faces: vec![vec![0, 1, 2], vec![0, 2, 3]],
            material_index: None,
        }
    }

    #[test]
    fn test_missing_normals_are_generated() {
        let mut mesh = quad_mesh();
        apply_post_process(&mut mesh, PostProcess::default());

        assert_eq!(mesh.normals.len(), 4);
        assert!(mesh.normals.iter().all(|n| *n == [0.0, 0.0, 1.0]));
    }

    #[test]
    fn test_flip_uvs() {
        let mut mesh = quad_mesh();
        apply_post_process(
            &mut mesh,
            PostProcess {
                flip_uvs: true,
                generate_normals: false,
                ..Default::default()
            },
        );

        assert!(mesh.normals.is_empty());
        assert_eq!(mesh.tex_coords.as_ref().map(|t| t[3]), Some([0.0, 0.75]));
    }

    #[test]
    fn test_add_node_returns_index() {
        let mut scene = ParsedScene::default();
        let leaf = scene.add_node(SceneNode::default());
        let root = scene.add_node(SceneNode {
            meshes: Vec::new(),
            children: vec![leaf],
        });

        assert_eq!(root, NodeId(1));
        assert_eq!(scene.node(root).map(|n| n.children.clone()), Some(vec![leaf]));
        assert!(scene.node(NodeId(9)).is_none());
    }
}
