use cgmath::{InnerSpace, Vector3};

use super::vertex::Vertex;
use crate::gfx::device::{GraphicsDevice, MeshHandle};
use crate::gfx::resources::material::MaterialId;

/// Vertex data, optional indices, and the device buffers they were uploaded to.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    /// Empty for non-indexed triangle lists
    pub indices: Vec<u32>,
    /// `None` means "use the caller's default material"
    pub material_id: Option<MaterialId>,
    handle: MeshHandle,
}

impl Mesh {
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self {
            vertices,
            indices,
            material_id: None,
            handle: MeshHandle::INVALID,
        }
    }

    pub fn with_material(mut self, material_id: MaterialId) -> Self {
        self.material_id = Some(material_id);
        self
    }

    pub fn handle(&self) -> MeshHandle {
        self.handle
    }

    pub fn is_uploaded(&self) -> bool {
        self.handle.is_valid()
    }

    pub fn is_indexed(&self) -> bool {
        !self.indices.is_empty()
    }

    /// Vertex count the draw covers: indices when present, else vertices
    pub fn element_count(&self) -> u32 {
        if self.is_indexed() {
            self.indices.len() as u32
        } else {
            self.vertices.len() as u32
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.element_count() as usize / 3
    }

    /// Creates the device buffers for this mesh.
    ///
    /// The handle is assigned once; later calls keep the existing buffers and
    /// return the same handle.
    pub fn upload(&mut self, device: &mut dyn GraphicsDevice) -> MeshHandle {
        if self.is_uploaded() {
            log::warn!("Mesh already uploaded as {}; keeping its buffers", self.handle);
            return self.handle;
        }

        self.handle = device.create_mesh_buffers(&self.vertices, &self.indices);
        log::debug!(
            "Uploaded {} ({} vertices, {} indices)",
            self.handle,
            self.vertices.len(),
            self.indices.len()
        );
        self.handle
    }

    /// Averaged, normalized face normals for indexed triangles
    pub fn calculate_face_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
        let mut sums = vec![Vector3::new(0.0f32, 0.0, 0.0); positions.len()];

        for triangle in indices.chunks_exact(3) {
            let [i0, i1, i2] = [
                triangle[0] as usize,
                triangle[1] as usize,
                triangle[2] as usize,
            ];
            if i0.max(i1).max(i2) >= positions.len() {
                continue;
            }

            let v0 = Vector3::from(positions[i0]);
            let v1 = Vector3::from(positions[i1]);
            let v2 = Vector3::from(positions[i2]);
            let face_normal = (v1 - v0).cross(v2 - v0);

            for index in [i0, i1, i2] {
                sums[index] += face_normal;
            }
        }

        sums.into_iter()
            .map(|sum| {
                if sum.magnitude2() > 0.0 {
                    sum.normalize().into()
                } else {
                    [0.0, 0.0, 0.0]
                }
            })
            .collect()
    }
}

/// Meshes imported from one scene file, each with its own material id
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Model {
    pub meshes: Vec<Mesh>,
}

impl Model {
    pub fn new(meshes: Vec<Mesh>) -> Self {
        Self { meshes }
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    pub fn upload(&mut self, device: &mut dyn GraphicsDevice) {
        for mesh in &mut self.meshes {
            mesh.upload(device);
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(Mesh::triangle_count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::device::RecordingDevice;

    fn triangle() -> Mesh {
        Mesh::new(
            vec![
                Vertex::new([0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 0.0]),
                Vertex::new([1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0]),
                Vertex::new([0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0]),
            ],
            vec![0, 1, 2],
        )
    }

    #[test]
    fn test_upload_assigns_handle_once() {
        let mut device = RecordingDevice::new();
        let mut mesh = triangle();
        assert!(!mesh.is_uploaded());

        let first = mesh.upload(&mut device);
        let second = mesh.upload(&mut device);

        assert!(first.is_valid());
        assert_eq!(first, second);
        assert_eq!(device.mesh_uploads(), 1);
    }

    #[test]
    fn test_element_count_prefers_indices() {
        let mesh = triangle();
        assert_eq!(mesh.element_count(), 3);

        let mut strip = triangle();
        strip.indices.clear();
        strip.vertices.extend(triangle().vertices);
        assert!(!strip.is_indexed());
        assert_eq!(strip.element_count(), 6);
        assert_eq!(strip.triangle_count(), 2);
    }

    #[test]
    fn test_face_normals_follow_winding() {
        let positions = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        let normals = Mesh::calculate_face_normals(&positions, &[0, 1, 2]);
        assert_eq!(normals, vec![[0.0, 0.0, 1.0]; 3]);

        let flipped = Mesh::calculate_face_normals(&positions, &[0, 2, 1]);
        assert_eq!(flipped[0], [0.0, 0.0, -1.0]);
    }

    #[test]
    fn test_unreferenced_vertex_gets_zero_normal() {
        let positions = [[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [5.0, 5.0, 5.0]];
        let normals = Mesh::calculate_face_normals(&positions, &[0, 1, 2]);
        assert_eq!(normals[3], [0.0, 0.0, 0.0]);
    }
}
