//! Per-vertex transform stream for batched sprite rendering

use bytemuck::{Pod, Zeroable};
use cgmath::{Matrix4, SquareMatrix};

/// First of the four consecutive shader locations holding the transform
pub const TRANSFORM_FIRST_LOCATION: u32 = 3;

/// Model transform carried alongside every vertex of a batch, stored column
/// by column.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct InstanceTransform {
    pub columns: [[f32; 4]; 4],
}

impl Default for InstanceTransform {
    fn default() -> Self {
        Self::from_matrix(&Matrix4::identity())
    }
}

impl InstanceTransform {
    pub fn from_matrix(matrix: &Matrix4<f32>) -> Self {
        Self {
            columns: (*matrix).into(),
        }
    }

    pub fn to_matrix(&self) -> Matrix4<f32> {
        self.columns.into()
    }

    /// Get vertex buffer layout for the transform stream
    ///
    /// The stream advances per vertex, one column per location 3..=6.
    pub fn vertex_buffer_layout() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
            3 => Float32x4,
            4 => Float32x4,
            5 => Float32x4,
            6 => Float32x4,
        ];

        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<InstanceTransform>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }
}

impl From<Matrix4<f32>> for InstanceTransform {
    fn from(matrix: Matrix4<f32>) -> Self {
        Self::from_matrix(&matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Vector3;

    #[test]
    fn test_layout_uses_four_column_slots() {
        let layout = InstanceTransform::vertex_buffer_layout();
        assert_eq!(layout.array_stride, 64);
        assert_eq!(layout.step_mode, wgpu::VertexStepMode::Vertex);

        let locations: Vec<u32> = layout.attributes.iter().map(|a| a.shader_location).collect();
        assert_eq!(locations, vec![3, 4, 5, 6]);
        assert_eq!(layout.attributes[0].shader_location, TRANSFORM_FIRST_LOCATION);
        assert_eq!(layout.attributes[3].offset, 48);
    }

    #[test]
    fn test_translation_lands_in_last_column() {
        let matrix = Matrix4::from_translation(Vector3::new(1.0, 2.0, 3.0));
        let transform = InstanceTransform::from(matrix);

        assert_eq!(transform.columns[3], [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(transform.to_matrix(), matrix);
    }
}
