//! # Vertex Data Structures
//!
//! GPU-compatible vertex format shared by every mesh in the runtime: imported
//! models, procedural primitives and sprite quads all use [`Vertex`].

/// Shader location of the vertex position attribute
pub const POSITION_LOCATION: u32 = 0;
/// Shader location of the texture coordinate attribute
pub const TEX_COORDS_LOCATION: u32 = 1;
/// Shader location of the vertex normal attribute
pub const NORMAL_LOCATION: u32 = 2;

/// A vertex with position, normal and texture coordinate.
///
/// # Memory Layout
///
/// The `#[repr(C)]` attribute keeps the field order stable so the struct can
/// be uploaded verbatim with `bytemuck::cast_slice`. Attribute locations do
/// not follow field order: position is read from location 0, texture
/// coordinates from location 1 and the normal from location 2.
///
/// # Examples
///
/// ```
/// use glint::gfx::scene::vertex::Vertex;
///
/// let vertex = Vertex::new([0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [0.5, 0.5]);
/// assert_eq!(vertex.tex_coords, [0.5, 0.5]);
/// ```
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    /// 3D position coordinates [x, y, z]
    pub position: [f32; 3],
    /// 3D normal vector [nx, ny, nz] for lighting calculations
    pub normal: [f32; 3],
    /// Texture coordinates [u, v]
    pub tex_coords: [f32; 2],
}

impl Vertex {
    pub const fn new(position: [f32; 3], normal: [f32; 3], tex_coords: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            tex_coords,
        }
    }

    /// Returns the vertex buffer layout for wgpu rendering.
    ///
    /// - Location 0: Position (Float32x3)
    /// - Location 1: Texture coordinates (Float32x2)
    /// - Location 2: Normal (Float32x3)
    ///
    /// The stride is always the size of one [`Vertex`].
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: POSITION_LOCATION,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 6]>() as wgpu::BufferAddress,
                    shader_location: TEX_COORDS_LOCATION,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: NORMAL_LOCATION,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}
