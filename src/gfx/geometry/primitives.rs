//! # Primitive Shape Generation
//!
//! This module contains functions to generate common primitive shapes.
//! All shapes use counter-clockwise winding and, except the skybox, carry
//! normals and texture coordinates.

use super::GeometryData;

/// Generate a unit cube centered at the origin
///
/// Returns a cube with vertices from -0.5 to 0.5 on all axes, expanded to a
/// 36-vertex triangle list so every face keeps its own normals and UVs.
pub fn generate_cube() -> GeometryData {
    let mut data = GeometryData::new();

    #[rustfmt::skip]
    let positions = [
        // Front face
        [-0.5, -0.5,  0.5], [ 0.5, -0.5,  0.5], [ 0.5,  0.5,  0.5], [-0.5,  0.5,  0.5],
        // Back face
        [-0.5, -0.5, -0.5], [-0.5,  0.5, -0.5], [ 0.5,  0.5, -0.5], [ 0.5, -0.5, -0.5],
        // Left face
        [-0.5, -0.5, -0.5], [-0.5, -0.5,  0.5], [-0.5,  0.5,  0.5], [-0.5,  0.5, -0.5],
        // Right face
        [ 0.5, -0.5,  0.5], [ 0.5, -0.5, -0.5], [ 0.5,  0.5, -0.5], [ 0.5,  0.5,  0.5],
        // Top face
        [-0.5,  0.5,  0.5], [ 0.5,  0.5,  0.5], [ 0.5,  0.5, -0.5], [-0.5,  0.5, -0.5],
        // Bottom face
        [-0.5, -0.5, -0.5], [ 0.5, -0.5, -0.5], [ 0.5, -0.5,  0.5], [-0.5, -0.5,  0.5],
    ];

    #[rustfmt::skip]
    let tex_coords = [
        [0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0],
        [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0],
        [0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0],
        [0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0],
        [0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0],
        [0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0],
    ];

    let face_normals = [
        [0.0, 0.0, 1.0],
        [0.0, 0.0, -1.0],
        [-1.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, -1.0, 0.0],
    ];

    data.vertices = positions.to_vec();
    data.tex_coords = tex_coords.to_vec();
    data.normals = face_normals.iter().flat_map(|n| [*n; 4]).collect();

    // Two triangles per face
    data.indices = (0..6u32)
        .flat_map(|face| {
            let base = face * 4;
            [base, base + 1, base + 2, base + 2, base + 3, base]
        })
        .collect();

    data.unindexed()
}

/// Generate the inside-facing cube used to draw a cube-map background
///
/// Only positions are meaningful; they double as cube-map lookup directions.
pub fn generate_skybox() -> GeometryData {
    let mut cube = generate_cube();

    // Reverse winding so the faces are seen from inside
    for triangle in cube.vertices.chunks_exact_mut(3) {
        triangle.swap(1, 2);
    }
    for position in cube.vertices.iter_mut() {
        *position = position.map(|c| c * 2.0);
    }
    cube.normals.clear();
    cube.tex_coords.clear();
    cube
}

/// Generate a unit quad in the XY plane facing +Z, as a 6-vertex triangle list
///
/// Texture coordinates span the full [0, 1] range, origin at bottom-left.
pub fn generate_quad() -> GeometryData {
    let corners = [
        ([-0.5, -0.5, 0.0], [0.0, 0.0]),
        ([0.5, -0.5, 0.0], [1.0, 0.0]),
        ([0.5, 0.5, 0.0], [1.0, 1.0]),
        ([-0.5, 0.5, 0.0], [0.0, 1.0]),
    ];

    let mut data = GeometryData::new();
    for corner in [0, 1, 2, 2, 3, 0] {
        let (position, uv) = corners[corner];
        data.vertices.push(position);
        data.tex_coords.push(uv);
        data.normals.push([0.0, 0.0, 1.0]);
    }
    data
}

/// Generate a quad covering the whole viewport in normalized device
/// coordinates, for post-processing passes
pub fn generate_screen_quad() -> GeometryData {
    let mut quad = generate_quad();
    for position in quad.vertices.iter_mut() {
        position[0] *= 2.0;
        position[1] *= 2.0;
    }
    quad
}

/// Generate a plane in the XY plane
///
/// # Arguments
/// * `width` - Width of the plane (X direction)
/// * `height` - Height of the plane (Y direction)
/// * `width_segments` - Number of subdivisions along width
/// * `height_segments` - Number of subdivisions along height
///
/// Returns an indexed plane centered at the origin with normal +Z.
pub fn generate_plane(
    width: f32,
    height: f32,
    width_segments: u32,
    height_segments: u32,
) -> GeometryData {
    let mut data = GeometryData::new();

    let w_segs = width_segments.max(1);
    let h_segs = height_segments.max(1);

    for y in 0..=h_segs {
        let v = y as f32 / h_segs as f32;
        let pos_y = (v - 0.5) * height;

        for x in 0..=w_segs {
            let u = x as f32 / w_segs as f32;
            let pos_x = (u - 0.5) * width;

            data.vertices.push([pos_x, pos_y, 0.0]);
            data.normals.push([0.0, 0.0, 1.0]);
            data.tex_coords.push([u, v]);
        }
    }

    for y in 0..h_segs {
        for x in 0..w_segs {
            let i = y * (w_segs + 1) + x;
            let next_row = i + w_segs + 1;

            data.indices.extend_from_slice(&[i, i + 1, next_row]);
            data.indices.extend_from_slice(&[i + 1, next_row + 1, next_row]);
        }
    }

    data
}
