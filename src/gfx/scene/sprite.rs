//! Sprites, fixed-grid sprite sheets and frame animation
//!
//! A [`Sprite`] is a unit quad whose texture coordinates select one cell of
//! a texture. Sprites are drawn in batches by the
//! [`SpriteBatcher`](crate::gfx::rendering::sprite_batcher::SpriteBatcher).

use std::ops::Index;

use super::mesh::Mesh;
use crate::gfx::device::GraphicsDevice;
use crate::gfx::geometry::generate_quad;

#[derive(Clone, Debug, PartialEq)]
pub struct Sprite {
    /// 6-vertex quad
    pub mesh: Mesh,
}

impl Default for Sprite {
    fn default() -> Self {
        Self::new()
    }
}

impl Sprite {
    /// A sprite showing the whole texture
    pub fn new() -> Self {
        Self {
            mesh: generate_quad().to_mesh(),
        }
    }

    /// A sprite showing cell (`x`, `y`) of a `columns` by `rows` grid
    pub fn cell(columns: u32, rows: u32, x: u32, y: u32) -> Self {
        let mut sprite = Self::new();
        let scale = [1.0 / columns as f32, 1.0 / rows as f32];
        let offset = [x as f32 * scale[0], y as f32 * scale[1]];

        for vertex in &mut sprite.mesh.vertices {
            vertex.tex_coords = [
                vertex.tex_coords[0] * scale[0] + offset[0],
                vertex.tex_coords[1] * scale[1] + offset[1],
            ];
        }
        sprite
    }

    /// Smallest and largest texture coordinates, as `([u_min, v_min], [u_max, v_max])`
    pub fn uv_bounds(&self) -> ([f32; 2], [f32; 2]) {
        self.mesh.vertices.iter().fold(
            ([f32::MAX, f32::MAX], [f32::MIN, f32::MIN]),
            |(min, max), v| {
                (
                    [min[0].min(v.tex_coords[0]), min[1].min(v.tex_coords[1])],
                    [max[0].max(v.tex_coords[0]), max[1].max(v.tex_coords[1])],
                )
            },
        )
    }
}

/// Sprites cut from one texture on a regular grid.
///
/// Cell (x, y) is column x, row y, with row 0 at the bottom of the texture.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SpriteSheet {
    columns: u32,
    rows: u32,
    sprites: Vec<Sprite>,
}

impl SpriteSheet {
    /// Builds every cell of a `columns` by `rows` grid, row by row
    pub fn fixed_size(columns: u32, rows: u32) -> Self {
        let mut sheet = Self {
            columns,
            rows,
            sprites: Vec::with_capacity((columns * rows) as usize),
        };

        for y in 0..rows {
            for x in 0..columns {
                sheet.sprites.push(Sprite::cell(columns, rows, x, y));
            }
        }
        sheet
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }

    pub fn sprites(&self) -> &[Sprite] {
        &self.sprites
    }

    /// Appends a sprite after the grid cells
    pub fn push(&mut self, sprite: Sprite) {
        self.sprites.push(sprite);
    }

    pub fn cell(&self, x: u32, y: u32) -> Option<&Sprite> {
        if x >= self.columns || y >= self.rows {
            return None;
        }
        self.sprites.get((y * self.columns + x) as usize)
    }

    /// Uploads the quad of every sprite that is not on the device yet
    pub fn upload(&mut self, device: &mut dyn GraphicsDevice) {
        for sprite in self.sprites.iter_mut().filter(|s| !s.mesh.is_uploaded()) {
            sprite.mesh.upload(device);
        }
    }
}

impl Index<(u32, u32)> for SpriteSheet {
    type Output = Sprite;

    /// # Panics
    ///
    /// Panics when the cell lies outside the grid.
    fn index(&self, (x, y): (u32, u32)) -> &Sprite {
        match self.cell(x, y) {
            Some(sprite) => sprite,
            None => panic!(
                "cell ({x}, {y}) outside {}x{} sprite sheet",
                self.columns, self.rows
            ),
        }
    }
}

/// A looping sequence of sheet cells, advanced by elapsed time
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnimatedSprite {
    /// (column, row) of each frame
    pub frames: Vec<(u32, u32)>,
    pub current_frame: usize,
    /// Seconds accumulated toward the next frame
    pub elapsed: f64,
}

impl AnimatedSprite {
    pub fn new(frames: Vec<(u32, u32)>) -> Self {
        Self {
            frames,
            current_frame: 0,
            elapsed: 0.0,
        }
    }

    pub fn current(&self) -> Option<(u32, u32)> {
        self.frames.get(self.current_frame).copied()
    }

    /// Adds `dt` seconds and steps one frame per `frame_duration` elapsed,
    /// wrapping at the end. Returns whether the frame changed.
    ///
    /// Negative or non-finite times leave the animation untouched.
    pub fn advance(&mut self, dt: f64, frame_duration: f64) -> bool {
        if self.frames.is_empty()
            || !dt.is_finite()
            || dt < 0.0
            || !frame_duration.is_finite()
            || frame_duration <= 0.0
        {
            return false;
        }

        let elapsed = self.elapsed + dt;
        let steps = (elapsed / frame_duration).floor();
        if !steps.is_finite() {
            return false;
        }
        self.elapsed = elapsed;
        if steps < 1.0 {
            return false;
        }

        let len = self.frames.len();
        self.elapsed = elapsed.rem_euclid(frame_duration);
        let previous = self.current_frame;
        let wrapped = (steps % len as f64) as usize;
        self.current_frame = (self.current_frame % len + wrapped) % len;
        self.current_frame != previous
    }

    pub fn reset(&mut self) {
        self.current_frame = 0;
        self.elapsed = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_cell_coordinates_stay_inside_cell() {
        let columns = 4;
        let rows = 3;
        let sheet = SpriteSheet::fixed_size(columns, rows);
        assert_eq!(sheet.len(), 12);

        for y in 0..rows {
            for x in 0..columns {
                let (min, max) = sheet[(x, y)].uv_bounds();
                assert_relative_eq!(min[0], x as f32 / columns as f32);
                assert_relative_eq!(max[0], (x + 1) as f32 / columns as f32);
                assert_relative_eq!(min[1], y as f32 / rows as f32);
                assert_relative_eq!(max[1], (y + 1) as f32 / rows as f32);
            }
        }
    }

    #[test]
    fn test_four_by_four_cell_two_one() {
        let sheet = SpriteSheet::fixed_size(4, 4);
        let (min, max) = sheet.cell(2, 1).map(Sprite::uv_bounds).unwrap();

        assert_relative_eq!(min[0], 0.5);
        assert_relative_eq!(max[0], 0.75);
        assert_relative_eq!(min[1], 0.25);
        assert_relative_eq!(max[1], 0.5);
    }

    #[test]
    fn test_out_of_grid_cell_is_none() {
        let mut sheet = SpriteSheet::fixed_size(2, 2);
        assert!(sheet.cell(2, 0).is_none());

        sheet.push(Sprite::new());
        assert_eq!(sheet.len(), 5);
        assert!(sheet.cell(0, 2).is_none());
    }

    #[test]
    fn test_empty_grid() {
        let sheet = SpriteSheet::fixed_size(0, 3);
        assert!(sheet.is_empty());
        assert!(sheet.cell(0, 0).is_none());
    }

    #[test]
    fn test_animation_wraps() {
        let mut animation = AnimatedSprite::new(vec![(0, 0), (1, 0), (2, 0)]);

        assert!(!animation.advance(0.05, 0.1));
        assert!(animation.advance(0.05, 0.1));
        assert_eq!(animation.current(), Some((1, 0)));

        // Two frames at once, wrapping past the end
        animation.advance(0.25, 0.1);
        assert_eq!(animation.current(), Some((0, 0)));
        assert_relative_eq!(animation.elapsed, 0.05, epsilon = 1e-9);

        animation.reset();
        assert_eq!(animation.current_frame, 0);
    }

    #[test]
    fn test_large_step_wraps_without_overflow() {
        let mut animation = AnimatedSprite::new(vec![(0, 0), (1, 0), (2, 0)]);
        animation.advance(0.15, 0.1);
        assert_eq!(animation.current_frame, 1);

        animation.advance(1e30, 0.1);
        assert!(animation.current_frame < 3);
        assert!(animation.elapsed >= 0.0 && animation.elapsed < 0.1);

        // Still steps normally afterwards
        let before = animation.current_frame;
        animation.elapsed = 0.0;
        assert!(animation.advance(0.1, 0.1));
        assert_eq!(animation.current_frame, (before + 1) % 3);
    }

    #[test]
    fn test_invalid_times_are_ignored() {
        let mut animation = AnimatedSprite::new(vec![(0, 0), (1, 0)]);
        animation.advance(0.05, 0.1);

        assert!(!animation.advance(f64::INFINITY, 0.1));
        assert!(!animation.advance(f64::NAN, 0.1));
        assert!(!animation.advance(-1.0, 0.1));
        assert!(!animation.advance(0.1, f64::NAN));
        assert!(!animation.advance(0.1, 0.0));
        assert!(!animation.advance(1.0, 1e-320));
        assert_eq!(animation.current_frame, 0);
        assert_relative_eq!(animation.elapsed, 0.05, epsilon = 1e-12);
    }

    #[test]
    fn test_animation_without_frames_is_inert() {
        let mut animation = AnimatedSprite::default();
        assert!(!animation.advance(1.0, 0.1));
        assert!(animation.current().is_none());
    }
}
