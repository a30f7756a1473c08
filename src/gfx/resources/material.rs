//! Material system
//!
//! Provides material definitions and their central storage. Materials live in
//! a [`MaterialArena`] and meshes reference them by [`MaterialId`]; an id
//! stays valid for as long as the arena does.

use std::fmt;
use std::rc::Rc;

use crate::gfx::rendering::shader::ShaderProgram;
use crate::gfx::resources::texture::Texture;

/// Specular exponent used when a source gives none
pub const DEFAULT_SHININESS: f32 = 32.0;

/// Stable index of a material within its arena
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(u32);

impl MaterialId {
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for MaterialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "material#{}", self.0)
    }
}

/// Program, shininess and ordered texture list of a surface
#[derive(Clone, Debug)]
pub struct Material {
    pub program: Option<Rc<dyn ShaderProgram>>,
    pub shininess: f32,
    pub textures: Vec<Texture>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            program: None,
            shininess: DEFAULT_SHININESS,
            textures: Vec::new(),
        }
    }
}

impl PartialEq for Material {
    fn eq(&self, other: &Self) -> bool {
        self.program.as_ref().map(|p| p.id()) == other.program.as_ref().map(|p| p.id())
            && self.shininess == other.shininess
            && self.textures == other.textures
    }
}

impl Material {
    pub fn new(program: Rc<dyn ShaderProgram>) -> Self {
        Self {
            program: Some(program),
            ..Default::default()
        }
    }

    /// Builder pattern: Set specular exponent
    pub fn with_shininess(mut self, shininess: f32) -> Self {
        self.shininess = shininess;
        self
    }

    /// Builder pattern: Append a texture
    pub fn with_texture(mut self, texture: Texture) -> Self {
        self.textures.push(texture);
        self
    }
}

/// Append-only material storage
#[derive(Debug, Default)]
pub struct MaterialArena {
    materials: Vec<Material>,
}

impl MaterialArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a material and returns its id. Ids are assigned densely from 0.
    pub fn add(&mut self, material: Material) -> MaterialId {
        let id = MaterialId(self.materials.len() as u32);
        self.materials.push(material);
        id
    }

    pub fn get(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (MaterialId, &Material)> {
        self.materials
            .iter()
            .enumerate()
            .map(|(index, material)| (MaterialId(index as u32), material))
    }
}
