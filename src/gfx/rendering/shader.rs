//! Shader program abstraction.
//!
//! The drawers only ever *set uniforms by name*; how a program packs those
//! values into GPU memory is its own business. [`UniformProgram`] keeps the
//! values in a name-ordered table, which is enough for the recording device
//! and for hosts that pack uniform buffers themselves when replaying draws.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU32, Ordering};

use cgmath::{Matrix4, Vector3};

/// Identity of a shader program, unique for the life of the process
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramId(pub u32);

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum UniformValue {
    Bool(bool),
    Int(i32),
    Float(f32),
    Vec3([f32; 3]),
    Mat4([[f32; 4]; 4]),
}

impl UniformValue {
    pub fn as_float(&self) -> Option<f32> {
        match *self {
            UniformValue::Float(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match *self {
            UniformValue::Int(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_vec3(&self) -> Option<[f32; 3]> {
        match *self {
            UniformValue::Vec3(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_mat4(&self) -> Option<Matrix4<f32>> {
        match *self {
            UniformValue::Mat4(m) => Some(m.into()),
            _ => None,
        }
    }
}

/// Uniform name to value, ordered by name
pub type UniformBlock = BTreeMap<String, UniformValue>;

/// A compiled GPU program whose uniforms are addressed by name.
///
/// Programs are shared (`Rc<dyn ShaderProgram>`) between materials and
/// drawers, so setters take `&self`.
pub trait ShaderProgram: fmt::Debug {
    fn id(&self) -> ProgramId;

    fn set_uniform(&self, name: &str, value: UniformValue);

    /// Current value of every uniform set so far
    fn snapshot(&self) -> UniformBlock;

    fn set_bool(&self, name: &str, value: bool) {
        self.set_uniform(name, UniformValue::Bool(value));
    }

    fn set_int(&self, name: &str, value: i32) {
        self.set_uniform(name, UniformValue::Int(value));
    }

    fn set_float(&self, name: &str, value: f32) {
        self.set_uniform(name, UniformValue::Float(value));
    }

    fn set_vec3(&self, name: &str, value: Vector3<f32>) {
        self.set_uniform(name, UniformValue::Vec3(value.into()));
    }

    fn set_mat4(&self, name: &str, value: &Matrix4<f32>) {
        self.set_uniform(name, UniformValue::Mat4((*value).into()));
    }
}

static NEXT_PROGRAM_ID: AtomicU32 = AtomicU32::new(1);

/// Program that stores its uniforms in a table.
#[derive(Debug)]
pub struct UniformProgram {
    id: ProgramId,
    label: String,
    uniforms: RefCell<UniformBlock>,
}

impl UniformProgram {
    pub fn new(label: &str) -> Self {
        Self {
            id: ProgramId(NEXT_PROGRAM_ID.fetch_add(1, Ordering::Relaxed)),
            label: label.to_string(),
            uniforms: RefCell::new(UniformBlock::new()),
        }
    }

    /// Creates the program already wrapped for sharing between materials
    pub fn shared(label: &str) -> Rc<dyn ShaderProgram> {
        Rc::new(Self::new(label))
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn get(&self, name: &str) -> Option<UniformValue> {
        self.uniforms.borrow().get(name).copied()
    }
}

impl ShaderProgram for UniformProgram {
    fn id(&self) -> ProgramId {
        self.id
    }

    fn set_uniform(&self, name: &str, value: UniformValue) {
        self.uniforms.borrow_mut().insert(name.to_string(), value);
    }

    fn snapshot(&self) -> UniformBlock {
        self.uniforms.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::SquareMatrix;

    #[test]
    fn test_program_ids_are_unique() {
        let a = UniformProgram::new("a");
        let b = UniformProgram::new("b");
        assert_ne!(a.id(), b.id());
        assert_eq!(b.label(), "b");
    }

    #[test]
    fn test_typed_setters_overwrite() {
        let program = UniformProgram::new("lit");
        program.set_int("nbPointLight", 2);
        program.set_int("nbPointLight", 3);
        program.set_vec3("viewPos", Vector3::new(1.0, 2.0, 3.0));
        program.set_mat4("model", &Matrix4::identity());

        assert_eq!(program.get("nbPointLight").and_then(|v| v.as_int()), Some(3));
        assert_eq!(
            program.get("viewPos").and_then(|v| v.as_vec3()),
            Some([1.0, 2.0, 3.0])
        );
        assert_eq!(
            program.get("model").and_then(|v| v.as_mat4()),
            Some(Matrix4::identity())
        );
        assert_eq!(program.snapshot().len(), 3);
        assert!(program.get("missing").is_none());
    }
}
