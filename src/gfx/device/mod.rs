//! # Graphics Device
//!
//! The [`GraphicsDevice`] trait is the only way the rest of the runtime talks
//! to the GPU. It creates buffers and textures and hands back opaque integer
//! handles, and it receives the state changes and draw commands of a frame.
//!
//! Two implementations ship with the crate:
//!
//! - [`WgpuDevice`](crate::gfx::rendering::wgpu_device::WgpuDevice) - real GPU
//!   resources through wgpu
//! - [`RecordingDevice`](recording::RecordingDevice) - headless, records every
//!   call for inspection
//!
//! Draw-state operations share one bookkeeping type, [`DrawRecorder`], which
//! turns the bind/draw call sequence into a list of self-contained
//! [`DrawCall`]s.

pub mod recording;

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::gfx::rendering::instance::InstanceTransform;
use crate::gfx::rendering::shader::{ProgramId, ShaderProgram, UniformBlock};
use crate::gfx::resources::texture::Image;
use crate::gfx::scene::vertex::Vertex;

pub use recording::{DeviceEvent, RecordingDevice};

/// Device handle of a vertex/index buffer set. `0` is never a valid handle.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshHandle(pub u32);

impl MeshHandle {
    pub const INVALID: Self = Self(0);

    pub fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for MeshHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mesh#{}", self.0)
    }
}

/// Device handle of a texture. `0` means "missing" or "failed to load".
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(pub u32);

impl TextureHandle {
    pub const INVALID: Self = Self(0);

    pub fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for TextureHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "texture#{}", self.0)
    }
}

/// Texture binding target
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TextureTarget {
    D2,
    Cube,
}

/// Depth comparison used by subsequent draws
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum DepthCompare {
    #[default]
    Less,
    /// Lets geometry written at the far plane pass behind what is already drawn
    LessEqual,
}

impl From<DepthCompare> for wgpu::CompareFunction {
    fn from(compare: DepthCompare) -> Self {
        match compare {
            DepthCompare::Less => wgpu::CompareFunction::Less,
            DepthCompare::LessEqual => wgpu::CompareFunction::LessEqual,
        }
    }
}

/// How a draw call reads its vertices
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DrawKind {
    /// Indexed triangle list over the mesh's index buffer
    Indexed { index_count: u32 },
    /// Non-indexed triangle list over the vertex buffer
    Arrays { vertex_count: u32 },
}

/// A texture bound to a numbered unit at the time of a draw
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TextureBinding {
    pub unit: u32,
    pub target: TextureTarget,
    pub texture: TextureHandle,
}

/// Everything needed to replay one draw: program, uniform values, texture
/// units, mesh and depth state, captured when the draw was issued.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawCall {
    pub program: Option<ProgramId>,
    pub uniforms: UniformBlock,
    pub textures: Vec<TextureBinding>,
    pub mesh: MeshHandle,
    pub depth_compare: DepthCompare,
    pub kind: DrawKind,
}

impl DrawCall {
    /// Number of vertices the GPU will process for this call
    pub fn element_count(&self) -> u32 {
        match self.kind {
            DrawKind::Indexed { index_count } => index_count,
            DrawKind::Arrays { vertex_count } => vertex_count,
        }
    }

    pub fn texture_on_unit(&self, unit: u32) -> Option<TextureBinding> {
        self.textures.iter().copied().find(|b| b.unit == unit)
    }
}

/// GPU object creation and draw submission.
///
/// All methods must be called from the thread that owns the device. Bindings
/// issued before a draw belong to that draw; the order of calls is the only
/// synchronization.
pub trait GraphicsDevice {
    /// Allocates a vertex buffer and, when `indices` is non-empty, an index
    /// buffer. Attribute layout is fixed by [`Vertex::desc`].
    ///
    /// Each call allocates; calling twice for the same data leaks the first
    /// allocation until the device is dropped.
    fn create_mesh_buffers(&mut self, vertices: &[Vertex], indices: &[u32]) -> MeshHandle;

    /// Uploads a decoded image as a mipmapped, mirrored-repeat 2D texture.
    ///
    /// Returns [`TextureHandle::INVALID`] without allocating when the image
    /// carries no pixel data.
    fn create_texture_2d(&mut self, image: &Image) -> TextureHandle;

    /// Uploads up to six faces, in +X, -X, +Y, -Y, +Z, -Z order, as one cube
    /// texture. Missing faces are left empty.
    fn create_texture_cube(&mut self, faces: &[Image]) -> TextureHandle;

    /// Allocates the vertex stream and per-vertex transform stream of a
    /// sprite batch.
    fn create_batch_buffers(
        &mut self,
        vertices: &[Vertex],
        transforms: &[InstanceTransform],
    ) -> MeshHandle;

    /// Replaces the full contents of both streams of a batch.
    fn write_batch_buffers(
        &mut self,
        handle: MeshHandle,
        vertices: &[Vertex],
        transforms: &[InstanceTransform],
    );

    fn use_program(&mut self, program: &Rc<dyn ShaderProgram>);
    fn bind_texture(&mut self, unit: u32, target: TextureTarget, texture: TextureHandle);
    fn bind_mesh(&mut self, mesh: MeshHandle);
    fn set_depth_compare(&mut self, compare: DepthCompare);
    fn draw_indexed(&mut self, index_count: u32);
    fn draw_arrays(&mut self, vertex_count: u32);
}

/// Bound draw state plus the draw calls recorded so far in the frame.
#[derive(Debug, Default)]
pub struct DrawRecorder {
    program: Option<Rc<dyn ShaderProgram>>,
    textures: BTreeMap<u32, TextureBinding>,
    mesh: MeshHandle,
    depth_compare: DepthCompare,
    calls: Vec<DrawCall>,
}

impl DrawRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn use_program(&mut self, program: &Rc<dyn ShaderProgram>) {
        self.program = Some(Rc::clone(program));
    }

    pub fn bind_texture(&mut self, unit: u32, target: TextureTarget, texture: TextureHandle) {
        self.textures.insert(
            unit,
            TextureBinding {
                unit,
                target,
                texture,
            },
        );
    }

    pub fn bind_mesh(&mut self, mesh: MeshHandle) {
        self.mesh = mesh;
    }

    pub fn set_depth_compare(&mut self, compare: DepthCompare) {
        self.depth_compare = compare;
    }

    pub fn depth_compare(&self) -> DepthCompare {
        self.depth_compare
    }

    /// Captures the currently bound state as a new draw call
    pub fn record(&mut self, kind: DrawKind) -> &DrawCall {
        if self.program.is_none() {
            log::warn!("Draw issued with no program in use");
        }

        let call = DrawCall {
            program: self.program.as_ref().map(|p| p.id()),
            uniforms: self
                .program
                .as_ref()
                .map(|p| p.snapshot())
                .unwrap_or_default(),
            textures: self.textures.values().copied().collect(),
            mesh: self.mesh,
            depth_compare: self.depth_compare,
            kind,
        };
        self.calls.push(call);
        &self.calls[self.calls.len() - 1]
    }

    pub fn calls(&self) -> &[DrawCall] {
        &self.calls
    }

    /// Returns the frame's draw calls and starts a new frame. Bound state is
    /// kept, as it is on a real device.
    pub fn take_calls(&mut self) -> Vec<DrawCall> {
        std::mem::take(&mut self.calls)
    }
}
