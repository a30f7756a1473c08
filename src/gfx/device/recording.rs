//! Headless device that records every call.
//!
//! Resource creation hands out fresh handles and logs a [`DeviceEvent`];
//! draw-state calls go through a [`DrawRecorder`]. Batch stream contents are
//! kept so callers can inspect exactly what would have reached the GPU.

use std::collections::HashMap;
use std::rc::Rc;

use super::{
    DepthCompare, DrawCall, DrawKind, DrawRecorder, GraphicsDevice, MeshHandle, TextureHandle,
    TextureTarget,
};
use crate::gfx::rendering::instance::InstanceTransform;
use crate::gfx::rendering::shader::ShaderProgram;
use crate::gfx::resources::texture::Image;
use crate::gfx::scene::vertex::Vertex;

/// Resource allocation or upload observed by a [`RecordingDevice`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeviceEvent {
    MeshBuffers {
        handle: MeshHandle,
        vertex_count: usize,
        index_count: usize,
    },
    Texture2d {
        handle: TextureHandle,
        width: u32,
        height: u32,
        channels: u8,
    },
    TextureCube {
        handle: TextureHandle,
        faces_uploaded: usize,
    },
    BatchCreated {
        handle: MeshHandle,
        vertex_count: usize,
    },
    BatchWritten {
        handle: MeshHandle,
        vertex_count: usize,
    },
}

/// Current contents of a batch's two streams
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecordedBatch {
    pub vertices: Vec<Vertex>,
    pub transforms: Vec<InstanceTransform>,
}

#[derive(Debug, Default)]
pub struct RecordingDevice {
    next_handle: u32,
    events: Vec<DeviceEvent>,
    batches: HashMap<MeshHandle, RecordedBatch>,
    recorder: DrawRecorder,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self) -> u32 {
        self.next_handle += 1;
        self.next_handle
    }

    pub fn events(&self) -> &[DeviceEvent] {
        &self.events
    }

    fn count_events(&self, predicate: impl Fn(&DeviceEvent) -> bool) -> usize {
        self.events.iter().filter(|e| predicate(e)).count()
    }

    /// Number of 2D textures uploaded so far
    pub fn texture_uploads(&self) -> usize {
        self.count_events(|e| matches!(e, DeviceEvent::Texture2d { .. }))
    }

    pub fn cube_uploads(&self) -> usize {
        self.count_events(|e| matches!(e, DeviceEvent::TextureCube { .. }))
    }

    pub fn mesh_uploads(&self) -> usize {
        self.count_events(|e| matches!(e, DeviceEvent::MeshBuffers { .. }))
    }

    pub fn batch_creations(&self) -> usize {
        self.count_events(|e| matches!(e, DeviceEvent::BatchCreated { .. }))
    }

    pub fn batch_writes(&self) -> usize {
        self.count_events(|e| matches!(e, DeviceEvent::BatchWritten { .. }))
    }

    pub fn batch(&self, handle: MeshHandle) -> Option<&RecordedBatch> {
        self.batches.get(&handle)
    }

    pub fn draw_calls(&self) -> &[DrawCall] {
        self.recorder.calls()
    }

    pub fn take_draw_calls(&mut self) -> Vec<DrawCall> {
        self.recorder.take_calls()
    }

    pub fn depth_compare(&self) -> DepthCompare {
        self.recorder.depth_compare()
    }
}

impl GraphicsDevice for RecordingDevice {
    fn create_mesh_buffers(&mut self, vertices: &[Vertex], indices: &[u32]) -> MeshHandle {
        let handle = MeshHandle(self.allocate());
        self.events.push(DeviceEvent::MeshBuffers {
            handle,
            vertex_count: vertices.len(),
            index_count: indices.len(),
        });
        handle
    }

    fn create_texture_2d(&mut self, image: &Image) -> TextureHandle {
        let Some(data) = &image.data else {
            return TextureHandle::INVALID;
        };

        let handle = TextureHandle(self.allocate());
        self.events.push(DeviceEvent::Texture2d {
            handle,
            width: data.width,
            height: data.height,
            channels: data.channels,
        });
        handle
    }

    fn create_texture_cube(&mut self, faces: &[Image]) -> TextureHandle {
        let handle = TextureHandle(self.allocate());
        self.events.push(DeviceEvent::TextureCube {
            handle,
            faces_uploaded: faces.iter().take(6).filter(|f| f.is_decoded()).count(),
        });
        handle
    }

    fn create_batch_buffers(
        &mut self,
        vertices: &[Vertex],
        transforms: &[InstanceTransform],
    ) -> MeshHandle {
        let handle = MeshHandle(self.allocate());
        self.batches.insert(
            handle,
            RecordedBatch {
                vertices: vertices.to_vec(),
                transforms: transforms.to_vec(),
            },
        );
        self.events.push(DeviceEvent::BatchCreated {
            handle,
            vertex_count: vertices.len(),
        });
        handle
    }

    fn write_batch_buffers(
        &mut self,
        handle: MeshHandle,
        vertices: &[Vertex],
        transforms: &[InstanceTransform],
    ) {
        let Some(batch) = self.batches.get_mut(&handle) else {
            log::warn!("Write to unknown batch {handle}");
            return;
        };

        batch.vertices.clear();
        batch.vertices.extend_from_slice(vertices);
        batch.transforms.clear();
        batch.transforms.extend_from_slice(transforms);
        self.events.push(DeviceEvent::BatchWritten {
            handle,
            vertex_count: vertices.len(),
        });
    }

    fn use_program(&mut self, program: &Rc<dyn ShaderProgram>) {
        self.recorder.use_program(program);
    }

    fn bind_texture(&mut self, unit: u32, target: TextureTarget, texture: TextureHandle) {
        self.recorder.bind_texture(unit, target, texture);
    }

    fn bind_mesh(&mut self, mesh: MeshHandle) {
        self.recorder.bind_mesh(mesh);
    }

    fn set_depth_compare(&mut self, compare: DepthCompare) {
        self.recorder.set_depth_compare(compare);
    }

    fn draw_indexed(&mut self, index_count: u32) {
        self.recorder.record(DrawKind::Indexed { index_count });
    }

    fn draw_arrays(&mut self, vertex_count: u32) {
        self.recorder.record(DrawKind::Arrays { vertex_count });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::resources::texture::DecodedImage;

    #[test]
    fn test_texture_without_pixels_allocates_nothing() {
        let mut device = RecordingDevice::new();
        let handle = device.create_texture_2d(&Image::new("empty.png", false));

        assert_eq!(handle, TextureHandle::INVALID);
        assert!(device.events().is_empty());
    }

    #[test]
    fn test_handles_are_fresh_and_nonzero() {
        let mut device = RecordingDevice::new();
        let image = Image::from_decoded("a.png", DecodedImage::new(vec![0; 4], 1, 1, 4));

        let texture = device.create_texture_2d(&image);
        let mesh = device.create_mesh_buffers(&[Vertex::default(); 3], &[]);

        assert!(texture.is_valid());
        assert!(mesh.is_valid());
        assert_ne!(texture.0, mesh.0);
        assert_eq!(device.texture_uploads(), 1);
        assert_eq!(device.mesh_uploads(), 1);
    }

    #[test]
    fn test_partial_cube_uploads_supplied_faces() {
        let mut device = RecordingDevice::new();
        let face = Image::from_decoded("px.png", DecodedImage::new(vec![0; 4], 1, 1, 4));
        device.create_texture_cube(&[face.clone(), face]);

        assert_eq!(
            device.events()[0],
            DeviceEvent::TextureCube {
                handle: TextureHandle(1),
                faces_uploaded: 2
            }
        );
    }

    #[test]
    fn test_batch_write_replaces_contents() {
        let mut device = RecordingDevice::new();
        let handle = device.create_batch_buffers(
            &[Vertex::default(); 6],
            &[InstanceTransform::default(); 6],
        );

        device.write_batch_buffers(
            handle,
            &[Vertex::default(); 12],
            &[InstanceTransform::default(); 12],
        );

        let batch = device.batch(handle).map(|b| (b.vertices.len(), b.transforms.len()));
        assert_eq!(batch, Some((12, 12)));
        assert_eq!(device.batch_creations(), 1);
        assert_eq!(device.batch_writes(), 1);
    }
}
