//! wgpu-backed [`GraphicsDevice`]
//!
//! Buffers and textures are real GPU allocations kept in handle-keyed maps.
//! Draw-state calls are recorded as [`DrawCall`]s; at frame time
//! [`WgpuDevice::encode_draws`] replays them onto a render pass, leaving
//! pipeline and bind group selection to the caller.

use std::collections::HashMap;
use std::rc::Rc;

use anyhow::Context;
use thiserror::Error;
use wgpu::util::DeviceExt;

use super::instance::InstanceTransform;
use super::shader::ShaderProgram;
use crate::gfx::device::{
    DepthCompare, DrawCall, DrawKind, DrawRecorder, GraphicsDevice, MeshHandle, TextureHandle,
    TextureTarget,
};
use crate::gfx::resources::texture::Image;
use crate::gfx::resources::texture_resource::{TextureResource, TextureSettings};
use crate::gfx::scene::vertex::Vertex;

/// Vertex buffer slot of the per-vertex transform stream
pub const TRANSFORM_BUFFER_SLOT: u32 = 1;

#[derive(Clone, Debug)]
pub struct DeviceConfig {
    pub label: String,
    pub backends: wgpu::Backends,
    pub power_preference: wgpu::PowerPreference,
    pub max_texture_dimension_2d: u32,
    pub textures: TextureSettings,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            label: "Glint Device".to_string(),
            backends: wgpu::Backends::all(),
            power_preference: wgpu::PowerPreference::default(),
            max_texture_dimension_2d: 4096,
            textures: TextureSettings::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("no buffers allocated for {0}")]
    UnknownMesh(MeshHandle),
    #[error("{0} has no index buffer")]
    MissingIndexBuffer(MeshHandle),
}

#[derive(Debug)]
struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: Option<wgpu::Buffer>,
    transform_buffer: Option<wgpu::Buffer>,
}

pub struct WgpuDevice {
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: DeviceConfig,
    next_handle: u32,
    meshes: HashMap<MeshHandle, GpuMesh>,
    textures: HashMap<TextureHandle, TextureResource>,
    recorder: DrawRecorder,
}

impl WgpuDevice {
    /// Requests an adapter and device with no surface attached
    pub fn new_headless(config: DeviceConfig) -> anyhow::Result<Self> {
        pollster::block_on(async {
            let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
                backends: config.backends,
                ..Default::default()
            });

            let adapter = instance
                .request_adapter(&wgpu::RequestAdapterOptions {
                    power_preference: config.power_preference,
                    compatible_surface: None,
                    force_fallback_adapter: false,
                })
                .await
                .context("Failed to request adapter")?;
            log::info!("Using adapter {:?}", adapter.get_info().name);

            let (device, queue) = adapter
                .request_device(&wgpu::DeviceDescriptor {
                    label: Some(&config.label),
                    required_features: wgpu::Features::default(),
                    required_limits: wgpu::Limits {
                        max_texture_dimension_2d: config.max_texture_dimension_2d,
                        ..wgpu::Limits::downlevel_defaults()
                    },
                    memory_hints: wgpu::MemoryHints::default(),
                    trace: wgpu::Trace::Off,
                })
                .await
                .context("Failed to request a device")?;

            Ok(Self::from_parts(device, queue, config))
        })
    }

    /// Wraps a device and queue created elsewhere, e.g. alongside a surface
    pub fn from_parts(device: wgpu::Device, queue: wgpu::Queue, config: DeviceConfig) -> Self {
        Self {
            device,
            queue,
            config,
            next_handle: 0,
            meshes: HashMap::new(),
            textures: HashMap::new(),
            recorder: DrawRecorder::new(),
        }
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn texture(&self, handle: TextureHandle) -> Option<&TextureResource> {
        self.textures.get(&handle)
    }

    pub fn draw_calls(&self) -> &[DrawCall] {
        self.recorder.calls()
    }

    pub fn take_draw_calls(&mut self) -> Vec<DrawCall> {
        self.recorder.take_calls()
    }

    /// Replays `calls` onto `pass`.
    ///
    /// `bind` runs before each draw and is expected to set the pipeline and
    /// bind groups matching the call's program, uniforms, textures and depth
    /// compare. Vertex and index buffers are set here.
    pub fn encode_draws<F>(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        calls: &[DrawCall],
        mut bind: F,
    ) -> Result<(), DeviceError>
    where
        F: FnMut(&mut wgpu::RenderPass<'_>, &DrawCall),
    {
        for call in calls {
            let mesh = self
                .meshes
                .get(&call.mesh)
                .ok_or(DeviceError::UnknownMesh(call.mesh))?;

            bind(pass, call);
            pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            if let Some(transforms) = &mesh.transform_buffer {
                pass.set_vertex_buffer(TRANSFORM_BUFFER_SLOT, transforms.slice(..));
            }

            match call.kind {
                DrawKind::Indexed { index_count } => {
                    let indices = mesh
                        .index_buffer
                        .as_ref()
                        .ok_or(DeviceError::MissingIndexBuffer(call.mesh))?;
                    pass.set_index_buffer(indices.slice(..), wgpu::IndexFormat::Uint32);
                    pass.draw_indexed(0..index_count, 0, 0..1);
                }
                DrawKind::Arrays { vertex_count } => pass.draw(0..vertex_count, 0..1),
            }
        }
        Ok(())
    }

    /// Largest texture side the device accepts
    pub fn max_texture_dimension(&self) -> u32 {
        self.device.limits().max_texture_dimension_2d
    }

    fn allocate(&mut self) -> u32 {
        self.next_handle += 1;
        self.next_handle
    }

    fn create_stream(&self, label: &str, contents: &[u8]) -> wgpu::Buffer {
        self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        })
    }
}

/// Whether `needed` bytes fit in a buffer of `capacity` bytes
fn fits(capacity: wgpu::BufferAddress, needed: usize) -> bool {
    needed as wgpu::BufferAddress <= capacity
}

impl GraphicsDevice for WgpuDevice {
    fn create_mesh_buffers(&mut self, vertices: &[Vertex], indices: &[u32]) -> MeshHandle {
        let handle = MeshHandle(self.allocate());
        let vertex_buffer = self.create_stream(
            &format!("{handle} Vertex Buffer"),
            bytemuck::cast_slice(vertices),
        );
        let index_buffer = (!indices.is_empty()).then(|| {
            self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{handle} Index Buffer")),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            })
        });

        log::debug!(
            "Uploaded {handle}: {} vertices, {} indices",
            vertices.len(),
            indices.len()
        );
        self.meshes.insert(
            handle,
            GpuMesh {
                vertex_buffer,
                index_buffer,
                transform_buffer: None,
            },
        );
        handle
    }

    fn create_texture_2d(&mut self, image: &Image) -> TextureHandle {
        let Some(data) = &image.data else {
            log::warn!("No pixels to upload for '{}'", image.path);
            return TextureHandle::INVALID;
        };

        let resource = match TextureResource::from_decoded(
            &self.device,
            &self.queue,
            data,
            &image.path,
            &self.config.textures,
            self.max_texture_dimension(),
        ) {
            Ok(resource) => resource,
            Err(err) => {
                log::error!("Cannot create texture '{}': {err}", image.path);
                return TextureHandle::INVALID;
            }
        };

        let handle = TextureHandle(self.allocate());
        self.textures.insert(handle, resource);
        handle
    }

    fn create_texture_cube(&mut self, faces: &[Image]) -> TextureHandle {
        let label = faces.first().map(|f| f.path.as_str()).unwrap_or("cube map");
        let decoded: Vec<_> = faces.iter().map(|f| f.data.as_ref()).collect();

        let resource = match TextureResource::cube_from_faces(
            &self.device,
            &self.queue,
            &decoded,
            label,
            self.max_texture_dimension(),
        ) {
            Ok(resource) => resource,
            Err(err) => {
                log::error!("Cannot create cube map '{label}': {err}");
                return TextureHandle::INVALID;
            }
        };

        let handle = TextureHandle(self.allocate());
        self.textures.insert(handle, resource);
        handle
    }

    fn create_batch_buffers(
        &mut self,
        vertices: &[Vertex],
        transforms: &[InstanceTransform],
    ) -> MeshHandle {
        let handle = MeshHandle(self.allocate());
        let vertex_buffer = self.create_stream(
            &format!("{handle} Batch Vertices"),
            bytemuck::cast_slice(vertices),
        );
        let transform_buffer = self.create_stream(
            &format!("{handle} Batch Transforms"),
            bytemuck::cast_slice(transforms),
        );

        self.meshes.insert(
            handle,
            GpuMesh {
                vertex_buffer,
                index_buffer: None,
                transform_buffer: Some(transform_buffer),
            },
        );
        handle
    }

    fn write_batch_buffers(
        &mut self,
        handle: MeshHandle,
        vertices: &[Vertex],
        transforms: &[InstanceTransform],
    ) {
        let vertex_bytes: &[u8] = bytemuck::cast_slice(vertices);
        let transform_bytes: &[u8] = bytemuck::cast_slice(transforms);

        let Some(mesh) = self.meshes.get(&handle) else {
            log::warn!("Cannot write batch {handle}: not allocated");
            return;
        };
        let vertex_fits = fits(mesh.vertex_buffer.size(), vertex_bytes.len());
        let transform_fits = mesh
            .transform_buffer
            .as_ref()
            .is_some_and(|b| fits(b.size(), transform_bytes.len()));

        // Grown batches get fresh buffers; the rest are overwritten in place
        let new_vertices = (!vertex_fits)
            .then(|| self.create_stream(&format!("{handle} Batch Vertices"), vertex_bytes));
        let new_transforms = (!transform_fits)
            .then(|| self.create_stream(&format!("{handle} Batch Transforms"), transform_bytes));

        let Some(mesh) = self.meshes.get_mut(&handle) else {
            return;
        };
        match new_vertices {
            Some(buffer) => mesh.vertex_buffer = buffer,
            None if !vertex_bytes.is_empty() => {
                self.queue.write_buffer(&mesh.vertex_buffer, 0, vertex_bytes)
            }
            None => {}
        }
        if let Some(buffer) = new_transforms {
            mesh.transform_buffer = Some(buffer);
        } else if let Some(buffer) = &mesh.transform_buffer {
            if !transform_bytes.is_empty() {
                self.queue.write_buffer(buffer, 0, transform_bytes);
            }
        }
    }

    fn use_program(&mut self, program: &Rc<dyn ShaderProgram>) {
        self.recorder.use_program(program);
    }

    fn bind_texture(&mut self, unit: u32, target: TextureTarget, texture: TextureHandle) {
        if texture.is_valid() && !self.textures.contains_key(&texture) {
            log::warn!("Binding unknown {texture} to unit {unit}");
        }
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
    use crate::gfx::geometry::generate_cube;
    use crate::gfx::rendering::shader::UniformProgram;
    use crate::gfx::resources::texture::DecodedImage;

    #[test]
    fn test_default_config() {
        let config = DeviceConfig::default();
        assert_eq!(config.max_texture_dimension_2d, 4096);
        assert_eq!(config.textures.address_mode, wgpu::AddressMode::MirrorRepeat);
        assert!(config.textures.generate_mipmaps);
    }

    #[test]
    fn test_batch_streams_fit_check() {
        let vertex_bytes = std::mem::size_of::<Vertex>() * 6;
        assert!(fits(vertex_bytes as u64, vertex_bytes));
        assert!(fits(1024, vertex_bytes));
        assert!(!fits(vertex_bytes as u64, vertex_bytes * 2));
    }

    #[test]
    fn test_depth_compare_maps_to_wgpu() {
        assert_eq!(
            wgpu::CompareFunction::from(DepthCompare::LessEqual),
            wgpu::CompareFunction::LessEqual
        );
        assert_eq!(
            wgpu::CompareFunction::from(DepthCompare::default()),
            wgpu::CompareFunction::Less
        );
    }

    #[test]
    #[ignore = "needs a GPU adapter"]
    fn test_headless_device_uploads_and_records() -> anyhow::Result<()> {
        let mut device = WgpuDevice::new_headless(DeviceConfig::default())?;

        let cube = generate_cube().to_mesh();
        let mesh = device.create_mesh_buffers(&cube.vertices, &cube.indices);
        let texture = device.create_texture_2d(&Image::from_decoded(
            "grey.png",
            DecodedImage::new(vec![128; 16 * 16], 16, 16, 1),
        ));
        assert!(device.texture(texture).is_some());
        assert_eq!(device.texture(texture).map(|t| t.texture.mip_level_count()), Some(5));

        let batch = device.create_batch_buffers(
            &[Vertex::default(); 6],
            &[InstanceTransform::default(); 6],
        );
        device.write_batch_buffers(
            batch,
            &[Vertex::default(); 12],
            &[InstanceTransform::default(); 12],
        );

        device.use_program(&UniformProgram::shared("lit"));
        device.bind_mesh(mesh);
        device.draw_arrays(36);
        assert_eq!(device.take_draw_calls().len(), 1);
        assert!(device.draw_calls().is_empty());

        // Oversized and mismatched textures are refused
        let max = device.max_texture_dimension();
        let too_wide = device.create_texture_2d(&Image::from_decoded(
            "wide.png",
            DecodedImage::new(vec![0; max as usize + 1], max + 1, 1, 1),
        ));
        assert_eq!(too_wide, TextureHandle::INVALID);
        let faces = [
            Image::from_decoded("a.png", DecodedImage::new(vec![0; 16], 2, 2, 4)),
            Image::from_decoded("b.png", DecodedImage::new(vec![0; 64], 4, 4, 4)),
        ];
        assert_eq!(device.create_texture_cube(&faces), TextureHandle::INVALID);
        Ok(())
    }
}
