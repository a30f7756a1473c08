//! GPU texture resources for wgpu
//!
//! Turns decoded images into sampled textures: single-channel images become
//! `R8Unorm`, everything else is expanded to RGBA and stored as
//! `Rgba8UnormSrgb`. Mip chains are built on the CPU and uploaded level by
//! level. Sizes are checked against the device limit before anything is
//! allocated.

use image::{imageops, ImageBuffer, Pixel};
use thiserror::Error;

use super::texture::DecodedImage;

/// Addressing, filtering and mip generation for created textures
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TextureSettings {
    pub address_mode: wgpu::AddressMode,
    pub mag_filter: wgpu::FilterMode,
    pub min_filter: wgpu::FilterMode,
    pub mipmap_filter: wgpu::FilterMode,
    pub generate_mipmaps: bool,
}

impl Default for TextureSettings {
    fn default() -> Self {
        Self {
            address_mode: wgpu::AddressMode::MirrorRepeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            generate_mipmaps: true,
        }
    }
}

impl TextureSettings {
    /// Settings used for cube map faces
    pub fn cube_map() -> Self {
        Self {
            address_mode: wgpu::AddressMode::ClampToEdge,
            mipmap_filter: wgpu::FilterMode::Nearest,
            generate_mipmaps: false,
            ..Default::default()
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TextureError {
    #[error("texture is {width}x{height}, both sides must be at least 1")]
    Empty { width: u32, height: u32 },

    #[error("texture is {width}x{height}, the device allows at most {max}")]
    TooLarge { width: u32, height: u32, max: u32 },

    #[error("pixel buffer does not match {width}x{height}x{channels}")]
    PixelBuffer { width: u32, height: u32, channels: u8 },

    #[error("no cube map face carries pixels")]
    NoCubeFaces,

    #[error("cube face {face} is {width}x{height}, faces must be square")]
    CubeFaceNotSquare { face: usize, width: u32, height: u32 },

    #[error("cube face {face} is {width}x{height}, expected {size}x{size}")]
    CubeFaceMismatch {
        face: usize,
        width: u32,
        height: u32,
        size: u32,
    },
}

/// Checks a 2D texture size against the device's `max_texture_dimension_2d`
pub fn check_texture_size(width: u32, height: u32, max: u32) -> Result<(), TextureError> {
    if width == 0 || height == 0 {
        return Err(TextureError::Empty { width, height });
    }
    if width > max || height > max {
        return Err(TextureError::TooLarge { width, height, max });
    }
    Ok(())
}

/// Side length shared by the first six faces. Every face carrying pixels must
/// be square, of the same size, within `max` and fully filled.
pub fn check_cube_faces(faces: &[Option<&DecodedImage>], max: u32) -> Result<u32, TextureError> {
    let mut size = None;
    for (face, image) in faces.iter().take(6).enumerate() {
        let Some(image) = image else {
            continue;
        };
        let (width, height) = (image.width, image.height);
        if width != height {
            return Err(TextureError::CubeFaceNotSquare {
                face,
                width,
                height,
            });
        }
        let expected = width as usize * height as usize * image.channels as usize;
        if image.pixels.len() != expected {
            return Err(TextureError::PixelBuffer {
                width,
                height,
                channels: image.channels,
            });
        }
        match size {
            None => {
                check_texture_size(width, height, max)?;
                size = Some(width);
            }
            Some(size) if size != width => {
                return Err(TextureError::CubeFaceMismatch {
                    face,
                    width,
                    height,
                    size,
                });
            }
            Some(_) => {}
        }
    }
    size.ok_or(TextureError::NoCubeFaces)
}

/// GPU texture resource containing texture, view, and sampler
#[derive(Clone, Debug)]
pub struct TextureResource {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

impl TextureResource {
    /// Uploads a decoded image as a 2D texture, with a full mip chain when
    /// `settings` asks for one. Sides above `max_dimension` are rejected.
    pub fn from_decoded(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        image: &DecodedImage,
        label: &str,
        settings: &TextureSettings,
        max_dimension: u32,
    ) -> Result<Self, TextureError> {
        check_texture_size(image.width, image.height, max_dimension)?;

        let (format, levels) = if image.channels == 1 {
            let base = ImageBuffer::<image::Luma<u8>, _>::from_raw(
                image.width,
                image.height,
                image.pixels.clone(),
            );
            (wgpu::TextureFormat::R8Unorm, mip_chain(base, image, settings))
        } else {
            let base = ImageBuffer::<image::Rgba<u8>, _>::from_raw(
                image.width,
                image.height,
                image.to_rgba8(),
            );
            (wgpu::TextureFormat::Rgba8UnormSrgb, mip_chain(base, image, settings))
        };
        if levels.is_empty() {
            return Err(TextureError::PixelBuffer {
                width: image.width,
                height: image.height,
                channels: image.channels,
            });
        }

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: image.width,
                height: image.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: levels.len() as u32,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        let bytes_per_pixel = format.block_copy_size(None).unwrap_or(4);
        for (mip_level, level) in levels.iter().enumerate() {
            write_level(queue, &texture, mip_level as u32, 0, level, bytes_per_pixel);
        }
        log::debug!(
            "Created texture '{label}' {}x{} {format:?} with {} mip levels",
            image.width,
            image.height,
            levels.len()
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = create_sampler(device, label, settings);

        Ok(Self {
            texture,
            view,
            sampler,
        })
    }

    /// Uploads up to six faces as the layers of a cube texture.
    ///
    /// Faces are checked with [`check_cube_faces`]; a missing face leaves
    /// its layer empty.
    pub fn cube_from_faces(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        faces: &[Option<&DecodedImage>],
        label: &str,
        max_dimension: u32,
    ) -> Result<Self, TextureError> {
        let size = check_cube_faces(faces, max_dimension)?;
        let (width, height) = (size, size);
        let settings = TextureSettings::cube_map();

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 6,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        for (layer, face) in faces.iter().take(6).enumerate() {
            let Some(face) = face else {
                log::warn!("Cube face {layer} of '{label}' has no pixels");
                continue;
            };
            let level = MipLevel {
                pixels: face.to_rgba8(),
                width,
                height,
            };
            write_level(queue, &texture, 0, layer as u32, &level, 4);
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(label),
            dimension: Some(wgpu::TextureViewDimension::Cube),
            ..Default::default()
        });
        let sampler = create_sampler(device, label, &settings);

        Ok(Self {
            texture,
            view,
            sampler,
        })
    }
}

/// One level of a mip chain, tightly packed
#[derive(Clone, Debug, PartialEq)]
pub struct MipLevel {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Levels needed to go from `width` x `height` down to 1x1
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

fn mip_chain<P>(
    base: Option<ImageBuffer<P, Vec<u8>>>,
    image: &DecodedImage,
    settings: &TextureSettings,
) -> Vec<MipLevel>
where
    P: Pixel<Subpixel = u8> + 'static,
{
    let Some(base) = base else {
        return Vec::new();
    };

    let count = if settings.generate_mipmaps {
        mip_level_count(image.width, image.height)
    } else {
        1
    };

    let mut levels = Vec::with_capacity(count as usize);
    for level in 1..count {
        let width = (image.width >> level).max(1);
        let height = (image.height >> level).max(1);
        let resized = imageops::resize(&base, width, height, imageops::FilterType::Triangle);
        levels.push(MipLevel {
            pixels: resized.into_raw(),
            width,
            height,
        });
    }
    levels.insert(
        0,
        MipLevel {
            width: image.width,
            height: image.height,
            pixels: base.into_raw(),
        },
    );
    levels
}

fn write_level(
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
    mip_level: u32,
    layer: u32,
    level: &MipLevel,
    bytes_per_pixel: u32,
) {
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level,
            origin: wgpu::Origin3d {
                x: 0,
                y: 0,
                z: layer,
            },
            aspect: wgpu::TextureAspect::All,
        },
        &level.pixels,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(bytes_per_pixel * level.width),
            rows_per_image: Some(level.height),
        },
        wgpu::Extent3d {
            width: level.width,
            height: level.height,
            depth_or_array_layers: 1,
        },
    );
}

fn create_sampler(
    device: &wgpu::Device,
    label: &str,
    settings: &TextureSettings,
) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some(&format!("{label} Sampler")),
        address_mode_u: settings.address_mode,
        address_mode_v: settings.address_mode,
        address_mode_w: settings.address_mode,
        mag_filter: settings.mag_filter,
        min_filter: settings.min_filter,
        mipmap_filter: settings.mipmap_filter,
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mip_level_count() {
        assert_eq!(mip_level_count(1, 1), 1);
        assert_eq!(mip_level_count(256, 256), 9);
        assert_eq!(mip_level_count(640, 480), 10);
        assert_eq!(mip_level_count(0, 0), 1);
    }

    #[test]
    fn test_mip_chain_halves_down_to_one_pixel() {
        let image = DecodedImage::new(vec![200; 8 * 4], 8, 4, 1);
        let base = ImageBuffer::<image::Luma<u8>, _>::from_raw(8, 4, image.pixels.clone());

        let levels = mip_chain(base, &image, &TextureSettings::default());

        let sizes: Vec<_> = levels.iter().map(|l| (l.width, l.height)).collect();
        assert_eq!(sizes, vec![(8, 4), (4, 2), (2, 1), (1, 1)]);
        assert!(levels.iter().all(|l| l.pixels.len() == (l.width * l.height) as usize));
        assert_eq!(levels[3].pixels, vec![200]);
    }

    #[test]
    fn test_mip_chain_without_mipmaps_keeps_base_only() {
        let image = DecodedImage::new(vec![0; 4 * 4 * 4], 4, 4, 4);
        let base = ImageBuffer::<image::Rgba<u8>, _>::from_raw(4, 4, image.to_rgba8());

        let levels = mip_chain(base, &image, &TextureSettings::cube_map());

        assert_eq!(levels.len(), 1);
        assert_eq!(levels[0].pixels.len(), 64);
    }

    #[test]
    fn test_short_pixel_buffer_yields_no_levels() {
        let image = DecodedImage::new(vec![0; 3], 4, 4, 1);
        let base = ImageBuffer::<image::Luma<u8>, _>::from_raw(4, 4, image.pixels.clone());
        assert!(mip_chain(base, &image, &TextureSettings::default()).is_empty());
    }

    #[test]
    fn test_texture_size_limits() {
        assert_eq!(check_texture_size(64, 32, 4096), Ok(()));
        assert_eq!(check_texture_size(4096, 4096, 4096), Ok(()));
        assert_eq!(
            check_texture_size(0, 16, 4096),
            Err(TextureError::Empty {
                width: 0,
                height: 16
            })
        );
        assert_eq!(
            check_texture_size(16, 4097, 4096),
            Err(TextureError::TooLarge {
                width: 16,
                height: 4097,
                max: 4096
            })
        );
    }

    #[test]
    fn test_cube_faces_must_be_square_and_equal() {
        let square = DecodedImage::new(vec![0; 4 * 4 * 4], 4, 4, 4);
        let wide = DecodedImage::new(vec![0; 8 * 4 * 4], 8, 4, 4);
        let small = DecodedImage::new(vec![0; 2 * 2 * 4], 2, 2, 4);

        assert_eq!(check_cube_faces(&[Some(&square), None, Some(&square)], 4096), Ok(4));
        assert_eq!(check_cube_faces(&[None, None], 4096), Err(TextureError::NoCubeFaces));
        assert_eq!(
            check_cube_faces(&[Some(&square), Some(&wide)], 4096),
            Err(TextureError::CubeFaceNotSquare {
                face: 1,
                width: 8,
                height: 4
            })
        );
        assert_eq!(
            check_cube_faces(&[None, Some(&square), Some(&small)], 4096),
            Err(TextureError::CubeFaceMismatch {
                face: 2,
                width: 2,
                height: 2,
                size: 4
            })
        );
        let short = DecodedImage::new(vec![0; 3], 4, 4, 4);
        assert_eq!(
            check_cube_faces(&[Some(&square), Some(&short)], 4096),
            Err(TextureError::PixelBuffer {
                width: 4,
                height: 4,
                channels: 4
            })
        );
        assert_eq!(
            check_cube_faces(&[Some(&square)], 2),
            Err(TextureError::TooLarge {
                width: 4,
                height: 4,
                max: 2
            })
        );
    }
}
