//! Texture descriptors and image decoding
//!
//! An [`Image`] is a path plus, transiently, the decoded pixels. Pixels only
//! live between decoding and upload; the cache frees them as soon as the
//! device has a copy. Decoding goes through the [`ImageDecoder`] trait so the
//! cache can run against in-memory fixtures.

use std::path::Path;

use image::DynamicImage;
use thiserror::Error;

use crate::gfx::device::TextureHandle;

/// Role of a texture within a material
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TextureKind {
    #[default]
    Diffuse,
    Specular,
}

impl TextureKind {
    /// Sampler name prefix used by lit programs
    pub fn sampler_prefix(self) -> &'static str {
        match self {
            TextureKind::Diffuse => "texture_diffuse",
            TextureKind::Specular => "texture_specular",
        }
    }
}

/// Device texture plus the role it plays in a material
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Texture {
    pub handle: TextureHandle,
    pub kind: TextureKind,
}

impl Texture {
    pub const fn new(handle: TextureHandle, kind: TextureKind) -> Self {
        Self { handle, kind }
    }

    pub fn is_valid(&self) -> bool {
        self.handle.is_valid()
    }

    /// Same device texture, different role
    pub fn with_kind(self, kind: TextureKind) -> Self {
        Self { kind, ..self }
    }
}

/// Tightly packed 8-bit pixels, rows top to bottom unless flipped at decode
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedImage {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// 1 (grey), 3 (RGB) or 4 (RGBA)
    pub channels: u8,
}

impl DecodedImage {
    pub fn new(pixels: Vec<u8>, width: u32, height: u32, channels: u8) -> Self {
        Self {
            pixels,
            width,
            height,
            channels,
        }
    }

    /// Keeps grey, RGB and RGBA layouts as they are; everything else is
    /// converted to RGBA.
    pub fn from_dynamic(image: DynamicImage, flip_vertically: bool) -> Self {
        let image = if flip_vertically { image.flipv() } else { image };
        let (width, height) = (image.width(), image.height());

        let (pixels, channels) = match image {
            DynamicImage::ImageLuma8(buffer) => (buffer.into_raw(), 1),
            DynamicImage::ImageRgb8(buffer) => (buffer.into_raw(), 3),
            DynamicImage::ImageRgba8(buffer) => (buffer.into_raw(), 4),
            other => (other.to_rgba8().into_raw(), 4),
        };

        Self::new(pixels, width, height, channels)
    }

    /// Returns the pixels expanded to four channels
    pub fn to_rgba8(&self) -> Vec<u8> {
        match self.channels {
            4 => self.pixels.clone(),
            3 => self
                .pixels
                .chunks_exact(3)
                .flat_map(|p| [p[0], p[1], p[2], 255])
                .collect(),
            2 => self
                .pixels
                .chunks_exact(2)
                .flat_map(|p| [p[0], p[0], p[0], p[1]])
                .collect(),
            _ => self.pixels.iter().flat_map(|&l| [l, l, l, 255]).collect(),
        }
    }
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("failed to decode image '{path}': {source}")]
    File {
        path: String,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to decode in-memory image: {0}")]
    Memory(#[from] image::ImageError),
}

/// Turns encoded image files or bytes into [`DecodedImage`]s
pub trait ImageDecoder {
    fn decode_file(&self, path: &Path, flip_vertically: bool) -> Result<DecodedImage, DecodeError>;

    fn decode_memory(&self, bytes: &[u8], flip_vertically: bool)
        -> Result<DecodedImage, DecodeError>;
}

/// Decoder backed by the `image` crate (PNG and JPEG)
#[derive(Copy, Clone, Debug, Default)]
pub struct ImageCrateDecoder;

impl ImageDecoder for ImageCrateDecoder {
    fn decode_file(&self, path: &Path, flip_vertically: bool) -> Result<DecodedImage, DecodeError> {
        let image = image::open(path).map_err(|source| DecodeError::File {
            path: path.display().to_string(),
            source,
        })?;
        Ok(DecodedImage::from_dynamic(image, flip_vertically))
    }

    fn decode_memory(
        &self,
        bytes: &[u8],
        flip_vertically: bool,
    ) -> Result<DecodedImage, DecodeError> {
        let image = image::load_from_memory(bytes)?;
        Ok(DecodedImage::from_dynamic(image, flip_vertically))
    }
}

/// An image source: its path (the cache key) and, until uploaded, its pixels.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Image {
    pub path: String,
    pub flip_vertically: bool,
    pub data: Option<DecodedImage>,
}

impl Image {
    pub fn new(path: impl Into<String>, flip_vertically: bool) -> Self {
        Self {
            path: path.into(),
            flip_vertically,
            data: None,
        }
    }

    /// An image whose pixels are already in memory
    pub fn from_decoded(path: impl Into<String>, data: DecodedImage) -> Self {
        Self {
            path: path.into(),
            flip_vertically: false,
            data: Some(data),
        }
    }

    pub fn is_decoded(&self) -> bool {
        self.data.is_some()
    }

    /// Decodes the file at `path` unless pixels are already present
    pub fn decode(&mut self, decoder: &dyn ImageDecoder) -> Result<(), DecodeError> {
        if self.data.is_none() {
            let decoded = decoder.decode_file(Path::new(&self.path), self.flip_vertically)?;
            self.data = Some(decoded);
        }
        Ok(())
    }

    /// Frees the decoded pixels
    pub fn release(&mut self) {
        self.data = None;
    }
}
