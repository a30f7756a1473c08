//! Resource cache
//!
//! Deduplicates texture uploads by path and owns the material arena. Every
//! lookup degrades instead of failing: a miss is logged and answered with a
//! sentinel (texture handle 0, or the default material).

use std::collections::HashMap;
use std::fmt;

use crate::gfx::device::GraphicsDevice;
use crate::gfx::resources::material::{Material, MaterialArena, MaterialId};
use crate::gfx::resources::texture::{
    Image, ImageCrateDecoder, ImageDecoder, Texture, TextureKind,
};

/// Path-keyed texture cache plus material storage.
///
/// A path is uploaded at most once for the lifetime of the cache, including
/// paths whose decode failed: those stay cached with handle 0 and are never
/// retried.
pub struct ResourceCache {
    decoder: Box<dyn ImageDecoder>,
    textures: HashMap<String, Texture>,
    materials: MaterialArena,
}

impl fmt::Debug for ResourceCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceCache")
            .field("textures", &self.textures)
            .field("materials", &self.materials)
            .finish_non_exhaustive()
    }
}

impl Default for ResourceCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceCache {
    /// Creates a cache decoding through the `image` crate
    pub fn new() -> Self {
        Self::with_decoder(Box::new(ImageCrateDecoder))
    }

    pub fn with_decoder(decoder: Box<dyn ImageDecoder>) -> Self {
        Self {
            decoder,
            textures: HashMap::new(),
            materials: MaterialArena::new(),
        }
    }

    /// Loads a 2D texture, uploading it only the first time its path is seen.
    ///
    /// The returned texture is tagged [`TextureKind::Diffuse`]; callers retag
    /// their copy when the texture plays another role. The image's decoded
    /// pixels are released after upload.
    pub fn load_texture_2d(
        &mut self,
        device: &mut dyn GraphicsDevice,
        image: &mut Image,
    ) -> Texture {
        if let Some(texture) = self.textures.get(&image.path) {
            log::debug!("Texture cache hit for '{}'", image.path);
            return *texture;
        }

        if let Err(err) = image.decode(self.decoder.as_ref()) {
            log::error!("Texture failed to load at path '{}': {err}", image.path);
        }

        self.upload_2d(device, image)
    }

    /// Loads a 2D texture from encoded bytes held in memory, cached under
    /// `key` exactly like a file path.
    pub fn load_embedded_texture_2d(
        &mut self,
        device: &mut dyn GraphicsDevice,
        key: &str,
        bytes: &[u8],
        flip_vertically: bool,
    ) -> Texture {
        if let Some(texture) = self.textures.get(key) {
            log::debug!("Texture cache hit for embedded '{key}'");
            return *texture;
        }

        let mut image = Image::new(key, flip_vertically);
        match self.decoder.decode_memory(bytes, flip_vertically) {
            Ok(decoded) => image.data = Some(decoded),
            Err(err) => log::error!("Embedded texture '{key}' failed to load: {err}"),
        }

        self.upload_2d(device, &mut image)
    }

    fn upload_2d(&mut self, device: &mut dyn GraphicsDevice, image: &mut Image) -> Texture {
        let handle = device.create_texture_2d(image);
        image.release();

        let texture = Texture::new(handle, TextureKind::Diffuse);
        self.textures.insert(image.path.clone(), texture);
        log::debug!("Cached '{}' as {handle}", image.path);
        texture
    }

    /// Decodes and uploads the faces of a cube map. Cube maps bypass the
    /// path cache.
    pub fn load_texture_cube(
        &mut self,
        device: &mut dyn GraphicsDevice,
        faces: &mut [Image],
    ) -> Texture {
        for face in faces.iter_mut() {
            if let Err(err) = face.decode(self.decoder.as_ref()) {
                log::error!("Cube map face failed to load at path '{}': {err}", face.path);
            }
        }

        let handle = device.create_texture_cube(faces);
        for face in faces.iter_mut() {
            face.release();
        }

        Texture::new(handle, TextureKind::Diffuse)
    }

    /// Pure lookup of a previously loaded texture
    pub fn get_texture(&self, path: &str) -> Texture {
        match self.textures.get(path) {
            Some(texture) => *texture,
            None => {
                log::warn!("Texture '{path}' was never loaded");
                Texture::default()
            }
        }
    }

    pub fn add_material(&mut self, material: Material) -> MaterialId {
        self.materials.add(material)
    }

    /// Returns a copy of the material, or the default material when `id` is
    /// not in the arena.
    pub fn get_material(&self, id: MaterialId) -> Material {
        match self.materials.get(id) {
            Some(material) => material.clone(),
            None => {
                log::warn!(
                    "{id} is out of range ({} materials); using default",
                    self.materials.len()
                );
                Material::default()
            }
        }
    }

    pub fn try_get_material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id)
    }

    pub fn materials(&self) -> impl Iterator<Item = (MaterialId, &Material)> {
        self.materials.iter()
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    pub fn material_count(&self) -> usize {
        self.materials.len()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::gfx::device::{RecordingDevice, TextureHandle};
    use crate::gfx::resources::texture::{DecodeError, DecodedImage};
    use std::path::Path;

    /// Decoder that succeeds for every path except those containing "missing"
    pub(crate) struct FakeDecoder;

    impl ImageDecoder for FakeDecoder {
        fn decode_file(&self, path: &Path, _flip: bool) -> Result<DecodedImage, DecodeError> {
            if path.to_string_lossy().contains("missing") {
                return Err(DecodeError::Memory(image::ImageError::IoError(
                    std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
                )));
            }
            Ok(DecodedImage::new(vec![255; 2 * 2 * 4], 2, 2, 4))
        }

        fn decode_memory(&self, bytes: &[u8], _flip: bool) -> Result<DecodedImage, DecodeError> {
            Ok(DecodedImage::new(bytes.to_vec(), bytes.len() as u32, 1, 1))
        }
    }

    fn fake_cache() -> ResourceCache {
        ResourceCache::with_decoder(Box::new(FakeDecoder))
    }

    #[test]
    fn test_same_path_uploads_once() {
        let mut device = RecordingDevice::new();
        let mut cache = fake_cache();

        let first = cache.load_texture_2d(&mut device, &mut Image::new("brick.png", true));
        assert_eq!(device.texture_uploads(), 1);

        let mut again = Image::new("brick.png", true);
        let second = cache.load_texture_2d(&mut device, &mut again);

        assert_eq!(device.texture_uploads(), 1);
        assert_eq!(first, second);
        assert!(first.is_valid());
        assert_eq!(first.kind, TextureKind::Diffuse);
        assert_eq!(cache.texture_count(), 1);
    }

    #[test]
    fn test_pixels_are_released_after_upload() {
        let mut device = RecordingDevice::new();
        let mut cache = fake_cache();
        let mut image = Image::new("wall.png", false);

        cache.load_texture_2d(&mut device, &mut image);
        assert!(!image.is_decoded());
    }

    #[test]
    fn test_failed_decode_is_cached_as_missing() {
        crate::init_test_logging();
        let mut device = RecordingDevice::new();
        let mut cache = fake_cache();

        let texture = cache.load_texture_2d(&mut device, &mut Image::new("missing.png", true));
        assert_eq!(texture.handle, TextureHandle::INVALID);

        cache.load_texture_2d(&mut device, &mut Image::new("missing.png", true));
        assert_eq!(device.texture_uploads(), 0);
        assert_eq!(cache.texture_count(), 1);
    }

    #[test]
    fn test_real_decoder_missing_file_degrades() {
        let mut device = RecordingDevice::new();
        let mut cache = ResourceCache::new();

        let texture = cache.load_texture_2d(&mut device, &mut Image::new("no/such/file.png", true));
        assert!(!texture.is_valid());
    }

    #[test]
    fn test_get_texture_miss_returns_sentinel() {
        let cache = fake_cache();
        assert_eq!(cache.get_texture("never.png"), Texture::default());
    }

    #[test]
    fn test_embedded_textures_share_the_cache() {
        let mut device = RecordingDevice::new();
        let mut cache = fake_cache();

        let a = cache.load_embedded_texture_2d(&mut device, "scene.glb#*0", &[1, 2, 3], false);
        let b = cache.load_embedded_texture_2d(&mut device, "scene.glb#*0", &[1, 2, 3], false);

        assert_eq!(a, b);
        assert_eq!(device.texture_uploads(), 1);
        assert_eq!(cache.get_texture("scene.glb#*0"), a);
    }

    #[test]
    fn test_cube_faces_upload_as_one_texture() {
        let mut device = RecordingDevice::new();
        let mut cache = fake_cache();
        let mut faces: Vec<Image> = ["right", "left", "top", "bottom", "front", "back"]
            .iter()
            .map(|name| Image::new(format!("{name}.jpg"), false))
            .collect();

        let cube = cache.load_texture_cube(&mut device, &mut faces);

        assert!(cube.is_valid());
        assert!(faces.iter().all(|f| !f.is_decoded()));
        assert_eq!(cache.texture_count(), 0);
    }

    #[test]
    fn test_material_ids_round_trip() {
        let mut cache = fake_cache();
        let material = Material::default()
            .with_shininess(16.0)
            .with_texture(Texture::new(TextureHandle(3), TextureKind::Specular));

        let id = cache.add_material(material.clone());
        assert_eq!(cache.get_material(id), material);
        assert_eq!(cache.try_get_material(id), Some(&material));
        assert_eq!(cache.material_count(), 1);
    }

    #[test]
    fn test_out_of_range_material_is_default() {
        let cache = fake_cache();
        let id = MaterialId::from_raw(42);

        assert_eq!(cache.get_material(id), Material::default());
        assert!(cache.try_get_material(id).is_none());
    }
}
