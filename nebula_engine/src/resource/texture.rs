/// Textures of the 8 topologies with immutable storage and mutable sampler state
///
/// Storage (topology, format, extent, level count) is fixed at creation.
/// Pixel content is updated per level and region; for cube and array
/// topologies the z axis of a region selects the face or layer (the y axis
/// for 1D arrays).

use std::sync::{Arc, PoisonError, RwLock};
use crate::context::{ResourceKind, ResourceOwner};
use crate::error::{Error, Result};
use crate::renderer::{
    max_levels, CompareFunc, Filter, PixelFormat, SamplerState, Swizzle, Texture as BackendTexture,
    TextureDesc, TextureRegion, TextureType, Wrap,
};
use crate::resource::ImageData;
use crate::{engine_debug, engine_error, engine_fail, engine_trace};

/// Requested mip level count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Levels {
    /// Full chain down to 1×1
    Auto,
    /// At most this many levels (clamped to the full chain)
    Count(u32),
}

/// GPU texture bound to the context it was created in
pub struct Texture {
    owner: ResourceOwner,
    desc: TextureDesc,
    backend: Arc<dyn BackendTexture>,
    sampler: RwLock<SamplerState>,
}

impl Texture {
    // ===== CREATION =====

    /// Allocate storage without content
    ///
    /// `extent` is (width, height, depth) with the per-topology meaning
    /// documented on `TextureDesc`. Axes a topology does not use must be 1.
    pub fn new_empty(texture_type: TextureType, format: PixelFormat, extent: [u32; 3], levels: Levels) -> Result<Arc<Texture>> {
        let desc = validated_desc(texture_type, format, extent, levels)?;
        let (owner, context) = ResourceOwner::acquire(
            ResourceKind::Texture,
            format!("{:?} {:?} {}x{}x{}", texture_type, format, extent[0], extent[1], extent[2]),
        );
        let backend = context.renderer().create_texture(&desc)?;
        let sampler = SamplerState::for_levels(desc.levels);
        backend.apply_sampler(&sampler)?;

        engine_debug!(
            "nebula::Texture",
            "Created {:?} texture {}x{}x{} ({:?}, {} levels)",
            texture_type, desc.width, desc.height, desc.depth, format, desc.levels
        );
        Ok(Arc::new(Texture {
            owner,
            desc,
            backend,
            sampler: RwLock::new(sampler),
        }))
    }

    pub fn new_1d(format: PixelFormat, width: u32, levels: Levels) -> Result<Arc<Texture>> {
        Self::new_empty(TextureType::Texture1D, format, [width, 1, 1], levels)
    }

    pub fn new_2d(format: PixelFormat, width: u32, height: u32, levels: Levels) -> Result<Arc<Texture>> {
        Self::new_empty(TextureType::Texture2D, format, [width, height, 1], levels)
    }

    pub fn new_3d(format: PixelFormat, width: u32, height: u32, depth: u32, levels: Levels) -> Result<Arc<Texture>> {
        Self::new_empty(TextureType::Texture3D, format, [width, height, depth], levels)
    }

    pub fn new_cube(format: PixelFormat, size: u32, levels: Levels) -> Result<Arc<Texture>> {
        Self::new_empty(TextureType::Cube, format, [size, size, 6], levels)
    }

    pub fn new_1d_array(format: PixelFormat, width: u32, layers: u32, levels: Levels) -> Result<Arc<Texture>> {
        Self::new_empty(TextureType::Texture1DArray, format, [width, layers, 1], levels)
    }

    pub fn new_2d_array(format: PixelFormat, width: u32, height: u32, layers: u32, levels: Levels) -> Result<Arc<Texture>> {
        Self::new_empty(TextureType::Texture2DArray, format, [width, height, layers], levels)
    }

    pub fn new_cube_array(format: PixelFormat, size: u32, cubes: u32, levels: Levels) -> Result<Arc<Texture>> {
        Self::new_empty(TextureType::CubeArray, format, [size, size, cubes.saturating_mul(6)], levels)
    }

    /// Rectangle texture (single level, unnormalized coordinates)
    pub fn new_rect(format: PixelFormat, width: u32, height: u32) -> Result<Arc<Texture>> {
        Self::new_empty(TextureType::Rect, format, [width, height, 1], Levels::Count(1))
    }

    /// Create a 2D texture from one image
    pub fn from_image(format: PixelFormat, image: &ImageData, mipmaps: bool) -> Result<Arc<Texture>> {
        Self::from_images(TextureType::Texture2D, format, std::slice::from_ref(image), mipmaps)
    }

    /// Create a texture and upload level 0 from `images`
    ///
    /// 1D, 2D, 3D and Rect take exactly one image. Cubemaps take exactly 6
    /// faces (+X, -X, +Y, -Y, +Z, -Z), cube arrays a multiple of 6, and the
    /// other array topologies one image per layer. With `mipmaps` the full
    /// chain is allocated and generated from level 0.
    pub fn from_images(texture_type: TextureType, format: PixelFormat, images: &[ImageData], mipmaps: bool) -> Result<Arc<Texture>> {
        let Some(first) = images.first() else {
            engine_fail!("nebula::Texture", Error::InvalidArgument("no images given".to_string()));
        };
        if images.iter().any(|i| (i.width, i.height, i.depth) != (first.width, first.height, first.depth)) {
            engine_fail!("nebula::Texture", Error::InvalidArgument("images differ in size".to_string()));
        }

        let count = images.len() as u32;
        let single = matches!(
            texture_type,
            TextureType::Texture1D | TextureType::Texture2D | TextureType::Texture3D | TextureType::Rect
        );
        if single && count != 1 {
            engine_fail!("nebula::Texture", Error::InvalidArgument(format!(
                "{:?} texture takes one image, got {}", texture_type, count
            )));
        }
        if texture_type == TextureType::Cube && count != 6 {
            engine_fail!("nebula::Texture", Error::InvalidArgument(format!("cubemap needs exactly 6 faces, got {}", count)));
        }
        if texture_type == TextureType::CubeArray && count % 6 != 0 {
            engine_fail!("nebula::Texture", Error::InvalidArgument(format!(
                "cube array needs a multiple of 6 faces, got {}", count
            )));
        }

        let extent = match texture_type {
            TextureType::Texture1D => [first.width, first.height, 1],
            TextureType::Texture3D => [first.width, first.height, first.depth],
            TextureType::Texture1DArray => [first.width, count, 1],
            TextureType::Texture2D | TextureType::Rect => [first.width, first.height, 1],
            TextureType::Cube | TextureType::Texture2DArray | TextureType::CubeArray => [first.width, first.height, count],
        };
        let levels = if mipmaps && texture_type.supports_mipmaps() { Levels::Auto } else { Levels::Count(1) };
        let texture = Self::new_empty(texture_type, format, extent, levels)?;

        for (index, image) in images.iter().enumerate() {
            let index = index as u32;
            let (offset, size) = match texture_type {
                TextureType::Texture1DArray => ([0, index, 0], [image.width, 1, 1]),
                TextureType::Cube | TextureType::Texture2DArray | TextureType::CubeArray => {
                    ([0, 0, index], [image.width, image.height, 1])
                }
                _ => ([0, 0, 0], [extent[0], extent[1], extent[2]]),
            };
            texture.upload(0, offset, size, image)?;
        }

        if mipmaps {
            texture.generate_mipmaps()?;
        }
        Ok(texture)
    }

    /// Same storage and sampler state, no content
    pub fn copy_empty(&self) -> Result<Arc<Texture>> {
        self.owner.check();
        let levels = Levels::Count(self.desc.levels);
        let extent = [self.desc.width, self.desc.height, self.desc.depth];
        let copy = Self::new_empty(self.desc.texture_type, self.desc.format, extent, levels)?;
        copy.set_sampler(self.sampler())?;
        Ok(copy)
    }

    /// Same storage and sampler state, with every level's content copied
    pub fn copy(&self) -> Result<Arc<Texture>> {
        let copy = self.copy_empty()?;
        for level in 0..self.desc.levels {
            self.backend.copy_level_to(copy.backend.as_ref(), level)?;
        }
        engine_trace!("nebula::Texture", "Copied {} levels of {:?} texture", self.desc.levels, self.desc.texture_type);
        Ok(copy)
    }

    // ===== ACCESSORS =====

    pub fn owner(&self) -> &ResourceOwner {
        &self.owner
    }

    pub fn desc(&self) -> &TextureDesc {
        self.owner.check();
        &self.desc
    }

    pub fn texture_type(&self) -> TextureType {
        self.owner.check();
        self.desc.texture_type
    }

    pub fn format(&self) -> PixelFormat {
        self.owner.check();
        self.desc.format
    }

    pub fn levels(&self) -> u32 {
        self.owner.check();
        self.desc.levels
    }

    /// Backend texture object
    pub fn backend(&self) -> &Arc<dyn BackendTexture> {
        self.owner.check();
        &self.backend
    }

    // ===== CONTENT =====

    /// Upload `image` into the region `(offset, size)` of `level`
    ///
    /// The image must hold exactly the region's texels. Integer images can
    /// only be uploaded to integer formats and vice versa.
    pub fn upload(&self, level: u32, offset: [u32; 3], size: [u32; 3], image: &ImageData) -> Result<()> {
        self.owner.check();
        self.check_level(level)?;

        let extent = self.desc.level_extent(level);
        let inside = (0..3).all(|axis| {
            offset[axis].checked_add(size[axis]).is_some_and(|end| end <= extent[axis])
        });
        if !inside {
            engine_fail!("nebula::Texture", Error::InvalidArgument(format!(
                "region {:?}+{:?} is outside level {} ({:?})", offset, size, level, extent
            )));
        }

        let region = TextureRegion { offset, size };
        if region.texel_count() != image.texel_count() || image.width != size[0] {
            engine_fail!("nebula::Texture", Error::InvalidArgument(format!(
                "image of {}x{}x{} does not match region {:?}", image.width, image.height, image.depth, size
            )));
        }
        if image.integer != self.desc.format.is_integer() {
            engine_fail!("nebula::Texture", Error::UnsupportedFormat(format!(
                "{} image cannot be uploaded to {:?}",
                if image.integer { "integer" } else { "normalized" },
                self.desc.format
            )));
        }

        self.backend.upload(level, &region, &image.transfer(), &image.data)
    }

    /// Upload a whole level
    pub fn upload_level(&self, level: u32, image: &ImageData) -> Result<()> {
        self.check_level(level)?;
        let extent = self.desc.level_extent(level);
        self.upload(level, [0, 0, 0], extent, image)
    }

    /// Read back a whole level in the texture's pixel layout
    pub fn read_level(&self, level: u32) -> Result<Vec<u8>> {
        self.owner.check();
        self.check_level(level)?;
        self.backend.read_level(level)
    }

    /// Regenerate levels 1.. from level 0. No-op for single-level textures.
    pub fn generate_mipmaps(&self) -> Result<()> {
        self.owner.check();
        if self.desc.levels <= 1 {
            return Ok(());
        }
        self.backend.generate_mipmaps()
    }

    fn check_level(&self, level: u32) -> Result<()> {
        if level >= self.desc.levels {
            engine_fail!("nebula::Texture", Error::InvalidArgument(format!(
                "level {} out of range (texture has {})", level, self.desc.levels
            )));
        }
        Ok(())
    }

    // ===== SAMPLER STATE =====

    pub fn sampler(&self) -> SamplerState {
        self.owner.check();
        *self.sampler.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the whole sampler state
    pub fn set_sampler(&self, sampler: SamplerState) -> Result<()> {
        self.update_sampler(|s| *s = sampler)
    }

    /// Same wrap mode on every axis
    pub fn set_wrap(&self, wrap: Wrap) -> Result<()> {
        self.update_sampler(|s| s.wrap = [wrap; 3])
    }

    /// Wrap mode per axis (s, t, r)
    pub fn set_wrap_axes(&self, wrap: [Wrap; 3]) -> Result<()> {
        self.update_sampler(|s| s.wrap = wrap)
    }

    pub fn set_filter(&self, min: Filter, mag: Filter) -> Result<()> {
        self.update_sampler(|s| {
            s.min_filter = min;
            s.mag_filter = mag;
        })
    }

    pub fn set_border_color(&self, color: [f32; 4]) -> Result<()> {
        self.update_sampler(|s| s.border_color = color)
    }

    pub fn set_swizzle(&self, swizzle: [Swizzle; 4]) -> Result<()> {
        self.update_sampler(|s| s.swizzle = swizzle)
    }

    /// Depth comparison for shadow samplers; `None` samples raw depth
    pub fn set_compare_func(&self, compare: Option<CompareFunc>) -> Result<()> {
        self.update_sampler(|s| s.compare = compare)
    }

    fn update_sampler(&self, update: impl FnOnce(&mut SamplerState)) -> Result<()> {
        self.owner.check();
        let mut sampler = self.sampler.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = *sampler;
        update(&mut next);
        self.backend.apply_sampler(&next)?;
        *sampler = next;
        Ok(())
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        if !self.owner.release() {
            engine_error!(
                "nebula::Texture",
                "Texture dropped without a compatible current context; GPU storage is leaked"
            );
            std::mem::forget(Arc::clone(&self.backend));
        }
    }
}

impl std::fmt::Debug for Texture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Texture")
            .field("owner", &self.owner)
            .field("desc", &self.desc)
            .finish()
    }
}

// ===== VALIDATION =====

/// Check the extent against the topology and resolve the level count
pub fn validated_desc(texture_type: TextureType, format: PixelFormat, extent: [u32; 3], levels: Levels) -> Result<TextureDesc> {
    let [width, height, depth] = extent;
    if width == 0 || height == 0 || depth == 0 {
        engine_fail!("nebula::Texture", Error::InvalidArgument(format!(
            "{:?} texture has a zero dimension ({}x{}x{})", texture_type, width, height, depth
        )));
    }

    let shape_error = match texture_type {
        TextureType::Texture1D if height != 1 || depth != 1 => Some("1D textures have height and depth 1"),
        TextureType::Texture1DArray if depth != 1 => Some("1D arrays store layers in height; depth must be 1"),
        TextureType::Texture2D | TextureType::Rect if depth != 1 => Some("2D textures have depth 1"),
        TextureType::Cube if width != height || depth != 6 => Some("cubemaps are square with exactly 6 faces"),
        TextureType::CubeArray if width != height || depth % 6 != 0 => {
            Some("cube arrays are square with a multiple of 6 faces")
        }
        _ => None,
    };
    if let Some(message) = shape_error {
        engine_fail!("nebula::Texture", Error::InvalidArgument(format!(
            "{} (got {}x{}x{})", message, width, height, depth
        )));
    }

    let mut desc = TextureDesc {
        texture_type,
        format,
        width,
        height,
        depth,
        levels: 1,
        samples: 0,
    };
    let full_chain = if texture_type.supports_mipmaps() { max_levels(desc.max_mip_dimension()) } else { 1 };
    desc.levels = match levels {
        Levels::Auto => full_chain,
        Levels::Count(0) => {
            engine_fail!("nebula::Texture", Error::InvalidArgument("level count must be at least 1".to_string()));
        }
        Levels::Count(count) => count.min(full_chain),
    };
    Ok(desc)
}

#[cfg(test)]
#[path = "texture_tests.rs"]
mod tests;
