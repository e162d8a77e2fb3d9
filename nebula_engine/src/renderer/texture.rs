/// Texture trait, texture descriptor, sampler state

use std::any::Any;
use crate::error::Result;
use crate::renderer::{ComponentType, CompareFunc, PixelFormat};

// ===== TEXTURE TYPE =====

/// Texture topology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureType {
    Texture1D,
    Texture2D,
    Texture3D,
    Cube,
    Texture1DArray,
    Texture2DArray,
    CubeArray,
    Rect,
}

impl TextureType {
    pub const COUNT: usize = 8;

    pub const ALL: [TextureType; Self::COUNT] = [
        TextureType::Texture1D,
        TextureType::Texture2D,
        TextureType::Texture3D,
        TextureType::Cube,
        TextureType::Texture1DArray,
        TextureType::Texture2DArray,
        TextureType::CubeArray,
        TextureType::Rect,
    ];

    pub fn ordinal(self) -> usize {
        self as usize
    }

    /// Array topologies store layers along their last axis
    pub fn is_array(self) -> bool {
        matches!(self, TextureType::Texture1DArray | TextureType::Texture2DArray | TextureType::CubeArray)
    }

    /// Cube topologies store 6 faces per layer
    pub fn is_cube(self) -> bool {
        matches!(self, TextureType::Cube | TextureType::CubeArray)
    }

    /// Rectangle textures have a single level and no mipmaps
    pub fn supports_mipmaps(self) -> bool {
        self != TextureType::Rect
    }
}

// ===== SAMPLER STATE =====

/// Texture coordinate wrapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Wrap {
    Repeat,
    MirroredRepeat,
    ClampToEdge,
    ClampToBorder,
    MirrorClampToEdge,
}

impl Wrap {
    pub const COUNT: usize = 5;

    pub const ALL: [Wrap; Self::COUNT] = [
        Wrap::Repeat,
        Wrap::MirroredRepeat,
        Wrap::ClampToEdge,
        Wrap::ClampToBorder,
        Wrap::MirrorClampToEdge,
    ];

    pub fn ordinal(self) -> usize {
        self as usize
    }
}

/// Texture filtering
///
/// `Trilinear` filters linearly between mip levels; `Bilinear` picks the
/// nearest level and filters linearly inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Filter {
    Nearest,
    Linear,
    Bilinear,
    Trilinear,
}

impl Filter {
    pub const COUNT: usize = 4;

    pub const ALL: [Filter; Self::COUNT] = [
        Filter::Nearest,
        Filter::Linear,
        Filter::Bilinear,
        Filter::Trilinear,
    ];

    pub fn ordinal(self) -> usize {
        self as usize
    }

    /// Whether this filter reads more than one mip level
    pub fn uses_mipmaps(self) -> bool {
        matches!(self, Filter::Bilinear | Filter::Trilinear)
    }
}

/// Channel source for texture swizzling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Swizzle {
    Red,
    Green,
    Blue,
    Alpha,
    Zero,
    One,
}

impl Swizzle {
    pub const COUNT: usize = 6;

    pub const ALL: [Swizzle; Self::COUNT] = [
        Swizzle::Red,
        Swizzle::Green,
        Swizzle::Blue,
        Swizzle::Alpha,
        Swizzle::Zero,
        Swizzle::One,
    ];

    pub fn ordinal(self) -> usize {
        self as usize
    }

    /// Identity swizzle (r, g, b, a)
    pub const IDENTITY: [Swizzle; 4] = [Swizzle::Red, Swizzle::Green, Swizzle::Blue, Swizzle::Alpha];
}

/// Per-texture sampling parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplerState {
    /// Wrap mode per axis (s, t, r)
    pub wrap: [Wrap; 3],
    /// Minification filter
    pub min_filter: Filter,
    /// Magnification filter (only Nearest or Linear are meaningful)
    pub mag_filter: Filter,
    pub border_color: [f32; 4],
    pub swizzle: [Swizzle; 4],
    /// Depth comparison for shadow samplers
    pub compare: Option<CompareFunc>,
}

impl SamplerState {
    /// Initial sampler state for a texture with `levels` mip levels
    pub fn for_levels(levels: u32) -> Self {
        Self {
            wrap: [Wrap::Repeat; 3],
            min_filter: if levels > 1 { Filter::Trilinear } else { Filter::Linear },
            mag_filter: Filter::Linear,
            border_color: [0.0, 0.0, 0.0, 0.0],
            swizzle: Swizzle::IDENTITY,
            compare: None,
        }
    }
}

// ===== TEXTURE DESC =====

/// Immutable storage description of a texture
///
/// `depth` holds the depth of 3D textures, the layer count of 1D/2D arrays,
/// the face count (6) of cubemaps and `6 × cubes` for cube arrays. `height`
/// holds the layer count of 1D arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureDesc {
    pub texture_type: TextureType,
    pub format: PixelFormat,
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub levels: u32,
    pub samples: u32,
}

impl TextureDesc {
    /// Largest extent along the axes that shrink with each mip level
    pub fn max_mip_dimension(&self) -> u32 {
        match self.texture_type {
            TextureType::Texture1D | TextureType::Texture1DArray => self.width,
            TextureType::Texture3D => self.width.max(self.height).max(self.depth),
            _ => self.width.max(self.height),
        }
    }

    /// Extent of a mip level as (width, height, depth)
    pub fn level_extent(&self, level: u32) -> [u32; 3] {
        let shrink = |v: u32| (v >> level).max(1);
        match self.texture_type {
            TextureType::Texture1D => [shrink(self.width), 1, 1],
            TextureType::Texture1DArray => [shrink(self.width), self.height, 1],
            TextureType::Texture3D => [shrink(self.width), shrink(self.height), shrink(self.depth)],
            TextureType::Texture2D | TextureType::Rect => [shrink(self.width), shrink(self.height), 1],
            TextureType::Cube | TextureType::Texture2DArray | TextureType::CubeArray => {
                [shrink(self.width), shrink(self.height), self.depth]
            }
        }
    }
}

/// Maximum level count for a texture whose largest mip axis is `max_dimension`
pub fn max_levels(max_dimension: u32) -> u32 {
    if max_dimension == 0 {
        return 0;
    }
    32 - max_dimension.leading_zeros()
}

/// A region of one mip level; z is the layer or face for array and cube topologies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureRegion {
    pub offset: [u32; 3],
    pub size: [u32; 3],
}

impl TextureRegion {
    pub fn texel_count(&self) -> u64 {
        self.size.iter().map(|&s| s as u64).product()
    }
}

/// Layout of CPU-side pixel data handed to an upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelTransfer {
    pub components: u8,
    pub component_type: ComponentType,
    /// Integer data is written to integer formats without normalization
    pub integer: bool,
}

impl PixelTransfer {
    pub fn bytes_per_pixel(&self) -> u32 {
        self.components as u32 * self.component_type.size_bytes()
    }
}

// ===== TEXTURE TRAIT =====

/// Texture resource trait
///
/// Implemented by backend-specific texture types. Storage is allocated once
/// at creation; the texture is destroyed when dropped.
pub trait Texture: Send + Sync {
    /// Storage description
    fn desc(&self) -> &TextureDesc;

    /// Upload pixels into a region of a mip level
    fn upload(&self, level: u32, region: &TextureRegion, transfer: &PixelTransfer, data: &[u8]) -> Result<()>;

    /// Read back a whole mip level in the texture's own pixel layout
    fn read_level(&self, level: u32) -> Result<Vec<u8>>;

    /// Copy a whole mip level into the same level of `dst`
    fn copy_level_to(&self, dst: &dyn Texture, level: u32) -> Result<()>;

    /// Regenerate levels 1.. from level 0
    fn generate_mipmaps(&self) -> Result<()>;

    /// Apply sampler state
    fn apply_sampler(&self, sampler: &SamplerState) -> Result<()>;

    fn as_any(&self) -> &dyn Any;
}
