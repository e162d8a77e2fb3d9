/// Shader and program traits, shader interface types

use std::any::Any;
use std::sync::Arc;
use crate::error::Result;
use crate::renderer::{ComponentType, TextureType};

// ===== SHADER STAGE =====

/// Programmable pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShaderStage {
    Vertex,
    TessControl,
    TessEvaluation,
    Geometry,
    Fragment,
    Compute,
}

impl ShaderStage {
    pub const COUNT: usize = 6;

    pub const ALL: [ShaderStage; Self::COUNT] = [
        ShaderStage::Vertex,
        ShaderStage::TessControl,
        ShaderStage::TessEvaluation,
        ShaderStage::Geometry,
        ShaderStage::Fragment,
        ShaderStage::Compute,
    ];

    pub fn ordinal(self) -> usize {
        self as usize
    }
}

// ===== UNIFORM TYPE =====

/// Declared type of a uniform or vertex input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformType {
    Float,
    Vec2,
    Vec3,
    Vec4,
    Int,
    IVec2,
    IVec3,
    IVec4,
    UInt,
    UVec2,
    UVec3,
    UVec4,
    Bool,
    Mat2,
    Mat3,
    Mat4,

    // Samplers
    Sampler1D,
    Sampler2D,
    Sampler3D,
    SamplerCube,
    Sampler1DArray,
    Sampler2DArray,
    SamplerCubeArray,
    Sampler2DRect,
    Sampler2DShadow,
    SamplerCubeShadow,
    Sampler2DArrayShadow,
    ISampler2D,
    ISampler3D,
    ISampler2DArray,
    USampler2D,
    USampler3D,
    USampler2DArray,

    // Images
    Image1D,
    Image2D,
    Image3D,
    ImageCube,
    Image2DArray,
    IImage2D,
    UImage2D,
}

impl UniformType {
    pub const COUNT: usize = 40;

    pub const ALL: [UniformType; Self::COUNT] = [
        UniformType::Float,
        UniformType::Vec2,
        UniformType::Vec3,
        UniformType::Vec4,
        UniformType::Int,
        UniformType::IVec2,
        UniformType::IVec3,
        UniformType::IVec4,
        UniformType::UInt,
        UniformType::UVec2,
        UniformType::UVec3,
        UniformType::UVec4,
        UniformType::Bool,
        UniformType::Mat2,
        UniformType::Mat3,
        UniformType::Mat4,
        UniformType::Sampler1D,
        UniformType::Sampler2D,
        UniformType::Sampler3D,
        UniformType::SamplerCube,
        UniformType::Sampler1DArray,
        UniformType::Sampler2DArray,
        UniformType::SamplerCubeArray,
        UniformType::Sampler2DRect,
        UniformType::Sampler2DShadow,
        UniformType::SamplerCubeShadow,
        UniformType::Sampler2DArrayShadow,
        UniformType::ISampler2D,
        UniformType::ISampler3D,
        UniformType::ISampler2DArray,
        UniformType::USampler2D,
        UniformType::USampler3D,
        UniformType::USampler2DArray,
        UniformType::Image1D,
        UniformType::Image2D,
        UniformType::Image3D,
        UniformType::ImageCube,
        UniformType::Image2DArray,
        UniformType::IImage2D,
        UniformType::UImage2D,
    ];

    pub fn ordinal(self) -> usize {
        self as usize
    }

    /// Number of scalar components (matrices count every element)
    pub fn components(self) -> u8 {
        use UniformType::*;
        match self {
            Vec2 | IVec2 | UVec2 => 2,
            Vec3 | IVec3 | UVec3 => 3,
            Vec4 | IVec4 | UVec4 | Mat2 => 4,
            Mat3 => 9,
            Mat4 => 16,
            _ => 1,
        }
    }

    /// Scalar type of each component
    pub fn component_type(self) -> ComponentType {
        use UniformType::*;
        match self {
            Float | Vec2 | Vec3 | Vec4 | Mat2 | Mat3 | Mat4 => ComponentType::Float,
            UInt | UVec2 | UVec3 | UVec4 => ComponentType::UInt,
            _ => ComponentType::Int,
        }
    }

    pub fn is_sampler(self) -> bool {
        let ordinal = self.ordinal();
        ordinal >= UniformType::Sampler1D.ordinal() && ordinal <= UniformType::USampler2DArray.ordinal()
    }

    pub fn is_image(self) -> bool {
        self.ordinal() >= UniformType::Image1D.ordinal()
    }

    /// Texture topology expected by a sampler or image uniform
    pub fn texture_type(self) -> Option<TextureType> {
        use UniformType::*;
        match self {
            Sampler1D | Image1D => Some(TextureType::Texture1D),
            Sampler2D | Sampler2DShadow | ISampler2D | USampler2D | Image2D | IImage2D | UImage2D => {
                Some(TextureType::Texture2D)
            }
            Sampler3D | ISampler3D | USampler3D | Image3D => Some(TextureType::Texture3D),
            SamplerCube | SamplerCubeShadow | ImageCube => Some(TextureType::Cube),
            Sampler1DArray => Some(TextureType::Texture1DArray),
            Sampler2DArray | Sampler2DArrayShadow | ISampler2DArray | USampler2DArray | Image2DArray => {
                Some(TextureType::Texture2DArray)
            }
            SamplerCubeArray => Some(TextureType::CubeArray),
            Sampler2DRect => Some(TextureType::Rect),
            _ => None,
        }
    }

    /// Samplers and images that read integer texels
    pub fn reads_integer_texels(self) -> bool {
        use UniformType::*;
        matches!(
            self,
            ISampler2D | ISampler3D | ISampler2DArray | USampler2D | USampler3D | USampler2DArray | IImage2D | UImage2D
        )
    }
}

/// Access of an image unit binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageAccess {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

impl ImageAccess {
    pub const COUNT: usize = 3;

    pub const ALL: [ImageAccess; Self::COUNT] = [ImageAccess::ReadOnly, ImageAccess::WriteOnly, ImageAccess::ReadWrite];

    pub fn ordinal(self) -> usize {
        self as usize
    }
}

// ===== INTERFACE QUERY RESULTS =====

/// An active uniform of the default uniform block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveUniform {
    pub name: String,
    /// Index in the program's uniform interface
    pub index: u32,
    pub location: i32,
    pub uniform_type: UniformType,
    pub array_size: u32,
}

/// A member variable of a storage block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveBlockMember {
    pub name: String,
    pub offset: u64,
}

/// An active shader storage block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveStorageBlock {
    pub name: String,
    pub index: u32,
    /// Binding point declared in the shader (0 if none)
    pub binding: u32,
    /// Minimum buffer size covering all fixed-size members
    pub data_size: u64,
    pub members: Vec<ActiveBlockMember>,
}

/// An active vertex stage input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveAttribute {
    pub name: String,
    pub index: u32,
    pub location: i32,
    pub attribute_type: UniformType,
}

// ===== TRAITS =====

/// Compiled shader stage
pub trait Shader: Send + Sync {
    fn stage(&self) -> ShaderStage;

    fn as_any(&self) -> &dyn Any;
}

/// Program object under construction or linked
///
/// The mutating methods are only called while the program is being built;
/// once linked the program is shared immutably.
pub trait Program: Send + Sync {
    /// Attach a compiled stage
    fn attach(&mut self, shader: Arc<dyn Shader>) -> Result<()>;

    /// Request a vertex input location before linking
    fn bind_attribute_location(&mut self, name: &str, location: u32) -> Result<()>;

    /// Link attached stages. Failure carries the link log.
    fn link(&mut self) -> Result<()>;

    fn active_uniforms(&self) -> Vec<ActiveUniform>;

    fn active_storage_blocks(&self) -> Vec<ActiveStorageBlock>;

    fn active_attributes(&self) -> Vec<ActiveAttribute>;

    /// Local workgroup size of a linked compute program
    fn local_workgroup_size(&self) -> Option<[u32; 3]>;

    fn as_any(&self) -> &dyn Any;
}
