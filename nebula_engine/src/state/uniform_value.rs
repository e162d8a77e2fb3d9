/// Typed values held by state layers

use std::sync::Arc;
use glam::{IVec2, IVec3, IVec4, Mat2, Mat3, Mat4, UVec2, UVec3, UVec4, Vec2, Vec3, Vec4};
use crate::renderer::{ImageAccess, PixelFormat, UniformData, UniformType};
use crate::resource::{Buffer, Texture};

// ===== UNIFORM VALUE =====

/// Value supplied for a uniform
#[derive(Clone)]
pub enum UniformValue {
    /// Plain data written to the uniform location
    Data(UniformData),
    /// Texture bound to a sampler uniform
    Texture(Arc<Texture>),
    /// Texture level bound to an image uniform
    Image {
        texture: Arc<Texture>,
        level: u32,
        /// `None` binds every layer
        layer: Option<u32>,
        access: ImageAccess,
        format: PixelFormat,
    },
}

impl UniformValue {
    /// Image binding of level 0, all layers, in the texture's own format
    pub fn image(texture: Arc<Texture>, access: ImageAccess) -> Self {
        let format = texture.format();
        UniformValue::Image { texture, level: 0, layer: None, access, format }
    }

    /// Whether this value can be assigned to a uniform declared as `declared`
    ///
    /// Samplers and images also require the texture topology and the
    /// integer/float texel family to agree with the declaration.
    pub fn matches(&self, declared: UniformType) -> bool {
        match self {
            UniformValue::Data(data) => data.uniform_type() == declared,
            UniformValue::Texture(texture) => {
                declared.is_sampler()
                    && declared.texture_type() == Some(texture.texture_type())
                    && declared.reads_integer_texels() == texture.format().is_integer()
            }
            UniformValue::Image { texture, format, .. } => {
                declared.is_image()
                    && declared.texture_type() == Some(texture.texture_type())
                    && declared.reads_integer_texels() == format.is_integer()
            }
        }
    }

    /// Short description used in mismatch reports
    pub fn describe(&self) -> String {
        match self {
            UniformValue::Data(data) => format!("{:?}", data.uniform_type()),
            UniformValue::Texture(texture) => {
                format!("{:?} texture ({:?})", texture.texture_type(), texture.format())
            }
            UniformValue::Image { texture, format, .. } => {
                format!("{:?} image ({:?})", texture.texture_type(), format)
            }
        }
    }
}

impl std::fmt::Debug for UniformValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UniformValue::Data(data) => f.debug_tuple("Data").field(data).finish(),
            _ => f.write_str(&self.describe()),
        }
    }
}

impl PartialEq for UniformValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (UniformValue::Data(a), UniformValue::Data(b)) => a == b,
            (UniformValue::Texture(a), UniformValue::Texture(b)) => Arc::ptr_eq(a, b),
            (
                UniformValue::Image { texture: a, level: la, layer: ya, access: xa, format: fa },
                UniformValue::Image { texture: b, level: lb, layer: yb, access: xb, format: fb },
            ) => Arc::ptr_eq(a, b) && la == lb && ya == yb && xa == xb && fa == fb,
            _ => false,
        }
    }
}

// ===== CONVERSIONS =====

macro_rules! impl_from_data {
    ($($source:ty => |$v:ident| $data:expr;)*) => {
        $(
            impl From<$source> for UniformValue {
                fn from($v: $source) -> Self {
                    UniformValue::Data($data)
                }
            }
        )*
    };
}

impl_from_data! {
    UniformData => |v| v;
    f32 => |v| UniformData::Float(v);
    i32 => |v| UniformData::Int(v);
    u32 => |v| UniformData::UInt(v);
    bool => |v| UniformData::Bool(v);
    Vec2 => |v| UniformData::Vec2(v.to_array());
    Vec3 => |v| UniformData::Vec3(v.to_array());
    Vec4 => |v| UniformData::Vec4(v.to_array());
    IVec2 => |v| UniformData::IVec2(v.to_array());
    IVec3 => |v| UniformData::IVec3(v.to_array());
    IVec4 => |v| UniformData::IVec4(v.to_array());
    UVec2 => |v| UniformData::UVec2(v.to_array());
    UVec3 => |v| UniformData::UVec3(v.to_array());
    UVec4 => |v| UniformData::UVec4(v.to_array());
    Mat2 => |v| UniformData::Mat2(v.to_cols_array());
    Mat3 => |v| UniformData::Mat3(v.to_cols_array());
    Mat4 => |v| UniformData::Mat4(v.to_cols_array());
    [f32; 4] => |v| UniformData::Vec4(v);
}

impl From<Arc<Texture>> for UniformValue {
    fn from(texture: Arc<Texture>) -> Self {
        UniformValue::Texture(texture)
    }
}

// ===== STORAGE BINDING =====

/// Buffer range bound to a storage block
#[derive(Clone)]
pub struct StorageBinding {
    pub buffer: Arc<Buffer>,
    pub offset: u64,
    /// `None` binds up to the end of the buffer
    pub size: Option<u64>,
}

impl StorageBinding {
    /// The whole buffer
    pub fn whole(buffer: Arc<Buffer>) -> Self {
        Self { buffer, offset: 0, size: None }
    }

    pub fn range(buffer: Arc<Buffer>, offset: u64, size: u64) -> Self {
        Self { buffer, offset, size: Some(size) }
    }

    /// Byte length of the bound range, or `None` if it leaves the buffer
    pub fn resolved_size(&self) -> Option<u64> {
        let total = self.buffer.size();
        match self.size {
            Some(size) => self.offset.checked_add(size).filter(|end| *end <= total).map(|_| size),
            None => total.checked_sub(self.offset),
        }
    }
}

impl std::fmt::Debug for StorageBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageBinding")
            .field("buffer", &self.buffer)
            .field("offset", &self.offset)
            .field("size", &self.size)
            .finish()
    }
}

impl From<Arc<Buffer>> for StorageBinding {
    fn from(buffer: Arc<Buffer>) -> Self {
        StorageBinding::whole(buffer)
    }
}

#[cfg(test)]
#[path = "uniform_value_tests.rs"]
mod tests;
