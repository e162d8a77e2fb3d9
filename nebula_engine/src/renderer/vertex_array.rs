/// Vertex array trait, primitive and index types

use std::any::Any;
use crate::error::Result;
use crate::renderer::{Buffer, ComponentType};

/// Primitive topology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Points,
    Lines,
    LineStrip,
    LineLoop,
    Triangles,
    TriangleStrip,
    TriangleFan,
    LinesAdjacency,
    TrianglesAdjacency,
    Patches,
}

impl PrimitiveType {
    pub const COUNT: usize = 10;

    pub const ALL: [PrimitiveType; Self::COUNT] = [
        PrimitiveType::Points,
        PrimitiveType::Lines,
        PrimitiveType::LineStrip,
        PrimitiveType::LineLoop,
        PrimitiveType::Triangles,
        PrimitiveType::TriangleStrip,
        PrimitiveType::TriangleFan,
        PrimitiveType::LinesAdjacency,
        PrimitiveType::TrianglesAdjacency,
        PrimitiveType::Patches,
    ];

    pub fn ordinal(self) -> usize {
        self as usize
    }
}

/// Index buffer element type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexType {
    /// 8-bit indices
    U8,
    /// 16-bit indices (max 65535 vertices)
    U16,
    /// 32-bit indices
    U32,
}

impl IndexType {
    pub const COUNT: usize = 3;

    pub const ALL: [IndexType; Self::COUNT] = [IndexType::U8, IndexType::U16, IndexType::U32];

    pub fn ordinal(self) -> usize {
        self as usize
    }

    /// Size in bytes of one index element
    pub fn size_bytes(self) -> u32 {
        match self {
            IndexType::U8 => 1,
            IndexType::U16 => 2,
            IndexType::U32 => 4,
        }
    }
}

/// Format of one vertex attribute as seen by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttributeFormat {
    /// Binding slot the attribute reads from
    pub binding: u32,
    pub components: u8,
    pub component_type: ComponentType,
    /// Integer data is converted to [0, 1] / [-1, 1] floats
    pub normalized: bool,
    /// Integer data is passed to integer shader inputs unconverted
    pub integer: bool,
    /// Byte offset inside one vertex of the binding
    pub relative_offset: u32,
}

/// Vertex array resource trait
///
/// Implemented by backend-specific vertex array types. All setters are
/// plain state updates on the backend object.
pub trait VertexArray: Send + Sync {
    /// Bind or clear a vertex buffer binding slot
    fn set_vertex_buffer(&self, binding: u32, buffer: Option<(&dyn Buffer, u64, u32)>) -> Result<()>;

    /// Enable an attribute location with the given format, or disable it
    fn set_attribute(&self, location: u32, format: Option<&VertexAttributeFormat>) -> Result<()>;

    /// Bind or clear the index buffer
    fn set_index_buffer(&self, buffer: Option<&dyn Buffer>) -> Result<()>;

    fn as_any(&self) -> &dyn Any;
}
