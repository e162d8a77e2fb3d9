/// CommandList trait - for recording rendering commands

use std::any::Any;
use bitflags::bitflags;
use crate::error::Result;
use crate::renderer::{
    Buffer, ClearColor, ColorWriteMask, DepthState, FaceCulling, FrameBuffer, BlendState,
    ImageAccess, IndexType, PixelFormat, PrimitiveType, Program, StencilState, Texture,
    UniformType, VertexArray,
};

// ===== UNIFORM DATA =====

/// Plain uniform value uploaded to a uniform location
///
/// Matrices are column-major.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformData {
    Float(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Int(i32),
    IVec2([i32; 2]),
    IVec3([i32; 3]),
    IVec4([i32; 4]),
    UInt(u32),
    UVec2([u32; 2]),
    UVec3([u32; 3]),
    UVec4([u32; 4]),
    Bool(bool),
    Mat2([f32; 4]),
    Mat3([f32; 9]),
    Mat4([f32; 16]),
}

impl UniformData {
    /// Declared uniform type this value can be written to
    pub fn uniform_type(&self) -> UniformType {
        match self {
            UniformData::Float(_) => UniformType::Float,
            UniformData::Vec2(_) => UniformType::Vec2,
            UniformData::Vec3(_) => UniformType::Vec3,
            UniformData::Vec4(_) => UniformType::Vec4,
            UniformData::Int(_) => UniformType::Int,
            UniformData::IVec2(_) => UniformType::IVec2,
            UniformData::IVec3(_) => UniformType::IVec3,
            UniformData::IVec4(_) => UniformType::IVec4,
            UniformData::UInt(_) => UniformType::UInt,
            UniformData::UVec2(_) => UniformType::UVec2,
            UniformData::UVec3(_) => UniformType::UVec3,
            UniformData::UVec4(_) => UniformType::UVec4,
            UniformData::Bool(_) => UniformType::Bool,
            UniformData::Mat2(_) => UniformType::Mat2,
            UniformData::Mat3(_) => UniformType::Mat3,
            UniformData::Mat4(_) => UniformType::Mat4,
        }
    }
}

// ===== PASS TYPES =====

/// Viewport rectangle in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { x: 0, y: 0, width, height }
    }
}

bitflags! {
    /// Memory barrier scope
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MemoryBarrier: u32 {
        const VERTEX_ATTRIB = 1 << 0;
        const ELEMENT_ARRAY = 1 << 1;
        const UNIFORM = 1 << 2;
        const TEXTURE_FETCH = 1 << 3;
        const SHADER_IMAGE_ACCESS = 1 << 4;
        const COMMAND = 1 << 5;
        const TEXTURE_UPDATE = 1 << 6;
        const BUFFER_UPDATE = 1 << 7;
        const FRAMEBUFFER = 1 << 8;
        const SHADER_STORAGE = 1 << 9;
        const ALL = 0x3FF;
    }
}

/// Image unit binding parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageBinding {
    pub level: u32,
    /// `None` binds all layers of a layered texture
    pub layer: Option<u32>,
    pub access: ImageAccess,
    pub format: PixelFormat,
}

// ===== COMMAND LIST TRAIT =====

/// Command list for issuing rendering commands
///
/// Commands are recorded (or executed immediately by stateful backends)
/// and later handed to `Renderer::submit()`.
pub trait CommandList: Send {
    // ===== PIPELINE STATE =====

    fn set_face_culling(&mut self, culling: &FaceCulling) -> Result<()>;

    fn set_color_mask(&mut self, attachment: u32, mask: ColorWriteMask) -> Result<()>;

    fn set_depth_state(&mut self, state: &DepthState) -> Result<()>;

    fn set_stencil_state(&mut self, state: &StencilState) -> Result<()>;

    fn set_blend_state(&mut self, state: &BlendState) -> Result<()>;

    // ===== FRAMEBUFFER =====

    fn bind_frame_buffer(&mut self, frame_buffer: &dyn FrameBuffer) -> Result<()>;

    /// Clear one color attachment of the bound framebuffer
    fn clear_color(&mut self, attachment: u32, value: ClearColor) -> Result<()>;

    /// Clear depth, stencil, or both in one operation
    fn clear_depth_stencil(&mut self, depth: Option<f32>, stencil: Option<i32>) -> Result<()>;

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()>;

    // ===== BINDINGS =====

    fn use_program(&mut self, program: &dyn Program) -> Result<()>;

    fn bind_vertex_array(&mut self, vertex_array: &dyn VertexArray) -> Result<()>;

    fn set_uniform(&mut self, location: i32, value: &UniformData) -> Result<()>;

    fn bind_texture(&mut self, unit: u32, texture: &dyn Texture) -> Result<()>;

    fn bind_image(&mut self, unit: u32, texture: &dyn Texture, binding: &ImageBinding) -> Result<()>;

    fn bind_storage_buffer(&mut self, binding: u32, buffer: &dyn Buffer, offset: u64, size: u64) -> Result<()>;

    /// Route a program's storage block to a binding point
    fn set_storage_block_binding(&mut self, program: &dyn Program, block_index: u32, binding: u32) -> Result<()>;

    // ===== DRAW / DISPATCH =====

    fn draw_arrays(&mut self, primitive: PrimitiveType, first: u32, count: u32) -> Result<()>;

    fn draw_elements(
        &mut self,
        primitive: PrimitiveType,
        count: u32,
        index_type: IndexType,
        byte_offset: u64,
        base_vertex: i32,
    ) -> Result<()>;

    fn dispatch(&mut self, groups: [u32; 3]) -> Result<()>;

    fn memory_barrier(&mut self, barrier: MemoryBarrier) -> Result<()>;

    fn as_any(&self) -> &dyn Any;
}
