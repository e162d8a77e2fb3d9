/// Renderer trait - backend factory and context interface

use std::sync::Arc;
use crate::error::Result;
use crate::renderer::{
    Buffer, CommandList, FrameBuffer, Program, RenderBuffer, RenderBufferDesc, Shader,
    ShaderStage, Texture, TextureDesc, VertexArray,
};

/// Renderer statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RendererStats {
    /// Number of draw calls submitted
    pub draw_calls: u64,
    /// Number of vertices (or indices) submitted by draw calls
    pub vertices: u64,
    /// Number of compute dispatches submitted
    pub dispatches: u64,
    /// Number of command lists submitted
    pub submissions: u64,
}

/// Main renderer trait
///
/// One renderer instance backs one context. It is the factory for every
/// backend object and performs the platform make-current switch. Callers
/// reach it through `Context`, which enforces affinity before any call.
pub trait Renderer: Send + Sync {
    /// Backend name (e.g. "gl", "headless")
    fn name(&self) -> &str;

    /// Make this renderer's context current on the calling thread
    fn make_current(&self) -> bool;

    /// Release this renderer's context from the calling thread
    fn done_current(&self) -> bool;

    /// Create a buffer of `size` bytes, optionally initialized from `data`
    fn create_buffer(&self, size: u64, data: Option<&[u8]>) -> Result<Arc<dyn Buffer>>;

    /// Create a texture with immutable storage
    fn create_texture(&self, desc: &TextureDesc) -> Result<Arc<dyn Texture>>;

    fn create_render_buffer(&self, desc: &RenderBufferDesc) -> Result<Arc<dyn RenderBuffer>>;

    fn create_vertex_array(&self) -> Result<Arc<dyn VertexArray>>;

    fn create_frame_buffer(&self) -> Result<Arc<dyn FrameBuffer>>;

    /// The window surface framebuffer
    fn default_frame_buffer(&self) -> Arc<dyn FrameBuffer>;

    /// Compile one stage. Failure carries the compiler log.
    fn compile_shader(&self, stage: ShaderStage, source: &str) -> Result<Arc<dyn Shader>>;

    /// Create an empty program object
    fn create_program(&self) -> Result<Box<dyn Program>>;

    fn create_command_list(&self) -> Result<Box<dyn CommandList>>;

    /// Execute a command list
    fn submit(&self, commands: Box<dyn CommandList>) -> Result<()>;

    /// Get statistics about the renderer
    fn stats(&self) -> RendererStats;
}
