/// Headless renderer - CPU-side backend that records every command
///
/// Objects get GL-style integer names (0 is the default framebuffer) and
/// keep their contents in client memory. Submitted command lists are appended
/// to a shared log tests can inspect.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use crate::error::{Error, Result};
use crate::renderer::headless::{
    Command, HeadlessBuffer, HeadlessCommandList, HeadlessFrameBuffer, HeadlessProgram,
    HeadlessRenderBuffer, HeadlessShader, HeadlessTexture, HeadlessVertexArray,
};
use crate::renderer::{
    Buffer, CommandList, FrameBuffer, Program, RenderBuffer, RenderBufferDesc, Renderer,
    RendererStats, Shader, ShaderStage, Texture, TextureDesc, VertexArray,
};
use crate::{engine_bail, engine_trace};

// ===== NAME ALLOCATOR =====

/// Integer object names, starting at 1; released names are reused most recent first
#[derive(Debug, Default)]
pub struct NameAllocator {
    next: u32,
    free: Vec<u32>,
    live: usize,
}

impl NameAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self) -> u32 {
        self.live += 1;
        match self.free.pop() {
            Some(name) => name,
            None => {
                self.next += 1;
                self.next
            }
        }
    }

    /// Release a name. Returns false for 0 and for names not currently allocated.
    pub fn release(&mut self, name: u32) -> bool {
        if name == 0 || name > self.next || self.free.contains(&name) {
            return false;
        }
        self.free.push(name);
        self.live -= 1;
        true
    }

    /// Number of names currently allocated
    pub fn live(&self) -> usize {
        self.live
    }
}

// ===== SHARED STATE =====

/// State shared by a headless renderer and every object it created
pub(crate) struct HeadlessState {
    names: Mutex<NameAllocator>,
    log: Mutex<Vec<Command>>,
    stats: Mutex<RendererStats>,
}

impl HeadlessState {
    pub(crate) fn allocate_name(&self) -> u32 {
        self.names.lock().unwrap_or_else(PoisonError::into_inner).allocate()
    }

    pub(crate) fn release_name(&self, name: u32) {
        self.names.lock().unwrap_or_else(PoisonError::into_inner).release(name);
    }

    fn log(&self) -> MutexGuard<'_, Vec<Command>> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ===== HEADLESS RENDERER =====

/// Backend without a GPU
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use nebula_engine::nebula::{Context, ContextConfig};
/// use nebula_engine::nebula::render::headless::HeadlessRenderer;
///
/// let renderer = Arc::new(HeadlessRenderer::new());
/// let context = Context::new(renderer.clone(), ContextConfig::default());
/// let _guard = context.make_current()?;
/// assert!(renderer.commands().is_empty());
/// # Ok::<(), nebula_engine::nebula::Error>(())
/// ```
pub struct HeadlessRenderer {
    state: Arc<HeadlessState>,
    default_frame_buffer: Arc<HeadlessFrameBuffer>,
    fail_make_current: AtomicBool,
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        let state = Arc::new(HeadlessState {
            names: Mutex::new(NameAllocator::new()),
            log: Mutex::new(Vec::new()),
            stats: Mutex::new(RendererStats::default()),
        });
        let default_frame_buffer = Arc::new(HeadlessFrameBuffer::new_default(Arc::clone(&state)));
        Self {
            state,
            default_frame_buffer,
            fail_make_current: AtomicBool::new(false),
        }
    }

    /// Every command submitted so far
    pub fn commands(&self) -> Vec<Command> {
        self.state.log().clone()
    }

    /// Drain the command log
    pub fn take_commands(&self) -> Vec<Command> {
        std::mem::take(&mut *self.state.log())
    }

    pub fn clear_commands(&self) {
        self.state.log().clear();
    }

    /// Number of backend objects alive (default framebuffer excluded)
    pub fn live_objects(&self) -> usize {
        self.state.names.lock().unwrap_or_else(PoisonError::into_inner).live()
    }

    /// Make subsequent `make_current()` calls fail
    pub fn set_fail_make_current(&self, fail: bool) {
        self.fail_make_current.store(fail, Ordering::Release);
    }
}

impl Default for HeadlessRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for HeadlessRenderer {
    fn name(&self) -> &str {
        "headless"
    }

    fn make_current(&self) -> bool {
        !self.fail_make_current.load(Ordering::Acquire)
    }

    fn done_current(&self) -> bool {
        true
    }

    fn create_buffer(&self, size: u64, data: Option<&[u8]>) -> Result<Arc<dyn Buffer>> {
        if let Some(data) = data {
            if data.len() as u64 > size {
                engine_bail!("nebula::HeadlessRenderer", "Initial data ({} bytes) exceeds buffer size ({})", data.len(), size);
            }
        }
        Ok(Arc::new(HeadlessBuffer::new(Arc::clone(&self.state), size, data)))
    }

    fn create_texture(&self, desc: &TextureDesc) -> Result<Arc<dyn Texture>> {
        Ok(Arc::new(HeadlessTexture::new(Arc::clone(&self.state), *desc)))
    }

    fn create_render_buffer(&self, desc: &RenderBufferDesc) -> Result<Arc<dyn RenderBuffer>> {
        Ok(Arc::new(HeadlessRenderBuffer::new(Arc::clone(&self.state), *desc)))
    }

    fn create_vertex_array(&self) -> Result<Arc<dyn VertexArray>> {
        Ok(Arc::new(HeadlessVertexArray::new(Arc::clone(&self.state))))
    }

    fn create_frame_buffer(&self) -> Result<Arc<dyn FrameBuffer>> {
        Ok(Arc::new(HeadlessFrameBuffer::new(Arc::clone(&self.state))))
    }

    fn default_frame_buffer(&self) -> Arc<dyn FrameBuffer> {
        Arc::clone(&self.default_frame_buffer) as Arc<dyn FrameBuffer>
    }

    fn compile_shader(&self, stage: ShaderStage, source: &str) -> Result<Arc<dyn Shader>> {
        let shader = HeadlessShader::compile(Arc::clone(&self.state), stage, source)
            .map_err(|log| Error::ShaderCompilation { stage, log })?;
        Ok(Arc::new(shader))
    }

    fn create_program(&self) -> Result<Box<dyn Program>> {
        Ok(Box::new(HeadlessProgram::new(Arc::clone(&self.state))))
    }

    fn create_command_list(&self) -> Result<Box<dyn CommandList>> {
        Ok(Box::new(HeadlessCommandList::new()))
    }

    fn submit(&self, commands: Box<dyn CommandList>) -> Result<()> {
        let Some(list) = commands.as_any().downcast_ref::<HeadlessCommandList>() else {
            engine_bail!("nebula::HeadlessRenderer", "Submitted command list was not created by a headless renderer");
        };

        let mut stats = self.state.stats.lock().unwrap_or_else(PoisonError::into_inner);
        for command in list.commands() {
            match command {
                Command::DrawArrays { count, .. } | Command::DrawElements { count, .. } => {
                    stats.draw_calls += 1;
                    stats.vertices += *count as u64;
                }
                Command::Dispatch { .. } => stats.dispatches += 1,
                _ => {}
            }
        }
        stats.submissions += 1;
        engine_trace!("nebula::HeadlessRenderer", "Submitted {} commands", list.commands().len());

        self.state.log().extend_from_slice(list.commands());
        Ok(())
    }

    fn stats(&self) -> RendererStats {
        *self.state.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[path = "headless_renderer_tests.rs"]
mod tests;
