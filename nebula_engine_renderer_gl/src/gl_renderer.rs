/// GlRenderer - OpenGL implementation of the Renderer trait

use std::ffi::{c_void, CStr};
use std::os::raw::c_char;
use std::sync::{Arc, Mutex, PoisonError};
use gl::types::GLenum;
use nebula_engine::nebula::{Error, Result};
use nebula_engine::nebula::render::{
    Buffer, CommandList, FrameBuffer, Program, RenderBuffer, RenderBufferDesc, Renderer,
    RendererStats, Shader, ShaderStage, Texture, TextureDesc, VertexArray,
};
use nebula_engine::{engine_error, engine_fail, engine_info, engine_warn};

use crate::gl_buffer::GlBuffer;
use crate::gl_command_list::GlCommandList;
use crate::gl_debug;
use crate::gl_frame_buffer::GlFrameBuffer;
use crate::gl_program::{GlProgram, GlShader};
use crate::gl_texture::{GlRenderBuffer, GlTexture};
use crate::gl_vertex_array::GlVertexArray;

/// Configuration of the GL backend
#[derive(Debug, Clone, Copy, Default)]
pub struct GlConfig {
    /// Forward driver debug messages to the engine logger.
    /// Requires the `gl-debug-output` feature.
    pub debug_output: bool,
}

/// Native context switch supplied by the windowing layer
type ContextCallback = Box<dyn Fn() -> bool + Send + Sync>;

/// OpenGL 4.5 renderer bound to one native context
pub struct GlRenderer {
    make_current: ContextCallback,
    done_current: ContextCallback,
    default_frame_buffer: Arc<GlFrameBuffer>,
    stats: Mutex<RendererStats>,
    version: String,
}

impl GlRenderer {
    /// Create a renderer for the native context current on the calling thread
    ///
    /// # Arguments
    ///
    /// * `loader` - Resolves GL entry points by name
    /// * `make_current` - Makes the native context current on the calling thread
    /// * `done_current` - Releases the native context from the calling thread
    /// * `config` - Backend configuration
    pub fn new<F>(
        loader: F,
        make_current: impl Fn() -> bool + Send + Sync + 'static,
        done_current: impl Fn() -> bool + Send + Sync + 'static,
        config: GlConfig,
    ) -> Result<Self>
    where
        F: FnMut(&'static str) -> *const c_void,
    {
        gl::load_with(loader);

        // Direct state access and compute are both required
        if !gl::CreateBuffers::is_loaded() || !gl::DispatchCompute::is_loaded() {
            engine_fail!(
                "nebula::GlRenderer",
                Error::InitializationFailed("OpenGL 4.5 entry points are not available".to_string())
            );
        }

        let version = gl_string(gl::VERSION);
        let device = gl_string(gl::RENDERER);
        engine_info!("nebula::GlRenderer", "OpenGL {} on {}", version, device);

        if config.debug_output {
            if gl_debug::install() {
                engine_info!("nebula::GlRenderer", "Driver debug output enabled");
            } else {
                engine_warn!("nebula::GlRenderer", "Driver debug output requested but unavailable");
            }
        }

        Ok(Self {
            make_current: Box::new(make_current),
            done_current: Box::new(done_current),
            default_frame_buffer: Arc::new(GlFrameBuffer::new_default()),
            stats: Mutex::new(RendererStats::default()),
            version,
        })
    }

    /// Driver version string
    pub fn version(&self) -> &str {
        &self.version
    }
}

/// Read a driver string, empty if the query fails
fn gl_string(name: GLenum) -> String {
    unsafe {
        let ptr = gl::GetString(name);
        if ptr.is_null() {
            return String::new();
        }
        CStr::from_ptr(ptr as *const c_char).to_string_lossy().into_owned()
    }
}

/// Drain the GL error queue, reporting the first error as a backend error
pub(crate) fn check_gl_error(source: &str, operation: &str) -> Result<()> {
    let code = unsafe { gl::GetError() };
    if code == gl::NO_ERROR {
        return Ok(());
    }
    while unsafe { gl::GetError() } != gl::NO_ERROR {}

    if code == gl::OUT_OF_MEMORY {
        engine_error!(source, "{} ran out of GPU memory", operation);
        return Err(Error::OutOfMemory);
    }
    engine_fail!(source, Error::BackendError(format!("{} failed with GL error 0x{:04X}", operation, code)));
}

impl Renderer for GlRenderer {
    fn name(&self) -> &str {
        "gl"
    }

    fn make_current(&self) -> bool {
        (self.make_current)()
    }

    fn done_current(&self) -> bool {
        (self.done_current)()
    }

    fn create_buffer(&self, size: u64, data: Option<&[u8]>) -> Result<Arc<dyn Buffer>> {
        Ok(Arc::new(GlBuffer::new(size, data)?))
    }

    fn create_texture(&self, desc: &TextureDesc) -> Result<Arc<dyn Texture>> {
        Ok(Arc::new(GlTexture::new(desc)?))
    }

    fn create_render_buffer(&self, desc: &RenderBufferDesc) -> Result<Arc<dyn RenderBuffer>> {
        Ok(Arc::new(GlRenderBuffer::new(desc)?))
    }

    fn create_vertex_array(&self) -> Result<Arc<dyn VertexArray>> {
        Ok(Arc::new(GlVertexArray::new()?))
    }

    fn create_frame_buffer(&self) -> Result<Arc<dyn FrameBuffer>> {
        Ok(Arc::new(GlFrameBuffer::new()?))
    }

    fn default_frame_buffer(&self) -> Arc<dyn FrameBuffer> {
        self.default_frame_buffer.clone()
    }

    fn compile_shader(&self, stage: ShaderStage, source: &str) -> Result<Arc<dyn Shader>> {
        Ok(Arc::new(GlShader::compile(stage, source)?))
    }

    fn create_program(&self) -> Result<Box<dyn Program>> {
        Ok(Box::new(GlProgram::new()?))
    }

    fn create_command_list(&self) -> Result<Box<dyn CommandList>> {
        Ok(Box::new(GlCommandList::new()))
    }

    fn submit(&self, commands: Box<dyn CommandList>) -> Result<()> {
        let recorded = match commands.as_any().downcast_ref::<GlCommandList>() {
            Some(commands) => commands.stats(),
            None => engine_fail!(
                "nebula::GlRenderer",
                Error::InvalidResource("command list was not created by a GL renderer".to_string())
            ),
        };

        let mut stats = self.stats.lock().unwrap_or_else(PoisonError::into_inner);
        stats.draw_calls += recorded.draw_calls;
        stats.vertices += recorded.vertices;
        stats.dispatches += recorded.dispatches;
        stats.submissions += 1;
        Ok(())
    }

    fn stats(&self) -> RendererStats {
        *self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
