/*!
# Nebula Engine - OpenGL Renderer Backend

OpenGL 4.5 implementation of the Nebula rendering backend.

This crate implements the `nebula_engine` renderer traits over the `gl`
crate, using direct state access for every object. It never creates windows
itself: the windowing layer hands it a symbol loader and the make-current /
done-current callbacks of the native context.

Commands are executed immediately while they are recorded; submitting a
command list only accounts its statistics.
*/

mod gl_renderer;
mod gl_buffer;
mod gl_texture;
mod gl_frame_buffer;
mod gl_vertex_array;
mod gl_program;
mod gl_command_list;
mod gl_debug;
pub mod gl_conversion;

pub use gl_renderer::{GlConfig, GlRenderer};
pub use gl_buffer::GlBuffer;
pub use gl_texture::{GlRenderBuffer, GlTexture};
pub use gl_frame_buffer::GlFrameBuffer;
pub use gl_vertex_array::GlVertexArray;
pub use gl_program::{GlProgram, GlShader};
pub use gl_command_list::GlCommandList;
pub use gl_debug::{debug_message_stats, DebugMessageStats};
