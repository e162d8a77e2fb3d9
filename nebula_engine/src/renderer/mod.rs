/// Renderer module - backend contract traits and shared enumerations

// Module declarations
pub mod renderer;
pub mod format;
pub mod buffer;
pub mod texture;
pub mod render_buffer;
pub mod vertex_array;
pub mod frame_buffer;
pub mod pipeline;
pub mod shader;
pub mod command_list;
pub mod headless;

// Re-export everything from renderer.rs
pub use renderer::*;

// Re-export from other modules
pub use format::*;
pub use buffer::*;
pub use texture::*;
pub use render_buffer::*;
pub use vertex_array::*;
pub use frame_buffer::*;
pub use pipeline::*;
pub use shader::*;
pub use command_list::*;
