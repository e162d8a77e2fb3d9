/// Headless backend - records commands instead of talking to a GPU

pub mod glsl_scan;
mod headless_renderer;
mod headless_command_list;
mod headless_resources;
mod headless_program;

pub use headless_renderer::{HeadlessRenderer, NameAllocator};
pub(crate) use headless_renderer::HeadlessState;
pub use headless_command_list::{Command, HeadlessCommandList};
pub use headless_resources::{
    HeadlessBinding, HeadlessBuffer, HeadlessFrameBuffer, HeadlessRenderBuffer, HeadlessSurface,
    HeadlessTexture, HeadlessVertexArray,
};
pub use headless_program::{HeadlessProgram, HeadlessShader};
