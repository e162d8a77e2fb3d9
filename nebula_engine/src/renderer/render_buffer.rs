/// Render buffer trait and descriptor

use std::any::Any;
use crate::renderer::PixelFormat;

/// Descriptor for creating a render buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderBufferDesc {
    pub format: PixelFormat,
    pub width: u32,
    pub height: u32,
    /// Multisample count (0 or 1 = single-sampled)
    pub samples: u32,
}

/// Render buffer resource trait
///
/// A render buffer is a framebuffer surface that cannot be sampled.
pub trait RenderBuffer: Send + Sync {
    fn desc(&self) -> &RenderBufferDesc;

    fn as_any(&self) -> &dyn Any;
}
