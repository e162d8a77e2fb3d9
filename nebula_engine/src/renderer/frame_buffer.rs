/// Framebuffer trait, attachment points and clear values

use std::any::Any;
use bitflags::bitflags;
use crate::error::Result;
use crate::renderer::{RenderBuffer, Texture};

/// Framebuffer attachment point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AttachmentPoint {
    Color(u8),
    Depth,
    Stencil,
    DepthStencil,
}

impl AttachmentPoint {
    /// Ordinal of the attachment kind (all color points share one)
    pub fn ordinal(self) -> usize {
        match self {
            AttachmentPoint::Color(_) => 0,
            AttachmentPoint::Depth => 1,
            AttachmentPoint::Stencil => 2,
            AttachmentPoint::DepthStencil => 3,
        }
    }
}

bitflags! {
    /// Attachments cleared by `FrameBuffer::clear()`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClearMask: u32 {
        const COLOR0 = 1 << 0;
        const COLOR1 = 1 << 1;
        const COLOR2 = 1 << 2;
        const COLOR3 = 1 << 3;
        const COLOR4 = 1 << 4;
        const COLOR5 = 1 << 5;
        const COLOR6 = 1 << 6;
        const COLOR7 = 1 << 7;
        const ALL_COLORS = 0xFF;
        const DEPTH = 1 << 8;
        const STENCIL = 1 << 9;
        const DEPTH_STENCIL = 1 << 10;
    }
}

impl ClearMask {
    /// Mask bit of a color attachment
    pub fn color(index: u8) -> ClearMask {
        ClearMask::from_bits_truncate(1 << (index as u32 & 7))
    }
}

/// Clear value of a color attachment, matching its format family
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClearColor {
    Float([f32; 4]),
    Int([i32; 4]),
    UInt([u32; 4]),
}

impl Default for ClearColor {
    fn default() -> Self {
        ClearColor::Float([0.5, 0.5, 1.0, 1.0])
    }
}

/// Surface attached to a framebuffer point
pub enum AttachmentSurface<'a> {
    /// A texture level; `layer` selects one layer/face of layered textures
    Texture {
        texture: &'a dyn Texture,
        level: u32,
        layer: Option<u32>,
    },
    RenderBuffer(&'a dyn RenderBuffer),
}

/// Framebuffer resource trait
///
/// The default framebuffer (window surface) is a backend object too; its
/// `is_default()` returns true and it accepts no attachments.
pub trait FrameBuffer: Send + Sync {
    fn is_default(&self) -> bool;

    /// Attach a surface, or detach the point with `None`
    fn attach(&self, point: AttachmentPoint, surface: Option<AttachmentSurface<'_>>) -> Result<()>;

    /// Select the color attachments fragment outputs write to
    fn set_draw_buffers(&self, colors: &[u8]) -> Result<()>;

    fn as_any(&self) -> &dyn Any;
}
