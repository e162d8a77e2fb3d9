/// Render buffers: framebuffer surfaces that are never sampled

use std::sync::Arc;
use crate::context::{ResourceKind, ResourceOwner};
use crate::error::{Error, Result};
use crate::renderer::{PixelFormat, RenderBuffer as BackendRenderBuffer, RenderBufferDesc};
use crate::{engine_error, engine_fail, engine_trace};

pub struct RenderBuffer {
    owner: ResourceOwner,
    desc: RenderBufferDesc,
    backend: Arc<dyn BackendRenderBuffer>,
}

impl RenderBuffer {
    /// Allocate a render buffer; `samples` of 0 or 1 is single-sampled
    pub fn new(format: PixelFormat, width: u32, height: u32, samples: u32) -> Result<Arc<RenderBuffer>> {
        if width == 0 || height == 0 {
            engine_fail!("nebula::RenderBuffer", Error::InvalidArgument(format!(
                "render buffer has a zero dimension ({}x{})", width, height
            )));
        }
        let desc = RenderBufferDesc { format, width, height, samples };
        let (owner, context) = ResourceOwner::acquire(
            ResourceKind::RenderBuffer,
            format!("{:?} {}x{}", format, width, height),
        );
        let backend = context.renderer().create_render_buffer(&desc)?;
        engine_trace!("nebula::RenderBuffer", "Created {:?} render buffer {}x{} ({} samples)", format, width, height, samples);

        Ok(Arc::new(RenderBuffer { owner, desc, backend }))
    }

    pub fn owner(&self) -> &ResourceOwner {
        &self.owner
    }

    pub fn desc(&self) -> &RenderBufferDesc {
        self.owner.check();
        &self.desc
    }

    pub fn format(&self) -> PixelFormat {
        self.owner.check();
        self.desc.format
    }

    pub fn backend(&self) -> &Arc<dyn BackendRenderBuffer> {
        self.owner.check();
        &self.backend
    }
}

impl Drop for RenderBuffer {
    fn drop(&mut self) {
        if !self.owner.release() {
            engine_error!(
                "nebula::RenderBuffer",
                "RenderBuffer dropped without a compatible current context; GPU storage is leaked"
            );
            std::mem::forget(Arc::clone(&self.backend));
        }
    }
}

impl std::fmt::Debug for RenderBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderBuffer")
            .field("owner", &self.owner)
            .field("desc", &self.desc)
            .finish()
    }
}
