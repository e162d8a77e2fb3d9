/// GlFrameBuffer - OpenGL implementation of the FrameBuffer trait

use std::any::Any;
use gl::types::{GLenum, GLint, GLsizei, GLuint};
use nebula_engine::nebula::{Error, Result};
use nebula_engine::nebula::render::{AttachmentPoint, AttachmentSurface, FrameBuffer};
use nebula_engine::{engine_fail, engine_warn};

use crate::gl_conversion::attachment_point_to_gl;
use crate::gl_renderer::check_gl_error;
use crate::gl_texture::{GlRenderBuffer, GlTexture};

/// Framebuffer object; name 0 is the window surface
pub struct GlFrameBuffer {
    pub(crate) name: GLuint,
}

impl GlFrameBuffer {
    pub(crate) fn new() -> Result<Self> {
        let mut name = 0;
        unsafe {
            gl::CreateFramebuffers(1, &mut name);
        }
        let frame_buffer = Self { name };
        check_gl_error("nebula::GlFrameBuffer", "framebuffer creation")?;
        Ok(frame_buffer)
    }

    pub(crate) fn new_default() -> Self {
        Self { name: 0 }
    }

    pub fn name(&self) -> GLuint {
        self.name
    }
}

impl FrameBuffer for GlFrameBuffer {
    fn is_default(&self) -> bool {
        self.name == 0
    }

    fn attach(&self, point: AttachmentPoint, surface: Option<AttachmentSurface<'_>>) -> Result<()> {
        if self.is_default() {
            engine_warn!("nebula::GlFrameBuffer", "The default framebuffer accepts no attachments");
            return Ok(());
        }

        let attachment = attachment_point_to_gl(point);
        match surface {
            None => unsafe {
                gl::NamedFramebufferTexture(self.name, attachment, 0, 0);
            },
            Some(AttachmentSurface::Texture { texture, level, layer }) => {
                let Some(texture) = texture.as_any().downcast_ref::<GlTexture>() else {
                    engine_fail!(
                        "nebula::GlFrameBuffer",
                        Error::InvalidResource("attached texture was not created by a GL renderer".to_string())
                    );
                };
                unsafe {
                    match layer {
                        Some(layer) => gl::NamedFramebufferTextureLayer(
                            self.name,
                            attachment,
                            texture.name,
                            level as GLint,
                            layer as GLint,
                        ),
                        None => gl::NamedFramebufferTexture(self.name, attachment, texture.name, level as GLint),
                    }
                }
            }
            Some(AttachmentSurface::RenderBuffer(render_buffer)) => {
                let Some(render_buffer) = render_buffer.as_any().downcast_ref::<GlRenderBuffer>() else {
                    engine_fail!(
                        "nebula::GlFrameBuffer",
                        Error::InvalidResource("attached render buffer was not created by a GL renderer".to_string())
                    );
                };
                unsafe {
                    gl::NamedFramebufferRenderbuffer(self.name, attachment, gl::RENDERBUFFER, render_buffer.name);
                }
            }
        }
        check_gl_error("nebula::GlFrameBuffer", "framebuffer attachment")
    }

    fn set_draw_buffers(&self, colors: &[u8]) -> Result<()> {
        if self.is_default() {
            return Ok(());
        }
        let buffers: Vec<GLenum> = colors.iter().map(|&index| gl::COLOR_ATTACHMENT0 + index as GLenum).collect();
        unsafe {
            if buffers.is_empty() {
                gl::NamedFramebufferDrawBuffer(self.name, gl::NONE);
            } else {
                gl::NamedFramebufferDrawBuffers(self.name, buffers.len() as GLsizei, buffers.as_ptr());
            }
        }
        check_gl_error("nebula::GlFrameBuffer", "draw buffer selection")
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for GlFrameBuffer {
    fn drop(&mut self) {
        if self.name != 0 {
            unsafe {
                gl::DeleteFramebuffers(1, &self.name);
            }
        }
    }
}
