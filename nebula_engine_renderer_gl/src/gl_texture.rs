/// GlTexture / GlRenderBuffer - OpenGL implementations of the texture traits

use std::any::Any;
use std::ffi::c_void;
use gl::types::{GLenum, GLint, GLsizei, GLuint};
use nebula_engine::nebula::{Error, Result};
use nebula_engine::nebula::render::{
    PixelTransfer, RenderBuffer, RenderBufferDesc, SamplerState, Texture, TextureDesc,
    TextureRegion, TextureType,
};
use nebula_engine::engine_fail;

use crate::gl_conversion::{
    color_transfer_format, COMPARE_FUNCS, COMPONENT_TYPES, MAG_FILTERS, MIN_FILTERS,
    PIXEL_FORMATS, PIXEL_TRANSFERS, SWIZZLES, TEXTURE_TYPES, WRAPS,
};
use crate::gl_renderer::check_gl_error;

// ===== TEXTURE =====

/// Texture object with immutable storage
pub struct GlTexture {
    pub(crate) name: GLuint,
    pub(crate) target: GLenum,
    desc: TextureDesc,
}

impl GlTexture {
    pub(crate) fn new(desc: &TextureDesc) -> Result<Self> {
        let multisampled = desc.samples > 1;
        let target = match (desc.texture_type, multisampled) {
            (_, false) => TEXTURE_TYPES[desc.texture_type.ordinal()],
            (TextureType::Texture2D, true) => gl::TEXTURE_2D_MULTISAMPLE,
            (TextureType::Texture2DArray, true) => gl::TEXTURE_2D_MULTISAMPLE_ARRAY,
            (other, true) => engine_fail!(
                "nebula::GlTexture",
                Error::InvalidArgument(format!("{:?} textures cannot be multisampled", other))
            ),
        };
        let internal = PIXEL_FORMATS[desc.format.ordinal()];
        let (width, height, depth) = (desc.width as GLsizei, desc.height as GLsizei, desc.depth as GLsizei);
        let levels = desc.levels.max(1) as GLsizei;

        let mut name = 0;
        unsafe {
            gl::CreateTextures(target, 1, &mut name);
            match (desc.texture_type, multisampled) {
                (TextureType::Texture2D, true) => {
                    gl::TextureStorage2DMultisample(name, desc.samples as GLsizei, internal, width, height, gl::TRUE);
                }
                (_, true) => {
                    gl::TextureStorage3DMultisample(name, desc.samples as GLsizei, internal, width, height, depth, gl::TRUE);
                }
                (TextureType::Texture1D, false) => gl::TextureStorage1D(name, levels, internal, width),
                (TextureType::Texture2D | TextureType::Rect | TextureType::Cube | TextureType::Texture1DArray, false) => {
                    gl::TextureStorage2D(name, levels, internal, width, height);
                }
                (TextureType::Texture3D | TextureType::Texture2DArray | TextureType::CubeArray, false) => {
                    gl::TextureStorage3D(name, levels, internal, width, height, depth);
                }
            }
        }
        let texture = Self { name, target, desc: *desc };
        check_gl_error("nebula::GlTexture", "texture allocation")?;
        Ok(texture)
    }

    pub fn name(&self) -> GLuint {
        self.name
    }

    fn level_size(&self, level: u32) -> usize {
        let [width, height, depth] = self.desc.level_extent(level);
        width as usize * height as usize * depth as usize * self.desc.format.bytes_per_pixel() as usize
    }

    fn check_level(&self, level: u32) -> Result<()> {
        if level >= self.desc.levels.max(1) {
            engine_fail!(
                "nebula::GlTexture",
                Error::InvalidArgument(format!("level {} of a texture with {} levels", level, self.desc.levels))
            );
        }
        Ok(())
    }
}

impl Texture for GlTexture {
    fn desc(&self) -> &TextureDesc {
        &self.desc
    }

    fn upload(&self, level: u32, region: &TextureRegion, transfer: &PixelTransfer, data: &[u8]) -> Result<()> {
        self.check_level(level)?;
        let expected = region.texel_count() * transfer.bytes_per_pixel() as u64;
        if (data.len() as u64) < expected {
            engine_fail!(
                "nebula::GlTexture",
                Error::InvalidArgument(format!("upload needs {} bytes, got {}", expected, data.len()))
            );
        }

        let format = if self.desc.format.has_depth() || self.desc.format.has_stencil() {
            PIXEL_TRANSFERS[self.desc.format.ordinal()].0
        } else {
            match color_transfer_format(transfer.components, transfer.integer) {
                Some(format) => format,
                None => engine_fail!(
                    "nebula::GlTexture",
                    Error::UnsupportedFormat(format!("{} components per pixel", transfer.components))
                ),
            }
        };
        let data_type = COMPONENT_TYPES[transfer.component_type.ordinal()];
        let [x, y, z] = region.offset.map(|v| v as GLint);
        let [width, height, depth] = region.size.map(|v| v as GLsizei);
        let pixels = data.as_ptr() as *const c_void;

        unsafe {
            gl::PixelStorei(gl::UNPACK_ALIGNMENT, 1);
            match self.desc.texture_type {
                TextureType::Texture1D => {
                    gl::TextureSubImage1D(self.name, level as GLint, x, width, format, data_type, pixels);
                }
                TextureType::Texture2D | TextureType::Rect | TextureType::Texture1DArray => {
                    gl::TextureSubImage2D(self.name, level as GLint, x, y, width, height, format, data_type, pixels);
                }
                // Cube faces are addressed as layers
                TextureType::Texture3D | TextureType::Cube | TextureType::Texture2DArray | TextureType::CubeArray => {
                    gl::TextureSubImage3D(self.name, level as GLint, x, y, z, width, height, depth, format, data_type, pixels);
                }
            }
        }
        check_gl_error("nebula::GlTexture", "texture upload")
    }

    fn read_level(&self, level: u32) -> Result<Vec<u8>> {
        self.check_level(level)?;
        let (format, data_type) = PIXEL_TRANSFERS[self.desc.format.ordinal()];
        let mut pixels = vec![0u8; self.level_size(level)];
        unsafe {
            gl::PixelStorei(gl::PACK_ALIGNMENT, 1);
            gl::GetTextureImage(
                self.name,
                level as GLint,
                format,
                data_type,
                pixels.len() as GLsizei,
                pixels.as_mut_ptr() as *mut c_void,
            );
        }
        check_gl_error("nebula::GlTexture", "texture read")?;
        Ok(pixels)
    }

    fn copy_level_to(&self, dst: &dyn Texture, level: u32) -> Result<()> {
        let Some(target) = dst.as_any().downcast_ref::<GlTexture>() else {
            engine_fail!(
                "nebula::GlTexture",
                Error::InvalidResource("copy destination was not created by a GL renderer".to_string())
            );
        };
        self.check_level(level)?;
        target.check_level(level)?;
        let [width, height, depth] = self.desc.level_extent(level).map(|v| v as GLsizei);
        unsafe {
            gl::CopyImageSubData(
                self.name, self.target, level as GLint, 0, 0, 0,
                target.name, target.target, level as GLint, 0, 0, 0,
                width, height, depth,
            );
        }
        check_gl_error("nebula::GlTexture", "texture copy")
    }

    fn generate_mipmaps(&self) -> Result<()> {
        if self.desc.levels <= 1 {
            return Ok(());
        }
        unsafe {
            gl::GenerateTextureMipmap(self.name);
        }
        check_gl_error("nebula::GlTexture", "mipmap generation")
    }

    fn apply_sampler(&self, sampler: &SamplerState) -> Result<()> {
        // Multisample textures carry no sampler state
        if self.desc.samples > 1 {
            return Ok(());
        }

        let mut min_filter = MIN_FILTERS[sampler.min_filter.ordinal()];
        if self.desc.levels <= 1 && sampler.min_filter.uses_mipmaps() {
            min_filter = gl::LINEAR;
        }
        let swizzle = sampler.swizzle.map(|s| SWIZZLES[s.ordinal()] as GLint);

        unsafe {
            gl::TextureParameteri(self.name, gl::TEXTURE_WRAP_S, WRAPS[sampler.wrap[0].ordinal()] as GLint);
            gl::TextureParameteri(self.name, gl::TEXTURE_WRAP_T, WRAPS[sampler.wrap[1].ordinal()] as GLint);
            gl::TextureParameteri(self.name, gl::TEXTURE_WRAP_R, WRAPS[sampler.wrap[2].ordinal()] as GLint);
            gl::TextureParameteri(self.name, gl::TEXTURE_MIN_FILTER, min_filter as GLint);
            gl::TextureParameteri(self.name, gl::TEXTURE_MAG_FILTER, MAG_FILTERS[sampler.mag_filter.ordinal()] as GLint);
            gl::TextureParameterfv(self.name, gl::TEXTURE_BORDER_COLOR, sampler.border_color.as_ptr());
            gl::TextureParameteriv(self.name, gl::TEXTURE_SWIZZLE_RGBA, swizzle.as_ptr());
            match sampler.compare {
                Some(func) => {
                    gl::TextureParameteri(self.name, gl::TEXTURE_COMPARE_MODE, gl::COMPARE_REF_TO_TEXTURE as GLint);
                    gl::TextureParameteri(self.name, gl::TEXTURE_COMPARE_FUNC, COMPARE_FUNCS[func.ordinal()] as GLint);
                }
                None => gl::TextureParameteri(self.name, gl::TEXTURE_COMPARE_MODE, gl::NONE as GLint),
            }
        }
        check_gl_error("nebula::GlTexture", "sampler update")
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for GlTexture {
    fn drop(&mut self) {
        unsafe {
            gl::DeleteTextures(1, &self.name);
        }
    }
}

// ===== RENDER BUFFER =====

/// Render buffer object
pub struct GlRenderBuffer {
    pub(crate) name: GLuint,
    desc: RenderBufferDesc,
}

impl GlRenderBuffer {
    pub(crate) fn new(desc: &RenderBufferDesc) -> Result<Self> {
        let samples = if desc.samples > 1 { desc.samples } else { 0 };
        let mut name = 0;
        unsafe {
            gl::CreateRenderbuffers(1, &mut name);
            gl::NamedRenderbufferStorageMultisample(
                name,
                samples as GLsizei,
                PIXEL_FORMATS[desc.format.ordinal()],
                desc.width as GLsizei,
                desc.height as GLsizei,
            );
        }
        let render_buffer = Self { name, desc: *desc };
        check_gl_error("nebula::GlRenderBuffer", "render buffer allocation")?;
        Ok(render_buffer)
    }

    pub fn name(&self) -> GLuint {
        self.name
    }
}

impl RenderBuffer for GlRenderBuffer {
    fn desc(&self) -> &RenderBufferDesc {
        &self.desc
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for GlRenderBuffer {
    fn drop(&mut self) {
        unsafe {
            gl::DeleteRenderbuffers(1, &self.name);
        }
    }
}
