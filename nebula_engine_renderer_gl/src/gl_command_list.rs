/// GlCommandList - OpenGL implementation of the CommandList trait
///
/// GL executes each command as it is recorded. The list tracks the bound
/// framebuffer and program so clears and uniform uploads address them
/// directly, and counts the work it issued for the renderer statistics.

use std::any::Any;
use std::ffi::c_void;
use gl::types::{GLboolean, GLint, GLintptr, GLsizei, GLsizeiptr, GLuint};
use nebula_engine::nebula::{Error, Result};
use nebula_engine::nebula::render::{
    BlendState, Buffer, ClearColor, ColorWriteMask, CommandList, DepthState, FaceCulling,
    FrameBuffer, ImageBinding, IndexType, MemoryBarrier, PrimitiveType, Program, RendererStats,
    StencilFaceState, StencilState, Texture, UniformData, VertexArray, Viewport,
    MAX_COLOR_ATTACHMENTS,
};
use nebula_engine::engine_fail;

use crate::gl_buffer::GlBuffer;
use crate::gl_conversion::{
    memory_barrier_to_gl, BLEND_EQUATIONS, BLEND_FACTORS, COMPARE_FUNCS, CULL_FACES, FRONT_FACES,
    IMAGE_ACCESSES, INDEX_TYPES, PIXEL_FORMATS, PRIMITIVE_TYPES, STENCIL_OPS,
};
use crate::gl_frame_buffer::GlFrameBuffer;
use crate::gl_program::GlProgram;
use crate::gl_renderer::check_gl_error;
use crate::gl_texture::GlTexture;
use crate::gl_vertex_array::GlVertexArray;

/// Immediate-mode command list
pub struct GlCommandList {
    frame_buffer: GLuint,
    program: Option<GLuint>,
    stats: RendererStats,
}

impl GlCommandList {
    pub(crate) fn new() -> Self {
        Self {
            frame_buffer: 0,
            program: None,
            stats: RendererStats::default(),
        }
    }

    /// Work issued through this list
    pub fn stats(&self) -> RendererStats {
        self.stats
    }

    fn current_program(&self) -> Result<GLuint> {
        match self.program {
            Some(program) => Ok(program),
            None => engine_fail!(
                "nebula::GlCommandList",
                Error::InvalidArgument("uniform upload with no program in use".to_string())
            ),
        }
    }
}

/// Downcast a backend object created by another renderer into a GL one
fn gl_object<'a, T: 'static>(object: &'a dyn Any, kind: &str) -> Result<&'a T> {
    match object.downcast_ref::<T>() {
        Some(object) => Ok(object),
        None => engine_fail!(
            "nebula::GlCommandList",
            Error::InvalidResource(format!("{} was not created by a GL renderer", kind))
        ),
    }
}

fn gl_bool(value: bool) -> GLboolean {
    if value { gl::TRUE } else { gl::FALSE }
}

fn set_enabled(capability: gl::types::GLenum, enabled: bool) {
    unsafe {
        if enabled {
            gl::Enable(capability);
        } else {
            gl::Disable(capability);
        }
    }
}

fn apply_stencil_face(face: gl::types::GLenum, state: &StencilFaceState) {
    unsafe {
        gl::StencilFuncSeparate(face, COMPARE_FUNCS[state.func.ordinal()], state.reference, state.read_mask);
        gl::StencilMaskSeparate(face, state.write_mask);
        gl::StencilOpSeparate(
            face,
            STENCIL_OPS[state.fail.ordinal()],
            STENCIL_OPS[state.depth_fail.ordinal()],
            STENCIL_OPS[state.pass.ordinal()],
        );
    }
}

impl CommandList for GlCommandList {
    // ===== PIPELINE STATE =====

    fn set_face_culling(&mut self, culling: &FaceCulling) -> Result<()> {
        set_enabled(gl::CULL_FACE, culling.enabled);
        unsafe {
            gl::CullFace(CULL_FACES[culling.face.ordinal()]);
            gl::FrontFace(FRONT_FACES[culling.front_face.ordinal()]);
        }
        Ok(())
    }

    fn set_color_mask(&mut self, attachment: u32, mask: ColorWriteMask) -> Result<()> {
        unsafe {
            gl::ColorMaski(attachment, gl_bool(mask.r), gl_bool(mask.g), gl_bool(mask.b), gl_bool(mask.a));
        }
        Ok(())
    }

    fn set_depth_state(&mut self, state: &DepthState) -> Result<()> {
        set_enabled(gl::DEPTH_TEST, state.test_enabled);
        unsafe {
            gl::DepthFunc(COMPARE_FUNCS[state.func.ordinal()]);
            gl::DepthMask(gl_bool(state.write_enabled));
        }
        Ok(())
    }

    fn set_stencil_state(&mut self, state: &StencilState) -> Result<()> {
        set_enabled(gl::STENCIL_TEST, state.enabled);
        apply_stencil_face(gl::FRONT, &state.front);
        apply_stencil_face(gl::BACK, &state.back);
        Ok(())
    }

    fn set_blend_state(&mut self, state: &BlendState) -> Result<()> {
        set_enabled(gl::BLEND, state.enabled);
        let [r, g, b, a] = state.constant;
        unsafe {
            for (index, attachment) in state.attachments.iter().enumerate().take(MAX_COLOR_ATTACHMENTS) {
                let index = index as GLuint;
                gl::BlendEquationSeparatei(
                    index,
                    BLEND_EQUATIONS[attachment.color_equation.ordinal()],
                    BLEND_EQUATIONS[attachment.alpha_equation.ordinal()],
                );
                gl::BlendFuncSeparatei(
                    index,
                    BLEND_FACTORS[attachment.src_color.ordinal()],
                    BLEND_FACTORS[attachment.dst_color.ordinal()],
                    BLEND_FACTORS[attachment.src_alpha.ordinal()],
                    BLEND_FACTORS[attachment.dst_alpha.ordinal()],
                );
            }
            gl::BlendColor(r, g, b, a);
        }
        Ok(())
    }

    // ===== FRAMEBUFFER =====

    fn bind_frame_buffer(&mut self, frame_buffer: &dyn FrameBuffer) -> Result<()> {
        let frame_buffer = gl_object::<GlFrameBuffer>(frame_buffer.as_any(), "FrameBuffer")?;
        unsafe {
            gl::BindFramebuffer(gl::FRAMEBUFFER, frame_buffer.name);
        }
        self.frame_buffer = frame_buffer.name;
        Ok(())
    }

    fn clear_color(&mut self, attachment: u32, value: ClearColor) -> Result<()> {
        let draw_buffer = attachment as GLint;
        unsafe {
            match value {
                ClearColor::Float(color) => {
                    gl::ClearNamedFramebufferfv(self.frame_buffer, gl::COLOR, draw_buffer, color.as_ptr());
                }
                ClearColor::Int(color) => {
                    gl::ClearNamedFramebufferiv(self.frame_buffer, gl::COLOR, draw_buffer, color.as_ptr());
                }
                ClearColor::UInt(color) => {
                    gl::ClearNamedFramebufferuiv(self.frame_buffer, gl::COLOR, draw_buffer, color.as_ptr());
                }
            }
        }
        check_gl_error("nebula::GlCommandList", "color clear")
    }

    fn clear_depth_stencil(&mut self, depth: Option<f32>, stencil: Option<i32>) -> Result<()> {
        unsafe {
            match (depth, stencil) {
                (Some(depth), Some(stencil)) => {
                    gl::ClearNamedFramebufferfi(self.frame_buffer, gl::DEPTH_STENCIL, 0, depth, stencil);
                }
                (Some(depth), None) => gl::ClearNamedFramebufferfv(self.frame_buffer, gl::DEPTH, 0, &depth),
                (None, Some(stencil)) => gl::ClearNamedFramebufferiv(self.frame_buffer, gl::STENCIL, 0, &stencil),
                (None, None) => return Ok(()),
            }
        }
        check_gl_error("nebula::GlCommandList", "depth/stencil clear")
    }

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        unsafe {
            gl::Viewport(viewport.x, viewport.y, viewport.width as GLsizei, viewport.height as GLsizei);
        }
        Ok(())
    }

    // ===== BINDINGS =====

    fn use_program(&mut self, program: &dyn Program) -> Result<()> {
        let program = gl_object::<GlProgram>(program.as_any(), "Program")?;
        unsafe {
            gl::UseProgram(program.name);
        }
        self.program = Some(program.name);
        Ok(())
    }

    fn bind_vertex_array(&mut self, vertex_array: &dyn VertexArray) -> Result<()> {
        let vertex_array = gl_object::<GlVertexArray>(vertex_array.as_any(), "VertexArray")?;
        unsafe {
            gl::BindVertexArray(vertex_array.name);
        }
        Ok(())
    }

    fn set_uniform(&mut self, location: i32, value: &UniformData) -> Result<()> {
        let program = self.current_program()?;
        unsafe {
            match *value {
                UniformData::Float(v) => gl::ProgramUniform1f(program, location, v),
                UniformData::Vec2(v) => gl::ProgramUniform2fv(program, location, 1, v.as_ptr()),
                UniformData::Vec3(v) => gl::ProgramUniform3fv(program, location, 1, v.as_ptr()),
                UniformData::Vec4(v) => gl::ProgramUniform4fv(program, location, 1, v.as_ptr()),
                UniformData::Int(v) => gl::ProgramUniform1i(program, location, v),
                UniformData::IVec2(v) => gl::ProgramUniform2iv(program, location, 1, v.as_ptr()),
                UniformData::IVec3(v) => gl::ProgramUniform3iv(program, location, 1, v.as_ptr()),
                UniformData::IVec4(v) => gl::ProgramUniform4iv(program, location, 1, v.as_ptr()),
                UniformData::UInt(v) => gl::ProgramUniform1ui(program, location, v),
                UniformData::UVec2(v) => gl::ProgramUniform2uiv(program, location, 1, v.as_ptr()),
                UniformData::UVec3(v) => gl::ProgramUniform3uiv(program, location, 1, v.as_ptr()),
                UniformData::UVec4(v) => gl::ProgramUniform4uiv(program, location, 1, v.as_ptr()),
                UniformData::Bool(v) => gl::ProgramUniform1i(program, location, v as GLint),
                UniformData::Mat2(m) => gl::ProgramUniformMatrix2fv(program, location, 1, gl::FALSE, m.as_ptr()),
                UniformData::Mat3(m) => gl::ProgramUniformMatrix3fv(program, location, 1, gl::FALSE, m.as_ptr()),
                UniformData::Mat4(m) => gl::ProgramUniformMatrix4fv(program, location, 1, gl::FALSE, m.as_ptr()),
            }
        }
        check_gl_error("nebula::GlCommandList", "uniform upload")
    }

    fn bind_texture(&mut self, unit: u32, texture: &dyn Texture) -> Result<()> {
        let texture = gl_object::<GlTexture>(texture.as_any(), "Texture")?;
        unsafe {
            gl::BindTextureUnit(unit, texture.name);
        }
        Ok(())
    }

    fn bind_image(&mut self, unit: u32, texture: &dyn Texture, binding: &ImageBinding) -> Result<()> {
        let texture = gl_object::<GlTexture>(texture.as_any(), "Texture")?;
        let (layered, layer) = match binding.layer {
            Some(layer) => (gl::FALSE, layer as GLint),
            None => (gl::TRUE, 0),
        };
        unsafe {
            gl::BindImageTexture(
                unit,
                texture.name,
                binding.level as GLint,
                layered,
                layer,
                IMAGE_ACCESSES[binding.access.ordinal()],
                PIXEL_FORMATS[binding.format.ordinal()],
            );
        }
        check_gl_error("nebula::GlCommandList", "image binding")
    }

    fn bind_storage_buffer(&mut self, binding: u32, buffer: &dyn Buffer, offset: u64, size: u64) -> Result<()> {
        let buffer = gl_object::<GlBuffer>(buffer.as_any(), "Buffer")?;
        unsafe {
            gl::BindBufferRange(
                gl::SHADER_STORAGE_BUFFER,
                binding,
                buffer.name,
                offset as GLintptr,
                size as GLsizeiptr,
            );
        }
        check_gl_error("nebula::GlCommandList", "storage buffer binding")
    }

    fn set_storage_block_binding(&mut self, program: &dyn Program, block_index: u32, binding: u32) -> Result<()> {
        let program = gl_object::<GlProgram>(program.as_any(), "Program")?;
        unsafe {
            gl::ShaderStorageBlockBinding(program.name, block_index, binding);
        }
        check_gl_error("nebula::GlCommandList", "storage block binding")
    }

    // ===== DRAW / DISPATCH =====

    fn draw_arrays(&mut self, primitive: PrimitiveType, first: u32, count: u32) -> Result<()> {
        unsafe {
            gl::DrawArrays(PRIMITIVE_TYPES[primitive.ordinal()], first as GLint, count as GLsizei);
        }
        self.stats.draw_calls += 1;
        self.stats.vertices += count as u64;
        Ok(())
    }

    fn draw_elements(
        &mut self,
        primitive: PrimitiveType,
        count: u32,
        index_type: IndexType,
        byte_offset: u64,
        base_vertex: i32,
    ) -> Result<()> {
        unsafe {
            gl::DrawElementsBaseVertex(
                PRIMITIVE_TYPES[primitive.ordinal()],
                count as GLsizei,
                INDEX_TYPES[index_type.ordinal()],
                byte_offset as usize as *const c_void,
                base_vertex,
            );
        }
        self.stats.draw_calls += 1;
        self.stats.vertices += count as u64;
        Ok(())
    }

    fn dispatch(&mut self, groups: [u32; 3]) -> Result<()> {
        unsafe {
            gl::DispatchCompute(groups[0], groups[1], groups[2]);
        }
        self.stats.dispatches += 1;
        Ok(())
    }

    fn memory_barrier(&mut self, barrier: MemoryBarrier) -> Result<()> {
        let bits = memory_barrier_to_gl(barrier);
        if bits != 0 {
            unsafe {
                gl::MemoryBarrier(bits);
            }
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
