/// GlVertexArray - OpenGL implementation of the VertexArray trait

use std::any::Any;
use gl::types::{GLint, GLintptr, GLsizei, GLuint};
use nebula_engine::nebula::{Error, Result};
use nebula_engine::nebula::render::{Buffer, ComponentType, VertexArray, VertexAttributeFormat};
use nebula_engine::engine_fail;

use crate::gl_buffer::GlBuffer;
use crate::gl_conversion::COMPONENT_TYPES;
use crate::gl_renderer::check_gl_error;

pub struct GlVertexArray {
    pub(crate) name: GLuint,
}

impl GlVertexArray {
    pub(crate) fn new() -> Result<Self> {
        let mut name = 0;
        unsafe {
            gl::CreateVertexArrays(1, &mut name);
        }
        let vertex_array = Self { name };
        check_gl_error("nebula::GlVertexArray", "vertex array creation")?;
        Ok(vertex_array)
    }

    pub fn name(&self) -> GLuint {
        self.name
    }
}

fn buffer_name(buffer: &dyn Buffer) -> Result<GLuint> {
    match buffer.as_any().downcast_ref::<GlBuffer>() {
        Some(buffer) => Ok(buffer.name),
        None => engine_fail!(
            "nebula::GlVertexArray",
            Error::InvalidResource("buffer was not created by a GL renderer".to_string())
        ),
    }
}

impl VertexArray for GlVertexArray {
    fn set_vertex_buffer(&self, binding: u32, buffer: Option<(&dyn Buffer, u64, u32)>) -> Result<()> {
        let (name, offset, stride) = match buffer {
            Some((buffer, offset, stride)) => (buffer_name(buffer)?, offset, stride),
            None => (0, 0, 0),
        };
        unsafe {
            gl::VertexArrayVertexBuffer(self.name, binding, name, offset as GLintptr, stride as GLsizei);
        }
        check_gl_error("nebula::GlVertexArray", "vertex buffer binding")
    }

    fn set_attribute(&self, location: u32, format: Option<&VertexAttributeFormat>) -> Result<()> {
        unsafe {
            match format {
                None => gl::DisableVertexArrayAttrib(self.name, location),
                Some(format) => {
                    let size = format.components as GLint;
                    let data_type = COMPONENT_TYPES[format.component_type.ordinal()];
                    gl::EnableVertexArrayAttrib(self.name, location);
                    if format.integer {
                        gl::VertexArrayAttribIFormat(self.name, location, size, data_type, format.relative_offset);
                    } else if format.component_type == ComponentType::Double {
                        gl::VertexArrayAttribLFormat(self.name, location, size, data_type, format.relative_offset);
                    } else {
                        let normalized = if format.normalized { gl::TRUE } else { gl::FALSE };
                        gl::VertexArrayAttribFormat(
                            self.name,
                            location,
                            size,
                            data_type,
                            normalized,
                            format.relative_offset,
                        );
                    }
                    gl::VertexArrayAttribBinding(self.name, location, format.binding);
                }
            }
        }
        check_gl_error("nebula::GlVertexArray", "vertex attribute setup")
    }

    fn set_index_buffer(&self, buffer: Option<&dyn Buffer>) -> Result<()> {
        let name = match buffer {
            Some(buffer) => buffer_name(buffer)?,
            None => 0,
        };
        unsafe {
            gl::VertexArrayElementBuffer(self.name, name);
        }
        check_gl_error("nebula::GlVertexArray", "index buffer binding")
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for GlVertexArray {
    fn drop(&mut self) {
        unsafe {
            gl::DeleteVertexArrays(1, &self.name);
        }
    }
}
