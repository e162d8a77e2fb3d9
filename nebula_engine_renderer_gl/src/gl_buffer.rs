/// GlBuffer - OpenGL implementation of the Buffer trait

use std::any::Any;
use std::ffi::c_void;
use gl::types::{GLintptr, GLsizeiptr, GLuint};
use nebula_engine::nebula::{Error, Result};
use nebula_engine::nebula::render::{Buffer, MapAccess};
use nebula_engine::{engine_bail, engine_fail};

use crate::gl_conversion::MAP_ACCESSES;
use crate::gl_renderer::check_gl_error;

/// Buffer object with immutable storage
pub struct GlBuffer {
    pub(crate) name: GLuint,
    size: u64,
}

impl GlBuffer {
    pub(crate) fn new(size: u64, data: Option<&[u8]>) -> Result<Self> {
        if let Some(data) = data {
            if data.len() as u64 > size {
                engine_fail!(
                    "nebula::GlBuffer",
                    Error::InvalidArgument(format!("initial data of {} bytes exceeds buffer size {}", data.len(), size))
                );
            }
        }

        let mut name = 0;
        unsafe {
            gl::CreateBuffers(1, &mut name);
            // Zero-sized storage is rejected by GL
            gl::NamedBufferStorage(
                name,
                size.max(1) as GLsizeiptr,
                std::ptr::null(),
                gl::DYNAMIC_STORAGE_BIT | gl::MAP_READ_BIT | gl::MAP_WRITE_BIT,
            );
            if let Some(data) = data.filter(|data| !data.is_empty()) {
                gl::NamedBufferSubData(name, 0, data.len() as GLsizeiptr, data.as_ptr() as *const c_void);
            }
        }
        let buffer = Self { name, size };
        check_gl_error("nebula::GlBuffer", "buffer allocation")?;
        Ok(buffer)
    }

    pub fn name(&self) -> GLuint {
        self.name
    }

    fn check_range(&self, offset: u64, len: u64) -> Result<()> {
        if offset.checked_add(len).map_or(true, |end| end > self.size) {
            engine_fail!(
                "nebula::GlBuffer",
                Error::InvalidArgument(format!("range {}+{} exceeds buffer size {}", offset, len, self.size))
            );
        }
        Ok(())
    }
}

impl Buffer for GlBuffer {
    fn size(&self) -> u64 {
        self.size
    }

    fn write(&self, offset: u64, data: &[u8]) -> Result<()> {
        self.check_range(offset, data.len() as u64)?;
        if data.is_empty() {
            return Ok(());
        }
        unsafe {
            gl::NamedBufferSubData(
                self.name,
                offset as GLintptr,
                data.len() as GLsizeiptr,
                data.as_ptr() as *const c_void,
            );
        }
        check_gl_error("nebula::GlBuffer", "buffer write")
    }

    fn read(&self, offset: u64, out: &mut [u8]) -> Result<()> {
        self.check_range(offset, out.len() as u64)?;
        if out.is_empty() {
            return Ok(());
        }
        unsafe {
            gl::GetNamedBufferSubData(
                self.name,
                offset as GLintptr,
                out.len() as GLsizeiptr,
                out.as_mut_ptr() as *mut c_void,
            );
        }
        check_gl_error("nebula::GlBuffer", "buffer read")
    }

    fn map(&self, access: MapAccess, offset: u64, size: u64) -> Result<*mut u8> {
        self.check_range(offset, size)?;
        let ptr = unsafe {
            gl::MapNamedBufferRange(
                self.name,
                offset as GLintptr,
                size as GLsizeiptr,
                MAP_ACCESSES[access.ordinal()],
            )
        };
        if ptr.is_null() {
            check_gl_error("nebula::GlBuffer", "buffer map")?;
            engine_bail!("nebula::GlBuffer", "Mapping buffer {} returned no pointer", self.name);
        }
        Ok(ptr as *mut u8)
    }

    fn unmap(&self) {
        unsafe {
            gl::UnmapNamedBuffer(self.name);
        }
    }

    fn copy_to(&self, dst: &dyn Buffer, src_offset: u64, dst_offset: u64, size: u64) -> Result<()> {
        let Some(target) = dst.as_any().downcast_ref::<GlBuffer>() else {
            engine_fail!(
                "nebula::GlBuffer",
                Error::InvalidResource("copy destination was not created by a GL renderer".to_string())
            );
        };
        self.check_range(src_offset, size)?;
        target.check_range(dst_offset, size)?;
        unsafe {
            gl::CopyNamedBufferSubData(
                self.name,
                target.name,
                src_offset as GLintptr,
                dst_offset as GLintptr,
                size as GLsizeiptr,
            );
        }
        check_gl_error("nebula::GlBuffer", "buffer copy")
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for GlBuffer {
    fn drop(&mut self) {
        unsafe {
            gl::DeleteBuffers(1, &self.name);
        }
    }
}
