/// GlShader / GlProgram - OpenGL implementations of the shader traits
///
/// Interfaces are queried through the program interface API, so the
/// reported names, locations and offsets are the driver's own.

use std::any::Any;
use std::ffi::CString;
use std::sync::Arc;
use gl::types::{GLchar, GLenum, GLint, GLsizei, GLuint};
use nebula_engine::nebula::{Error, Result};
use nebula_engine::nebula::render::{
    ActiveAttribute, ActiveBlockMember, ActiveStorageBlock, ActiveUniform, Program, Shader,
    ShaderStage,
};
use nebula_engine::{engine_debug, engine_fail, engine_warn};

use crate::gl_conversion::{uniform_type_from_gl, SHADER_STAGES};
use crate::gl_renderer::check_gl_error;

/// Read an info log through the matching `Get*iv` / `Get*InfoLog` pair
fn info_log(
    name: GLuint,
    get_iv: unsafe fn(GLuint, GLenum, *mut GLint),
    get_log: unsafe fn(GLuint, GLsizei, *mut GLsizei, *mut GLchar),
) -> String {
    let mut length = 0;
    unsafe {
        get_iv(name, gl::INFO_LOG_LENGTH, &mut length);
    }
    if length <= 0 {
        return String::new();
    }
    let mut log = vec![0u8; length as usize];
    let mut written = 0;
    unsafe {
        get_log(name, length, &mut written, log.as_mut_ptr() as *mut GLchar);
    }
    log.truncate(written.max(0) as usize);
    String::from_utf8_lossy(&log).trim_end().to_string()
}

// ===== SHADER =====

/// Compiled shader object
pub struct GlShader {
    pub(crate) name: GLuint,
    stage: ShaderStage,
}

impl GlShader {
    pub(crate) fn compile(stage: ShaderStage, source: &str) -> Result<Self> {
        let name = unsafe { gl::CreateShader(SHADER_STAGES[stage.ordinal()]) };
        if name == 0 {
            check_gl_error("nebula::GlShader", "shader creation")?;
            engine_fail!("nebula::GlShader", Error::BackendError(format!("cannot create a {:?} shader", stage)));
        }
        let shader = Self { name, stage };

        let text = source.as_ptr() as *const GLchar;
        let length = source.len() as GLint;
        let mut status = 0;
        unsafe {
            gl::ShaderSource(name, 1, &text, &length);
            gl::CompileShader(name);
            gl::GetShaderiv(name, gl::COMPILE_STATUS, &mut status);
        }

        if status == gl::FALSE as GLint {
            let log = info_log(name, gl::GetShaderiv, gl::GetShaderInfoLog);
            engine_fail!("nebula::GlShader", Error::ShaderCompilation { stage, log });
        }
        Ok(shader)
    }

    pub fn name(&self) -> GLuint {
        self.name
    }
}

impl Shader for GlShader {
    fn stage(&self) -> ShaderStage {
        self.stage
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for GlShader {
    fn drop(&mut self) {
        unsafe {
            gl::DeleteShader(self.name);
        }
    }
}

// ===== PROGRAM =====

/// Program object; attached shaders are kept alive with it
pub struct GlProgram {
    pub(crate) name: GLuint,
    shaders: Vec<Arc<dyn Shader>>,
}

impl GlProgram {
    pub(crate) fn new() -> Result<Self> {
        let name = unsafe { gl::CreateProgram() };
        if name == 0 {
            check_gl_error("nebula::GlProgram", "program creation")?;
            engine_fail!("nebula::GlProgram", Error::BackendError("cannot create a program object".to_string()));
        }
        Ok(Self { name, shaders: Vec::new() })
    }

    pub fn name(&self) -> GLuint {
        self.name
    }

    fn has_stage(&self, stage: ShaderStage) -> bool {
        self.shaders.iter().any(|shader| shader.stage() == stage)
    }

    fn resource_count(&self, interface: GLenum) -> u32 {
        let mut count = 0;
        unsafe {
            gl::GetProgramInterfaceiv(self.name, interface, gl::ACTIVE_RESOURCES, &mut count);
        }
        count.max(0) as u32
    }

    fn resource_properties<const N: usize>(&self, interface: GLenum, index: u32, properties: [GLenum; N]) -> [GLint; N] {
        let mut values = [0; N];
        unsafe {
            gl::GetProgramResourceiv(
                self.name,
                interface,
                index,
                N as GLsizei,
                properties.as_ptr(),
                N as GLsizei,
                std::ptr::null_mut(),
                values.as_mut_ptr(),
            );
        }
        values
    }

    fn resource_name(&self, interface: GLenum, index: u32, name_length: GLint) -> String {
        if name_length <= 0 {
            return String::new();
        }
        let mut name = vec![0u8; name_length as usize];
        let mut written = 0;
        unsafe {
            gl::GetProgramResourceName(
                self.name,
                interface,
                index,
                name_length,
                &mut written,
                name.as_mut_ptr() as *mut GLchar,
            );
        }
        name.truncate(written.max(0) as usize);
        String::from_utf8_lossy(&name).into_owned()
    }
}

impl Program for GlProgram {
    fn attach(&mut self, shader: Arc<dyn Shader>) -> Result<()> {
        let Some(gl_shader) = shader.as_any().downcast_ref::<GlShader>() else {
            engine_fail!(
                "nebula::GlProgram",
                Error::InvalidResource("shader was not created by a GL renderer".to_string())
            );
        };
        unsafe {
            gl::AttachShader(self.name, gl_shader.name);
        }
        self.shaders.push(shader);
        check_gl_error("nebula::GlProgram", "shader attachment")
    }

    fn bind_attribute_location(&mut self, name: &str, location: u32) -> Result<()> {
        let Ok(c_name) = CString::new(name) else {
            engine_fail!(
                "nebula::GlProgram",
                Error::InvalidArgument(format!("attribute name '{}' contains a NUL byte", name))
            );
        };
        unsafe {
            gl::BindAttribLocation(self.name, location, c_name.as_ptr());
        }
        check_gl_error("nebula::GlProgram", "attribute location binding")
    }

    fn link(&mut self) -> Result<()> {
        let mut status = 0;
        unsafe {
            gl::LinkProgram(self.name);
            gl::GetProgramiv(self.name, gl::LINK_STATUS, &mut status);
        }
        if status == gl::FALSE as GLint {
            let log = info_log(self.name, gl::GetProgramiv, gl::GetProgramInfoLog);
            engine_fail!("nebula::GlProgram", Error::ProgramLink { log });
        }
        engine_debug!("nebula::GlProgram", "Program {} linked with {} stages", self.name, self.shaders.len());
        Ok(())
    }

    fn active_uniforms(&self) -> Vec<ActiveUniform> {
        const PROPERTIES: [GLenum; 5] = [gl::NAME_LENGTH, gl::TYPE, gl::LOCATION, gl::ARRAY_SIZE, gl::BLOCK_INDEX];

        (0..self.resource_count(gl::UNIFORM))
            .filter_map(|index| {
                let [name_length, gl_type, location, array_size, block_index] =
                    self.resource_properties(gl::UNIFORM, index, PROPERTIES);
                // Members of uniform blocks have no location of their own
                if block_index != -1 {
                    return None;
                }
                let name = self.resource_name(gl::UNIFORM, index, name_length);
                let Some(uniform_type) = uniform_type_from_gl(gl_type as GLenum) else {
                    engine_warn!("nebula::GlProgram", "Uniform '{}' has unsupported type 0x{:04X}", name, gl_type);
                    return None;
                };
                Some(ActiveUniform {
                    name,
                    index,
                    location,
                    uniform_type,
                    array_size: array_size.max(1) as u32,
                })
            })
            .collect()
    }

    fn active_storage_blocks(&self) -> Vec<ActiveStorageBlock> {
        const PROPERTIES: [GLenum; 4] = [gl::NAME_LENGTH, gl::BUFFER_BINDING, gl::BUFFER_DATA_SIZE, gl::NUM_ACTIVE_VARIABLES];

        (0..self.resource_count(gl::SHADER_STORAGE_BLOCK))
            .map(|index| {
                let [name_length, binding, data_size, variable_count] =
                    self.resource_properties(gl::SHADER_STORAGE_BLOCK, index, PROPERTIES);

                let mut variables = vec![0 as GLint; variable_count.max(0) as usize];
                if !variables.is_empty() {
                    unsafe {
                        gl::GetProgramResourceiv(
                            self.name,
                            gl::SHADER_STORAGE_BLOCK,
                            index,
                            1,
                            &gl::ACTIVE_VARIABLES,
                            variables.len() as GLsizei,
                            std::ptr::null_mut(),
                            variables.as_mut_ptr(),
                        );
                    }
                }

                let members = variables
                    .iter()
                    .map(|&variable| {
                        let [member_length, offset] =
                            self.resource_properties(gl::BUFFER_VARIABLE, variable as u32, [gl::NAME_LENGTH, gl::OFFSET]);
                        ActiveBlockMember {
                            name: self.resource_name(gl::BUFFER_VARIABLE, variable as u32, member_length),
                            offset: offset.max(0) as u64,
                        }
                    })
                    .collect();

                ActiveStorageBlock {
                    name: self.resource_name(gl::SHADER_STORAGE_BLOCK, index, name_length),
                    index,
                    binding: binding.max(0) as u32,
                    data_size: data_size.max(0) as u64,
                    members,
                }
            })
            .collect()
    }

    fn active_attributes(&self) -> Vec<ActiveAttribute> {
        if !self.has_stage(ShaderStage::Vertex) {
            return Vec::new();
        }
        const PROPERTIES: [GLenum; 3] = [gl::NAME_LENGTH, gl::TYPE, gl::LOCATION];

        (0..self.resource_count(gl::PROGRAM_INPUT))
            .filter_map(|index| {
                let [name_length, gl_type, location] = self.resource_properties(gl::PROGRAM_INPUT, index, PROPERTIES);
                let name = self.resource_name(gl::PROGRAM_INPUT, index, name_length);
                let Some(attribute_type) = uniform_type_from_gl(gl_type as GLenum) else {
                    engine_warn!("nebula::GlProgram", "Vertex input '{}' has unsupported type 0x{:04X}", name, gl_type);
                    return None;
                };
                Some(ActiveAttribute { name, index, location, attribute_type })
            })
            .collect()
    }

    fn local_workgroup_size(&self) -> Option<[u32; 3]> {
        if !self.has_stage(ShaderStage::Compute) {
            return None;
        }
        let mut size = [0 as GLint; 3];
        unsafe {
            gl::GetProgramiv(self.name, gl::COMPUTE_WORK_GROUP_SIZE, size.as_mut_ptr());
        }
        Some(size.map(|v| v.max(1) as u32))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for GlProgram {
    fn drop(&mut self) {
        unsafe {
            gl::DeleteProgram(self.name);
        }
    }
}
