/// Headless command list - records commands with object names

use std::any::Any;
use crate::error::Result;
use crate::renderer::headless::{
    HeadlessBuffer, HeadlessFrameBuffer, HeadlessProgram, HeadlessTexture, HeadlessVertexArray,
};
use crate::renderer::{
    BlendState, Buffer, ClearColor, ColorWriteMask, CommandList, DepthState, FaceCulling,
    FrameBuffer, ImageBinding, IndexType, MemoryBarrier, PrimitiveType, Program, StencilState,
    Texture, UniformData, VertexArray, Viewport,
};
use crate::engine_bail;

/// One recorded command; objects are identified by their headless names
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetFaceCulling(FaceCulling),
    SetColorMask { attachment: u32, mask: ColorWriteMask },
    SetDepthState(DepthState),
    SetStencilState(StencilState),
    SetBlendState(BlendState),
    BindFrameBuffer { frame_buffer: u32 },
    ClearColor { attachment: u32, value: ClearColor },
    ClearDepthStencil { depth: Option<f32>, stencil: Option<i32> },
    SetViewport(Viewport),
    UseProgram { program: u32 },
    BindVertexArray { vertex_array: u32 },
    SetUniform { location: i32, value: UniformData },
    BindTexture { unit: u32, texture: u32 },
    BindImage { unit: u32, texture: u32, binding: ImageBinding },
    BindStorageBuffer { binding: u32, buffer: u32, offset: u64, size: u64 },
    SetStorageBlockBinding { program: u32, block_index: u32, binding: u32 },
    DrawArrays { primitive: PrimitiveType, first: u32, count: u32 },
    DrawElements {
        primitive: PrimitiveType,
        count: u32,
        index_type: IndexType,
        byte_offset: u64,
        base_vertex: i32,
    },
    Dispatch { groups: [u32; 3] },
    MemoryBarrier(MemoryBarrier),
}

/// Command list of the headless backend
#[derive(Debug, Default)]
pub struct HeadlessCommandList {
    commands: Vec<Command>,
}

impl HeadlessCommandList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }
}

/// Name of a headless backend object, or an error for foreign objects
fn name_of<T: 'static>(object: &dyn Any, name: impl Fn(&T) -> u32, kind: &str) -> Result<u32> {
    match object.downcast_ref::<T>() {
        Some(object) => Ok(name(object)),
        None => engine_bail!("nebula::HeadlessCommandList", "{} was not created by a headless renderer", kind),
    }
}

impl CommandList for HeadlessCommandList {
    fn set_face_culling(&mut self, culling: &FaceCulling) -> Result<()> {
        self.commands.push(Command::SetFaceCulling(*culling));
        Ok(())
    }

    fn set_color_mask(&mut self, attachment: u32, mask: ColorWriteMask) -> Result<()> {
        self.commands.push(Command::SetColorMask { attachment, mask });
        Ok(())
    }

    fn set_depth_state(&mut self, state: &DepthState) -> Result<()> {
        self.commands.push(Command::SetDepthState(*state));
        Ok(())
    }

    fn set_stencil_state(&mut self, state: &StencilState) -> Result<()> {
        self.commands.push(Command::SetStencilState(*state));
        Ok(())
    }

    fn set_blend_state(&mut self, state: &BlendState) -> Result<()> {
        self.commands.push(Command::SetBlendState(*state));
        Ok(())
    }

    fn bind_frame_buffer(&mut self, frame_buffer: &dyn FrameBuffer) -> Result<()> {
        let frame_buffer = name_of(frame_buffer.as_any(), HeadlessFrameBuffer::name, "FrameBuffer")?;
        self.commands.push(Command::BindFrameBuffer { frame_buffer });
        Ok(())
    }

    fn clear_color(&mut self, attachment: u32, value: ClearColor) -> Result<()> {
        self.commands.push(Command::ClearColor { attachment, value });
        Ok(())
    }

    fn clear_depth_stencil(&mut self, depth: Option<f32>, stencil: Option<i32>) -> Result<()> {
        self.commands.push(Command::ClearDepthStencil { depth, stencil });
        Ok(())
    }

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        self.commands.push(Command::SetViewport(viewport));
        Ok(())
    }

    fn use_program(&mut self, program: &dyn Program) -> Result<()> {
        let program = name_of(program.as_any(), HeadlessProgram::name, "Program")?;
        self.commands.push(Command::UseProgram { program });
        Ok(())
    }

    fn bind_vertex_array(&mut self, vertex_array: &dyn VertexArray) -> Result<()> {
        let vertex_array = name_of(vertex_array.as_any(), HeadlessVertexArray::name, "VertexArray")?;
        self.commands.push(Command::BindVertexArray { vertex_array });
        Ok(())
    }

    fn set_uniform(&mut self, location: i32, value: &UniformData) -> Result<()> {
        self.commands.push(Command::SetUniform { location, value: *value });
        Ok(())
    }

    fn bind_texture(&mut self, unit: u32, texture: &dyn Texture) -> Result<()> {
        let texture = name_of(texture.as_any(), HeadlessTexture::name, "Texture")?;
        self.commands.push(Command::BindTexture { unit, texture });
        Ok(())
    }

    fn bind_image(&mut self, unit: u32, texture: &dyn Texture, binding: &ImageBinding) -> Result<()> {
        let texture = name_of(texture.as_any(), HeadlessTexture::name, "Texture")?;
        self.commands.push(Command::BindImage { unit, texture, binding: *binding });
        Ok(())
    }

    fn bind_storage_buffer(&mut self, binding: u32, buffer: &dyn Buffer, offset: u64, size: u64) -> Result<()> {
        let buffer = name_of(buffer.as_any(), HeadlessBuffer::name, "Buffer")?;
        self.commands.push(Command::BindStorageBuffer { binding, buffer, offset, size });
        Ok(())
    }

    fn set_storage_block_binding(&mut self, program: &dyn Program, block_index: u32, binding: u32) -> Result<()> {
        let program = name_of(program.as_any(), HeadlessProgram::name, "Program")?;
        self.commands.push(Command::SetStorageBlockBinding { program, block_index, binding });
        Ok(())
    }

    fn draw_arrays(&mut self, primitive: PrimitiveType, first: u32, count: u32) -> Result<()> {
        self.commands.push(Command::DrawArrays { primitive, first, count });
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
        self.commands.push(Command::DrawElements { primitive, count, index_type, byte_offset, base_vertex });
        Ok(())
    }

    fn dispatch(&mut self, groups: [u32; 3]) -> Result<()> {
        self.commands.push(Command::Dispatch { groups });
        Ok(())
    }

    fn memory_barrier(&mut self, barrier: MemoryBarrier) -> Result<()> {
        self.commands.push(Command::MemoryBarrier(barrier));
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
