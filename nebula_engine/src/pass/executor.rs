/// Render and compute pass execution
///
/// A render pass walks the state machine
/// `Idle → PipelineStateApplied → FrameBufferCleared →
/// [VertexArrayBound → UniformsBound → Drawn]* → BarrierInserted → Idle`,
/// recording into one command list submitted at the end.

use std::sync::{Arc, MutexGuard, PoisonError};
use glam::Mat4;
use crate::context::{AttributeSemantic, Context, UniformSemantic};
use crate::error::{Error, Result};
use crate::pass::{Drawable, PassState, RenderQueueEntry};
use crate::program::{Program, ProgramKind};
use crate::renderer::{
    AttachmentPoint, CommandList, ImageBinding, MemoryBarrier, UniformData, Viewport,
};
use crate::resource::{FrameBuffer, PrimitiveSet, VertexArray};
use crate::state::{
    resolve_storage_block, resolve_uniform, MvpLayer, StateLayer, StateSet, UniformValue,
};
use crate::{engine_fail, engine_fatal, engine_trace, engine_warn};

/// Steps of a pass, logged at trace level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassPhase {
    Idle,
    PipelineStateApplied,
    FrameBufferCleared,
    VertexArrayBound,
    UniformsBound,
    Drawn,
    Dispatched,
    BarrierInserted,
}

struct PhaseTracker {
    phase: PassPhase,
}

impl PhaseTracker {
    fn new() -> Self {
        Self { phase: PassPhase::Idle }
    }

    fn advance(&mut self, next: PassPhase) {
        engine_trace!("nebula::Pass", "{:?} -> {:?}", self.phase, next);
        self.phase = next;
    }
}

/// Workgroup counts covering `invocations` with groups of `local_size`
///
/// `None` when any axis requests zero invocations: nothing is dispatched.
pub fn compute_workgroups(invocations: [u32; 3], local_size: [u32; 3]) -> Option<[u32; 3]> {
    if invocations.contains(&0) {
        return None;
    }
    Some(std::array::from_fn(|axis| invocations[axis].div_ceil(local_size[axis].max(1))))
}

impl Context {
    fn pass_state(&self) -> MutexGuard<'_, PassState> {
        self.pass.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn require_current(&self, what: &str) {
        if !self.is_current() {
            engine_fatal!("nebula::Pass", Error::NoCurrentContext(format!(
                "{} on context '{}' which is not current on this thread", what, self.label()
            )));
        }
    }

    // ===== QUEUE =====

    /// Drop every queued entry
    pub fn clear_queue(&self) {
        self.pass_state().queue.clear();
    }

    /// Queue a draw; entries are drawn in submission order
    pub fn add_entry(&self, transform: Mat4, program: Arc<Program>, drawable: Arc<Drawable>) {
        self.pass_state().queue.push(RenderQueueEntry { transform, program, drawable });
    }

    pub fn queue_len(&self) -> usize {
        self.pass_state().queue.len()
    }

    // ===== VIEWPORT =====

    /// Update the default viewport after the window surface changed size
    pub fn resize(&self, width: u32, height: u32) {
        self.pass_state().default_viewport = Viewport::new(width, height);
    }

    pub fn default_viewport(&self) -> Viewport {
        self.pass_state().default_viewport
    }

    // ===== RENDER =====

    /// Draw every queued entry into `target`
    ///
    /// `viewport` defaults to the default viewport for the window surface
    /// and to the attachment size for offscreen targets. `global` is the
    /// lowest-precedence state layer; its view and projection matrices (by
    /// semantic id) feed the derived transform layer.
    pub fn render(&self, target: &FrameBuffer, viewport: Option<Viewport>, global: &StateSet) -> Result<()> {
        self.require_current("render()");
        target.owner().check();

        let (entries, default_viewport, mut mvp) = {
            let state = self.pass_state();
            (state.queue.clone(), state.default_viewport, state.mvp.clone())
        };
        let viewport = viewport.unwrap_or_else(|| match target.size() {
            Some((width, height)) => Viewport::new(width, height),
            None => default_viewport,
        });
        refresh_camera(&mut mvp, global);

        let mut phases = PhaseTracker::new();
        let mut commands = self.renderer().create_command_list()?;

        // Pipeline state
        let pipeline = target.pipeline_state();
        commands.set_face_culling(&pipeline.culling)?;
        for index in color_attachments(target) {
            commands.set_color_mask(index as u32, pipeline.color_masks[index as usize])?;
        }
        commands.set_depth_state(&pipeline.depth)?;
        commands.set_stencil_state(&pipeline.stencil)?;
        commands.set_blend_state(&pipeline.blend)?;
        phases.advance(PassPhase::PipelineStateApplied);

        // Target
        commands.bind_frame_buffer(target.backend().as_ref())?;
        target.record_clear(&mut *commands)?;
        phases.advance(PassPhase::FrameBufferCleared);
        commands.set_viewport(viewport)?;

        for entry in &entries {
            let program = &entry.program;
            let vertex_array = &entry.drawable.vertex_array;
            program.owner().check();
            if program.kind() != ProgramKind::Render {
                engine_fatal!("nebula::Pass", Error::InvalidResource(
                    "a compute program was queued for rendering".to_string()
                ));
            }

            vertex_array.refresh_bindings()?;
            commands.use_program(program.backend().as_ref())?;
            commands.bind_vertex_array(vertex_array.backend().as_ref())?;
            check_attributes(program, vertex_array);
            phases.advance(PassPhase::VertexArrayBound);

            mvp.set_model(entry.transform);
            let layers: [&dyn StateLayer; 3] = [global, &mvp, &entry.drawable.state];
            bind_program_state(&mut *commands, program, &layers)?;
            phases.advance(PassPhase::UniformsBound);

            draw_primitive_sets(&mut *commands, vertex_array)?;
            phases.advance(PassPhase::Drawn);
        }

        commands.memory_barrier(MemoryBarrier::ALL)?;
        phases.advance(PassPhase::BarrierInserted);
        self.renderer().submit(commands)?;

        self.pass_state().mvp = mvp;
        phases.advance(PassPhase::Idle);
        Ok(())
    }

    // ===== COMPUTE =====

    /// Dispatch enough workgroups to cover `invocations`
    ///
    /// Only `global` is searched for uniform and storage block values. A
    /// request with a zero axis dispatches nothing and inserts no barrier.
    pub fn compute(&self, program: &Program, invocations: [u32; 3], global: &StateSet) -> Result<()> {
        self.require_current("compute()");
        program.owner().check();
        if program.kind() != ProgramKind::Compute {
            engine_fatal!("nebula::Pass", Error::InvalidResource(
                "compute() requires a compute program".to_string()
            ));
        }

        let local_size = program.local_size().unwrap_or([1, 1, 1]);
        let Some(groups) = compute_workgroups(invocations, local_size) else {
            engine_warn!(
                "nebula::Pass",
                "compute() with {:?} invocations dispatches nothing",
                invocations
            );
            return Ok(());
        };

        let mut phases = PhaseTracker::new();
        let mut commands = self.renderer().create_command_list()?;
        commands.use_program(program.backend().as_ref())?;
        let layers: [&dyn StateLayer; 1] = [global];
        bind_program_state(&mut *commands, program, &layers)?;
        phases.advance(PassPhase::UniformsBound);

        engine_trace!(
            "nebula::Pass",
            "Dispatching {:?} workgroups of {:?} for {:?} invocations",
            groups, local_size, invocations
        );
        commands.dispatch(groups)?;
        phases.advance(PassPhase::Dispatched);
        commands.memory_barrier(MemoryBarrier::ALL)?;
        phases.advance(PassPhase::BarrierInserted);
        self.renderer().submit(commands)?;
        phases.advance(PassPhase::Idle);
        Ok(())
    }
}

// ===== PASS STEPS =====

/// Feed the view and projection of the global layer into the transform layer
fn refresh_camera(mvp: &mut MvpLayer, global: &StateSet) {
    let matrix = |semantic| match global.semantic_uniform(semantic) {
        Some(UniformValue::Data(UniformData::Mat4(m))) => Some(Mat4::from_cols_array(m)),
        _ => None,
    };
    let view = matrix(UniformSemantic::ViewMatrix).unwrap_or(Mat4::IDENTITY);
    let projection = matrix(UniformSemantic::ProjectionMatrix).unwrap_or(Mat4::IDENTITY);
    if mvp.view() != view {
        mvp.set_view(view);
    }
    if mvp.projection() != projection {
        mvp.set_projection(projection);
    }
}

fn color_attachments(target: &FrameBuffer) -> Vec<u8> {
    if target.is_default() {
        return vec![0];
    }
    target
        .attachment_points()
        .into_iter()
        .filter_map(|point| match point {
            AttachmentPoint::Color(index) => Some(index),
            _ => None,
        })
        .collect()
}

/// Every program input must be declared by the vertex array with the same width
///
/// Inputs without a semantic are matched by location. Integer inputs take
/// unnormalized integer data only; float inputs take float or normalized data.
fn check_attributes(program: &Program, vertex_array: &VertexArray) {
    for input in program.attributes() {
        let semantic = input.semantic.or_else(|| AttributeSemantic::from_location(input.location));
        let Some(declared) = semantic.and_then(|semantic| vertex_array.attribute(semantic)) else {
            engine_fatal!("nebula::Pass", Error::VertexAttributeMismatch(format!(
                "program input '{}' (location {}) is not declared by the vertex array",
                input.name, input.location
            )));
        };
        if declared.components != input.components {
            engine_fatal!("nebula::Pass", Error::VertexAttributeMismatch(format!(
                "'{}' has {} components in the vertex array but the program reads {}",
                input.name, declared.components, input.components
            )));
        }
        if input.is_integer() != declared.is_integer() {
            engine_fatal!("nebula::Pass", Error::VertexAttributeMismatch(format!(
                "'{}' feeds {:?} data to {} input",
                input.name,
                declared.component_type,
                if input.is_integer() { "an integer" } else { "a float" }
            )));
        }
    }
}

/// Resolve and bind every uniform and storage block of `program`
///
/// Samplers and images take sequential units from 0; storage blocks take
/// sequential binding points from 0.
fn bind_program_state(commands: &mut dyn CommandList, program: &Program, layers: &[&dyn StateLayer]) -> Result<()> {
    let mut texture_unit = 0u32;
    let mut image_unit = 0u32;

    for uniform in program.uniforms() {
        let Some(value) = resolve_uniform(layers, uniform) else {
            if program.is_uniform_optional(&uniform.name) {
                engine_trace!("nebula::Pass", "Optional uniform '{}' left unset", uniform.name);
                continue;
            }
            engine_fatal!("nebula::Pass", Error::UniformUnresolved(uniform.name.clone()));
        };
        if !value.matches(uniform.uniform_type) {
            engine_fatal!("nebula::Pass", Error::UniformTypeMismatch {
                name: uniform.name.clone(),
                expected: uniform.uniform_type,
                found: value.describe(),
            });
        }

        match value {
            UniformValue::Data(data) => commands.set_uniform(uniform.location, &data)?,
            UniformValue::Texture(texture) => {
                texture.owner().check();
                commands.bind_texture(texture_unit, texture.backend().as_ref())?;
                commands.set_uniform(uniform.location, &UniformData::Int(texture_unit as i32))?;
                texture_unit += 1;
            }
            UniformValue::Image { texture, level, layer, access, format } => {
                texture.owner().check();
                let binding = ImageBinding { level, layer, access, format };
                commands.bind_image(image_unit, texture.backend().as_ref(), &binding)?;
                commands.set_uniform(uniform.location, &UniformData::Int(image_unit as i32))?;
                image_unit += 1;
            }
        }
    }

    for (binding, block) in program.storage_blocks().iter().enumerate() {
        let Some(storage) = resolve_storage_block(layers, block) else {
            if program.is_uniform_optional(&block.name) {
                engine_trace!("nebula::Pass", "Optional storage block '{}' left unbound", block.name);
                continue;
            }
            engine_fatal!("nebula::Pass", Error::UniformUnresolved(block.name.clone()));
        };
        storage.buffer.owner().check();
        let Some(size) = storage.resolved_size() else {
            engine_fail!("nebula::Pass", Error::InvalidArgument(format!(
                "storage block '{}' range {}+{:?} exceeds its buffer of {} bytes",
                block.name, storage.offset, storage.size, storage.buffer.size()
            )));
        };
        let binding = binding as u32;
        commands.bind_storage_buffer(binding, storage.buffer.backend().as_ref(), storage.offset, size)?;
        commands.set_storage_block_binding(program.backend().as_ref(), block.index, binding)?;
    }
    Ok(())
}

/// One draw per primitive set, in insertion order
fn draw_primitive_sets(commands: &mut dyn CommandList, vertex_array: &VertexArray) -> Result<()> {
    let has_index_buffer = vertex_array.index_buffer().is_some();
    for set in vertex_array.primitive_sets() {
        match set {
            PrimitiveSet::Arrays { primitive, first, count } => {
                commands.draw_arrays(primitive, first, count)?;
            }
            PrimitiveSet::Elements { primitive, count, index_type, byte_offset, base_vertex } => {
                if !has_index_buffer {
                    engine_fatal!("nebula::Pass", Error::NullResource(
                        "indexed primitive set drawn without an index buffer".to_string()
                    ));
                }
                commands.draw_elements(primitive, count, index_type, byte_offset, base_vertex)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
