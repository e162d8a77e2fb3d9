/// Framebuffers: attachments plus the pipeline state a pass applies before drawing
///
/// A framebuffer caches everything the pass executor applies to the target:
/// clear values, clear mask, face culling, color write masks, depth,
/// stencil and blend state.
///
/// The default framebuffer stands for the window surface. The windowing
/// layer owns that surface, so attach/detach and the clear-value setters
/// are ignored on it; it clears as if Color0 and DepthStencil were attached.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use crate::context::{Context, ResourceKind, ResourceOwner};
use crate::error::{Error, Result};
use crate::renderer::{
    AttachmentPoint, AttachmentSurface, BlendAttachmentState, BlendState, ClearColor, ClearMask,
    ColorWriteMask, CommandList, DepthState, FaceCulling, FrameBuffer as BackendFrameBuffer,
    PipelineState, PixelFormat, StencilState, TextureType, MAX_COLOR_ATTACHMENTS,
};
use crate::resource::{RenderBuffer, Texture};
use crate::{engine_error, engine_fail, engine_trace, engine_warn};

// ===== ATTACHMENTS =====

/// Surface attached to a framebuffer point
#[derive(Debug, Clone)]
pub enum Attachment {
    Texture {
        texture: Arc<Texture>,
        level: u32,
        /// Layer or face of layered textures; `None` attaches every layer
        layer: Option<u32>,
    },
    RenderBuffer(Arc<RenderBuffer>),
}

impl Attachment {
    pub fn format(&self) -> PixelFormat {
        match self {
            Attachment::Texture { texture, .. } => texture.format(),
            Attachment::RenderBuffer(render_buffer) => render_buffer.format(),
        }
    }

    /// Width and height of the attached surface
    pub fn extent(&self) -> (u32, u32) {
        match self {
            Attachment::Texture { texture, level, .. } => {
                let [width, height, _] = texture.desc().level_extent(*level);
                match texture.texture_type() {
                    TextureType::Texture1D | TextureType::Texture1DArray => (width, 1),
                    _ => (width, height),
                }
            }
            Attachment::RenderBuffer(render_buffer) => (render_buffer.desc().width, render_buffer.desc().height),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameBufferKind {
    Offscreen,
    Default,
}

struct FrameBufferState {
    attachments: BTreeMap<AttachmentPoint, Attachment>,
    clear_colors: [ClearColor; MAX_COLOR_ATTACHMENTS],
    clear_depth: f32,
    clear_stencil: i32,
    clear_mask: ClearMask,
    pipeline: PipelineState,
}

impl FrameBufferState {
    fn new() -> Self {
        Self {
            attachments: BTreeMap::new(),
            clear_colors: [ClearColor::default(); MAX_COLOR_ATTACHMENTS],
            clear_depth: 1.0,
            clear_stencil: 0,
            clear_mask: ClearMask::all(),
            pipeline: PipelineState::default(),
        }
    }
}

// ===== FRAME BUFFER =====

/// Render target of a pass
pub struct FrameBuffer {
    owner: ResourceOwner,
    kind: FrameBufferKind,
    backend: Arc<dyn BackendFrameBuffer>,
    state: RwLock<FrameBufferState>,
}

impl FrameBuffer {
    /// Create an offscreen framebuffer with no attachments
    pub fn new() -> Result<Arc<FrameBuffer>> {
        let (owner, context) = ResourceOwner::acquire(ResourceKind::FrameBuffer, "frame buffer".to_string());
        let backend = context.renderer().create_frame_buffer()?;
        Ok(Arc::new(FrameBuffer {
            owner,
            kind: FrameBufferKind::Offscreen,
            backend,
            state: RwLock::new(FrameBufferState::new()),
        }))
    }

    /// Window surface framebuffer of `context`
    pub(crate) fn new_default(context: &Arc<Context>) -> Arc<FrameBuffer> {
        Arc::new(FrameBuffer {
            owner: ResourceOwner::unregistered(context, ResourceKind::FrameBuffer),
            kind: FrameBufferKind::Default,
            backend: context.renderer().default_frame_buffer(),
            state: RwLock::new(FrameBufferState::new()),
        })
    }

    pub fn owner(&self) -> &ResourceOwner {
        &self.owner
    }

    pub fn is_default(&self) -> bool {
        self.owner.check();
        self.kind == FrameBufferKind::Default
    }

    pub fn backend(&self) -> &Arc<dyn BackendFrameBuffer> {
        self.owner.check();
        &self.backend
    }

    fn read_state(&self) -> RwLockReadGuard<'_, FrameBufferState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, FrameBufferState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Logs and returns true when called on the default framebuffer
    fn ignored_on_default(&self, operation: &str) -> bool {
        let is_default = self.kind == FrameBufferKind::Default;
        if is_default {
            engine_warn!("nebula::FrameBuffer", "{} ignored on the default framebuffer", operation);
        }
        is_default
    }

    // ===== ATTACHMENTS =====

    /// Attach a texture level (and optionally a single layer or face)
    pub fn attach_texture(&self, point: AttachmentPoint, texture: &Arc<Texture>, level: u32, layer: Option<u32>) -> Result<()> {
        self.owner.check();
        if self.ignored_on_default("attach_texture") {
            return Ok(());
        }
        texture.owner().check();

        if level >= texture.levels() {
            engine_fail!("nebula::FrameBuffer", Error::InvalidArgument(format!(
                "level {} out of range (texture has {})", level, texture.levels()
            )));
        }
        if let Some(layer) = layer {
            let desc = texture.desc();
            let layers = match desc.texture_type {
                TextureType::Texture1DArray => desc.height,
                TextureType::Texture3D => desc.level_extent(level)[2],
                TextureType::Cube | TextureType::Texture2DArray | TextureType::CubeArray => desc.depth,
                _ => 1,
            };
            if layer >= layers {
                engine_fail!("nebula::FrameBuffer", Error::InvalidArgument(format!(
                    "layer {} out of range ({} layers)", layer, layers
                )));
            }
        }

        let attachment = Attachment::Texture {
            texture: Arc::clone(texture),
            level,
            layer,
        };
        self.attach(point, attachment)
    }

    pub fn attach_render_buffer(&self, point: AttachmentPoint, render_buffer: &Arc<RenderBuffer>) -> Result<()> {
        self.owner.check();
        if self.ignored_on_default("attach_render_buffer") {
            return Ok(());
        }
        render_buffer.owner().check();
        self.attach(point, Attachment::RenderBuffer(Arc::clone(render_buffer)))
    }

    fn attach(&self, point: AttachmentPoint, attachment: Attachment) -> Result<()> {
        check_point_format(point, attachment.format())?;

        let mut state = self.write_state();
        let surface = match &attachment {
            Attachment::Texture { texture, level, layer } => AttachmentSurface::Texture {
                texture: texture.backend().as_ref(),
                level: *level,
                layer: *layer,
            },
            Attachment::RenderBuffer(render_buffer) => AttachmentSurface::RenderBuffer(render_buffer.backend().as_ref()),
        };
        self.backend.attach(point, Some(surface))?;
        state.attachments.insert(point, attachment);

        if matches!(point, AttachmentPoint::Color(_)) {
            self.backend.set_draw_buffers(&color_indices(&state.attachments))?;
        }
        engine_trace!("nebula::FrameBuffer", "Attached {:?}", point);
        Ok(())
    }

    /// Detach a point. Returns whether something was attached there.
    pub fn detach(&self, point: AttachmentPoint) -> Result<bool> {
        self.owner.check();
        if self.ignored_on_default("detach") {
            return Ok(false);
        }
        let mut state = self.write_state();
        if state.attachments.remove(&point).is_none() {
            return Ok(false);
        }
        self.backend.attach(point, None)?;
        if matches!(point, AttachmentPoint::Color(_)) {
            self.backend.set_draw_buffers(&color_indices(&state.attachments))?;
        }
        Ok(true)
    }

    pub fn attachment(&self, point: AttachmentPoint) -> Option<Attachment> {
        self.owner.check();
        self.read_state().attachments.get(&point).cloned()
    }

    pub fn attachment_points(&self) -> Vec<AttachmentPoint> {
        self.owner.check();
        self.read_state().attachments.keys().copied().collect()
    }

    /// Common extent of the attachments (the smallest one when they differ)
    ///
    /// `None` for the default framebuffer (sized by the window) and for
    /// framebuffers without attachments.
    pub fn size(&self) -> Option<(u32, u32)> {
        self.owner.check();
        if self.kind == FrameBufferKind::Default {
            return None;
        }
        self.read_state()
            .attachments
            .values()
            .map(Attachment::extent)
            .reduce(|(w0, h0), (w1, h1)| (w0.min(w1), h0.min(h1)))
    }

    // ===== CLEAR STATE =====

    pub fn set_clear_color(&self, index: u8, color: ClearColor) {
        self.owner.check();
        if self.ignored_on_default("set_clear_color") {
            return;
        }
        if let Some(slot) = self.write_state().clear_colors.get_mut(index as usize) {
            *slot = color;
        }
    }

    pub fn clear_color(&self, index: u8) -> Option<ClearColor> {
        self.owner.check();
        self.read_state().clear_colors.get(index as usize).copied()
    }

    pub fn set_clear_depth(&self, depth: f32) {
        self.owner.check();
        if !self.ignored_on_default("set_clear_depth") {
            self.write_state().clear_depth = depth;
        }
    }

    pub fn clear_depth(&self) -> f32 {
        self.owner.check();
        self.read_state().clear_depth
    }

    pub fn set_clear_stencil(&self, stencil: i32) {
        self.owner.check();
        if !self.ignored_on_default("set_clear_stencil") {
            self.write_state().clear_stencil = stencil;
        }
    }

    pub fn clear_stencil(&self) -> i32 {
        self.owner.check();
        self.read_state().clear_stencil
    }

    /// Attachments cleared by `clear()`
    pub fn set_clear_mask(&self, mask: ClearMask) {
        self.owner.check();
        if !self.ignored_on_default("set_clear_mask") {
            self.write_state().clear_mask = mask;
        }
    }

    pub fn clear_mask(&self) -> ClearMask {
        self.owner.check();
        self.read_state().clear_mask
    }

    // ===== PIPELINE STATE =====

    pub fn pipeline_state(&self) -> PipelineState {
        self.owner.check();
        self.read_state().pipeline
    }

    pub fn set_pipeline_state(&self, pipeline: PipelineState) {
        self.owner.check();
        self.write_state().pipeline = pipeline;
    }

    pub fn set_face_culling(&self, culling: FaceCulling) {
        self.owner.check();
        self.write_state().pipeline.culling = culling;
    }

    pub fn set_color_mask(&self, index: u8, mask: ColorWriteMask) {
        self.owner.check();
        if let Some(slot) = self.write_state().pipeline.color_masks.get_mut(index as usize) {
            *slot = mask;
        }
    }

    pub fn set_depth_state(&self, depth: DepthState) {
        self.owner.check();
        self.write_state().pipeline.depth = depth;
    }

    pub fn set_stencil_state(&self, stencil: StencilState) {
        self.owner.check();
        self.write_state().pipeline.stencil = stencil;
    }

    pub fn set_blend_state(&self, blend: BlendState) {
        self.owner.check();
        self.write_state().pipeline.blend = blend;
    }

    pub fn set_blend_enabled(&self, enabled: bool) {
        self.owner.check();
        self.write_state().pipeline.blend.enabled = enabled;
    }

    pub fn set_blend_attachment(&self, index: u8, attachment: BlendAttachmentState) {
        self.owner.check();
        if let Some(slot) = self.write_state().pipeline.blend.attachments.get_mut(index as usize) {
            *slot = attachment;
        }
    }

    pub fn set_blend_constant(&self, constant: [f32; 4]) {
        self.owner.check();
        self.write_state().pipeline.blend.constant = constant;
    }

    // ===== CLEARING =====

    /// Clear every attachment selected by the clear mask
    pub fn clear(&self) -> Result<()> {
        let context = self.owner.check();
        let renderer = context.renderer();
        let mut commands = renderer.create_command_list()?;
        commands.bind_frame_buffer(self.backend.as_ref())?;
        self.record_clear(commands.as_mut())?;
        renderer.submit(commands)
    }

    /// Record the clear operations into `commands` (this framebuffer must be bound)
    ///
    /// Depth and stencil are cleared in a single operation, so a combined
    /// DepthStencil attachment is cleared once whatever mask bits select it.
    pub(crate) fn record_clear(&self, commands: &mut dyn CommandList) -> Result<()> {
        self.owner.check();
        let state = self.read_state();
        let mask = state.clear_mask;

        let (colors, has_depth, has_stencil) = if self.is_default() {
            (vec![0], true, true)
        } else {
            let points = &state.attachments;
            let combined = points.contains_key(&AttachmentPoint::DepthStencil);
            (
                color_indices(points),
                combined || points.contains_key(&AttachmentPoint::Depth),
                combined || points.contains_key(&AttachmentPoint::Stencil),
            )
        };

        for index in colors {
            if mask.contains(ClearMask::color(index)) {
                commands.clear_color(index as u32, state.clear_colors[index as usize])?;
            }
        }

        let clear_depth = has_depth && mask.intersects(ClearMask::DEPTH | ClearMask::DEPTH_STENCIL);
        let clear_stencil = has_stencil && mask.intersects(ClearMask::STENCIL | ClearMask::DEPTH_STENCIL);
        if clear_depth || clear_stencil {
            commands.clear_depth_stencil(
                clear_depth.then_some(state.clear_depth),
                clear_stencil.then_some(state.clear_stencil),
            )?;
        }
        Ok(())
    }
}

impl Drop for FrameBuffer {
    fn drop(&mut self) {
        if self.kind == FrameBufferKind::Default {
            return;
        }
        if !self.owner.release() {
            engine_error!(
                "nebula::FrameBuffer",
                "FrameBuffer dropped without a compatible current context; GPU object is leaked"
            );
            std::mem::forget(Arc::clone(&self.backend));
        }
    }
}

impl std::fmt::Debug for FrameBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameBuffer")
            .field("owner", &self.owner)
            .field("default", &(self.kind == FrameBufferKind::Default))
            .field("attachments", &self.read_state().attachments.keys().collect::<Vec<_>>())
            .finish()
    }
}

// ===== HELPERS =====

fn color_indices(attachments: &BTreeMap<AttachmentPoint, Attachment>) -> Vec<u8> {
    attachments
        .keys()
        .filter_map(|point| match point {
            AttachmentPoint::Color(index) => Some(*index),
            _ => None,
        })
        .collect()
}

/// Check that `format` can back the attachment `point`
pub fn check_point_format(point: AttachmentPoint, format: PixelFormat) -> Result<()> {
    let valid = match point {
        AttachmentPoint::Color(index) => (index as usize) < MAX_COLOR_ATTACHMENTS && format.is_color(),
        AttachmentPoint::Depth => format.has_depth(),
        AttachmentPoint::Stencil => format.has_stencil(),
        AttachmentPoint::DepthStencil => format.has_depth() && format.has_stencil(),
    };
    if !valid {
        engine_fail!("nebula::FrameBuffer", Error::UnsupportedFormat(format!(
            "{:?} cannot be attached to {:?}", format, point
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "frame_buffer_tests.rs"]
mod tests;
