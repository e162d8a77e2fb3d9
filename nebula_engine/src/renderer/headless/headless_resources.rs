/// Headless buffers, textures, render buffers, vertex arrays and framebuffers

use std::any::Any;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use crate::error::{Error, Result};
use crate::renderer::headless::HeadlessState;
use crate::renderer::{
    AttachmentPoint, AttachmentSurface, Buffer, FrameBuffer, MapAccess, PixelTransfer,
    RenderBuffer, RenderBufferDesc, SamplerState, Texture, TextureDesc, TextureRegion,
    VertexArray, VertexAttributeFormat,
};
use crate::engine_bail;

// ============================================================================
// BUFFER
// ============================================================================

pub struct HeadlessBuffer {
    state: Arc<HeadlessState>,
    name: u32,
    data: Mutex<Box<[u8]>>,
    mapped: AtomicBool,
}

impl HeadlessBuffer {
    pub(crate) fn new(state: Arc<HeadlessState>, size: u64, initial: Option<&[u8]>) -> Self {
        let mut data = vec![0u8; size as usize].into_boxed_slice();
        if let Some(initial) = initial {
            data[..initial.len()].copy_from_slice(initial);
        }
        let name = state.allocate_name();
        Self {
            state,
            name,
            data: Mutex::new(data),
            mapped: AtomicBool::new(false),
        }
    }

    pub fn name(&self) -> u32 {
        self.name
    }

    /// Copy of the whole storage
    pub fn contents(&self) -> Vec<u8> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner).to_vec()
    }

    fn range(&self, offset: u64, len: u64) -> Result<std::ops::Range<usize>> {
        let size = self.size();
        match offset.checked_add(len) {
            Some(end) if end <= size => Ok(offset as usize..end as usize),
            _ => engine_bail!("nebula::HeadlessBuffer", "Range {}+{} outside buffer of {} bytes", offset, len, size),
        }
    }
}

impl Buffer for HeadlessBuffer {
    fn size(&self) -> u64 {
        self.data.lock().unwrap_or_else(PoisonError::into_inner).len() as u64
    }

    fn write(&self, offset: u64, data: &[u8]) -> Result<()> {
        if self.mapped.load(Ordering::Acquire) {
            engine_bail!("nebula::HeadlessBuffer", "Buffer {} is mapped", self.name);
        }
        let range = self.range(offset, data.len() as u64)?;
        self.data.lock().unwrap_or_else(PoisonError::into_inner)[range].copy_from_slice(data);
        Ok(())
    }

    fn read(&self, offset: u64, out: &mut [u8]) -> Result<()> {
        let range = self.range(offset, out.len() as u64)?;
        out.copy_from_slice(&self.data.lock().unwrap_or_else(PoisonError::into_inner)[range]);
        Ok(())
    }

    fn map(&self, _access: MapAccess, offset: u64, size: u64) -> Result<*mut u8> {
        let range = self.range(offset, size)?;
        if self.mapped.swap(true, Ordering::AcqRel) {
            engine_bail!("nebula::HeadlessBuffer", "Buffer {} is already mapped", self.name);
        }
        let mut data = self.data.lock().unwrap_or_else(PoisonError::into_inner);
        // The boxed slice never reallocates, so the pointer outlives the guard
        Ok(data[range].as_mut_ptr())
    }

    fn unmap(&self) {
        self.mapped.store(false, Ordering::Release);
    }

    fn copy_to(&self, dst: &dyn Buffer, src_offset: u64, dst_offset: u64, size: u64) -> Result<()> {
        let Some(dst) = dst.as_any().downcast_ref::<HeadlessBuffer>() else {
            engine_bail!("nebula::HeadlessBuffer", "Copy destination was not created by a headless renderer");
        };
        let src_range = self.range(src_offset, size)?;
        let dst_range = dst.range(dst_offset, size)?;

        if std::ptr::eq(self, dst) {
            let mut data = self.data.lock().unwrap_or_else(PoisonError::into_inner);
            data.copy_within(src_range, dst_range.start);
        } else {
            let src = self.data.lock().unwrap_or_else(PoisonError::into_inner);
            let mut target = dst.data.lock().unwrap_or_else(PoisonError::into_inner);
            target[dst_range].copy_from_slice(&src[src_range]);
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for HeadlessBuffer {
    fn drop(&mut self) {
        self.state.release_name(self.name);
    }
}

// ============================================================================
// TEXTURE
// ============================================================================

pub struct HeadlessTexture {
    state: Arc<HeadlessState>,
    name: u32,
    desc: TextureDesc,
    levels: Mutex<Vec<Vec<u8>>>,
    sampler: Mutex<Option<SamplerState>>,
}

impl HeadlessTexture {
    pub(crate) fn new(state: Arc<HeadlessState>, desc: TextureDesc) -> Self {
        let bytes_per_pixel = desc.format.bytes_per_pixel() as usize;
        let levels = (0..desc.levels)
            .map(|level| {
                let [w, h, d] = desc.level_extent(level);
                vec![0u8; w as usize * h as usize * d as usize * bytes_per_pixel]
            })
            .collect();
        let name = state.allocate_name();
        Self {
            state,
            name,
            desc,
            levels: Mutex::new(levels),
            sampler: Mutex::new(None),
        }
    }

    pub fn name(&self) -> u32 {
        self.name
    }

    /// Last sampler state applied
    pub fn sampler(&self) -> Option<SamplerState> {
        *self.sampler.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn texel_index(extent: [u32; 3], x: u32, y: u32, z: u32) -> usize {
        ((z as usize * extent[1] as usize) + y as usize) * extent[0] as usize + x as usize
    }
}

impl Texture for HeadlessTexture {
    fn desc(&self) -> &TextureDesc {
        &self.desc
    }

    fn upload(&self, level: u32, region: &TextureRegion, transfer: &PixelTransfer, data: &[u8]) -> Result<()> {
        let bytes_per_pixel = self.desc.format.bytes_per_pixel();
        if transfer.bytes_per_pixel() != bytes_per_pixel {
            return Err(Error::UnsupportedFormat(format!(
                "{} bytes per pixel cannot be stored as {:?} ({} bytes) without conversion",
                transfer.bytes_per_pixel(), self.desc.format, bytes_per_pixel
            )));
        }
        if data.len() as u64 != region.texel_count() * bytes_per_pixel as u64 {
            engine_bail!("nebula::HeadlessTexture", "Upload of {} bytes does not match region {:?}", data.len(), region.size);
        }

        let extent = self.desc.level_extent(level);
        let mut levels = self.levels.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(target) = levels.get_mut(level as usize) else {
            engine_bail!("nebula::HeadlessTexture", "Level {} out of range", level);
        };

        let bpp = bytes_per_pixel as usize;
        let row = region.size[0] as usize * bpp;
        let [ox, oy, oz] = region.offset;
        for z in 0..region.size[2] {
            for y in 0..region.size[1] {
                let src = ((z * region.size[1] + y) as usize) * row;
                let dst = Self::texel_index(extent, ox, oy + y, oz + z) * bpp;
                target[dst..dst + row].copy_from_slice(&data[src..src + row]);
            }
        }
        Ok(())
    }

    fn read_level(&self, level: u32) -> Result<Vec<u8>> {
        let levels = self.levels.lock().unwrap_or_else(PoisonError::into_inner);
        match levels.get(level as usize) {
            Some(data) => Ok(data.clone()),
            None => engine_bail!("nebula::HeadlessTexture", "Level {} out of range", level),
        }
    }

    fn copy_level_to(&self, dst: &dyn Texture, level: u32) -> Result<()> {
        let Some(dst) = dst.as_any().downcast_ref::<HeadlessTexture>() else {
            engine_bail!("nebula::HeadlessTexture", "Copy destination was not created by a headless renderer");
        };
        if dst.desc.format != self.desc.format || dst.desc.level_extent(level) != self.desc.level_extent(level) {
            engine_bail!("nebula::HeadlessTexture", "Copy destination differs in format or extent");
        }
        let data = self.read_level(level)?;
        let mut levels = dst.levels.lock().unwrap_or_else(PoisonError::into_inner);
        match levels.get_mut(level as usize) {
            Some(target) => {
                target.copy_from_slice(&data);
                Ok(())
            }
            None => engine_bail!("nebula::HeadlessTexture", "Level {} out of range", level),
        }
    }

    /// Point-sampled downscale of each level from the previous one
    fn generate_mipmaps(&self) -> Result<()> {
        let bpp = self.desc.format.bytes_per_pixel() as usize;
        let layered = self.desc.texture_type.is_array() || self.desc.texture_type.is_cube();
        let mut levels = self.levels.lock().unwrap_or_else(PoisonError::into_inner);

        for level in 1..levels.len() {
            let src_extent = self.desc.level_extent(level as u32 - 1);
            let dst_extent = self.desc.level_extent(level as u32);
            let (before, after) = levels.split_at_mut(level);
            let src = &before[level - 1];
            let dst = &mut after[0];

            for z in 0..dst_extent[2] {
                let sz = if layered { z } else { (z * 2).min(src_extent[2] - 1) };
                for y in 0..dst_extent[1] {
                    let sy = (y * 2).min(src_extent[1] - 1);
                    for x in 0..dst_extent[0] {
                        let sx = (x * 2).min(src_extent[0] - 1);
                        let s = Self::texel_index(src_extent, sx, sy, sz) * bpp;
                        let d = Self::texel_index(dst_extent, x, y, z) * bpp;
                        dst[d..d + bpp].copy_from_slice(&src[s..s + bpp]);
                    }
                }
            }
        }
        Ok(())
    }

    fn apply_sampler(&self, sampler: &SamplerState) -> Result<()> {
        *self.sampler.lock().unwrap_or_else(PoisonError::into_inner) = Some(*sampler);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for HeadlessTexture {
    fn drop(&mut self) {
        self.state.release_name(self.name);
    }
}

// ============================================================================
// RENDER BUFFER
// ============================================================================

pub struct HeadlessRenderBuffer {
    state: Arc<HeadlessState>,
    name: u32,
    desc: RenderBufferDesc,
}

impl HeadlessRenderBuffer {
    pub(crate) fn new(state: Arc<HeadlessState>, desc: RenderBufferDesc) -> Self {
        let name = state.allocate_name();
        Self { state, name, desc }
    }

    pub fn name(&self) -> u32 {
        self.name
    }
}

impl RenderBuffer for HeadlessRenderBuffer {
    fn desc(&self) -> &RenderBufferDesc {
        &self.desc
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for HeadlessRenderBuffer {
    fn drop(&mut self) {
        self.state.release_name(self.name);
    }
}

// ============================================================================
// VERTEX ARRAY
// ============================================================================

/// Vertex buffer binding as seen by the backend: (buffer name, offset, stride)
pub type HeadlessBinding = (u32, u64, u32);

pub struct HeadlessVertexArray {
    state: Arc<HeadlessState>,
    name: u32,
    bindings: Mutex<BTreeMap<u32, HeadlessBinding>>,
    attributes: Mutex<BTreeMap<u32, VertexAttributeFormat>>,
    index_buffer: Mutex<Option<u32>>,
}

impl HeadlessVertexArray {
    pub(crate) fn new(state: Arc<HeadlessState>) -> Self {
        let name = state.allocate_name();
        Self {
            state,
            name,
            bindings: Mutex::new(BTreeMap::new()),
            attributes: Mutex::new(BTreeMap::new()),
            index_buffer: Mutex::new(None),
        }
    }

    pub fn name(&self) -> u32 {
        self.name
    }

    pub fn bindings(&self) -> BTreeMap<u32, HeadlessBinding> {
        self.bindings.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Enabled attribute locations with their formats
    pub fn attributes(&self) -> BTreeMap<u32, VertexAttributeFormat> {
        self.attributes.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn index_buffer(&self) -> Option<u32> {
        *self.index_buffer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn buffer_name(buffer: &dyn Buffer) -> Result<u32> {
    match buffer.as_any().downcast_ref::<HeadlessBuffer>() {
        Some(buffer) => Ok(buffer.name()),
        None => engine_bail!("nebula::HeadlessVertexArray", "Buffer was not created by a headless renderer"),
    }
}

impl VertexArray for HeadlessVertexArray {
    fn set_vertex_buffer(&self, binding: u32, buffer: Option<(&dyn Buffer, u64, u32)>) -> Result<()> {
        let mut bindings = self.bindings.lock().unwrap_or_else(PoisonError::into_inner);
        match buffer {
            Some((buffer, offset, stride)) => {
                bindings.insert(binding, (buffer_name(buffer)?, offset, stride));
            }
            None => {
                bindings.remove(&binding);
            }
        }
        Ok(())
    }

    fn set_attribute(&self, location: u32, format: Option<&VertexAttributeFormat>) -> Result<()> {
        let mut attributes = self.attributes.lock().unwrap_or_else(PoisonError::into_inner);
        match format {
            Some(format) => {
                attributes.insert(location, *format);
            }
            None => {
                attributes.remove(&location);
            }
        }
        Ok(())
    }

    fn set_index_buffer(&self, buffer: Option<&dyn Buffer>) -> Result<()> {
        let name = buffer.map(buffer_name).transpose()?;
        *self.index_buffer.lock().unwrap_or_else(PoisonError::into_inner) = name;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for HeadlessVertexArray {
    fn drop(&mut self) {
        self.state.release_name(self.name);
    }
}

// ============================================================================
// FRAME BUFFER
// ============================================================================

/// Attached surface as seen by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadlessSurface {
    Texture { texture: u32, level: u32, layer: Option<u32> },
    RenderBuffer(u32),
}

pub struct HeadlessFrameBuffer {
    state: Arc<HeadlessState>,
    name: u32,
    attachments: Mutex<BTreeMap<AttachmentPoint, HeadlessSurface>>,
    draw_buffers: Mutex<Vec<u8>>,
}

impl HeadlessFrameBuffer {
    pub(crate) fn new(state: Arc<HeadlessState>) -> Self {
        let name = state.allocate_name();
        Self {
            state,
            name,
            attachments: Mutex::new(BTreeMap::new()),
            draw_buffers: Mutex::new(Vec::new()),
        }
    }

    /// The window surface, name 0
    pub(crate) fn new_default(state: Arc<HeadlessState>) -> Self {
        Self {
            state,
            name: 0,
            attachments: Mutex::new(BTreeMap::new()),
            draw_buffers: Mutex::new(vec![0]),
        }
    }

    pub fn name(&self) -> u32 {
        self.name
    }

    pub fn attachments(&self) -> BTreeMap<AttachmentPoint, HeadlessSurface> {
        self.attachments.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn draw_buffers(&self) -> Vec<u8> {
        self.draw_buffers.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl FrameBuffer for HeadlessFrameBuffer {
    fn is_default(&self) -> bool {
        self.name == 0
    }

    fn attach(&self, point: AttachmentPoint, surface: Option<AttachmentSurface<'_>>) -> Result<()> {
        if self.is_default() {
            engine_bail!("nebula::HeadlessFrameBuffer", "The default framebuffer accepts no attachments");
        }
        let surface = match surface {
            Some(AttachmentSurface::Texture { texture, level, layer }) => {
                match texture.as_any().downcast_ref::<HeadlessTexture>() {
                    Some(texture) => Some(HeadlessSurface::Texture { texture: texture.name(), level, layer }),
                    None => engine_bail!("nebula::HeadlessFrameBuffer", "Texture was not created by a headless renderer"),
                }
            }
            Some(AttachmentSurface::RenderBuffer(render_buffer)) => {
                match render_buffer.as_any().downcast_ref::<HeadlessRenderBuffer>() {
                    Some(render_buffer) => Some(HeadlessSurface::RenderBuffer(render_buffer.name())),
                    None => engine_bail!("nebula::HeadlessFrameBuffer", "RenderBuffer was not created by a headless renderer"),
                }
            }
            None => None,
        };

        let mut attachments = self.attachments.lock().unwrap_or_else(PoisonError::into_inner);
        match surface {
            Some(surface) => attachments.insert(point, surface),
            None => attachments.remove(&point),
        };
        Ok(())
    }

    fn set_draw_buffers(&self, colors: &[u8]) -> Result<()> {
        *self.draw_buffers.lock().unwrap_or_else(PoisonError::into_inner) = colors.to_vec();
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for HeadlessFrameBuffer {
    fn drop(&mut self) {
        if self.name != 0 {
            self.state.release_name(self.name);
        }
    }
}
