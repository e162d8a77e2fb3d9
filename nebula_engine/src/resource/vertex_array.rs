//! Vertex arrays: binding slots, semantic attribute declarations, index
//! buffer and primitive sets.
//!
//! # Layout
//!
//! ```text
//! VertexArray
//! ├── bindings[0..max_vertex_bindings]  (Buffer, offset, stride) or empty
//! ├── attributes   AttributeSemantic → (binding, components, type, relative offset)
//! ├── index buffer (optional)
//! └── primitive sets (DrawArrays / DrawElements)
//! ```
//!
//! An attribute is enabled at its semantic's fixed location, the same
//! location render programs bind the semantic's names to before linking.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};
use crate::context::{AttributeSemantic, ResourceKind, ResourceOwner};
use crate::error::{Error, Result};
use crate::renderer::{
    ComponentType, IndexType, PrimitiveType, VertexArray as BackendVertexArray, VertexAttributeFormat,
};
use crate::resource::{Buffer, MeshData};
use crate::{engine_error, engine_fail, engine_trace};

// ============================================================================
// DECLARATIONS
// ============================================================================

/// One declared vertex attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    /// Binding slot the attribute reads from
    pub binding: u32,
    pub components: u8,
    pub component_type: ComponentType,
    /// Integer data is normalized to [0, 1] / [-1, 1]
    pub normalized: bool,
    /// Byte offset inside one vertex of the binding
    pub relative_offset: u32,
}

impl VertexAttribute {
    /// Tightly packed float attribute at offset 0
    pub fn float(binding: u32, components: u8) -> Self {
        Self {
            binding,
            components,
            component_type: ComponentType::Float,
            normalized: false,
            relative_offset: 0,
        }
    }

    /// Whether shaders receive the data as unconverted integers
    pub fn is_integer(&self) -> bool {
        self.component_type.is_integer() && !self.normalized
    }

    fn backend_format(&self) -> VertexAttributeFormat {
        VertexAttributeFormat {
            binding: self.binding,
            components: self.components,
            component_type: self.component_type,
            normalized: self.normalized,
            integer: self.is_integer(),
            relative_offset: self.relative_offset,
        }
    }
}

/// A vertex buffer bound to a slot
#[derive(Clone)]
pub struct VertexBinding {
    pub buffer: Arc<Buffer>,
    pub offset: u64,
    pub stride: u32,
    /// Buffer generation the backend binding was made against
    generation: u64,
}

impl VertexBinding {
    fn same_as(&self, buffer: &Arc<Buffer>, offset: u64, stride: u32) -> bool {
        Arc::ptr_eq(&self.buffer, buffer) && self.offset == offset && self.stride == stride
    }
}

impl std::fmt::Debug for VertexBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VertexBinding")
            .field("offset", &self.offset)
            .field("stride", &self.stride)
            .finish()
    }
}

/// Which vertices or indices to draw and how
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveSet {
    Arrays {
        primitive: PrimitiveType,
        first: u32,
        count: u32,
    },
    Elements {
        primitive: PrimitiveType,
        count: u32,
        index_type: IndexType,
        /// Offset of the first index in the index buffer
        byte_offset: u64,
        base_vertex: i32,
    },
}

impl PrimitiveSet {
    pub fn primitive(&self) -> PrimitiveType {
        match self {
            PrimitiveSet::Arrays { primitive, .. } | PrimitiveSet::Elements { primitive, .. } => *primitive,
        }
    }

    /// Number of vertices (or indices) one draw of this set submits
    pub fn count(&self) -> u32 {
        match self {
            PrimitiveSet::Arrays { count, .. } | PrimitiveSet::Elements { count, .. } => *count,
        }
    }

    pub fn is_indexed(&self) -> bool {
        matches!(self, PrimitiveSet::Elements { .. })
    }
}

/// How `VertexArray::from_mesh` lays out attribute data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshLayout {
    /// All attributes interleaved in one buffer
    Interleaved,
    /// One buffer per attribute
    Separate,
}

// ============================================================================
// VERTEX ARRAY
// ============================================================================

struct VertexArrayState {
    bindings: Vec<Option<VertexBinding>>,
    attributes: BTreeMap<AttributeSemantic, VertexAttribute>,
    index_buffer: Option<(Arc<Buffer>, u64)>,
    primitive_sets: Vec<PrimitiveSet>,
}

/// Vertex input configuration of a draw
pub struct VertexArray {
    owner: ResourceOwner,
    backend: Arc<dyn BackendVertexArray>,
    state: RwLock<VertexArrayState>,
}

impl VertexArray {
    /// Create an empty vertex array. Fatal if no context is current.
    pub fn new() -> Result<Arc<VertexArray>> {
        let (owner, context) = ResourceOwner::acquire(ResourceKind::VertexArray, "vertex array".to_string());
        let backend = context.renderer().create_vertex_array()?;
        let slots = context.config().max_vertex_bindings as usize;

        Ok(Arc::new(VertexArray {
            owner,
            backend,
            state: RwLock::new(VertexArrayState {
                bindings: vec![None; slots],
                attributes: BTreeMap::new(),
                index_buffer: None,
                primitive_sets: Vec::new(),
            }),
        }))
    }

    pub fn owner(&self) -> &ResourceOwner {
        &self.owner
    }

    /// Backend vertex array object
    pub fn backend(&self) -> &Arc<dyn BackendVertexArray> {
        self.owner.check();
        &self.backend
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, VertexArrayState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, VertexArrayState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    // ===== BINDINGS =====

    /// Bind `buffer` to a slot and return the slot index
    ///
    /// An existing binding of the same buffer with the same offset and stride
    /// is reused; otherwise the first free slot is taken.
    pub fn attach_vertex_buffer(&self, buffer: &Arc<Buffer>, offset: u64, stride: u32) -> Result<u32> {
        self.owner.check();
        buffer.owner().check();
        let mut state = self.write_state();

        if let Some(slot) = state
            .bindings
            .iter()
            .position(|b| b.as_ref().is_some_and(|b| b.same_as(buffer, offset, stride)))
        {
            return Ok(slot as u32);
        }

        let Some(slot) = state.bindings.iter().position(Option::is_none) else {
            engine_fail!("nebula::VertexArray", Error::InvalidArgument(format!(
                "all {} vertex binding slots are in use", state.bindings.len()
            )));
        };

        self.backend
            .set_vertex_buffer(slot as u32, Some((buffer.backend().as_ref(), offset, stride)))?;
        state.bindings[slot] = Some(VertexBinding {
            buffer: Arc::clone(buffer),
            offset,
            stride,
            generation: buffer.generation(),
        });
        engine_trace!("nebula::VertexArray", "Attached vertex buffer to slot {} (offset {}, stride {})", slot, offset, stride);
        Ok(slot as u32)
    }

    /// Clear a binding slot and every attribute declared on it
    ///
    /// Returns the removed attribute semantics.
    pub fn detach_vertex_buffer(&self, slot: u32) -> Result<Vec<AttributeSemantic>> {
        self.owner.check();
        let mut state = self.write_state();
        if slot as usize >= state.bindings.len() {
            engine_fail!("nebula::VertexArray", Error::InvalidArgument(format!(
                "binding slot {} out of range (0..{})", slot, state.bindings.len()
            )));
        }

        let removed: Vec<AttributeSemantic> = state
            .attributes
            .iter()
            .filter(|(_, attribute)| attribute.binding == slot)
            .map(|(semantic, _)| *semantic)
            .collect();
        for semantic in &removed {
            self.backend.set_attribute(semantic.location(), None)?;
            state.attributes.remove(semantic);
        }

        if state.bindings[slot as usize].take().is_some() {
            self.backend.set_vertex_buffer(slot, None)?;
        }
        Ok(removed)
    }

    /// Number of binding slots
    pub fn binding_count(&self) -> u32 {
        self.owner.check();
        self.read_state().bindings.len() as u32
    }

    /// Binding of a slot
    pub fn binding(&self, slot: u32) -> Option<VertexBinding> {
        self.owner.check();
        self.read_state().bindings.get(slot as usize).cloned().flatten()
    }

    // ===== ATTRIBUTES =====

    /// Declare (or redeclare) the attribute of `semantic`
    pub fn declare_attribute(&self, semantic: AttributeSemantic, attribute: VertexAttribute) -> Result<()> {
        self.owner.check();
        if !(1..=4).contains(&attribute.components) {
            engine_fail!("nebula::VertexArray", Error::InvalidArgument(format!(
                "{:?} has {} components", semantic, attribute.components
            )));
        }
        let mut state = self.write_state();
        if state.bindings.get(attribute.binding as usize).and_then(Option::as_ref).is_none() {
            engine_fail!("nebula::VertexArray", Error::InvalidArgument(format!(
                "{:?} references empty binding slot {}", semantic, attribute.binding
            )));
        }
        self.backend.set_attribute(semantic.location(), Some(&attribute.backend_format()))?;
        state.attributes.insert(semantic, attribute);
        Ok(())
    }

    /// Remove the attribute of `semantic`. Returns whether it was declared.
    pub fn undeclare_attribute(&self, semantic: AttributeSemantic) -> Result<bool> {
        self.owner.check();
        let mut state = self.write_state();
        if state.attributes.remove(&semantic).is_none() {
            return Ok(false);
        }
        self.backend.set_attribute(semantic.location(), None)?;
        Ok(true)
    }

    pub fn attribute(&self, semantic: AttributeSemantic) -> Option<VertexAttribute> {
        self.owner.check();
        self.read_state().attributes.get(&semantic).copied()
    }

    /// Every declared attribute, ordered by semantic
    pub fn attributes(&self) -> Vec<(AttributeSemantic, VertexAttribute)> {
        self.owner.check();
        self.read_state().attributes.iter().map(|(s, a)| (*s, *a)).collect()
    }

    // ===== INDEX BUFFER =====

    pub fn attach_index_buffer(&self, buffer: &Arc<Buffer>) -> Result<()> {
        self.owner.check();
        buffer.owner().check();
        let mut state = self.write_state();
        self.backend.set_index_buffer(Some(buffer.backend().as_ref()))?;
        state.index_buffer = Some((Arc::clone(buffer), buffer.generation()));
        Ok(())
    }

    pub fn detach_index_buffer(&self) -> Result<Option<Arc<Buffer>>> {
        self.owner.check();
        let mut state = self.write_state();
        match state.index_buffer.take() {
            Some((buffer, _)) => {
                self.backend.set_index_buffer(None)?;
                Ok(Some(buffer))
            }
            None => Ok(None),
        }
    }

    pub fn index_buffer(&self) -> Option<Arc<Buffer>> {
        self.owner.check();
        self.read_state().index_buffer.as_ref().map(|(buffer, _)| Arc::clone(buffer))
    }

    // ===== PRIMITIVE SETS =====

    /// Append a primitive set and return its index
    pub fn add_primitive_set(&self, set: PrimitiveSet) -> usize {
        self.owner.check();
        let mut state = self.write_state();
        state.primitive_sets.push(set);
        state.primitive_sets.len() - 1
    }

    /// Remove the primitive set at `index`
    pub fn remove_primitive_set(&self, index: usize) -> Option<PrimitiveSet> {
        self.owner.check();
        let mut state = self.write_state();
        if index < state.primitive_sets.len() {
            Some(state.primitive_sets.remove(index))
        } else {
            None
        }
    }

    pub fn primitive_sets(&self) -> Vec<PrimitiveSet> {
        self.owner.check();
        self.read_state().primitive_sets.clone()
    }

    // ===== DRAW SUPPORT =====

    /// Rebind every buffer whose storage was reallocated since it was attached
    ///
    /// Returns the number of rebound buffers.
    pub fn refresh_bindings(&self) -> Result<u32> {
        self.owner.check();
        let mut state = self.write_state();
        let mut rebound = 0;

        for (slot, binding) in state.bindings.iter_mut().enumerate() {
            let Some(binding) = binding else { continue };
            let generation = binding.buffer.generation();
            if generation != binding.generation {
                self.backend.set_vertex_buffer(
                    slot as u32,
                    Some((binding.buffer.backend().as_ref(), binding.offset, binding.stride)),
                )?;
                binding.generation = generation;
                rebound += 1;
            }
        }

        if let Some((buffer, seen)) = state.index_buffer.as_mut() {
            let generation = buffer.generation();
            if generation != *seen {
                self.backend.set_index_buffer(Some(buffer.backend().as_ref()))?;
                *seen = generation;
                rebound += 1;
            }
        }
        Ok(rebound)
    }

    // ===== MESH CONVERSION =====

    /// Build a vertex array with its buffers from CPU-side mesh data
    ///
    /// Index data of every indexed primitive is concatenated into one index
    /// buffer; each primitive set records its byte offset into it.
    pub fn from_mesh(mesh: &MeshData, layout: MeshLayout) -> Result<Arc<VertexArray>> {
        mesh.validate()?;
        let vertex_array = VertexArray::new()?;

        match layout {
            MeshLayout::Interleaved if !mesh.attributes.is_empty() => {
                let (offsets, stride) = interleaved_layout(mesh);
                let mut data = vec![0u8; stride as usize * mesh.vertex_count as usize];
                for (attribute, &offset) in mesh.attributes.iter().zip(&offsets) {
                    let size = attribute.element_size() as usize;
                    for (v, element) in attribute.data.chunks_exact(size).enumerate() {
                        let start = v * stride as usize + offset as usize;
                        data[start..start + size].copy_from_slice(element);
                    }
                }
                let buffer = Buffer::from_data(&data)?;
                let binding = vertex_array.attach_vertex_buffer(&buffer, 0, stride)?;
                for (attribute, &offset) in mesh.attributes.iter().zip(&offsets) {
                    vertex_array.declare_attribute(attribute.semantic, VertexAttribute {
                        binding,
                        components: attribute.components,
                        component_type: attribute.component_type,
                        normalized: attribute.normalized,
                        relative_offset: offset,
                    })?;
                }
            }
            MeshLayout::Interleaved => {}
            MeshLayout::Separate => {
                for attribute in &mesh.attributes {
                    let buffer = Buffer::from_data(&attribute.data)?;
                    let binding = vertex_array.attach_vertex_buffer(&buffer, 0, attribute.element_size())?;
                    vertex_array.declare_attribute(attribute.semantic, VertexAttribute {
                        binding,
                        components: attribute.components,
                        component_type: attribute.component_type,
                        normalized: attribute.normalized,
                        relative_offset: 0,
                    })?;
                }
            }
        }

        let (indices, offsets) = concatenate_indices(mesh);
        if !indices.is_empty() {
            let buffer = Buffer::from_data(&indices)?;
            vertex_array.attach_index_buffer(&buffer)?;
        }
        for (primitive, byte_offset) in mesh.primitives.iter().zip(offsets) {
            let set = match (&primitive.indices, byte_offset) {
                (Some(indices), Some(byte_offset)) => PrimitiveSet::Elements {
                    primitive: primitive.primitive,
                    count: indices.len() as u32,
                    index_type: indices.index_type(),
                    byte_offset,
                    base_vertex: primitive.base_vertex,
                },
                _ => PrimitiveSet::Arrays {
                    primitive: primitive.primitive,
                    first: primitive.first,
                    count: primitive.count,
                },
            };
            vertex_array.add_primitive_set(set);
        }

        engine_trace!(
            "nebula::VertexArray",
            "Built vertex array from mesh: {} vertices, {} attributes, {} primitive sets",
            mesh.vertex_count, mesh.attributes.len(), mesh.primitives.len()
        );
        Ok(vertex_array)
    }
}

impl Drop for VertexArray {
    fn drop(&mut self) {
        if !self.owner.release() {
            engine_error!(
                "nebula::VertexArray",
                "VertexArray dropped without a compatible current context; GPU object is leaked"
            );
            std::mem::forget(Arc::clone(&self.backend));
        }
    }
}

impl std::fmt::Debug for VertexArray {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.read_state();
        f.debug_struct("VertexArray")
            .field("owner", &self.owner)
            .field("attributes", &state.attributes)
            .field("primitive_sets", &state.primitive_sets)
            .finish()
    }
}

// ============================================================================
// LAYOUT HELPERS
// ============================================================================

fn align_up(value: u64, alignment: u64) -> u64 {
    value.div_ceil(alignment) * alignment
}

/// Relative offsets of each mesh attribute and the combined stride,
/// every element aligned to 4 bytes
pub fn interleaved_layout(mesh: &MeshData) -> (Vec<u32>, u32) {
    let mut offsets = Vec::with_capacity(mesh.attributes.len());
    let mut cursor = 0u64;
    for attribute in &mesh.attributes {
        cursor = align_up(cursor, 4);
        offsets.push(cursor as u32);
        cursor += attribute.element_size() as u64;
    }
    (offsets, align_up(cursor, 4) as u32)
}

/// Index bytes of every indexed primitive, each range aligned to its index size,
/// with the byte offset of each primitive (`None` for non-indexed ones)
pub fn concatenate_indices(mesh: &MeshData) -> (Vec<u8>, Vec<Option<u64>>) {
    let mut bytes = Vec::new();
    let mut offsets = Vec::with_capacity(mesh.primitives.len());
    for primitive in &mesh.primitives {
        match &primitive.indices {
            Some(indices) => {
                let alignment = indices.index_type().size_bytes() as u64;
                let start = align_up(bytes.len() as u64, alignment);
                bytes.resize(start as usize, 0);
                bytes.extend_from_slice(indices.as_bytes());
                offsets.push(Some(start));
            }
            None => offsets.push(None),
        }
    }
    (bytes, offsets)
}

#[cfg(test)]
#[path = "vertex_array_tests.rs"]
mod tests;
