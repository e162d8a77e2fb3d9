/// CPU-side mesh data consumed by `VertexArray::from_mesh`

use crate::context::AttributeSemantic;
use crate::error::{Error, Result};
use crate::renderer::{ComponentType, IndexType, PrimitiveType};

/// One per-vertex attribute stream
#[derive(Debug, Clone, PartialEq)]
pub struct MeshAttribute {
    pub semantic: AttributeSemantic,
    pub components: u8,
    pub component_type: ComponentType,
    pub normalized: bool,
    /// Tightly packed elements, one per vertex
    pub data: Vec<u8>,
}

impl MeshAttribute {
    /// Size of one element in bytes
    pub fn element_size(&self) -> u32 {
        self.components as u32 * self.component_type.size_bytes()
    }
}

/// Index data of one primitive
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeshIndices {
    U8(Vec<u8>),
    U16(Vec<u16>),
    U32(Vec<u32>),
}

impl MeshIndices {
    pub fn index_type(&self) -> IndexType {
        match self {
            MeshIndices::U8(_) => IndexType::U8,
            MeshIndices::U16(_) => IndexType::U16,
            MeshIndices::U32(_) => IndexType::U32,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            MeshIndices::U8(v) => v.len(),
            MeshIndices::U16(v) => v.len(),
            MeshIndices::U32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            MeshIndices::U8(v) => v.as_slice(),
            MeshIndices::U16(v) => bytemuck::cast_slice(v),
            MeshIndices::U32(v) => bytemuck::cast_slice(v),
        }
    }
}

/// One draw of a mesh: a vertex range, or an index list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshPrimitive {
    pub primitive: PrimitiveType,
    /// First vertex (non-indexed primitives)
    pub first: u32,
    /// Vertex count (non-indexed primitives)
    pub count: u32,
    pub indices: Option<MeshIndices>,
    /// Added to every index (indexed primitives)
    pub base_vertex: i32,
}

/// Mesh as produced by asset import
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshData {
    pub vertex_count: u32,
    pub attributes: Vec<MeshAttribute>,
    pub primitives: Vec<MeshPrimitive>,
}

impl MeshData {
    pub fn new(vertex_count: u32) -> Self {
        Self {
            vertex_count,
            attributes: Vec::new(),
            primitives: Vec::new(),
        }
    }

    /// Add a float attribute stream
    pub fn with_f32_attribute(mut self, semantic: AttributeSemantic, components: u8, values: &[f32]) -> Self {
        self.attributes.push(MeshAttribute {
            semantic,
            components,
            component_type: ComponentType::Float,
            normalized: false,
            data: bytemuck::cast_slice(values).to_vec(),
        });
        self
    }

    pub fn with_attribute(mut self, attribute: MeshAttribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Add a non-indexed primitive over `[first, first + count)`
    pub fn with_arrays(mut self, primitive: PrimitiveType, first: u32, count: u32) -> Self {
        self.primitives.push(MeshPrimitive {
            primitive,
            first,
            count,
            indices: None,
            base_vertex: 0,
        });
        self
    }

    /// Add an indexed primitive
    pub fn with_indices(mut self, primitive: PrimitiveType, indices: MeshIndices) -> Self {
        let count = indices.len() as u32;
        self.primitives.push(MeshPrimitive {
            primitive,
            first: 0,
            count,
            indices: Some(indices),
            base_vertex: 0,
        });
        self
    }

    /// Check stream lengths and primitive ranges against `vertex_count`
    pub fn validate(&self) -> Result<()> {
        for attribute in &self.attributes {
            if !(1..=4).contains(&attribute.components) {
                return Err(Error::InvalidArgument(format!(
                    "attribute {:?} has {} components", attribute.semantic, attribute.components
                )));
            }
            let expected = attribute.element_size() as u64 * self.vertex_count as u64;
            if attribute.data.len() as u64 != expected {
                return Err(Error::InvalidArgument(format!(
                    "attribute {:?} holds {} bytes, {} vertices need {}",
                    attribute.semantic, attribute.data.len(), self.vertex_count, expected
                )));
            }
        }
        for (i, a) in self.attributes.iter().enumerate() {
            if self.attributes[..i].iter().any(|b| b.semantic == a.semantic) {
                return Err(Error::InvalidArgument(format!("attribute {:?} is declared twice", a.semantic)));
            }
        }
        for primitive in &self.primitives {
            if primitive.indices.is_none() && primitive.first as u64 + primitive.count as u64 > self.vertex_count as u64 {
                return Err(Error::InvalidArgument(format!(
                    "primitive range {}+{} exceeds {} vertices", primitive.first, primitive.count, self.vertex_count
                )));
            }
        }
        Ok(())
    }
}
