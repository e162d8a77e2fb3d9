//! Unit tests for vertex_array.rs
//!
//! Tests binding slots, attribute declarations, rebinding after buffer
//! reallocation and mesh conversion.

use std::sync::Arc;
use crate::context::AttributeSemantic;
use crate::error::Error;
use crate::renderer::headless::HeadlessVertexArray;
use crate::renderer::{ComponentType, IndexType, PrimitiveType};
use crate::resource::vertex_array::{concatenate_indices, interleaved_layout};
use crate::resource::{Buffer, MeshData, MeshIndices, MeshLayout, PrimitiveSet, VertexArray, VertexAttribute};
use crate::test_support::headless_context;

fn headless(vertex_array: &VertexArray) -> &HeadlessVertexArray {
    vertex_array.backend().as_any().downcast_ref::<HeadlessVertexArray>().unwrap()
}

// ============================================================================
// BINDING TESTS
// ============================================================================

#[test]
fn test_attach_reuses_identical_binding() {
    let (_renderer, context) = headless_context("va_reuse");
    let _guard = context.make_current().unwrap();

    let vertex_array = VertexArray::new().unwrap();
    let buffer = Buffer::new(64, None).unwrap();

    let a = vertex_array.attach_vertex_buffer(&buffer, 0, 12).unwrap();
    let b = vertex_array.attach_vertex_buffer(&buffer, 0, 12).unwrap();
    let c = vertex_array.attach_vertex_buffer(&buffer, 16, 12).unwrap();
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(vertex_array.binding_count(), 16);
}

#[test]
fn test_attach_fails_when_slots_exhausted() {
    let (_renderer, context) = headless_context("va_full");
    let _guard = context.make_current().unwrap();

    let vertex_array = VertexArray::new().unwrap();
    let buffer = Buffer::new(64, None).unwrap();
    for offset in 0..16 {
        vertex_array.attach_vertex_buffer(&buffer, offset, 4).unwrap();
    }
    assert!(matches!(
        vertex_array.attach_vertex_buffer(&buffer, 32, 4),
        Err(Error::InvalidArgument(_))
    ));
}

#[test]
fn test_detach_removes_dependent_attributes() {
    let (_renderer, context) = headless_context("va_detach");
    let _guard = context.make_current().unwrap();

    let vertex_array = VertexArray::new().unwrap();
    let positions = Buffer::new(36, None).unwrap();
    let colors = Buffer::new(48, None).unwrap();
    let p = vertex_array.attach_vertex_buffer(&positions, 0, 12).unwrap();
    let c = vertex_array.attach_vertex_buffer(&colors, 0, 16).unwrap();
    vertex_array.declare_attribute(AttributeSemantic::Position, VertexAttribute::float(p, 3)).unwrap();
    vertex_array.declare_attribute(AttributeSemantic::Normal, VertexAttribute::float(p, 3)).unwrap();
    vertex_array.declare_attribute(AttributeSemantic::Color, VertexAttribute::float(c, 4)).unwrap();

    let removed = vertex_array.detach_vertex_buffer(p).unwrap();
    assert_eq!(removed, vec![AttributeSemantic::Position, AttributeSemantic::Normal]);
    assert!(vertex_array.binding(p).is_none());
    assert!(vertex_array.attribute(AttributeSemantic::Color).is_some());

    let backend = headless(&vertex_array);
    assert!(!backend.attributes().contains_key(&AttributeSemantic::Position.location()));
    assert!(backend.attributes().contains_key(&AttributeSemantic::Color.location()));
    assert!(!backend.bindings().contains_key(&p));
}

#[test]
fn test_detach_out_of_range_slot() {
    let (_renderer, context) = headless_context("va_detach_oob");
    let _guard = context.make_current().unwrap();

    let vertex_array = VertexArray::new().unwrap();
    assert!(vertex_array.detach_vertex_buffer(99).is_err());
}

// ============================================================================
// ATTRIBUTE TESTS
// ============================================================================

#[test]
fn test_declare_attribute_uses_semantic_location() {
    let (_renderer, context) = headless_context("va_declare");
    let _guard = context.make_current().unwrap();

    let vertex_array = VertexArray::new().unwrap();
    let buffer = Buffer::new(32, None).unwrap();
    let slot = vertex_array.attach_vertex_buffer(&buffer, 0, 8).unwrap();
    vertex_array.declare_attribute(AttributeSemantic::TexCoord0, VertexAttribute::float(slot, 2)).unwrap();

    let format = headless(&vertex_array).attributes()[&AttributeSemantic::TexCoord0.location()];
    assert_eq!(format.components, 2);
    assert!(!format.integer);

    assert!(vertex_array.undeclare_attribute(AttributeSemantic::TexCoord0).unwrap());
    assert!(!vertex_array.undeclare_attribute(AttributeSemantic::TexCoord0).unwrap());
}

#[test]
fn test_declare_attribute_validation() {
    let (_renderer, context) = headless_context("va_declare_invalid");
    let _guard = context.make_current().unwrap();

    let vertex_array = VertexArray::new().unwrap();
    assert!(vertex_array
        .declare_attribute(AttributeSemantic::Position, VertexAttribute::float(0, 3))
        .is_err());

    let buffer = Buffer::new(32, None).unwrap();
    let slot = vertex_array.attach_vertex_buffer(&buffer, 0, 8).unwrap();
    assert!(vertex_array
        .declare_attribute(AttributeSemantic::Position, VertexAttribute::float(slot, 5))
        .is_err());
}

#[test]
fn test_integer_attribute_flag() {
    let normalized = VertexAttribute {
        component_type: ComponentType::UByte,
        normalized: true,
        ..VertexAttribute::float(0, 4)
    };
    let integer = VertexAttribute { normalized: false, ..normalized };
    assert!(!normalized.is_integer());
    assert!(integer.is_integer());
}

// ============================================================================
// REBINDING TESTS
// ============================================================================

#[test]
fn test_refresh_bindings_after_resize() {
    let (_renderer, context) = headless_context("va_refresh");
    let _guard = context.make_current().unwrap();

    let vertex_array = VertexArray::new().unwrap();
    let vertices = Buffer::new(16, None).unwrap();
    let indices = Buffer::new(6, None).unwrap();
    let slot = vertex_array.attach_vertex_buffer(&vertices, 0, 4).unwrap();
    vertex_array.attach_index_buffer(&indices).unwrap();
    assert_eq!(vertex_array.refresh_bindings().unwrap(), 0);

    let old_name = headless(&vertex_array).bindings()[&slot].0;
    vertices.resize(64).unwrap();
    indices.resize(12).unwrap();

    assert_eq!(vertex_array.refresh_bindings().unwrap(), 2);
    let new_name = headless(&vertex_array).bindings()[&slot].0;
    assert_ne!(old_name, new_name);
    assert_eq!(vertex_array.refresh_bindings().unwrap(), 0);
}

#[test]
fn test_index_buffer_attach_detach() {
    let (_renderer, context) = headless_context("va_index");
    let _guard = context.make_current().unwrap();

    let vertex_array = VertexArray::new().unwrap();
    let indices = Buffer::new(6, None).unwrap();
    vertex_array.attach_index_buffer(&indices).unwrap();
    assert!(Arc::ptr_eq(&vertex_array.index_buffer().unwrap(), &indices));

    let detached = vertex_array.detach_index_buffer().unwrap().unwrap();
    assert!(Arc::ptr_eq(&detached, &indices));
    assert!(vertex_array.detach_index_buffer().unwrap().is_none());
    assert!(headless(&vertex_array).index_buffer().is_none());
}

#[test]
fn test_primitive_sets() {
    let (_renderer, context) = headless_context("va_sets");
    let _guard = context.make_current().unwrap();

    let vertex_array = VertexArray::new().unwrap();
    let set = PrimitiveSet::Arrays { primitive: PrimitiveType::Triangles, first: 0, count: 3 };
    assert_eq!(vertex_array.add_primitive_set(set), 0);
    assert_eq!(vertex_array.primitive_sets(), vec![set]);
    assert_eq!(set.count(), 3);
    assert!(!set.is_indexed());

    assert_eq!(vertex_array.remove_primitive_set(0), Some(set));
    assert_eq!(vertex_array.remove_primitive_set(0), None);
}

// ============================================================================
// MESH CONVERSION TESTS
// ============================================================================

fn quad_mesh() -> MeshData {
    MeshData::new(4)
        .with_f32_attribute(AttributeSemantic::Position, 3, &[0.0; 12])
        .with_f32_attribute(AttributeSemantic::TexCoord0, 2, &[0.0; 8])
        .with_indices(PrimitiveType::Triangles, MeshIndices::U16(vec![0, 1, 2, 2, 3, 0]))
        .with_indices(PrimitiveType::Lines, MeshIndices::U32(vec![0, 1]))
}

#[test]
fn test_interleaved_layout_offsets() {
    let mesh = MeshData::new(1)
        .with_f32_attribute(AttributeSemantic::Position, 3, &[0.0; 3])
        .with_attribute(crate::resource::MeshAttribute {
            semantic: AttributeSemantic::Color,
            components: 3,
            component_type: ComponentType::UByte,
            normalized: true,
            data: vec![255, 0, 0],
        })
        .with_f32_attribute(AttributeSemantic::TexCoord0, 2, &[0.0; 2]);

    let (offsets, stride) = interleaved_layout(&mesh);
    assert_eq!(offsets, vec![0, 12, 16]);
    assert_eq!(stride, 24);
}

#[test]
fn test_concatenate_indices_aligns_ranges() {
    let mesh = MeshData::new(4)
        .with_indices(PrimitiveType::Triangles, MeshIndices::U8(vec![0, 1, 2]))
        .with_arrays(PrimitiveType::Points, 0, 4)
        .with_indices(PrimitiveType::Triangles, MeshIndices::U32(vec![1, 2, 3]));

    let (bytes, offsets) = concatenate_indices(&mesh);
    assert_eq!(offsets, vec![Some(0), None, Some(4)]);
    assert_eq!(bytes.len(), 16);
}

#[test]
fn test_from_mesh_interleaved() {
    let (_renderer, context) = headless_context("va_mesh_interleaved");
    let _guard = context.make_current().unwrap();

    let vertex_array = VertexArray::from_mesh(&quad_mesh(), MeshLayout::Interleaved).unwrap();
    let position = vertex_array.attribute(AttributeSemantic::Position).unwrap();
    let tex_coord = vertex_array.attribute(AttributeSemantic::TexCoord0).unwrap();
    assert_eq!(position.binding, tex_coord.binding);
    assert_eq!(tex_coord.relative_offset, 12);
    assert_eq!(vertex_array.binding(position.binding).unwrap().stride, 20);

    let sets = vertex_array.primitive_sets();
    assert_eq!(sets[0], PrimitiveSet::Elements {
        primitive: PrimitiveType::Triangles,
        count: 6,
        index_type: IndexType::U16,
        byte_offset: 0,
        base_vertex: 0,
    });
    assert!(matches!(sets[1], PrimitiveSet::Elements { index_type: IndexType::U32, byte_offset: 12, .. }));
    assert_eq!(vertex_array.index_buffer().unwrap().size(), 20);
}

#[test]
fn test_from_mesh_separate() {
    let (_renderer, context) = headless_context("va_mesh_separate");
    let _guard = context.make_current().unwrap();

    let vertex_array = VertexArray::from_mesh(&quad_mesh(), MeshLayout::Separate).unwrap();
    let position = vertex_array.attribute(AttributeSemantic::Position).unwrap();
    let tex_coord = vertex_array.attribute(AttributeSemantic::TexCoord0).unwrap();
    assert_ne!(position.binding, tex_coord.binding);
    assert_eq!(vertex_array.binding(tex_coord.binding).unwrap().stride, 8);
}

#[test]
fn test_from_mesh_rejects_short_stream() {
    let (_renderer, context) = headless_context("va_mesh_invalid");
    let _guard = context.make_current().unwrap();

    let mesh = MeshData::new(3).with_f32_attribute(AttributeSemantic::Position, 3, &[0.0; 6]);
    assert!(matches!(
        VertexArray::from_mesh(&mesh, MeshLayout::Interleaved),
        Err(Error::InvalidArgument(_))
    ));
    assert_eq!(context.live_resources(), 0);
}
