//! Unit tests for buffer.rs
//!
//! Tests Buffer upload/readback, mapping exclusivity, resizing and DynamicBuffer growth.

use crate::error::Error;
use crate::renderer::MapAccess;
use crate::resource::{grown_capacity, Buffer, DynamicBuffer};
use crate::test_support::headless_context;

// ============================================================================
// BUFFER TESTS
// ============================================================================

#[test]
fn test_buffer_from_data_roundtrip() {
    let (_renderer, context) = headless_context("buffer_roundtrip");
    let _guard = context.make_current().unwrap();

    let buffer = Buffer::from_data(&[1, 2, 3, 4, 5, 6]).unwrap();
    assert_eq!(buffer.size(), 6);
    assert_eq!(buffer.read(2, 3).unwrap(), vec![3, 4, 5]);
}

#[test]
fn test_buffer_initial_data_larger_than_size() {
    let (_renderer, context) = headless_context("buffer_too_much");
    let _guard = context.make_current().unwrap();

    let result = Buffer::new(2, Some(&[0, 1, 2]));
    assert!(matches!(result, Err(Error::InvalidArgument(_))));
    assert_eq!(context.live_resources(), 0);
}

#[test]
fn test_buffer_write_out_of_range() {
    let (_renderer, context) = headless_context("buffer_oob");
    let _guard = context.make_current().unwrap();

    let buffer = Buffer::new(4, None).unwrap();
    assert!(matches!(buffer.write(2, &[0, 0, 0]), Err(Error::InvalidArgument(_))));
    assert!(matches!(buffer.read(u64::MAX, 2), Err(Error::InvalidArgument(_))));
    buffer.write(1, &[9, 9, 9]).unwrap();
    assert_eq!(buffer.read(0, 4).unwrap()[1..], [9, 9, 9]);
}

#[test]
fn test_buffer_resize_preserves_prefix() {
    let (_renderer, context) = headless_context("buffer_resize");
    let _guard = context.make_current().unwrap();

    let buffer = Buffer::from_data(&[1, 2, 3, 4]).unwrap();
    assert_eq!(buffer.generation(), 0);

    buffer.resize(8).unwrap();
    assert_eq!(buffer.size(), 8);
    assert_eq!(buffer.generation(), 1);
    assert_eq!(buffer.read(0, 4).unwrap(), vec![1, 2, 3, 4]);

    buffer.resize(2).unwrap();
    assert_eq!(buffer.read(0, 2).unwrap(), vec![1, 2]);
    assert_eq!(buffer.generation(), 2);
}

#[test]
fn test_buffer_resize_releases_old_backend() {
    let (renderer, context) = headless_context("buffer_resize_release");
    let _guard = context.make_current().unwrap();

    let buffer = Buffer::new(4, None).unwrap();
    buffer.resize(16).unwrap();
    assert_eq!(renderer.live_objects(), 1);
    drop(buffer);
    assert_eq!(renderer.live_objects(), 0);
}

// ============================================================================
// MAPPING TESTS
// ============================================================================

#[test]
fn test_map_write_then_read() {
    let (_renderer, context) = headless_context("buffer_map");
    let _guard = context.make_current().unwrap();

    let buffer = Buffer::new(8, None).unwrap();
    {
        let mut view = buffer.map(MapAccess::WriteOnly, 4, 4).unwrap();
        assert!(buffer.is_mapped());
        assert_eq!(view.len(), 4);
        assert_eq!(view.offset(), 4);
        view.copy_from_slice(&[7, 8, 9, 10]);
    }
    assert!(!buffer.is_mapped());
    assert_eq!(buffer.read(4, 4).unwrap(), vec![7, 8, 9, 10]);

    let view = buffer.map(MapAccess::ReadOnly, 4, 2).unwrap();
    assert_eq!(&view[..], &[7, 8]);
}

#[test]
fn test_try_map_twice_reports_already_mapped() {
    let (_renderer, context) = headless_context("buffer_try_map");
    let _guard = context.make_current().unwrap();

    let buffer = Buffer::new(8, None).unwrap();
    let _view = buffer.try_map(MapAccess::ReadWrite, 0, 8).unwrap();
    assert!(matches!(
        buffer.try_map(MapAccess::ReadOnly, 0, 4),
        Err(Error::AlreadyMapped(_))
    ));
}

#[test]
#[should_panic(expected = "Buffer already mapped")]
fn test_map_twice_is_fatal() {
    let (_renderer, context) = headless_context("buffer_map_twice");
    let _guard = context.make_current().unwrap();

    let buffer = Buffer::new(8, None).unwrap();
    let _view = buffer.map(MapAccess::ReadWrite, 0, 8).unwrap();
    let _second = buffer.map(MapAccess::ReadWrite, 0, 8);
}

#[test]
#[should_panic(expected = "Buffer already mapped")]
fn test_write_while_mapped_is_fatal() {
    let (_renderer, context) = headless_context("buffer_write_mapped");
    let _guard = context.make_current().unwrap();

    let buffer = Buffer::new(8, None).unwrap();
    let _view = buffer.map(MapAccess::ReadOnly, 0, 8).unwrap();
    let _ = buffer.write(0, &[1]);
}

#[test]
fn test_map_out_of_range_clears_flag() {
    let (_renderer, context) = headless_context("buffer_map_oob");
    let _guard = context.make_current().unwrap();

    let buffer = Buffer::new(8, None).unwrap();
    assert!(buffer.map(MapAccess::ReadOnly, 6, 4).is_err());
    assert!(buffer.map(MapAccess::ReadOnly, 0, 0).is_err());
    assert!(!buffer.is_mapped());
    assert!(buffer.map(MapAccess::ReadOnly, 0, 8).is_ok());
}

#[test]
#[should_panic(expected = "read-only view")]
fn test_mutating_read_only_view_is_fatal() {
    let (_renderer, context) = headless_context("buffer_ro_view");
    let _guard = context.make_current().unwrap();

    let buffer = Buffer::new(4, None).unwrap();
    let mut view = buffer.map(MapAccess::ReadOnly, 0, 4).unwrap();
    view[0] = 1;
}

// ============================================================================
// DYNAMIC BUFFER TESTS
// ============================================================================

#[test]
fn test_grown_capacity() {
    assert_eq!(grown_capacity(16, 17), 32);
    assert_eq!(grown_capacity(16, 100), 100);
    assert_eq!(grown_capacity(0, 5), 5);
}

#[test]
fn test_dynamic_buffer_append_grows_by_doubling() {
    let (_renderer, context) = headless_context("dynamic_append");
    let _guard = context.make_current().unwrap();

    let dynamic = DynamicBuffer::new(4).unwrap();
    assert_eq!(dynamic.append(&[1, 2, 3]).unwrap(), 0);
    assert_eq!(dynamic.capacity(), 4);

    assert_eq!(dynamic.append(&[4, 5]).unwrap(), 3);
    assert_eq!(dynamic.size(), 5);
    assert_eq!(dynamic.capacity(), 8);
    assert_eq!(dynamic.buffer().read(0, 5).unwrap(), vec![1, 2, 3, 4, 5]);
}

#[test]
fn test_dynamic_buffer_resize_and_shrink() {
    let (_renderer, context) = headless_context("dynamic_resize");
    let _guard = context.make_current().unwrap();

    let dynamic = DynamicBuffer::new(2).unwrap();
    dynamic.append(&[1, 2]).unwrap();
    dynamic.resize(10).unwrap();
    assert_eq!(dynamic.size(), 10);
    assert_eq!(dynamic.capacity(), 10);

    dynamic.resize(3).unwrap();
    dynamic.shrink_to_fit().unwrap();
    assert_eq!(dynamic.capacity(), 3);
    assert_eq!(dynamic.buffer().read(0, 2).unwrap(), vec![1, 2]);
}

#[test]
fn test_dynamic_buffer_reserve_and_clear() {
    let (_renderer, context) = headless_context("dynamic_reserve");
    let _guard = context.make_current().unwrap();

    let dynamic = DynamicBuffer::new(1).unwrap();
    dynamic.reserve(6).unwrap();
    assert_eq!(dynamic.capacity(), 6);
    assert_eq!(dynamic.size(), 0);

    dynamic.append(&[1, 2, 3]).unwrap();
    dynamic.clear();
    assert_eq!(dynamic.size(), 0);
    assert_eq!(dynamic.capacity(), 6);
    assert_eq!(dynamic.append(&[9]).unwrap(), 0);
}
