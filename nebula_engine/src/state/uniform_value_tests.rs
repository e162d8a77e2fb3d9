//! Unit tests for uniform_value.rs

use std::sync::Arc;
use glam::{IVec2, Mat3, Mat4, Vec3};
use crate::renderer::{ImageAccess, PixelFormat, UniformData, UniformType};
use crate::resource::{Buffer, Levels, Texture};
use crate::state::{StorageBinding, UniformValue};
use crate::test_support::headless_context;

// ============================================================================
// DATA CONVERSION TESTS
// ============================================================================

#[test]
fn test_conversions_produce_matching_types() {
    let cases: Vec<(UniformValue, UniformType)> = vec![
        (1.5f32.into(), UniformType::Float),
        (3i32.into(), UniformType::Int),
        (3u32.into(), UniformType::UInt),
        (true.into(), UniformType::Bool),
        (Vec3::ONE.into(), UniformType::Vec3),
        (IVec2::new(1, 2).into(), UniformType::IVec2),
        (Mat3::IDENTITY.into(), UniformType::Mat3),
        (Mat4::IDENTITY.into(), UniformType::Mat4),
        ([1.0f32, 0.0, 0.0, 1.0].into(), UniformType::Vec4),
    ];
    for (value, declared) in cases {
        assert!(value.matches(declared), "{:?} should match {:?}", value, declared);
    }
}

#[test]
fn test_matrix_is_column_major() {
    let matrix = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
    match UniformValue::from(matrix) {
        UniformValue::Data(UniformData::Mat4(m)) => assert_eq!(&m[12..15], &[1.0, 2.0, 3.0]),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_data_mismatch() {
    let value = UniformValue::from(1.0f32);
    assert!(!value.matches(UniformType::Int));
    assert!(!value.matches(UniformType::Vec2));
    assert!(!value.matches(UniformType::Sampler2D));
    assert_eq!(value.describe(), "Float");
}

// ============================================================================
// TEXTURE AND IMAGE TESTS
// ============================================================================

#[test]
fn test_sampler_matching() {
    let (_renderer, context) = headless_context("uniform_value_sampler");
    let _guard = context.make_current().unwrap();

    let color = Texture::new_2d(PixelFormat::RGBA8, 2, 2, Levels::Count(1)).unwrap();
    let ids = Texture::new_2d(PixelFormat::R32UI, 2, 2, Levels::Count(1)).unwrap();
    let cube = Texture::new_cube(PixelFormat::RGBA8, 2, Levels::Count(1)).unwrap();

    let color_value = UniformValue::from(Arc::clone(&color));
    assert!(color_value.matches(UniformType::Sampler2D));
    assert!(color_value.matches(UniformType::Sampler2DShadow));
    assert!(!color_value.matches(UniformType::USampler2D));
    assert!(!color_value.matches(UniformType::SamplerCube));
    assert!(!color_value.matches(UniformType::Image2D));
    assert!(!color_value.matches(UniformType::Int));

    let ids_value = UniformValue::from(ids);
    assert!(ids_value.matches(UniformType::USampler2D));
    assert!(!ids_value.matches(UniformType::Sampler2D));

    assert!(UniformValue::from(cube).matches(UniformType::SamplerCube));
    assert_eq!(color_value.describe(), "Texture2D texture (RGBA8)");
}

#[test]
fn test_image_matching() {
    let (_renderer, context) = headless_context("uniform_value_image");
    let _guard = context.make_current().unwrap();

    let texture = Texture::new_2d(PixelFormat::RGBA32F, 4, 4, Levels::Count(1)).unwrap();
    let image = UniformValue::image(Arc::clone(&texture), ImageAccess::WriteOnly);
    assert!(image.matches(UniformType::Image2D));
    assert!(!image.matches(UniformType::IImage2D));
    assert!(!image.matches(UniformType::Sampler2D));

    let reinterpreted = UniformValue::Image {
        texture,
        level: 0,
        layer: None,
        access: ImageAccess::ReadOnly,
        format: PixelFormat::RGBA32UI,
    };
    assert!(reinterpreted.matches(UniformType::UImage2D));
}

#[test]
fn test_texture_equality_is_identity() {
    let (_renderer, context) = headless_context("uniform_value_eq");
    let _guard = context.make_current().unwrap();

    let a = Texture::new_2d(PixelFormat::RGBA8, 2, 2, Levels::Count(1)).unwrap();
    let b = Texture::new_2d(PixelFormat::RGBA8, 2, 2, Levels::Count(1)).unwrap();
    assert_eq!(UniformValue::from(Arc::clone(&a)), UniformValue::from(Arc::clone(&a)));
    assert_ne!(UniformValue::from(a), UniformValue::from(b));
    assert_ne!(UniformValue::from(1.0f32), UniformValue::from(1i32));
}

// ============================================================================
// STORAGE BINDING TESTS
// ============================================================================

#[test]
fn test_storage_binding_ranges() {
    let (_renderer, context) = headless_context("uniform_value_storage");
    let _guard = context.make_current().unwrap();

    let buffer = Buffer::new(64, None).unwrap();
    assert_eq!(StorageBinding::whole(Arc::clone(&buffer)).resolved_size(), Some(64));
    assert_eq!(StorageBinding::range(Arc::clone(&buffer), 16, 48).resolved_size(), Some(48));
    assert_eq!(StorageBinding::range(Arc::clone(&buffer), 16, 49).resolved_size(), None);

    let tail = StorageBinding { buffer: Arc::clone(&buffer), offset: 60, size: None };
    assert_eq!(tail.resolved_size(), Some(4));
    let past = StorageBinding { buffer: Arc::clone(&buffer), offset: 65, size: None };
    assert_eq!(past.resolved_size(), None);

    let from: StorageBinding = buffer.into();
    assert_eq!(from.offset, 0);
    assert_eq!(from.size, None);
}
