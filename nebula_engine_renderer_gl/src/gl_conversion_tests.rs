//! Unit tests for gl_conversion.rs
//!
//! Tests the conversion tables without requiring a GL context.

use super::*;

// ============================================================================
// ROUND TRIPS
// ============================================================================

#[test]
fn test_every_table_round_trips_through_its_reverse_lookup() {
    for value in ComponentType::ALL {
        assert_eq!(component_type_from_gl(COMPONENT_TYPES[value.ordinal()]), Some(value));
    }
    for value in PixelFormat::ALL {
        assert_eq!(pixel_format_from_gl(PIXEL_FORMATS[value.ordinal()]), Some(value));
    }
    for value in TextureType::ALL {
        assert_eq!(texture_type_from_gl(TEXTURE_TYPES[value.ordinal()]), Some(value));
    }
    for value in Wrap::ALL {
        assert_eq!(wrap_from_gl(WRAPS[value.ordinal()]), Some(value));
    }
    for value in Filter::ALL {
        assert_eq!(min_filter_from_gl(MIN_FILTERS[value.ordinal()]), Some(value));
    }
    for value in Swizzle::ALL {
        assert_eq!(swizzle_from_gl(SWIZZLES[value.ordinal()]), Some(value));
    }
    for value in ImageAccess::ALL {
        assert_eq!(image_access_from_gl(IMAGE_ACCESSES[value.ordinal()]), Some(value));
    }
    for value in CompareFunc::ALL {
        assert_eq!(compare_func_from_gl(COMPARE_FUNCS[value.ordinal()]), Some(value));
    }
    for value in StencilOp::ALL {
        assert_eq!(stencil_op_from_gl(STENCIL_OPS[value.ordinal()]), Some(value));
    }
    for value in BlendFactor::ALL {
        assert_eq!(blend_factor_from_gl(BLEND_FACTORS[value.ordinal()]), Some(value));
    }
    for value in BlendEquation::ALL {
        assert_eq!(blend_equation_from_gl(BLEND_EQUATIONS[value.ordinal()]), Some(value));
    }
    for value in CullFace::ALL {
        assert_eq!(cull_face_from_gl(CULL_FACES[value.ordinal()]), Some(value));
    }
    for value in FrontFace::ALL {
        assert_eq!(front_face_from_gl(FRONT_FACES[value.ordinal()]), Some(value));
    }
    for value in PrimitiveType::ALL {
        assert_eq!(primitive_type_from_gl(PRIMITIVE_TYPES[value.ordinal()]), Some(value));
    }
    for value in IndexType::ALL {
        assert_eq!(index_type_from_gl(INDEX_TYPES[value.ordinal()]), Some(value));
    }
    for value in ShaderStage::ALL {
        assert_eq!(shader_stage_from_gl(SHADER_STAGES[value.ordinal()]), Some(value));
    }
    for value in UniformType::ALL {
        assert_eq!(uniform_type_from_gl(UNIFORM_TYPES[value.ordinal()]), Some(value));
    }
}

#[test]
fn test_unknown_constants_are_undefined() {
    assert_eq!(pixel_format_from_gl(gl::COMPRESSED_RGBA), None);
    assert_eq!(uniform_type_from_gl(gl::DOUBLE_MAT4), None);
    assert_eq!(texture_type_from_gl(gl::TEXTURE_2D_MULTISAMPLE), None);
    assert_eq!(primitive_type_from_gl(gl::POLYGON_OFFSET_FILL), None);
    assert_eq!(compare_func_from_gl(0xFFFF), None);
}

// ============================================================================
// SPOT CHECKS
// ============================================================================

#[test]
fn test_depth_stencil_formats() {
    assert_eq!(PIXEL_FORMATS[PixelFormat::Depth24Stencil8.ordinal()], gl::DEPTH24_STENCIL8);
    assert_eq!(
        PIXEL_TRANSFERS[PixelFormat::Depth32FStencil8.ordinal()],
        (gl::DEPTH_STENCIL, gl::FLOAT_32_UNSIGNED_INT_24_8_REV)
    );
    assert_eq!(PIXEL_TRANSFERS[PixelFormat::Stencil8.ordinal()], (gl::STENCIL_INDEX, gl::UNSIGNED_BYTE));
}

#[test]
fn test_integer_formats_transfer_as_integer_data() {
    for format in PixelFormat::ALL {
        let (transfer, _) = PIXEL_TRANSFERS[format.ordinal()];
        let integer_transfer = matches!(transfer, gl::RED_INTEGER | gl::RG_INTEGER | gl::RGBA_INTEGER);
        assert_eq!(integer_transfer, format.is_integer(), "{:?}", format);
    }
}

#[test]
fn test_transfer_channel_count_matches_format() {
    for format in PixelFormat::ALL {
        if format.has_depth() || format.has_stencil() {
            continue;
        }
        let (transfer, _) = PIXEL_TRANSFERS[format.ordinal()];
        let expected = color_transfer_format(format.components(), format.is_integer());
        assert_eq!(Some(transfer), expected, "{:?}", format);
    }
}

#[test]
fn test_color_transfer_format_rejects_bad_channel_counts() {
    assert_eq!(color_transfer_format(0, false), None);
    assert_eq!(color_transfer_format(5, true), None);
    assert_eq!(color_transfer_format(3, true), Some(gl::RGB_INTEGER));
}

#[test]
fn test_filters() {
    assert_eq!(MIN_FILTERS[Filter::Trilinear.ordinal()], gl::LINEAR_MIPMAP_LINEAR);
    assert_eq!(MIN_FILTERS[Filter::Bilinear.ordinal()], gl::LINEAR_MIPMAP_NEAREST);
    assert_eq!(MAG_FILTERS[Filter::Trilinear.ordinal()], gl::LINEAR);
    assert_eq!(MAG_FILTERS[Filter::Nearest.ordinal()], gl::NEAREST);
}

#[test]
fn test_map_access_bits() {
    assert_eq!(MAP_ACCESSES[MapAccess::ReadOnly.ordinal()], gl::MAP_READ_BIT);
    assert_eq!(MAP_ACCESSES[MapAccess::WriteOnly.ordinal()], gl::MAP_WRITE_BIT);
    assert_eq!(MAP_ACCESSES[MapAccess::ReadWrite.ordinal()], gl::MAP_READ_BIT | gl::MAP_WRITE_BIT);
}

// ============================================================================
// ATTACHMENTS AND BARRIERS
// ============================================================================

#[test]
fn test_attachment_points() {
    assert_eq!(attachment_point_to_gl(AttachmentPoint::Color(0)), gl::COLOR_ATTACHMENT0);
    assert_eq!(attachment_point_to_gl(AttachmentPoint::Color(3)), gl::COLOR_ATTACHMENT3);
    assert_eq!(attachment_point_to_gl(AttachmentPoint::DepthStencil), gl::DEPTH_STENCIL_ATTACHMENT);

    assert_eq!(attachment_point_from_gl(gl::COLOR_ATTACHMENT7), Some(AttachmentPoint::Color(7)));
    assert_eq!(attachment_point_from_gl(gl::STENCIL_ATTACHMENT), Some(AttachmentPoint::Stencil));
    assert_eq!(attachment_point_from_gl(gl::COLOR_ATTACHMENT8), None);
}

#[test]
fn test_memory_barrier_bits() {
    assert_eq!(memory_barrier_to_gl(MemoryBarrier::ALL), gl::ALL_BARRIER_BITS);
    assert_eq!(memory_barrier_to_gl(MemoryBarrier::empty()), 0);
    assert_eq!(
        memory_barrier_to_gl(MemoryBarrier::SHADER_STORAGE | MemoryBarrier::COMMAND),
        gl::SHADER_STORAGE_BARRIER_BIT | gl::COMMAND_BARRIER_BIT
    );
}
