//! Unit tests for pipeline.rs

use crate::renderer::{
    BlendEquation, BlendFactor, BlendState, CompareFunc, CullFace, FrontFace, PipelineState,
    StencilOp, StencilState, MAX_COLOR_ATTACHMENTS,
};

// ============================================================================
// DEFAULT STATE TESTS
// ============================================================================

#[test]
fn test_pipeline_defaults() {
    let state = PipelineState::default();
    assert!(!state.culling.enabled);
    assert_eq!(state.culling.face, CullFace::Back);
    assert_eq!(state.culling.front_face, FrontFace::CounterClockwise);
    assert!(state.depth.test_enabled);
    assert!(state.depth.write_enabled);
    assert_eq!(state.depth.func, CompareFunc::Less);
    assert!(!state.stencil.enabled);
    assert!(!state.blend.enabled);
    assert_eq!(state.color_masks.len(), MAX_COLOR_ATTACHMENTS);
    assert!(state.color_masks.iter().all(|mask| mask.r && mask.g && mask.b && mask.a));
}

#[test]
fn test_stencil_defaults_pass_through() {
    let stencil = StencilState::default();
    for face in [stencil.front, stencil.back] {
        assert_eq!(face.func, CompareFunc::Always);
        assert_eq!(face.read_mask, 0xFF);
        assert_eq!(face.write_mask, 0xFF);
        assert_eq!([face.fail, face.depth_fail, face.pass], [StencilOp::Keep; 3]);
    }
}

#[test]
fn test_blend_defaults_replace_destination() {
    let blend = BlendState::default();
    for attachment in blend.attachments {
        assert_eq!(attachment.color_equation, BlendEquation::Add);
        assert_eq!(attachment.src_color, BlendFactor::One);
        assert_eq!(attachment.dst_color, BlendFactor::Zero);
        assert_eq!(attachment.src_alpha, BlendFactor::One);
        assert_eq!(attachment.dst_alpha, BlendFactor::Zero);
    }
}

// ============================================================================
// ORDINAL TESTS
// ============================================================================

#[test]
fn test_ordinals_match_all_tables() {
    assert!(CompareFunc::ALL.iter().enumerate().all(|(i, v)| v.ordinal() == i));
    assert!(StencilOp::ALL.iter().enumerate().all(|(i, v)| v.ordinal() == i));
    assert!(BlendFactor::ALL.iter().enumerate().all(|(i, v)| v.ordinal() == i));
    assert!(BlendEquation::ALL.iter().enumerate().all(|(i, v)| v.ordinal() == i));
    assert!(CullFace::ALL.iter().enumerate().all(|(i, v)| v.ordinal() == i));
    assert!(FrontFace::ALL.iter().enumerate().all(|(i, v)| v.ordinal() == i));
    assert_eq!(CompareFunc::COUNT, 8);
    assert_eq!(BlendFactor::COUNT, 15);
}
