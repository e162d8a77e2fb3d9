//! Unit tests for mvp_layer.rs

use glam::{Mat3, Mat4, Quat, Vec3};
use crate::context::UniformSemantic;
use crate::state::{MvpLayer, StateLayer, UniformValue};

fn mat4(layer: &MvpLayer, semantic: UniformSemantic) -> Mat4 {
    match layer.uniform_by_semantic(semantic) {
        Some(UniformValue::Data(crate::renderer::UniformData::Mat4(m))) => Mat4::from_cols_array(&m),
        other => panic!("{:?} gave {:?}", semantic, other),
    }
}

fn vec3(layer: &MvpLayer, semantic: UniformSemantic) -> Vec3 {
    match layer.uniform_by_semantic(semantic) {
        Some(UniformValue::Data(crate::renderer::UniformData::Vec3(v))) => Vec3::from_array(v),
        other => panic!("{:?} gave {:?}", semantic, other),
    }
}

// ============================================================================
// DERIVATION TESTS
// ============================================================================

#[test]
fn test_identity_defaults() {
    let layer = MvpLayer::new();
    assert_eq!(layer.model_view_projection(), Mat4::IDENTITY);
    assert_eq!(layer.normal_matrix(), Mat3::IDENTITY);
    assert_eq!(layer.camera_position(), Vec3::ZERO);
    assert_eq!(vec3(&layer, UniformSemantic::WorldYDirection), Vec3::Y);
}

#[test]
fn test_products_follow_every_setter() {
    let model = Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0));
    let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y);
    let projection = Mat4::perspective_rh_gl(1.0, 1.5, 0.1, 100.0);

    let mut layer = MvpLayer::new();
    layer.set_model(model);
    layer.set_view(view);
    layer.set_projection(projection);
    assert!(layer.model_view().abs_diff_eq(view * model, 1e-6));
    assert!(layer.model_view_projection().abs_diff_eq(projection * view * model, 1e-5));
    assert!(mat4(&layer, UniformSemantic::ViewProjectionMatrix).abs_diff_eq(projection * view, 1e-5));

    // Setting the model last re-derives the products too
    let moved = Mat4::from_translation(Vec3::new(0.0, 2.0, 0.0));
    layer.set_model(moved);
    assert!(layer.model_view_projection().abs_diff_eq(projection * view * moved, 1e-5));
    assert!(mat4(&layer, UniformSemantic::InverseModelMatrix).abs_diff_eq(moved.inverse(), 1e-6));
}

#[test]
fn test_camera_position_from_view() {
    let eye = Vec3::new(3.0, 4.0, 5.0);
    let mut layer = MvpLayer::new();
    layer.set_view(Mat4::look_at_rh(eye, Vec3::ZERO, Vec3::Y));
    assert!(layer.camera_position().abs_diff_eq(eye, 1e-5));
    assert!(vec3(&layer, UniformSemantic::CameraPosition).abs_diff_eq(eye, 1e-5));
}

#[test]
fn test_world_values_from_model() {
    let model = Mat4::from_scale_rotation_translation(
        Vec3::splat(2.0),
        Quat::from_rotation_z(std::f32::consts::FRAC_PI_2),
        Vec3::new(7.0, 8.0, 9.0),
    );
    let mut layer = MvpLayer::new();
    layer.set_model(model);

    assert!(vec3(&layer, UniformSemantic::WorldPosition).abs_diff_eq(Vec3::new(7.0, 8.0, 9.0), 1e-6));
    assert!(vec3(&layer, UniformSemantic::WorldXDirection).abs_diff_eq(Vec3::Y, 1e-6));
    assert!(vec3(&layer, UniformSemantic::WorldYDirection).abs_diff_eq(-Vec3::X, 1e-6));

    // Uniform scale: the normal matrix is the rotation divided by the scale
    let expected = Mat3::from_mat4(model).inverse().transpose();
    assert!(layer.normal_matrix().abs_diff_eq(expected, 1e-6));
}

#[test]
fn test_only_builtin_semantics_are_provided() {
    let layer = MvpLayer::new();
    assert!(layer.uniform_by_semantic(UniformSemantic::Custom(0)).is_none());
    assert!(layer.uniform_by_name("u_modelViewProjection").is_none());
    assert!(layer.uniform_by_semantic(UniformSemantic::NormalMatrix).is_some());
}
