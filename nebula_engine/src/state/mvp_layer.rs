/// Derived transform layer
///
/// Caches every matrix and vector derived from the model, view and
/// projection inputs. Each setter re-derives exactly the values depending
/// on the input it changed, so reads never see stale data.

use glam::{Mat3, Mat4, Vec3};
use crate::context::UniformSemantic;
use crate::state::{StateLayer, UniformValue};

#[derive(Debug, Clone, PartialEq)]
pub struct MvpLayer {
    model: Mat4,
    view: Mat4,
    projection: Mat4,

    // Model-derived
    normal: Mat3,
    inverse_normal: Mat3,
    inverse_model: Mat4,
    world_position: Vec3,
    world_axes: [Vec3; 3],

    // View-derived
    inverse_view: Mat4,
    camera_position: Vec3,
    view_projection: Mat4,

    // Model and view derived
    model_view: Mat4,
    model_view_projection: Mat4,
}

impl Default for MvpLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl MvpLayer {
    /// Identity model, view and projection
    pub fn new() -> Self {
        Self {
            model: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            normal: Mat3::IDENTITY,
            inverse_normal: Mat3::IDENTITY,
            inverse_model: Mat4::IDENTITY,
            world_position: Vec3::ZERO,
            world_axes: [Vec3::X, Vec3::Y, Vec3::Z],
            inverse_view: Mat4::IDENTITY,
            camera_position: Vec3::ZERO,
            view_projection: Mat4::IDENTITY,
            model_view: Mat4::IDENTITY,
            model_view_projection: Mat4::IDENTITY,
        }
    }

    pub fn set_model(&mut self, model: Mat4) {
        self.model = model;
        self.inverse_model = model.inverse();
        self.normal = Mat3::from_mat4(model).inverse().transpose();
        self.inverse_normal = self.normal.inverse();
        self.world_position = model.w_axis.truncate();
        self.world_axes = [
            model.x_axis.truncate().normalize_or_zero(),
            model.y_axis.truncate().normalize_or_zero(),
            model.z_axis.truncate().normalize_or_zero(),
        ];
        self.derive_model_view();
    }

    pub fn set_view(&mut self, view: Mat4) {
        self.view = view;
        self.inverse_view = view.inverse();
        self.camera_position = self.inverse_view.w_axis.truncate();
        self.view_projection = self.projection * view;
        self.derive_model_view();
    }

    pub fn set_projection(&mut self, projection: Mat4) {
        self.projection = projection;
        self.view_projection = projection * self.view;
        self.model_view_projection = projection * self.model_view;
    }

    fn derive_model_view(&mut self) {
        self.model_view = self.view * self.model;
        self.model_view_projection = self.projection * self.model_view;
    }

    pub fn model(&self) -> Mat4 {
        self.model
    }

    pub fn view(&self) -> Mat4 {
        self.view
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    pub fn normal_matrix(&self) -> Mat3 {
        self.normal
    }

    pub fn model_view(&self) -> Mat4 {
        self.model_view
    }

    pub fn model_view_projection(&self) -> Mat4 {
        self.model_view_projection
    }

    pub fn camera_position(&self) -> Vec3 {
        self.camera_position
    }
}

impl StateLayer for MvpLayer {
    fn uniform_by_semantic(&self, semantic: UniformSemantic) -> Option<UniformValue> {
        let value = match semantic {
            UniformSemantic::ModelMatrix => self.model.into(),
            UniformSemantic::ViewMatrix => self.view.into(),
            UniformSemantic::ProjectionMatrix => self.projection.into(),
            UniformSemantic::ModelViewMatrix => self.model_view.into(),
            UniformSemantic::ViewProjectionMatrix => self.view_projection.into(),
            UniformSemantic::ModelViewProjectionMatrix => self.model_view_projection.into(),
            UniformSemantic::NormalMatrix => self.normal.into(),
            UniformSemantic::InverseNormalMatrix => self.inverse_normal.into(),
            UniformSemantic::InverseModelMatrix => self.inverse_model.into(),
            UniformSemantic::InverseViewMatrix => self.inverse_view.into(),
            UniformSemantic::WorldPosition => self.world_position.into(),
            UniformSemantic::WorldXDirection => self.world_axes[0].into(),
            UniformSemantic::WorldYDirection => self.world_axes[1].into(),
            UniformSemantic::WorldZDirection => self.world_axes[2].into(),
            UniformSemantic::CameraPosition => self.camera_position.into(),
            UniformSemantic::Custom(_) => return None,
        };
        Some(value)
    }

    fn uniform_by_name(&self, _name: &str) -> Option<UniformValue> {
        None
    }
}

#[cfg(test)]
#[path = "mvp_layer_tests.rs"]
mod tests;
