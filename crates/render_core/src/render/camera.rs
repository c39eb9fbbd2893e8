//! # Transform State
//!
//! The single model-view-projection transform the baseline uniform buffer
//! carries. Four component matrices are kept alongside their product so any
//! one of them can be replaced without the caller re-deriving the others.
//!
//! ## Conventions
//! - Projection and view are built GL-style (right-handed, depth in [-1, 1])
//! - The clip matrix converts that into Vulkan clip space (Y down, depth in [0, 1])
//! - The product is always `clip * projection * view * model`

use crate::foundation::math::{look_at, perspective, vulkan_clip_correction, Mat4, Point3, Vec3};

/// Vertical field of view before aspect correction, in degrees
pub const BASE_FOV_DEGREES: f32 = 45.0;

/// Near clipping plane distance
pub const NEAR_PLANE: f32 = 0.1;

/// Far clipping plane distance
pub const FAR_PLANE: f32 = 100.0;

/// Default eye position
pub const EYE: [f32; 3] = [-5.0, 3.0, -10.0];

/// Default up vector; Y points down in the scene's frame
pub const UP: [f32; 3] = [0.0, -1.0, 0.0];

/// Projection, view, model and clip matrices plus their cached product
#[derive(Debug, Clone, PartialEq)]
pub struct TransformState {
    projection: Mat4,
    view: Mat4,
    model: Mat4,
    clip: Mat4,
    mvp: Mat4,
}

/// Field of view in radians for a viewport of the given size.
///
/// Landscape viewports narrow the base angle by `height / width` so the
/// horizontal extent stays bounded.
pub fn field_of_view(width: u32, height: u32) -> f32 {
    let fov = BASE_FOV_DEGREES.to_radians();
    if width > height {
        fov * height as f32 / width as f32
    } else {
        fov
    }
}

impl TransformState {
    /// Build a transform from its four components
    pub fn new(projection: Mat4, view: Mat4, model: Mat4, clip: Mat4) -> Self {
        let mut state = Self {
            projection,
            view,
            model,
            clip,
            mvp: Mat4::identity(),
        };
        state.recompose();
        state
    }

    /// Default scene transform for a viewport.
    ///
    /// # Arguments
    /// * `width` - Viewport width in pixels
    /// * `height` - Viewport height in pixels
    ///
    /// Zero dimensions are treated as one pixel so the projection stays finite.
    pub fn for_extent(width: u32, height: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);

        let projection = perspective(
            field_of_view(width, height),
            height as f32 / width as f32,
            NEAR_PLANE,
            FAR_PLANE,
        );
        let view = look_at(
            &Point3::new(EYE[0], EYE[1], EYE[2]),
            &Point3::origin(),
            &Vec3::new(UP[0], UP[1], UP[2]),
        );

        Self::new(projection, view, Mat4::identity(), vulkan_clip_correction())
    }

    /// Replace the projection matrix
    pub fn set_projection(&mut self, projection: Mat4) {
        self.projection = projection;
        self.recompose();
    }

    /// Replace the view matrix
    pub fn set_view(&mut self, view: Mat4) {
        self.view = view;
        self.recompose();
    }

    /// Replace the model matrix
    pub fn set_model(&mut self, model: Mat4) {
        self.model = model;
        self.recompose();
    }

    /// Replace the clip-space correction matrix
    pub fn set_clip(&mut self, clip: Mat4) {
        self.clip = clip;
        self.recompose();
    }

    fn recompose(&mut self) {
        self.mvp = self.clip * self.projection * self.view * self.model;
        log::trace!("Transform recomposed");
    }

    /// Projection matrix
    pub const fn projection(&self) -> &Mat4 {
        &self.projection
    }

    /// View matrix
    pub const fn view(&self) -> &Mat4 {
        &self.view
    }

    /// Model matrix
    pub const fn model(&self) -> &Mat4 {
        &self.model
    }

    /// Clip matrix
    pub const fn clip(&self) -> &Mat4 {
        &self.clip
    }

    /// `clip * projection * view * model`
    pub const fn mvp(&self) -> &Mat4 {
        &self.mvp
    }

    /// The product as column-major bytes, ready for a uniform buffer
    pub fn mvp_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.mvp.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn translation(x: f32, y: f32, z: f32) -> Mat4 {
        Mat4::new_translation(&Vec3::new(x, y, z))
    }

    #[test]
    fn test_fov_narrows_for_landscape() {
        assert_relative_eq!(field_of_view(480, 640), 45.0_f32.to_radians());
        assert_relative_eq!(field_of_view(500, 500), 45.0_f32.to_radians());
        assert_relative_eq!(field_of_view(640, 480), 45.0_f32.to_radians() * 0.75);
    }

    #[test]
    fn test_default_product_matches_components() {
        let state = TransformState::for_extent(640, 480);
        let expected = state.clip() * state.projection() * state.view() * state.model();

        assert_eq!(*state.model(), Mat4::identity());
        assert_relative_eq!(*state.mvp(), expected, epsilon = 1e-6);
    }

    #[test]
    fn test_every_setter_recomposes() {
        let mut state = TransformState::for_extent(800, 600);

        state.set_model(translation(1.0, 0.0, 0.0));
        let after_model = *state.mvp();
        assert_relative_eq!(
            after_model,
            state.clip() * state.projection() * state.view() * translation(1.0, 0.0, 0.0),
            epsilon = 1e-6
        );

        state.set_view(Mat4::identity());
        assert_relative_eq!(
            *state.mvp(),
            state.clip() * state.projection() * translation(1.0, 0.0, 0.0),
            epsilon = 1e-6
        );

        state.set_projection(Mat4::identity());
        state.set_clip(Mat4::identity());
        assert_relative_eq!(*state.mvp(), translation(1.0, 0.0, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn test_origin_lands_inside_vulkan_depth_range() {
        let state = TransformState::for_extent(640, 480);
        let clip = state.mvp() * nalgebra::Vector4::new(0.0, 0.0, 0.0, 1.0);
        let depth = clip.z / clip.w;

        assert!(clip.w > 0.0);
        assert!((0.0..=1.0).contains(&depth));
    }

    #[test]
    fn test_zero_extent_stays_finite() {
        let state = TransformState::for_extent(0, 0);
        assert!(state.mvp().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_bytes_are_column_major_matrix() {
        let state = TransformState::new(
            translation(1.0, 2.0, 3.0),
            Mat4::identity(),
            Mat4::identity(),
            Mat4::identity(),
        );
        let bytes = state.mvp_bytes();
        assert_eq!(bytes.len(), 64);

        let floats: &[f32] = bytemuck::cast_slice(bytes);
        assert_eq!(&floats[12..15], &[1.0, 2.0, 3.0]);
    }
}
