//! Math utilities and types
//!
//! Thin aliases over nalgebra plus the few matrix builders the camera
//! transform needs.

pub use nalgebra::{Matrix4, Vector3};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Right-handed perspective projection with a [-1, 1] depth range.
///
/// `aspect` is passed straight through, so callers decide whether it is
/// width/height or height/width.
pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
    Mat4::new_perspective(aspect, fov_y, near, far)
}

/// Right-handed view matrix looking from `eye` towards `target`
pub fn look_at(eye: &Point3, target: &Point3, up: &Vec3) -> Mat4 {
    Mat4::look_at_rh(eye, target, up)
}

/// Converts GL-style clip space into Vulkan clip space.
///
/// Flips Y and remaps depth from [-1, 1] to [0, 1].
pub fn vulkan_clip_correction() -> Mat4 {
    // nalgebra's `new` takes row-major arguments
    Mat4::new(
        1.0, 0.0, 0.0, 0.0,
        0.0, -1.0, 0.0, 0.0,
        0.0, 0.0, 0.5, 0.5,
        0.0, 0.0, 0.0, 1.0,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector4;

    #[test]
    fn test_clip_correction_flips_y_and_remaps_depth() {
        let clip = vulkan_clip_correction();
        let near = clip * Vector4::new(0.0, 1.0, -1.0, 1.0);
        let far = clip * Vector4::new(0.0, 1.0, 1.0, 1.0);

        assert_relative_eq!(near.y, -1.0);
        assert_relative_eq!(near.z, 0.0);
        assert_relative_eq!(far.z, 1.0);
    }

    #[test]
    fn test_look_at_maps_target_onto_negative_z() {
        let eye = Point3::new(0.0, 0.0, 5.0);
        let view = look_at(&eye, &Point3::origin(), &Vec3::y());
        let target = view.transform_point(&Point3::origin());

        assert_relative_eq!(target.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(target.z, -5.0, epsilon = 1e-6);
    }
}
