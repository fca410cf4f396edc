//! Math type aliases and helper functions.
//!
//! All shader-facing math is `f32`. Matrix aliases follow the `RowsxColumns`
//! naming used by constant-buffer field types, so [`Mat3x4`] has three rows
//! and four columns.

pub use nalgebra;

/// 2D vector (f32).
pub type Vec2 = nalgebra::Vector2<f32>;

/// 3D vector (f32).
pub type Vec3 = nalgebra::Vector3<f32>;

/// 4D vector (f32).
pub type Vec4 = nalgebra::Vector4<f32>;

/// 3x3 matrix (f32).
pub type Mat3 = nalgebra::Matrix3<f32>;

/// 3x4 matrix (f32), three rows of four columns.
pub type Mat3x4 = nalgebra::Matrix3x4<f32>;

/// 4x3 matrix (f32), four rows of three columns.
pub type Mat4x3 = nalgebra::Matrix4x3<f32>;

/// 4x4 matrix (f32).
pub type Mat4 = nalgebra::Matrix4<f32>;

/// Build a right-handed perspective projection with depth range [0, 1] (wgpu/Vulkan convention).
pub fn perspective_rh(yfov: f32, aspect: f32, znear: f32, zfar: f32) -> Mat4 {
    let f = 1.0 / (yfov / 2.0).tan();
    let nf = 1.0 / (znear - zfar);
    #[rustfmt::skip]
    let result = Mat4::new(
        f / aspect, 0.0,  0.0,              0.0,
        0.0,        f,    0.0,              0.0,
        0.0,        0.0,  zfar * nf,        znear * zfar * nf,
        0.0,        0.0,  -1.0,             0.0,
    );
    result
}

/// Right-handed look-at view matrix.
pub fn look_at_rh(eye: &Vec3, target: &Vec3, up: &Vec3) -> Mat4 {
    let eye_point = nalgebra::Point3::from(*eye);
    let target_point = nalgebra::Point3::from(*target);
    nalgebra::Isometry3::look_at_rh(&eye_point, &target_point, up).to_homogeneous()
}

/// Build a translation-only 4x4 matrix.
pub fn mat4_from_translation(t: Vec3) -> Mat4 {
    Mat4::new_translation(&t)
}

/// Inverse of a 3x3 matrix, or the identity when the matrix is singular.
pub fn mat3_inverse_or_identity(m: &Mat3) -> Mat3 {
    m.try_inverse().unwrap_or_else(Mat3::identity)
}

/// Inverse of a 4x4 matrix, or the identity when the matrix is singular.
pub fn mat4_inverse_or_identity(m: &Mat4) -> Mat4 {
    m.try_inverse().unwrap_or_else(Mat4::identity)
}

/// Pad a matrix row of `C` floats to one four-float register.
///
/// Matrices land in constant buffers row by row, each row padded to a
/// full four-float register.
pub fn row_register<const C: usize>(row: [f32; C]) -> [f32; 4] {
    let mut register = [0.0; 4];
    register[..C].copy_from_slice(&row);
    register
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translation_matrix() {
        let t = Vec3::new(1.0, 2.0, 3.0);
        let m = mat4_from_translation(t);
        assert_eq!(m[(0, 3)], 1.0);
        assert_eq!(m[(1, 3)], 2.0);
        assert_eq!(m[(2, 3)], 3.0);
    }

    #[test]
    fn inverse_of_translation() {
        let m = mat4_from_translation(Vec3::new(1.0, 2.0, 3.0));
        let inv = mat4_inverse_or_identity(&m);
        assert!((inv * m - Mat4::identity()).norm() < 1e-6);
        assert_eq!(inv[(0, 3)], -1.0);
    }

    #[test]
    fn singular_inverse_falls_back_to_identity() {
        assert_eq!(mat3_inverse_or_identity(&Mat3::zeros()), Mat3::identity());
        assert_eq!(mat4_inverse_or_identity(&Mat4::zeros()), Mat4::identity());
    }

    #[test]
    fn perspective_depth_range() {
        let p = perspective_rh(std::f32::consts::FRAC_PI_2, 1.0, 1.0, 10.0);
        let near = p * Vec4::new(0.0, 0.0, -1.0, 1.0);
        let far = p * Vec4::new(0.0, 0.0, -10.0, 1.0);
        assert!((near.z / near.w).abs() < 1e-6);
        assert!((far.z / far.w - 1.0).abs() < 1e-6);
    }

    #[test]
    fn look_at_moves_eye_to_origin() {
        let eye = Vec3::new(0.0, 0.0, 5.0);
        let view = look_at_rh(&eye, &Vec3::zeros(), &Vec3::y());
        let p = view * Vec4::new(eye.x, eye.y, eye.z, 1.0);
        assert!(p.xyz().norm() < 1e-5);
    }

    #[test]
    fn row_register_pads_with_zeros() {
        assert_eq!(row_register([1.0, 2.0, 3.0]), [1.0, 2.0, 3.0, 0.0]);
        assert_eq!(row_register([1.0, 2.0, 3.0, 4.0]), [1.0, 2.0, 3.0, 4.0]);
    }
}
