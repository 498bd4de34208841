//! Rigid 4x4 transforms and the pure helpers built on them
//!
//! Poses arrive from the sensor platform as `originFromAnchor` matrices and
//! joints as `anchorFromJoint` matrices. Chaining the two with [`compose`]
//! yields the joint's pose in world space.

use std::ops::Mul;

use super::{Point3D, Quaternion, Vector3D};

/// Column-major 4x4 rigid transform (orthonormal rotation + translation)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix4 {
    /// `cols[c][r]`, column 3 holds the translation
    pub cols: [[f32; 4]; 4],
}

impl Matrix4 {
    pub const IDENTITY: Self = Self {
        cols: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    pub fn from_cols(cols: [[f32; 4]; 4]) -> Self {
        Self { cols }
    }

    pub fn from_translation(t: Vector3D) -> Self {
        Self::from_rotation_translation(Quaternion::IDENTITY, t)
    }

    pub fn from_rotation(q: Quaternion) -> Self {
        Self::from_rotation_translation(q, Vector3D::ZERO)
    }

    pub fn from_rotation_translation(q: Quaternion, t: Vector3D) -> Self {
        let q = q.normalize();
        let x = q.rotate_vector(Vector3D::X);
        let y = q.rotate_vector(Vector3D::Y);
        let z = q.rotate_vector(Vector3D::Z);
        Self {
            cols: [
                [x.x, x.y, x.z, 0.0],
                [y.x, y.y, y.z, 0.0],
                [z.x, z.y, z.z, 0.0],
                [t.x, t.y, t.z, 1.0],
            ],
        }
    }

    #[inline]
    fn at(&self, row: usize, col: usize) -> f32 {
        self.cols[col][row]
    }

    pub fn approx_eq(&self, other: &Matrix4, epsilon: f32) -> bool {
        self.cols
            .iter()
            .flatten()
            .zip(other.cols.iter().flatten())
            .all(|(a, b)| (a - b).abs() < epsilon)
    }
}

impl Default for Matrix4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Matrix4 {
    type Output = Matrix4;

    /// `a * b` applies `b` first, then `a`
    fn mul(self, rhs: Self) -> Self::Output {
        let mut cols = [[0.0f32; 4]; 4];
        for (c, col) in cols.iter_mut().enumerate() {
            for (r, cell) in col.iter_mut().enumerate() {
                *cell = (0..4).map(|k| self.at(r, k) * rhs.at(k, c)).sum();
            }
        }
        Matrix4 { cols }
    }
}

/// Chain two transforms: `outer_from_mid ⋅ mid_from_inner`
pub fn compose(outer_from_mid: &Matrix4, mid_from_inner: &Matrix4) -> Matrix4 {
    *outer_from_mid * *mid_from_inner
}

/// Translation component (column 3, xyz)
pub fn translation(m: &Matrix4) -> Point3D {
    Point3D::new(m.cols[3][0], m.cols[3][1], m.cols[3][2])
}

/// Rotation component of the upper 3x3 as a unit quaternion
pub fn rotation(m: &Matrix4) -> Quaternion {
    let (m00, m11, m22) = (m.at(0, 0), m.at(1, 1), m.at(2, 2));
    let trace = m00 + m11 + m22;

    let q = if trace > 0.0 {
        let s = (trace + 1.0).sqrt() * 2.0;
        Quaternion::new(
            (m.at(2, 1) - m.at(1, 2)) / s,
            (m.at(0, 2) - m.at(2, 0)) / s,
            (m.at(1, 0) - m.at(0, 1)) / s,
            0.25 * s,
        )
    } else if m00 > m11 && m00 > m22 {
        let s = (1.0 + m00 - m11 - m22).sqrt() * 2.0;
        Quaternion::new(
            0.25 * s,
            (m.at(0, 1) + m.at(1, 0)) / s,
            (m.at(0, 2) + m.at(2, 0)) / s,
            (m.at(2, 1) - m.at(1, 2)) / s,
        )
    } else if m11 > m22 {
        let s = (1.0 + m11 - m00 - m22).sqrt() * 2.0;
        Quaternion::new(
            (m.at(0, 1) + m.at(1, 0)) / s,
            0.25 * s,
            (m.at(1, 2) + m.at(2, 1)) / s,
            (m.at(0, 2) - m.at(2, 0)) / s,
        )
    } else {
        let s = (1.0 + m22 - m00 - m11).sqrt() * 2.0;
        Quaternion::new(
            (m.at(0, 2) + m.at(2, 0)) / s,
            (m.at(1, 2) + m.at(2, 1)) / s,
            0.25 * s,
            (m.at(1, 0) - m.at(0, 1)) / s,
        )
    };

    q.normalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_translation_extraction() {
        let m = Matrix4::from_translation(Vector3D::new(0.1, 1.2, -0.5));
        assert_eq!(translation(&m), Point3D::new(0.1, 1.2, -0.5));
        assert_eq!(translation(&Matrix4::IDENTITY), Point3D::ORIGIN);
    }

    #[test]
    fn test_rotation_round_trips_through_matrix() {
        for (axis, angle) in [
            (Vector3D::Y, PI / 2.0),
            (Vector3D::X, PI),
            (Vector3D::new(1.0, 2.0, -1.0), 2.5),
            (Vector3D::Z, -0.3),
        ] {
            let q = Quaternion::from_axis_angle(axis, angle);
            let m = Matrix4::from_rotation_translation(q, Vector3D::new(1.0, 0.0, 0.0));
            assert!(rotation(&m).approx_eq(&q, 0.0001), "axis {:?} angle {}", axis, angle);
        }
    }

    #[test]
    fn test_compose_joint_into_world() {
        // Hand turned a quarter turn about +Y and lifted 1m; joint 0.1m along hand +X
        let origin_from_anchor = Matrix4::from_rotation_translation(
            Quaternion::from_axis_angle(Vector3D::Y, PI / 2.0),
            Vector3D::new(0.0, 1.0, 0.0),
        );
        let anchor_from_joint = Matrix4::from_translation(Vector3D::new(0.1, 0.0, 0.0));

        let world = translation(&compose(&origin_from_anchor, &anchor_from_joint));
        assert!(world.distance(&Point3D::new(0.0, 1.0, -0.1)) < 0.0001);
    }

    #[test]
    fn test_identity_is_neutral() {
        let m = Matrix4::from_rotation_translation(
            Quaternion::from_axis_angle(Vector3D::X, 0.4),
            Vector3D::new(3.0, 2.0, 1.0),
        );
        assert!(compose(&Matrix4::IDENTITY, &m).approx_eq(&m, 0.0001));
        assert!(compose(&m, &Matrix4::IDENTITY).approx_eq(&m, 0.0001));
    }
}
