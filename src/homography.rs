//! Planar homography value type.
//!
//! A [`Homography`] maps homogeneous source coordinates to destination
//! coordinates, `(x', y', w') = H · (x, y, 1)`. Projection refuses points whose
//! homogeneous denominator is (near) zero instead of dividing through, so
//! scoring code can skip unstable points without producing NaN or infinite
//! errors.
use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

const EPS: f32 = 1e-9;

/// 3×3 projective transform, serialized as nine row-major floats.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 9]", into = "[f32; 9]")]
pub struct Homography {
    mtx: Matrix3<f32>,
}

impl Default for Homography {
    fn default() -> Self {
        Self::identity()
    }
}

impl Homography {
    pub fn identity() -> Self {
        Self {
            mtx: Matrix3::identity(),
        }
    }

    /// Pure image-plane translation by `(dx, dy)`.
    pub fn translation(dx: f32, dy: f32) -> Self {
        Self {
            mtx: Matrix3::new(1.0, 0.0, dx, 0.0, 1.0, dy, 0.0, 0.0, 1.0),
        }
    }

    pub fn from_matrix(mtx: Matrix3<f32>) -> Self {
        Self { mtx }
    }

    pub fn from_row_major(values: [f32; 9]) -> Self {
        Self {
            mtx: Matrix3::from_row_slice(&values),
        }
    }

    pub fn to_row_major(&self) -> [f32; 9] {
        let m = &self.mtx;
        [
            m[(0, 0)],
            m[(0, 1)],
            m[(0, 2)],
            m[(1, 0)],
            m[(1, 1)],
            m[(1, 2)],
            m[(2, 0)],
            m[(2, 1)],
            m[(2, 2)],
        ]
    }

    pub fn matrix(&self) -> &Matrix3<f32> {
        &self.mtx
    }

    pub fn is_finite(&self) -> bool {
        self.mtx.iter().all(|v| v.is_finite())
    }

    /// Project a source point. Returns `None` when `w'` is near zero or any
    /// component is not finite.
    #[inline]
    pub fn project(&self, p: [f32; 2]) -> Option<[f32; 2]> {
        let v = self.mtx * Vector3::new(p[0], p[1], 1.0);
        let w = v[2];
        if !w.is_finite() || w.abs() <= EPS || !v[0].is_finite() || !v[1].is_finite() {
            return None;
        }
        let out = [v[0] / w, v[1] / w];
        (out[0].is_finite() && out[1].is_finite()).then_some(out)
    }

    /// Squared distance between `H · src` and `dst`, `None` for unstable
    /// projections.
    #[inline]
    pub fn reprojection_error_sq(&self, src: [f32; 2], dst: [f32; 2]) -> Option<f32> {
        let p = self.project(src)?;
        let dx = p[0] - dst[0];
        let dy = p[1] - dst[1];
        Some(dx * dx + dy * dy)
    }

    /// Frobenius norm of `self - other` relative to the norm of `other`.
    pub fn relative_change(&self, other: &Homography) -> f32 {
        frobenius_norm(&(self.mtx - other.mtx)) / (frobenius_norm(&other.mtx) + 1e-6)
    }
}

impl From<[f32; 9]> for Homography {
    fn from(values: [f32; 9]) -> Self {
        Self::from_row_major(values)
    }
}

impl From<Homography> for [f32; 9] {
    fn from(h: Homography) -> Self {
        h.to_row_major()
    }
}

/// Projects every point, failing as a whole if any projection is unstable.
pub fn apply_homography_points(h: &Homography, pts: &[[f32; 2]]) -> Option<Vec<[f32; 2]>> {
    pts.iter().map(|&p| h.project(p)).collect()
}

fn frobenius_norm(m: &Matrix3<f32>) -> f32 {
    let mut sum = 0.0f32;
    for i in 0..3 {
        for j in 0..3 {
            sum += m[(i, j)] * m[(i, j)];
        }
    }
    sum.sqrt()
}
