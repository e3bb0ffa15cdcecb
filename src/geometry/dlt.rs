//! Normalized direct linear transform (DLT) for homographies.
//!
//! Both the minimal four-point solve used by RANSAC and the overdetermined
//! least-squares fit used by the refiner go through [`fit_homography`]:
//! points are Hartley-normalized (centroid at the origin, mean distance √2),
//! the 9×9 scatter matrix `AᵀA` of the stacked DLT rows is accumulated, and
//! the eigenvector of its smallest eigenvalue gives `h`. For more than four
//! points this is the total least-squares solution over all correspondences.
use crate::homography::Homography;
use nalgebra::{Matrix3, SMatrix, SVector, SymmetricEigen};
use thiserror::Error;

/// Minimal number of point pairs determining a homography.
pub const MIN_POINTS: usize = 4;

/// Samples whose triples span an angle with sine below this are collinear.
const MIN_SINE: f64 = 1e-3;
/// Relative gap required between the two smallest eigenvalues.
const NULLSPACE_RATIO: f64 = 1e-10;

type Mat9 = SMatrix<f64, 9, 9>;
type Vec9 = SVector<f64, 9>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DltError {
    #[error("need at least 4 point correspondences, got {0}")]
    NotEnoughPoints(usize),
    #[error("source and destination point counts differ ({src} vs {dst})")]
    LengthMismatch { src: usize, dst: usize },
    #[error("degenerate point configuration")]
    Degenerate,
    #[error("solution is not finite")]
    NonFinite,
}

/// Estimates `H` with `dst ~ H · src`.
pub fn fit_homography(src: &[[f32; 2]], dst: &[[f32; 2]]) -> Result<Homography, DltError> {
    if src.len() != dst.len() {
        return Err(DltError::LengthMismatch {
            src: src.len(),
            dst: dst.len(),
        });
    }
    if src.len() < MIN_POINTS {
        return Err(DltError::NotEnoughPoints(src.len()));
    }

    let (src_n, t_src) = normalize_points(src).ok_or(DltError::Degenerate)?;
    let (dst_n, t_dst) = normalize_points(dst).ok_or(DltError::Degenerate)?;

    let mut ata = Mat9::zeros();
    for (p, q) in src_n.iter().zip(&dst_n) {
        let (x, y) = (p[0], p[1]);
        let (u, v) = (q[0], q[1]);
        let r0 = Vec9::from_column_slice(&[-x, -y, -1.0, 0.0, 0.0, 0.0, u * x, u * y, u]);
        let r1 = Vec9::from_column_slice(&[0.0, 0.0, 0.0, -x, -y, -1.0, v * x, v * y, v]);
        ata += r0 * r0.transpose();
        ata += r1 * r1.transpose();
    }

    let eig = SymmetricEigen::new(ata);
    let mut order: Vec<usize> = (0..9).collect();
    order.sort_by(|&a, &b| eig.eigenvalues[a].total_cmp(&eig.eigenvalues[b]));
    let smallest = eig.eigenvalues[order[0]];
    let runner_up = eig.eigenvalues[order[1]];
    let largest = eig.eigenvalues[order[8]];
    if !largest.is_finite() || largest <= 0.0 {
        return Err(DltError::Degenerate);
    }
    // A null space of dimension > 1 leaves H undetermined.
    if runner_up <= NULLSPACE_RATIO * largest || runner_up <= smallest.abs() {
        return Err(DltError::Degenerate);
    }

    let h = eig.eigenvectors.column(order[0]);
    let hn = Matrix3::new(h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], h[8]);
    let t_dst_inv = inverse_similarity(&t_dst);
    let h_full = t_dst_inv * hn * t_src;
    let h_full = normalize_scale(h_full).ok_or(DltError::Degenerate)?;

    let h32 = h_full.map(|v| v as f32);
    let out = Homography::from_matrix(h32);
    if !out.is_finite() {
        return Err(DltError::NonFinite);
    }
    Ok(out)
}

/// True when the sample cannot determine a homography: two coincident
/// points or three (near-)collinear ones.
pub fn is_degenerate_sample(pts: &[[f32; 2]]) -> bool {
    let n = pts.len();
    for i in 0..n {
        for j in (i + 1)..n {
            for k in (j + 1)..n {
                if nearly_collinear(pts[i], pts[j], pts[k]) {
                    return true;
                }
            }
        }
    }
    false
}

fn nearly_collinear(a: [f32; 2], b: [f32; 2], c: [f32; 2]) -> bool {
    let (ax, ay) = (a[0] as f64, a[1] as f64);
    let abx = b[0] as f64 - ax;
    let aby = b[1] as f64 - ay;
    let acx = c[0] as f64 - ax;
    let acy = c[1] as f64 - ay;
    let bcx = c[0] as f64 - b[0] as f64;
    let bcy = c[1] as f64 - b[1] as f64;
    let lab = (abx * abx + aby * aby).sqrt();
    let lac = (acx * acx + acy * acy).sqrt();
    let lbc = (bcx * bcx + bcy * bcy).sqrt();
    let longest = lab.max(lac).max(lbc);
    if longest <= f64::EPSILON {
        return true;
    }
    let shortest = lab.min(lac).min(lbc);
    if shortest <= longest * MIN_SINE {
        return true;
    }
    // |cross| = 2 · area; dividing by the two sides at the widest vertex
    // gives the sine of the largest angle, which is ~0 for collinear points.
    let cross = (abx * acy - aby * acx).abs();
    let (s1, s2) = if longest == lab {
        (lac, lbc)
    } else if longest == lac {
        (lab, lbc)
    } else {
        (lab, lac)
    };
    cross <= MIN_SINE * s1 * s2
}

/// Hartley normalization; `None` when all points coincide.
fn normalize_points(pts: &[[f32; 2]]) -> Option<(Vec<[f64; 2]>, Matrix3<f64>)> {
    let n = pts.len() as f64;
    let (mut cx, mut cy) = (0.0f64, 0.0f64);
    for p in pts {
        cx += p[0] as f64;
        cy += p[1] as f64;
    }
    cx /= n;
    cy /= n;

    let mut mean_dist = 0.0f64;
    for p in pts {
        let dx = p[0] as f64 - cx;
        let dy = p[1] as f64 - cy;
        mean_dist += (dx * dx + dy * dy).sqrt();
    }
    mean_dist /= n;
    if !mean_dist.is_finite() || mean_dist <= 1e-12 {
        return None;
    }
    let s = std::f64::consts::SQRT_2 / mean_dist;

    let out = pts
        .iter()
        .map(|p| [s * (p[0] as f64 - cx), s * (p[1] as f64 - cy)])
        .collect();
    let t = Matrix3::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0);
    Some((out, t))
}

fn inverse_similarity(t: &Matrix3<f64>) -> Matrix3<f64> {
    let s = t[(0, 0)];
    let cx = -t[(0, 2)] / s;
    let cy = -t[(1, 2)] / s;
    Matrix3::new(1.0 / s, 0.0, cx, 0.0, 1.0 / s, cy, 0.0, 0.0, 1.0)
}

/// Scales so that `H[2,2] = 1`, or to unit Frobenius norm when `H[2,2]`
/// vanishes.
fn normalize_scale(h: Matrix3<f64>) -> Option<Matrix3<f64>> {
    let norm = h.norm();
    if !norm.is_finite() || norm <= f64::EPSILON {
        return None;
    }
    let h22 = h[(2, 2)];
    if h22.abs() > 1e-9 * norm {
        Some(h / h22)
    } else {
        Some(h / norm)
    }
}
