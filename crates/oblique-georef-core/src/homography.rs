use nalgebra::{DMatrix, Matrix3, Point2, SMatrix, SVector, Vector3};
use std::fmt;

/// Determinants below this are treated as singular.
pub const SINGULAR_EPS: f64 = 1e-12;

/// Twice the triangle area, in Hartley-normalised units, under which three
/// points count as collinear.
const COLLINEAR_EPS: f64 = 1e-9;

/// Which side of a correspondence a failure refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointSet {
    Source,
    Destination,
}

impl fmt::Display for PointSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointSet::Source => f.write_str("source"),
            PointSet::Destination => f.write_str("destination"),
        }
    }
}

/// The correspondences do not determine a unique, invertible homography.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegenerateHomography {
    #[error("need at least 4 correspondences of equal length (got {src} and {dst})")]
    NotEnoughPoints { src: usize, dst: usize },
    #[error("three of the {0} points are collinear")]
    Collinear(PointSet),
    #[error("homography linear system is singular")]
    Singular,
}

/// Planar projective transform, normalised so that `h[(2, 2)] == 1`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Homography {
    pub h: Matrix3<f64>,
}

impl Homography {
    pub fn new(h: Matrix3<f64>) -> Self {
        Self { h }
    }

    pub fn identity() -> Self {
        Self::new(Matrix3::identity())
    }

    pub fn from_array(rows: [[f64; 3]; 3]) -> Self {
        Self::new(Matrix3::from_fn(|r, c| rows[r][c]))
    }

    pub fn to_array(&self) -> [[f64; 3]; 3] {
        [
            [self.h[(0, 0)], self.h[(0, 1)], self.h[(0, 2)]],
            [self.h[(1, 0)], self.h[(1, 1)], self.h[(1, 2)]],
            [self.h[(2, 0)], self.h[(2, 1)], self.h[(2, 2)]],
        ]
    }

    /// Map `p`; points on the line at infinity come out non-finite.
    #[inline]
    pub fn apply(&self, p: Point2<f64>) -> Point2<f64> {
        let v = self.h * Vector3::new(p.x, p.y, 1.0);
        let w = v[2];
        Point2::new(v[0] / w, v[1] / w)
    }

    pub fn inverse(&self) -> Option<Self> {
        let inv = self.h.try_inverse()?;
        normalize_homography(inv).map(Self::new)
    }

    pub fn determinant(&self) -> f64 {
        self.h.determinant()
    }

    /// True when the projective row is `[0, 0, 1]` within `tol`.
    pub fn is_affine(&self, tol: f64) -> bool {
        self.h[(2, 0)].abs() <= tol && self.h[(2, 1)].abs() <= tol
    }
}

impl Default for Homography {
    fn default() -> Self {
        Self::identity()
    }
}

fn hartley_normalization(cx: f64, cy: f64, mean_dist: f64) -> Matrix3<f64> {
    let s = if mean_dist > 1e-12 {
        (2.0_f64).sqrt() / mean_dist
    } else {
        1.0
    };

    Matrix3::<f64>::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0)
}

fn normalize_points(pts: &[Point2<f64>]) -> (Vec<Point2<f64>>, Matrix3<f64>) {
    // Hartley normalization: translate to centroid, scale so mean distance = sqrt(2)
    let n = pts.len() as f64;
    let (sx, sy) = pts.iter().fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    let (cx, cy) = (sx / n, sy / n);

    let mean_dist = pts
        .iter()
        .map(|p| ((p.x - cx).powi(2) + (p.y - cy).powi(2)).sqrt())
        .sum::<f64>()
        / n;

    let t = hartley_normalization(cx, cy, mean_dist);

    let out = pts
        .iter()
        .map(|p| {
            let v = t * Vector3::new(p.x, p.y, 1.0);
            Point2::new(v[0], v[1])
        })
        .collect();
    (out, t)
}

fn normalize_homography(h: Matrix3<f64>) -> Option<Matrix3<f64>> {
    let s = h[(2, 2)];
    if s.abs() < SINGULAR_EPS {
        return None;
    }
    Some(h / s)
}

fn denormalize_homography(
    hn: Matrix3<f64>,
    t_src: Matrix3<f64>,
    t_dst: Matrix3<f64>,
) -> Option<Matrix3<f64>> {
    let t_dst_inv = t_dst.try_inverse()?;
    Some(t_dst_inv * hn * t_src)
}

#[inline]
fn twice_area(a: Point2<f64>, b: Point2<f64>, c: Point2<f64>) -> f64 {
    (b - a).perp(&(c - a))
}

/// Any three of four (normalised) points on one line?
fn has_collinear_triple(p: &[Point2<f64>]) -> bool {
    const TRIPLES: [[usize; 3]; 4] = [[0, 1, 2], [0, 1, 3], [0, 2, 3], [1, 2, 3]];
    TRIPLES
        .iter()
        .any(|&[i, j, k]| twice_area(p[i], p[j], p[k]).abs() < COLLINEAR_EPS)
}

fn finish(
    hn: Matrix3<f64>,
    t_src: Matrix3<f64>,
    t_dst: Matrix3<f64>,
) -> Result<Homography, DegenerateHomography> {
    let h = denormalize_homography(hn, t_src, t_dst)
        .and_then(normalize_homography)
        .ok_or(DegenerateHomography::Singular)?;
    let h = Homography::new(h);
    if !h.h.iter().all(|v| v.is_finite()) || h.determinant().abs() < SINGULAR_EPS {
        return Err(DegenerateHomography::Singular);
    }
    Ok(h)
}

/// Compute `H` such that `dst ~ H * src` from exactly four correspondences.
///
/// Corner order must be consistent between `src` and `dst`. Fails when three
/// points of either set are collinear or the 8×8 system is singular.
pub fn homography_from_4pt(
    src: &[Point2<f64>; 4],
    dst: &[Point2<f64>; 4],
) -> Result<Homography, DegenerateHomography> {
    // Unknowns: [h11 h12 h13 h21 h22 h23 h31 h32], with h33 = 1
    // For each correspondence (x,y)->(u,v):
    // h11 x + h12 y + h13 - u h31 x - u h32 y = u
    // h21 x + h22 y + h23 - v h31 x - v h32 y = v
    let (src_n, t_src) = normalize_points(src);
    let (dst_n, t_dst) = normalize_points(dst);

    if has_collinear_triple(&src_n) {
        return Err(DegenerateHomography::Collinear(PointSet::Source));
    }
    if has_collinear_triple(&dst_n) {
        return Err(DegenerateHomography::Collinear(PointSet::Destination));
    }

    let mut a = SMatrix::<f64, 8, 8>::zeros();
    let mut b = SVector::<f64, 8>::zeros();

    for k in 0..4 {
        let x = src_n[k].x;
        let y = src_n[k].y;
        let u = dst_n[k].x;
        let v = dst_n[k].y;

        let r0 = 2 * k;
        a[(r0, 0)] = x;
        a[(r0, 1)] = y;
        a[(r0, 2)] = 1.0;
        a[(r0, 6)] = -u * x;
        a[(r0, 7)] = -u * y;
        b[r0] = u;

        let r1 = 2 * k + 1;
        a[(r1, 3)] = x;
        a[(r1, 4)] = y;
        a[(r1, 5)] = 1.0;
        a[(r1, 6)] = -v * x;
        a[(r1, 7)] = -v * y;
        b[r1] = v;
    }

    let x = a.lu().solve(&b).ok_or(DegenerateHomography::Singular)?;

    let hn = Matrix3::<f64>::new(
        x[0], x[1], x[2], //
        x[3], x[4], x[5], //
        x[6], x[7], 1.0,
    );

    finish(hn, t_src, t_dst)
}

/// Least-squares DLT for `N >= 4` correspondences, `dst ~ H * src`.
///
/// Four points are delegated to [`homography_from_4pt`].
pub fn estimate_homography(
    src: &[Point2<f64>],
    dst: &[Point2<f64>],
) -> Result<Homography, DegenerateHomography> {
    if src.len() != dst.len() || src.len() < 4 {
        return Err(DegenerateHomography::NotEnoughPoints {
            src: src.len(),
            dst: dst.len(),
        });
    }

    if let (Ok(s4), Ok(d4)) = (
        <&[Point2<f64>; 4]>::try_from(src),
        <&[Point2<f64>; 4]>::try_from(dst),
    ) {
        return homography_from_4pt(s4, d4);
    }

    let (s, ts) = normalize_points(src);
    let (d, td) = normalize_points(dst);

    // Build A (2N x 9)
    let n = src.len();
    let mut a = DMatrix::<f64>::zeros(2 * n, 9);

    for k in 0..n {
        let (x, y) = (s[k].x, s[k].y);
        let (u, v) = (d[k].x, d[k].y);

        // [ -x -y -1   0  0  0   u*x u*y u ]
        a[(2 * k, 0)] = -x;
        a[(2 * k, 1)] = -y;
        a[(2 * k, 2)] = -1.0;
        a[(2 * k, 6)] = u * x;
        a[(2 * k, 7)] = u * y;
        a[(2 * k, 8)] = u;

        // [ 0  0  0  -x -y -1   v*x v*y v ]
        a[(2 * k + 1, 3)] = -x;
        a[(2 * k + 1, 4)] = -y;
        a[(2 * k + 1, 5)] = -1.0;
        a[(2 * k + 1, 6)] = v * x;
        a[(2 * k + 1, 7)] = v * y;
        a[(2 * k + 1, 8)] = v;
    }

    // Ah = 0: h is the right singular vector of the smallest singular value
    let svd = a.svd(true, true);
    let vt = svd.v_t.ok_or(DegenerateHomography::Singular)?;
    let last = vt.nrows().checked_sub(1).ok_or(DegenerateHomography::Singular)?;
    let h = vt.row(last);

    let hn =
        Matrix3::<f64>::from_row_slice(&[h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], h[8]]);

    finish(hn, ts, td)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Point2<f64>, b: Point2<f64>, tol: f64) {
        let dx = (a.x - b.x).abs();
        let dy = (a.y - b.y).abs();
        assert!(
            dx < tol && dy < tol,
            "expected ({:.6},{:.6}) ~ ({:.6},{:.6}) within {}",
            a.x,
            a.y,
            b.x,
            b.y,
            tol
        );
    }

    fn ground_truth() -> Homography {
        Homography::new(Matrix3::new(
            0.8, 0.05, 120.0, //
            -0.02, 1.1, 80.0, //
            0.0009, -0.0004, 1.0,
        ))
    }

    fn rect() -> [Point2<f64>; 4] {
        [
            Point2::new(0.0, 0.0),
            Point2::new(180.0, 0.0),
            Point2::new(180.0, 130.0),
            Point2::new(0.0, 130.0),
        ]
    }

    #[test]
    fn inverse_round_trips_points() {
        let h = Homography::new(Matrix3::new(
            1.2, 0.1, 5.0, //
            -0.05, 0.9, 3.0, //
            0.001, 0.0005, 1.0,
        ));
        let inv = h.inverse().expect("invertible");

        for p in [
            Point2::new(0.0, 0.0),
            Point2::new(50.0, -20.0),
            Point2::new(320.0, 200.0),
        ] {
            assert_close(inv.apply(h.apply(p)), p, 1e-9);
        }
    }

    #[test]
    fn four_point_specialization_recovers_h() {
        let gt = ground_truth();
        let dst = rect().map(|p| gt.apply(p));

        let recovered = homography_from_4pt(&rect(), &dst).expect("recoverable");

        for p in [
            Point2::new(0.0, 0.0),
            Point2::new(60.0, 40.0),
            Point2::new(150.0, 120.0),
        ] {
            assert_close(recovered.apply(p), gt.apply(p), 1e-6);
        }
    }

    #[test]
    fn correspondences_survive_forward_then_inverse() {
        let src = rect();
        let dst = src.map(|p| ground_truth().apply(p));
        let h = homography_from_4pt(&src, &dst).unwrap();
        let inv = h.inverse().unwrap();
        for (s, d) in src.iter().zip(dst.iter()) {
            assert_close(h.apply(*s), *d, 1e-6);
            assert_close(inv.apply(*d), *s, 1e-6);
        }
    }

    #[test]
    fn dlt_handles_overdetermined_case() {
        let gt = Homography::new(Matrix3::new(
            1.0, 0.2, 12.0, //
            -0.1, 0.9, 6.0, //
            0.0006, 0.0004, 1.0,
        ));

        let src: Vec<Point2<f64>> = (0..3)
            .flat_map(|y| (0..3).map(move |x| Point2::new(x as f64 * 40.0, y as f64 * 50.0)))
            .collect();
        let dst: Vec<Point2<f64>> = src.iter().map(|&p| gt.apply(p)).collect();

        let estimated = estimate_homography(&src, &dst).expect("estimate");
        for p in [
            Point2::new(0.0, 0.0),
            Point2::new(60.0, 40.0),
            Point2::new(80.0, 90.0),
            Point2::new(80.0, 100.0),
        ] {
            assert_close(estimated.apply(p), gt.apply(p), 1e-6);
        }
    }

    #[test]
    fn mismatched_input_lengths_fail() {
        let src = [Point2::new(0.0, 0.0); 4];
        let dst = [Point2::new(1.0, 1.0); 3];
        assert_eq!(
            estimate_homography(&src, &dst),
            Err(DegenerateHomography::NotEnoughPoints { src: 4, dst: 3 })
        );
    }

    #[test]
    fn collinear_corners_are_degenerate() {
        let src = [
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 0.0),
            Point2::new(20.0, 0.0),
            Point2::new(5.0, 8.0),
        ];
        assert_eq!(
            homography_from_4pt(&src, &rect()),
            Err(DegenerateHomography::Collinear(PointSet::Source))
        );
        assert_eq!(
            homography_from_4pt(&rect(), &src),
            Err(DegenerateHomography::Collinear(PointSet::Destination))
        );
    }

    #[test]
    fn scale_and_translation_stay_affine() {
        let src = rect();
        let dst = src.map(|p| Point2::new(2.5 * p.x - 7.0, 0.5 * p.y + 3.0));
        let h = homography_from_4pt(&src, &dst).unwrap();
        assert!(h.is_affine(1e-9));
        assert!(h.h[(0, 1)].abs() < 1e-9 && h.h[(1, 0)].abs() < 1e-9);
        assert!((h.h[(0, 0)] - 2.5).abs() < 1e-9);
        assert!((h.h[(1, 1)] - 0.5).abs() < 1e-9);
    }
}
