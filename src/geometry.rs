use std::fs;
use std::path::Path;

use nalgebra::{Matrix3, Point2, Vector3};

use crate::{BenchErr, Result};

/// A 3x3 projective transform relating two views of the same planar scene.
///
/// The benchmark datasets store one of these per non-base image, as nine
/// whitespace-separated numbers in a text file named `H1toNp`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Homography(Matrix3<f64>);

impl Homography {
    pub fn new(m: Matrix3<f64>) -> Self {
        Homography(m)
    }

    pub fn identity() -> Self {
        Homography(Matrix3::identity())
    }

    /// A pure translation by (tx, ty). Mostly useful in tests.
    pub fn translation(tx: f64, ty: f64) -> Self {
        Homography(Matrix3::new(1., 0., tx, 0., 1., ty, 0., 0., 1.))
    }

    /// Parse a homography from a `H1toNp` style text file.
    ///
    /// The file must hold exactly nine numbers; anything else is a fatal
    /// error, there is no recovery for malformed ground truth.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        Self::parse(&text).map_err(|detail| BenchErr::Homography {
            path: path.to_path_buf(),
            detail,
        })
    }

    fn parse(text: &str) -> std::result::Result<Self, String> {
        let mut values = [0f64; 9];
        let mut count = 0;
        for token in text.split_whitespace() {
            if count == 9 {
                return Err("more than 9 entries".into());
            }
            values[count] = token
                .parse::<f64>()
                .map_err(|_| format!("bad entry {:?}", token))?;
            count += 1;
        }
        if count < 9 {
            return Err(format!("expected 9 entries, found {}", count));
        }
        Ok(Homography(Matrix3::from_row_slice(&values)))
    }

    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.0
    }

    /// Transform a 2D point, like `warpPerspective` for a single point.
    ///
    /// The point is lifted to homogeneous coordinates, multiplied and divided
    /// by the third coordinate. A zero third coordinate (point at infinity)
    /// yields non-finite output, which every visibility test downstream
    /// treats as "not visible".
    pub fn transform(&self, p: Point2<f64>) -> Point2<f64> {
        let v = self.0 * Vector3::new(p.x, p.y, 1.);
        Point2::new(v.x / v.z, v.y / v.z)
    }

    pub fn inverse(&self) -> Result<Self> {
        self.0
            .try_inverse()
            .map(Homography)
            .ok_or(BenchErr::Singular)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};

    // Roughly the bark/H1to3p matrix from the Oxford affine dataset.
    fn projective() -> Homography {
        Homography::new(Matrix3::new(
            0.3199, -0.0220, 199.17, 0.2427, 0.6468, 36.23, 0.0006, -0.0002, 1.0,
        ))
    }

    #[test]
    fn identity_leaves_points_unchanged() {
        let h = Homography::identity();
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let p = Point2::new(rng.gen_range(-500.0..500.0), rng.gen_range(-500.0..500.0));
            let t = h.transform(p);
            assert!((t.x - p.x).abs() < 1e-12);
            assert!((t.y - p.y).abs() < 1e-12);
        }
    }

    #[test]
    fn inverse_round_trips() {
        let h = projective();
        let hi = h.inverse().unwrap();
        let mut rng = rand::rngs::StdRng::seed_from_u64(11);
        for _ in 0..100 {
            let p = Point2::new(rng.gen_range(0.0..800.0), rng.gen_range(0.0..600.0));
            let back = hi.transform(h.transform(p));
            assert!((back.x - p.x).abs() < 1e-6);
            assert!((back.y - p.y).abs() < 1e-6);
        }
    }

    #[test]
    fn translation_moves_origin() {
        let h = Homography::translation(100., 100.);
        let t = h.transform(Point2::new(0., 0.));
        assert_eq!((t.x, t.y), (100., 100.));
    }

    #[test]
    fn singular_matrix_has_no_inverse() {
        let h = Homography::new(Matrix3::zeros());
        assert!(matches!(h.inverse(), Err(BenchErr::Singular)));
    }

    #[test]
    fn parses_whitespace_separated_matrix() {
        let text = "0.5 0 10\n0 0.5 20\n0 0 1\n";
        let h = Homography::parse(text).unwrap();
        let t = h.transform(Point2::new(2., 4.));
        assert!((t.x - 11.).abs() < 1e-12);
        assert!((t.y - 22.).abs() < 1e-12);
    }

    #[test]
    fn rejects_short_and_corrupt_files() {
        assert!(Homography::parse("1 2 3 4").is_err());
        assert!(Homography::parse("1 2 3 4 5 6 7 8 x").is_err());
        assert!(Homography::parse("1 2 3 4 5 6 7 8 9 10").is_err());
    }
}
