use image::{GrayImage, Luma};
use imageproc::geometric_transformations::{warp, Interpolation, Projection};
use nalgebra::Point2;

use crate::{BenchErr, Homography, Result};

/// Marks which pixels of a destination frame are covered by the source frame
/// under a homography.
///
/// Built the same way the benchmarks always built it: fill a frame-sized
/// buffer with 255, warp it through the homography, binarize at 128. A point
/// is "visible" when it lands on a lit pixel.
pub struct VisibilityMask {
    mask: GrayImage,
}

impl VisibilityMask {
    /// Warp a filled `width` x `height` frame through `h`.
    ///
    /// Returns `Singular` when the homography cannot be inverted for the
    /// backward sampling pass.
    pub fn new(width: u32, height: u32, h: &Homography) -> Result<Self> {
        let m = h.matrix();
        #[rustfmt::skip]
        let coeffs = [
            m[(0, 0)] as f32, m[(0, 1)] as f32, m[(0, 2)] as f32,
            m[(1, 0)] as f32, m[(1, 1)] as f32, m[(1, 2)] as f32,
            m[(2, 0)] as f32, m[(2, 1)] as f32, m[(2, 2)] as f32,
        ];
        let projection = Projection::from_matrix(coeffs).ok_or(BenchErr::Singular)?;

        let filled = GrayImage::from_pixel(width, height, Luma([255u8]));
        let mut warped = warp(&filled, &projection, Interpolation::Bilinear, Luma([0u8]));
        for p in warped.pixels_mut() {
            *p = if p[0] > 128 { Luma([255]) } else { Luma([0]) };
        }
        Ok(VisibilityMask { mask: warped })
    }

    /// A fully lit mask, i.e. the identity warp.
    pub fn full(width: u32, height: u32) -> Self {
        VisibilityMask {
            mask: GrayImage::from_pixel(width, height, Luma([255u8])),
        }
    }

    pub fn width(&self) -> u32 {
        self.mask.width()
    }

    pub fn height(&self) -> u32 {
        self.mask.height()
    }

    /// Whether `p` lands on a lit pixel.
    ///
    /// The point is rounded to the nearest pixel. Out-of-range and non-finite
    /// coordinates are "not visible" rather than an error, so projected
    /// points at infinity simply drop out.
    pub fn contains(&self, p: Point2<f64>) -> bool {
        if !p.x.is_finite() || !p.y.is_finite() {
            return false;
        }
        let x = p.x.round();
        let y = p.y.round();
        if x < 0. || y < 0. || x >= f64::from(self.mask.width()) || y >= f64::from(self.mask.height())
        {
            return false;
        }
        self.mask.get_pixel(x as u32, y as u32)[0] == 255
    }

    /// Number of lit pixels.
    pub fn coverage(&self) -> usize {
        self.mask.pixels().filter(|p| p[0] == 255).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_mask_is_fully_lit() {
        let mask = VisibilityMask::new(64, 48, &Homography::identity()).unwrap();
        assert_eq!(mask.coverage(), 64 * 48);
        for &(x, y) in &[(0., 0.), (63., 0.), (0., 47.), (63., 47.)] {
            assert!(mask.contains(Point2::new(x, y)));
        }
    }

    #[test]
    fn out_of_range_points_are_not_visible() {
        let mask = VisibilityMask::full(50, 50);
        assert!(!mask.contains(Point2::new(-1., 10.)));
        assert!(!mask.contains(Point2::new(10., -1.)));
        assert!(!mask.contains(Point2::new(50., 10.)));
        assert!(!mask.contains(Point2::new(10., 50.)));
        assert!(!mask.contains(Point2::new(f64::NAN, 10.)));
        assert!(!mask.contains(Point2::new(f64::INFINITY, 10.)));
    }

    #[test]
    fn far_translation_hides_the_whole_frame() {
        // Maps (0,0) -> (100,100): nothing of the source lands inside a
        // 50x50 destination.
        let h = Homography::translation(100., 100.);
        let mask = VisibilityMask::new(50, 50, &h).unwrap();
        assert_eq!(mask.coverage(), 0);
        assert!(!mask.contains(Point2::new(10., 10.)));
        assert!(!mask.contains(Point2::new(49., 49.)));
    }

    #[test]
    fn partial_translation_lights_the_overlap_only() {
        let h = Homography::translation(10., 10.);
        let mask = VisibilityMask::new(40, 40, &h).unwrap();
        assert!(!mask.contains(Point2::new(5., 5.)));
        assert!(!mask.contains(Point2::new(20., 5.)));
        assert!(mask.contains(Point2::new(15., 15.)));
        assert!(mask.contains(Point2::new(39., 39.)));
    }
}
