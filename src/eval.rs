use std::collections::HashSet;

use image::{GrayImage, Luma};
use imageproc::drawing::draw_filled_circle_mut;
use imageproc::geometric_transformations::{warp, Interpolation, Projection};

use crate::{BenchErr, Homography, KeyPoint, Match, Result, VisibilityMask};

/// Outcome of a correspondence count between two keypoint sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Correspondences {
    /// Keypoints that landed inside the shared visible region.
    pub common: usize,
    /// Of those, the ones with a counterpart under the distance threshold.
    pub corresponding: usize,
}

impl Correspondences {
    /// Fraction of common keypoints that reappear at the transformed
    /// location. Zero when nothing is common, and always within [0, 1]
    /// because `corresponding` is counted over the common set.
    pub fn repeatability(&self) -> f64 {
        if self.common == 0 {
            0.
        } else {
            self.corresponding as f64 / self.common as f64
        }
    }
}

/// Distance-threshold correspondence policy.
///
/// `moving` keypoints are projected through `h` into the frame of `fixed`
/// and the mask; both sets are then restricted to the visible region. A
/// projected keypoint corresponds when its nearest visible fixed keypoint
/// lies under `threshold` pixels.
pub fn distance_correspondences(
    fixed: &[KeyPoint],
    moving: &[KeyPoint],
    h: &Homography,
    mask: &VisibilityMask,
    threshold: f64,
) -> Correspondences {
    let anchors: Vec<_> = fixed
        .iter()
        .map(KeyPoint::pt)
        .filter(|p| mask.contains(*p))
        .collect();
    let projected: Vec<_> = moving
        .iter()
        .map(|kp| h.transform(kp.pt()))
        .filter(|p| mask.contains(*p))
        .collect();

    let mut corresponding = 0;
    for p in &projected {
        let near = anchors
            .iter()
            .any(|a| (a - p).norm() < threshold);
        if near {
            corresponding += 1;
        }
    }
    Correspondences {
        common: projected.len(),
        corresponding,
    }
}

/// Area-overlap correspondence policy.
///
/// Both keypoints are rasterized as filled circles of radius size/2 on
/// frame-sized canvases; the circle of `moving` is warped through `h` into
/// the frame of `fixed` and the intersection-over-union of the two binary
/// regions is returned. Disjoint or degenerate circles score 0.
pub fn circle_overlap(
    fixed: &KeyPoint,
    moving: &KeyPoint,
    h: &Homography,
    width: u32,
    height: u32,
) -> Result<f64> {
    let m = h.matrix();
    #[rustfmt::skip]
    let coeffs = [
        m[(0, 0)] as f32, m[(0, 1)] as f32, m[(0, 2)] as f32,
        m[(1, 0)] as f32, m[(1, 1)] as f32, m[(1, 2)] as f32,
        m[(2, 0)] as f32, m[(2, 1)] as f32, m[(2, 2)] as f32,
    ];
    let projection = Projection::from_matrix(coeffs).ok_or(BenchErr::Singular)?;

    let fixed_circle = render_circle(fixed, width, height);
    let moving_circle = render_circle(moving, width, height);
    let warped = warp(
        &moving_circle,
        &projection,
        Interpolation::Nearest,
        Luma([0u8]),
    );

    let mut intersection = 0u64;
    let mut union = 0u64;
    for (a, b) in fixed_circle.pixels().zip(warped.pixels()) {
        let a = a[0] > 128;
        let b = b[0] > 128;
        if a && b {
            intersection += 1;
        }
        if a || b {
            union += 1;
        }
    }
    if union == 0 {
        Ok(0.)
    } else {
        Ok(intersection as f64 / union as f64)
    }
}

fn render_circle(kp: &KeyPoint, width: u32, height: u32) -> GrayImage {
    let mut canvas = GrayImage::new(width, height);
    draw_filled_circle_mut(
        &mut canvas,
        (kp.x.round() as i32, kp.y.round() as i32),
        kp.radius().round() as i32,
        Luma([255u8]),
    );
    canvas
}

/// Decide which matches are geometrically correct.
///
/// A match corresponds when the query keypoint, projected through `h` into
/// the train/base frame, is visible in `mask` and its circle overlaps the
/// train keypoint's circle by more than `min_overlap`. Returns the indices
/// into `matches` of the corresponding ones.
pub fn match_correspondences(
    matches: &[Match],
    train_kps: &[KeyPoint],
    query_kps: &[KeyPoint],
    h: &Homography,
    mask: &VisibilityMask,
    min_overlap: f64,
) -> Result<HashSet<usize>> {
    let mut corresponding = HashSet::new();
    for (i, m) in matches.iter().enumerate() {
        let query = &query_kps[m.query];
        let train = &train_kps[m.train];
        if !mask.contains(h.transform(query.pt())) {
            continue;
        }
        let overlap = circle_overlap(train, query, h, mask.width(), mask.height())?;
        if overlap > min_overlap {
            corresponding.insert(i);
        }
    }
    Ok(corresponding)
}

/// One point of a precision/recall curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrPoint {
    /// Match-acceptance distance threshold this point was computed at.
    pub threshold: f32,
    /// 1 - TP/(TP+FP), the benchmarks' historical "precision" column.
    /// Zero when the threshold accepts nothing.
    pub precision: f64,
    /// TP / |corresponding|. Zero when nothing corresponds.
    pub recall: f64,
}

/// Sweep a match-acceptance threshold over the observed distance range.
///
/// `steps` linearly spaced thresholds between the minimum and maximum match
/// distance; a match is accepted when its distance is strictly below the
/// threshold. Recall is non-decreasing in the threshold since the
/// correspondence set is fixed across the sweep.
pub fn precision_recall(
    matches: &[Match],
    corresponding: &HashSet<usize>,
    steps: usize,
) -> Vec<PrPoint> {
    if matches.is_empty() || steps == 0 {
        return Vec::new();
    }
    let lower = matches.iter().map(|m| m.distance).fold(f32::INFINITY, f32::min);
    let upper = matches
        .iter()
        .map(|m| m.distance)
        .fold(f32::NEG_INFINITY, f32::max);

    let mut curve = Vec::with_capacity(steps);
    for i in 0..steps {
        let t = if steps == 1 {
            upper
        } else {
            lower + (upper - lower) * i as f32 / (steps - 1) as f32
        };

        let mut tp = 0usize;
        let mut fp = 0usize;
        for (j, m) in matches.iter().enumerate() {
            if m.distance < t {
                if corresponding.contains(&j) {
                    tp += 1;
                } else {
                    fp += 1;
                }
            }
        }

        // An empty acceptance set contributes (0, 0) rather than the old
        // TP=1 substitution, which faked a true positive out of thin air.
        let precision = if tp + fp == 0 {
            0.
        } else {
            1. - tp as f64 / (tp + fp) as f64
        };
        let recall = if corresponding.is_empty() {
            0.
        } else {
            tp as f64 / corresponding.len() as f64
        };
        curve.push(PrPoint {
            threshold: t,
            precision,
            recall,
        });
    }
    curve
}
