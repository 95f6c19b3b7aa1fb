use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// A detected salient image location with position and scale.
///
/// Detection itself is delegated to the vision backend; this type only
/// carries what the evaluation needs, so the core stays buildable and
/// testable without opencv.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeyPoint {
    pub x: f64,
    pub y: f64,
    /// Diameter of the meaningful neighbourhood, as reported by the detector.
    pub size: f64,
}

impl KeyPoint {
    pub fn new(x: f64, y: f64, size: f64) -> Self {
        KeyPoint { x, y, size }
    }

    pub fn pt(&self) -> Point2<f64> {
        Point2::new(self.x, self.y)
    }

    pub fn radius(&self) -> f64 {
        self.size / 2.
    }
}

/// A nearest-neighbour match between two descriptor sets.
///
/// `query` indexes the test image's keypoints, `train` the base image's.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Match {
    pub query: usize,
    pub train: usize,
    pub distance: f32,
}

impl Match {
    pub fn new(query: usize, train: usize, distance: f32) -> Self {
        Match {
            query,
            train,
            distance,
        }
    }
}
