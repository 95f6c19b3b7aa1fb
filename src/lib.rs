use std::path::PathBuf;

use thiserror::Error;

/// Homography matrices: parsing, point transforms, inversion.
pub mod geometry;
pub use geometry::Homography;

/// Visibility masks obtained by warping a filled frame through a homography.
pub mod mask;
pub use mask::VisibilityMask;

/// Plain keypoint and match types, decoupled from the vision backend.
pub mod keypoint;
pub use keypoint::{KeyPoint, Match};

/// Correspondence policies, repeatability and precision/recall sweeps.
///
/// This is the evaluation core: everything else in the crate exists to feed
/// keypoints and matches into these functions and to serialize what they
/// return.
pub mod eval;

/// Scene directories of test images and their ground-truth homographies.
pub mod dataset;
pub use dataset::Scene;

/// Names and pairing rules for the supported detectors and descriptors.
pub mod registry;

/// Utilities for detecting, describing and matching keypoints using opencv.
pub mod opencv_utils;
#[cfg(feature = "opencv")]
pub use opencv_utils::DetectorDescriptor;

/// CSV serialization of collected metrics.
pub mod report;

/// SVG charts of collected metrics.
pub mod plot;

pub type Result<T> = std::result::Result<T, BenchErr>;

#[derive(Error, Debug)]
pub enum BenchErr {
    #[error("Io Error")]
    Io(#[from] std::io::Error),
    #[error("Malformed homography file {path}: {detail}")]
    Homography { path: PathBuf, detail: String },
    #[error("Homography is not invertible")]
    Singular,
    #[error("Unsupported detector: {0}")]
    UnknownDetector(String),
    #[error("Unsupported descriptor: {0}")]
    UnknownDescriptor(String),
    #[error("No images matching imgN.<ext> under {0}")]
    EmptyScene(PathBuf),
    #[error("Scene {0} has no base image img1")]
    MissingBase(PathBuf),
    #[error("Csv Error")]
    Csv(#[from] csv::Error),
    #[error("Plot Error: {0}")]
    Plot(String),
    #[cfg(feature = "opencv")]
    #[error("Opencv Error")]
    OpenCvInternal(#[from] opencv::Error),
    #[cfg(feature = "opencv")]
    #[error("Could not read image {0}")]
    ImageRead(PathBuf),
}
