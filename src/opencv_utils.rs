#![cfg(feature = "opencv")]
use std::path::Path;

use log::warn;
use opencv::{self, core, features2d, imgcodecs, prelude::*};

use crate::registry::{self, DescriptorNorm};
use crate::{BenchErr, Match, Result};

type CvImage = opencv::prelude::Mat;
type CvMat = opencv::core::Mat;
type CvKeyPoints = opencv::types::VectorOfKeyPoint;
type CvMatches = opencv::types::VectorOfDMatch;

/// The `{detect, compute}` capability every backend algorithm is driven
/// through, regardless of which concrete opencv class sits behind it.
pub trait FeatureAlgo {
    fn detect(&mut self, image: &CvImage) -> opencv::Result<CvKeyPoints>;
    fn compute(
        &mut self,
        image: &CvImage,
        kps: CvKeyPoints,
    ) -> opencv::Result<(CvKeyPoints, CvMat)>;
    fn detect_and_compute(&mut self, image: &CvImage) -> opencv::Result<(CvKeyPoints, CvMat)>;
}

impl<T: Feature2DTrait> FeatureAlgo for T {
    fn detect(&mut self, image: &CvImage) -> opencv::Result<CvKeyPoints> {
        let mut kps = CvKeyPoints::new();
        let mask = CvMat::default()?;
        Feature2DTrait::detect(self, image, &mut kps, &mask)?;
        Ok(kps)
    }

    fn compute(
        &mut self,
        image: &CvImage,
        mut kps: CvKeyPoints,
    ) -> opencv::Result<(CvKeyPoints, CvMat)> {
        let mut desc = CvMat::default()?;
        Feature2DTrait::compute(self, image, &mut kps, &mut desc)?;
        Ok((kps, desc))
    }

    fn detect_and_compute(&mut self, image: &CvImage) -> opencv::Result<(CvKeyPoints, CvMat)> {
        let mut kps = CvKeyPoints::new();
        let mut desc = CvMat::default()?;
        let mask = CvMat::default()?;
        Feature2DTrait::detect_and_compute(self, image, &mask, &mut kps, &mut desc, false)?;
        Ok((kps, desc))
    }
}

type Constructor = fn() -> opencv::Result<Box<dyn FeatureAlgo>>;

fn make_agast() -> opencv::Result<Box<dyn FeatureAlgo>> {
    Ok(Box::new(features2d::AgastFeatureDetector::default()?))
}
fn make_akaze() -> opencv::Result<Box<dyn FeatureAlgo>> {
    Ok(Box::new(features2d::AKAZE::default()?))
}
fn make_brisk() -> opencv::Result<Box<dyn FeatureAlgo>> {
    Ok(Box::new(features2d::BRISK::default()?))
}
fn make_fast() -> opencv::Result<Box<dyn FeatureAlgo>> {
    Ok(Box::new(features2d::FastFeatureDetector::default()?))
}
fn make_gftt() -> opencv::Result<Box<dyn FeatureAlgo>> {
    Ok(Box::new(features2d::GFTTDetector::default()?))
}
fn make_kaze() -> opencv::Result<Box<dyn FeatureAlgo>> {
    Ok(Box::new(features2d::KAZE::default()?))
}
fn make_mser() -> opencv::Result<Box<dyn FeatureAlgo>> {
    Ok(Box::new(features2d::MSER::default()?))
}
fn make_orb() -> opencv::Result<Box<dyn FeatureAlgo>> {
    Ok(Box::new(features2d::ORB::default()?))
}

/// Name -> constructor tables. These replace the string dispatch chains the
/// benchmarks grew over time; the names line up with [`crate::registry`].
const DETECTOR_CONSTRUCTORS: &[(&str, Constructor)] = &[
    ("Agast", make_agast),
    ("AKAZE", make_akaze),
    ("BRISK", make_brisk),
    ("Fast", make_fast),
    ("GFTT", make_gftt),
    ("KAZE", make_kaze),
    ("MSER", make_mser),
    ("ORB", make_orb),
];

const DESCRIPTOR_CONSTRUCTORS: &[(&str, Constructor)] = &[
    ("AKAZE", make_akaze),
    ("BRISK", make_brisk),
    ("KAZE", make_kaze),
    ("ORB", make_orb),
];

fn construct(
    table: &[(&str, Constructor)],
    name: &str,
) -> Option<opencv::Result<Box<dyn FeatureAlgo>>> {
    table
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, ctor)| ctor())
}

/// A detector with an optional descriptor, addressed by name.
///
/// Per-image backend failures are logged and replaced with empty results so
/// a sweep over every combination keeps going; only configuration mistakes
/// (unknown names) are hard errors.
pub struct DetectorDescriptor {
    label: String,
    det: Box<dyn FeatureAlgo>,
    desc: Option<Box<dyn FeatureAlgo>>,
}

impl DetectorDescriptor {
    /// A bare detector, for tests that never describe.
    pub fn detector(name: &str) -> Result<Self> {
        let det = construct(DETECTOR_CONSTRUCTORS, name)
            .ok_or_else(|| BenchErr::UnknownDetector(name.into()))??;
        Ok(DetectorDescriptor {
            label: name.to_string(),
            det,
            desc: None,
        })
    }

    /// A detector/descriptor pair. `Ok(None)` means the pairing is rejected
    /// by the backend (AKAZE/KAZE descriptors on foreign keypoints) and the
    /// combination should be skipped, not aborted on.
    pub fn paired(detector: &str, descriptor: &str) -> Result<Option<Self>> {
        if !registry::is_descriptor(descriptor) {
            return Err(BenchErr::UnknownDescriptor(descriptor.into()));
        }
        if !registry::valid_pairing(detector, descriptor) {
            return Ok(None);
        }
        let det = construct(DETECTOR_CONSTRUCTORS, detector)
            .ok_or_else(|| BenchErr::UnknownDetector(detector.into()))??;
        let desc = construct(DESCRIPTOR_CONSTRUCTORS, descriptor)
            .ok_or_else(|| BenchErr::UnknownDescriptor(descriptor.into()))??;
        Ok(Some(DetectorDescriptor {
            label: registry::label(detector, descriptor),
            det,
            desc: Some(desc),
        }))
    }

    /// A full algorithm driven through `detect_and_compute`.
    pub fn combined(name: &str) -> Result<Self> {
        let det = construct(DESCRIPTOR_CONSTRUCTORS, name)
            .ok_or_else(|| BenchErr::UnknownDetector(name.into()))??;
        Ok(DetectorDescriptor {
            label: name.to_string(),
            det,
            desc: None,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Keypoints for an image; empty on backend failure.
    pub fn detect(&mut self, image: &CvImage) -> CvKeyPoints {
        match self.det.detect(image) {
            Ok(kps) => kps,
            Err(e) => {
                warn!("{}: detection failed: {}", self.label, e);
                CvKeyPoints::new()
            }
        }
    }

    /// Descriptors for the supplied keypoints; empty on backend failure or
    /// when no descriptor was configured.
    pub fn compute(&mut self, image: &CvImage, kps: CvKeyPoints) -> Result<(CvKeyPoints, CvMat)> {
        let algo = match self.desc.as_mut() {
            Some(algo) => algo,
            None => return Ok((CvKeyPoints::new(), CvMat::default()?)),
        };
        match algo.compute(image, kps) {
            Ok(out) => Ok(out),
            Err(e) => {
                warn!("{}: descriptor computation failed: {}", self.label, e);
                Ok((CvKeyPoints::new(), CvMat::default()?))
            }
        }
    }

    /// Detect and describe in one backend pass; empty on failure.
    pub fn detect_and_compute(&mut self, image: &CvImage) -> Result<(CvKeyPoints, CvMat)> {
        match self.det.detect_and_compute(image) {
            Ok(out) => Ok(out),
            Err(e) => {
                warn!("{}: detect_and_compute failed: {}", self.label, e);
                Ok((CvKeyPoints::new(), CvMat::default()?))
            }
        }
    }
}

/// Load an image as grayscale, the way every benchmark reads its inputs.
pub fn load_grayscale<P: AsRef<Path>>(path: P) -> Result<CvImage> {
    let path = path.as_ref();
    let img = imgcodecs::imread(&path.to_string_lossy(), imgcodecs::IMREAD_GRAYSCALE)?;
    if img.rows() == 0 {
        return Err(BenchErr::ImageRead(path.to_path_buf()));
    }
    Ok(img)
}

/// (width, height) of an image, for sizing masks and overlap canvases.
pub fn frame_size(image: &CvImage) -> (u32, u32) {
    (image.cols() as u32, image.rows() as u32)
}

/// Brute-force match query descriptors against train descriptors.
///
/// The norm comes from the descriptor's registry entry, not from sniffing
/// the matrix type. Either side being empty yields no matches.
pub fn match_descriptors(query: &CvMat, train: &CvMat, norm: DescriptorNorm) -> Result<Vec<Match>> {
    if query.rows() == 0 || train.rows() == 0 {
        return Ok(Vec::new());
    }
    let norm = match norm {
        DescriptorNorm::Hamming => core::NORM_HAMMING,
        DescriptorNorm::L2 => core::NORM_L2,
    };
    let mut matcher = features2d::BFMatcher::new(norm, false)?;
    let mut matches = CvMatches::new();
    matcher.train_match(query, train, &mut matches, &CvMat::default()?)?;
    Ok(to_matches(&matches))
}

/// Copy opencv keypoints into the crate's plain representation.
pub fn to_keypoints(kps: &CvKeyPoints) -> Vec<crate::KeyPoint> {
    kps.iter()
        .map(|kp| crate::KeyPoint::new(kp.pt().x as f64, kp.pt().y as f64, kp.size() as f64))
        .collect()
}

/// Copy opencv matches into the crate's plain representation.
pub fn to_matches(matches: &CvMatches) -> Vec<Match> {
    matches
        .iter()
        .map(|m| Match::new(m.query_idx as usize, m.train_idx as usize, m.distance))
        .collect()
}
