use crate::{BenchErr, Result};

/// Detectors the benchmarks sweep over.
pub const DETECTORS: &[&str] = &[
    "Agast", "AKAZE", "BRISK", "Fast", "GFTT", "KAZE", "MSER", "ORB",
];

/// Descriptors the benchmarks sweep over.
pub const DESCRIPTORS: &[&str] = &["AKAZE", "BRISK", "KAZE", "ORB"];

/// Algorithms that detect and describe in one pass, for the combined
/// speed benchmark.
pub const COMBINED: &[&str] = &["AKAZE", "BRISK", "KAZE", "ORB"];

/// Distance norm a brute-force matcher should use for a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorNorm {
    /// Binary descriptors (AKAZE, BRISK, ORB).
    Hamming,
    /// Float descriptors (KAZE).
    L2,
}

pub fn is_detector(name: &str) -> bool {
    DETECTORS.contains(&name)
}

pub fn is_descriptor(name: &str) -> bool {
    DESCRIPTORS.contains(&name)
}

pub fn descriptor_norm(descriptor: &str) -> Result<DescriptorNorm> {
    match descriptor {
        "KAZE" => Ok(DescriptorNorm::L2),
        "AKAZE" | "BRISK" | "ORB" => Ok(DescriptorNorm::Hamming),
        other => Err(BenchErr::UnknownDescriptor(other.into())),
    }
}

/// Whether a detector/descriptor pairing is accepted by the backend.
///
/// The AKAZE and KAZE descriptors consume the nonlinear scale space their
/// own detectors build, so they pair only with AKAZE or KAZE keypoints.
pub fn valid_pairing(detector: &str, descriptor: &str) -> bool {
    match descriptor {
        "AKAZE" | "KAZE" => matches!(detector, "AKAZE" | "KAZE"),
        _ => true,
    }
}

/// Column label for a detector/descriptor combination.
pub fn label(detector: &str, descriptor: &str) -> String {
    format!("{}/{}", detector, descriptor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn akaze_descriptor_requires_akaze_or_kaze_detector() {
        assert!(valid_pairing("AKAZE", "AKAZE"));
        assert!(valid_pairing("KAZE", "AKAZE"));
        assert!(valid_pairing("KAZE", "KAZE"));
        assert!(!valid_pairing("ORB", "AKAZE"));
        assert!(!valid_pairing("BRISK", "KAZE"));
        assert!(!valid_pairing("Fast", "AKAZE"));
    }

    #[test]
    fn binary_descriptors_pair_with_any_detector() {
        for det in DETECTORS {
            assert!(valid_pairing(det, "ORB"));
            assert!(valid_pairing(det, "BRISK"));
        }
    }

    #[test]
    fn kaze_is_the_only_float_descriptor() {
        assert_eq!(descriptor_norm("KAZE").unwrap(), DescriptorNorm::L2);
        for desc in DESCRIPTORS.iter().filter(|d| **d != "KAZE") {
            assert_eq!(descriptor_norm(desc).unwrap(), DescriptorNorm::Hamming);
        }
    }

    #[test]
    fn unknown_descriptor_is_a_configuration_error() {
        assert!(matches!(
            descriptor_norm("SURF"),
            Err(BenchErr::UnknownDescriptor(_))
        ));
    }

    #[test]
    fn labels_join_with_a_slash() {
        assert_eq!(label("ORB", "BRISK"), "ORB/BRISK");
    }
}
