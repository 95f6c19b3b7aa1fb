use std::path::PathBuf;

use clap::Parser;
use log::info;

use kpbench::report::RepeatabilityRecord;
use kpbench::{dataset, eval, opencv_utils, plot, registry, report, Result, VisibilityMask};

/// Repeatability benchmark: how many of a detector's keypoints reappear at
/// the homography-mapped location in the other images of a scene.
#[derive(Parser, Debug)]
#[command(name = "repeatability")]
struct Args {
    /// Scene directories to scan (e.g. bark boat graf).
    #[arg(required = true)]
    dirs: Vec<PathBuf>,

    /// Pixel distance under which two keypoints correspond.
    #[arg(long, default_value_t = 2.0)]
    threshold: f64,

    /// Directory the CSV and chart are written into.
    #[arg(long, default_value = "results")]
    output: PathBuf,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let scenes = dataset::scan_dirs(&args.dirs)?;
    if scenes.is_empty() {
        eprintln!("none of the arguments is a scene directory");
        std::process::exit(2);
    }

    let mut records: Vec<RepeatabilityRecord> = Vec::new();

    for (i, detector) in registry::DETECTORS.iter().enumerate() {
        info!(
            "Running test {}/{} - {}",
            i + 1,
            registry::DETECTORS.len(),
            detector
        );
        let mut algo = opencv_utils::DetectorDescriptor::detector(detector)?;

        for scene in &scenes {
            let base_img = opencv_utils::load_grayscale(&scene.base().path)?;
            let (width, height) = opencv_utils::frame_size(&base_img);
            let base_kps = opencv_utils::to_keypoints(&algo.detect(&base_img));

            records.push(RepeatabilityRecord {
                detector: detector.to_string(),
                scene: scene.name(),
                image: scene.base().label(),
                common: base_kps.len(),
                corresponding: base_kps.len(),
                repeatability: 1.,
            });

            for image in scene.others() {
                info!("Processing file {}", image.index);
                let img = opencv_utils::load_grayscale(&image.path)?;
                let kps = opencv_utils::to_keypoints(&algo.detect(&img));

                // The ground truth maps base -> imgN; evaluation happens in
                // the base frame, so everything goes through the inverse.
                let hi = scene.homography_to(image.index)?.inverse()?;
                let mask = VisibilityMask::new(width, height, &hi)?;

                let c =
                    eval::distance_correspondences(&base_kps, &kps, &hi, &mask, args.threshold);
                records.push(RepeatabilityRecord {
                    detector: detector.to_string(),
                    scene: scene.name(),
                    image: image.label(),
                    common: c.common,
                    corresponding: c.corresponding,
                    repeatability: c.repeatability(),
                });
            }
        }
    }

    let out = report::ensure_dir(&args.output)?;
    report::write_records(out.join("repeatability.csv"), &records)?;

    // The chart skips the base rows, which are 1.0 by construction.
    let image_labels: Vec<String> = records
        .iter()
        .filter(|r| r.detector == registry::DETECTORS[0] && r.image != "img1")
        .map(|r| format!("{}/{}", r.scene, r.image))
        .collect();
    let series: Vec<(String, Vec<f64>)> = registry::DETECTORS
        .iter()
        .map(|d| {
            let values = records
                .iter()
                .filter(|r| r.detector == *d && r.image != "img1")
                .map(|r| r.repeatability)
                .collect();
            (d.to_string(), values)
        })
        .collect();
    plot::repeatability_chart(out.join("repeatability.svg"), &image_labels, &series)?;

    Ok(())
}
