use std::collections::HashSet;
use std::path::PathBuf;

use clap::Parser;
use log::info;

use kpbench::eval::PrPoint;
use kpbench::{
    dataset, eval, opencv_utils, plot, registry, report, Match, Result, VisibilityMask,
};

/// Precision/recall benchmark: match every image of a scene against the
/// base image with a fixed detector and each descriptor in turn, decide
/// which matches are geometrically correct via the ground-truth homography,
/// then sweep the acceptance threshold over the observed distance range.
#[derive(Parser, Debug)]
#[command(name = "precision-recall")]
struct Args {
    /// Scene directories to scan (e.g. bark boat graf).
    #[arg(required = true)]
    dirs: Vec<PathBuf>,

    /// Detector supplying the keypoints for every descriptor.
    #[arg(long, default_value = "AKAZE")]
    detector: String,

    /// Circle intersection-over-union above which a match counts as correct.
    #[arg(long, default_value_t = 0.4)]
    min_overlap: f64,

    /// Number of thresholds in the sweep.
    #[arg(long, default_value_t = 20)]
    steps: usize,

    /// Directory the CSVs and chart are written into.
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

    let mut curves: Vec<(String, Vec<PrPoint>)> = Vec::new();

    for (i, descriptor) in registry::DESCRIPTORS.iter().enumerate() {
        info!(
            "Running test {}/{} - {}",
            i + 1,
            registry::DESCRIPTORS.len(),
            descriptor
        );
        let mut algo = match opencv_utils::DetectorDescriptor::paired(&args.detector, descriptor)? {
            Some(algo) => algo,
            None => {
                info!("Invalid combination - {}/{}", args.detector, descriptor);
                continue;
            }
        };
        let norm = registry::descriptor_norm(descriptor)?;

        // Matches accumulate across every scene and image; the
        // correspondence set tracks their indices in the combined list.
        let mut all_matches: Vec<Match> = Vec::new();
        let mut corresponding: HashSet<usize> = HashSet::new();

        for scene in &scenes {
            let base_img = opencv_utils::load_grayscale(&scene.base().path)?;
            let (width, height) = opencv_utils::frame_size(&base_img);
            let base_kps_cv = algo.detect(&base_img);
            let (base_kps_cv, base_des) = algo.compute(&base_img, base_kps_cv)?;
            let base_kps = opencv_utils::to_keypoints(&base_kps_cv);

            for image in scene.others() {
                info!("Processing file {}", image.index);
                let img = opencv_utils::load_grayscale(&image.path)?;
                let kps_cv = algo.detect(&img);
                let (kps_cv, des) = algo.compute(&img, kps_cv)?;
                let kps = opencv_utils::to_keypoints(&kps_cv);

                let matches = opencv_utils::match_descriptors(&des, &base_des, norm)?;

                // Correctness is judged in the base frame.
                let hi = scene.homography_to(image.index)?.inverse()?;
                let mask = VisibilityMask::new(width, height, &hi)?;
                let correct = eval::match_correspondences(
                    &matches,
                    &base_kps,
                    &kps,
                    &hi,
                    &mask,
                    args.min_overlap,
                )?;

                let offset = all_matches.len();
                corresponding.extend(correct.into_iter().map(|j| j + offset));
                all_matches.extend(matches);
            }
        }

        let curve = eval::precision_recall(&all_matches, &corresponding, args.steps);
        curves.push((descriptor.to_string(), curve));
    }

    let out = report::ensure_dir(&args.output)?;

    let mut precision = report::MetricTable::new();
    let mut recall = report::MetricTable::new();
    for (label, curve) in &curves {
        precision.insert(label.clone(), curve.iter().map(|p| p.precision).collect());
        recall.insert(label.clone(), curve.iter().map(|p| p.recall).collect());
    }
    precision.write_csv(out.join("precision.csv"))?;
    recall.write_csv(out.join("recall.csv"))?;

    plot::precision_recall_chart(out.join("precisionrecall.svg"), &curves)?;

    Ok(())
}
