use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use log::info;

use kpbench::report::SpeedRecord;
use kpbench::{dataset, opencv_utils, plot, registry, report, Result};

/// Speed benchmark: time detect + compute for every detector/descriptor
/// combination over every test image.
#[derive(Parser, Debug)]
#[command(name = "speed")]
struct Args {
    /// Scene directories to scan (e.g. bark boat graf).
    #[arg(required = true)]
    dirs: Vec<PathBuf>,

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

    let total = registry::DETECTORS.len() * registry::DESCRIPTORS.len();
    let mut count = 0;
    let mut records: Vec<SpeedRecord> = Vec::new();

    for detector in registry::DETECTORS {
        for descriptor in registry::DESCRIPTORS {
            count += 1;
            info!(
                "Running test {}/{} - {}/{}",
                count, total, detector, descriptor
            );

            let mut algo = match opencv_utils::DetectorDescriptor::paired(detector, descriptor)? {
                Some(algo) => algo,
                None => {
                    info!("Invalid combination - {}/{}", detector, descriptor);
                    continue;
                }
            };

            for scene in &scenes {
                for image in scene.images() {
                    let img = opencv_utils::load_grayscale(&image.path)?;

                    let start = Instant::now();
                    let kps = algo.detect(&img);
                    let (kps, _descriptors) = algo.compute(&img, kps)?;
                    let elapsed = start.elapsed();

                    records.push(SpeedRecord {
                        detector: detector.to_string(),
                        descriptor: descriptor.to_string(),
                        image: format!("{}/{}", scene.name(), image.label()),
                        time_ms: elapsed.as_secs_f64() * 1000.,
                        keypoints: kps.len(),
                    });
                }
            }
        }
    }

    let out = report::ensure_dir(&args.output)?;
    report::write_records(out.join("speed.csv"), &records)?;

    let mut series: Vec<(String, Vec<f64>)> = Vec::new();
    for detector in registry::DETECTORS {
        for descriptor in registry::DESCRIPTORS {
            let label = registry::label(detector, descriptor);
            let times: Vec<f64> = records
                .iter()
                .filter(|r| r.detector == *detector && r.descriptor == *descriptor)
                .map(|r| r.time_ms)
                .collect();
            if !times.is_empty() {
                series.push((label, times));
            }
        }
    }
    plot::speed_chart(out.join("speed.svg"), &series)?;

    Ok(())
}
