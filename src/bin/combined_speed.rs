use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use log::info;

use kpbench::report::CombinedSpeedRecord;
use kpbench::{dataset, opencv_utils, plot, registry, report, Result};

/// Combined speed benchmark: time the single detect-and-compute pass of the
/// algorithms that both detect and describe.
#[derive(Parser, Debug)]
#[command(name = "combined-speed")]
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

    let mut records: Vec<CombinedSpeedRecord> = Vec::new();

    for (i, name) in registry::COMBINED.iter().enumerate() {
        info!("Running test {}/{} - {}", i + 1, registry::COMBINED.len(), name);
        let mut algo = opencv_utils::DetectorDescriptor::combined(name)?;

        for scene in &scenes {
            for image in scene.images() {
                let img = opencv_utils::load_grayscale(&image.path)?;

                let start = Instant::now();
                let (kps, _descriptors) = algo.detect_and_compute(&img)?;
                let elapsed = start.elapsed();

                records.push(CombinedSpeedRecord {
                    algo: name.to_string(),
                    image: format!("{}/{}", scene.name(), image.label()),
                    time_ms: elapsed.as_secs_f64() * 1000.,
                    keypoints: kps.len(),
                });
            }
        }
    }

    let out = report::ensure_dir(&args.output)?;
    report::write_records(out.join("combined.csv"), &records)?;

    let series: Vec<(String, Vec<f64>)> = registry::COMBINED
        .iter()
        .map(|name| {
            let times = records
                .iter()
                .filter(|r| r.algo == *name)
                .map(|r| r.time_ms)
                .collect();
            (name.to_string(), times)
        })
        .collect();
    plot::speed_chart(out.join("combinedspeed.svg"), &series)?;

    Ok(())
}
