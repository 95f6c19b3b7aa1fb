use std::path::Path;

use plotters::prelude::*;

use crate::eval::PrPoint;
use crate::{BenchErr, Result};

const SIZE: (u32, u32) = (900, 600);

type DrawResult = std::result::Result<(), Box<dyn std::error::Error>>;

/// Per-detector repeatability across a scene's images, one line per label.
pub fn repeatability_chart<P: AsRef<Path>>(
    path: P,
    image_labels: &[String],
    series: &[(String, Vec<f64>)],
) -> Result<()> {
    draw_repeatability(path.as_ref(), image_labels, series)
        .map_err(|e| BenchErr::Plot(e.to_string()))
}

/// Precision/recall trade-off curves on the unit square.
pub fn precision_recall_chart<P: AsRef<Path>>(
    path: P,
    curves: &[(String, Vec<PrPoint>)],
) -> Result<()> {
    draw_precision_recall(path.as_ref(), curves).map_err(|e| BenchErr::Plot(e.to_string()))
}

/// Swarm-style scatter of per-file times, one column per label.
pub fn speed_chart<P: AsRef<Path>>(path: P, series: &[(String, Vec<f64>)]) -> Result<()> {
    draw_speed(path.as_ref(), series).map_err(|e| BenchErr::Plot(e.to_string()))
}

fn draw_repeatability(
    path: &Path,
    image_labels: &[String],
    series: &[(String, Vec<f64>)],
) -> DrawResult {
    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let upper = image_labels.len().saturating_sub(1).max(1) as f64;
    let mut chart = ChartBuilder::on(&root)
        .caption("Repeatability", ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(0f64..upper, 0f64..1f64)?;

    let labels = image_labels.to_vec();
    chart
        .configure_mesh()
        .x_desc("Image")
        .x_label_formatter(&move |x| {
            let i = x.round();
            if (x - i).abs() < 0.25 {
                labels.get(i as usize).cloned().unwrap_or_default()
            } else {
                String::new()
            }
        })
        .y_label_formatter(&|y| format!("{:.0}%", y * 100.))
        .draw()?;

    for (i, (label, values)) in series.iter().enumerate() {
        let color = Palette99::pick(i).to_rgba();
        chart
            .draw_series(LineSeries::new(
                values.iter().enumerate().map(|(j, v)| (j as f64, *v)),
                color.clone(),
            ))?
            .label(label.clone())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 18, y)], color.clone()));
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;
    root.present()?;
    Ok(())
}

fn draw_precision_recall(path: &Path, curves: &[(String, Vec<PrPoint>)]) -> DrawResult {
    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Precision/Recall", ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(0f64..1f64, 0f64..1f64)?;

    chart
        .configure_mesh()
        .x_desc("1 - precision")
        .y_desc("Recall")
        .draw()?;

    for (i, (label, curve)) in curves.iter().enumerate() {
        let color = Palette99::pick(i).to_rgba();
        chart
            .draw_series(LineSeries::new(
                curve.iter().map(|p| (p.precision, p.recall)),
                color.clone(),
            ))?
            .label(label.clone())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 18, y)], color.clone()));
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;
    root.present()?;
    Ok(())
}

fn draw_speed(path: &Path, series: &[(String, Vec<f64>)]) -> DrawResult {
    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let upper = series
        .iter()
        .flat_map(|(_, v)| v.iter().copied())
        .fold(1f64, f64::max);
    let columns = series.len().max(1) as f64;

    let mut chart = ChartBuilder::on(&root)
        .caption("Speed", ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(60)
        .y_label_area_size(60)
        .build_cartesian_2d(-0.5f64..(columns - 0.5), 0f64..(upper * 1.05))?;

    let labels: Vec<String> = series.iter().map(|(l, _)| l.clone()).collect();
    chart
        .configure_mesh()
        .y_desc("Time taken / ms")
        .x_label_formatter(&move |x| {
            let i = x.round();
            if (x - i).abs() < 0.25 && i >= 0. {
                labels.get(i as usize).cloned().unwrap_or_default()
            } else {
                String::new()
            }
        })
        .draw()?;

    for (i, (_, values)) in series.iter().enumerate() {
        let color = Palette99::pick(i).to_rgba();
        chart.draw_series(values.iter().enumerate().map(|(j, v)| {
            // Deterministic horizontal spread so coincident times stay apart.
            let jitter = ((j * 37) % 11) as f64 / 11. * 0.6 - 0.3;
            Circle::new((i as f64 + jitter, *v), 3, color.filled())
        }))?;
    }

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    struct TempFile(PathBuf);

    impl Drop for TempFile {
        fn drop(&mut self) {
            let _ = fs::remove_file(&self.0);
        }
    }

    fn tmp(name: &str) -> TempFile {
        TempFile(std::env::temp_dir().join(format!("kpbench-{}-{}.svg", name, std::process::id())))
    }

    #[test]
    fn renders_a_repeatability_chart() {
        let out = tmp("rep");
        repeatability_chart(
            &out.0,
            &["img2".into(), "img3".into(), "img4".into()],
            &[
                ("ORB".into(), vec![0.9, 0.7, 0.5]),
                ("AKAZE".into(), vec![0.8, 0.8, 0.6]),
            ],
        )
        .unwrap();
        let text = fs::read_to_string(&out.0).unwrap();
        assert!(text.contains("<svg"));
    }

    #[test]
    fn renders_a_precision_recall_chart() {
        let out = tmp("pr");
        let curve: Vec<PrPoint> = (0..10)
            .map(|i| PrPoint {
                threshold: i as f32,
                precision: i as f64 / 20.,
                recall: i as f64 / 10.,
            })
            .collect();
        precision_recall_chart(&out.0, &[("BRISK".into(), curve)]).unwrap();
        assert!(fs::read_to_string(&out.0).unwrap().contains("<svg"));
    }

    #[test]
    fn renders_a_speed_chart_with_empty_series() {
        let out = tmp("speed");
        speed_chart(
            &out.0,
            &[
                ("ORB/ORB".into(), vec![4.2, 5.1, 4.9]),
                ("AKAZE/AKAZE".into(), vec![]),
            ],
        )
        .unwrap();
        assert!(fs::read_to_string(&out.0).unwrap().contains("<svg"));
    }
}
