use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::Result;

/// Create the results directory if needed and hand it back.
pub fn ensure_dir<P: AsRef<Path>>(dir: P) -> Result<PathBuf> {
    let dir = dir.as_ref().to_path_buf();
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Per-file repeatability of one detector, tidy format.
#[derive(Debug, Clone, Serialize)]
pub struct RepeatabilityRecord {
    pub detector: String,
    pub scene: String,
    pub image: String,
    pub common: usize,
    pub corresponding: usize,
    pub repeatability: f64,
}

/// Per-file timing of one detector/descriptor combination, tidy format.
#[derive(Debug, Clone, Serialize)]
pub struct SpeedRecord {
    pub detector: String,
    pub descriptor: String,
    pub image: String,
    pub time_ms: f64,
    pub keypoints: usize,
}

/// Per-file timing of one full detect-and-compute algorithm, tidy format.
#[derive(Debug, Clone, Serialize)]
pub struct CombinedSpeedRecord {
    pub algo: String,
    pub image: String,
    pub time_ms: f64,
    pub keypoints: usize,
}

/// Write tidy records, one serialized struct per row with a header.
pub fn write_records<P: AsRef<Path>, S: Serialize>(path: P, records: &[S]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Label-per-column table, the layout the wide CSVs have always used:
/// header row of labels, then one row per file/threshold.
///
/// Columns may be ragged when combinations were skipped; rows stop at the
/// shortest column.
#[derive(Debug, Default)]
pub struct MetricTable {
    labels: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl MetricTable {
    pub fn new() -> Self {
        MetricTable::default()
    }

    pub fn insert<S: Into<String>>(&mut self, label: S, values: Vec<f64>) {
        self.labels.push(label.into());
        self.columns.push(values);
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn columns(&self) -> &[Vec<f64>] {
        &self.columns
    }

    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut wtr = csv::Writer::from_path(path)?;
        wtr.write_record(&self.labels)?;
        let rows = self.columns.iter().map(Vec::len).min().unwrap_or(0);
        for i in 0..rows {
            let row: Vec<String> = self.columns.iter().map(|c| c[i].to_string()).collect();
            wtr.write_record(&row)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TempFile(PathBuf);

    impl TempFile {
        fn new(name: &str) -> Self {
            TempFile(
                std::env::temp_dir().join(format!("kpbench-{}-{}", name, std::process::id())),
            )
        }
    }

    impl Drop for TempFile {
        fn drop(&mut self) {
            let _ = fs::remove_file(&self.0);
        }
    }

    #[test]
    fn wide_table_matches_the_python_layout() {
        let mut table = MetricTable::new();
        table.insert("ORB", vec![0.5, 0.25]);
        table.insert("BRISK", vec![1.0, 0.75]);

        let tmp = TempFile::new("wide");
        table.write_csv(&tmp.0).unwrap();
        let text = fs::read_to_string(&tmp.0).unwrap();
        assert_eq!(text, "ORB,BRISK\n0.5,1\n0.25,0.75\n");
    }

    #[test]
    fn ragged_columns_truncate_to_the_shortest() {
        let mut table = MetricTable::new();
        table.insert("a", vec![1., 2., 3.]);
        table.insert("b", vec![4.]);

        let tmp = TempFile::new("ragged");
        table.write_csv(&tmp.0).unwrap();
        let text = fs::read_to_string(&tmp.0).unwrap();
        assert_eq!(text, "a,b\n1,4\n");
    }

    #[test]
    fn tidy_records_carry_a_header() {
        let records = vec![RepeatabilityRecord {
            detector: "ORB".into(),
            scene: "bark".into(),
            image: "img2".into(),
            common: 100,
            corresponding: 40,
            repeatability: 0.4,
        }];
        let tmp = TempFile::new("tidy");
        write_records(&tmp.0, &records).unwrap();
        let text = fs::read_to_string(&tmp.0).unwrap();
        assert_eq!(
            text,
            "detector,scene,image,common,corresponding,repeatability\nORB,bark,img2,100,40,0.4\n"
        );
    }

    #[test]
    fn ensure_dir_creates_nested_paths() {
        let base = std::env::temp_dir().join(format!("kpbench-dir-{}", std::process::id()));
        let _ = fs::remove_dir_all(&base);
        let dir = ensure_dir(base.join("results")).unwrap();
        assert!(dir.is_dir());
        let _ = fs::remove_dir_all(&base);
    }
}
