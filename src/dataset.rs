use std::fs;
use std::path::{Path, PathBuf};

use crate::{BenchErr, Homography, Result};

/// Image extensions the benchmarks accept, matching the Oxford affine
/// covariant regions datasets.
pub const IMAGE_EXTS: &[&str] = &["pgm", "ppm"];

/// One test image inside a scene, `imgN.<ext>`.
#[derive(Debug, Clone)]
pub struct SceneImage {
    pub path: PathBuf,
    /// The N in `imgN`; 1 is the base image everything is compared against.
    pub index: u32,
}

impl SceneImage {
    /// The file stem, e.g. "img3". Used as a row label in reports.
    pub fn label(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// A scene directory: images `img1..imgN` of the same planar subject and a
/// ground-truth homography file `H1toNp` for every non-base image.
#[derive(Debug, Clone)]
pub struct Scene {
    dir: PathBuf,
    images: Vec<SceneImage>,
}

impl Scene {
    /// Collect the test images of one directory, sorted by index.
    ///
    /// Files that do not look like `imgN.<ext>` are ignored. A scene with no
    /// images, or without the base image, is a configuration error.
    pub fn scan<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        let mut images = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let name = entry.file_name();
            if let Some(index) = parse_image_name(&name.to_string_lossy()) {
                images.push(SceneImage {
                    path: entry.path(),
                    index,
                });
            }
        }
        if images.is_empty() {
            return Err(BenchErr::EmptyScene(dir));
        }
        images.sort_by_key(|img| img.index);
        if images[0].index != 1 {
            return Err(BenchErr::MissingBase(dir));
        }
        Ok(Scene { dir, images })
    }

    pub fn name(&self) -> String {
        self.dir
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The base image, `img1`.
    pub fn base(&self) -> &SceneImage {
        &self.images[0]
    }

    /// Every image except the base, in index order.
    pub fn others(&self) -> &[SceneImage] {
        &self.images[1..]
    }

    pub fn images(&self) -> &[SceneImage] {
        &self.images
    }

    /// Load the ground-truth homography mapping the base image into the
    /// frame of image `index`. Missing or malformed files are fatal.
    pub fn homography_to(&self, index: u32) -> Result<Homography> {
        Homography::from_file(self.homography_path(index))
    }

    pub fn homography_path(&self, index: u32) -> PathBuf {
        self.dir.join(format!("H1to{}p", index))
    }
}

/// Scan every directory argument into a scene, skipping arguments that are
/// not directories the same way the benchmarks always have.
pub fn scan_dirs(dirs: &[PathBuf]) -> Result<Vec<Scene>> {
    dirs.iter()
        .filter(|d| d.is_dir())
        .map(Scene::scan)
        .collect()
}

fn parse_image_name(name: &str) -> Option<u32> {
    let (stem, ext) = name.rsplit_once('.')?;
    if !IMAGE_EXTS.contains(&ext) {
        return None;
    }
    stem.strip_prefix("img")?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;

    struct TempScene(PathBuf);

    impl TempScene {
        fn new(name: &str) -> Self {
            let dir = std::env::temp_dir().join(format!("kpbench-{}-{}", name, std::process::id()));
            let _ = fs::remove_dir_all(&dir);
            fs::create_dir_all(&dir).unwrap();
            TempScene(dir)
        }

        fn touch(&self, name: &str) {
            File::create(self.0.join(name)).unwrap();
        }

        fn write(&self, name: &str, contents: &str) {
            let mut f = File::create(self.0.join(name)).unwrap();
            f.write_all(contents.as_bytes()).unwrap();
        }
    }

    impl Drop for TempScene {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.0);
        }
    }

    #[test]
    fn parses_image_names() {
        assert_eq!(parse_image_name("img1.ppm"), Some(1));
        assert_eq!(parse_image_name("img6.pgm"), Some(6));
        assert_eq!(parse_image_name("img2.png"), None);
        assert_eq!(parse_image_name("H1to2p"), None);
        assert_eq!(parse_image_name("image1.ppm"), None);
    }

    #[test]
    fn scans_images_in_index_order() {
        let tmp = TempScene::new("scan");
        tmp.touch("img3.pgm");
        tmp.touch("img1.ppm");
        tmp.touch("img2.ppm");
        tmp.touch("notes.txt");
        tmp.write("H1to2p", "1 0 0 0 1 0 0 0 1");

        let scene = Scene::scan(&tmp.0).unwrap();
        let indices: Vec<_> = scene.images().iter().map(|i| i.index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
        assert_eq!(scene.base().index, 1);
        assert_eq!(scene.others().len(), 2);
        assert_eq!(scene.base().label(), "img1");
    }

    #[test]
    fn loads_homographies_by_index() {
        let tmp = TempScene::new("homography");
        tmp.touch("img1.ppm");
        tmp.touch("img2.ppm");
        tmp.write("H1to2p", "1 0 5\n0 1 -3\n0 0 1\n");

        let scene = Scene::scan(&tmp.0).unwrap();
        let h = scene.homography_to(2).unwrap();
        let t = h.transform(nalgebra::Point2::new(0., 0.));
        assert_eq!((t.x, t.y), (5., -3.));

        // No H1to3p was written; this must surface as an error.
        assert!(scene.homography_to(3).is_err());
    }

    #[test]
    fn empty_directory_is_an_error() {
        let tmp = TempScene::new("empty");
        tmp.touch("readme.md");
        assert!(matches!(
            Scene::scan(&tmp.0),
            Err(BenchErr::EmptyScene(_))
        ));
    }

    #[test]
    fn missing_base_image_is_an_error() {
        let tmp = TempScene::new("nobase");
        tmp.touch("img2.ppm");
        assert!(matches!(
            Scene::scan(&tmp.0),
            Err(BenchErr::MissingBase(_))
        ));
    }

    #[test]
    fn non_directories_are_skipped() {
        let tmp = TempScene::new("skip");
        tmp.touch("img1.ppm");
        let scenes = scan_dirs(&[
            tmp.0.clone(),
            tmp.0.join("img1.ppm"),
            PathBuf::from("/nonexistent/kpbench"),
        ])
        .unwrap();
        assert_eq!(scenes.len(), 1);
    }
}
