pub mod debug_overlay;
pub mod face_detection;
pub mod fallback;
pub mod geometry;
pub mod normalize;
pub mod report;

use anyhow::{Context, Result};
use image::RgbImage;
use indicatif::ProgressBar;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use walkdir::WalkDir;

use crate::error::CropError;
use crate::json_output::JsonMessage;
use crate::utils::{display_name, has_valid_extension, verbose_println, warn_println};
use face_detection::FaceLocator;
use geometry::{compute_crop_rect, select_primary_face, BoundingBox, CropRect};

#[derive(Debug, Clone)]
pub struct ProcessingConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub failed_dir: PathBuf,
    /// Where debug overlays go when `debug` is set
    pub debug_dir: PathBuf,
    pub extensions: Vec<String>,
    pub verbose: bool,
    pub debug: bool,
    pub dry_run: bool,
    /// Machine-readable output only; suppresses console logging
    pub json_progress: bool,
}

/// Which directory a processed image is written to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Route {
    /// At least one face was detected
    Succeeded,
    /// No face (or the detector errored); the output is a center crop
    Failed,
}

#[derive(Debug)]
pub struct ProcessingResult {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub route: Route,
    pub faces_found: usize,
    pub source_size: (u32, u32),
    pub crop: CropRect,
    pub processing_time: Duration,
}

pub struct ProcessingEngine {
    config: ProcessingConfig,
    locator: Box<dyn FaceLocator>,
}

impl ProcessingEngine {
    pub fn new(config: ProcessingConfig, locator: Box<dyn FaceLocator>) -> Self {
        Self { config, locator }
    }

    pub fn config(&self) -> &ProcessingConfig {
        &self.config
    }

    /// Create the output and failed directories (and debug, when enabled)
    pub fn prepare_output_dirs(&self) -> Result<()> {
        if self.config.dry_run {
            self.verbose("Dry run mode: skipping output directory creation");
            return Ok(());
        }

        let mut dirs = vec![&self.config.output_dir, &self.config.failed_dir];
        if self.config.debug {
            dirs.push(&self.config.debug_dir);
        }
        for dir in dirs {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        }
        Ok(())
    }

    /// List image files directly inside the input directory, sorted by name.
    ///
    /// An unreadable input directory is an error; the batch must not start.
    pub fn discover_images(&self) -> Result<Vec<PathBuf>> {
        let input_dir = &self.config.input_dir;
        self.verbose(&format!("Scanning directory: {}", input_dir.display()));

        let walker = WalkDir::new(input_dir)
            .follow_links(true)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name();

        let mut image_files = Vec::new();
        for entry in walker {
            let entry = entry
                .with_context(|| format!("Failed to read input directory: {}", input_dir.display()))?;
            let path = entry.path();

            if entry.file_type().is_file() && has_valid_extension(path, &self.config.extensions) {
                image_files.push(path.to_path_buf());
            }
        }

        self.verbose(&format!("Found {} image files", image_files.len()));
        Ok(image_files)
    }

    /// Process every file in order. Each file gets its own result; a failure
    /// is logged and the loop moves on to the next file.
    pub fn process_batch(
        &mut self,
        image_files: &[PathBuf],
        progress: &ProgressBar,
    ) -> Vec<Result<ProcessingResult, CropError>> {
        let total = image_files.len();
        let mut results = Vec::with_capacity(total);

        for (index, image_path) in image_files.iter().enumerate() {
            let filename = display_name(image_path);
            progress.set_message(filename.clone());
            if self.config.json_progress {
                JsonMessage::progress(index, total, format!("Processing {}", filename));
            }

            let result = self.process_single_image(image_path, progress);

            match &result {
                Ok(r) => {
                    if self.config.json_progress {
                        JsonMessage::file_completed(
                            &r.input_path,
                            &r.output_path,
                            r.route,
                            r.faces_found,
                            r.crop,
                            r.processing_time.as_millis(),
                        );
                    }
                }
                Err(e) => {
                    if self.config.json_progress {
                        JsonMessage::file_failed(image_path, e.kind(), e.to_string());
                    } else {
                        progress.suspend(|| {
                            warn_println(&format!("Failed to process {}: {}", filename, e))
                        });
                    }
                }
            }

            progress.inc(1);
            results.push(result);
        }

        if self.config.json_progress {
            JsonMessage::progress(total, total, "Batch complete");
        }

        results
    }

    /// Detect, crop, normalize and route one image
    pub fn process_single_image(
        &mut self,
        input_path: &Path,
        progress: &ProgressBar,
    ) -> Result<ProcessingResult, CropError> {
        let start = Instant::now();
        let filename = display_name(input_path);

        let img = image::open(input_path)
            .map_err(|source| CropError::UnreadableImage {
                path: input_path.to_path_buf(),
                source,
            })?
            .to_rgb8();
        let (width, height) = img.dimensions();

        let faces = self.locate_faces(input_path, &img, progress);
        let route = if faces.is_empty() {
            Route::Failed
        } else {
            Route::Succeeded
        };

        progress.suspend(|| {
            verbose_println(
                self.config.verbose,
                &format!("{}: {}x{}, {} face(s) detected", filename, width, height, faces.len()),
            )
        });

        let primary = select_primary_face(&faces);
        let crop = compute_crop_rect(width, height, primary)?;
        let output = normalize::normalize_crop(&img, &crop)?;

        progress.suspend(|| {
            verbose_println(self.config.verbose, &format!("{}: crop {}", filename, crop))
        });

        let target_dir = match route {
            Route::Succeeded => &self.config.output_dir,
            Route::Failed => &self.config.failed_dir,
        };
        let file_name = input_path.file_name().unwrap_or(input_path.as_os_str());
        let output_path = target_dir.join(file_name);

        if !self.config.dry_run {
            output
                .save(&output_path)
                .map_err(|source| CropError::SaveFailed {
                    path: output_path.clone(),
                    source,
                })?;

            if self.config.debug {
                self.write_debug_overlay(&img, &faces, &crop, file_name, progress);
            }
        }

        Ok(ProcessingResult {
            input_path: input_path.to_path_buf(),
            output_path,
            route,
            faces_found: faces.len(),
            source_size: (width, height),
            crop,
            processing_time: start.elapsed(),
        })
    }

    /// Detector errors degrade to "no faces"
    fn locate_faces(
        &mut self,
        input_path: &Path,
        img: &RgbImage,
        progress: &ProgressBar,
    ) -> Vec<BoundingBox> {
        match self.locator.locate_faces(input_path, img) {
            Ok(faces) => faces,
            Err(e) => {
                if !self.config.json_progress {
                    let message = format!(
                        "Error detecting faces in {} ({}): {:#}",
                        input_path.display(),
                        self.locator.name(),
                        e
                    );
                    progress.suspend(|| warn_println(&message));
                }
                Vec::new()
            }
        }
    }

    fn write_debug_overlay(
        &self,
        img: &RgbImage,
        faces: &[BoundingBox],
        crop: &CropRect,
        file_name: &std::ffi::OsStr,
        progress: &ProgressBar,
    ) {
        let overlay = debug_overlay::draw_debug_overlay(img, faces, crop);
        let debug_path = self.config.debug_dir.join(file_name);

        // Debug output never changes the outcome of the image
        if let Err(e) = overlay.save(&debug_path) {
            if !self.config.json_progress {
                let message = format!("Failed to save debug overlay {}: {}", debug_path.display(), e);
                progress.suspend(|| warn_println(&message));
            }
        }
    }

    fn verbose(&self, message: &str) {
        if !self.config.json_progress {
            verbose_println(self.config.verbose, message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};
    use std::cell::RefCell;
    use std::fs;
    use std::rc::Rc;

    /// Returns canned boxes keyed by file name and records every call
    struct StubLocator {
        faces: Vec<(String, Vec<BoundingBox>)>,
        fail_on: Option<String>,
        calls: Rc<RefCell<Vec<String>>>,
    }

    impl FaceLocator for StubLocator {
        fn name(&self) -> &str {
            "stub"
        }

        fn locate_faces(&mut self, image_path: &Path, _image: &RgbImage) -> anyhow::Result<Vec<BoundingBox>> {
            let name = display_name(image_path);
            self.calls.borrow_mut().push(name.clone());

            if self.fail_on.as_deref() == Some(name.as_str()) {
                return Err(anyhow::anyhow!("detector crashed"));
            }
            Ok(self
                .faces
                .iter()
                .find(|(n, _)| *n == name)
                .map(|(_, f)| f.clone())
                .unwrap_or_default())
        }
    }

    struct Fixture {
        _dir: tempfile::TempDir,
        config: ProcessingConfig,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path();
        let config = ProcessingConfig {
            input_dir: base.join("load"),
            output_dir: base.join("output"),
            failed_dir: base.join("failed"),
            debug_dir: base.join("debug"),
            extensions: vec!["png".to_string(), "jpg".to_string(), "jpeg".to_string()],
            verbose: false,
            debug: false,
            dry_run: false,
            json_progress: false,
        };
        fs::create_dir_all(&config.input_dir).unwrap();
        Fixture { _dir: dir, config }
    }

    fn write_image(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
        let img: RgbImage = ImageBuffer::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        let path = dir.join(name);
        img.save(&path).unwrap();
        path
    }

    fn engine(config: ProcessingConfig, faces: Vec<(String, Vec<BoundingBox>)>) -> ProcessingEngine {
        let locator = StubLocator {
            faces,
            fail_on: None,
            calls: Rc::new(RefCell::new(Vec::new())),
        };
        ProcessingEngine::new(config, Box::new(locator))
    }

    #[test]
    fn test_discover_images_filters_and_sorts() {
        let fx = fixture();
        let load = &fx.config.input_dir;
        write_image(load, "b.PNG", 120, 120);
        write_image(load, "a.jpg", 120, 120);
        fs::write(load.join("notes.txt"), b"hello").unwrap();
        fs::create_dir(load.join("sub")).unwrap();
        write_image(&load.join("sub"), "nested.jpg", 120, 120);

        let engine = engine(fx.config.clone(), vec![]);
        let files = engine.discover_images().unwrap();
        let names: Vec<String> = files.iter().map(|p| display_name(p)).collect();

        assert_eq!(names, vec!["a.jpg", "b.PNG"]);
    }

    #[test]
    fn test_discover_images_missing_dir_is_fatal() {
        let mut fx = fixture();
        fx.config.input_dir = fx.config.input_dir.join("missing");
        let engine = engine(fx.config.clone(), vec![]);
        assert!(engine.discover_images().is_err());
    }

    #[test]
    fn test_batch_routes_by_face_detection() {
        let fx = fixture();
        let load = fx.config.input_dir.clone();
        write_image(&load, "face.png", 1000, 1000);
        write_image(&load, "noface.png", 200, 200);
        write_image(&load, "tiny.png", 50, 50);
        fs::write(load.join("broken.jpg"), b"not an image").unwrap();

        let faces = vec![("face.png".to_string(), vec![
            BoundingBox::new(400, 600, 600, 400),
            BoundingBox::new(10, 60, 60, 10),
        ])];
        let mut engine = engine(fx.config.clone(), faces);
        engine.prepare_output_dirs().unwrap();

        let files = engine.discover_images().unwrap();
        let results = engine.process_batch(&files, &ProgressBar::hidden());
        assert_eq!(results.len(), 4);

        // broken.jpg, face.png, noface.png, tiny.png
        assert!(matches!(results[0], Err(CropError::UnreadableImage { .. })));

        let face = results[1].as_ref().unwrap();
        assert_eq!(face.route, Route::Succeeded);
        assert_eq!(face.faces_found, 2);
        assert_eq!(face.crop, CropRect::new(146, 146, 853, 853));

        let noface = results[2].as_ref().unwrap();
        assert_eq!(noface.route, Route::Failed);
        assert_eq!(noface.crop, CropRect::new(30, 30, 171, 171));

        assert!(matches!(results[3], Err(CropError::TooSmall { .. })));

        let out = image::open(fx.config.output_dir.join("face.png")).unwrap();
        assert_eq!((out.width(), out.height()), (512, 512));
        let failed = image::open(fx.config.failed_dir.join("noface.png")).unwrap();
        assert_eq!((failed.width(), failed.height()), (512, 512));

        for name in ["tiny.png", "broken.jpg"] {
            assert!(!fx.config.output_dir.join(name).exists());
            assert!(!fx.config.failed_dir.join(name).exists());
        }
    }

    #[test]
    fn test_detector_error_falls_back_to_center_crop() {
        let fx = fixture();
        write_image(&fx.config.input_dir, "crash.jpg", 300, 200);

        let calls = Rc::new(RefCell::new(Vec::new()));
        let locator = StubLocator {
            faces: vec![],
            fail_on: Some("crash.jpg".to_string()),
            calls: Rc::clone(&calls),
        };
        let mut engine = ProcessingEngine::new(fx.config.clone(), Box::new(locator));
        engine.prepare_output_dirs().unwrap();

        let files = engine.discover_images().unwrap();
        let results = engine.process_batch(&files, &ProgressBar::hidden());

        let result = results[0].as_ref().unwrap();
        assert_eq!(result.route, Route::Failed);
        assert_eq!(result.faces_found, 0);
        assert!(fx.config.failed_dir.join("crash.jpg").exists());
        assert_eq!(*calls.borrow(), vec!["crash.jpg".to_string()]);
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let mut fx = fixture();
        fx.config.dry_run = true;
        fx.config.debug = true;
        write_image(&fx.config.input_dir, "a.png", 150, 150);

        let mut engine = engine(fx.config.clone(), vec![]);
        engine.prepare_output_dirs().unwrap();
        let files = engine.discover_images().unwrap();
        let results = engine.process_batch(&files, &ProgressBar::hidden());

        assert!(results[0].is_ok());
        assert!(!fx.config.output_dir.exists());
        assert!(!fx.config.failed_dir.exists());
        assert!(!fx.config.debug_dir.exists());
    }

    #[test]
    fn test_debug_overlay_written() {
        let mut fx = fixture();
        fx.config.debug = true;
        write_image(&fx.config.input_dir, "a.png", 300, 300);

        let faces = vec![("a.png".to_string(), vec![BoundingBox::new(100, 200, 200, 100)])];
        let mut engine = engine(fx.config.clone(), faces);
        engine.prepare_output_dirs().unwrap();
        let files = engine.discover_images().unwrap();
        engine.process_batch(&files, &ProgressBar::hidden());

        let overlay = image::open(fx.config.debug_dir.join("a.png")).unwrap();
        assert_eq!((overlay.width(), overlay.height()), (300, 300));
        assert!(fx.config.output_dir.join("a.png").exists());
    }

    #[test]
    fn test_reprocessing_output_is_stable() {
        let fx = fixture();
        write_image(&fx.config.input_dir, "face.png", 800, 600);

        let faces = vec![("face.png".to_string(), vec![BoundingBox::new(200, 450, 350, 300)])];
        let mut engine = engine(fx.config.clone(), faces.clone());
        engine.prepare_output_dirs().unwrap();
        let files = engine.discover_images().unwrap();
        engine.process_batch(&files, &ProgressBar::hidden());

        // Feed the 512x512 output back in as a fresh input
        let mut second = fixture();
        second.config.input_dir = fx.config.output_dir.clone();
        let mut engine = self::engine(second.config.clone(), faces);
        engine.prepare_output_dirs().unwrap();
        let files = engine.discover_images().unwrap();
        let results = engine.process_batch(&files, &ProgressBar::hidden());

        let result = results[0].as_ref().unwrap();
        assert_eq!(result.source_size, (512, 512));
        assert!(result.crop.area() as f64 >= 362.0 * 362.0);
        let out = image::open(second.config.output_dir.join("face.png")).unwrap();
        assert_eq!((out.width(), out.height()), (512, 512));
    }
}
