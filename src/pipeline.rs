//! Per-image and per-directory processing.
//!
//! For every image the pipeline detects instances, writes a text report, the
//! binary segmentation and three overlays into the results directory. File
//! names are `<stem>_<timestamp>[_<kind>].<ext>`.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use log::{debug, info, warn};

use crate::compositor::write_segmentation;
use crate::detector::Detector;
use crate::rect::BoundingBox;
use crate::render::{BOX_MARGIN, InstanceOverlay, OverlayOptions, OverlayRenderer, draw_boxes};
use crate::threshold::ThresholdParams;

/// Format of the timestamp embedded in output names.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H_%M_%S";

/// Settings shared by every image of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub results_dir: PathBuf,
    pub threshold: ThresholdParams,
    /// Pixels added around each box in the bbox overlay.
    pub box_margin: i32,
    /// Detections scoring below this are discarded.
    pub min_confidence: f32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            results_dir: PathBuf::from("results"),
            threshold: ThresholdParams::default(),
            box_margin: BOX_MARGIN,
            min_confidence: 0.8,
        }
    }
}

/// Where the artifacts of one image go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub report: PathBuf,
    pub binary: PathBuf,
    pub border: PathBuf,
    pub mask: PathBuf,
    pub bbox: PathBuf,
}

impl OutputPaths {
    pub fn new(results_dir: &Path, image_path: &Path, timestamp: &str) -> Self {
        let stem = image_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        let base = format!("{stem}_{timestamp}");
        Self {
            report: results_dir.join(format!("{base}.txt")),
            binary: results_dir.join(format!("{base}_binary.png")),
            border: results_dir.join(format!("{base}_border.png")),
            mask: results_dir.join(format!("{base}_mask.png")),
            bbox: results_dir.join(format!("{base}_bbox.png")),
        }
    }
}

pub fn format_timestamp(time: &DateTime<Local>) -> String {
    time.format(TIMESTAMP_FORMAT).to_string()
}

/// Renders a duration as `H:MM:SS.ffffff`.
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    format!(
        "{}:{:02}:{:02}.{:06}",
        total / 3600,
        (total / 60) % 60,
        total % 60,
        duration.subsec_micros()
    )
}

/// What was produced for one image.
#[derive(Debug, Clone)]
pub struct ImageReport {
    pub source: PathBuf,
    pub paths: OutputPaths,
    pub rois: Vec<BoundingBox>,
    pub detection_time: Duration,
    pub segmentation_time: Duration,
}

/// Outcome of a directory run.
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub processed: Vec<ImageReport>,
    pub failed: Vec<(PathBuf, anyhow::Error)>,
}

/// Lists the `.png` files directly inside `dir`, sorted by path.
///
/// Entries that cannot be read are logged and skipped.
pub fn collect_png_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("Failed to read directory {}", dir.display()))?;
    Ok(select_png_files(
        entries.map(|entry| entry.map(|entry| entry.path())),
        dir,
    ))
}

fn select_png_files(
    entries: impl Iterator<Item = io::Result<PathBuf>>,
    dir: &Path,
) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in entries {
        let path = match entry {
            Ok(path) => path,
            Err(e) => {
                warn!("Skipping unreadable entry in {}: {}", dir.display(), e);
                continue;
            }
        };
        let is_png = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("png"));
        if path.is_file() && is_png {
            files.push(path);
        }
    }
    files.sort();
    files
}

/// Runs detection, segmentation and rendering over images.
pub struct Pipeline<D, R = InstanceOverlay> {
    detector: D,
    renderer: R,
    config: PipelineConfig,
}

impl<D: Detector> Pipeline<D> {
    pub fn new(detector: D, config: PipelineConfig) -> Self {
        Self {
            detector,
            renderer: InstanceOverlay,
            config,
        }
    }
}

impl<D: Detector, R: OverlayRenderer> Pipeline<D, R> {
    pub fn with_renderer(detector: D, renderer: R, config: PipelineConfig) -> Self {
        Self {
            detector,
            renderer,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Processes one image, stamping outputs with the current local time.
    pub fn process_image(&mut self, image_path: &Path) -> Result<ImageReport> {
        let timestamp = format_timestamp(&Local::now());
        self.process_image_at(image_path, &timestamp)
    }

    /// Processes one image, stamping outputs with `timestamp`.
    pub fn process_image_at(&mut self, image_path: &Path, timestamp: &str) -> Result<ImageReport> {
        let image = image::open(image_path)
            .with_context(|| format!("Failed to read image {}", image_path.display()))?
            .to_rgb8();

        let detect_start = Instant::now();
        let mut detection = self
            .detector
            .detect(&image)
            .with_context(|| format!("Detection failed for {}", image_path.display()))?;
        let detection_time = detect_start.elapsed();
        detection.retain_confident(self.config.min_confidence);
        debug!(
            "{} instance(s) in {}",
            detection.len(),
            format_duration(detection_time)
        );

        fs::create_dir_all(&self.config.results_dir).with_context(|| {
            format!(
                "Failed to create results directory {}",
                self.config.results_dir.display()
            )
        })?;
        let paths = OutputPaths::new(&self.config.results_dir, image_path, timestamp);

        let file = File::create(&paths.report)
            .with_context(|| format!("Failed to create report {}", paths.report.display()))?;
        let mut report = BufWriter::new(file);
        let file_name = image_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        writeln!(report, "File Name:  {file_name}")?;
        writeln!(report, "Detection Duration: {}", format_duration(detection_time))?;
        writeln!(report, "Bounding Boxes")?;
        for roi in &detection.rois {
            writeln!(report, "{roi}")?;
        }

        let segment_start = Instant::now();
        write_segmentation(&paths.binary, &image, &detection.masks, &self.config.threshold)
            .with_context(|| format!("Failed to write segmentation {}", paths.binary.display()))?;
        let segmentation_time = segment_start.elapsed();
        writeln!(
            report,
            "Segmentation Duration: {}",
            format_duration(segmentation_time)
        )?;
        report.flush()?;

        let border = self
            .renderer
            .render(&image, &detection, &OverlayOptions::boundary());
        border
            .save(&paths.border)
            .with_context(|| format!("Failed to write {}", paths.border.display()))?;

        let mask = self
            .renderer
            .render(&image, &detection, &OverlayOptions::mask());
        mask.save(&paths.mask)
            .with_context(|| format!("Failed to write {}", paths.mask.display()))?;

        draw_boxes(&image, &detection.rois, self.config.box_margin)
            .save(&paths.bbox)
            .with_context(|| format!("Failed to write {}", paths.bbox.display()))?;

        Ok(ImageReport {
            source: image_path.to_path_buf(),
            paths,
            rois: detection.rois,
            detection_time,
            segmentation_time,
        })
    }

    /// Processes every `.png` in `dir`.
    ///
    /// A failing image is logged and recorded in the summary; the remaining
    /// images are still processed.
    pub fn process_directory(&mut self, dir: &Path) -> Result<BatchSummary> {
        let files = collect_png_files(dir)?;
        if files.is_empty() {
            warn!("No .png images found in {}", dir.display());
        } else {
            info!("Found {} image(s) in {}", files.len(), dir.display());
        }

        let mut summary = BatchSummary::default();
        for (index, path) in files.iter().enumerate() {
            match self.process_image(path) {
                Ok(report) => {
                    info!(
                        "Processed {} ({}/{}): {} instance(s)",
                        path.display(),
                        index + 1,
                        files.len(),
                        report.rois.len()
                    );
                    summary.processed.push(report);
                }
                Err(e) => {
                    warn!(
                        "Failed to process {} ({}/{}): {:#}",
                        path.display(),
                        index + 1,
                        files.len(),
                        e
                    );
                    summary.failed.push((path.clone(), e));
                }
            }
        }

        if !summary.failed.is_empty() {
            warn!(
                "{} of {} images failed to process",
                summary.failed.len(),
                files.len()
            );
        }
        Ok(summary)
    }
}
