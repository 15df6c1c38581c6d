//! Instance detection.
//!
//! The segmentation pipeline only needs instance masks, boxes, class ids and
//! scores from a detector; any model producing those can implement
//! [`Detector`]. [`ComponentDetector`] is a classical detector bundled so the
//! pipeline runs without a trained network.

use anyhow::Result;
use image::{DynamicImage, Luma, RgbImage};
use imageproc::region_labelling::{Connectivity, connected_components};
use ndarray::Array3;

use crate::instances::InstanceMasks;
use crate::rect::{BoundingBox, extract_bboxes};
use crate::threshold::adaptive_mean_mask;

/// Class id given to every filament instance.
pub const FILAMENT_CLASS: u32 = 1;

/// Detector output for one image.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub masks: InstanceMasks,
    pub rois: Vec<BoundingBox>,
    pub class_ids: Vec<u32>,
    pub scores: Vec<f32>,
}

impl Detection {
    /// Wraps bare masks: boxes come from the masks, every instance is a
    /// filament with full confidence.
    pub fn from_masks(masks: InstanceMasks) -> Self {
        let rois = extract_bboxes(&masks);
        let n = masks.len();
        Self {
            masks,
            rois,
            class_ids: vec![FILAMENT_CLASS; n],
            scores: vec![1.0; n],
        }
    }

    pub fn len(&self) -> usize {
        self.masks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.masks.is_empty()
    }

    /// Drops instances scoring below `min_confidence`.
    pub fn retain_confident(&mut self, min_confidence: f32) {
        let keep: Vec<usize> = (0..self.len())
            .filter(|&i| self.scores.get(i).is_some_and(|&s| s >= min_confidence))
            .collect();
        if keep.len() == self.len() {
            return;
        }

        self.masks = self.masks.select(&keep);
        self.rois = keep.iter().filter_map(|&i| self.rois.get(i).copied()).collect();
        self.class_ids = keep.iter().filter_map(|&i| self.class_ids.get(i).copied()).collect();
        self.scores = keep.iter().filter_map(|&i| self.scores.get(i).copied()).collect();
    }
}

/// Finds filament instances in an image.
pub trait Detector {
    fn detect(&mut self, image: &RgbImage) -> Result<Detection>;
}

/// Detects dark, locally contrasting structures and reports each 8-connected
/// component as an instance, largest first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComponentDetector {
    /// Window of the adaptive threshold.
    pub block_size: u32,
    /// Margin of the adaptive threshold.
    pub c: i32,
    /// Components smaller than this many pixels are ignored.
    pub min_area: usize,
    /// At most this many components are reported; the smallest are dropped.
    pub max_instances: usize,
}

impl Default for ComponentDetector {
    fn default() -> Self {
        Self {
            block_size: 69,
            c: 4,
            min_area: 50,
            max_instances: 100,
        }
    }
}

impl Detector for ComponentDetector {
    fn detect(&mut self, image: &RgbImage) -> Result<Detection> {
        let gray = DynamicImage::ImageRgb8(image.clone()).to_luma8();
        let foreground = adaptive_mean_mask(&gray, self.block_size, self.c)?;
        let labels = connected_components(&foreground, Connectivity::Eight, Luma([0u8]));

        let label_count = labels.pixels().map(|p| p.0[0]).max().unwrap_or(0) as usize;
        let mut areas = vec![0usize; label_count + 1];
        for pixel in labels.pixels() {
            areas[pixel.0[0] as usize] += 1;
        }

        let mut kept: Vec<usize> = (1..=label_count)
            .filter(|&label| areas[label] >= self.min_area)
            .collect();
        let candidates = kept.len();
        kept.sort_by(|&a, &b| areas[b].cmp(&areas[a]).then(a.cmp(&b)));
        kept.truncate(self.max_instances);

        // Label -> slice index, `None` for background and dropped components.
        let mut slot = vec![None; label_count + 1];
        for (index, &label) in kept.iter().enumerate() {
            slot[label] = Some(index);
        }

        let (width, height) = image.dimensions();
        let mut data = Array3::from_elem((height as usize, width as usize, kept.len()), false);
        for (x, y, pixel) in labels.enumerate_pixels() {
            if let Some(index) = slot[pixel.0[0] as usize] {
                data[[y as usize, x as usize, index]] = true;
            }
        }

        log::debug!(
            "{} component(s), {} with area >= {}, {} kept",
            label_count,
            candidates,
            self.min_area,
            kept.len()
        );

        Ok(Detection::from_masks(InstanceMasks::from_array(data)))
    }
}
