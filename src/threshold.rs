//! Two-pass, mask-aware adaptive thresholding.
//!
//! The first pass is an ordinary mean-C adaptive threshold, inverted so that
//! pixels darker than their surroundings become foreground. The second pass
//! re-thresholds only that foreground, against a local mean computed from
//! foreground neighbours alone. Pixels the first pass left as background are
//! copied through from the input unchanged.

use image::GrayImage;
use ndarray::{Array2, Zip};

use crate::convolve::box_mean_replicate;
use crate::error::Result;
use crate::grid::{to_gray, to_grid};
use crate::local_mean::{check_block_size, masked_local_mean, normalize_mask};

/// Tuning for [`threshold`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdParams {
    /// Value written for pixels above their local threshold.
    pub max_value: u8,
    /// Side of the neighbour window used by the masked pass.
    pub block_size: u32,
    /// Margin subtracted from the masked local mean.
    pub c: f64,
    /// Side of the window used by the first, unmasked pass.
    pub prefilter_block_size: u32,
    /// Margin of the first pass.
    pub prefilter_c: i32,
    /// First-pass mask values above this level count as foreground.
    pub mask_level: u8,
}

impl Default for ThresholdParams {
    fn default() -> Self {
        Self {
            max_value: 255,
            block_size: 9,
            c: 4.0,
            prefilter_block_size: 69,
            prefilter_c: 4,
            mask_level: 100,
        }
    }
}

/// Mean-C adaptive threshold, inverted.
///
/// A pixel is compared with the rounded mean of the `block_size` window around
/// it (edges replicated). Pixels with `src - mean > -c` are background (0),
/// everything else is foreground (255).
pub fn adaptive_mean_mask(image: &GrayImage, block_size: u32, c: i32) -> Result<GrayImage> {
    check_block_size(block_size)?;

    let grid = to_grid(image);
    let mean = box_mean_replicate(&grid, block_size as usize);
    let mask = Zip::from(&grid).and(&mean).map_collect(|&src, &mean| {
        let diff = src as i32 - mean.round_ties_even() as i32;
        if diff > -c { 0.0 } else { 255.0 }
    });
    Ok(to_gray(&mask))
}

/// Which pixels of a 0/255 mask image count as foreground.
pub fn counted_pixels(mask: &GrayImage, level: u8) -> Array2<bool> {
    to_grid(mask).mapv(|v| v > level as f64)
}

/// Zeroes every pixel that is not counted.
pub fn mask_image(image: &Array2<f64>, counted: &Array2<bool>) -> Array2<f64> {
    Zip::from(image)
        .and(counted)
        .map_collect(|&v, &keep| if keep { v } else { 0.0 })
}

/// `max_value` where a pixel exceeds `mean - c`, zero elsewhere.
pub fn binarize(image: &Array2<f64>, mean: &Array2<f64>, max_value: u8, c: f64) -> Array2<f64> {
    let high = max_value as f64;
    Zip::from(image)
        .and(mean)
        .map_collect(|&v, &m| if v > m - c { high } else { 0.0 })
}

/// Takes `binary` where counted and `original` everywhere else.
pub fn unmask(
    original: &Array2<f64>,
    binary: &Array2<f64>,
    counted: &Array2<bool>,
) -> Array2<f64> {
    Zip::from(original)
        .and(binary)
        .and(counted)
        .map_collect(|&o, &b, &keep| if keep { b } else { o })
}

/// Binarizes `image` with the two-pass masked adaptive threshold.
///
/// The output is `params.max_value` or 0 wherever the first pass found
/// foreground. Background pixels keep their input value.
pub fn threshold(image: &GrayImage, params: &ThresholdParams) -> Result<GrayImage> {
    check_block_size(params.block_size)?;

    let mask = adaptive_mean_mask(image, params.prefilter_block_size, params.prefilter_c)?;
    let counted = counted_pixels(&mask, params.mask_level);

    let original = to_grid(image);
    let masked = mask_image(&original, &counted);
    let mean = masked_local_mean(&masked, &normalize_mask(&mask), params.block_size)?;
    let binary = binarize(&masked, &mean, params.max_value, params.c);

    Ok(to_gray(&unmask(&original, &binary, &counted)))
}
