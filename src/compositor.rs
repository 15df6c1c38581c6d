//! Flattens detected instances onto a blank canvas and thresholds the result.

use std::path::Path;

use image::{DynamicImage, GrayImage, Luma, RgbImage};

use crate::error::{Result, SegmentationError};
use crate::instances::InstanceMasks;
use crate::threshold::{ThresholdParams, threshold};

/// Background value of the canvas that undetected pixels are painted with.
pub const BLANK: u8 = 255;

fn check_shape(image: &RgbImage, masks: &InstanceMasks) -> Result<()> {
    let expected = (image.height() as usize, image.width() as usize);
    if masks.shape() != expected {
        return Err(SegmentationError::ShapeMismatch {
            expected,
            actual: masks.shape(),
        });
    }
    Ok(())
}

/// Keeps `image` inside the union of all instances and paints everything
/// else white, then converts to grayscale.
///
/// With no instances the result is an all-white canvas.
pub fn composite(image: &RgbImage, masks: &InstanceMasks) -> Result<GrayImage> {
    check_shape(image, masks)?;
    if masks.is_empty() {
        return Ok(GrayImage::from_pixel(image.width(), image.height(), Luma([BLANK])));
    }

    let union = masks.composite();
    let mut canvas = image.clone();
    for (x, y, pixel) in canvas.enumerate_pixels_mut() {
        if !union[[y as usize, x as usize]] {
            pixel.0 = [BLANK; 3];
        }
    }
    Ok(DynamicImage::ImageRgb8(canvas).to_luma8())
}

/// Produces the binary segmentation of the detected filaments.
///
/// The composite of [`composite`] is run through [`threshold`]. When nothing
/// was detected the blank canvas is returned without thresholding.
pub fn segment_filament(
    image: &RgbImage,
    masks: &InstanceMasks,
    params: &ThresholdParams,
) -> Result<GrayImage> {
    let flat = composite(image, masks)?;
    if masks.is_empty() {
        return Ok(flat);
    }
    threshold(&flat, params)
}

/// Runs [`segment_filament`] and writes the result to `path`.
pub fn write_segmentation(
    path: &Path,
    image: &RgbImage,
    masks: &InstanceMasks,
    params: &ThresholdParams,
) -> Result<GrayImage> {
    let binary = segment_filament(image, masks, params)?;
    binary.save(path)?;
    Ok(binary)
}
