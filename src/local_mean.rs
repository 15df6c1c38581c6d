//! Local means restricted to "counted" pixels.
//!
//! A plain box mean divides a neighbourhood sum by the window area. Here the
//! divisor is the number of neighbours flagged by a mask instead, so pixels
//! outside the mask (zeroed by the caller) do not drag the mean down.

use image::GrayImage;
use ndarray::{Array2, Zip};

use crate::convolve::convolve_symmetric;
use crate::error::{Result, SegmentationError};
use crate::grid::to_grid;

/// Rejects window sides without a true centre pixel and a neighbour.
pub(crate) fn check_block_size(size: u32) -> Result<()> {
    if size < 3 || size % 2 == 0 {
        return Err(SegmentationError::InvalidBlockSize(size));
    }
    Ok(())
}

/// Builds the `size x size` ones kernel with its centre tap zeroed.
///
/// `size` must be odd and greater than one so there is a true centre and at
/// least one neighbour.
pub fn neighbor_kernel(size: u32) -> Result<Array2<f64>> {
    check_block_size(size)?;
    let side = size as usize;
    let mut kernel = Array2::from_elem((side, side), 1.0);
    kernel[[side / 2, side / 2]] = 0.0;
    Ok(kernel)
}

/// Scales a 0/255 mask image into a 0.0/1.0 grid.
pub fn normalize_mask(mask: &GrayImage) -> Array2<f64> {
    to_grid(mask) / 255.0
}

/// Number of counted neighbours of every pixel under `kernel`.
pub fn neighbor_count(mask: &Array2<f64>, kernel: &Array2<f64>) -> Array2<f64> {
    convolve_symmetric(mask, kernel)
}

/// Mean over the counted neighbours of every pixel.
///
/// `mask` is a normalised 0.0/1.0 grid (see [`normalize_mask`]). The
/// neighbourhood sum includes whatever values `image` holds at uncounted
/// pixels, so callers zero those first when they should not contribute.
///
/// A pixel with no counted neighbour at all falls back to the mean over the
/// whole kernel area, `sum / (size * size - 1)`, so the result never holds
/// NaN or infinities.
pub fn masked_local_mean(
    image: &Array2<f64>,
    mask: &Array2<f64>,
    size: u32,
) -> Result<Array2<f64>> {
    if image.dim() != mask.dim() {
        return Err(SegmentationError::ShapeMismatch {
            expected: image.dim(),
            actual: mask.dim(),
        });
    }

    let kernel = neighbor_kernel(size)?;
    let area = kernel.sum();
    let counts = neighbor_count(mask, &kernel);
    let sums = convolve_symmetric(image, &kernel);

    let mut mean = Array2::zeros(image.dim());
    Zip::from(&mut mean)
        .and(&sums)
        .and(&counts)
        .for_each(|mean, &sum, &count| {
            // Counts are sums of 0/1 taps; anything below one half is zero.
            *mean = if count > 0.5 { sum / count } else { sum / area };
        });
    Ok(mean)
}
