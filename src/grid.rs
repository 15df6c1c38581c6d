//! Conversions between single-channel images and `f64` grids.
//!
//! Grids are indexed `[row, col]`, i.e. `[y, x]` in image coordinates.

use image::{GrayImage, ImageBuffer, Luma, Primitive};
use ndarray::Array2;
use num_traits::AsPrimitive;

/// Copies a single-channel image into a `height x width` grid.
pub fn to_grid<T>(image: &ImageBuffer<Luma<T>, Vec<T>>) -> Array2<f64>
where
    T: Primitive + AsPrimitive<f64>,
{
    let (width, height) = image.dimensions();
    Array2::from_shape_fn((height as usize, width as usize), |(row, col)| {
        image.get_pixel(col as u32, row as u32).0[0].as_()
    })
}

/// Rounds a grid back into an 8-bit image, saturating at 0 and 255.
pub fn to_gray(grid: &Array2<f64>) -> GrayImage {
    let (rows, cols) = grid.dim();
    GrayImage::from_fn(cols as u32, rows as u32, |x, y| {
        let value = grid[[y as usize, x as usize]];
        Luma([num::clamp(value.round(), 0.0, 255.0) as u8])
    })
}
