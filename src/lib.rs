//! Mask-aware adaptive thresholding for filament instance segmentation.
//!
//! Instance masks from a detector are flattened onto a blank canvas and the
//! result is binarized with a two-pass adaptive threshold whose local means
//! only count foreground pixels. The modules are leaf-first: [`convolve`]
//! and [`local_mean`] feed [`threshold`], which [`compositor`] drives;
//! [`render`] draws the visualisations and [`pipeline`] ties them to files.

mod colors;
pub mod compositor;
pub mod contours;
pub mod convolve;
pub mod detector;
pub mod error;
pub mod grid;
pub mod instances;
pub mod local_mean;
pub mod pipeline;
pub mod rect;
pub mod render;
pub mod threshold;

pub use error::{Result, SegmentationError};
