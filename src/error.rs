/// Errors raised by the segmentation algorithms.
#[derive(Debug, thiserror::Error)]
pub enum SegmentationError {
    /// A window size that has no true centre pixel.
    #[error("block size must be odd and greater than 1, got {0}")]
    InvalidBlockSize(u32),

    /// Two grids that must line up pixel for pixel do not.
    #[error("shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SegmentationError>;
