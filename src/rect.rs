use image::math::Rect;
use imageproc::point::Point;
use num_traits::ToPrimitive;

use crate::instances::InstanceMasks;

/// An axis-aligned box in `(y1, x1, y2, x2)` order.
///
/// `y2` and `x2` are exclusive: a single set pixel at `(row, col)` gives
/// `(row, col, row + 1, col + 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BoundingBox {
    pub y1: u32,
    pub x1: u32,
    pub y2: u32,
    pub x2: u32,
}

impl BoundingBox {
    pub fn new(y1: u32, x1: u32, y2: u32, x2: u32) -> Self {
        Self { y1, x1, y2, x2 }
    }

    pub fn width(&self) -> u32 {
        self.x2.saturating_sub(self.x1)
    }

    pub fn height(&self) -> u32 {
        self.y2.saturating_sub(self.y1)
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// The two corners of the box drawn `margin` pixels outside it, as
    /// `(x1 - margin, y1 - margin)` and `(x2 + margin, y2 + margin)`.
    ///
    /// The corners may fall outside the image; drawing clips them.
    pub fn outline(&self, margin: i32) -> (Point<i32>, Point<i32>) {
        let coord = |v: u32| v.to_i32().unwrap_or(i32::MAX);
        (
            Point::new(coord(self.x1) - margin, coord(self.y1) - margin),
            Point::new(
                coord(self.x2).saturating_add(margin),
                coord(self.y2).saturating_add(margin),
            ),
        )
    }

    pub fn to_rect(&self) -> Rect {
        Rect {
            x: self.x1,
            y: self.y1,
            width: self.width(),
            height: self.height(),
        }
    }
}

impl std::fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{} {} {} {}]", self.y1, self.x1, self.y2, self.x2)
    }
}

/// Computes one bounding box per instance mask.
///
/// The box spans the first and last rows and columns holding a set pixel.
/// An instance with no set pixel yields the zero box `(0, 0, 0, 0)`.
///
/// # Examples
///
/// ```
/// use filament_seg::instances::InstanceMasks;
/// use filament_seg::rect::{BoundingBox, extract_bboxes};
/// use ndarray::Array2;
///
/// let mut slice = Array2::from_elem((10, 10), false);
/// slice[[2, 3]] = true;
/// slice[[5, 7]] = true;
/// let masks = InstanceMasks::from_slices(10, 10, &[slice]).unwrap();
///
/// assert_eq!(extract_bboxes(&masks), vec![BoundingBox::new(2, 3, 6, 8)]);
/// ```
pub fn extract_bboxes(masks: &InstanceMasks) -> Vec<BoundingBox> {
    masks
        .iter()
        .map(|slice| {
            let mut rows = slice
                .rows()
                .into_iter()
                .enumerate()
                .filter(|(_, row)| row.iter().any(|&v| v))
                .map(|(i, _)| i);
            let Some(y1) = rows.next() else {
                return BoundingBox::default();
            };
            let y2 = rows.last().unwrap_or(y1);

            let mut cols = slice
                .columns()
                .into_iter()
                .enumerate()
                .filter(|(_, col)| col.iter().any(|&v| v))
                .map(|(i, _)| i);
            let x1 = cols.next().unwrap_or(0);
            let x2 = cols.last().unwrap_or(x1);

            BoundingBox::new(y1 as u32, x1 as u32, y2 as u32 + 1, x2 as u32 + 1)
        })
        .collect()
}
