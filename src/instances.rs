//! Per-instance boolean footprints as produced by a detector.

use image::GrayImage;
use ndarray::{Array2, Array3, ArrayView2, Axis, Zip};

use crate::error::{Result, SegmentationError};

/// A `height x width x n` stack of instance masks.
///
/// Slice `[.., .., i]` is the footprint of instance `i`. A stack may hold no
/// instances at all, in which case it still knows the image dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceMasks {
    data: Array3<bool>,
}

impl InstanceMasks {
    /// A stack with no instances over a `height x width` image.
    pub fn empty(height: usize, width: usize) -> Self {
        Self {
            data: Array3::from_elem((height, width, 0), false),
        }
    }

    pub fn from_array(data: Array3<bool>) -> Self {
        Self { data }
    }

    /// Stacks per-instance slices. All slices must share the given shape.
    pub fn from_slices(height: usize, width: usize, slices: &[Array2<bool>]) -> Result<Self> {
        let mut data = Array3::from_elem((height, width, slices.len()), false);
        for (i, slice) in slices.iter().enumerate() {
            if slice.dim() != (height, width) {
                return Err(SegmentationError::ShapeMismatch {
                    expected: (height, width),
                    actual: slice.dim(),
                });
            }
            data.index_axis_mut(Axis(2), i).assign(slice);
        }
        Ok(Self { data })
    }

    /// Builds one instance per mask image, counting any non-zero pixel.
    pub fn from_mask_images(height: usize, width: usize, masks: &[GrayImage]) -> Result<Self> {
        let slices: Vec<Array2<bool>> = masks
            .iter()
            .map(|mask| {
                Array2::from_shape_fn(
                    (mask.height() as usize, mask.width() as usize),
                    |(row, col)| mask.get_pixel(col as u32, row as u32).0[0] != 0,
                )
            })
            .collect();
        Self::from_slices(height, width, &slices)
    }

    pub fn height(&self) -> usize {
        self.data.dim().0
    }

    pub fn width(&self) -> usize {
        self.data.dim().1
    }

    /// `(height, width)` of the underlying image.
    pub fn shape(&self) -> (usize, usize) {
        (self.height(), self.width())
    }

    /// Number of instances.
    pub fn len(&self) -> usize {
        self.data.dim().2
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Footprint of instance `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.len()`.
    pub fn instance(&self, index: usize) -> ArrayView2<'_, bool> {
        self.data.index_axis(Axis(2), index)
    }

    pub fn iter(&self) -> impl Iterator<Item = ArrayView2<'_, bool>> {
        self.data.axis_iter(Axis(2))
    }

    /// Union of all instances. All-false when the stack is empty.
    pub fn composite(&self) -> Array2<bool> {
        let mut union = Array2::from_elem(self.shape(), false);
        for slice in self.iter() {
            Zip::from(&mut union).and(&slice).for_each(|u, &s| *u |= s);
        }
        union
    }

    /// Keeps only the instances at `indices`, in that order.
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            data: self.data.select(Axis(2), indices),
        }
    }

    /// Footprint of instance `index` as a 0/255 image.
    pub fn to_mask_image(&self, index: usize) -> GrayImage {
        let slice = self.instance(index);
        GrayImage::from_fn(self.width() as u32, self.height() as u32, |x, y| {
            image::Luma([if slice[[y as usize, x as usize]] { 255 } else { 0 }])
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imageproc::gray_image;
    use ndarray::array;

    fn two_instances() -> InstanceMasks {
        InstanceMasks::from_slices(
            2,
            3,
            &[
                array![[true, false, false], [false, false, false]],
                array![[false, false, false], [false, true, true]],
            ],
        )
        .unwrap()
    }

    #[test]
    fn empty_stack_composites_to_background() {
        let masks = InstanceMasks::empty(4, 5);
        assert!(masks.is_empty());
        assert_eq!(masks.shape(), (4, 5));
        assert!(masks.composite().iter().all(|&v| !v));
    }

    #[test]
    fn composite_is_union() {
        let masks = two_instances();
        assert_eq!(masks.len(), 2);
        assert_eq!(
            masks.composite(),
            array![[true, false, false], [false, true, true]]
        );
    }

    #[test]
    fn select_reorders_and_drops() {
        let masks = two_instances();
        let picked = masks.select(&[1]);
        assert_eq!(picked.len(), 1);
        assert_eq!(picked.instance(0), masks.instance(1));
        assert!(masks.select(&[]).is_empty());
    }

    #[test]
    fn slices_must_share_shape() {
        let result = InstanceMasks::from_slices(2, 2, &[Array2::from_elem((3, 2), true)]);
        assert!(matches!(
            result,
            Err(SegmentationError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn mask_image_round_trip() {
        let masks = two_instances();
        let image = masks.to_mask_image(1);
        assert_eq!(image, gray_image!(0, 0, 0; 0, 255, 255));
        let back = InstanceMasks::from_mask_images(2, 3, &[image]).unwrap();
        assert_eq!(back.instance(0), masks.instance(1));
    }
}
