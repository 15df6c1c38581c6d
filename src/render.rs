//! Visualisations of a detection drawn over the source image.

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::colors::{blend, instance_colors};
use crate::contours::{draw_contours_mut, outer_contours};
use crate::detector::Detection;
use crate::rect::BoundingBox;

/// Margin, in pixels, added around each box by [`draw_boxes`].
pub const BOX_MARGIN: i32 = 10;

/// What an [`OverlayRenderer`] draws.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayOptions {
    /// Fill each instance with its own colour.
    pub show_mask: bool,
    /// Draw each roi in the instance colour.
    pub show_bbox: bool,
    /// Outline each instance in this colour.
    pub border: Option<Rgb<u8>>,
    /// Weight of the fill colour.
    pub alpha: f32,
}

impl Default for OverlayOptions {
    fn default() -> Self {
        Self {
            show_mask: true,
            show_bbox: true,
            border: None,
            alpha: 0.5,
        }
    }
}

impl OverlayOptions {
    /// Black instance outlines and nothing else.
    pub fn boundary() -> Self {
        Self {
            show_mask: false,
            show_bbox: false,
            border: Some(Rgb([0, 0, 0])),
            ..Default::default()
        }
    }

    /// Filled instance masks and nothing else.
    pub fn mask() -> Self {
        Self {
            show_mask: true,
            show_bbox: false,
            border: None,
            ..Default::default()
        }
    }
}

/// Draws a detection over an image.
pub trait OverlayRenderer {
    fn render(&self, image: &RgbImage, detection: &Detection, options: &OverlayOptions) -> RgbImage;
}

/// The bundled renderer: colour fills, traced outlines and roi rectangles.
#[derive(Debug, Clone, Copy, Default)]
pub struct InstanceOverlay;

impl OverlayRenderer for InstanceOverlay {
    fn render(&self, image: &RgbImage, detection: &Detection, options: &OverlayOptions) -> RgbImage {
        let mut canvas = image.clone();
        let colors = instance_colors(detection.len());

        if options.show_mask {
            for (slice, &color) in detection.masks.iter().zip(&colors) {
                for (x, y, pixel) in canvas.enumerate_pixels_mut() {
                    if slice[[y as usize, x as usize]] {
                        blend(pixel, color, options.alpha);
                    }
                }
            }
        }

        if let Some(border) = options.border {
            for index in 0..detection.masks.len() {
                let contours = outer_contours(&detection.masks.to_mask_image(index));
                draw_contours_mut(&mut canvas, &contours, border);
            }
        }

        if options.show_bbox {
            for (roi, &color) in detection.rois.iter().zip(&colors) {
                draw_box_mut(&mut canvas, roi, 0, color, 1);
            }
        }

        canvas
    }
}

/// Draws `roi` inflated by `margin` with a stroke `thickness` pixels wide.
///
/// The stroke is centred on the inflated outline. An even stroke puts its
/// extra pixel inside the outline. Inner rings that would collapse are skipped.
pub fn draw_box_mut(
    canvas: &mut RgbImage,
    roi: &BoundingBox,
    margin: i32,
    color: Rgb<u8>,
    thickness: u32,
) {
    let (top_left, bottom_right) = roi.outline(margin);
    let thickness = thickness as i32;
    // Positive offsets grow the ring outward, negative ones shrink it.
    for offset in -(thickness / 2)..(thickness - thickness / 2) {
        let left = top_left.x - offset;
        let top = top_left.y - offset;
        let width = bottom_right.x + offset - left + 1;
        let height = bottom_right.y + offset - top + 1;
        if width < 1 || height < 1 {
            continue;
        }
        let rect = Rect::at(left, top).of_size(width as u32, height as u32);
        draw_hollow_rect_mut(canvas, rect, color);
    }
}

/// Copies `image` and draws every roi on it, inflated by `margin`, in white
/// with a 2 pixel stroke.
pub fn draw_boxes(image: &RgbImage, rois: &[BoundingBox], margin: i32) -> RgbImage {
    let mut canvas = image.clone();
    for roi in rois {
        draw_box_mut(&mut canvas, roi, margin, Rgb([255, 255, 255]), 2);
    }
    canvas
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instances::InstanceMasks;
    use ndarray::Array2;

    const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
    const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

    fn detection_with_square() -> Detection {
        let mut slice = Array2::from_elem((40, 40), false);
        for row in 10..20 {
            for col in 10..20 {
                slice[[row, col]] = true;
            }
        }
        let masks = InstanceMasks::from_slices(40, 40, &[slice]).unwrap();
        Detection::from_masks(masks)
    }

    #[test]
    fn box_corners_are_inflated() {
        let image = RgbImage::new(200, 200);
        let roi = BoundingBox::new(50, 60, 150, 160);
        let out = draw_boxes(&image, &[roi], BOX_MARGIN);

        assert_eq!(*out.get_pixel(50, 40), WHITE);
        assert_eq!(*out.get_pixel(170, 160), WHITE);
        assert_eq!(*out.get_pixel(170, 40), WHITE);
        assert_eq!(*out.get_pixel(50, 160), WHITE);
        // The 2 pixel stroke is centred: one ring on the outline, one inside.
        assert_eq!(*out.get_pixel(51, 41), WHITE);
        assert_eq!(*out.get_pixel(169, 159), WHITE);
        assert_eq!(*out.get_pixel(49, 39), BLACK);
        assert_eq!(*out.get_pixel(171, 161), BLACK);
        assert_eq!(*out.get_pixel(52, 42), BLACK);
        // Inside the box is untouched.
        assert_eq!(*out.get_pixel(110, 100), BLACK);
        // The source image is not modified.
        assert_eq!(*image.get_pixel(50, 40), BLACK);
    }

    #[test]
    fn odd_stroke_straddles_outline() {
        let mut canvas = RgbImage::new(40, 40);
        draw_box_mut(&mut canvas, &BoundingBox::new(10, 10, 30, 30), 0, WHITE, 3);
        for x in [9, 10, 11] {
            assert_eq!(*canvas.get_pixel(x, 20), WHITE);
        }
        assert_eq!(*canvas.get_pixel(8, 20), BLACK);
        assert_eq!(*canvas.get_pixel(12, 20), BLACK);
    }

    #[test]
    fn tiny_box_skips_collapsed_inner_ring() {
        let mut canvas = RgbImage::new(10, 10);
        // x2/y2 are exclusive; with no margin the outline is the single pixel (5, 5).
        let roi = BoundingBox::new(5, 5, 5, 5);
        draw_box_mut(&mut canvas, &roi, 0, WHITE, 2);
        assert_eq!(*canvas.get_pixel(5, 5), WHITE);
        assert_eq!(*canvas.get_pixel(6, 6), BLACK);
    }

    #[test]
    fn boxes_near_edge_are_clipped() {
        let image = RgbImage::new(30, 30);
        let out = draw_boxes(&image, &[BoundingBox::new(2, 2, 25, 25)], BOX_MARGIN);
        // Only the parts of the outline inside the canvas are drawn.
        assert_eq!(*out.get_pixel(15, 15), BLACK);
        assert_eq!(out.dimensions(), (30, 30));
    }

    #[test]
    fn boundary_overlay_outlines_instances() {
        let image = RgbImage::from_pixel(40, 40, WHITE);
        let out = InstanceOverlay.render(&image, &detection_with_square(), &OverlayOptions::boundary());
        assert_eq!(*out.get_pixel(10, 10), BLACK);
        assert_eq!(*out.get_pixel(19, 15), BLACK);
        assert_eq!(*out.get_pixel(15, 15), WHITE);
        assert_eq!(*out.get_pixel(0, 0), WHITE);
    }

    #[test]
    fn mask_overlay_tints_instances_only() {
        let image = RgbImage::from_pixel(40, 40, BLACK);
        let out = InstanceOverlay.render(&image, &detection_with_square(), &OverlayOptions::mask());
        assert_eq!(*out.get_pixel(15, 15), Rgb([128, 0, 0]));
        assert_eq!(*out.get_pixel(5, 5), BLACK);
    }

    #[test]
    fn bbox_option_draws_rois() {
        let image = RgbImage::from_pixel(40, 40, BLACK);
        let options = OverlayOptions {
            show_mask: false,
            show_bbox: true,
            border: None,
            alpha: 0.5,
        };
        let out = InstanceOverlay.render(&image, &detection_with_square(), &options);
        // roi is (10, 10, 20, 20) with an exclusive far corner.
        assert_eq!(*out.get_pixel(10, 10), Rgb([255, 0, 0]));
        assert_eq!(*out.get_pixel(20, 20), Rgb([255, 0, 0]));
        assert_eq!(*out.get_pixel(15, 15), BLACK);
    }
}
