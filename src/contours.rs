use image::{GrayImage, Rgb, RgbImage};
use imageproc::{
    contours::{BorderType, Contour, find_contours},
    drawing::draw_line_segment_mut,
};

/// Traces the outer borders of the foreground regions in a 0/255 mask.
///
/// Hole borders are dropped: an instance outline is drawn around its outside
/// only.
pub fn outer_contours(mask: &GrayImage) -> Vec<Contour<i32>> {
    let mut contours: Vec<Contour<i32>> = find_contours(mask);
    contours.retain(|contour| contour.border_type == BorderType::Outer);
    contours
}

/// Draws every contour as a closed polyline.
pub fn draw_contours_mut(canvas: &mut RgbImage, contours: &[Contour<i32>], color: Rgb<u8>) {
    for contour in contours {
        let points = &contour.points;
        if points.len() == 1 {
            let p = points[0];
            if p.x >= 0 && p.y >= 0 && (p.x as u32) < canvas.width() && (p.y as u32) < canvas.height()
            {
                canvas.put_pixel(p.x as u32, p.y as u32, color);
            }
            continue;
        }
        for (p1, p2) in points.iter().zip(points.iter().cycle().skip(1)) {
            draw_line_segment_mut(
                canvas,
                (p1.x as f32, p1.y as f32),
                (p2.x as f32, p2.y as f32),
                color,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn square_with_hole() -> GrayImage {
        let mut mask = GrayImage::new(12, 12);
        for y in 2..10 {
            for x in 2..10 {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
        for y in 5..7 {
            for x in 5..7 {
                mask.put_pixel(x, y, Luma([0]));
            }
        }
        mask
    }

    #[test]
    fn only_outer_borders_are_kept() {
        let contours = outer_contours(&square_with_hole());
        assert_eq!(contours.len(), 1);
        let points = &contours[0].points;
        assert!(points.iter().all(|p| (2..10).contains(&p.x) && (2..10).contains(&p.y)));
        assert!(points.iter().any(|p| p.x == 2 && p.y == 2));
        assert!(points.iter().any(|p| p.x == 9 && p.y == 9));
    }

    #[test]
    fn empty_mask_has_no_contours() {
        assert!(outer_contours(&GrayImage::new(5, 5)).is_empty());
    }

    #[test]
    fn drawn_outline_follows_border() {
        let contours = outer_contours(&square_with_hole());
        let mut canvas = RgbImage::new(12, 12);
        let red = Rgb([255, 0, 0]);
        draw_contours_mut(&mut canvas, &contours, red);

        assert_eq!(*canvas.get_pixel(2, 2), red);
        assert_eq!(*canvas.get_pixel(9, 5), red);
        assert_eq!(*canvas.get_pixel(2, 9), red);
        // Interior and hole stay untouched.
        assert_eq!(*canvas.get_pixel(4, 4), Rgb([0, 0, 0]));
        assert_eq!(*canvas.get_pixel(5, 5), Rgb([0, 0, 0]));
    }

    #[test]
    fn single_pixel_region_is_drawn() {
        let mut mask = GrayImage::new(4, 4);
        mask.put_pixel(1, 2, Luma([255]));
        let contours = outer_contours(&mask);
        let mut canvas = RgbImage::new(4, 4);
        draw_contours_mut(&mut canvas, &contours, Rgb([0, 255, 0]));
        assert_eq!(*canvas.get_pixel(1, 2), Rgb([0, 255, 0]));
    }
}
