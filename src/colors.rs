use image::Rgb;
use palette::{FromColor, Hsl, Srgb};

/// One colour per instance, spread evenly around the hue wheel.
pub(crate) fn instance_colors(n: usize) -> Vec<Rgb<u8>> {
    (0..n)
        .map(|i| {
            let hue = (i as f32 * 360.0) / n as f32;
            let srgb: Srgb<u8> = Srgb::from_color(Hsl::new(hue, 1.0, 0.5)).into_format();
            Rgb([srgb.red, srgb.green, srgb.blue])
        })
        .collect()
}

/// Mixes `color` into `pixel` with weight `alpha` in `[0, 1]`.
pub(crate) fn blend(pixel: &mut Rgb<u8>, color: Rgb<u8>, alpha: f32) {
    let alpha = alpha.clamp(0.0, 1.0);
    for (channel, &target) in pixel.0.iter_mut().zip(color.0.iter()) {
        let mixed = *channel as f32 * (1.0 - alpha) + target as f32 * alpha;
        *channel = mixed.round() as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instance_colors_are_distinct() {
        assert!(instance_colors(0).is_empty());
        assert_eq!(instance_colors(1), vec![Rgb([255, 0, 0])]);
        assert_eq!(
            instance_colors(3),
            vec![Rgb([255, 0, 0]), Rgb([0, 255, 0]), Rgb([0, 0, 255])]
        );
    }

    #[test]
    fn blend_halfway() {
        let mut pixel = Rgb([0, 100, 255]);
        blend(&mut pixel, Rgb([255, 100, 0]), 0.5);
        assert_eq!(pixel, Rgb([128, 100, 128]));

        let mut untouched = Rgb([1, 2, 3]);
        blend(&mut untouched, Rgb([255, 255, 255]), 0.0);
        assert_eq!(untouched, Rgb([1, 2, 3]));
    }
}
