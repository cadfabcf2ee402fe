//! CO2 to colour mapping.
//!
//! The scale is split into one equal-width band per pixel. Pixels for bands below the
//! smoothed value are fully lit, the pixel of the band containing it is lit by how far
//! into the band the value is, and the rest are off. All lit pixels share one hue,
//! interpolated linearly from green at the bottom of the scale to red at the top.

use smart_leds::RGB8;
use smart_leds::hsv::{Hsv, hsv2rgb};

use crate::config;

/// Pixel colour for "off"
pub const OFF: RGB8 = RGB8 { r: 0, g: 0, b: 0 };

/// Range and hue endpoints of the CO2 gradient
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Co2Scale {
    pub min_ppm: u16,
    pub max_ppm: u16,
    pub hue_at_min: f32,
    pub hue_at_max: f32,
}

/// How a CO2 value fills the strip
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Partition {
    /// Pixels `0..fully_lit` are at full brightness
    pub fully_lit: usize,
    /// Index of the partially lit pixel, always `fully_lit`
    pub partial: usize,
    /// Brightness of the partial pixel, 0.0..=1.0
    pub fraction: f32,
}

impl Co2Scale {
    pub const DEFAULT: Self = Self {
        min_ppm: config::CO2_MIN_PPM,
        max_ppm: config::CO2_MAX_PPM,
        hue_at_min: config::CO2_MIN_HUE,
        hue_at_max: config::CO2_MAX_HUE,
    };

    /// Linear interpolation between the hue endpoints, clamped to the scale
    pub fn hue_for(&self, ppm: u16) -> f32 {
        let ppm = ppm.clamp(self.min_ppm, self.max_ppm);
        let span = f32::from(self.max_ppm - self.min_ppm);
        if span == 0.0 {
            return self.hue_at_min;
        }

        f32::from(ppm - self.min_ppm) * (self.hue_at_max - self.hue_at_min) / span
            + self.hue_at_min
    }

    /// Width of one pixel's band in ppm (integer division, never zero)
    pub fn band_width(&self, pixel_count: usize) -> u16 {
        let span = usize::from(self.max_ppm.saturating_sub(self.min_ppm));
        (span / pixel_count.max(1)).max(1) as u16
    }

    /// Split a smoothed value into fully lit pixels and one partial pixel.
    ///
    /// The partial pixel index is capped at the last pixel, so values in the top
    /// band remainder light the last pixel fully instead of indexing past the strip.
    pub fn partition(&self, ppm: u16, pixel_count: usize) -> Partition {
        let band = self.band_width(pixel_count);
        let offset = ppm.saturating_sub(self.min_ppm);

        let last = pixel_count.saturating_sub(1);
        let fully_lit = usize::from(offset / band).min(last);

        let band_floor = u32::from(self.min_ppm) + fully_lit as u32 * u32::from(band);
        let into_band = u32::from(ppm).saturating_sub(band_floor);
        let fraction = (into_band as f32 / f32::from(band)).clamp(0.0, 1.0);

        Partition {
            fully_lit,
            partial: fully_lit,
            fraction,
        }
    }

    /// Colour of the alarm flash, the hue of the top of the scale
    pub fn alarm_color(&self) -> RGB8 {
        hsb_to_rgb(self.hue_at_max, 1.0)
    }
}

/// Fully saturated colour for a hue and brightness, both in 0.0..=1.0
pub fn hsb_to_rgb(hue: f32, brightness: f32) -> RGB8 {
    hsv2rgb(Hsv {
        hue: (hue.clamp(0.0, 1.0) * 255.0) as u8,
        sat: 255,
        val: (brightness.clamp(0.0, 1.0) * 255.0) as u8,
    })
}

/// Paint the gradient for `ppm` into `pixels`, returns the hue used
pub fn fill_gradient(pixels: &mut [RGB8], scale: &Co2Scale, ppm: u16) -> f32 {
    let hue = scale.hue_for(ppm);
    if pixels.is_empty() {
        return hue;
    }

    let partition = scale.partition(ppm, pixels.len());
    let full = hsb_to_rgb(hue, 1.0);

    for (index, pixel) in pixels.iter_mut().enumerate() {
        *pixel = if index < partition.fully_lit {
            full
        } else if index == partition.partial {
            hsb_to_rgb(hue, partition.fraction)
        } else {
            OFF
        };
    }

    hue
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCALE: Co2Scale = Co2Scale::DEFAULT;
    const PIXELS: usize = 9;

    #[test]
    fn test_hue_boundaries() {
        assert!((SCALE.hue_for(450) - 0.3).abs() < 1e-6);
        assert!((SCALE.hue_for(2000) - 0.0).abs() < 1e-6);
    }

    #[test]
    fn test_hue_decreases_as_co2_rises() {
        let mut previous = SCALE.hue_for(SCALE.min_ppm);
        for ppm in SCALE.min_ppm..SCALE.max_ppm {
            let hue = SCALE.hue_for(ppm);
            assert!(hue <= previous, "hue rose at {} ppm", ppm);
            previous = hue;
        }
    }

    #[test]
    fn test_hue_clamped_outside_scale() {
        assert_eq!(SCALE.hue_for(0), SCALE.hue_for(450));
        assert_eq!(SCALE.hue_for(5000), SCALE.hue_for(2000));
    }

    #[test]
    fn test_band_width() {
        assert_eq!(SCALE.band_width(PIXELS), 172);
        assert_eq!(SCALE.band_width(0), 1550);
        let narrow = Co2Scale {
            min_ppm: 450,
            max_ppm: 452,
            ..SCALE
        };
        assert_eq!(narrow.band_width(PIXELS), 1);
    }

    #[test]
    fn test_partition_at_bottom_of_scale() {
        let p = SCALE.partition(450, PIXELS);
        assert_eq!(p.fully_lit, 0);
        assert_eq!(p.partial, 0);
        assert_eq!(p.fraction, 0.0);
    }

    #[test]
    fn test_partition_on_band_boundary() {
        let p = SCALE.partition(622, PIXELS);
        assert_eq!(p.fully_lit, 1);
        assert_eq!(p.partial, 1);
        assert_eq!(p.fraction, 0.0);
    }

    #[test]
    fn test_partition_inside_band() {
        let p = SCALE.partition(700, PIXELS);
        assert_eq!(p.fully_lit, 1);
        assert_eq!(p.partial, 1);
        assert!((p.fraction - 78.0 / 172.0).abs() < 1e-6);
        assert!((p.fraction - 0.453).abs() < 1e-3);
    }

    #[test]
    fn test_partition_top_remainder_stays_on_strip() {
        // 9 * 172 = 1548, so 1998 and 1999 fall past the last full band
        for ppm in 1990..2000 {
            let p = SCALE.partition(ppm, PIXELS);
            assert_eq!(p.partial, PIXELS - 1);
            assert!(p.fully_lit + 1 <= PIXELS);
            assert!(p.fraction <= 1.0);
        }
        assert_eq!(SCALE.partition(1999, PIXELS).fraction, 1.0);
    }

    #[test]
    fn test_every_value_has_one_partial_pixel() {
        let mut pixels = [OFF; PIXELS];
        for ppm in (SCALE.min_ppm + 1)..SCALE.max_ppm {
            fill_gradient(&mut pixels, &SCALE, ppm);
            let p = SCALE.partition(ppm, PIXELS);
            let hue = SCALE.hue_for(ppm);
            let full = hsb_to_rgb(hue, 1.0);

            assert!(p.fully_lit + 1 <= PIXELS);
            assert_eq!(p.partial, p.fully_lit);
            assert!(pixels[..p.fully_lit].iter().all(|c| *c == full));
            assert_eq!(pixels[p.partial], hsb_to_rgb(hue, p.fraction), "at {} ppm", ppm);
            assert!(pixels[p.partial + 1..].iter().all(|c| *c == OFF));
        }
    }

    #[test]
    fn test_fill_gradient_end_to_end() {
        let mut pixels = [OFF; PIXELS];
        let hue = fill_gradient(&mut pixels, &SCALE, 700);

        let full = hsb_to_rgb(hue, 1.0);
        assert_eq!(pixels[0], full);
        assert_eq!(pixels[1], hsb_to_rgb(hue, 78.0 / 172.0));
        assert_ne!(pixels[1], OFF);
        assert!(pixels[2..].iter().all(|c| *c == OFF));
    }

    #[test]
    fn test_fill_gradient_at_minimum_is_dark() {
        let mut pixels = [hsb_to_rgb(0.1, 1.0); PIXELS];
        fill_gradient(&mut pixels, &SCALE, 450);
        assert!(pixels.iter().all(|c| *c == OFF));
    }

    #[test]
    fn test_hsb_to_rgb() {
        assert_eq!(hsb_to_rgb(0.0, 1.0), RGB8 { r: 255, g: 0, b: 0 });
        assert_eq!(hsb_to_rgb(0.3, 0.0), OFF);

        let green = hsb_to_rgb(0.3, 1.0);
        assert!(green.g > green.r && green.g > green.b);
    }

    #[test]
    fn test_alarm_color_is_red() {
        assert_eq!(SCALE.alarm_color(), RGB8 { r: 255, g: 0, b: 0 });
    }
}
