use smart_leds::{RGB8, brightness, gamma};

use crate::BoardError;
use crate::config;
use crate::gradient::OFF;

/// Hardware side of the strip: pushes one complete frame to the LEDs
pub trait StripDriver {
    fn write(&mut self, pixels: &[RGB8]) -> Result<(), BoardError>;
}

/// Pixel buffer owned by the display loop.
///
/// Pixel setters only touch the buffer; nothing reaches the LEDs until [`PixelStrip::show`],
/// which applies gamma correction and the global luminance to the whole frame.
pub struct PixelStrip<D>
where
    D: StripDriver,
{
    driver: D,
    pixels: [RGB8; config::PIXEL_COUNT],
    luminance: u8,
}

impl<D> PixelStrip<D>
where
    D: StripDriver,
{
    /// Create a new strip, all pixels off, full luminance
    pub fn new(driver: D) -> Self {
        Self {
            driver,
            pixels: [OFF; config::PIXEL_COUNT],
            luminance: config::MAX_LUMINANCE,
        }
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn pixels(&self) -> &[RGB8] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [RGB8] {
        &mut self.pixels
    }

    /// Set one pixel, out of range indices are ignored
    pub fn set_pixel(&mut self, index: usize, color: RGB8) {
        if let Some(pixel) = self.pixels.get_mut(index) {
            *pixel = color;
        }
    }

    /// Set pixels `from..to` (clipped to the strip)
    pub fn clear_range(&mut self, from: usize, to: usize, color: RGB8) {
        let to = to.min(self.pixels.len());
        if from < to {
            self.pixels[from..to].fill(color);
        }
    }

    /// Set every pixel
    pub fn clear_to(&mut self, color: RGB8) {
        self.pixels.fill(color);
    }

    pub fn luminance(&self) -> u8 {
        self.luminance
    }

    /// Set the global luminance (0-255), returns true if it changed
    pub fn set_luminance(&mut self, luminance: u8) -> bool {
        let changed = self.luminance != luminance;
        self.luminance = luminance;
        changed
    }

    /// Push the buffer to the hardware
    pub fn show(&mut self) -> Result<(), BoardError> {
        let mut frame = [OFF; config::PIXEL_COUNT];
        let corrected = brightness(gamma(self.pixels.iter().copied()), self.luminance);
        for (slot, color) in frame.iter_mut().zip(corrected) {
            *slot = color;
        }

        self.driver.write(&frame)
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }
}

/// Green fade in and out played once at boot, yields the green level per step
pub struct StartupFade {
    level: u8,
    rising: bool,
    done: bool,
}

impl StartupFade {
    /// 255 steps in, 255 steps out
    pub const STEPS: u64 = 510;

    pub fn new() -> Self {
        Self {
            level: 0,
            rising: true,
            done: false,
        }
    }

    /// Delay between steps so the whole fade takes about `STARTUP_FADE_MS`
    pub fn step_delay_ms() -> u64 {
        config::STARTUP_FADE_MS / 255 / 2
    }
}

impl Default for StartupFade {
    fn default() -> Self {
        Self::new()
    }
}

impl Iterator for StartupFade {
    type Item = RGB8;

    fn next(&mut self) -> Option<RGB8> {
        if self.done {
            return None;
        }

        // Fade in 0..=254, fade out 255..=1
        let level = self.level;
        if self.rising {
            if level == 254 {
                self.rising = false;
                self.level = 255;
            } else {
                self.level += 1;
            }
        } else if level == 1 {
            self.done = true;
        } else {
            self.level -= 1;
        }

        Some(RGB8 { r: 0, g: level, b: 0 })
    }
}
