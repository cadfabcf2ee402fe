//! Ambient light to strip luminance.

#[allow(unused_imports)]
use micromath::F32Ext;

use crate::config;
use crate::smoothing::ema_step;

/// Luminance the strip should settle at for a lux reading (tenths of a lux)
pub fn target_luminance(lux: u16) -> u8 {
    let raw = f32::from(lux).sqrt() * 5.0;
    let max = f32::from(config::MAX_LUMINANCE);
    let min = f32::from(config::MIN_LUMINANCE);

    raw.clamp(min, max) as u8
}

/// Smoothed luminance follower, stepped once per frame
pub struct AmbientDimmer {
    level: u8,
}

impl AmbientDimmer {
    /// Starts at full luminance, matching the strip at boot
    pub fn new() -> Self {
        Self {
            level: config::MAX_LUMINANCE,
        }
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    /// Jump to a level without smoothing (used when the alarm forces full output)
    pub fn force(&mut self, level: u8) {
        self.level = level;
    }

    /// Move one smoothing step toward the target for `lux`, returns the new level
    pub fn update(&mut self, lux: u16) -> u8 {
        let target = u16::from(target_luminance(lux));
        let next = ema_step(
            u16::from(self.level),
            target,
            config::LUMINANCE_SMOOTHING_FACTOR,
        );
        self.level = next.min(u16::from(config::MAX_LUMINANCE)) as u8;
        self.level
    }
}

impl Default for AmbientDimmer {
    fn default() -> Self {
        Self::new()
    }
}
