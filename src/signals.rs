//! Latest-value slots shared between the acquisition loops and the display loop.
//!
//! Each slot has exactly one writer. Readers always see the most recent value and never
//! queue; a value one frame stale is fine since the signals change slowly.

use core::sync::atomic::{AtomicU16, Ordering};

use crate::config;

/// Single-producer latest-value cell
pub struct LatestValue {
    value: AtomicU16,
}

impl LatestValue {
    pub const fn new(initial: u16) -> Self {
        Self {
            value: AtomicU16::new(initial),
        }
    }

    /// Overwrite the slot
    pub fn publish(&self, value: u16) {
        self.value.store(value, Ordering::Relaxed);
    }

    /// Most recently published value
    pub fn latest(&self) -> u16 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Signals published by the sensor loops
pub struct SharedSignals {
    /// CO2 in ppm, written by the CO2 acquisition loop
    pub co2: LatestValue,
    /// Ambient light in tenths of a lux, written by the light acquisition loop
    pub lux: LatestValue,
}

impl SharedSignals {
    /// CO2 starts at the bottom of the scale, lux at zero
    pub const fn new() -> Self {
        Self {
            co2: LatestValue::new(config::CO2_MIN_PPM),
            lux: LatestValue::new(0),
        }
    }
}

impl Default for SharedSignals {
    fn default() -> Self {
        Self::new()
    }
}
