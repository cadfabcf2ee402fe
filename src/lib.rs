//! ESP32-C3 CO2 Light Bar Library
//!
//! This library holds the control loops of a CO2 indicator: a SCD4x CO2 sensor and a
//! VEML7700 ambient light sensor are polled by two acquisition loops, and a display loop
//! renders the smoothed CO2 level as a partially-lit gradient on a WS2812 strip.
//!
//! # Testing
//!
//! Everything except the RMT strip driver builds on the host:
//! ```bash
//! cargo test --lib --target x86_64-unknown-linux-gnu
//! ```
//!
//! Tests run with `std` enabled (via `cfg_attr`), the firmware runs as `no_std`.

#![cfg_attr(not(test), no_std)]

pub mod acquisition;
pub mod brightness;
pub mod display;
pub mod gradient;
pub mod led_control;
pub mod scd4x;
pub mod sensors;
pub mod signals;
pub mod smoothing;
pub mod state_machine;
pub mod veml7700;

#[cfg(target_arch = "riscv32")]
pub mod ws2812;

#[cfg(test)]
mod test_support;

/// Project version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Compile-time configuration constants
pub mod config {
    use log::LevelFilter;

    /// Bottom of the CO2 scale, all pixels off (ppm)
    pub const CO2_MIN_PPM: u16 = 450;

    /// Top of the CO2 scale, also the alarm threshold (ppm)
    pub const CO2_MAX_PPM: u16 = 2000;

    /// Hue at the bottom of the scale (green)
    pub const CO2_MIN_HUE: f32 = 0.3;

    /// Hue at the top of the scale (red)
    pub const CO2_MAX_HUE: f32 = 0.0;

    /// Makes the ~5s sensor updates look like continuous data
    pub const CO2_SMOOTHING_FACTOR: u16 = 100;

    /// Number of pixels on the strip
    pub const PIXEL_COUNT: usize = 9;

    /// LED data GPIO pin
    pub const LED_DATA_PIN: u8 = 4;

    /// I2C data / clock GPIO pins (SCD4x and VEML7700 share the bus)
    pub const I2C_SDA_PIN: u8 = 5;
    pub const I2C_SCL_PIN: u8 = 6;

    /// I2C bus frequency
    pub const I2C_FREQUENCY_KHZ: u32 = 100;

    /// Milliseconds between frames, 30ms = ~33.3fps max
    pub const FRAME_TIME_MS: u64 = 30;

    /// Alarm flash on / off durations
    pub const ALARM_ON_MS: u64 = 1000;
    pub const ALARM_OFF_MS: u64 = 1000;

    /// Total duration of the startup fade in and out
    pub const STARTUP_FADE_MS: u64 = 4500;

    /// Interval between data-ready polls of the CO2 sensor
    pub const CO2_POLL_INTERVAL_MS: u64 = 30;

    /// Sleep after a measurement, about 5s between readings
    pub const CO2_MEASUREMENT_SLEEP_MS: u64 = 4750;

    /// Upper bound on waiting for data-ready, one measurement cycle
    pub const CO2_DATA_READY_TIMEOUT_MS: u64 = 5000;

    /// Interval between ambient light readings
    pub const LIGHT_INTERVAL_MS: u64 = 500;

    /// Delay before the first light reading, lets the bus settle after boot
    pub const LIGHT_STARTUP_DELAY_MS: u64 = 1000;

    /// Raw lux is stored in tenths of a lux
    pub const LUX_SCALE: f32 = 10.0;

    /// Largest stored lux value, keeps the 16 bit slot from overflowing
    pub const LUX_MAX: u16 = 65000;

    /// Global luminance bounds
    pub const MAX_LUMINANCE: u8 = 255;
    pub const MIN_LUMINANCE: u8 = 16;

    /// Smoothing factor for ambient dimming (applied once per frame)
    pub const LUMINANCE_SMOOTHING_FACTOR: u16 = 50;

    /// Log level set at build time through `CO2_LOG_LEVEL` (see build.rs)
    pub const LOG_LEVEL: &str = env!("CO2_LOG_LEVEL");

    /// Log level for the firmware logger, `info` unless configured
    pub fn log_level() -> LevelFilter {
        parse_log_level(LOG_LEVEL).unwrap_or(LevelFilter::Info)
    }

    /// Parse a level name, case-insensitive
    pub fn parse_log_level(name: &str) -> Option<LevelFilter> {
        let name = name.trim();
        [
            ("off", LevelFilter::Off),
            ("error", LevelFilter::Error),
            ("warn", LevelFilter::Warn),
            ("info", LevelFilter::Info),
            ("debug", LevelFilter::Debug),
            ("trace", LevelFilter::Trace),
        ]
        .into_iter()
        .find(|(label, _)| label.eq_ignore_ascii_case(name))
        .map(|(_, level)| level)
    }
}

/// Error types for the light bar board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardError {
    /// I2C transaction failed
    I2cError(embedded_hal::i2c::ErrorKind),
    /// Sensor word failed its CRC check
    ChecksumError,
    /// Sensor did not report data within one measurement cycle
    DataNotReady,
    /// LED strip transmission error
    LedError,
}

#[cfg(test)]
mod tests {
    use super::config::*;
    use log::LevelFilter;

    #[test]
    fn test_parse_log_level() {
        assert_eq!(parse_log_level("debug"), Some(LevelFilter::Debug));
        assert_eq!(parse_log_level(" WARN "), Some(LevelFilter::Warn));
        assert_eq!(parse_log_level("Off"), Some(LevelFilter::Off));
        assert_eq!(parse_log_level(""), None);
        assert_eq!(parse_log_level("verbose"), None);
    }

    #[test]
    fn test_scale_constants() {
        assert!(CO2_MIN_PPM < CO2_MAX_PPM);
        assert!(CO2_MIN_HUE > CO2_MAX_HUE);
        assert!(((CO2_MAX_PPM - CO2_MIN_PPM) as usize) >= PIXEL_COUNT);
        assert!(CO2_SMOOTHING_FACTOR > 1);
    }
}
