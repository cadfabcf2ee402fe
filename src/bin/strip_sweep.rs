//! Strip wiring check
//!
//! Sweeps the CO2 gradient from the bottom to the top of the scale, then flashes the
//! alarm three times, forever. No sensors needed; the strip should fill green to red
//! one pixel at a time with a smooth partial pixel at the leading edge.

#![no_std]
#![no_main]

use esp_hal::delay::Delay;
use esp_hal::gpio::Level;
use esp_hal::rmt::{Rmt, TxChannelConfig, TxChannelCreator};
use esp_hal::time::Rate;
use log::{info, warn};

use kea_co2::config;
use kea_co2::gradient::{Co2Scale, OFF, fill_gradient};
use kea_co2::led_control::{PixelStrip, StripDriver};
use kea_co2::ws2812::Ws2812Driver;

// Add app descriptor for espflash compatibility
esp_bootloader_esp_idf::esp_app_desc!();

#[panic_handler]
fn panic(_: &core::panic::PanicInfo) -> ! {
    loop {}
}

const SWEEP_STEP_PPM: usize = 5;

fn show<D: StripDriver>(strip: &mut PixelStrip<D>) {
    if let Err(e) = strip.show() {
        warn!("[TEST] Strip write failed: {:?}", e);
    }
}

#[esp_hal::main]
fn main() -> ! {
    esp_println::logger::init_logger(config::log_level());
    let peripherals = esp_hal::init(esp_hal::Config::default());

    info!("[TEST] Strip sweep on GPIO{}", config::LED_DATA_PIN);
    let rmt = Rmt::new(peripherals.RMT, Rate::from_mhz(10)).unwrap();
    let tx_config = TxChannelConfig::default()
        .with_clk_divider(1)
        .with_idle_output_level(Level::Low)
        .with_idle_output(true)
        .with_carrier_modulation(false);
    let channel = rmt.channel0.configure(peripherals.GPIO4, tx_config).unwrap();

    let mut strip = PixelStrip::new(Ws2812Driver::new(channel));
    let scale = Co2Scale::DEFAULT;
    let delay = Delay::new();

    loop {
        info!("[TEST] Gradient {} -> {} ppm", scale.min_ppm, scale.max_ppm);
        for ppm in (scale.min_ppm..=scale.max_ppm).step_by(SWEEP_STEP_PPM) {
            fill_gradient(strip.pixels_mut(), &scale, ppm);
            show(&mut strip);
            delay.delay_millis(config::FRAME_TIME_MS as u32);
        }

        info!("[TEST] Alarm flash");
        for _ in 0..3 {
            strip.clear_to(scale.alarm_color());
            show(&mut strip);
            delay.delay_millis(config::ALARM_ON_MS as u32);

            strip.clear_to(OFF);
            show(&mut strip);
            delay.delay_millis(config::ALARM_OFF_MS as u32);
        }
    }
}
