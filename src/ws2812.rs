//! WS2812 strip on an RMT channel.
//!
//! The channel runs at 10 MHz (100 ns per tick). Colours go out in GRB order, most
//! significant bit first, followed by a low reset pulse that also ends the transmission.

use esp_hal::gpio::Level;
use esp_hal::rmt::{PulseCode, TxChannel};
use smart_leds::RGB8;

use crate::BoardError;
use crate::config;
use crate::led_control::StripDriver;

const BITS_PER_PIXEL: usize = 24;
const PULSE_COUNT: usize = config::PIXEL_COUNT * BITS_PER_PIXEL + 1;

/// Convert a single byte to RMT pulses
/// 1-bit = 800ns high + 400ns low, 0-bit = 400ns high + 800ns low
fn byte_to_pulses(byte: u8, pulses: &mut [u32]) {
    for (i, pulse) in pulses.iter_mut().take(8).enumerate() {
        let bit = (byte >> (7 - i)) & 1;
        *pulse = if bit == 1 {
            PulseCode::new(Level::High, 8, Level::Low, 4)
        } else {
            PulseCode::new(Level::High, 4, Level::Low, 8)
        };
    }
}

pub struct Ws2812Driver<TX>
where
    TX: TxChannel,
{
    channel: Option<TX>,
    pulses: [u32; PULSE_COUNT],
}

impl<TX> Ws2812Driver<TX>
where
    TX: TxChannel,
{
    pub fn new(channel: TX) -> Self {
        Self {
            channel: Some(channel),
            pulses: [0; PULSE_COUNT],
        }
    }

    fn encode(&mut self, pixels: &[RGB8]) -> usize {
        let mut offset = 0;
        for pixel in pixels.iter().take(config::PIXEL_COUNT) {
            for byte in [pixel.g, pixel.r, pixel.b] {
                byte_to_pulses(byte, &mut self.pulses[offset..offset + 8]);
                offset += 8;
            }
        }

        // Reset (>50us low) and end marker
        self.pulses[offset] = PulseCode::new(Level::Low, 600, Level::Low, 0);
        offset + 1
    }
}

impl<TX> StripDriver for Ws2812Driver<TX>
where
    TX: TxChannel,
{
    fn write(&mut self, pixels: &[RGB8]) -> Result<(), BoardError> {
        let len = self.encode(pixels);
        let channel = self.channel.take().ok_or(BoardError::LedError)?;

        match channel.transmit(&self.pulses[..len]) {
            Ok(transaction) => match transaction.wait() {
                Ok(channel) => {
                    self.channel = Some(channel);
                    Ok(())
                }
                Err((_, channel)) => {
                    self.channel = Some(channel);
                    Err(BoardError::LedError)
                }
            },
            Err(_) => Err(BoardError::LedError),
        }
    }
}
