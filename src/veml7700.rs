//! Vishay VEML7700 ambient light sensor over async I2C.
//!
//! Runs at gain 1/8 and 100 ms integration, the widest range the part offers, and reads
//! the white channel. Registers are 16 bit little endian.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::Mutex;
use embassy_time::Timer;
use embedded_hal_async::i2c::I2c;
use log::info;

use crate::BoardError;
use crate::sensors::{LightSensor, i2c_error};

/// Fixed I2C address
pub const ADDRESS: u8 = 0x10;

const REG_ALS_CONF: u8 = 0x00;
const REG_WHITE: u8 = 0x05;

/// ALS_GAIN = 1/8 (bits 12:11 = 0b10), ALS_IT = 100 ms (0b0000), ALS_SD = 0 (power on)
const ALS_CONF_GAIN_1_8_IT_100MS: u16 = 0x1000;

/// Integration time, the first reading is valid after one period
const INTEGRATION_MS: u64 = 100;

/// Lux per count at gain 1/8 and 100 ms
const LUX_PER_COUNT: f32 = 0.4608;

/// Counts to lux, with the non-linearity correction for low gain settings
pub fn counts_to_lux(counts: u16) -> f32 {
    let x = f32::from(counts) * LUX_PER_COUNT;
    ((6.0135e-13 * x - 9.3924e-9) * x + 8.1488e-5) * x * x + 1.0023 * x
}

pub struct Veml7700<'a, M, I2C>
where
    M: RawMutex,
{
    bus: &'a Mutex<M, I2C>,
}

impl<'a, M, I2C> Veml7700<'a, M, I2C>
where
    M: RawMutex,
    I2C: I2c,
{
    pub fn new(bus: &'a Mutex<M, I2C>) -> Self {
        Self { bus }
    }

    async fn write_register(&mut self, register: u8, value: u16) -> Result<(), BoardError> {
        let [lo, hi] = value.to_le_bytes();
        let mut bus = self.bus.lock().await;
        bus.write(ADDRESS, &[register, lo, hi])
            .await
            .map_err(i2c_error)
    }

    async fn read_register(&mut self, register: u8) -> Result<u16, BoardError> {
        let mut buffer = [0u8; 2];
        let mut bus = self.bus.lock().await;
        bus.write_read(ADDRESS, &[register], &mut buffer)
            .await
            .map_err(i2c_error)?;
        Ok(u16::from_le_bytes(buffer))
    }

    /// Raw white channel counts
    pub async fn read_white(&mut self) -> Result<u16, BoardError> {
        self.read_register(REG_WHITE).await
    }
}

impl<M, I2C> LightSensor for Veml7700<'_, M, I2C>
where
    M: RawMutex,
    I2C: I2c,
{
    async fn init(&mut self) -> Result<(), BoardError> {
        self.write_register(REG_ALS_CONF, ALS_CONF_GAIN_1_8_IT_100MS)
            .await?;
        Timer::after_millis(INTEGRATION_MS).await;
        info!("[VEML7700] Configured: gain 1/8, integration 100ms");
        Ok(())
    }

    async fn read_lux(&mut self) -> Result<f32, BoardError> {
        let counts = self.read_white().await?;
        Ok(counts_to_lux(counts))
    }
}
