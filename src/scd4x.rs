//! Sensirion SCD4x CO2 sensor over async I2C.
//!
//! Commands are 16 bit words sent big endian. Every word the sensor returns is followed
//! by a CRC-8 byte (polynomial 0x31, init 0xFF).

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::Mutex;
use embassy_time::Timer;
use embedded_hal_async::i2c::I2c;
use log::{debug, info};

use crate::BoardError;
use crate::sensors::{Co2Sensor, Measurement, i2c_error};

/// Fixed I2C address
pub const ADDRESS: u8 = 0x62;

const CMD_START_PERIODIC_MEASUREMENT: u16 = 0x21B1;
const CMD_STOP_PERIODIC_MEASUREMENT: u16 = 0x3F86;
const CMD_GET_DATA_READY_STATUS: u16 = 0xE4B8;
const CMD_READ_MEASUREMENT: u16 = 0xEC05;
const CMD_GET_SERIAL_NUMBER: u16 = 0x3682;

/// Time the sensor needs before a command's response can be read
const COMMAND_EXECUTION_MS: u64 = 1;

/// Time the sensor needs to leave periodic mode
const STOP_EXECUTION_MS: u64 = 500;

/// CRC-8 over one data word
pub fn crc8(data: &[u8]) -> u8 {
    let mut crc: u8 = 0xFF;
    for &byte in data {
        crc ^= byte;
        for _ in 0..8 {
            if crc & 0x80 != 0 {
                crc = (crc << 1) ^ 0x31;
            } else {
                crc <<= 1;
            }
        }
    }
    crc
}

/// Split `word, crc` triplets into words, checking each CRC
fn decode_words(raw: &[u8], words: &mut [u16]) -> Result<(), BoardError> {
    for (chunk, word) in raw.chunks_exact(3).zip(words.iter_mut()) {
        if crc8(&chunk[..2]) != chunk[2] {
            return Err(BoardError::ChecksumError);
        }
        *word = u16::from_be_bytes([chunk[0], chunk[1]]);
    }
    Ok(())
}

/// The low 11 bits of the status word are zero while no data is available
pub fn data_ready(status: u16) -> bool {
    status & 0x07FF != 0
}

/// Convert the three raw measurement words
pub fn decode_measurement(words: [u16; 3]) -> Measurement {
    Measurement {
        co2: words[0],
        temperature: -45.0 + 175.0 * f32::from(words[1]) / 65536.0,
        humidity: 100.0 * f32::from(words[2]) / 65536.0,
    }
}

/// SCD4x on a shared bus, the bus is locked for the length of each command
pub struct Scd4x<'a, M, I2C>
where
    M: RawMutex,
{
    bus: &'a Mutex<M, I2C>,
}

impl<'a, M, I2C> Scd4x<'a, M, I2C>
where
    M: RawMutex,
    I2C: I2c,
{
    pub fn new(bus: &'a Mutex<M, I2C>) -> Self {
        Self { bus }
    }

    async fn send_command(&mut self, command: u16) -> Result<(), BoardError> {
        let mut bus = self.bus.lock().await;
        bus.write(ADDRESS, &command.to_be_bytes())
            .await
            .map_err(i2c_error)
    }

    async fn read_words(&mut self, command: u16, words: &mut [u16]) -> Result<(), BoardError> {
        let mut raw = [0u8; 9];
        let raw = &mut raw[..words.len() * 3];

        {
            let mut bus = self.bus.lock().await;
            bus.write(ADDRESS, &command.to_be_bytes())
                .await
                .map_err(i2c_error)?;
            Timer::after_millis(COMMAND_EXECUTION_MS).await;
            bus.read(ADDRESS, raw).await.map_err(i2c_error)?;
        }

        decode_words(raw, words)
    }

    /// Leave periodic mode, required before most configuration commands
    pub async fn stop_measurement(&mut self) -> Result<(), BoardError> {
        self.send_command(CMD_STOP_PERIODIC_MEASUREMENT).await?;
        Timer::after_millis(STOP_EXECUTION_MS).await;
        Ok(())
    }

    /// 48 bit serial number
    pub async fn serial_number(&mut self) -> Result<u64, BoardError> {
        let mut words = [0u16; 3];
        self.read_words(CMD_GET_SERIAL_NUMBER, &mut words).await?;
        Ok(words
            .iter()
            .fold(0u64, |serial, &word| (serial << 16) | u64::from(word)))
    }
}

impl<M, I2C> Co2Sensor for Scd4x<'_, M, I2C>
where
    M: RawMutex,
    I2C: I2c,
{
    async fn start_measurement(&mut self) -> Result<(), BoardError> {
        // The sensor may still be measuring from before a soft reset
        self.stop_measurement().await?;

        match self.serial_number().await {
            Ok(serial) => info!("[SCD4x] Serial number {:012x}", serial),
            Err(e) => debug!("[SCD4x] Serial number unavailable: {:?}", e),
        }

        self.send_command(CMD_START_PERIODIC_MEASUREMENT).await?;
        info!("[SCD4x] Periodic measurement started");
        Ok(())
    }

    async fn is_data_ready(&mut self) -> Result<bool, BoardError> {
        let mut status = [0u16; 1];
        self.read_words(CMD_GET_DATA_READY_STATUS, &mut status)
            .await?;
        Ok(data_ready(status[0]))
    }

    async fn read_measurement(&mut self) -> Result<Measurement, BoardError> {
        let mut words = [0u16; 3];
        self.read_words(CMD_READ_MEASUREMENT, &mut words).await?;
        Ok(decode_measurement(words))
    }
}
