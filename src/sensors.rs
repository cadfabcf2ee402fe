//! Sensor capabilities consumed by the acquisition loops.

use crate::BoardError;

/// One SCD4x reading
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    /// CO2 concentration in ppm
    pub co2: u16,
    /// Degrees Celsius
    pub temperature: f32,
    /// Relative humidity in percent
    pub humidity: f32,
}

/// CO2 / temperature / humidity source
#[allow(async_fn_in_trait)]
pub trait Co2Sensor {
    /// Put the sensor into periodic measurement mode
    async fn start_measurement(&mut self) -> Result<(), BoardError>;

    /// True once a new measurement can be read
    async fn is_data_ready(&mut self) -> Result<bool, BoardError>;

    /// Read the latest measurement
    async fn read_measurement(&mut self) -> Result<Measurement, BoardError>;
}

/// Ambient light source
#[allow(async_fn_in_trait)]
pub trait LightSensor {
    /// Configure the sensor, called once before the first reading
    async fn init(&mut self) -> Result<(), BoardError>;

    /// Ambient light in lux
    async fn read_lux(&mut self) -> Result<f32, BoardError>;
}

/// Map a bus error onto the board error
pub(crate) fn i2c_error<E: embedded_hal::i2c::Error>(error: E) -> BoardError {
    BoardError::I2cError(error.kind())
}
