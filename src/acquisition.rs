//! Sensor acquisition loops.
//!
//! Each loop owns its sensor and is the only writer of one [`LatestValue`] slot. Errors
//! stop at this layer: a failed or invalid reading is logged and the slot keeps its
//! previous value.

use embassy_time::Timer;
use log::{debug, info, warn};

use crate::BoardError;
use crate::config;
use crate::sensors::{Co2Sensor, LightSensor, Measurement};
use crate::signals::LatestValue;

/// What one CO2 cycle did with its reading
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CycleOutcome {
    /// New value written to the slot
    Published(u16),
    /// Sensor or bus failure, slot untouched
    SensorFault(BoardError),
    /// The sensor reported 0 ppm, slot untouched
    ZeroReading,
}

/// Number of data-ready polls that fit into one measurement cycle
pub const fn data_ready_polls() -> u32 {
    (config::CO2_DATA_READY_TIMEOUT_MS / config::CO2_POLL_INTERVAL_MS) as u32
}

pub struct Co2Acquisition<'a> {
    slot: &'a LatestValue,
}

impl<'a> Co2Acquisition<'a> {
    pub fn new(slot: &'a LatestValue) -> Self {
        Self { slot }
    }

    /// Validate a reading and publish it
    pub fn accept(&self, reading: Result<Measurement, BoardError>) -> CycleOutcome {
        match reading {
            Err(e) => {
                warn!("[SCD4x] Measurement failed: {:?}", e);
                CycleOutcome::SensorFault(e)
            }
            Ok(m) if m.co2 == 0 => {
                warn!("[SCD4x] Discarding 0 ppm reading");
                CycleOutcome::ZeroReading
            }
            Ok(m) => {
                debug!("{},{:.1},{:.1}", m.co2, m.temperature, m.humidity);
                self.slot.publish(m.co2);
                CycleOutcome::Published(m.co2)
            }
        }
    }

    /// Poll until the sensor has data, giving up after `max_polls` polls
    pub async fn wait_data_ready<S: Co2Sensor>(
        &self,
        sensor: &mut S,
        max_polls: u32,
    ) -> Result<(), BoardError> {
        for _ in 0..max_polls {
            if sensor.is_data_ready().await? {
                return Ok(());
            }
            Timer::after_millis(config::CO2_POLL_INTERVAL_MS).await;
        }
        Err(BoardError::DataNotReady)
    }

    /// Wait for data, read it and publish it
    pub async fn run_cycle<S: Co2Sensor>(&self, sensor: &mut S, max_polls: u32) -> CycleOutcome {
        let reading = match self.wait_data_ready(sensor, max_polls).await {
            Ok(()) => sensor.read_measurement().await,
            Err(e) => Err(e),
        };
        self.accept(reading)
    }

    /// Acquisition loop, never returns
    pub async fn run<S: Co2Sensor>(&self, mut sensor: S) -> ! {
        if let Err(e) = sensor.start_measurement().await {
            warn!("[SCD4x] Failed to start periodic measurement: {:?}", e);
        }

        loop {
            self.run_cycle(&mut sensor, data_ready_polls()).await;
            Timer::after_millis(config::CO2_MEASUREMENT_SLEEP_MS).await;
        }
    }
}

/// Lux to the stored unit (tenths of a lux), saturating at `LUX_MAX`
pub fn lux_to_internal(raw: f32) -> u16 {
    if raw >= f32::from(config::LUX_MAX) / config::LUX_SCALE {
        config::LUX_MAX
    } else if raw > 0.0 {
        (raw * config::LUX_SCALE) as u16
    } else {
        0
    }
}

pub struct LightAcquisition<'a> {
    slot: &'a LatestValue,
}

impl<'a> LightAcquisition<'a> {
    pub fn new(slot: &'a LatestValue) -> Self {
        Self { slot }
    }

    /// Convert and publish a reading, returns the stored value
    pub fn accept(&self, reading: Result<f32, BoardError>) -> Option<u16> {
        match reading {
            Ok(raw) => {
                let lux = lux_to_internal(raw);
                self.slot.publish(lux);
                Some(lux)
            }
            Err(e) => {
                warn!("[VEML7700] Lux reading failed: {:?}", e);
                None
            }
        }
    }

    /// Acquisition loop, never returns
    pub async fn run<S: LightSensor>(&self, mut sensor: S) -> ! {
        Timer::after_millis(config::LIGHT_STARTUP_DELAY_MS).await;

        match sensor.init().await {
            Ok(()) => info!("[VEML7700] Light sensor ready"),
            Err(e) => warn!("[VEML7700] Init failed, readings will be retried: {:?}", e),
        }

        loop {
            self.accept(sensor.read_lux().await);
            Timer::after_millis(config::LIGHT_INTERVAL_MS).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeCo2Sensor, FakeLightSensor};
    use embassy_futures::block_on;
    use embedded_hal::i2c::ErrorKind;

    const BUS_ERROR: BoardError = BoardError::I2cError(ErrorKind::Other);

    fn measurement(co2: u16) -> Measurement {
        Measurement {
            co2,
            temperature: 22.0,
            humidity: 45.0,
        }
    }

    #[test]
    fn test_valid_reading_is_published() {
        let slot = LatestValue::new(config::CO2_MIN_PPM);
        let co2 = Co2Acquisition::new(&slot);

        assert_eq!(co2.accept(Ok(measurement(812))), CycleOutcome::Published(812));
        assert_eq!(slot.latest(), 812);
    }

    #[test]
    fn test_zero_reading_is_rejected() {
        let slot = LatestValue::new(config::CO2_MIN_PPM);
        let co2 = Co2Acquisition::new(&slot);
        co2.accept(Ok(measurement(900)));

        assert_eq!(co2.accept(Ok(measurement(0))), CycleOutcome::ZeroReading);
        assert_eq!(slot.latest(), 900);
    }

    #[test]
    fn test_sensor_error_leaves_slot_unchanged() {
        let slot = LatestValue::new(config::CO2_MIN_PPM);
        let co2 = Co2Acquisition::new(&slot);

        assert_eq!(co2.accept(Err(BUS_ERROR)), CycleOutcome::SensorFault(BUS_ERROR));
        assert_eq!(slot.latest(), config::CO2_MIN_PPM);
    }

    #[test]
    fn test_cycle_waits_for_data_ready() {
        let slot = LatestValue::new(config::CO2_MIN_PPM);
        let co2 = Co2Acquisition::new(&slot);
        let mut sensor = FakeCo2Sensor::new();
        sensor.queue_ready(Ok(false));
        sensor.queue_ready(Ok(false));
        sensor.queue_co2(1200);

        assert_eq!(
            block_on(co2.run_cycle(&mut sensor, 5)),
            CycleOutcome::Published(1200)
        );
        assert_eq!(slot.latest(), 1200);
    }

    #[test]
    fn test_cycle_gives_up_after_poll_budget() {
        let slot = LatestValue::new(config::CO2_MIN_PPM);
        let co2 = Co2Acquisition::new(&slot);
        let mut sensor = FakeCo2Sensor::new();
        sensor.queue_measurement(Ok(measurement(1500)));

        assert_eq!(
            block_on(co2.run_cycle(&mut sensor, 3)),
            CycleOutcome::SensorFault(BoardError::DataNotReady)
        );
        assert_eq!(slot.latest(), config::CO2_MIN_PPM);
    }

    #[test]
    fn test_cycle_with_ready_error() {
        let slot = LatestValue::new(config::CO2_MIN_PPM);
        let co2 = Co2Acquisition::new(&slot);
        let mut sensor = FakeCo2Sensor::new();
        sensor.queue_ready(Err(BUS_ERROR));

        assert_eq!(
            block_on(co2.run_cycle(&mut sensor, 3)),
            CycleOutcome::SensorFault(BUS_ERROR)
        );
    }

    #[test]
    fn test_zero_cycle_keeps_previous_value() {
        let slot = LatestValue::new(config::CO2_MIN_PPM);
        let co2 = Co2Acquisition::new(&slot);
        let mut sensor = FakeCo2Sensor::new();
        sensor.queue_co2(700);
        sensor.queue_co2(0);

        block_on(co2.run_cycle(&mut sensor, 1));
        assert_eq!(
            block_on(co2.run_cycle(&mut sensor, 1)),
            CycleOutcome::ZeroReading
        );
        assert_eq!(slot.latest(), 700);
    }

    #[test]
    fn test_poll_budget_covers_one_cycle() {
        assert_eq!(data_ready_polls(), 166);
    }

    #[test]
    fn test_lux_conversion() {
        assert_eq!(lux_to_internal(0.0), 0);
        assert_eq!(lux_to_internal(-3.0), 0);
        assert_eq!(lux_to_internal(12.34), 123);
        assert_eq!(lux_to_internal(6499.5), 64995);
        assert_eq!(lux_to_internal(6500.0), config::LUX_MAX);
        assert_eq!(lux_to_internal(120_000.0), config::LUX_MAX);
    }

    #[test]
    fn test_light_reading_published() {
        let slot = LatestValue::new(0);
        let light = LightAcquisition::new(&slot);
        let mut sensor = FakeLightSensor::new();
        sensor.queue_lux(Ok(250.0));
        sensor.queue_lux(Err(BUS_ERROR));

        block_on(sensor.init()).unwrap();
        assert!(sensor.initialized);

        assert_eq!(light.accept(block_on(sensor.read_lux())), Some(2500));
        assert_eq!(light.accept(block_on(sensor.read_lux())), None);
        assert_eq!(slot.latest(), 2500);
    }
}
