//! Host-side fakes shared by the unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::vec::Vec;

use embassy_time::Instant;
use embedded_hal::i2c::ErrorKind;
use embedded_hal_async::i2c::{ErrorType, I2c, Operation};
use smart_leds::RGB8;

use crate::BoardError;
use crate::led_control::StripDriver;
use crate::sensors::{Co2Sensor, LightSensor, Measurement};

/// Strip driver that keeps every frame it is given
pub struct RecordingDriver {
    frames: Vec<Vec<RGB8>>,
    fail: bool,
}

impl RecordingDriver {
    pub fn new() -> Self {
        Self {
            frames: Vec::new(),
            fail: false,
        }
    }

    /// Number of successful writes
    pub fn writes(&self) -> usize {
        self.frames.len()
    }

    pub fn last_frame(&self) -> Option<&[RGB8]> {
        self.frames.last().map(|frame| frame.as_slice())
    }

    /// Make every following write fail with `LedError`
    pub fn fail_writes(&mut self, fail: bool) {
        self.fail = fail;
    }
}

impl StripDriver for RecordingDriver {
    fn write(&mut self, pixels: &[RGB8]) -> Result<(), BoardError> {
        if self.fail {
            return Err(BoardError::LedError);
        }
        self.frames.push(pixels.to_vec());
        Ok(())
    }
}

/// Strip driver that stamps each frame with the embassy clock.
///
/// Clones share one log, so a test can keep a handle while the loop owns the driver.
#[derive(Clone)]
pub struct TimedDriver {
    frames: Arc<Mutex<Vec<(u64, Vec<RGB8>)>>>,
}

impl TimedDriver {
    pub fn new() -> Self {
        Self {
            frames: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Milliseconds since boot and pixels of every frame so far
    pub fn frames(&self) -> Vec<(u64, Vec<RGB8>)> {
        self.frames.lock().unwrap().clone()
    }
}

impl StripDriver for TimedDriver {
    fn write(&mut self, pixels: &[RGB8]) -> Result<(), BoardError> {
        let now = Instant::now().as_millis();
        self.frames.lock().unwrap().push((now, pixels.to_vec()));
        Ok(())
    }
}

/// I2C bus that records writes and answers reads from a script
pub struct FakeBus {
    writes: Vec<(u8, Vec<u8>)>,
    reads: VecDeque<Vec<u8>>,
    fail: bool,
}

impl FakeBus {
    pub fn new() -> Self {
        Self {
            writes: Vec::new(),
            reads: VecDeque::new(),
            fail: false,
        }
    }

    /// Queue the bytes returned by the next read
    pub fn queue_read(&mut self, bytes: &[u8]) {
        self.reads.push_back(bytes.to_vec());
    }

    /// Make every following transaction fail
    pub fn fail_all(&mut self, fail: bool) {
        self.fail = fail;
    }

    /// Address and payload of every write so far
    pub fn writes(&self) -> &[(u8, Vec<u8>)] {
        &self.writes
    }
}

impl ErrorType for FakeBus {
    type Error = ErrorKind;
}

impl I2c for FakeBus {
    async fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if self.fail {
            return Err(ErrorKind::Other);
        }

        for operation in operations {
            match operation {
                Operation::Write(bytes) => self.writes.push((address, bytes.to_vec())),
                Operation::Read(buffer) => {
                    let scripted = self.reads.pop_front().ok_or(ErrorKind::Other)?;
                    let len = scripted.len().min(buffer.len());
                    buffer[..len].copy_from_slice(&scripted[..len]);
                }
            }
        }

        Ok(())
    }
}

/// CO2 sensor answering from scripted queues
pub struct FakeCo2Sensor {
    ready: VecDeque<Result<bool, BoardError>>,
    measurements: VecDeque<Result<Measurement, BoardError>>,
}

impl FakeCo2Sensor {
    pub fn new() -> Self {
        Self {
            ready: VecDeque::new(),
            measurements: VecDeque::new(),
        }
    }

    pub fn queue_ready(&mut self, ready: Result<bool, BoardError>) {
        self.ready.push_back(ready);
    }

    pub fn queue_measurement(&mut self, measurement: Result<Measurement, BoardError>) {
        self.measurements.push_back(measurement);
    }

    /// Queue a ready flag followed by a reading of `co2` ppm
    pub fn queue_co2(&mut self, co2: u16) {
        self.queue_ready(Ok(true));
        self.queue_measurement(Ok(Measurement {
            co2,
            temperature: 21.5,
            humidity: 40.0,
        }));
    }
}

impl Co2Sensor for FakeCo2Sensor {
    async fn start_measurement(&mut self) -> Result<(), BoardError> {
        Ok(())
    }

    async fn is_data_ready(&mut self) -> Result<bool, BoardError> {
        self.ready.pop_front().unwrap_or(Ok(false))
    }

    async fn read_measurement(&mut self) -> Result<Measurement, BoardError> {
        self.measurements
            .pop_front()
            .unwrap_or(Err(BoardError::DataNotReady))
    }
}

/// Light sensor answering from a scripted queue
pub struct FakeLightSensor {
    pub initialized: bool,
    readings: VecDeque<Result<f32, BoardError>>,
}

impl FakeLightSensor {
    pub fn new() -> Self {
        Self {
            initialized: false,
            readings: VecDeque::new(),
        }
    }

    pub fn queue_lux(&mut self, reading: Result<f32, BoardError>) {
        self.readings.push_back(reading);
    }
}

impl LightSensor for FakeLightSensor {
    async fn init(&mut self) -> Result<(), BoardError> {
        self.initialized = true;
        Ok(())
    }

    async fn read_lux(&mut self) -> Result<f32, BoardError> {
        self.readings
            .pop_front()
            .unwrap_or(Err(BoardError::I2cError(ErrorKind::Other)))
    }
}
