#![no_std]
#![no_main]

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use esp_hal::Async;
use esp_hal::clock::CpuClock;
use esp_hal::i2c::master::{Config as I2cConfig, I2c};
use esp_hal::rmt::{Rmt, TxChannelConfig, TxChannelCreator};
use esp_hal::time::Rate;
use esp_hal::timer::timg::TimerGroup;
use esp_hal_embassy::Executor;
use log::{error, info};
use static_cell::StaticCell;

// Import our library modules
use kea_co2::acquisition::{Co2Acquisition, LightAcquisition};
use kea_co2::config;
use kea_co2::display::run_display;
use kea_co2::scd4x::Scd4x;
use kea_co2::signals::SharedSignals;
use kea_co2::veml7700::Veml7700;
use kea_co2::ws2812::Ws2812Driver;

// Add app descriptor for espflash compatibility
esp_bootloader_esp_idf::esp_app_desc!();

// SCD4x and VEML7700 share the bus
type SharedBus = Mutex<CriticalSectionRawMutex, I2c<'static, Async>>;
type StripChannel = esp_hal::rmt::Channel<esp_hal::Blocking, 0>;

static I2C_BUS_CELL: StaticCell<SharedBus> = StaticCell::new();
static SIGNALS: SharedSignals = SharedSignals::new();

// Static executor for embassy tasks
static EXECUTOR: StaticCell<Executor> = StaticCell::new();

#[panic_handler]
fn panic(_: &core::panic::PanicInfo) -> ! {
    loop {}
}

#[embassy_executor::task]
async fn co2_task(bus: &'static SharedBus, signals: &'static SharedSignals) -> ! {
    info!("[SCD4x] CO2 acquisition task started");
    Co2Acquisition::new(&signals.co2)
        .run(Scd4x::new(bus))
        .await
}

#[embassy_executor::task]
async fn light_task(bus: &'static SharedBus, signals: &'static SharedSignals) -> ! {
    info!("[VEML7700] Light acquisition task started");
    LightAcquisition::new(&signals.lux)
        .run(Veml7700::new(bus))
        .await
}

#[embassy_executor::task]
async fn display_task(
    driver: Ws2812Driver<StripChannel>,
    signals: &'static SharedSignals,
) -> ! {
    run_display(driver, signals).await
}

#[esp_hal::main]
fn main() -> ! {
    esp_println::logger::init_logger(config::log_level());
    info!("[MAIN] CO2 light bar v{}", kea_co2::VERSION);

    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    // Initialize embassy time system
    let timer_group0 = TimerGroup::new(peripherals.TIMG0);
    esp_hal_embassy::init(timer_group0.timer0);

    info!(
        "[MAIN] I2C on SDA GPIO{} / SCL GPIO{} at {} kHz",
        config::I2C_SDA_PIN,
        config::I2C_SCL_PIN,
        config::I2C_FREQUENCY_KHZ
    );
    let i2c_config =
        I2cConfig::default().with_frequency(Rate::from_khz(config::I2C_FREQUENCY_KHZ));
    let i2c = match I2c::new(peripherals.I2C0, i2c_config) {
        Ok(i2c) => i2c
            .with_sda(peripherals.GPIO5)
            .with_scl(peripherals.GPIO6)
            .into_async(),
        Err(e) => {
            error!("[MAIN] Failed to initialize I2C: {:?}", e);
            panic!("I2C initialization failed");
        }
    };
    let bus = I2C_BUS_CELL.init(Mutex::new(i2c));

    // Initialize RMT peripheral with 10MHz frequency for WS2812 timing
    info!("[LED] Setting up GPIO{} for LED data", config::LED_DATA_PIN);
    let rmt = match Rmt::new(peripherals.RMT, Rate::from_mhz(10)) {
        Ok(rmt) => rmt,
        Err(e) => {
            error!("[LED] Failed to initialize RMT: {:?}", e);
            panic!("RMT initialization failed");
        }
    };

    let tx_config = TxChannelConfig::default()
        .with_clk_divider(1)
        .with_idle_output_level(esp_hal::gpio::Level::Low)
        .with_idle_output(true)
        .with_carrier_modulation(false);

    let channel = match rmt.channel0.configure(peripherals.GPIO4, tx_config) {
        Ok(channel) => channel,
        Err(e) => {
            error!("[LED] Failed to configure RMT channel: {:?}", e);
            panic!("RMT channel configuration failed");
        }
    };
    let driver = Ws2812Driver::new(channel);
    info!("[LED] {} pixel strip ready", config::PIXEL_COUNT);

    let executor = EXECUTOR.init(Executor::new());
    executor.run(|spawner| {
        info!("[MAIN] Spawning display task...");
        spawner.must_spawn(display_task(driver, &SIGNALS));

        info!("[MAIN] Spawning CO2 task...");
        spawner.must_spawn(co2_task(bus, &SIGNALS));

        info!("[MAIN] Spawning light task...");
        spawner.must_spawn(light_task(bus, &SIGNALS));
    });
}
