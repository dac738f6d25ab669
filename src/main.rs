// SomnoWatch — Firmware Entry Point
//
// Wake sequence (every boot is a cold start; deep sleep wipes RAM):
//   1. Mount SPIFFS and bring up the I2C bus.
//   2. First boot only: bootstrap the RTC from network time
//      (provisioning a Wi-Fi credential through the setup AP if none
//      is stored), then power the radio down.
//   3. Read the clock; past the morning hour, drain the sample log to
//      the collector (cleared only on confirmed delivery).
//   4. Acquire one HR/SpO2/temperature record and append it.
//   5. Tilt check → haptic nudge.
//   6. Arm the wake timer and deep sleep. Sleep is armed even when a
//      step fails — the duty cycle must never stall with radios on.

mod acquire;
mod clock;
mod config;
mod cycle;
#[cfg(feature = "hardware")]
mod drivers;
mod error;
mod estimator;
#[cfg(test)]
mod fakes;
mod hal;
mod posture;
mod record;
mod store;
mod sync;

#[cfg(feature = "hardware")]
fn main() {
    use std::time::Duration;

    // Link esp-idf-sys runtime patches and initialise logging.
    esp_idf_svc::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();
    log::info!("SomnoWatch waking…");

    match wake_once() {
        Ok(report) => log::info!("wake complete: {report:?}"),
        Err(e) => log::error!("wake aborted: {e:#}"),
    }

    // Terminal action of every boot, success or not.
    enter_deep_sleep(Duration::from_secs(config::WAKE_INTERVAL_S));
}

#[cfg(feature = "hardware")]
fn wake_once() -> anyhow::Result<cycle::WakeReport> {
    use std::sync::Mutex;
    use std::time::Duration;

    use anyhow::Context;
    use esp_idf_hal::gpio::{OutputPin, PinDriver};
    use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
    use esp_idf_hal::prelude::*;
    use esp_idf_svc::eventloop::EspSystemEventLoop;
    use esp_idf_svc::nvs::EspDefaultNvsPartition;

    let peripherals = Peripherals::take()?;

    drivers::storage::mount_spiffs().context("storage mount")?;

    // ---- I2C bus (shared between the three sensors) -----------------------
    let i2c_config = I2cConfig::new().baudrate(400u32.kHz().into());
    let i2c = I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio6, // SDA
        peripherals.pins.gpio7, // SCL
        &i2c_config,
    )?;
    // SAFETY: The I2C peripheral is a singleton obtained from `Peripherals::take()`.
    // It lives until deep sleep ends this process, which is "forever" from here.
    let i2c_bus: drivers::SharedBus =
        Box::leak(Box::new(Mutex::new(unsafe { core::mem::transmute(i2c) })));

    // ---- Sensors ----------------------------------------------------------
    let mut oximeter = drivers::max30102::Max30102::new(i2c_bus);
    oximeter.init().context("pulse oximeter init")?;

    let mut imu = drivers::mpu6050::Mpu6050::new(i2c_bus);
    imu.init().context("imu init")?;

    let mut probe = drivers::max30205::Max30205::new(i2c_bus);
    if !probe.is_connected() {
        log::warn!("thermal probe not responding — temperature may read 0");
    }

    let haptic_pin = PinDriver::output(peripherals.pins.gpio4.downgrade_output())?;
    let mut haptic = drivers::haptic::HapticDriver::new(haptic_pin);

    // ---- Connectivity, clock, storage -------------------------------------
    let sys_loop = EspSystemEventLoop::take()?;
    let nvs_partition = EspDefaultNvsPartition::take()?;
    let mut conn = drivers::wifi::EspConnectivity::new(
        peripherals.modem,
        sys_loop,
        nvs_partition.clone(),
    )?;
    let mut nvs = drivers::storage::EspKvStore::new(nvs_partition)?;
    let store = store::LogStore::new(config::LOG_PATH);
    let clock = clock::SystemClock;
    let mut sink = drivers::wifi::HttpSink::new(config::COLLECTOR_URL);

    // ---- The wake itself ---------------------------------------------------
    let mut cx = cycle::WakeContext {
        clock: &clock,
        conn: &mut conn,
        store: &store,
        nvs: &mut nvs,
        sink: &mut sink,
        oximeter: &mut oximeter,
        probe: &mut probe,
        imu: &mut imu,
        haptic: &mut haptic,
    };
    Ok(cycle::run_wake(
        &mut cx,
        Duration::from_millis(config::ACQ_SAMPLE_PERIOD_MS),
    ))
}

/// Arm the wake timer and enter deep sleep. Does not return.
#[cfg(feature = "hardware")]
fn enter_deep_sleep(interval: std::time::Duration) -> ! {
    log::info!("entering deep sleep for {} s", interval.as_secs());
    unsafe {
        esp_idf_sys::esp_sleep_enable_timer_wakeup(interval.as_micros() as u64);
        esp_idf_sys::esp_deep_sleep_start();
    }
}

#[cfg(not(feature = "hardware"))]
fn main() {
    eprintln!("somnowatch: built without the `hardware` feature; run `cargo test` instead.");
}
