// SomnoWatch — Hardware Drivers (ESP32-C3, esp-idf)
//
// Register-level drivers over a shared I2C bus plus the Wi-Fi/SNTP and
// flash-storage glue. Everything here implements a capability trait
// from `hal`; nothing above this layer touches esp-idf directly.

use std::sync::Mutex;

use esp_idf_hal::i2c::I2cDriver;

pub mod haptic;
pub mod max30102;
pub mod max30205;
pub mod mpu6050;
pub mod storage;
pub mod wifi;

/// Thread-safe handle to the shared I2C bus.
pub type SharedBus = &'static Mutex<I2cDriver<'static>>;
