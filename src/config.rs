// SomnoWatch — Hardware & System Configuration
// Target: Seeed Studio Xiao ESP32-C3 (RISC-V)

// ---------------------------------------------------------------------------
// GPIO Pin Definitions (Xiao ESP32-C3 pinout)
// ---------------------------------------------------------------------------
pub const PIN_HAPTIC: i32 = 4;  // D2/A2 — haptic motor control
pub const PIN_I2C_SDA: i32 = 6; // D4    — I2C data line
pub const PIN_I2C_SCL: i32 = 7; // D5    — I2C clock line

// ---------------------------------------------------------------------------
// I2C Bus
// ---------------------------------------------------------------------------
pub const I2C_ADDR_MAX30102: u8 = 0x57; // pulse oximeter
pub const I2C_ADDR_MAX30205: u8 = 0x48; // skin temperature
pub const I2C_ADDR_MPU6050: u8 = 0x68;  // accelerometer
pub const I2C_TIMEOUT_TICKS: u32 = 1000; // FreeRTOS ticks

// ---------------------------------------------------------------------------
// Duty cycle
// ---------------------------------------------------------------------------
pub const WAKE_INTERVAL_S: u64 = 20; // deep sleep between wakes
pub const SYNC_HOUR: u8 = 6;         // first eligible hour-of-day for upload
pub const TZ_OFFSET_S: i64 = 0;      // RTC runs in UTC; shift here if needed

// ---------------------------------------------------------------------------
// Acquisition
// ---------------------------------------------------------------------------
pub const ACQ_BUFFER_LEN: usize = 100;    // paired red/IR samples per wake
pub const ACQ_SAMPLE_PERIOD_MS: u64 = 40; // 25 Hz → 4-second window

// ---------------------------------------------------------------------------
// Posture feedback
// ---------------------------------------------------------------------------
pub const TILT_THRESHOLD: u16 = 15_000; // raw accel counts, either axis
pub const HAPTIC_PULSE_MS: u64 = 500;

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------
pub const LOG_PATH: &str = "/spiffs/samples.csv";
pub const NVS_NAMESPACE: &str = "somnowatch";
pub const LAST_SYNC_DAY_KEY: &str = "last_sync_day";

// ---------------------------------------------------------------------------
// Network
// ---------------------------------------------------------------------------
pub const COLLECTOR_URL: &str = "http://somnowatch-collector.local/samples";
pub const PROVISION_SSID: &str = "SomnoWatch-Setup";
pub const PROVISION_TIMEOUT_S: u64 = 300; // give up and sleep; retry next boot
pub const SNTP_TIMEOUT_S: u64 = 30;
// Anything earlier than 2020-01-01 means the RTC was never set.
pub const CLOCK_TRUSTED_EPOCH: u64 = 1_577_836_800;
