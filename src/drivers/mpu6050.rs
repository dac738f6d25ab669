// SomnoWatch — MPU6050 Accelerometer Driver
//
// Custom register-level driver over the shared I2C bus. Only the two
// lateral accelerometer axes are read; the posture check works on raw
// counts at the ±2 g default scale (16384 counts/g).

use crate::config::*;
use crate::drivers::SharedBus;
use crate::hal::{InertialSensor, TiltReading};

// MPU6050 register addresses
const REG_PWR_MGMT_1: u8 = 0x6B;
const REG_CONFIG: u8 = 0x1A;
const REG_ACCEL_CONFIG: u8 = 0x1C;
const REG_ACCEL_XOUT_H: u8 = 0x3B;
const REG_WHO_AM_I: u8 = 0x75;
const WHO_AM_I_EXPECTED: u8 = 0x68;

pub struct Mpu6050 {
    bus: SharedBus,
}

impl Mpu6050 {
    pub fn new(bus: SharedBus) -> Self {
        Self { bus }
    }

    /// Verify the device is reachable on the I2C bus.
    pub fn is_connected(&self) -> bool {
        let mut bus = self.bus.lock().unwrap();
        let mut buf = [0u8; 1];
        match bus.write_read(I2C_ADDR_MPU6050, &[REG_WHO_AM_I], &mut buf, I2C_TIMEOUT_TICKS) {
            Ok(()) => buf[0] == WHO_AM_I_EXPECTED,
            Err(_) => false,
        }
    }

    /// Wake the sensor and configure accel (±2 g), DLPF 21 Hz.
    pub fn init(&self) -> anyhow::Result<()> {
        let mut bus = self.bus.lock().unwrap();

        // Wake up (clear SLEEP bit)
        bus.write(I2C_ADDR_MPU6050, &[REG_PWR_MGMT_1, 0x00], I2C_TIMEOUT_TICKS)?;

        // DLPF bandwidth 21 Hz
        bus.write(I2C_ADDR_MPU6050, &[REG_CONFIG, 0x04], I2C_TIMEOUT_TICKS)?;

        // Accelerometer: ±2 g (the tilt threshold is calibrated for this)
        bus.write(I2C_ADDR_MPU6050, &[REG_ACCEL_CONFIG, 0x00], I2C_TIMEOUT_TICKS)?;

        log::info!("MPU6050 initialised (±2g, DLPF 21Hz)");
        Ok(())
    }
}

impl InertialSensor for Mpu6050 {
    /// Burst-read the X/Y accelerometer axes as raw counts.
    fn read_tilt(&mut self) -> anyhow::Result<TiltReading> {
        let mut bus = self.bus.lock().unwrap();
        let mut raw = [0u8; 4];
        bus.write_read(
            I2C_ADDR_MPU6050,
            &[REG_ACCEL_XOUT_H],
            &mut raw,
            I2C_TIMEOUT_TICKS,
        )?;

        Ok(TiltReading {
            ax: i16::from_be_bytes([raw[0], raw[1]]),
            ay: i16::from_be_bytes([raw[2], raw[3]]),
        })
    }
}
