// SomnoWatch — MAX30205 Skin Temperature Driver
//
// Single 16-bit temperature register, 0.00390625 °C per LSB.

use crate::config::*;
use crate::drivers::SharedBus;
use crate::hal::ThermalProbe;

const REG_TEMPERATURE: u8 = 0x00;

pub struct Max30205 {
    bus: SharedBus,
}

impl Max30205 {
    pub fn new(bus: SharedBus) -> Self {
        Self { bus }
    }

    pub fn is_connected(&self) -> bool {
        let mut bus = self.bus.lock().unwrap();
        let mut buf = [0u8; 2];
        bus.write_read(I2C_ADDR_MAX30205, &[REG_TEMPERATURE], &mut buf, I2C_TIMEOUT_TICKS)
            .is_ok()
    }
}

impl ThermalProbe for Max30205 {
    fn read_celsius(&mut self) -> anyhow::Result<f32> {
        let mut bus = self.bus.lock().unwrap();
        let mut raw = [0u8; 2];
        bus.write_read(I2C_ADDR_MAX30205, &[REG_TEMPERATURE], &mut raw, I2C_TIMEOUT_TICKS)?;
        Ok(i16::from_be_bytes(raw) as f32 / 256.0)
    }
}
