// SomnoWatch — MAX30102 Pulse Oximeter Driver
//
// Custom register-level driver over the shared I2C bus.
// Configured for SpO2 mode: 100 Hz ADC with 4-sample averaging, giving
// the 25 Hz stream the acquisition window expects.

use std::thread;
use std::time::{Duration, Instant};

use crate::config::*;
use crate::drivers::SharedBus;
use crate::hal::{PulseOximeter, RawSample};

// MAX30102 register addresses
const REG_FIFO_WR_PTR: u8 = 0x04;
const REG_OVF_COUNTER: u8 = 0x05;
const REG_FIFO_RD_PTR: u8 = 0x06;
const REG_FIFO_DATA: u8 = 0x07;
const REG_FIFO_CONFIG: u8 = 0x08;
const REG_MODE_CONFIG: u8 = 0x09;
const REG_SPO2_CONFIG: u8 = 0x0A;
const REG_LED1_PA: u8 = 0x0C;
const REG_LED2_PA: u8 = 0x0D;
const REG_PART_ID: u8 = 0xFF;
const PART_ID_EXPECTED: u8 = 0x15;

const MODE_RESET: u8 = 0x40;
const MODE_SPO2: u8 = 0x03;
// Sample averaging 4, FIFO rollover enabled, almost-full at 17.
const FIFO_CONFIG: u8 = 0x5F;
// ADC range 4096 nA, 100 samples/s, 411 µs pulse width (18-bit).
const SPO2_CONFIG: u8 = 0x27;
// ~7 mA drive on both LEDs.
const LED_CURRENT: u8 = 0x24;

const SAMPLE_WAIT_TIMEOUT: Duration = Duration::from_millis(200);

pub struct Max30102 {
    bus: SharedBus,
}

impl Max30102 {
    pub fn new(bus: SharedBus) -> Self {
        Self { bus }
    }

    /// Verify the device is reachable on the I2C bus.
    pub fn is_connected(&self) -> bool {
        let mut bus = self.bus.lock().unwrap();
        let mut buf = [0u8; 1];
        match bus.write_read(I2C_ADDR_MAX30102, &[REG_PART_ID], &mut buf, I2C_TIMEOUT_TICKS) {
            Ok(()) => buf[0] == PART_ID_EXPECTED,
            Err(_) => false,
        }
    }

    /// Reset, then configure SpO2 mode, FIFO, and LED currents.
    pub fn init(&self) -> anyhow::Result<()> {
        {
            let mut bus = self.bus.lock().unwrap();
            bus.write(I2C_ADDR_MAX30102, &[REG_MODE_CONFIG, MODE_RESET], I2C_TIMEOUT_TICKS)?;
        }
        // Datasheet: reset self-clears within 1 ms.
        thread::sleep(Duration::from_millis(10));

        let mut bus = self.bus.lock().unwrap();
        bus.write(I2C_ADDR_MAX30102, &[REG_FIFO_WR_PTR, 0x00], I2C_TIMEOUT_TICKS)?;
        bus.write(I2C_ADDR_MAX30102, &[REG_OVF_COUNTER, 0x00], I2C_TIMEOUT_TICKS)?;
        bus.write(I2C_ADDR_MAX30102, &[REG_FIFO_RD_PTR, 0x00], I2C_TIMEOUT_TICKS)?;
        bus.write(I2C_ADDR_MAX30102, &[REG_FIFO_CONFIG, FIFO_CONFIG], I2C_TIMEOUT_TICKS)?;
        bus.write(I2C_ADDR_MAX30102, &[REG_SPO2_CONFIG, SPO2_CONFIG], I2C_TIMEOUT_TICKS)?;
        bus.write(I2C_ADDR_MAX30102, &[REG_LED1_PA, LED_CURRENT], I2C_TIMEOUT_TICKS)?;
        bus.write(I2C_ADDR_MAX30102, &[REG_LED2_PA, LED_CURRENT], I2C_TIMEOUT_TICKS)?;
        bus.write(I2C_ADDR_MAX30102, &[REG_MODE_CONFIG, MODE_SPO2], I2C_TIMEOUT_TICKS)?;

        log::info!("MAX30102 initialised (SpO2 mode, 25 Hz effective)");
        Ok(())
    }

    fn fifo_sample_ready(&self) -> anyhow::Result<bool> {
        let mut bus = self.bus.lock().unwrap();
        let mut wr = [0u8; 1];
        let mut rd = [0u8; 1];
        bus.write_read(I2C_ADDR_MAX30102, &[REG_FIFO_WR_PTR], &mut wr, I2C_TIMEOUT_TICKS)?;
        bus.write_read(I2C_ADDR_MAX30102, &[REG_FIFO_RD_PTR], &mut rd, I2C_TIMEOUT_TICKS)?;
        Ok(wr[0] != rd[0])
    }
}

impl PulseOximeter for Max30102 {
    /// Block (bounded) until the FIFO holds a sample, then burst-read
    /// one 6-byte red/IR pair.
    fn read_sample(&mut self) -> anyhow::Result<RawSample> {
        let start = Instant::now();
        while !self.fifo_sample_ready()? {
            if start.elapsed() > SAMPLE_WAIT_TIMEOUT {
                anyhow::bail!("MAX30102 FIFO stalled");
            }
            thread::sleep(Duration::from_millis(1));
        }

        let mut bus = self.bus.lock().unwrap();
        let mut raw = [0u8; 6];
        bus.write_read(I2C_ADDR_MAX30102, &[REG_FIFO_DATA], &mut raw, I2C_TIMEOUT_TICKS)?;

        // 18-bit samples, left-justified in 3 bytes each: red then IR.
        let red = (u32::from(raw[0]) << 16 | u32::from(raw[1]) << 8 | u32::from(raw[2])) & 0x3FFFF;
        let ir = (u32::from(raw[3]) << 16 | u32::from(raw[4]) << 8 | u32::from(raw[5])) & 0x3FFFF;

        Ok(RawSample { red, ir })
    }
}
