// SomnoWatch — Deterministic Test Doubles
//
// One fake per capability trait, plus waveform/record helpers shared by
// the unit tests. Fakes count the calls that matter so tests can assert
// what a wake did NOT do (radio off, no pulses, ...).

use std::collections::HashMap;
use std::time::Duration;

use crate::clock::{Clock, WallTime};
use crate::config::{ACQ_SAMPLE_PERIOD_MS, ACQ_BUFFER_LEN};
use crate::error::{Fault, Result};
use crate::hal::{
    Connectivity, HapticActuator, InertialSensor, NonVolatileStore, PulseOximeter, RawSample,
    ThermalProbe, TiltReading,
};
use crate::record::SampleRecord;
use crate::store::SampleSink;

/// A clean red/IR pulse train at `pulse_hz`, sized and paced like a real
/// acquisition window (AC ratio red:IR of 0.6, i.e. R = 0.75).
pub fn pulse_waveform(len: usize, pulse_hz: f32) -> Vec<RawSample> {
    (0..len)
        .map(|i| {
            let t = i as f32 * ACQ_SAMPLE_PERIOD_MS as f32 / 1000.0;
            let phase = (2.0 * std::f32::consts::PI * pulse_hz * t).sin();
            RawSample {
                ir: (50_000.0 + 1_500.0 * phase) as u32,
                red: (40_000.0 + 900.0 * phase) as u32,
            }
        })
        .collect()
}

/// A plausible record stamped at the given time of day.
pub fn sample_at(hour: u8, minute: u8, second: u8) -> SampleRecord {
    SampleRecord {
        hour,
        minute,
        second,
        heart_rate: 62.0,
        spo2: 97.5,
        temperature: 36.25,
        hr_valid: true,
        spo2_valid: true,
    }
}

// ---------------------------------------------------------------------------
// Sensors
// ---------------------------------------------------------------------------

pub struct FakeOximeter {
    samples: Vec<RawSample>,
    broken: bool,
    pub reads: usize,
}

impl FakeOximeter {
    pub fn pulsing(pulse_hz: f32) -> Self {
        Self {
            samples: pulse_waveform(ACQ_BUFFER_LEN, pulse_hz),
            broken: false,
            reads: 0,
        }
    }

    pub fn broken() -> Self {
        Self { samples: Vec::new(), broken: true, reads: 0 }
    }
}

impl PulseOximeter for FakeOximeter {
    fn read_sample(&mut self) -> anyhow::Result<RawSample> {
        if self.broken {
            anyhow::bail!("optical front-end not responding");
        }
        let sample = self.samples[self.reads % self.samples.len()];
        self.reads += 1;
        Ok(sample)
    }
}

pub struct FakeProbe {
    celsius: f32,
}

impl FakeProbe {
    pub fn at(celsius: f32) -> Self {
        Self { celsius }
    }
}

impl ThermalProbe for FakeProbe {
    fn read_celsius(&mut self) -> anyhow::Result<f32> {
        Ok(self.celsius)
    }
}

pub struct FakeImu {
    tilt: TiltReading,
}

impl FakeImu {
    pub fn reading(tilt: TiltReading) -> Self {
        Self { tilt }
    }
}

impl InertialSensor for FakeImu {
    fn read_tilt(&mut self) -> anyhow::Result<TiltReading> {
        Ok(self.tilt)
    }
}

#[derive(Default)]
pub struct FakeHaptic {
    pub pulses: Vec<Duration>,
}

impl HapticActuator for FakeHaptic {
    fn pulse(&mut self, duration: Duration) {
        self.pulses.push(duration);
    }
}

// ---------------------------------------------------------------------------
// Clock, connectivity, NVS, sink
// ---------------------------------------------------------------------------

pub struct FakeClock {
    pub now: WallTime,
    pub set: bool,
}

impl FakeClock {
    pub fn set_at(day: u32, hour: u8, minute: u8, second: u8) -> Self {
        Self { now: WallTime { day, hour, minute, second }, set: true }
    }
}

impl Clock for FakeClock {
    fn now(&self) -> WallTime {
        self.now
    }

    fn is_set(&self) -> bool {
        self.set
    }
}

pub struct FakeConnectivity {
    online: bool,
    pub connect_attempts: usize,
    pub disconnects: usize,
    pub bootstraps: usize,
}

impl FakeConnectivity {
    pub fn online() -> Self {
        Self { online: true, connect_attempts: 0, disconnects: 0, bootstraps: 0 }
    }

    pub fn offline() -> Self {
        Self { online: false, ..Self::online() }
    }
}

impl Connectivity for FakeConnectivity {
    fn bootstrap_clock(&mut self) -> Result<()> {
        self.bootstraps += 1;
        if self.online {
            Ok(())
        } else {
            Err(Fault::Connectivity("no credential worked".into()))
        }
    }

    fn try_connect(&mut self) -> bool {
        self.connect_attempts += 1;
        self.online
    }

    fn disconnect(&mut self) {
        self.disconnects += 1;
    }
}

#[derive(Default)]
pub struct MemoryNvs {
    values: HashMap<String, u32>,
}

impl NonVolatileStore for MemoryNvs {
    fn get_u32(&self, key: &str) -> Result<Option<u32>> {
        Ok(self.values.get(key).copied())
    }

    fn set_u32(&mut self, key: &str, value: u32) -> Result<()> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }
}

pub struct RecordingSink {
    pub batches: Vec<Vec<SampleRecord>>,
    fail: bool,
}

impl RecordingSink {
    pub fn accepting() -> Self {
        Self { batches: Vec::new(), fail: false }
    }

    pub fn failing() -> Self {
        Self { batches: Vec::new(), fail: true }
    }
}

impl SampleSink for RecordingSink {
    fn deliver(&mut self, batch: &[SampleRecord]) -> Result<()> {
        if self.fail {
            return Err(Fault::Delivery("collector rejected batch".into()));
        }
        self.batches.push(batch.to_vec());
        Ok(())
    }
}
