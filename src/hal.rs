// SomnoWatch — Hardware Capability Traits
//
// The duty-cycle core only ever talks to these traits. The real
// implementations live in `drivers/` behind the `hardware` feature;
// the tests drive the same code paths with deterministic fakes.

use std::time::Duration;

use crate::error::Result;

/// One paired optical reading from the pulse oximeter front-end.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawSample {
    pub red: u32,
    pub ir: u32,
}

/// Raw accelerometer counts on the two axes relevant to lying posture.
#[derive(Debug, Clone, Copy, Default)]
pub struct TiltReading {
    pub ax: i16,
    pub ay: i16,
}

pub trait PulseOximeter {
    /// Block until the next red/IR pair is available and return it.
    fn read_sample(&mut self) -> anyhow::Result<RawSample>;
}

pub trait ThermalProbe {
    fn read_celsius(&mut self) -> anyhow::Result<f32>;
}

pub trait InertialSensor {
    fn read_tilt(&mut self) -> anyhow::Result<TiltReading>;
}

pub trait HapticActuator {
    /// Drive the motor for `duration` (blocks the calling thread).
    fn pulse(&mut self, duration: Duration);
}

/// Radio association and clock bootstrap. All methods are bounded in
/// time; a wake must never hang with the radio powered.
pub trait Connectivity {
    /// One-time clock bootstrap: associate (provisioning a credential
    /// if none is stored), query a network time source, set the RTC,
    /// then disassociate. Idempotent no-op once the clock is trusted.
    fn bootstrap_clock(&mut self) -> Result<()>;

    /// Best-effort reassociation with the stored credential within a
    /// bounded timeout. Used only when a sync is eligible.
    fn try_connect(&mut self) -> bool;

    /// Power the radio down. Called after every sync attempt.
    fn disconnect(&mut self);
}

/// Small key-value store surviving power loss (NVS on the device).
/// Holds the provisioned credential and the last-sync day stamp.
pub trait NonVolatileStore {
    fn get_u32(&self, key: &str) -> Result<Option<u32>>;
    fn set_u32(&mut self, key: &str, value: u32) -> Result<()>;
}
