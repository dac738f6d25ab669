// SomnoWatch — Sensor Acquisition Unit
//
// Collects one acquisition window of paired red/IR readings at a fixed
// cadence, runs the opaque estimator over it, reads the skin probe, and
// composes the wake's sample record. Blocking, with total latency
// bounded by ACQ_BUFFER_LEN × sample_period.

use std::thread;
use std::time::{Duration, Instant};

use crate::clock::WallTime;
use crate::config::ACQ_BUFFER_LEN;
use crate::estimator;
use crate::hal::{PulseOximeter, RawSample, ThermalProbe};
use crate::record::SampleRecord;

pub fn acquire(
    oximeter: &mut dyn PulseOximeter,
    probe: &mut dyn ThermalProbe,
    now: WallTime,
    sample_period: Duration,
) -> anyhow::Result<SampleRecord> {
    let mut buffer: Vec<RawSample> = Vec::with_capacity(ACQ_BUFFER_LEN);

    for _ in 0..ACQ_BUFFER_LEN {
        let tick_start = Instant::now();
        buffer.push(oximeter.read_sample()?);

        // Sleep for the remainder of the sampling interval to hold the
        // cadence the estimator was calibrated for.
        let elapsed = tick_start.elapsed();
        if elapsed < sample_period {
            thread::sleep(sample_period - elapsed);
        }
    }

    let est = estimator::estimate(&buffer);
    if !est.hr_valid || !est.spo2_valid {
        log::warn!(
            "estimator flagged sample invalid (hr_valid={}, spo2_valid={})",
            est.hr_valid,
            est.spo2_valid
        );
    }

    let temperature = probe.read_celsius()?;

    Ok(SampleRecord {
        hour: now.hour,
        minute: now.minute,
        second: now.second,
        heart_rate: est.heart_rate,
        spo2: est.spo2,
        temperature,
        hr_valid: est.hr_valid,
        spo2_valid: est.spo2_valid,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{FakeOximeter, FakeProbe};

    #[test]
    fn composes_record_from_sensors_and_clock() {
        let mut oximeter = FakeOximeter::pulsing(2.0);
        let mut probe = FakeProbe::at(36.5);
        let now = WallTime { day: 19_000, hour: 23, minute: 4, second: 59 };

        let rec = acquire(&mut oximeter, &mut probe, now, Duration::ZERO).unwrap();

        assert_eq!((rec.hour, rec.minute, rec.second), (23, 4, 59));
        assert_eq!(rec.temperature, 36.5);
        assert_eq!(oximeter.reads, ACQ_BUFFER_LEN);
        assert!(rec.hr_valid && rec.spo2_valid);
    }

    #[test]
    fn sensor_error_aborts_the_sample() {
        let mut oximeter = FakeOximeter::broken();
        let mut probe = FakeProbe::at(36.5);
        let now = WallTime { day: 19_000, hour: 1, minute: 0, second: 0 };
        assert!(acquire(&mut oximeter, &mut probe, now, Duration::ZERO).is_err());
    }
}
