// SomnoWatch — Posture Feedback Actuator
//
// Stateless tilt-to-haptic trigger. No hysteresis or debounce needed:
// this runs at most once per wake interval.

use std::time::Duration;

use crate::config::{HAPTIC_PULSE_MS, TILT_THRESHOLD};
use crate::hal::{HapticActuator, InertialSensor};

/// Pulse the haptic motor if either lateral axis exceeds the tilt
/// threshold. Returns whether a correction was signalled.
pub fn check_and_correct(
    imu: &mut dyn InertialSensor,
    haptic: &mut dyn HapticActuator,
) -> anyhow::Result<bool> {
    let tilt = imu.read_tilt()?;
    let tilted =
        tilt.ax.unsigned_abs() > TILT_THRESHOLD || tilt.ay.unsigned_abs() > TILT_THRESHOLD;

    if tilted {
        log::info!("bad posture (ax={}, ay={}) — buzzing", tilt.ax, tilt.ay);
        haptic.pulse(Duration::from_millis(HAPTIC_PULSE_MS));
    }

    Ok(tilted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{FakeHaptic, FakeImu};
    use crate::hal::TiltReading;

    #[test]
    fn over_threshold_pulses_once_for_fixed_duration() {
        let mut imu = FakeImu::reading(TiltReading { ax: 16_000, ay: 0 });
        let mut haptic = FakeHaptic::default();

        assert!(check_and_correct(&mut imu, &mut haptic).unwrap());
        assert_eq!(haptic.pulses, vec![Duration::from_millis(HAPTIC_PULSE_MS)]);
    }

    #[test]
    fn negative_tilt_also_triggers() {
        let mut imu = FakeImu::reading(TiltReading { ax: 0, ay: -16_000 });
        let mut haptic = FakeHaptic::default();

        assert!(check_and_correct(&mut imu, &mut haptic).unwrap());
        assert_eq!(haptic.pulses.len(), 1);
    }

    #[test]
    fn under_threshold_stays_quiet() {
        let mut imu = FakeImu::reading(TiltReading { ax: 10_000, ay: 10_000 });
        let mut haptic = FakeHaptic::default();

        assert!(!check_and_correct(&mut imu, &mut haptic).unwrap());
        assert!(haptic.pulses.is_empty());
    }
}
