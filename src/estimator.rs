// SomnoWatch — HR/SpO2 Estimation Interface
//
// This module is the seam around the vendor pulse-oximetry algorithm.
//
// Architecture:
//   1. STUB mode (default) — a crude ratio-of-ratios heuristic so the
//      duty cycle can be developed and tested without the vendor C code.
//   2. FFI mode — enable the `vendor-algo` feature (and drop the Maxim
//      reference sources into `maxim-spo2/`, see build.rs) to link the
//      real `maxim_heart_rate_and_oxygen_saturation` routine.
//
// Both backends return per-metric validity flags; downstream code keeps
// them attached to the record instead of discarding invalid estimates.

use crate::config::ACQ_SAMPLE_PERIOD_MS;
use crate::hal::RawSample;

/// Result of one estimation pass over an acquisition buffer.
#[derive(Debug, Clone, Copy)]
pub struct Estimate {
    pub heart_rate: f32,
    pub hr_valid: bool,
    pub spo2: f32,
    pub spo2_valid: bool,
}

impl Estimate {
    fn invalid() -> Self {
        Self {
            heart_rate: 0.0,
            hr_valid: false,
            spo2: 0.0,
            spo2_valid: false,
        }
    }
}

pub fn hr_plausible(bpm: f32) -> bool {
    (30.0..=220.0).contains(&bpm)
}

pub fn spo2_plausible(pct: f32) -> bool {
    (70.0..=100.0).contains(&pct)
}

/// Run HR/SpO2 estimation on a filled acquisition buffer.
pub fn estimate(samples: &[RawSample]) -> Estimate {
    #[cfg(not(feature = "vendor-algo"))]
    {
        stub_estimate(samples)
    }

    #[cfg(feature = "vendor-algo")]
    {
        vendor_estimate(samples)
    }
}

// ---------------------------------------------------------------------------
// Stub back-end — development / testing without the vendor sources
// ---------------------------------------------------------------------------
#[cfg(not(feature = "vendor-algo"))]
fn stub_estimate(samples: &[RawSample]) -> Estimate {
    if samples.len() < 2 {
        return Estimate::invalid();
    }
    let n = samples.len() as f32;

    let dc_ir = samples.iter().map(|s| s.ir as f32).sum::<f32>() / n;
    let dc_red = samples.iter().map(|s| s.red as f32).sum::<f32>() / n;
    let ac_ir = samples.iter().map(|s| (s.ir as f32 - dc_ir).abs()).sum::<f32>() / n;
    let ac_red = samples.iter().map(|s| (s.red as f32 - dc_red).abs()).sum::<f32>() / n;

    // No pulsatile component means no finger on the sensor.
    if dc_ir < 1.0 || dc_red < 1.0 || ac_ir < 1.0 || ac_red < 1.0 {
        return Estimate::invalid();
    }

    // Heart rate from rising zero crossings of the centred IR waveform.
    let mut beats = 0u32;
    let mut prev = samples[0].ir as f32 - dc_ir;
    for s in &samples[1..] {
        let cur = s.ir as f32 - dc_ir;
        if prev < 0.0 && cur >= 0.0 {
            beats += 1;
        }
        prev = cur;
    }
    let window_s = samples.len() as f32 * ACQ_SAMPLE_PERIOD_MS as f32 / 1000.0;
    let heart_rate = beats as f32 * 60.0 / window_s;

    // Classic ratio-of-ratios with a linear calibration curve.
    let r = (ac_red / dc_red) / (ac_ir / dc_ir);
    let spo2 = 110.0 - 25.0 * r;

    log::debug!("STUB estimate — beats={beats}, R={r:.3}, hr={heart_rate:.0}, spo2={spo2:.1}");

    Estimate {
        heart_rate,
        hr_valid: hr_plausible(heart_rate),
        spo2,
        spo2_valid: spo2_plausible(spo2),
    }
}

// ---------------------------------------------------------------------------
// Real FFI back-end — calls the compiled Maxim reference algorithm
// ---------------------------------------------------------------------------
#[cfg(feature = "vendor-algo")]
mod ffi {
    extern "C" {
        pub fn maxim_heart_rate_and_oxygen_saturation(
            pun_ir_buffer: *mut u32,
            n_ir_buffer_length: i32,
            pun_red_buffer: *mut u32,
            pn_spo2: *mut i32,
            pch_spo2_valid: *mut i8,
            pn_heart_rate: *mut i32,
            pch_hr_valid: *mut i8,
        );
    }
}

#[cfg(feature = "vendor-algo")]
fn vendor_estimate(samples: &[RawSample]) -> Estimate {
    if samples.is_empty() {
        return Estimate::invalid();
    }

    // The vendor routine takes mutable buffers (it filters in place).
    let mut ir: Vec<u32> = samples.iter().map(|s| s.ir).collect();
    let mut red: Vec<u32> = samples.iter().map(|s| s.red).collect();

    let mut spo2: i32 = 0;
    let mut spo2_valid: i8 = 0;
    let mut heart_rate: i32 = 0;
    let mut hr_valid: i8 = 0;

    unsafe {
        ffi::maxim_heart_rate_and_oxygen_saturation(
            ir.as_mut_ptr(),
            ir.len() as i32,
            red.as_mut_ptr(),
            &mut spo2,
            &mut spo2_valid,
            &mut heart_rate,
            &mut hr_valid,
        );
    }

    Estimate {
        heart_rate: heart_rate as f32,
        hr_valid: hr_valid == 1,
        spo2: spo2 as f32,
        spo2_valid: spo2_valid == 1,
    }
}

#[cfg(all(test, not(feature = "vendor-algo")))]
mod tests {
    use super::*;
    use crate::fakes::pulse_waveform;

    #[test]
    fn synthetic_pulse_yields_plausible_estimate() {
        // 2 Hz pulse (120 bpm) with a red/IR AC ratio of 0.6 → R = 0.75.
        let samples = pulse_waveform(100, 2.0);
        let est = estimate(&samples);
        assert!(est.hr_valid, "hr {} not flagged valid", est.heart_rate);
        assert!(
            (100.0..=130.0).contains(&est.heart_rate),
            "hr {} outside expected band",
            est.heart_rate
        );
        assert!(est.spo2_valid, "spo2 {} not flagged valid", est.spo2);
        assert!((est.spo2 - 91.25).abs() < 2.0, "spo2 {} drifted", est.spo2);
    }

    #[test]
    fn flat_signal_is_flagged_invalid() {
        let samples = vec![RawSample { red: 40_000, ir: 50_000 }; 100];
        let est = estimate(&samples);
        assert!(!est.hr_valid);
        assert!(!est.spo2_valid);
    }

    #[test]
    fn empty_buffer_is_flagged_invalid() {
        let est = estimate(&[]);
        assert!(!est.hr_valid && !est.spo2_valid);
    }
}
