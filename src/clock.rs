// SomnoWatch — Wall-Clock Time
//
// The RTC keeps counting through deep sleep, so wall-clock time is the
// one piece of runtime state (besides flash) that survives a wake cycle.

/// A wall-clock instant, reduced to what the duty cycle needs: a day
/// index (for the once-per-day sync stamp) and the time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WallTime {
    /// Days since the Unix epoch. Only ever compared for equality.
    pub day: u32,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl WallTime {
    pub fn from_epoch(secs: u64) -> Self {
        let rem = secs % 86_400;
        Self {
            day: (secs / 86_400) as u32,
            hour: (rem / 3600) as u8,
            minute: (rem % 3600 / 60) as u8,
            second: (rem % 60) as u8,
        }
    }
}

/// Battery-backed clock, read fresh every wake.
pub trait Clock {
    fn now(&self) -> WallTime;

    /// Whether the RTC has ever been set from a network time source.
    /// Until this is true, timestamps are garbage and syncing is moot.
    fn is_set(&self) -> bool;
}

/// RTC-backed system clock. SNTP (see `drivers::wifi`) sets the system
/// time once; ESP-IDF restores it from the RTC domain after deep sleep.
#[cfg(feature = "hardware")]
pub struct SystemClock;

#[cfg(feature = "hardware")]
impl SystemClock {
    fn epoch_secs() -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

#[cfg(feature = "hardware")]
impl Clock for SystemClock {
    fn now(&self) -> WallTime {
        let secs = Self::epoch_secs() as i64 + crate::config::TZ_OFFSET_S;
        WallTime::from_epoch(secs.max(0) as u64)
    }

    fn is_set(&self) -> bool {
        Self::epoch_secs() > crate::config::CLOCK_TRUSTED_EPOCH
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_zero_is_midnight_day_zero() {
        let t = WallTime::from_epoch(0);
        assert_eq!((t.day, t.hour, t.minute, t.second), (0, 0, 0, 0));
    }

    #[test]
    fn epoch_conversion_splits_fields() {
        // 2020-01-01 06:30:15 UTC = 1_577_860_215
        let t = WallTime::from_epoch(1_577_860_215);
        assert_eq!(t.day, 18_262); // days since 1970-01-01
        assert_eq!((t.hour, t.minute, t.second), (6, 30, 15));
    }

    #[test]
    fn consecutive_days_differ_by_one() {
        let a = WallTime::from_epoch(86_399);
        let b = WallTime::from_epoch(86_400);
        assert_eq!(a.day + 1, b.day);
        assert_eq!((b.hour, b.minute, b.second), (0, 0, 0));
    }
}
