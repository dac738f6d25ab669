// SomnoWatch — Sample Record & Persisted Line Format
//
// One record per wake. The line format is the external contract shared
// with the collector: `HH:MM:SS,<heart_rate>,<spo2>,<temperature>`.
// The estimator validity flags ride along in memory (the collector
// contract predates them); parsing re-derives them from the same
// plausibility ranges the estimator uses.

use crate::error::Fault;
use crate::estimator;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleRecord {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub heart_rate: f32,
    pub spo2: f32,
    pub temperature: f32,
    pub hr_valid: bool,
    pub spo2_valid: bool,
}

impl SampleRecord {
    /// Serialize to the persisted/transmitted line format (no newline).
    pub fn to_line(&self) -> String {
        format!(
            "{:02}:{:02}:{:02},{:.1},{:.1},{:.2}",
            self.hour, self.minute, self.second, self.heart_rate, self.spo2, self.temperature
        )
    }

    pub fn from_line(line: &str) -> Result<Self, Fault> {
        let malformed = || Fault::Malformed(line.to_string());

        let mut fields = line.split(',');
        let time = fields.next().ok_or_else(malformed)?;
        let heart_rate: f32 = parse_field(fields.next(), line)?;
        let spo2: f32 = parse_field(fields.next(), line)?;
        let temperature: f32 = parse_field(fields.next(), line)?;
        if fields.next().is_some() {
            return Err(malformed());
        }

        let mut parts = time.split(':');
        let hour: u8 = parse_field(parts.next(), line)?;
        let minute: u8 = parse_field(parts.next(), line)?;
        let second: u8 = parse_field(parts.next(), line)?;
        if parts.next().is_some() || hour > 23 || minute > 59 || second > 59 {
            return Err(malformed());
        }

        Ok(Self {
            hour,
            minute,
            second,
            heart_rate,
            spo2,
            temperature,
            hr_valid: estimator::hr_plausible(heart_rate),
            spo2_valid: estimator::spo2_plausible(spo2),
        })
    }
}

fn parse_field<T: std::str::FromStr>(field: Option<&str>, line: &str) -> Result<T, Fault> {
    field
        .and_then(|f| f.trim().parse().ok())
        .ok_or_else(|| Fault::Malformed(line.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> SampleRecord {
        SampleRecord {
            hour: 3,
            minute: 7,
            second: 42,
            heart_rate: 72.5,
            spo2: 97.0,
            temperature: 36.75,
            hr_valid: true,
            spo2_valid: true,
        }
    }

    #[test]
    fn line_format_matches_collector_contract() {
        assert_eq!(record().to_line(), "03:07:42,72.5,97.0,36.75");
    }

    #[test]
    fn line_round_trip_preserves_fields() {
        let rec = record();
        assert_eq!(SampleRecord::from_line(&rec.to_line()).unwrap(), rec);
    }

    #[test]
    fn invalid_estimate_round_trips_as_invalid() {
        let rec = SampleRecord {
            heart_rate: 0.0,
            spo2: 0.0,
            hr_valid: false,
            spo2_valid: false,
            ..record()
        };
        let parsed = SampleRecord::from_line(&rec.to_line()).unwrap();
        assert!(!parsed.hr_valid);
        assert!(!parsed.spo2_valid);
    }

    #[test]
    fn rejects_malformed_lines() {
        for line in [
            "",
            "garbage",
            "03:07:42,72.5,97.0",            // missing field
            "03:07:42,72.5,97.0,36.75,1",    // extra field
            "25:00:00,72.5,97.0,36.75",      // impossible hour
            "03:07,72.5,97.0,36.75",         // short time
            "03:07:42,abc,97.0,36.75",       // non-numeric
        ] {
            assert!(
                matches!(SampleRecord::from_line(line), Err(Fault::Malformed(_))),
                "accepted: {line:?}"
            );
        }
    }
}
