use serde::{Deserialize, Serialize};

/// What the self/total sizes of a profile measure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueUnit {
    /// CPU sample count.
    #[default]
    Samples,
    /// Heap memory in bytes.
    Bytes,
    Nanoseconds,
    Microseconds,
    Milliseconds,
    /// Arbitrary weight.
    Weight,
}

impl ValueUnit {
    /// Format a value in this unit for display.
    pub fn format_value(&self, value: f64) -> String {
        match self {
            Self::Samples => format!("{} samples", value as u64),
            Self::Bytes => scaled(
                value,
                &[(1_073_741_824.0, "GiB"), (1_048_576.0, "MiB"), (1_024.0, "KiB")],
            )
            .unwrap_or_else(|| format!("{} B", value as u64)),
            Self::Nanoseconds => time(value, 1_000_000_000.0),
            Self::Microseconds => time(value, 1_000_000.0),
            Self::Milliseconds => time(value, 1_000.0),
            Self::Weight => format!("{value:.0}"),
        }
    }
}

impl std::str::FromStr for ValueUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "samples" => Ok(Self::Samples),
            "bytes" | "b" => Ok(Self::Bytes),
            "ns" | "nanoseconds" => Ok(Self::Nanoseconds),
            "us" | "microseconds" => Ok(Self::Microseconds),
            "ms" | "milliseconds" => Ok(Self::Milliseconds),
            "weight" => Ok(Self::Weight),
            other => Err(format!("unknown value unit: {other}")),
        }
    }
}

fn scaled(value: f64, steps: &[(f64, &str)]) -> Option<String> {
    steps
        .iter()
        .find(|(factor, _)| value >= *factor)
        .map(|(factor, suffix)| format!("{:.1} {suffix}", value / factor))
}

/// `per_second` is how many units make up one second.
fn time(value: f64, per_second: f64) -> String {
    let seconds = value / per_second;
    if seconds >= 1.0 {
        format!("{seconds:.2}s")
    } else if seconds >= 1e-3 {
        format!("{:.1}ms", seconds * 1e3)
    } else if seconds >= 1e-6 {
        format!("{:.0}µs", seconds * 1e6)
    } else {
        format!("{:.0}ns", seconds * 1e9)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_samples() {
        assert_eq!(ValueUnit::Samples.format_value(42.0), "42 samples");
    }

    #[test]
    fn formats_bytes() {
        assert_eq!(ValueUnit::Bytes.format_value(512.0), "512 B");
        assert_eq!(ValueUnit::Bytes.format_value(2048.0), "2.0 KiB");
        assert_eq!(ValueUnit::Bytes.format_value(5_242_880.0), "5.0 MiB");
    }

    #[test]
    fn formats_time_units() {
        assert_eq!(ValueUnit::Microseconds.format_value(500.0), "500µs");
        assert_eq!(ValueUnit::Microseconds.format_value(1500.0), "1.5ms");
        assert_eq!(ValueUnit::Microseconds.format_value(2_500_000.0), "2.50s");
        assert_eq!(ValueUnit::Nanoseconds.format_value(250.0), "250ns");
        assert_eq!(ValueUnit::Milliseconds.format_value(20.0), "20.0ms");
    }

    #[test]
    fn parses_short_names() {
        assert_eq!("ms".parse::<ValueUnit>(), Ok(ValueUnit::Milliseconds));
        assert_eq!("Bytes".parse::<ValueUnit>(), Ok(ValueUnit::Bytes));
        assert!("furlongs".parse::<ValueUnit>().is_err());
    }
}
