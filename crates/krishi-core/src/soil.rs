//! Soil sensor readings and their at-a-glance status.
//!
//! Readings are kept as the raw strings the user typed. Nothing here rejects
//! input: an unparseable reading is reported as such and travels to the
//! recommendation prompt as `unknown`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoilParameter {
    Moisture,
    Temperature,
    Ph,
    Nitrogen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterStatus {
    Unknown,
    Invalid,
    Low,
    Optimal,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assessment {
    pub status: ParameterStatus,
    pub label: &'static str,
}

impl SoilParameter {
    pub fn all() -> [SoilParameter; 4] {
        [
            SoilParameter::Moisture,
            SoilParameter::Temperature,
            SoilParameter::Ph,
            SoilParameter::Nitrogen,
        ]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            SoilParameter::Moisture => "Moisture",
            SoilParameter::Temperature => "Temperature",
            SoilParameter::Ph => "pH",
            SoilParameter::Nitrogen => "Nitrogen",
        }
    }

    /// Suffix appended to a parsed value in the recommendation prompt.
    pub fn unit(&self) -> &'static str {
        match self {
            SoilParameter::Moisture => "%",
            SoilParameter::Temperature => "°C",
            SoilParameter::Ph => "",
            SoilParameter::Nitrogen => " PPM",
        }
    }

    // (low bound, high bound, low label, optimal label, high label)
    fn bands(&self) -> (f64, f64, &'static str, &'static str, &'static str) {
        match self {
            SoilParameter::Moisture => (20.0, 80.0, "Too Dry", "Optimal", "Too Wet"),
            SoilParameter::Temperature => (15.0, 35.0, "Too Cold", "Good", "Too Hot"),
            SoilParameter::Ph => (6.0, 7.5, "Acidic", "Balanced", "Alkaline"),
            SoilParameter::Nitrogen => (20.0, 40.0, "Low", "Good", "High"),
        }
    }
}

/// Classify one raw reading. Bounds are exclusive: exactly 20% moisture is optimal.
pub fn assess(parameter: SoilParameter, raw: &str) -> Assessment {
    let raw = raw.trim();
    if raw.is_empty() {
        return Assessment {
            status: ParameterStatus::Unknown,
            label: "Enter value",
        };
    }

    let value = match parse_reading(raw) {
        Some(v) => v,
        None => {
            return Assessment {
                status: ParameterStatus::Invalid,
                label: "Invalid value",
            }
        }
    };

    let (low, high, low_label, ok_label, high_label) = parameter.bands();
    if value < low {
        Assessment {
            status: ParameterStatus::Low,
            label: low_label,
        }
    } else if value > high {
        Assessment {
            status: ParameterStatus::High,
            label: high_label,
        }
    } else {
        Assessment {
            status: ParameterStatus::Optimal,
            label: ok_label,
        }
    }
}

/// Parse a numeric reading; NaN and infinities count as unparseable.
pub fn parse_reading(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoilReadings {
    pub moisture: String,
    pub temperature: String,
    pub ph: String,
    pub nitrogen: String,
}

impl SoilReadings {
    pub fn get(&self, parameter: SoilParameter) -> &str {
        match parameter {
            SoilParameter::Moisture => &self.moisture,
            SoilParameter::Temperature => &self.temperature,
            SoilParameter::Ph => &self.ph,
            SoilParameter::Nitrogen => &self.nitrogen,
        }
    }

    pub fn assess_all(&self) -> Vec<(SoilParameter, Assessment)> {
        SoilParameter::all()
            .into_iter()
            .map(|p| (p, assess(p, self.get(p))))
            .collect()
    }

    /// Prompt fragment for one reading: value with unit, or `unknown`.
    pub fn describe(&self, parameter: SoilParameter) -> String {
        let raw = self.get(parameter).trim();
        match parse_reading(raw) {
            Some(_) => format!("{}{}", raw, parameter.unit()),
            None => "unknown".to_string(),
        }
    }
}
