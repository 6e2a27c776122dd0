//! Core value types shared by the acquisition client, the physics model and
//! the forecast table.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Timestamp layout used everywhere a row is rendered or parsed:
/// `YYYY/MM/DD HH:MM`, provider-local wall time, minute resolution.
pub const TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M";

/// km/h to m/s: (1000 m/km) / (3600 s/h).
pub const KPH_TO_MS: f64 = 1000.0 / 3600.0;

/// One observed or forecast weather point, already unit-converted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherSample {
    pub timestamp: NaiveDateTime,
    /// Outdoor temperature, degrees C
    pub temperature_c: f64,
    /// Wind speed, m/s
    pub wind_speed_ms: f64,
}

/// A weather sample paired with the infiltration airflow computed for it.
/// This is the unit of output consumed by downstream dose/ventilation logic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InfiltrationEstimate {
    pub sample: WeatherSample,
    /// Infiltration airflow, m3/s. Nonnegative by construction.
    pub infiltration_m3_s: f64,
}
