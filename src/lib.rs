//! Residential air-infiltration estimation from weather data.
//!
//! Infiltration is estimated with the ASHRAE basic model (stack and wind
//! airflows combined by superposition) from either live current conditions
//! or a previously persisted hourly forecast. Two scheduled binaries drive
//! the library: `refresh_forecast` (every 4-12 hours) and `current_estimate`
//! (hourly, with forecast-table fallback). The resulting airflow (m3/s)
//! feeds downstream ventilation-control and IAQ dose calculations.

pub mod acquisition;
pub mod config;
pub mod domain;
pub mod jobs;
pub mod physics;
pub mod table;
pub mod telemetry;
pub mod weather;
