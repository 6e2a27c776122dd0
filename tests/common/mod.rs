//! Shared fixtures for the end-to-end job tests.
#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use infiltration_estimator::acquisition::RetryPolicy;
use infiltration_estimator::config::ProviderConfig;
use infiltration_estimator::physics::{HouseParameters, DEFAULT_PRESSURE_EXPONENT};
use serde_json::{json, Value};

/// Reference deployment house: 3 ACH50, 250 m3, 1-story, flue, crawlspace.
pub fn reference_house() -> HouseParameters {
    HouseParameters {
        c: 0.015193229,
        cs: 0.069,
        cw: 0.128,
        g: 0.48,
        s: 0.70,
        indoor_temp_c: 20.0,
        n: DEFAULT_PRESSURE_EXPONENT,
    }
}

pub fn provider_config(base_url: &str) -> ProviderConfig {
    ProviderConfig {
        base_url: base_url.to_string(),
        api_key: "test-key".to_string(),
        location: "CA/San_Leandro".to_string(),
        http_timeout_seconds: 5,
    }
}

/// Fast retry schedule so exhaustion tests do not sleep.
pub fn fast_retry(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        backoff_seconds: 0,
    }
}

pub fn forecast_start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2015, 6, 12)
        .unwrap()
        .and_hms_opt(8, 0, 0)
        .unwrap()
}

/// Known per-hour temperature (degrees C) for forecast hour `i`.
pub fn temp_c(i: usize) -> i64 {
    12 + (i % 9) as i64
}

/// Known per-hour wind speed (km/h) for forecast hour `i`.
pub fn wind_kph(i: usize) -> i64 {
    4 + (i % 14) as i64
}

/// Weather Underground hourly-forecast response body with `hours` records,
/// one per hour starting at [`forecast_start`]. Numeric fields are rendered
/// as strings, matching the provider's wire format.
pub fn forecast_body(hours: usize) -> Value {
    let records: Vec<Value> = (0..hours)
        .map(|i| {
            let ts = forecast_start() + Duration::hours(i as i64);
            json!({
                "FCTTIME": {
                    "year": ts.format("%Y").to_string(),
                    "mon_padded": ts.format("%m").to_string(),
                    "mday_padded": ts.format("%d").to_string(),
                    "hour_padded": ts.format("%H").to_string(),
                    "min": ts.format("%M").to_string(),
                },
                "temp": { "metric": temp_c(i).to_string() },
                "wspd": { "metric": wind_kph(i).to_string() },
            })
        })
        .collect();
    json!({ "hourly_forecast": records })
}
