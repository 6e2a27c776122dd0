//! Weather provider integration (Weather Underground API)
//!
//! Maps the provider's current-conditions and hourly-forecast JSON into
//! [`WeatherSample`] values, converting wind speed from km/h to m/s. Fetch
//! failures here are single-attempt failures; bounded retry lives in
//! [`crate::acquisition`].

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use reqwest::Client;
use serde::{Deserialize, Deserializer};
use std::time::Duration;
use tracing::debug;

use crate::config::ProviderConfig;
use crate::domain::{WeatherSample, KPH_TO_MS, TIMESTAMP_FORMAT};

/// Source of weather data, one method per query kind. Implemented by
/// [`WundergroundClient`] in production and by in-memory fakes in tests.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Current observed conditions at the configured location.
    async fn current_conditions(&self) -> Result<WeatherSample>;

    /// Hourly forecast, in the provider's (chronological) order.
    async fn hourly_forecast(&self) -> Result<Vec<WeatherSample>>;
}

/// Weather Underground API client.
pub struct WundergroundClient {
    client: Client,
    base_url: String,
    api_key: String,
    location: String,
}

impl WundergroundClient {
    pub fn new(cfg: &ProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.http_timeout_seconds))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key: cfg.api_key.clone(),
            location: cfg.location.clone(),
        })
    }

    fn url(&self, feature: &str) -> String {
        format!(
            "{}/api/{}/{}/q/{}.json",
            self.base_url, self.api_key, feature, self.location
        )
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, feature: &str) -> Result<T> {
        let url = self.url(feature);
        debug!(feature, "requesting weather data");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("weather provider request failed")?;
        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("weather provider returned HTTP {status}");
        }
        response
            .json::<T>()
            .await
            .context("failed to parse weather provider response")
    }
}

#[async_trait]
impl WeatherProvider for WundergroundClient {
    async fn current_conditions(&self) -> Result<WeatherSample> {
        let raw: ConditionsResponse = self.get_json("conditions").await?;
        Ok(WeatherSample {
            timestamp: truncate_to_minute(chrono::Local::now().naive_local()),
            temperature_c: raw.current_observation.temp_c,
            wind_speed_ms: raw.current_observation.wind_kph * KPH_TO_MS,
        })
    }

    async fn hourly_forecast(&self) -> Result<Vec<WeatherSample>> {
        let raw: ForecastResponse = self.get_json("hourly").await?;
        raw.hourly_forecast
            .into_iter()
            .enumerate()
            .map(|(i, hour)| {
                hour.into_sample()
                    .with_context(|| format!("malformed hourly forecast record {i}"))
            })
            .collect()
    }
}

fn truncate_to_minute(ts: NaiveDateTime) -> NaiveDateTime {
    use chrono::Timelike;
    ts.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(ts)
}

// Weather Underground response structures. Numeric fields arrive as JSON
// strings ("17") or numbers depending on the endpoint, so both are accepted.

#[derive(Debug, Deserialize)]
struct ConditionsResponse {
    current_observation: CurrentObservation,
}

#[derive(Debug, Deserialize)]
struct CurrentObservation {
    #[serde(deserialize_with = "lenient_f64")]
    temp_c: f64,
    #[serde(deserialize_with = "lenient_f64")]
    wind_kph: f64,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    hourly_forecast: Vec<HourlyRecord>,
}

#[derive(Debug, Deserialize)]
struct HourlyRecord {
    #[serde(rename = "FCTTIME")]
    fcttime: FctTime,
    temp: MetricValue,
    wspd: MetricValue,
}

#[derive(Debug, Deserialize)]
struct FctTime {
    year: String,
    mon_padded: String,
    mday_padded: String,
    hour_padded: String,
    min: String,
}

#[derive(Debug, Deserialize)]
struct MetricValue {
    #[serde(deserialize_with = "lenient_f64")]
    metric: f64,
}

impl HourlyRecord {
    fn into_sample(self) -> Result<WeatherSample> {
        let t = &self.fcttime;
        let rendered = format!(
            "{}/{}/{} {}:{}",
            t.year, t.mon_padded, t.mday_padded, t.hour_padded, t.min
        );
        let timestamp = NaiveDateTime::parse_from_str(&rendered, TIMESTAMP_FORMAT)
            .with_context(|| format!("invalid forecast timestamp {rendered:?}"))?;
        Ok(WeatherSample {
            timestamp,
            temperature_c: self.temp.metric,
            wind_speed_ms: self.wspd.metric * KPH_TO_MS,
        })
    }
}

fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }
    match Raw::deserialize(deserializer)? {
        Raw::Number(v) => Ok(v),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn parses_current_observation_with_numeric_fields() {
        let raw: ConditionsResponse = serde_json::from_str(
            r#"{"current_observation": {"temp_c": 16.5, "wind_kph": 12.0}}"#,
        )
        .unwrap();
        assert_eq!(raw.current_observation.temp_c, 16.5);
        assert_eq!(raw.current_observation.wind_kph, 12.0);
    }

    #[test]
    fn parses_hourly_record_with_string_fields() {
        let raw: HourlyRecord = serde_json::from_str(
            r#"{
                "FCTTIME": {"year": "2015", "mon_padded": "06", "mday_padded": "12",
                            "hour_padded": "08", "min": "00"},
                "temp": {"metric": "17"},
                "wspd": {"metric": "12"}
            }"#,
        )
        .unwrap();
        let sample = raw.into_sample().unwrap();
        assert_eq!(
            sample.timestamp,
            NaiveDate::from_ymd_opt(2015, 6, 12)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap()
        );
        assert_eq!(sample.temperature_c, 17.0);
        assert!((sample.wind_speed_ms - 12.0 * KPH_TO_MS).abs() < 1e-12);
    }

    #[test]
    fn rejects_unparseable_forecast_timestamp() {
        let raw: HourlyRecord = serde_json::from_str(
            r#"{
                "FCTTIME": {"year": "2015", "mon_padded": "13", "mday_padded": "40",
                            "hour_padded": "08", "min": "00"},
                "temp": {"metric": "17"},
                "wspd": {"metric": "12"}
            }"#,
        )
        .unwrap();
        assert!(raw.into_sample().is_err());
    }
}
