use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::acquisition::{AcquisitionClient, AcquisitionError};
use crate::domain::InfiltrationEstimate;
use crate::physics::HouseParameters;
use crate::table::ForecastTable;
use crate::weather::WeatherProvider;

/// Where the hourly estimate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EstimateSource {
    /// Computed from a live current-conditions fetch.
    Live,
    /// Interpolated from the persisted forecast table.
    ForecastTable,
}

/// Hourly estimate: acquire current conditions and run the model once; on
/// acquisition exhaustion fall back to the forecast table at "now". If the
/// fallback also fails there is no valid estimate this hour.
pub struct CurrentEstimateJob<P> {
    client: AcquisitionClient<P>,
    house: HouseParameters,
    table: ForecastTable,
}

impl<P: WeatherProvider> CurrentEstimateJob<P> {
    pub fn new(client: AcquisitionClient<P>, house: HouseParameters, table: ForecastTable) -> Self {
        Self {
            client,
            house,
            table,
        }
    }

    pub async fn run(
        &self,
        now: NaiveDateTime,
        cancel: &CancellationToken,
    ) -> Result<(InfiltrationEstimate, EstimateSource)> {
        match self.client.current(cancel).await {
            Ok(sample) => {
                let estimate = InfiltrationEstimate {
                    infiltration_m3_s: self.house.infiltration_m3_s(&sample),
                    sample,
                };
                info!(
                    infiltration_m3_s = estimate.infiltration_m3_s,
                    temperature_c = sample.temperature_c,
                    wind_speed_ms = sample.wind_speed_ms,
                    "estimated infiltration from live conditions"
                );
                Ok((estimate, EstimateSource::Live))
            }
            Err(AcquisitionError::Cancelled) => Err(AcquisitionError::Cancelled.into()),
            Err(exhausted) => {
                warn!(error = %exhausted, "live conditions unavailable, using forecast table");
                let row = self
                    .table
                    .lookup_at_or_before(now)
                    .await
                    .context("no infiltration estimate available this hour")?;
                info!(
                    infiltration_m3_s = row.infiltration_m3_s,
                    forecast_hour = %row.sample.timestamp,
                    "estimated infiltration from stored forecast"
                );
                Ok((row, EstimateSource::ForecastTable))
            }
        }
    }
}
