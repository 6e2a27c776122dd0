use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::acquisition::AcquisitionClient;
use crate::domain::{InfiltrationEstimate, WeatherSample};
use crate::physics::HouseParameters;
use crate::table::ForecastTable;
use crate::weather::WeatherProvider;

/// Forecast refresh: acquire the hourly forecast, run the physics model per
/// hour, atomically rebuild the persisted table. Acquisition exhaustion is
/// fatal and leaves the prior table untouched; stale data is safer than a
/// partial or missing table.
pub struct RefreshJob<P> {
    client: AcquisitionClient<P>,
    house: HouseParameters,
    table: ForecastTable,
    horizon_hours: usize,
}

impl<P: WeatherProvider> RefreshJob<P> {
    pub fn new(
        client: AcquisitionClient<P>,
        house: HouseParameters,
        table: ForecastTable,
        horizon_hours: usize,
    ) -> Self {
        Self {
            client,
            house,
            table,
            horizon_hours,
        }
    }

    /// Returns the number of rows written.
    pub async fn run(&self, cancel: &CancellationToken) -> Result<usize> {
        let samples = self
            .client
            .forecast(cancel)
            .await
            .context("forecast acquisition failed, keeping prior table")?;

        if samples.len() < self.horizon_hours {
            anyhow::bail!(
                "provider returned {} hourly records, need {}",
                samples.len(),
                self.horizon_hours
            );
        }

        let rows = self.estimate_rows(&samples[..self.horizon_hours])?;
        self.table.rebuild(&rows).await?;

        if let (Some(first), Some(last)) = (rows.first(), rows.last()) {
            info!(
                rows = rows.len(),
                first = %first.sample.timestamp,
                last = %last.sample.timestamp,
                "forecast refresh complete"
            );
        }
        Ok(rows.len())
    }

    /// Compute infiltration per sample, preserving provider order. Provider
    /// order is required to already be chronological; out-of-order or
    /// duplicate timestamps would violate the table's ordering invariant, so
    /// they are rejected here instead of persisted.
    fn estimate_rows(&self, samples: &[WeatherSample]) -> Result<Vec<InfiltrationEstimate>> {
        for pair in samples.windows(2) {
            if pair[1].timestamp <= pair[0].timestamp {
                anyhow::bail!(
                    "provider forecast is not chronological: {} followed by {}",
                    pair[0].timestamp,
                    pair[1].timestamp
                );
            }
        }
        Ok(samples
            .iter()
            .map(|sample| InfiltrationEstimate {
                sample: *sample,
                infiltration_m3_s: self.house.infiltration_m3_s(sample),
            })
            .collect())
    }
}
