//! Scheduled forecast refresh. Run every 4-12 hours; exits nonzero on
//! acquisition exhaustion, leaving the prior forecast table untouched.

use anyhow::Result;
use infiltration_estimator::{
    acquisition::AcquisitionClient, config::Config, jobs::RefreshJob, table::ForecastTable,
    telemetry, weather::WundergroundClient,
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_tracing();

    let cfg = Config::load()?;
    let house = cfg.house.parameters()?;
    let provider = WundergroundClient::new(&cfg.provider)?;
    let client = AcquisitionClient::new(provider, cfg.retry);
    let table = ForecastTable::new(&cfg.table.path);

    let job = RefreshJob::new(client, house, table, cfg.table.horizon_hours);
    let cancel = telemetry::cancel_on_shutdown();

    let rows = job.run(&cancel).await?;
    info!(rows, "forecast table refreshed");
    Ok(())
}
