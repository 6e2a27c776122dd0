//! Hourly infiltration estimate. Prints the final airflow (m3/s) on stdout
//! for the downstream dose/ventilation consumer; exits nonzero only when
//! both the live path and the forecast-table fallback fail.

use anyhow::Result;
use infiltration_estimator::{
    acquisition::AcquisitionClient, config::Config, jobs::CurrentEstimateJob,
    table::ForecastTable, telemetry, weather::WundergroundClient,
};

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_tracing();

    let cfg = Config::load()?;
    let house = cfg.house.parameters()?;
    let provider = WundergroundClient::new(&cfg.provider)?;
    let client = AcquisitionClient::new(provider, cfg.retry);
    let table = ForecastTable::new(&cfg.table.path);

    let job = CurrentEstimateJob::new(client, house, table);
    let cancel = telemetry::cancel_on_shutdown();
    let now = chrono::Local::now().naive_local();

    let (estimate, _source) = job.run(now, &cancel).await?;
    println!("{}", estimate.infiltration_m3_s);
    Ok(())
}
