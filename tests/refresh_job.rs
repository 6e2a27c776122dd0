//! End-to-end forecast refresh against a mocked Weather Underground server.

mod common;

use chrono::Duration;
use infiltration_estimator::acquisition::AcquisitionClient;
use infiltration_estimator::domain::KPH_TO_MS;
use infiltration_estimator::jobs::RefreshJob;
use infiltration_estimator::physics::{stack, superposition, wind};
use infiltration_estimator::table::ForecastTable;
use infiltration_estimator::weather::{WeatherProvider, WundergroundClient};
use tempfile::tempdir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn forecast_path() -> String {
    "/api/test-key/hourly/q/CA/San_Leandro.json".to_string()
}

#[tokio::test]
async fn rebuilt_table_matches_hand_computed_infiltration() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(forecast_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::forecast_body(36)))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let table_path = dir.path().join("forecast_values.txt");
    let house = common::reference_house();
    let client = AcquisitionClient::new(
        WundergroundClient::new(&common::provider_config(&server.uri())).unwrap(),
        common::fast_retry(10),
    );
    let job = RefreshJob::new(client, house, ForecastTable::new(&table_path), 36);

    let rows_written = job.run(&CancellationToken::new()).await.unwrap();
    assert_eq!(rows_written, 36);

    let rows = ForecastTable::new(&table_path).load().await.unwrap();
    assert_eq!(rows.len(), 36);
    for (i, row) in rows.iter().enumerate() {
        let expected_ts = common::forecast_start() + Duration::hours(i as i64);
        assert_eq!(row.sample.timestamp, expected_ts);

        let u = common::wind_kph(i) as f64 * KPH_TO_MS;
        let delta_t = house.indoor_temp_c - common::temp_c(i) as f64;
        let expected = superposition(
            stack(house.c, house.cs, delta_t, house.n),
            wind(house.c, house.cw, house.s, house.g, u, house.n),
            0.0,
            0.0,
        );
        assert!(
            (row.infiltration_m3_s - expected).abs() < 1e-9,
            "row {i}: got {} expected {expected}",
            row.infiltration_m3_s
        );
    }
}

#[tokio::test]
async fn transient_failures_are_retried_without_exhausting() {
    let server = MockServer::start().await;
    // three outages, then a good response; the client must make at most
    // four requests in total
    Mock::given(method("GET"))
        .and(path(forecast_path()))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(3)
        .expect(3)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(forecast_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::forecast_body(36)))
        .expect(1)
        .mount(&server)
        .await;

    let client = AcquisitionClient::new(
        WundergroundClient::new(&common::provider_config(&server.uri())).unwrap(),
        common::fast_retry(10),
    );
    let samples = client.forecast(&CancellationToken::new()).await.unwrap();
    assert_eq!(samples.len(), 36);
}

#[tokio::test]
async fn persistent_outage_makes_exactly_ten_attempts_and_aborts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(forecast_path()))
        .respond_with(ResponseTemplate::new(503))
        .expect(10)
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let table_path = dir.path().join("forecast_values.txt");
    let client = AcquisitionClient::new(
        WundergroundClient::new(&common::provider_config(&server.uri())).unwrap(),
        common::fast_retry(10),
    );
    let job = RefreshJob::new(
        client,
        common::reference_house(),
        ForecastTable::new(&table_path),
        36,
    );

    assert!(job.run(&CancellationToken::new()).await.is_err());
    // the job aborted without creating or mutating the table
    assert!(!table_path.exists());
}

#[tokio::test]
async fn malformed_response_counts_toward_retry_like_an_outage() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(forecast_path()))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .expect(3)
        .mount(&server)
        .await;

    let client = AcquisitionClient::new(
        WundergroundClient::new(&common::provider_config(&server.uri())).unwrap(),
        common::fast_retry(3),
    );
    assert!(client.forecast(&CancellationToken::new()).await.is_err());
}

#[tokio::test]
async fn provider_parsing_converts_wind_from_kph() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(forecast_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::forecast_body(1)))
        .mount(&server)
        .await;

    let provider = WundergroundClient::new(&common::provider_config(&server.uri())).unwrap();
    let samples = provider.hourly_forecast().await.unwrap();
    assert_eq!(samples.len(), 1);
    assert!((samples[0].wind_speed_ms - common::wind_kph(0) as f64 * KPH_TO_MS).abs() < 1e-12);
}
