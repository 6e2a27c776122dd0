use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use std::path::PathBuf;

use crate::acquisition::RetryPolicy;
use crate::physics::{ashrae_coefficients, Foundation, HouseParameters, DEFAULT_PRESSURE_EXPONENT};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub provider: ProviderConfig,
    #[serde(default)]
    pub retry: RetryPolicy,
    pub house: HouseConfig,
    pub table: TableConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    pub base_url: String,
    pub api_key: String,
    /// Location path fragment, e.g. "CA/San_Leandro".
    pub location: String,
    #[serde(default = "default_http_timeout")]
    pub http_timeout_seconds: u64,
}

fn default_http_timeout() -> u64 {
    30
}

/// House physics coefficients. Either every coefficient is given explicitly,
/// or `stories` + `foundation` select Cs, Cw, G and s from the ASHRAE
/// Fundamentals tables; explicit values win over tabulated ones.
#[derive(Debug, Clone, Deserialize)]
pub struct HouseConfig {
    /// House flow coefficient, derived from ACH50 and house volume.
    pub c: f64,
    pub cs: Option<f64>,
    pub cw: Option<f64>,
    pub g: Option<f64>,
    pub s: Option<f64>,
    pub stories: Option<u8>,
    pub foundation: Option<Foundation>,
    pub indoor_temp_c: f64,
    #[serde(default = "default_pressure_exponent")]
    pub n: f64,
}

fn default_pressure_exponent() -> f64 {
    DEFAULT_PRESSURE_EXPONENT
}

impl HouseConfig {
    /// Resolve into validated model parameters.
    pub fn parameters(&self) -> Result<HouseParameters> {
        let tabulated = match (self.stories, self.foundation) {
            (Some(stories), Some(foundation)) => Some(
                ashrae_coefficients(stories, foundation).with_context(|| {
                    format!("no ASHRAE coefficients tabulated for {stories}-story houses")
                })?,
            ),
            (None, None) => None,
            _ => anyhow::bail!("house.stories and house.foundation must be given together"),
        };

        let pick = |explicit: Option<f64>, from_table: Option<f64>, name: &str| {
            explicit.or(from_table).with_context(|| {
                format!("house.{name} is not set and no ASHRAE table selection was given")
            })
        };

        let params = HouseParameters {
            c: self.c,
            cs: pick(self.cs, tabulated.map(|t| t.cs), "cs")?,
            cw: pick(self.cw, tabulated.map(|t| t.cw), "cw")?,
            g: pick(self.g, tabulated.map(|t| t.g), "g")?,
            s: pick(self.s, tabulated.map(|t| t.s), "s")?,
            indoor_temp_c: self.indoor_temp_c,
            n: self.n,
        };
        params.validate()?;
        Ok(params)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TableConfig {
    /// Storage path of the persisted forecast table.
    pub path: PathBuf,
    #[serde(default = "default_horizon_hours")]
    pub horizon_hours: usize,
}

fn default_horizon_hours() -> usize {
    36
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        let figment = Figment::new()
            .merge(Toml::file("config/default.toml"))
            .merge(Env::prefixed("INFILT__").split("__"));
        let cfg: Config = figment.extract()?;
        cfg.retry.validate()?;
        if cfg.table.horizon_hours == 0 {
            anyhow::bail!("table.horizon_hours must be at least 1");
        }
        Ok(cfg)
    }
}
