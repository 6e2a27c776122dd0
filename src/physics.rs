//! Residential infiltration model (ASHRAE basic model)
//!
//! Stack and wind airflows are computed independently and combined by
//! quadrature superposition, per the 2013 ASHRAE Handbook of Fundamentals,
//! Chapter 16. All functions are pure; given identical inputs the output is
//! bit-for-bit reproducible.

use serde::{Deserialize, Serialize};

use crate::domain::WeatherSample;

/// Default pressure exponent for the envelope leakage power law.
pub const DEFAULT_PRESSURE_EXPONENT: f64 = 0.67;

/// Immutable per-house model coefficients, derived from survey data
/// (ASHRAE Fundamentals ch. 16, tables 7-9) or given explicitly.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HouseParameters {
    /// House flow coefficient (from ACH50 and house volume), m3/(s*Pa^n)
    pub c: f64,
    /// Stack coefficient
    pub cs: f64,
    /// Wind coefficient
    pub cw: f64,
    /// Wind speed multiplier (varies with number of stories)
    pub g: f64,
    /// Shelter factor
    pub s: f64,
    /// Indoor reference temperature, degrees C
    pub indoor_temp_c: f64,
    /// Pressure exponent
    pub n: f64,
}

impl HouseParameters {
    /// Reject physically meaningless coefficient sets. All coefficients must
    /// be nonnegative and the pressure exponent strictly positive.
    pub fn validate(&self) -> anyhow::Result<()> {
        for (name, value) in [
            ("c", self.c),
            ("Cs", self.cs),
            ("Cw", self.cw),
            ("G", self.g),
            ("s", self.s),
        ] {
            if !value.is_finite() || value < 0.0 {
                anyhow::bail!("house coefficient {name} must be nonnegative, got {value}");
            }
        }
        if !self.n.is_finite() || self.n <= 0.0 {
            anyhow::bail!("pressure exponent n must be strictly positive, got {}", self.n);
        }
        if !self.indoor_temp_c.is_finite() {
            anyhow::bail!("indoor reference temperature must be finite");
        }
        Ok(())
    }

    /// Infiltration airflow (m3/s) for one weather sample, with no
    /// mechanical ventilation terms.
    pub fn infiltration_m3_s(&self, sample: &WeatherSample) -> f64 {
        let delta_t = self.indoor_temp_c - sample.temperature_c;
        superposition(
            stack(self.c, self.cs, delta_t, self.n),
            wind(self.c, self.cw, self.s, self.g, sample.wind_speed_ms, self.n),
            0.0,
            0.0,
        )
    }
}

/// Raise `base` to `exp` preserving sign: `signum(base) * |base|^exp`.
///
/// `deltaT^n` with a fractional exponent is undefined in real arithmetic for
/// negative `deltaT` (cooling season, indoor colder than outdoor). The stack
/// term enters superposition squared, so only the magnitude matters there,
/// but the signed convention keeps `stack()` itself meaningful as a
/// directional flow.
fn signed_powf(base: f64, exp: f64) -> f64 {
    base.signum() * base.abs().powf(exp)
}

/// Stack (buoyancy) airflow rate: `c * Cs * deltaT^n`.
///
/// `delta_t` is indoor minus outdoor temperature in degrees C and may be
/// negative; see [`signed_powf`] for the convention used.
pub fn stack(c: f64, cs: f64, delta_t: f64, n: f64) -> f64 {
    c * cs * signed_powf(delta_t, n)
}

/// Wind airflow rate: `c * Cw * (s*G*U)^(2n)`.
///
/// `u` is wind speed in m/s, nonnegative after unit conversion.
pub fn wind(c: f64, cw: f64, s: f64, g: f64, u: f64, n: f64) -> f64 {
    c * cw * (s * g * u).powf(2.0 * n)
}

/// Quadrature superposition of independent airflow contributions:
/// `mech_balanced + sqrt(stack^2 + wind^2 + mech_unbalanced^2)`.
///
/// Nonnegative for nonnegative `mech_balanced`.
pub fn superposition(stack: f64, wind: f64, mech_unbalanced: f64, mech_balanced: f64) -> f64 {
    mech_balanced + (stack.powi(2) + wind.powi(2) + mech_unbalanced.powi(2)).sqrt()
}

/// Foundation type, selects the wind coefficient column in the ASHRAE tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Foundation {
    Crawlspace,
    BasementSlab,
}

/// One row of the ASHRAE Fundamentals ch. 16 coefficient tables
/// (tables 7-9: wind speed multiplier, stack coefficient, wind coefficient,
/// shelter factor). Values assume a flue and shelter class 4.
#[derive(Debug, Clone, Copy)]
pub struct AshraeCoefficients {
    pub g: f64,
    pub cs: f64,
    pub cw: f64,
    pub s: f64,
}

// Rows: 1, 2, 3 stories. Columns: G, Cs, Cw (crawlspace), Cw (basement/slab), s.
const ASHRAE_TABLE: [[f64; 5]; 3] = [
    [0.48, 0.069, 0.128, 0.142, 0.70],
    [0.59, 0.089, 0.142, 0.156, 0.64],
    [0.67, 0.107, 0.154, 0.167, 0.61],
];

/// Look up tabulated coefficients for a house with `stories` floors (1-3)
/// and the given foundation type. Returns `None` outside the tabulated range.
pub fn ashrae_coefficients(stories: u8, foundation: Foundation) -> Option<AshraeCoefficients> {
    if !(1..=3).contains(&stories) {
        return None;
    }
    let row = ASHRAE_TABLE[stories as usize - 1];
    let cw = match foundation {
        Foundation::Crawlspace => row[2],
        Foundation::BasementSlab => row[3],
    };
    Some(AshraeCoefficients {
        g: row[0],
        cs: row[1],
        cw,
        s: row[4],
    })
}
