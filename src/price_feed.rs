// Price Feed Integration
//
// This module abstracts how the simulation receives its price path. The runner
// is agnostic to whether prices come from a historical export or a synthetic
// process. We define the provider trait, the validated series the runner
// consumes, and two providers: a fixed series and geometric Brownian motion.

use crate::types::{Price, Timestamp};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, StandardNormal};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One observation of the underlying
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: Timestamp,
    pub price: Price,
}

impl PricePoint {
    pub fn new(timestamp: Timestamp, price: Price) -> Self {
        Self { timestamp, price }
    }
}

/// Errors raised before a price path reaches the runner
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PriceFeedError {
    #[error("Price series is empty")]
    Empty,

    #[error("Timestamp at index {index} ({current:?}) is not after the previous one ({previous:?})")]
    NonMonotonicTimestamp {
        index: usize,
        previous: Timestamp,
        current: Timestamp,
    },

    #[error("Price at index {index} is not positive: {price}")]
    InvalidPrice { index: usize, price: Decimal },

    #[error("Invalid price process: {reason}")]
    InvalidProcess { reason: String },
}

/// A clean price path: non-empty, strictly ascending timestamps, positive prices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Validates an already ordered path. Rejects instead of repairing.
    pub fn new(points: Vec<PricePoint>) -> Result<Self, PriceFeedError> {
        if points.is_empty() {
            return Err(PriceFeedError::Empty);
        }
        for (index, pair) in points.windows(2).enumerate() {
            if pair[1].timestamp <= pair[0].timestamp {
                return Err(PriceFeedError::NonMonotonicTimestamp {
                    index: index + 1,
                    previous: pair[0].timestamp,
                    current: pair[1].timestamp,
                });
            }
        }
        Ok(Self { points })
    }

    /// Builds a series from raw rows: drops rows with no price, sorts by
    /// timestamp, then validates. Non-positive prices and duplicate
    /// timestamps are still errors. `InvalidPrice::index` is the position of
    /// the offending row in `rows`, not in the sorted series.
    pub fn clean(rows: Vec<(Timestamp, Option<Decimal>)>) -> Result<Self, PriceFeedError> {
        let mut present: Vec<(usize, Timestamp, Decimal)> = rows
            .into_iter()
            .enumerate()
            .filter_map(|(row, (ts, price))| price.map(|p| (row, ts, p)))
            .collect();
        present.sort_by_key(|(_, ts, _)| *ts);

        let mut points = Vec::with_capacity(present.len());
        for (row, timestamp, raw) in present {
            let price = Price::new(raw).ok_or(PriceFeedError::InvalidPrice { index: row, price: raw })?;
            points.push(PricePoint::new(timestamp, price));
        }
        Self::new(points)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn iter(&self) -> impl Iterator<Item = &PricePoint> {
        self.points.iter()
    }

    pub fn first(&self) -> Option<&PricePoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }
}

/// Trait for price path sources. Implement this to feed the simulation from
/// a historical export, a database, or a synthetic process.
pub trait PriceProvider {
    /// Human readable name
    fn name(&self) -> &str;

    /// Produce the full, validated path
    fn price_series(&mut self) -> Result<PriceSeries, PriceFeedError>;
}

/// Fixed path, e.g. loaded by the host from a spreadsheet export
pub struct StaticPriceFeed {
    name: String,
    rows: Vec<(Timestamp, Option<Decimal>)>,
}

impl StaticPriceFeed {
    pub fn new(name: &str, rows: Vec<(Timestamp, Option<Decimal>)>) -> Self {
        Self {
            name: name.to_string(),
            rows,
        }
    }

    /// Evenly spaced prices starting at `start`
    pub fn from_prices(name: &str, start: Timestamp, step_ms: i64, prices: &[Decimal]) -> Self {
        let rows = prices
            .iter()
            .enumerate()
            .map(|(i, p)| (start.plus_millis(step_ms * i as i64), Some(*p)))
            .collect();
        Self::new(name, rows)
    }
}

impl PriceProvider for StaticPriceFeed {
    fn name(&self) -> &str {
        &self.name
    }

    fn price_series(&mut self) -> Result<PriceSeries, PriceFeedError> {
        PriceSeries::clean(self.rows.clone())
    }
}

pub const HOUR_MS: i64 = 3_600_000;

/// Geometric Brownian motion parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GbmParams {
    pub s0: f64,
    pub mu: f64,
    pub sigma: f64,
    pub dt: f64,
    pub n_periods: usize,
}

impl Default for GbmParams {
    fn default() -> Self {
        Self {
            s0: 10.0,
            mu: 0.0,
            sigma: 0.02,
            dt: 1.0,
            n_periods: 24 * 30, // a month of hours
        }
    }
}

impl GbmParams {
    pub fn validate(&self) -> Result<(), PriceFeedError> {
        let finite = [self.s0, self.mu, self.sigma, self.dt].iter().all(|v| v.is_finite());
        if !finite {
            return Err(PriceFeedError::InvalidProcess {
                reason: "All parameters must be finite".to_string(),
            });
        }
        if self.s0 <= 0.0 {
            return Err(PriceFeedError::InvalidProcess {
                reason: format!("s0 must be positive, got {}", self.s0),
            });
        }
        if self.sigma < 0.0 || self.dt <= 0.0 {
            return Err(PriceFeedError::InvalidProcess {
                reason: "sigma must be non-negative and dt positive".to_string(),
            });
        }
        if self.n_periods == 0 {
            return Err(PriceFeedError::Empty);
        }
        Ok(())
    }
}

/// Synthetic path: S(t+dt) = S(t) * exp((mu - sigma^2/2) dt + sigma sqrt(dt) Z)
pub struct GbmPriceFeed {
    params: GbmParams,
    start: Timestamp,
    step_ms: i64,
    rng: StdRng,
}

impl GbmPriceFeed {
    /// Hourly points from 2020-01-01 UTC.
    pub fn new(params: GbmParams, seed: Option<u64>) -> Self {
        let start = Timestamp::from_ymd(2020, 1, 1).unwrap_or(Timestamp::from_millis(0));
        Self::with_schedule(params, seed, start, HOUR_MS)
    }

    pub fn with_schedule(params: GbmParams, seed: Option<u64>, start: Timestamp, step_ms: i64) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            params,
            start,
            step_ms,
            rng,
        }
    }

    fn path(&mut self) -> Vec<f64> {
        let p = &self.params;
        let drift = (p.mu - 0.5 * p.sigma * p.sigma) * p.dt;
        let vol = p.sigma * p.dt.sqrt();

        let mut prices = Vec::with_capacity(p.n_periods);
        let mut current = p.s0;
        prices.push(current);
        for _ in 1..p.n_periods {
            let z: f64 = StandardNormal.sample(&mut self.rng);
            current *= (drift + vol * z).exp();
            prices.push(current);
        }
        prices
    }
}

impl PriceProvider for GbmPriceFeed {
    fn name(&self) -> &str {
        "gbm"
    }

    fn price_series(&mut self) -> Result<PriceSeries, PriceFeedError> {
        self.params.validate()?;
        if self.step_ms <= 0 {
            return Err(PriceFeedError::InvalidProcess {
                reason: format!("step must be positive, got {}ms", self.step_ms),
            });
        }

        let mut points = Vec::with_capacity(self.params.n_periods);
        for (index, raw) in self.path().into_iter().enumerate() {
            let value = Decimal::from_f64(raw)
                .map(|d| d.round_dp(8))
                .ok_or_else(|| PriceFeedError::InvalidProcess {
                    reason: format!("price {raw} at step {index} is not representable as a decimal"),
                })?;
            let price = Price::new(value).ok_or(PriceFeedError::InvalidPrice { index, price: value })?;
            let timestamp = self.start.plus_millis(self.step_ms * index as i64);
            points.push(PricePoint::new(timestamp, price));
        }
        PriceSeries::new(points)
    }
}
