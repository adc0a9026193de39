//! Leverage agent arrivals.
//!
//! Each period a fixed number of LAs open a position. Size is a Gamma draw in
//! quote currency, converted to units of the underlying at the current price.
//! Leverage is a Poisson draw. Every position in a batch enters at the same
//! price.

use crate::config::{GammaParams, LeverageAgentParams};
use crate::position::Position;
use crate::types::Price;
use rand::Rng;
use rand_distr::{Distribution, Gamma, Poisson};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeneratorError {
    #[error("Invalid gamma(shape={shape}, scale={scale}): {reason}")]
    InvalidGamma { shape: f64, scale: f64, reason: String },

    #[error("Invalid poisson(lambda={lambda}): {reason}")]
    InvalidPoisson { lambda: f64, reason: String },

    #[error("Draw {0} cannot be represented as a decimal")]
    NonFiniteDraw(f64),

    #[error("Position of {size} at price {price} overflows the decimal range")]
    Overflow { size: Decimal, price: Decimal },
}

pub(crate) fn gamma_from(params: &GammaParams) -> Result<Gamma<f64>, GeneratorError> {
    Gamma::new(params.shape, params.scale).map_err(|e| GeneratorError::InvalidGamma {
        shape: params.shape,
        scale: params.scale,
        reason: e.to_string(),
    })
}

pub(crate) fn to_decimal(draw: f64) -> Result<Decimal, GeneratorError> {
    if !draw.is_finite() {
        return Err(GeneratorError::NonFiniteDraw(draw));
    }
    Decimal::from_f64(draw).ok_or(GeneratorError::NonFiniteDraw(draw))
}

/// Draws new LA positions. Distributions are built once and reused.
#[derive(Debug, Clone)]
pub struct PositionGenerator {
    positions_per_period: usize,
    size: Gamma<f64>,
    leverage: Poisson<f64>,
}

impl PositionGenerator {
    pub fn new(params: &LeverageAgentParams) -> Result<Self, GeneratorError> {
        let size = gamma_from(&params.position_size_gamma)?;
        let leverage = Poisson::new(params.leverage_poisson_lambda).map_err(|e| {
            GeneratorError::InvalidPoisson {
                lambda: params.leverage_poisson_lambda,
                reason: e.to_string(),
            }
        })?;

        Ok(Self {
            positions_per_period: params.positions_per_period,
            size,
            leverage,
        })
    }

    pub fn positions_per_period(&self) -> usize {
        self.positions_per_period
    }

    /// One batch at `price`. Per position: a size draw then a leverage draw.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        price: Price,
        rng: &mut R,
    ) -> Result<Vec<Position>, GeneratorError> {
        let mut batch = Vec::with_capacity(self.positions_per_period);
        for _ in 0..self.positions_per_period {
            let size_quote = to_decimal(self.size.sample(rng))?;
            let leverage_draw: f64 = self.leverage.sample(rng);
            if !leverage_draw.is_finite() {
                return Err(GeneratorError::NonFiniteDraw(leverage_draw));
            }

            let leverage = leverage_draw as u32;
            let overflow = || GeneratorError::Overflow {
                size: size_quote,
                price: price.value(),
            };
            // notional in quote must stay representable for fees and funding
            let collateral = size_quote.checked_div(price.value()).ok_or_else(overflow)?;
            collateral
                .checked_mul(Decimal::from(leverage))
                .and_then(|units| units.checked_mul(price.value()))
                .ok_or_else(overflow)?;

            batch.push(Position::new(collateral, leverage, price));
        }
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rust_decimal_macros::dec;

    fn params(n: usize) -> LeverageAgentParams {
        LeverageAgentParams {
            positions_per_period: n,
            position_size_gamma: GammaParams::new(2.0, 1_000.0),
            leverage_poisson_lambda: 5.0,
        }
    }

    #[test]
    fn batch_has_configured_size() {
        let generator = PositionGenerator::new(&params(25)).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        let price = Price::new_unchecked(dec!(4.2));

        let batch = generator.generate(price, &mut rng).unwrap();

        assert_eq!(batch.len(), 25);
        for p in &batch {
            assert_eq!(p.entry_price, price);
            assert!(p.collateral_brought > Decimal::ZERO);
        }
    }

    #[test]
    fn empty_batch_consumes_no_draws() {
        let generator = PositionGenerator::new(&params(0)).unwrap();
        let mut rng = StdRng::seed_from_u64(42);

        let batch = generator.generate(Price::new_unchecked(dec!(1)), &mut rng).unwrap();
        assert!(batch.is_empty());

        let mut untouched = StdRng::seed_from_u64(42);
        assert_eq!(rng.gen::<u64>(), untouched.gen::<u64>());
    }

    #[test]
    fn size_is_converted_to_units() {
        // same seed, price doubles: units halve
        let generator = PositionGenerator::new(&params(5)).unwrap();

        let mut rng_a = StdRng::seed_from_u64(7);
        let at_one = generator.generate(Price::new_unchecked(dec!(1)), &mut rng_a).unwrap();

        let mut rng_b = StdRng::seed_from_u64(7);
        let at_two = generator.generate(Price::new_unchecked(dec!(2)), &mut rng_b).unwrap();

        for (a, b) in at_one.iter().zip(&at_two) {
            assert_eq!(a.collateral_brought / dec!(2), b.collateral_brought);
            assert_eq!(a.leverage, b.leverage);
        }
    }

    #[test]
    fn same_seed_same_batch() {
        let generator = PositionGenerator::new(&params(10)).unwrap();
        let price = Price::new_unchecked(dec!(3));

        let a = generator.generate(price, &mut StdRng::seed_from_u64(11)).unwrap();
        let b = generator.generate(price, &mut StdRng::seed_from_u64(11)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn invalid_distributions_fail_fast() {
        let mut bad_gamma = params(1);
        bad_gamma.position_size_gamma = GammaParams::new(-1.0, 1.0);
        assert!(matches!(
            PositionGenerator::new(&bad_gamma),
            Err(GeneratorError::InvalidGamma { .. })
        ));

        let mut bad_poisson = params(1);
        bad_poisson.leverage_poisson_lambda = -2.0;
        assert!(matches!(
            PositionGenerator::new(&bad_poisson),
            Err(GeneratorError::InvalidPoisson { .. })
        ));
    }

    #[test]
    fn oversized_draw_at_tiny_price_is_an_error() {
        let mut huge = params(1);
        huge.position_size_gamma = GammaParams::new(2.0, 5e26);
        let generator = PositionGenerator::new(&huge).unwrap();
        let mut rng = StdRng::seed_from_u64(3);

        let result = generator.generate(Price::new_unchecked(dec!(0.000001)), &mut rng);

        assert!(matches!(result, Err(GeneratorError::Overflow { .. })));
    }

    #[test]
    fn non_finite_draw_rejected() {
        assert!(matches!(to_decimal(f64::NAN), Err(GeneratorError::NonFiniteDraw(_))));
        assert!(matches!(to_decimal(f64::INFINITY), Err(GeneratorError::NonFiniteDraw(_))));
        assert_eq!(to_decimal(2.5).unwrap(), dec!(2.5));
    }
}
