// 6.5 seekers.rs: stablecoin seekers. they mint and burn the protocol stablecoin and pay a fee
// on both into the insurance fund. mint is an absolute gamma draw, burn a gamma fraction of supply.

use crate::config::StableCoinSeekerParams;
use crate::generator::{gamma_from, to_decimal, GeneratorError};
use crate::types::{Bps, Quote};
use rand::Rng;
use rand_distr::{Distribution, Gamma};
use rust_decimal::Decimal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeekerFlow {
    pub minted: Decimal,
    pub burned: Decimal,
    pub mint_fee: Quote,
    pub burn_fee: Quote,
    pub supply_after: Decimal,
}

#[derive(Debug, Clone)]
pub struct StableCoinSeekers {
    mint: Gamma<f64>,
    burn: Gamma<f64>,
    mint_fee: Bps,
    burn_fee: Bps,
    supply: Decimal,
}

impl StableCoinSeekers {
    pub fn new(params: &StableCoinSeekerParams) -> Result<Self, GeneratorError> {
        Ok(Self {
            mint: gamma_from(&params.mint_gamma)?,
            burn: gamma_from(&params.burn_gamma)?,
            mint_fee: params.mint_fee_bps,
            burn_fee: params.burn_fee_bps,
            supply: params.initial_supply,
        })
    }

    pub fn supply(&self) -> Decimal {
        self.supply
    }

    /// One period: draw then commit.
    pub fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<SeekerFlow, GeneratorError> {
        let flow = self.draw(rng)?;
        self.commit(&flow);
        Ok(flow)
    }

    /// Draws one period of flow without touching the supply. Mint draw first,
    /// then burn draw. Burn never exceeds current supply.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<SeekerFlow, GeneratorError> {
        let minted = to_decimal(self.mint.sample(rng))?;
        let burn_fraction = to_decimal(self.burn.sample(rng))?.min(Decimal::ONE);
        let burned = burn_fraction * self.supply;

        let supply_after = self
            .supply
            .checked_add(minted)
            .map(|s| s - burned)
            .ok_or(GeneratorError::Overflow {
                size: minted,
                price: Decimal::ONE,
            })?;

        Ok(SeekerFlow {
            minted,
            burned,
            mint_fee: Quote::new(minted * self.mint_fee.as_fraction()),
            burn_fee: Quote::new(burned * self.burn_fee.as_fraction()),
            supply_after,
        })
    }

    pub fn commit(&mut self, flow: &SeekerFlow) {
        self.supply = flow.supply_after;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GammaParams;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rust_decimal_macros::dec;

    #[test]
    fn supply_tracks_mint_and_burn() {
        let mut seekers = StableCoinSeekers::new(&StableCoinSeekerParams::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let start = seekers.supply();

        let flow = seekers.step(&mut rng).unwrap();

        assert_eq!(flow.supply_after, start + flow.minted - flow.burned);
        assert_eq!(seekers.supply(), flow.supply_after);
        assert!(flow.mint_fee.value() >= Decimal::ZERO);
        assert!(flow.burn_fee.value() >= Decimal::ZERO);
    }

    #[test]
    fn draw_leaves_supply_alone() {
        let mut seekers = StableCoinSeekers::new(&StableCoinSeekerParams::default()).unwrap();
        let start = seekers.supply();

        let flow = seekers.draw(&mut StdRng::seed_from_u64(2)).unwrap();
        assert_eq!(seekers.supply(), start);

        seekers.commit(&flow);
        assert_eq!(seekers.supply(), flow.supply_after);
    }

    #[test]
    fn burn_is_capped_at_supply() {
        let params = StableCoinSeekerParams {
            mint_gamma: GammaParams::new(1.0, 0.001),
            // mean burn fraction of 1000: always capped
            burn_gamma: GammaParams::new(1000.0, 1.0),
            mint_fee_bps: Bps::zero(),
            burn_fee_bps: Bps::new(100),
            initial_supply: dec!(500),
        };
        let mut seekers = StableCoinSeekers::new(&params).unwrap();
        let mut rng = StdRng::seed_from_u64(1);

        let flow = seekers.step(&mut rng).unwrap();

        assert_eq!(flow.burned, dec!(500));
        assert_eq!(flow.burn_fee.value(), dec!(5));
        assert!(flow.supply_after >= Decimal::ZERO);
    }

    #[test]
    fn fees_are_rate_times_volume() {
        let mut seekers = StableCoinSeekers::new(&StableCoinSeekerParams::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(8);

        let flow = seekers.step(&mut rng).unwrap();

        // 10 bps each
        let tolerance = dec!(0.000001);
        assert!((flow.mint_fee.value() - flow.minted * dec!(0.001)).abs() < tolerance);
        assert!((flow.burn_fee.value() - flow.burned * dec!(0.001)).abs() < tolerance);
    }
}
