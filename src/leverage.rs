// 3.0: standalone valuation of one leveraged position against the protocol.
// the LA brings c_la, the protocol covers c_cover, leverage is the ratio. not used by the runner.

use crate::state::ProtocolState;
use crate::types::Quote;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeveragedPosition {
    pub c_la: Quote,
    pub price_pct_change: Decimal,
    pub c_cover: Quote,
    pub value: Quote,
    pub leverage_mult: Decimal,
}

impl LeveragedPosition {
    /// Values a position after a fractional price move (`0.1` = +10%).
    ///
    /// Fails when either collateral is negative, when the cover exceeds what
    /// the protocol holds in total, or when `c_la` is zero and leverage is
    /// therefore undefined.
    pub fn new(
        protocol: &ProtocolState,
        c_la: Quote,
        c_cover: Quote,
        price_pct_change: Decimal,
    ) -> Result<Self, LeverageError> {
        if c_la.is_negative() {
            return Err(LeverageError::NegativeCollateral { c_la });
        }
        if c_cover.is_negative() {
            return Err(LeverageError::NegativeCover { c_cover });
        }
        let available = protocol.total_amt();
        if c_cover > available {
            return Err(LeverageError::CoverExceedsProtocol { c_cover, available });
        }
        if c_la.value().is_zero() {
            return Err(LeverageError::ZeroCollateral);
        }

        let leverage_mult = c_cover.value() / c_la.value();
        let value = c_la.add(c_cover.mul(price_pct_change));

        Ok(Self {
            c_la,
            price_pct_change,
            c_cover,
            value,
            leverage_mult,
        })
    }

    pub fn pnl(&self) -> Quote {
        self.value.sub(self.c_la)
    }

    // wiped out once the move eats all of the LA's own collateral
    pub fn is_wiped_out(&self) -> bool {
        !self.value.is_positive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LeverageError {
    #[error("LA collateral must be non-negative, got {c_la}")]
    NegativeCollateral { c_la: Quote },

    #[error("Cover amount must be non-negative, got {c_cover}")]
    NegativeCover { c_cover: Quote },

    #[error("Cover amount {c_cover} exceeds total protocol collateral {available}")]
    CoverExceedsProtocol { c_cover: Quote, available: Quote },

    #[error("LA collateral is zero, leverage is undefined")]
    ZeroCollateral,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Bps;
    use rust_decimal_macros::dec;

    fn protocol(total: Decimal) -> ProtocolState {
        ProtocolState::new(
            Quote::new(total),
            Quote::zero(),
            Quote::zero(),
            Bps::zero(),
            Bps::zero(),
        )
    }

    #[test]
    fn leverage_is_cover_over_collateral() {
        let pos = LeveragedPosition::new(
            &protocol(dec!(100000)),
            Quote::new(dec!(1000)),
            Quote::new(dec!(5000)),
            dec!(0.1),
        )
        .unwrap();

        assert_eq!(pos.leverage_mult, dec!(5));
        // 1000 + 5000 * 10%
        assert_eq!(pos.value.value(), dec!(1500));
        assert_eq!(pos.pnl().value(), dec!(500));
        assert!(!pos.is_wiped_out());
    }

    #[test]
    fn large_drop_wipes_out_position() {
        let pos = LeveragedPosition::new(
            &protocol(dec!(100000)),
            Quote::new(dec!(1000)),
            Quote::new(dec!(5000)),
            dec!(-0.2),
        )
        .unwrap();

        assert_eq!(pos.value.value(), dec!(0));
        assert!(pos.is_wiped_out());
    }

    #[test]
    fn cover_above_protocol_total_fails() {
        let result = LeveragedPosition::new(
            &protocol(dec!(4999)),
            Quote::new(dec!(1000)),
            Quote::new(dec!(5000)),
            dec!(0),
        );
        assert!(matches!(result, Err(LeverageError::CoverExceedsProtocol { .. })));
    }

    #[test]
    fn cover_equal_to_protocol_total_is_allowed() {
        let result = LeveragedPosition::new(
            &protocol(dec!(5000)),
            Quote::new(dec!(1000)),
            Quote::new(dec!(5000)),
            dec!(0),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn negative_inputs_fail() {
        let p = protocol(dec!(100000));
        assert!(matches!(
            LeveragedPosition::new(&p, Quote::new(dec!(-1)), Quote::new(dec!(10)), dec!(0)),
            Err(LeverageError::NegativeCollateral { .. })
        ));
        assert!(matches!(
            LeveragedPosition::new(&p, Quote::new(dec!(1)), Quote::new(dec!(-10)), dec!(0)),
            Err(LeverageError::NegativeCover { .. })
        ));
        assert!(matches!(
            LeveragedPosition::new(&p, Quote::zero(), Quote::new(dec!(10)), dec!(0)),
            Err(LeverageError::ZeroCollateral)
        ));
    }
}
