// 6.0 fees.rs: entry and exit fees on leveraged notional. all of it goes to the insurance fund.
// fee = sum(c * lev) * rate * price, charged the same period the position opens or closes.

use crate::liquidation::ExitMasks;
use crate::position::{total_notional_units, Position, PositionBook};
use crate::types::{Bps, Price, Quote};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    pub entry_fee: Bps,
    pub exit_fee: Bps,
}

impl FeeSchedule {
    pub fn new(entry_fee: Bps, exit_fee: Bps) -> Self {
        Self { entry_fee, exit_fee }
    }

    pub fn zero() -> Self {
        Self::new(Bps::zero(), Bps::zero())
    }

    // 6.1: new positions only
    pub fn entry_fee_income(&self, new_positions: &[Position], price: Price) -> Quote {
        fee_on_units(total_notional_units(new_positions), self.entry_fee, price)
    }

    // 6.2: every position closing this period, whatever the reason
    pub fn exit_fee_income(&self, book: &PositionBook, masks: &ExitMasks, price: Price) -> Quote {
        let closing_units: Decimal = book
            .positions()
            .iter()
            .zip(masks.closing())
            .filter(|(_, closing)| *closing)
            // an underwater position pays no exit fee
            .map(|(p, _)| p.notional_units().max(Decimal::ZERO))
            .sum();
        fee_on_units(closing_units, self.exit_fee, price)
    }
}

fn fee_on_units(units: Decimal, rate: Bps, price: Price) -> Quote {
    Quote::new(units * rate.as_fraction() * price.value())
}

/// Fee income collected in one period. `total()` is what the fund is credited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodFees {
    pub entry: Quote,
    pub exit: Quote,
    pub mint: Quote,
    pub burn: Quote,
}

impl PeriodFees {
    pub fn zero() -> Self {
        Self {
            entry: Quote::zero(),
            exit: Quote::zero(),
            mint: Quote::zero(),
            burn: Quote::zero(),
        }
    }

    pub fn total(&self) -> Quote {
        self.entry.add(self.exit).add(self.mint).add(self.burn)
    }
}
