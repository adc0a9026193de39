// 5.0: funding. one directional payment per period between the LAs and the insurance fund.
// bull: LAs pay the fund. bear (or flat): the fund pays the LAs.
// 5.0 has regime detection and the payment formula. 5.1 spreads the LA side over the book.

use crate::position::PositionBook;
use crate::types::{Bps, Price, Quote, Regime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How the LA side of a funding transfer is settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FundingSettlement {
    /// LAs pay and receive from wallets outside the protocol. positions are untouched.
    #[default]
    UnlimitedWallets,
    /// Payments come out of (and go into) position collateral, pro rata to notional.
    DebitCollateral,
}

// 5.0.1: strict comparison. the first period has no previous price and counts as bull.
pub fn detect_regime(previous: Option<Price>, current: Price) -> Regime {
    match previous {
        Some(prev) if current <= prev => Regime::Bear,
        _ => Regime::Bull,
    }
}

// 5.0.2: rate * base. base is already in quote currency.
pub fn compute_funding_payment(rate: Bps, base: Quote) -> Quote {
    base.mul(rate.as_fraction())
}

// fund side of the transfer: +payment in bull, -payment in bear
pub fn signed_funding(payment: Quote, regime: Regime) -> Quote {
    match regime {
        Regime::Bull => payment,
        Regime::Bear => payment.negate(),
    }
}

// 5.1: moves the LA side of a funding payment into position collateral.
// bull debits each position c * rate * lev units, bear credits its notional share / price.
// collateral is allowed to go negative; the runner reports that as LA insolvency.
pub fn settle_against_book(
    book: &mut PositionBook,
    regime: Regime,
    payment: Quote,
    rate: Bps,
    price: Price,
) -> Quote {
    let total_units = book.total_notional_units();
    if total_units.is_zero() || payment.value().is_zero() {
        return Quote::zero();
    }

    let mut settled = Decimal::ZERO;
    match regime {
        Regime::Bull => {
            let fraction = rate.as_fraction();
            for position in book.positions_mut() {
                let debit_units = position.notional_units() * fraction;
                position.collateral_brought -= debit_units;
                settled += debit_units * price.value();
            }
        }
        Regime::Bear => {
            for position in book.positions_mut() {
                let share = position.notional_units() / total_units;
                let credit_units = payment.value() * share / price.value();
                position.collateral_brought += credit_units;
                settled += credit_units * price.value();
            }
        }
    }
    Quote::new(settled)
}
