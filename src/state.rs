// 2.0: protocol balances. who holds how much collateral at a given price.
// 2.1 speculative asset snapshot, 2.2 protocol state, 2.3 insurance fund.

use crate::types::{Bps, Price, Quote, Regime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

// 2.1: an amount of the underlying valued at one price. built per computation, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeculativeAssetState {
    pub amount: Decimal,
    pub price_usd: Price,
}

impl SpeculativeAssetState {
    pub fn new(amount: Decimal, price_usd: Price) -> Self {
        Self { amount, price_usd }
    }

    pub fn exposure(&self) -> Quote {
        Quote::new(self.amount * self.price_usd.value())
    }
}

// change in exposure between two snapshots. for a fixed amount this is amount * price move.
pub fn exposure_delta(init: &SpeculativeAssetState, fin: &SpeculativeAssetState) -> Quote {
    fin.exposure().sub(init.exposure())
}

/// Which side of the protocol ran out of collateral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Insolvency {
    InsuranceFundExhausted,
    LeverageAgentsUnderwater,
    InsuranceAgentsUnderwater,
}

impl fmt::Display for Insolvency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Insolvency::InsuranceFundExhausted => write!(f, "insurance fund exhausted"),
            Insolvency::LeverageAgentsUnderwater => write!(f, "leverage agents underwater"),
            Insolvency::InsuranceAgentsUnderwater => write!(f, "insurance agents underwater"),
        }
    }
}

// 2.2: collateral held by leverage agents (LA), insurance agents (IA) and the insurance fund (IF),
// plus the two directional funding rates. the runner owns one snapshot per period;
// settle_funding is the only thing that mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolState {
    pub la_amt: Quote,
    pub ia_amt: Quote,
    pub if_amt: Quote,
    pub frate_to_la: Bps,
    pub frate_to_if: Bps,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolPcts {
    pub la: Decimal,
    pub ia: Decimal,
    pub insurance_fund: Decimal,
}

impl ProtocolState {
    pub fn new(la_amt: Quote, ia_amt: Quote, if_amt: Quote, frate_to_la: Bps, frate_to_if: Bps) -> Self {
        Self {
            la_amt,
            ia_amt,
            if_amt,
            frate_to_la,
            frate_to_if,
        }
    }

    pub fn total_amt(&self) -> Quote {
        self.la_amt.add(self.ia_amt).add(self.if_amt)
    }

    // share of total collateral per holder. all zero for an empty protocol.
    pub fn pcts(&self) -> ProtocolPcts {
        let total = self.total_amt().value();
        if total.is_zero() {
            return ProtocolPcts {
                la: Decimal::ZERO,
                ia: Decimal::ZERO,
                insurance_fund: Decimal::ZERO,
            };
        }
        ProtocolPcts {
            la: self.la_amt.value() / total,
            ia: self.ia_amt.value() / total,
            insurance_fund: self.if_amt.value() / total,
        }
    }

    // fund at or below zero is exhausted; the agent balances only fail once negative.
    pub fn insolvency(&self) -> Option<Insolvency> {
        if !self.if_amt.is_positive() {
            Some(Insolvency::InsuranceFundExhausted)
        } else if self.la_amt.is_negative() {
            Some(Insolvency::LeverageAgentsUnderwater)
        } else if self.ia_amt.is_negative() {
            Some(Insolvency::InsuranceAgentsUnderwater)
        } else {
            None
        }
    }

    pub fn is_solvent(&self) -> bool {
        self.insolvency().is_none()
    }

    // 2.2.1: bull pays frate_to_if on the LA balance, bear pays frate_to_la on the fund.
    pub fn funding_payment(&self, regime: Regime) -> Quote {
        match regime {
            Regime::Bull => crate::funding::compute_funding_payment(self.frate_to_if, self.la_amt),
            Regime::Bear => crate::funding::compute_funding_payment(self.frate_to_la, self.if_amt),
        }
    }

    /// Moves one period of funding between the LA balance and the fund.
    ///
    /// Returns the (unsigned) payment. The fund gains it in a bull period and
    /// loses it in a bear period; the LA balance moves the opposite way.
    pub fn settle_funding(&mut self, regime: Regime) -> Quote {
        let payment = self.funding_payment(regime);
        let to_fund = crate::funding::signed_funding(payment, regime);
        self.if_amt = self.if_amt.add(to_fund);
        self.la_amt = self.la_amt.add(to_fund.negate());
        payment
    }
}

// 2.3: insurance fund. balance plus running totals so a run can be audited afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsuranceFund {
    pub balance: Quote,
    pub total_deposits: Quote,
    pub total_payouts: Quote,
}

impl InsuranceFund {
    pub fn new(initial_balance: Quote) -> Self {
        Self {
            balance: initial_balance,
            total_deposits: initial_balance,
            total_payouts: Quote::zero(),
        }
    }

    pub fn deposit(&mut self, amount: Quote) {
        self.balance = self.balance.add(amount);
        self.total_deposits = self.total_deposits.add(amount);
    }

    // signed transfer: positive flows in, negative flows out. never clamped.
    pub fn apply(&mut self, delta: Quote) {
        self.balance = self.balance.add(delta);
        if delta.is_negative() {
            self.total_payouts = self.total_payouts.add(delta.negate());
        } else {
            self.total_deposits = self.total_deposits.add(delta);
        }
    }
}
