//! Funding settlement between the LA side and the insurance fund.

use super::core::Simulation;
use super::results::FundingResult;
use crate::funding::{settle_against_book, signed_funding, FundingSettlement};
use crate::state::ProtocolState;
use crate::types::{Price, Quote, Regime};

impl Simulation {
    /// Settle one period of funding.
    ///
    /// The LA base is the leveraged notional of the book after exits; the
    /// fund base is the balance after this period's fees. The fund moves by
    /// the signed payment. Under `DebitCollateral` the LA side also moves
    /// through position collateral.
    pub(super) fn settle_funding(&mut self, regime: Regime, price: Price) -> FundingResult {
        let p = &self.config.protocol;
        let la_amt = self.book.leveraged_exposure(price).exposure();
        let mut protocol = ProtocolState::new(
            la_amt,
            Quote::zero(),
            self.insurance_fund.balance,
            p.funding_rate_to_la_bps,
            p.funding_rate_to_if_bps,
        );

        let payment = protocol.settle_funding(regime);
        self.insurance_fund.apply(signed_funding(payment, regime));

        let settled_against_book = match self.config.engine.funding_settlement {
            FundingSettlement::UnlimitedWallets => Quote::zero(),
            FundingSettlement::DebitCollateral => {
                let rate = match regime {
                    Regime::Bull => p.funding_rate_to_if_bps,
                    Regime::Bear => p.funding_rate_to_la_bps,
                };
                settle_against_book(&mut self.book, regime, payment, rate, price)
            }
        };

        FundingResult {
            regime,
            payment,
            settled_against_book,
            protocol,
        }
    }
}
