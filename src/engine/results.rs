// 8.0.2: result types and errors for the runner.

use crate::config::ConfigError;
use crate::generator::GeneratorError;
use crate::ledger::{Ledger, SinkError};
use crate::price_feed::PriceFeedError;
use crate::state::{Insolvency, InsuranceFund, ProtocolState};
use crate::types::{Quote, Regime, Timestamp};
use rust_decimal::Decimal;

#[derive(Debug, Clone)]
pub struct FundingResult {
    pub regime: Regime,
    pub payment: Quote,
    // LA side moved through position collateral. zero under unlimited wallets
    pub settled_against_book: Quote,
    // snapshot after settlement
    pub protocol: ProtocolState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    /// First period that ended insolvent
    Insolvent {
        period: usize,
        timestamp: Timestamp,
        kind: Insolvency,
    },
}

impl RunOutcome {
    pub fn is_insolvent(&self) -> bool {
        matches!(self, RunOutcome::Insolvent { .. })
    }
}

#[derive(Debug, Clone)]
pub struct RunResult {
    pub outcome: RunOutcome,
    pub ledger: Ledger,
    pub insurance_fund: InsuranceFund,
    pub open_positions: usize,
    pub stablecoin_supply: Option<Decimal>,
}

impl RunResult {
    pub fn final_treasury(&self) -> Quote {
        self.insurance_fund.balance
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Generator error: {0}")]
    Generator(#[from] GeneratorError),

    #[error("Price feed error: {0}")]
    PriceFeed(#[from] PriceFeedError),

    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),

    #[error("Simulation already finished at period {period}")]
    Finished { period: usize },
}
