// 11.0 ledger.rs: per period record of protocol state. append only, one row per price point.
// 11.1 sinks: where rows go as they are produced. in memory or json lines.

use crate::types::{Price, Quote, Regime, Timestamp};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::io::Write;

/** 11.0: one processed period. immutable once appended */
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRow {
    pub period: usize,
    pub timestamp: Timestamp,
    pub price: Price,
    /// Insurance fund balance at the end of the period
    pub treasury: Quote,
    pub entry_fee_income: Quote,
    pub exit_fee_income: Quote,
    pub mint_fee_income: Quote,
    pub burn_fee_income: Quote,
    /// Unsigned. direction follows `regime`
    pub funding_payment: Quote,
    pub regime: Regime,
    pub liquidations: usize,
    pub loss_exits: usize,
    pub profit_exits: usize,
    /// Voluntary exits: loss + profit
    pub exits: usize,
    pub open_positions: usize,
    /// Σ c × price over the book after exits
    pub la_exposure: Quote,
    /// Σ c × lev × price over the book after exits
    pub la_position: Quote,
    pub stablecoin_supply: Option<Decimal>,
    pub insolvent: bool,
}

impl LedgerRow {
    // same summation order the fund is credited with
    pub fn fee_income(&self) -> Quote {
        self.entry_fee_income
            .add(self.exit_fee_income)
            .add(self.mint_fee_income)
            .add(self.burn_fee_income)
    }

    // what the fund gained (+) or paid (-) in funding
    pub fn signed_funding(&self) -> Quote {
        crate::funding::signed_funding(self.funding_payment, self.regime)
    }
}

/// Append only list of rows in input order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ledger {
    rows: Vec<LedgerRow>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, row: LedgerRow) {
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[LedgerRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn last(&self) -> Option<&LedgerRow> {
        self.rows.last()
    }

    pub fn first_insolvent(&self) -> Option<&LedgerRow> {
        self.rows.iter().find(|r| r.insolvent)
    }

    pub fn total_fee_income(&self) -> Quote {
        self.rows.iter().map(|r| r.fee_income()).sum()
    }

    pub fn total_liquidations(&self) -> usize {
        self.rows.iter().map(|r| r.liquidations).sum()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("Sink I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Row serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// 11.1: receives every row as soon as it is appended
pub trait LedgerSink {
    fn accept(&mut self, row: &LedgerRow) -> Result<(), SinkError>;

    fn flush(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

impl LedgerSink for Vec<LedgerRow> {
    fn accept(&mut self, row: &LedgerRow) -> Result<(), SinkError> {
        self.push(row.clone());
        Ok(())
    }
}

/// One JSON object per line
pub struct JsonLinesSink<W: Write> {
    writer: W,
    written: usize,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> LedgerSink for JsonLinesSink<W> {
    fn accept(&mut self, row: &LedgerRow) -> Result<(), SinkError> {
        serde_json::to_writer(&mut self.writer, row)?;
        self.writer.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        self.writer.flush()?;
        Ok(())
    }
}
