// 4.0: open LA position tracking. one row per position, fungible, no identity.
// 4.1 has the book (multiset of open positions) and its aggregates at the bottom.

use crate::state::SpeculativeAssetState;
use crate::types::{Price, Quote};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    // units of the underlying the LA posted
    pub collateral_brought: Decimal,
    pub leverage: u32,
    pub entry_price: Price,
}

impl Position {
    pub fn new(collateral_brought: Decimal, leverage: u32, entry_price: Price) -> Self {
        Self {
            collateral_brought,
            leverage,
            entry_price,
        }
    }

    // collateral * leverage, in units of the underlying
    pub fn notional_units(&self) -> Decimal {
        self.collateral_brought * Decimal::from(self.leverage)
    }

    pub fn notional_value(&self, price: Price) -> Quote {
        Quote::new(self.notional_units() * price.value())
    }

    // 4.0.1: leveraged pnl. c * lev * (price - entry)
    pub fn leveraged_pnl(&self, price: Price) -> Quote {
        Quote::new(self.notional_units() * (price.value() - self.entry_price.value()))
    }

    // 4.0.2: leveraged pnl plus what the collateral itself is worth now.
    // below zero means the margin is gone.
    pub fn equity(&self, price: Price) -> Quote {
        self.leveraged_pnl(price)
            .add(Quote::new(self.collateral_brought * price.value()))
    }

    pub fn is_in_loss(&self, price: Price) -> bool {
        price < self.entry_price
    }

    pub fn is_in_profit(&self, price: Price) -> bool {
        price > self.entry_price
    }
}

// 4.1: open position book. order is irrelevant; removal goes through a keep mask.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PositionBook {
    positions: Vec<Position>,
}

impl PositionBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn positions_mut(&mut self) -> &mut [Position] {
        &mut self.positions
    }

    pub fn extend(&mut self, batch: impl IntoIterator<Item = Position>) {
        self.positions.extend(batch);
    }

    /// Drops every position whose flag is set. `closing` must be aligned with the book.
    pub fn remove_flagged(&mut self, closing: &[bool]) -> Vec<Position> {
        debug_assert_eq!(closing.len(), self.positions.len());
        let mut removed = Vec::new();
        let mut kept = Vec::with_capacity(self.positions.len());
        for (position, &close) in self.positions.drain(..).zip(closing) {
            if close {
                removed.push(position);
            } else {
                kept.push(position);
            }
        }
        self.positions = kept;
        removed
    }

    pub fn total_collateral(&self) -> Decimal {
        self.positions.iter().map(|p| p.collateral_brought).sum()
    }

    pub fn total_notional_units(&self) -> Decimal {
        total_notional_units(&self.positions)
    }

    // LA exposure: unleveraged collateral valued at price
    pub fn exposure(&self, price: Price) -> SpeculativeAssetState {
        SpeculativeAssetState::new(self.total_collateral(), price)
    }

    // LA position: leveraged notional valued at price
    pub fn leveraged_exposure(&self, price: Price) -> SpeculativeAssetState {
        SpeculativeAssetState::new(self.total_notional_units(), price)
    }

    pub fn has_negative_collateral(&self) -> bool {
        self.positions
            .iter()
            .any(|p| p.collateral_brought < Decimal::ZERO)
    }
}

pub fn total_notional_units(positions: &[Position]) -> Decimal {
    positions.iter().map(Position::notional_units).sum()
}
