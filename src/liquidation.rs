//! Liquidation and voluntary exit evaluation.
//!
//! Every open position lands in exactly one bucket per period: liquidated,
//! exit on loss, exit on profit, or still open. Liquidation is checked first
//! and wins over any voluntary exit. Voluntary exits are coin flips against
//! the configured take profit / take loss chances.

use crate::position::{Position, PositionBook};
use crate::types::Price;
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExitParams {
    pub take_profit_chance: f64,
    pub take_loss_chance: f64,
}

impl Default for ExitParams {
    fn default() -> Self {
        Self {
            take_profit_chance: 0.0,
            take_loss_chance: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitKind {
    Liquidated,
    TakeLoss,
    TakeProfit,
}

/// Per position exit flags, aligned with the book they were computed from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExitMasks {
    pub liquidated: Vec<bool>,
    pub exit_loss: Vec<bool>,
    pub exit_profit: Vec<bool>,
}

impl ExitMasks {
    pub fn len(&self) -> usize {
        self.liquidated.len()
    }

    pub fn is_empty(&self) -> bool {
        self.liquidated.is_empty()
    }

    // union of the three buckets
    pub fn closing(&self) -> Vec<bool> {
        (0..self.len()).map(|i| self.kind(i).is_some()).collect()
    }

    pub fn kind(&self, index: usize) -> Option<ExitKind> {
        if self.liquidated[index] {
            Some(ExitKind::Liquidated)
        } else if self.exit_loss[index] {
            Some(ExitKind::TakeLoss)
        } else if self.exit_profit[index] {
            Some(ExitKind::TakeProfit)
        } else {
            None
        }
    }

    pub fn liquidation_count(&self) -> usize {
        self.liquidated.iter().filter(|&&f| f).count()
    }

    pub fn loss_exit_count(&self) -> usize {
        self.exit_loss.iter().filter(|&&f| f).count()
    }

    pub fn profit_exit_count(&self) -> usize {
        self.exit_profit.iter().filter(|&&f| f).count()
    }

    pub fn voluntary_exit_count(&self) -> usize {
        self.loss_exit_count() + self.profit_exit_count()
    }
}

// 6.1: margin exhausted. c * lev * (price - entry) + c * price < 0
pub fn is_liquidatable(position: &Position, price: Price) -> bool {
    position.equity(price).is_negative()
}

/// Classifies every position in the book at `price`.
///
/// Draw order: one uniform per position for the loss pass, then one per
/// position for the profit pass. Draws happen for every position, liquidated
/// or not, so the stream does not depend on the liquidation outcome.
pub fn evaluate_exits<R: Rng + ?Sized>(
    book: &PositionBook,
    price: Price,
    params: &ExitParams,
    rng: &mut R,
) -> ExitMasks {
    let positions = book.positions();

    let liquidated: Vec<bool> = positions.iter().map(|p| is_liquidatable(p, price)).collect();

    let loss_draws: Vec<f64> = positions.iter().map(|_| rng.gen::<f64>()).collect();
    let profit_draws: Vec<f64> = positions.iter().map(|_| rng.gen::<f64>()).collect();

    let exit_loss = positions
        .iter()
        .zip(&loss_draws)
        .zip(&liquidated)
        .map(|((p, &u), &liq)| !liq && p.is_in_loss(price) && u < params.take_loss_chance)
        .collect();

    let exit_profit = positions
        .iter()
        .zip(&profit_draws)
        .zip(&liquidated)
        .map(|((p, &u), &liq)| !liq && p.is_in_profit(price) && u < params.take_profit_chance)
        .collect();

    ExitMasks {
        liquidated,
        exit_loss,
        exit_profit,
    }
}
