//! Position arrivals and closures.

use super::core::Simulation;
use super::results::SimulationError;
use crate::liquidation::ExitMasks;
use crate::position::Position;
use crate::types::{Price, Quote};
use rand::rngs::StdRng;

impl Simulation {
    /// Adds positions that are already open, e.g. a book carried over from an
    /// earlier run. No entry fee is charged for them.
    pub fn with_positions(mut self, positions: impl IntoIterator<Item = Position>) -> Self {
        self.book.extend(positions);
        self
    }

    /// Draws this period's batch and its entry fee. The book is not touched.
    pub(super) fn draw_batch(
        &self,
        price: Price,
        rng: &mut StdRng,
    ) -> Result<(Vec<Position>, Quote), SimulationError> {
        let batch = self.generator.generate(price, rng)?;
        let entry_fee = self.fees.entry_fee_income(&batch, price);
        Ok((batch, entry_fee))
    }

    /// Removes every position that was liquidated or exited voluntarily.
    pub(super) fn close_positions(&mut self, masks: &ExitMasks) -> usize {
        self.book.remove_flagged(&masks.closing()).len()
    }
}
