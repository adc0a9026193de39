//! Exit evaluation against the current book.

use super::core::Simulation;
use crate::liquidation::{evaluate_exits, ExitMasks};
use crate::position::PositionBook;
use crate::types::Price;
use log::debug;
use rand::rngs::StdRng;

impl Simulation {
    /// Marks every position in `book` as liquidated, exiting, or staying open.
    /// Consumes two uniform draws per position.
    pub(super) fn evaluate_exits(&self, book: &PositionBook, price: Price, rng: &mut StdRng) -> ExitMasks {
        let masks = evaluate_exits(book, price, &self.exits, rng);

        let liquidated = masks.liquidation_count();
        if liquidated > 0 {
            debug!(
                "{} of {} positions liquidated at {}",
                liquidated,
                book.len(),
                price
            );
        }
        masks
    }
}
