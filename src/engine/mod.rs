// 8.0: scenario runner. folds the price path into a ledger: position arrivals, exits,
// fees, funding settlement and the insolvency check, one period per price point.
// deterministic for a fixed seed with no external I/O beyond the optional sink.

mod config;
mod core;
mod positions;
mod funding;
mod liquidations;
mod results;

pub use config::{EngineConfig, InsolvencyPolicy};
pub use core::{RunStatus, Simulation};
pub use results::{FundingResult, RunOutcome, RunResult, SimulationError};
