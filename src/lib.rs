// leverage-sim: leverage agent funding simulation.
// insurance fund first architecture: every fee lands in the fund, funding flows between
// the fund and the leveraged positions depending on the price regime.
// all computation is deterministic for a fixed seed with no external I/O.
//
// file map (search X.0 for structs, X.1+ for logic):
//   1.x  types.rs: primitives: Price, Quote, Bps, Timestamp, Regime
//   2.x  state.rs: asset exposure, protocol balances, insurance fund
//   3.x  leverage.rs: standalone leveraged position valuation
//   4.x  position.rs: LA positions and the open book
//   5.x  funding.rs: regime detection, funding payment, settlement policy
//   6.x  liquidation.rs: liquidation and voluntary exits
//   6.0  fees.rs: entry and exit fees
//   6.5  seekers.rs: stablecoin mint/burn flow
//   7.x  config.rs: protocol, agent and seeker params, presets, validation
//   8.x  engine/: scenario runner: arrivals, exits, funding, insolvency
//   9.x  price_feed.rs: price providers (static, gbm)
//   9.5  generator.rs: gamma sizes, poisson leverage
//   11.x ledger.rs: per period rows and sinks

// core simulation modules
pub mod engine;
pub mod fees;
pub mod funding;
pub mod generator;
pub mod leverage;
pub mod liquidation;
pub mod position;
pub mod seekers;
pub mod state;
pub mod types;

// integration modules
pub mod config;
pub mod ledger;
pub mod price_feed;

// re exports for convenience
pub use engine::*;
pub use fees::*;
pub use funding::*;
pub use generator::{GeneratorError, PositionGenerator};
pub use leverage::*;
pub use liquidation::*;
pub use position::*;
pub use seekers::*;
pub use state::*;
pub use types::*;
pub use config::{
    ConfigError, GammaParams, LeverageAgentParams, ProtocolParams, SimulationConfig,
    StableCoinSeekerParams, MAX_FUNDING_RATE_BPS,
};
pub use ledger::{JsonLinesSink, Ledger, LedgerRow, LedgerSink, SinkError};
pub use price_feed::{
    GbmParams, GbmPriceFeed, PriceFeedError, PricePoint, PriceProvider, PriceSeries,
    StaticPriceFeed,
};
