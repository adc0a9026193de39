// 8.0 engine/core.rs: the runner. owns the book, the insurance fund, the rng and the ledger.

use super::config::InsolvencyPolicy;
use super::results::{RunOutcome, RunResult, SimulationError};
use crate::config::SimulationConfig;
use crate::fees::{FeeSchedule, PeriodFees};
use crate::funding::detect_regime;
use crate::generator::PositionGenerator;
use crate::ledger::{Ledger, LedgerRow, LedgerSink};
use crate::liquidation::ExitParams;
use crate::position::PositionBook;
use crate::price_feed::{PriceFeedError, PricePoint, PriceSeries};
use crate::seekers::StableCoinSeekers;
use crate::state::{Insolvency, InsuranceFund, ProtocolState};
use crate::types::{Price, Quote, Timestamp};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Done,
}

/** 8.1: the simulation. all mutable state lives here */
#[derive(Debug)]
pub struct Simulation {
    pub(super) config: SimulationConfig,
    pub(super) generator: PositionGenerator,
    pub(super) seekers: Option<StableCoinSeekers>,
    pub(super) fees: FeeSchedule,
    pub(super) exits: ExitParams,
    pub(super) book: PositionBook,
    pub(super) insurance_fund: InsuranceFund,
    pub(super) previous_price: Option<Price>,
    pub(super) last_timestamp: Option<Timestamp>,
    pub(super) rng: StdRng,
    pub(super) ledger: Ledger,
    pub(super) status: RunStatus,
    pub(super) outcome: RunOutcome,
}

impl Simulation {
    pub fn new(config: SimulationConfig) -> Result<Self, SimulationError> {
        config.validate()?;

        let generator = PositionGenerator::new(&config.agents)?;
        let seekers = config
            .stablecoin
            .as_ref()
            .map(StableCoinSeekers::new)
            .transpose()?;
        let p = &config.protocol;
        let fees = FeeSchedule::new(p.entry_fee_bps, p.exit_fee_bps);
        let exits = ExitParams {
            take_profit_chance: p.take_profit_chance,
            take_loss_chance: p.take_loss_chance,
        };
        let insurance_fund = InsuranceFund::new(Quote::new(p.initial_insurance_fund));
        let rng = match config.engine.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            config,
            generator,
            seekers,
            fees,
            exits,
            book: PositionBook::new(),
            insurance_fund,
            previous_price: None,
            last_timestamp: None,
            rng,
            ledger: Ledger::new(),
            status: RunStatus::Running,
            outcome: RunOutcome::Completed,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn book(&self) -> &PositionBook {
        &self.book
    }

    pub fn insurance_fund_balance(&self) -> Quote {
        self.insurance_fund.balance
    }

    /// Runs the whole series and returns the ledger.
    pub fn run(mut self, series: &PriceSeries) -> Result<RunResult, SimulationError> {
        self.drive(series, None)?;
        Ok(self.into_result())
    }

    /// Same as `run`, handing every row to `sink` as it is appended.
    pub fn run_with_sink(
        mut self,
        series: &PriceSeries,
        sink: &mut dyn LedgerSink,
    ) -> Result<RunResult, SimulationError> {
        self.drive(series, Some(sink))?;
        Ok(self.into_result())
    }

    fn drive(&mut self, series: &PriceSeries, mut sink: Option<&mut dyn LedgerSink>) -> Result<(), SimulationError> {
        info!(
            "Starting run: {} periods, {} new positions per period, insurance fund {}",
            series.len(),
            self.generator.positions_per_period(),
            self.insurance_fund.balance
        );

        for point in series.iter() {
            if self.status == RunStatus::Done {
                break;
            }
            let row = self.step(*point)?;
            if let Some(sink) = sink.as_deref_mut() {
                sink.accept(&row)?;
            }
        }
        if let Some(sink) = sink {
            sink.flush()?;
        }
        self.status = RunStatus::Done;

        info!(
            "Run finished: {} rows, treasury {}, {} positions open, outcome {:?}",
            self.ledger.len(),
            self.insurance_fund.balance,
            self.book.len(),
            self.outcome
        );
        Ok(())
    }

    /// Processes one price point and appends its row.
    ///
    /// Order within the period: new positions, exit evaluation, fees,
    /// stablecoin flow, fund credit, removal of closed positions, funding,
    /// insolvency check. All draws happen before any state changes, so a
    /// failed step leaves the simulation as it was.
    pub fn step(&mut self, point: PricePoint) -> Result<LedgerRow, SimulationError> {
        if self.status == RunStatus::Done {
            return Err(SimulationError::Finished {
                period: self.ledger.len(),
            });
        }
        if let Some(previous) = self.last_timestamp {
            if point.timestamp <= previous {
                return Err(PriceFeedError::NonMonotonicTimestamp {
                    index: self.ledger.len(),
                    previous,
                    current: point.timestamp,
                }
                .into());
            }
        }

        let period = self.ledger.len();
        let price = point.price;

        // draw everything fallible against a copy of the rng and book
        let mut rng = self.rng.clone();
        let (batch, entry_fee) = self.draw_batch(price, &mut rng)?;
        let mut book = self.book.clone();
        book.extend(batch);
        let masks = self.evaluate_exits(&book, price, &mut rng);
        let flow = match self.seekers.as_ref() {
            Some(seekers) => Some(seekers.draw(&mut rng)?),
            None => None,
        };

        self.rng = rng;
        self.book = book;

        let mut fees = PeriodFees::zero();
        fees.entry = entry_fee;
        fees.exit = self.fees.exit_fee_income(&self.book, &masks, price);

        let mut stablecoin_supply = None;
        if let (Some(seekers), Some(flow)) = (self.seekers.as_mut(), flow) {
            seekers.commit(&flow);
            fees.mint = flow.mint_fee;
            fees.burn = flow.burn_fee;
            stablecoin_supply = Some(flow.supply_after);
        }

        self.insurance_fund.deposit(fees.total());
        self.close_positions(&masks);

        let regime = detect_regime(self.previous_price, price);
        let funding = self.settle_funding(regime, price);

        let insolvency = self.check_solvency(&funding.protocol);

        let row = LedgerRow {
            period,
            timestamp: point.timestamp,
            price,
            treasury: self.insurance_fund.balance,
            entry_fee_income: fees.entry,
            exit_fee_income: fees.exit,
            mint_fee_income: fees.mint,
            burn_fee_income: fees.burn,
            funding_payment: funding.payment,
            regime,
            liquidations: masks.liquidation_count(),
            loss_exits: masks.loss_exit_count(),
            profit_exits: masks.profit_exit_count(),
            exits: masks.voluntary_exit_count(),
            open_positions: self.book.len(),
            la_exposure: self.book.exposure(price).exposure(),
            la_position: self.book.leveraged_exposure(price).exposure(),
            stablecoin_supply,
            insolvent: insolvency.is_some(),
        };

        debug!(
            "period {} @ {}: price {} {} treasury {} fees {} funding {} open {} liq {} exits {}",
            period,
            point.timestamp,
            price,
            regime,
            row.treasury,
            fees.total(),
            funding.payment,
            row.open_positions,
            row.liquidations,
            row.exits
        );

        if let Some(kind) = insolvency {
            self.record_insolvency(period, point.timestamp, kind);
        }

        self.previous_price = Some(price);
        self.last_timestamp = Some(point.timestamp);
        self.ledger.push(row.clone());
        Ok(row)
    }

    // fund at or below zero, or any LA balance below zero
    fn check_solvency(&self, protocol: &ProtocolState) -> Option<Insolvency> {
        protocol.insolvency().or_else(|| {
            self.book
                .has_negative_collateral()
                .then_some(Insolvency::LeverageAgentsUnderwater)
        })
    }

    fn record_insolvency(&mut self, period: usize, timestamp: Timestamp, kind: Insolvency) {
        warn!("Insolvent at period {} ({}): {}", period, timestamp, kind);

        if !self.outcome.is_insolvent() {
            self.outcome = RunOutcome::Insolvent {
                period,
                timestamp,
                kind,
            };
        }
        if self.config.engine.insolvency_policy == InsolvencyPolicy::Halt {
            self.status = RunStatus::Done;
        }
    }

    pub fn into_result(self) -> RunResult {
        RunResult {
            outcome: self.outcome,
            ledger: self.ledger,
            insurance_fund: self.insurance_fund,
            open_positions: self.book.len(),
            stablecoin_supply: self.seekers.as_ref().map(|s| s.supply()),
        }
    }
}
