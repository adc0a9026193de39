//! Scenario and stress tests for the runner.
//!
//! Fixed scenarios with hand checked numbers, then long synthetic runs.

use leverage_sim::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const HOUR: i64 = 3_600_000;

fn series(prices: &[Decimal]) -> PriceSeries {
    StaticPriceFeed::from_prices("stress", Timestamp::from_millis(0), HOUR, prices)
        .price_series()
        .unwrap()
}

fn gbm(n_periods: usize, mu: f64, sigma: f64, seed: u64) -> PriceSeries {
    let params = GbmParams {
        s0: 10.0,
        mu,
        sigma,
        dt: 1.0,
        n_periods,
    };
    GbmPriceFeed::new(params, Some(seed)).price_series().unwrap()
}

#[test]
fn flat_market_quiet_protocol_never_moves_the_fund() {
    let config = SimulationConfig::quiet().with_seed(1);
    let initial = Quote::new(config.protocol.initial_insurance_fund);

    let result = Simulation::new(config).unwrap().run(&series(&[dec!(10); 5])).unwrap();

    assert_eq!(result.ledger.len(), 5);
    for row in result.ledger.rows() {
        assert_eq!(row.treasury, initial);
        assert_eq!(row.funding_payment, Quote::zero());
        assert_eq!(row.fee_income(), Quote::zero());
        assert_eq!(row.open_positions, 0);
    }

    let regimes: Vec<Regime> = result.ledger.rows().iter().map(|r| r.regime).collect();
    assert_eq!(
        regimes,
        vec![Regime::Bull, Regime::Bear, Regime::Bear, Regime::Bear, Regime::Bear]
    );
    assert_eq!(result.outcome, RunOutcome::Completed);
}

#[test]
fn flat_market_pays_las_after_the_first_period() {
    let mut config = SimulationConfig::quiet().with_seed(1);
    config.protocol.funding_rate_to_la_bps = Bps::new(10);
    config.protocol.initial_insurance_fund = dec!(1000);

    let result = Simulation::new(config).unwrap().run(&series(&[dec!(10); 3])).unwrap();
    let rows = result.ledger.rows();

    // period 0 is bull with an empty book
    assert_eq!(rows[0].funding_payment, Quote::zero());
    assert_eq!(rows[0].treasury.value(), dec!(1000));
    // then 0.1% of the fund each flat period
    assert_eq!(rows[1].funding_payment.value(), dec!(1));
    assert_eq!(rows[1].treasury.value(), dec!(999));
    assert_eq!(rows[2].funding_payment.value(), dec!(0.999));
    assert_eq!(rows[2].treasury.value(), dec!(998.001));
}

#[test]
fn single_position_liquidated_on_drop_to_eight() {
    let mut config = SimulationConfig::quiet().with_seed(1);
    config.protocol.exit_fee_bps = Bps::new(30);
    let initial = config.protocol.initial_insurance_fund;

    let position = Position::new(dec!(100), 5, Price::new_unchecked(dec!(10)));
    let sim = Simulation::new(config).unwrap().with_positions(vec![position]);
    let result = sim.run(&series(&[dec!(10), dec!(8)])).unwrap();
    let rows = result.ledger.rows();

    assert_eq!(rows[0].liquidations, 0);
    assert_eq!(rows[0].open_positions, 1);
    assert_eq!(rows[0].la_exposure.value(), dec!(1000));
    assert_eq!(rows[0].la_position.value(), dec!(5000));

    // 100 * 5 * (8 - 10) + 100 * 8 = -200
    assert_eq!(rows[1].liquidations, 1);
    assert_eq!(rows[1].exits, 0);
    assert_eq!(rows[1].open_positions, 0);
    assert_eq!(rows[1].regime, Regime::Bear);
    // 500 units * 0.3% * 8
    assert_eq!(rows[1].exit_fee_income.value(), dec!(12));
    assert_eq!(rows[1].treasury.value(), initial + dec!(12));
    assert_eq!(rows[1].la_exposure, Quote::zero());
}

#[test]
fn crash_liquidates_every_leveraged_position() {
    let mut config = SimulationConfig::quiet().with_seed(4);
    config.agents.positions_per_period = 20;

    let mut sim = Simulation::new(config).unwrap();
    let points = series(&[dec!(10), dec!(1)]);

    let first = sim.step(points.points()[0]).unwrap();
    assert_eq!(first.open_positions, 20);
    let leveraged = sim.book().positions().iter().filter(|p| p.leverage >= 1).count();

    // c * lev * (1 - 10) + c * 1 < 0 for any lev >= 1
    let second = sim.step(points.points()[1]).unwrap();
    assert_eq!(second.liquidations, leveraged);
    assert_eq!(second.open_positions, 40 - leveraged);
}

#[test]
fn stablecoin_seekers_pay_into_the_fund() {
    let mut config = SimulationConfig::quiet().with_seed(21);
    config.stablecoin = Some(StableCoinSeekerParams::default());
    let initial = Quote::new(config.protocol.initial_insurance_fund);
    let supply0 = StableCoinSeekerParams::default().initial_supply;

    let result = Simulation::new(config).unwrap().run(&series(&[dec!(3); 24])).unwrap();

    let mut previous = initial;
    for row in result.ledger.rows() {
        assert!(row.mint_fee_income.is_positive());
        assert!(!row.burn_fee_income.is_negative());
        assert_eq!(row.entry_fee_income, Quote::zero());
        assert_eq!(row.treasury, previous.add(row.fee_income()));
        assert!(row.stablecoin_supply.unwrap() >= Decimal::ZERO);
        previous = row.treasury;
    }

    let last_supply = result.ledger.last().unwrap().stablecoin_supply;
    assert_eq!(result.stablecoin_supply, last_supply);
    assert_ne!(last_supply, Some(supply0));
}

#[test]
fn seekers_disabled_leave_supply_empty() {
    let result = Simulation::new(SimulationConfig::default().with_seed(2))
        .unwrap()
        .run(&series(&[dec!(1), dec!(2)]))
        .unwrap();

    assert!(result.stablecoin_supply.is_none());
    assert!(result.ledger.rows().iter().all(|r| r.stablecoin_supply.is_none()));
    assert!(result.ledger.rows().iter().all(|r| r.mint_fee_income == Quote::zero()));
}

#[test]
fn same_seed_same_ledger() {
    let s = gbm(200, 0.0, 0.02, 8);
    let config = SimulationConfig::with_stablecoin_seekers().with_seed(99);

    let a = Simulation::new(config.clone()).unwrap().run(&s).unwrap();
    let b = Simulation::new(config).unwrap().run(&s).unwrap();

    assert_eq!(a.ledger.rows(), b.ledger.rows());
    assert_eq!(a.final_treasury(), b.final_treasury());
}

#[test]
fn long_random_walk_reconciles() {
    let s = gbm(24 * 60, 0.0, 0.02, 13);
    let mut config = SimulationConfig::with_stablecoin_seekers().with_seed(13);
    config.protocol.take_loss_chance = 0.1;
    config.protocol.take_profit_chance = 0.1;
    let initial = Quote::new(config.protocol.initial_insurance_fund);

    let result = Simulation::new(config).unwrap().run(&s).unwrap();

    assert_eq!(result.ledger.len(), s.len());
    let mut previous = initial;
    let mut opened = 0;
    let mut closed = 0;
    for row in result.ledger.rows() {
        assert_eq!(row.treasury, previous.add(row.fee_income()).add(row.signed_funding()));
        assert_eq!(row.exits, row.loss_exits + row.profit_exits);
        opened += 10;
        closed += row.liquidations + row.exits;
        assert_eq!(row.open_positions, opened - closed);
        previous = row.treasury;
    }
    assert_eq!(result.open_positions, opened - closed);
}

#[test]
fn sink_sees_every_row() {
    let s = gbm(48, 0.0, 0.01, 6);
    let config = SimulationConfig::default().with_seed(6);

    let mut rows: Vec<LedgerRow> = Vec::new();
    let result = Simulation::new(config.clone())
        .unwrap()
        .run_with_sink(&s, &mut rows)
        .unwrap();
    assert_eq!(rows.as_slice(), result.ledger.rows());

    let mut json = JsonLinesSink::new(Vec::new());
    Simulation::new(config).unwrap().run_with_sink(&s, &mut json).unwrap();
    assert_eq!(json.written(), 48);
    let text = String::from_utf8(json.into_inner()).unwrap();
    let parsed: Vec<LedgerRow> = text.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
    assert_eq!(parsed.as_slice(), result.ledger.rows());
}

#[test]
fn config_round_trips_through_json() {
    let mut config = SimulationConfig::with_stablecoin_seekers().with_seed(5);
    config.engine.insolvency_policy = InsolvencyPolicy::Halt;
    config.engine.funding_settlement = FundingSettlement::DebitCollateral;

    let json = serde_json::to_string(&config).unwrap();
    let parsed = SimulationConfig::from_json_str(&json).unwrap();

    assert_eq!(parsed.engine, config.engine);
    assert_eq!(parsed.agents.positions_per_period, config.agents.positions_per_period);
    assert!(parsed.stablecoin.is_some());

    let s = gbm(24, 0.0, 0.02, 1);
    let a = Simulation::new(config).unwrap().run(&s).unwrap();
    let b = Simulation::new(parsed).unwrap().run(&s).unwrap();
    assert_eq!(a.ledger.rows(), b.ledger.rows());
}

#[test]
fn unsorted_input_is_rejected_before_the_runner() {
    let rows = vec![
        (Timestamp::from_millis(HOUR), Some(dec!(2))),
        (Timestamp::from_millis(HOUR), Some(dec!(3))),
    ];
    let err = StaticPriceFeed::new("dup", rows).price_series().unwrap_err();
    assert!(matches!(err, PriceFeedError::NonMonotonicTimestamp { .. }));
}

#[test]
fn oversized_positions_at_tiny_prices_fail_cleanly() {
    let mut config = SimulationConfig::quiet().with_seed(1);
    config.agents.positions_per_period = 1;
    config.agents.position_size_gamma = GammaParams::new(2.0, 5e26);
    assert!(config.validate().is_ok());

    let result = Simulation::new(config).unwrap().run(&series(&[dec!(0.000001)]));

    assert!(matches!(
        result,
        Err(SimulationError::Generator(GeneratorError::Overflow { .. }))
    ));
}
