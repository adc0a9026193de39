//! Leverage agent funding simulation.
//!
//! Runs a handful of scenarios over synthetic price paths and prints a
//! summary of each ledger. Pass a JSON config path to run it instead of the
//! built in defaults. Set `RUST_LOG=debug` for per period output.

use leverage_sim::*;
use rust_decimal_macros::dec;
use std::io;

fn main() -> Result<(), SimulationError> {
    env_logger::init();

    println!("Leverage Agent Funding Simulation");
    println!("Insurance Fund vs Leveraged Positions, Hourly Periods\n");

    if let Some(path) = std::env::args().nth(1) {
        let config = SimulationConfig::load(&path)?;
        println!("Config loaded from {}\n", path);
        return scenario_from_config(config);
    }

    scenario_1_flat_market()?;
    scenario_2_random_walk()?;
    scenario_3_crash()?;
    scenario_4_stablecoin_seekers()?;
    scenario_5_collateral_funding()?;

    println!("\nAll simulations completed successfully.");
    Ok(())
}

fn gbm(n_periods: usize, mu: f64, sigma: f64, seed: u64) -> Result<PriceSeries, SimulationError> {
    let params = GbmParams {
        s0: 10.0,
        mu,
        sigma,
        dt: 1.0,
        n_periods,
    };
    Ok(GbmPriceFeed::new(params, Some(seed)).price_series()?)
}

fn print_summary(result: &RunResult) {
    let ledger = &result.ledger;
    let Some(last) = ledger.last() else {
        println!("  Empty ledger\n");
        return;
    };

    let funding_net: Quote = ledger.rows().iter().map(|r| r.signed_funding()).sum();
    let bull = ledger.rows().iter().filter(|r| r.regime.is_bull()).count();

    println!("  Periods: {} ({} bull, {} bear)", ledger.len(), bull, ledger.len() - bull);
    println!("  Final price: ${}", last.price);
    println!("  Treasury: ${}", result.final_treasury());
    println!("  Fee income: ${}", ledger.total_fee_income());
    println!("  Net funding to fund: ${}", funding_net);
    println!("  Liquidations: {}", ledger.total_liquidations());
    println!("  Open positions: {} (exposure ${}, position ${})", result.open_positions, last.la_exposure, last.la_position);
    if let Some(supply) = result.stablecoin_supply {
        println!("  Stablecoin supply: {}", supply.round_dp(2));
    }
    match result.outcome {
        RunOutcome::Completed => println!("  Outcome: solvent\n"),
        RunOutcome::Insolvent { period, timestamp, kind } => {
            println!("  Outcome: insolvent at period {} ({}): {}\n", period, timestamp, kind)
        }
    }
}

/// User supplied config over a month of hourly GBM prices.
fn scenario_from_config(config: SimulationConfig) -> Result<(), SimulationError> {
    let series = gbm(24 * 30, 0.0, 0.02, config.engine.seed.unwrap_or(1))?;
    let result = Simulation::new(config)?.run(&series)?;
    print_summary(&result);
    Ok(())
}

/// Flat price, no fees, no funding. The treasury must not move.
fn scenario_1_flat_market() -> Result<(), SimulationError> {
    println!("Scenario 1: Flat Market, Quiet Protocol\n");

    let start = Timestamp::from_ymd(2020, 1, 1).unwrap_or(Timestamp::from_millis(0));
    let mut feed = StaticPriceFeed::from_prices("flat", start, leverage_sim::price_feed::HOUR_MS, &[dec!(10); 5]);
    let series = feed.price_series()?;

    let result = Simulation::new(SimulationConfig::quiet().with_seed(1))?.run(&series)?;
    println!("  Initial fund: ${}", SimulationConfig::quiet().protocol.initial_insurance_fund);
    print_summary(&result);
    Ok(())
}

/// Default protocol over a month of driftless hourly prices.
fn scenario_2_random_walk() -> Result<(), SimulationError> {
    println!("Scenario 2: Random Walk, Default Protocol\n");

    let config = SimulationConfig::default().with_seed(42);
    let size = &config.agents.position_size_gamma;
    println!(
        "  {} positions per period, mean size ${:.0}, mean leverage {}x",
        config.agents.positions_per_period,
        size.mean(),
        config.agents.leverage_poisson_lambda
    );
    println!(
        "  Fees {} in / {} out, funding {} to fund / {} to LAs\n",
        config.protocol.entry_fee_bps,
        config.protocol.exit_fee_bps,
        config.protocol.funding_rate_to_if_bps,
        config.protocol.funding_rate_to_la_bps
    );

    let series = gbm(24 * 30, 0.0, 0.02, 7)?;
    let result = Simulation::new(config)?.run(&series)?;
    print_summary(&result);
    Ok(())
}

/// Steady decline: the fund pays funding every period and LAs get liquidated.
fn scenario_3_crash() -> Result<(), SimulationError> {
    println!("Scenario 3: Crash, Small Fund, Halt on Insolvency\n");

    let mut config = SimulationConfig::default().with_seed(3);
    config.protocol.initial_insurance_fund = dec!(10_000);
    config.protocol.funding_rate_to_la_bps = Bps::new(500);
    config.engine.insolvency_policy = InsolvencyPolicy::Halt;

    let series = gbm(24 * 14, -0.01, 0.03, 3)?;
    let result = Simulation::new(config)?.run(&series)?;
    print_summary(&result);
    Ok(())
}

/// Stablecoin mint/burn fees on top of LA trading fees.
fn scenario_4_stablecoin_seekers() -> Result<(), SimulationError> {
    println!("Scenario 4: Stablecoin Seekers\n");

    let config = SimulationConfig::with_stablecoin_seekers().with_seed(11);
    let series = gbm(24 * 7, 0.0, 0.01, 11)?;

    // first day through a json lines sink
    let first_day = PriceSeries::new(series.points()[..24.min(series.len())].to_vec())?;
    let mut sink = JsonLinesSink::new(io::sink());
    Simulation::new(config.clone())?.run_with_sink(&first_day, &mut sink)?;
    println!("  Streamed {} rows for the first day", sink.written());

    let result = Simulation::new(config)?.run(&series)?;
    let fees: Quote = result
        .ledger
        .rows()
        .iter()
        .map(|r| r.mint_fee_income.add(r.burn_fee_income))
        .sum();
    println!("  Mint/burn fee income: ${}", fees);
    print_summary(&result);
    Ok(())
}

/// Funding moves through position collateral instead of LA wallets.
fn scenario_5_collateral_funding() -> Result<(), SimulationError> {
    println!("Scenario 5: Funding Against Position Collateral\n");

    let mut config = SimulationConfig::default().with_seed(5);
    config.protocol.funding_rate_to_if_bps = Bps::new(200);
    config.engine.funding_settlement = FundingSettlement::DebitCollateral;

    let series = gbm(24 * 7, 0.002, 0.01, 5)?;
    let result = Simulation::new(config)?.run(&series)?;
    print_summary(&result);
    Ok(())
}
