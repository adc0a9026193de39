// 7.0 config.rs: all settings in one place. fees, funding rates, agent behaviour, engine policy.
// 7.1 ProtocolParams has fee and funding rates in bps. no fee tiers.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::engine::EngineConfig;
use crate::types::Bps;

// funding rates are per period; anything above 100% would pay out more than the base
pub const MAX_FUNDING_RATE_BPS: i32 = 10_000;

/** 7.1: protocol side. fee and funding rates, starting fund, LA exit appetite */
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolParams {
    // Fee charged on notional when a position opens
    pub entry_fee_bps: Bps,
    // Fee charged on notional when a position closes (any reason)
    pub exit_fee_bps: Bps,
    // Rate the insurance fund pays LAs in a bear period
    pub funding_rate_to_la_bps: Bps,
    // Rate LAs pay the insurance fund in a bull period
    pub funding_rate_to_if_bps: Bps,
    // Insurance fund balance before the first period
    pub initial_insurance_fund: Decimal,
    // Per period chance an LA in profit closes
    pub take_profit_chance: f64,
    // Per period chance an LA in loss closes
    pub take_loss_chance: f64,
}

impl Default for ProtocolParams {
    fn default() -> Self {
        Self {
            entry_fee_bps: Bps::new(30),  // 0.3%
            exit_fee_bps: Bps::new(30),   // 0.3%
            funding_rate_to_la_bps: Bps::new(5),
            funding_rate_to_if_bps: Bps::new(10),
            initial_insurance_fund: dec!(1_000_000),
            take_profit_chance: 0.05,
            take_loss_chance: 0.05,
        }
    }
}

// Gamma(shape, scale)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GammaParams {
    pub shape: f64,
    pub scale: f64,
}

impl GammaParams {
    pub fn new(shape: f64, scale: f64) -> Self {
        Self { shape, scale }
    }

    pub fn mean(&self) -> f64 {
        self.shape * self.scale
    }

    fn is_valid(&self) -> bool {
        self.shape.is_finite() && self.scale.is_finite() && self.shape > 0.0 && self.scale > 0.0
    }
}

/** 7.2: leverage agent arrivals. how many, how big, how levered */
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeverageAgentParams {
    // New positions opened every period
    pub positions_per_period: usize,
    // Position size in quote currency before conversion to units
    pub position_size_gamma: GammaParams,
    // Poisson mean of the leverage multiplier
    pub leverage_poisson_lambda: f64,
}

impl Default for LeverageAgentParams {
    fn default() -> Self {
        Self {
            positions_per_period: 10,
            position_size_gamma: GammaParams::new(2.0, 5_000.0), // mean $10k
            leverage_poisson_lambda: 5.0,
        }
    }
}

/** 7.3: stablecoin seekers. mint and burn flow that pays fees into the fund */
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StableCoinSeekerParams {
    // Minted amount per period, in quote currency
    pub mint_gamma: GammaParams,
    // Fraction of current supply burned per period (capped at 1)
    pub burn_gamma: GammaParams,
    pub mint_fee_bps: Bps,
    pub burn_fee_bps: Bps,
    pub initial_supply: Decimal,
}

impl Default for StableCoinSeekerParams {
    fn default() -> Self {
        Self {
            mint_gamma: GammaParams::new(2.0, 10_000.0),
            burn_gamma: GammaParams::new(1.0, 0.01), // ~1% of supply
            mint_fee_bps: Bps::new(10),
            burn_fee_bps: Bps::new(10),
            initial_supply: dec!(1_000_000),
        }
    }
}

// The complete simulation configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub protocol: ProtocolParams,
    pub agents: LeverageAgentParams,
    // Stablecoin seeker flow, off unless configured
    #[serde(default)]
    pub stablecoin: Option<StableCoinSeekerParams>,
    #[serde(default)]
    pub engine: EngineConfig,
}

impl SimulationConfig {
    // No fees, no funding, no agents. the fund should never move.
    pub fn quiet() -> Self {
        let mut config = Self::default();
        config.protocol.entry_fee_bps = Bps::zero();
        config.protocol.exit_fee_bps = Bps::zero();
        config.protocol.funding_rate_to_la_bps = Bps::zero();
        config.protocol.funding_rate_to_if_bps = Bps::zero();
        config.protocol.take_profit_chance = 0.0;
        config.protocol.take_loss_chance = 0.0;
        config.agents.positions_per_period = 0;
        config
    }

    // Default protocol plus the stablecoin seeker flow
    pub fn with_stablecoin_seekers() -> Self {
        Self {
            stablecoin: Some(StableCoinSeekerParams::default()),
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.engine.seed = Some(seed);
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    // Validate the configuration for internal consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.protocol;

        // fee checks. fees are income only
        if p.entry_fee_bps.value() < 0 || p.exit_fee_bps.value() < 0 {
            return Err(ConfigError::InvalidFees {
                reason: "Entry and exit fees must be non-negative".to_string(),
            });
        }

        // funding checks
        for rate in [p.funding_rate_to_la_bps, p.funding_rate_to_if_bps] {
            if rate.value() < 0 || rate.value() > MAX_FUNDING_RATE_BPS {
                return Err(ConfigError::InvalidFunding {
                    reason: format!("Funding rate {} outside 0..={}bps", rate, MAX_FUNDING_RATE_BPS),
                });
            }
        }

        if p.initial_insurance_fund < Decimal::ZERO {
            return Err(ConfigError::InvalidProtocol {
                reason: "Initial insurance fund must be non-negative".to_string(),
            });
        }

        for (name, chance) in [("take_profit_chance", p.take_profit_chance), ("take_loss_chance", p.take_loss_chance)] {
            if !(0.0..=1.0).contains(&chance) {
                return Err(ConfigError::InvalidProtocol {
                    reason: format!("{} must be within [0, 1], got {}", name, chance),
                });
            }
        }

        // agent checks
        if !self.agents.position_size_gamma.is_valid() {
            return Err(ConfigError::InvalidAgents {
                reason: "Position size gamma needs positive shape and scale".to_string(),
            });
        }

        let lambda = self.agents.leverage_poisson_lambda;
        if !(lambda.is_finite() && lambda > 0.0) {
            return Err(ConfigError::InvalidAgents {
                reason: format!("Leverage poisson lambda must be positive, got {}", lambda),
            });
        }

        // stablecoin checks
        if let Some(sc) = &self.stablecoin {
            if !sc.mint_gamma.is_valid() || !sc.burn_gamma.is_valid() {
                return Err(ConfigError::InvalidStablecoin {
                    reason: "Mint and burn gammas need positive shape and scale".to_string(),
                });
            }
            if sc.mint_fee_bps.value() < 0 || sc.burn_fee_bps.value() < 0 {
                return Err(ConfigError::InvalidStablecoin {
                    reason: "Mint and burn fees must be non-negative".to_string(),
                });
            }
            if sc.initial_supply < Decimal::ZERO {
                return Err(ConfigError::InvalidStablecoin {
                    reason: "Initial stablecoin supply must be non-negative".to_string(),
                });
            }
        }

        Ok(())
    }
}

// Configuration validation and loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid fees: {reason}")]
    InvalidFees { reason: String },

    #[error("Invalid funding: {reason}")]
    InvalidFunding { reason: String },

    #[error("Invalid protocol params: {reason}")]
    InvalidProtocol { reason: String },

    #[error("Invalid agent params: {reason}")]
    InvalidAgents { reason: String },

    #[error("Invalid stablecoin params: {reason}")]
    InvalidStablecoin { reason: String },

    #[error("Could not read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not parse config: {0}")]
    Parse(#[from] serde_json::Error),
}
