//! Runner configuration options.

use crate::funding::FundingSettlement;
use serde::{Deserialize, Serialize};

/// What the runner does once a period ends insolvent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsolvencyPolicy {
    /// Keep going. every row is emitted and insolvent ones are flagged.
    #[default]
    RunToEnd,
    /// The first insolvent row is the last row.
    Halt,
}

/// Runner configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Seed for the agent random stream. `None` seeds from entropy.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub insolvency_policy: InsolvencyPolicy,
    #[serde(default)]
    pub funding_settlement: FundingSettlement,
}
