use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BudgetAction {
    IncreaseBudget,
    DecreaseBudget,
    ReviewCreative,
}

impl BudgetAction {
    pub fn as_str(self) -> &'static str {
        match self {
            BudgetAction::IncreaseBudget => "INCREASE_BUDGET",
            BudgetAction::DecreaseBudget => "DECREASE_BUDGET",
            BudgetAction::ReviewCreative => "REVIEW_CREATIVE",
        }
    }
}

impl fmt::Display for BudgetAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Confidence {
    High,
    Medium,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::High => f.write_str("HIGH"),
            Confidence::Medium => f.write_str("MEDIUM"),
        }
    }
}

/// Budget decision for one campaign, derived from its latest scored day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub platform: String,
    pub campaign: String,
    pub recommendation: BudgetAction,
    /// Fractional budget change (`-0.20` means cut by 20%).
    pub suggested_change: f64,
    pub reason: String,
    pub confidence: Confidence,
    pub current_spend: f64,
    pub current_roas: f64,
}
