//! Human-readable findings distilled from the anomaly summary and recommendations.

use crate::domain::recommendation::{BudgetAction, Confidence, Recommendation};
use crate::report::AnomalySummary;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Platform marker for insights that span several platforms.
pub const MULTIPLE_PLATFORMS: &str = "multiple";

const NO_INSIGHTS: &str = "No significant insights found in the current data.";
const TOP_CRITICAL: usize = 3;
const TOP_OPPORTUNITIES: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    AnomalyDetection,
    Recommendations,
    CreativeReview,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    #[serde(rename = "type")]
    pub kind: InsightKind,
    pub priority: Priority,
    pub title: String,
    pub description: String,
    pub metric: String,
    pub value: f64,
    pub platform: String,
}

pub fn anomaly_insights(
    summary: &AnomalySummary,
    recommendations: &[Recommendation],
) -> Vec<Insight> {
    let mut out = Vec::new();

    let total = summary.total_anomalies();
    if total > 0 {
        out.push(Insight {
            kind: InsightKind::AnomalyDetection,
            priority: Priority::High,
            title: format!("{total} Performance Anomalies Detected"),
            description: format!(
                "Detected {} spend, {} ROAS, and {} CTR anomalies across {} campaigns.",
                summary.spend_anomalies,
                summary.roas_anomalies,
                summary.ctr_anomalies,
                summary.campaigns_affected
            ),
            metric: "anomaly_count".to_string(),
            value: total as f64,
            platform: MULTIPLE_PLATFORMS.to_string(),
        });
    }

    let high: Vec<&Recommendation> = recommendations
        .iter()
        .filter(|r| r.confidence == Confidence::High)
        .collect();
    if !high.is_empty() {
        let increases = count_action(&high, BudgetAction::IncreaseBudget);
        let decreases = count_action(&high, BudgetAction::DecreaseBudget);
        out.push(Insight {
            kind: InsightKind::Recommendations,
            priority: Priority::High,
            title: format!("{} High-Confidence Budget Recommendations", high.len()),
            description: format!(
                "Anomaly analysis suggests {} budget adjustments with high confidence \
                 ({increases} increase, {decreases} decrease).",
                high.len()
            ),
            metric: "recommendations".to_string(),
            value: high.len() as f64,
            platform: MULTIPLE_PLATFORMS.to_string(),
        });
    }

    let mut creative_by_platform: BTreeMap<&str, usize> = BTreeMap::new();
    for r in recommendations
        .iter()
        .filter(|r| r.recommendation == BudgetAction::ReviewCreative)
    {
        *creative_by_platform.entry(r.platform.as_str()).or_default() += 1;
    }
    for (platform, n) in creative_by_platform {
        out.push(Insight {
            kind: InsightKind::CreativeReview,
            priority: Priority::Medium,
            title: format!("Creative Review: {platform}"),
            description: format!(
                "{n} campaign(s) on {platform} show a significant CTR drop. \
                 Consider refreshing ad creative."
            ),
            metric: "ctr".to_string(),
            value: n as f64,
            platform: platform.to_string(),
        });
    }

    out
}

/// Insights that concern `platform`, including cross-platform ones.
pub fn insights_for_platform<'a>(insights: &'a [Insight], platform: &str) -> Vec<&'a Insight> {
    insights
        .iter()
        .filter(|i| i.platform == platform || i.platform == MULTIPLE_PLATFORMS)
        .collect()
}

pub fn executive_summary(insights: &[Insight]) -> String {
    if insights.is_empty() {
        return NO_INSIGHTS.to_string();
    }

    let high: Vec<&Insight> = insights
        .iter()
        .filter(|i| i.priority == Priority::High)
        .collect();
    let medium: Vec<&Insight> = insights
        .iter()
        .filter(|i| i.priority == Priority::Medium)
        .collect();

    let mut lines: Vec<String> = Vec::new();

    if !high.is_empty() {
        lines.push(format!("Critical Findings ({}):", high.len()));
        for i in high.iter().take(TOP_CRITICAL) {
            lines.push(format!("- {}: {}", i.title, i.description));
        }
    }

    if !medium.is_empty() {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push(format!("Key Opportunities ({}):", medium.len()));
        for i in medium.iter().take(TOP_OPPORTUNITIES) {
            lines.push(format!("- {}: {}", i.title, i.description));
        }
    }

    lines.push(String::new());
    lines.push(format!(
        "Recommendation: Focus on addressing the {} critical findings first, \
         then explore the identified opportunities for optimization.",
        high.len()
    ));

    lines.join("\n")
}

fn count_action(recs: &[&Recommendation], action: BudgetAction) -> usize {
    recs.iter().filter(|r| r.recommendation == action).count()
}
