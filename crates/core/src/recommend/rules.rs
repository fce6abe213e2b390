use crate::domain::recommendation::{BudgetAction, Confidence, Recommendation};
use crate::domain::record::ScoredRecord;

/// Spend z-scores below this magnitude count as "stable" for the ROAS-surge rule.
pub const STABLE_SPEND_MAX_ABS_Z: f64 = 1.0;

/// CTR collapse bound. Checked on top of the scan flag, so with a scan threshold of 2 or
/// more it adds nothing; it starts to filter once the threshold is configured lower.
pub const CTR_COLLAPSE_Z: f64 = -2.0;

/// One guard → condition → outcome step of the cascade.
///
/// The first rule whose guard holds owns the record: it either recommends (condition holds)
/// or ends the cascade with nothing. Later rules are not consulted.
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub action: BudgetAction,
    pub suggested_change: f64,
    pub confidence: Confidence,
    guard: fn(&ScoredRecord) -> bool,
    condition: fn(&ScoredRecord) -> bool,
    reason: fn(&ScoredRecord) -> String,
}

/// Evaluated top to bottom; the first rule whose guard holds decides.
pub static RULES: [Rule; 3] = [
    Rule {
        action: BudgetAction::DecreaseBudget,
        suggested_change: -0.20,
        confidence: Confidence::High,
        guard: spend_spiked,
        condition: roas_dropped,
        reason: spend_spike_reason,
    },
    Rule {
        action: BudgetAction::IncreaseBudget,
        suggested_change: 0.20,
        confidence: Confidence::High,
        guard: roas_surged,
        condition: spend_stable,
        reason: roas_surge_reason,
    },
    Rule {
        action: BudgetAction::ReviewCreative,
        suggested_change: 0.0,
        confidence: Confidence::Medium,
        guard: ctr_collapsed,
        condition: always,
        reason: ctr_collapse_reason,
    },
];

impl Rule {
    pub fn claims(&self, latest: &ScoredRecord) -> bool {
        (self.guard)(latest)
    }

    pub fn matches(&self, latest: &ScoredRecord) -> bool {
        self.claims(latest) && (self.condition)(latest)
    }

    pub fn apply(&self, latest: &ScoredRecord) -> Recommendation {
        Recommendation {
            platform: latest.record.platform.clone(),
            campaign: latest.record.campaign_name.clone(),
            recommendation: self.action,
            suggested_change: self.suggested_change,
            reason: (self.reason)(latest),
            confidence: self.confidence,
            current_spend: latest.record.spend,
            current_roas: latest.record.roas,
        }
    }
}

/// The rule that recommends for `latest`, if any. `None` also covers a record claimed by a
/// rule whose condition fails.
pub fn first_match(latest: &ScoredRecord) -> Option<&'static Rule> {
    let rule = RULES.iter().find(|rule| rule.claims(latest))?;
    rule.matches(latest).then_some(rule)
}

fn spend_spiked(r: &ScoredRecord) -> bool {
    r.spend_anomaly && r.spend_anomaly_score > 0.0
}

fn roas_dropped(r: &ScoredRecord) -> bool {
    r.roas_anomaly && r.roas_anomaly_score < 0.0
}

fn roas_surged(r: &ScoredRecord) -> bool {
    r.roas_anomaly && r.roas_anomaly_score > 0.0
}

fn spend_stable(r: &ScoredRecord) -> bool {
    !r.spend_anomaly || r.spend_anomaly_score.abs() < STABLE_SPEND_MAX_ABS_Z
}

fn ctr_collapsed(r: &ScoredRecord) -> bool {
    r.ctr_anomaly && r.ctr_anomaly_score < CTR_COLLAPSE_Z
}

fn always(_: &ScoredRecord) -> bool {
    true
}

fn spend_spike_reason(r: &ScoredRecord) -> String {
    format!(
        "Spend spike detected (z-score: {:.2}) with poor ROAS performance (z-score: {:.2})",
        r.spend_anomaly_score, r.roas_anomaly_score
    )
}

fn roas_surge_reason(r: &ScoredRecord) -> String {
    format!(
        "ROAS surge detected (z-score: {:.2}) with stable spending",
        r.roas_anomaly_score
    )
}

fn ctr_collapse_reason(r: &ScoredRecord) -> String {
    format!(
        "Significant CTR drop detected (z-score: {:.2}). Consider refreshing ad creative.",
        r.ctr_anomaly_score
    )
}
