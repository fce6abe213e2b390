use crate::domain::record::{Metric, ScoredRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnomalySummary {
    pub total_records: usize,
    pub spend_anomalies: usize,
    pub roas_anomalies: usize,
    pub ctr_anomalies: usize,
    /// Distinct platforms with at least one flag on any metric.
    pub platforms_affected: usize,
    /// Distinct (platform, campaign) pairs with at least one flag on any metric.
    pub campaigns_affected: usize,
}

impl AnomalySummary {
    pub fn from_records(records: &[ScoredRecord]) -> Self {
        let mut platforms = BTreeSet::new();
        let mut campaigns = BTreeSet::new();
        for r in records.iter().filter(|r| r.any_flagged()) {
            platforms.insert(r.record.platform.as_str());
            campaigns.insert((r.record.platform.as_str(), r.record.campaign_name.as_str()));
        }

        Self {
            total_records: records.len(),
            spend_anomalies: count_flagged(records, Metric::Spend),
            roas_anomalies: count_flagged(records, Metric::Roas),
            ctr_anomalies: count_flagged(records, Metric::Ctr),
            platforms_affected: platforms.len(),
            campaigns_affected: campaigns.len(),
        }
    }

    pub fn anomalies(&self, metric: Metric) -> usize {
        match metric {
            Metric::Spend => self.spend_anomalies,
            Metric::Roas => self.roas_anomalies,
            Metric::Ctr => self.ctr_anomalies,
        }
    }

    /// Flags summed across metrics; a record flagged on two metrics counts twice.
    pub fn total_anomalies(&self) -> usize {
        Metric::ALL.into_iter().map(|m| self.anomalies(m)).sum()
    }
}

fn count_flagged(records: &[ScoredRecord], metric: Metric) -> usize {
    records.iter().filter(|r| r.is_flagged(metric)).count()
}
