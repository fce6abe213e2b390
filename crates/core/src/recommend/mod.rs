//! Budget recommendations from each campaign's most recent scored day.

pub mod rules;

use crate::domain::recommendation::Recommendation;
use crate::domain::record::{Entity, ScoredRecord};
use chrono::Duration;
use std::collections::BTreeMap;

/// Days, counted back from the newest date in the batch (inclusive), a campaign's latest
/// record must fall within to be considered.
pub const DEFAULT_LOOKBACK_DAYS: i64 = 7;

#[derive(Debug, Clone)]
pub struct RecommendationEngine {
    lookback_days: i64,
}

impl Default for RecommendationEngine {
    fn default() -> Self {
        Self {
            lookback_days: DEFAULT_LOOKBACK_DAYS,
        }
    }
}

impl RecommendationEngine {
    /// At most one recommendation per campaign, in entity order.
    pub fn recommend(&self, records: &[ScoredRecord]) -> Vec<Recommendation> {
        let latest = self.latest_per_entity(records);

        let out: Vec<Recommendation> = latest.values().filter_map(|r| evaluate(r)).collect();

        tracing::debug!(
            entities = latest.len(),
            recommendations = out.len(),
            "recommendation pass complete"
        );

        out
    }

    /// Chronologically last record per entity among records dated within the lookback
    /// window of the batch's newest date. Same-day ties go to the later input row.
    pub fn latest_per_entity<'r>(
        &self,
        records: &'r [ScoredRecord],
    ) -> BTreeMap<Entity, &'r ScoredRecord> {
        let mut out: BTreeMap<Entity, &'r ScoredRecord> = BTreeMap::new();

        let Some(max_date) = records.iter().map(|r| r.record.date).max() else {
            return out;
        };
        let cutoff = max_date - Duration::days(self.lookback_days - 1);

        for r in records.iter().filter(|r| r.record.date >= cutoff) {
            out.entry(r.entity())
                .and_modify(|cur| {
                    if r.record.date >= cur.record.date {
                        *cur = r;
                    }
                })
                .or_insert(r);
        }

        out
    }
}

/// Runs the rule cascade against one campaign's latest record.
pub fn evaluate(latest: &ScoredRecord) -> Option<Recommendation> {
    rules::first_match(latest).map(|rule| rule.apply(latest))
}
