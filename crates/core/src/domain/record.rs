use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Grouping key for every rolling statistic: one campaign on one platform.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Entity {
    pub platform: String,
    pub campaign_name: String,
}

impl Entity {
    pub fn new(platform: impl Into<String>, campaign_name: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            campaign_name: campaign_name.into(),
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.platform, self.campaign_name)
    }
}

/// One day of performance for one campaign, already mapped to the common schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedRecord {
    pub date: NaiveDate,
    pub platform: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campaign_id: Option<String>,
    pub campaign_name: String,
    pub impressions: u64,
    pub clicks: u64,
    pub spend: f64,
    pub conversions: u64,
    pub revenue: f64,
    pub roas: f64,
    pub ctr: f64,
}

impl UnifiedRecord {
    pub fn entity(&self) -> Entity {
        Entity::new(self.platform.as_str(), self.campaign_name.as_str())
    }
}

/// Metrics the scanner watches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Spend,
    Roas,
    Ctr,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Spend, Metric::Roas, Metric::Ctr];

    pub fn as_str(self) -> &'static str {
        match self {
            Metric::Spend => "spend",
            Metric::Roas => "roas",
            Metric::Ctr => "ctr",
        }
    }

    pub fn value(self, record: &UnifiedRecord) -> f64 {
        match self {
            Metric::Spend => record.spend,
            Metric::Roas => record.roas,
            Metric::Ctr => record.ctr,
        }
    }

    /// Ratio metrics are only scored over windows that saw some activity.
    pub fn requires_active_window(self) -> bool {
        matches!(self, Metric::Roas | Metric::Ctr)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "spend" => Ok(Metric::Spend),
            "roas" => Ok(Metric::Roas),
            "ctr" => Ok(Metric::Ctr),
            other => anyhow::bail!("unknown metric: {other} (expected spend, roas or ctr)"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MetricScore {
    pub score: f64,
    pub flagged: bool,
}

/// A record annotated with one robust z-score and flag per watched metric.
///
/// Unscored metrics keep `0.0`/`false`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRecord {
    #[serde(flatten)]
    pub record: UnifiedRecord,
    pub spend_anomaly_score: f64,
    pub spend_anomaly: bool,
    pub roas_anomaly_score: f64,
    pub roas_anomaly: bool,
    pub ctr_anomaly_score: f64,
    pub ctr_anomaly: bool,
}

impl ScoredRecord {
    pub fn unscored(record: UnifiedRecord) -> Self {
        Self {
            record,
            spend_anomaly_score: 0.0,
            spend_anomaly: false,
            roas_anomaly_score: 0.0,
            roas_anomaly: false,
            ctr_anomaly_score: 0.0,
            ctr_anomaly: false,
        }
    }

    pub fn with_metric(mut self, metric: Metric, score: MetricScore) -> Self {
        match metric {
            Metric::Spend => {
                self.spend_anomaly_score = score.score;
                self.spend_anomaly = score.flagged;
            }
            Metric::Roas => {
                self.roas_anomaly_score = score.score;
                self.roas_anomaly = score.flagged;
            }
            Metric::Ctr => {
                self.ctr_anomaly_score = score.score;
                self.ctr_anomaly = score.flagged;
            }
        }
        self
    }

    pub fn metric(&self, metric: Metric) -> MetricScore {
        match metric {
            Metric::Spend => MetricScore {
                score: self.spend_anomaly_score,
                flagged: self.spend_anomaly,
            },
            Metric::Roas => MetricScore {
                score: self.roas_anomaly_score,
                flagged: self.roas_anomaly,
            },
            Metric::Ctr => MetricScore {
                score: self.ctr_anomaly_score,
                flagged: self.ctr_anomaly,
            },
        }
    }

    pub fn is_flagged(&self, metric: Metric) -> bool {
        self.metric(metric).flagged
    }

    pub fn any_flagged(&self) -> bool {
        self.spend_anomaly || self.roas_anomaly || self.ctr_anomaly
    }

    pub fn entity(&self) -> Entity {
        self.record.entity()
    }
}

/// Groups positions of `items` by entity, keeping input order inside each group.
///
/// Groups iterate in entity key order (platform, then campaign name).
pub fn group_by_entity<T>(
    items: &[T],
    entity_of: impl Fn(&T) -> Entity,
) -> BTreeMap<Entity, Vec<usize>> {
    let mut out: BTreeMap<Entity, Vec<usize>> = BTreeMap::new();
    for (idx, item) in items.iter().enumerate() {
        out.entry(entity_of(item)).or_default().push(idx);
    }
    out
}
