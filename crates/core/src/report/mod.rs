pub mod details;
pub mod summary;

use crate::config::ScanConfig;
use crate::domain::recommendation::Recommendation;
use crate::insights::Insight;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub use details::{anomaly_details, AnomalyDetail, AnomalyDetails, AnomalyFilter};
pub use summary::AnomalySummary;

/// Everything one analysis run produced apart from the annotated records themselves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: uuid::Uuid,
    pub generated_at: DateTime<Utc>,
    /// Newest record date in the batch; `None` for an empty batch.
    pub as_of_date: Option<NaiveDate>,
    pub config: ScanConfig,
    pub summary: AnomalySummary,
    pub recommendations: Vec<Recommendation>,
    pub anomalies: AnomalyDetails,
    pub insights: Vec<Insight>,
    pub executive_summary: String,
}
