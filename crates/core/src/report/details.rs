use crate::domain::record::{Metric, ScoredRecord};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnomalyFilter {
    pub platform: Option<String>,
    #[serde(rename = "anomaly_type")]
    pub metric: Option<Metric>,
}

impl AnomalyFilter {
    fn admits(&self, r: &ScoredRecord) -> bool {
        if let Some(platform) = &self.platform {
            if &r.record.platform != platform {
                return false;
            }
        }

        match self.metric {
            Some(metric) => r.is_flagged(metric),
            None => r.any_flagged(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyDetail {
    pub date: NaiveDate,
    pub platform: String,
    pub campaign_name: String,
    pub spend: f64,
    pub roas: f64,
    pub ctr: f64,
    pub spend_anomaly_score: f64,
    pub roas_anomaly_score: f64,
    pub ctr_anomaly_score: f64,
}

impl From<&ScoredRecord> for AnomalyDetail {
    fn from(r: &ScoredRecord) -> Self {
        Self {
            date: r.record.date,
            platform: r.record.platform.clone(),
            campaign_name: r.record.campaign_name.clone(),
            spend: r.record.spend,
            roas: r.record.roas,
            ctr: r.record.ctr,
            spend_anomaly_score: r.spend_anomaly_score,
            roas_anomaly_score: r.roas_anomaly_score,
            ctr_anomaly_score: r.ctr_anomaly_score,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyDetails {
    pub anomalies: Vec<AnomalyDetail>,
    pub total_anomalies: usize,
    pub filters_applied: AnomalyFilter,
}

/// Flagged records matching `filter`, in input order.
pub fn anomaly_details(records: &[ScoredRecord], filter: &AnomalyFilter) -> AnomalyDetails {
    let anomalies: Vec<AnomalyDetail> = records
        .iter()
        .filter(|r| filter.admits(r))
        .map(AnomalyDetail::from)
        .collect();

    AnomalyDetails {
        total_anomalies: anomalies.len(),
        anomalies,
        filters_applied: filter.clone(),
    }
}
