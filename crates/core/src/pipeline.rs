use crate::config::ScanConfig;
use crate::detect::RollingAnomalyScanner;
use crate::domain::record::{ScoredRecord, UnifiedRecord};
use crate::insights;
use crate::recommend::RecommendationEngine;
use crate::report::{anomaly_details, AnomalyFilter, AnomalySummary, RunReport};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct Analysis {
    pub scored: Vec<ScoredRecord>,
    pub report: RunReport,
}

/// One full batch run: scan, recommend, summarize, explain.
///
/// `filter` only narrows the anomaly detail listing; summary and recommendations always
/// cover the whole batch.
pub fn analyze(
    records: &[UnifiedRecord],
    config: &ScanConfig,
    filter: &AnomalyFilter,
    generated_at: DateTime<Utc>,
) -> Analysis {
    let scored = RollingAnomalyScanner::new(config).scan(records);
    let recommendations = RecommendationEngine::default().recommend(&scored);
    let summary = AnomalySummary::from_records(&scored);
    let anomalies = anomaly_details(&scored, filter);

    let all_insights = insights::anomaly_insights(&summary, &recommendations);
    let insights = match filter.platform.as_deref() {
        Some(platform) => insights::insights_for_platform(&all_insights, platform)
            .into_iter()
            .cloned()
            .collect(),
        None => all_insights,
    };
    let executive_summary = insights::executive_summary(&insights);

    tracing::info!(
        records = summary.total_records,
        spend_anomalies = summary.spend_anomalies,
        roas_anomalies = summary.roas_anomalies,
        ctr_anomalies = summary.ctr_anomalies,
        recommendations = recommendations.len(),
        "analysis complete"
    );

    let report = RunReport {
        run_id: uuid::Uuid::new_v4(),
        generated_at,
        as_of_date: records.iter().map(|r| r.date).max(),
        config: config.clone(),
        summary,
        recommendations,
        anomalies,
        insights,
        executive_summary,
    };

    Analysis { scored, report }
}
