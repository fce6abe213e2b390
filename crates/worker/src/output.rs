use adwatch_core::pipeline::Analysis;
use adwatch_core::report::RunReport;
use anyhow::Context;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const ANNOTATED_CSV: &str = "unified_ad_data_with_anomalies.csv";
pub const REPORT_JSON: &str = "anomaly_report.json";

#[derive(Debug)]
pub struct Written {
    pub annotated_csv: PathBuf,
    pub report_json: PathBuf,
}

pub fn write_outputs(dir: &Path, analysis: &Analysis) -> anyhow::Result<Written> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output dir {}", dir.display()))?;

    let annotated_csv = dir.join(ANNOTATED_CSV);
    adwatch_core::ingest::write_scored_to_path(&annotated_csv, &analysis.scored)?;

    let report_json = dir.join(REPORT_JSON);
    let file = File::create(&report_json)
        .with_context(|| format!("failed to create {}", report_json.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &analysis.report)
        .with_context(|| format!("failed to write {}", report_json.display()))?;
    writer
        .flush()
        .with_context(|| format!("failed to flush {}", report_json.display()))?;

    Ok(Written {
        annotated_csv,
        report_json,
    })
}

pub fn log_report(report: &RunReport) {
    let s = &report.summary;
    tracing::info!(
        run_id = %report.run_id,
        as_of_date = ?report.as_of_date,
        total_records = s.total_records,
        spend_anomalies = s.spend_anomalies,
        roas_anomalies = s.roas_anomalies,
        ctr_anomalies = s.ctr_anomalies,
        platforms_affected = s.platforms_affected,
        campaigns_affected = s.campaigns_affected,
        "anomaly summary"
    );

    for rec in &report.recommendations {
        tracing::info!(
            platform = %rec.platform,
            campaign = %rec.campaign,
            action = %rec.recommendation,
            change_pct = rec.suggested_change * 100.0,
            confidence = %rec.confidence,
            current_spend = rec.current_spend,
            current_roas = rec.current_roas,
            reason = %rec.reason,
            "budget recommendation"
        );
    }

    if report.anomalies.total_anomalies > 0 {
        tracing::debug!(
            listed = report.anomalies.total_anomalies,
            platform = ?report.anomalies.filters_applied.platform,
            metric = ?report.anomalies.filters_applied.metric,
            "anomaly details"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adwatch_core::config::ScanConfig;
    use adwatch_core::domain::record::UnifiedRecord;
    use adwatch_core::report::AnomalyFilter;
    use chrono::{NaiveDate, TimeZone, Utc};

    #[test]
    fn writes_annotated_csv_and_report() {
        let records: Vec<UnifiedRecord> = (1..=3)
            .map(|day| UnifiedRecord {
                date: NaiveDate::from_ymd_opt(2024, 8, day).unwrap(),
                platform: "Google Ads".to_string(),
                campaign_id: Some("G-1".to_string()),
                campaign_name: "Google_Campaign_1".to_string(),
                impressions: 1000,
                clicks: 20,
                spend: 50.0,
                conversions: 1,
                revenue: 100.0,
                roas: 2.0,
                ctr: 0.02,
            })
            .collect();
        let generated_at = Utc.with_ymd_and_hms(2024, 8, 4, 0, 0, 0).unwrap();
        let analysis = adwatch_core::pipeline::analyze(
            &records,
            &ScanConfig::default(),
            &AnomalyFilter::default(),
            generated_at,
        );

        let dir = tempfile::tempdir().unwrap();
        let out_dir = dir.path().join("nested");
        let written = write_outputs(&out_dir, &analysis).unwrap();

        let csv = std::fs::read_to_string(&written.annotated_csv).unwrap();
        assert_eq!(csv.lines().count(), 4);

        let report: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&written.report_json).unwrap()).unwrap();
        assert_eq!(report["summary"]["total_records"], serde_json::json!(3));
        assert_eq!(report["as_of_date"], serde_json::json!("2024-08-03"));
        assert_eq!(report["recommendations"], serde_json::json!([]));
    }
}
