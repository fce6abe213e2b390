//! CSV reader for the unified dataset and writer for the annotated stream.

use crate::domain::record::{ScoredRecord, UnifiedRecord};
use crate::ingest::types::UnifiedRow;
use anyhow::Context;
use chrono::NaiveDate;
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

pub fn read_records<R: Read>(reader: R) -> anyhow::Result<Vec<UnifiedRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut out = Vec::new();
    for (idx, result) in rdr.deserialize::<UnifiedRow>().enumerate() {
        let row_no = idx + 1;
        let row = result.with_context(|| format!("failed to parse CSV data row {row_no}"))?;
        out.push(row.validate_and_into_record(row_no)?);
    }

    Ok(out)
}

pub fn read_records_from_path(path: &Path) -> anyhow::Result<Vec<UnifiedRecord>> {
    let file =
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let records = read_records(BufReader::new(file))
        .with_context(|| format!("failed to read unified records from {}", path.display()))?;

    tracing::info!(path = %path.display(), records = records.len(), "loaded unified records");
    Ok(records)
}

/// Flat CSV shape of a [`ScoredRecord`]: the input columns then the six anomaly columns.
#[derive(Debug, Serialize)]
struct ScoredRow<'a> {
    date: NaiveDate,
    platform: &'a str,
    campaign_id: Option<&'a str>,
    campaign_name: &'a str,
    impressions: u64,
    clicks: u64,
    spend: f64,
    conversions: u64,
    revenue: f64,
    roas: f64,
    ctr: f64,
    spend_anomaly_score: f64,
    spend_anomaly: bool,
    roas_anomaly_score: f64,
    roas_anomaly: bool,
    ctr_anomaly_score: f64,
    ctr_anomaly: bool,
}

impl<'a> From<&'a ScoredRecord> for ScoredRow<'a> {
    fn from(s: &'a ScoredRecord) -> Self {
        let r = &s.record;
        Self {
            date: r.date,
            platform: &r.platform,
            campaign_id: r.campaign_id.as_deref(),
            campaign_name: &r.campaign_name,
            impressions: r.impressions,
            clicks: r.clicks,
            spend: r.spend,
            conversions: r.conversions,
            revenue: r.revenue,
            roas: r.roas,
            ctr: r.ctr,
            spend_anomaly_score: s.spend_anomaly_score,
            spend_anomaly: s.spend_anomaly,
            roas_anomaly_score: s.roas_anomaly_score,
            roas_anomaly: s.roas_anomaly,
            ctr_anomaly_score: s.ctr_anomaly_score,
            ctr_anomaly: s.ctr_anomaly,
        }
    }
}

pub fn write_scored<W: Write>(writer: W, records: &[ScoredRecord]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for r in records {
        wtr.serialize(ScoredRow::from(r))
            .context("failed to write annotated CSV row")?;
    }
    wtr.flush().context("failed to flush annotated CSV")?;
    Ok(())
}

pub fn write_scored_to_path(path: &Path, records: &[ScoredRecord]) -> anyhow::Result<()> {
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    write_scored(BufWriter::new(file), records)
        .with_context(|| format!("failed to write {}", path.display()))
}
