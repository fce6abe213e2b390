use crate::domain::record::UnifiedRecord;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One row of the unified dataset as it arrives, before type checks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UnifiedRow {
    pub date: Option<String>,
    pub platform: Option<String>,
    pub campaign_id: Option<String>,
    pub campaign_name: Option<String>,
    pub impressions: Option<f64>,
    pub clicks: Option<f64>,
    pub spend: Option<f64>,
    pub conversions: Option<f64>,
    pub revenue: Option<f64>,
    pub roas: Option<f64>,
    pub ctr: Option<f64>,
}

/// A row that violates the record contract. `row` is 1-based over data rows.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordRejected {
    pub row: usize,
    pub field: &'static str,
    pub detail: String,
}

impl fmt::Display for RecordRejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "record rejected (row={}, field={}): {}",
            self.row, self.field, self.detail
        )
    }
}

impl std::error::Error for RecordRejected {}

impl UnifiedRow {
    pub fn validate_and_into_record(self, row: usize) -> Result<UnifiedRecord, RecordRejected> {
        let reject = |field: &'static str, detail: String| RecordRejected { row, field, detail };

        let date_raw = required_text(self.date).ok_or_else(|| reject("date", "missing".into()))?;
        let date = parse_date(&date_raw)
            .ok_or_else(|| reject("date", format!("not a calendar date: {date_raw}")))?;

        let platform =
            required_text(self.platform).ok_or_else(|| reject("platform", "missing".into()))?;
        let campaign_name = required_text(self.campaign_name)
            .ok_or_else(|| reject("campaign_name", "missing".into()))?;

        let amount = |field: &'static str, v: Option<f64>| -> Result<f64, RecordRejected> {
            let v = v.ok_or_else(|| reject(field, "missing".into()))?;
            if !v.is_finite() || v < 0.0 {
                return Err(reject(field, format!("must be a non-negative number (got {v})")));
            }
            Ok(v)
        };

        let count = |field: &'static str, v: Option<f64>| -> Result<u64, RecordRejected> {
            let v = amount(field, v)?;
            if v.fract() != 0.0 {
                return Err(reject(field, format!("must be a whole number (got {v})")));
            }
            if v >= u64::MAX as f64 {
                return Err(reject(field, format!("out of range for a count (got {v})")));
            }
            Ok(v as u64)
        };

        Ok(UnifiedRecord {
            date,
            platform,
            campaign_id: required_text(self.campaign_id),
            campaign_name,
            impressions: count("impressions", self.impressions)?,
            clicks: count("clicks", self.clicks)?,
            spend: amount("spend", self.spend)?,
            conversions: count("conversions", self.conversions)?,
            revenue: amount("revenue", self.revenue)?,
            roas: amount("roas", self.roas)?,
            ctr: amount("ctr", self.ctr)?,
        })
    }
}

fn required_text(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Accepts `YYYY-MM-DD`, or a timestamp whose first ten characters are one.
fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| NaiveDate::parse_from_str(s.get(..10)?, "%Y-%m-%d").ok())
}
