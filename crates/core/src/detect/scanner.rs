use crate::config::ScanConfig;
use crate::detect::robust::{is_anomalous, Dispersion};
use crate::domain::record::{group_by_entity, Metric, MetricScore, ScoredRecord, UnifiedRecord};

/// Scores every record against its own campaign's trailing window, one metric at a time.
///
/// Entities never see each other's history. Each entity is scanned into a fresh annotated
/// copy and the copies are merged back into input order at the end.
#[derive(Debug, Clone, Copy)]
pub struct RollingAnomalyScanner<'a> {
    config: &'a ScanConfig,
}

impl<'a> RollingAnomalyScanner<'a> {
    pub fn new(config: &'a ScanConfig) -> Self {
        Self { config }
    }

    /// Annotates `records`; the output has the same length and order as the input.
    pub fn scan(&self, records: &[UnifiedRecord]) -> Vec<ScoredRecord> {
        let groups = group_by_entity(records, UnifiedRecord::entity);

        let mut merged: Vec<(usize, ScoredRecord)> = Vec::with_capacity(records.len());
        for (entity, positions) in &groups {
            if positions.len() < self.config.window_size {
                tracing::debug!(
                    %entity,
                    records = positions.len(),
                    window_size = self.config.window_size,
                    "insufficient history; entity left unscored"
                );
            }
            merged.extend(self.scan_entity(records, positions));
        }

        merged.sort_by_key(|(pos, _)| *pos);
        let scored: Vec<ScoredRecord> = merged.into_iter().map(|(_, r)| r).collect();

        tracing::debug!(
            records = scored.len(),
            entities = groups.len(),
            flagged = scored.iter().filter(|r| r.any_flagged()).count(),
            "anomaly scan complete"
        );

        scored
    }

    /// Scans one entity's records (given by input position) and returns them annotated,
    /// each paired with its input position.
    pub fn scan_entity(
        &self,
        records: &[UnifiedRecord],
        positions: &[usize],
    ) -> Vec<(usize, ScoredRecord)> {
        let mut series: Vec<usize> = positions.to_vec();
        // Stable: same-day records keep input order.
        series.sort_by_key(|&pos| records[pos].date);

        let per_metric: Vec<(Metric, Vec<Option<MetricScore>>)> = Metric::ALL
            .into_iter()
            .map(|metric| {
                let values: Vec<f64> =
                    series.iter().map(|&pos| metric.value(&records[pos])).collect();
                let scores: Vec<Option<MetricScore>> = (0..values.len())
                    .map(|i| self.score_at(&values, i, metric))
                    .collect();
                (metric, scores)
            })
            .collect();

        series
            .iter()
            .enumerate()
            .map(|(i, &pos)| {
                let mut scored = ScoredRecord::unscored(records[pos].clone());
                for (metric, scores) in &per_metric {
                    if let Some(score) = scores[i] {
                        scored = scored.with_metric(*metric, score);
                    }
                }
                (pos, scored)
            })
            .collect()
    }

    /// Score for the value at `i`, or `None` when the window cannot support a claim.
    fn score_at(&self, values: &[f64], i: usize, metric: Metric) -> Option<MetricScore> {
        let window_size = self.config.window_size;
        if i + 1 < window_size {
            return None;
        }

        let start = (i + 1).saturating_sub(window_size);
        let window = &values[start..=i];
        if window.len() < self.config.min_window {
            return None;
        }

        if metric.requires_active_window() {
            let total: f64 = window.iter().sum();
            if !(total > 0.0) {
                return None;
            }
        }

        let score = Dispersion::of(window)?.z_score(values[i]);
        Some(MetricScore {
            score,
            flagged: is_anomalous(score, self.config.threshold),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn day(n: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 8, 1).unwrap() + Duration::days(n)
    }

    fn record(campaign: &str, n: i64, spend: f64, roas: f64, ctr: f64) -> UnifiedRecord {
        UnifiedRecord {
            date: day(n),
            platform: "Google Ads".to_string(),
            campaign_id: None,
            campaign_name: campaign.to_string(),
            impressions: 10_000,
            clicks: (ctr * 10_000.0) as u64,
            spend,
            conversions: 10,
            revenue: spend * roas,
            roas,
            ctr,
        }
    }

    fn spend_series(campaign: &str, spends: &[f64]) -> Vec<UnifiedRecord> {
        spends
            .iter()
            .enumerate()
            .map(|(i, &s)| record(campaign, i as i64, s, 2.0, 0.02))
            .collect()
    }

    #[test]
    fn spend_spike_over_noisy_baseline_is_flagged() {
        let cfg = ScanConfig::default();
        let records = spend_series(
            "Brand",
            &[100.0, 98.0, 101.0, 100.0, 99.0, 102.0, 100.0, 1000.0],
        );
        let scored = RollingAnomalyScanner::new(&cfg).scan(&records);

        let last = &scored[7];
        assert!(last.spend_anomaly_score > 2.5);
        assert!(last.spend_anomaly);
        // Window for day 8 is days 2..=8: median 100, MAD 1.
        assert!((last.spend_anomaly_score - 0.6745 * 900.0).abs() < 1e-9);
    }

    #[test]
    fn perfectly_flat_baseline_has_zero_dispersion() {
        let cfg = ScanConfig::default();
        let mut spends = vec![100.0; 7];
        spends.push(1000.0);
        let scored = RollingAnomalyScanner::new(&cfg).scan(&spend_series("Flat", &spends));

        assert_eq!(scored[7].spend_anomaly_score, 0.0);
        assert!(!scored[7].spend_anomaly);
    }

    #[test]
    fn constant_roas_never_scores() {
        let cfg = ScanConfig::default();
        let records: Vec<_> = (0..10)
            .map(|i| record("Steady", i, 100.0 + i as f64, 2.0, 0.02))
            .collect();
        let scored = RollingAnomalyScanner::new(&cfg).scan(&records);

        for r in &scored {
            assert_eq!(r.roas_anomaly_score, 0.0);
            assert!(!r.roas_anomaly);
        }
    }

    #[test]
    fn short_history_is_never_scored() {
        let cfg = ScanConfig::default();
        let records = spend_series("New", &[10.0, 50.0, 1.0, 900.0, 3.0, 7000.0]);
        let scored = RollingAnomalyScanner::new(&cfg).scan(&records);

        assert_eq!(scored.len(), 6);
        for r in &scored {
            for metric in Metric::ALL {
                assert_eq!(r.metric(metric), MetricScore::default());
            }
        }
    }

    #[test]
    fn leading_positions_stay_unscored() {
        let cfg = ScanConfig::default();
        let records = spend_series(
            "Brand",
            &[1.0, 5.0, 2.0, 8.0, 3.0, 9.0, 6.0, 7.0, 50.0],
        );
        let scored = RollingAnomalyScanner::new(&cfg).scan(&records);

        for r in &scored[..6] {
            assert_eq!(r.spend_anomaly_score, 0.0);
        }
        assert_ne!(scored[6].spend_anomaly_score, 0.0);
        assert!(scored[8].spend_anomaly_score > 0.0);
    }

    #[test]
    fn all_zero_ctr_window_is_left_unscored() {
        let cfg = ScanConfig::default();
        let records: Vec<_> = (0..9)
            .map(|i| record("Dark", i, 100.0 + (i * 7 % 5) as f64, 2.0 + (i % 3) as f64, 0.0))
            .collect();
        let scored = RollingAnomalyScanner::new(&cfg).scan(&records);

        for r in &scored {
            assert_eq!(r.ctr_anomaly_score, 0.0);
            assert!(!r.ctr_anomaly);
        }
    }

    #[test]
    fn ratio_window_scores_once_it_sees_activity() {
        let cfg = ScanConfig::default();
        let ctrs = [0.0, 0.0, 0.0, 0.01, 0.012, 0.011, 0.013, 0.02];
        let records: Vec<_> = ctrs
            .iter()
            .enumerate()
            .map(|(i, &c)| record("Waking", i as i64, 100.0, 2.0, c))
            .collect();
        let scored = RollingAnomalyScanner::new(&cfg).scan(&records);

        // Window 0..=6 still holds three zero days but sums positive with real spread.
        assert_ne!(scored[6].ctr_anomaly_score, 0.0);
        assert!(scored[7].ctr_anomaly_score > 0.0);
    }

    #[test]
    fn entities_are_scored_independently_and_input_order_is_kept() {
        let cfg = ScanConfig::default();
        let mut records = Vec::new();
        let a = spend_series("A", &[100.0, 98.0, 101.0, 100.0, 99.0, 102.0, 100.0, 1000.0]);
        let b = spend_series("B", &[5.0, 6.0, 5.0]);
        // Interleave, newest first for A, to exercise the per-entity sort and the merge.
        for (i, r) in a.into_iter().rev().enumerate() {
            records.push(r);
            if let Some(rb) = b.get(i) {
                records.push(rb.clone());
            }
        }

        let scored = RollingAnomalyScanner::new(&cfg).scan(&records);
        assert_eq!(scored.len(), records.len());
        for (input, output) in records.iter().zip(&scored) {
            assert_eq!(&output.record, input);
        }

        // A's spike (day index 7) was the first input row.
        assert!(scored[0].spend_anomaly);
        assert!(scored
            .iter()
            .filter(|r| r.record.campaign_name == "B")
            .all(|r| !r.any_flagged() && r.spend_anomaly_score == 0.0));
    }

    #[test]
    fn same_day_duplicates_keep_input_order_in_the_window() {
        use crate::detect::robust::robust_z_score;

        let cfg = ScanConfig::default();
        let baseline = [100.0, 98.0, 101.0, 100.0, 99.0, 102.0, 100.0];
        let with_tail = |tail: [f64; 2]| -> Vec<UnifiedRecord> {
            let mut out: Vec<_> = baseline
                .iter()
                .enumerate()
                .map(|(i, &s)| record("Dup", i as i64, s, 2.0, 0.02))
                .collect();
            out.extend(tail.iter().map(|&s| record("Dup", 7, s, 2.0, 0.02)));
            out
        };
        let scanner = RollingAnomalyScanner::new(&cfg);

        // Spike first: it is scored before its twin, and the twin's window holds it.
        let scored = scanner.scan(&with_tail([1000.0, 100.0]));
        assert!(scored[7].spend_anomaly);
        assert_eq!(
            scored[8].spend_anomaly_score,
            robust_z_score(&[101.0, 100.0, 99.0, 102.0, 100.0, 1000.0, 100.0], 100.0)
        );
        assert!(!scored[8].spend_anomaly);

        // Spike second: the quiet twin is scored first and lands in the spike's window.
        let scored = scanner.scan(&with_tail([100.0, 1000.0]));
        assert_eq!(scored[7].spend_anomaly_score, 0.0);
        assert_eq!(
            scored[8].spend_anomaly_score,
            robust_z_score(&[101.0, 100.0, 99.0, 102.0, 100.0, 100.0, 1000.0], 1000.0)
        );
        assert!(scored[8].spend_anomaly);
    }

    #[test]
    fn rescanning_is_deterministic() {
        let cfg = ScanConfig::default();
        let records: Vec<_> = (0..20)
            .flat_map(|i| {
                let wobble = ((i * 37) % 11) as f64;
                vec![
                    record("X", i, 100.0 + wobble, 2.0 + wobble / 10.0, 0.02 + wobble / 1000.0),
                    record("Y", i, 50.0 * (1.0 + (i % 4) as f64), 1.5, 0.01),
                ]
            })
            .collect();

        let scanner = RollingAnomalyScanner::new(&cfg);
        let first = scanner.scan(&records);
        let second = scanner.scan(&records);
        assert_eq!(first, second);
        for (a, b) in first.iter().zip(&second) {
            for metric in Metric::ALL {
                assert_eq!(a.metric(metric).score.to_bits(), b.metric(metric).score.to_bits());
            }
        }
    }

    #[test]
    fn flag_boundary_uses_strict_comparison() {
        let spends = [10.0, 12.0, 11.0, 13.0, 9.0, 10.0, 14.0];
        let records = spend_series("Edge", &spends);

        let window_score = crate::detect::robust::robust_z_score(&spends, 14.0);
        assert!(window_score > 0.0);

        let at_boundary = ScanConfig {
            threshold: window_score,
            ..ScanConfig::default()
        };
        let scored = RollingAnomalyScanner::new(&at_boundary).scan(&records);
        assert_eq!(scored[6].spend_anomaly_score, window_score);
        assert!(!scored[6].spend_anomaly);

        let just_below = ScanConfig {
            threshold: window_score - 1e-5,
            ..ScanConfig::default()
        };
        let scored = RollingAnomalyScanner::new(&just_below).scan(&records);
        assert!(scored[6].spend_anomaly);
    }

    #[test]
    fn min_window_above_window_size_disables_scoring() {
        let cfg = ScanConfig {
            window_size: 3,
            min_window: 4,
            threshold: 2.5,
        };
        let records = spend_series("Tiny", &[1.0, 2.0, 3.0, 50.0, 2.0]);
        let scored = RollingAnomalyScanner::new(&cfg).scan(&records);
        assert!(scored.iter().all(|r| r.spend_anomaly_score == 0.0));
    }
}
