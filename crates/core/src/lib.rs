pub mod detect;
pub mod domain;
pub mod ingest;
pub mod insights;
pub mod pipeline;
pub mod recommend;
pub mod report;

pub mod config {
    use anyhow::ensure;
    use serde::{Deserialize, Serialize};

    pub const DEFAULT_OUTPUT_DIR: &str = "data";

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub sentry_dsn: Option<String>,
        pub output_dir: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
                output_dir: std::env::var("ADWATCH_OUTPUT_DIR")
                    .ok()
                    .filter(|s| !s.trim().is_empty()),
            })
        }

        pub fn output_dir(&self) -> &str {
            self.output_dir.as_deref().unwrap_or(DEFAULT_OUTPUT_DIR)
        }
    }

    /// Rolling-window parameters shared by every scan in a run.
    ///
    /// Built once at startup and handed to the scanner by reference.
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct ScanConfig {
        /// Trailing window length, in records of a single entity.
        pub window_size: usize,

        /// Fewest samples a window may hold and still be scored.
        pub min_window: usize,

        /// Robust-z magnitude a score must strictly exceed to be flagged.
        pub threshold: f64,
    }

    impl Default for ScanConfig {
        fn default() -> Self {
            Self {
                window_size: 7,
                min_window: 3,
                threshold: 2.5,
            }
        }
    }

    impl ScanConfig {
        pub fn from_env() -> Self {
            let mut out = Self::default();

            if let Ok(s) = std::env::var("ADWATCH_WINDOW_SIZE") {
                if let Ok(n) = s.parse::<usize>() {
                    out.window_size = n;
                }
            }

            if let Ok(s) = std::env::var("ADWATCH_MIN_WINDOW") {
                if let Ok(n) = s.parse::<usize>() {
                    out.min_window = n;
                }
            }

            if let Ok(s) = std::env::var("ADWATCH_THRESHOLD") {
                if let Ok(n) = s.parse::<f64>() {
                    out.threshold = n;
                }
            }

            out
        }

        pub fn validate(&self) -> anyhow::Result<()> {
            ensure!(self.window_size >= 1, "window_size must be >= 1");
            ensure!(self.min_window >= 1, "min_window must be >= 1");
            ensure!(
                self.threshold.is_finite() && self.threshold >= 0.0,
                "threshold must be a finite, non-negative number (got {})",
                self.threshold
            );
            Ok(())
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn defaults_match_detector_contract() {
            let cfg = ScanConfig::default();
            assert_eq!(cfg.window_size, 7);
            assert_eq!(cfg.min_window, 3);
            assert_eq!(cfg.threshold, 2.5);
            assert!(cfg.validate().is_ok());
        }

        #[test]
        fn rejects_degenerate_windows_and_thresholds() {
            let zero_window = ScanConfig {
                window_size: 0,
                ..ScanConfig::default()
            };
            assert!(zero_window.validate().is_err());

            let zero_min = ScanConfig {
                min_window: 0,
                ..ScanConfig::default()
            };
            assert!(zero_min.validate().is_err());

            let nan = ScanConfig {
                threshold: f64::NAN,
                ..ScanConfig::default()
            };
            assert!(nan.validate().is_err());

            let negative = ScanConfig {
                threshold: -1.0,
                ..ScanConfig::default()
            };
            assert!(negative.validate().is_err());
        }

        #[test]
        fn output_dir_falls_back_to_default() {
            let settings = Settings {
                sentry_dsn: None,
                output_dir: None,
            };
            assert_eq!(settings.output_dir(), DEFAULT_OUTPUT_DIR);
        }
    }
}
