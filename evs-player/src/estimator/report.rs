//! Diagnostic statistics report
//!
//! **Purpose:** Human-readable and JSON views of one back-end's learned
//! load-time behaviour. Informational only; nothing in the switch path
//! reads these.

use super::quality::QualityLabel;
use crate::backend::BackendId;
use serde::Serialize;

/// Snapshot of one back-end's statistics
#[derive(Debug, Clone, Serialize)]
pub struct BackendStats {
    pub backend: BackendId,
    pub quality: QualityLabel,
    pub sample_count: usize,
    pub mean_ms: f64,
    pub std_dev_ms: f64,
    pub p95_ms: f64,
    pub min_ms: Option<f64>,
    pub max_ms: Option<f64>,
    pub late_count: u64,
    pub total_count: u64,
    /// Percentage of attempts that were not late (100 with no attempts)
    pub success_rate: f64,
    pub recommended_lookahead_seconds: f64,
}

/// Success rate as a percentage
pub fn success_rate(late_count: u64, total_count: u64) -> f64 {
    if total_count == 0 {
        100.0
    } else {
        (total_count.saturating_sub(late_count)) as f64 / total_count as f64 * 100.0
    }
}

/// Text formatter for statistics reports
pub struct ReportFormatter;

impl ReportFormatter {
    /// Boxed multi-line report, or a one-liner when there is no data
    pub fn format(stats: &BackendStats) -> String {
        if stats.sample_count == 0 {
            return format!("[Network:{}] no data", stats.backend);
        }

        let rule = "═".repeat(44);
        let mut lines = Vec::with_capacity(16);
        lines.push(format!("╔{}╗", rule));
        lines.push(row(&format!(
            "Network Stats: {}",
            stats.backend.as_str().to_uppercase()
        )));
        lines.push(format!("╠{}╣", rule));
        lines.push(row(&format!(
            "Quality: {:<10} Samples: {:>3}",
            stats.quality, stats.sample_count
        )));
        lines.push(format!("╠{}╣", rule));
        lines.push(row("Load Time (ms)"));
        lines.push(row(&format!(
            "  Average: {:>6.0}   StdDev: {:>6.0}",
            stats.mean_ms, stats.std_dev_ms
        )));
        lines.push(row(&format!(
            "  Min: {:>6.0}       Max: {:>6.0}",
            stats.min_ms.unwrap_or(0.0),
            stats.max_ms.unwrap_or(0.0)
        )));
        lines.push(row(&format!("  95th Percentile: {:>6.0}", stats.p95_ms)));
        lines.push(format!("╠{}╣", rule));
        lines.push(row("Sync Performance"));
        lines.push(row(&format!("  Success Rate: {:>5.1}%", stats.success_rate)));
        lines.push(row(&format!(
            "  Late Count: {:>3} / {:>3}",
            stats.late_count, stats.total_count
        )));
        lines.push(format!("╠{}╣", rule));
        lines.push(row(&format!(
            "Recommended lookahead: {:.2}s",
            stats.recommended_lookahead_seconds
        )));
        lines.push(format!("╚{}╝", rule));

        lines.join("\n")
    }
}

fn row(content: &str) -> String {
    format!("║ {:<42} ║", content)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_stats(sample_count: usize) -> BackendStats {
        BackendStats {
            backend: BackendId::YouTube,
            quality: QualityLabel::Good,
            sample_count,
            mean_ms: 750.0,
            std_dev_ms: 120.0,
            p95_ms: 980.0,
            min_ms: Some(600.0),
            max_ms: Some(980.0),
            late_count: 1,
            total_count: 8,
            success_rate: success_rate(1, 8),
            recommended_lookahead_seconds: 1.124,
        }
    }

    #[test]
    fn test_success_rate() {
        assert_eq!(success_rate(0, 0), 100.0);
        assert_eq!(success_rate(1, 4), 75.0);
        assert_eq!(success_rate(4, 4), 0.0);
    }

    #[test]
    fn test_report_contains_key_figures() {
        let report = ReportFormatter::format(&sample_stats(8));
        assert!(report.contains("YOUTUBE"));
        assert!(report.contains("good"));
        assert!(report.contains("87.5%"));
        assert!(report.contains("1 /   8"));
        assert!(report.contains("1.12s"));
    }

    #[test]
    fn test_empty_report() {
        let report = ReportFormatter::format(&sample_stats(0));
        assert_eq!(report, "[Network:youtube] no data");
    }
}
