//! Performance report generation.

use std::fmt::{self, Write as _};

use tickets_core::Strategy;

use super::Metrics;

/// Metrics of one strategy under one scenario, ready to print.
#[derive(Debug, Clone)]
pub struct PerformanceReport {
    title: String,
    strategy: Strategy,
    metrics: Metrics,
}

impl PerformanceReport {
    #[must_use]
    pub fn new(title: impl Into<String>, strategy: Strategy, metrics: Metrics) -> Self {
        Self {
            title: title.into(),
            strategy,
            metrics,
        }
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub const fn strategy(&self) -> Strategy {
        self.strategy
    }

    #[must_use]
    pub const fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Generates a human-readable, multi-line report.
    #[must_use]
    pub fn to_string_pretty(&self) -> String {
        let metrics = &self.metrics;
        let mut report = String::new();

        let _ = writeln!(report, "=== {} [{}] ===", self.title, self.strategy);
        let _ = writeln!(
            report,
            "Operations: {} (ok: {}, timeouts: {}, failed: {})",
            metrics.operations(),
            metrics.successes,
            metrics.timeouts,
            metrics.failures
        );
        let _ = writeln!(report, "Duration: {:?}", metrics.duration);
        let _ = writeln!(report, "Throughput: {:.2} ops/sec", metrics.throughput);

        if let Some(latency) = &metrics.latency {
            let _ = writeln!(report, "\nLatency over {} samples (ns):", latency.samples);
            let _ = writeln!(report, "  Mean: {:.0}", latency.mean);
            for (label, value) in [
                ("Min", latency.min),
                ("P50", latency.p50),
                ("P95", latency.p95),
                ("P99", latency.p99),
                ("Max", latency.max),
            ] {
                let _ = writeln!(report, "  {label}: {value}");
            }
        }

        report
    }
}

impl fmt::Display for PerformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_string_pretty())
    }
}

/// Builds [`PerformanceReport`]s and compares them.
pub struct Reporter;

impl Reporter {
    #[must_use]
    pub fn generate(
        title: impl Into<String>,
        strategy: Strategy,
        metrics: Metrics,
    ) -> PerformanceReport {
        PerformanceReport::new(title, strategy, metrics)
    }

    /// The report with the highest throughput.
    #[must_use]
    pub fn fastest(reports: &[PerformanceReport]) -> Option<&PerformanceReport> {
        reports
            .iter()
            .max_by(|a, b| a.metrics.throughput.total_cmp(&b.metrics.throughput))
    }

    /// One row per report, the fastest one marked with `*`.
    #[must_use]
    pub fn comparison_table(reports: &[PerformanceReport]) -> String {
        let fastest = Self::fastest(reports).map(PerformanceReport::strategy);
        let mut table = String::new();

        let _ = writeln!(
            table,
            "{:<10} | {:>14} | {:>10} | {:>10} | {:>12}",
            "Strategy", "ops/sec", "ok", "timeouts", "p95 (ns)"
        );
        let _ = writeln!(table, "{}", "-".repeat(68));
        for report in reports {
            let marker = if Some(report.strategy) == fastest { "*" } else { "" };
            let _ = writeln!(
                table,
                "{:<10} | {:>14.2} | {:>10} | {:>10} | {:>12}",
                format!("{}{marker}", report.strategy),
                report.metrics.throughput,
                report.metrics.successes,
                report.metrics.timeouts,
                report
                    .metrics
                    .latency
                    .map_or_else(|| "-".to_owned(), |latency| latency.p95.to_string()),
            );
        }

        table
    }
}
