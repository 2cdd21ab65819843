use serde::Serialize;

use crate::github::WorkflowRun;

/// Per-workflow statistics over a set of runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkflowMetrics {
    pub total_runs: usize,
    pub successful_runs: usize,
    pub failed_runs: usize,
    /// Percentage, one decimal.
    pub success_rate: f64,
    /// Mean wall time of completed runs, two decimals.
    pub avg_duration_minutes: f64,
    /// Conclusion of the most recent run, or `unknown`.
    pub latest_status: String,
    pub latest_run_date: Option<String>,
}

/// Compute metrics from runs ordered newest first (the API's order).
pub fn calculate(runs: &[WorkflowRun]) -> WorkflowMetrics {
    let total = runs.len();
    let successful = runs
        .iter()
        .filter(|r| r.conclusion.as_deref() == Some("success"))
        .count();
    let success_rate = if total > 0 {
        successful as f64 / total as f64 * 100.0
    } else {
        0.0
    };

    let durations: Vec<f64> = runs
        .iter()
        .filter(|r| r.status.as_deref() == Some("completed"))
        .filter_map(|r| {
            let (start, end) = (r.created_at?, r.updated_at?);
            Some((end - start).num_milliseconds() as f64 / 60_000.0)
        })
        .collect();
    let avg_duration = if durations.is_empty() {
        0.0
    } else {
        durations.iter().sum::<f64>() / durations.len() as f64
    };

    let latest = runs.first();
    WorkflowMetrics {
        total_runs: total,
        successful_runs: successful,
        failed_runs: total - successful,
        success_rate: round_to(success_rate, 1),
        avg_duration_minutes: round_to(avg_duration, 2),
        latest_status: latest
            .and_then(|r| r.conclusion.clone())
            .unwrap_or_else(|| "unknown".to_string()),
        latest_run_date: latest
            .and_then(|r| r.created_at)
            .map(|d| d.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)),
    }
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn run(status: &str, conclusion: Option<&str>, secs: i64) -> WorkflowRun {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        WorkflowRun {
            status: Some(status.into()),
            conclusion: conclusion.map(String::from),
            created_at: Some(start),
            updated_at: Some(start + Duration::seconds(secs)),
        }
    }

    #[test]
    fn empty_runs() {
        let m = calculate(&[]);
        assert_eq!(m.total_runs, 0);
        assert_eq!(m.success_rate, 0.0);
        assert_eq!(m.latest_status, "unknown");
        assert_eq!(m.latest_run_date, None);
    }

    #[test]
    fn rates_and_durations() {
        let runs = vec![
            run("completed", Some("failure"), 90),
            run("completed", Some("success"), 150),
            run("completed", Some("success"), 200),
            run("in_progress", None, 5000),
        ];
        let m = calculate(&runs);
        assert_eq!(m.total_runs, 4);
        assert_eq!(m.successful_runs, 2);
        assert_eq!(m.failed_runs, 2);
        assert_eq!(m.success_rate, 50.0);
        // (1.5 + 2.5 + 3.333..) / 3
        assert_eq!(m.avg_duration_minutes, 2.44);
        assert_eq!(m.latest_status, "failure");
        assert_eq!(m.latest_run_date.as_deref(), Some("2024-05-01T09:00:00Z"));
    }

    #[test]
    fn in_progress_latest_is_unknown() {
        let m = calculate(&[run("in_progress", None, 10)]);
        assert_eq!(m.latest_status, "unknown");
        assert_eq!(m.avg_duration_minutes, 0.0);
    }

    #[test]
    fn rounding() {
        assert_eq!(round_to(66.666_666, 1), 66.7);
        assert_eq!(round_to(2.444_44, 2), 2.44);
    }
}
