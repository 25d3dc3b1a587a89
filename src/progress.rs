//! Progress model (spec §4.6)
//!
//! Combines page-coverage progress with timing-operation progress into a
//! single percentage. Modeled on the teacher's score math in
//! `src/audit/scoring.rs`, generalized from "percentage of checks passed" to
//! "percentage of total scan work completed."

use tracing::warn;

/// Inputs to the progress computation.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProgressInputs {
    /// URLs audited so far (pages drained from the page queue and dispatched).
    pub audited: usize,
    /// Total URLs known (sitemap size) once discovery has settled.
    pub effective: usize,
    /// Timing operations completed.
    pub timing_done: usize,
    /// Total timing operations enqueued.
    pub timing_total: usize,
    /// Whether any timing modules are loaded — selects the 50/50 split vs.
    /// the page-coverage-only 100% scale (spec §4.6).
    pub timing_modules_loaded: bool,
}

/// Compute the overall scan progress percentage, clamped to `[0.0, 100.0]`.
/// When timing modules are loaded, page coverage and timing progress each
/// contribute up to 50 points; otherwise page coverage alone scales to 100.
pub fn compute_progress(inputs: &ProgressInputs) -> f64 {
    let page_fraction = if inputs.effective == 0 {
        0.0
    } else {
        inputs.audited as f64 / inputs.effective as f64
    };

    let raw = if inputs.timing_modules_loaded {
        let timing_fraction = if inputs.timing_total == 0 {
            0.0
        } else {
            inputs.timing_done as f64 / inputs.timing_total as f64
        };
        page_fraction * 50.0 + timing_fraction * 50.0
    } else {
        page_fraction * 100.0
    };

    if raw > 100.0 {
        warn!(raw, "progress computation overshot 100.0 before clamping");
    }

    raw.clamp(0.0, 100.0)
}

/// Project remaining scan duration from progress and elapsed time, the way
/// a progress-bar widget derives `{eta}` from the completed fraction
/// (spec §4.6: "ETA is computed by a progress-bar helper from progress and
/// elapsed time" — the same ratio `indicatif`'s `ETA` template element uses).
/// Returns `None` when there isn't enough signal yet to project (no time has
/// elapsed, or progress hasn't started or has already finished).
pub fn estimate_eta_secs(progress_pct: f64, elapsed_secs: f64) -> Option<f64> {
    if elapsed_secs <= 0.0 || progress_pct <= 0.0 || progress_pct >= 100.0 {
        return None;
    }
    let fraction = progress_pct / 100.0;
    Some(elapsed_secs * (1.0 - fraction) / fraction)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_effective_is_zero_progress() {
        let inputs = ProgressInputs::default();
        assert_eq!(compute_progress(&inputs), 0.0);
    }

    #[test]
    fn test_page_coverage_only_scales_to_100() {
        let inputs = ProgressInputs {
            audited: 5,
            effective: 10,
            timing_modules_loaded: false,
            ..Default::default()
        };
        assert_eq!(compute_progress(&inputs), 50.0);
    }

    #[test]
    fn test_scenario_five_numbers() {
        // spec Scenario 5: page coverage half done, no timing ops yet -> 25.0
        let halfway_no_timing = ProgressInputs {
            audited: 5,
            effective: 10,
            timing_modules_loaded: true,
            timing_done: 0,
            timing_total: 4,
        };
        assert_eq!(compute_progress(&halfway_no_timing), 25.0);

        // page coverage complete, timing half done -> 75.0
        let complete_pages_half_timing = ProgressInputs {
            audited: 10,
            effective: 10,
            timing_modules_loaded: true,
            timing_done: 2,
            timing_total: 4,
        };
        assert_eq!(compute_progress(&complete_pages_half_timing), 75.0);

        // both fully done -> 100.0
        let fully_done = ProgressInputs {
            audited: 10,
            effective: 10,
            timing_modules_loaded: true,
            timing_done: 4,
            timing_total: 4,
        };
        assert_eq!(compute_progress(&fully_done), 100.0);
    }

    #[test]
    fn test_overshoot_clamps_to_100() {
        let inputs = ProgressInputs {
            audited: 12,
            effective: 10,
            timing_modules_loaded: false,
            ..Default::default()
        };
        assert_eq!(compute_progress(&inputs), 100.0);
    }

    #[test]
    fn test_eta_halfway_projects_remaining_equal_to_elapsed() {
        assert_eq!(estimate_eta_secs(50.0, 10.0), Some(10.0));
    }

    #[test]
    fn test_eta_none_at_zero_or_complete_progress() {
        assert_eq!(estimate_eta_secs(0.0, 10.0), None);
        assert_eq!(estimate_eta_secs(100.0, 10.0), None);
    }

    #[test]
    fn test_eta_none_with_no_elapsed_time() {
        assert_eq!(estimate_eta_secs(50.0, 0.0), None);
    }
}
