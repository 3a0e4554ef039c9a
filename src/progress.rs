//! Progress reporting utilities using indicatif.
//!
//! The collector and the detector report progress through the
//! [`ProgressCallback`] side channel; neither does any formatting itself.
//! [`Progress`] is the terminal implementation: a single line on stdout,
//! overwritten in place.
//!
//! The line formats are produced by the free `format_*` functions so they
//! can be tested without a terminal.

use std::sync::Mutex;
use std::time::Duration;

use indicatif::{HumanDuration, ProgressBar, ProgressDrawTarget, ProgressStyle};

/// The spinner rotation, advanced by item index.
pub const SPINNER: [char; 4] = ['-', '\\', '|', '/'];

/// Pipeline phases reported to a [`ProgressCallback`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Walking the tree and collecting candidates.
    Collecting,
    /// Comparing fingerprints.
    Detecting,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Collecting => write!(f, "collecting"),
            Phase::Detecting => write!(f, "detecting"),
        }
    }
}

/// State after one fingerprint comparison.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComparisonProgress {
    /// Comparisons finished so far (1-based after the first one)
    pub done: usize,
    /// Comparisons planned in total
    pub total: usize,
    /// Running mean latency of a single comparison
    pub average: Duration,
    /// Estimated time until all planned comparisons are done
    pub eta: Duration,
}

/// Progress callback for the scan pipeline.
///
/// Every method has an empty default so implementors only override what
/// they observe. Callbacks are purely observational.
pub trait ProgressCallback: Send + Sync {
    /// Called when a phase starts. `total` is 0 when unknown.
    fn on_phase_start(&self, _phase: Phase, _total: usize) {}

    /// Called after each directory the collector visits.
    fn on_directory_visited(&self, _directories: usize, _files_found: usize) {}

    /// Called after each fingerprint comparison.
    fn on_comparison(&self, _progress: &ComparisonProgress) {}

    /// Called when a phase completes.
    fn on_phase_end(&self, _phase: Phase) {}
}

/// Running average of per-comparison latency.
#[derive(Debug, Clone, Copy, Default)]
pub struct LatencyTracker {
    samples: u32,
    total: Duration,
}

impl LatencyTracker {
    /// Create an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the latency of one comparison.
    pub fn record(&mut self, elapsed: Duration) {
        self.samples = self.samples.saturating_add(1);
        self.total += elapsed;
    }

    /// Mean latency, zero before the first sample.
    #[must_use]
    pub fn average(&self) -> Duration {
        if self.samples == 0 {
            Duration::ZERO
        } else {
            self.total / self.samples
        }
    }

    /// Remaining work times the mean latency.
    #[must_use]
    pub fn eta(&self, remaining: usize) -> Duration {
        self.average()
            .saturating_mul(u32::try_from(remaining).unwrap_or(u32::MAX))
    }
}

/// Spinner symbol for the given index.
#[must_use]
pub fn spinner_symbol(index: usize) -> char {
    SPINNER[index % SPINNER.len()]
}

/// Line shown while collecting.
#[must_use]
pub fn format_collect_line(index: usize, files_found: usize) -> String {
    format!("{} {} files found.", spinner_symbol(index), files_found)
}

/// Line shown while comparing.
#[must_use]
pub fn format_detect_line(progress: &ComparisonProgress) -> String {
    format!(
        "{} {}/{} target files checked. Average time for single file: {:.4} sec. ETA: {}",
        spinner_symbol(progress.done),
        progress.done,
        progress.total,
        progress.average.as_secs_f64(),
        HumanDuration(progress.eta)
    )
}

/// Final summary line.
#[must_use]
pub fn format_summary(files_checked: usize, remaining: Duration) -> String {
    format!(
        "{} file(s) checked. Estimated remaining time: {:.2} sec.",
        files_checked,
        remaining.as_secs_f64()
    )
}

/// Terminal progress reporter using indicatif.
pub struct Progress {
    bar: Mutex<Option<ProgressBar>>,
    quiet: bool,
}

impl Progress {
    /// Create a new progress reporter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, nothing is drawn.
    ///
    /// # Examples
    ///
    /// ```
    /// use dupescan::progress::Progress;
    ///
    /// let progress = Progress::new(true);
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self {
            bar: Mutex::new(None),
            quiet,
        }
    }

    fn style() -> ProgressStyle {
        ProgressStyle::with_template("{msg}").unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn set_message(&self, message: String) {
        if let Ok(guard) = self.bar.lock() {
            if let Some(ref pb) = *guard {
                pb.set_message(message);
            }
        }
    }
}

impl ProgressCallback for Progress {
    fn on_phase_start(&self, phase: Phase, total: usize) {
        if self.quiet {
            return;
        }

        let pb = ProgressBar::with_draw_target(Some(total as u64), ProgressDrawTarget::stdout());
        pb.set_style(Self::style());
        let message = match phase {
            Phase::Collecting => format_collect_line(0, 0),
            Phase::Detecting => format_detect_line(&ComparisonProgress {
                done: 0,
                total,
                average: Duration::ZERO,
                eta: Duration::ZERO,
            }),
        };
        pb.set_message(message);

        if let Ok(mut guard) = self.bar.lock() {
            *guard = Some(pb);
        }
    }

    fn on_directory_visited(&self, directories: usize, files_found: usize) {
        if self.quiet {
            return;
        }
        self.set_message(format_collect_line(directories, files_found));
    }

    fn on_comparison(&self, progress: &ComparisonProgress) {
        if self.quiet {
            return;
        }
        self.set_message(format_detect_line(progress));
    }

    fn on_phase_end(&self, _phase: Phase) {
        if self.quiet {
            return;
        }
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(pb) = guard.take() {
                pb.finish();
            }
        }
    }
}
