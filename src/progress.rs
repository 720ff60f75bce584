//! Progress reporting utilities using indicatif.
//!
//! The deduplication pipeline reports progress through the [`ProgressCallback`]
//! trait; [`TerminalProgress`] is the terminal implementation driving one
//! indicatif bar per phase.

use std::sync::Mutex;

use indicatif::{ProgressBar, ProgressStyle};

/// Progress callback for deduplication pipeline phases.
///
/// Implement this trait to receive progress updates. Phases run strictly one
/// at a time; `on_progress` is invoked after each completed item of the
/// current phase. With parallel hashing enabled, `done` is a monotonic
/// completion count rather than an input position.
pub trait ProgressCallback: Send + Sync {
    /// Called when a phase starts.
    ///
    /// # Arguments
    ///
    /// * `phase` - Name of the phase (e.g., "hashing", "grouping")
    /// * `total` - Total number of items to process
    fn on_phase_start(&self, phase: &str, total: usize);

    /// Called after each processed item.
    ///
    /// # Arguments
    ///
    /// * `done` - Number of items completed so far (1-based)
    /// * `total` - Total number of items in the phase
    fn on_progress(&self, done: usize, total: usize);

    /// Called when a phase completes.
    ///
    /// # Arguments
    ///
    /// * `phase` - Name of the phase
    fn on_phase_end(&self, phase: &str);
}

/// Progress reporter using indicatif.
///
/// Holds at most one active bar; the pipeline's phases never overlap.
pub struct TerminalProgress {
    active: Mutex<Option<ProgressBar>>,
    quiet: bool,
    colored: bool,
}

impl TerminalProgress {
    /// Create a new progress reporter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, no progress bars will be displayed.
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self {
            active: Mutex::new(None),
            quiet,
            colored: true,
        }
    }

    /// Enable or disable ANSI colors in the bar template.
    #[must_use]
    pub fn with_color(mut self, colored: bool) -> Self {
        self.colored = colored;
        self
    }

    fn bar_style(&self) -> ProgressStyle {
        let template = if self.colored {
            "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg} (ETA: {eta})"
        } else {
            "[{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg} (ETA: {eta})"
        };
        ProgressStyle::with_template(template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█>-")
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_phase_start(&self, phase: &str, total: usize) {
        if self.quiet {
            return;
        }

        let pb = ProgressBar::new(total as u64);
        pb.set_style(self.bar_style());
        pb.set_message(phase_label(phase));
        *self.active.lock().unwrap() = Some(pb);
    }

    fn on_progress(&self, done: usize, _total: usize) {
        if self.quiet {
            return;
        }

        if let Some(ref pb) = *self.active.lock().unwrap() {
            pb.set_position(done as u64);
        }
    }

    fn on_phase_end(&self, phase: &str) {
        if self.quiet {
            return;
        }

        if let Some(pb) = self.active.lock().unwrap().take() {
            pb.finish_with_message(format!("{} complete", phase_label(phase)));
        }
    }
}

/// Human label for a pipeline phase name.
fn phase_label(phase: &str) -> String {
    match phase {
        "hashing" => "Hashing images".to_string(),
        "grouping" => "Grouping duplicates".to_string(),
        other => other.to_string(),
    }
}
