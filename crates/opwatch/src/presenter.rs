//! Terminal presenter: an indicatif spinner on stderr while an operation runs

use std::time::Duration;

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use opwatch_core::{Banner, PollOutcome, Presenter};

/// Spinner redraw rate
const TICK: Duration = Duration::from_millis(100);

/// Draws `<banner> <spinner> [elapsed]` until stopped, then reports the outcome
pub struct SpinnerPresenter {
    bar: ProgressBar,
}

impl SpinnerPresenter {
    pub fn new() -> Self {
        Self::with_bar(ProgressBar::new_spinner())
    }

    fn with_bar(bar: ProgressBar) -> Self {
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{msg} {spinner:.green} [{elapsed_precise}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        Self { bar }
    }
}

impl Default for SpinnerPresenter {
    fn default() -> Self {
        Self::new()
    }
}

impl Presenter for SpinnerPresenter {
    fn start(&self, banner: &Banner) {
        self.bar.set_message(banner.to_string());
        self.bar.enable_steady_tick(TICK);
    }

    fn stop(&self) {
        // Joins the tick thread, so no frame can be drawn after this
        self.bar.disable_steady_tick();
        self.bar.finish_and_clear();
    }

    fn report(&self, banner: &Banner, outcome: &PollOutcome) {
        match outcome {
            PollOutcome::Completed { elapsed } => println!("{} {}", banner, format_done(*elapsed)),
            PollOutcome::Failed { .. } => eprintln!("{} {}", banner, "\u{2717} failed".red()),
        }
    }
}

/// `Done in 2.500 seconds`
pub fn format_done(elapsed: Duration) -> String {
    format!("Done in {:.3} seconds", elapsed.as_secs_f64())
}
