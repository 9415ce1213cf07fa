//! Progress presentation for operation monitoring
//!
//! The monitor does not draw anything itself. It drives a [`Presenter`]:
//! the CLI plugs in a spinner, tests plug in a recorder, and `--quiet`
//! uses [`NoopPresenter`].

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::monitor::PollOutcome;
use crate::operation::{Operation, OperationType};

/// Text shown in front of the progress indicator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Banner {
    /// A one-off container is being started
    StartingContainer { label: Option<String> },
    /// Any other operation
    Status,
}

impl Banner {
    /// Pick the banner for the first snapshot of an operation
    pub fn for_operation(operation: &Operation, label: Option<&str>) -> Self {
        match operation.op_type {
            OperationType::StartOneOff => Banner::StartingContainer {
                label: label.map(str::to_string),
            },
            _ => Banner::Status,
        }
    }
}

impl fmt::Display for Banner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Banner::StartingContainer { label: Some(label) } => {
                write!(f, "-----> Starting container {}", label)
            }
            Banner::StartingContainer { label: None } => f.write_str("-----> Starting container"),
            Banner::Status => f.write_str("Status:"),
        }
    }
}

/// Presentation hooks for a monitoring session
///
/// `start` and `stop` bracket the wait; implementations may run their own
/// background drawing in between but must not draw anything after `stop`
/// returns. `report` is called once, after `stop`.
pub trait Presenter: Send + Sync {
    fn start(&self, banner: &Banner);

    fn stop(&self);

    fn report(&self, _banner: &Banner, _outcome: &PollOutcome) {}
}

/// Presenter that shows nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPresenter;

impl Presenter for NoopPresenter {
    fn start(&self, _banner: &Banner) {}

    fn stop(&self) {}
}

/// Keeps a presenter running for the lifetime of the guard
///
/// `stop` runs exactly once, on [`PresenterGuard::stop`] or on drop,
/// so every exit path of the wait (including a dropped future) stops it.
pub(crate) struct PresenterGuard<'a> {
    presenter: &'a dyn Presenter,
    stopped: AtomicBool,
}

impl<'a> PresenterGuard<'a> {
    pub(crate) fn start(presenter: &'a dyn Presenter, banner: &Banner) -> Self {
        presenter.start(banner);
        Self {
            presenter,
            stopped: AtomicBool::new(false),
        }
    }

    pub(crate) fn stop(&self) {
        if !self.stopped.swap(true, Ordering::SeqCst) {
            self.presenter.stop();
        }
    }
}

impl Drop for PresenterGuard<'_> {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct CountingPresenter {
        starts: AtomicUsize,
        stops: AtomicUsize,
    }

    impl Presenter for CountingPresenter {
        fn start(&self, _banner: &Banner) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn stop(&self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_guard_stops_once() {
        let presenter = CountingPresenter::default();
        {
            let guard = PresenterGuard::start(&presenter, &Banner::Status);
            guard.stop();
            guard.stop();
        }
        assert_eq!(presenter.starts.load(Ordering::SeqCst), 1);
        assert_eq!(presenter.stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_guard_stops_on_drop() {
        let presenter = CountingPresenter::default();
        drop(PresenterGuard::start(&presenter, &Banner::Status));
        assert_eq!(presenter.stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_banner_text() {
        assert_eq!(Banner::Status.to_string(), "Status:");
        assert_eq!(
            Banner::StartingContainer {
                label: Some("one-off-4321".to_string())
            }
            .to_string(),
            "-----> Starting container one-off-4321"
        );
        assert_eq!(
            Banner::StartingContainer { label: None }.to_string(),
            "-----> Starting container"
        );
    }
}
