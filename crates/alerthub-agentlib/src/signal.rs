//! Restart signalling for the agent main loop.

use std::fmt;

use crate::failure;

/// Control-flow token requesting that the agent loop restart instead of
/// terminating.
///
/// The signal travels the same failure channel as ordinary failures
/// ([`RestartSignal::raise`]); the loop recognizes it by type before generic
/// failure handling runs, then reads [`should_restart`](Self::should_restart)
/// to pick between re-entering setup and shutting down. One-shot and
/// immutable after construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestartSignal {
    restart: bool,
}

impl RestartSignal {
    /// Create a signal that does not request a restart.
    ///
    /// Raising this tells the loop to terminate cleanly.
    pub fn new() -> Self {
        Self { restart: false }
    }

    /// Create a signal that requests a restart.
    pub fn restart() -> Self {
        Self { restart: true }
    }

    /// Whether a restart is requested.
    pub fn should_restart(&self) -> bool {
        self.restart
    }

    /// Raise this signal into the failure channel.
    pub fn raise(self) -> ! {
        failure::raise(self)
    }
}

impl fmt::Display for RestartSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.restart {
            write!(f, "RESTART")
        } else {
            write!(f, "STOP")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::failure::{catch_failure, FailureKind};

    #[test]
    fn test_default_does_not_request_restart() {
        assert!(!RestartSignal::new().should_restart());
        assert!(!RestartSignal::default().should_restart());
    }

    #[test]
    fn test_restart_constructor_requests_restart() {
        assert!(RestartSignal::restart().should_restart());
    }

    #[test]
    fn test_display() {
        assert_eq!(RestartSignal::restart().to_string(), "RESTART");
        assert_eq!(RestartSignal::new().to_string(), "STOP");
    }

    #[test]
    fn test_raise_travels_failure_channel() {
        let failure = catch_failure(|| RestartSignal::restart().raise())
            .err()
            .unwrap();

        assert_eq!(failure.kind(), FailureKind::of::<RestartSignal>());
        let signal = failure.downcast_ref::<RestartSignal>().unwrap();
        assert!(signal.should_restart());
    }

    #[test]
    fn test_distinguishable_from_other_failures() {
        let failure = catch_failure(|| crate::failure::raise(1.5f64)).err().unwrap();
        assert!(!failure.is::<RestartSignal>());
    }
}
