//! The agent main loop.
//!
//! Pulls decoded messages from a [`MessageSource`], dispatches each one
//! through the plugin's [`CallbackRegistry`] inside a failure-handling
//! scope, and applies the recovery policy: keep running after recoverable
//! handler failures, re-enter setup on a restart signal, terminate on a
//! stop signal or an exhausted restart budget.

#[cfg(test)]
#[path = "runloop_tests.rs"]
mod tests;

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info, warn};

use alerthub_agentlib::callback::CallbackRegistry;
use alerthub_agentlib::failure::catch_failure;
use alerthub_agentlib::signal::RestartSignal;

use crate::config::{FailurePolicy, RunLoopConfig};
use crate::error::RunLoopError;
use crate::source::MessageSource;
use crate::status::LoopStatus;

/// Loop lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Processing messages.
    Running,
    /// Tearing down and re-entering setup after a restart signal.
    Restarting,
    /// The loop has exited and will not process further messages.
    Terminated,
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoopState::Running => write!(f, "running"),
            LoopState::Restarting => write!(f, "restarting"),
            LoopState::Terminated => write!(f, "terminated"),
        }
    }
}

/// Why the loop exited without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// The message source closed; no more messages will arrive.
    SourceClosed,
    /// A handler raised a non-restart [`RestartSignal`], requesting a clean
    /// stop.
    Stopped,
}

/// Plugin hook run at loop start and again on every restart.
///
/// `setup` rebuilds the handler table from scratch; the previous registry is
/// discarded before each call, so restarts always start from a clean slate.
pub trait PluginLifecycle: Send {
    /// Build the handler table.
    fn setup(&mut self, registry: &mut CallbackRegistry) -> Result<(), RunLoopError>;

    /// Release per-run resources before a restart or termination.
    fn teardown(&mut self) {}
}

/// Sliding-window restart bookkeeping.
struct RestartTracker {
    restarts: VecDeque<Instant>,
    max_restarts: u32,
    window: std::time::Duration,
}

impl RestartTracker {
    fn new(config: &RunLoopConfig) -> Self {
        Self {
            restarts: VecDeque::new(),
            max_restarts: config.max_restarts,
            window: config.restart_window(),
        }
    }

    /// Record a restart; returns `true` if the limit is now exceeded.
    fn record_restart(&mut self) -> bool {
        let now = Instant::now();

        while let Some(front) = self.restarts.front() {
            if now.duration_since(*front) > self.window {
                self.restarts.pop_front();
            } else {
                break;
            }
        }

        self.restarts.push_back(now);
        self.restarts.len() as u32 > self.max_restarts
    }

    fn count(&self) -> u32 {
        self.restarts.len() as u32
    }
}

/// The agent main loop for one plugin process.
pub struct AgentLoop<L: PluginLifecycle> {
    config: RunLoopConfig,
    lifecycle: L,
    registry: CallbackRegistry,
    state: LoopState,
    status: Arc<LoopStatus>,
    restart_tracker: RestartTracker,
}

impl<L: PluginLifecycle> AgentLoop<L> {
    /// Create a loop with a validated configuration.
    pub fn new(config: RunLoopConfig, lifecycle: L) -> Result<Self, RunLoopError> {
        config.validate().map_err(RunLoopError::Config)?;

        let restart_tracker = RestartTracker::new(&config);
        Ok(Self {
            config,
            lifecycle,
            registry: CallbackRegistry::new(),
            state: LoopState::Terminated,
            status: Arc::new(LoopStatus::new()),
            restart_tracker,
        })
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Shared status handle for operator visibility.
    pub fn status(&self) -> Arc<LoopStatus> {
        self.status.clone()
    }

    /// Run until the source closes, a stop is requested, or an error
    /// terminates the loop.
    ///
    /// Messages are processed one at a time: dispatch is synchronous and the
    /// next message is not pulled until the current one finished or its
    /// failure was handled.
    pub async fn run<S: MessageSource>(&mut self, mut source: S) -> Result<LoopExit, RunLoopError> {
        self.enter_setup()?;

        loop {
            let Some(message) = source.next_message().await else {
                info!("Message source closed, terminating");
                self.terminate();
                return Ok(LoopExit::SourceClosed);
            };

            self.status.record_message();

            let outcome = catch_failure(|| self.registry.dispatch(message.code, &message.call));
            let Err(captured) = outcome else {
                continue;
            };

            // The restart signal is matched before generic failure handling.
            if let Some(signal) = captured.downcast_ref::<RestartSignal>() {
                if signal.should_restart() {
                    self.restart().await?;
                    continue;
                }
                info!(code = %message.code, "Stop requested, terminating");
                self.terminate();
                return Ok(LoopExit::Stopped);
            }

            self.status.record_failure(&captured);
            match self.config.on_failure {
                FailurePolicy::Continue => {
                    warn!(
                        code = %message.code,
                        kind = ?captured.kind(),
                        "Handler failure: {}; continuing after backoff",
                        captured
                    );
                    tokio::time::sleep(self.config.failure_backoff()).await;
                }
                FailurePolicy::Terminate => {
                    error!(
                        code = %message.code,
                        kind = ?captured.kind(),
                        "Handler failure: {}; terminating",
                        captured
                    );
                    self.terminate();
                    return Err(RunLoopError::FatalFailure(captured.to_string()));
                }
            }
        }
    }

    /// Rebuild the handler table and enter `Running`.
    fn enter_setup(&mut self) -> Result<(), RunLoopError> {
        self.registry = CallbackRegistry::new();
        if let Err(e) = self.lifecycle.setup(&mut self.registry) {
            error!("Plugin setup failed: {}", e);
            self.state = LoopState::Terminated;
            return Err(e);
        }

        self.state = LoopState::Running;
        info!(
            codes = self.registry.len(),
            "Plugin setup complete, loop running"
        );
        Ok(())
    }

    /// Handle a restart-requesting signal.
    async fn restart(&mut self) -> Result<(), RunLoopError> {
        self.state = LoopState::Restarting;
        self.status.record_restart();

        if self.restart_tracker.record_restart() {
            error!(
                max = self.config.max_restarts,
                window = ?self.config.restart_window(),
                "Restart budget exhausted, terminating"
            );
            self.terminate();
            return Err(RunLoopError::MaxRestartsExceeded {
                max: self.config.max_restarts,
            });
        }

        info!(
            restart = self.restart_tracker.count(),
            max = self.config.max_restarts,
            delay = ?self.config.restart_delay(),
            "Restart requested, re-entering setup"
        );

        self.lifecycle.teardown();
        tokio::time::sleep(self.config.restart_delay()).await;
        self.enter_setup()
    }

    fn terminate(&mut self) {
        self.lifecycle.teardown();
        self.state = LoopState::Terminated;
    }
}
