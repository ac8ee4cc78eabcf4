//! # Alerthub RunLoop
//!
//! The agent main loop for alerthub monitoring-backend plugins.
//!
//! ## Features
//!
//! - Message-driven dispatch through `alerthub-agentlib`'s callback registry
//! - Graceful restart on a [`RestartSignal`](alerthub_agentlib::RestartSignal)
//!   with a sliding-window restart budget
//! - Configurable handler-failure policy with backoff
//! - Periodic poll timer for pull-style backends
//! - Loop status counters for operator visibility
//!
//! ## Usage
//!
//! ```rust,ignore
//! use alerthub_runloop::{AgentLoop, ChannelSource, PluginLifecycle, RunLoopConfig};
//!
//! let (tx, source) = ChannelSource::new(64);
//! // hand `tx` to the transport bridge and/or a PollTimer
//! let mut agent_loop = AgentLoop::new(RunLoopConfig::default(), lifecycle)?;
//! let exit = agent_loop.run(source).await?;
//! ```

pub mod config;
pub mod error;
pub mod runloop;
pub mod source;
pub mod status;
pub mod timer;

// Re-exports
pub use config::{FailurePolicy, RunLoopConfig};
pub use error::RunLoopError;
pub use runloop::{AgentLoop, LoopExit, LoopState, PluginLifecycle};
pub use source::{ChannelSource, InboundMessage, MessageSource};
pub use status::{FailureRecord, LoopStatus};
pub use timer::PollTimer;
