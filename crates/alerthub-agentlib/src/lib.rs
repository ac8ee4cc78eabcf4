//! # Alerthub Agent Library
//!
//! Agent-side runtime core for alerthub monitoring-backend plugins. Every
//! plugin process links against this crate for the three primitives its main
//! loop is built on:
//!
//! - **Command dispatch**: [`CallbackRegistry`] routes decoded
//!   procedure-call messages to registered handlers by numeric
//!   [`CommandCode`], in registration order.
//! - **Failure capture**: [`catch_failure`] / [`capture_failure`] normalize
//!   whatever a handler raised into a [`CapturedFailure`], even when the
//!   payload is not a conventional error type (legacy backend shims raise
//!   arbitrary objects).
//! - **Restart signalling**: [`RestartSignal`] travels the failure channel
//!   and tells the loop to re-enter setup instead of dying.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use alerthub_agentlib::{CallbackRegistry, CommandCall, CommandCode, catch_failure};
//! use std::sync::Arc;
//!
//! let mut registry = CallbackRegistry::new();
//! registry.register(
//!     CommandCode::PUT_ITEMS,
//!     Arc::new(|call: &CommandCall| push_items(call)),
//! );
//!
//! let outcome = catch_failure(|| registry.dispatch(CommandCode::PUT_ITEMS, &call));
//! ```
//!
//! The transport connection and message decoding live outside this crate;
//! the loop driving the registry lives in `alerthub-runloop`.

pub mod callback;
pub mod failure;
pub mod signal;

// Re-exports
pub use callback::{CallbackRegistry, CommandCall, CommandCode, CommandHandler};
pub use failure::{capture_failure, catch_failure, raise, CapturedFailure, FailureKind};
pub use signal::RestartSignal;
