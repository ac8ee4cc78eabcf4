//! Command dispatch for decoded hub procedure calls.
//!
//! The transport layer decodes each inbound message into a command code plus
//! an argument bundle; the [`CallbackRegistry`] decouples "a message with
//! code C arrived" from "what code should run". Registration happens during
//! plugin setup, dispatch afterwards, one message at a time.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// Numeric code tagging an inbound procedure-call message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandCode(pub u16);

impl CommandCode {
    /// Exchange supported procedures with the hub server.
    pub const EXCHANGE_PROFILE: CommandCode = CommandCode(1);
    /// Push collected metric items to the hub.
    pub const PUT_ITEMS: CommandCode = CommandCode(2);
    /// Push metric history samples to the hub.
    pub const PUT_HISTORY: CommandCode = CommandCode(3);
    /// Push alert events to the hub.
    pub const UPDATE_EVENTS: CommandCode = CommandCode(4);
    /// Refresh the monitored host inventory.
    pub const UPDATE_HOSTS: CommandCode = CommandCode(5);
    /// Refresh trigger (alert rule) definitions.
    pub const UPDATE_TRIGGERS: CommandCode = CommandCode(6);
    /// Re-acquire data from the monitored backend (poll tick).
    pub const FETCH_ITEMS: CommandCode = CommandCode(7);
}

impl fmt::Display for CommandCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cmd:{}", self.0)
    }
}

/// The canonical argument bundle handed to every handler: ordered positional
/// arguments plus named keyword arguments, both as decoded JSON values.
///
/// The registry never inspects the bundle; its shape is a private matter
/// between the message producer and the handlers subscribed to the code.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandCall {
    /// Positional arguments, in wire order.
    #[serde(default)]
    pub positional: Vec<Value>,
    /// Keyword arguments.
    #[serde(default)]
    pub keyword: Map<String, Value>,
}

impl CommandCall {
    /// Create an empty call.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional argument.
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Set a keyword argument.
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.keyword.insert(name.into(), value.into());
        self
    }
}

/// A registered callable invoked when its command code's message arrives.
///
/// No constraint is placed on what a handler does with the arguments, and a
/// handler is free to raise into the failure channel; the registry never
/// catches.
pub trait CommandHandler: Send + Sync {
    /// Handle one dispatched call.
    fn invoke(&self, call: &CommandCall);
}

impl<F> CommandHandler for F
where
    F: Fn(&CommandCall) + Send + Sync,
{
    fn invoke(&self, call: &CommandCall) {
        self(call)
    }
}

/// Mapping from command code to the ordered list of handlers subscribed to
/// it.
///
/// Registration order is preserved per code and duplicates are allowed.
/// Registration is a setup-phase operation (`&mut self`); dispatch never
/// mutates, so the mapping and every handler list remain valid after any
/// handler failure.
#[derive(Default)]
pub struct CallbackRegistry {
    handlers: HashMap<CommandCode, Vec<Arc<dyn CommandHandler>>>,
}

impl CallbackRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe `handler` to `code`.
    ///
    /// The handler is appended to the code's list, creating the list on
    /// first use. Every registration is retained, in order.
    pub fn register(&mut self, code: CommandCode, handler: Arc<dyn CommandHandler>) {
        self.handlers.entry(code).or_default().push(handler);
        debug!(code = %code, "Registered handler");
    }

    /// Dispatch one decoded message to the handlers subscribed to `code`.
    ///
    /// Handlers run synchronously, in registration order, each receiving the
    /// exact call. A code nobody subscribed to is not an error; the dispatch
    /// simply does nothing. A failure raised by a handler propagates to the
    /// caller unmodified, skipping the remaining handlers for this call.
    pub fn dispatch(&self, code: CommandCode, call: &CommandCall) {
        let Some(handlers) = self.handlers.get(&code) else {
            debug!(code = %code, "No handlers subscribed, ignoring");
            return;
        };

        for handler in handlers {
            handler.invoke(call);
        }
    }

    /// Number of handlers subscribed to `code`.
    pub fn handler_count(&self, code: CommandCode) -> usize {
        self.handlers.get(&code).map_or(0, Vec::len)
    }

    /// Codes with at least one handler.
    pub fn registered_codes(&self) -> Vec<CommandCode> {
        let mut codes: Vec<CommandCode> = self.handlers.keys().copied().collect();
        codes.sort();
        codes
    }

    /// Number of codes with at least one handler.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("codes", &self.registered_codes())
            .finish()
    }
}
