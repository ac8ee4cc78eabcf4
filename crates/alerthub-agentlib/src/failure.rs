//! Failure capture for the plugin failure channel.
//!
//! Handlers and legacy backend shims are allowed to raise arbitrary payloads,
//! not just error types. The capture primitives here normalize whatever is
//! propagating into a [`CapturedFailure`] whose kind is the payload's runtime
//! type and whose value is the payload itself, untouched.

use std::any::{Any, TypeId};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use crate::signal::RestartSignal;

/// Runtime type identity of a raised payload.
///
/// Computed from the payload at the moment of capture, never from a declared
/// error class. Two failures have equal kinds exactly when their payloads
/// share a concrete type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FailureKind(TypeId);

impl FailureKind {
    /// The kind a payload of type `T` would capture as.
    pub fn of<T: Any>() -> Self {
        Self(TypeId::of::<T>())
    }

    /// The underlying type id.
    pub fn type_id(&self) -> TypeId {
        self.0
    }
}

/// A normalized in-flight failure: the runtime kind of what was raised plus
/// the raised value itself.
///
/// Constructed exactly once per failure at the capture point and immutable
/// afterwards. The value is the very object that was raised, not a copy.
pub struct CapturedFailure {
    kind: FailureKind,
    value: Box<dyn Any + Send>,
}

impl CapturedFailure {
    /// The runtime kind of the raised payload.
    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    /// Whether the payload is a `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.kind == FailureKind::of::<T>()
    }

    /// Borrow the payload as a `T`, if that is its runtime type.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// Take the payload as a `T`, handing the failure back untouched on a
    /// type mismatch.
    pub fn downcast<T: Any>(self) -> Result<Box<T>, CapturedFailure> {
        let kind = self.kind;
        match self.value.downcast::<T>() {
            Ok(value) => Ok(value),
            Err(value) => Err(CapturedFailure { kind, value }),
        }
    }

    /// Take the raw payload.
    pub fn into_value(self) -> Box<dyn Any + Send> {
        self.value
    }

    /// The payload's message, when it carries one (`&str` or `String`
    /// payloads, as produced by `panic!` with a message).
    pub fn message(&self) -> Option<&str> {
        if let Some(s) = self.value.downcast_ref::<&'static str>() {
            Some(s)
        } else if let Some(s) = self.value.downcast_ref::<String>() {
            Some(s)
        } else {
            None
        }
    }
}

impl fmt::Debug for CapturedFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapturedFailure")
            .field("kind", &self.kind)
            .field("message", &self.message())
            .finish()
    }
}

impl fmt::Display for CapturedFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(message) = self.message() {
            write!(f, "{}", message)
        } else if let Some(signal) = self.downcast_ref::<RestartSignal>() {
            write!(f, "restart signal ({})", signal)
        } else {
            write!(f, "non-message failure payload ({:?})", self.kind)
        }
    }
}

/// Normalize a propagating payload into a [`CapturedFailure`].
///
/// The kind is read from the payload's runtime type; the value is the same
/// box that was raised. Only meaningful for a payload taken off the failure
/// channel; there is no ambient failure to capture outside one.
pub fn capture_failure(payload: Box<dyn Any + Send>) -> CapturedFailure {
    let kind = FailureKind((*payload).type_id());
    CapturedFailure {
        kind,
        value: payload,
    }
}

/// Run `f` inside a failure-handling scope.
///
/// Anything raised out of `f`, including a [`RestartSignal`] or an arbitrary
/// legacy payload, is captured and normalized. This is the single supported
/// way to observe an in-flight failure.
pub fn catch_failure<R>(f: impl FnOnce() -> R) -> Result<R, CapturedFailure> {
    // Dispatch never mutates the registry, so an unwind cannot leave it
    // half-updated.
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(capture_failure)
}

/// Raise an arbitrary payload into the failure channel.
pub fn raise<T: Any + Send>(value: T) -> ! {
    panic::panic_any(value)
}
