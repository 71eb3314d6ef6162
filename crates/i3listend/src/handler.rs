//! Event handlers and their identities
//!
//! Closures can't be compared, so every handler carries an explicit
//! `HandlerId`. Two handlers are the same handler iff their ids match.

use std::any::Any;
use std::error::Error as StdError;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use i3listen_ipc::Event;
use thiserror::Error;

use crate::focus::FocusSnapshot;

/// Stable identifier of a handler (newtype for type safety)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HandlerId(String);

impl HandlerId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for HandlerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for HandlerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Failure raised from inside a handler
#[derive(Debug, Error)]
#[error("{message}")]
pub struct HandlerError {
    message: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let detail = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        Self::new(format!("handler panicked: {}", detail))
    }
}

/// Something that reacts to a dispatched event
///
/// Handlers see the focus state as it was right after the event was
/// observed, never the tracker itself.
pub trait EventHandler: Send + Sync {
    fn handle(&self, event: &Event, focus: &FocusSnapshot) -> Result<(), HandlerError>;
}

impl<F> EventHandler for F
where
    F: Fn(&Event, &FocusSnapshot) -> Result<(), HandlerError> + Send + Sync,
{
    fn handle(&self, event: &Event, focus: &FocusSnapshot) -> Result<(), HandlerError> {
        self(event, focus)
    }
}

/// A registered handler: an id plus a shared callback
#[derive(Clone)]
pub struct Handler {
    id: HandlerId,
    callback: Arc<dyn EventHandler>,
}

impl Handler {
    pub fn new(id: impl Into<HandlerId>, handler: impl EventHandler + 'static) -> Self {
        Self {
            id: id.into(),
            callback: Arc::new(handler),
        }
    }

    /// Build a handler from a closure
    pub fn from_fn<F>(id: impl Into<HandlerId>, f: F) -> Self
    where
        F: Fn(&Event, &FocusSnapshot) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        Self::new(id, f)
    }

    pub fn id(&self) -> &HandlerId {
        &self.id
    }

    /// Run the handler, turning a panic into a `HandlerError`
    pub fn invoke(&self, event: &Event, focus: &FocusSnapshot) -> Result<(), HandlerError> {
        catch_unwind(AssertUnwindSafe(|| self.callback.handle(event, focus)))
            .unwrap_or_else(|payload| Err(HandlerError::from_panic(payload)))
    }
}

impl PartialEq for Handler {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Handler {}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler").field("id", &self.id).finish()
    }
}
