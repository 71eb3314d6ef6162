//! Error types for the dispatch core

use i3listen_ipc::{EventKind, IpcError};
use thiserror::Error;

use crate::daemon::DaemonState;
use crate::handler::HandlerId;

/// Transport-level failures of a `Connection`
///
/// Always fatal to the dispatch loop.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error(transparent)]
    Ipc(#[from] IpcError),
}

/// Registry-level failures; local and recoverable
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Handler '{handler}' is already registered for {kind}")]
    AlreadyRegistered { kind: EventKind, handler: HandlerId },

    #[error("Handler '{handler}' is not registered for {kind}")]
    NotRegistered { kind: EventKind, handler: HandlerId },

    #[error("Failed to subscribe handler '{handler}' to {kind}: {source}")]
    Subscribe {
        kind: EventKind,
        handler: HandlerId,
        #[source]
        source: ConnectionError,
    },

    #[error("Failed to unsubscribe handler '{handler}' from {kind}: {source}")]
    Unsubscribe {
        kind: EventKind,
        handler: HandlerId,
        #[source]
        source: ConnectionError,
    },
}

/// Errors surfaced by `Daemon` operations
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("Daemon is not connected to the window manager")]
    NotConnected,

    #[error("Cannot {operation} while daemon is {state}")]
    InvalidState {
        operation: &'static str,
        state: DaemonState,
    },

    #[error("Window manager connection failed: {0}")]
    Connection(#[from] ConnectionError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}
