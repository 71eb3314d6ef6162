//! The daemon: connection lifecycle and the dispatch loop
//!
//! A `Daemon` owns one `Connection`, one `HandlerRegistry` and one
//! `FocusStateTracker`. Its lifecycle is
//!
//! ```text
//! Disconnected -> Connecting -> Syncing -> Running -> Stopping -> Stopped
//! ```
//!
//! Events are dispatched one at a time in transport order. For every event
//! the tracker observes it first, then each handler registered for its kind
//! runs in registration order with a snapshot of the focus state.

use std::fmt;
use std::future::Future;

use i3listen_ipc::{Event, EventKind};
use tracing::{debug, error, info, trace, warn};

use crate::connection::Connection;
use crate::error::{ConnectionError, DaemonError};
use crate::focus::{FocusSnapshot, FocusStateTracker};
use crate::handler::{Handler, HandlerId};
use crate::registry::HandlerRegistry;

/// Subscriber id used for the focus tracker's own subscriptions
pub const FOCUS_TRACKER_ID: &str = "focus-tracker";

/// Event kinds the focus tracker needs to see
pub const TRACKED_KINDS: [EventKind; 3] = [
    EventKind::WindowFocus,
    EventKind::WorkspaceFocus,
    EventKind::WindowClose,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaemonState {
    Disconnected,
    Connecting,
    Syncing,
    Running,
    Stopping,
    Stopped,
}

impl fmt::Display for DaemonState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Syncing => "syncing",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Why `Daemon::run` returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The window manager closed the event stream
    StreamEnded,
    /// The shutdown future resolved; `dropped_events` were buffered but
    /// never dispatched
    Cancelled { dropped_events: usize },
}

enum Step {
    Shutdown,
    Next(Result<Option<Event>, ConnectionError>),
}

pub struct Daemon<C> {
    state: DaemonState,
    connection: Option<C>,
    registry: HandlerRegistry,
    tracker: FocusStateTracker,
}

impl<C: Connection> Default for Daemon<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Connection> Daemon<C> {
    pub fn new() -> Self {
        Self {
            state: DaemonState::Disconnected,
            connection: None,
            registry: HandlerRegistry::new(),
            tracker: FocusStateTracker::new(),
        }
    }

    pub fn state(&self) -> DaemonState {
        self.state
    }

    pub fn snapshot(&self) -> FocusSnapshot {
        self.tracker.snapshot()
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Open the connection and subscribe the focus tracker
    ///
    /// The connector is called exactly once; retrying is its business. On
    /// failure the daemon is back in `Disconnected`.
    pub async fn connect<F, Fut>(&mut self, connector: F) -> Result<(), DaemonError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<C, ConnectionError>>,
    {
        if self.state != DaemonState::Disconnected {
            return Err(DaemonError::InvalidState {
                operation: "connect",
                state: self.state,
            });
        }

        self.state = DaemonState::Connecting;
        match open(connector).await {
            Ok(connection) => {
                self.connection = Some(connection);
                self.state = DaemonState::Syncing;
                debug!("Connected, focus tracker subscribed");
                Ok(())
            }
            Err(err) => {
                self.state = DaemonState::Disconnected;
                Err(err.into())
            }
        }
    }

    /// Seed the focus tracker from the full layout tree
    ///
    /// Also usable while running to resynchronize after drift. A transport
    /// failure here stops the daemon.
    pub async fn initial_sync(&mut self) -> Result<(), DaemonError> {
        self.require_connected("sync focus state")?;
        let connection = self.connection.as_mut().ok_or(DaemonError::NotConnected)?;

        let tree = match connection.get_tree().await {
            Ok(tree) => tree,
            Err(err) => {
                error!(error = %err, "Failed to fetch layout tree");
                self.stop();
                return Err(err.into());
            }
        };

        self.tracker.sync_from_tree(&tree);
        self.state = DaemonState::Running;

        debug!(snapshot = ?self.tracker.snapshot(), "Focus state synchronized");
        Ok(())
    }

    pub async fn register_event_handler(
        &mut self,
        kind: EventKind,
        handler: Handler,
    ) -> Result<(), DaemonError> {
        self.require_connected("register a handler")?;
        let connection = self.connection.as_mut().ok_or(DaemonError::NotConnected)?;
        self.registry.register(connection, kind, handler).await?;
        Ok(())
    }

    pub async fn unregister_event_handler(
        &mut self,
        kind: EventKind,
        handler: &HandlerId,
    ) -> Result<(), DaemonError> {
        self.require_connected("unregister a handler")?;
        let connection = self.connection.as_mut().ok_or(DaemonError::NotConnected)?;
        self.registry.unregister(connection, kind, handler).await?;
        Ok(())
    }

    /// Dispatch events until the stream ends or `shutdown` resolves
    ///
    /// `shutdown` is checked before each event is taken, so an in-flight
    /// dispatch always completes. Events still buffered at that point are
    /// logged and counted, not dispatched. The connection is released when
    /// this returns.
    pub async fn run<S>(&mut self, shutdown: S) -> Result<StopReason, DaemonError>
    where
        S: Future<Output = ()>,
    {
        if self.state != DaemonState::Running {
            self.require_connected("run")?;
            return Err(DaemonError::InvalidState {
                operation: "run",
                state: self.state,
            });
        }
        let mut connection = self.connection.take().ok_or(DaemonError::NotConnected)?;

        tokio::pin!(shutdown);
        info!(handlers = self.registry.len(), "Dispatching events");

        let reason = loop {
            let step = tokio::select! {
                biased;
                _ = &mut shutdown => Step::Shutdown,
                next = connection.next_event() => Step::Next(next),
            };

            match step {
                Step::Shutdown => {
                    let dropped = connection.take_buffered();
                    for event in &dropped {
                        warn!(kind = %event.kind, "Dropping undispatched event");
                    }
                    break StopReason::Cancelled {
                        dropped_events: dropped.len(),
                    };
                }
                Step::Next(Ok(Some(event))) => self.dispatch(&event),
                Step::Next(Ok(None)) => {
                    info!("Event stream closed by window manager");
                    break StopReason::StreamEnded;
                }
                Step::Next(Err(err)) => {
                    error!(error = %err, "Event stream failed");
                    self.stop();
                    return Err(err.into());
                }
            }
        };

        self.state = DaemonState::Stopping;
        drop(connection);
        self.state = DaemonState::Stopped;
        info!(reason = ?reason, "Daemon stopped");
        Ok(reason)
    }

    fn dispatch(&mut self, event: &Event) {
        self.tracker.observe(event);
        let focus = self.tracker.snapshot();

        let handlers = self.registry.handlers_for(event.kind);
        trace!(kind = %event.kind, handlers = handlers.len(), "Dispatching event");

        for handler in &handlers {
            if let Err(err) = handler.invoke(event, &focus) {
                error!(
                    kind = %event.kind,
                    handler = %handler.id(),
                    error = %err,
                    "Event handler failed"
                );
            }
        }
    }

    fn require_connected(&self, operation: &'static str) -> Result<(), DaemonError> {
        match self.state {
            DaemonState::Syncing | DaemonState::Running => Ok(()),
            DaemonState::Disconnected | DaemonState::Connecting => Err(DaemonError::NotConnected),
            state => Err(DaemonError::InvalidState { operation, state }),
        }
    }

    fn stop(&mut self) {
        self.state = DaemonState::Stopping;
        self.connection = None;
        self.state = DaemonState::Stopped;
    }
}

async fn open<C, F, Fut>(connector: F) -> Result<C, ConnectionError>
where
    C: Connection,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<C, ConnectionError>>,
{
    let mut connection = connector().await?;
    let tracker = HandlerId::from(FOCUS_TRACKER_ID);
    for kind in TRACKED_KINDS {
        connection.subscribe(kind, &tracker).await?;
    }
    Ok(connection)
}
