//! Window manager connection capability
//!
//! The daemon only needs four things from its transport: the layout tree,
//! subscribing and unsubscribing interest in event kinds, and the next event.
//! `Connection` captures exactly that so the dispatch core can run against
//! i3 (`I3Connection`) or an in-memory fake in tests.

mod i3;

#[cfg(test)]
pub(crate) mod fake;

use std::future::Future;

use i3listen_ipc::{Event, EventKind, Node};

pub use i3::I3Connection;

use crate::error::ConnectionError;
use crate::handler::HandlerId;

pub trait Connection: Send {
    /// Fetch the full layout tree
    fn get_tree(&mut self) -> impl Future<Output = Result<Node, ConnectionError>> + Send;

    /// Register `subscriber`'s interest in `kind`
    fn subscribe(
        &mut self,
        kind: EventKind,
        subscriber: &HandlerId,
    ) -> impl Future<Output = Result<(), ConnectionError>> + Send;

    /// Withdraw one interest previously registered with `subscribe`
    fn unsubscribe(
        &mut self,
        kind: EventKind,
        subscriber: &HandlerId,
    ) -> impl Future<Output = Result<(), ConnectionError>> + Send;

    /// Wait for the next event somebody is subscribed to
    ///
    /// `Ok(None)` means the transport closed. Must be cancel-safe.
    fn next_event(&mut self) -> impl Future<Output = Result<Option<Event>, ConnectionError>> + Send;

    /// Events received but not yet returned by `next_event`
    fn take_buffered(&mut self) -> Vec<Event>;
}
