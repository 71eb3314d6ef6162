//! In-memory `Connection` for tests

use std::collections::VecDeque;

use i3listen_ipc::fixtures::node;
use i3listen_ipc::{Event, EventKind, IpcError, Node};
use serde_json::json;

use super::Connection;
use crate::error::ConnectionError;
use crate::handler::HandlerId;

#[derive(Debug)]
pub(crate) struct FakeConnection {
    /// Returned in order by `next_event`
    pub events: VecDeque<Result<Event, ConnectionError>>,
    pub tree: Node,
    pub subscriptions: Vec<(EventKind, HandlerId)>,
    pub unsubscriptions: Vec<(EventKind, HandlerId)>,
    pub tree_requests: usize,
    pub fail_subscribe: bool,
    pub fail_get_tree: bool,
    /// Block forever instead of reporting end of stream once `events` is empty
    pub hang_when_empty: bool,
}

impl FakeConnection {
    pub fn new() -> Self {
        Self {
            events: VecDeque::new(),
            tree: node(json!({ "id": 1, "type": "root" })),
            subscriptions: Vec::new(),
            unsubscriptions: Vec::new(),
            tree_requests: 0,
            fail_subscribe: false,
            fail_get_tree: false,
            hang_when_empty: false,
        }
    }

    pub fn with_events(events: impl IntoIterator<Item = Event>) -> Self {
        let mut connection = Self::new();
        connection.events = events.into_iter().map(Ok).collect();
        connection
    }
}

impl Connection for FakeConnection {
    async fn get_tree(&mut self) -> Result<Node, ConnectionError> {
        self.tree_requests += 1;
        if self.fail_get_tree {
            return Err(IpcError::ConnectionClosed.into());
        }
        Ok(self.tree.clone())
    }

    async fn subscribe(&mut self, kind: EventKind, subscriber: &HandlerId) -> Result<(), ConnectionError> {
        if self.fail_subscribe {
            return Err(IpcError::SubscribeRejected {
                events: kind.to_string(),
            }
            .into());
        }
        self.subscriptions.push((kind, subscriber.clone()));
        Ok(())
    }

    async fn unsubscribe(&mut self, kind: EventKind, subscriber: &HandlerId) -> Result<(), ConnectionError> {
        self.unsubscriptions.push((kind, subscriber.clone()));
        Ok(())
    }

    async fn next_event(&mut self) -> Result<Option<Event>, ConnectionError> {
        match self.events.pop_front() {
            Some(Ok(event)) => Ok(Some(event)),
            Some(Err(err)) => Err(err),
            None if self.hang_when_empty => std::future::pending().await,
            None => Ok(None),
        }
    }

    fn take_buffered(&mut self) -> Vec<Event> {
        self.events.drain(..).filter_map(Result::ok).collect()
    }
}
