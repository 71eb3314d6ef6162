//! `Connection` backed by the i3 IPC socket
//!
//! Two sockets are used: an `I3Client` for tree queries and an
//! `I3EventStream` for events. i3 has no way to unsubscribe from an
//! event type, so interests are tracked here and events nobody asked for are
//! dropped before they reach the daemon.

use std::collections::HashSet;

use i3listen_ipc::{Event, EventKind, EventType, I3Client, I3EventStream, Node};
use tracing::{debug, info, trace};

use super::Connection;
use crate::config::DaemonConfig;
use crate::error::ConnectionError;
use crate::handler::HandlerId;

#[derive(Debug)]
pub struct I3Connection {
    client: I3Client,
    events: I3EventStream,
    /// One entry per `subscribe` call; duplicates allowed
    interests: Vec<(EventKind, HandlerId)>,
    /// Event types already sent in a `SUBSCRIBE` request
    subscribed: HashSet<EventType>,
}

impl I3Connection {
    /// Discover the socket and open both connections
    ///
    /// Discovery and the request socket are retried `config.connect_retries`
    /// times; the event socket is opened once the window manager has
    /// answered.
    pub async fn connect(config: &DaemonConfig) -> Result<Self, ConnectionError> {
        let mut client =
            I3Client::connect_with_retry(config.socket_path.as_deref(), config.connect_retries)
                .await?;
        let version = client.get_version().await?;
        info!(
            "Connected to window manager {} at {}",
            version.human_readable,
            client.socket_path().display()
        );

        let events = I3EventStream::connect(client.socket_path(), config.event_buffer).await?;

        Ok(Self {
            client,
            events,
            interests: Vec::new(),
            subscribed: HashSet::new(),
        })
    }

    fn is_wanted(&self, kind: EventKind) -> bool {
        self.interests.iter().any(|(k, _)| *k == kind)
    }
}

impl Connection for I3Connection {
    async fn get_tree(&mut self) -> Result<Node, ConnectionError> {
        Ok(self.client.get_tree().await?)
    }

    async fn subscribe(&mut self, kind: EventKind, subscriber: &HandlerId) -> Result<(), ConnectionError> {
        let event_type = kind.event_type();
        if !self.subscribed.contains(&event_type) {
            self.events.subscribe(&[event_type]).await?;
            self.subscribed.insert(event_type);
        }

        self.interests.push((kind, subscriber.clone()));
        debug!(kind = %kind, subscriber = %subscriber, "Subscribed");
        Ok(())
    }

    async fn unsubscribe(&mut self, kind: EventKind, subscriber: &HandlerId) -> Result<(), ConnectionError> {
        if let Some(position) = self
            .interests
            .iter()
            .position(|(k, id)| *k == kind && id == subscriber)
        {
            self.interests.remove(position);
        }

        if !self.is_wanted(kind) {
            debug!(kind = %kind, "No subscribers left, filtering locally");
        }
        Ok(())
    }

    async fn next_event(&mut self) -> Result<Option<Event>, ConnectionError> {
        loop {
            let Some(event) = self.events.next_event().await? else {
                return Ok(None);
            };

            if self.is_wanted(event.kind) {
                return Ok(Some(event));
            }
            trace!(kind = %event.kind, "Dropping event without subscribers");
        }
    }

    fn take_buffered(&mut self) -> Vec<Event> {
        let buffered = self.events.drain_buffered();
        buffered
            .into_iter()
            .filter(|event| self.is_wanted(event.kind))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use i3listen_ipc::fixtures::{complete, frame, window_event};
    use i3listen_ipc::SimpleContainer;
    use serde_json::json;
    use tempfile::tempdir;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{UnixListener, UnixStream};

    async fn read_request(stream: &mut UnixStream) -> Option<u32> {
        let mut header = [0u8; 14];
        stream.read_exact(&mut header).await.ok()?;
        let len = u32::from_ne_bytes(header[6..10].try_into().unwrap()) as usize;
        let msg_type = u32::from_ne_bytes(header[10..14].try_into().unwrap());
        let mut payload = vec![0u8; len];
        stream.read_exact(&mut payload).await.ok()?;
        Some(msg_type)
    }

    /// Minimal i3: answers version/tree requests and, after a subscribe,
    /// emits a title change followed by a focus change
    async fn fake_i3(listener: UnixListener) {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                return;
            };
            tokio::spawn(async move {
                while let Some(msg_type) = read_request(&mut stream).await {
                    let reply = match msg_type {
                        7 => {
                            let version = json!({
                                "major": 4,
                                "minor": 23,
                                "patch": 0,
                                "human_readable": "4.23",
                                "loaded_config_file_name": "/etc/i3/config"
                            });
                            frame(7, version.to_string().as_bytes())
                        }
                        4 => {
                            let tree = complete(json!({ "id": 1, "type": "root" }));
                            frame(4, tree.to_string().as_bytes())
                        }
                        2 => {
                            let mut out = frame(2, br#"{"success":true}"#);
                            out.extend(window_event("title", 5, "vim"));
                            out.extend(window_event("focus", 10, "term"));
                            out
                        }
                        _ => return,
                    };
                    if stream.write_all(&reply).await.is_err() {
                        return;
                    }
                    if msg_type == 2 {
                        // close after the events so the stream ends
                        return;
                    }
                }
            });
        }
    }

    fn config_for(path: std::path::PathBuf) -> DaemonConfig {
        DaemonConfig {
            socket_path: Some(path),
            connect_retries: 0,
            ..DaemonConfig::default()
        }
    }

    #[tokio::test]
    async fn test_events_without_subscribers_are_filtered() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("i3.sock");
        let listener = UnixListener::bind(&path).unwrap();
        let server = tokio::spawn(fake_i3(listener));

        let mut connection = I3Connection::connect(&config_for(path)).await.unwrap();
        connection
            .subscribe(EventKind::WindowFocus, &HandlerId::from("test"))
            .await
            .unwrap();

        let event = connection.next_event().await.unwrap().expect("event");
        assert_eq!(event.kind, EventKind::WindowFocus);
        assert_eq!(event.container, Some(SimpleContainer::new(10, "term")));

        assert!(connection.next_event().await.unwrap().is_none());
        server.abort();
    }

    #[tokio::test]
    async fn test_get_tree_and_interest_tracking() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("i3.sock");
        let listener = UnixListener::bind(&path).unwrap();
        let server = tokio::spawn(fake_i3(listener));

        let mut connection = I3Connection::connect(&config_for(path)).await.unwrap();
        let tree = connection.get_tree().await.unwrap();
        assert_eq!(tree.id, 1);

        let a = HandlerId::from("a");
        let b = HandlerId::from("b");
        connection.subscribe(EventKind::WindowTitle, &a).await.unwrap();
        connection.subscribe(EventKind::WindowTitle, &b).await.unwrap();
        assert_eq!(connection.subscribed.len(), 1);

        connection.unsubscribe(EventKind::WindowTitle, &a).await.unwrap();
        assert!(connection.is_wanted(EventKind::WindowTitle));
        connection.unsubscribe(EventKind::WindowTitle, &b).await.unwrap();
        assert!(!connection.is_wanted(EventKind::WindowTitle));
        server.abort();
    }

    #[tokio::test]
    async fn test_connect_missing_socket() {
        let dir = tempdir().unwrap();
        let err = I3Connection::connect(&config_for(dir.path().join("absent.sock")))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ConnectionError::Ipc(i3listen_ipc::IpcError::SocketNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_connect_waits_for_late_socket() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("i3.sock");

        let late = path.clone();
        let server = tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(150)).await;
            fake_i3(UnixListener::bind(&late).unwrap()).await
        });

        let config = DaemonConfig {
            connect_retries: 5,
            ..config_for(path)
        };
        let mut connection = I3Connection::connect(&config).await.unwrap();
        assert_eq!(connection.get_tree().await.unwrap().id, 1);
        server.abort();
    }
}
