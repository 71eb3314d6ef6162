//! i3 IPC event stream implementation
//!
//! This module provides `I3EventStream` for receiving real-time events from
//! i3. The stream owns a dedicated socket: after a `SUBSCRIBE` request, i3
//! interleaves event frames with the replies to later requests, so this
//! socket is never used for anything but subscriptions.
//!
//! ## Architecture
//!
//! ```text
//! +-------------+      +---------+      +---------------+
//! | reader task | ---> | mpsc    | ---> | next_event()  |
//! | (read half) |      | channel |      | (dispatcher)  |
//! +-------------+      +---------+      +---------------+
//!        ^   |
//!        |   +--- reply (oneshot) ---> subscribe() (write half)
//!        +------- waiter (mpsc) ------/
//! ```
//!
//! The reader decodes every frame. Events go through the bounded event
//! channel. Before writing a request, `subscribe()` hands the reader a
//! oneshot for the reply. While a reply is awaited the reader never blocks
//! on a full event channel; it keeps reading and holds the overflow in a
//! local queue until the reply has been delivered.

use std::collections::VecDeque;
use std::path::Path;

use swayipc_types::{CommandType, EventType, Success};
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::UnixStream;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use super::error::IpcError;
use super::event::Event;
use super::protocol::{read_message, write_command, Message};

/// Default channel buffer size for decoded events
///
/// This determines how many events can be buffered before the reader task
/// stops reading from the socket.
pub const DEFAULT_CHANNEL_BUFFER: usize = 64;

type Waiter = oneshot::Sender<Message>;

/// Subscribed i3 event socket
///
/// # Example
///
/// ```ignore
/// let mut stream = I3EventStream::connect(&path, DEFAULT_CHANNEL_BUFFER).await?;
/// stream.subscribe(&[EventType::Window]).await?;
/// while let Some(event) = stream.next_event().await? {
///     println!("{}", event.kind);
/// }
/// ```
#[derive(Debug)]
pub struct I3EventStream {
    writer: OwnedWriteHalf,
    events: mpsc::Receiver<Result<Event, IpcError>>,
    waiters: mpsc::Sender<Waiter>,
    reader: JoinHandle<()>,
}

impl I3EventStream {
    /// Connect a new event socket and start its reader task
    ///
    /// No events arrive until `subscribe()` is called.
    pub async fn connect(socket_path: &Path, buffer_size: usize) -> Result<Self, IpcError> {
        let socket = UnixStream::connect(socket_path)
            .await
            .map_err(|e| IpcError::ConnectionFailed {
                path: socket_path.to_path_buf(),
                source: e,
            })?;

        let (read_half, writer) = socket.into_split();
        let (event_tx, events) = mpsc::channel(buffer_size.max(1));
        let (waiters, waiter_rx) = mpsc::channel(1);

        let reader = tokio::spawn(run_reader_loop(read_half, event_tx, waiter_rx));

        debug!("i3 event stream connected to {}", socket_path.display());

        Ok(Self {
            writer,
            events,
            waiters,
            reader,
        })
    }

    /// Subscribe to one or more event types
    ///
    /// Completes even when the event channel is full and nobody is draining
    /// it.
    ///
    /// # Errors
    ///
    /// Returns `IpcError::SubscribeRejected` if i3 answers `success: false`,
    /// `IpcError::ConnectionClosed` if the reader stopped before a reply.
    pub async fn subscribe(&mut self, event_types: &[EventType]) -> Result<(), IpcError> {
        let payload = serde_json::to_vec(event_types).map_err(IpcError::SerializeFailed)?;

        // Register before writing so the reply cannot arrive unclaimed
        let (waiter, reply) = oneshot::channel();
        self.waiters
            .send(waiter)
            .await
            .map_err(|_| IpcError::ConnectionClosed)?;
        write_command(&mut self.writer, CommandType::Subscribe, &payload).await?;

        let reply = reply.await.map_err(|_| IpcError::ConnectionClosed)?;
        let expected = u32::from(CommandType::Subscribe);
        if reply.msg_type != expected {
            return Err(IpcError::UnexpectedReply {
                expected,
                actual: reply.msg_type,
            });
        }

        let outcome: Success =
            serde_json::from_slice(&reply.payload).map_err(IpcError::DeserializeFailed)?;
        if !outcome.success {
            return Err(IpcError::SubscribeRejected {
                events: String::from_utf8_lossy(&payload).into_owned(),
            });
        }

        debug!(event_types = ?event_types, "Subscribed to i3 events");
        Ok(())
    }

    /// Wait for the next decoded event
    ///
    /// Returns `Ok(None)` once i3 closes the socket. Cancel-safe.
    pub async fn next_event(&mut self) -> Result<Option<Event>, IpcError> {
        self.events.recv().await.transpose()
    }

    /// Events already read from the socket but not yet taken
    ///
    /// Stops at the first buffered error.
    pub fn drain_buffered(&mut self) -> Vec<Event> {
        let mut drained = Vec::new();
        while let Ok(Ok(event)) = self.events.try_recv() {
            drained.push(event);
        }
        drained
    }
}

impl Drop for I3EventStream {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

/// Read frames until EOF, an error, or the stream is dropped
async fn run_reader_loop(
    mut reader: OwnedReadHalf,
    events: mpsc::Sender<Result<Event, IpcError>>,
    mut waiters: mpsc::Receiver<Waiter>,
) {
    let mut pending: VecDeque<Result<Event, IpcError>> = VecDeque::new();
    let mut waiter: Option<Waiter> = None;

    loop {
        // Hand over queued events. Only wait for capacity while no reply is due.
        while !pending.is_empty() {
            if waiter.is_some() {
                match events.try_reserve() {
                    Ok(permit) => {
                        if let Some(item) = pending.pop_front() {
                            permit.send(item);
                        }
                    }
                    Err(TrySendError::Full(())) => break,
                    Err(TrySendError::Closed(())) => return,
                }
                continue;
            }

            tokio::select! {
                permit = events.reserve() => match permit {
                    Ok(permit) => {
                        if let Some(item) = pending.pop_front() {
                            permit.send(item);
                        }
                    }
                    Err(_) => {
                        debug!("i3 event receiver dropped, shutting down event reader");
                        return;
                    }
                },
                next = waiters.recv() => match next {
                    Some(next) => waiter = Some(next),
                    None => return,
                },
            }
        }

        let message = match read_message(&mut reader).await {
            Ok(message) => message,
            Err(e) => {
                if matches!(e, IpcError::ConnectionClosed) {
                    debug!("i3 event socket closed");
                } else {
                    warn!("i3 event stream error: {}", e);
                    pending.push_back(Err(e));
                }
                // No reply can arrive any more
                drop(waiter);
                drop(waiters);
                for item in pending {
                    if events.send(item).await.is_err() {
                        return;
                    }
                }
                return;
            }
        };

        if !message.is_event() {
            let claimed = waiter.take().or_else(|| waiters.try_recv().ok());
            match claimed {
                Some(reply) => {
                    let _ = reply.send(message);
                }
                None => warn!(msg_type = message.msg_type, "Dropping unrequested i3 reply"),
            }
            continue;
        }

        let msg_type = message.msg_type;
        match Event::decode(message) {
            Ok(Some(event)) => {
                trace!(kind = %event.kind, "Read i3 event");
                pending.push_back(Ok(event));
            }
            Ok(None) => {
                debug!(msg_type, "Ignoring unknown i3 event");
            }
            Err(e) => {
                warn!("Skipping undecodable i3 event: {}", e);
            }
        }
    }
}
