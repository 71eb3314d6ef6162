//! i3 IPC client for window manager integration
//!
//! This crate provides communication with i3 (and sway, which speaks the
//! same protocol) over its IPC socket. It enables i3listen to:
//! - Query the layout tree and compositor version
//! - Subscribe to window, workspace and other event types
//! - Receive decoded events on a dedicated socket
//!
//! Message and reply types come from `swayipc_types`; this crate only
//! hand-writes the tokio socket handling around them.
//!
//! ## Architecture
//!
//! - `I3Client`: request/response client (tree, version)
//! - `I3EventStream`: subscribed socket with a background reader task
//! - `IpcError`: error types for IPC operations
//!
//! ## Protocol
//!
//! Every message is framed as the `i3-ipc` magic string, a 32-bit payload
//! length, a 32-bit message type (both in native byte order) and a JSON
//! payload. Events reuse the frame with the high bit of the type set.

mod client;
mod error;
mod event;
mod events;
mod protocol;
mod tree;

#[cfg(any(test, feature = "test-utils"))]
pub mod fixtures;

pub use client::{resolve_socket_path, I3Client};
pub use error::IpcError;
pub use event::{Event, EventKind, SimpleContainer};
pub use events::{I3EventStream, DEFAULT_CHANNEL_BUFFER};
pub use swayipc_types::EventType;
pub use tree::{ContainerId, Node, NodeExt, NodeType, Version};
