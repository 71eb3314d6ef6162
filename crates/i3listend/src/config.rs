//! Runtime settings for the i3 transport
//!
//! There is no configuration file; the binary fills this in from its
//! command line.

use std::path::PathBuf;

use i3listen_ipc::DEFAULT_CHANNEL_BUFFER;

/// Default number of extra attempts when opening the request socket
pub const DEFAULT_CONNECT_RETRIES: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonConfig {
    /// IPC socket; discovered from the environment when `None`
    pub socket_path: Option<PathBuf>,

    /// Retries for the initial connection (0 means a single attempt)
    pub connect_retries: u32,

    /// Events buffered between the socket reader and the dispatch loop
    pub event_buffer: usize,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            socket_path: None,
            connect_retries: DEFAULT_CONNECT_RETRIES,
            event_buffer: DEFAULT_CHANNEL_BUFFER,
        }
    }
}

impl DaemonConfig {
    /// Set the socket path, expanding a leading `~`
    pub fn with_socket(mut self, socket: Option<&str>) -> Self {
        self.socket_path = socket.map(|s| PathBuf::from(shellexpand::tilde(s).into_owned()));
        self
    }
}
