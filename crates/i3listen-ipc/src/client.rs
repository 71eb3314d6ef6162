//! i3 IPC client implementation
//!
//! This module provides the `I3Client` for request/response communication
//! with i3 or sway. The client handles socket discovery, connection
//! management, and the framed JSON protocol.

use std::path::{Path, PathBuf};
use std::time::Duration;

use swayipc_types::CommandType;
use tokio::net::UnixStream;
use tokio::process::Command;
use tokio::time::sleep;
use tracing::{debug, warn};

use super::error::IpcError;
use super::protocol::{read_message, write_command};
use super::tree::{Node, Version};

/// Delay before the first retry
const INITIAL_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Upper bound for the doubling retry delay
const MAX_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Socket variable exported by i3
const I3_SOCKET_ENV: &str = "I3SOCK";

/// Socket variable exported by sway
const SWAY_SOCKET_ENV: &str = "SWAYSOCK";

/// Discover the IPC socket path
///
/// Lookup order:
/// 1. `explicit`, when given
/// 2. `$I3SOCK`
/// 3. `$SWAYSOCK`
/// 4. the output of `i3 --get-socketpath`
///
/// # Errors
///
/// Returns `IpcError::SocketNotSet` if no source yields a path.
/// Returns `IpcError::SocketNotFound` if the path doesn't exist.
pub async fn resolve_socket_path(explicit: Option<&Path>) -> Result<PathBuf, IpcError> {
    let socket_path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match socket_path_from_env() {
            Some(path) => path,
            None => socket_path_from_i3().await?,
        },
    };

    if !socket_path.exists() {
        return Err(IpcError::SocketNotFound { path: socket_path });
    }

    Ok(socket_path)
}

fn socket_path_from_env() -> Option<PathBuf> {
    [I3_SOCKET_ENV, SWAY_SOCKET_ENV]
        .iter()
        .filter_map(|var| std::env::var_os(var))
        .find(|value| !value.is_empty())
        .map(PathBuf::from)
}

async fn socket_path_from_i3() -> Result<PathBuf, IpcError> {
    let output = Command::new("i3")
        .arg("--get-socketpath")
        .output()
        .await
        .map_err(|e| IpcError::SocketNotSet {
            reason: format!("failed to run `i3 --get-socketpath`: {}", e),
        })?;

    let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if !output.status.success() || path.is_empty() {
        return Err(IpcError::SocketNotSet {
            reason: format!("`i3 --get-socketpath` exited with {}", output.status),
        });
    }

    debug!("Socket path from i3 --get-socketpath: {}", path);
    Ok(PathBuf::from(path))
}

/// Request/response client for the i3 IPC socket
///
/// # Example
///
/// ```ignore
/// let path = resolve_socket_path(None).await?;
/// let mut client = I3Client::connect(&path).await?;
/// let tree = client.get_tree().await?;
/// ```
#[derive(Debug)]
pub struct I3Client {
    socket: UnixStream,
    socket_path: PathBuf,
}

impl I3Client {
    /// Connect to the socket at `socket_path`
    ///
    /// # Errors
    ///
    /// Returns `IpcError::ConnectionFailed` if the connection fails.
    pub async fn connect(socket_path: &Path) -> Result<Self, IpcError> {
        let socket = UnixStream::connect(socket_path)
            .await
            .map_err(|e| IpcError::ConnectionFailed {
                path: socket_path.to_path_buf(),
                source: e,
            })?;

        Ok(Self {
            socket,
            socket_path: socket_path.to_path_buf(),
        })
    }

    /// Discover the socket and connect, waiting for a window manager that
    /// is still starting up
    ///
    /// Discovery runs again before every attempt, so a socket created (or
    /// advertised through `I3SOCK`) after the first attempt is picked up.
    /// The delay between attempts starts at 100ms and doubles up to 1s.
    /// `max_retries` of 0 means a single attempt.
    ///
    /// # Errors
    ///
    /// Returns the first error that another attempt cannot fix, or the
    /// error of the last attempt.
    pub async fn connect_with_retry(
        explicit: Option<&Path>,
        max_retries: u32,
    ) -> Result<Self, IpcError> {
        let attempts = max_retries.saturating_add(1);
        let mut delay = INITIAL_RETRY_DELAY;
        let mut attempt = 1;

        loop {
            let err = match Self::discover_and_connect(explicit).await {
                Ok(client) => return Ok(client),
                Err(err) => err,
            };

            if !err.is_retryable() || attempt >= attempts {
                warn!(attempt, error = %err, "Giving up on the i3 socket");
                return Err(err);
            }

            debug!(
                attempt,
                retry_in_ms = delay.as_millis() as u64,
                error = %err,
                "i3 socket not ready"
            );
            sleep(delay).await;
            delay = (delay * 2).min(MAX_RETRY_DELAY);
            attempt += 1;
        }
    }

    async fn discover_and_connect(explicit: Option<&Path>) -> Result<Self, IpcError> {
        let socket_path = resolve_socket_path(explicit).await?;
        Self::connect(&socket_path).await
    }

    /// Path this client is connected to
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Send a request and return the raw reply payload
    ///
    /// # Errors
    ///
    /// Returns `IpcError::SendFailed`/`ReceiveFailed` on socket errors,
    /// `IpcError::ConnectionClosed` if the socket closes, and
    /// `IpcError::UnexpectedReply` if the reply type doesn't match.
    pub async fn send_request(
        &mut self,
        command: CommandType,
        payload: &[u8],
    ) -> Result<Vec<u8>, IpcError> {
        write_command(&mut self.socket, command, payload).await?;

        let reply = read_message(&mut self.socket).await?;
        let expected = u32::from(command);
        if reply.msg_type != expected {
            return Err(IpcError::UnexpectedReply {
                expected,
                actual: reply.msg_type,
            });
        }

        Ok(reply.payload)
    }

    /// Query the full layout tree
    pub async fn get_tree(&mut self) -> Result<Node, IpcError> {
        let payload = self.send_request(CommandType::GetTree, b"").await?;
        serde_json::from_slice(&payload).map_err(IpcError::DeserializeFailed)
    }

    /// Query the window manager version
    pub async fn get_version(&mut self) -> Result<Version, IpcError> {
        let payload = self.send_request(CommandType::GetVersion, b"").await?;
        serde_json::from_slice(&payload).map_err(IpcError::DeserializeFailed)
    }
}
