//! i3 IPC wire framing
//!
//! ```text
//! +----------+----------------+--------------+-----------------+
//! | "i3-ipc" | payload length | message type | payload (JSON)  |
//! | 6 bytes  | u32, native    | u32, native  | length bytes    |
//! +----------+----------------+--------------+-----------------+
//! ```
//!
//! Requests are encoded by `swayipc_types::CommandType`; this module writes
//! them and reads frames back off the socket.

use swayipc_types::{CommandType, MAGIC};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::error::IpcError;

/// Size of the fixed frame header
pub(crate) const HEADER_LEN: usize = MAGIC.len() + 8;

/// Bit set on the type of every event frame
pub(crate) const EVENT_FLAG: u32 = 1 << 31;

/// A single frame as read from the socket
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Message {
    /// Raw type field; events have `EVENT_FLAG` set
    pub msg_type: u32,
    pub payload: Vec<u8>,
}

impl Message {
    /// Whether this frame is an event rather than a reply
    pub fn is_event(&self) -> bool {
        self.msg_type & EVENT_FLAG != 0
    }
}

/// Write a single request and flush
pub(crate) async fn write_command<W>(
    writer: &mut W,
    command: CommandType,
    payload: &[u8],
) -> Result<(), IpcError>
where
    W: AsyncWrite + Unpin,
{
    writer
        .write_all(&command.encode_with(payload))
        .await
        .map_err(IpcError::SendFailed)?;
    writer.flush().await.map_err(IpcError::SendFailed)
}

/// Read a single frame
///
/// Returns `IpcError::ConnectionClosed` if the peer closed the socket on a
/// frame boundary.
pub(crate) async fn read_message<R>(reader: &mut R) -> Result<Message, IpcError>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; HEADER_LEN];
    if let Err(e) = reader.read_exact(&mut header).await {
        return Err(match e.kind() {
            std::io::ErrorKind::UnexpectedEof => IpcError::ConnectionClosed,
            _ => IpcError::ReceiveFailed(e),
        });
    }

    let (magic, rest) = header.split_at(MAGIC.len());
    if magic != MAGIC {
        let mut found = [0u8; 6];
        found.copy_from_slice(magic);
        return Err(IpcError::InvalidMagic { found });
    }

    let (len, msg_type) = rest.split_at(4);
    let len = u32::from_ne_bytes([len[0], len[1], len[2], len[3]]) as usize;
    let msg_type = u32::from_ne_bytes([msg_type[0], msg_type[1], msg_type[2], msg_type[3]]);

    let mut payload = vec![0u8; len];
    reader
        .read_exact(&mut payload)
        .await
        .map_err(IpcError::ReceiveFailed)?;

    Ok(Message { msg_type, payload })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{event_frame, frame};

    #[tokio::test]
    async fn test_write_command_frames_payload() {
        let mut buf = Vec::new();

        write_command(&mut buf, CommandType::Subscribe, br#"["window"]"#)
            .await
            .unwrap();

        assert_eq!(&buf[..6], b"i3-ipc");
        assert_eq!(&buf[6..10], &10u32.to_ne_bytes());
        assert_eq!(&buf[10..14], &2u32.to_ne_bytes());
        assert_eq!(&buf[HEADER_LEN..], br#"["window"]"#);
    }

    #[tokio::test]
    async fn test_read_message_decodes_event_frame() {
        let payload = br#"{"change":"focus"}"#;
        let buf = event_frame(3, payload);
        let mut reader = &buf[..];

        let message = read_message(&mut reader).await.unwrap();

        assert!(message.is_event());
        assert_eq!(message.msg_type & !EVENT_FLAG, 3);
        assert_eq!(message.payload, payload.to_vec());
    }

    #[tokio::test]
    async fn test_reply_frame_is_not_event() {
        let buf = frame(2, br#"{"success":true}"#);
        let mut reader = &buf[..];

        let message = read_message(&mut reader).await.unwrap();

        assert!(!message.is_event());
        assert_eq!(message.msg_type, 2);
    }

    #[tokio::test]
    async fn test_read_message_rejects_bad_magic() {
        let mut buf = frame(4, b"{}");
        buf[0] = b'x';
        let mut reader = &buf[..];

        let err = read_message(&mut reader).await.unwrap_err();

        match err {
            IpcError::InvalidMagic { found } => assert_eq!(&found, b"x3-ipc"),
            other => panic!("Expected InvalidMagic, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_read_message_eof_is_connection_closed() {
        let mut reader: &[u8] = &[];

        let err = read_message(&mut reader).await.unwrap_err();

        assert!(matches!(err, IpcError::ConnectionClosed));
    }

    #[tokio::test]
    async fn test_truncated_payload_is_receive_error() {
        let mut buf = frame(4, b"{\"id\":1}");
        buf.truncate(HEADER_LEN + 2);
        let mut reader = &buf[..];

        let err = read_message(&mut reader).await.unwrap_err();

        assert!(matches!(err, IpcError::ReceiveFailed(_)));
    }
}
