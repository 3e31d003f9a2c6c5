//! Wire framing for the remote-command protocol (spec §3):
//!
//! ```text
//! int32 length            (bytes that follow)
//! int32 packet_id
//! int32 packet_type
//! bytes payload (UTF-8)
//! u8 0x00                  (payload terminator)
//! u8 0x00                  (packet terminator)
//! ```
//!
//! All integers are little-endian. `length` counts everything after
//! itself, so `payload.len() == length - 10` (two `int32`s plus two
//! terminator bytes).

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::RcError;

/// `SERVERDATA_AUTH` — authenticate with the password payload.
pub const PACKET_AUTH: i32 = 3;
/// `SERVERDATA_EXECCOMMAND` — run a command; also the type tag used for
/// both exec responses and (per the upstream protocol) auth responses.
pub const PACKET_EXEC: i32 = 2;
/// `SERVERDATA_RESPONSE_VALUE` — an exec response.
pub const PACKET_RESPONSE: i32 = 0;

/// The packet id used for the single in-flight `AUTH` request.
pub const AUTH_PACKET_ID: i32 = 1;
/// The packet id used for the single in-flight `EXEC` request.
pub const EXEC_PACKET_ID: i32 = 2;
/// The `packet_id` a server sends back when authentication is rejected.
pub const AUTH_FAILED_ID: i32 = -1;

/// A decoded response packet.
#[derive(Debug, Clone)]
pub struct Packet {
    /// Echoes the id of the request this responds to (or -1 on auth failure).
    pub id: i32,
    /// The packet type tag.
    pub packet_type: i32,
    /// The UTF-8 payload.
    pub payload: String,
}

/// Encodes and writes a request packet.
pub async fn write_packet<W: AsyncWrite + Unpin>(
    writer: &mut W,
    id: i32,
    packet_type: i32,
    payload: &str,
) -> Result<(), RcError> {
    let payload_bytes = payload.as_bytes();
    let length = 4 + 4 + payload_bytes.len() as i32 + 1 + 1;

    let mut buf = Vec::with_capacity(4 + length as usize);
    buf.extend_from_slice(&length.to_le_bytes());
    buf.extend_from_slice(&id.to_le_bytes());
    buf.extend_from_slice(&packet_type.to_le_bytes());
    buf.extend_from_slice(payload_bytes);
    buf.push(0);
    buf.push(0);

    writer.write_all(&buf).await.map_err(RcError::Disconnected)?;
    writer.flush().await.map_err(RcError::Disconnected)?;
    Ok(())
}

/// Reads exactly one response packet, honouring the declared `length` even
/// if the payload happens to contain embedded NUL bytes.
pub async fn read_packet<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Packet, RcError> {
    let mut len_buf = [0u8; 4];
    reader
        .read_exact(&mut len_buf)
        .await
        .map_err(RcError::Disconnected)?;
    let length = i32::from_le_bytes(len_buf);

    if length < 10 {
        return Err(RcError::Protocol(format!(
            "declared packet length {length} is too short to hold the fixed header"
        )));
    }

    let mut body = vec![0u8; length as usize];
    reader
        .read_exact(&mut body)
        .await
        .map_err(RcError::Disconnected)?;

    let id = i32::from_le_bytes([body[0], body[1], body[2], body[3]]);
    let packet_type = i32::from_le_bytes([body[4], body[5], body[6], body[7]]);

    let payload_bytes = &body[8..body.len() - 2];
    let payload = String::from_utf8(payload_bytes.to_vec())
        .map_err(|e| RcError::Protocol(format!("non-UTF-8 payload: {e}")))?;

    Ok(Packet {
        id,
        packet_type,
        payload,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[tokio::test]
    async fn round_trips_a_packet() {
        let mut buf = Vec::new();
        write_packet(&mut buf, EXEC_PACKET_ID, PACKET_EXEC, "getstats")
            .await
            .unwrap();

        let mut cursor = Cursor::new(buf);
        let packet = read_packet(&mut cursor).await.unwrap();

        assert_eq!(packet.id, EXEC_PACKET_ID);
        assert_eq!(packet.packet_type, PACKET_EXEC);
        assert_eq!(packet.payload, "getstats");
    }

    #[tokio::test]
    async fn empty_payload_round_trips() {
        let mut buf = Vec::new();
        write_packet(&mut buf, AUTH_PACKET_ID, PACKET_AUTH, "")
            .await
            .unwrap();
        assert_eq!(buf.len(), 14); // 4 length + 4 id + 4 type + 2 terminators

        let mut cursor = Cursor::new(buf);
        let packet = read_packet(&mut cursor).await.unwrap();
        assert_eq!(packet.payload, "");
    }

    #[tokio::test]
    async fn rejects_truncated_header() {
        let buf = 5i32.to_le_bytes().to_vec();
        let mut cursor = Cursor::new(buf);
        let err = read_packet(&mut cursor).await.unwrap_err();
        assert!(matches!(err, RcError::Protocol(_)));
    }
}
