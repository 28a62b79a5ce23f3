//! Message framing
//!
//! Requests and responses are newline-terminated JSON. The raw write payload
//! is a 4-byte big-endian length followed by that many bytes.

use log::warn;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::ProtocolError;

/// Skips the remainder of the current line without buffering it.
async fn discard_line<R: AsyncBufRead + Unpin>(reader: &mut R) -> io::Result<()> {
    loop {
        let buf = reader.fill_buf().await?;
        if buf.is_empty() {
            return Ok(());
        }
        match buf.iter().position(|&b| b == b'\n') {
            Some(i) => {
                reader.consume(i + 1);
                return Ok(());
            }
            None => {
                let len = buf.len();
                reader.consume(len);
            }
        }
    }
}

/// Reads one JSON line. `Ok(None)` means the peer closed the connection.
///
/// Lines longer than `max_len` are skipped and reported as `RequestTooLong`,
/// leaving the reader at the start of the next line.
pub async fn read_message<R, T>(reader: &mut R, max_len: usize) -> Result<Option<T>, ProtocolError>
where
    R: AsyncBufRead + Unpin,
    T: DeserializeOwned,
{
    let mut line = Vec::new();
    let n = (&mut *reader)
        .take(max_len as u64 + 1)
        .read_until(b'\n', &mut line)
        .await?;

    if n == 0 {
        return Ok(None);
    }

    if line.last() != Some(&b'\n') && n > max_len {
        discard_line(reader).await?;
        return Err(ProtocolError::RequestTooLong(n));
    }

    // Bytes that are not UTF-8 surface as a recoverable `Malformed`.
    Ok(Some(serde_json::from_slice(line.trim_ascii_end())?))
}

/// Writes one JSON line and flushes it.
pub async fn write_message<W, T>(writer: &mut W, message: &T) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let mut bytes = serde_json::to_vec(message)?;
    bytes.push(b'\n');
    writer.write_all(&bytes).await?;
    writer.flush().await?;
    Ok(())
}

fn incomplete(e: io::Error, what: &str) -> ProtocolError {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        ProtocolError::TransferIncomplete(format!("connection closed before {what}"))
    } else {
        ProtocolError::Io(e)
    }
}

/// Reads a raw write payload, keeping at most `max_len` bytes.
///
/// Bytes past `max_len` are drained from the connection and dropped.
pub async fn read_payload<R>(reader: &mut R, max_len: usize) -> Result<Vec<u8>, ProtocolError>
where
    R: AsyncBufRead + Unpin,
{
    let announced = reader
        .read_u32()
        .await
        .map_err(|e| incomplete(e, "the payload length"))? as u64;

    let keep = announced.min(max_len as u64);
    let mut payload = vec![0u8; keep as usize];
    reader
        .read_exact(&mut payload)
        .await
        .map_err(|e| incomplete(e, "the full payload"))?;

    let excess = announced - keep;
    if excess > 0 {
        let drained = tokio::io::copy(&mut (&mut *reader).take(excess), &mut tokio::io::sink()).await?;
        if drained < excess {
            return Err(ProtocolError::TransferIncomplete(format!(
                "connection closed after {} of {announced} payload bytes",
                keep + drained
            )));
        }
        warn!("Payload of {announced} bytes truncated to {keep}");
    }

    Ok(payload)
}

/// Writes a raw write payload.
pub async fn write_payload<W>(writer: &mut W, payload: &[u8]) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
{
    let len = u32::try_from(payload.len()).map_err(|_| {
        ProtocolError::TransferIncomplete(format!("payload of {} bytes is too large", payload.len()))
    })?;
    writer.write_u32(len).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::User;
    use crate::protocol::messages::{Request, Response};
    use tokio::io::BufReader;

    #[tokio::test]
    async fn request_lines_are_read_in_order() {
        let mut wire = Vec::new();
        let first = Request::new(User::new("alice", "eng"), "ls");
        let second = Request::new(User::new("alice", "eng"), "read a.txt");
        write_message(&mut wire, &first).await.unwrap();
        write_message(&mut wire, &second).await.unwrap();

        let mut reader = BufReader::new(wire.as_slice());
        let got: Option<Request> = read_message(&mut reader, 1024).await.unwrap();
        assert_eq!(got, Some(first));
        let got: Option<Request> = read_message(&mut reader, 1024).await.unwrap();
        assert_eq!(got, Some(second));
        let got: Option<Request> = read_message(&mut reader, 1024).await.unwrap();
        assert_eq!(got, None);
    }

    #[tokio::test]
    async fn oversized_line_is_skipped() {
        let mut wire = format!("{}\n", "x".repeat(100)).into_bytes();
        write_message(&mut wire, &Response::status("ok")).await.unwrap();

        let mut reader = BufReader::new(wire.as_slice());
        let err = read_message::<_, Response>(&mut reader, 50).await.unwrap_err();
        assert!(matches!(err, ProtocolError::RequestTooLong(_)));
        let next: Option<Response> = read_message(&mut reader, 50).await.unwrap();
        assert_eq!(next, Some(Response::status("ok")));
    }

    #[tokio::test]
    async fn garbage_is_malformed_and_recoverable() {
        let mut reader = BufReader::new(&b"not json\n"[..]);
        let err = read_message::<_, Request>(&mut reader, 1024).await.unwrap_err();
        assert!(matches!(err, ProtocolError::Malformed(_)));
        assert!(err.is_recoverable());
    }

    #[tokio::test]
    async fn invalid_utf8_line_is_malformed_and_next_line_still_reads() {
        let mut wire = b"\xff\xfe garbage\n".to_vec();
        let request = Request::new(User::new("alice", "eng"), "ls");
        write_message(&mut wire, &request).await.unwrap();

        let mut reader = BufReader::new(wire.as_slice());
        let err = read_message::<_, Request>(&mut reader, 1024).await.unwrap_err();
        assert!(matches!(err, ProtocolError::Malformed(_)));
        assert!(err.is_recoverable());

        let got: Option<Request> = read_message(&mut reader, 1024).await.unwrap();
        assert_eq!(got, Some(request));
    }

    #[tokio::test]
    async fn oversized_payload_is_truncated_and_drained() {
        let mut wire = Vec::new();
        write_payload(&mut wire, b"0123456789").await.unwrap();
        wire.extend_from_slice(b"next");

        let mut reader = BufReader::new(wire.as_slice());
        assert_eq!(read_payload(&mut reader, 4).await.unwrap(), b"0123");
        let mut rest = String::new();
        reader.read_to_string(&mut rest).await.unwrap();
        assert_eq!(rest, "next");
    }

    #[tokio::test]
    async fn short_payload_is_incomplete() {
        let mut wire = Vec::new();
        write_payload(&mut wire, b"0123456789").await.unwrap();
        wire.truncate(8);
        let mut reader = BufReader::new(wire.as_slice());
        assert!(matches!(
            read_payload(&mut reader, 100).await,
            Err(ProtocolError::TransferIncomplete(_))
        ));

        let mut reader = BufReader::new(&b""[..]);
        assert!(matches!(
            read_payload(&mut reader, 100).await,
            Err(ProtocolError::TransferIncomplete(_))
        ));
    }

    #[tokio::test]
    async fn empty_payload_is_valid() {
        let mut wire = Vec::new();
        write_payload(&mut wire, b"").await.unwrap();
        let mut reader = BufReader::new(wire.as_slice());
        assert!(read_payload(&mut reader, 100).await.unwrap().is_empty());
    }
}
