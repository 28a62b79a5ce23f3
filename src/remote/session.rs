//! Client side of the protocol
//!
//! `RemoteSession` stamps every command with the user it was opened for and
//! speaks the write sub-protocol: `begin_write` returns the server's ready
//! message, `send_content` ships the payload and returns the confirmation.

use log::debug;
use tokio::io::BufReader;
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::ToSocketAddrs;

use crate::auth::User;
use crate::error::ProtocolError;
use crate::protocol::responses::{WRITE_READY, parse_listing};
use crate::protocol::{Request, Response, read_message, write_message, write_payload};

const MAX_RESPONSE_LENGTH: usize = 1024 * 1024;

pub struct RemoteSession {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    user: User,
}

impl RemoteSession {
    pub async fn connect(addr: impl ToSocketAddrs, user: User) -> Result<Self, ProtocolError> {
        let stream = TcpStream::connect(addr).await?;
        let (read_half, writer) = stream.into_split();
        Ok(Self {
            reader: BufReader::new(read_half),
            writer,
            user,
        })
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    async fn receive(&mut self) -> Result<Response, ProtocolError> {
        read_message(&mut self.reader, MAX_RESPONSE_LENGTH)
            .await?
            .ok_or(ProtocolError::ConnectionClosed)
    }

    /// Sends one command line and waits for its response.
    pub async fn request(&mut self, command: &str) -> Result<Response, ProtocolError> {
        let request = Request::new(self.user.clone(), command);
        debug!("Sending {:?}", request);
        write_message(&mut self.writer, &request).await?;
        self.receive().await
    }

    /// Waits for a response the server sends unprompted (e.g. a refusal on connect).
    pub async fn receive_unsolicited(&mut self) -> Result<Response, ProtocolError> {
        self.receive().await
    }

    /// Lists visible files as `(filename, permissions)` pairs.
    pub async fn list(&mut self) -> Result<(Response, Vec<(String, String)>), ProtocolError> {
        let response = self.request("ls").await?;
        let entries = parse_listing(&response.content);
        Ok((response, entries))
    }

    /// First half of a write. When the status is the ready label the server
    /// now waits for `send_content`; any other status ends the exchange.
    pub async fn begin_write(&mut self, filename: &str, mode: &str) -> Result<Response, ProtocolError> {
        self.request(&format!("write {filename} {mode}")).await
    }

    /// Second half of a write.
    pub async fn send_content(&mut self, content: &[u8]) -> Result<Response, ProtocolError> {
        write_payload(&mut self.writer, content).await?;
        self.receive().await
    }

    /// Both halves of a write. Returns the ready response when the server
    /// refused to start the write.
    pub async fn write(
        &mut self,
        filename: &str,
        mode: &str,
        content: &[u8],
    ) -> Result<Response, ProtocolError> {
        let ready = self.begin_write(filename, mode).await?;
        if !ready.is(WRITE_READY) {
            return Ok(ready);
        }
        self.send_content(content).await
    }
}
