//! TCP client for the call center server
//!
//! Requests and responses are decoupled: the server may answer one request with
//! one or two messages, so interactive use splits the client and prints responses
//! from a separate task as they arrive.

use std::net::SocketAddr;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tracing::{debug, info};

use crate::error::Result;
use crate::notifier::Notifier;
use crate::prompt::CommandSink;
use crate::protocol::{self, Command, Response};

pub struct CallCenterClient {
    sender: RequestSender,
    responses: ResponseReader,
}

impl CallCenterClient {
    pub async fn connect(addr: SocketAddr) -> Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        info!("Connected to call center server at {}", addr);
        let (read_half, write_half) = stream.into_split();
        Ok(Self {
            sender: RequestSender { writer: write_half },
            responses: ResponseReader {
                lines: BufReader::new(read_half).lines(),
            },
        })
    }

    pub async fn send(&mut self, command: &Command) -> Result<()> {
        self.sender.send(command).await
    }

    /// Next response message, `None` once the server closed the connection
    pub async fn read_response(&mut self) -> Result<Option<Response>> {
        self.responses.next_response().await
    }

    /// Send a raw line as-is, bypassing command encoding
    pub async fn send_raw(&mut self, line: &str) -> Result<()> {
        self.sender.send_line(line).await
    }

    pub fn into_split(self) -> (RequestSender, ResponseReader) {
        (self.sender, self.responses)
    }
}

/// Write half: encodes commands as request lines
pub struct RequestSender {
    writer: OwnedWriteHalf,
}

impl RequestSender {
    pub async fn send(&mut self, command: &Command) -> Result<()> {
        let line = protocol::encode_request(command)?;
        debug!(%command, "sending request");
        self.send_line(&line).await
    }

    async fn send_line(&mut self, line: &str) -> Result<()> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl CommandSink for RequestSender {
    // outcomes arrive on the read half, not here
    async fn submit(&mut self, command: Command, _notifier: &mut (dyn Notifier + Send)) -> Result<()> {
        self.send(&command).await
    }
}

/// Read half: decodes response lines
pub struct ResponseReader {
    lines: Lines<BufReader<OwnedReadHalf>>,
}

impl ResponseReader {
    pub async fn next_response(&mut self) -> Result<Option<Response>> {
        loop {
            match self.lines.next_line().await? {
                Some(line) if line.trim().is_empty() => continue,
                Some(line) => return protocol::decode_response(&line).map(Some),
                None => return Ok(None),
            }
        }
    }

    /// Pass every response message to `notifier` until the server disconnects
    pub async fn forward_to<N: Notifier + ?Sized>(mut self, notifier: &mut N) -> Result<()> {
        while let Some(response) = self.next_response().await? {
            notifier.notify(&response.response).await?;
        }
        info!("Call center server closed the connection");
        Ok(())
    }
}
