//! Output side of the gateways: where outcome messages are written

use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

use crate::error::Result;
use crate::protocol;

/// Receives every human-readable outcome message, in order
#[async_trait]
pub trait Notifier: Send {
    async fn notify(&mut self, message: &str) -> Result<()>;
}

/// Plain text lines, as printed by the interactive prompt
///
/// Clones share one writer. Each message or prompt string is written and flushed
/// under the lock, so a response printer and the prompt loop never interleave
/// within a line.
pub struct ConsoleNotifier<W> {
    writer: Arc<Mutex<W>>,
}

impl<W> Clone for ConsoleNotifier<W> {
    fn clone(&self) -> Self {
        Self {
            writer: Arc::clone(&self.writer),
        }
    }
}

impl<W: AsyncWrite + Unpin + Send> ConsoleNotifier<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Arc::new(Mutex::new(writer)),
        }
    }

    /// Write raw text without a newline (used for the prompt string)
    pub async fn write_raw(&mut self, text: &str) -> Result<()> {
        let mut writer = self.writer.lock().await;
        writer.write_all(text.as_bytes()).await?;
        writer.flush().await?;
        Ok(())
    }

    /// The writer back, or `None` while clones are still alive
    pub fn into_inner(self) -> Option<W> {
        Arc::try_unwrap(self.writer).ok().map(Mutex::into_inner)
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> Notifier for ConsoleNotifier<W> {
    async fn notify(&mut self, message: &str) -> Result<()> {
        let line = format!("{}\n", message);
        let mut writer = self.writer.lock().await;
        writer.write_all(line.as_bytes()).await?;
        writer.flush().await?;
        Ok(())
    }
}

/// One `{"response": ...}` object per message, as sent by the server
pub struct JsonLineNotifier<W> {
    writer: W,
}

impl<W: AsyncWrite + Unpin + Send> JsonLineNotifier<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> Notifier for JsonLineNotifier<W> {
    async fn notify(&mut self, message: &str) -> Result<()> {
        let line = protocol::encode_response(message)?;
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.flush().await?;
        Ok(())
    }
}
