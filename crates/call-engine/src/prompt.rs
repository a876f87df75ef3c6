//! Interactive line prompt gateway
//!
//! Reads `call <id>`, `answer <id>`, `reject <id>`, `hangup <id>` and `exit` lines,
//! hands each decoded [`Command`] to a [`CommandSink`] and prints every outcome
//! message. Bad input prints one `Error: ...` line and the prompt carries on.

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite};
use tracing::{debug, warn};

use crate::error::{CallCenterError, Result};
use crate::notifier::{ConsoleNotifier, Notifier};
use crate::orchestrator::{Dispatcher, DispatcherHandle};
use crate::protocol::Command;

pub const INTRO: &str = "Available Commands:\ncall <id>\nanswer <id>\nreject <id>\nhangup <id>\nexit";

pub const DEFAULT_PROMPT: &str = "(switchboard) ";

pub const GOODBYE: &str = "Goodbye";

/// What one input line asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptLine {
    Command(Command),
    Exit,
    Empty,
}

/// Parse a prompt line such as `answer B`
pub fn parse_line(line: &str) -> Result<PromptLine> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(PromptLine::Empty);
    };
    if verb == "exit" {
        return Ok(PromptLine::Exit);
    }
    let argument = words
        .next()
        .ok_or_else(|| CallCenterError::malformed(format!("'{}' needs an <id>", verb)))?;
    if let Some(extra) = words.next() {
        return Err(CallCenterError::malformed(format!(
            "unexpected argument '{}'",
            extra
        )));
    }
    Ok(PromptLine::Command(Command::parse(verb, argument)?))
}

/// Somewhere to send decoded commands
///
/// A sink writes any outcome it produces to `notifier`. Event errors are returned
/// so the prompt can report them; any other error ends the prompt.
#[async_trait]
pub trait CommandSink: Send {
    async fn submit(&mut self, command: Command, notifier: &mut (dyn Notifier + Send)) -> Result<()>;
}

#[async_trait]
impl CommandSink for Dispatcher {
    async fn submit(&mut self, command: Command, notifier: &mut (dyn Notifier + Send)) -> Result<()> {
        for notification in self.handle(&command)? {
            notifier.notify(&notification.to_string()).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl CommandSink for DispatcherHandle {
    async fn submit(&mut self, command: Command, notifier: &mut (dyn Notifier + Send)) -> Result<()> {
        for notification in self.execute(command).await? {
            notifier.notify(&notification.to_string()).await?;
        }
        Ok(())
    }
}

/// Prompt loop settings
#[derive(Debug, Clone)]
pub struct Prompt {
    prompt: String,
    show_intro: bool,
}

impl Default for Prompt {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_string(),
            show_intro: true,
        }
    }
}

impl Prompt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn without_intro(mut self) -> Self {
        self.show_intro = false;
        self
    }

    /// Run until `exit` or end of input
    pub async fn run<R, W, S>(
        &self,
        input: R,
        console: &mut ConsoleNotifier<W>,
        sink: &mut S,
    ) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin + Send,
        S: CommandSink + ?Sized,
    {
        if self.show_intro {
            console.notify(INTRO).await?;
        }

        let mut lines = input.lines();
        loop {
            if !self.prompt.is_empty() {
                console.write_raw(&self.prompt).await?;
            }
            let Some(line) = lines.next_line().await? else {
                console.write_raw("\n").await?;
                break;
            };

            let command = match parse_line(&line) {
                Ok(PromptLine::Command(command)) => command,
                Ok(PromptLine::Exit) => break,
                Ok(PromptLine::Empty) => continue,
                Err(e) => {
                    debug!(line = %line, "unparseable prompt line");
                    console.notify(&format!("Error: {}", e)).await?;
                    continue;
                }
            };

            match sink.submit(command, console).await {
                Ok(()) => {}
                Err(e) if e.is_event_error() => {
                    warn!(%command, "command failed: {}", e);
                    console.notify(&format!("Error: {}", e)).await?;
                }
                Err(e) => return Err(e),
            }
        }

        console.notify(GOODBYE).await?;
        Ok(())
    }
}
