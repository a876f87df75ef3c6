//! # Call Center Server
//!
//! TCP gateway for the dispatcher. Each client connection sends one JSON request
//! per line and receives one JSON response line per outcome message. All
//! connections share a single [`DispatcherHandle`], so events from different
//! clients are applied strictly one after another.
//!
//! ```text
//! ┌──────────┐  ┌──────────┐
//! │ client 1 │  │ client 2 │     newline-delimited JSON
//! └────┬─────┘  └────┬─────┘
//!      │             │
//! ┌────▼─────────────▼─────┐
//! │  connection tasks      │     decode -> Command
//! └───────────┬────────────┘
//!             │ mpsc
//! ┌───────────▼────────────┐
//! │  dispatcher task       │     one event at a time
//! └────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use switchboard_call_engine::{CallCenterConfig, CallCenterServer};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let server = CallCenterServer::bind(&CallCenterConfig::default()).await?;
//! println!("listening on {}", server.local_addr()?);
//! server.run_until(async { let _ = tokio::signal::ctrl_c().await; }).await?;
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::net::SocketAddr;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{error, info, warn};

use crate::config::CallCenterConfig;
use crate::error::Result;
use crate::notifier::{JsonLineNotifier, Notifier};
use crate::orchestrator::{Dispatcher, DispatcherHandle};
use crate::protocol::{self, Response};

pub struct CallCenterServer {
    listener: TcpListener,
    dispatcher: DispatcherHandle,
}

impl CallCenterServer {
    /// Validate the config, start the dispatcher task and bind the listener
    pub async fn bind(config: &CallCenterConfig) -> Result<Self> {
        config.validate()?;
        let dispatcher = Dispatcher::new(config.dispatcher.num_operators)?;
        let dispatcher = DispatcherHandle::spawn(dispatcher, Some(config.server.channel_capacity));

        let listener = TcpListener::bind(config.server.bind_addr).await?;
        info!(
            "Call center server bound to {} with {} operators",
            listener.local_addr()?,
            config.dispatcher.num_operators
        );
        Ok(Self {
            listener,
            dispatcher,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Handle to the shared dispatcher, e.g. for stats
    pub fn dispatcher(&self) -> DispatcherHandle {
        self.dispatcher.clone()
    }

    /// Accept connections until `shutdown` resolves
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Call center server shutting down");
                    break;
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        let dispatcher = self.dispatcher.clone();
                        tokio::spawn(async move {
                            info!("Connected {}", peer);
                            if let Err(e) = serve_connection(stream, dispatcher).await {
                                warn!("Connection {} failed: {}", peer, e);
                            }
                            info!("Disconnected {}", peer);
                        });
                    }
                    Err(e) => error!("Error accepting connection: {}", e),
                },
            }
        }
        Ok(())
    }
}

/// Serve one client until it closes its side
async fn serve_connection(stream: TcpStream, dispatcher: DispatcherHandle) -> Result<()> {
    let (read_half, write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();
    let mut notifier = JsonLineNotifier::new(write_half);

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let result = match protocol::decode_request(&line) {
            Ok(command) => dispatcher.execute(command).await,
            Err(e) => {
                warn!("Malformed request {:?}: {}", line, e);
                Err(e)
            }
        };
        match result {
            Ok(notifications) => {
                for notification in notifications {
                    notifier.notify(&notification.to_string()).await?;
                }
            }
            Err(e) if e.is_event_error() => {
                notifier.notify(&Response::error(&e).response).await?;
            }
            Err(e) => return Err(e),
        }
    }
    Ok(())
}
