//! Operator console
//!
//! Reads one command per line from the operator and acts on the whole
//! registry:
//!
//! - `LIST` prints every connected client
//! - `BROADCAST <text>` pushes `<text>` to every client as a chat-style reply
//! - `SHUTDOWN` raises the shutdown flag so the accept loop stops
//!
//! Keywords are case-insensitive; anything else is ignored silently. The
//! console never touches client sockets except through
//! [`ClientRegistry::broadcast`].

use crate::registry::{BroadcastReport, ClientRegistry};
use crate::shutdown::Shutdown;
use log::{info, warn};
use serde_json::json;
use shared::{encode_response, Response, ANNOUNCEMENT_COLOR};
use std::io;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCommand {
    List,
    Broadcast(String),
    Shutdown,
}

impl AdminCommand {
    /// Parses one line of operator input; `None` for anything unrecognized
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        let (keyword, rest) = match line.split_once(char::is_whitespace) {
            Some((keyword, rest)) => (keyword, rest.trim()),
            None => (line, ""),
        };

        match (keyword.to_ascii_uppercase().as_str(), rest) {
            ("LIST", "") => Some(AdminCommand::List),
            ("SHUTDOWN", "") => Some(AdminCommand::Shutdown),
            ("BROADCAST", text) if !text.is_empty() => Some(AdminCommand::Broadcast(text.to_string())),
            _ => None,
        }
    }
}

pub struct AdminConsole {
    registry: Arc<ClientRegistry>,
    shutdown: Shutdown,
    key: Arc<[u8]>,
}

impl AdminConsole {
    pub fn new(registry: Arc<ClientRegistry>, shutdown: Shutdown, key: Arc<[u8]>) -> Self {
        Self {
            registry,
            shutdown,
            key,
        }
    }

    /// Processes commands from `input` until `SHUTDOWN` or end of input
    pub async fn run<I, O>(&self, input: I, mut output: O) -> io::Result<()>
    where
        I: AsyncBufRead + Unpin,
        O: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();

        while let Some(line) = lines.next_line().await? {
            let Some(command) = AdminCommand::parse(&line) else {
                continue;
            };

            let stop = command == AdminCommand::Shutdown;
            self.execute(command, &mut output).await?;
            if stop {
                return Ok(());
            }
        }

        info!("Admin console input closed");
        Ok(())
    }

    pub async fn execute<O>(&self, command: AdminCommand, output: &mut O) -> io::Result<()>
    where
        O: AsyncWrite + Unpin,
    {
        match command {
            AdminCommand::List => {
                let listing = self.list().await;
                output.write_all(listing.as_bytes()).await?;
            }
            AdminCommand::Broadcast(text) => {
                let report = self.broadcast(&text).await;
                let summary = format!(
                    "Broadcast sent to {} client(s), {} failed.\n",
                    report.delivered, report.failed
                );
                output.write_all(summary.as_bytes()).await?;
            }
            AdminCommand::Shutdown => {
                output.write_all(b"Shutting down...\n").await?;
                self.shutdown();
            }
        }
        output.flush().await
    }

    /// Renders the current registry snapshot
    pub async fn list(&self) -> String {
        let peers = self.registry.peers().await;
        if peers.is_empty() {
            return "No clients connected.\n".to_string();
        }

        let mut listing = format!("Connected clients ({}):\n", peers.len());
        for (id, addr) in peers {
            listing.push_str(&format!(" - {} {}\n", id, addr));
        }
        listing
    }

    /// Encodes the announcement once and sends it to every connected client
    pub async fn broadcast(&self, text: &str) -> BroadcastReport {
        let announcement = Response::ok(json!({
            "reply": text,
            "color": ANNOUNCEMENT_COLOR,
        }));
        let frame = match encode_response(&announcement, &self.key) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Could not encode broadcast: {}", e);
                return BroadcastReport::default();
            }
        };

        let report = self.registry.broadcast(&frame).await;
        info!(
            "Broadcast delivered to {} client(s), {} failed",
            report.delivered, report.failed
        );
        report
    }

    pub fn shutdown(&self) {
        if self.shutdown.trigger() {
            info!("Shutdown requested from admin console");
        }
    }
}
