//! # Chat Server Library
//!
//! This library provides the server side of the obfuscated JSON chat service.
//! Clients connect over TCP, send one encoded JSON request per frame and get
//! exactly one encoded JSON response back, in order. An operator console on the
//! server host can list connected clients, broadcast announcements to all of
//! them, and shut the server down.
//!
//! ## Core Responsibilities
//!
//! ### Connection Lifecycle
//! Every accepted socket is served by its own task. A handler registers its
//! connection, runs a receive/decode/route/encode/send loop, and unregisters
//! itself when the peer disconnects, the socket fails, or the client sends
//! `quit`. Malformed frames are dropped without closing the connection.
//!
//! ### Shared State
//! Two resources are shared between connections:
//! - The client registry, mutated by handlers and read by the admin console
//! - The chat log file, appended to by every `chat` request
//!
//! Both serialize their mutations behind a lock, and neither holds a lock while
//! talking to the network.
//!
//! ### Broadcast and Shutdown
//! A broadcast is encoded once and written to every connection in a registry
//! snapshot. A peer that fails to receive it is logged and skipped. Shutdown is
//! a process-wide flag; raising it stops the accept loop, drops the listening
//! socket, and shuts down every connection still registered.
//!
//! ## Module Organization
//!
//! ### Registry Module (`registry`)
//! Live connection set with register/unregister/snapshot/broadcast.
//!
//! ### Connection Module (`connection`)
//! The per-client state machine (`Connected -> Serving -> Closing -> Closed`).
//!
//! ### Router Module (`router`)
//! Request dispatch: chat, time, math, quote, history and quit.
//!
//! ### Chat Log and Quotes (`chat_log`, `quotes`)
//! The append-only chat history file and the read-only quote list.
//!
//! ### Admin Module (`admin`)
//! Operator command parsing and execution.
//!
//! ### Network Module (`network`)
//! The listening socket, accept loop and server assembly.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::network::ChatServer;
//! use tokio::io::BufReader;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = ChatServer::from_config(&ServerConfig::default()).await?;
//!
//!     // Operator commands come from stdin on their own task
//!     let console = server.admin_console();
//!     tokio::spawn(async move {
//!         let _ = console
//!             .run(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
//!             .await;
//!     });
//!
//!     // Runs until the console issues SHUTDOWN
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod admin;
pub mod chat_log;
pub mod config;
pub mod connection;
pub mod network;
pub mod quotes;
pub mod registry;
pub mod router;
pub mod shutdown;
pub mod utils;

pub use admin::{AdminCommand, AdminConsole};
pub use config::ServerConfig;
pub use network::{ChatServer, ServerError};
pub use registry::{BroadcastReport, ClientHandle, ClientId, ClientRegistry};
pub use shutdown::Shutdown;
