//! # Chat Client Library
//!
//! This library provides the terminal client for the obfuscated JSON chat
//! service. It connects to the server over TCP, encodes each request with the
//! shared key, and renders every response with ANSI colours.
//!
//! ## Request Flow
//!
//! The client is strictly request/response: one encoded request is written,
//! then one encoded response is read back before the next menu prompt. A
//! broadcast announcement that arrives in between is shown in place of the
//! awaited reply, which the next read then picks up.
//!
//! ## Module Organization
//!
//! ### Network Module (`network`)
//! The TCP connection, frame encoding and decoding, and client errors.
//!
//! ### Input Module (`input`)
//! Menu choices and line-based prompting.
//!
//! ### Rendering Module (`rendering`)
//! Colour codes and response formatting.
//!
//! ### Session Module (`session`)
//! The interactive menu loop tying the other modules together.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::network::ChatClient;
//! use shared::{Request, DEFAULT_KEY};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client = ChatClient::connect("127.0.0.1:5050", DEFAULT_KEY.as_bytes()).await?;
//!
//!     let response = client.send_request(&Request::math(2.0, 3.0)).await?;
//!     println!("{}", client::rendering::format_response(&response));
//!
//!     client.send_request(&Request::quit()).await?;
//!     client.close().await?;
//!     Ok(())
//! }
//! ```

pub mod input;
pub mod network;
pub mod rendering;
pub mod session;

pub use network::{ChatClient, ClientError};
pub use session::Session;
