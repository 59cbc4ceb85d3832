use log::debug;
use shared::{decode_response, encode_request, FrameError, Request, Response};
use std::io;
use std::net::SocketAddr;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, ToSocketAddrs};

/// Bytes read per receive call; large enough for a sizeable history reply
pub const RECEIVE_BUFFER_SIZE: usize = 64 * 1024;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("connection error: {0}")]
    Io(#[from] io::Error),
    #[error("unreadable response: {0}")]
    Frame(#[from] FrameError),
    #[error("server closed the connection")]
    Closed,
}

/// One TCP connection to the chat server
pub struct ChatClient {
    stream: TcpStream,
    key: Vec<u8>,
    buffer: Vec<u8>,
}

impl ChatClient {
    pub async fn connect<A: ToSocketAddrs>(addr: A, key: &[u8]) -> Result<Self, ClientError> {
        let stream = TcpStream::connect(addr).await?;
        debug!("Connected to {}", stream.peer_addr()?);

        Ok(ChatClient {
            stream,
            key: key.to_vec(),
            buffer: vec![0u8; RECEIVE_BUFFER_SIZE],
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.stream.local_addr()
    }

    /// Encodes and sends one request without waiting for the reply
    pub async fn send(&mut self, request: &Request) -> Result<(), ClientError> {
        let frame = encode_request(request, &self.key);
        self.send_raw(frame.as_bytes()).await
    }

    /// Sends bytes exactly as given, bypassing the codec
    pub async fn send_raw(&mut self, bytes: &[u8]) -> Result<(), ClientError> {
        self.stream.write_all(bytes).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Waits for the next frame from the server, reply or broadcast
    pub async fn recv_response(&mut self) -> Result<Response, ClientError> {
        let len = self.stream.read(&mut self.buffer).await?;
        if len == 0 {
            return Err(ClientError::Closed);
        }

        let wire = String::from_utf8_lossy(&self.buffer[..len]);
        Ok(decode_response(&wire, &self.key)?)
    }

    /// Sends a request and waits for its response
    pub async fn send_request(&mut self, request: &Request) -> Result<Response, ClientError> {
        self.send(request).await?;
        self.recv_response().await
    }

    /// Shuts down the write side and drops the connection
    ///
    /// A server that already closed its end (after `quit`) is not an error.
    pub async fn close(mut self) -> Result<(), ClientError> {
        match self.stream.shutdown().await {
            Err(e) if e.kind() != io::ErrorKind::NotConnected => Err(e.into()),
            _ => Ok(()),
        }
    }
}
