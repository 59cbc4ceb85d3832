//! Per-client connection lifecycle
//!
//! Each accepted socket gets its own [`ConnectionHandler`] running on its own
//! task. The handler moves through `Connected -> Serving -> Closing -> Closed`:
//! it registers itself, answers requests strictly one at a time in arrival
//! order, and on end-of-stream, reset, a failed reply or a `quit` request it
//! unregisters and closes the socket.
//!
//! Frames that fail to decode or parse are dropped and the loop waits for the
//! next one; a single malformed message never costs the client its connection.

use crate::registry::{ClientHandle, ClientId, ClientRegistry};
use crate::router::RequestRouter;
use log::{debug, info, warn};
use shared::{decode_request, encode_response, Response, MAX_FRAME_SIZE};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::TcpStream;

/// Lifecycle of one connection; states only ever move forward
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connected,
    Serving,
    Closing,
    Closed,
}

/// Counters reported when a connection finishes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionStats {
    /// Requests answered (successfully or with an error response)
    pub served: u64,
    /// Frames dropped because they did not decode or parse
    pub dropped: u64,
}

/// Serves one client connection from registration to cleanup
///
/// `R` is the read half of the socket. The write half lives in the
/// [`ClientHandle`] so broadcasts can reach the client while the handler is
/// blocked reading.
pub struct ConnectionHandler<R> {
    handle: ClientHandle,
    reader: R,
    registry: Arc<ClientRegistry>,
    router: Arc<RequestRouter>,
    key: Arc<[u8]>,
    state: ConnectionState,
    stats: ConnectionStats,
}

impl ConnectionHandler<OwnedReadHalf> {
    /// Splits an accepted TCP stream into the handler's reader and shared writer
    pub fn from_tcp(
        stream: TcpStream,
        addr: SocketAddr,
        registry: Arc<ClientRegistry>,
        router: Arc<RequestRouter>,
        key: Arc<[u8]>,
    ) -> Self {
        let (reader, writer) = stream.into_split();
        Self::new(reader, writer, addr, registry, router, key)
    }
}

impl<R> ConnectionHandler<R>
where
    R: AsyncRead + Unpin,
{
    /// Builds a handler in the `Connected` state with a freshly allocated id
    ///
    /// Nothing is registered until [`ConnectionHandler::run`] starts.
    pub fn new<W>(
        reader: R,
        writer: W,
        addr: SocketAddr,
        registry: Arc<ClientRegistry>,
        router: Arc<RequestRouter>,
        key: Arc<[u8]>,
    ) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let handle = ClientHandle::new(registry.allocate_id(), addr, writer);
        Self {
            handle,
            reader,
            registry,
            router,
            key,
            state: ConnectionState::Connected,
            stats: ConnectionStats::default(),
        }
    }

    /// Id this connection is (or will be) registered under
    pub fn id(&self) -> ClientId {
        self.handle.id()
    }

    /// Current lifecycle state
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    fn transition(&mut self, next: ConnectionState) {
        debug!("Client {}: {:?} -> {:?}", self.handle.id(), self.state, next);
        self.state = next;
    }

    /// Drives the connection until it is closed
    pub async fn run(mut self) -> ConnectionStats {
        match self.registry.register(self.handle.clone()).await {
            Ok(()) => {
                self.transition(ConnectionState::Serving);
                self.serve().await;
            }
            Err(e) => {
                warn!("Rejecting {}: {}", self.handle.addr(), e);
                if let Err(e) = self.reply(&Response::error(e.to_string())).await {
                    debug!("Could not tell {} it was rejected: {}", self.handle.addr(), e);
                }
            }
        }

        self.close().await;
        self.stats
    }

    async fn serve(&mut self) {
        let id = self.handle.id();
        let mut buffer = vec![0u8; MAX_FRAME_SIZE];

        while self.state == ConnectionState::Serving {
            let len = match self.reader.read(&mut buffer).await {
                Ok(0) => {
                    debug!("Client {} closed the connection", id);
                    self.transition(ConnectionState::Closing);
                    break;
                }
                Ok(len) => len,
                Err(e) => {
                    info!("Client {} connection lost: {}", id, e);
                    self.transition(ConnectionState::Closing);
                    break;
                }
            };

            let wire = String::from_utf8_lossy(&buffer[..len]);
            let request = match decode_request(&wire, &self.key) {
                Ok(request) => request,
                Err(e) => {
                    warn!("Dropping frame from client {}: {}", id, e);
                    self.stats.dropped += 1;
                    continue;
                }
            };

            debug!("Client {} sent '{}' request", id, request.kind);
            let routed = self.router.route(&request).await;
            if let Err(e) = self.reply(&routed.response).await {
                warn!("Failed to reply to client {}: {}", id, e);
                self.transition(ConnectionState::Closing);
                break;
            }
            self.stats.served += 1;

            if routed.close {
                info!("Client {} requested to close the connection", id);
                self.transition(ConnectionState::Closing);
            }
        }
    }

    /// Encodes one response and writes it as a single frame
    async fn reply(&self, response: &Response) -> io::Result<()> {
        let frame = encode_response(response, &self.key)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        self.handle.send_frame(&frame).await
    }

    async fn close(&mut self) {
        if self.state != ConnectionState::Closing {
            self.transition(ConnectionState::Closing);
        }

        self.registry.unregister(self.handle.id()).await;
        if let Err(e) = self.handle.close().await {
            debug!("Client {} socket shutdown failed: {}", self.handle.id(), e);
        }

        self.transition(ConnectionState::Closed);
    }
}
