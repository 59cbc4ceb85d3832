//! Process-wide registry of live client connections
//!
//! The registry is the single shared view of who is connected. Connection
//! handlers add themselves when they start serving and remove themselves
//! during cleanup; the admin console reads it to list peers and to fan a
//! broadcast frame out to everyone.
//!
//! All mutation goes through one `RwLock`. Anything that touches the network
//! (broadcast, forced close) first takes a snapshot and releases the lock, so
//! a slow or dead peer can never stall registrations or removals.

use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinSet;

/// Write side of a client socket, shared between its handler and broadcasts
pub type SharedWriter = Arc<Mutex<Box<dyn AsyncWrite + Send + Unpin>>>;

/// Server-assigned connection identity; ids increase monotonically
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClientId(pub u64);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Handle to one live connection: its identity, peer address and writer
///
/// Every frame is written whole while holding the writer mutex, so replies and
/// broadcasts to the same socket never interleave.
#[derive(Clone)]
pub struct ClientHandle {
    id: ClientId,
    addr: SocketAddr,
    writer: SharedWriter,
}

impl ClientHandle {
    /// Wraps `writer` so it can be shared between the handler and broadcasts
    pub fn new<W>(id: ClientId, addr: SocketAddr, writer: W) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self {
            id,
            addr,
            writer: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    /// Server-assigned id of this connection
    pub fn id(&self) -> ClientId {
        self.id
    }

    /// Remote address the connection was accepted from
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Writes one complete frame and flushes it
    pub async fn send_frame(&self, frame: &str) -> io::Result<()> {
        let mut writer = self.writer.lock().await;
        writer.write_all(frame.as_bytes()).await?;
        writer.flush().await
    }

    /// Shuts down the write side; the peer sees end-of-stream
    pub async fn close(&self) -> io::Result<()> {
        self.writer.lock().await.shutdown().await
    }
}

impl fmt::Debug for ClientHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientHandle")
            .field("id", &self.id)
            .field("addr", &self.addr)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Server full")]
    Full { max_clients: usize },
}

/// Outcome of one broadcast across a registry snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub failed: usize,
}

impl BroadcastReport {
    pub fn recipients(&self) -> usize {
        self.delivered + self.failed
    }
}

/// Shared set of live connections, keyed by [`ClientId`]
///
/// One registry is created per server and handed to every connection handler
/// and to the admin console behind an `Arc`.
pub struct ClientRegistry {
    /// Keyed by id, so iteration follows registration order
    clients: RwLock<BTreeMap<ClientId, ClientHandle>>,
    next_client_id: AtomicU64,
    /// Connection ceiling; 0 means unlimited
    max_clients: usize,
}

impl ClientRegistry {
    /// Creates an empty registry admitting at most `max_clients` connections
    ///
    /// A ceiling of 0 disables the limit. Ids start at 1.
    pub fn new(max_clients: usize) -> Self {
        Self {
            clients: RwLock::new(BTreeMap::new()),
            next_client_id: AtomicU64::new(1),
            max_clients,
        }
    }

    /// Creates a registry without a connection ceiling
    pub fn unbounded() -> Self {
        Self::new(0)
    }

    /// The configured ceiling, 0 when unlimited
    pub fn max_clients(&self) -> usize {
        self.max_clients
    }

    /// Hands out the next unused client id
    pub fn allocate_id(&self) -> ClientId {
        ClientId(self.next_client_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Adds a connection
    ///
    /// Registering a handle whose id is already present replaces that entry
    /// rather than duplicating it. Fails only when the connection ceiling
    /// would be exceeded.
    pub async fn register(&self, handle: ClientHandle) -> Result<(), RegistryError> {
        let mut clients = self.clients.write().await;

        let already_present = clients.contains_key(&handle.id);
        if !already_present && self.max_clients > 0 && clients.len() >= self.max_clients {
            return Err(RegistryError::Full {
                max_clients: self.max_clients,
            });
        }

        info!("Client {} connected from {}", handle.id, handle.addr);
        clients.insert(handle.id, handle);
        Ok(())
    }

    /// Removes a connection; returns false if it was already gone
    pub async fn unregister(&self, id: ClientId) -> bool {
        match self.clients.write().await.remove(&id) {
            Some(handle) => {
                info!("Client {} disconnected ({})", id, handle.addr);
                true
            }
            None => false,
        }
    }

    /// Point-in-time copy of every registered connection, in registration order
    pub async fn snapshot(&self) -> Vec<ClientHandle> {
        self.clients.read().await.values().cloned().collect()
    }

    /// Ids and addresses of every registered connection
    pub async fn peers(&self) -> Vec<(ClientId, SocketAddr)> {
        self.clients
            .read()
            .await
            .values()
            .map(|handle| (handle.id, handle.addr))
            .collect()
    }

    /// Whether `id` is currently registered
    ///
    /// The answer can be stale as soon as it is returned, since handlers
    /// register and unregister concurrently.
    pub async fn contains(&self, id: ClientId) -> bool {
        self.clients.read().await.contains_key(&id)
    }

    /// Sends `frame` to every connection in a snapshot
    ///
    /// Recipients are written to concurrently. A failed send is logged and
    /// counted but never aborts delivery to the others, and never removes the
    /// recipient; only its own handler does that.
    pub async fn broadcast(&self, frame: &str) -> BroadcastReport {
        let recipients = self.snapshot().await;
        let frame: Arc<str> = Arc::from(frame);

        let mut sends = JoinSet::new();
        for handle in recipients {
            let frame = Arc::clone(&frame);
            sends.spawn(async move {
                let result = handle.send_frame(&frame).await;
                (handle.id, handle.addr, result)
            });
        }

        let mut report = BroadcastReport::default();
        while let Some(joined) = sends.join_next().await {
            match joined {
                Ok((_, _, Ok(()))) => report.delivered += 1,
                Ok((id, addr, Err(e))) => {
                    warn!("Broadcast to client {} ({}) failed: {}", id, addr, e);
                    report.failed += 1;
                }
                Err(e) => {
                    warn!("Broadcast send task failed: {}", e);
                    report.failed += 1;
                }
            }
        }

        debug!(
            "Broadcast delivered to {} of {} clients",
            report.delivered,
            report.recipients()
        );
        report
    }

    /// Shuts down the writer of every registered connection
    ///
    /// Entries stay registered; each handler unregisters itself once its
    /// receive loop notices the closed connection.
    pub async fn close_all(&self) -> usize {
        let recipients = self.snapshot().await;
        let count = recipients.len();

        for handle in recipients {
            if let Err(e) = handle.close().await {
                debug!("Closing client {} failed: {}", handle.id, e);
            }
        }

        count
    }

    /// Number of registered connections at the time of the call
    pub async fn len(&self) -> usize {
        self.clients.read().await.len()
    }

    /// Returns true when no connection is registered
    pub async fn is_empty(&self) -> bool {
        self.clients.read().await.is_empty()
    }
}
