//! Server network layer: the listening socket and the accept loop

use crate::admin::AdminConsole;
use crate::chat_log::ChatLog;
use crate::config::ServerConfig;
use crate::connection::ConnectionHandler;
use crate::quotes::QuoteBank;
use crate::registry::ClientRegistry;
use crate::router::RequestRouter;
use crate::shutdown::Shutdown;
use log::{debug, error, info, warn};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind { addr: String, source: io::Error },
    #[error("accept loop failed: {0}")]
    Accept(io::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Accept errors that only affect the connection being accepted
fn is_transient(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionRefused
            | io::ErrorKind::Interrupted
            | io::ErrorKind::WouldBlock
    )
}

/// Owns the listening socket and spawns one handler task per accepted client
pub struct ChatServer {
    listener: TcpListener,
    registry: Arc<ClientRegistry>,
    router: Arc<RequestRouter>,
    key: Arc<[u8]>,
    shutdown: Shutdown,
}

impl ChatServer {
    /// Loads the quote file (falling back to built-in quotes) and binds
    pub async fn from_config(config: &ServerConfig) -> Result<Self, ServerError> {
        let quotes = QuoteBank::load_or_fallback(&config.quotes_path).await;
        Self::bind(config, quotes).await
    }

    pub async fn bind(config: &ServerConfig, quotes: QuoteBank) -> Result<Self, ServerError> {
        let addr = config.bind_address();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.clone(),
                source,
            })?;
        info!("Server listening on {}", listener.local_addr()?);

        let chat_log = Arc::new(ChatLog::new(&config.chat_log_path));
        let router = RequestRouter::new(chat_log, Arc::new(quotes));

        Ok(ChatServer {
            listener,
            registry: Arc::new(ClientRegistry::new(config.max_clients)),
            router: Arc::new(router),
            key: Arc::from(config.key.as_bytes()),
            shutdown: Shutdown::new(),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn registry(&self) -> Arc<ClientRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn shutdown_handle(&self) -> Shutdown {
        self.shutdown.clone()
    }

    /// Operator console bound to this server's registry, key and shutdown flag
    pub fn admin_console(&self) -> AdminConsole {
        AdminConsole::new(
            Arc::clone(&self.registry),
            self.shutdown.clone(),
            Arc::clone(&self.key),
        )
    }

    fn spawn_handler(&self, stream: TcpStream, addr: SocketAddr) {
        let handler = ConnectionHandler::from_tcp(
            stream,
            addr,
            Arc::clone(&self.registry),
            Arc::clone(&self.router),
            Arc::clone(&self.key),
        );

        tokio::spawn(async move {
            let id = handler.id();
            let stats = handler.run().await;
            debug!(
                "Client {} finished: {} served, {} dropped",
                id, stats.served, stats.dropped
            );
        });
    }

    /// Accepts clients until shutdown is requested or the listener fails
    ///
    /// On return the listening socket is closed, the shutdown flag is set and
    /// every still-registered client has had its socket shut down.
    pub async fn run(self) -> Result<(), ServerError> {
        info!("Server ready, waiting for clients");

        let result = loop {
            tokio::select! {
                _ = self.shutdown.wait() => {
                    info!("Shutdown flag raised, no longer accepting clients");
                    break Ok(());
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, addr)) => self.spawn_handler(stream, addr),
                    Err(e) if is_transient(&e) => {
                        warn!("Failed to accept a connection: {}", e);
                    }
                    Err(e) => {
                        error!("Listening socket failed: {}", e);
                        break Err(ServerError::Accept(e));
                    }
                },
            }
        };

        let ChatServer {
            listener,
            registry,
            shutdown,
            ..
        } = self;
        drop(listener);
        shutdown.trigger();

        let closed = registry.close_all().await;
        info!("Server shut down, closed {} client connection(s)", closed);

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::tempdir;
    use tokio::time::timeout;

    fn test_config(dir: &std::path::Path) -> ServerConfig {
        ServerConfig {
            port: 0,
            chat_log_path: dir.join("chat_log.txt"),
            quotes_path: dir.join("quotes.json"),
            ..ServerConfig::default()
        }
    }

    #[test]
    fn test_transient_accept_errors() {
        assert!(is_transient(&io::ErrorKind::ConnectionAborted.into()));
        assert!(is_transient(&io::ErrorKind::Interrupted.into()));
        assert!(!is_transient(&io::ErrorKind::PermissionDenied.into()));
        assert!(!is_transient(&io::Error::new(io::ErrorKind::Other, "too many open files")));
    }

    #[tokio::test]
    async fn test_bind_ephemeral_port() {
        let dir = tempdir().unwrap();
        let server = ChatServer::bind(&test_config(dir.path()), QuoteBank::fallback())
            .await
            .unwrap();
        let addr = server.local_addr().unwrap();
        assert!(addr.ip().is_loopback());
        assert_ne!(addr.port(), 0);
        assert!(server.registry().is_empty().await);
    }

    #[tokio::test]
    async fn test_bind_conflict_is_reported() {
        let dir = tempdir().unwrap();
        let first = ChatServer::bind(&test_config(dir.path()), QuoteBank::default())
            .await
            .unwrap();

        let config = ServerConfig {
            port: first.local_addr().unwrap().port(),
            ..test_config(dir.path())
        };
        let second = ChatServer::bind(&config, QuoteBank::default()).await;
        assert!(matches!(second, Err(ServerError::Bind { .. })));
    }

    #[tokio::test]
    async fn test_from_config_falls_back_to_builtin_quotes() {
        let dir = tempdir().unwrap();
        let server = ChatServer::from_config(&test_config(dir.path())).await.unwrap();
        assert_eq!(server.router.quotes().len(), crate::quotes::FALLBACK_QUOTES.len());
    }

    #[tokio::test]
    async fn test_shutdown_stops_accept_loop() {
        let dir = tempdir().unwrap();
        let server = ChatServer::bind(&test_config(dir.path()), QuoteBank::default())
            .await
            .unwrap();
        let addr = server.local_addr().unwrap();
        let shutdown = server.shutdown_handle();

        let task = tokio::spawn(server.run());
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!task.is_finished());

        assert!(shutdown.trigger());
        let result = timeout(Duration::from_secs(2), task).await.unwrap().unwrap();
        assert!(result.is_ok());

        // The listening socket is gone once run() returns
        assert!(TcpStream::connect(addr).await.is_err());
    }

    #[tokio::test]
    async fn test_shutdown_before_run_returns_immediately() {
        let dir = tempdir().unwrap();
        let server = ChatServer::bind(&test_config(dir.path()), QuoteBank::default())
            .await
            .unwrap();
        server.shutdown_handle().trigger();

        let result = timeout(Duration::from_secs(1), server.run()).await.unwrap();
        assert!(result.is_ok());
    }
}
