use log::{error, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;

use crate::client::{ClientRegistry, handle_client};
use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::middleware::{AuditSink, FileAuditLog};
use crate::protocol::{Response, write_message};
use crate::protocol::responses::TOO_MANY_CONNECTIONS;
use crate::server::ServerContext;
use crate::storage::{ByteStore, FsByteStore};

pub struct Server {
    client_registry: Arc<Mutex<ClientRegistry>>,
    listener: TcpListener,
    context: Arc<ServerContext>,
}

impl Server {
    /// Builds a server with a filesystem byte store and a file audit log.
    pub async fn new(config: ServerConfig) -> Result<Self, ServerError> {
        let store = Arc::new(FsByteStore::open(config.storage_root_path())?);
        let audit = Arc::new(FileAuditLog::open(&config.audit_log_file())?);
        Self::with_backends(config, store, audit).await
    }

    /// Builds a server over the given byte store and audit sink.
    pub async fn with_backends(
        config: ServerConfig,
        store: Arc<dyn ByteStore>,
        audit: Arc<dyn AuditSink>,
    ) -> Result<Self, ServerError> {
        let socket = config.listen_socket();
        let listener = match TcpListener::bind(&socket).await {
            Ok(listener) => {
                info!("Server bound to {}", socket);
                listener
            }
            Err(e) => {
                error!("Failed to bind to {}: {}", socket, e);
                return Err(ServerError::Io(e));
            }
        };

        Ok(Self {
            client_registry: Arc::new(Mutex::new(ClientRegistry::new())),
            listener,
            context: Arc::new(ServerContext::new(config, store, audit)),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn context(&self) -> Arc<ServerContext> {
        Arc::clone(&self.context)
    }

    pub async fn start(&self) {
        info!(
            "Starting RAX file share on {} (max {} clients, {} files)",
            self.local_addr()
                .map(|a| a.to_string())
                .unwrap_or_else(|_| self.context.config.listen_socket()),
            self.context.config.max_clients,
            self.context.config.max_files
        );

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let client_registry = Arc::clone(&self.client_registry);
                    let context = Arc::clone(&self.context);

                    // Spawn a task for each client so accept loop doesn't block
                    tokio::spawn(async move {
                        if let Err(e) = handle_new_client(stream, addr, client_registry, context).await {
                            warn!("Failed to handle client {}: {}", addr, e);
                        }
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                }
            }
        }
    }
}

/// Registers a new client, serves it, and unregisters it when it leaves.
async fn handle_new_client(
    mut stream: TcpStream,
    client_addr: SocketAddr,
    client_registry: Arc<Mutex<ClientRegistry>>,
    context: Arc<ServerContext>,
) -> Result<(), ServerError> {
    let max_clients = context.config.max_clients;
    let active = {
        let mut clients = client_registry.lock().await;
        if !clients.try_insert(client_addr, max_clients) {
            None
        } else {
            Some(clients.len())
        }
    };

    let Some(active) = active else {
        warn!("Refusing {}: {} clients already connected", client_addr, max_clients);
        write_message(&mut stream, &Response::status(TOO_MANY_CONNECTIONS)).await?;
        return Ok(()); // Close connection
    };

    info!("Client connected: {} ({}/{} clients)", client_addr, active, max_clients);

    handle_client(stream, client_addr, context).await;

    let mut clients = client_registry.lock().await;
    clients.remove(&client_addr);
    if clients.is_empty() {
        info!("No clients connected");
    }
    Ok(())
}
