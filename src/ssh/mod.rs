//! SSH server module
//!
//! One [`SshHandler`] per connection; each shell session runs its own
//! program task fed by the handler.

mod handler;
mod session;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use russh::keys::PrivateKey;
use russh::server::{self, Server as _};
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::Config;

pub use handler::SshHandler;
pub use session::SessionOutput;

/// Why [`serve`] stopped with an error
#[derive(Debug, Error)]
pub enum ServeError {
    #[error("ssh server failed: {0}")]
    Serve(#[source] std::io::Error),
    #[error("ssh server failed while stopping: {0}")]
    Shutdown(#[source] std::io::Error),
    #[error("ssh server did not stop within {0:?}")]
    ShutdownTimeout(Duration),
}

/// SSH server implementation
#[derive(Clone)]
pub struct SshServer {
    pub config: Arc<Config>,
}

impl SshServer {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }
}

impl server::Server for SshServer {
    type Handler = SshHandler;

    fn new_client(&mut self, peer_addr: Option<SocketAddr>) -> Self::Handler {
        info!(?peer_addr, "new connection");
        SshHandler::new(self.config.clone(), peer_addr)
    }

    fn handle_session_error(&mut self, error: <Self::Handler as server::Handler>::Error) {
        tracing::error!("session error: {:?}", error);
    }
}

/// Serve SSH on `listener` until `shutdown` resolves.
///
/// After the shutdown signal, open sessions are disconnected and the accept
/// loop gets `config.shutdown_timeout` to wind down.
pub async fn serve<F>(
    config: Arc<Config>,
    key: PrivateKey,
    listener: TcpListener,
    shutdown: F,
) -> Result<(), ServeError>
where
    F: Future<Output = ()> + Send,
{
    let russh_config = Arc::new(server::Config {
        keys: vec![key],
        inactivity_timeout: Some(config.inactivity_timeout),
        ..Default::default()
    });

    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "listening");
    }

    let mut server = SshServer::new(config.clone());
    let mut running = server.run_on_socket(russh_config, &listener);
    let handle = running.handle();

    tokio::select! {
        result = &mut running => return result.map_err(ServeError::Serve),
        _ = shutdown => {}
    }

    info!("stopping SSH server");
    handle.shutdown("server shutting down".to_string());

    match tokio::time::timeout(config.shutdown_timeout, running).await {
        Ok(result) => result.map_err(ServeError::Shutdown),
        Err(_) => Err(ServeError::ShutdownTimeout(config.shutdown_timeout)),
    }
}
