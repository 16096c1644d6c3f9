//! Parley server: a line-oriented chat and coordination service.
//!
//! One control port multiplexes presence, broadcast and private messaging,
//! Rock-Paper-Scissors games, heartbeat liveness, and file-transfer
//! brokering over persistent connections; a second port relays the file
//! bytes between transfer peers.

pub mod chat;
pub mod config;
pub mod registry;
pub mod rps;
pub mod session;
pub mod transfer;

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use config::Config;
use registry::ClientRegistry;
use rps::GameCoordinator;
use transfer::broker::TransferBroker;

/// Shared state available to every session and relay task.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub registry: Arc<ClientRegistry>,
    pub games: Arc<GameCoordinator>,
    pub transfers: Arc<TransferBroker>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            registry: Arc::new(ClientRegistry::new()),
            games: Arc::new(GameCoordinator::new()),
            transfers: Arc::new(TransferBroker::new()),
        }
    }
}

/// The bound listeners plus shared state; [`Server::run`] consumes it.
pub struct Server {
    state: AppState,
    control: TcpListener,
    relay: TcpListener,
}

impl Server {
    /// Binds the control and relay listeners per `config`.
    pub async fn bind(config: Config) -> io::Result<Server> {
        let control = TcpListener::bind(("0.0.0.0", config.control_port)).await?;
        let relay = TcpListener::bind(("0.0.0.0", config.relay_port)).await?;
        Ok(Server {
            state: AppState::new(config),
            control,
            relay,
        })
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn control_addr(&self) -> io::Result<SocketAddr> {
        self.control.local_addr()
    }

    pub fn relay_addr(&self) -> io::Result<SocketAddr> {
        self.relay.local_addr()
    }

    /// Runs the relay loop, the stale-transfer sweeper, and the control
    /// accept loop until the process shuts down.
    pub async fn run(self) -> io::Result<()> {
        let Server {
            state,
            control,
            relay,
        } = self;

        let relay_state = state.clone();
        tokio::spawn(transfer::relay::run(relay_state, relay));

        // Drop transfer contexts whose peers never both reached the relay.
        let sweeper_state = state.clone();
        tokio::spawn(async move {
            let ttl = sweeper_state.config.relay_ttl;
            let mut interval = tokio::time::interval(ttl);
            loop {
                interval.tick().await;
                let removed = sweeper_state.transfers.sweep_expired(ttl);
                if removed > 0 {
                    tracing::debug!(removed, "dropped stale transfer contexts");
                }
            }
        });

        loop {
            let (stream, peer) = control.accept().await?;
            tracing::debug!(%peer, "control connection accepted");
            tokio::spawn(session::connection::handle(state.clone(), stream, peer));
        }
    }
}
