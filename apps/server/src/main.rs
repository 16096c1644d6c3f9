use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use parley_server::config::Config;
use parley_server::Server;

#[tokio::main]
async fn main() {
    // Load .env if present; env vars may be set externally.
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    let server = Server::bind(config).await.expect("failed to bind");
    tracing::info!(
        control = %server.control_addr().expect("control addr"),
        relay = %server.relay_addr().expect("relay addr"),
        "parley-server listening"
    );

    server.run().await.expect("server error");
}
