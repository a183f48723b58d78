//! Shared helpers for integration tests.

use reply_server::{Endpoint, Handler, Server};

/// Spawn a server on the given endpoint and wait for its address.
pub async fn spawn_server(endpoint: Endpoint, handler: impl Handler) -> (Server, String) {
    let server = Server::new(endpoint, handler);
    let runner = server.clone();
    tokio::spawn(async move { runner.serve().await });
    let address = server.ready().await;
    (server, address)
}
