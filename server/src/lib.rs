//! A small RTMP ingest server.  Every accepted TCP connection gets its own task owning the
//! socket and an `ingest_rtmp` session; nothing is shared between connections.

mod config;
mod connection;

pub use config::ServerConfig;

use std::fmt::Display;
use std::future::Future;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

/// Accepts connections from the listener forever, spawning a task for each one
pub async fn serve(listener: TcpListener, config: ServerConfig) {
    let session_config = config.session_config();
    let mut next_connection_id: u32 = 0;

    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(connection) => connection,
            Err(error) => {
                warn!(%error, "Failed to accept connection");
                continue;
            }
        };

        let connection_id = next_connection_id;
        next_connection_id = next_connection_id.wrapping_add(1);
        info!(connection_id, %peer, "Connection received");

        spawn(connection::handle_connection(
            connection_id,
            peer,
            stream,
            session_config.clone(),
            config.read_buffer_size,
        ));
    }
}

fn spawn<F, E>(future: F)
where
    F: Future<Output = Result<(), E>> + Send + 'static,
    E: Display,
{
    tokio::task::spawn(async {
        if let Err(error) = future.await {
            error!("{:#}", error);
        }
    });
}
