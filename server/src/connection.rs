use anyhow::Context;
use ingest_rtmp::sessions::{ServerSession, SessionConfig, SessionResult};
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, info, instrument, warn};

/// Runs the session for a single connection until the peer disconnects or an error occurs
#[instrument(skip(stream, session_config, read_buffer_size))]
pub async fn handle_connection(
    connection_id: u32,
    peer: SocketAddr,
    mut stream: TcpStream,
    session_config: SessionConfig,
    read_buffer_size: usize,
) -> anyhow::Result<()> {
    let mut session =
        ServerSession::new(session_config).context("failed to create server session")?;

    let mut buffer = vec![0; read_buffer_size.max(1)];
    loop {
        let bytes_read = stream
            .read(&mut buffer)
            .await
            .context("failed to read from socket")?;

        if bytes_read == 0 {
            info!("Peer disconnected");
            return Ok(());
        }

        let results = session
            .handle_input(&buffer[..bytes_read])
            .context("failed to handle bytes from peer")?;

        for result in results {
            match result {
                SessionResult::OutboundResponse(bytes) => {
                    stream
                        .write_all(&bytes)
                        .await
                        .context("failed to write to socket")?;
                }

                SessionResult::HandshakeCompleted => {
                    let client_version = session.client_version();
                    if client_version != Some(ingest_rtmp::handshake::RTMP_VERSION) {
                        warn!(?client_version, "Handshake completed with an unexpected version");
                    } else {
                        info!("Handshake completed");
                    }
                }

                SessionResult::MessageReceived(payload) => {
                    debug!(
                        csid = payload.chunk_stream_id,
                        type_id = payload.type_id,
                        timestamp = payload.timestamp,
                        stream_id = payload.message_stream_id,
                        length = payload.data.len(),
                        "Message received"
                    );
                }

                SessionResult::Amf0MessageReceived { payload, values } => {
                    let name = values.values.first().and_then(|value| value.as_str());
                    info!(
                        csid = payload.chunk_stream_id,
                        type_id = payload.type_id,
                        stream_id = payload.message_stream_id,
                        name = name.unwrap_or("<none>"),
                        value_count = values.values.len(),
                        "AMF0 message received"
                    );
                }
            }
        }
    }
}
