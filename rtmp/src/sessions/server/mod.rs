mod config;
mod errors;
mod result;

#[cfg(test)]
mod tests;

use crate::chunk_io::ChunkDeserializer;
use crate::handshake::{Handshake, HandshakeProcessResult};
use crate::messages::{MessagePayload, RtmpMessage};
use tracing::{debug, trace};

pub use self::config::SessionConfig;
pub use self::errors::SessionError;
pub use self::result::SessionResult;

/// A session that represents the server side of a single RTMP connection.
///
/// The `ServerSession` performs the handshake, then parses RTMP chunks coming in from the
/// client into RTMP messages.  Protocol control messages that change how chunks are framed
/// (`SetChunkSize` and `Abort`) are applied before any further chunk is parsed.  AMF0 command
/// and data messages are decoded and raised together with their values.
///
/// The `ServerSession` does not care how bytes come in or get sent out, but leaves that up to
/// the application utilizing it.  Every byte received from the peer must be passed in, in
/// order, and every `OutboundResponse` must be sent to the peer in the order it was returned.
///
/// Once `handle_input()` returns an error the session must be discarded, as the state of the
/// handshake or the chunk stream can no longer be trusted.
pub struct ServerSession {
    config: SessionConfig,
    handshake: Handshake,
    deserializer: ChunkDeserializer,
}

impl ServerSession {
    /// Creates a new server session that waits for the peer's handshake
    pub fn new(config: SessionConfig) -> Result<ServerSession, SessionError> {
        let handshake = if config.send_s2_with_s1 {
            Handshake::with_early_s2()
        } else {
            Handshake::new()
        };

        let mut deserializer = ChunkDeserializer::new();
        deserializer.set_max_chunk_size(config.initial_max_chunk_size)?;

        Ok(ServerSession {
            config,
            handshake,
            deserializer,
        })
    }

    pub fn is_handshake_completed(&self) -> bool {
        self.handshake.is_completed()
    }

    /// The RTMP version the peer requested in its C0 packet, if it has been received
    pub fn client_version(&self) -> Option<u8> {
        self.handshake.client_version()
    }

    /// The max chunk size currently expected from the peer
    pub fn max_chunk_size(&self) -> usize {
        self.deserializer.get_max_chunk_size()
    }

    /// Takes in bytes received from the peer and returns any responses or messages that can
    /// be reacted to.
    pub fn handle_input(&mut self, bytes: &[u8]) -> Result<Vec<SessionResult>, SessionError> {
        let mut results = Vec::new();
        if self.handshake.is_completed() {
            self.handle_chunks(bytes, &mut results)?;
            return Ok(results);
        }

        match self.handshake.process_bytes(bytes)? {
            HandshakeProcessResult::InProgress { responses } => {
                results.extend(responses.into_iter().map(SessionResult::OutboundResponse));
            }

            HandshakeProcessResult::Completed {
                responses,
                remaining_bytes,
            } => {
                results.extend(responses.into_iter().map(SessionResult::OutboundResponse));
                results.push(SessionResult::HandshakeCompleted);

                if !remaining_bytes.is_empty() {
                    trace!(
                        length = remaining_bytes.len(),
                        "Passing bytes received after the handshake to the chunk stream"
                    );

                    self.handle_chunks(&remaining_bytes[..], &mut results)?;
                }
            }
        }

        Ok(results)
    }

    fn handle_chunks(
        &mut self,
        bytes: &[u8],
        results: &mut Vec<SessionResult>,
    ) -> Result<(), SessionError> {
        let mut bytes_to_process = bytes;
        while let Some(payload) = self.deserializer.get_next_message(bytes_to_process)? {
            let result = self.handle_message(payload)?;
            results.push(result);
            bytes_to_process = &[];
        }

        Ok(())
    }

    fn handle_message(&mut self, payload: MessagePayload) -> Result<SessionResult, SessionError> {
        if payload.is_amf0() && !self.config.decode_amf0_messages {
            return Ok(SessionResult::MessageReceived(payload));
        }

        let message = payload.to_rtmp_message(&self.config.amf0_options)?;
        let result = match message {
            RtmpMessage::SetChunkSize { size } => {
                self.deserializer.set_max_chunk_size(size as usize)?;
                SessionResult::MessageReceived(payload)
            }

            RtmpMessage::Abort { chunk_stream_id } => {
                if !self.deserializer.abort_message(chunk_stream_id) {
                    debug!(
                        csid = chunk_stream_id,
                        "Peer aborted a chunk stream with no partial message"
                    );
                }

                SessionResult::MessageReceived(payload)
            }

            RtmpMessage::Amf0Command {
                command_name,
                transaction_id,
                document,
            } => {
                debug!(
                    command = %command_name,
                    transaction_id,
                    stream_id = payload.message_stream_id,
                    "Received AMF0 command"
                );

                SessionResult::Amf0MessageReceived {
                    payload,
                    values: document,
                }
            }

            RtmpMessage::Amf0Data { document } => SessionResult::Amf0MessageReceived {
                payload,
                values: document,
            },

            RtmpMessage::Other { .. } => SessionResult::MessageReceived(payload),
        };

        Ok(result)
    }
}
