//! The protocol core of an RTMP ingest server.
//!
//! * `handshake` performs the simple (digest-less) server side handshake.
//! * `chunk_io` turns the chunked byte stream that follows the handshake into complete
//!   message payloads.
//! * `messages` holds the message payload type and the few control messages that affect
//!   chunk framing.
//! * `sessions` ties the above together for a single connection without performing any I/O.

pub mod chunk_io;
pub mod handshake;
pub mod messages;
pub mod sessions;
