use crate::chunk_io::INITIAL_MAX_CHUNK_SIZE;
use ingest_amf0::Amf0DeserializerOptions;

/// The configuration options that govern how a RTMP server session should operate
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// The max chunk size assumed for the peer's chunks until it sends a `SetChunkSize` message
    pub initial_max_chunk_size: usize,

    /// When false, AMF0 command and data messages are raised as raw `MessageReceived` results
    pub decode_amf0_messages: bool,

    pub amf0_options: Amf0DeserializerOptions,

    /// Sends S2 together with S0 and S1 instead of waiting for the peer's C2
    pub send_s2_with_s1: bool,
}

impl SessionConfig {
    /// Creates a new server session config with overridable defaults
    pub fn new() -> SessionConfig {
        SessionConfig {
            initial_max_chunk_size: INITIAL_MAX_CHUNK_SIZE,
            decode_amf0_messages: true,
            amf0_options: Amf0DeserializerOptions::new(),
            send_s2_with_s1: false,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig::new()
    }
}
