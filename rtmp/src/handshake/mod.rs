//! This module handles the server side of the simple (unencrypted, digest-less) RTMP
//! handshake.
//!
//! The handshake moves through `Uninitialized -> VersionSent -> AckSent -> Done`.  Each
//! transition consumes exactly one block of bytes:
//!
//! * `Uninitialized` takes the 1537 byte C0 + C1 block and responds with S0 and S1.
//! * `VersionSent` takes the 1536 byte C2 block and responds with S2, an echo of C1.
//! * `AckSent` takes a 1536 byte acknowledgement that must be identical to S1.
//!
//! `process_block()` performs a single transition.  `process_bytes()` accepts arbitrarily
//! fragmented socket reads, buffers them, and feeds complete blocks through the transitions.
//! Since real clients send C2 as their echo of S1, `process_bytes()` verifies that same C2
//! block as the acknowledgement once S2 has been produced.

mod errors;

pub use self::errors::HandshakeError;

use byteorder::{BigEndian, WriteBytesExt};
use bytes::{Bytes, BytesMut};
use rand::RngCore;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, trace, warn};

/// The only RTMP version this handshake speaks (plain, unencrypted RTMP)
pub const RTMP_VERSION: u8 = 3;

/// Size of the C1/S1/C2/S2 packets
pub const HANDSHAKE_PACKET_SIZE: usize = 1536;

const RANDOM_DATA_SIZE: usize = HANDSHAKE_PACKET_SIZE - 8;
const VERSION_AND_PACKET_SIZE: usize = 1 + HANDSHAKE_PACKET_SIZE;

/// The externally visible phase of a handshake
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum HandshakePhase {
    Uninitialized,
    VersionSent,
    AckSent,
    Done,
}

/// The packets a phase needs to hold on to.  Nothing is kept once the handshake is done.
enum State {
    Uninitialized,
    VersionSent { c1: Bytes, s1: Bytes },
    AckSent { s1: Bytes },
    Done,
}

/// The result of feeding socket bytes into the handshake
#[derive(PartialEq, Debug)]
pub enum HandshakeProcessResult {
    /// The handshake needs more bytes.  All responses must be sent to the peer in order.
    InProgress { responses: Vec<Bytes> },

    /// The handshake finished.  Any bytes that were received after the final handshake block
    /// belong to the chunk stream and must be handed to it.
    Completed {
        responses: Vec<Bytes>,
        remaining_bytes: Bytes,
    },
}

/// The server side state of one connection's handshake
pub struct Handshake {
    state: State,
    client_version: Option<u8>,
    send_s2_with_s1: bool,
    buffer: BytesMut,
}

impl Handshake {
    /// Creates a handshake that waits for the peer's C0 and C1
    pub fn new() -> Handshake {
        Handshake {
            state: State::Uninitialized,
            client_version: None,
            send_s2_with_s1: false,
            buffer: BytesMut::with_capacity(VERSION_AND_PACKET_SIZE),
        }
    }

    /// Creates a handshake that sends S2 right behind S0 and S1 instead of waiting for C2.
    ///
    /// Some clients (ffmpeg for example) read S2 before they send C2, and will stall against a
    /// handshake that only replies to C2.
    pub fn with_early_s2() -> Handshake {
        let mut handshake = Handshake::new();
        handshake.send_s2_with_s1 = true;
        handshake
    }

    pub fn phase(&self) -> HandshakePhase {
        match self.state {
            State::Uninitialized => HandshakePhase::Uninitialized,
            State::VersionSent { .. } => HandshakePhase::VersionSent,
            State::AckSent { .. } => HandshakePhase::AckSent,
            State::Done => HandshakePhase::Done,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.phase() == HandshakePhase::Done
    }

    /// The version byte the peer sent in C0, once it has been received
    pub fn client_version(&self) -> Option<u8> {
        self.client_version
    }

    /// Buffers socket bytes and runs every phase transition the buffered bytes allow.
    pub fn process_bytes(&mut self, data: &[u8]) -> Result<HandshakeProcessResult, HandshakeError> {
        if self.is_completed() {
            return Err(HandshakeError::HandshakeAlreadyCompleted);
        }

        self.buffer.extend_from_slice(data);
        let mut responses = Vec::new();

        loop {
            match self.phase() {
                HandshakePhase::Uninitialized => {
                    if self.buffer.len() < VERSION_AND_PACKET_SIZE {
                        break;
                    }

                    let block = self.buffer.split_to(VERSION_AND_PACKET_SIZE);
                    responses.extend(self.process_block(&block)?);
                }

                HandshakePhase::VersionSent => {
                    if self.buffer.len() < HANDSHAKE_PACKET_SIZE {
                        break;
                    }

                    // C2 triggers S2 and is also the peer's acknowledgement of S1
                    let c2 = self.buffer.split_to(HANDSHAKE_PACKET_SIZE);
                    responses.extend(self.process_block(&c2)?);
                    responses.extend(self.process_block(&c2)?);
                }

                HandshakePhase::AckSent => {
                    if self.buffer.len() < HANDSHAKE_PACKET_SIZE {
                        break;
                    }

                    let acknowledgement = self.buffer.split_to(HANDSHAKE_PACKET_SIZE);
                    responses.extend(self.process_block(&acknowledgement)?);
                }

                HandshakePhase::Done => break,
            }
        }

        if self.is_completed() {
            let remaining_bytes = self.buffer.split().freeze();
            Ok(HandshakeProcessResult::Completed {
                responses,
                remaining_bytes,
            })
        } else {
            Ok(HandshakeProcessResult::InProgress { responses })
        }
    }

    /// Performs the transition out of the current phase using one complete block.
    ///
    /// On error the phase is left unchanged.  Returns the responses that must be sent to the
    /// peer, in order.
    pub fn process_block(&mut self, block: &[u8]) -> Result<Vec<Bytes>, HandshakeError> {
        match self.state {
            State::Uninitialized => {
                self.verify_block_size(block, VERSION_AND_PACKET_SIZE)?;

                let version = block[0];
                if version != RTMP_VERSION {
                    warn!(version, "Peer sent an unexpected RTMP version in C0");
                }

                let c1 = Bytes::copy_from_slice(&block[1..]);
                let s1 = create_s1()?;

                let mut responses = vec![Bytes::from_static(&[RTMP_VERSION]), s1.clone()];
                if self.send_s2_with_s1 {
                    responses.push(c1.clone());
                }

                self.client_version = Some(version);
                self.state = State::VersionSent { c1, s1 };
                debug!(version, "Received C0 and C1, sent S0 and S1");

                Ok(responses)
            }

            State::VersionSent { ref c1, ref s1 } => {
                self.verify_block_size(block, HANDSHAKE_PACKET_SIZE)?;

                let responses = if self.send_s2_with_s1 {
                    Vec::new()
                } else {
                    vec![c1.clone()]
                };

                let s1 = s1.clone();
                self.state = State::AckSent { s1 };
                debug!("Received C2, sent S2");

                Ok(responses)
            }

            State::AckSent { ref s1 } => {
                self.verify_block_size(block, HANDSHAKE_PACKET_SIZE)?;

                if block != &s1[..] {
                    return Err(HandshakeError::AcknowledgementMismatch);
                }

                self.state = State::Done;
                debug!("Handshake completed");

                Ok(Vec::new())
            }

            State::Done => Err(HandshakeError::HandshakeAlreadyCompleted),
        }
    }

    fn verify_block_size(&self, block: &[u8], expected: usize) -> Result<(), HandshakeError> {
        if block.len() != expected {
            trace!(received = block.len(), expected, "Handshake block size mismatch");
            return Err(HandshakeError::InvalidBlockSize {
                phase: self.phase(),
                expected,
                received: block.len(),
            });
        }

        Ok(())
    }
}

impl Default for Handshake {
    fn default() -> Self {
        Handshake::new()
    }
}

/// S1 is the current unix time in seconds, four zero bytes, then random data
fn create_s1() -> Result<Bytes, HandshakeError> {
    let epoch = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_secs() as u32)
        .unwrap_or(0);

    let mut random_data = [0_u8; RANDOM_DATA_SIZE];
    rand::thread_rng().fill_bytes(&mut random_data);

    let mut packet = Vec::with_capacity(HANDSHAKE_PACKET_SIZE);
    packet.write_u32::<BigEndian>(epoch)?;
    packet.write_u32::<BigEndian>(0)?;
    packet.extend_from_slice(&random_data);

    Ok(Bytes::from(packet))
}
