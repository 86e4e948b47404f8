use super::*;
use crate::chunk_io::ChunkDeserializationError;
use crate::handshake::{HandshakeError, HANDSHAKE_PACKET_SIZE};
use crate::messages::MessageDeserializationError;
use byteorder::{BigEndian, LittleEndian, WriteBytesExt};
use bytes::Bytes;
use ingest_amf0::{Amf0Complex, Amf0DeserializationError, Amf0Value};

#[test]
fn handshake_responses_are_returned_in_order() {
    let mut session = ServerSession::new(SessionConfig::new()).unwrap();
    let c0_and_c1 = create_c0_and_c1();

    let results = session.handle_input(&c0_and_c1).unwrap();
    assert_eq!(results.len(), 2, "Unexpected number of results");
    match &results[0] {
        SessionResult::OutboundResponse(bytes) => assert_eq!(&bytes[..], &[3]),
        x => panic!("Expected S0 but got {:?}", x),
    }

    let s1 = match &results[1] {
        SessionResult::OutboundResponse(bytes) => bytes.clone(),
        x => panic!("Expected S1 but got {:?}", x),
    };

    assert_eq!(s1.len(), HANDSHAKE_PACKET_SIZE, "Incorrect S1 size");
    assert!(!session.is_handshake_completed());
    assert_eq!(session.client_version(), Some(3));

    let results = session.handle_input(&s1).unwrap();
    assert_eq!(results.len(), 2, "Unexpected number of results");
    match &results[0] {
        SessionResult::OutboundResponse(bytes) => assert_eq!(&bytes[..], &c0_and_c1[1..]),
        x => panic!("Expected S2 but got {:?}", x),
    }

    assert_eq!(results[1], SessionResult::HandshakeCompleted);
    assert!(session.is_handshake_completed());
}

#[test]
fn early_s2_is_returned_with_s0_and_s1_when_configured() {
    let mut config = SessionConfig::new();
    config.send_s2_with_s1 = true;
    let mut session = ServerSession::new(config).unwrap();

    let results = session.handle_input(&create_c0_and_c1()).unwrap();
    assert_eq!(results.len(), 3, "Unexpected number of results");

    let s1 = match &results[1] {
        SessionResult::OutboundResponse(bytes) => bytes.clone(),
        x => panic!("Expected S1 but got {:?}", x),
    };

    let results = session.handle_input(&s1).unwrap();
    assert_eq!(results, vec![SessionResult::HandshakeCompleted]);
}

#[test]
fn bytes_following_handshake_are_parsed_as_chunks() {
    let mut session = ServerSession::new(SessionConfig::new()).unwrap();
    let s1 = start_handshake(&mut session);

    let mut bytes = s1.to_vec();
    bytes.extend(form_chunks(6, 500, 9, 1, &[1, 2, 3], 128));

    let results = session.handle_input(&bytes).unwrap();
    assert_eq!(results.len(), 3, "Unexpected number of results");
    assert_eq!(results[1], SessionResult::HandshakeCompleted);
    match &results[2] {
        SessionResult::MessageReceived(payload) => {
            assert_eq!(payload.chunk_stream_id, 6, "Incorrect csid");
            assert_eq!(payload.timestamp, 500, "Incorrect timestamp");
            assert_eq!(payload.type_id, 9, "Incorrect type id");
            assert_eq!(payload.message_stream_id, 1, "Incorrect stream id");
            assert_eq!(&payload.data[..], &[1, 2, 3], "Incorrect data");
        }

        x => panic!("Expected message but got {:?}", x),
    }
}

#[test]
fn can_receive_multiple_messages_in_one_read() {
    let mut session = completed_session(SessionConfig::new());
    let mut bytes = form_chunks(4, 10, 8, 1, &[1], 128);
    bytes.extend(form_chunks(6, 20, 9, 1, &[2], 128));

    let results = session.handle_input(&bytes).unwrap();
    assert_eq!(results.len(), 2, "Unexpected number of results");
}

#[test]
fn set_chunk_size_message_changes_inbound_chunk_size() {
    let mut session = completed_session(SessionConfig::new());
    let payload = [0x42_u8; 10];

    let mut bytes = form_chunks(2, 0, 1, 0, &[0, 0, 0, 4], 128);
    bytes.extend(form_chunks(6, 0, 9, 1, &payload, 4));

    let results = session.handle_input(&bytes).unwrap();
    assert_eq!(results.len(), 2, "Unexpected number of results");
    assert_eq!(session.max_chunk_size(), 4, "Chunk size was not applied");

    match &results[0] {
        SessionResult::MessageReceived(message) => assert_eq!(message.type_id, 1),
        x => panic!("Expected set chunk size message but got {:?}", x),
    }

    match &results[1] {
        SessionResult::MessageReceived(message) => {
            assert_eq!(&message.data[..], &payload[..], "Incorrect data")
        }

        x => panic!("Expected video message but got {:?}", x),
    }
}

#[test]
fn configured_initial_chunk_size_is_used() {
    let mut config = SessionConfig::new();
    config.initial_max_chunk_size = 4;
    let mut session = completed_session(config);

    let results = session
        .handle_input(&form_chunks(6, 0, 9, 1, &[1, 2, 3, 4, 5, 6], 4))
        .unwrap();

    assert_eq!(results.len(), 1, "Unexpected number of results");
}

#[test]
fn abort_message_discards_partial_message() {
    let mut session = completed_session(SessionConfig::new());
    let mut bytes = form_chunks(2, 0, 1, 0, &[0, 0, 0, 4], 128);
    bytes.extend_from_slice(&form_chunks(6, 10, 9, 1, &[1, 2, 3, 4, 5, 6], 4)[..16]);

    let results = session.handle_input(&bytes).unwrap();
    assert_eq!(results.len(), 1, "Expected only the set chunk size message");

    let mut bytes = form_chunks(2, 0, 2, 0, &[0, 0, 0, 6], 4);
    bytes.extend(form_chunks(6, 30, 9, 1, &[7, 8], 4));

    let results = session.handle_input(&bytes).unwrap();
    assert_eq!(results.len(), 2, "Unexpected number of results");
    match &results[1] {
        SessionResult::MessageReceived(message) => {
            assert_eq!(message.timestamp, 30, "Incorrect timestamp");
            assert_eq!(&message.data[..], &[7, 8], "Incorrect data");
        }

        x => panic!("Expected video message but got {:?}", x),
    }
}

#[test]
fn amf0_command_is_decoded() {
    let mut session = completed_session(SessionConfig::new());
    let command = create_connect_command("live");

    let results = session
        .handle_input(&form_chunks(3, 0, 20, 0, &command, 128))
        .unwrap();

    assert_eq!(results.len(), 1, "Unexpected number of results");
    match &results[0] {
        SessionResult::Amf0MessageReceived { payload, values } => {
            assert_eq!(payload.type_id, 20, "Incorrect type id");
            assert_eq!(
                values.values[0],
                Amf0Value::Utf8String("connect".to_string())
            );
            assert_eq!(values.values[1], Amf0Value::Number(1.0));

            match values.resolve(&values.values[2]) {
                Some(object @ Amf0Complex::Object(_)) => assert_eq!(
                    object.property("app").and_then(|x| x.as_str()),
                    Some("live")
                ),

                x => panic!("Expected command object but got {:?}", x),
            }
        }

        x => panic!("Expected amf0 message but got {:?}", x),
    }
}

#[test]
fn amf0_data_is_decoded() {
    let mut session = completed_session(SessionConfig::new());
    let mut data = vec![0x02];
    write_amf0_string(&mut data, "@setDataFrame");
    data.push(0x05);

    let results = session
        .handle_input(&form_chunks(4, 0, 18, 1, &data, 128))
        .unwrap();

    match &results[0] {
        SessionResult::Amf0MessageReceived { values, .. } => assert_eq!(
            values.values,
            vec![
                Amf0Value::Utf8String("@setDataFrame".to_string()),
                Amf0Value::Null
            ]
        ),

        x => panic!("Expected amf0 message but got {:?}", x),
    }
}

#[test]
fn amf0_messages_are_raw_when_decoding_is_disabled() {
    let mut config = SessionConfig::new();
    config.decode_amf0_messages = false;
    let mut session = completed_session(config);

    // Not valid AMF0, but it is never decoded
    let results = session
        .handle_input(&form_chunks(3, 0, 20, 0, &[0xff, 0xfe], 128))
        .unwrap();

    match &results[0] {
        SessionResult::MessageReceived(payload) => {
            assert_eq!(&payload.data[..], &[0xff, 0xfe], "Incorrect data")
        }

        x => panic!("Expected raw message but got {:?}", x),
    }
}

#[test]
fn error_when_amf0_payload_is_invalid() {
    let mut session = completed_session(SessionConfig::new());
    let mut command = create_connect_command("live");
    command.push(0x04);

    match session.handle_input(&form_chunks(3, 0, 20, 0, &command, 128)) {
        Err(SessionError::MessageDeserializationError(
            MessageDeserializationError::Amf0DeserializationError(
                Amf0DeserializationError::UnsupportedMarker { marker: 0x04 },
            ),
        )) => (),
        x => panic!("Expected unsupported marker error but got {:?}", x),
    }
}

#[test]
fn error_when_chunk_stream_has_no_previous_chunk() {
    let mut session = completed_session(SessionConfig::new());

    match session.handle_input(&[0xc5, 0x01]) {
        Err(SessionError::ChunkDeserializationError(
            ChunkDeserializationError::NoPreviousChunkOnStream { csid: 5 },
        )) => (),
        x => panic!("Expected framing error but got {:?}", x),
    }
}

#[test]
fn error_when_peer_sets_chunk_size_to_zero() {
    let mut session = completed_session(SessionConfig::new());

    match session.handle_input(&form_chunks(2, 0, 1, 0, &[0, 0, 0, 0], 128)) {
        Err(SessionError::ChunkDeserializationError(
            ChunkDeserializationError::InvalidMaxChunkSize { chunk_size: 0 },
        )) => (),
        x => panic!("Expected invalid chunk size error but got {:?}", x),
    }
}

#[test]
fn error_when_handshake_acknowledgement_does_not_match() {
    let mut session = ServerSession::new(SessionConfig::new()).unwrap();
    start_handshake(&mut session);

    match session.handle_input(&[0_u8; HANDSHAKE_PACKET_SIZE]) {
        Err(SessionError::HandshakeError(HandshakeError::AcknowledgementMismatch)) => (),
        x => panic!("Expected handshake error but got {:?}", x),
    }
}

#[test]
fn error_when_initial_chunk_size_is_invalid() {
    let mut config = SessionConfig::new();
    config.initial_max_chunk_size = 0;

    match ServerSession::new(config) {
        Err(SessionError::ChunkDeserializationError(
            ChunkDeserializationError::InvalidMaxChunkSize { .. },
        )) => (),
        Err(x) => panic!("Unexpected error {:?}", x),
        Ok(_) => panic!("Expected an error"),
    }
}

fn create_c0_and_c1() -> Vec<u8> {
    let mut bytes = vec![3_u8];
    bytes.write_u32::<BigEndian>(0).unwrap();
    bytes.write_u32::<BigEndian>(0).unwrap();
    bytes.extend((0..HANDSHAKE_PACKET_SIZE - 8).map(|x| x as u8));
    bytes
}

/// Sends C0 and C1 and returns the S1 the session responded with
fn start_handshake(session: &mut ServerSession) -> Bytes {
    let results = session.handle_input(&create_c0_and_c1()).unwrap();
    match &results[1] {
        SessionResult::OutboundResponse(bytes) => bytes.clone(),
        x => panic!("Expected S1 but got {:?}", x),
    }
}

fn completed_session(config: SessionConfig) -> ServerSession {
    let mut session = ServerSession::new(config).unwrap();
    let s1 = start_handshake(&mut session);
    let _ = session.handle_input(&s1).unwrap();
    assert!(session.is_handshake_completed());

    session
}

/// Forms a type 0 chunk followed by type 3 chunks for any data past the chunk size
fn form_chunks(
    csid: u8,
    timestamp: u32,
    type_id: u8,
    message_stream_id: u32,
    data: &[u8],
    chunk_size: usize,
) -> Vec<u8> {
    let mut bytes = vec![csid];
    bytes.write_u24::<BigEndian>(timestamp).unwrap();
    bytes.write_u24::<BigEndian>(data.len() as u32).unwrap();
    bytes.write_u8(type_id).unwrap();
    bytes.write_u32::<LittleEndian>(message_stream_id).unwrap();

    for (index, piece) in data.chunks(chunk_size).enumerate() {
        if index > 0 {
            bytes.push(0b1100_0000 | csid);
        }

        bytes.extend_from_slice(piece);
    }

    bytes
}

fn write_amf0_string(bytes: &mut Vec<u8>, value: &str) {
    bytes.write_u16::<BigEndian>(value.len() as u16).unwrap();
    bytes.extend_from_slice(value.as_bytes());
}

fn create_connect_command(app: &str) -> Vec<u8> {
    let mut bytes = vec![0x02];
    write_amf0_string(&mut bytes, "connect");
    bytes.push(0x00);
    bytes.write_f64::<BigEndian>(1.0).unwrap();

    bytes.push(0x03);
    write_amf0_string(&mut bytes, "app");
    bytes.push(0x02);
    write_amf0_string(&mut bytes, app);
    write_amf0_string(&mut bytes, "");
    bytes.push(0x09);

    bytes
}
