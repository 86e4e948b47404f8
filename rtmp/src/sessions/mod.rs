//! This module contains the session abstraction for the server side of an RTMP connection.
//!
//! A session reacts to incoming bytes with packets to be sent back to the peer, and raises the
//! RTMP messages it reassembled so applications can perform custom logic on them.

mod server;

pub use self::server::ServerSession;
pub use self::server::SessionConfig;
pub use self::server::SessionError;
pub use self::server::SessionResult;
