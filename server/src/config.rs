use clap::Parser;
use ingest_amf0::UnsupportedMarkerPolicy;
use ingest_rtmp::sessions::SessionConfig;
use std::net::{IpAddr, SocketAddr};

/// Command line configuration of the ingest server
#[derive(Parser, Debug, Clone)]
#[command(name = "ingest_server", about = "Accepts RTMP connections and reassembles their messages")]
pub struct ServerConfig {
    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0")]
    pub bind: IpAddr,

    #[arg(long, env = "RTMP_PORT", default_value_t = 1935)]
    pub port: u16,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Size of the buffer each connection reads socket bytes into
    #[arg(long, default_value_t = 4096)]
    pub read_buffer_size: usize,

    /// Drop reserved AMF0 markers instead of closing the connection
    #[arg(long)]
    pub skip_unsupported_amf0: bool,

    /// Send S2 right after S0 and S1 instead of waiting for C2
    #[arg(long)]
    pub early_s2: bool,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }

    /// The configuration every connection's session is created with
    pub fn session_config(&self) -> SessionConfig {
        let mut config = SessionConfig::new();
        config.send_s2_with_s1 = self.early_s2;
        if self.skip_unsupported_amf0 {
            config.amf0_options.unsupported_markers = UnsupportedMarkerPolicy::Skip;
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_applied() {
        let config = ServerConfig::try_parse_from(&["ingest_server", "--port", "1935"]).unwrap();

        assert_eq!(config.socket_addr(), "0.0.0.0:1935".parse().unwrap());
        assert_eq!(config.log_level, "info");
        assert_eq!(config.read_buffer_size, 4096);
        assert!(!config.skip_unsupported_amf0);
        assert!(!config.early_s2);

        let session_config = config.session_config();
        assert_eq!(
            session_config.amf0_options.unsupported_markers,
            UnsupportedMarkerPolicy::Fail
        );
        assert!(!session_config.send_s2_with_s1);
    }

    #[test]
    fn flags_flow_into_session_config() {
        let config = ServerConfig::try_parse_from(&[
            "ingest_server",
            "--bind",
            "127.0.0.1",
            "--port",
            "19350",
            "--skip-unsupported-amf0",
            "--early-s2",
        ])
        .unwrap();

        assert_eq!(config.socket_addr(), "127.0.0.1:19350".parse().unwrap());

        let session_config = config.session_config();
        assert_eq!(
            session_config.amf0_options.unsupported_markers,
            UnsupportedMarkerPolicy::Skip
        );
        assert!(session_config.send_s2_with_s1);
    }

    #[test]
    fn error_when_bind_address_is_invalid() {
        let result = ServerConfig::try_parse_from(&["ingest_server", "--bind", "not-an-ip"]);
        assert!(result.is_err());
    }
}
