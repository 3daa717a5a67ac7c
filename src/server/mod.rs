pub mod handlers;
pub mod router;

use crate::core::config::settings::ServerSettings;

/// `host:port` to listen on; a numeric `PORT` value overrides the configured port.
pub fn bind_address(settings: &ServerSettings, port_override: Option<&str>) -> String {
    let port = port_override
        .and_then(|value| value.trim().parse::<u16>().ok())
        .unwrap_or(settings.port);
    format!("{}:{}", settings.host, port)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> ServerSettings {
        ServerSettings {
            host: "127.0.0.1".to_string(),
            port: 8000,
            max_in_flight: 1,
            cors_allowed_origins: Vec::new(),
        }
    }

    #[test]
    fn port_env_overrides_configured_port() {
        assert_eq!(bind_address(&settings(), None), "127.0.0.1:8000");
        assert_eq!(bind_address(&settings(), Some("9090")), "127.0.0.1:9090");
        assert_eq!(bind_address(&settings(), Some("not-a-port")), "127.0.0.1:8000");
    }
}
