//! Process-wide defaults and transport configuration.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use crate::transport::{HttpTransport, Transport};

/// Default URI scheme for API requests.
pub const DEFAULT_SCHEME: &str = "https";

/// Default API host.
pub const DEFAULT_HOST: &str = "api.spotify.com";

/// Default API port.
pub const DEFAULT_PORT: u16 = 443;

/// Configuration for the default HTTP transport.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Total request timeout.
    pub timeout: Duration,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// User agent string.
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            user_agent: format!("spotify-web-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl TransportConfig {
    /// Set the total request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the user agent string.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }
}

static DEFAULT_TRANSPORT: OnceLock<Arc<HttpTransport>> = OnceLock::new();

/// Shared default transport, created on first access.
///
/// The instance holds only client configuration and a connection pool, so
/// it needs no teardown.
pub fn default_transport() -> Arc<dyn Transport> {
    DEFAULT_TRANSPORT
        .get_or_init(|| Arc::new(HttpTransport::new()))
        .clone()
}
