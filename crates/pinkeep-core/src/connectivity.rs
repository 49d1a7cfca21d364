//! Network reachability checks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;

/// Reports whether the device can currently reach the network.
#[async_trait]
pub trait ConnectivityProvider: Send + Sync {
    async fn is_connected(&self) -> bool;
}

/// Fixed answer, switchable at runtime. Used for `--offline` and in tests.
#[derive(Debug, Default)]
pub struct StaticConnectivity {
    connected: AtomicBool,
}

impl StaticConnectivity {
    pub const fn new(connected: bool) -> Self {
        Self {
            connected: AtomicBool::new(connected),
        }
    }

    pub const fn online() -> Self {
        Self::new(true)
    }

    pub const fn offline() -> Self {
        Self::new(false)
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }
}

#[async_trait]
impl ConnectivityProvider for StaticConnectivity {
    async fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

/// Probes reachability by opening a TCP connection to the API host.
#[derive(Debug, Clone)]
pub struct TcpProbeConnectivity {
    address: String,
    timeout: Duration,
}

impl TcpProbeConnectivity {
    const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

    /// Probe `host:port`.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Probe the host of an API base URL, on its explicit port or the scheme default.
    pub fn for_base_url(base_url: &str) -> Option<Self> {
        let url = url::Url::parse(base_url).ok()?;
        let host = url.host_str()?;
        let port = url.port_or_known_default()?;
        Some(Self::new(format!("{host}:{port}")))
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn address(&self) -> &str {
        &self.address
    }
}

#[async_trait]
impl ConnectivityProvider for TcpProbeConnectivity {
    async fn is_connected(&self) -> bool {
        match tokio::time::timeout(
            self.timeout,
            tokio::net::TcpStream::connect(self.address.as_str()),
        )
        .await
        {
            Ok(Ok(_)) => true,
            Ok(Err(error)) => {
                tracing::debug!(address = %self.address, %error, "Connectivity probe failed");
                false
            }
            Err(_) => {
                tracing::debug!(address = %self.address, "Connectivity probe timed out");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_connectivity_can_be_toggled() {
        let connectivity = StaticConnectivity::offline();
        assert!(!connectivity.is_connected().await);

        connectivity.set_connected(true);
        assert!(connectivity.is_connected().await);
    }

    #[test]
    fn probe_address_uses_scheme_default_port() {
        let probe = TcpProbeConnectivity::for_base_url("https://api.pinboard.in/v1/").unwrap();
        assert_eq!(probe.address(), "api.pinboard.in:443");

        let probe = TcpProbeConnectivity::for_base_url("http://localhost:8080/v1/").unwrap();
        assert_eq!(probe.address(), "localhost:8080");

        assert!(TcpProbeConnectivity::for_base_url("not a url").is_none());
    }

    #[tokio::test]
    async fn probe_reports_listening_socket_as_connected() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();

        let probe = TcpProbeConnectivity::new(address);
        assert!(probe.is_connected().await);
    }

    #[tokio::test]
    async fn probe_reports_closed_port_as_disconnected() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();
        drop(listener);

        let probe = TcpProbeConnectivity::new(address).with_timeout(Duration::from_millis(500));
        assert!(!probe.is_connected().await);
    }
}
