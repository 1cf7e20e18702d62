use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Path the gateway serves when none is configured
pub const DEFAULT_ROUTE: &str = "/traefik-merged";

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("Invalid listen address: {0}")]
    InvalidListenAddress(String),

    #[error("At least two comma-separated endpoints are required (primary,secondary), got {0}")]
    TooFewEndpoints(usize),

    #[error("Invalid endpoint URL {0:?}: {1}")]
    InvalidEndpoint(String, url::ParseError),

    #[error("Unsupported scheme for {backend} backend: {scheme}")]
    UnsupportedScheme {
        backend: &'static str,
        scheme: String,
    },

    #[error("Route must start with '/': {0}")]
    InvalidRoute(String),

    #[error("Timeout cannot be 0: {0}")]
    ZeroTimeout(&'static str),
}

/// Merge gateway configuration
///
/// Built once at startup and never mutated afterwards; the dispatcher keeps
/// it behind an `Arc` and every request reads from the same instance.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    /// Listener for incoming requests
    #[serde(default)]
    pub listener: Listener,
    /// The two JSON backends
    pub backends: Backends,
    /// The single path served by the gateway
    #[serde(default = "default_route")]
    pub route: String,
    /// Upstream timeouts
    #[serde(default)]
    pub timeouts: Timeouts,
}

fn default_route() -> String {
    DEFAULT_ROUTE.to_string()
}

impl Config {
    pub fn new(backends: Backends) -> Self {
        Self {
            listener: Listener::default(),
            backends,
            route: default_route(),
            timeouts: Timeouts::default(),
        }
    }

    /// Builds a configuration from a comma separated endpoint list and an
    /// optional `host:port` listen address.
    pub fn from_endpoints(endpoints: &str, listen: Option<&str>) -> Result<Self, ValidationError> {
        let mut config = Self::new(endpoints.parse()?);
        if let Some(addr) = listen {
            config.listener = addr.parse()?;
        }
        Ok(config)
    }

    /// Validates the gateway configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listener.validate()?;
        self.backends.validate()?;
        self.timeouts.validate()?;

        if !self.route.starts_with('/') {
            return Err(ValidationError::InvalidRoute(self.route.clone()));
        }

        Ok(())
    }
}

/// Network listener configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listener {
    /// Host address to bind to (e.g., "0.0.0.0" or "127.0.0.1")
    pub host: String,
    /// Port number to listen on
    pub port: u16,
}

impl Default for Listener {
    fn default() -> Self {
        Listener {
            host: "0.0.0.0".into(),
            port: 9000,
        }
    }
}

impl Listener {
    /// Validates the listener configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        Ok(())
    }
}

/// Parses `host:port`. An empty host (`:9000`) binds every interface.
impl FromStr for Listener {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidListenAddress(s.to_string());

        let (host, port) = s.trim().rsplit_once(':').ok_or_else(invalid)?;
        let port = port.parse::<u16>().map_err(|_| invalid())?;
        let host = if host.is_empty() { "0.0.0.0" } else { host };

        Ok(Listener {
            host: host.to_string(),
            port,
        })
    }
}

/// The two upstream JSON services
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Backends {
    /// Read-only source; its values win merge conflicts
    pub primary: Url,
    /// Read-write source; base of the merge and target of every write
    pub secondary: Url,
}

impl Backends {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !matches!(self.primary.scheme(), "http" | "https") {
            return Err(ValidationError::UnsupportedScheme {
                backend: "primary",
                scheme: self.primary.scheme().to_string(),
            });
        }

        // Writes go through the plain HTTP proxy client
        if self.secondary.scheme() != "http" {
            return Err(ValidationError::UnsupportedScheme {
                backend: "secondary",
                scheme: self.secondary.scheme().to_string(),
            });
        }

        Ok(())
    }
}

/// Parses `primary,secondary[,...]`. Entries past the second are ignored.
impl FromStr for Backends {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() < 2 {
            return Err(ValidationError::TooFewEndpoints(parts.len()));
        }

        let parse = |raw: &str| {
            Url::parse(raw).map_err(|e| ValidationError::InvalidEndpoint(raw.to_string(), e))
        };

        Ok(Backends {
            primary: parse(parts[0])?,
            secondary: parse(parts[1])?,
        })
    }
}

/// Upstream timeout configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Timeouts {
    /// Total time allowed for one backend fetch on the read path
    pub fetch_secs: u64,
    /// Time allowed for the write backend to answer a proxied request
    pub proxy_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Timeouts {
            fetch_secs: 4,
            proxy_secs: 10,
        }
    }
}

impl Timeouts {
    pub fn fetch(&self) -> Duration {
        Duration::from_secs(self.fetch_secs)
    }

    pub fn proxy(&self) -> Duration {
        Duration::from_secs(self.proxy_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.fetch_secs == 0 {
            return Err(ValidationError::ZeroTimeout("fetch_secs"));
        }
        if self.proxy_secs == 0 {
            return Err(ValidationError::ZeroTimeout("proxy_secs"));
        }
        Ok(())
    }
}
