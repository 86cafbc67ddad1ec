//! Configuration for the mock service.

use crate::mock::{FirstSelection, RandomSelection, SelectionPolicy};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::sync::Arc;

/// How one of several named examples is chosen.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    /// Uniformly random per request
    #[default]
    Random,
    /// Always the first example in document order
    First,
}

impl SelectionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectionMode::Random => "random",
            SelectionMode::First => "first",
        }
    }

    pub fn policy(&self) -> Arc<dyn SelectionPolicy> {
        match self {
            SelectionMode::Random => Arc::new(RandomSelection),
            SelectionMode::First => Arc::new(FirstSelection),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MockConfig {
    /// Address to bind, an IP address or `localhost`
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind (0 = pick a free port)
    #[serde(default)]
    pub port: u16,
    /// Add CORS headers and answer preflight requests
    #[serde(default)]
    pub cors: bool,
    /// Gzip large bodies for clients that accept it
    #[serde(default)]
    pub compression: bool,
    #[serde(default)]
    pub selection: SelectionMode,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: 0,
            cors: false,
            compression: false,
            selection: SelectionMode::default(),
        }
    }
}

impl MockConfig {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let contents = std::fs::read_to_string(path)?;
        let config: MockConfig = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.host.trim().is_empty() {
            anyhow::bail!("'host' must not be empty");
        }
        self.ip()?;
        Ok(())
    }

    /// Address the server binds to.
    pub fn socket_addr(&self) -> Result<SocketAddr, anyhow::Error> {
        Ok(SocketAddr::new(self.ip()?, self.port))
    }

    fn ip(&self) -> Result<IpAddr, anyhow::Error> {
        let host = self.host.trim();
        if host.eq_ignore_ascii_case("localhost") {
            return Ok(IpAddr::V4(Ipv4Addr::LOCALHOST));
        }
        host.trim_start_matches('[')
            .trim_end_matches(']')
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid host '{}': expected an IP address", self.host))
    }
}
