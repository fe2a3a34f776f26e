//! Endpoint resolution for the etcd client
//!
//! Turns the configured host specification into the ordered `(host, port)`
//! candidates the client fails over across. Resolution is purely local;
//! no DNS or network work happens here.

use std::fmt;

/// One candidate etcd server.
///
/// An endpoint's position in the resolved sequence is its failover
/// priority: the first listed endpoint is always tried first.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    host: String,
    port: u16,
}

impl Endpoint {
    /// Create an endpoint from a host and port.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Hostname or IP address of this endpoint.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// TCP port of this endpoint.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Base URL for this endpoint, e.g. `http://10.0.1.1:2379`.
    pub fn base_url(&self, protocol: &str) -> String {
        format!("{}://{}:{}", protocol, self.host, self.port)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Host specification accepted by [`ClientConfig`](crate::ClientConfig).
///
/// Three shapes are supported: a single hostname, several hostnames
/// sharing the configured port, or explicit `(host, port)` pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Host {
    /// A single hostname, paired with the configured port.
    Single(String),
    /// Several hostnames, each paired with the configured port.
    List(Vec<String>),
    /// Explicit `(host, port)` pairs; the configured port is ignored.
    Pairs(Vec<(String, u16)>),
}

impl Host {
    /// Resolve the specification into the ordered endpoint sequence.
    ///
    /// Input order is preserved. `default_port` applies only to entries
    /// that do not carry their own port.
    pub fn resolve(&self, default_port: u16) -> Vec<Endpoint> {
        match self {
            Host::Single(host) => vec![Endpoint::new(host.clone(), default_port)],
            Host::List(hosts) => hosts
                .iter()
                .map(|host| Endpoint::new(host.clone(), default_port))
                .collect(),
            Host::Pairs(pairs) => pairs
                .iter()
                .map(|(host, port)| Endpoint::new(host.clone(), *port))
                .collect(),
        }
    }
}

impl Default for Host {
    fn default() -> Self {
        Host::Single("127.0.0.1".to_string())
    }
}

impl From<&str> for Host {
    fn from(host: &str) -> Self {
        Host::Single(host.to_string())
    }
}

impl From<String> for Host {
    fn from(host: String) -> Self {
        Host::Single(host)
    }
}

impl From<Vec<&str>> for Host {
    fn from(hosts: Vec<&str>) -> Self {
        Host::List(hosts.into_iter().map(String::from).collect())
    }
}

impl From<Vec<String>> for Host {
    fn from(hosts: Vec<String>) -> Self {
        Host::List(hosts)
    }
}

impl From<Vec<(&str, u16)>> for Host {
    fn from(pairs: Vec<(&str, u16)>) -> Self {
        Host::Pairs(pairs.into_iter().map(|(h, p)| (h.to_string(), p)).collect())
    }
}

impl From<Vec<(String, u16)>> for Host {
    fn from(pairs: Vec<(String, u16)>) -> Self {
        Host::Pairs(pairs)
    }
}
