//! Client implementation for the etcd v2 HTTP API

use std::sync::Arc;
use std::time::Duration;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tracing::debug;
use url::form_urlencoded;

use crate::endpoint::{Endpoint, Host};
use crate::error::{Error, Result};
use crate::response::Response;
use crate::transport::{HyperTransport, Method, RawResponse, Transport};

/// Characters allowed unencoded in URI path segments per RFC 3986.
/// Everything else (including spaces, `#`, `?`, `%`, non-ASCII) gets
/// percent-encoded. `/` stays intact because etcd keys are paths.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'!')
    .remove(b'$')
    .remove(b'&')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'*')
    .remove(b'+')
    .remove(b',')
    .remove(b';')
    .remove(b'=')
    .remove(b':')
    .remove(b'@')
    .remove(b'/');

/// Percent-encode a key for use in a URI path.
fn encode_key(key: &str) -> String {
    utf8_percent_encode(key, PATH_SEGMENT).to_string()
}

/// Configuration options for the etcd client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Host specification: a single host, a host list, or explicit
    /// `(host, port)` pairs (default: `127.0.0.1`)
    pub host: Host,
    /// Port for hosts that do not carry their own (default: 2379)
    pub port: u16,
    /// URL scheme, `http` or `https` (default: `http`)
    pub protocol: String,
    /// API version prefix in request paths (default: `v2`)
    pub version_prefix: String,
    /// Whether to fail over to the next endpoint after a transport
    /// failure (default: true). When false only the first endpoint is
    /// ever contacted.
    pub allow_reconnect: bool,
    /// DNS SRV discovery domain. Not supported; setting it fails
    /// construction.
    pub srv_domain: Option<String>,
    /// Per-request timeout (default: none, so watch requests can block
    /// indefinitely)
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: Host::default(),
            port: 2379,
            protocol: "http".to_string(),
            version_prefix: "v2".to_string(),
            allow_reconnect: true,
            srv_domain: None,
            timeout: None,
        }
    }
}

/// Async client for the etcd v2 HTTP API
///
/// The client holds an ordered list of endpoints. Every request starts at
/// the first endpoint and walks the list until one of them completes the
/// HTTP exchange; only transport-level failures (refused connections,
/// timeouts, DNS errors) trigger the move to the next endpoint. An HTTP
/// error status is a completed exchange and never causes failover.
///
/// Cloning is cheap and clones share the underlying connection pool.
///
/// # Example
/// ```rust,no_run
/// use etcd2_client::Client;
///
/// #[tokio::main]
/// async fn main() -> Result<(), etcd2_client::Error> {
///     // Single endpoint
///     let client = Client::new("127.0.0.1")?;
///
///     // Several endpoints, first listed is tried first
///     let client = Client::new(vec!["10.0.1.1", "10.0.1.2", "10.0.1.3"])?;
///
///     let response = client.write("/message", "Hello world", None).await?;
///     println!("action: {:?}", response.action());
///
///     let response = client.read("/message", false).await?;
///     println!("node: {:?}", response.node());
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct Client {
    config: Arc<ClientConfig>,
    endpoints: Arc<[Endpoint]>,
    urls: Arc<[String]>,
    transport: Arc<dyn Transport>,
}

impl Client {
    /// Create a client for the given host specification with default
    /// configuration.
    ///
    /// # Arguments
    /// * `host` - A hostname, a list of hostnames, or `(host, port)`
    ///   pairs; see [`Host`]
    ///
    /// # Errors
    /// Returns [`Error::Config`] if the specification resolves to no
    /// endpoints
    pub fn new(host: impl Into<Host>) -> Result<Self> {
        Self::with_config(ClientConfig {
            host: host.into(),
            ..Default::default()
        })
    }

    /// Create a client with custom configuration.
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let transport = Arc::new(HyperTransport::with_timeout(config.timeout));
        Self::with_transport(config, transport)
    }

    /// Create a client that dispatches through the given transport.
    ///
    /// This is the seam for exercising the client without a network, and
    /// for transports with their own connection handling.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        if let Some(domain) = &config.srv_domain {
            return Err(Error::Config(format!(
                "SRV discovery (srv_domain = {:?}) is not supported",
                domain
            )));
        }
        if config.protocol != "http" && config.protocol != "https" {
            return Err(Error::Config(format!(
                "Unsupported protocol: {}",
                config.protocol
            )));
        }

        let endpoints = config.host.resolve(config.port);
        if endpoints.is_empty() {
            return Err(Error::Config("At least one host is required".to_string()));
        }
        let urls: Vec<String> = endpoints
            .iter()
            .map(|endpoint| endpoint.base_url(&config.protocol))
            .collect();

        Ok(Self {
            config: Arc::new(config),
            endpoints: endpoints.into(),
            urls: urls.into(),
            transport,
        })
    }

    /// Resolved endpoints in failover order.
    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    /// Read the value of a key.
    ///
    /// With `wait` the request long-polls until the key changes and then
    /// returns the change. A missing key surfaces as the
    /// [`Error::Service`] the server reports for it (code 100).
    ///
    /// # Arguments
    /// * `key` - Key path, e.g. `/message`
    /// * `wait` - Block until the key changes
    ///
    /// # Example
    /// ```rust,no_run
    /// # use etcd2_client::Client;
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), etcd2_client::Error> {
    /// # let client = Client::new("127.0.0.1")?;
    /// let response = client.read("/message", false).await?;
    /// if let Some(node) = response.node() {
    ///     println!("value: {:?}", node.get("value"));
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn read(&self, key: &str, wait: bool) -> Result<Response> {
        let mut uri = self.key_uri(key);
        if wait {
            uri.push_str("?wait=true");
        }
        self.request(Method::Get, &uri, None).await
    }

    /// Write a value to a key, optionally with a time to live.
    ///
    /// Overwrites an existing key; the previous state comes back in
    /// `prevNode`. With a `ttl` the key expires after that many seconds.
    ///
    /// # Arguments
    /// * `key` - Key path, e.g. `/message`
    /// * `value` - Value to store
    /// * `ttl` - Optional expiration in seconds
    ///
    /// # Example
    /// ```rust,no_run
    /// # use etcd2_client::Client;
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), etcd2_client::Error> {
    /// # let client = Client::new("127.0.0.1")?;
    /// client.write("/message", "Hello world", None).await?;
    /// client.write("/session", "abc", Some(30)).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn write(&self, key: &str, value: &str, ttl: Option<u64>) -> Result<Response> {
        let mut form = form_urlencoded::Serializer::new(String::new());
        form.append_pair("value", value);
        if let Some(ttl) = ttl {
            form.append_pair("ttl", &ttl.to_string());
        }
        let body = form.finish();
        self.request(Method::Put, &self.key_uri(key), Some(&body))
            .await
    }

    /// Delete a key.
    pub async fn delete(&self, key: &str) -> Result<Response> {
        self.request(Method::Delete, &self.key_uri(key), None).await
    }

    /// Create a directory.
    ///
    /// Fails with [`Error::Service`] code 105 if the path already exists.
    pub async fn mkdir(&self, path: &str) -> Result<Response> {
        let body = form_urlencoded::Serializer::new(String::new())
            .append_pair("dir", "true")
            .append_pair("prevExist", "false")
            .finish();
        self.request(Method::Put, &self.key_uri(path), Some(&body))
            .await
    }

    /// Remove a directory.
    ///
    /// A non-empty directory is only removed when `recursive` is set;
    /// otherwise the server reports [`Error::Service`] code 108.
    pub async fn rmdir(&self, path: &str, recursive: bool) -> Result<Response> {
        let mut uri = format!("{}?dir=true", self.key_uri(path));
        if recursive {
            uri.push_str("&recursive=true");
        }
        self.request(Method::Delete, &uri, None).await
    }

    /// Version of the etcd server, e.g. `2.3.7`.
    pub async fn version(&self) -> Result<String> {
        self.version_field("etcdserver").await
    }

    /// Version of the etcd server; alias of [`version`](Client::version).
    pub async fn version_server(&self) -> Result<String> {
        self.version_field("etcdserver").await
    }

    /// Version of the etcd cluster, e.g. `2.3.0`.
    pub async fn version_cluster(&self) -> Result<String> {
        self.version_field("etcdcluster").await
    }

    /// Leader statistics: leader id plus per-follower counters and
    /// latency, exposed via [`Response::leader`] and
    /// [`Response::followers`].
    pub async fn leader_stats(&self) -> Result<Response> {
        let uri = format!("/{}/stats/leader", self.config.version_prefix);
        self.request(Method::Get, &uri, None).await
    }

    /// Statistics the queried member reports about itself, exposed via
    /// [`Response::id`], [`Response::state`] and friends.
    pub async fn self_stats(&self) -> Result<Response> {
        let uri = format!("/{}/stats/self", self.config.version_prefix);
        self.request(Method::Get, &uri, None).await
    }

    fn key_uri(&self, key: &str) -> String {
        format!("/{}/keys{}", self.config.version_prefix, encode_key(key))
    }

    /// The version endpoint predates the API prefix, so its URI is bare.
    async fn version_field(&self, field: &str) -> Result<String> {
        let response = self.request(Method::Get, "/version", None).await?;
        response
            .get(field)
            .and_then(|value| value.as_str())
            .map(|version| version.to_string())
            .ok_or_else(|| Error::Malformed(format!("Version response has no {} field", field)))
    }

    /// Dispatch a request and parse whatever body comes back.
    async fn request(&self, method: Method, uri: &str, body: Option<&str>) -> Result<Response> {
        let raw = self.execute(method, uri, body).await?;
        Response::from_raw(raw)
    }

    /// Try each candidate endpoint in order until one completes the
    /// exchange.
    ///
    /// Every call starts over at the first endpoint; there is no sticky
    /// routing. A transport failure moves straight on to the next
    /// candidate with the same request. Any completed exchange wins,
    /// whatever its HTTP status.
    async fn execute(&self, method: Method, uri: &str, body: Option<&str>) -> Result<RawResponse> {
        let candidates = if self.config.allow_reconnect {
            &self.urls[..]
        } else {
            &self.urls[..1]
        };

        // Construction guarantees at least one candidate, so the loop
        // always reaches one of its returns.
        let attempts = candidates.len();
        let mut index = 0;
        loop {
            let base = &candidates[index];
            let url = format!("{}{}", base, uri);
            debug!("Sending request: {} {}", method, url);
            let outcome = match method {
                Method::Get => self.transport.get(&url).await,
                Method::Put => self.transport.put(&url, body.unwrap_or_default()).await,
                Method::Delete => self.transport.delete(&url).await,
            };
            match outcome {
                Ok(raw) => {
                    debug!("Response {} from {}", raw.status, url);
                    return Ok(raw);
                }
                Err(error) => {
                    debug!("Endpoint unreachable: {}: {}", base, error);
                    index += 1;
                    if index == attempts {
                        return Err(Error::Unreachable {
                            attempts,
                            source: error,
                        });
                    }
                }
            }
        }
    }
}
