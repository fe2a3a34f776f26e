//! An async client for the etcd v2 HTTP API
//!
//! This library provides a high-level async client for the etcd v2
//! key-value API with ordered failover across the members of a cluster.
//!
//! # Features
//! - Key reads, writes with optional TTL, deletes, and directory handling
//! - Watch support via long-polling reads
//! - Failover across an ordered list of endpoints
//! - Version and statistics introspection endpoints
//! - Async/await API using tokio
//! - HTTP and HTTPS endpoints
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use etcd2_client::Client;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), etcd2_client::Error> {
//!     let client = Client::new(vec!["10.0.1.1", "10.0.1.2", "10.0.1.3"])?;
//!
//!     // Store a value
//!     let response = client.write("/message", "Hello world", None).await?;
//!     println!("action: {:?}", response.action());
//!
//!     // Retrieve it
//!     let response = client.read("/message", false).await?;
//!     println!("node: {:?}", response.node());
//!
//!     // Block until it changes
//!     let change = client.read("/message", true).await?;
//!     println!("changed: {:?}", change.node());
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs, rust_2018_idioms)]

pub mod client;
pub mod endpoint;
pub mod error;
pub mod response;
pub mod transport;

pub use client::{Client, ClientConfig};
pub use endpoint::{Endpoint, Host};
pub use error::{Error, Result};
pub use response::{Node, Response};
pub use transport::{HyperTransport, Method, RawResponse, Transport, TransportError};
