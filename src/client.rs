//! Connected-client descriptors and per-connection stat records.
//!
//! Servers own the live connection state; these types are the read-only
//! snapshots they hand to the aggregator. Both shapes also serialize to flat
//! string-to-string maps, which is the form the display gauges expose.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Snapshot of one live client connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectedClient {
    /// Remote socket address of the connection.
    pub address: String,

    /// Authenticated username, if the connection has one.
    pub username: Option<String>,

    /// Negotiated protocol version string.
    pub protocol_version: String,

    /// Client driver name, when the client reported one.
    pub driver_name: Option<String>,

    /// Client driver version, when the client reported one.
    pub driver_version: Option<String>,

    /// When the connection was accepted.
    pub connected_at: DateTime<Utc>,

    /// Whether the connection is TLS-protected.
    pub tls: bool,

    /// Requests served on this connection so far.
    pub requests: u64,
}

/// Placeholder user for connections that never authenticated.
pub const ANONYMOUS_USER: &str = "anonymous";

impl ConnectedClient {
    /// Shape this descriptor as a flat string map for display gauges.
    ///
    /// Optional driver fields are omitted when absent; a missing username is
    /// reported as [`ANONYMOUS_USER`].
    pub fn as_map(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        map.insert("address".to_string(), self.address.clone());
        map.insert(
            "user".to_string(),
            self.username
                .clone()
                .unwrap_or_else(|| ANONYMOUS_USER.to_string()),
        );
        map.insert(
            "protocolVersion".to_string(),
            self.protocol_version.clone(),
        );
        if let Some(driver) = &self.driver_name {
            map.insert("driverName".to_string(), driver.clone());
        }
        if let Some(version) = &self.driver_version {
            map.insert("driverVersion".to_string(), version.clone());
        }
        map.insert(
            "connectedAt".to_string(),
            self.connected_at.to_rfc3339(),
        );
        map.insert("tls".to_string(), self.tls.to_string());
        map.insert("requests".to_string(), self.requests.to_string());
        map
    }
}

/// Historical per-connection statistic from a server's bounded recent-history
/// buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientStat {
    /// Remote address the stat was recorded for.
    pub address: String,

    /// Protocol version the connection spoke, when known.
    pub protocol_version: Option<String>,

    /// When the connection was last seen.
    pub last_seen: DateTime<Utc>,
}

impl ClientStat {
    /// Well-known map key carrying the protocol version; the combined
    /// per-version gauge sorts on it.
    pub const PROTOCOL_VERSION: &'static str = "protocolVersion";

    /// Shape this record as a flat string map for display gauges.
    ///
    /// The protocol-version key is omitted entirely when the version is
    /// unknown; sort paths treat the missing key as an empty string.
    pub fn as_map(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        map.insert("address".to_string(), self.address.clone());
        if let Some(version) = &self.protocol_version {
            map.insert(Self::PROTOCOL_VERSION.to_string(), version.clone());
        }
        map.insert("lastSeen".to_string(), self.last_seen.to_rfc3339());
        map
    }
}
