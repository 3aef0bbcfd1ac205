//! Boundary trait for server collaborators.
//!
//! Each network-facing server that accepts client connections implements
//! [`ServerMetricsSource`] over its own thread-safe connection state. The
//! aggregator holds the servers behind `Arc` trait objects and fans queries
//! out across them on every gauge sample; it never owns or mutates server
//! state.
//!
//! Accessors are fallible so that one server's failure can be logged and
//! skipped instead of aborting a whole fan-out or crashing the sampling
//! thread.

use std::collections::HashMap;
use std::sync::Arc;

use crate::client::{ClientStat, ConnectedClient};
use crate::error::ServerResult;

/// Metrics view over one server's live connection state.
pub trait ServerMetricsSource: Send + Sync {
    /// Stable identifier for log labeling (e.g. the listener address).
    fn name(&self) -> &str;

    /// Number of currently connected clients.
    fn count_connected_clients(&self) -> ServerResult<usize>;

    /// Current connection counts keyed by username.
    fn count_connected_clients_by_user(&self) -> ServerResult<HashMap<String, usize>>;

    /// Snapshot descriptors for every connected client, in the server's own
    /// iteration order.
    fn connected_clients(&self) -> ServerResult<Vec<ConnectedClient>>;

    /// The server's bounded recent history of per-connection stats.
    fn recent_client_stats(&self) -> ServerResult<Vec<ClientStat>>;
}

/// Shared handle to a server collaborator.
pub type ArcServer = Arc<dyn ServerMetricsSource>;
