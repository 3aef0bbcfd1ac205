//! Process-wide aggregation of client connection metrics.
//!
//! [`ClientMetrics`] combines per-server connection state into process-wide
//! views: a connection-count gauge, a per-user breakdown, the full connection
//! list, and recent per-connection stats grouped by protocol version. Servers
//! feed the direct event counters (auth outcomes, discarded requests,
//! pause/unpause) as connection lifecycle events occur; the registry drives
//! the gauges by sampling them on its own cadence.
//!
//! One aggregator exists per process. It is constructed uninitialized, handed
//! by `Arc` to every server collaborator, and bound exactly once via
//! [`ClientMetrics::init`] before any server starts accepting connections.
//! After `init` the server list and registry binding never change, so the
//! gauge read path takes no lock.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::client::{ClientStat, ConnectedClient};
use crate::error::MetricsError;
use crate::name::MetricNameFactory;
use crate::registry::{GaugeValue, Meter, MetricsRegistry};
use crate::server::ArcServer;

/// Category prefix for every metric this aggregator registers.
const SCOPE: &str = "Client";

/// State bound exactly once by `init`.
struct Inner {
    servers: Arc<[ArcServer]>,
    registry: Arc<dyn MetricsRegistry>,
    auth_success: Meter,
    auth_failure: Meter,
    request_discarded: Meter,
    paused_connections: Arc<AtomicI64>,
}

/// The process-wide client metrics aggregator.
pub struct ClientMetrics {
    // Serializes the whole init body; gauge/meter registration must run at
    // most once even when several subsystems race to initialize.
    init_lock: Mutex<()>,
    inner: OnceLock<Inner>,
}

impl ClientMetrics {
    /// An uninitialized aggregator. Mutations and reads fail with
    /// [`MetricsError::NotInitialized`] until [`ClientMetrics::init`] runs.
    pub fn new() -> Self {
        Self {
            init_lock: Mutex::new(()),
            inner: OnceLock::new(),
        }
    }

    /// Bind the server set and registry, and register all metrics.
    ///
    /// Idempotent with first-caller-wins semantics: the first call binds its
    /// arguments and registers the gauges and meters; every later call is a
    /// silent no-op, even with a different server set. This lets multiple
    /// subsystems request initialization without coordinating.
    pub fn init(&self, servers: Vec<ArcServer>, registry: Arc<dyn MetricsRegistry>) {
        let _guard = self.init_lock.lock();
        if self.inner.get().is_some() {
            return;
        }

        let factory = MetricNameFactory::new(SCOPE);
        let servers: Arc<[ArcServer]> = servers.into();

        let list = servers.clone();
        registry.register_gauge(
            factory.create("connectedNativeClients"),
            Box::new(move || GaugeValue::Integer(count_connected_clients(&list) as i64)),
        );
        let list = servers.clone();
        registry.register_gauge(
            factory.create("connectedNativeClientsByUser"),
            Box::new(move || GaugeValue::Counts(count_connected_clients_by_user(&list))),
        );
        let list = servers.clone();
        registry.register_gauge(
            factory.create("connections"),
            Box::new(move || GaugeValue::Records(connected_client_maps(&list))),
        );
        let list = servers.clone();
        registry.register_gauge(
            factory.create("clientsByProtocolVersion"),
            Box::new(move || GaugeValue::Records(recent_client_stat_maps(&list))),
        );

        let auth_success = registry.meter(factory.create("AuthSuccess"));
        let auth_failure = registry.meter(factory.create("AuthFailure"));

        let paused_connections = Arc::new(AtomicI64::new(0));
        let paused = paused_connections.clone();
        registry.register_gauge(
            factory.create("PausedConnections"),
            Box::new(move || GaugeValue::Integer(paused.load(Ordering::Relaxed))),
        );
        let request_discarded = registry.meter(factory.create("RequestDiscarded"));

        debug!(servers = servers.len(), "client metrics initialized");

        // The init lock is held, so this cannot lose a race.
        let _ = self.inner.set(Inner {
            servers,
            registry,
            auth_success,
            auth_failure,
            request_discarded,
            paused_connections,
        });
    }

    /// Whether `init` has completed.
    pub fn is_initialized(&self) -> bool {
        self.inner.get().is_some()
    }

    fn inner(&self) -> Result<&Inner, MetricsError> {
        self.inner.get().ok_or(MetricsError::NotInitialized)
    }

    /// The registry bound at init, for collaborators that register their own
    /// metrics alongside the aggregator's.
    pub fn registry(&self) -> Result<&Arc<dyn MetricsRegistry>, MetricsError> {
        Ok(&self.inner()?.registry)
    }

    /// Record one successful authentication.
    pub fn mark_auth_success(&self) -> Result<(), MetricsError> {
        self.inner()?.auth_success.mark();
        Ok(())
    }

    /// Record one failed authentication.
    pub fn mark_auth_failure(&self) -> Result<(), MetricsError> {
        self.inner()?.auth_failure.mark();
        Ok(())
    }

    /// Record one request dropped without being served.
    pub fn mark_request_discarded(&self) -> Result<(), MetricsError> {
        self.inner()?.request_discarded.mark();
        Ok(())
    }

    /// Record one connection entering the paused state.
    pub fn pause_connection(&self) -> Result<(), MetricsError> {
        self.inner()?
            .paused_connections
            .fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Record one connection leaving the paused state.
    ///
    /// No pairing with [`ClientMetrics::pause_connection`] is enforced; an
    /// excess of unpauses drives the counter negative, which the gauge
    /// reports as-is.
    pub fn unpause_connection(&self) -> Result<(), MetricsError> {
        self.inner()?
            .paused_connections
            .fetch_sub(1, Ordering::Relaxed);
        Ok(())
    }

    /// Current paused-connection count.
    pub fn paused_connections(&self) -> Result<i64, MetricsError> {
        Ok(self.inner()?.paused_connections.load(Ordering::Relaxed))
    }

    /// Typed connection descriptors across every server, for programmatic
    /// callers. Servers that fail the query are logged and skipped.
    pub fn all_connected_clients(&self) -> Result<Vec<ConnectedClient>, MetricsError> {
        let inner = self.inner()?;
        let mut clients = Vec::new();
        for server in inner.servers.iter() {
            match server.connected_clients() {
                Ok(list) => clients.extend(list),
                Err(e) => {
                    warn!(server = %server.name(), error = %e, "skipping server in connection enumeration");
                }
            }
        }
        Ok(clients)
    }
}

impl Default for ClientMetrics {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Fan-out queries
//
// Each of these re-reads the live server set on every call; a gauge sample is
// approximately point-in-time, never a transactional snapshot across servers.
// A failing server contributes nothing and never aborts the rest.
// ============================================================================

fn count_connected_clients(servers: &[ArcServer]) -> usize {
    let mut count = 0;
    for server in servers {
        match server.count_connected_clients() {
            Ok(n) => count += n,
            Err(e) => {
                warn!(server = %server.name(), error = %e, "skipping server in connection count");
            }
        }
    }
    count
}

fn count_connected_clients_by_user(servers: &[ArcServer]) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for server in servers {
        match server.count_connected_clients_by_user() {
            Ok(per_user) => {
                for (username, n) in per_user {
                    *counts.entry(username).or_insert(0) += n;
                }
            }
            Err(e) => {
                warn!(server = %server.name(), error = %e, "skipping server in per-user count");
            }
        }
    }
    counts
}

fn connected_client_maps(servers: &[ArcServer]) -> Vec<BTreeMap<String, String>> {
    let mut clients = Vec::new();
    for server in servers {
        match server.connected_clients() {
            Ok(list) => clients.extend(list.iter().map(ConnectedClient::as_map)),
            Err(e) => {
                warn!(server = %server.name(), error = %e, "skipping server in connection list");
            }
        }
    }
    clients
}

fn recent_client_stat_maps(servers: &[ArcServer]) -> Vec<BTreeMap<String, String>> {
    let mut stats = Vec::new();
    for server in servers {
        match server.recent_client_stats() {
            Ok(list) => stats.extend(list.iter().map(ClientStat::as_map)),
            Err(e) => {
                warn!(server = %server.name(), error = %e, "skipping server in recent stats");
            }
        }
    }

    // Stable sort by protocol version; records missing the key sort first.
    stats.sort_by(|a, b| {
        let a = a
            .get(ClientStat::PROTOCOL_VERSION)
            .map(String::as_str)
            .unwrap_or("");
        let b = b
            .get(ClientStat::PROTOCOL_VERSION)
            .map(String::as_str)
            .unwrap_or("");
        a.cmp(b)
    });
    stats
}
