//! client-metrics - process-wide client connection metrics aggregation.
//!
//! A process hosting several network-facing servers binds one
//! [`ClientMetrics`] aggregator at startup. The aggregator registers a fixed
//! set of metrics with a [`MetricsRegistry`]: derived gauges whose values fan
//! out across the live server set on every sample (connection count, per-user
//! breakdown, connection list, recent stats by protocol version) and direct
//! event counters the servers feed as lifecycle events occur (auth outcomes,
//! discarded requests, paused connections).
//!
//! ```no_run
//! use std::sync::Arc;
//! use client_metrics::{ClientMetrics, PrometheusRegistry};
//!
//! # fn servers() -> Vec<client_metrics::ArcServer> { Vec::new() }
//! let metrics = Arc::new(ClientMetrics::new());
//! let registry = Arc::new(PrometheusRegistry::new());
//! metrics.init(servers(), registry);
//!
//! // Server code reports lifecycle events:
//! metrics.mark_auth_success().unwrap();
//! ```

pub mod aggregator;
pub mod client;
pub mod error;
pub mod name;
pub mod prom;
pub mod registry;
pub mod server;

pub use aggregator::ClientMetrics;
pub use client::{ANONYMOUS_USER, ClientStat, ConnectedClient};
pub use error::{MetricsError, ServerError, ServerResult};
pub use name::{MetricName, MetricNameFactory};
pub use prom::PrometheusRegistry;
pub use registry::{GaugeFn, GaugeValue, Meter, MetricsRegistry, SampledRegistry};
pub use server::{ArcServer, ServerMetricsSource};
