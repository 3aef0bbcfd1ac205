//! Metrics registry boundary and the in-memory sampled registry.
//!
//! The aggregator does not store gauge values; it hands the registry a
//! supplier closure per gauge, and the registry re-invokes suppliers whenever
//! it samples. [`MetricsRegistry`] is the capability the aggregator needs;
//! [`SampledRegistry`] is the in-crate implementation that samples to JSON,
//! and the `prom` module bridges the same trait onto a Prometheus registry.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use serde::Serialize;

use crate::name::MetricName;

/// Value produced by one gauge sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GaugeValue {
    /// A single integer reading.
    Integer(i64),

    /// A breakdown of counts keyed by name (e.g. per-user connections).
    Counts(HashMap<String, usize>),

    /// A list of flat string-map records (e.g. connection descriptors).
    Records(Vec<BTreeMap<String, String>>),
}

/// Supplier re-invoked on every sample of a gauge.
pub type GaugeFn = Box<dyn Fn() -> GaugeValue + Send + Sync>;

/// Registration capability the aggregator requires from a metrics sink.
pub trait MetricsRegistry: Send + Sync {
    /// Register a gauge whose value is recomputed by `supplier` on each
    /// sample.
    fn register_gauge(&self, name: MetricName, supplier: GaugeFn);

    /// Obtain the meter registered under `name`, creating it if needed.
    ///
    /// Repeated calls with the same name return handles over the same
    /// underlying count.
    fn meter(&self, name: MetricName) -> Meter;
}

/// Monotonic event counter handle.
///
/// Cloning shares the underlying count; `mark` is safe from any number of
/// threads without external locking.
#[derive(Debug, Clone, Default)]
pub struct Meter {
    count: Arc<AtomicU64>,
}

impl Meter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one event.
    #[inline]
    pub fn mark(&self) {
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    /// Events recorded so far.
    #[inline]
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}

/// In-memory registry that samples gauges on demand.
///
/// Gauges and meters are keyed by their qualified name
/// (`Client.connectedNativeClients`). [`SampledRegistry::sample_all`]
/// produces a JSON object suitable for an admin/introspection surface.
#[derive(Default)]
pub struct SampledRegistry {
    gauges: DashMap<String, GaugeFn>,
    meters: DashMap<String, Meter>,
}

impl SampledRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sample one gauge by qualified name.
    pub fn sample(&self, name: &str) -> Option<GaugeValue> {
        self.gauges.get(name).map(|supplier| (supplier.value())())
    }

    /// Current count of one meter by qualified name.
    pub fn meter_count(&self, name: &str) -> Option<u64> {
        self.meters.get(name).map(|meter| meter.count())
    }

    /// Qualified names of all registered gauges.
    pub fn gauge_names(&self) -> Vec<String> {
        self.gauges.iter().map(|e| e.key().clone()).collect()
    }

    /// Sample every gauge and meter into one JSON object.
    pub fn sample_all(&self) -> serde_json::Value {
        let mut out = serde_json::Map::new();
        for entry in self.gauges.iter() {
            let value = serde_json::to_value((entry.value())())
                .unwrap_or(serde_json::Value::Null);
            out.insert(entry.key().clone(), value);
        }
        for entry in self.meters.iter() {
            out.insert(entry.key().clone(), entry.value().count().into());
        }
        serde_json::Value::Object(out)
    }
}

impl MetricsRegistry for SampledRegistry {
    fn register_gauge(&self, name: MetricName, supplier: GaugeFn) {
        self.gauges.insert(name.qualified(), supplier);
    }

    fn meter(&self, name: MetricName) -> Meter {
        self.meters
            .entry(name.qualified())
            .or_default()
            .clone()
    }
}
