//! Prometheus bridge for the metrics registry boundary.
//!
//! [`PrometheusRegistry`] implements [`MetricsRegistry`] over a
//! [`prometheus::Registry`]. Every gauge and meter is registered as a custom
//! collector whose `collect` re-invokes the supplier (or reads the meter) at
//! gather time, preserving the sample-on-demand semantics of the aggregator's
//! gauges.
//!
//! Mapping of [`GaugeValue`] variants onto the Prometheus data model:
//!
//! - `Integer` — a single unlabeled gauge sample.
//! - `Counts` — one gauge sample per key under the breakdown label
//!   (default `key`).
//! - `Records` — a gauge reporting the record count; record bodies are not
//!   expressible as numeric samples and stay available through
//!   [`crate::registry::SampledRegistry`].

use std::collections::HashMap;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use prometheus::core::{Collector, Desc};
use prometheus::proto::{Counter, Gauge, LabelPair, Metric, MetricFamily, MetricType};
use tracing::warn;

use crate::name::MetricName;
use crate::registry::{GaugeFn, GaugeValue, Meter, MetricsRegistry};

/// Default label name for `Counts` breakdowns.
pub const DEFAULT_BREAKDOWN_LABEL: &str = "key";

/// [`MetricsRegistry`] implementation backed by a Prometheus registry.
pub struct PrometheusRegistry {
    registry: prometheus::Registry,
    meters: DashMap<String, Meter>,
    breakdown_label: String,
}

impl PrometheusRegistry {
    /// Bridge over a fresh, private Prometheus registry.
    pub fn new() -> Self {
        Self::with_registry(prometheus::Registry::new())
    }

    /// Bridge over an existing Prometheus registry, e.g. a process-wide one
    /// shared with other subsystems.
    pub fn with_registry(registry: prometheus::Registry) -> Self {
        Self {
            registry,
            meters: DashMap::new(),
            breakdown_label: DEFAULT_BREAKDOWN_LABEL.to_string(),
        }
    }

    /// Use `label` instead of [`DEFAULT_BREAKDOWN_LABEL`] for `Counts`
    /// gauges.
    pub fn breakdown_label(mut self, label: impl Into<String>) -> Self {
        self.breakdown_label = label.into();
        self
    }

    /// The wrapped Prometheus registry.
    pub fn registry(&self) -> &prometheus::Registry {
        &self.registry
    }

    /// Sample every collector, re-invoking gauge suppliers.
    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }

    fn register(&self, collector: Box<dyn Collector>, name: &str) {
        if let Err(e) = self.registry.register(collector) {
            warn!(metric = name, error = %e, "failed to register collector");
        }
    }
}

impl Default for PrometheusRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRegistry for PrometheusRegistry {
    fn register_gauge(&self, name: MetricName, supplier: GaugeFn) {
        let fq_name = name.prometheus();
        let help = format!("{} (sampled on demand)", name.qualified());

        // One probe sample decides whether the descriptor carries the
        // breakdown label.
        let variable_labels = match supplier() {
            GaugeValue::Counts(_) => vec![self.breakdown_label.clone()],
            GaugeValue::Integer(_) | GaugeValue::Records(_) => vec![],
        };

        match Desc::new(fq_name.clone(), help.clone(), variable_labels, HashMap::new()) {
            Ok(desc) => self.register(
                Box::new(GaugeCollector {
                    desc,
                    fq_name: fq_name.clone(),
                    help,
                    breakdown_label: self.breakdown_label.clone(),
                    supplier,
                }),
                &fq_name,
            ),
            Err(e) => warn!(metric = %fq_name, error = %e, "invalid gauge descriptor"),
        }
    }

    fn meter(&self, name: MetricName) -> Meter {
        let fq_name = name.prometheus();
        let meter = match self.meters.entry(fq_name.clone()) {
            Entry::Occupied(existing) => return existing.get().clone(),
            Entry::Vacant(slot) => slot.insert(Meter::new()).clone(),
        };

        let help = format!("{} (event count)", name.qualified());
        match Desc::new(fq_name.clone(), help.clone(), vec![], HashMap::new()) {
            Ok(desc) => self.register(
                Box::new(MeterCollector {
                    desc,
                    fq_name: fq_name.clone(),
                    help,
                    meter: meter.clone(),
                }),
                &fq_name,
            ),
            Err(e) => warn!(metric = %fq_name, error = %e, "invalid meter descriptor"),
        }
        meter
    }
}

// ============================================================================
// Collectors
// ============================================================================

struct GaugeCollector {
    desc: Desc,
    fq_name: String,
    help: String,
    breakdown_label: String,
    supplier: GaugeFn,
}

impl Collector for GaugeCollector {
    fn desc(&self) -> Vec<&Desc> {
        vec![&self.desc]
    }

    fn collect(&self) -> Vec<MetricFamily> {
        let mut family = MetricFamily::default();
        family.set_name(self.fq_name.clone());
        family.set_help(self.help.clone());
        family.set_field_type(MetricType::GAUGE);

        match (self.supplier)() {
            GaugeValue::Integer(value) => {
                family.mut_metric().push(gauge_sample(None, value as f64));
            }
            GaugeValue::Counts(counts) => {
                // Deterministic exposition order.
                let mut entries: Vec<_> = counts.into_iter().collect();
                entries.sort();
                for (key, count) in entries {
                    family.mut_metric().push(gauge_sample(
                        Some((self.breakdown_label.as_str(), key.as_str())),
                        count as f64,
                    ));
                }
            }
            GaugeValue::Records(records) => {
                family
                    .mut_metric()
                    .push(gauge_sample(None, records.len() as f64));
            }
        }

        vec![family]
    }
}

struct MeterCollector {
    desc: Desc,
    fq_name: String,
    help: String,
    meter: Meter,
}

impl Collector for MeterCollector {
    fn desc(&self) -> Vec<&Desc> {
        vec![&self.desc]
    }

    fn collect(&self) -> Vec<MetricFamily> {
        let mut counter = Counter::default();
        counter.set_value(self.meter.count() as f64);
        let mut metric = Metric::default();
        metric.set_counter(counter);

        let mut family = MetricFamily::default();
        family.set_name(self.fq_name.clone());
        family.set_help(self.help.clone());
        family.set_field_type(MetricType::COUNTER);
        family.mut_metric().push(metric);
        vec![family]
    }
}

fn gauge_sample(label: Option<(&str, &str)>, value: f64) -> Metric {
    let mut gauge = Gauge::default();
    gauge.set_value(value);
    let mut metric = Metric::default();
    metric.set_gauge(gauge);
    if let Some((name, val)) = label {
        let mut pair = LabelPair::default();
        pair.set_name(name.to_string());
        pair.set_value(val.to_string());
        metric.mut_label().push(pair);
    }
    metric
}
