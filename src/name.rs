//! Hierarchical metric names.
//!
//! Every metric the aggregator registers is scoped under a fixed category
//! (for client connection metrics, `Client`), producing dotted names like
//! `Client.connectedNativeClients`. The Prometheus bridge needs the same
//! names in snake_case, so [`MetricName`] also carries a sanitized form.

use std::fmt;

/// A fully scoped metric name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MetricName {
    scope: String,
    name: String,
}

impl MetricName {
    pub fn new(scope: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            name: name.into(),
        }
    }

    /// The category this metric belongs to (e.g. `Client`).
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// The unscoped metric name (e.g. `connectedNativeClients`).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Dotted hierarchical form, e.g. `Client.connectedNativeClients`.
    pub fn qualified(&self) -> String {
        format!("{}.{}", self.scope, self.name)
    }

    /// Prometheus-compatible form, e.g. `client_connected_native_clients`.
    ///
    /// CamelCase humps become underscore-separated lowercase words; anything
    /// outside `[a-zA-Z0-9]` becomes a single underscore.
    pub fn prometheus(&self) -> String {
        let mut out = String::with_capacity(self.scope.len() + self.name.len() + 8);
        for part in [self.scope.as_str(), self.name.as_str()] {
            if !out.is_empty() {
                out.push('_');
            }
            push_snake(&mut out, part);
        }
        out
    }
}

fn push_snake(out: &mut String, part: &str) {
    for ch in part.chars() {
        if ch.is_ascii_uppercase() {
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
        } else if ch.is_ascii_alphanumeric() {
            out.push(ch);
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.scope, self.name)
    }
}

/// Factory producing [`MetricName`]s under one fixed scope.
#[derive(Debug, Clone)]
pub struct MetricNameFactory {
    scope: String,
}

impl MetricNameFactory {
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
        }
    }

    pub fn create(&self, name: impl Into<String>) -> MetricName {
        MetricName::new(self.scope.clone(), name)
    }
}
