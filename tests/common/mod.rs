//! Shared test fixtures: an in-memory stub server collaborator.

// Each integration test binary compiles this module independently and not
// every binary uses every fixture.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use client_metrics::{
    ANONYMOUS_USER, ClientStat, ConnectedClient, ServerError, ServerMetricsSource, ServerResult,
};

/// A server collaborator with fixed connection state.
pub struct StubServer {
    name: String,
    clients: Vec<ConnectedClient>,
    stats: Vec<ClientStat>,
    failing: bool,
}

impl StubServer {
    pub fn new(name: &str, clients: Vec<ConnectedClient>, stats: Vec<ClientStat>) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            clients,
            stats,
            failing: false,
        })
    }

    /// A server whose every accessor fails.
    pub fn failing(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            clients: Vec::new(),
            stats: Vec::new(),
            failing: true,
        })
    }

    fn check(&self) -> ServerResult<()> {
        if self.failing {
            Err(ServerError::new("stub server configured to fail"))
        } else {
            Ok(())
        }
    }
}

impl ServerMetricsSource for StubServer {
    fn name(&self) -> &str {
        &self.name
    }

    fn count_connected_clients(&self) -> ServerResult<usize> {
        self.check()?;
        Ok(self.clients.len())
    }

    fn count_connected_clients_by_user(&self) -> ServerResult<HashMap<String, usize>> {
        self.check()?;
        let mut counts = HashMap::new();
        for client in &self.clients {
            let user = client
                .username
                .clone()
                .unwrap_or_else(|| ANONYMOUS_USER.to_string());
            *counts.entry(user).or_insert(0) += 1;
        }
        Ok(counts)
    }

    fn connected_clients(&self) -> ServerResult<Vec<ConnectedClient>> {
        self.check()?;
        Ok(self.clients.clone())
    }

    fn recent_client_stats(&self) -> ServerResult<Vec<ClientStat>> {
        self.check()?;
        Ok(self.stats.clone())
    }
}

/// A connected client for `user` at a fixed timestamp.
pub fn client(address: &str, user: Option<&str>) -> ConnectedClient {
    ConnectedClient {
        address: address.to_string(),
        username: user.map(str::to_string),
        protocol_version: "v5".to_string(),
        driver_name: Some("test-driver".to_string()),
        driver_version: Some("1.0".to_string()),
        connected_at: Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap(),
        tls: false,
        requests: 10,
    }
}

/// A recent-history stat record for `address`.
pub fn stat(address: &str, version: Option<&str>) -> ClientStat {
    ClientStat {
        address: address.to_string(),
        protocol_version: version.map(str::to_string),
        last_seen: Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap(),
    }
}
