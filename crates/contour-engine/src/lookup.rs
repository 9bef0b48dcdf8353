//! External system-data lookups: asset inventory, connection topology, and
//! the existing graph summary. Context enrichment, not correctness-critical
//! — every failure degrades to an absent result with a logged warning, and
//! the combined fetch is cached per customer behind an injected clock.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde_json::{json, Value};
use tracing::warn;

use contour_core::ids::CustomerId;

pub const LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);
pub const CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// The four query kinds the `lookup_system_data` tool dispatches to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SystemQueryKind {
    Systems,
    Connections,
    DimensionData,
    GraphSummary,
}

impl std::str::FromStr for SystemQueryKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "systems" => Ok(Self::Systems),
            "connections" => Ok(Self::Connections),
            "dimension_data" => Ok(Self::DimensionData),
            "graph_summary" => Ok(Self::GraphSummary),
            other => Err(format!("unknown query type: {other}")),
        }
    }
}

/// Injectable time source so cache expiry is testable with a fake clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[derive(Clone, Debug)]
pub struct LookupConfig {
    pub asset_base_url: String,
    pub topology_base_url: String,
    pub graph_base_url: String,
    pub api_key: String,
    pub timeout: Duration,
    pub cache_ttl: Duration,
}

impl LookupConfig {
    pub fn new(
        asset_base_url: impl Into<String>,
        topology_base_url: impl Into<String>,
        graph_base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            asset_base_url: asset_base_url.into(),
            topology_base_url: topology_base_url.into(),
            graph_base_url: graph_base_url.into(),
            api_key: api_key.into(),
            timeout: LOOKUP_TIMEOUT,
            cache_ttl: CACHE_TTL,
        }
    }
}

/// Results of the three independent live lookups. Absent data renders as an
/// omitted section, never an error.
#[derive(Clone, Debug, Default)]
pub struct LiveSystemData {
    pub systems: Option<Value>,
    pub connections: Option<Value>,
    pub graph: Option<Value>,
}

impl LiveSystemData {
    pub fn is_empty(&self) -> bool {
        self.systems.is_none() && self.connections.is_none() && self.graph.is_none()
    }

    /// Render the available sections as instruction text.
    pub fn render(&self) -> String {
        let mut parts = Vec::new();
        if let Some(systems) = &self.systems {
            parts.push(format!("Discovered systems:\n{systems}"));
        }
        if let Some(connections) = &self.connections {
            parts.push(format!("System connections:\n{connections}"));
        }
        if let Some(graph) = &self.graph {
            parts.push(format!("Existing graph summary:\n{graph}"));
        }
        parts.join("\n\n")
    }
}

struct CacheEntry {
    data: LiveSystemData,
    expires_at: Instant,
}

/// Client for the discovery services, with a per-customer TTL cache over the
/// combined live fetch. Safe for concurrent refresh: last writer wins.
pub struct SystemLookup {
    client: reqwest::Client,
    config: LookupConfig,
    cache: Mutex<HashMap<String, CacheEntry>>,
    clock: Arc<dyn Clock>,
}

impl SystemLookup {
    pub fn new(config: LookupConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: LookupConfig, clock: Arc<dyn Clock>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_default();
        Self {
            client,
            config,
            cache: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Fetch the live context block for a customer: three lookups issued
    /// concurrently, each independently tolerant of failure. Cached for the
    /// configured TTL to bound lookup frequency within a burst of turns.
    pub async fn live_context(&self, customer_id: &CustomerId) -> LiveSystemData {
        let key = customer_id.as_str().to_string();
        let now = self.clock.now();

        if let Some(entry) = self.cache.lock().get(&key) {
            if now < entry.expires_at {
                return entry.data.clone();
            }
        }

        let (systems, connections, graph) = tokio::join!(
            self.fetch_json(format!(
                "{}/api/customers/{}/assets",
                self.config.asset_base_url, key
            )),
            self.fetch_json(format!(
                "{}/api/customers/{}/topology",
                self.config.topology_base_url, key
            )),
            self.fetch_json(format!(
                "{}/api/customers/{}/graph",
                self.config.graph_base_url, key
            )),
        );

        let data = LiveSystemData { systems, connections, graph };

        let expires_at = self.clock.now() + self.config.cache_ttl;
        drop(
            self.cache
                .lock()
                .insert(key, CacheEntry { data: data.clone(), expires_at }),
        );

        data
    }

    /// Direct query for the `lookup_system_data` tool. Not cached — the
    /// model asks for specific evidence at specific moments.
    pub async fn query(
        &self,
        customer_id: &CustomerId,
        kind: SystemQueryKind,
        dimension: Option<&str>,
    ) -> Value {
        let customer = customer_id.as_str();
        let url = match kind {
            SystemQueryKind::Systems => {
                format!("{}/api/customers/{}/assets", self.config.asset_base_url, customer)
            }
            SystemQueryKind::Connections => {
                format!("{}/api/customers/{}/topology", self.config.topology_base_url, customer)
            }
            SystemQueryKind::GraphSummary => {
                format!("{}/api/customers/{}/graph", self.config.graph_base_url, customer)
            }
            SystemQueryKind::DimensionData => {
                let dimension = dimension.unwrap_or_default();
                format!(
                    "{}/api/customers/{}/dimensions/{}",
                    self.config.graph_base_url, customer, dimension
                )
            }
        };

        match self.fetch_json(url).await {
            Some(value) => value,
            None => json!({"available": false, "reason": "lookup unavailable"}),
        }
    }

    async fn fetch_json(&self, url: String) -> Option<Value> {
        let result = self
            .client
            .get(&url)
            .bearer_auth(&self.config.api_key)
            .send()
            .await;

        let response = match result {
            Ok(r) => r,
            Err(e) => {
                warn!(url = %url, error = %e, "system lookup unavailable");
                return None;
            }
        };

        if !response.status().is_success() {
            warn!(url = %url, status = %response.status(), "system lookup returned error status");
            return None;
        }

        match response.json::<Value>().await {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(url = %url, error = %e, "system lookup returned invalid JSON");
                None
            }
        }
    }
}
