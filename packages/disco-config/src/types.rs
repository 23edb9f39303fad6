use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub ckan: CkanConfig,
	/// Required when `search.enable_secondary_source` is true.
	pub beacon: Option<BeaconConfig>,
	pub keycloak: Option<KeycloakConfig>,
	pub search: Search,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

/// The metadata catalogue, which is also the system of record for dataset records.
#[derive(Debug, Clone, Deserialize)]
pub struct CkanConfig {
	pub api_base: String,
	#[serde(default = "default_timeout_ms")]
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BeaconConfig {
	pub api_base: String,
	#[serde(default = "default_timeout_ms")]
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

/// Identity provider used to exchange the caller's token for a Beacon token.
#[derive(Debug, Clone, Deserialize)]
pub struct KeycloakConfig {
	pub api_base: String,
	pub realm: String,
	/// Alias of the brokered identity provider whose token Beacon accepts.
	pub idp_alias: String,
	#[serde(default = "default_timeout_ms")]
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Search {
	/// When false, no Beacon collector or facet builder is registered.
	pub enable_secondary_source: bool,
	pub selected_facet_fields: Vec<String>,
	#[serde(default = "default_pagination_max_size")]
	pub pagination_max_size: u32,
	#[serde(default)]
	pub cache: SearchCache,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchCache {
	pub enabled: bool,
	pub ttl_seconds: u64,
	pub max_entries: usize,
}
impl Default for SearchCache {
	fn default() -> Self {
		Self { enabled: true, ttl_seconds: 300, max_entries: 1_024 }
	}
}

fn default_log_level() -> String {
	"info".to_string()
}

fn default_timeout_ms() -> u64 {
	10_000
}

fn default_pagination_max_size() -> u32 {
	1_000
}
