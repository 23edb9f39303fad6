mod error;
mod types;

pub use error::{Error, Result};
pub use types::{BeaconConfig, CkanConfig, Config, KeycloakConfig, Search, SearchCache, Service};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}

	let mut endpoints = vec![("ckan", &cfg.ckan.api_base, cfg.ckan.timeout_ms)];
	let mut headers = vec![("ckan", &cfg.ckan.default_headers)];

	if cfg.search.enable_secondary_source {
		let beacon = cfg.beacon.as_ref().ok_or_else(|| missing_section("beacon"))?;
		let keycloak = cfg.keycloak.as_ref().ok_or_else(|| missing_section("keycloak"))?;

		endpoints.push(("beacon", &beacon.api_base, beacon.timeout_ms));
		endpoints.push(("keycloak", &keycloak.api_base, keycloak.timeout_ms));
		headers.push(("beacon", &beacon.default_headers));
		headers.push(("keycloak", &keycloak.default_headers));

		for (label, value) in
			[("keycloak.realm", &keycloak.realm), ("keycloak.idp_alias", &keycloak.idp_alias)]
		{
			if value.trim().is_empty() {
				return Err(Error::Validation {
					message: format!(
						"{label} must be non-empty when search.enable_secondary_source is true."
					),
				});
			}
		}
	}

	for (label, api_base, timeout_ms) in endpoints {
		if api_base.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("{label}.api_base must be non-empty."),
			});
		}
		if timeout_ms == 0 {
			return Err(Error::Validation {
				message: format!("{label}.timeout_ms must be greater than zero."),
			});
		}
	}

	for (label, headers) in headers {
		if headers.values().any(|value| !value.is_string()) {
			return Err(Error::Validation {
				message: format!("{label}.default_headers values must be strings."),
			});
		}
	}

	if cfg.search.pagination_max_size == 0 {
		return Err(Error::Validation {
			message: "search.pagination_max_size must be greater than zero.".to_string(),
		});
	}
	if cfg.search.selected_facet_fields.is_empty() {
		return Err(Error::Validation {
			message: "search.selected_facet_fields must be non-empty.".to_string(),
		});
	}
	if cfg.search.cache.enabled {
		if cfg.search.cache.ttl_seconds == 0 {
			return Err(Error::Validation {
				message: "search.cache.ttl_seconds must be greater than zero.".to_string(),
			});
		}
		if cfg.search.cache.max_entries == 0 {
			return Err(Error::Validation {
				message: "search.cache.max_entries must be greater than zero.".to_string(),
			});
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	let api_bases = [Some(&mut cfg.ckan.api_base)]
		.into_iter()
		.chain([
			cfg.beacon.as_mut().map(|beacon| &mut beacon.api_base),
			cfg.keycloak.as_mut().map(|keycloak| &mut keycloak.api_base),
		])
		.flatten();

	for api_base in api_bases {
		let trimmed = api_base.trim().trim_end_matches('/').to_string();

		*api_base = trimmed;
	}

	cfg.search.selected_facet_fields = cfg
		.search
		.selected_facet_fields
		.iter()
		.map(|field| field.trim().to_string())
		.filter(|field| !field.is_empty())
		.collect();
}

fn missing_section(label: &str) -> Error {
	Error::Validation {
		message: format!("[{label}] is required when search.enable_secondary_source is true."),
	}
}
