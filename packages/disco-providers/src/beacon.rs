//! Beacon v2 query API: individuals search and filtering terms.

use std::collections::BTreeMap;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{Result, lenient::null_as_default};
use disco_config::BeaconConfig;
use disco_domain::{BEACON_FACET_GROUP, DatasetIdSet, Facet, FacetGroup, SearchQuery, ValueLabel};

pub const BEACON_FACET_LABEL: &str = "Beacon";

const INDIVIDUALS_PATH: &str = "/api/individuals";
const FILTERING_TERMS_PATH: &str = "/api/filtering_terms";
const API_VERSION: &str = "2.0";
const SCOPE: &str = "individual";
const INCLUDE_RESULTSET_RESPONSES: &str = "HIT";
const REQUESTED_GRANULARITY: &str = "record";
const DATASET_SET_TYPE: &str = "dataset";
const ONTOLOGY_TERM_TYPE: &str = "ontology";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndividualsRequest {
	pub meta: RequestMeta,
	pub query: RequestQuery,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestMeta {
	pub api_version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestQuery {
	pub filters: Vec<RequestFilter>,
	pub include_resultset_responses: String,
	pub pagination: RequestPagination,
	pub requested_granularity: String,
	pub test_mode: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestFilter {
	pub id: String,
	pub scope: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestPagination {
	pub skip: u32,
	pub limit: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IndividualsResponse {
	#[serde(default)]
	pub response: Option<IndividualsResponseContent>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndividualsResponseContent {
	#[serde(default, deserialize_with = "null_as_default")]
	pub result_sets: Vec<ResultSet>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResultSet {
	pub id: Option<String>,
	pub set_type: Option<String>,
	pub exists: Option<bool>,
	pub results_count: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilteringTermsResponse {
	#[serde(default)]
	pub response: Option<FilteringTermsResponseContent>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilteringTermsResponseContent {
	#[serde(default, deserialize_with = "null_as_default")]
	pub filtering_terms: Vec<FilteringTerm>,
	#[serde(default, deserialize_with = "null_as_default")]
	pub resources: Vec<Resource>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FilteringTerm {
	#[serde(rename = "type")]
	pub term_type: Option<String>,
	pub id: Option<String>,
	pub label: Option<String>,
	#[serde(deserialize_with = "null_as_default")]
	pub scopes: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Resource {
	pub id: Option<String>,
	pub name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BeaconClient {
	client: Client,
	api_base: String,
}
impl BeaconClient {
	pub fn new(cfg: &BeaconConfig) -> Result<Self> {
		let client = crate::build_client(cfg.timeout_ms, &cfg.default_headers)?;

		Ok(Self { client, api_base: cfg.api_base.clone() })
	}

	/// `authorization` is the full header value, `Bearer` prefix included.
	pub async fn list_individuals(
		&self,
		authorization: &str,
		request: &IndividualsRequest,
	) -> Result<IndividualsResponse> {
		let url = format!("{}{INDIVIDUALS_PATH}", self.api_base);

		tracing::debug!(%url, filters = request.query.filters.len(), "Beacon individuals search.");

		crate::send_json(
			self.client.post(url).headers(crate::auth_headers(Some(authorization))?).json(request),
		)
		.await
	}

	pub async fn list_filtering_terms(&self, authorization: &str) -> Result<FilteringTermsResponse> {
		let url = format!("{}{FILTERING_TERMS_PATH}", self.api_base);

		crate::send_json(self.client.get(url).headers(crate::auth_headers(Some(authorization))?))
			.await
	}
}

/// Translates the `beacon` facet values of `query` into an individuals request. The request may
/// carry no filters; callers must not send it in that case.
pub fn individuals_request(query: &SearchQuery) -> IndividualsRequest {
	let filters = query
		.group_values(BEACON_FACET_GROUP)
		.map(|id| RequestFilter { id: id.to_string(), scope: SCOPE.to_string() })
		.collect();

	IndividualsRequest {
		meta: RequestMeta { api_version: API_VERSION.to_string() },
		query: RequestQuery {
			filters,
			include_resultset_responses: INCLUDE_RESULTSET_RESPONSES.to_string(),
			pagination: RequestPagination { skip: 0, limit: 1 },
			requested_granularity: REQUESTED_GRANULARITY.to_string(),
			test_mode: false,
		},
	}
}

/// Dataset result sets with a positive count. A dataset reported twice keeps its smaller count.
pub fn dataset_counts(response: IndividualsResponse) -> DatasetIdSet {
	let mut counts = DatasetIdSet::new();
	let result_sets = response.response.map(|content| content.result_sets).unwrap_or_default();

	for result_set in result_sets {
		if result_set.set_type.as_deref() != Some(DATASET_SET_TYPE) {
			continue;
		}

		let Some(id) = non_blank(result_set.id.as_deref()) else {
			continue;
		};
		let Some(count) = result_set.results_count.filter(|count| *count > 0) else {
			continue;
		};
		let count = count as u64;

		counts
			.entry(id.to_string())
			.and_modify(|existing| *existing = Some(existing.map_or(count, |prev| prev.min(count))))
			.or_insert(Some(count));
	}

	counts
}

/// Ontology terms applicable to individuals, grouped by their lower-cased CURIE prefix. Only
/// prefixes with a named resource become facets; facets are ordered by key.
pub fn facet_group(response: FilteringTermsResponse) -> FacetGroup {
	let content = response.response.unwrap_or_default();
	let names: BTreeMap<&str, &str> = content
		.resources
		.iter()
		.filter_map(|resource| {
			Some((non_blank(resource.id.as_deref())?, non_blank(resource.name.as_deref())?))
		})
		.collect();
	let mut values_by_prefix: BTreeMap<String, Vec<ValueLabel>> = BTreeMap::new();

	for term in &content.filtering_terms {
		if term.term_type.as_deref() != Some(ONTOLOGY_TERM_TYPE)
			|| !term.scopes.iter().any(|scope| scope == SCOPE)
		{
			continue;
		}

		let (Some(id), Some(label)) = (non_blank(term.id.as_deref()), non_blank(term.label.as_deref()))
		else {
			continue;
		};
		let Some((prefix, _)) = id.split_once(':') else {
			continue;
		};

		values_by_prefix
			.entry(prefix.to_lowercase())
			.or_default()
			.push(ValueLabel::new(id, label));
	}

	let facets = values_by_prefix
		.into_iter()
		.filter_map(|(key, values)| {
			let label = names.get(key.as_str())?.to_string();

			Some(Facet { key, label: Some(label), values })
		})
		.collect();

	FacetGroup {
		key: BEACON_FACET_GROUP.to_string(),
		label: BEACON_FACET_LABEL.to_string(),
		facets,
	}
}

fn non_blank(raw: Option<&str>) -> Option<&str> {
	raw.map(str::trim).filter(|raw| !raw.is_empty())
}
