//! CKAN action API: `package_search` and `package_show`, plus mapping into domain records.

use std::collections::BTreeMap;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{Error, Result, lenient::null_as_default};
use disco_config::CkanConfig;
use disco_domain::{
	CKAN_FACET_GROUP, ContactPoint, DatasetDictionaryEntry, DatasetIdSet, DatasetOrganization,
	DatasetRelationEntry, Facet, FacetGroup, RetrievedDataset, RetrievedDistribution,
	SearchedDataset, ValueLabel, time_serde,
};

pub const CKAN_FACET_LABEL: &str = "DCAT-AP";
pub const CKAN_IDENTIFIER_FIELD: &str = "identifier";

const PACKAGE_SEARCH_PATH: &str = "/api/3/action/package_search";
const PACKAGE_SHOW_PATH: &str = "/api/3/action/package_show";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PackageSearchRequest {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub q: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub fq: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub sort: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub rows: Option<u32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub start: Option<u32>,
	#[serde(rename = "facet.field", skip_serializing_if = "Vec::is_empty")]
	pub facet_field: Vec<String>,
	/// `-1` asks for every value of each facet field.
	#[serde(rename = "facet.limit", skip_serializing_if = "Option::is_none")]
	pub facet_limit: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CkanResponse<T> {
	#[serde(default)]
	pub success: Option<bool>,
	pub result: Option<T>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackagesSearchResult {
	#[serde(default)]
	pub count: Option<u64>,
	#[serde(default, deserialize_with = "null_as_default")]
	pub results: Vec<CkanPackage>,
	#[serde(default, deserialize_with = "null_as_default")]
	pub search_facets: BTreeMap<String, CkanFacet>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CkanFacet {
	#[serde(default)]
	pub title: Option<String>,
	#[serde(default, deserialize_with = "null_as_default")]
	pub items: Vec<CkanFacetItem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CkanFacetItem {
	#[serde(default)]
	pub name: Option<String>,
	#[serde(default)]
	pub display_name: Option<String>,
	#[serde(default)]
	pub count: Option<u64>,
}

/// A value that CKAN schemas render either as a `{name, display_name}` object or as a string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CkanValueLabel {
	Object {
		#[serde(default)]
		name: Option<String>,
		#[serde(default)]
		display_name: Option<String>,
	},
	Plain(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CkanTag {
	#[serde(default)]
	pub name: Option<String>,
	#[serde(default)]
	pub display_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CkanOrganization {
	#[serde(default)]
	pub name: Option<String>,
	#[serde(default)]
	pub title: Option<String>,
	#[serde(default)]
	pub description: Option<String>,
	#[serde(default)]
	pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CkanResource {
	#[serde(default)]
	pub id: Option<String>,
	#[serde(default)]
	pub name: Option<String>,
	#[serde(default)]
	pub description: Option<String>,
	#[serde(default)]
	pub format: Option<String>,
	#[serde(default)]
	pub uri: Option<String>,
	#[serde(default)]
	pub created: Option<String>,
	#[serde(default)]
	pub last_modified: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CkanContactPoint {
	#[serde(default)]
	pub name: Option<String>,
	#[serde(default)]
	pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CkanDatasetRelationEntry {
	#[serde(default)]
	pub relation: Option<String>,
	#[serde(default)]
	pub target: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CkanDatasetDictionaryEntry {
	#[serde(default)]
	pub name: Option<String>,
	#[serde(default, rename = "type")]
	pub entry_type: Option<String>,
	#[serde(default)]
	pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CkanPackage {
	pub id: Option<String>,
	pub identifier: Option<String>,
	pub name: Option<String>,
	pub title: Option<String>,
	pub notes: Option<String>,
	pub url: Option<String>,
	pub publisher_name: Option<String>,
	pub provenance: Option<String>,
	pub contact_uri: Option<String>,
	pub access_rights: Option<String>,
	pub spatial_uri: Option<String>,
	pub metadata_created: Option<String>,
	pub metadata_modified: Option<String>,
	pub organization: Option<CkanOrganization>,
	#[serde(deserialize_with = "null_as_default")]
	pub theme: Vec<CkanValueLabel>,
	#[serde(deserialize_with = "null_as_default")]
	pub language: Vec<CkanValueLabel>,
	#[serde(deserialize_with = "null_as_default")]
	pub tags: Vec<CkanTag>,
	#[serde(deserialize_with = "null_as_default")]
	pub resources: Vec<CkanResource>,
	#[serde(deserialize_with = "null_as_default")]
	pub contacts: Vec<CkanContactPoint>,
	#[serde(deserialize_with = "null_as_default")]
	pub dataset_relationships: Vec<CkanDatasetRelationEntry>,
	#[serde(deserialize_with = "null_as_default")]
	pub data_dictionary: Vec<CkanDatasetDictionaryEntry>,
}

#[derive(Debug, Clone)]
pub struct CkanClient {
	client: Client,
	api_base: String,
}
impl CkanClient {
	pub fn new(cfg: &CkanConfig) -> Result<Self> {
		let client = crate::build_client(cfg.timeout_ms, &cfg.default_headers)?;

		Ok(Self { client, api_base: cfg.api_base.clone() })
	}

	pub async fn package_search(
		&self,
		request: &PackageSearchRequest,
		access_token: Option<&str>,
	) -> Result<PackagesSearchResult> {
		let url = format!("{}{PACKAGE_SEARCH_PATH}", self.api_base);
		let authorization = access_token.map(crate::bearer);

		tracing::debug!(%url, rows = ?request.rows, start = ?request.start, "CKAN package_search.");

		let res: CkanResponse<PackagesSearchResult> = crate::send_json(
			self.client
				.post(url)
				.headers(crate::auth_headers(authorization.as_deref())?)
				.json(request),
		)
		.await?;

		unwrap_result(res, "package_search")
	}

	pub async fn package_show(&self, id: &str, access_token: Option<&str>) -> Result<CkanPackage> {
		let url = format!("{}{PACKAGE_SHOW_PATH}", self.api_base);
		let authorization = access_token.map(crate::bearer);
		let res: CkanResponse<CkanPackage> = crate::send_json(
			self.client
				.get(url)
				.query(&[("id", id)])
				.headers(crate::auth_headers(authorization.as_deref())?),
		)
		.await?;

		unwrap_result(res, "package_show")
	}
}

fn unwrap_result<T>(res: CkanResponse<T>, action: &str) -> Result<T> {
	if res.success == Some(false) {
		return Err(Error::InvalidResponse {
			message: format!("CKAN {action} reported success=false."),
		});
	}

	res.result.ok_or_else(|| Error::InvalidResponse {
		message: format!("CKAN {action} response is missing result."),
	})
}

/// Identifiers of the returned packages; the catalogue emits no auxiliary count.
pub fn dataset_ids(result: &PackagesSearchResult) -> DatasetIdSet {
	result
		.results
		.iter()
		.filter_map(|package| non_blank(package.identifier.as_deref()))
		.map(|identifier| (identifier.to_string(), None))
		.collect()
}

/// Builds the catalogue facet group, ordering facets by `selected_fields`.
pub fn facet_group(
	mut search_facets: BTreeMap<String, CkanFacet>,
	selected_fields: &[String],
) -> FacetGroup {
	let facets = selected_fields
		.iter()
		.filter_map(|field| search_facets.remove_entry(field))
		.map(|(key, facet)| {
			let values = facet
				.items
				.into_iter()
				.map(|item| ValueLabel { value: item.name, label: item.display_name })
				.collect();

			Facet { key, label: facet.title, values }
		})
		.collect();

	FacetGroup {
		key: CKAN_FACET_GROUP.to_string(),
		label: CKAN_FACET_LABEL.to_string(),
		facets,
	}
}

pub fn searched_dataset(package: CkanPackage) -> SearchedDataset {
	let catalogue = package.organization.as_ref().and_then(|organization| organization.title.clone());
	let organization = organization(package.organization);

	SearchedDataset {
		id: package.id,
		identifier: package.identifier,
		title: package.title.or(package.name),
		description: package.notes,
		themes: value_labels(package.theme),
		keywords: keywords(package.tags),
		catalogue,
		organization,
		created_at: timestamp(package.metadata_created.as_deref()),
		modified_at: timestamp(package.metadata_modified.as_deref()),
		distributions: package.resources.into_iter().map(distribution).collect(),
		records_count: None,
	}
}

pub fn retrieved_dataset(package: CkanPackage) -> RetrievedDataset {
	let catalogue = package.organization.as_ref().and_then(|organization| organization.title.clone());

	RetrievedDataset {
		id: package.id,
		identifier: package.identifier,
		title: package.title.or(package.name),
		description: package.notes,
		themes: value_labels(package.theme),
		publisher_name: package.publisher_name,
		catalogue,
		created_at: timestamp(package.metadata_created.as_deref()),
		modified_at: timestamp(package.metadata_modified.as_deref()),
		url: package.url,
		languages: value_labels(package.language),
		contact: ValueLabel::same(package.contact_uri.as_deref()),
		access_rights: ValueLabel::same(package.access_rights.as_deref()),
		provenance: package.provenance,
		spatial: ValueLabel::same(package.spatial_uri.as_deref()),
		distributions: package.resources.into_iter().map(distribution).collect(),
		keywords: keywords(package.tags),
		contacts: package
			.contacts
			.into_iter()
			.map(|contact| ContactPoint { name: contact.name, email: contact.email })
			.collect(),
		dataset_relationships: package
			.dataset_relationships
			.into_iter()
			.map(|entry| DatasetRelationEntry { relation: entry.relation, target: entry.target })
			.collect(),
		data_dictionary: package
			.data_dictionary
			.into_iter()
			.map(|entry| DatasetDictionaryEntry {
				name: entry.name,
				entry_type: entry.entry_type,
				description: entry.description,
			})
			.collect(),
	}
}

fn organization(organization: Option<CkanOrganization>) -> DatasetOrganization {
	let Some(organization) = organization else {
		return DatasetOrganization::default();
	};

	DatasetOrganization {
		title: organization.title,
		name: organization.name,
		description: organization.description,
		image_url: organization.image_url,
	}
}

fn value_labels(values: Vec<CkanValueLabel>) -> Vec<ValueLabel> {
	values
		.into_iter()
		.filter_map(|value| match value {
			CkanValueLabel::Object { name, display_name } => {
				Some(ValueLabel { value: name, label: display_name })
			},
			CkanValueLabel::Plain(raw) => ValueLabel::same(Some(&raw)),
		})
		.collect()
}

fn keywords(tags: Vec<CkanTag>) -> Vec<ValueLabel> {
	tags.into_iter().map(|tag| ValueLabel { value: tag.name, label: tag.display_name }).collect()
}

fn distribution(resource: CkanResource) -> RetrievedDistribution {
	RetrievedDistribution {
		id: resource.id,
		title: resource.name,
		description: resource.description,
		format: ValueLabel::same(resource.format.as_deref()),
		uri: resource.uri,
		created_at: timestamp(resource.created.as_deref()),
		modified_at: timestamp(resource.last_modified.as_deref()),
	}
}

fn timestamp(raw: Option<&str>) -> Option<time::PrimitiveDateTime> {
	let raw = non_blank(raw)?;

	match time_serde::parse(raw) {
		Ok(value) => Some(value),
		Err(err) => {
			tracing::debug!(error = %err, raw, "Ignoring unparseable CKAN timestamp.");

			None
		},
	}
}

fn non_blank(raw: Option<&str>) -> Option<&str> {
	raw.map(str::trim).filter(|raw| !raw.is_empty())
}

#[cfg(test)]
mod tests {
	use super::*;

	fn parse_search(json: serde_json::Value) -> PackagesSearchResult {
		let res: CkanResponse<PackagesSearchResult> =
			serde_json::from_value(json).expect("parse failed");

		unwrap_result(res, "package_search").expect("missing result")
	}

	#[test]
	fn collects_identifiers_and_skips_blank_ones() {
		let result = parse_search(serde_json::json!({
			"success": true,
			"result": {
				"count": 3,
				"results": [
					{ "id": "1", "identifier": "ds-1" },
					{ "id": "2", "identifier": "  " },
					{ "id": "3", "identifier": null }
				]
			}
		}));
		let ids = dataset_ids(&result);

		assert_eq!(ids.len(), 1);
		assert_eq!(ids.get("ds-1"), Some(&None));
	}

	#[test]
	fn orders_facets_by_selected_fields() {
		let result = parse_search(serde_json::json!({
			"success": true,
			"result": {
				"count": 0,
				"results": [],
				"search_facets": {
					"organization": {
						"title": "organization",
						"items": [{ "name": "umcg", "display_name": "UMCG", "count": 4 }]
					},
					"theme": { "title": "Theme", "items": null },
					"unrequested": { "title": "x", "items": [] }
				}
			}
		}));
		let fields = vec!["theme".to_string(), "organization".to_string(), "tags".to_string()];
		let group = facet_group(result.search_facets, &fields);

		assert_eq!(group.key, "ckan");
		assert_eq!(group.label, "DCAT-AP");
		assert_eq!(
			group.facets.iter().map(|facet| facet.key.as_str()).collect::<Vec<_>>(),
			vec!["theme", "organization"]
		);
		assert!(group.facets[0].values.is_empty());
		assert_eq!(group.facets[1].values, vec![ValueLabel::new("umcg", "UMCG")]);
	}

	#[test]
	fn maps_package_to_searched_dataset() {
		let package: CkanPackage = serde_json::from_value(serde_json::json!({
			"id": "uuid-1",
			"identifier": "ds-1",
			"name": "dataset-one",
			"notes": "Some notes",
			"theme": [{ "name": "health", "display_name": "Health" }, "genomics"],
			"tags": [{ "name": "rare", "display_name": "Rare disease" }],
			"organization": { "name": "umcg", "title": "UMCG" },
			"metadata_created": "2024-01-02T03:04:05.000006",
			"metadata_modified": "not a date",
			"resources": [{ "id": "r1", "name": "VCF", "format": "VCF" }]
		}))
		.expect("parse failed");
		let dataset = searched_dataset(package);

		assert_eq!(dataset.title.as_deref(), Some("dataset-one"));
		assert_eq!(dataset.catalogue.as_deref(), Some("UMCG"));
		assert_eq!(dataset.organization.name.as_deref(), Some("umcg"));
		assert_eq!(
			dataset.themes,
			vec![ValueLabel::new("health", "Health"), ValueLabel::new("genomics", "genomics")]
		);
		assert!(dataset.created_at.is_some());
		assert!(dataset.modified_at.is_none());
		assert_eq!(dataset.distributions[0].format, Some(ValueLabel::new("VCF", "VCF")));
		assert_eq!(dataset.records_count, None);
	}

	#[test]
	fn failed_envelope_is_an_invalid_response() {
		let res: CkanResponse<PackagesSearchResult> =
			serde_json::from_value(serde_json::json!({ "success": false, "result": null }))
				.expect("parse failed");

		assert!(matches!(unwrap_result(res, "package_search"), Err(Error::InvalidResponse { .. })));
	}

	#[test]
	fn search_request_uses_ckan_parameter_names() {
		let request = PackageSearchRequest {
			fq: Some("identifier:(\"a\")".to_string()),
			rows: Some(0),
			facet_field: vec!["theme".to_string()],
			facet_limit: Some(-1),
			..Default::default()
		};
		let json = serde_json::to_value(&request).expect("serialize failed");

		assert_eq!(
			json,
			serde_json::json!({
				"fq": "identifier:(\"a\")",
				"rows": 0,
				"facet.field": ["theme"],
				"facet.limit": -1
			})
		);
	}
}
