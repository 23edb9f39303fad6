use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueLabel {
	pub value: Option<String>,
	pub label: Option<String>,
}
impl ValueLabel {
	pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
		Self { value: Some(value.into()), label: Some(label.into()) }
	}

	/// A bare string used as both value and label; blank input yields `None`.
	pub fn same(raw: Option<&str>) -> Option<Self> {
		let raw = raw.map(str::trim).filter(|raw| !raw.is_empty())?;

		Some(Self::new(raw, raw))
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DatasetOrganization {
	pub title: Option<String>,
	pub name: Option<String>,
	pub description: Option<String>,
	pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RetrievedDistribution {
	pub id: Option<String>,
	pub title: Option<String>,
	pub description: Option<String>,
	pub format: Option<ValueLabel>,
	pub uri: Option<String>,
	#[serde(default, with = "crate::time_serde::option")]
	pub created_at: Option<PrimitiveDateTime>,
	#[serde(default, with = "crate::time_serde::option")]
	pub modified_at: Option<PrimitiveDateTime>,
}

/// A search hit as rendered in result lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SearchedDataset {
	pub id: Option<String>,
	pub identifier: Option<String>,
	pub title: Option<String>,
	pub description: Option<String>,
	pub themes: Vec<ValueLabel>,
	pub keywords: Vec<ValueLabel>,
	pub catalogue: Option<String>,
	pub organization: DatasetOrganization,
	#[serde(default, with = "crate::time_serde::option")]
	pub created_at: Option<PrimitiveDateTime>,
	#[serde(default, with = "crate::time_serde::option")]
	pub modified_at: Option<PrimitiveDateTime>,
	pub distributions: Vec<RetrievedDistribution>,
	/// Auxiliary count reconciled across sources, such as matching individuals.
	pub records_count: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactPoint {
	pub name: Option<String>,
	pub email: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetRelationEntry {
	pub relation: Option<String>,
	pub target: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetDictionaryEntry {
	pub name: Option<String>,
	#[serde(rename = "type")]
	pub entry_type: Option<String>,
	pub description: Option<String>,
}

/// The full single-record view of a dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RetrievedDataset {
	pub id: Option<String>,
	pub identifier: Option<String>,
	pub title: Option<String>,
	pub description: Option<String>,
	pub themes: Vec<ValueLabel>,
	pub publisher_name: Option<String>,
	pub catalogue: Option<String>,
	#[serde(default, with = "crate::time_serde::option")]
	pub created_at: Option<PrimitiveDateTime>,
	#[serde(default, with = "crate::time_serde::option")]
	pub modified_at: Option<PrimitiveDateTime>,
	pub url: Option<String>,
	pub languages: Vec<ValueLabel>,
	pub contact: Option<ValueLabel>,
	pub access_rights: Option<ValueLabel>,
	pub provenance: Option<String>,
	pub spatial: Option<ValueLabel>,
	pub distributions: Vec<RetrievedDistribution>,
	pub keywords: Vec<ValueLabel>,
	pub contacts: Vec<ContactPoint>,
	pub dataset_relationships: Vec<DatasetRelationEntry>,
	pub data_dictionary: Vec<DatasetDictionaryEntry>,
}
