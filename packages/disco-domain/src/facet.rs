use serde::{Deserialize, Serialize};

use crate::dataset::ValueLabel;

/// A filterable field and the values a client may select for it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facet {
	pub key: String,
	pub label: Option<String>,
	pub values: Vec<ValueLabel>,
}

/// Facets contributed by one source. `key` is the source tag, so groups from different sources
/// never merge even when their facet keys collide.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetGroup {
	pub key: String,
	pub label: String,
	pub facets: Vec<Facet>,
}
