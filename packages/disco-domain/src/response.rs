use serde::{Deserialize, Serialize};

use crate::{dataset::SearchedDataset, facet::FacetGroup, reconcile::DatasetIdSet};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
	pub count: usize,
	pub results: Vec<SearchedDataset>,
	pub facet_groups: Vec<FacetGroup>,
}

/// Stitches the reconciled identifiers, fetched records and facet groups together.
///
/// Every record's `records_count` is overwritten with the reconciled count for its identifier,
/// including when the reconciled count is absent.
pub fn assemble(
	reconciled: &DatasetIdSet,
	datasets: Vec<SearchedDataset>,
	facet_groups: Vec<FacetGroup>,
) -> SearchResponse {
	let results = datasets
		.into_iter()
		.map(|dataset| {
			let records_count = dataset
				.identifier
				.as_deref()
				.and_then(|identifier| reconciled.get(identifier).copied())
				.flatten();

			SearchedDataset { records_count, ..dataset }
		})
		.collect();

	SearchResponse { count: reconciled.len(), results, facet_groups }
}
