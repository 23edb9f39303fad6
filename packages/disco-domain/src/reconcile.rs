//! Intersection of per-source dataset identifiers with auxiliary count merging.

use std::collections::BTreeMap;

/// Dataset identifier mapped to an optional auxiliary count (for example, matching individuals).
///
/// An absent count means the source did not emit one, which is different from a count of zero.
pub type DatasetIdSet = BTreeMap<String, Option<u64>>;

/// Combines collector contributions into the identifiers every contributing source agrees on.
///
/// `None` entries are sources that did not take part in this request and are skipped. With no
/// contributions at all the result is empty.
pub fn reconcile<I>(outputs: I) -> DatasetIdSet
where
	I: IntoIterator<Item = Option<DatasetIdSet>>,
{
	outputs.into_iter().flatten().reduce(merge).unwrap_or_default()
}

/// Keeps identifiers present in both sets and merges their counts with [`merge_count`].
pub fn merge(a: DatasetIdSet, mut b: DatasetIdSet) -> DatasetIdSet {
	a.into_iter()
		.filter_map(|(id, count_a)| {
			let count_b = b.remove(&id)?;

			Some((id, merge_count(count_a, count_b)))
		})
		.collect()
}

/// The most restrictive count wins; a single present count is kept as is.
pub fn merge_count(a: Option<u64>, b: Option<u64>) -> Option<u64> {
	match (a, b) {
		(Some(a), Some(b)) => Some(a.min(b)),
		(Some(count), None) | (None, Some(count)) => Some(count),
		(None, None) => None,
	}
}
