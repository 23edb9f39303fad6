pub mod dataset;
pub mod facet;
pub mod facet_query;
pub mod query;
pub mod reconcile;
pub mod response;
pub mod time_serde;

pub use dataset::{
	ContactPoint, DatasetDictionaryEntry, DatasetOrganization, DatasetRelationEntry,
	RetrievedDataset, RetrievedDistribution, SearchedDataset, ValueLabel,
};
pub use facet::{Facet, FacetGroup};
pub use facet_query::FacetQueryBuilder;
pub use query::{FacetTriple, Operator, SearchQuery};
pub use reconcile::DatasetIdSet;
pub use response::SearchResponse;

/// Facet group tag of the metadata catalogue.
pub const CKAN_FACET_GROUP: &str = "ckan";
/// Facet group tag of the genomic-variant service.
pub const BEACON_FACET_GROUP: &str = "beacon";
