use crate::{BoxFuture, DatasetIdsCollector, Error, Result, Source};
use disco_domain::{CKAN_FACET_GROUP, DatasetIdSet, FacetQueryBuilder, SearchQuery};
use disco_providers::{
	beacon::{self, BeaconClient},
	ckan::{self, CkanClient, PackageSearchRequest},
};

/// Identifiers of catalogue records matching the free text and the `ckan` facets.
pub struct CatalogueIdsCollector {
	client: CkanClient,
	query_builder: FacetQueryBuilder,
	pagination_max_size: u32,
}
impl CatalogueIdsCollector {
	pub fn new(client: CkanClient, pagination_max_size: u32) -> Self {
		Self { client, query_builder: FacetQueryBuilder::new(CKAN_FACET_GROUP), pagination_max_size }
	}

	pub fn request(&self, query: &SearchQuery) -> PackageSearchRequest {
		let fq = self.query_builder.build(query);

		PackageSearchRequest {
			q: query.text().map(str::to_string),
			fq: (!fq.is_empty()).then_some(fq),
			rows: Some(self.pagination_max_size),
			start: Some(0),
			..Default::default()
		}
	}

	async fn collect_inner(
		&self,
		query: &SearchQuery,
		token: Option<&str>,
	) -> Result<Option<DatasetIdSet>> {
		let result = self
			.client
			.package_search(&self.request(query), token)
			.await
			.map_err(|err| Error::provider(Source::Catalogue, err))?;

		Ok(Some(ckan::dataset_ids(&result)))
	}
}
impl DatasetIdsCollector for CatalogueIdsCollector {
	fn source(&self) -> Source {
		Source::Catalogue
	}

	fn collect<'a>(
		&'a self,
		query: &'a SearchQuery,
		token: Option<&'a str>,
	) -> BoxFuture<'a, Result<Option<DatasetIdSet>>> {
		Box::pin(self.collect_inner(query, token))
	}
}

/// Datasets with individuals matching the `beacon` facets, with the match count as auxiliary
/// count. Without a token or without `beacon` facets it contributes nothing, since an unfiltered
/// call would admit every dataset.
pub struct BeaconIdsCollector {
	client: BeaconClient,
}
impl BeaconIdsCollector {
	pub fn new(client: BeaconClient) -> Self {
		Self { client }
	}

	async fn collect_inner(
		&self,
		query: &SearchQuery,
		token: Option<&str>,
	) -> Result<Option<DatasetIdSet>> {
		let Some(authorization) = token else {
			return Ok(None);
		};
		let request = beacon::individuals_request(query);

		if request.query.filters.is_empty() {
			return Ok(None);
		}

		let response = self
			.client
			.list_individuals(authorization, &request)
			.await
			.map_err(|err| Error::provider(Source::Beacon, err))?;

		Ok(Some(beacon::dataset_counts(response)))
	}
}
impl DatasetIdsCollector for BeaconIdsCollector {
	fn source(&self) -> Source {
		Source::Beacon
	}

	fn collect<'a>(
		&'a self,
		query: &'a SearchQuery,
		token: Option<&'a str>,
	) -> BoxFuture<'a, Result<Option<DatasetIdSet>>> {
		Box::pin(self.collect_inner(query, token))
	}
}
