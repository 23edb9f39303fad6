//! Facet groups per source and their aggregation.

use std::sync::Arc;

use futures::future;

use crate::{
	BoxFuture, Error, FacetsBuilder, Result, Source,
	auth::{Access, RequestTokens},
};
use disco_domain::{FacetGroup, SearchQuery};
use disco_providers::{
	beacon::{self, BeaconClient},
	ckan::{self, CkanClient, PackageSearchRequest},
};

/// Runs every builder concurrently and returns the groups in registration order. Builders of a
/// gated source are not invoked when the caller has no token for it.
pub async fn aggregate(
	builders: &[Arc<dyn FacetsBuilder>],
	query: &SearchQuery,
	tokens: &RequestTokens<'_>,
) -> Result<Vec<FacetGroup>> {
	let groups = future::try_join_all(
		builders.iter().map(|builder| build_one(builder.as_ref(), query, tokens)),
	)
	.await?;

	Ok(groups.into_iter().flatten().collect())
}

async fn build_one(
	builder: &dyn FacetsBuilder,
	query: &SearchQuery,
	tokens: &RequestTokens<'_>,
) -> Result<Option<FacetGroup>> {
	let source = builder.source();
	let Access::Granted(token) = tokens.access(source).await? else {
		tracing::debug!(%source, "Facet builder skipped without a usable token.");

		return Ok(None);
	};

	builder.build(query, token).await
}

/// Catalogue facet counts for the configured fields, over the whole catalogue.
pub struct CatalogueFacetsBuilder {
	client: CkanClient,
	selected_facet_fields: Vec<String>,
}
impl CatalogueFacetsBuilder {
	pub fn new(client: CkanClient, selected_facet_fields: Vec<String>) -> Self {
		Self { client, selected_facet_fields }
	}

	pub fn request(&self) -> PackageSearchRequest {
		PackageSearchRequest {
			rows: Some(0),
			facet_field: self.selected_facet_fields.clone(),
			facet_limit: Some(-1),
			..Default::default()
		}
	}

	async fn build_inner(&self, token: Option<&str>) -> Result<Option<FacetGroup>> {
		let result = self
			.client
			.package_search(&self.request(), token)
			.await
			.map_err(|err| Error::provider(Source::Catalogue, err))?;

		Ok(Some(ckan::facet_group(result.search_facets, &self.selected_facet_fields)))
	}
}
impl FacetsBuilder for CatalogueFacetsBuilder {
	fn source(&self) -> Source {
		Source::Catalogue
	}

	fn build<'a>(
		&'a self,
		_query: &'a SearchQuery,
		token: Option<&'a str>,
	) -> BoxFuture<'a, Result<Option<FacetGroup>>> {
		Box::pin(self.build_inner(token))
	}
}

pub struct BeaconFacetsBuilder {
	client: BeaconClient,
}
impl BeaconFacetsBuilder {
	pub fn new(client: BeaconClient) -> Self {
		Self { client }
	}

	async fn build_inner(&self, token: Option<&str>) -> Result<Option<FacetGroup>> {
		let Some(authorization) = token else {
			return Ok(None);
		};
		let response = self
			.client
			.list_filtering_terms(authorization)
			.await
			.map_err(|err| Error::provider(Source::Beacon, err))?;

		Ok(Some(beacon::facet_group(response)))
	}
}
impl FacetsBuilder for BeaconFacetsBuilder {
	fn source(&self) -> Source {
		Source::Beacon
	}

	fn build<'a>(
		&'a self,
		_query: &'a SearchQuery,
		token: Option<&'a str>,
	) -> BoxFuture<'a, Result<Option<FacetGroup>>> {
		Box::pin(self.build_inner(token))
	}
}
