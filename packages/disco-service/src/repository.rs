use crate::{BoxFuture, DatasetsRepository, Error, Result, Source};
use disco_domain::{
	Operator, RetrievedDataset, SearchQuery, SearchedDataset, facet_query::build_clause,
};
use disco_providers::ckan::{self, CKAN_IDENTIFIER_FIELD, CkanClient, PackageSearchRequest};

const DEFAULT_ROWS: u32 = 10;

/// Dataset records held by the catalogue.
pub struct CatalogueDatasetsRepository {
	client: CkanClient,
	pagination_max_size: u32,
}
impl CatalogueDatasetsRepository {
	pub fn new(client: CkanClient, pagination_max_size: u32) -> Self {
		Self { client, pagination_max_size }
	}

	pub fn request(&self, ids: &[String], query: &SearchQuery) -> PackageSearchRequest {
		let sort = query.sort.as_deref().map(str::trim).filter(|sort| !sort.is_empty());

		PackageSearchRequest {
			fq: Some(build_clause(CKAN_IDENTIFIER_FIELD, ids, Operator::Or)),
			sort: sort.map(str::to_string),
			rows: Some(query.rows.unwrap_or(DEFAULT_ROWS).min(self.pagination_max_size)),
			start: Some(query.start.unwrap_or(0)),
			..Default::default()
		}
	}

	async fn search_inner(
		&self,
		ids: &[String],
		query: &SearchQuery,
		token: Option<&str>,
	) -> Result<Vec<SearchedDataset>> {
		if ids.is_empty() {
			return Ok(Vec::new());
		}

		let result = self
			.client
			.package_search(&self.request(ids, query), token)
			.await
			.map_err(|err| Error::provider(Source::Catalogue, err))?;

		Ok(result.results.into_iter().map(ckan::searched_dataset).collect())
	}

	async fn retrieve_inner(&self, id: &str, token: Option<&str>) -> Result<RetrievedDataset> {
		match self.client.package_show(id, token).await {
			Ok(package) => Ok(ckan::retrieved_dataset(package)),
			Err(disco_providers::Error::NotFound { .. }) => {
				Err(Error::NotFound { message: format!("Dataset {id} does not exist.") })
			},
			Err(err) => Err(Error::provider(Source::Catalogue, err)),
		}
	}
}
impl DatasetsRepository for CatalogueDatasetsRepository {
	fn search<'a>(
		&'a self,
		ids: &'a [String],
		query: &'a SearchQuery,
		token: Option<&'a str>,
	) -> BoxFuture<'a, Result<Vec<SearchedDataset>>> {
		Box::pin(self.search_inner(ids, query, token))
	}

	fn retrieve<'a>(
		&'a self,
		id: &'a str,
		token: Option<&'a str>,
	) -> BoxFuture<'a, Result<RetrievedDataset>> {
		Box::pin(self.retrieve_inner(id, token))
	}
}
