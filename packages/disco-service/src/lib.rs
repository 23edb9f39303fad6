pub mod auth;
pub mod cache;
pub mod collectors;
pub mod facets;
pub mod repository;

mod error;

pub use error::{Error, Result};

use std::{fmt, future::Future, pin::Pin, sync::Arc, time::Duration};

use futures::future;

use auth::{Access, RequestTokens, TokenBridge};
use cache::{Cache, CachedFacetsBuilder, MemoryCache};
use collectors::{BeaconIdsCollector, CatalogueIdsCollector};
use disco_config::Config;
use disco_domain::{
	DatasetIdSet, FacetGroup, RetrievedDataset, SearchQuery, SearchResponse, SearchedDataset,
	reconcile, response,
};
use disco_providers::{beacon::BeaconClient, ckan::CkanClient, keycloak::KeycloakClient};
use facets::{BeaconFacetsBuilder, CatalogueFacetsBuilder};
use repository::CatalogueDatasetsRepository;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The source that owns full dataset records.
const SYSTEM_OF_RECORD: Source = Source::Catalogue;

/// A backend contributing dataset identifiers or facets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
	Catalogue,
	Beacon,
}
impl Source {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Catalogue => "ckan",
			Self::Beacon => "beacon",
		}
	}

	/// Whether components of this source need an exchanged token to run at all.
	pub fn requires_token(self) -> bool {
		matches!(self, Self::Beacon)
	}
}
impl fmt::Display for Source {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

pub trait DatasetIdsCollector
where
	Self: Send + Sync,
{
	fn source(&self) -> Source;

	/// `Ok(None)` means the source has nothing to say about this query and must not narrow it.
	fn collect<'a>(
		&'a self,
		query: &'a SearchQuery,
		token: Option<&'a str>,
	) -> BoxFuture<'a, Result<Option<DatasetIdSet>>>;
}

pub trait FacetsBuilder
where
	Self: Send + Sync,
{
	fn source(&self) -> Source;

	fn build<'a>(
		&'a self,
		query: &'a SearchQuery,
		token: Option<&'a str>,
	) -> BoxFuture<'a, Result<Option<FacetGroup>>>;
}

pub trait DatasetsRepository
where
	Self: Send + Sync,
{
	/// Fetches the records for `ids`, honouring the sort and paging of `query`.
	fn search<'a>(
		&'a self,
		ids: &'a [String],
		query: &'a SearchQuery,
		token: Option<&'a str>,
	) -> BoxFuture<'a, Result<Vec<SearchedDataset>>>;

	fn retrieve<'a>(
		&'a self,
		id: &'a str,
		token: Option<&'a str>,
	) -> BoxFuture<'a, Result<RetrievedDataset>>;
}

pub trait TokenExchange
where
	Self: Send + Sync,
{
	/// Returns the formatted `Authorization` value for the token-gated source, or `None` when
	/// the caller may not use it.
	fn exchange<'a>(
		&'a self,
		caller_token: Option<&'a str>,
	) -> BoxFuture<'a, Result<Option<String>>>;
}

/// Statically registered source components. Registration order is the facet group order.
#[derive(Clone)]
pub struct Components {
	pub collectors: Vec<Arc<dyn DatasetIdsCollector>>,
	pub facets: Vec<Arc<dyn FacetsBuilder>>,
	pub repository: Arc<dyn DatasetsRepository>,
	pub token_exchange: Option<Arc<dyn TokenExchange>>,
}

pub struct DiscoveryService {
	components: Components,
	pagination_max_size: u32,
}
impl DiscoveryService {
	pub fn new(components: Components, pagination_max_size: u32) -> Self {
		Self { components, pagination_max_size }
	}

	pub fn from_config(cfg: &Config) -> Result<Self> {
		let search = &cfg.search;
		let ckan = CkanClient::new(&cfg.ckan).map_err(config_error)?;
		let mut collectors: Vec<Arc<dyn DatasetIdsCollector>> = vec![Arc::new(
			CatalogueIdsCollector::new(ckan.clone(), search.pagination_max_size),
		)];
		let mut facets: Vec<Arc<dyn FacetsBuilder>> = vec![Arc::new(CatalogueFacetsBuilder::new(
			ckan.clone(),
			search.selected_facet_fields.clone(),
		))];
		let mut token_exchange: Option<Arc<dyn TokenExchange>> = None;

		if search.enable_secondary_source {
			let (Some(beacon_cfg), Some(keycloak_cfg)) = (&cfg.beacon, &cfg.keycloak) else {
				return Err(Error::Config {
					message: "[beacon] and [keycloak] are required for the secondary source."
						.to_string(),
				});
			};
			let beacon = BeaconClient::new(beacon_cfg).map_err(config_error)?;
			let keycloak = KeycloakClient::new(keycloak_cfg).map_err(config_error)?;

			collectors.push(Arc::new(BeaconIdsCollector::new(beacon.clone())));
			facets.push(Arc::new(BeaconFacetsBuilder::new(beacon)));
			token_exchange = Some(Arc::new(TokenBridge::new(keycloak)));
		}
		if search.cache.enabled {
			let cache: Arc<dyn Cache<FacetGroup>> = Arc::new(MemoryCache::<FacetGroup>::new(
				Duration::from_secs(search.cache.ttl_seconds),
				search.cache.max_entries,
			));

			facets = facets
				.into_iter()
				.map(|builder| {
					Arc::new(CachedFacetsBuilder::new(builder, cache.clone()))
						as Arc<dyn FacetsBuilder>
				})
				.collect();
		}

		tracing::info!(
			collectors = collectors.len(),
			facet_builders = facets.len(),
			secondary_source = search.enable_secondary_source,
			cache = search.cache.enabled,
			"Discovery service configured."
		);

		let components = Components {
			collectors,
			facets,
			repository: Arc::new(CatalogueDatasetsRepository::new(ckan, search.pagination_max_size)),
			token_exchange,
		};

		Ok(Self::new(components, search.pagination_max_size))
	}

	pub async fn search(
		&self,
		query: &SearchQuery,
		caller_token: Option<&str>,
	) -> Result<SearchResponse> {
		self.validate(query)?;

		let tokens = RequestTokens::new(caller_token, self.components.token_exchange.as_deref());
		let ((reconciled, datasets), facet_groups) = tokio::try_join!(
			self.collect_datasets(query, &tokens),
			facets::aggregate(&self.components.facets, query, &tokens),
		)?;

		Ok(response::assemble(&reconciled, datasets, facet_groups))
	}

	pub async fn retrieve(&self, id: &str, caller_token: Option<&str>) -> Result<RetrievedDataset> {
		let id = id.trim();

		if id.is_empty() {
			return Err(Error::InvalidRequest {
				message: "Dataset id must be non-empty.".to_string(),
			});
		}

		self.components.repository.retrieve(id, caller_token).await
	}

	/// Every facet group the caller may use, independent of any query.
	pub async fn filters(&self, caller_token: Option<&str>) -> Result<Vec<FacetGroup>> {
		let tokens = RequestTokens::new(caller_token, self.components.token_exchange.as_deref());

		facets::aggregate(&self.components.facets, &SearchQuery::default(), &tokens).await
	}

	fn validate(&self, query: &SearchQuery) -> Result<()> {
		if let Some(rows) = query.rows
			&& rows > self.pagination_max_size
		{
			return Err(Error::InvalidRequest {
				message: format!("rows must be at most {}.", self.pagination_max_size),
			});
		}

		Ok(())
	}

	async fn collect_datasets(
		&self,
		query: &SearchQuery,
		tokens: &RequestTokens<'_>,
	) -> Result<(DatasetIdSet, Vec<SearchedDataset>)> {
		let outputs = future::try_join_all(
			self.components
				.collectors
				.iter()
				.map(|collector| collect_one(collector.as_ref(), query, tokens)),
		)
		.await?;
		let reconciled = reconcile::reconcile(outputs);
		let ids: Vec<String> = reconciled.keys().cloned().collect();
		let datasets = match tokens.access(SYSTEM_OF_RECORD).await? {
			Access::Granted(token) => self.components.repository.search(&ids, query, token).await?,
			Access::Denied => Vec::new(),
		};

		tracing::debug!(reconciled = ids.len(), fetched = datasets.len(), "Datasets collected.");

		Ok((reconciled, datasets))
	}
}

async fn collect_one(
	collector: &dyn DatasetIdsCollector,
	query: &SearchQuery,
	tokens: &RequestTokens<'_>,
) -> Result<Option<DatasetIdSet>> {
	let source = collector.source();
	let Access::Granted(token) = tokens.access(source).await? else {
		tracing::debug!(%source, "Collector skipped without a usable token.");

		return Ok(None);
	};
	let output = collector.collect(query, token).await?;

	tracing::debug!(%source, ids = output.as_ref().map(|ids| ids.len()), "Collector finished.");

	Ok(output)
}

fn config_error(err: disco_providers::Error) -> Error {
	Error::Config { message: err.to_string() }
}
