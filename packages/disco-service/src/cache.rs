//! Facet group caching in front of the per-source facet builders.

use std::{
	collections::HashMap,
	sync::{Arc, Mutex},
	time::{Duration, Instant},
};

use crate::{BoxFuture, FacetsBuilder, Result, Source};
use disco_domain::{FacetGroup, SearchQuery};

/// Get-or-compute storage bound by a time to live.
pub trait Cache<V>
where
	Self: Send + Sync,
{
	fn get(&self, key: &str) -> Option<V>;

	fn put(&self, key: String, value: V);
}

/// In-process TTL map. When full, expired entries are dropped first, then the oldest entry.
pub struct MemoryCache<V> {
	ttl: Duration,
	max_entries: usize,
	entries: Mutex<HashMap<String, (Instant, V)>>,
}
impl<V> MemoryCache<V> {
	pub fn new(ttl: Duration, max_entries: usize) -> Self {
		Self { ttl, max_entries, entries: Mutex::new(HashMap::new()) }
	}

	pub fn len(&self) -> usize {
		self.entries.lock().unwrap_or_else(|err| err.into_inner()).len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}
impl<V> Cache<V> for MemoryCache<V>
where
	V: Clone + Send,
{
	fn get(&self, key: &str) -> Option<V> {
		let mut entries = self.entries.lock().unwrap_or_else(|err| err.into_inner());
		let (stored_at, value) = entries.get(key)?;

		if stored_at.elapsed() < self.ttl {
			return Some(value.clone());
		}

		entries.remove(key);

		None
	}

	fn put(&self, key: String, value: V) {
		if self.max_entries == 0 {
			return;
		}

		let mut entries = self.entries.lock().unwrap_or_else(|err| err.into_inner());

		if !entries.contains_key(&key) && entries.len() >= self.max_entries {
			let ttl = self.ttl;

			entries.retain(|_, (stored_at, _)| stored_at.elapsed() < ttl);

			if entries.len() >= self.max_entries
				&& let Some(oldest) = entries
					.iter()
					.min_by_key(|(_, (stored_at, _))| *stored_at)
					.map(|(key, _)| key.clone())
			{
				entries.remove(&oldest);
			}
		}

		entries.insert(key, (Instant::now(), value));
	}
}

/// Hex BLAKE3 digest identifying the facets one source shows to one token.
pub fn cache_key(source: Source, token: Option<&str>) -> String {
	let mut hasher = blake3::Hasher::new();

	hasher.update(b"facets\0");
	hasher.update(source.as_str().as_bytes());

	if let Some(token) = token {
		hasher.update(b"\0");
		hasher.update(token.as_bytes());
	}

	hasher.finalize().to_hex().to_string()
}

pub fn cache_key_prefix(key: &str) -> &str {
	let len = key.len().min(12);

	&key[..len]
}

/// Serves facet groups from a cache. Groups do not depend on the query, only on the token.
pub struct CachedFacetsBuilder {
	inner: Arc<dyn FacetsBuilder>,
	cache: Arc<dyn Cache<FacetGroup>>,
}
impl CachedFacetsBuilder {
	pub fn new(inner: Arc<dyn FacetsBuilder>, cache: Arc<dyn Cache<FacetGroup>>) -> Self {
		Self { inner, cache }
	}

	async fn build_inner(
		&self,
		query: &SearchQuery,
		token: Option<&str>,
	) -> Result<Option<FacetGroup>> {
		let source = self.inner.source();
		let key = cache_key(source, token);

		if let Some(group) = self.cache.get(&key) {
			tracing::debug!(
				%source,
				cache_key_prefix = cache_key_prefix(&key),
				hit = true,
				"Cache hit."
			);

			return Ok(Some(group));
		}

		tracing::debug!(%source, cache_key_prefix = cache_key_prefix(&key), hit = false, "Cache miss.");

		let group = self.inner.build(query, token).await?;

		if let Some(group) = group.as_ref() {
			self.cache.put(key, group.clone());
		}

		Ok(group)
	}
}
impl FacetsBuilder for CachedFacetsBuilder {
	fn source(&self) -> Source {
		self.inner.source()
	}

	fn build<'a>(
		&'a self,
		query: &'a SearchQuery,
		token: Option<&'a str>,
	) -> BoxFuture<'a, Result<Option<FacetGroup>>> {
		Box::pin(self.build_inner(query, token))
	}
}
