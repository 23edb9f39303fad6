pub mod beacon;
pub mod ckan;
pub mod keycloak;

mod error;

pub use error::{Error, Result};

use std::time::Duration;

use reqwest::{
	Client, RequestBuilder, StatusCode,
	header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue},
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

const MAX_ERROR_BODY_CHARS: usize = 512;

/// Formats a raw access token as an `Authorization` header value.
pub fn bearer(token: &str) -> String {
	format!("Bearer {token}")
}

pub fn default_headers(default_headers: &Map<String, Value>) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();

	for (key, value) in default_headers {
		let Some(raw) = value.as_str() else {
			return Err(Error::InvalidConfig {
				message: "Default header values must be strings.".to_string(),
			});
		};

		headers.insert(HeaderName::from_bytes(key.as_bytes())?, raw.parse()?);
	}

	Ok(headers)
}

/// `Authorization` header carrying an already formatted value, or no header at all.
pub fn auth_headers(authorization: Option<&str>) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();

	if let Some(authorization) = authorization {
		let mut value: HeaderValue = authorization.parse()?;

		value.set_sensitive(true);
		headers.insert(AUTHORIZATION, value);
	}

	Ok(headers)
}

pub(crate) fn build_client(timeout_ms: u64, headers: &Map<String, Value>) -> Result<Client> {
	let client = Client::builder()
		.timeout(Duration::from_millis(timeout_ms))
		.default_headers(default_headers(headers)?)
		.build()?;

	Ok(client)
}

/// Sends the request and decodes a JSON body, mapping 404 and other non-success statuses to
/// typed errors that keep the status code.
pub(crate) async fn send_json<T>(request: RequestBuilder) -> Result<T>
where
	T: DeserializeOwned,
{
	let res = request.send().await?;
	let status = res.status();
	let url = res.url().to_string();

	if status == StatusCode::NOT_FOUND {
		return Err(Error::NotFound { url });
	}
	if !status.is_success() {
		let body = res.text().await.unwrap_or_default();
		let body: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();

		return Err(Error::Status { status: status.as_u16(), url, body });
	}

	let bytes = res.bytes().await?;

	Ok(serde_json::from_slice(&bytes)?)
}

pub(crate) mod lenient {
	use serde::{Deserialize, Deserializer};

	/// Treats an explicit `null` like a missing field.
	pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
	where
		D: Deserializer<'de>,
		T: Default + Deserialize<'de>,
	{
		Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
	}
}
