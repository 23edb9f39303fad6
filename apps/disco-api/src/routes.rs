use axum::{
	Json, Router,
	extract::{Path, State},
	http::{HeaderMap, StatusCode, header::AUTHORIZATION},
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::Serialize;

use crate::state::AppState;
use disco_domain::{FacetGroup, RetrievedDataset, SearchQuery, SearchResponse};
use disco_service::Error;

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/api/v1/datasets/search", post(search))
		.route("/api/v1/datasets/{id}", get(retrieve))
		.route("/api/v1/filters", get(filters))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn search(
	State(state): State<AppState>,
	headers: HeaderMap,
	Json(query): Json<SearchQuery>,
) -> Result<Json<SearchResponse>, ApiError> {
	let token = caller_token(&headers);
	let response = state.service.search(&query, token.as_deref()).await?;

	Ok(Json(response))
}

async fn retrieve(
	State(state): State<AppState>,
	headers: HeaderMap,
	Path(id): Path<String>,
) -> Result<Json<RetrievedDataset>, ApiError> {
	let token = caller_token(&headers);
	let dataset = state.service.retrieve(&id, token.as_deref()).await?;

	Ok(Json(dataset))
}

async fn filters(
	State(state): State<AppState>,
	headers: HeaderMap,
) -> Result<Json<Vec<FacetGroup>>, ApiError> {
	let token = caller_token(&headers);
	let groups = state.service.filters(token.as_deref()).await?;

	Ok(Json(groups))
}

/// Raw access token from an `Authorization: Bearer` header. Other schemes count as anonymous.
pub fn caller_token(headers: &HeaderMap) -> Option<String> {
	let raw = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
	let (scheme, token) = raw.split_once(' ')?;
	let token = token.trim();

	(scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then(|| token.to_string())
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
}
impl ApiError {
	fn new(status: StatusCode, error_code: impl Into<String>, message: impl Into<String>) -> Self {
		Self { status, error_code: error_code.into(), message: message.into() }
	}
}
impl From<Error> for ApiError {
	fn from(err: Error) -> Self {
		match err {
			Error::InvalidRequest { message } => {
				Self::new(StatusCode::BAD_REQUEST, "invalid_request", message)
			},
			Error::NotFound { message } => Self::new(StatusCode::NOT_FOUND, "not_found", message),
			err => {
				tracing::error!(error = %err, "Request failed.");

				Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "Internal error.")
			},
		}
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code, message: self.message };

		(self.status, Json(body)).into_response()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn headers(value: &str) -> HeaderMap {
		let mut headers = HeaderMap::new();

		headers.insert(AUTHORIZATION, value.parse().expect("invalid header"));

		headers
	}

	#[test]
	fn extracts_bearer_tokens_only() {
		assert_eq!(caller_token(&headers("Bearer abc")), Some("abc".to_string()));
		assert_eq!(caller_token(&headers("bearer  abc ")), Some("abc".to_string()));
		assert_eq!(caller_token(&headers("Basic abc")), None);
		assert_eq!(caller_token(&headers("Bearer ")), None);
		assert_eq!(caller_token(&HeaderMap::new()), None);
	}
}
