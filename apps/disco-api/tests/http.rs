use axum::{
	Json, Router,
	body::{self, Body},
	extract::{Query, State},
	http::{HeaderMap, Request, StatusCode, header::AUTHORIZATION},
	response::{IntoResponse, Response},
	routing,
};
use serde_json::{Map, Value};
use tower::util::ServiceExt;

use disco_api::{routes, state::AppState};
use disco_config::{BeaconConfig, CkanConfig, Config, KeycloakConfig, Search, SearchCache, Service};
use disco_testkit::{CallLog, FakeBackend};

const PACKAGES: [(&str, &str); 3] =
	[("ds-1", "Cohort one"), ("ds-2", "Cohort two"), ("ds-3", "Cohort three")];

fn test_config(ckan: String, beacon: String, keycloak: String) -> Config {
	Config {
		service: Service { http_bind: "127.0.0.1:0".to_string(), log_level: "info".to_string() },
		ckan: CkanConfig { api_base: ckan, timeout_ms: 2_000, default_headers: Map::new() },
		beacon: Some(BeaconConfig {
			api_base: beacon,
			timeout_ms: 2_000,
			default_headers: Map::new(),
		}),
		keycloak: Some(KeycloakConfig {
			api_base: keycloak,
			realm: "gdi".to_string(),
			idp_alias: "LSAAI".to_string(),
			timeout_ms: 2_000,
			default_headers: Map::new(),
		}),
		search: Search {
			enable_secondary_source: true,
			selected_facet_fields: vec!["theme".to_string(), "organization".to_string()],
			pagination_max_size: 1_000,
			cache: SearchCache { enabled: false, ttl_seconds: 60, max_entries: 16 },
		},
	}
}

fn package(identifier: &str, title: &str) -> Value {
	serde_json::json!({
		"id": format!("uuid-{identifier}"),
		"identifier": identifier,
		"title": title,
		"organization": { "name": "umcg", "title": "UMCG" }
	})
}

async fn package_search(Json(body): Json<Value>) -> Json<Value> {
	let fq = body["fq"].as_str().unwrap_or_default();
	let result = if body.get("facet.field").is_some() {
		serde_json::json!({
			"count": 3,
			"results": [],
			"search_facets": {
				"organization": {
					"title": "Organization",
					"items": [{ "name": "umcg", "display_name": "UMCG", "count": 3 }]
				},
				"theme": {
					"title": "Theme",
					"items": [{ "name": "health", "display_name": "Health", "count": 2 }]
				}
			}
		})
	} else if fq.starts_with("identifier:") {
		let results: Vec<Value> = PACKAGES
			.iter()
			.filter(|(identifier, _)| fq.contains(&format!("\"{identifier}\"")))
			.map(|(identifier, title)| package(identifier, title))
			.collect();

		serde_json::json!({ "count": results.len(), "results": results })
	} else {
		let results: Vec<Value> = PACKAGES
			.iter()
			.map(|(identifier, _)| serde_json::json!({ "identifier": identifier }))
			.collect();

		serde_json::json!({ "count": results.len(), "results": results })
	};

	Json(serde_json::json!({ "success": true, "result": result }))
}

async fn package_show(Query(params): Query<Vec<(String, String)>>) -> Response {
	let id = params.iter().find(|(key, _)| key == "id").map(|(_, value)| value.clone());

	match PACKAGES.iter().find(|(identifier, _)| Some(identifier.to_string()) == id) {
		Some((identifier, title)) => {
			Json(serde_json::json!({ "success": true, "result": package(identifier, title) }))
				.into_response()
		},
		None => StatusCode::NOT_FOUND.into_response(),
	}
}

fn beacon_authorized(headers: &HeaderMap) -> bool {
	headers.get(AUTHORIZATION).and_then(|value| value.to_str().ok()) == Some("Bearer upstream")
}

async fn individuals(
	State(calls): State<CallLog>,
	headers: HeaderMap,
	Json(body): Json<Value>,
) -> Response {
	calls.record(&headers);

	if !beacon_authorized(&headers) {
		return StatusCode::UNAUTHORIZED.into_response();
	}
	if body["query"]["filters"][0]["id"] == "FAIL:1" {
		return (StatusCode::INTERNAL_SERVER_ERROR, "beacon exploded").into_response();
	}

	Json(serde_json::json!({
		"response": {
			"resultSets": [
				{ "id": "ds-2", "setType": "dataset", "resultsCount": 4 },
				{ "id": "ds-3", "setType": "dataset", "resultsCount": 7 },
				{ "id": "ds-9", "setType": "dataset", "resultsCount": 2 }
			]
		}
	}))
	.into_response()
}

async fn filtering_terms(headers: HeaderMap) -> Response {
	if !beacon_authorized(&headers) {
		return StatusCode::UNAUTHORIZED.into_response();
	}

	Json(serde_json::json!({
		"response": {
			"filteringTerms": [
				{
					"type": "ontology",
					"id": "NCIT:C16576",
					"label": "female",
					"scopes": ["individual"]
				}
			],
			"resources": [{ "id": "ncit", "name": "NCI Thesaurus" }]
		}
	}))
	.into_response()
}

async fn broker_token(headers: HeaderMap) -> Response {
	match headers.get(AUTHORIZATION).and_then(|value| value.to_str().ok()) {
		Some("Bearer caller") => {
			Json(serde_json::json!({ "access_token": "upstream" })).into_response()
		},
		_ => StatusCode::UNAUTHORIZED.into_response(),
	}
}

struct Backends {
	ckan: FakeBackend,
	beacon: FakeBackend,
	keycloak: FakeBackend,
	individuals_calls: CallLog,
}
impl Backends {
	async fn spawn() -> Self {
		let ckan = Router::new()
			.route("/api/3/action/package_search", routing::post(package_search))
			.route("/api/3/action/package_show", routing::get(package_show));
		let individuals_calls = CallLog::default();
		let beacon = Router::new()
			.route("/api/individuals", routing::post(individuals))
			.route("/api/filtering_terms", routing::get(filtering_terms))
			.with_state(individuals_calls.clone());
		let keycloak =
			Router::new().route("/realms/gdi/broker/LSAAI/token", routing::get(broker_token));

		Self {
			ckan: FakeBackend::spawn(ckan).await.expect("Failed to spawn CKAN backend."),
			beacon: FakeBackend::spawn(beacon).await.expect("Failed to spawn Beacon backend."),
			keycloak: FakeBackend::spawn(keycloak).await.expect("Failed to spawn Keycloak backend."),
			individuals_calls,
		}
	}

	fn app(&self) -> Router {
		let config =
			test_config(self.ckan.base_url(), self.beacon.base_url(), self.keycloak.base_url());
		let state = AppState::new(&config).expect("Failed to initialize app state.");

		routes::router(state)
	}
}

async fn call(app: Router, request: Request<Body>) -> (StatusCode, Value) {
	let response = app.oneshot(request).await.expect("Failed to call router.");
	let status = response.status();
	let body = body::to_bytes(response.into_body(), usize::MAX)
		.await
		.expect("Failed to read response body.");
	let json = if body.is_empty() {
		Value::Null
	} else {
		serde_json::from_slice(&body).expect("Failed to parse response.")
	};

	(status, json)
}

fn search_request(payload: Value, token: Option<&str>) -> Request<Body> {
	let mut builder = Request::builder()
		.method("POST")
		.uri("/api/v1/datasets/search")
		.header("content-type", "application/json");

	if let Some(token) = token {
		builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
	}

	builder.body(Body::from(payload.to_string())).expect("Failed to build request.")
}

fn group_keys(json: &Value) -> Vec<String> {
	json["facetGroups"]
		.as_array()
		.expect("facetGroups missing")
		.iter()
		.map(|group| group["key"].as_str().unwrap_or_default().to_string())
		.collect()
}

fn beacon_payload(filter: &str) -> Value {
	serde_json::json!({
		"query": "cohort",
		"facets": [
			{ "facetGroup": "ckan", "facet": "theme", "value": "health" },
			{ "facetGroup": "beacon", "facet": "ncit", "value": filter }
		],
		"operator": "AND",
		"rows": 10
	})
}

#[tokio::test]
async fn health_ok() {
	let backends = Backends::spawn().await;
	let (status, _) = call(
		backends.app(),
		Request::builder().uri("/health").body(Body::empty()).expect("Failed to build request."),
	)
	.await;

	assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn search_reconciles_catalogue_and_beacon() {
	let backends = Backends::spawn().await;
	let (status, json) =
		call(backends.app(), search_request(beacon_payload("NCIT:C16576"), Some("caller"))).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(backends.individuals_calls.calls(), 1);
	assert_eq!(json["count"], 2);
	assert_eq!(json["results"][0]["identifier"], "ds-2");
	assert_eq!(json["results"][0]["recordsCount"], 4);
	assert_eq!(json["results"][1]["identifier"], "ds-3");
	assert_eq!(json["results"][1]["recordsCount"], 7);
	assert_eq!(json["results"][0]["catalogue"], "UMCG");
	assert_eq!(group_keys(&json), vec!["ckan", "beacon"]);
	assert_eq!(json["facetGroups"][0]["facets"][0]["key"], "theme");
	assert_eq!(json["facetGroups"][1]["facets"][0]["label"], "NCI Thesaurus");
}

#[tokio::test]
async fn entitled_search_without_beacon_filters_skips_beacon() {
	let backends = Backends::spawn().await;
	let payload = serde_json::json!({
		"query": "cohort",
		"facets": [{ "facetGroup": "ckan", "facet": "theme", "value": "health" }],
		"rows": 10
	});
	let (status, json) = call(backends.app(), search_request(payload, Some("caller"))).await;
	let identifiers: Vec<_> = json["results"]
		.as_array()
		.expect("results must be an array")
		.iter()
		.map(|dataset| dataset["identifier"].as_str().unwrap_or_default())
		.collect();

	assert_eq!(status, StatusCode::OK);
	assert_eq!(backends.individuals_calls.calls(), 0);
	assert_eq!(json["count"], 3);
	assert_eq!(identifiers, vec!["ds-1", "ds-2", "ds-3"]);
	assert!(json["results"][0]["recordsCount"].is_null());
}

#[tokio::test]
async fn anonymous_search_uses_catalogue_only() {
	let backends = Backends::spawn().await;
	let (status, json) =
		call(backends.app(), search_request(beacon_payload("NCIT:C16576"), None)).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["count"], 3);
	assert!(json["results"][0]["recordsCount"].is_null());
	assert_eq!(group_keys(&json), vec!["ckan"]);
}

#[tokio::test]
async fn rejected_exchange_degrades_to_catalogue_only() {
	let backends = Backends::spawn().await;
	let (status, json) =
		call(backends.app(), search_request(beacon_payload("NCIT:C16576"), Some("stranger")))
			.await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["count"], 3);
	assert_eq!(group_keys(&json), vec!["ckan"]);
}

#[tokio::test]
async fn failing_beacon_fails_the_search() {
	let backends = Backends::spawn().await;
	let (status, json) =
		call(backends.app(), search_request(beacon_payload("FAIL:1"), Some("caller"))).await;

	assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
	assert_eq!(json["error_code"], "internal_error");
}

#[tokio::test]
async fn oversized_page_is_a_bad_request() {
	let backends = Backends::spawn().await;
	let payload = serde_json::json!({ "rows": 5_000 });
	let (status, json) = call(backends.app(), search_request(payload, None)).await;

	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(json["error_code"], "invalid_request");
}

#[tokio::test]
async fn retrieve_returns_dataset_or_not_found() {
	let backends = Backends::spawn().await;
	let app = backends.app();
	let (status, json) = call(
		app.clone(),
		Request::builder()
			.uri("/api/v1/datasets/ds-1")
			.body(Body::empty())
			.expect("Failed to build request."),
	)
	.await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["identifier"], "ds-1");
	assert_eq!(json["title"], "Cohort one");

	let (status, json) = call(
		app,
		Request::builder()
			.uri("/api/v1/datasets/missing")
			.body(Body::empty())
			.expect("Failed to build request."),
	)
	.await;

	assert_eq!(status, StatusCode::NOT_FOUND);
	assert_eq!(json["error_code"], "not_found");
}

#[tokio::test]
async fn filters_list_every_permitted_group() {
	let backends = Backends::spawn().await;
	let (status, json) = call(
		backends.app(),
		Request::builder()
			.uri("/api/v1/filters")
			.header(AUTHORIZATION, "Bearer caller")
			.body(Body::empty())
			.expect("Failed to build request."),
	)
	.await;
	let keys: Vec<_> = json
		.as_array()
		.expect("filters must be an array")
		.iter()
		.map(|group| group["key"].as_str().unwrap_or_default())
		.collect();

	assert_eq!(status, StatusCode::OK);
	assert_eq!(keys, vec!["ckan", "beacon"]);
}
