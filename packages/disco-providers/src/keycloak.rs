//! Keycloak identity-provider broker: exchanges a caller token for the upstream provider token.

use reqwest::{Client, header::ACCEPT};
use serde::Deserialize;

use crate::{Error, Result};
use disco_config::KeycloakConfig;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeycloakTokenResponse {
	#[serde(default)]
	pub access_token: Option<String>,
	#[serde(default)]
	pub token_type: Option<String>,
	#[serde(default)]
	pub expires_in: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct KeycloakClient {
	client: Client,
	token_url: String,
}
impl KeycloakClient {
	pub fn new(cfg: &KeycloakConfig) -> Result<Self> {
		let client = crate::build_client(cfg.timeout_ms, &cfg.default_headers)?;
		let token_url =
			format!("{}/realms/{}/broker/{}/token", cfg.api_base, cfg.realm, cfg.idp_alias);

		Ok(Self { client, token_url })
	}

	/// Returns the raw upstream access token. Rejections keep their HTTP status in the error.
	pub async fn retrieve_idp_token(&self, caller_token: &str) -> Result<String> {
		let authorization = crate::bearer(caller_token);
		let res: KeycloakTokenResponse = crate::send_json(
			self.client
				.get(&self.token_url)
				.header(ACCEPT, "application/json")
				.headers(crate::auth_headers(Some(&authorization))?),
		)
		.await?;

		parse_access_token(res)
	}
}

fn parse_access_token(res: KeycloakTokenResponse) -> Result<String> {
	res.access_token.filter(|token| !token.trim().is_empty()).ok_or_else(|| {
		Error::InvalidResponse { message: "Token response is missing access_token.".to_string() }
	})
}
