//! Token exchange for the token-gated source and per-request token resolution.

use tokio::sync::OnceCell;

use crate::{BoxFuture, Error, Result, Source, TokenExchange};
use disco_providers::keycloak::KeycloakClient;

/// Exchange rejections meaning the caller is simply not entitled to the gated source.
const NOT_ENTITLED_STATUSES: [u16; 3] = [400, 401, 403];

/// Exchanges caller tokens at the identity broker. Callers the broker rejects lose access to the
/// gated source for the request instead of failing it.
pub struct TokenBridge {
	client: KeycloakClient,
}
impl TokenBridge {
	pub fn new(client: KeycloakClient) -> Self {
		Self { client }
	}

	async fn exchange_inner(&self, caller_token: Option<&str>) -> Result<Option<String>> {
		let Some(caller_token) = caller_token else {
			return Ok(None);
		};

		match self.client.retrieve_idp_token(caller_token).await {
			Ok(token) => Ok(Some(disco_providers::bearer(&token))),
			Err(err) if is_not_entitled(&err) => {
				tracing::info!(
					source = %Source::Beacon,
					status = err.status(),
					"Skipping beacon because the caller token could not be exchanged."
				);
				tracing::warn!(error = %err, "Token exchange was rejected.");

				Ok(None)
			},
			Err(err) => Err(Error::TokenExchange { message: err.to_string() }),
		}
	}
}
impl TokenExchange for TokenBridge {
	fn exchange<'a>(
		&'a self,
		caller_token: Option<&'a str>,
	) -> BoxFuture<'a, Result<Option<String>>> {
		Box::pin(self.exchange_inner(caller_token))
	}
}

fn is_not_entitled(err: &disco_providers::Error) -> bool {
	err.status().is_some_and(|status| NOT_ENTITLED_STATUSES.contains(&status))
}

/// Whether a component may run, and with which token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access<'a> {
	Granted(Option<&'a str>),
	Denied,
}

/// Tokens of one request. The exchange runs at most once, on first use by a gated component.
pub struct RequestTokens<'a> {
	caller: Option<&'a str>,
	exchange: Option<&'a dyn TokenExchange>,
	exchanged: OnceCell<Option<String>>,
}
impl<'a> RequestTokens<'a> {
	pub fn new(caller: Option<&'a str>, exchange: Option<&'a dyn TokenExchange>) -> Self {
		Self { caller, exchange, exchanged: OnceCell::new() }
	}

	pub async fn access(&self, source: Source) -> Result<Access<'_>> {
		if !source.requires_token() {
			return Ok(Access::Granted(self.caller));
		}

		let Some(exchange) = self.exchange else {
			return Ok(Access::Denied);
		};
		let exchanged =
			self.exchanged.get_or_try_init(|| exchange.exchange(self.caller)).await?;

		Ok(match exchanged.as_deref() {
			Some(token) => Access::Granted(Some(token)),
			None => Access::Denied,
		})
	}
}
