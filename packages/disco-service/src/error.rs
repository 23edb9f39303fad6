use crate::Source;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Token exchange failed: {message}")]
	TokenExchange { message: String },
	#[error("Source {source_name} failed: {message}")]
	Source { source_name: &'static str, message: String },
	#[error("Configuration error: {message}")]
	Config { message: String },
}
impl Error {
	pub(crate) fn provider(source: Source, err: disco_providers::Error) -> Self {
		Self::Source { source_name: source.as_str(), message: err.to_string() }
	}
}
