pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Reqwest(#[from] reqwest::Error),
	#[error(transparent)]
	SerdeJson(#[from] serde_json::Error),
	#[error(transparent)]
	InvalidHeaderName(#[from] reqwest::header::InvalidHeaderName),
	#[error(transparent)]
	InvalidHeaderValue(#[from] reqwest::header::InvalidHeaderValue),
	#[error("{message}")]
	InvalidConfig { message: String },
	#[error("{message}")]
	InvalidResponse { message: String },
	#[error("Request to {url} failed with status {status}: {body}")]
	Status { status: u16, url: String, body: String },
	#[error("Resource at {url} was not found.")]
	NotFound { url: String },
}
impl Error {
	/// HTTP status reported by the backend, when the failure carried one.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Status { status, .. } => Some(*status),
			Self::NotFound { .. } => Some(404),
			Self::Reqwest(err) => err.status().map(|status| status.as_u16()),
			_ => None,
		}
	}
}
