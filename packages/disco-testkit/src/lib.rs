//! Fake HTTP backends for integration tests.

mod error;

pub use error::{Error, Result};

use std::{
	net::SocketAddr,
	sync::{
		Arc, Mutex,
		atomic::{AtomicUsize, Ordering},
	},
};

use axum::{Router, http::HeaderMap};
use tokio::{
	net::TcpListener,
	sync::oneshot::{self, Sender},
};

/// An axum router served on an ephemeral loopback port. The server shuts down when dropped.
pub struct FakeBackend {
	addr: SocketAddr,
	shutdown: Option<Sender<()>>,
}
impl FakeBackend {
	pub async fn spawn(app: Router) -> Result<Self> {
		let listener = TcpListener::bind("127.0.0.1:0").await?;
		let addr = listener.local_addr()?;
		let (tx, rx) = oneshot::channel();
		let server = axum::serve(listener, app).with_graceful_shutdown(async move {
			let _ = rx.await;
		});

		tokio::spawn(async move {
			let _ = server.into_future().await;
		});

		Ok(Self { addr, shutdown: Some(tx) })
	}

	pub fn base_url(&self) -> String {
		format!("http://{}", self.addr)
	}
}
impl Drop for FakeBackend {
	fn drop(&mut self) {
		if let Some(tx) = self.shutdown.take() {
			let _ = tx.send(());
		}
	}
}

/// Counts calls to a fake endpoint and remembers the `Authorization` header of each.
#[derive(Clone, Debug, Default)]
pub struct CallLog {
	calls: Arc<AtomicUsize>,
	authorizations: Arc<Mutex<Vec<Option<String>>>>,
}
impl CallLog {
	pub fn record(&self, headers: &HeaderMap) {
		let authorization = headers
			.get(axum::http::header::AUTHORIZATION)
			.and_then(|value| value.to_str().ok())
			.map(str::to_string);

		self.calls.fetch_add(1, Ordering::SeqCst);
		self.authorizations.lock().unwrap_or_else(|err| err.into_inner()).push(authorization);
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}

	pub fn authorizations(&self) -> Vec<Option<String>> {
		self.authorizations.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}
}
