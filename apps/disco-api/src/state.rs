use std::sync::Arc;

use disco_service::DiscoveryService;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<DiscoveryService>,
}
impl AppState {
	pub fn new(config: &disco_config::Config) -> color_eyre::Result<Self> {
		let service = DiscoveryService::from_config(config)?;

		Ok(Self::with_service(service))
	}

	pub fn with_service(service: DiscoveryService) -> Self {
		Self { service: Arc::new(service) }
	}
}
