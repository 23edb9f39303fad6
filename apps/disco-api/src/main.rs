use clap::Parser;

use disco_api::Args;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	disco_api::run(Args::parse()).await
}
