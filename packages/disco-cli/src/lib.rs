//! Command-line pieces shared by the discovery binaries.

use std::path::PathBuf;

use clap::{
	Args,
	builder::{
		Styles,
		styling::{AnsiColor, Effects},
	},
};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const ABOUT: &str = env!("CARGO_PKG_DESCRIPTION");

/// Location of the TOML configuration file.
#[derive(Debug, Clone, Args)]
pub struct ConfigArgs {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
}

pub fn styles() -> Styles {
	Styles::styled()
		.header(AnsiColor::Cyan.on_default() | Effects::BOLD)
		.usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
		.literal(AnsiColor::Yellow.on_default() | Effects::BOLD)
		.placeholder(AnsiColor::Green.on_default())
		.error(AnsiColor::Red.on_default() | Effects::BOLD)
}
