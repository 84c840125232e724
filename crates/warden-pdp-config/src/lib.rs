// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration management for the Warden decision point.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - Consistent environment variable naming (`WARDEN_PDP_*`)
//!
//! # Usage
//!
//! ```ignore
//! use warden_pdp_config::load_config;
//!
//! let config = load_config()?;
//! println!("default mode {}", config.decision.default_mode);
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::PdpConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use tracing::{debug, info};

/// Fully resolved decision point configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PdpConfig {
	pub decision: DecisionConfig,
	pub logging: LoggingConfig,
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`WARDEN_PDP_*`)
/// 2. Config file (`/etc/warden/pdp.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<PdpConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<PdpConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

/// Merge the given sources in precedence order and finalize the result.
pub fn load_from_sources(mut sources: Vec<Box<dyn ConfigSource>>) -> Result<PdpConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = PdpConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	Ok(finalize(merged))
}

/// Finalize configuration layer into resolved config.
fn finalize(layer: PdpConfigLayer) -> PdpConfig {
	let decision = layer.decision.unwrap_or_default().finalize();
	let logging = layer.logging.unwrap_or_default().finalize();

	info!(
		default_mode = %decision.default_mode,
		log_level = %logging.level,
		log_format = %logging.format,
		"Decision point configuration loaded"
	);

	PdpConfig { decision, logging }
}
