// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Where decision point settings come from.
//!
//! Three sources feed [`crate::load_from_sources`]: the compiled-in
//! defaults, an optional TOML file (by default `/etc/warden/pdp.toml`) and
//! `WARDEN_PDP_*` variables. Each produces a partial [`PdpConfigLayer`];
//! layers are merged in [`Precedence`] order.

use std::path::{Path, PathBuf};

use tracing::{debug, trace};
use warden_pdp_core::Effect;

use crate::error::ConfigError;
use crate::layer::PdpConfigLayer;
use crate::sections::{DecisionConfigLayer, LogFormat, LoggingConfigLayer};

pub const ENV_DEFAULT_MODE: &str = "WARDEN_PDP_DEFAULT_MODE";
pub const ENV_LOG_LEVEL: &str = "WARDEN_PDP_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "WARDEN_PDP_LOG_FORMAT";

/// Merge order of the sources. A later source overrides any field an
/// earlier one set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

/// Something that can produce a partial decision point configuration.
pub trait ConfigSource: Send + Sync {
	/// Label used in load logs.
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<PdpConfigLayer, ConfigError>;
}

/// Contributes an empty layer; the values live in `finalize`.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<PdpConfigLayer, ConfigError> {
		trace!("default decision point settings");
		Ok(PdpConfigLayer::default())
	}
}

/// A `pdp.toml` with optional `[decision]` and `[logging]` tables.
///
/// A missing file contributes nothing. An unreadable or malformed one is an
/// error naming the path.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	/// The host-wide file, `/etc/warden/pdp.toml`.
	pub fn system() -> Self {
		Self::new("/etc/warden/pdp.toml")
	}

	pub fn path(&self) -> &Path {
		&self.path
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"pdp-toml"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<PdpConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "no pdp config file");
			return Ok(PdpConfigLayer::default());
		}

		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;
		let layer: PdpConfigLayer = toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
			path: self.path.clone(),
			source: e,
		})?;

		debug!(
			path = %self.path.display(),
			decision = layer.decision.is_some(),
			logging = layer.logging.is_some(),
			"pdp config file read"
		);
		Ok(layer)
	}
}

/// `WARDEN_PDP_DEFAULT_MODE`, `WARDEN_PDP_LOG_LEVEL` and
/// `WARDEN_PDP_LOG_FORMAT`. Empty variables count as unset.
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<PdpConfigLayer, ConfigError> {
		let layer = PdpConfigLayer {
			decision: Some(load_decision_from_env()?),
			logging: Some(load_logging_from_env()?),
		};
		trace!(?layer, "pdp settings from environment");
		Ok(layer)
	}
}

fn env_var(name: &str) -> Option<String> {
	std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn parse_value<T>(key: &str, value: Option<String>) -> Result<Option<T>, ConfigError>
where
	T: std::str::FromStr<Err = String>,
{
	value
		.map(|v| {
			v.trim().parse().map_err(|message| ConfigError::InvalidValue {
				key: key.to_string(),
				message,
			})
		})
		.transpose()
}

fn load_decision_from_env() -> Result<DecisionConfigLayer, ConfigError> {
	Ok(DecisionConfigLayer {
		default_mode: parse_value::<Effect>(ENV_DEFAULT_MODE, env_var(ENV_DEFAULT_MODE))?,
	})
}

fn load_logging_from_env() -> Result<LoggingConfigLayer, ConfigError> {
	Ok(LoggingConfigLayer {
		level: env_var(ENV_LOG_LEVEL),
		format: parse_value::<LogFormat>(ENV_LOG_FORMAT, env_var(ENV_LOG_FORMAT))?,
	})
}
