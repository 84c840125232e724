// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Policy document and principal attribute loading.

use std::path::Path;

use anyhow::{bail, Context, Result};
use warden_pdp_core::{PolicyDocument, SessionPrincipal};

/// Reads a policy document. Files ending in `.toml` are parsed as TOML,
/// everything else as JSON.
pub fn load_document(path: &Path) -> Result<PolicyDocument> {
	let content = std::fs::read_to_string(path)
		.with_context(|| format!("failed to read policy document {}", path.display()))?;

	let is_toml = path
		.extension()
		.is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

	if is_toml {
		toml::from_str(&content)
			.with_context(|| format!("failed to parse TOML policy document {}", path.display()))
	} else {
		serde_json::from_str(&content)
			.with_context(|| format!("failed to parse JSON policy document {}", path.display()))
	}
}

/// Builds a principal from repeated `name=value` pairs. Repeating a name adds
/// another value to that attribute.
pub fn principal_from_attrs(name: &str, attrs: &[String]) -> Result<SessionPrincipal> {
	let mut principal = SessionPrincipal::new(name, format!("cli-{name}"));
	for attr in attrs {
		let Some((id, value)) = attr.split_once('=') else {
			bail!("invalid attribute '{attr}', expected NAME=VALUE");
		};
		let id = id.trim();
		if id.is_empty() {
			bail!("invalid attribute '{attr}', name is empty");
		}
		principal.add_values(id, [value]);
	}
	Ok(principal)
}
