// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Decision configuration section.

use serde::{Deserialize, Serialize};
use warden_pdp_core::Effect;

fn default_mode() -> Effect {
	Effect::Deny
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DecisionConfigLayer {
	/// Effect applied when no rule decides a query.
	pub default_mode: Option<Effect>,
}

impl DecisionConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.default_mode.is_some() {
			self.default_mode = other.default_mode;
		}
	}

	pub fn finalize(self) -> DecisionConfig {
		DecisionConfig {
			default_mode: self.default_mode.unwrap_or_else(default_mode),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DecisionConfig {
	/// As configured. The decision point resolves this before use.
	pub default_mode: Effect,
}

impl Default for DecisionConfig {
	fn default() -> Self {
		Self {
			default_mode: default_mode(),
		}
	}
}
