// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Policies, rules and effects.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::expression::Expression;

/// The outcome a rule applies when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Effect {
	Permit,
	Deny,
}

impl fmt::Display for Effect {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Effect::Permit => write!(f, "Permit"),
			Effect::Deny => write!(f, "Deny"),
		}
	}
}

impl std::str::FromStr for Effect {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"Permit" | "permit" | "PERMIT" => Ok(Effect::Permit),
			"Deny" | "deny" | "DENY" => Ok(Effect::Deny),
			other => Err(format!("unknown effect '{other}'")),
		}
	}
}

/// A single authorization rule inside a [`Policy`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
	pub rule_id: String,
	/// Resource patterns this rule applies to. `None` means the rule applies
	/// to every target of its policy.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub targets: Option<Vec<String>>,
	/// Actions this rule covers. Empty defers to the policy's actions.
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub actions: Vec<String>,
	pub effect: Effect,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub condition: Option<Expression>,
}

impl Rule {
	pub fn new(rule_id: impl Into<String>, effect: Effect) -> Self {
		Self {
			rule_id: rule_id.into(),
			targets: None,
			actions: Vec::new(),
			effect,
			condition: None,
		}
	}

	pub fn permit(rule_id: impl Into<String>) -> Self {
		Self::new(rule_id, Effect::Permit)
	}

	pub fn deny(rule_id: impl Into<String>) -> Self {
		Self::new(rule_id, Effect::Deny)
	}

	/// Adds a resource pattern to this rule's own target list.
	pub fn with_target(mut self, pattern: impl Into<String>) -> Self {
		self.targets.get_or_insert_with(Vec::new).push(pattern.into());
		self
	}

	pub fn with_action(mut self, action: impl Into<String>) -> Self {
		self.actions.push(action.into());
		self
	}

	pub fn with_condition(mut self, condition: Expression) -> Self {
		self.condition = Some(condition);
		self
	}

	/// The rule's own resource patterns, trimmed and de-duplicated in order.
	///
	/// Returns `None` when the rule declares no targets.
	pub fn target_resources(&self) -> Option<Vec<&str>> {
		self.targets.as_deref().map(normalize_targets)
	}
}

/// A policy: an ordered list of target patterns and the rules guarded by them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
	pub policy_id: String,
	#[serde(default)]
	pub targets: Vec<String>,
	/// Actions every rule covers unless it lists its own. Empty means any.
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub actions: Vec<String>,
	#[serde(default)]
	pub rules: Vec<Rule>,
}

impl Policy {
	pub fn new(policy_id: impl Into<String>) -> Self {
		Self {
			policy_id: policy_id.into(),
			targets: Vec::new(),
			actions: Vec::new(),
			rules: Vec::new(),
		}
	}

	pub fn with_target(mut self, pattern: impl Into<String>) -> Self {
		self.targets.push(pattern.into());
		self
	}

	pub fn with_action(mut self, action: impl Into<String>) -> Self {
		self.actions.push(action.into());
		self
	}

	pub fn with_rule(mut self, rule: Rule) -> Self {
		self.rules.push(rule);
		self
	}

	/// The policy's resource patterns, trimmed and de-duplicated in order.
	pub fn target_resources(&self) -> Vec<&str> {
		normalize_targets(&self.targets)
	}

	/// Whether `rule` covers the requested action.
	///
	/// The rule's own actions apply when it lists any, otherwise the
	/// policy's. When neither lists actions every request is covered. A
	/// request naming no action is covered only in that last case.
	pub fn permits_action(&self, rule: &Rule, action: Option<&str>) -> bool {
		let actions = if rule.actions.is_empty() {
			&self.actions
		} else {
			&rule.actions
		};
		if actions.is_empty() {
			return true;
		}
		action.is_some_and(|action| actions.iter().any(|a| a == action))
	}

	/// Function ids used anywhere in this policy that the engine does not know.
	pub fn unrecognized_functions(&self) -> Vec<&str> {
		self
			.rules
			.iter()
			.filter_map(|rule| rule.condition.as_ref())
			.flat_map(Expression::unrecognized_functions)
			.collect()
	}
}

fn normalize_targets(targets: &[String]) -> Vec<&str> {
	let mut resources: Vec<&str> = Vec::with_capacity(targets.len());
	for target in targets {
		let target = target.trim();
		if !resources.contains(&target) {
			resources.push(target);
		}
	}
	resources
}

/// A set of policies keyed by the service they protect.
///
/// This is the on-disk shape (JSON or TOML) accepted by the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDocument {
	#[serde(default)]
	pub services: BTreeMap<String, Vec<Policy>>,
}

impl PolicyDocument {
	pub fn policy_count(&self) -> usize {
		self.services.values().map(Vec::len).sum()
	}
}
