// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The per-query audit trail.
//!
//! An [`AuditTrail`] records which policies and rules were visited while a
//! query was matched, and which (policy target, rule target) pairs fired.
//! Permit matches accumulate; a Deny replaces everything recorded so far with
//! its own pair via [`AuditTrail::truncate_to_deny`].

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

/// A policy target pattern and the rule target pattern that fired under it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetMatch {
	pub policy_target: String,
	pub rule_target: String,
}

/// Rule targets grouped under the policy target they fired beneath.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupTarget {
	pub policy_target: String,
	pub rule_targets: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditTrail {
	processed_policy_ids: Vec<String>,
	processed_rule_ids: Vec<String>,
	rules_by_policy: Vec<(String, Vec<String>)>,
	matched_targets: Vec<TargetMatch>,
}

impl AuditTrail {
	pub fn new() -> Self {
		Self::default()
	}

	/// Records that a policy was visited.
	pub fn record_policy(&mut self, policy_id: &str) {
		self.processed_policy_ids.push(policy_id.to_string());
		self
			.rules_by_policy
			.push((policy_id.to_string(), Vec::new()));
	}

	/// Records that a rule's target matched and its condition was evaluated.
	/// The rule is attributed to the most recently recorded policy.
	pub fn record_rule(&mut self, rule_id: &str) {
		self.processed_rule_ids.push(rule_id.to_string());
		if let Some((_, rules)) = self.rules_by_policy.last_mut() {
			rules.push(rule_id.to_string());
		}
	}

	/// Appends the target pair of a firing Permit rule.
	pub fn record_permit(&mut self, policy_target: &str, rule_target: &str) {
		self.matched_targets.push(TargetMatch {
			policy_target: policy_target.to_string(),
			rule_target: rule_target.to_string(),
		});
	}

	/// Discards every recorded target pair and keeps only the Deny's.
	pub fn truncate_to_deny(&mut self, policy_target: &str, rule_target: &str) {
		self.matched_targets.clear();
		self.record_permit(policy_target, rule_target);
	}

	pub fn processed_policy_ids(&self) -> &[String] {
		&self.processed_policy_ids
	}

	pub fn processed_rule_ids(&self) -> &[String] {
		&self.processed_rule_ids
	}

	pub fn matched_targets(&self) -> &[TargetMatch] {
		&self.matched_targets
	}

	pub fn current_policy(&self) -> Option<&str> {
		self.processed_policy_ids.last().map(String::as_str)
	}

	pub fn current_rule(&self) -> Option<&str> {
		self.processed_rule_ids.last().map(String::as_str)
	}

	/// True when no rule was processed and no target pair was recorded.
	/// Visited policy ids are not considered.
	pub fn is_empty(&self) -> bool {
		self.processed_rule_ids.is_empty() && self.matched_targets.is_empty()
	}

	/// Matched rule targets grouped by policy target, first-seen order, with
	/// duplicate rule targets removed.
	pub fn group_targets(&self) -> Vec<GroupTarget> {
		let mut groups: Vec<GroupTarget> = Vec::new();
		for m in &self.matched_targets {
			let index = match groups
				.iter()
				.position(|g| g.policy_target == m.policy_target)
			{
				Some(index) => index,
				None => {
					groups.push(GroupTarget {
						policy_target: m.policy_target.clone(),
						rule_targets: Vec::new(),
					});
					groups.len() - 1
				}
			};
			let group = &mut groups[index];
			if !group.rule_targets.contains(&m.rule_target) {
				group.rule_targets.push(m.rule_target.clone());
			}
		}
		groups
	}

	/// Renders visited policies with their processed rules, e.g.
	/// `{Policy : P1 : Rules [R1,R2]}{Policy : P2}`.
	pub fn policy_summary(&self) -> String {
		let mut summary = String::new();
		for (policy, rules) in &self.rules_by_policy {
			let _ = write!(summary, "{{Policy : {policy}");
			if !rules.is_empty() {
				let _ = write!(summary, " : Rules [{}]", rules.join(","));
			}
			summary.push('}');
		}
		summary
	}
}
