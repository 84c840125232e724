// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Walks a policy set for one resource and principal.
//!
//! Policies are visited in order. A policy applies when one of its targets
//! matches the resource; its rules are then matched against their own targets
//! (or the policy's, when they declare none) and their conditions evaluated.
//! A rule whose actions exclude the requested action is skipped.
//! The first satisfied Deny ends the walk and replaces the recorded target
//! pairs with its own. Satisfied Permits accumulate.

use tracing::{debug, trace, warn};
use warden_pdp_core::{AuditTrail, Effect, Policy, Principal, Rule};

use crate::evaluator::evaluate;
use crate::pattern::resource_matches;

/// The running decision and audit trail after a policy walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchOutcome {
	/// `None` when no rule fired.
	pub decision: Option<Effect>,
	pub trail: AuditTrail,
}

pub fn match_policies(
	policies: &[Policy],
	resource: &str,
	action: Option<&str>,
	principal: &dyn Principal,
) -> MatchOutcome {
	let mut trail = AuditTrail::new();
	let mut decision = None;

	'policies: for policy in policies {
		trail.record_policy(&policy.policy_id);
		let policy_targets = policy.target_resources();

		for policy_target in &policy_targets {
			if !resource_matches(resource, policy_target) {
				continue;
			}
			trace!(policy_id = %policy.policy_id, policy_target, "policy target matched");

			for rule in &policy.rules {
				if !policy.permits_action(rule, action) {
					debug!(policy_id = %policy.policy_id, rule_id = %rule.rule_id, action, "action not covered by rule");
					continue;
				}

				let rule_targets = rule
					.target_resources()
					.unwrap_or_else(|| policy_targets.clone());

				for rule_target in &rule_targets {
					if !resource_matches(resource, rule_target) {
						continue;
					}

					trail.record_rule(&rule.rule_id);
					if !condition_satisfied(rule, principal) {
						debug!(rule_id = %rule.rule_id, rule_target, "rule condition not satisfied");
						continue;
					}

					match rule.effect {
						Effect::Deny => {
							debug!(policy_id = %policy.policy_id, rule_id = %rule.rule_id, "deny rule fired");
							trail.truncate_to_deny(policy_target, rule_target);
							decision = Some(Effect::Deny);
							break 'policies;
						}
						Effect::Permit => {
							debug!(policy_id = %policy.policy_id, rule_id = %rule.rule_id, "permit rule fired");
							trail.record_permit(policy_target, rule_target);
							decision = Some(Effect::Permit);
						}
					}
				}
			}
		}
	}

	MatchOutcome { decision, trail }
}

/// A rule without a condition is always satisfied. A malformed condition
/// counts as not satisfied, so the rule is ignored.
fn condition_satisfied(rule: &Rule, principal: &dyn Principal) -> bool {
	let Some(condition) = &rule.condition else {
		return true;
	};

	match evaluate(condition, principal) {
		Ok(satisfied) => satisfied,
		Err(e) => {
			warn!(rule_id = %rule.rule_id, error = %e, "ignoring rule with malformed condition");
			false
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;
	use warden_pdp_core::{Expression, SessionPrincipal, TargetMatch};

	fn role_is(role: &str) -> Expression {
		Expression::string_equal(vec![
			Expression::designator("role"),
			Expression::literal([role]),
		])
	}

	fn pair(policy_target: &str, rule_target: &str) -> TargetMatch {
		TargetMatch {
			policy_target: policy_target.to_string(),
			rule_target: rule_target.to_string(),
		}
	}

	fn admin_policies() -> Vec<Policy> {
		vec![
			Policy::new("P1")
				.with_target("/app/.*")
				.with_rule(Rule::deny("R1").with_condition(role_is("banned"))),
			Policy::new("P2")
				.with_target("/app/admin")
				.with_rule(Rule::permit("R2")),
		]
	}

	#[test]
	fn banned_role_is_denied_before_admin_policy() {
		let principal = SessionPrincipal::new("mallory", "s").with_attribute("role", ["banned"]);
		let outcome = match_policies(&admin_policies(), "/app/admin", None, &principal);

		assert_eq!(outcome.decision, Some(Effect::Deny));
		assert_eq!(outcome.trail.matched_targets(), [pair("/app/.*", "/app/.*")]);
		assert_eq!(outcome.trail.processed_policy_ids(), ["P1"]);
		assert_eq!(outcome.trail.processed_rule_ids(), ["R1"]);
	}

	#[test]
	fn member_role_falls_through_to_admin_permit() {
		let principal = SessionPrincipal::new("alice", "s").with_attribute("role", ["member"]);
		let outcome = match_policies(&admin_policies(), "/app/admin", None, &principal);

		assert_eq!(outcome.decision, Some(Effect::Permit));
		assert_eq!(outcome.trail.matched_targets(), [pair("/app/admin", "/app/admin")]);
		assert_eq!(outcome.trail.processed_policy_ids(), ["P1", "P2"]);
		assert_eq!(outcome.trail.processed_rule_ids(), ["R1", "R2"]);
	}

	#[test]
	fn deny_overrides_earlier_permit() {
		let policies = vec![
			Policy::new("P1")
				.with_target("/app/.*")
				.with_rule(Rule::permit("R1"))
				.with_rule(Rule::deny("R2").with_condition(role_is("banned"))),
		];
		let principal = SessionPrincipal::new("mallory", "s").with_attribute("role", ["banned"]);

		let outcome = match_policies(&policies, "/app/x", None, &principal);

		assert_eq!(outcome.decision, Some(Effect::Deny));
		assert_eq!(outcome.trail.matched_targets(), [pair("/app/.*", "/app/.*")]);
		assert_eq!(outcome.trail.processed_rule_ids(), ["R1", "R2"]);
	}

	#[test]
	fn permit_when_deny_condition_does_not_hold() {
		let policies = vec![
			Policy::new("P1")
				.with_target("/app/.*")
				.with_rule(Rule::permit("R1"))
				.with_rule(Rule::deny("R2").with_condition(role_is("banned"))),
		];
		let principal = SessionPrincipal::new("alice", "s").with_attribute("role", ["staff"]);

		let outcome = match_policies(&policies, "/app/x", None, &principal);

		assert_eq!(outcome.decision, Some(Effect::Permit));
		assert_eq!(outcome.trail.matched_targets(), [pair("/app/.*", "/app/.*")]);
	}

	#[test]
	fn deny_stops_walking_later_policies() {
		let policies = vec![
			Policy::new("P1").with_target("/a").with_rule(Rule::deny("R1")),
			Policy::new("P2").with_target("/a").with_rule(Rule::permit("R2")),
		];
		let outcome = match_policies(&policies, "/a", None, &SessionPrincipal::new("bob", "s"));

		assert_eq!(outcome.decision, Some(Effect::Deny));
		assert_eq!(outcome.trail.processed_policy_ids(), ["P1"]);
		assert_eq!(outcome.trail.processed_rule_ids(), ["R1"]);
	}

	#[test]
	fn permits_accumulate_across_policies() {
		let policies = vec![
			Policy::new("P1").with_target("/a/.*").with_rule(Rule::permit("R1")),
			Policy::new("P2")
				.with_target("/a/b")
				.with_rule(Rule::permit("R2").with_target("/a/b")),
		];
		let outcome = match_policies(&policies, "/a/b", None, &SessionPrincipal::new("bob", "s"));

		assert_eq!(outcome.decision, Some(Effect::Permit));
		assert_eq!(
			outcome.trail.matched_targets(),
			[pair("/a/.*", "/a/.*"), pair("/a/b", "/a/b")]
		);
	}

	#[test]
	fn unmatched_policy_is_recorded_without_rules() {
		let policies = vec![Policy::new("P1").with_target("/other").with_rule(Rule::permit("R1"))];
		let outcome = match_policies(&policies, "/a", None, &SessionPrincipal::new("bob", "s"));

		assert_eq!(outcome.decision, None);
		assert_eq!(outcome.trail.processed_policy_ids(), ["P1"]);
		assert!(outcome.trail.is_empty());
	}

	#[test]
	fn rule_targets_narrow_policy_targets() {
		let policies = vec![
			Policy::new("P1")
				.with_target("/app/.*")
				.with_rule(Rule::deny("R1").with_target("/app/admin"))
				.with_rule(Rule::permit("R2").with_target("/app/public/.*")),
		];
		let principal = SessionPrincipal::new("bob", "s");

		assert_eq!(
			match_policies(&policies, "/app/public/x", None, &principal).decision,
			Some(Effect::Permit)
		);
		assert_eq!(
			match_policies(&policies, "/app/admin", None, &principal).decision,
			Some(Effect::Deny)
		);
		assert_eq!(match_policies(&policies, "/app/other", None, &principal).decision, None);
	}

	#[test]
	fn malformed_condition_ignores_rule() {
		let malformed = Expression::string_equal(vec![Expression::designator("department")]);
		let policies = vec![
			Policy::new("P1")
				.with_target("/.*")
				.with_rule(Rule::deny("R1").with_condition(malformed))
				.with_rule(Rule::permit("R2")),
		];
		let outcome = match_policies(&policies, "/x", None, &SessionPrincipal::new("bob", "s"));

		assert_eq!(outcome.decision, Some(Effect::Permit));
		assert_eq!(outcome.trail.processed_rule_ids(), ["R1", "R2"]);
	}

	fn admin_rule_on_two_targets() -> Vec<Policy> {
		vec![
			Policy::new("P1").with_target("/.*").with_rule(
				Rule::permit("R1")
					.with_target("/x")
					.with_target("/.*")
					.with_condition(role_is("admin")),
			),
		]
	}

	#[test]
	fn unsatisfied_rule_is_processed_per_matching_target() {
		let principal = SessionPrincipal::new("bob", "s");
		let outcome = match_policies(&admin_rule_on_two_targets(), "/x", None, &principal);

		assert_eq!(outcome.decision, None);
		assert_eq!(outcome.trail.processed_rule_ids(), ["R1", "R1"]);
		assert!(outcome.trail.matched_targets().is_empty());
	}

	#[test]
	fn satisfied_rule_is_processed_per_matching_target() {
		let principal = SessionPrincipal::new("alice", "s").with_attribute("role", ["admin"]);
		let outcome = match_policies(&admin_rule_on_two_targets(), "/x", None, &principal);

		assert_eq!(outcome.decision, Some(Effect::Permit));
		assert_eq!(outcome.trail.processed_rule_ids(), ["R1", "R1"]);
		assert_eq!(outcome.trail.matched_targets(), [pair("/.*", "/x"), pair("/.*", "/.*")]);
	}

	mod actions {
		use super::*;

		fn guarded_policies() -> Vec<Policy> {
			vec![
				Policy::new("P1")
					.with_target("/docs/.*")
					.with_action("read")
					.with_rule(Rule::deny("R1").with_action("delete"))
					.with_rule(Rule::permit("R2")),
			]
		}

		#[test]
		fn rule_actions_override_policy_actions() {
			let principal = SessionPrincipal::new("bob", "s");
			let outcome = match_policies(&guarded_policies(), "/docs/a", Some("delete"), &principal);

			assert_eq!(outcome.decision, Some(Effect::Deny));
			assert_eq!(outcome.trail.processed_rule_ids(), ["R1"]);
		}

		#[test]
		fn rule_without_actions_falls_back_to_policy_actions() {
			let principal = SessionPrincipal::new("bob", "s");
			let outcome = match_policies(&guarded_policies(), "/docs/a", Some("read"), &principal);

			assert_eq!(outcome.decision, Some(Effect::Permit));
			assert_eq!(outcome.trail.processed_rule_ids(), ["R2"]);
		}

		#[test]
		fn uncovered_action_skips_every_rule() {
			let principal = SessionPrincipal::new("bob", "s");
			let outcome = match_policies(&guarded_policies(), "/docs/a", Some("write"), &principal);

			assert_eq!(outcome.decision, None);
			assert!(outcome.trail.is_empty());
			assert_eq!(outcome.trail.processed_policy_ids(), ["P1"]);
		}

		#[test]
		fn policies_without_actions_cover_any_action() {
			let policies = vec![Policy::new("P1").with_target("/.*").with_rule(Rule::permit("R1"))];
			let principal = SessionPrincipal::new("bob", "s");

			assert_eq!(
				match_policies(&policies, "/x", Some("write"), &principal).decision,
				Some(Effect::Permit)
			);
			assert_eq!(match_policies(&policies, "/x", None, &principal).decision, Some(Effect::Permit));
		}
	}

	#[test]
	fn invalid_target_pattern_matches_only_by_equality() {
		let policies = vec![Policy::new("P1").with_target("(").with_rule(Rule::permit("R1"))];
		let principal = SessionPrincipal::new("bob", "s");

		assert_eq!(match_policies(&policies, "/x", None, &principal).decision, None);
		assert_eq!(
			match_policies(&policies, "(", None, &principal).decision,
			Some(Effect::Permit)
		);
	}

	fn arb_effect() -> impl Strategy<Value = Effect> {
		prop_oneof![Just(Effect::Permit), Just(Effect::Deny)]
	}

	fn arb_rule(index: usize) -> impl Strategy<Value = Rule> {
		(arb_effect(), prop::option::of(prop::sample::select(vec!["/r", "/r/.*", "/s"]))).prop_map(
			move |(effect, target)| {
				let rule = Rule::new(format!("R{index}"), effect);
				match target {
					Some(target) => rule.with_target(target),
					None => rule,
				}
			},
		)
	}

	fn arb_policy(index: usize) -> impl Strategy<Value = Policy> {
		(
			prop::sample::select(vec!["/r", "/r/.*", ".*", "/s"]),
			prop::collection::vec((0usize..100).prop_flat_map(arb_rule), 0..4),
		)
			.prop_map(move |(target, rules)| {
				rules
					.into_iter()
					.fold(Policy::new(format!("P{index}")).with_target(target), Policy::with_rule)
			})
	}

	fn arb_policies() -> impl Strategy<Value = Vec<Policy>> {
		prop::collection::vec((0usize..100).prop_flat_map(arb_policy), 0..5)
	}

	proptest! {
		#[test]
		fn deny_leaves_exactly_one_matched_pair(policies in arb_policies()) {
			let outcome = match_policies(&policies, "/r", None, &SessionPrincipal::new("p", "s"));
			if outcome.decision == Some(Effect::Deny) {
				prop_assert_eq!(outcome.trail.matched_targets().len(), 1);
			}
		}

		#[test]
		fn permit_records_at_least_one_pair(policies in arb_policies()) {
			let outcome = match_policies(&policies, "/r", None, &SessionPrincipal::new("p", "s"));
			if outcome.decision == Some(Effect::Permit) {
				prop_assert!(!outcome.trail.matched_targets().is_empty());
			}
		}

		#[test]
		fn no_decision_means_no_matched_pairs(policies in arb_policies()) {
			let outcome = match_policies(&policies, "/r", None, &SessionPrincipal::new("p", "s"));
			if outcome.decision.is_none() {
				prop_assert!(outcome.trail.matched_targets().is_empty());
			}
		}

		#[test]
		fn unconditional_deny_on_matching_target_always_wins(mut policies in arb_policies()) {
			policies.push(Policy::new("PD").with_target("/r").with_rule(Rule::deny("RD")));
			let outcome = match_policies(&policies, "/r", None, &SessionPrincipal::new("p", "s"));
			prop_assert_eq!(outcome.decision, Some(Effect::Deny));
		}
	}
}
