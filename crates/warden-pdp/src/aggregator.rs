// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Combines a policy walk into a [`Decision`].

use tracing::{info, instrument, warn};
use warden_pdp_core::{AuditTrail, Decision, DefaultReason, Effect, Policy, Principal};

use crate::matcher::{match_policies, MatchOutcome};

/// Decides a query against the requesting service's policy set.
///
/// `policies` is `None` (or empty) when the service has no policy set; the
/// decision then falls through to `default` with an empty trail. `action` is
/// the requested action, if the query named one.
#[instrument(
	level = "debug",
	skip(policies, principal),
	fields(
		principal = %principal.principal_name(),
		policy_count = policies.map_or(0, <[Policy]>::len),
	)
)]
pub fn decide(
	policies: Option<&[Policy]>,
	resource: &str,
	action: Option<&str>,
	principal: &dyn Principal,
	default: Effect,
) -> Decision {
	let policies = match policies {
		Some(policies) if !policies.is_empty() => policies,
		_ => {
			info!(resource, %default, "no policy set for requester");
			return Decision::indeterminate(
				default,
				DefaultReason::NoPolicySet,
				format!("No matching policy located. Falling through to default state of {default}"),
				AuditTrail::new(),
			);
		}
	};

	let MatchOutcome { decision, trail } = match_policies(policies, resource, action, principal);

	let decision = match decision {
		None => Decision::indeterminate(
			default,
			DefaultReason::NoMatchingRule,
			format!(
				"No matching rule located. Falling through to default state of {default}. Processed policies: {}",
				trail.policy_summary()
			),
			trail,
		),
		Some(Effect::Permit) => Decision::permit(
			format!("Permit granted. Processed policies: {}", trail.policy_summary()),
			trail,
		),
		Some(Effect::Deny) => Decision::deny(
			format!(
				"Deny by policy {} rule {}. Processed rules: [{}]. Processed policies: {}",
				trail.current_policy().unwrap_or_default(),
				trail.current_rule().unwrap_or_default(),
				trail.processed_rule_ids().join(","),
				trail.policy_summary()
			),
			trail,
		),
	};

	info!(resource, effect = %decision.effect(), is_default = decision.is_default(), "authorization decided");
	decision
}

/// Resolves the configured default mode to the effect actually applied when
/// no rule decides a query. This is always Deny.
pub fn resolve_default_mode(configured: Effect) -> Effect {
	if configured == Effect::Permit {
		warn!("default mode Permit is not honoured, falling through to Deny");
	}
	Effect::Deny
}
