// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The decision point service.
//!
//! [`DecisionPoint`] ties the aggregator to a [`PolicyCache`] and a
//! [`SessionDirectory`]. Each query is independent; the service holds no
//! per-query state.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use warden_pdp_core::{AuditTrail, Decision, DefaultReason, Effect};

use crate::aggregator::{decide, resolve_default_mode};
use crate::cache::PolicyCache;
use crate::error::{DecisionPointError, DecisionPointResult};
use crate::response::{AuthzResponse, DecisionStatement, Delivery, ResponseSigner};
use crate::session::SessionDirectory;

/// A decoded authorization query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthzQuery {
	/// The requesting service. Responses are restricted to it.
	pub requester: String,
	pub correlation_id: String,
	pub resource: String,
	/// The requested action. Only rules covering it are considered.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub action: Option<String>,
	pub subject_id: String,
}

impl AuthzQuery {
	pub fn new(
		requester: impl Into<String>,
		correlation_id: impl Into<String>,
		resource: impl Into<String>,
		subject_id: impl Into<String>,
	) -> Self {
		Self {
			requester: requester.into(),
			correlation_id: correlation_id.into(),
			resource: resource.into(),
			action: None,
			subject_id: subject_id.into(),
		}
	}

	pub fn with_action(mut self, action: impl Into<String>) -> Self {
		self.action = Some(action.into());
		self
	}

	fn validate(&self) -> DecisionPointResult<()> {
		if self.requester.is_empty() {
			return Err(DecisionPointError::InvalidQuery("requester"));
		}
		if self.resource.is_empty() {
			return Err(DecisionPointError::InvalidQuery("resource"));
		}
		if self.subject_id.is_empty() {
			return Err(DecisionPointError::InvalidQuery("subject_id"));
		}
		Ok(())
	}
}

pub struct DecisionPoint<C, S> {
	cache: C,
	sessions: S,
	default: Effect,
}

impl<C: PolicyCache, S: SessionDirectory> DecisionPoint<C, S> {
	/// `default_mode` is resolved once here; see [`resolve_default_mode`].
	pub fn new(cache: C, sessions: S, default_mode: Effect) -> Self {
		Self {
			cache,
			sessions,
			default: resolve_default_mode(default_mode),
		}
	}

	/// The effect applied when no rule decides a query.
	pub fn default_effect(&self) -> Effect {
		self.default
	}

	pub fn cache(&self) -> &C {
		&self.cache
	}

	#[instrument(
		level = "debug",
		skip(self, query),
		fields(requester = %query.requester, resource = %query.resource)
	)]
	pub fn decide(&self, query: &AuthzQuery) -> DecisionPointResult<Decision> {
		query.validate()?;

		let store_size = self.cache.size();
		let default = if store_size == 0 {
			Effect::Deny
		} else {
			self.default
		};

		let principal = self.sessions.lookup(&query.subject_id).map_err(|e| {
			warn!(subject_id = %query.subject_id, error = %e, "principal lookup failed");
			DecisionPointError::from(e)
		})?;

		if store_size == 0 {
			info!("policy store is empty, denying");
			return Ok(Decision::indeterminate(
				default,
				DefaultReason::EmptyPolicyStore,
				format!("Policy store is empty. Falling through to default state of {default}"),
				AuditTrail::new(),
			));
		}

		let policies = self.cache.policies(&query.requester);
		debug!(found = policies.is_some(), "policy set lookup");

		Ok(decide(
			policies.as_deref(),
			&query.resource,
			query.action.as_deref(),
			&*principal,
			default,
		))
	}

	/// Decides `query` and produces a signed decision statement.
	///
	/// Signing problems are reported in [`AuthzResponse::delivery`].
	pub fn respond(
		&self,
		query: &AuthzQuery,
		signer: &dyn ResponseSigner,
	) -> DecisionPointResult<AuthzResponse> {
		let decision = self.decide(query)?;
		let statement = DecisionStatement::new(
			&decision,
			&query.resource,
			&query.requester,
			&query.correlation_id,
			&query.subject_id,
		);

		let response = AuthzResponse::new(decision, statement, signer);
		if let Delivery::Unsigned(e) = &response.delivery {
			warn!(correlation_id = %query.correlation_id, error = %e, "decision statement left unsigned");
		}
		Ok(response)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::cache::InMemoryPolicyCache;
	use crate::error::SigningError;
	use crate::session::InMemorySessionDirectory;
	use warden_pdp_core::{Policy, Rule, SessionPrincipal, Verdict};

	struct Fixed;

	impl ResponseSigner for Fixed {
		fn sign(&self, _document: &[u8]) -> Result<Vec<u8>, SigningError> {
			Ok(vec![1, 2, 3])
		}
	}

	struct Failing;

	impl ResponseSigner for Failing {
		fn sign(&self, _document: &[u8]) -> Result<Vec<u8>, SigningError> {
			Err(SigningError::Signer("hsm offline".into()))
		}
	}

	fn point(cache: InMemoryPolicyCache) -> DecisionPoint<InMemoryPolicyCache, InMemorySessionDirectory> {
		let sessions = InMemorySessionDirectory::new();
		sessions.insert("sub-1", SessionPrincipal::new("alice", "sess-1"));
		DecisionPoint::new(cache, sessions, Effect::Deny)
	}

	fn query(resource: &str) -> AuthzQuery {
		AuthzQuery::new("spep-1", "req-1", resource, "sub-1")
	}

	#[test]
	fn empty_store_is_fail_closed() {
		let decision = point(InMemoryPolicyCache::new()).decide(&query("/x")).unwrap();
		assert_eq!(
			decision.verdict,
			Verdict::Indeterminate {
				default: Effect::Deny,
				reason: DefaultReason::EmptyPolicyStore,
			}
		);
		assert!(decision.audit.is_empty());
	}

	#[test]
	fn requester_without_policies_gets_default() {
		let cache = InMemoryPolicyCache::new();
		cache.insert("spep-other", vec![Policy::new("P1").with_target("/.*")]);
		let decision = point(cache).decide(&query("/x")).unwrap();
		assert_eq!(decision.default_reason(), Some(DefaultReason::NoPolicySet));
	}

	#[test]
	fn permit_through_cache() {
		let cache = InMemoryPolicyCache::new();
		cache.insert(
			"spep-1",
			vec![Policy::new("P1").with_target("/app/.*").with_rule(Rule::permit("R1"))],
		);
		let decision = point(cache).decide(&query("/app/home")).unwrap();
		assert_eq!(decision.verdict, Verdict::Permit);
	}

	#[test]
	fn query_action_selects_rules() {
		let cache = InMemoryPolicyCache::new();
		cache.insert(
			"spep-1",
			vec![Policy::new("P1")
				.with_target("/app/.*")
				.with_action("read")
				.with_rule(Rule::permit("R1"))],
		);
		let point = point(cache);

		let read = point.decide(&query("/app/home").with_action("read")).unwrap();
		assert_eq!(read.verdict, Verdict::Permit);

		let write = point.decide(&query("/app/home").with_action("write")).unwrap();
		assert_eq!(write.default_reason(), Some(DefaultReason::NoMatchingRule));
	}

	#[test]
	fn unknown_session_is_an_error() {
		let cache = InMemoryPolicyCache::new();
		cache.insert("spep-1", vec![Policy::new("P1")]);
		let query = AuthzQuery::new("spep-1", "req-1", "/x", "sub-404");
		assert_eq!(
			point(cache).decide(&query),
			Err(DecisionPointError::UnknownSession("sub-404".into()))
		);
	}

	#[test]
	fn empty_fields_are_rejected() {
		let point = point(InMemoryPolicyCache::new());
		assert_eq!(
			point.decide(&AuthzQuery::new("", "req", "/x", "sub-1")),
			Err(DecisionPointError::InvalidQuery("requester"))
		);
		assert_eq!(
			point.decide(&AuthzQuery::new("spep-1", "req", "", "sub-1")),
			Err(DecisionPointError::InvalidQuery("resource"))
		);
		assert_eq!(
			point.decide(&AuthzQuery::new("spep-1", "req", "/x", "")),
			Err(DecisionPointError::InvalidQuery("subject_id"))
		);
	}

	#[test]
	fn configured_permit_default_is_overridden() {
		let point = DecisionPoint::new(
			InMemoryPolicyCache::new(),
			InMemorySessionDirectory::new(),
			Effect::Permit,
		);
		assert_eq!(point.default_effect(), Effect::Deny);
	}

	#[test]
	fn respond_signs_statement() {
		let cache = InMemoryPolicyCache::new();
		cache.insert(
			"spep-1",
			vec![Policy::new("P1").with_target("/app/.*").with_rule(Rule::permit("R1"))],
		);
		let response = point(cache).respond(&query("/app/home"), &Fixed).unwrap();

		assert_eq!(response.statement.audience, "spep-1");
		assert_eq!(response.statement.in_response_to, "req-1");
		assert_eq!(response.statement.subject, "sub-1");
		assert_eq!(response.statement.decision, Effect::Permit);
		assert!(matches!(
			response.delivery,
			Delivery::Signed { ref signature, .. } if signature == &[1, 2, 3]
		));
	}

	#[test]
	fn respond_reports_unsigned_delivery() {
		let cache = InMemoryPolicyCache::new();
		cache.insert(
			"spep-1",
			vec![Policy::new("P1").with_target("/app/.*").with_rule(Rule::deny("R1"))],
		);
		let response = point(cache).respond(&query("/app/home"), &Failing).unwrap();

		assert_eq!(response.decision.verdict, Verdict::Deny);
		assert_eq!(
			response.delivery,
			Delivery::Unsigned(SigningError::Signer("hsm offline".into()))
		);
	}
}
