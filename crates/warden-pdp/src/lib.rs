// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Authorization decision point.
//!
//! Given a query naming a resource and a subject, the decision point fetches
//! the requester's policy set, resolves the subject's principal and renders a
//! Permit, Deny or default decision with an audit trail.
//!
//! ```
//! use warden_pdp::{AuthzQuery, DecisionPoint, InMemoryPolicyCache, InMemorySessionDirectory};
//! use warden_pdp_core::{Effect, Policy, Rule, SessionPrincipal};
//!
//! let cache = InMemoryPolicyCache::new();
//! cache.insert(
//! 	"spep-1",
//! 	vec![Policy::new("P1").with_target("/app/.*").with_rule(Rule::permit("R1"))],
//! );
//! let sessions = InMemorySessionDirectory::new();
//! sessions.insert("sub-1", SessionPrincipal::new("alice", "sess-1"));
//!
//! let point = DecisionPoint::new(cache, sessions, Effect::Deny);
//! let decision = point
//! 	.decide(&AuthzQuery::new("spep-1", "req-1", "/app/home", "sub-1"))
//! 	.unwrap();
//! assert_eq!(decision.effect(), Effect::Permit);
//! ```

pub mod aggregator;
pub mod cache;
pub mod error;
pub mod evaluator;
pub mod matcher;
pub mod pattern;
pub mod response;
pub mod service;
pub mod session;

pub use aggregator::{decide, resolve_default_mode};
pub use cache::{InMemoryPolicyCache, PolicyCache};
pub use error::{DecisionPointError, DecisionPointResult, SessionError, SigningError};
pub use evaluator::evaluate;
pub use matcher::{match_policies, MatchOutcome};
pub use response::{AuthzResponse, DecisionStatement, Delivery, ResponseSigner};
pub use service::{AuthzQuery, DecisionPoint};
pub use session::{InMemorySessionDirectory, SessionDirectory};
