// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for the Warden policy decision point.
//!
//! This crate holds the data model shared by the evaluation engine
//! (`warden-pdp`), its configuration (`warden-pdp-config`) and the `warden`
//! command line:
//!
//! - [`Policy`] and [`Rule`]: per-service policy sets with target resource
//!   patterns and a [`Effect`]
//! - [`Expression`]: the condition tree attached to a rule
//! - [`Principal`] and [`IdentityAttribute`]: the authenticated identity a
//!   query is evaluated for
//! - [`AuditTrail`] and [`Decision`]: what a single evaluation produced
//!
//! # Example
//!
//! ```
//! use warden_pdp_core::{Effect, Expression, Policy, Rule};
//!
//! let policy = Policy::new("P1")
//! 	.with_target("/app/.*")
//! 	.with_rule(
//! 		Rule::new("R1", Effect::Deny).with_condition(Expression::string_equal(vec![
//! 			Expression::designator("role"),
//! 			Expression::literal(["banned"]),
//! 		])),
//! 	);
//!
//! assert_eq!(policy.target_resources(), vec!["/app/.*"]);
//! ```

pub mod audit;
pub mod decision;
pub mod error;
pub mod expression;
pub mod policy;
pub mod principal;

pub use audit::{AuditTrail, GroupTarget, TargetMatch};
pub use decision::{Decision, DefaultReason, Verdict};
pub use error::{ExpressionError, ExpressionResult};
pub use expression::{Combinator, Expression, MatchFunction, Normalizer};
pub use policy::{Effect, Policy, PolicyDocument, Rule};
pub use principal::{IdentityAttribute, Principal, SessionPrincipal};
