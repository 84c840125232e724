// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Condition evaluation.
//!
//! [`evaluate`] interprets a rule condition against a principal's identity
//! attributes. A condition that does not hold evaluates to `Ok(false)`; an
//! [`ExpressionError`] means the condition itself is malformed and the caller
//! must ignore the rule.
//!
//! Combinators (`and`, `or`, `not`) stop at the first child that is not a
//! boolean function and return `false` outright rather than skipping it.

use std::borrow::Cow;

use regex::Regex;
use tracing::{debug, trace};
use warden_pdp_core::{
	Combinator, Expression, ExpressionError, ExpressionResult, IdentityAttribute, MatchFunction,
	Normalizer, Principal,
};

use crate::pattern::anchored;

/// Evaluates a rule condition.
///
/// The root must be a combinator or a string matching function.
pub fn evaluate(condition: &Expression, principal: &dyn Principal) -> ExpressionResult<bool> {
	evaluate_function(condition, principal).unwrap_or_else(|| {
		Err(ExpressionError::InvalidRoot {
			found: condition.to_string(),
		})
	})
}

/// Returns `None` when `node` is not a boolean function.
fn evaluate_function(node: &Expression, principal: &dyn Principal) -> Option<ExpressionResult<bool>> {
	match node {
		Expression::Combinator { op, children } => Some(evaluate_combinator(*op, children, principal)),
		Expression::Match { function, children } => {
			Some(evaluate_match(*function, children, principal))
		}
		Expression::Normalizer(_)
		| Expression::Designator { .. }
		| Expression::Literal { .. }
		| Expression::Unrecognized { .. } => None,
	}
}

fn evaluate_combinator(
	op: Combinator,
	children: &[Expression],
	principal: &dyn Principal,
) -> ExpressionResult<bool> {
	for child in children {
		let Some(result) = evaluate_function(child, principal) else {
			debug!(function = op.id(), argument = %child, "non-function argument, condition is false");
			return Ok(false);
		};

		match (op, result?) {
			(Combinator::And, false) => return Ok(false),
			(Combinator::Or, true) => return Ok(true),
			(Combinator::Not, true) => return Ok(false),
			_ => {}
		}
	}

	let result = match op {
		Combinator::And => true,
		Combinator::Or => false,
		Combinator::Not => true,
	};
	trace!(function = op.id(), result, "combinator exhausted its arguments");
	Ok(result)
}

#[derive(Debug, Default, Clone, Copy)]
struct Normalization {
	to_lower: bool,
	trim_edges: bool,
}

impl Normalization {
	fn apply<'a>(&self, value: &'a str) -> Cow<'a, str> {
		let value = if self.trim_edges { value.trim() } else { value };
		if self.to_lower {
			Cow::Owned(value.to_lowercase())
		} else {
			Cow::Borrowed(value)
		}
	}
}

fn evaluate_match(
	function: MatchFunction,
	children: &[Expression],
	principal: &dyn Principal,
) -> ExpressionResult<bool> {
	let mut designated = 0usize;
	let mut attributes: Vec<&IdentityAttribute> = Vec::new();
	let mut matchers: Vec<&str> = Vec::new();
	let mut normalization = Normalization::default();

	for child in children {
		match child {
			Expression::Designator { attribute_id } => {
				designated += 1;
				match principal.attribute(attribute_id) {
					Some(attribute) => attributes.push(attribute),
					None => trace!(%attribute_id, "principal has no such attribute"),
				}
			}
			Expression::Literal { values } => matchers.extend(values.iter().map(String::as_str)),
			Expression::Normalizer(Normalizer::ToLower) => normalization.to_lower = true,
			Expression::Normalizer(Normalizer::TrimEdges) => normalization.trim_edges = true,
			Expression::Combinator { .. } | Expression::Match { .. } | Expression::Unrecognized { .. } => {
				return Err(ExpressionError::UnsupportedArgument {
					function: function.id(),
					argument: child.to_string(),
				});
			}
		}
	}

	if attributes.is_empty() {
		debug!(function = function.id(), designated, "no designated attribute resolved");
		return Err(ExpressionError::NoResolvedDesignator {
			function: function.id(),
		});
	}
	if matchers.is_empty() {
		return Err(ExpressionError::NoMatchers {
			function: function.id(),
		});
	}

	for matcher in matchers {
		let Some(test) = ValueTest::new(function, matcher) else {
			continue;
		};

		let found = attributes
			.iter()
			.flat_map(|attribute| attribute.values.iter())
			.any(|value| test.matches(&normalization.apply(value)));

		if found {
			debug!(function = function.id(), "attribute value matched");
			return Ok(true);
		}
	}

	debug!(function = function.id(), "no attribute value matched");
	Ok(false)
}

enum ValueTest<'a> {
	Exact(&'a str),
	Pattern(Regex),
}

impl<'a> ValueTest<'a> {
	/// Returns `None` for a regex matcher that does not compile; such a
	/// matcher is skipped rather than failing the condition.
	fn new(function: MatchFunction, matcher: &'a str) -> Option<Self> {
		match function {
			MatchFunction::StringEqual => Some(ValueTest::Exact(matcher)),
			MatchFunction::StringRegex => anchored(matcher, "string-regex-match").map(ValueTest::Pattern),
		}
	}

	fn matches(&self, value: &str) -> bool {
		match self {
			ValueTest::Exact(expected) => *expected == value,
			ValueTest::Pattern(re) => re.is_match(value),
		}
	}
}
