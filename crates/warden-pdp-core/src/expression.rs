// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Condition expression trees.
//!
//! A rule's condition is a tree of function nodes. Policy documents name
//! functions by id (`and`, `string-equal`, ...); on load each id is mapped to
//! a closed set of node kinds. Unknown ids load as
//! [`Expression::Unrecognized`]; a condition containing one only disables its
//! own rule.

use std::fmt;

use serde::{Deserialize, Serialize};

pub const FUNCTION_OR: &str = "or";
pub const FUNCTION_AND: &str = "and";
pub const FUNCTION_NOT: &str = "not";
pub const FUNCTION_STRING_EQUAL: &str = "string-equal";
pub const FUNCTION_STRING_REGEX: &str = "string-regex-match";
/// Short form of [`FUNCTION_STRING_REGEX`], accepted on load.
pub const FUNCTION_STRING_REGEX_ALIAS: &str = "string-regex";
pub const FUNCTION_NORMALIZE_TO_LOWER: &str = "string-normalize-to-lower-case";
pub const FUNCTION_NORMALIZE_SPACE: &str = "string-normalize-space";

/// Boolean combinators over child functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Combinator {
	And,
	Or,
	/// True when no child is true. With several children this is NOR.
	Not,
}

impl Combinator {
	pub fn id(self) -> &'static str {
		match self {
			Combinator::And => FUNCTION_AND,
			Combinator::Or => FUNCTION_OR,
			Combinator::Not => FUNCTION_NOT,
		}
	}
}

/// String matching functions applied to principal attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchFunction {
	StringEqual,
	StringRegex,
}

impl MatchFunction {
	pub fn id(self) -> &'static str {
		match self {
			MatchFunction::StringEqual => FUNCTION_STRING_EQUAL,
			MatchFunction::StringRegex => FUNCTION_STRING_REGEX,
		}
	}
}

/// Modifiers applied to attribute values before matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Normalizer {
	ToLower,
	/// Strips leading and trailing whitespace only.
	TrimEdges,
}

impl Normalizer {
	pub fn id(self) -> &'static str {
		match self {
			Normalizer::ToLower => FUNCTION_NORMALIZE_TO_LOWER,
			Normalizer::TrimEdges => FUNCTION_NORMALIZE_SPACE,
		}
	}
}

/// A node in a rule condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ExpressionDocument", into = "ExpressionDocument")]
pub enum Expression {
	Combinator {
		op: Combinator,
		children: Vec<Expression>,
	},
	Match {
		function: MatchFunction,
		children: Vec<Expression>,
	},
	/// Only meaningful as a child of [`Expression::Match`].
	Normalizer(Normalizer),
	Designator {
		attribute_id: String,
	},
	Literal {
		values: Vec<String>,
	},
	Unrecognized {
		function_id: String,
	},
}

impl Expression {
	/// Builds a node from a policy function id.
	///
	/// Normalizers take no arguments; any children supplied for them are
	/// dropped. Unknown ids become [`Expression::Unrecognized`].
	pub fn from_function(function_id: &str, children: Vec<Expression>) -> Self {
		match function_id {
			FUNCTION_AND => Self::and(children),
			FUNCTION_OR => Self::or(children),
			FUNCTION_NOT => Self::not(children),
			FUNCTION_STRING_EQUAL => Self::string_equal(children),
			FUNCTION_STRING_REGEX | FUNCTION_STRING_REGEX_ALIAS => Self::string_regex(children),
			FUNCTION_NORMALIZE_TO_LOWER => Self::Normalizer(Normalizer::ToLower),
			FUNCTION_NORMALIZE_SPACE => Self::Normalizer(Normalizer::TrimEdges),
			other => Self::Unrecognized {
				function_id: other.to_string(),
			},
		}
	}

	pub fn and(children: Vec<Expression>) -> Self {
		Self::Combinator {
			op: Combinator::And,
			children,
		}
	}

	pub fn or(children: Vec<Expression>) -> Self {
		Self::Combinator {
			op: Combinator::Or,
			children,
		}
	}

	pub fn not(children: Vec<Expression>) -> Self {
		Self::Combinator {
			op: Combinator::Not,
			children,
		}
	}

	pub fn string_equal(children: Vec<Expression>) -> Self {
		Self::Match {
			function: MatchFunction::StringEqual,
			children,
		}
	}

	pub fn string_regex(children: Vec<Expression>) -> Self {
		Self::Match {
			function: MatchFunction::StringRegex,
			children,
		}
	}

	pub fn designator(attribute_id: impl Into<String>) -> Self {
		Self::Designator {
			attribute_id: attribute_id.into(),
		}
	}

	pub fn literal<I, S>(values: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self::Literal {
			values: values.into_iter().map(Into::into).collect(),
		}
	}

	pub fn to_lower() -> Self {
		Self::Normalizer(Normalizer::ToLower)
	}

	pub fn trim_edges() -> Self {
		Self::Normalizer(Normalizer::TrimEdges)
	}

	/// The policy function id of this node, if it is a function node.
	pub fn function_id(&self) -> Option<&str> {
		match self {
			Expression::Combinator { op, .. } => Some(op.id()),
			Expression::Match { function, .. } => Some(function.id()),
			Expression::Normalizer(n) => Some(n.id()),
			Expression::Unrecognized { function_id } => Some(function_id.as_str()),
			Expression::Designator { .. } | Expression::Literal { .. } => None,
		}
	}

	/// Collects the ids of every unrecognized function in this tree.
	pub fn unrecognized_functions(&self) -> Vec<&str> {
		let mut found = Vec::new();
		self.collect_unrecognized(&mut found);
		found
	}

	fn collect_unrecognized<'a>(&'a self, found: &mut Vec<&'a str>) {
		match self {
			Expression::Combinator { children, .. } | Expression::Match { children, .. } => {
				for child in children {
					child.collect_unrecognized(found);
				}
			}
			Expression::Unrecognized { function_id } => found.push(function_id.as_str()),
			Expression::Normalizer(_) | Expression::Designator { .. } | Expression::Literal { .. } => {}
		}
	}
}

impl fmt::Display for Expression {
	/// Short description of the node kind, used in error messages.
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Expression::Combinator { op, .. } => write!(f, "function '{}'", op.id()),
			Expression::Match { function, .. } => write!(f, "function '{}'", function.id()),
			Expression::Normalizer(n) => write!(f, "normalizer '{}'", n.id()),
			Expression::Designator { attribute_id } => {
				write!(f, "attribute designator '{attribute_id}'")
			}
			Expression::Literal { .. } => write!(f, "attribute value"),
			Expression::Unrecognized { function_id } => {
				write!(f, "unrecognized function '{function_id}'")
			}
		}
	}
}

/// Textual form of an expression as it appears in policy documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ExpressionDocument {
	Apply {
		function: String,
		#[serde(default, skip_serializing_if = "Vec::is_empty")]
		args: Vec<ExpressionDocument>,
	},
	Designator {
		attribute_id: String,
	},
	Value {
		values: Vec<String>,
	},
}

impl From<ExpressionDocument> for Expression {
	fn from(doc: ExpressionDocument) -> Self {
		match doc {
			ExpressionDocument::Apply { function, args } => {
				Expression::from_function(&function, args.into_iter().map(Into::into).collect())
			}
			ExpressionDocument::Designator { attribute_id } => Expression::Designator { attribute_id },
			ExpressionDocument::Value { values } => Expression::Literal { values },
		}
	}
}

impl From<Expression> for ExpressionDocument {
	fn from(expr: Expression) -> Self {
		let apply = |function: &str, children: Vec<Expression>| ExpressionDocument::Apply {
			function: function.to_string(),
			args: children.into_iter().map(Into::into).collect(),
		};

		match expr {
			Expression::Combinator { op, children } => apply(op.id(), children),
			Expression::Match { function, children } => apply(function.id(), children),
			Expression::Normalizer(n) => apply(n.id(), Vec::new()),
			Expression::Unrecognized { function_id } => apply(&function_id, Vec::new()),
			Expression::Designator { attribute_id } => ExpressionDocument::Designator { attribute_id },
			Expression::Literal { values } => ExpressionDocument::Value { values },
		}
	}
}
