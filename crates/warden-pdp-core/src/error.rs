// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for condition evaluation.

use thiserror::Error;

pub type ExpressionResult<T> = Result<T, ExpressionError>;

/// A structurally invalid condition expression.
///
/// Raised only for defects in a rule's condition, never for a condition that
/// is simply not satisfied. Callers contain it at the rule boundary: the rule
/// is ignored and the request carries on. Display strings name the offending
/// node kind but never attribute values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpressionError {
	#[error("condition root must be a boolean function, found {found}")]
	InvalidRoot { found: String },

	#[error("{function} has no attribute designator resolvable against the principal")]
	NoResolvedDesignator { function: &'static str },

	#[error("{function} has no attribute values to match against")]
	NoMatchers { function: &'static str },

	#[error("{function} does not accept {argument} as an argument")]
	UnsupportedArgument {
		function: &'static str,
		argument: String,
	},
}
