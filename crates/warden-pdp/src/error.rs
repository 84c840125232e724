// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use thiserror::Error;

pub type DecisionPointResult<T> = Result<T, DecisionPointError>;

/// Failures resolving a subject through the session directory.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
	#[error("no active session for subject '{0}'")]
	UnknownSession(String),

	#[error("session directory unavailable: {0}")]
	Unavailable(String),
}

/// Failures that prevent a decision from being rendered at all.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecisionPointError {
	#[error("invalid query: {0} is empty")]
	InvalidQuery(&'static str),

	#[error("unknown session for subject '{0}'")]
	UnknownSession(String),

	#[error("session directory error: {0}")]
	SessionDirectory(String),
}

impl From<SessionError> for DecisionPointError {
	fn from(err: SessionError) -> Self {
		match err {
			SessionError::UnknownSession(subject) => DecisionPointError::UnknownSession(subject),
			SessionError::Unavailable(reason) => DecisionPointError::SessionDirectory(reason),
		}
	}
}

/// Failures producing a signature over a decision statement.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SigningError {
	#[error("failed to encode decision statement: {0}")]
	Encoding(String),

	#[error("signer error: {0}")]
	Signer(String),
}
