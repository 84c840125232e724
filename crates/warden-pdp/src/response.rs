// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Decision statements and the signing seam.
//!
//! The decision point serializes a [`DecisionStatement`] and hands the bytes
//! to a [`ResponseSigner`]. A signing failure is reported in the
//! [`Delivery`] next to the decision; it never changes the decision.

use serde::{Deserialize, Serialize};
use warden_pdp_core::{Decision, Effect, GroupTarget};

use crate::error::SigningError;

/// Produces a signature over a serialized decision statement.
pub trait ResponseSigner: Send + Sync {
	fn sign(&self, document: &[u8]) -> Result<Vec<u8>, SigningError>;
}

/// The fields a response envelope needs from a decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionStatement {
	pub decision: Effect,
	pub resource: String,
	/// The requester the response is restricted to.
	pub audience: String,
	pub in_response_to: String,
	pub subject: String,
	pub group_targets: Vec<GroupTarget>,
	pub message: String,
}

impl DecisionStatement {
	pub fn new(
		decision: &Decision,
		resource: &str,
		audience: &str,
		in_response_to: &str,
		subject: &str,
	) -> Self {
		Self {
			decision: decision.effect(),
			resource: resource.to_string(),
			audience: audience.to_string(),
			in_response_to: in_response_to.to_string(),
			subject: subject.to_string(),
			group_targets: decision.audit.group_targets(),
			message: decision.message.clone(),
		}
	}

	pub fn to_bytes(&self) -> Result<Vec<u8>, SigningError> {
		serde_json::to_vec(self).map_err(|e| SigningError::Encoding(e.to_string()))
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
	Signed { document: Vec<u8>, signature: Vec<u8> },
	Unsigned(SigningError),
}

impl Delivery {
	pub fn is_signed(&self) -> bool {
		matches!(self, Delivery::Signed { .. })
	}
}

/// A computed decision together with its statement and signing outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthzResponse {
	pub decision: Decision,
	pub statement: DecisionStatement,
	pub delivery: Delivery,
}

impl AuthzResponse {
	pub fn new(decision: Decision, statement: DecisionStatement, signer: &dyn ResponseSigner) -> Self {
		let delivery = match statement.to_bytes() {
			Ok(document) => match signer.sign(&document) {
				Ok(signature) => Delivery::Signed { document, signature },
				Err(e) => Delivery::Unsigned(e),
			},
			Err(e) => Delivery::Unsigned(e),
		};

		Self {
			decision,
			statement,
			delivery,
		}
	}
}
