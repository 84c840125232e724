// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Authorization decisions.

use serde::{Deserialize, Serialize};

use crate::audit::AuditTrail;
use crate::policy::Effect;

/// Why a query fell through to the default effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultReason {
	/// The requesting service has no policy set.
	NoPolicySet,
	/// Policies exist but no rule fired for the resource.
	NoMatchingRule,
	/// The policy store holds no policies for any service.
	EmptyPolicyStore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
	Permit,
	Deny,
	/// No rule decided the query; `default` is what the caller enforces.
	Indeterminate {
		default: Effect,
		reason: DefaultReason,
	},
}

/// The result of evaluating one query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
	#[serde(flatten)]
	pub verdict: Verdict,
	pub message: String,
	pub audit: AuditTrail,
}

impl Decision {
	pub fn permit(message: impl Into<String>, audit: AuditTrail) -> Self {
		Self {
			verdict: Verdict::Permit,
			message: message.into(),
			audit,
		}
	}

	pub fn deny(message: impl Into<String>, audit: AuditTrail) -> Self {
		Self {
			verdict: Verdict::Deny,
			message: message.into(),
			audit,
		}
	}

	pub fn indeterminate(
		default: Effect,
		reason: DefaultReason,
		message: impl Into<String>,
		audit: AuditTrail,
	) -> Self {
		Self {
			verdict: Verdict::Indeterminate { default, reason },
			message: message.into(),
			audit,
		}
	}

	/// The effect the caller must enforce.
	pub fn effect(&self) -> Effect {
		match self.verdict {
			Verdict::Permit => Effect::Permit,
			Verdict::Deny => Effect::Deny,
			Verdict::Indeterminate { default, .. } => default,
		}
	}

	pub fn is_default(&self) -> bool {
		matches!(self.verdict, Verdict::Indeterminate { .. })
	}

	pub fn default_reason(&self) -> Option<DefaultReason> {
		match self.verdict {
			Verdict::Indeterminate { reason, .. } => Some(reason),
			Verdict::Permit | Verdict::Deny => None,
		}
	}
}
