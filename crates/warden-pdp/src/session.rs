// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Subject to principal resolution.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use warden_pdp_core::{Principal, SessionPrincipal};

use crate::error::SessionError;

/// Resolves the principal behind a subject identifier.
pub trait SessionDirectory: Send + Sync {
	fn lookup(&self, subject_id: &str) -> Result<Arc<dyn Principal>, SessionError>;
}

impl<T: SessionDirectory + ?Sized> SessionDirectory for Arc<T> {
	fn lookup(&self, subject_id: &str) -> Result<Arc<dyn Principal>, SessionError> {
		(**self).lookup(subject_id)
	}
}

/// Active sessions held in memory, keyed by subject identifier.
#[derive(Clone, Default)]
pub struct InMemorySessionDirectory {
	sessions: Arc<RwLock<HashMap<String, Arc<SessionPrincipal>>>>,
}

impl InMemorySessionDirectory {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert(&self, subject_id: impl Into<String>, principal: SessionPrincipal) {
		self
			.sessions
			.write()
			.insert(subject_id.into(), Arc::new(principal));
	}

	/// Ends a session, returning whether it existed.
	pub fn terminate(&self, subject_id: &str) -> bool {
		self.sessions.write().remove(subject_id).is_some()
	}
}

impl SessionDirectory for InMemorySessionDirectory {
	fn lookup(&self, subject_id: &str) -> Result<Arc<dyn Principal>, SessionError> {
		self
			.sessions
			.read()
			.get(subject_id)
			.map(|principal| Arc::clone(principal) as Arc<dyn Principal>)
			.ok_or_else(|| SessionError::UnknownSession(subject_id.to_string()))
	}
}
