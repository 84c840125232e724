// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Policy set retrieval.
//!
//! The decision point only reads policy sets; population and distribution
//! belong to whoever implements [`PolicyCache`]. [`InMemoryPolicyCache`] is
//! the reference implementation used by tests and the command line.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;
use warden_pdp_core::{Policy, PolicyDocument};

/// Source of compiled policy sets keyed by requesting service.
pub trait PolicyCache: Send + Sync {
	/// The policy set for `service_id`, or `None` when it has none.
	fn policies(&self, service_id: &str) -> Option<Arc<[Policy]>>;

	/// Number of services with a policy set. Zero means the store is empty.
	fn size(&self) -> usize;
}

impl<T: PolicyCache + ?Sized> PolicyCache for Arc<T> {
	fn policies(&self, service_id: &str) -> Option<Arc<[Policy]>> {
		(**self).policies(service_id)
	}

	fn size(&self) -> usize {
		(**self).size()
	}
}

/// A thread-safe map of policy sets.
///
/// Readers receive `Arc` snapshots, so evaluation never holds the lock.
#[derive(Clone, Default)]
pub struct InMemoryPolicyCache {
	inner: Arc<InMemoryPolicyCacheInner>,
}

#[derive(Default)]
struct InMemoryPolicyCacheInner {
	policies: RwLock<HashMap<String, Arc<[Policy]>>>,
	/// Sequence id of the last full rebuild.
	build_sequence: RwLock<Option<u64>>,
}

impl InMemoryPolicyCache {
	pub fn new() -> Self {
		Self::default()
	}

	/// Builds a cache holding every service of a policy document.
	pub fn from_document(document: PolicyDocument) -> Self {
		let cache = Self::new();
		cache.replace(
			document
				.services
				.into_iter()
				.map(|(service, policies)| (service, policies.into()))
				.collect(),
			None,
		);
		cache
	}

	/// Sets or replaces the policy set of one service.
	pub fn insert(&self, service_id: impl Into<String>, policies: Vec<Policy>) {
		let service_id = service_id.into();
		debug!(service_id = %service_id, count = policies.len(), "caching policy set");
		self.inner.policies.write().insert(service_id, policies.into());
	}

	/// Removes a service's policy set, returning whether one was present.
	pub fn remove(&self, service_id: &str) -> bool {
		self.inner.policies.write().remove(service_id).is_some()
	}

	/// Replaces the whole cache in one step and records the rebuild sequence.
	pub fn replace(&self, policies: HashMap<String, Arc<[Policy]>>, build_sequence: Option<u64>) {
		debug!(services = policies.len(), ?build_sequence, "replacing policy cache");
		*self.inner.policies.write() = policies;
		*self.inner.build_sequence.write() = build_sequence;
	}

	pub fn build_sequence(&self) -> Option<u64> {
		*self.inner.build_sequence.read()
	}
}

impl PolicyCache for InMemoryPolicyCache {
	fn policies(&self, service_id: &str) -> Option<Arc<[Policy]>> {
		self.inner.policies.read().get(service_id).cloned()
	}

	fn size(&self) -> usize {
		self.inner.policies.read().len()
	}
}
