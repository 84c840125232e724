// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Principals and their identity attributes.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A named, multi-valued identity attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityAttribute {
	pub attribute_id: String,
	pub values: Vec<String>,
}

impl IdentityAttribute {
	pub fn new<I, S>(attribute_id: impl Into<String>, values: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			attribute_id: attribute_id.into(),
			values: values.into_iter().map(Into::into).collect(),
		}
	}
}

/// An authenticated identity as seen by the decision point.
///
/// Implementations are read-only snapshots handed over by the session
/// directory for the duration of one query.
pub trait Principal: Send + Sync {
	fn principal_name(&self) -> &str;

	fn attribute(&self, attribute_id: &str) -> Option<&IdentityAttribute>;
}

/// A principal backed by an in-memory attribute map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionPrincipal {
	pub principal_name: String,
	pub session_id: String,
	pub attributes: HashMap<String, IdentityAttribute>,
}

impl SessionPrincipal {
	pub fn new(principal_name: impl Into<String>, session_id: impl Into<String>) -> Self {
		Self {
			principal_name: principal_name.into(),
			session_id: session_id.into(),
			attributes: HashMap::new(),
		}
	}

	/// Adds values to an attribute, creating it if needed.
	pub fn with_attribute<I, S>(mut self, attribute_id: &str, values: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.add_values(attribute_id, values);
		self
	}

	pub fn add_values<I, S>(&mut self, attribute_id: &str, values: I)
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self
			.attributes
			.entry(attribute_id.to_string())
			.or_insert_with(|| IdentityAttribute::new(attribute_id, Vec::<String>::new()))
			.values
			.extend(values.into_iter().map(Into::into));
	}
}

impl Principal for SessionPrincipal {
	fn principal_name(&self) -> &str {
		&self.principal_name
	}

	fn attribute(&self, attribute_id: &str) -> Option<&IdentityAttribute> {
		self.attributes.get(attribute_id)
	}
}
