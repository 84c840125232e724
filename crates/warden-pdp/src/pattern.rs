// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Whole-string pattern matching for resource targets and regex conditions.
//!
//! Compiled patterns are memoised process-wide, keyed by their source text.
//! Invalid patterns are remembered too, so they are reported once.

use std::collections::HashMap;
use std::sync::LazyLock;

use parking_lot::RwLock;
use regex::Regex;
use tracing::warn;

/// Distinct patterns kept before the memo is cleared.
const COMPILED_CAPACITY: usize = 4096;

static COMPILED: LazyLock<RwLock<HashMap<String, Option<Regex>>>> =
	LazyLock::new(|| RwLock::new(HashMap::new()));

/// Compiles `pattern` so that it only matches an entire input string.
pub fn compile_anchored(pattern: &str) -> Result<Regex, regex::Error> {
	Regex::new(&format!("^(?:{pattern})$"))
}

/// The memoised anchored form of `pattern`, or `None` when it does not
/// compile. `kind` names the pattern's use in the warning for a bad one.
pub fn anchored(pattern: &str, kind: &'static str) -> Option<Regex> {
	if let Some(compiled) = COMPILED.read().get(pattern) {
		return compiled.clone();
	}

	let compiled = match compile_anchored(pattern) {
		Ok(re) => Some(re),
		Err(e) => {
			warn!(pattern, kind, error = %e, "invalid pattern, treating as non-matching");
			None
		}
	};

	let mut memo = COMPILED.write();
	if memo.len() >= COMPILED_CAPACITY {
		memo.clear();
	}
	memo.insert(pattern.to_string(), compiled.clone());
	compiled
}

/// True when `resource` equals `pattern` or matches it as a whole-string
/// regular expression. An invalid pattern only matches by equality.
pub fn resource_matches(resource: &str, pattern: &str) -> bool {
	if resource == pattern {
		return true;
	}

	anchored(pattern, "target").is_some_and(|re| re.is_match(resource))
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn equality_matches_without_regex() {
		assert!(resource_matches("/app/(admin", "/app/(admin"));
	}

	#[test]
	fn regex_must_cover_whole_resource() {
		assert!(resource_matches("/app/admin", "/app/.*"));
		assert!(!resource_matches("/other/app/admin", "/app/.*"));
		assert!(!resource_matches("/app/admin/x", "/app/admin"));
	}

	#[test]
	fn alternation_is_anchored_as_a_group() {
		assert!(resource_matches("/b", "/a|/b"));
		assert!(!resource_matches("/bx", "/a|/b"));
	}

	#[test]
	fn invalid_pattern_never_matches_other_strings() {
		assert!(!resource_matches("/app", "("));
		assert!(compile_anchored("(").is_err());
	}

	#[test]
	fn anchored_reuses_compiled_pattern() {
		let first = anchored("/memo/[0-9]+", "target").unwrap();
		let second = anchored("/memo/[0-9]+", "target").unwrap();
		assert_eq!(first.as_str(), second.as_str());
		assert_eq!(first.as_str(), "^(?:/memo/[0-9]+)$");
		assert!(COMPILED.read().contains_key("/memo/[0-9]+"));
	}

	#[test]
	fn anchored_remembers_invalid_pattern() {
		assert!(anchored("[unclosed", "target").is_none());
		assert!(matches!(COMPILED.read().get("[unclosed"), Some(None)));
		assert!(anchored("[unclosed", "target").is_none());
	}

	proptest! {
		#[test]
		fn literal_resource_always_matches_itself(s in "[a-z/]{0,20}") {
			prop_assert!(resource_matches(&s, &s));
		}

		#[test]
		fn dot_star_matches_everything(s in "[a-zA-Z0-9/_-]{0,30}") {
			prop_assert!(resource_matches(&s, ".*"));
		}
	}
}
