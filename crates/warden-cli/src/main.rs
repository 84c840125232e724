// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Warden decision point command line.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use warden_pdp::{AuthzQuery, DecisionPoint, InMemoryPolicyCache, InMemorySessionDirectory};
use warden_pdp_config::{LogFormat, LoggingConfig, PdpConfig};

mod document;

/// Warden - authorization decisions from a policy document.
#[derive(Parser, Debug)]
#[command(name = "warden", version, about, long_about = None)]
struct Args {
	/// Path to custom configuration file
	#[arg(short, long, global = true)]
	config: Option<PathBuf>,

	/// Log level (overrides config)
	#[arg(short, long, global = true)]
	log_level: Option<String>,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Evaluate one query and print the decision as JSON
	Decide {
		/// Policy document (JSON, or TOML with a .toml extension)
		#[arg(long, short)]
		policies: PathBuf,
		/// Requesting service whose policy set applies
		#[arg(long, short)]
		service: String,
		/// Requested resource
		#[arg(long, short)]
		resource: String,
		/// Requested action
		#[arg(long)]
		action: Option<String>,
		/// Principal attribute (repeatable: --attr NAME=VALUE)
		#[arg(long, short = 'a', value_name = "NAME=VALUE")]
		attr: Vec<String>,
		/// Subject identifier of the principal
		#[arg(long, default_value = "cli")]
		subject: String,
	},
	/// Parse a policy document and report what it contains
	Check {
		/// Policy document (JSON, or TOML with a .toml extension)
		#[arg(long, short)]
		policies: PathBuf,
	},
}

fn main() -> Result<()> {
	let args = Args::parse();

	let mut config = match &args.config {
		Some(path) => warden_pdp_config::load_config_with_file(path)?,
		None => warden_pdp_config::load_config()?,
	};
	if let Some(level) = &args.log_level {
		config.logging.level = level.clone();
	}

	init_tracing(&config.logging);

	match args.command {
		Command::Decide {
			policies,
			service,
			resource,
			action,
			attr,
			subject,
		} => decide(&config, &policies, service, resource, action, &attr, subject),
		Command::Check { policies } => check(&policies),
	}
}

/// Logs go to stderr so stdout carries only command output.
fn init_tracing(logging: &LoggingConfig) {
	let filter = EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| EnvFilter::new(logging.level.clone()));

	match logging.format {
		LogFormat::Json => {
			tracing_subscriber::registry()
				.with(filter)
				.with(fmt::layer().json().with_writer(std::io::stderr))
				.init();
		}
		LogFormat::Plain => {
			tracing_subscriber::registry()
				.with(filter)
				.with(fmt::layer().with_writer(std::io::stderr))
				.init();
		}
	}
}

fn decide(
	config: &PdpConfig,
	policies: &std::path::Path,
	service: String,
	resource: String,
	action: Option<String>,
	attrs: &[String],
	subject: String,
) -> Result<()> {
	let document = document::load_document(policies)?;
	info!(
		path = %policies.display(),
		services = document.services.len(),
		policies = document.policy_count(),
		"policy document loaded"
	);

	let principal = document::principal_from_attrs(&subject, attrs)?;
	let sessions = InMemorySessionDirectory::new();
	sessions.insert(subject.clone(), principal);

	let point = DecisionPoint::new(
		InMemoryPolicyCache::from_document(document),
		sessions,
		config.decision.default_mode,
	);

	let mut query = AuthzQuery::new(service, "cli", resource, subject);
	query.action = action;
	let decision = point.decide(&query).context("decision failed")?;

	println!("{}", serde_json::to_string_pretty(&decision)?);
	Ok(())
}

fn check(policies: &std::path::Path) -> Result<()> {
	let document = document::load_document(policies)?;

	for (service, set) in &document.services {
		println!("{service}: {} policies", set.len());
		for policy in set {
			for function in policy.unrecognized_functions() {
				warn!(service = %service, policy_id = %policy.policy_id, function, "unrecognized function");
				println!("  {}: unrecognized function '{function}'", policy.policy_id);
			}
		}
	}

	info!(policies = document.policy_count(), "policy document checked");
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_decide_with_repeated_attrs() {
		let args = Args::try_parse_from([
			"warden", "decide", "--policies", "p.json", "--service", "spep-1", "--resource", "/app",
			"--attr", "role=staff", "-a", "role=admin",
		])
		.unwrap();

		let Command::Decide {
			attr,
			subject,
			action,
			..
		} = args.command
		else {
			panic!("expected decide");
		};
		assert_eq!(attr, vec!["role=staff", "role=admin"]);
		assert_eq!(subject, "cli");
		assert_eq!(action, None);
	}

	#[test]
	fn parses_decide_action() {
		let args = Args::try_parse_from([
			"warden", "decide", "-p", "p.json", "-s", "spep-1", "-r", "/app", "--action", "read",
		])
		.unwrap();

		let Command::Decide { action, .. } = args.command else {
			panic!("expected decide");
		};
		assert_eq!(action.as_deref(), Some("read"));
	}

	#[test]
	fn config_flag_is_global() {
		let args =
			Args::try_parse_from(["warden", "check", "--policies", "p.toml", "--config", "c.toml"]).unwrap();
		assert_eq!(args.config, Some(PathBuf::from("c.toml")));
	}

	#[test]
	fn decide_requires_resource() {
		assert!(Args::try_parse_from(["warden", "decide", "--policies", "p.json", "--service", "s"]).is_err());
	}
}
