// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections for the decision point.

pub mod decision;
pub mod logging;

pub use decision::{DecisionConfig, DecisionConfigLayer};
pub use logging::{LogFormat, LoggingConfig, LoggingConfigLayer};
