// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use serde::{Deserialize, Serialize};
use setdml_core::Result;
use setdml_sql::DialectKind;

use crate::error::EngineError;

pub const DEFAULT_PLAN_CACHE_CAPACITY: usize = 256;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
	/// SQL dialect statements are emitted in.
	pub dialect: DialectKind,
	/// Translated plans kept per engine; `0` disables caching.
	pub plan_cache_capacity: usize,
	/// Log every executed statement at debug level.
	pub log_sql: bool,
}

impl Default for EngineConfig {
	fn default() -> Self {
		Self {
			dialect: DialectKind::default(),
			plan_cache_capacity: DEFAULT_PLAN_CACHE_CAPACITY,
			log_sql: true,
		}
	}
}

impl EngineConfig {
	pub fn from_json(json: &str) -> Result<Self> {
		serde_json::from_str(json).map_err(|err| {
			EngineError::InvalidConfig {
				reason: err.to_string(),
			}
			.into()
		})
	}

	pub fn dialect(mut self, dialect: DialectKind) -> Self {
		self.dialect = dialect;
		self
	}

	pub fn plan_cache_capacity(mut self, capacity: usize) -> Self {
		self.plan_cache_capacity = capacity;
		self
	}

	pub fn log_sql(mut self, enabled: bool) -> Self {
		self.log_sql = enabled;
		self
	}
}
