// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Caching front end over translate, rewrite and emit.

use std::{
	hash::{Hash, Hasher},
	sync::Arc,
};

use dashmap::DashMap;
use setdml_catalog::MetadataProvider;
use setdml_core::{Params, Result};
use setdml_plan::{Operation, Plan, Query, expand, translate};
use setdml_sql::{BoundStatement, CompiledSql, Dialect, emit};
use tracing::instrument;
use xxhash_rust::xxh3::Xxh3;

/// Statements bound to one call's parameters.
#[derive(Clone, Debug)]
pub struct CompiledPlan {
	pub statements: Vec<BoundStatement>,
	/// `false` when the SQL was sized for this call's row lists.
	pub cacheable: bool,
}

impl CompiledPlan {
	pub fn sql(&self) -> String {
		self.statements.iter().map(|s| s.sql.as_str()).collect::<Vec<_>>().join(";\n")
	}
}

struct CacheEntry {
	query: Query,
	operation: Operation,
	plan: Plan,
	/// Emitted once when the plan needs no row count resolution.
	sql: Option<CompiledSql>,
}

struct Inner {
	metadata: Arc<dyn MetadataProvider>,
	dialect: &'static dyn Dialect,
	cache: DashMap<u64, Arc<CacheEntry>>,
	capacity: usize,
}

#[derive(Clone)]
pub struct PlanCompiler {
	inner: Arc<Inner>,
}

impl PlanCompiler {
	pub fn new(metadata: Arc<dyn MetadataProvider>, dialect: &'static dyn Dialect, capacity: usize) -> Self {
		Self {
			inner: Arc::new(Inner {
				metadata,
				dialect,
				cache: DashMap::new(),
				capacity,
			}),
		}
	}

	pub fn metadata(&self) -> &dyn MetadataProvider {
		self.inner.metadata.as_ref()
	}

	/// Translates `operation` over `query`, reusing an earlier translation.
	#[instrument(name = "engine::compiler::plan", level = "trace", skip_all, fields(operation = operation.name()))]
	pub fn plan(&self, query: &Query, operation: &Operation) -> Result<Plan> {
		Ok(self.entry(query, operation)?.plan.clone())
	}

	#[instrument(name = "engine::compiler::compile", level = "debug", skip_all, fields(operation = operation.name()))]
	pub fn compile(&self, query: &Query, operation: &Operation, params: &Params) -> Result<CompiledPlan> {
		let entry = self.entry(query, operation)?;

		if let Some(sql) = &entry.sql {
			return Ok(CompiledPlan {
				statements: sql.bind(params)?,
				cacheable: true,
			});
		}

		let (plan, cacheable) = expand(&entry.plan, params)?;
		let sql = emit(&plan, self.inner.dialect)?;
		Ok(CompiledPlan {
			statements: sql.bind(params)?,
			cacheable,
		})
	}

	pub fn len(&self) -> usize {
		self.inner.cache.len()
	}

	pub fn is_empty(&self) -> bool {
		self.inner.cache.is_empty()
	}

	pub fn clear(&self) {
		self.inner.cache.clear();
	}

	fn entry(&self, query: &Query, operation: &Operation) -> Result<Arc<CacheEntry>> {
		let key = fingerprint(query, operation);
		if let Some(entry) = self.inner.cache.get(&key) {
			let entry = entry.value().clone();
			if entry.query == *query && entry.operation == *operation {
				tracing::trace!(key, "plan cache hit");
				return Ok(entry);
			}
		}

		let plan = translate(query, operation, self.inner.metadata.as_ref())?;
		let sql = if has_placeholder_rows(&plan) {
			None
		} else {
			Some(emit(&plan, self.inner.dialect)?)
		};
		let entry = Arc::new(CacheEntry {
			query: query.clone(),
			operation: operation.clone(),
			plan,
			sql,
		});

		if self.inner.capacity > 0 {
			if self.inner.cache.len() >= self.inner.capacity {
				self.evict_one();
			}
			self.inner.cache.insert(key, entry.clone());
		}
		Ok(entry)
	}

	fn evict_one(&self) {
		let victim = self.inner.cache.iter().next().map(|e| *e.key());
		if let Some(victim) = victim {
			self.inner.cache.remove(&victim);
		}
	}
}

fn has_placeholder_rows(plan: &Plan) -> bool {
	plan.reachable().into_iter().any(|id| {
		matches!(
			plan.ast.get(id),
			setdml_plan::Node::Values {
				rows: setdml_plan::RowCount::Placeholder,
				..
			}
		)
	})
}

fn fingerprint(query: &Query, operation: &Operation) -> u64 {
	let mut hasher = Xxh3::new();
	query.hash(&mut hasher);
	operation.hash(&mut hasher);
	hasher.finish()
}
