// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Public operation surface: each batch operation in a synchronous, an
//! asynchronous cancellable and a compile-only form.

use setdml_core::{CancellationToken, Params, Result, Row, Value};
use setdml_plan::{InsertShape, MergeShape, Operation, Query, UpdateShape};
use tracing::instrument;

use crate::{compiler::CompiledPlan, engine::Engine};

/// A query plus the runtime parameters it is executed with.
pub struct BatchQuery<'e> {
	engine: &'e Engine,
	query: Query,
	params: Params,
}

impl<'e> BatchQuery<'e> {
	pub(crate) fn new(engine: &'e Engine, query: Query) -> Self {
		Self {
			engine,
			query,
			params: Params::new(),
		}
	}

	/// Binds a scalar parameter.
	pub fn param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
		self.params = self.params.with_value(name, value);
		self
	}

	/// Binds the row list feeding a local row source.
	pub fn rows(mut self, name: impl Into<String>, rows: Vec<Row>) -> Self {
		self.params = self.params.with_rows(name, rows);
		self
	}

	pub fn params(mut self, params: Params) -> Self {
		self.params = params;
		self
	}

	pub fn query(&self) -> &Query {
		&self.query
	}

	fn run(&self, operation: &Operation) -> Result<u64> {
		self.engine.execute(&self.query, operation, &self.params)
	}

	async fn run_async(&self, operation: &Operation, cancel: &CancellationToken) -> Result<u64> {
		self.engine.execute_async(&self.query, operation, &self.params, cancel).await
	}

	fn sql(&self, operation: &Operation) -> Result<CompiledPlan> {
		self.engine.compile(&self.query, operation, &self.params)
	}

	#[instrument(name = "engine::batch::delete", level = "trace", skip_all)]
	pub fn delete(&self) -> Result<u64> {
		self.run(&Operation::Delete)
	}

	pub async fn delete_async(&self, cancel: &CancellationToken) -> Result<u64> {
		self.run_async(&Operation::Delete, cancel).await
	}

	pub fn delete_sql(&self) -> Result<CompiledPlan> {
		self.sql(&Operation::Delete)
	}

	#[instrument(name = "engine::batch::update", level = "trace", skip_all)]
	pub fn update(&self, shape: UpdateShape) -> Result<u64> {
		self.run(&Operation::Update(shape))
	}

	pub async fn update_async(&self, shape: UpdateShape, cancel: &CancellationToken) -> Result<u64> {
		self.run_async(&Operation::Update(shape), cancel).await
	}

	pub fn update_sql(&self, shape: UpdateShape) -> Result<CompiledPlan> {
		self.sql(&Operation::Update(shape))
	}

	#[instrument(name = "engine::batch::insert_into", level = "trace", skip_all, fields(entity = target))]
	pub fn insert_into(&self, target: &str) -> Result<u64> {
		self.run(&insert_into(target))
	}

	pub async fn insert_into_async(&self, target: &str, cancel: &CancellationToken) -> Result<u64> {
		self.run_async(&insert_into(target), cancel).await
	}

	pub fn insert_into_sql(&self, target: &str) -> Result<CompiledPlan> {
		self.sql(&insert_into(target))
	}

	/// Inserts the shaped rows into `target`. On key conflict the existing
	/// row is merged through `update`, or left untouched without one.
	#[instrument(name = "engine::batch::upsert", level = "trace", skip_all, fields(entity = target))]
	pub fn upsert(&self, target: &str, insert: InsertShape, update: Option<MergeShape>) -> Result<u64> {
		self.run(&upsert(target, insert, update))
	}

	pub async fn upsert_async(
		&self,
		target: &str,
		insert: InsertShape,
		update: Option<MergeShape>,
		cancel: &CancellationToken,
	) -> Result<u64> {
		self.run_async(&upsert(target, insert, update), cancel).await
	}

	pub fn upsert_sql(&self, target: &str, insert: InsertShape, update: Option<MergeShape>) -> Result<CompiledPlan> {
		self.sql(&upsert(target, insert, update))
	}

	/// Reconciles the target rows of this query with the shaped rows of
	/// `source`, correlated by primary key.
	#[instrument(name = "engine::batch::merge", level = "trace", skip_all, fields(delete_unmatched))]
	pub fn merge(&self, source: Query, insert: InsertShape, update: MergeShape, delete_unmatched: bool) -> Result<u64> {
		self.run(&merge(source, insert, update, delete_unmatched))
	}

	pub async fn merge_async(
		&self,
		source: Query,
		insert: InsertShape,
		update: MergeShape,
		delete_unmatched: bool,
		cancel: &CancellationToken,
	) -> Result<u64> {
		self.run_async(&merge(source, insert, update, delete_unmatched), cancel).await
	}

	pub fn merge_sql(
		&self,
		source: Query,
		insert: InsertShape,
		update: MergeShape,
		delete_unmatched: bool,
	) -> Result<CompiledPlan> {
		self.sql(&merge(source, insert, update, delete_unmatched))
	}
}

fn insert_into(target: &str) -> Operation {
	Operation::InsertInto {
		target: target.to_string(),
	}
}

fn upsert(target: &str, insert: InsertShape, update: Option<MergeShape>) -> Operation {
	Operation::Upsert {
		target: target.to_string(),
		insert,
		update,
	}
}

fn merge(source: Query, insert: InsertShape, update: MergeShape, delete_unmatched: bool) -> Operation {
	Operation::Merge {
		source,
		insert,
		update,
		delete_unmatched,
	}
}
