// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Direct execution against a [`Store`]: read every table an operation
//! touches into a snapshot, reconcile in a single pass over the source rows,
//! then commit the staged changes of the target table at once.

use std::{collections::HashMap, sync::Arc};

use futures_util::StreamExt;
use setdml_catalog::{EntityMapping, MetadataProvider};
use setdml_core::{CancellationToken, Params, Result, Row, Value, return_internal_error};
use setdml_plan::{BindError, Operation, Plan, Query, RowSource, Shape};
use tracing::instrument;

use crate::backend::{ChangeSet, Store};

mod delete;
mod eval;
mod insert;
mod merge;
mod update;
mod upsert;

use eval::{Bindings, Evaluator};

/// Storage rows of one entity and their logical form, index aligned.
pub(crate) struct Table {
	mapping: Arc<EntityMapping>,
	storage: Vec<Row>,
	logical: Vec<Row>,
}

impl Table {
	fn new(mapping: Arc<EntityMapping>) -> Self {
		Self {
			mapping,
			storage: Vec::new(),
			logical: Vec::new(),
		}
	}

	fn push(&mut self, storage: Row) {
		self.logical.push(self.mapping.materialize(&storage));
		self.storage.push(storage);
	}

	/// Primary key of the row at `index`, in storage form.
	fn key(&self, index: usize) -> Vec<Value> {
		key_of(&self.mapping, &self.storage[index])
	}
}

fn key_of(mapping: &EntityMapping, storage: &Row) -> Vec<Value> {
	mapping.primary_key().iter().map(|column| storage.value(column).clone()).collect()
}

/// Storage key of a logical row.
fn logical_key(mapping: &EntityMapping, row: &Row) -> Vec<Value> {
	mapping.primary_key()
		.iter()
		.map(|column| {
			let property = mapping.property_of(column).unwrap_or(column.as_str());
			mapping.to_storage(column, row.value(property))
		})
		.collect()
}

/// Every table an operation reads, loaded before any row is reconciled.
pub(crate) struct Snapshot {
	tables: HashMap<String, Table>,
}

impl Snapshot {
	fn table(&self, entity: &str) -> Result<&Table> {
		match self.tables.get(entity) {
			Some(table) => Ok(table),
			None => return_internal_error!("entity `{}` was not loaded", entity),
		}
	}

	fn fetch(
		store: &dyn Store,
		metadata: &dyn MetadataProvider,
		entities: &[String],
		cancel: &CancellationToken,
	) -> Result<Self> {
		let mut tables = HashMap::with_capacity(entities.len());
		for entity in entities {
			let mut table = Table::new(metadata.mapping(entity)?);
			cancel.check()?;
			for row in store.scan(table.mapping.table())? {
				cancel.check()?;
				table.push(row?);
			}
			tables.insert(entity.clone(), table);
		}
		Ok(Self {
			tables,
		})
	}

	async fn fetch_async(
		store: &dyn Store,
		metadata: &dyn MetadataProvider,
		entities: &[String],
		cancel: &CancellationToken,
	) -> Result<Self> {
		let mut tables = HashMap::with_capacity(entities.len());
		for entity in entities {
			let mut table = Table::new(metadata.mapping(entity)?);
			let mut rows = store.stream(table.mapping.table());
			loop {
				cancel.check()?;
				match rows.next().await {
					Some(row) => table.push(row?),
					None => break,
				}
			}
			tables.insert(entity.clone(), table);
		}
		Ok(Self {
			tables,
		})
	}
}

/// Entities whose rows an operation reads, without duplicates.
fn entities(query: &Query, operation: &Operation) -> Vec<String> {
	let mut entities = Vec::new();
	let mut add = |source: &RowSource| {
		if let RowSource::Entity(entity) = source {
			if !entities.contains(entity) {
				entities.push(entity.clone());
			}
		}
	};
	let mut add_query = |query: &Query| {
		add(&query.root);
		for join in &query.joins {
			add(&join.source);
		}
	};

	add_query(query);
	match operation {
		Operation::Upsert {
			target,
			..
		} => add_query(&Query::from_entity(target.as_str())),
		Operation::Merge {
			source,
			..
		} => add_query(source),
		Operation::Delete
		| Operation::Update(_)
		| Operation::InsertInto {
			..
		} => {}
	}
	entities
}

/// Staged mutations of one table and the number of actions behind them.
pub(crate) struct Outcome {
	pub table: String,
	pub changes: ChangeSet,
	pub affected: u64,
}

impl Outcome {
	fn new(mapping: &EntityMapping) -> Self {
		Self {
			table: mapping.table().to_string(),
			changes: ChangeSet::new(mapping.primary_key().to_vec(), mapping.identity().map(str::to_string)),
			affected: 0,
		}
	}
}

/// One source row: the root row, its index when the root is an entity, and
/// one row per join.
struct Combination<'a> {
	index: usize,
	root: &'a Row,
	joined: Vec<(&'a str, &'a Row)>,
}

impl<'a> Combination<'a> {
	fn bindings(&self) -> Bindings<'a> {
		Bindings::joined(self.root, self.joined.clone())
	}
}

/// A single reconciliation pass over a loaded snapshot.
pub(crate) struct Pass<'a> {
	snapshot: &'a Snapshot,
	metadata: &'a dyn MetadataProvider,
	params: &'a Params,
	evaluator: Evaluator<'a>,
}

impl<'a> Pass<'a> {
	fn new(snapshot: &'a Snapshot, metadata: &'a dyn MetadataProvider, params: &'a Params) -> Self {
		Self {
			snapshot,
			metadata,
			params,
			evaluator: Evaluator::new(params),
		}
	}

	fn apply(&self, plan: &Plan, query: &'a Query, operation: &'a Operation) -> Result<Outcome> {
		match operation {
			Operation::Delete => self.delete(query),
			Operation::Update(shape) => self.update(query, shape),
			Operation::InsertInto {
				target,
			} => self.insert_into(query, target),
			Operation::Upsert {
				target,
				insert,
				update,
			} => self.upsert(plan, query, target, insert, update.as_ref()),
			Operation::Merge {
				source,
				insert,
				update,
				..
			} => self.merge(plan, query, source, insert, update),
		}
	}

	fn rows(&self, source: &RowSource) -> Result<&'a [Row]> {
		match source {
			RowSource::Entity(entity) => Ok(self.snapshot.table(entity)?.logical.as_slice()),
			RowSource::Local {
				parameter,
				..
			} => self.params.rows(parameter).ok_or_else(|| {
				BindError::ParameterValueCorrupted {
					parameter: parameter.clone(),
				}
				.into()
			}),
		}
	}

	/// Root rows joined with every join source, keeping the combinations
	/// for which every join condition and the filter hold.
	fn combinations(&self, query: &'a Query) -> Result<Vec<Combination<'a>>> {
		let root = self.rows(&query.root)?;
		let mut joins = Vec::with_capacity(query.joins.len());
		for join in &query.joins {
			joins.push((join.alias.as_str(), self.rows(&join.source)?));
		}

		let mut result = Vec::new();
		for (index, row) in root.iter().enumerate() {
			let mut partial: Vec<Vec<(&'a str, &'a Row)>> = vec![Vec::new()];
			for &(alias, rows) in &joins {
				let mut extended = Vec::with_capacity(partial.len() * rows.len());
				for prefix in &partial {
					for joined in rows.iter() {
						let mut next = prefix.clone();
						next.push((alias, joined));
						extended.push(next);
					}
				}
				partial = extended;
			}

			for joined in partial {
				let combination = Combination {
					index,
					root: row,
					joined,
				};
				if self.accepts(query, &combination)? {
					result.push(combination);
				}
			}
		}
		Ok(result)
	}

	fn accepts(&self, query: &Query, combination: &Combination) -> Result<bool> {
		let bindings = combination.bindings();
		for join in &query.joins {
			if !self.evaluator.test(&join.on, &bindings)? {
				return Ok(false);
			}
		}
		match &query.filter {
			Some(filter) => self.evaluator.test(filter, &bindings),
			None => Ok(true),
		}
	}

	/// Applies an insert shape to a source row, giving a logical target row.
	fn shape(&self, shape: &Shape, bindings: &Bindings) -> Result<Row> {
		let mut row = Row::new();
		for assignment in shape.assignments() {
			row.set(assignment.property.as_str(), self.evaluator.evaluate(&assignment.value, bindings)?);
		}
		Ok(row)
	}

	/// Applies a merge shape over an existing target and its candidate. Key
	/// properties keep their existing values.
	fn merge_matched(&self, mapping: &EntityMapping, shape: &Shape, existing: &Row, candidate: &Row) -> Result<Row> {
		let bindings = Bindings::matched(existing, candidate);
		let mut merged = existing.clone();
		for assignment in shape.assignments() {
			let is_key = mapping.column_of(&assignment.property).is_some_and(|column| mapping.is_key_column(column));
			if is_key {
				continue;
			}
			merged.set(assignment.property.as_str(), self.evaluator.evaluate(&assignment.value, &bindings)?);
		}
		Ok(merged)
	}
}

#[instrument(name = "engine::in_process::run", level = "debug", skip_all, fields(operation = operation.name()))]
pub(crate) fn run(
	store: &dyn Store,
	metadata: &dyn MetadataProvider,
	plan: &Plan,
	query: &Query,
	operation: &Operation,
	params: &Params,
	cancel: &CancellationToken,
) -> Result<u64> {
	let snapshot = Snapshot::fetch(store, metadata, &entities(query, operation), cancel)?;
	let outcome = Pass::new(&snapshot, metadata, params).apply(plan, query, operation)?;
	cancel.check()?;
	if outcome.changes.is_empty() {
		return Ok(outcome.affected);
	}
	tracing::debug!(table = %outcome.table, changes = outcome.changes.len(), "committing");
	store.commit(&outcome.table, outcome.changes)?;
	Ok(outcome.affected)
}

#[instrument(name = "engine::in_process::run_async", level = "debug", skip_all, fields(operation = operation.name()))]
pub(crate) async fn run_async(
	store: &dyn Store,
	metadata: &dyn MetadataProvider,
	plan: &Plan,
	query: &Query,
	operation: &Operation,
	params: &Params,
	cancel: &CancellationToken,
) -> Result<u64> {
	let snapshot = Snapshot::fetch_async(store, metadata, &entities(query, operation), cancel).await?;
	let outcome = Pass::new(&snapshot, metadata, params).apply(plan, query, operation)?;
	cancel.check()?;
	if outcome.changes.is_empty() {
		return Ok(outcome.affected);
	}
	tracing::debug!(table = %outcome.table, changes = outcome.changes.len(), "committing");
	store.commit_async(&outcome.table, outcome.changes).await?;
	Ok(outcome.affected)
}
