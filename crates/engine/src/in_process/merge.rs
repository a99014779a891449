// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::collections::{HashMap, HashSet};

use setdml_core::{Result, Row, Value, return_internal_error};
use setdml_plan::{Action, CorrelatedPair, InsertShape, MergeShape, Plan, Query, Reconciler, RowSource, Statement};

use super::{Outcome, Pass, eval::Bindings, logical_key};
use crate::error::EngineError;

impl<'a> Pass<'a> {
	/// Correlates the filtered target rows with the shaped source rows by
	/// primary key and applies the reconciled action of every pair.
	pub(super) fn merge(
		&self,
		plan: &Plan,
		query: &'a Query,
		source: &'a Query,
		insert: &InsertShape,
		update: &MergeShape,
	) -> Result<Outcome> {
		let Statement::Merge(node) = &plan.statement else {
			return_internal_error!("expected a merge plan, got {}", plan.statement.name());
		};
		let RowSource::Entity(entity) = &query.root else {
			return_internal_error!("merge target is not an entity");
		};
		let table = self.snapshot.table(entity)?;
		let mapping = table.mapping.as_ref();

		let mut candidates: Vec<(Vec<Value>, Row)> = Vec::new();
		let mut by_key: HashMap<Vec<Value>, usize> = HashMap::new();
		for combination in self.combinations(source)? {
			let candidate = self.shape(insert, &combination.bindings())?;
			let key = logical_key(mapping, &candidate);
			if by_key.insert(key.clone(), candidates.len()).is_some() {
				return Err(EngineError::DuplicateSourceKey {
					key,
				}
				.into());
			}
			candidates.push((key, candidate));
		}

		let shaper = |candidate: &Row| -> Result<Row> { Ok(candidate.clone()) };
		let extractor = |existing: &Row, candidate: &Row| -> Result<Row> {
			self.merge_matched(mapping, update, existing, candidate)
		};
		let mut reconciler = Reconciler::<Row>::new().delete_unmatched(node.delete_unmatched);
		if node.insert.is_some() {
			reconciler = reconciler.with_insert(&shaper);
		}
		if node.update.is_some() {
			reconciler = reconciler.with_update(&extractor);
		}

		let mut outcome = Outcome::new(mapping);
		let mut paired = vec![false; candidates.len()];
		for index in 0..table.storage.len() {
			let target = &table.logical[index];
			if let Some(filter) = &query.filter {
				if !self.evaluator.test(filter, &Bindings::row(target))? {
					continue;
				}
			}

			let key = table.key(index);
			let pair = match by_key.get(&key) {
				Some(&position) => {
					paired[position] = true;
					CorrelatedPair::matched(target.clone(), candidates[position].1.clone())
				}
				None => CorrelatedPair::target_only(target.clone()),
			};
			match reconciler.classify(pair)? {
				Action::Update(row) => {
					outcome.affected += 1;
					outcome.changes.updates.push((key, mapping.dematerialize(&row)));
				}
				Action::Delete(_) => {
					outcome.affected += 1;
					outcome.changes.deletes.push(key);
				}
				Action::Insert(_) => return_internal_error!("merge inserted for an existing target row"),
				Action::Skip => {}
			}
		}

		// a source row whose key exists outside the filtered target is left alone
		let stored: HashSet<Vec<Value>> = (0..table.storage.len()).map(|index| table.key(index)).collect();
		for ((key, candidate), paired) in candidates.into_iter().zip(paired) {
			if paired || stored.contains(&key) {
				continue;
			}
			match reconciler.classify(CorrelatedPair::source_only(candidate))? {
				Action::Insert(row) => {
					outcome.affected += 1;
					outcome.changes.inserts.push(mapping.dematerialize(&row));
				}
				Action::Skip => {}
				other => return_internal_error!("merge produced {:?} for a new source row", other.kind()),
			}
		}
		Ok(outcome)
	}
}
