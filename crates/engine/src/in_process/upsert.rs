// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::collections::HashMap;

use indexmap::IndexMap;
use setdml_core::{Result, Row, Value, return_internal_error};
use setdml_plan::{Action, InsertShape, MergeShape, Plan, Query, Reconciler, Statement};

use super::{Outcome, Pass, logical_key};

/// A row of the working set: its current logical form and, for rows that
/// existed before the pass, the key it is stored under.
struct Staged {
	row: Row,
	stored_under: Option<Vec<Value>>,
}

impl<'a> Pass<'a> {
	/// Inserts each shaped source row, or merges it into the target row with
	/// the same key. Later source rows observe the effect of earlier ones.
	pub(super) fn upsert(
		&self,
		plan: &Plan,
		query: &'a Query,
		target: &str,
		insert: &InsertShape,
		update: Option<&MergeShape>,
	) -> Result<Outcome> {
		let Statement::Upsert(node) = &plan.statement else {
			return_internal_error!("expected an upsert plan, got {}", plan.statement.name());
		};
		let table = self.snapshot.table(target)?;
		let mapping = table.mapping.as_ref();

		let existing: HashMap<Vec<Value>, usize> = (0..table.storage.len()).map(|index| (table.key(index), index)).collect();

		// source rows are shaped as they are read
		let shaper = |candidate: &Row| -> Result<Row> { Ok(candidate.clone()) };
		let extractor = |existing: &Row, candidate: &Row| -> Result<Row> {
			match update {
				Some(shape) => self.merge_matched(mapping, shape, existing, candidate),
				None => Ok(existing.clone()),
			}
		};
		let mut reconciler = Reconciler::<Row>::new().with_insert(&shaper);
		if node.update.is_some() {
			reconciler = reconciler.with_update(&extractor);
		}

		let mut outcome = Outcome::new(mapping);
		let mut working: IndexMap<Vec<Value>, Staged> = IndexMap::new();
		for combination in self.combinations(query)? {
			let candidate = self.shape(insert, &combination.bindings())?;
			let key = logical_key(mapping, &candidate);

			let stored_under = match working.get(&key) {
				Some(staged) => staged.stored_under.clone(),
				None => existing.contains_key(&key).then(|| key.clone()),
			};
			let action = {
				let current = match working.get(&key) {
					Some(staged) => Some(&staged.row),
					None => existing.get(&key).map(|index| &table.logical[*index]),
				};
				reconciler.classify_upsert(current, &candidate)?
			};

			match action {
				Action::Insert(row) | Action::Update(row) => {
					outcome.affected += 1;
					working.insert(key, Staged {
						row,
						stored_under,
					});
				}
				Action::Delete(_) => return_internal_error!("upsert produced a delete"),
				Action::Skip => {}
			}
		}

		for (_, staged) in working {
			let storage = mapping.dematerialize(&staged.row);
			match staged.stored_under {
				Some(key) => outcome.changes.updates.push((key, storage)),
				None => outcome.changes.inserts.push(storage),
			}
		}
		Ok(outcome)
	}
}
