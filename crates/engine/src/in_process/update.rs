// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use setdml_core::{Result, Row, return_internal_error};
use setdml_plan::{Query, RowSource, UpdateShape};

use super::{Outcome, Pass};

impl<'a> Pass<'a> {
	/// Rewrites each selected target row once, using the first join
	/// combination that selects it.
	pub(super) fn update(&self, query: &'a Query, shape: &UpdateShape) -> Result<Outcome> {
		let RowSource::Entity(entity) = &query.root else {
			return_internal_error!("update target is not an entity");
		};
		let table = self.snapshot.table(entity)?;
		let mut outcome = Outcome::new(&table.mapping);

		let mut updated = vec![false; table.storage.len()];
		for combination in self.combinations(query)? {
			if updated[combination.index] {
				continue;
			}
			updated[combination.index] = true;

			let bindings = combination.bindings();
			let mut assigned = Row::new();
			for assignment in shape.assignments() {
				assigned.set(assignment.property.as_str(), self.evaluator.evaluate(&assignment.value, &bindings)?);
			}
			outcome.changes.updates.push((table.key(combination.index), table.mapping.dematerialize(&assigned)));
		}
		outcome.affected = outcome.changes.updates.len() as u64;
		Ok(outcome)
	}
}
