// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use setdml_core::{Result, return_internal_error};
use setdml_plan::{Query, RowSource};

use super::{Outcome, Pass};

impl<'a> Pass<'a> {
	/// Removes every target row that at least one join combination selects.
	pub(super) fn delete(&self, query: &'a Query) -> Result<Outcome> {
		let RowSource::Entity(entity) = &query.root else {
			return_internal_error!("delete target is not an entity");
		};
		let table = self.snapshot.table(entity)?;
		let mut outcome = Outcome::new(&table.mapping);

		let mut deleted = vec![false; table.storage.len()];
		for combination in self.combinations(query)? {
			if !deleted[combination.index] {
				deleted[combination.index] = true;
				outcome.changes.deletes.push(table.key(combination.index));
			}
		}
		outcome.affected = outcome.changes.deletes.len() as u64;
		Ok(outcome)
	}
}
