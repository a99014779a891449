// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use setdml_core::Result;
use setdml_plan::UpdateNode;

use super::Emitter;
use crate::{compiled::SqlStatement, dialect::UpdateJoin};

impl Emitter<'_> {
	pub(crate) fn update(mut self, node: &UpdateNode) -> Result<SqlStatement> {
		let sql = match self.dialect.update_join() {
			UpdateJoin::From => {
				let target = self.table(node.table)?;
				let set = self.assignments(&node.set)?;
				let mut sql = format!("UPDATE {}\nSET {}", target, set);
				if !node.from.is_empty() {
					let mut sources = Vec::with_capacity(node.from.len());
					for join in &node.from {
						sources.push(self.source(join.source)?);
					}
					sql.push_str(&format!("\nFROM {}", sources.join(", ")));
				}
				let on = node.from.iter().map(|j| j.on);
				if let Some(predicate) = self.conjunction(on.chain(node.predicate))? {
					sql.push_str(&format!("\nWHERE {}", predicate));
				}
				sql
			}
			UpdateJoin::InnerJoin => {
				// the joined form names the target by alias and needs its
				// physical table for the FROM clause
				let mut node = node.clone();
				node.expand(self.ast)?;
				let Some(expanded) = node.expanded() else {
					setdml_core::return_internal_error!("update target did not expand");
				};
				let alias = self.quote(&expanded.alias);
				let table = self.table_name(&expanded.name, expanded.schema.as_deref());

				let set = self.assignments(&node.set)?;
				let mut sql = format!("UPDATE {}\nSET {}\nFROM {} AS {}", alias, set, table, alias);
				for join in &node.from {
					sql.push_str(&self.inner_join(join)?);
				}
				if let Some(predicate) = self.conjunction(node.predicate)? {
					sql.push_str(&format!("\nWHERE {}", predicate));
				}
				sql
			}
		};

		Ok(self.finish(sql))
	}
}
