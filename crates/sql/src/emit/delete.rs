// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use setdml_core::Result;
use setdml_plan::DeleteNode;

use super::Emitter;
use crate::{compiled::SqlStatement, dialect::DeleteJoin};

impl Emitter<'_> {
	pub(crate) fn delete(mut self, node: &DeleteNode) -> Result<SqlStatement> {
		let target = self.table(node.table)?;

		let sql = match self.dialect.delete_join() {
			DeleteJoin::Using => {
				let mut sql = format!("DELETE FROM {}", target);
				if !node.joined.is_empty() {
					let mut sources = Vec::with_capacity(node.joined.len());
					for join in &node.joined {
						sources.push(self.source(join.source)?);
					}
					sql.push_str(&format!("\nUSING {}", sources.join(", ")));
				}
				let on = node.joined.iter().map(|j| j.on);
				if let Some(predicate) = self.conjunction(on.chain(node.predicate))? {
					sql.push_str(&format!("\nWHERE {}", predicate));
				}
				sql
			}
			DeleteJoin::Exists => {
				let mut sql = format!("DELETE FROM {}", target);
				if node.joined.is_empty() {
					if let Some(predicate) = self.conjunction(node.predicate)? {
						sql.push_str(&format!("\nWHERE {}", predicate));
					}
				} else {
					let mut sources = Vec::with_capacity(node.joined.len());
					for join in &node.joined {
						sources.push(self.source(join.source)?);
					}
					let on = node.joined.iter().map(|j| j.on);
					let mut exists = format!("SELECT 1 FROM {}", sources.join(", "));
					if let Some(predicate) = self.conjunction(on.chain(node.predicate))? {
						exists.push_str(&format!(" WHERE {}", predicate));
					}
					sql.push_str(&format!("\nWHERE EXISTS ({})", exists));
				}
				sql
			}
			DeleteJoin::InnerJoin => {
				let alias = self.alias(node.table)?;
				let mut sql = format!("DELETE {}\nFROM {}", alias, target);
				for join in &node.joined {
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
