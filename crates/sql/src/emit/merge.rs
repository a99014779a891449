// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use setdml_core::{Result, return_internal_error};
use setdml_plan::{Ast, MergeNode, Node, SOURCE_ALIAS};

use super::Emitter;
use crate::{compiled::SqlStatement, dialect::Dialect};

/// A single `MERGE` where the dialect has one, otherwise DELETE, UPDATE and
/// INSERT statements over the same correlation. Each statement touches a
/// disjoint set of pairs, so the sequence has the same effect.
pub(crate) fn emit(ast: &Ast, dialect: &dyn Dialect, node: &MergeNode) -> Result<Vec<SqlStatement>> {
	if dialect.supports_merge() {
		return Ok(vec![Emitter::new(ast, dialect).merge(node)?]);
	}

	let mut statements = Vec::with_capacity(3);
	if node.delete_unmatched {
		statements.push(Emitter::new(ast, dialect).merge_delete(node)?);
	}
	if node.update.is_some() {
		statements.push(Emitter::new(ast, dialect).merge_update(node)?);
	}
	if node.insert.is_some() {
		statements.push(Emitter::new(ast, dialect).merge_insert(node)?);
	}
	Ok(statements)
}

impl Emitter<'_> {
	fn target_alias(&self, node: &MergeNode) -> Result<String> {
		match self.ast.get(node.target) {
			Node::Table {
				alias,
				..
			} => Ok(alias.clone()),
			other => return_internal_error!("merge target is not a table: {:?}", other),
		}
	}

	fn merge(mut self, node: &MergeNode) -> Result<SqlStatement> {
		let alias = self.target_alias(node)?;
		let target = self.table(node.target)?;
		let source = self.source(node.source)?;

		let mut sql = format!(
			"MERGE INTO {}\nUSING {}\nON {}",
			target,
			source,
			self.key_match(&alias, SOURCE_ALIAS, &node.on)
		);

		if let Some(set) = &node.update {
			let condition = match node.target_filter {
				Some(filter) => format!(" AND {}", self.operand(filter)?),
				None => String::new(),
			};
			let set = self.assignments(set)?;
			sql.push_str(&format!("\nWHEN MATCHED{} THEN UPDATE SET {}", condition, set));
		}
		if let Some(columns) = &node.insert {
			let names: Vec<String> = columns.iter().map(|c| self.quote(c)).collect();
			let values: Vec<String> =
				columns.iter().map(|c| format!("{}.{}", self.quote(SOURCE_ALIAS), self.quote(c))).collect();
			sql.push_str(&format!(
				"\nWHEN NOT MATCHED BY TARGET THEN INSERT ({}) VALUES ({})",
				names.join(", "),
				values.join(", ")
			));
		}
		if node.delete_unmatched {
			let condition = match node.target_filter {
				Some(filter) => format!(" AND {}", self.operand(filter)?),
				None => String::new(),
			};
			sql.push_str(&format!("\nWHEN NOT MATCHED BY SOURCE{} THEN DELETE", condition));
		}
		sql.push(';');

		Ok(self.finish(sql))
	}

	fn merge_delete(mut self, node: &MergeNode) -> Result<SqlStatement> {
		let alias = self.target_alias(node)?;
		let target = self.table(node.target)?;
		let source = self.source(node.source)?;

		let unmatched = format!(
			"NOT EXISTS (SELECT 1 FROM {} WHERE {})",
			source,
			self.key_match(&alias, SOURCE_ALIAS, &node.on)
		);
		let condition = match node.target_filter {
			Some(filter) => format!("{} AND {}", self.operand(filter)?, unmatched),
			None => unmatched,
		};
		let sql = format!("DELETE FROM {}\nWHERE {}", target, condition);
		Ok(self.finish(sql))
	}

	fn merge_update(mut self, node: &MergeNode) -> Result<SqlStatement> {
		let Some(set) = &node.update else {
			return_internal_error!("merge has no update clause");
		};
		let alias = self.target_alias(node)?;
		let target = self.table(node.target)?;
		let set = self.assignments(set)?;
		let source = self.source(node.source)?;

		let mut condition = self.key_match(&alias, SOURCE_ALIAS, &node.on);
		if let Some(filter) = node.target_filter {
			condition.push_str(&format!(" AND {}", self.operand(filter)?));
		}
		let sql = format!("UPDATE {}\nSET {}\nFROM {}\nWHERE {}", target, set, source, condition);
		Ok(self.finish(sql))
	}

	/// Inserts source rows whose key is absent from the whole target table,
	/// not only from the filtered part.
	fn merge_insert(mut self, node: &MergeNode) -> Result<SqlStatement> {
		let Some(columns) = &node.insert else {
			return_internal_error!("merge has no insert clause");
		};
		let ast = self.ast;
		let Node::Table {
			name,
			schema,
			alias,
		} = ast.get(node.target)
		else {
			return_internal_error!("merge target is not a table");
		};
		let table = self.table_name(name, schema.as_deref());
		let target = self.table(node.target)?;
		let source = self.source(node.source)?;

		let names: Vec<String> = columns.iter().map(|c| self.quote(c)).collect();
		let values: Vec<String> =
			columns.iter().map(|c| format!("{}.{}", self.quote(SOURCE_ALIAS), self.quote(c))).collect();
		let sql = format!(
			"INSERT INTO {} ({})\nSELECT {}\nFROM {}\nWHERE NOT EXISTS (SELECT 1 FROM {} WHERE {})",
			table,
			names.join(", "),
			values.join(", "),
			source,
			target,
			self.key_match(alias, SOURCE_ALIAS, &node.on)
		);
		Ok(self.finish(sql))
	}
}
