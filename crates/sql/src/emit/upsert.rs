// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use setdml_core::Result;
use setdml_plan::{Node, UpsertNode, UpsertSource};

use super::Emitter;
use crate::{compiled::SqlStatement, dialect::ConflictStyle};

impl Emitter<'_> {
	pub(crate) fn upsert(mut self, node: &UpsertNode) -> Result<SqlStatement> {
		let sql = match self.dialect.conflict_style() {
			ConflictStyle::Merge => self.upsert_merge(node)?,
			style => self.upsert_on_conflict(node, style)?,
		};
		Ok(self.finish(sql))
	}

	fn upsert_on_conflict(&mut self, node: &UpsertNode, style: ConflictStyle) -> Result<String> {
		let columns: Vec<String> = node.columns.iter().map(|c| self.quote(c)).collect();
		let mut sql = format!(
			"INSERT INTO {} AS {} ({})\n",
			self.table_name(&node.table, node.schema.as_deref()),
			self.quote(&node.alias),
			columns.join(", ")
		);

		// sqlite reads ON CONFLICT after a bare SELECT as a join constraint
		let (body, unfiltered_select) = match node.source {
			UpsertSource::Values(id) => {
				let tuples = self.values_rows(id)?;
				if tuples.is_empty() {
					(format!("SELECT *\nFROM {}", self.values_as(id, &node.columns)?), true)
				} else {
					let rows: Vec<String> = tuples.iter().map(|t| format!("{}{}", super::INDENT, t)).collect();
					(format!("VALUES\n{}", rows.join(",\n")), false)
				}
			}
			UpsertSource::Select(id) => {
				let unfiltered = matches!(
					self.ast.get(id),
					Node::Select {
						predicate: None,
						..
					}
				);
				(self.select(id)?, unfiltered)
			}
		};
		sql.push_str(&body);
		if unfiltered_select && self.dialect.select_needs_where_before_conflict() {
			sql.push_str(&format!("\nWHERE {}", self.dialect.truth(true)));
		}

		let target = match style {
			ConflictStyle::Constraint => format!("ON CONSTRAINT {}", self.quote(&node.conflict.constraint)),
			_ => format!(
				"({})",
				node.conflict.columns.iter().map(|c| self.quote(c)).collect::<Vec<_>>().join(", ")
			),
		};
		match &node.update {
			Some(set) => {
				let set = self.assignments(set)?;
				sql.push_str(&format!("\nON CONFLICT {} DO UPDATE SET {}", target, set));
			}
			None => sql.push_str(&format!("\nON CONFLICT {} DO NOTHING", target)),
		}
		Ok(sql)
	}

	fn upsert_merge(&mut self, node: &UpsertNode) -> Result<String> {
		let source = match node.source {
			UpsertSource::Values(id) => self.values_as(id, &node.columns)?,
			UpsertSource::Select(id) => self.source(id)?,
		};
		let source_alias = setdml_plan::SOURCE_ALIAS;

		let mut sql = format!(
			"MERGE INTO {} AS {}\nUSING {}\nON {}",
			self.table_name(&node.table, node.schema.as_deref()),
			self.quote(&node.alias),
			source,
			self.key_match(&node.alias, source_alias, &node.conflict.columns)
		);
		if let Some(set) = &node.update {
			let set = self.assignments(set)?;
			sql.push_str(&format!("\nWHEN MATCHED THEN UPDATE SET {}", set));
		}
		let columns: Vec<String> = node.columns.iter().map(|c| self.quote(c)).collect();
		let values: Vec<String> =
			node.columns.iter().map(|c| format!("{}.{}", self.quote(source_alias), self.quote(c))).collect();
		sql.push_str(&format!(
			"\nWHEN NOT MATCHED THEN INSERT ({}) VALUES ({});",
			columns.join(", "),
			values.join(", ")
		));
		Ok(sql)
	}
}
