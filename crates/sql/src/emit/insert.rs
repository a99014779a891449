// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use setdml_core::Result;
use setdml_plan::SelectIntoNode;

use super::Emitter;
use crate::compiled::SqlStatement;

impl Emitter<'_> {
	pub(crate) fn select_into(mut self, node: &SelectIntoNode) -> Result<SqlStatement> {
		let columns: Vec<String> = node.columns.iter().map(|c| self.quote(c)).collect();
		let select = self.select(node.source)?;
		let sql = format!(
			"INSERT INTO {} ({})\n{}",
			self.table_name(&node.table, node.schema.as_deref()),
			columns.join(", "),
			select
		);
		Ok(self.finish(sql))
	}
}
