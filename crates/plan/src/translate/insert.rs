// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use setdml_core::Result;

use super::{SOURCE_ALIAS, SOURCE_ROOT_ALIAS, Scopes, Translator};
use crate::{
	ast::Node,
	error::TranslateError,
	query::{Expr, Query},
	statement::{SelectIntoNode, Statement},
};

impl Translator<'_> {
	/// `INSERT INTO target SELECT ..`. Without an explicit projection every
	/// assignable target property is read from the same-named source field.
	pub(crate) fn insert_into(&mut self, query: &Query, target: &str) -> Result<Statement> {
		let mapping = self.metadata.mapping(target)?;

		let projection: Vec<(String, Expr)> = match &query.projection {
			Some(projection) => projection.clone(),
			None => mapping
				.properties()
				.filter(|(_, column)| !mapping.is_store_generated(column))
				.map(|(property, _)| (property.to_string(), Expr::field(property)))
				.collect(),
		};
		if projection.is_empty() {
			return Err(TranslateError::EmptyShape {
				operation: "INSERT",
			}
			.into());
		}

		let root = self.bind(&query.root, SOURCE_ROOT_ALIAS)?;
		let mut scopes = Scopes::new("INSERT");
		scopes.row = Some(root.clone());
		let joins = self.bind_joins(query, &mut scopes)?;
		let predicate = self.lower_filter(query, &scopes)?;

		let mut columns = Vec::with_capacity(projection.len());
		let mut selected = Vec::with_capacity(projection.len());
		for (property, expr) in &projection {
			let column = Self::assignable_column(&mapping, property)?.to_string();
			let value = self.lower_assignment(&mapping, &column, expr, &scopes)?;
			columns.push(column.clone());
			selected.push((column, value));
		}

		self.convert_local(&root, &mapping, columns.iter().zip(projection.iter().map(|(_, e)| e)));

		let source = self.ast.push(Node::Select {
			alias: SOURCE_ALIAS.to_string(),
			columns: selected,
			from: root.node(),
			joins,
			predicate,
		});

		Ok(Statement::SelectInto(SelectIntoNode {
			table: mapping.table().to_string(),
			schema: mapping.schema().map(str::to_string),
			columns,
			source,
		}))
	}
}
