// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use setdml_catalog::EntityMapping;
use setdml_core::Result;

use super::{Binding, InsertedBinding, SOURCE_ALIAS, Scopes, TARGET_ALIAS, Translator};
use crate::{
	ast::{Node, RowCount},
	error::TranslateError,
	query::{Query, RowSource},
	shape::{InsertShape, MergeShape},
	statement::{ConflictTarget, Statement, UpsertNode, UpsertSource},
};

impl Translator<'_> {
	pub(crate) fn upsert(
		&mut self,
		query: &Query,
		target: &str,
		insert: &InsertShape,
		update: Option<&MergeShape>,
	) -> Result<Statement> {
		if insert.is_empty() {
			return Err(TranslateError::EmptyShape {
				operation: "UPSERT",
			}
			.into());
		}
		let mapping = self.metadata.mapping(target)?;

		let mut columns = Vec::with_capacity(insert.len());
		for assignment in insert.assignments() {
			columns.push(Self::assignable_column(&mapping, &assignment.property)?.to_string());
		}
		require_key(&mapping, &columns)?;

		let source = match passthrough(query, insert)? {
			Some((parameter, locals)) => {
				let converters = columns.iter().map(|c| mapping.converter(c).cloned()).collect();
				UpsertSource::Values(self.ast.push(Node::Values {
					parameter,
					columns: locals,
					converters,
					rows: RowCount::Placeholder,
					alias: SOURCE_ALIAS.to_string(),
				}))
			}
			None => UpsertSource::Select(self.shaped_source(query, &mapping, insert, &columns, "UPSERT")?),
		};

		let update = match update {
			Some(shape) => {
				let node = self.ast.push(Node::Table {
					name: mapping.table().to_string(),
					schema: mapping.schema().map(str::to_string),
					alias: TARGET_ALIAS.to_string(),
				});
				let existing = Binding::Entity {
					node,
					mapping: mapping.clone(),
				};
				let mut scopes = Scopes::new("UPSERT");
				scopes.row = Some(existing.clone());
				scopes.existing = Some(existing);
				scopes.inserted = Some(InsertedBinding::Excluded {
					mapping: mapping.clone(),
					columns: columns.clone(),
				});
				self.matched_update(&mapping, shape, &scopes)?
			}
			None => None,
		};

		Ok(Statement::Upsert(UpsertNode {
			table: mapping.table().to_string(),
			schema: mapping.schema().map(str::to_string),
			alias: TARGET_ALIAS.to_string(),
			source,
			conflict: ConflictTarget {
				constraint: mapping.key_constraint().to_string(),
				columns: mapping.primary_key().to_vec(),
			},
			columns,
			update,
		}))
	}
}

/// Every key column must be written by the insert shape, otherwise source
/// rows cannot be correlated with the target.
pub(super) fn require_key(mapping: &EntityMapping, columns: &[String]) -> Result<()> {
	for key in mapping.primary_key() {
		if !columns.contains(key) {
			return Err(TranslateError::MissingJoinKey {
				entity: mapping.entity().to_string(),
				property: mapping.property_of(key).unwrap_or(key.as_str()).to_string(),
			}
			.into());
		}
	}
	Ok(())
}

/// A local row list copied column for column needs no `SELECT`: the rows
/// become the `VALUES` of the insert. Returns the parameter and the local
/// column read by each assignment.
fn passthrough(query: &Query, insert: &InsertShape) -> Result<Option<(String, Vec<String>)>> {
	let RowSource::Local {
		parameter,
		columns,
	} = &query.root
	else {
		return Ok(None);
	};
	if !query.joins.is_empty() || query.filter.is_some() {
		return Ok(None);
	}

	let mut locals = Vec::with_capacity(insert.len());
	for assignment in insert.assignments() {
		let Some(local) = assignment.value.as_row_field() else {
			return Ok(None);
		};
		if !columns.iter().any(|c| c == local) {
			return Err(TranslateError::UnknownLocalColumn {
				parameter: parameter.clone(),
				column: local.to_string(),
			}
			.into());
		}
		locals.push(local.to_string());
	}
	Ok(Some((parameter.clone(), locals)))
}
