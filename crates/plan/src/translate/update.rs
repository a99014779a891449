// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use setdml_core::Result;

use super::{Scopes, Translator};
use crate::{
	error::TranslateError,
	query::Query,
	shape::UpdateShape,
	statement::{Statement, UpdateNode},
};

impl Translator<'_> {
	pub(crate) fn update(&mut self, query: &Query, shape: &UpdateShape) -> Result<Statement> {
		if shape.is_empty() {
			return Err(TranslateError::EmptyShape {
				operation: "UPDATE",
			}
			.into());
		}

		let (target, mapping) = self.bind_target(&query.root, "UPDATE")?;
		let mut scopes = Scopes::new("UPDATE");
		scopes.row = Some(target.clone());

		let from = self.bind_joins(query, &mut scopes)?;
		let predicate = self.lower_filter(query, &scopes)?;

		let mut set = Vec::with_capacity(shape.len());
		for assignment in shape.assignments() {
			let column = Self::assignable_column(&mapping, &assignment.property)?.to_string();
			let value = self.lower_assignment(&mapping, &column, &assignment.value, &scopes)?;
			set.push((column, value));
		}

		Ok(Statement::Update(UpdateNode::new(target.node(), set, from, predicate)))
	}
}
