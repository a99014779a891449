// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use setdml_core::Result;

use super::{Scopes, Translator};
use crate::{
	query::Query,
	statement::{DeleteNode, Statement},
};

impl Translator<'_> {
	pub(crate) fn delete(&mut self, query: &Query) -> Result<Statement> {
		let (target, _) = self.bind_target(&query.root, "DELETE")?;
		let mut scopes = Scopes::new("DELETE");
		scopes.row = Some(target.clone());

		let joined = self.bind_joins(query, &mut scopes)?;
		let predicate = self.lower_filter(query, &scopes)?;

		Ok(Statement::Delete(DeleteNode {
			table: target.node(),
			joined,
			predicate,
		}))
	}
}
