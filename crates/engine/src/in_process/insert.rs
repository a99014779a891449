// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use setdml_core::{Result, Row};
use setdml_plan::{Expr, Query};

use super::{Outcome, Pass};

impl<'a> Pass<'a> {
	pub(super) fn insert_into(&self, query: &'a Query, target: &str) -> Result<Outcome> {
		let mapping = self.metadata.mapping(target)?;
		let projection: Vec<(String, Expr)> = match &query.projection {
			Some(projection) => projection.clone(),
			None => mapping
				.properties()
				.filter(|(_, column)| !mapping.is_store_generated(column))
				.map(|(property, _)| (property.to_string(), Expr::field(property)))
				.collect(),
		};

		let mut outcome = Outcome::new(&mapping);
		for combination in self.combinations(query)? {
			let bindings = combination.bindings();
			let mut row = Row::new();
			for (property, expr) in &projection {
				row.set(property.as_str(), self.evaluator.evaluate(expr, &bindings)?);
			}
			outcome.changes.inserts.push(mapping.dematerialize(&row));
		}
		outcome.affected = outcome.changes.inserts.len() as u64;
		Ok(outcome)
	}
}
