// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Resolves `VALUES` row counts from bound row lists.

use std::collections::HashMap;

use setdml_core::{Params, Result};
use tracing::instrument;

use crate::{
	ast::{Node, NodeId, RowCount},
	error::BindError,
	statement::Plan,
};

/// Returns the plan with every placeholder row count resolved, plus whether
/// the result may be reused for another call. A plan sized for one list must
/// not serve a list of another length, so any resolution makes it
/// non-cacheable.
#[instrument(name = "plan::rewrite", level = "trace", skip_all)]
pub fn expand(plan: &Plan, params: &Params) -> Result<(Plan, bool)> {
	let mut rewritten = plan.clone();
	let mut substitutions: HashMap<NodeId, NodeId> = HashMap::new();

	for id in plan.reachable() {
		let Node::Values {
			parameter,
			columns,
			converters,
			rows: RowCount::Placeholder,
			alias,
		} = plan.ast.get(id)
		else {
			continue;
		};
		let Some(rows) = params.rows(parameter) else {
			return Err(BindError::ParameterValueCorrupted {
				parameter: parameter.clone(),
			}
			.into());
		};
		let resolved = rewritten.ast.push(Node::Values {
			parameter: parameter.clone(),
			columns: columns.clone(),
			converters: converters.clone(),
			rows: RowCount::Resolved(rows.len()),
			alias: alias.clone(),
		});
		tracing::trace!(parameter = parameter.as_str(), rows = rows.len(), "resolved values row count");
		substitutions.insert(id, resolved);
	}

	if substitutions.is_empty() {
		return Ok((rewritten, true));
	}

	rewritten.ast.substitute(&substitutions);
	let f = |id: NodeId| substitutions.get(&id).copied().unwrap_or(id);
	rewritten.statement.map_refs(&f);
	Ok((rewritten, false))
}
