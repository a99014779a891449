// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use setdml_core::Result;

use super::{InsertedBinding, Scopes, Translator, upsert::require_key};
use crate::{
	error::TranslateError,
	query::Query,
	reconcile::{ActionKind, PairState, ReconcilePolicy},
	shape::{InsertShape, MergeShape},
	statement::{MergeNode, Statement},
};

impl Translator<'_> {
	/// Correlates the target rows selected by `query` with the shaped rows of
	/// `source` on the primary key. Which clauses exist follows the same
	/// policy the in-process reconciler applies per pair.
	pub(crate) fn merge(
		&mut self,
		query: &Query,
		source: &Query,
		insert: &InsertShape,
		update: &MergeShape,
		delete_unmatched: bool,
	) -> Result<Statement> {
		if !query.joins.is_empty() {
			return Err(TranslateError::UnsupportedJoin {
				operation: "MERGE",
			}
			.into());
		}
		if insert.is_empty() || update.is_empty() {
			return Err(TranslateError::EmptyShape {
				operation: "MERGE",
			}
			.into());
		}

		let (target, mapping) = self.bind_target(&query.root, "MERGE")?;
		let mut target_scopes = Scopes::new("MERGE");
		target_scopes.row = Some(target.clone());
		let target_filter = self.lower_filter(query, &target_scopes)?;

		let mut columns = Vec::with_capacity(insert.len());
		for assignment in insert.assignments() {
			columns.push(Self::assignable_column(&mapping, &assignment.property)?.to_string());
		}
		require_key(&mapping, &columns)?;

		let shaped = self.shaped_source(source, &mapping, insert, &columns, "MERGE")?;

		let policy = ReconcilePolicy {
			insert: true,
			update: true,
			delete_unmatched,
		};

		let update = if policy.decide(PairState::Matched) == ActionKind::Update {
			let mut scopes = Scopes::new("MERGE");
			scopes.row = Some(target.clone());
			scopes.existing = Some(target.clone());
			scopes.inserted = Some(InsertedBinding::Source {
				node: shaped,
				mapping: mapping.clone(),
				columns: columns.clone(),
			});
			self.matched_update(&mapping, update, &scopes)?
		} else {
			None
		};
		let insert = (policy.decide(PairState::SourceOnly) == ActionKind::Insert).then_some(columns);

		Ok(Statement::Merge(MergeNode {
			target: target.node(),
			target_filter,
			source: shaped,
			on: mapping.primary_key().to_vec(),
			update,
			insert,
			delete_unmatched: policy.decide(PairState::TargetOnly) == ActionKind::Delete,
		}))
	}
}
