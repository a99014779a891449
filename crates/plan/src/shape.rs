// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use crate::query::{Expr, Query};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Assignment {
	pub property: String,
	pub value: Expr,
}

/// An ordered list of `property <- expression` assignments describing a row.
///
/// The same structure describes three strategies, distinguished by the scopes
/// their expressions may read:
/// - [`UpdateShape`]: old entity ([`Scope::Row`](crate::Scope::Row)) and joined rows to new values.
/// - [`InsertShape`]: a source row ([`Scope::Row`](crate::Scope::Row)) to a new target instance.
/// - [`MergeShape`]: the existing target ([`Scope::Existing`](crate::Scope::Existing)) and the
///   insert candidate ([`Scope::Inserted`](crate::Scope::Inserted)) to merged values.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Shape {
	assignments: Vec<Assignment>,
}

pub type UpdateShape = Shape;
pub type InsertShape = Shape;
pub type MergeShape = Shape;

impl Shape {
	pub fn new() -> Self {
		Self::default()
	}

	/// Assigns `value` to `property`, replacing an earlier assignment.
	pub fn set(mut self, property: impl Into<String>, value: impl Into<Expr>) -> Self {
		let property = property.into();
		let value = value.into();
		match self.assignments.iter_mut().find(|a| a.property == property) {
			Some(existing) => existing.value = value,
			None => self.assignments.push(Assignment {
				property,
				value,
			}),
		}
		self
	}

	/// Copies each property from the same-named property of the source row.
	pub fn identity(properties: &[&str]) -> Self {
		properties.iter().fold(Self::new(), |shape, p| shape.set(*p, Expr::field(*p)))
	}

	/// Takes each property from the insert candidate.
	pub fn from_inserted(properties: &[&str]) -> Self {
		properties.iter().fold(Self::new(), |shape, p| shape.set(*p, Expr::inserted(*p)))
	}

	pub fn assignments(&self) -> &[Assignment] {
		&self.assignments
	}

	pub fn get(&self, property: &str) -> Option<&Expr> {
		self.assignments.iter().find(|a| a.property == property).map(|a| &a.value)
	}

	pub fn is_empty(&self) -> bool {
		self.assignments.is_empty()
	}

	pub fn len(&self) -> usize {
		self.assignments.len()
	}
}

/// A batch data modification applied to the rows of a [`Query`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
	/// Remove the target rows selected by the query.
	Delete,
	/// Rewrite the target rows selected by the query.
	Update(UpdateShape),
	/// Insert the query's projection into `target`.
	InsertInto {
		target: String,
	},
	/// Insert the shaped query rows into `target`, updating on key
	/// conflict when `update` is present and doing nothing otherwise.
	Upsert {
		target: String,
		insert: InsertShape,
		update: Option<MergeShape>,
	},
	/// Reconcile the target rows selected by the query with `source`.
	Merge {
		source: Query,
		insert: InsertShape,
		update: MergeShape,
		delete_unmatched: bool,
	},
}

impl Operation {
	pub fn name(&self) -> &'static str {
		match self {
			Operation::Delete => "delete",
			Operation::Update(_) => "update",
			Operation::InsertInto {
				..
			} => "insert_into",
			Operation::Upsert {
				..
			} => "upsert",
			Operation::Merge {
				..
			} => "merge",
		}
	}
}
