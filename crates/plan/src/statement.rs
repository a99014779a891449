// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::collections::HashSet;

use setdml_core::{Result, return_internal_error};

use crate::ast::{Ast, Join, Node, NodeId};

#[derive(Clone, Debug)]
pub struct DeleteNode {
	pub table: NodeId,
	pub joined: Vec<Join>,
	pub predicate: Option<NodeId>,
}

/// Physical identity of an update target once resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExpandedTable {
	pub name: String,
	pub schema: Option<String>,
	pub alias: String,
}

#[derive(Clone, Debug)]
pub struct UpdateNode {
	pub table: NodeId,
	/// `(column, value)` in assignment order.
	pub set: Vec<(String, NodeId)>,
	pub from: Vec<Join>,
	pub predicate: Option<NodeId>,
	expanded: Option<ExpandedTable>,
}

impl UpdateNode {
	pub fn new(table: NodeId, set: Vec<(String, NodeId)>, from: Vec<Join>, predicate: Option<NodeId>) -> Self {
		Self {
			table,
			set,
			from,
			predicate,
			expanded: None,
		}
	}

	pub fn is_expanded(&self) -> bool {
		self.expanded.is_some()
	}

	pub fn expanded(&self) -> Option<&ExpandedTable> {
		self.expanded.as_ref()
	}

	/// Resolves the target to its physical identity. Returns `false` when
	/// already expanded; expanding twice is a no-op.
	pub fn expand(&mut self, ast: &Ast) -> Result<bool> {
		if self.expanded.is_some() {
			return Ok(false);
		}
		match ast.get(self.table) {
			Node::Table {
				name,
				schema,
				alias,
			} => {
				self.expanded = Some(ExpandedTable {
					name: name.clone(),
					schema: schema.clone(),
					alias: alias.clone(),
				});
				Ok(true)
			}
			other => return_internal_error!("update target is not a table: {:?}", other),
		}
	}
}

#[derive(Clone, Debug)]
pub struct SelectIntoNode {
	pub table: String,
	pub schema: Option<String>,
	pub columns: Vec<String>,
	/// A [`Node::Select`] whose columns line up with `columns`.
	pub source: NodeId,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpsertSource {
	/// Inline `VALUES` rows; the upsert has no source table.
	Values(NodeId),
	/// `SELECT .. FROM` a source table.
	Select(NodeId),
}

impl UpsertSource {
	pub fn node(&self) -> NodeId {
		match self {
			UpsertSource::Values(id) | UpsertSource::Select(id) => *id,
		}
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConflictTarget {
	pub constraint: String,
	pub columns: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct UpsertNode {
	pub table: String,
	pub schema: Option<String>,
	pub alias: String,
	pub source: UpsertSource,
	pub columns: Vec<String>,
	pub conflict: ConflictTarget,
	/// `None` means do nothing on conflict. Never assigns a key column.
	pub update: Option<Vec<(String, NodeId)>>,
}

#[derive(Clone, Debug)]
pub struct MergeNode {
	pub target: NodeId,
	pub target_filter: Option<NodeId>,
	/// A [`Node::Select`] projecting shaped source rows as target columns.
	pub source: NodeId,
	/// Key columns correlating target and source.
	pub on: Vec<String>,
	pub update: Option<Vec<(String, NodeId)>>,
	pub insert: Option<Vec<String>>,
	pub delete_unmatched: bool,
}

/// A batch statement, dispatched on directly by the emitter.
#[derive(Clone, Debug)]
pub enum Statement {
	Delete(DeleteNode),
	Update(UpdateNode),
	SelectInto(SelectIntoNode),
	Upsert(UpsertNode),
	Merge(MergeNode),
}

fn map_joins(joins: &mut [Join], f: &impl Fn(NodeId) -> NodeId) {
	for join in joins.iter_mut() {
		join.source = f(join.source);
		join.on = f(join.on);
	}
}

fn map_set(set: &mut [(String, NodeId)], f: &impl Fn(NodeId) -> NodeId) {
	for (_, value) in set.iter_mut() {
		*value = f(*value);
	}
}

impl Statement {
	pub fn name(&self) -> &'static str {
		match self {
			Statement::Delete(_) => "DELETE",
			Statement::Update(_) => "UPDATE",
			Statement::SelectInto(_) => "SELECT INTO",
			Statement::Upsert(_) => "UPSERT",
			Statement::Merge(_) => "MERGE",
		}
	}

	pub(crate) fn map_refs(&mut self, f: &impl Fn(NodeId) -> NodeId) {
		match self {
			Statement::Delete(node) => {
				node.table = f(node.table);
				map_joins(&mut node.joined, f);
				node.predicate = node.predicate.map(f);
			}
			Statement::Update(node) => {
				node.table = f(node.table);
				map_set(&mut node.set, f);
				map_joins(&mut node.from, f);
				node.predicate = node.predicate.map(f);
			}
			Statement::SelectInto(node) => node.source = f(node.source),
			Statement::Upsert(node) => {
				node.source = match node.source {
					UpsertSource::Values(id) => UpsertSource::Values(f(id)),
					UpsertSource::Select(id) => UpsertSource::Select(f(id)),
				};
				if let Some(update) = node.update.as_mut() {
					map_set(update, f);
				}
			}
			Statement::Merge(node) => {
				node.target = f(node.target);
				node.target_filter = node.target_filter.map(f);
				node.source = f(node.source);
				if let Some(update) = node.update.as_mut() {
					map_set(update, f);
				}
			}
		}
	}

	fn roots(&self) -> Vec<NodeId> {
		let mut roots = Vec::new();
		let push_joins = |roots: &mut Vec<NodeId>, joins: &[Join]| {
			for join in joins {
				roots.push(join.source);
				roots.push(join.on);
			}
		};
		match self {
			Statement::Delete(node) => {
				roots.push(node.table);
				push_joins(&mut roots, &node.joined);
				roots.extend(node.predicate);
			}
			Statement::Update(node) => {
				roots.push(node.table);
				roots.extend(node.set.iter().map(|(_, v)| *v));
				push_joins(&mut roots, &node.from);
				roots.extend(node.predicate);
			}
			Statement::SelectInto(node) => roots.push(node.source),
			Statement::Upsert(node) => {
				roots.push(node.source.node());
				if let Some(update) = &node.update {
					roots.extend(update.iter().map(|(_, v)| *v));
				}
			}
			Statement::Merge(node) => {
				roots.push(node.target);
				roots.extend(node.target_filter);
				roots.push(node.source);
				if let Some(update) = &node.update {
					roots.extend(update.iter().map(|(_, v)| *v));
				}
			}
		}
		roots
	}
}

/// Translated batch operation: arena, statement and the affected-rows
/// result column.
#[derive(Clone, Debug)]
pub struct Plan {
	pub ast: Ast,
	pub statement: Statement,
	pub result: NodeId,
}

impl Plan {
	/// Nodes reachable from the statement, in discovery order.
	pub fn reachable(&self) -> Vec<NodeId> {
		let mut seen = HashSet::new();
		let mut order = Vec::new();
		let mut stack: Vec<NodeId> = self.statement.roots();
		stack.reverse();

		while let Some(id) = stack.pop() {
			if !seen.insert(id) {
				continue;
			}
			order.push(id);

			stack.extend(children_of(&self.ast, id).into_iter().rev());
		}
		order
	}
}

fn children_of(ast: &Ast, id: NodeId) -> Vec<NodeId> {
	match ast.get(id) {
		Node::Column {
			source,
			..
		} => vec![*source],
		Node::Binary {
			left,
			right,
			..
		} => vec![*left, *right],
		Node::Unary {
			operand,
			..
		}
		| Node::IsNull {
			operand,
			..
		} => vec![*operand],
		Node::Select {
			columns,
			from,
			joins,
			predicate,
			..
		} => {
			let mut children: Vec<NodeId> = columns.iter().map(|(_, c)| *c).collect();
			children.push(*from);
			for join in joins {
				children.push(join.source);
				children.push(join.on);
			}
			children.extend(*predicate);
			children
		}
		_ => Vec::new(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn table(ast: &mut Ast) -> NodeId {
		ast.push(Node::Table {
			name: "Items".to_string(),
			schema: Some("dbo".to_string()),
			alias: "t".to_string(),
		})
	}

	#[test]
	fn test_expand_is_idempotent() {
		let mut ast = Ast::new();
		let target = table(&mut ast);
		let mut node = UpdateNode::new(target, vec![], vec![], None);
		assert!(!node.is_expanded());

		assert!(node.expand(&ast).unwrap());
		assert!(!node.expand(&ast).unwrap());
		assert_eq!(
			node.expanded(),
			Some(&ExpandedTable {
				name: "Items".to_string(),
				schema: Some("dbo".to_string()),
				alias: "t".to_string(),
			})
		);
	}

	#[test]
	fn test_expand_requires_table() {
		let mut ast = Ast::new();
		let not_a_table = ast.push(Node::AffectedRows);
		let mut node = UpdateNode::new(not_a_table, vec![], vec![], None);
		assert!(node.expand(&ast).is_err());
	}

	#[test]
	fn test_reachable_skips_orphans() {
		let mut ast = Ast::new();
		let target = table(&mut ast);
		let orphan = ast.push(Node::Truth(true));
		let column = ast.push(Node::Column {
			source: target,
			name: "Id".to_string(),
			nullable: false,
		});
		let result = ast.push(Node::AffectedRows);
		let plan = Plan {
			ast,
			statement: Statement::Delete(DeleteNode {
				table: target,
				joined: vec![],
				predicate: Some(column),
			}),
			result,
		};

		let reachable = plan.reachable();
		assert_eq!(reachable, vec![target, column]);
		assert!(!reachable.contains(&orphan));
	}
}
