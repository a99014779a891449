// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Arena of expression and table nodes. Every node gets a stable [`NodeId`]
//! at creation; nodes refer to each other only through ids, so two nodes
//! with identical contents stay distinct.

use std::collections::HashMap;

use setdml_catalog::ValueConverter;
use setdml_core::Value;

use crate::query::{BinaryOp, UnaryOp};

mod nullable;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// Row count of a [`Node::Values`] table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowCount {
	/// Known only once the bound parameter list is available.
	Placeholder,
	Resolved(usize),
}

#[derive(Clone, Debug)]
pub struct Join {
	pub source: NodeId,
	pub on: NodeId,
}

#[derive(Clone, Debug)]
pub enum Node {
	Table {
		name: String,
		schema: Option<String>,
		alias: String,
	},
	/// Inline row set fed by the runtime row list `parameter`. The column
	/// list is fixed at creation; only `rows` changes during rewriting.
	Values {
		parameter: String,
		columns: Vec<String>,
		converters: Vec<Option<ValueConverter>>,
		rows: RowCount,
		alias: String,
	},
	Column {
		source: NodeId,
		name: String,
		nullable: bool,
	},
	/// The value a conflicting insert would have written to `column`.
	Excluded {
		column: String,
		nullable: bool,
	},
	/// Single count column produced by every batch statement.
	AffectedRows,
	Constant(Value),
	/// A predicate known at translation time.
	Truth(bool),
	Parameter {
		name: String,
	},
	Binary {
		op: BinaryOp,
		left: NodeId,
		right: NodeId,
	},
	Unary {
		op: UnaryOp,
		operand: NodeId,
	},
	IsNull {
		operand: NodeId,
		negated: bool,
	},
	Select {
		alias: String,
		columns: Vec<(String, NodeId)>,
		from: NodeId,
		joins: Vec<Join>,
		predicate: Option<NodeId>,
	},
}

impl Node {
	/// Rewrites every node reference through `f`.
	pub(crate) fn map_refs(&mut self, f: &impl Fn(NodeId) -> NodeId) {
		match self {
			Node::Column {
				source,
				..
			} => *source = f(*source),
			Node::Binary {
				left,
				right,
				..
			} => {
				*left = f(*left);
				*right = f(*right);
			}
			Node::Unary {
				operand,
				..
			}
			| Node::IsNull {
				operand,
				..
			} => *operand = f(*operand),
			Node::Select {
				columns,
				from,
				joins,
				predicate,
				..
			} => {
				for (_, column) in columns.iter_mut() {
					*column = f(*column);
				}
				*from = f(*from);
				for join in joins.iter_mut() {
					join.source = f(join.source);
					join.on = f(join.on);
				}
				if let Some(predicate) = predicate {
					*predicate = f(*predicate);
				}
			}
			Node::Table {
				..
			}
			| Node::Values {
				..
			}
			| Node::Excluded {
				..
			}
			| Node::AffectedRows
			| Node::Constant(_)
			| Node::Truth(_)
			| Node::Parameter {
				..
			} => {}
		}
	}
}

#[derive(Clone, Debug, Default)]
pub struct Ast {
	nodes: Vec<Node>,
}

impl Ast {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn push(&mut self, node: Node) -> NodeId {
		let id = NodeId(self.nodes.len());
		self.nodes.push(node);
		id
	}

	pub fn get(&self, id: NodeId) -> &Node {
		&self.nodes[id.0]
	}

	pub(crate) fn get_mut(&mut self, id: NodeId) -> &mut Node {
		&mut self.nodes[id.0]
	}

	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
		self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
	}

	/// Alias under which a table source is addressed.
	pub fn alias_of(&self, id: NodeId) -> Option<&str> {
		match self.get(id) {
			Node::Table {
				alias,
				..
			}
			| Node::Values {
				alias,
				..
			}
			| Node::Select {
				alias,
				..
			} => Some(alias.as_str()),
			_ => None,
		}
	}

	/// Replaces references in every node at once. `map` is read, never
	/// chained: a replacement is not itself looked up again.
	pub(crate) fn substitute(&mut self, map: &HashMap<NodeId, NodeId>) {
		let f = |id: NodeId| map.get(&id).copied().unwrap_or(id);
		for node in self.nodes.iter_mut() {
			node.map_refs(&f);
		}
	}

	pub(crate) fn and(&mut self, left: Option<NodeId>, right: NodeId) -> NodeId {
		match left {
			Some(left) => self.push(Node::Binary {
				op: BinaryOp::And,
				left,
				right,
			}),
			None => right,
		}
	}
}
