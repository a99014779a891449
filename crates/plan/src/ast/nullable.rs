// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use super::{Ast, Node, NodeId};

impl Ast {
	/// Whether the expression at `id` may evaluate to NULL.
	pub fn nullable(&self, id: NodeId) -> bool {
		match self.get(id) {
			Node::Constant(value) => value.is_undefined(),
			Node::Parameter {
				..
			} => true,
			Node::Column {
				nullable,
				..
			}
			| Node::Excluded {
				nullable,
				..
			} => *nullable,
			Node::AffectedRows
			| Node::Truth(_)
			| Node::IsNull {
				..
			} => false,
			Node::Binary {
				left,
				right,
				..
			} => self.nullable(*left) || self.nullable(*right),
			Node::Unary {
				operand,
				..
			} => self.nullable(*operand),
			Node::Table {
				..
			}
			| Node::Values {
				..
			}
			| Node::Select {
				..
			} => false,
		}
	}
}

#[cfg(test)]
mod tests {
	use setdml_core::Value;

	use super::*;
	use crate::query::BinaryOp;

	#[test]
	fn test_affected_rows_is_not_nullable() {
		let mut ast = Ast::new();
		let id = ast.push(Node::AffectedRows);
		assert!(!ast.nullable(id));
	}

	#[test]
	fn test_binary_propagates() {
		let mut ast = Ast::new();
		let table = ast.push(Node::Table {
			name: "T".to_string(),
			schema: None,
			alias: "t".to_string(),
		});
		let key = ast.push(Node::Column {
			source: table,
			name: "Id".to_string(),
			nullable: false,
		});
		let val = ast.push(Node::Column {
			source: table,
			name: "Val".to_string(),
			nullable: true,
		});
		let one = ast.push(Node::Constant(Value::Int8(1)));
		let key_plus_one = ast.push(Node::Binary {
			op: BinaryOp::Add,
			left: key,
			right: one,
		});
		let val_plus_one = ast.push(Node::Binary {
			op: BinaryOp::Add,
			left: val,
			right: one,
		});

		assert!(!ast.nullable(key_plus_one));
		assert!(ast.nullable(val_plus_one));
	}

	#[test]
	fn test_null_constant() {
		let mut ast = Ast::new();
		let null = ast.push(Node::Constant(Value::Undefined));
		assert!(ast.nullable(null));
	}
}
