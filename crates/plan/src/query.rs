// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Declarative query model handed over by the host query layer.

use setdml_core::Value;

/// Which row a [`Expr::Field`] reads from.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Scope {
	/// The query's root row. Inside a merge shape this is the existing target.
	Row,
	/// A row of the join registered under this alias.
	Joined(String),
	/// The existing target row in an upsert or merge conflict.
	Existing,
	/// The candidate row produced by the insert shape.
	Inserted,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
	Eq,
	NotEq,
	Lt,
	LtEq,
	Gt,
	GtEq,
	And,
	Or,
	Add,
	Sub,
	Mul,
	Div,
	Concat,
}

impl BinaryOp {
	pub fn is_comparison(&self) -> bool {
		matches!(self, BinaryOp::Eq | BinaryOp::NotEq | BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq)
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOp {
	Not,
	Negate,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Expr {
	Constant(Value),
	/// A named scalar runtime parameter.
	Parameter(String),
	Field {
		scope: Scope,
		path: String,
	},
	Binary {
		op: BinaryOp,
		left: Box<Expr>,
		right: Box<Expr>,
	},
	Unary {
		op: UnaryOp,
		operand: Box<Expr>,
	},
	IsNull {
		operand: Box<Expr>,
		negated: bool,
	},
}

impl Expr {
	pub fn constant(value: impl Into<Value>) -> Self {
		Expr::Constant(value.into())
	}

	pub fn param(name: impl Into<String>) -> Self {
		Expr::Parameter(name.into())
	}

	pub fn field(path: impl Into<String>) -> Self {
		Expr::Field {
			scope: Scope::Row,
			path: path.into(),
		}
	}

	pub fn joined(alias: impl Into<String>, path: impl Into<String>) -> Self {
		Expr::Field {
			scope: Scope::Joined(alias.into()),
			path: path.into(),
		}
	}

	pub fn existing(path: impl Into<String>) -> Self {
		Expr::Field {
			scope: Scope::Existing,
			path: path.into(),
		}
	}

	pub fn inserted(path: impl Into<String>) -> Self {
		Expr::Field {
			scope: Scope::Inserted,
			path: path.into(),
		}
	}

	pub fn binary(self, op: BinaryOp, rhs: impl Into<Expr>) -> Self {
		Expr::Binary {
			op,
			left: Box::new(self),
			right: Box::new(rhs.into()),
		}
	}

	pub fn equals(self, rhs: impl Into<Expr>) -> Self {
		self.binary(BinaryOp::Eq, rhs)
	}

	pub fn not_equals(self, rhs: impl Into<Expr>) -> Self {
		self.binary(BinaryOp::NotEq, rhs)
	}

	pub fn lt(self, rhs: impl Into<Expr>) -> Self {
		self.binary(BinaryOp::Lt, rhs)
	}

	pub fn lt_eq(self, rhs: impl Into<Expr>) -> Self {
		self.binary(BinaryOp::LtEq, rhs)
	}

	pub fn gt(self, rhs: impl Into<Expr>) -> Self {
		self.binary(BinaryOp::Gt, rhs)
	}

	pub fn gt_eq(self, rhs: impl Into<Expr>) -> Self {
		self.binary(BinaryOp::GtEq, rhs)
	}

	pub fn and(self, rhs: impl Into<Expr>) -> Self {
		self.binary(BinaryOp::And, rhs)
	}

	pub fn or(self, rhs: impl Into<Expr>) -> Self {
		self.binary(BinaryOp::Or, rhs)
	}

	pub fn plus(self, rhs: impl Into<Expr>) -> Self {
		self.binary(BinaryOp::Add, rhs)
	}

	pub fn minus(self, rhs: impl Into<Expr>) -> Self {
		self.binary(BinaryOp::Sub, rhs)
	}

	pub fn times(self, rhs: impl Into<Expr>) -> Self {
		self.binary(BinaryOp::Mul, rhs)
	}

	pub fn concat(self, rhs: impl Into<Expr>) -> Self {
		self.binary(BinaryOp::Concat, rhs)
	}

	pub fn logical_not(self) -> Self {
		Expr::Unary {
			op: UnaryOp::Not,
			operand: Box::new(self),
		}
	}

	pub fn negated(self) -> Self {
		Expr::Unary {
			op: UnaryOp::Negate,
			operand: Box::new(self),
		}
	}

	pub fn is_null(self) -> Self {
		Expr::IsNull {
			operand: Box::new(self),
			negated: false,
		}
	}

	pub fn is_not_null(self) -> Self {
		Expr::IsNull {
			operand: Box::new(self),
			negated: true,
		}
	}

	/// `Some(path)` when this is a plain read of the root row.
	pub fn as_row_field(&self) -> Option<&str> {
		match self {
			Expr::Field {
				scope: Scope::Row,
				path,
			} => Some(path.as_str()),
			_ => None,
		}
	}
}

impl From<Value> for Expr {
	fn from(value: Value) -> Self {
		Expr::Constant(value)
	}
}

macro_rules! impl_constant_from {
	($($t:ty),*) => {
		$(
			impl From<$t> for Expr {
				fn from(value: $t) -> Self {
					Expr::Constant(Value::from(value))
				}
			}
		)*
	};
}

impl_constant_from!(bool, i32, i64, u64, f64, &str, String);

/// Where the rows of a query come from.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum RowSource {
	/// A mapped entity, read from its table.
	Entity(String),
	/// A runtime list of rows bound to `parameter`, exposing `columns`.
	Local {
		parameter: String,
		columns: Vec<String>,
	},
}

impl RowSource {
	pub fn entity(name: impl Into<String>) -> Self {
		RowSource::Entity(name.into())
	}

	pub fn local(parameter: impl Into<String>, columns: &[&str]) -> Self {
		RowSource::Local {
			parameter: parameter.into(),
			columns: columns.iter().map(|c| c.to_string()).collect(),
		}
	}
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct QueryJoin {
	pub alias: String,
	pub source: RowSource,
	pub on: Expr,
}

/// A filtered, optionally joined and projected set of rows.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Query {
	pub root: RowSource,
	pub joins: Vec<QueryJoin>,
	pub filter: Option<Expr>,
	/// `(target property, value)` pairs, used by insert-into.
	pub projection: Option<Vec<(String, Expr)>>,
}

impl Query {
	pub fn new(root: RowSource) -> Self {
		Self {
			root,
			joins: Vec::new(),
			filter: None,
			projection: None,
		}
	}

	pub fn from_entity(entity: impl Into<String>) -> Self {
		Self::new(RowSource::entity(entity))
	}

	pub fn from_local(parameter: impl Into<String>, columns: &[&str]) -> Self {
		Self::new(RowSource::local(parameter, columns))
	}

	/// Adds a predicate; repeated calls are combined with AND.
	pub fn filter(mut self, predicate: Expr) -> Self {
		self.filter = Some(match self.filter.take() {
			Some(existing) => existing.and(predicate),
			None => predicate,
		});
		self
	}

	pub fn join(mut self, alias: impl Into<String>, source: RowSource, on: Expr) -> Self {
		self.joins.push(QueryJoin {
			alias: alias.into(),
			source,
			on,
		});
		self
	}

	pub fn select<S: Into<String>>(mut self, columns: impl IntoIterator<Item = (S, Expr)>) -> Self {
		self.projection = Some(columns.into_iter().map(|(name, expr)| (name.into(), expr)).collect());
		self
	}
}
