// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Renders a rewritten [`Plan`] as SQL text for one [`Dialect`].

use setdml_core::{Result, Value, return_internal_error};
use setdml_plan::{Ast, BinaryOp, Join, Node, NodeId, Plan, RowCount, Statement, UnaryOp};
use tracing::instrument;

use crate::{
	compiled::{CompiledSql, ParameterRef, SqlStatement},
	dialect::Dialect,
};

mod delete;
mod insert;
mod merge;
mod update;
mod upsert;

const INDENT: &str = "    ";

/// Every `VALUES` row count in `plan` must already be resolved.
#[instrument(name = "sql::emit", level = "trace", skip_all, fields(dialect = dialect.name(), statement = plan.statement.name()))]
pub fn emit(plan: &Plan, dialect: &dyn Dialect) -> Result<CompiledSql> {
	let statements = match &plan.statement {
		Statement::Delete(node) => vec![Emitter::new(&plan.ast, dialect).delete(node)?],
		Statement::Update(node) => vec![Emitter::new(&plan.ast, dialect).update(node)?],
		Statement::SelectInto(node) => vec![Emitter::new(&plan.ast, dialect).select_into(node)?],
		Statement::Upsert(node) => vec![Emitter::new(&plan.ast, dialect).upsert(node)?],
		Statement::Merge(node) => merge::emit(&plan.ast, dialect, node)?,
	};
	Ok(CompiledSql {
		statements,
	})
}

/// Emits one statement; placeholders are numbered from 1 per statement.
pub(crate) struct Emitter<'a> {
	ast: &'a Ast,
	dialect: &'a dyn Dialect,
	parameters: Vec<ParameterRef>,
}

impl<'a> Emitter<'a> {
	pub(crate) fn new(ast: &'a Ast, dialect: &'a dyn Dialect) -> Self {
		Self {
			ast,
			dialect,
			parameters: Vec::new(),
		}
	}

	pub(crate) fn finish(self, sql: String) -> SqlStatement {
		SqlStatement {
			sql,
			parameters: self.parameters,
		}
	}

	fn quote(&self, identifier: &str) -> String {
		self.dialect.quote(identifier)
	}

	fn parameter(&mut self, parameter: ParameterRef) -> String {
		self.parameters.push(parameter);
		self.dialect.placeholder(self.parameters.len())
	}

	pub(crate) fn table_name(&self, name: &str, schema: Option<&str>) -> String {
		match schema {
			Some(schema) => format!("{}.{}", self.quote(schema), self.quote(name)),
			None => self.quote(name),
		}
	}

	/// `"T" AS "t"` for a table node.
	fn table(&self, id: NodeId) -> Result<String> {
		match self.ast.get(id) {
			Node::Table {
				name,
				schema,
				alias,
			} => Ok(format!("{} AS {}", self.table_name(name, schema.as_deref()), self.quote(alias))),
			other => return_internal_error!("expected a table node, found {:?}", other),
		}
	}

	fn alias(&self, id: NodeId) -> Result<String> {
		match self.ast.alias_of(id) {
			Some(alias) => Ok(self.quote(alias)),
			None => return_internal_error!("node {:?} has no alias", id),
		}
	}

	/// Any row source usable after FROM, JOIN or USING.
	pub(crate) fn source(&mut self, id: NodeId) -> Result<String> {
		let ast = self.ast;
		match ast.get(id) {
			Node::Table {
				..
			} => self.table(id),
			Node::Values {
				..
			} => self.values_source(id),
			Node::Select {
				alias,
				..
			} => {
				let alias = self.quote(alias);
				let select = self.select(id)?;
				Ok(format!("({}) AS {}", select, alias))
			}
			other => return_internal_error!("not a row source: {:?}", other),
		}
	}

	/// The tuples of a resolved `VALUES` node, one per bound row.
	pub(crate) fn values_rows(&mut self, id: NodeId) -> Result<Vec<String>> {
		let ast = self.ast;
		let Node::Values {
			parameter,
			columns,
			converters,
			rows,
			..
		} = ast.get(id)
		else {
			return_internal_error!("expected a values node, found {:?}", self.ast.get(id));
		};
		let RowCount::Resolved(count) = rows else {
			return_internal_error!("row count of `{}` was not resolved before emission", parameter);
		};

		let mut tuples = Vec::with_capacity(*count);
		for row in 0..*count {
			let mut cells = Vec::with_capacity(columns.len());
			for (column, converter) in columns.iter().zip(converters) {
				cells.push(self.parameter(ParameterRef::Cell {
					parameter: parameter.clone(),
					row,
					column: column.clone(),
					converter: converter.clone(),
				}));
			}
			tuples.push(format!("({})", cells.join(", ")));
		}
		Ok(tuples)
	}

	/// A `VALUES` node as an aliased row source with the given column names.
	pub(crate) fn values_as(&mut self, id: NodeId, names: &[String]) -> Result<String> {
		let alias = self.alias(id)?;
		let tuples = self.values_rows(id)?;
		let names: Vec<String> = names.iter().map(|n| self.quote(n)).collect();

		if tuples.is_empty() {
			let columns: Vec<String> = names.iter().map(|n| format!("NULL AS {}", n)).collect();
			return Ok(format!("(SELECT {} WHERE {}) AS {}", columns.join(", "), self.dialect.truth(false), alias));
		}

		if self.dialect.values_column_aliases() {
			Ok(format!(
				"(VALUES\n{}\n) AS {} ({})",
				tuples.iter().map(|t| format!("{}{}", INDENT, t)).collect::<Vec<_>>().join(",\n"),
				alias,
				names.join(", ")
			))
		} else {
			let columns: Vec<String> =
				names.iter().enumerate().map(|(i, n)| format!("column{} AS {}", i + 1, n)).collect();
			Ok(format!("(SELECT {} FROM (VALUES {})) AS {}", columns.join(", "), tuples.join(", "), alias))
		}
	}

	fn values_source(&mut self, id: NodeId) -> Result<String> {
		let Node::Values {
			columns,
			..
		} = self.ast.get(id)
		else {
			return_internal_error!("expected a values node");
		};
		let columns = columns.clone();
		self.values_as(id, &columns)
	}

	/// `SELECT .. FROM .. [INNER JOIN ..] [WHERE ..]` without an alias.
	pub(crate) fn select(&mut self, id: NodeId) -> Result<String> {
		let ast = self.ast;
		let Node::Select {
			columns,
			from,
			joins,
			predicate,
			..
		} = ast.get(id)
		else {
			return_internal_error!("expected a select node, found {:?}", self.ast.get(id));
		};

		let mut projected = Vec::with_capacity(columns.len());
		for (name, value) in columns {
			projected.push(format!("{} AS {}", self.expr(*value)?, self.quote(name)));
		}
		let mut sql = format!("SELECT {}\nFROM {}", projected.join(", "), self.source(*from)?);
		for join in joins {
			sql.push_str(&self.inner_join(join)?);
		}
		if let Some(predicate) = predicate {
			sql.push_str(&format!("\nWHERE {}", self.expr(*predicate)?));
		}
		Ok(sql)
	}

	pub(crate) fn inner_join(&mut self, join: &Join) -> Result<String> {
		let source = self.source(join.source)?;
		Ok(format!("\nINNER JOIN {} ON {}", source, self.expr(join.on)?))
	}

	/// `a AND b AND ..` over the present parts; `None` when all are absent.
	pub(crate) fn conjunction(&mut self, parts: impl IntoIterator<Item = NodeId>) -> Result<Option<String>> {
		let parts: Vec<NodeId> = parts.into_iter().collect();
		match parts.as_slice() {
			[] => Ok(None),
			[single] => Ok(Some(self.expr(*single)?)),
			_ => {
				let mut rendered = Vec::with_capacity(parts.len());
				for part in parts {
					rendered.push(self.operand(part)?);
				}
				Ok(Some(rendered.join(" AND ")))
			}
		}
	}

	/// `"c" = value, ..` for an assignment list.
	pub(crate) fn assignments(&mut self, set: &[(String, NodeId)]) -> Result<String> {
		let mut rendered = Vec::with_capacity(set.len());
		for (column, value) in set {
			rendered.push(format!("{} = {}", self.quote(column), self.expr(*value)?));
		}
		Ok(rendered.join(", "))
	}

	/// `"t"."Id" = "s"."Id" AND ..` over key columns of two aliases.
	pub(crate) fn key_match(&self, left: &str, right: &str, columns: &[String]) -> String {
		columns
			.iter()
			.map(|c| {
				format!(
					"{}.{} = {}.{}",
					self.quote(left),
					self.quote(c),
					self.quote(right),
					self.quote(c)
				)
			})
			.collect::<Vec<_>>()
			.join(" AND ")
	}

	/// An expression that is parenthesized when it is an operation of its
	/// own, so precedence never depends on the dialect.
	fn operand(&mut self, id: NodeId) -> Result<String> {
		let rendered = self.expr(id)?;
		Ok(match self.ast.get(id) {
			Node::Binary {
				..
			}
			| Node::Unary {
				..
			}
			| Node::IsNull {
				..
			} => format!("({})", rendered),
			_ => rendered,
		})
	}

	pub(crate) fn expr(&mut self, id: NodeId) -> Result<String> {
		let ast = self.ast;
		match ast.get(id) {
			Node::Constant(value) => Ok(self.literal(value)),
			Node::Truth(value) => Ok(self.dialect.truth(*value).to_string()),
			Node::Parameter {
				name,
			} => Ok(self.parameter(ParameterRef::Scalar(name.clone()))),
			Node::Column {
				source,
				name,
				..
			} => Ok(format!("{}.{}", self.alias(*source)?, self.quote(name))),
			Node::Excluded {
				column,
				..
			} => Ok(self.dialect.excluded(column)),
			Node::Binary {
				op,
				left,
				right,
			} => {
				let l = self.operand(*left)?;
				let r = self.operand(*right)?;
				let op = match op {
					BinaryOp::Eq => "=",
					BinaryOp::NotEq => "<>",
					BinaryOp::Lt => "<",
					BinaryOp::LtEq => "<=",
					BinaryOp::Gt => ">",
					BinaryOp::GtEq => ">=",
					BinaryOp::And => "AND",
					BinaryOp::Or => "OR",
					BinaryOp::Add => "+",
					BinaryOp::Sub => "-",
					BinaryOp::Mul => "*",
					BinaryOp::Div => "/",
					BinaryOp::Concat => self.dialect.concat_operator(),
				};
				Ok(format!("{} {} {}", l, op, r))
			}
			Node::Unary {
				op,
				operand,
			} => {
				match op {
					UnaryOp::Not => Ok(format!("NOT {}", self.operand(*operand)?)),
					// `--` would open a line comment
					UnaryOp::Negate => Ok(format!("-({})", self.expr(*operand)?)),
				}
			}
			Node::IsNull {
				operand,
				negated,
			} => {
				let e = self.operand(*operand)?;
				Ok(if *negated {
					format!("{} IS NOT NULL", e)
				} else {
					format!("{} IS NULL", e)
				})
			}
			other => return_internal_error!("not an expression: {:?}", other),
		}
	}

	/// Inline SQL for a constant. Infinite floats have no literal form in
	/// any dialect and are bound as parameters instead.
	fn literal(&mut self, value: &Value) -> String {
		match value {
			Value::Float8(v) if !v.value().is_finite() => self.parameter(ParameterRef::Constant(value.clone())),
			Value::Undefined => "NULL".to_string(),
			Value::Bool(b) => self.dialect.bool_literal(*b).to_string(),
			Value::Int8(v) => v.to_string(),
			Value::Uint8(v) => v.to_string(),
			Value::Float8(v) => format_float(v.value()),
			Value::Utf8(s) => format!("'{}'", s.replace('\'', "''")),
			Value::Blob(bytes) => self.dialect.blob_literal(bytes),
		}
	}
}

fn format_float(f: f64) -> String {
	let s = f.to_string();
	if s.contains('.') || s.contains('e') {
		s
	} else {
		format!("{}.0", s)
	}
}

#[cfg(test)]
mod tests {
	use setdml_plan::{Ast, Node, RowCount};

	use super::*;
	use crate::dialect::{PostgreSql, SqlServer, Sqlite};

	fn values(ast: &mut Ast, rows: RowCount) -> NodeId {
		ast.push(Node::Values {
			parameter: "rows".to_string(),
			columns: vec!["Id".to_string(), "Val".to_string()],
			converters: vec![None, None],
			rows,
			alias: "v".to_string(),
		})
	}

	#[test]
	fn test_values_postgresql() {
		let mut ast = Ast::new();
		let id = values(&mut ast, RowCount::Resolved(2));
		let mut emitter = Emitter::new(&ast, &PostgreSql);
		let sql = emitter.source(id).unwrap();
		assert_eq!(sql, "(VALUES\n    ($1, $2),\n    ($3, $4)\n) AS \"v\" (\"Id\", \"Val\")");
		assert_eq!(emitter.finish(String::new()).parameters.len(), 4);
	}

	#[test]
	fn test_values_sqlite() {
		let mut ast = Ast::new();
		let id = values(&mut ast, RowCount::Resolved(1));
		let sql = Emitter::new(&ast, &Sqlite).source(id).unwrap();
		assert_eq!(sql, "(SELECT column1 AS \"Id\", column2 AS \"Val\" FROM (VALUES (?1, ?2))) AS \"v\"");
	}

	#[test]
	fn test_empty_values() {
		let mut ast = Ast::new();
		let id = values(&mut ast, RowCount::Resolved(0));
		let sql = Emitter::new(&ast, &SqlServer).source(id).unwrap();
		assert_eq!(sql, "(SELECT NULL AS [Id], NULL AS [Val] WHERE 1 = 0) AS [v]");
	}

	#[test]
	fn test_unresolved_values_is_internal_error() {
		let mut ast = Ast::new();
		let id = values(&mut ast, RowCount::Placeholder);
		let err = Emitter::new(&ast, &PostgreSql).source(id).unwrap_err();
		assert_eq!(err.code, "INTERNAL_ERROR");
	}

	#[test]
	fn test_nested_binary_is_parenthesized() {
		let mut ast = Ast::new();
		let a = ast.push(Node::Constant(Value::Int8(1)));
		let b = ast.push(Node::Constant(Value::Int8(2)));
		let c = ast.push(Node::Constant(Value::Int8(3)));
		let sum = ast.push(Node::Binary {
			op: BinaryOp::Add,
			left: a,
			right: b,
		});
		let product = ast.push(Node::Binary {
			op: BinaryOp::Mul,
			left: sum,
			right: c,
		});
		assert_eq!(Emitter::new(&ast, &PostgreSql).expr(product).unwrap(), "(1 + 2) * 3");
	}

	#[test]
	fn test_string_literal_escaping() {
		let mut ast = Ast::new();
		let id = ast.push(Node::Constant(Value::utf8("it's")));
		assert_eq!(Emitter::new(&ast, &Sqlite).expr(id).unwrap(), "'it''s'");
	}

	#[test]
	fn test_negation_never_opens_a_comment() {
		let mut ast = Ast::new();
		let five = ast.push(Node::Constant(Value::Int8(-5)));
		let negated = ast.push(Node::Unary {
			op: UnaryOp::Negate,
			operand: five,
		});
		let twice = ast.push(Node::Unary {
			op: UnaryOp::Negate,
			operand: negated,
		});
		assert_eq!(Emitter::new(&ast, &Sqlite).expr(negated).unwrap(), "-(-5)");
		assert_eq!(Emitter::new(&ast, &Sqlite).expr(twice).unwrap(), "-(-(-5))");
	}

	#[test]
	fn test_unary_and_null_test_operands_are_parenthesized() {
		let mut ast = Ast::new();
		let table = ast.push(Node::Table {
			name: "Items".to_string(),
			schema: None,
			alias: "t".to_string(),
		});
		let val = ast.push(Node::Column {
			source: table,
			name: "Val".to_string(),
			nullable: true,
		});
		let is_null = ast.push(Node::IsNull {
			operand: val,
			negated: false,
		});
		let no = ast.push(Node::Constant(Value::Bool(false)));
		let compared = ast.push(Node::Binary {
			op: BinaryOp::Eq,
			left: is_null,
			right: no,
		});
		let inverted = ast.push(Node::Unary {
			op: UnaryOp::Not,
			operand: compared,
		});
		let both = ast.push(Node::Binary {
			op: BinaryOp::And,
			left: inverted,
			right: is_null,
		});

		assert_eq!(
			Emitter::new(&ast, &PostgreSql).expr(both).unwrap(),
			"(NOT ((\"t\".\"Val\" IS NULL) = FALSE)) AND (\"t\".\"Val\" IS NULL)"
		);
	}

	#[test]
	fn test_infinite_float_is_bound() {
		let mut ast = Ast::new();
		let table = ast.push(Node::Table {
			name: "Items".to_string(),
			schema: None,
			alias: "t".to_string(),
		});
		let val = ast.push(Node::Column {
			source: table,
			name: "Val".to_string(),
			nullable: true,
		});
		let inf = ast.push(Node::Constant(Value::float8(f64::NEG_INFINITY)));
		let half = ast.push(Node::Constant(Value::float8(0.5)));
		let lower = ast.push(Node::Binary {
			op: BinaryOp::Gt,
			left: val,
			right: inf,
		});
		let upper = ast.push(Node::Binary {
			op: BinaryOp::Lt,
			left: val,
			right: half,
		});
		let range = ast.push(Node::Binary {
			op: BinaryOp::And,
			left: lower,
			right: upper,
		});

		let mut emitter = Emitter::new(&ast, &PostgreSql);
		let sql = emitter.expr(range).unwrap();
		assert_eq!(sql, "(\"t\".\"Val\" > $1) AND (\"t\".\"Val\" < 0.5)");

		let statement = emitter.finish(sql);
		assert_eq!(statement.parameters.len(), 1);
		assert_eq!(statement.parameters[0].resolve(&setdml_core::Params::new()).unwrap(), Value::float8(f64::NEG_INFINITY));
	}

	#[test]
	fn test_format_float() {
		assert_eq!(format_float(1.0), "1.0");
		assert_eq!(format_float(2.5), "2.5");
	}
}
