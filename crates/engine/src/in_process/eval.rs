// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Evaluation of query expressions over materialized logical rows, with SQL
//! three-valued logic.

use std::cmp::Ordering;

use setdml_core::{Params, Result, Row, Value, return_internal_error};
use setdml_plan::{BinaryOp, BindError, Expr, Scope, UnaryOp};

use crate::error::EngineError;

/// Rows visible to an expression.
#[derive(Clone, Default)]
pub(crate) struct Bindings<'a> {
	pub row: Option<&'a Row>,
	pub joined: Vec<(&'a str, &'a Row)>,
	pub existing: Option<&'a Row>,
	pub inserted: Option<&'a Row>,
}

impl<'a> Bindings<'a> {
	pub(crate) fn row(row: &'a Row) -> Self {
		Self {
			row: Some(row),
			..Self::default()
		}
	}

	pub(crate) fn joined(row: &'a Row, joined: Vec<(&'a str, &'a Row)>) -> Self {
		Self {
			row: Some(row),
			joined,
			..Self::default()
		}
	}

	/// Existing target plus insert candidate. The root row is the existing
	/// target.
	pub(crate) fn matched(existing: &'a Row, inserted: &'a Row) -> Self {
		Self {
			row: Some(existing),
			joined: Vec::new(),
			existing: Some(existing),
			inserted: Some(inserted),
		}
	}

	fn lookup(&self, scope: &Scope) -> Option<&'a Row> {
		match scope {
			Scope::Row => self.row,
			Scope::Joined(alias) => self.joined.iter().find(|(a, _)| *a == alias.as_str()).map(|(_, r)| *r),
			Scope::Existing => self.existing,
			Scope::Inserted => self.inserted,
		}
	}
}

pub(crate) struct Evaluator<'p> {
	params: &'p Params,
}

impl<'p> Evaluator<'p> {
	pub(crate) fn new(params: &'p Params) -> Self {
		Self {
			params,
		}
	}

	/// A predicate passes only when it evaluates to true; undefined rejects.
	pub(crate) fn test(&self, expr: &Expr, bindings: &Bindings) -> Result<bool> {
		Ok(matches!(self.evaluate(expr, bindings)?, Value::Bool(true)))
	}

	pub(crate) fn evaluate(&self, expr: &Expr, bindings: &Bindings) -> Result<Value> {
		match expr {
			Expr::Constant(value) => Ok(value.clone()),
			Expr::Parameter(name) => match self.params.value(name) {
				Some(value) => Ok(value.clone()),
				None => Err(BindError::MissingParameter {
					parameter: name.clone(),
				}
				.into()),
			},
			Expr::Field {
				scope,
				path,
			} => match bindings.lookup(scope) {
				Some(row) => Ok(row.value(path).clone()),
				None => return_internal_error!("no row bound for scope {:?}", scope),
			},
			Expr::Binary {
				op,
				left,
				right,
			} => {
				let left = self.evaluate(left, bindings)?;
				let right = self.evaluate(right, bindings)?;
				binary(*op, left, right)
			}
			Expr::Unary {
				op,
				operand,
			} => {
				let operand = self.evaluate(operand, bindings)?;
				unary(*op, operand)
			}
			Expr::IsNull {
				operand,
				negated,
			} => {
				let operand = self.evaluate(operand, bindings)?;
				Ok(Value::Bool(operand.is_undefined() != *negated))
			}
		}
	}
}

fn mismatch(op: &'static str, left: &Value, right: &Value) -> setdml_core::Error {
	EngineError::TypeMismatch {
		op,
		left: format!("{:?}", left.kind()),
		right: format!("{:?}", right.kind()),
	}
	.into()
}

fn binary(op: BinaryOp, left: Value, right: Value) -> Result<Value> {
	match op {
		BinaryOp::And => logical(&left, &right, false),
		BinaryOp::Or => logical(&left, &right, true),
		BinaryOp::Eq => Ok(compare(&left, &right, |o| o == Ordering::Equal)),
		BinaryOp::NotEq => Ok(compare(&left, &right, |o| o != Ordering::Equal)),
		BinaryOp::Lt => Ok(compare(&left, &right, |o| o == Ordering::Less)),
		BinaryOp::LtEq => Ok(compare(&left, &right, |o| o != Ordering::Greater)),
		BinaryOp::Gt => Ok(compare(&left, &right, |o| o == Ordering::Greater)),
		BinaryOp::GtEq => Ok(compare(&left, &right, |o| o != Ordering::Less)),
		BinaryOp::Concat => {
			if left.is_undefined() || right.is_undefined() {
				return Ok(Value::Undefined);
			}
			Ok(Value::Utf8(format!("{}{}", left, right)))
		}
		BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => arithmetic(op, &left, &right),
	}
}

fn compare(left: &Value, right: &Value, accept: impl Fn(Ordering) -> bool) -> Value {
	match left.compare(right) {
		Some(ordering) => Value::Bool(accept(ordering)),
		None => Value::Undefined,
	}
}

/// `dominant` is the value that decides the result on its own: false for
/// AND, true for OR.
fn logical(left: &Value, right: &Value, dominant: bool) -> Result<Value> {
	let op = if dominant {
		"OR"
	} else {
		"AND"
	};
	let as_truth = |v: &Value| match v {
		Value::Undefined => Ok(None),
		Value::Bool(b) => Ok(Some(*b)),
		_ => Err(mismatch(op, left, right)),
	};
	Ok(match (as_truth(left)?, as_truth(right)?) {
		(Some(l), _) if l == dominant => Value::Bool(dominant),
		(_, Some(r)) if r == dominant => Value::Bool(dominant),
		(Some(_), Some(_)) => Value::Bool(!dominant),
		_ => Value::Undefined,
	})
}

fn arithmetic(op: BinaryOp, left: &Value, right: &Value) -> Result<Value> {
	let name = match op {
		BinaryOp::Add => "+",
		BinaryOp::Sub => "-",
		BinaryOp::Mul => "*",
		_ => "/",
	};
	if left.is_undefined() || right.is_undefined() {
		return Ok(Value::Undefined);
	}

	if let (Some(l), Some(r)) = (integer(left), integer(right)) {
		let result = match op {
			BinaryOp::Add => l.checked_add(r),
			BinaryOp::Sub => l.checked_sub(r),
			BinaryOp::Mul => l.checked_mul(r),
			_ => {
				if r == 0 {
					return Err(EngineError::DivisionByZero.into());
				}
				l.checked_div(r)
			}
		};
		return match result.and_then(|v| i64::try_from(v).ok()) {
			Some(v) => Ok(Value::Int8(v)),
			None => Ok(Value::float8(float(op, l as f64, r as f64))),
		};
	}

	match (left.as_f64(), right.as_f64()) {
		(Some(_), Some(r)) if op == BinaryOp::Div && r == 0.0 => Err(EngineError::DivisionByZero.into()),
		(Some(l), Some(r)) => Ok(Value::float8(float(op, l, r))),
		_ => Err(mismatch(name, left, right)),
	}
}

fn integer(value: &Value) -> Option<i128> {
	match value {
		Value::Int8(v) => Some(i128::from(*v)),
		Value::Uint8(v) => Some(i128::from(*v)),
		_ => None,
	}
}

fn float(op: BinaryOp, l: f64, r: f64) -> f64 {
	match op {
		BinaryOp::Add => l + r,
		BinaryOp::Sub => l - r,
		BinaryOp::Mul => l * r,
		_ => l / r,
	}
}

fn unary(op: UnaryOp, operand: Value) -> Result<Value> {
	match (op, &operand) {
		(_, Value::Undefined) => Ok(Value::Undefined),
		(UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
		(UnaryOp::Negate, Value::Int8(v)) => Ok(v.checked_neg().map(Value::Int8).unwrap_or_else(|| Value::float8(-(*v as f64)))),
		(UnaryOp::Negate, Value::Uint8(v)) => Ok(i64::try_from(*v)
			.ok()
			.and_then(i64::checked_neg)
			.map(Value::Int8)
			.unwrap_or_else(|| Value::float8(-(*v as f64)))),
		(UnaryOp::Negate, Value::Float8(v)) => Ok(Value::float8(-v.value())),
		(UnaryOp::Not, _) => Err(mismatch("NOT", &operand, &Value::Undefined)),
		(UnaryOp::Negate, _) => Err(mismatch("-", &operand, &Value::Undefined)),
	}
}

#[cfg(test)]
mod tests {
	use setdml_core::ErrorKind;

	use super::*;

	fn eval(expr: Expr, row: &Row) -> Result<Value> {
		let params = Params::new().with_value("limit", 10);
		Evaluator::new(&params).evaluate(&expr, &Bindings::row(row))
	}

	fn item() -> Row {
		Row::new().with("Id", 1).with("Val", "x").with("Note", Value::Undefined)
	}

	#[test]
	fn test_comparison_with_undefined_is_undefined() {
		assert_eq!(eval(Expr::field("Note").equals("x"), &item()).unwrap(), Value::Undefined);
		assert_eq!(eval(Expr::field("Val").equals("x"), &item()).unwrap(), Value::Bool(true));
	}

	#[test]
	fn test_three_valued_logic() {
		let row = item();
		let unknown = || Expr::field("Note").equals("x");
		assert_eq!(eval(unknown().and(false), &row).unwrap(), Value::Bool(false));
		assert_eq!(eval(unknown().or(true), &row).unwrap(), Value::Bool(true));
		assert_eq!(eval(unknown().and(true), &row).unwrap(), Value::Undefined);
		assert_eq!(eval(unknown().logical_not(), &row).unwrap(), Value::Undefined);
	}

	#[test]
	fn test_filter_rejects_undefined() {
		let params = Params::new();
		let row = item();
		let evaluator = Evaluator::new(&params);
		assert!(!evaluator.test(&Expr::field("Note").equals("x"), &Bindings::row(&row)).unwrap());
		assert!(evaluator.test(&Expr::field("Note").is_null(), &Bindings::row(&row)).unwrap());
	}

	#[test]
	fn test_arithmetic() {
		let row = item();
		assert_eq!(eval(Expr::field("Id").plus(41), &row).unwrap(), Value::Int8(42));
		assert_eq!(eval(Expr::field("Id").times(2.5), &row).unwrap(), Value::float8(2.5));
		assert_eq!(eval(Expr::field("Id").negated(), &row).unwrap(), Value::Int8(-1));
		assert_eq!(eval(Expr::field("Note").plus(1), &row).unwrap(), Value::Undefined);
	}

	#[test]
	fn test_division_by_zero() {
		let err = eval(Expr::field("Id").binary(BinaryOp::Div, 0), &item()).unwrap_err();
		assert_eq!(err.code, "EXECUTE_005");
		assert_eq!(err.kind(), ErrorKind::Execution);
	}

	#[test]
	fn test_type_mismatch() {
		let err = eval(Expr::field("Val").minus(1), &item()).unwrap_err();
		assert_eq!(err.code, "EXECUTE_006");
	}

	#[test]
	fn test_concat() {
		assert_eq!(eval(Expr::field("Val").concat(Expr::field("Id")), &item()).unwrap(), Value::utf8("x1"));
	}

	#[test]
	fn test_parameters() {
		assert_eq!(eval(Expr::field("Id").lt(Expr::param("limit")), &item()).unwrap(), Value::Bool(true));
		let err = eval(Expr::param("missing"), &item()).unwrap_err();
		assert_eq!(err.kind(), ErrorKind::ParameterBinding);
	}

	#[test]
	fn test_matched_scopes() {
		let existing = Row::new().with("Val", "old");
		let inserted = Row::new().with("Val", "new");
		let params = Params::new();
		let bindings = Bindings::matched(&existing, &inserted);
		let value = Evaluator::new(&params)
			.evaluate(&Expr::existing("Val").concat(Expr::inserted("Val")), &bindings)
			.unwrap();
		assert_eq!(value, Value::utf8("oldnew"));
	}
}
