// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use setdml_catalog::ValueConverter;
use setdml_core::{Params, Result, Value};
use setdml_plan::BindError;

/// Where the value of one placeholder comes from.
#[derive(Clone, Debug)]
pub enum ParameterRef {
	/// A scalar runtime parameter.
	Scalar(String),
	/// One cell of a bound row list.
	Cell {
		parameter: String,
		row: usize,
		column: String,
		converter: Option<ValueConverter>,
	},
	/// A constant without a literal form in SQL text.
	Constant(Value),
}

impl ParameterRef {
	pub fn resolve(&self, params: &Params) -> Result<Value> {
		match self {
			ParameterRef::Scalar(name) => match params.value(name) {
				Some(value) => Ok(value.clone()),
				None if params.get(name).is_some() => Err(BindError::ParameterValueCorrupted {
					parameter: name.clone(),
				}
				.into()),
				None => Err(BindError::MissingParameter {
					parameter: name.clone(),
				}
				.into()),
			},
			ParameterRef::Constant(value) => Ok(value.clone()),
			ParameterRef::Cell {
				parameter,
				row,
				column,
				converter,
			} => {
				let Some(row) = params.rows(parameter).and_then(|rows| rows.get(*row)) else {
					return Err(BindError::ParameterValueCorrupted {
						parameter: parameter.clone(),
					}
					.into());
				};
				let value = row.value(column);
				Ok(match converter {
					Some(converter) => converter.to_storage(value),
					None => value.clone(),
				})
			}
		}
	}
}

/// One statement's text and its placeholders in order.
#[derive(Clone, Debug)]
pub struct SqlStatement {
	pub sql: String,
	pub parameters: Vec<ParameterRef>,
}

/// Emitted SQL for one plan. Most dialects produce a single statement;
/// merge without native support is a sequence run in order.
#[derive(Clone, Debug)]
pub struct CompiledSql {
	pub statements: Vec<SqlStatement>,
}

impl CompiledSql {
	pub fn sql(&self) -> String {
		self.statements.iter().map(|s| s.sql.as_str()).collect::<Vec<_>>().join(";\n")
	}

	pub fn parameter_count(&self) -> usize {
		self.statements.iter().map(|s| s.parameters.len()).sum()
	}

	pub fn bind(&self, params: &Params) -> Result<Vec<BoundStatement>> {
		self.statements
			.iter()
			.map(|statement| {
				let values = statement.parameters.iter().map(|p| p.resolve(params)).collect::<Result<Vec<_>>>()?;
				Ok(BoundStatement {
					sql: statement.sql.clone(),
					params: values,
				})
			})
			.collect()
	}
}

/// A statement ready to execute: text plus positional values.
#[derive(Clone, Debug, PartialEq)]
pub struct BoundStatement {
	pub sql: String,
	pub params: Vec<Value>,
}

#[cfg(test)]
mod tests {
	use setdml_core::{ErrorKind, Row};

	use super::*;

	#[test]
	fn test_scalar_binding() {
		let params = Params::new().with_value("min", 10);
		let value = ParameterRef::Scalar("min".to_string()).resolve(&params).unwrap();
		assert_eq!(value, Value::Int8(10));
	}

	#[test]
	fn test_missing_scalar() {
		let err = ParameterRef::Scalar("min".to_string()).resolve(&Params::new()).unwrap_err();
		assert_eq!(err.code, "PARAMETER_002");
		assert_eq!(err.kind(), ErrorKind::ParameterBinding);
	}

	#[test]
	fn test_cell_binding_converts() {
		let params = Params::new().with_rows("rows", vec![Row::new().with("Name", "ada")]);
		let cell = ParameterRef::Cell {
			parameter: "rows".to_string(),
			row: 0,
			column: "Name".to_string(),
			converter: Some(ValueConverter::new(
				"upper",
				|v| Value::utf8(v.as_str().unwrap_or_default().to_uppercase()),
				|v| v.clone(),
			)),
		};
		assert_eq!(cell.resolve(&params).unwrap(), Value::utf8("ADA"));
	}

	#[test]
	fn test_absent_cell_is_null() {
		let params = Params::new().with_rows("rows", vec![Row::new().with("Id", 1)]);
		let cell = ParameterRef::Cell {
			parameter: "rows".to_string(),
			row: 0,
			column: "Val".to_string(),
			converter: None,
		};
		assert_eq!(cell.resolve(&params).unwrap(), Value::Undefined);
	}

	#[test]
	fn test_row_out_of_range_is_corrupted() {
		let params = Params::new().with_rows("rows", vec![]);
		let cell = ParameterRef::Cell {
			parameter: "rows".to_string(),
			row: 2,
			column: "Id".to_string(),
			converter: None,
		};
		assert_eq!(cell.resolve(&params).unwrap_err().message, "Parameter value corrupted");
	}
}
