// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use setdml_core::{Diagnostic, Error, IntoDiagnostic, Value};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
	#[error("invalid engine configuration: {reason}")]
	InvalidConfig {
		reason: String,
	},

	#[error("engine is missing its {component}")]
	MissingComponent {
		component: &'static str,
	},

	#[error("duplicate key {key:?} in table `{table}`")]
	DuplicateKey {
		table: String,
		key: Vec<Value>,
	},

	#[error("source key {key:?} matches more than one source row")]
	DuplicateSourceKey {
		key: Vec<Value>,
	},

	#[error("table `{table}` does not exist")]
	UnknownTable {
		table: String,
	},

	#[error("row with key {key:?} no longer exists in table `{table}`")]
	MissingRow {
		table: String,
		key: Vec<Value>,
	},

	#[error("division by zero")]
	DivisionByZero,

	#[error("cannot apply `{op}` to {left} and {right}")]
	TypeMismatch {
		op: &'static str,
		left: String,
		right: String,
	},

	#[error("{message}")]
	Backend {
		message: String,
	},
}

impl IntoDiagnostic for EngineError {
	fn into_diagnostic(self) -> Diagnostic {
		let message = self.to_string();
		let (code, help) = match &self {
			EngineError::InvalidConfig {
				..
			} => ("CONFIG_001", Some("check the engine configuration document".to_string())),
			EngineError::MissingComponent {
				component,
			} => ("CONFIG_002", Some(format!("supply a {} to the engine builder", component))),
			EngineError::DuplicateKey {
				..
			} => ("EXECUTE_001", None),
			EngineError::DuplicateSourceKey {
				..
			} => (
				"EXECUTE_002",
				Some("a merge source may contain each key at most once".to_string()),
			),
			EngineError::UnknownTable {
				..
			} => ("EXECUTE_003", None),
			EngineError::MissingRow {
				..
			} => ("EXECUTE_004", None),
			EngineError::DivisionByZero => ("EXECUTE_005", None),
			EngineError::TypeMismatch {
				..
			} => ("EXECUTE_006", None),
			EngineError::Backend {
				..
			} => ("EXECUTE_007", None),
		};

		Diagnostic {
			code: code.to_string(),
			message,
			label: None,
			help,
			notes: vec![],
			cause: None,
		}
	}
}

impl From<EngineError> for Error {
	fn from(err: EngineError) -> Self {
		Error(err.into_diagnostic())
	}
}
