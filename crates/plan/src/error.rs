// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use setdml_core::{Diagnostic, Error, IntoDiagnostic};

#[derive(Debug, thiserror::Error)]
pub enum TranslateError {
	#[error("property `{property}` is not mapped on entity `{entity}`")]
	UnmappedProperty {
		entity: String,
		property: String,
	},

	#[error("no primary-key-compatible join key for entity `{entity}`: the insert shape does not assign `{property}`")]
	MissingJoinKey {
		entity: String,
		property: String,
	},

	#[error("column `{column}` of entity `{entity}` is generated by the store and cannot be assigned")]
	StoreGeneratedAssignment {
		entity: String,
		column: String,
	},

	#[error("{operation} cannot read from {scope}")]
	UnsupportedScope {
		operation: &'static str,
		scope: String,
	},

	#[error("`{property}` is read from the inserted row but the insert shape does not assign it")]
	InsertedNotShaped {
		property: String,
	},

	#[error("{operation} requires a mapped entity as its target")]
	LocalTarget {
		operation: &'static str,
	},

	#[error("{operation} requires at least one assignment")]
	EmptyShape {
		operation: &'static str,
	},

	#[error("column `{column}` is not part of the local row list `{parameter}`")]
	UnknownLocalColumn {
		parameter: String,
		column: String,
	},

	#[error("{operation} does not support joins on its target query")]
	UnsupportedJoin {
		operation: &'static str,
	},
}

impl IntoDiagnostic for TranslateError {
	fn into_diagnostic(self) -> Diagnostic {
		let message = self.to_string();
		let (code, label, help) = match &self {
			TranslateError::UnmappedProperty {
				entity,
				..
			} => (
				"TRANSLATE_001",
				"unmapped property",
				Some(format!("map the property on `{}` or remove it from the operation", entity)),
			),
			TranslateError::MissingJoinKey {
				property,
				..
			} => (
				"TRANSLATE_002",
				"missing join key",
				Some(format!("assign `{}` in the insert shape so source rows can be correlated by key", property)),
			),
			TranslateError::StoreGeneratedAssignment {
				..
			} => (
				"TRANSLATE_003",
				"store generated column",
				Some("identity and concurrency columns are maintained by the store".to_string()),
			),
			TranslateError::UnsupportedScope {
				..
			} => ("TRANSLATE_004", "unsupported scope", None),
			TranslateError::InsertedNotShaped {
				property,
			} => (
				"TRANSLATE_005",
				"inserted value not shaped",
				Some(format!("add `{}` to the insert shape", property)),
			),
			TranslateError::LocalTarget {
				..
			} => ("TRANSLATE_006", "target is not an entity", None),
			TranslateError::EmptyShape {
				..
			} => ("TRANSLATE_007", "empty shape", None),
			TranslateError::UnknownLocalColumn {
				..
			} => ("TRANSLATE_008", "unknown local column", None),
			TranslateError::UnsupportedJoin {
				..
			} => (
				"TRANSLATE_009",
				"join on target",
				Some("filter the target through its own properties instead".to_string()),
			),
		};

		Diagnostic {
			code: code.to_string(),
			message,
			label: Some(label.to_string()),
			help,
			notes: vec![],
			cause: None,
		}
	}
}

impl From<TranslateError> for Error {
	fn from(err: TranslateError) -> Self {
		Error(err.into_diagnostic())
	}
}

#[derive(Debug, thiserror::Error)]
pub enum BindError {
	#[error("Parameter value corrupted")]
	ParameterValueCorrupted {
		parameter: String,
	},

	#[error("parameter `{parameter}` is not bound")]
	MissingParameter {
		parameter: String,
	},
}

impl IntoDiagnostic for BindError {
	fn into_diagnostic(self) -> Diagnostic {
		match self {
			BindError::ParameterValueCorrupted {
				parameter,
			} => Diagnostic {
				code: "PARAMETER_001".to_string(),
				message: "Parameter value corrupted".to_string(),
				label: Some(format!("parameter `{}` is not a row list", parameter)),
				help: Some("bind a list of rows to every parameter that feeds a VALUES table".to_string()),
				notes: vec![],
				cause: None,
			},
			BindError::MissingParameter {
				parameter,
			} => Diagnostic {
				code: "PARAMETER_002".to_string(),
				message: format!("parameter `{}` is not bound", parameter),
				label: Some("missing parameter".to_string()),
				help: None,
				notes: vec![],
				cause: None,
			},
		}
	}
}

impl From<BindError> for Error {
	fn from(err: BindError) -> Self {
		Error(err.into_diagnostic())
	}
}
