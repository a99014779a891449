// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use setdml_core::{Diagnostic, Error, IntoDiagnostic};

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
	#[error("entity `{entity}` has no storage mapping")]
	EntityNotFound {
		entity: String,
	},

	#[error("primary key column `{column}` of entity `{entity}` is not mapped")]
	KeyColumnNotMapped {
		entity: String,
		column: String,
	},

	#[error("entity `{entity}` declares no primary key")]
	MissingPrimaryKey {
		entity: String,
	},

	#[error("property `{property}` of entity `{entity}` is mapped twice")]
	DuplicateProperty {
		entity: String,
		property: String,
	},
}

impl IntoDiagnostic for CatalogError {
	fn into_diagnostic(self) -> Diagnostic {
		let message = self.to_string();
		match self {
			CatalogError::EntityNotFound {
				entity,
			} => Diagnostic {
				code: "CATALOG_001".to_string(),
				message,
				label: Some("unknown entity".to_string()),
				help: Some(format!("register a mapping for `{}` before compiling operations on it", entity)),
				notes: vec![],
				cause: None,
			},

			CatalogError::KeyColumnNotMapped {
				column,
				..
			} => Diagnostic {
				code: "CATALOG_002".to_string(),
				message,
				label: Some("primary key column without a property".to_string()),
				help: Some(format!("map a property to column `{}`", column)),
				notes: vec!["every primary key column must appear in the property to column mapping".to_string()],
				cause: None,
			},

			CatalogError::MissingPrimaryKey {
				..
			} => Diagnostic {
				code: "CATALOG_003".to_string(),
				message,
				label: Some("no primary key".to_string()),
				help: Some("declare the key columns with `.key(..)`".to_string()),
				notes: vec![],
				cause: None,
			},

			CatalogError::DuplicateProperty {
				..
			} => Diagnostic {
				code: "CATALOG_004".to_string(),
				message,
				label: Some("duplicate property".to_string()),
				help: None,
				notes: vec![],
				cause: None,
			},
		}
	}
}

impl From<CatalogError> for Error {
	fn from(err: CatalogError) -> Self {
		Error(err.into_diagnostic())
	}
}
