// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	fmt::{Display, Formatter},
	ops::{Deref, DerefMut},
};

pub mod diagnostic;
mod r#macro;
pub mod render;

use diagnostic::Diagnostic;
use render::DefaultRenderer;

/// Failure classes surfaced to callers of a batch operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
	/// The operation could not be lowered into a statement.
	Translation,
	/// A runtime parameter did not have the shape the rewriter expects.
	ParameterBinding,
	/// An impossible internal state was reached. Never recovered.
	InvariantViolation,
	/// Raised by the persistence collaborator and passed through unmodified.
	Execution,
	/// The operation observed its cancellation signal.
	Cancelled,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Error(pub Diagnostic);

impl Deref for Error {
	type Target = Diagnostic;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}

impl DerefMut for Error {
	fn deref_mut(&mut self) -> &mut Self::Target {
		&mut self.0
	}
}

impl Display for Error {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		let out = DefaultRenderer::render_string(&self.0);
		f.write_str(out.as_str())
	}
}

impl Error {
	pub fn diagnostic(self) -> Diagnostic {
		self.0
	}

	pub fn kind(&self) -> ErrorKind {
		let code = self.0.code.as_str();
		if code.starts_with("TRANSLATE_") || code.starts_with("CATALOG_") {
			ErrorKind::Translation
		} else if code.starts_with("PARAMETER_") {
			ErrorKind::ParameterBinding
		} else if code == "INTERNAL_ERROR" || code.starts_with("INVARIANT_") {
			ErrorKind::InvariantViolation
		} else if code.starts_with("CANCELLED_") {
			ErrorKind::Cancelled
		} else {
			ErrorKind::Execution
		}
	}
}

impl std::error::Error for Error {}

impl From<Diagnostic> for Error {
	fn from(diagnostic: Diagnostic) -> Self {
		Error(diagnostic)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::diagnostic::{cancelled::operation_cancelled, invariant::both_sides_absent};

	fn with_code(code: &str) -> Error {
		Error(Diagnostic {
			code: code.to_string(),
			message: "message".to_string(),
			..Default::default()
		})
	}

	#[test]
	fn test_kind_by_code() {
		assert_eq!(with_code("TRANSLATE_001").kind(), ErrorKind::Translation);
		assert_eq!(with_code("CATALOG_001").kind(), ErrorKind::Translation);
		assert_eq!(with_code("PARAMETER_001").kind(), ErrorKind::ParameterBinding);
		assert_eq!(with_code("INTERNAL_ERROR").kind(), ErrorKind::InvariantViolation);
		assert_eq!(with_code("SQLITE_001").kind(), ErrorKind::Execution);
	}

	#[test]
	fn test_builtin_diagnostics() {
		assert_eq!(Error(both_sides_absent()).kind(), ErrorKind::InvariantViolation);
		assert_eq!(Error(operation_cancelled()).kind(), ErrorKind::Cancelled);
	}

	#[test]
	fn test_display_renders_code_and_message() {
		let err = Error(Diagnostic {
			code: "EXECUTE_001".to_string(),
			message: "duplicate key".to_string(),
			help: Some("remove the duplicate".to_string()),
			notes: vec!["table `Orders`".to_string()],
			..Default::default()
		});
		let rendered = err.to_string();
		assert!(rendered.starts_with("error[EXECUTE_001]: duplicate key\n"));
		assert!(rendered.contains("help: remove the duplicate"));
		assert!(rendered.contains("note: table `Orders`"));
	}
}
