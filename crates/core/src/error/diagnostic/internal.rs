// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use super::Diagnostic;

/// Creates an internal error diagnostic carrying its source location.
pub fn internal_with_context(
	reason: impl Into<String>,
	file: &str,
	line: u32,
	column: u32,
	function: &str,
	module_path: &str,
) -> Diagnostic {
	let reason = reason.into();

	let error_id = format!(
		"ERR-{}:{}",
		file.rsplit('/').next().unwrap_or(file).replace(".rs", ""),
		line
	);

	Diagnostic {
		code: "INTERNAL_ERROR".to_string(),
		message: format!("Internal error [{}]: {}", error_id, reason),
		label: Some(format!("Internal invariant violated at {}:{}:{}", file, line, column)),
		help: Some(format!(
			"This is an internal error that should never occur in normal operation.\n\
			 Location: {}:{}:{}\nFunction: {}\nModule: {}\nVersion: {}",
			file,
			line,
			column,
			function,
			module_path,
			env!("CARGO_PKG_VERSION"),
		)),
		notes: vec![
			format!("Error occurred in function: {}", function),
			format!("Error tracking ID: {}", error_id),
		],
		cause: None,
	}
}

/// Internal error without location context.
pub fn internal(reason: impl Into<String>) -> Diagnostic {
	internal_with_context(reason, "unknown", 0, 0, "unknown", "unknown")
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::Error;

	#[test]
	fn test_internal_error_literal_string() {
		let diagnostic = crate::internal_error!("simple error message");

		assert_eq!(diagnostic.code, "INTERNAL_ERROR");
		assert!(diagnostic.message.contains("simple error message"));
		assert!(diagnostic.help.is_some());
		assert!(!diagnostic.notes.is_empty());
	}

	#[test]
	fn test_internal_error_with_format() {
		let diagnostic = crate::internal_error!("row {} has no key {}", 7, "Id");

		assert!(diagnostic.message.contains("row 7 has no key Id"));
		assert!(diagnostic.label.as_ref().is_some_and(|l| l.contains("internal.rs")));
	}

	#[test]
	fn test_internal_function() {
		let diagnostic = internal("basic internal error");

		assert_eq!(diagnostic.code, "INTERNAL_ERROR");
		assert!(diagnostic.label.as_ref().is_some_and(|l| l.contains("unknown:0:0")));
	}

	#[test]
	fn test_return_internal_error_in_function() {
		fn failing(value: u32) -> crate::Result<()> {
			crate::return_internal_error!("invalid value: {:#04x}", value);
		}

		let err: Error = failing(255).unwrap_err();
		assert_eq!(err.code, "INTERNAL_ERROR");
		assert!(err.message.contains("invalid value: 0xff"));
	}
}
