// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use super::Diagnostic;

pub fn operation_cancelled() -> Diagnostic {
	Diagnostic {
		code: "CANCELLED_001".to_string(),
		message: "operation was cancelled".to_string(),
		label: Some("cancellation requested".to_string()),
		help: None,
		notes: vec!["no staged changes were committed".to_string()],
		cause: None,
	}
}
