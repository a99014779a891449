// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use super::Diagnostic;

/// A correlated pair with neither a target nor a source row.
pub fn both_sides_absent() -> Diagnostic {
	Diagnostic {
		code: "INVARIANT_001".to_string(),
		message: "correlated pair has neither a target nor a source row".to_string(),
		label: Some("impossible correlation state".to_string()),
		help: Some("the key correlation produced an empty pair; this is a defect in the correlation pass".to_string()),
		notes: vec![],
		cause: None,
	}
}
