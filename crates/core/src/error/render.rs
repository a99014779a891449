// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::fmt::Write;

use super::diagnostic::Diagnostic;

pub trait DiagnosticRenderer {
	fn render(&self, diagnostic: &Diagnostic) -> String;
}

pub struct DefaultRenderer;

impl DiagnosticRenderer for DefaultRenderer {
	fn render(&self, d: &Diagnostic) -> String {
		let mut output = String::new();

		let _ = writeln!(&mut output, "error[{}]: {}", d.code, d.message);

		if let Some(label) = &d.label {
			let _ = writeln!(&mut output, "  = {}", label);
		}

		if let Some(help) = &d.help {
			let _ = writeln!(&mut output, "\nhelp: {}", help);
		}

		for note in &d.notes {
			let _ = writeln!(&mut output, "\nnote: {}", note);
		}

		if let Some(cause) = &d.cause {
			let _ = writeln!(&mut output, "\ncaused by:");
			output.push_str(&self.render(cause));
		}

		output
	}
}

impl DefaultRenderer {
	pub fn render_string(diagnostic: &Diagnostic) -> String {
		DefaultRenderer.render(diagnostic)
	}
}
