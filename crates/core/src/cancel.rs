// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::sync::{
	Arc,
	atomic::{AtomicBool, Ordering},
};

use crate::error::diagnostic::cancelled::operation_cancelled;

/// Cooperative cancellation signal shared between a caller and an operation.
#[derive(Clone, Debug)]
pub struct CancellationToken {
	cancelled: Arc<AtomicBool>,
	upstream: Vec<Arc<AtomicBool>>,
}

impl CancellationToken {
	/// Create a new cancellation token.
	pub fn new() -> Self {
		Self {
			cancelled: Arc::new(AtomicBool::new(false)),
			upstream: Vec::new(),
		}
	}

	/// A fresh token that reports cancellation when either `self` or
	/// `other` is cancelled. Cancelling the linked token does not cancel its
	/// sources.
	pub fn linked(&self, other: &CancellationToken) -> Self {
		let mut upstream = Vec::with_capacity(self.upstream.len() + other.upstream.len() + 2);
		upstream.push(self.cancelled.clone());
		upstream.extend(self.upstream.iter().cloned());
		upstream.push(other.cancelled.clone());
		upstream.extend(other.upstream.iter().cloned());
		Self {
			cancelled: Arc::new(AtomicBool::new(false)),
			upstream,
		}
	}

	/// Signal cancellation.
	pub fn cancel(&self) {
		self.cancelled.store(true, Ordering::SeqCst);
	}

	/// Check if cancellation was requested.
	pub fn is_cancelled(&self) -> bool {
		self.cancelled.load(Ordering::SeqCst) || self.upstream.iter().any(|flag| flag.load(Ordering::SeqCst))
	}

	/// Fails with a cancellation error once cancellation was requested.
	pub fn check(&self) -> crate::Result<()> {
		if self.is_cancelled() {
			crate::return_error!(operation_cancelled());
		}
		Ok(())
	}
}

impl Default for CancellationToken {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::ErrorKind;

	#[test]
	fn test_cancel() {
		let token = CancellationToken::new();
		assert!(!token.is_cancelled());
		token.cancel();
		assert!(token.is_cancelled());
		assert_eq!(token.check().unwrap_err().kind(), ErrorKind::Cancelled);
	}

	#[test]
	fn test_clone_shares_state() {
		let token = CancellationToken::new();
		let clone = token.clone();
		token.cancel();
		assert!(clone.is_cancelled());
	}

	#[test]
	fn test_linked_observes_either_source() {
		let inner = CancellationToken::new();
		let outer = CancellationToken::new();
		let linked = inner.linked(&outer);
		assert!(!linked.is_cancelled());
		outer.cancel();
		assert!(linked.is_cancelled());

		let inner = CancellationToken::new();
		let outer = CancellationToken::new();
		let linked = inner.linked(&outer);
		inner.cancel();
		assert!(linked.is_cancelled());
	}

	#[test]
	fn test_cancelling_linked_leaves_sources() {
		let inner = CancellationToken::new();
		let outer = CancellationToken::new();
		let linked = inner.linked(&outer);
		linked.cancel();
		assert!(!inner.is_cancelled());
		assert!(!outer.is_cancelled());
	}

	#[test]
	fn test_linking_is_transitive() {
		let a = CancellationToken::new();
		let b = CancellationToken::new();
		let c = CancellationToken::new();
		let ab = a.linked(&b);
		let abc = ab.linked(&c);
		a.cancel();
		assert!(abc.is_cancelled());
	}
}
