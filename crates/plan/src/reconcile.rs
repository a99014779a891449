// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Classification of key-correlated target/source pairs into mutations.
//!
//! The same rules drive SQL generation (which merge clauses exist) and the
//! in-process strategy (what happens to each materialized pair).

use setdml_core::{Error, Result, error::diagnostic::invariant::both_sides_absent};

/// One target row (`outer`) and one source row (`inner`) correlated by key.
#[derive(Clone, Debug, PartialEq)]
pub struct CorrelatedPair<T> {
	pub outer: Option<T>,
	pub inner: Option<T>,
}

impl<T> CorrelatedPair<T> {
	pub fn matched(outer: T, inner: T) -> Self {
		Self {
			outer: Some(outer),
			inner: Some(inner),
		}
	}

	pub fn target_only(outer: T) -> Self {
		Self {
			outer: Some(outer),
			inner: None,
		}
	}

	pub fn source_only(inner: T) -> Self {
		Self {
			outer: None,
			inner: Some(inner),
		}
	}

	pub fn state(&self) -> Result<PairState> {
		match (&self.outer, &self.inner) {
			(Some(_), Some(_)) => Ok(PairState::Matched),
			(Some(_), None) => Ok(PairState::TargetOnly),
			(None, Some(_)) => Ok(PairState::SourceOnly),
			(None, None) => {
				tracing::error!("correlated pair with both sides absent");
				Err(Error(both_sides_absent()))
			}
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PairState {
	Matched,
	TargetOnly,
	SourceOnly,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Action<T> {
	Insert(T),
	Update(T),
	Delete(T),
	Skip,
}

impl<T> Action<T> {
	pub fn kind(&self) -> ActionKind {
		match self {
			Action::Insert(_) => ActionKind::Insert,
			Action::Update(_) => ActionKind::Update,
			Action::Delete(_) => ActionKind::Delete,
			Action::Skip => ActionKind::Skip,
		}
	}

	pub fn is_mutation(&self) -> bool {
		!matches!(self, Action::Skip)
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ActionKind {
	Insert,
	Update,
	Delete,
	Skip,
}

/// Which strategies are present, independent of how they are evaluated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReconcilePolicy {
	pub insert: bool,
	pub update: bool,
	pub delete_unmatched: bool,
}

impl ReconcilePolicy {
	pub fn decide(&self, state: PairState) -> ActionKind {
		match state {
			PairState::Matched if self.update => ActionKind::Update,
			PairState::TargetOnly if self.delete_unmatched => ActionKind::Delete,
			PairState::SourceOnly if self.insert => ActionKind::Insert,
			_ => ActionKind::Skip,
		}
	}
}

/// Shapes a source row into a new target instance.
pub trait InsertShaper<T> {
	fn shape(&self, source: &T) -> Result<T>;
}

/// Merges an existing target with the shaped candidate.
pub trait UpdateExtractor<T> {
	fn extract(&self, existing: &T, candidate: &T) -> Result<T>;
}

impl<T, F> InsertShaper<T> for F
where
	F: Fn(&T) -> Result<T>,
{
	fn shape(&self, source: &T) -> Result<T> {
		self(source)
	}
}

impl<T, F> UpdateExtractor<T> for F
where
	F: Fn(&T, &T) -> Result<T>,
{
	fn extract(&self, existing: &T, candidate: &T) -> Result<T> {
		self(existing, candidate)
	}
}

pub struct Reconciler<'a, T> {
	insert: Option<&'a dyn InsertShaper<T>>,
	update: Option<&'a dyn UpdateExtractor<T>>,
	delete_unmatched: bool,
}

impl<'a, T> Default for Reconciler<'a, T> {
	fn default() -> Self {
		Self {
			insert: None,
			update: None,
			delete_unmatched: false,
		}
	}
}

impl<'a, T: Clone> Reconciler<'a, T> {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_insert(mut self, shaper: &'a dyn InsertShaper<T>) -> Self {
		self.insert = Some(shaper);
		self
	}

	pub fn with_update(mut self, extractor: &'a dyn UpdateExtractor<T>) -> Self {
		self.update = Some(extractor);
		self
	}

	pub fn delete_unmatched(mut self, enabled: bool) -> Self {
		self.delete_unmatched = enabled;
		self
	}

	pub fn policy(&self) -> ReconcilePolicy {
		ReconcilePolicy {
			insert: self.insert.is_some(),
			update: self.update.is_some(),
			delete_unmatched: self.delete_unmatched,
		}
	}

	/// Classifies a merge pair. Matched pairs are merged against the shaped
	/// source row, or the raw source row when no shaper is present.
	pub fn classify(&self, pair: CorrelatedPair<T>) -> Result<Action<T>> {
		let state = pair.state()?;
		let CorrelatedPair {
			outer,
			inner,
		} = pair;

		Ok(match (self.policy().decide(state), outer, inner) {
			(ActionKind::Update, Some(outer), Some(inner)) => {
				let candidate = match self.insert {
					Some(shaper) => shaper.shape(&inner)?,
					None => inner,
				};
				match self.update {
					Some(extractor) => Action::Update(extractor.extract(&outer, &candidate)?),
					None => Action::Skip,
				}
			}
			(ActionKind::Delete, Some(outer), None) => Action::Delete(outer),
			(ActionKind::Insert, None, Some(inner)) => match self.insert {
				Some(shaper) => Action::Insert(shaper.shape(&inner)?),
				None => Action::Skip,
			},
			_ => Action::Skip,
		})
	}

	/// Classifies an upsert source row against the existing target, if any.
	/// The candidate is always shaped, even when it ends up unused.
	pub fn classify_upsert(&self, existing: Option<&T>, source: &T) -> Result<Action<T>> {
		let candidate = match self.insert {
			Some(shaper) => shaper.shape(source)?,
			None => source.clone(),
		};
		Ok(match existing {
			None => Action::Insert(candidate),
			Some(existing) => match self.update {
				Some(extractor) => Action::Update(extractor.extract(existing, &candidate)?),
				None => Action::Skip,
			},
		})
	}
}

#[cfg(test)]
mod tests {
	use std::cell::Cell;

	use setdml_core::ErrorKind;

	use super::*;

	#[derive(Clone, Debug, PartialEq)]
	struct Item {
		id: i64,
		val: &'static str,
	}

	fn item(id: i64, val: &'static str) -> Item {
		Item {
			id,
			val,
		}
	}

	fn identity(source: &Item) -> Result<Item> {
		Ok(source.clone())
	}

	fn take_new(_existing: &Item, candidate: &Item) -> Result<Item> {
		Ok(candidate.clone())
	}

	#[test]
	fn test_exhaustive_classification() {
		let shaper = identity;
		let extractor = take_new;
		let full = Reconciler::<Item>::new().with_insert(&shaper).with_update(&extractor).delete_unmatched(true);

		assert_eq!(
			full.classify(CorrelatedPair::matched(item(1, "a"), item(1, "b"))).unwrap(),
			Action::Update(item(1, "b"))
		);
		assert_eq!(full.classify(CorrelatedPair::target_only(item(2, "x"))).unwrap(), Action::Delete(item(2, "x")));
		assert_eq!(full.classify(CorrelatedPair::source_only(item(3, "c"))).unwrap(), Action::Insert(item(3, "c")));
	}

	#[test]
	fn test_missing_strategies_skip() {
		let none = Reconciler::<Item>::new();

		assert_eq!(none.classify(CorrelatedPair::matched(item(1, "a"), item(1, "b"))).unwrap(), Action::Skip);
		assert_eq!(none.classify(CorrelatedPair::target_only(item(2, "x"))).unwrap(), Action::Skip);
		assert_eq!(none.classify(CorrelatedPair::source_only(item(3, "c"))).unwrap(), Action::Skip);
	}

	#[test]
	fn test_delete_disabled_never_deletes() {
		let shaper = identity;
		let extractor = take_new;
		let reconciler = Reconciler::<Item>::new().with_insert(&shaper).with_update(&extractor).delete_unmatched(false);

		for id in 0..50 {
			let action = reconciler.classify(CorrelatedPair::target_only(item(id, "x"))).unwrap();
			assert_eq!(action, Action::Skip);
		}
	}

	#[test]
	fn test_both_absent_is_invariant_violation() {
		let reconciler = Reconciler::<Item>::new();
		let err = reconciler
			.classify(CorrelatedPair {
				outer: None,
				inner: None,
			})
			.unwrap_err();
		assert_eq!(err.kind(), ErrorKind::InvariantViolation);
	}

	#[test]
	fn test_upsert_without_match_inserts() {
		let shaper = identity;
		let reconciler = Reconciler::<Item>::new().with_insert(&shaper);
		assert_eq!(reconciler.classify_upsert(None, &item(1, "z")).unwrap(), Action::Insert(item(1, "z")));
	}

	#[test]
	fn test_upsert_match_without_extractor_skips() {
		let calls = Cell::new(0);
		let shaper = |source: &Item| -> Result<Item> {
			calls.set(calls.get() + 1);
			Ok(source.clone())
		};
		let reconciler = Reconciler::<Item>::new().with_insert(&shaper);

		let action = reconciler.classify_upsert(Some(&item(1, "a")), &item(1, "z")).unwrap();
		assert_eq!(action, Action::Skip);
		// shaped eagerly even though unused
		assert_eq!(calls.get(), 1);
	}

	#[test]
	fn test_upsert_match_with_extractor_updates() {
		let shaper = identity;
		let extractor = |existing: &Item, candidate: &Item| -> Result<Item> {
			Ok(Item {
				id: existing.id,
				val: candidate.val,
			})
		};
		let reconciler = Reconciler::<Item>::new().with_insert(&shaper).with_update(&extractor);

		let action = reconciler.classify_upsert(Some(&item(1, "a")), &item(1, "z")).unwrap();
		assert_eq!(action, Action::Update(item(1, "z")));
	}

	#[test]
	fn test_policy_decide() {
		let policy = ReconcilePolicy {
			insert: true,
			update: false,
			delete_unmatched: true,
		};
		assert_eq!(policy.decide(PairState::Matched), ActionKind::Skip);
		assert_eq!(policy.decide(PairState::TargetOnly), ActionKind::Delete);
		assert_eq!(policy.decide(PairState::SourceOnly), ActionKind::Insert);
	}
}
