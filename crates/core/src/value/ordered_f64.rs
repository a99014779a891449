// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	cmp::Ordering,
	fmt::{Display, Formatter},
	hash::{Hash, Hasher},
};

/// An `f64` with total equality, ordering and hashing. NaN is rejected and
/// negative zero is stored as positive zero.
#[derive(Clone, Copy, Debug, Default)]
pub struct OrderedF64(f64);

impl OrderedF64 {
	pub fn new(value: f64) -> Option<Self> {
		if value.is_nan() {
			None
		} else {
			// -0.0 == 0.0 but differs in bits
			let normalized = if value == 0.0 {
				0.0
			} else {
				value
			};
			Some(Self(normalized))
		}
	}

	pub fn value(&self) -> f64 {
		self.0
	}
}

impl From<OrderedF64> for f64 {
	fn from(v: OrderedF64) -> Self {
		v.0
	}
}

impl PartialEq for OrderedF64 {
	fn eq(&self, other: &Self) -> bool {
		self.0.to_bits() == other.0.to_bits()
	}
}

impl Eq for OrderedF64 {}

impl PartialOrd for OrderedF64 {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl Ord for OrderedF64 {
	fn cmp(&self, other: &Self) -> Ordering {
		self.0.total_cmp(&other.0)
	}
}

impl Hash for OrderedF64 {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.0.to_bits().hash(state);
	}
}

impl Display for OrderedF64 {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		Display::fmt(&self.0, f)
	}
}
