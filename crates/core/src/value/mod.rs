// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	cmp::Ordering,
	fmt::{Display, Formatter},
};

use serde::{Deserialize, Serialize};

mod ordered_f64;

pub use ordered_f64::OrderedF64;

/// A single cell value, either logical (entity property) or storage form.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Value {
	/// Absent value; rendered as `NULL` in SQL.
	#[default]
	Undefined,
	Bool(bool),
	Int8(i64),
	Uint8(u64),
	Float8(OrderedF64),
	Utf8(String),
	Blob(Vec<u8>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
	Undefined,
	Bool,
	Int8,
	Uint8,
	Float8,
	Utf8,
	Blob,
}

impl Value {
	/// Builds a float value; NaN becomes [`Value::Undefined`].
	pub fn float8(v: impl Into<f64>) -> Self {
		OrderedF64::new(v.into()).map(Value::Float8).unwrap_or(Value::Undefined)
	}

	pub fn utf8(v: impl Into<String>) -> Self {
		Value::Utf8(v.into())
	}

	pub fn is_undefined(&self) -> bool {
		matches!(self, Value::Undefined)
	}

	pub fn kind(&self) -> ValueKind {
		match self {
			Value::Undefined => ValueKind::Undefined,
			Value::Bool(_) => ValueKind::Bool,
			Value::Int8(_) => ValueKind::Int8,
			Value::Uint8(_) => ValueKind::Uint8,
			Value::Float8(_) => ValueKind::Float8,
			Value::Utf8(_) => ValueKind::Utf8,
			Value::Blob(_) => ValueKind::Blob,
		}
	}

	pub fn as_bool(&self) -> Option<bool> {
		match self {
			Value::Bool(b) => Some(*b),
			_ => None,
		}
	}

	pub fn as_i64(&self) -> Option<i64> {
		match self {
			Value::Int8(v) => Some(*v),
			Value::Uint8(v) => i64::try_from(*v).ok(),
			_ => None,
		}
	}

	pub fn as_f64(&self) -> Option<f64> {
		match self {
			Value::Int8(v) => Some(*v as f64),
			Value::Uint8(v) => Some(*v as f64),
			Value::Float8(v) => Some(v.value()),
			_ => None,
		}
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			Value::Utf8(s) => Some(s.as_str()),
			_ => None,
		}
	}

	/// SQL comparison: `None` when either side is undefined or the kinds
	/// are not comparable.
	pub fn compare(&self, other: &Value) -> Option<Ordering> {
		match (self, other) {
			(Value::Undefined, _) | (_, Value::Undefined) => None,
			(Value::Bool(l), Value::Bool(r)) => Some(l.cmp(r)),
			(Value::Int8(l), Value::Int8(r)) => Some(l.cmp(r)),
			(Value::Uint8(l), Value::Uint8(r)) => Some(l.cmp(r)),
			(Value::Int8(l), Value::Uint8(r)) => Some(i128::from(*l).cmp(&i128::from(*r))),
			(Value::Uint8(l), Value::Int8(r)) => Some(i128::from(*l).cmp(&i128::from(*r))),
			(Value::Utf8(l), Value::Utf8(r)) => Some(l.cmp(r)),
			(Value::Blob(l), Value::Blob(r)) => Some(l.cmp(r)),
			(l, r) => match (l.as_f64(), r.as_f64()) {
				(Some(l), Some(r)) => l.partial_cmp(&r),
				_ => None,
			},
		}
	}
}

impl Display for Value {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			Value::Undefined => f.write_str("undefined"),
			Value::Bool(v) => Display::fmt(v, f),
			Value::Int8(v) => Display::fmt(v, f),
			Value::Uint8(v) => Display::fmt(v, f),
			Value::Float8(v) => Display::fmt(v, f),
			Value::Utf8(v) => f.write_str(v),
			Value::Blob(v) => {
				f.write_str("0x")?;
				for byte in v {
					write!(f, "{:02x}", byte)?;
				}
				Ok(())
			}
		}
	}
}

impl From<bool> for Value {
	fn from(v: bool) -> Self {
		Value::Bool(v)
	}
}

impl From<i32> for Value {
	fn from(v: i32) -> Self {
		Value::Int8(v as i64)
	}
}

impl From<i64> for Value {
	fn from(v: i64) -> Self {
		Value::Int8(v)
	}
}

impl From<u64> for Value {
	fn from(v: u64) -> Self {
		Value::Uint8(v)
	}
}

impl From<f64> for Value {
	fn from(v: f64) -> Self {
		Value::float8(v)
	}
}

impl From<&str> for Value {
	fn from(v: &str) -> Self {
		Value::Utf8(v.to_string())
	}
}

impl From<String> for Value {
	fn from(v: String) -> Self {
		Value::Utf8(v)
	}
}

impl From<Vec<u8>> for Value {
	fn from(v: Vec<u8>) -> Self {
		Value::Blob(v)
	}
}

impl<T: Into<Value>> From<Option<T>> for Value {
	fn from(v: Option<T>) -> Self {
		v.map(Into::into).unwrap_or(Value::Undefined)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_nan_is_undefined() {
		assert_eq!(Value::float8(f64::NAN), Value::Undefined);
	}

	#[test]
	fn test_compare_undefined_is_unknown() {
		assert_eq!(Value::Undefined.compare(&Value::Int8(1)), None);
		assert_eq!(Value::Int8(1).compare(&Value::Undefined), None);
	}

	#[test]
	fn test_compare_mixed_numeric() {
		assert_eq!(Value::Int8(-1).compare(&Value::Uint8(1)), Some(Ordering::Less));
		assert_eq!(Value::Int8(2).compare(&Value::float8(1.5)), Some(Ordering::Greater));
		assert_eq!(Value::utf8("a").compare(&Value::Int8(1)), None);
	}

	#[test]
	fn test_display_blob() {
		assert_eq!(Value::Blob(vec![0xde, 0xad]).to_string(), "0xdead");
	}

	#[test]
	fn test_from_option() {
		assert_eq!(Value::from(None::<i64>), Value::Undefined);
		assert_eq!(Value::from(Some("x")), Value::utf8("x"));
	}
}
