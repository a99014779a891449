// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use indexmap::IndexMap;

use crate::Value;

static UNDEFINED: Value = Value::Undefined;

/// Named values in insertion order. Keys are logical property paths or
/// physical column names depending on where the row is used.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Row(IndexMap<String, Value>);

impl Row {
	pub fn new() -> Self {
		Self(IndexMap::new())
	}

	pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
		self.0.insert(name.into(), value.into());
		self
	}

	pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
		self.0.insert(name.into(), value.into());
	}

	pub fn get(&self, name: &str) -> Option<&Value> {
		self.0.get(name)
	}

	/// Value of `name`, or undefined when the row has no such entry.
	pub fn value(&self, name: &str) -> &Value {
		self.0.get(name).unwrap_or(&UNDEFINED)
	}

	pub fn contains(&self, name: &str) -> bool {
		self.0.contains_key(name)
	}

	pub fn remove(&mut self, name: &str) -> Option<Value> {
		self.0.shift_remove(name)
	}

	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.0.keys().map(String::as_str)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
		self.0.iter().map(|(k, v)| (k.as_str(), v))
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Row {
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
	}
}

impl IntoIterator for Row {
	type Item = (String, Value);
	type IntoIter = indexmap::map::IntoIter<String, Value>;

	fn into_iter(self) -> Self::IntoIter {
		self.0.into_iter()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_missing_is_undefined() {
		let row = Row::new().with("Id", 1);
		assert_eq!(row.value("Id"), &Value::Int8(1));
		assert_eq!(row.value("Val"), &Value::Undefined);
		assert!(row.get("Val").is_none());
	}

	#[test]
	fn test_preserves_insertion_order() {
		let row = Row::new().with("b", 1).with("a", 2).with("c", 3);
		assert_eq!(row.names().collect::<Vec<_>>(), vec!["b", "a", "c"]);
	}

	#[test]
	fn test_set_overwrites_in_place() {
		let mut row = Row::new().with("Id", 1).with("Val", "a");
		row.set("Id", 2);
		assert_eq!(row.names().collect::<Vec<_>>(), vec!["Id", "Val"]);
		assert_eq!(row.value("Id"), &Value::Int8(2));
	}
}
