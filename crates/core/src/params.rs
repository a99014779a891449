// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::collections::HashMap;

use crate::{Row, Value};

/// A runtime parameter bound to a compiled operation.
#[derive(Clone, Debug, PartialEq)]
pub enum Param {
	Value(Value),
	/// A finite, indexable list of rows feeding a `VALUES` table.
	Rows(Vec<Row>),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Params(HashMap<String, Param>);

impl Params {
	pub fn new() -> Self {
		Self(HashMap::new())
	}

	pub fn with_value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
		self.0.insert(name.into(), Param::Value(value.into()));
		self
	}

	pub fn with_rows(mut self, name: impl Into<String>, rows: Vec<Row>) -> Self {
		self.0.insert(name.into(), Param::Rows(rows));
		self
	}

	pub fn insert(&mut self, name: impl Into<String>, param: Param) {
		self.0.insert(name.into(), param);
	}

	pub fn get(&self, name: &str) -> Option<&Param> {
		self.0.get(name)
	}

	pub fn rows(&self, name: &str) -> Option<&[Row]> {
		match self.0.get(name) {
			Some(Param::Rows(rows)) => Some(rows.as_slice()),
			_ => None,
		}
	}

	pub fn value(&self, name: &str) -> Option<&Value> {
		match self.0.get(name) {
			Some(Param::Value(value)) => Some(value),
			_ => None,
		}
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
