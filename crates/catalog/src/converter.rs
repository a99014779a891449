// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	fmt::{Debug, Formatter},
	sync::Arc,
};

use setdml_core::Value;

type ConvertFn = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

/// Pair of conversions between a property value and its stored form.
#[derive(Clone)]
pub struct ValueConverter {
	name: String,
	to_storage: ConvertFn,
	from_storage: ConvertFn,
}

impl ValueConverter {
	pub fn new<T, F>(name: impl Into<String>, to_storage: T, from_storage: F) -> Self
	where
		T: Fn(&Value) -> Value + Send + Sync + 'static,
		F: Fn(&Value) -> Value + Send + Sync + 'static,
	{
		Self {
			name: name.into(),
			to_storage: Arc::new(to_storage),
			from_storage: Arc::new(from_storage),
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	/// Undefined values are never converted.
	pub fn to_storage(&self, value: &Value) -> Value {
		if value.is_undefined() {
			return Value::Undefined;
		}
		(self.to_storage)(value)
	}

	pub fn from_storage(&self, value: &Value) -> Value {
		if value.is_undefined() {
			return Value::Undefined;
		}
		(self.from_storage)(value)
	}
}

impl Debug for ValueConverter {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ValueConverter").field("name", &self.name).finish()
	}
}
