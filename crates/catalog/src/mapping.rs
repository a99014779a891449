// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::collections::HashMap;

use indexmap::{IndexMap, IndexSet};
use setdml_core::{Result, Row, Value};

use crate::{converter::ValueConverter, error::CatalogError};

/// Storage mapping of one entity type. Immutable once built.
#[derive(Debug, Clone)]
pub struct EntityMapping {
	entity: String,
	table: String,
	schema: Option<String>,
	primary_key: Vec<String>,
	key_constraint: String,
	identity: Option<String>,
	concurrency_token: Option<String>,
	shadow_columns: IndexSet<String>,
	required: IndexSet<String>,
	properties: IndexMap<String, String>,
	converters: HashMap<String, ValueConverter>,
}

impl EntityMapping {
	pub fn builder(entity: impl Into<String>) -> EntityMappingBuilder {
		EntityMappingBuilder::new(entity)
	}

	pub fn entity(&self) -> &str {
		&self.entity
	}

	pub fn table(&self) -> &str {
		&self.table
	}

	pub fn schema(&self) -> Option<&str> {
		self.schema.as_deref()
	}

	/// Primary key column names in declaration order.
	pub fn primary_key(&self) -> &[String] {
		&self.primary_key
	}

	/// Name of the uniqueness constraint backing the primary key.
	pub fn key_constraint(&self) -> &str {
		&self.key_constraint
	}

	pub fn identity(&self) -> Option<&str> {
		self.identity.as_deref()
	}

	pub fn concurrency_token(&self) -> Option<&str> {
		self.concurrency_token.as_deref()
	}

	pub fn shadow_columns(&self) -> impl Iterator<Item = &str> {
		self.shadow_columns.iter().map(String::as_str)
	}

	/// `(property path, column)` pairs in mapping order.
	pub fn properties(&self) -> impl Iterator<Item = (&str, &str)> {
		self.properties.iter().map(|(p, c)| (p.as_str(), c.as_str()))
	}

	/// Column backing a property path. Shadow columns resolve by their own
	/// name.
	pub fn column_of(&self, path: &str) -> Option<&str> {
		if let Some(column) = self.properties.get(path) {
			return Some(column.as_str());
		}
		self.shadow_columns.get(path).map(String::as_str)
	}

	pub fn property_of(&self, column: &str) -> Option<&str> {
		self.properties.iter().find(|(_, c)| c.as_str() == column).map(|(p, _)| p.as_str())
	}

	/// Property paths of the primary key, ordered like [`primary_key`](Self::primary_key).
	pub fn key_properties(&self) -> Vec<&str> {
		self.primary_key.iter().filter_map(|column| self.property_of(column)).collect()
	}

	pub fn is_key_column(&self, column: &str) -> bool {
		self.primary_key.iter().any(|k| k == column)
	}

	/// Identity and concurrency columns are written by the store.
	pub fn is_store_generated(&self, column: &str) -> bool {
		self.identity.as_deref() == Some(column) || self.concurrency_token.as_deref() == Some(column)
	}

	pub fn is_nullable(&self, column: &str) -> bool {
		!self.is_key_column(column) && !self.required.contains(column)
	}

	pub fn converter(&self, column: &str) -> Option<&ValueConverter> {
		self.converters.get(column)
	}

	pub fn to_storage(&self, column: &str, value: &Value) -> Value {
		match self.converters.get(column) {
			Some(converter) => converter.to_storage(value),
			None => value.clone(),
		}
	}

	pub fn from_storage(&self, column: &str, value: &Value) -> Value {
		match self.converters.get(column) {
			Some(converter) => converter.from_storage(value),
			None => value.clone(),
		}
	}

	/// Storage row (keyed by column) to logical row (keyed by property path).
	pub fn materialize(&self, storage: &Row) -> Row {
		let mut row = Row::new();
		for (path, column) in &self.properties {
			row.set(path.as_str(), self.from_storage(column, storage.value(column)));
		}
		for column in &self.shadow_columns {
			if let Some(value) = storage.get(column) {
				row.set(column.as_str(), value.clone());
			}
		}
		row
	}

	/// Logical row to storage row. Properties absent from `row` are left out.
	pub fn dematerialize(&self, row: &Row) -> Row {
		let mut storage = Row::new();
		for (path, column) in &self.properties {
			if let Some(value) = row.get(path) {
				storage.set(column.as_str(), self.to_storage(column, value));
			}
		}
		for column in &self.shadow_columns {
			if let Some(value) = row.get(column) {
				storage.set(column.as_str(), value.clone());
			}
		}
		storage
	}
}

pub struct EntityMappingBuilder {
	entity: String,
	table: Option<String>,
	schema: Option<String>,
	primary_key: Vec<String>,
	key_constraint: Option<String>,
	identity: Option<String>,
	concurrency_token: Option<String>,
	shadow_columns: IndexSet<String>,
	required: IndexSet<String>,
	properties: IndexMap<String, String>,
	duplicates: Vec<String>,
	converters: HashMap<String, ValueConverter>,
}

impl EntityMappingBuilder {
	pub fn new(entity: impl Into<String>) -> Self {
		Self {
			entity: entity.into(),
			table: None,
			schema: None,
			primary_key: Vec::new(),
			key_constraint: None,
			identity: None,
			concurrency_token: None,
			shadow_columns: IndexSet::new(),
			required: IndexSet::new(),
			properties: IndexMap::new(),
			duplicates: Vec::new(),
			converters: HashMap::new(),
		}
	}

	/// Defaults to the entity name.
	pub fn table(mut self, table: impl Into<String>) -> Self {
		self.table = Some(table.into());
		self
	}

	pub fn schema(mut self, schema: impl Into<String>) -> Self {
		self.schema = Some(schema.into());
		self
	}

	pub fn property(mut self, path: impl Into<String>, column: impl Into<String>) -> Self {
		let path = path.into();
		if self.properties.insert(path.clone(), column.into()).is_some() {
			self.duplicates.push(path);
		}
		self
	}

	/// A property stored in a column of the same name.
	pub fn column(self, name: impl Into<String>) -> Self {
		let name = name.into();
		self.property(name.clone(), name)
	}

	/// Flattens an owned sub-entity: `Address.City` is stored in `Address_City`.
	pub fn owned(mut self, prefix: &str, properties: &[&str]) -> Self {
		for property in properties {
			self = self.property(format!("{}.{}", prefix, property), format!("{}_{}", prefix, property));
		}
		self
	}

	pub fn key(mut self, columns: &[&str]) -> Self {
		self.primary_key = columns.iter().map(|c| c.to_string()).collect();
		self
	}

	/// Defaults to `PK_<table>`.
	pub fn key_constraint(mut self, name: impl Into<String>) -> Self {
		self.key_constraint = Some(name.into());
		self
	}

	pub fn identity(mut self, column: impl Into<String>) -> Self {
		self.identity = Some(column.into());
		self
	}

	pub fn concurrency_token(mut self, column: impl Into<String>) -> Self {
		self.concurrency_token = Some(column.into());
		self
	}

	/// A storage-only column with no entity property.
	pub fn shadow(mut self, column: impl Into<String>) -> Self {
		self.shadow_columns.insert(column.into());
		self
	}

	pub fn required(mut self, column: impl Into<String>) -> Self {
		self.required.insert(column.into());
		self
	}

	pub fn converter(mut self, column: impl Into<String>, converter: ValueConverter) -> Self {
		self.converters.insert(column.into(), converter);
		self
	}

	pub fn build(self) -> Result<EntityMapping> {
		if let Some(property) = self.duplicates.into_iter().next() {
			return Err(CatalogError::DuplicateProperty {
				entity: self.entity,
				property,
			}
			.into());
		}

		if self.primary_key.is_empty() {
			return Err(CatalogError::MissingPrimaryKey {
				entity: self.entity,
			}
			.into());
		}

		for column in &self.primary_key {
			if !self.properties.values().any(|c| c == column) {
				return Err(CatalogError::KeyColumnNotMapped {
					entity: self.entity.clone(),
					column: column.clone(),
				}
				.into());
			}
		}

		let table = self.table.unwrap_or_else(|| self.entity.clone());
		let key_constraint = self.key_constraint.unwrap_or_else(|| format!("PK_{}", table));

		Ok(EntityMapping {
			entity: self.entity,
			table,
			schema: self.schema,
			primary_key: self.primary_key,
			key_constraint,
			identity: self.identity,
			concurrency_token: self.concurrency_token,
			shadow_columns: self.shadow_columns,
			required: self.required,
			properties: self.properties,
			converters: self.converters,
		})
	}
}
