// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! In-memory row store.

use std::{
	collections::{HashMap, HashSet},
	sync::Arc,
};

use async_trait::async_trait;
use parking_lot::RwLock;
use setdml_core::{Result, Row, Value};
use tracing::instrument;

use crate::{
	backend::{ChangeSet, Store},
	error::EngineError,
};

/// Tables of storage rows. Commits copy the table, apply the change set and
/// swap the copy in, so a failed commit leaves the table untouched.
#[derive(Clone, Default)]
pub struct MemoryStore {
	tables: Arc<RwLock<HashMap<String, Vec<Row>>>>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn create_table(&self, table: impl Into<String>) {
		self.tables.write().entry(table.into()).or_default();
	}

	/// Appends rows as they are, without key checks.
	pub fn seed(&self, table: impl Into<String>, rows: impl IntoIterator<Item = Row>) {
		self.tables.write().entry(table.into()).or_default().extend(rows);
	}

	pub fn rows(&self, table: &str) -> Vec<Row> {
		self.tables.read().get(table).cloned().unwrap_or_default()
	}
}

fn key_of(row: &Row, key: &[String]) -> Vec<Value> {
	key.iter().map(|column| row.value(column).clone()).collect()
}

fn next_identity(rows: &[Row], column: &str) -> i64 {
	rows.iter().filter_map(|row| row.value(column).as_i64()).max().unwrap_or(0) + 1
}

#[async_trait]
impl Store for MemoryStore {
	fn scan(&self, table: &str) -> Result<Box<dyn Iterator<Item = Result<Row>> + Send>> {
		let tables = self.tables.read();
		let Some(rows) = tables.get(table) else {
			return Err(EngineError::UnknownTable {
				table: table.to_string(),
			}
			.into());
		};
		Ok(Box::new(rows.clone().into_iter().map(Ok)))
	}

	#[instrument(name = "engine::memory::commit", level = "debug", skip(self, changes), fields(changes = changes.len()))]
	fn commit(&self, table: &str, changes: ChangeSet) -> Result<()> {
		let mut tables = self.tables.write();
		let Some(current) = tables.get(table) else {
			return Err(EngineError::UnknownTable {
				table: table.to_string(),
			}
			.into());
		};
		let mut rows = current.clone();

		let deleted: HashSet<Vec<Value>> = changes.deletes.into_iter().collect();
		rows.retain(|row| !deleted.contains(&key_of(row, &changes.key)));

		for (key, replacement) in changes.updates {
			let Some(row) = rows.iter_mut().find(|row| key_of(row, &changes.key) == key) else {
				return Err(EngineError::MissingRow {
					table: table.to_string(),
					key,
				}
				.into());
			};
			for (column, value) in replacement.iter() {
				row.set(column, value.clone());
			}
		}

		for mut row in changes.inserts {
			if let Some(identity) = &changes.identity {
				if row.value(identity).is_undefined() {
					let next = next_identity(&rows, identity);
					row.set(identity.as_str(), Value::Int8(next));
				}
			}
			rows.push(row);
		}

		let mut seen = HashSet::with_capacity(rows.len());
		for row in &rows {
			let key = key_of(row, &changes.key);
			if !seen.insert(key.clone()) {
				return Err(EngineError::DuplicateKey {
					table: table.to_string(),
					key,
				}
				.into());
			}
		}

		tables.insert(table.to_string(), rows);
		Ok(())
	}
}
