// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! [`Connection`] over an embedded SQLite database.

#![cfg_attr(not(debug_assertions), deny(warnings))]

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{params_from_iter, types::ValueRef};
use setdml_core::{CancellationToken, Error, Result, Row, Value};
use setdml_engine::{Connection, EngineError};
use setdml_sql::BoundStatement;
use tracing::instrument;

fn backend(err: impl std::fmt::Display) -> Error {
	EngineError::Backend {
		message: format!("sqlite: {}", err),
	}
	.into()
}

fn to_sqlite(value: &Value) -> rusqlite::types::Value {
	use rusqlite::types::Value as Sql;
	match value {
		Value::Undefined => Sql::Null,
		Value::Bool(v) => Sql::Integer(i64::from(*v)),
		Value::Int8(v) => Sql::Integer(*v),
		Value::Uint8(v) => match i64::try_from(*v) {
			Ok(v) => Sql::Integer(v),
			Err(_) => Sql::Real(*v as f64),
		},
		Value::Float8(v) => Sql::Real(v.value()),
		Value::Utf8(v) => Sql::Text(v.clone()),
		Value::Blob(v) => Sql::Blob(v.clone()),
	}
}

fn from_sqlite(value: ValueRef<'_>) -> Value {
	match value {
		ValueRef::Null => Value::Undefined,
		ValueRef::Integer(v) => Value::Int8(v),
		ValueRef::Real(v) => Value::float8(v),
		ValueRef::Text(v) => Value::utf8(String::from_utf8_lossy(v)),
		ValueRef::Blob(v) => Value::Blob(v.to_vec()),
	}
}

fn run(conn: &rusqlite::Connection, statement: &BoundStatement) -> Result<u64> {
	let params = params_from_iter(statement.params.iter().map(to_sqlite));
	let affected = conn.execute(&statement.sql, params).map_err(backend)?;
	Ok(affected as u64)
}

/// Shares one SQLite connection; statements of a batch run in a single
/// transaction.
#[derive(Clone)]
pub struct SqliteConnection {
	conn: Arc<Mutex<rusqlite::Connection>>,
}

impl SqliteConnection {
	pub fn new(conn: rusqlite::Connection) -> Self {
		Self {
			conn: Arc::new(Mutex::new(conn)),
		}
	}

	pub fn open_in_memory() -> Result<Self> {
		Ok(Self::new(rusqlite::Connection::open_in_memory().map_err(backend)?))
	}

	/// Runs semicolon separated statements without parameters, e.g. schema
	/// setup.
	pub fn execute_batch(&self, sql: &str) -> Result<()> {
		self.conn.lock().execute_batch(sql).map_err(backend)
	}

	/// Reads every row of `sql`, keyed by result column name.
	pub fn query(&self, sql: &str) -> Result<Vec<Row>> {
		let conn = self.conn.lock();
		let mut statement = conn.prepare(sql).map_err(backend)?;
		let names: Vec<String> = statement.column_names().into_iter().map(str::to_string).collect();
		let mut rows = statement.query([]).map_err(backend)?;

		let mut result = Vec::new();
		while let Some(row) = rows.next().map_err(backend)? {
			let mut values = Row::new();
			for (index, name) in names.iter().enumerate() {
				values.set(name.as_str(), from_sqlite(row.get_ref(index).map_err(backend)?));
			}
			result.push(values);
		}
		Ok(result)
	}
}

#[async_trait]
impl Connection for SqliteConnection {
	fn execute(&self, statement: &BoundStatement) -> Result<u64> {
		run(&self.conn.lock(), statement)
	}

	#[instrument(name = "sqlite::execute_all", level = "debug", skip_all, fields(statements = statements.len()))]
	fn execute_all(&self, statements: &[BoundStatement]) -> Result<u64> {
		let mut conn = self.conn.lock();
		let tx = conn.transaction().map_err(backend)?;
		let mut affected = 0;
		for statement in statements {
			affected += run(&tx, statement)?;
		}
		tx.commit().map_err(backend)?;
		Ok(affected)
	}

	/// Runs the batch on the blocking pool; cancellation between statements
	/// rolls the transaction back.
	async fn execute_all_async(&self, statements: &[BoundStatement], cancel: &CancellationToken) -> Result<u64> {
		let conn = self.conn.clone();
		let statements = statements.to_vec();
		let cancel = cancel.clone();

		tokio::task::spawn_blocking(move || -> Result<u64> {
			let mut conn = conn.lock();
			let tx = conn.transaction().map_err(backend)?;
			let mut affected = 0;
			for statement in &statements {
				cancel.check()?;
				affected += run(&tx, statement)?;
			}
			cancel.check()?;
			tx.commit().map_err(backend)?;
			Ok(affected)
		})
		.await
		.map_err(backend)?
	}
}
