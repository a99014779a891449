// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Persistence collaborators: a SQL connection for emitted statements, or a
//! row store for the in-process strategy.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::stream::{self, BoxStream};
use setdml_core::{CancellationToken, Result, Row, Value};
use setdml_sql::BoundStatement;

/// Executes bound SQL statements and reports affected row counts.
#[async_trait]
pub trait Connection: Send + Sync {
	fn execute(&self, statement: &BoundStatement) -> Result<u64>;

	/// Runs `statements` in order as one unit of work and sums their counts.
	fn execute_all(&self, statements: &[BoundStatement]) -> Result<u64> {
		let mut affected = 0;
		for statement in statements {
			affected += self.execute(statement)?;
		}
		Ok(affected)
	}

	async fn execute_async(&self, statement: &BoundStatement) -> Result<u64> {
		self.execute(statement)
	}

	/// Like [`execute_all`](Self::execute_all), observing `cancel` between
	/// statements.
	async fn execute_all_async(&self, statements: &[BoundStatement], cancel: &CancellationToken) -> Result<u64> {
		let mut affected = 0;
		for statement in statements {
			cancel.check()?;
			affected += self.execute_async(statement).await?;
		}
		Ok(affected)
	}
}

/// Mutations of one table, applied atomically by [`Store::commit`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChangeSet {
	/// Primary key columns rows are addressed by.
	pub key: Vec<String>,
	/// Column the store fills for inserted rows.
	pub identity: Option<String>,
	pub inserts: Vec<Row>,
	/// `(current key, replacement columns)`.
	pub updates: Vec<(Vec<Value>, Row)>,
	pub deletes: Vec<Vec<Value>>,
}

impl ChangeSet {
	pub fn new(key: Vec<String>, identity: Option<String>) -> Self {
		Self {
			key,
			identity,
			..Self::default()
		}
	}

	pub fn is_empty(&self) -> bool {
		self.inserts.is_empty() && self.updates.is_empty() && self.deletes.is_empty()
	}

	pub fn len(&self) -> usize {
		self.inserts.len() + self.updates.len() + self.deletes.len()
	}
}

/// Storage rows keyed by column name.
#[async_trait]
pub trait Store: Send + Sync {
	/// A snapshot of every row of `table`.
	fn scan(&self, table: &str) -> Result<Box<dyn Iterator<Item = Result<Row>> + Send>>;

	fn commit(&self, table: &str, changes: ChangeSet) -> Result<()>;

	fn stream(&self, table: &str) -> BoxStream<'static, Result<Row>> {
		match self.scan(table) {
			Ok(rows) => Box::pin(stream::iter(rows)),
			Err(err) => Box::pin(stream::once(async move { Err(err) })),
		}
	}

	async fn commit_async(&self, table: &str, changes: ChangeSet) -> Result<()> {
		self.commit(table, changes)
	}
}

/// Where an engine sends its work.
#[derive(Clone)]
pub enum Backend {
	Sql(Arc<dyn Connection>),
	InProcess(Arc<dyn Store>),
}

impl Backend {
	pub fn sql(connection: impl Connection + 'static) -> Self {
		Backend::Sql(Arc::new(connection))
	}

	pub fn in_process(store: impl Store + 'static) -> Self {
		Backend::InProcess(Arc::new(store))
	}

	pub fn name(&self) -> &'static str {
		match self {
			Backend::Sql(_) => "sql",
			Backend::InProcess(_) => "in_process",
		}
	}
}
