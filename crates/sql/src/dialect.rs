// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Per-database differences in quoting, parameters and DML syntax.

use serde::{Deserialize, Serialize};

/// How a DELETE reaches its joined sources.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeleteJoin {
	/// `DELETE FROM t USING j WHERE ..`
	Using,
	/// `DELETE FROM t WHERE EXISTS (SELECT 1 FROM j WHERE ..)`
	Exists,
	/// `DELETE t FROM t INNER JOIN j ON ..`
	InnerJoin,
}

/// How an UPDATE reaches its joined sources.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateJoin {
	/// `UPDATE t SET .. FROM j WHERE ..`
	From,
	/// `UPDATE t SET .. FROM table AS t INNER JOIN j ON ..`; needs the
	/// expanded target.
	InnerJoin,
}

/// How an insert resolves a key conflict.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConflictStyle {
	/// `ON CONFLICT ON CONSTRAINT "PK_T"`
	Constraint,
	/// `ON CONFLICT ("Id")`
	Columns,
	/// A `MERGE` statement instead of an insert.
	Merge,
}

pub trait Dialect: Send + Sync {
	fn name(&self) -> &'static str;

	fn quote(&self, identifier: &str) -> String {
		format!("\"{}\"", identifier.replace('"', "\"\""))
	}

	/// Placeholder of the 1-based parameter `index`.
	fn placeholder(&self, index: usize) -> String;

	fn bool_literal(&self, value: bool) -> &'static str {
		if value { "TRUE" } else { "FALSE" }
	}

	/// A predicate known to be true or false.
	fn truth(&self, value: bool) -> &'static str {
		self.bool_literal(value)
	}

	fn blob_literal(&self, bytes: &[u8]) -> String {
		format!("X'{}'", hex(bytes))
	}

	fn concat_operator(&self) -> &'static str {
		"||"
	}

	/// The value a conflicting insert proposed for `column`.
	fn excluded(&self, column: &str) -> String {
		format!("excluded.{}", self.quote(column))
	}

	fn supports_merge(&self) -> bool {
		false
	}

	/// Whether `(VALUES ..) AS v (a, b)` names its columns.
	fn values_column_aliases(&self) -> bool {
		true
	}

	fn delete_join(&self) -> DeleteJoin;

	fn update_join(&self) -> UpdateJoin {
		UpdateJoin::From
	}

	fn conflict_style(&self) -> ConflictStyle;

	/// `INSERT .. SELECT` followed by `ON CONFLICT` needs a `WHERE` clause
	/// to parse.
	fn select_needs_where_before_conflict(&self) -> bool {
		false
	}
}

pub(crate) fn hex(bytes: &[u8]) -> String {
	bytes.iter().map(|b| format!("{:02X}", b)).collect()
}

#[derive(Clone, Copy, Debug, Default)]
pub struct PostgreSql;

impl Dialect for PostgreSql {
	fn name(&self) -> &'static str {
		"postgresql"
	}

	fn placeholder(&self, index: usize) -> String {
		format!("${}", index)
	}

	fn blob_literal(&self, bytes: &[u8]) -> String {
		format!("'\\x{}'::bytea", hex(bytes))
	}

	fn delete_join(&self) -> DeleteJoin {
		DeleteJoin::Using
	}

	fn conflict_style(&self) -> ConflictStyle {
		ConflictStyle::Constraint
	}
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Sqlite;

impl Dialect for Sqlite {
	fn name(&self) -> &'static str {
		"sqlite"
	}

	fn placeholder(&self, index: usize) -> String {
		format!("?{}", index)
	}

	fn bool_literal(&self, value: bool) -> &'static str {
		if value { "1" } else { "0" }
	}

	fn truth(&self, value: bool) -> &'static str {
		if value { "true" } else { "false" }
	}

	fn values_column_aliases(&self) -> bool {
		false
	}

	fn delete_join(&self) -> DeleteJoin {
		DeleteJoin::Exists
	}

	fn conflict_style(&self) -> ConflictStyle {
		ConflictStyle::Columns
	}

	fn select_needs_where_before_conflict(&self) -> bool {
		true
	}
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SqlServer;

impl Dialect for SqlServer {
	fn name(&self) -> &'static str {
		"sqlserver"
	}

	fn quote(&self, identifier: &str) -> String {
		format!("[{}]", identifier.replace(']', "]]"))
	}

	fn placeholder(&self, index: usize) -> String {
		format!("@p{}", index)
	}

	fn bool_literal(&self, value: bool) -> &'static str {
		if value { "1" } else { "0" }
	}

	fn truth(&self, value: bool) -> &'static str {
		if value { "1 = 1" } else { "1 = 0" }
	}

	fn blob_literal(&self, bytes: &[u8]) -> String {
		format!("0x{}", hex(bytes))
	}

	fn concat_operator(&self) -> &'static str {
		"+"
	}

	fn excluded(&self, column: &str) -> String {
		format!("{}.{}", self.quote(setdml_plan::SOURCE_ALIAS), self.quote(column))
	}

	fn supports_merge(&self) -> bool {
		true
	}

	fn delete_join(&self) -> DeleteJoin {
		DeleteJoin::InnerJoin
	}

	fn update_join(&self) -> UpdateJoin {
		UpdateJoin::InnerJoin
	}

	fn conflict_style(&self) -> ConflictStyle {
		ConflictStyle::Merge
	}
}

static POSTGRESQL: PostgreSql = PostgreSql;
static SQLITE: Sqlite = Sqlite;
static SQLSERVER: SqlServer = SqlServer;

/// Dialect selection as it appears in configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectKind {
	#[default]
	PostgreSql,
	Sqlite,
	SqlServer,
}

impl DialectKind {
	pub fn dialect(&self) -> &'static dyn Dialect {
		match self {
			DialectKind::PostgreSql => &POSTGRESQL,
			DialectKind::Sqlite => &SQLITE,
			DialectKind::SqlServer => &SQLSERVER,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_quote_escapes() {
		assert_eq!(PostgreSql.quote("a\"b"), "\"a\"\"b\"");
		assert_eq!(SqlServer.quote("a]b"), "[a]]b]");
	}

	#[test]
	fn test_placeholders() {
		assert_eq!(PostgreSql.placeholder(3), "$3");
		assert_eq!(Sqlite.placeholder(3), "?3");
		assert_eq!(SqlServer.placeholder(3), "@p3");
	}

	#[test]
	fn test_excluded() {
		assert_eq!(PostgreSql.excluded("Val"), "excluded.\"Val\"");
		assert_eq!(SqlServer.excluded("Val"), "[s].[Val]");
	}

	#[test]
	fn test_kind_from_config() {
		let kind: DialectKind = serde_json::from_str("\"sqlserver\"").unwrap();
		assert_eq!(kind, DialectKind::SqlServer);
		assert_eq!(kind.dialect().name(), "sqlserver");
		assert_eq!(DialectKind::default().dialect().name(), "postgresql");
	}

	#[test]
	fn test_blob_literals() {
		assert_eq!(PostgreSql.blob_literal(&[0xde, 0xad]), "'\\xDEAD'::bytea");
		assert_eq!(Sqlite.blob_literal(&[0xde, 0xad]), "X'DEAD'");
		assert_eq!(SqlServer.blob_literal(&[0xde, 0xad]), "0xDEAD");
	}
}
