// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use setdml_catalog::{Catalog, EntityMapping};
use setdml_core::{Params, Row, Value};
use setdml_plan::{Expr, Operation, Query, RowSource, Shape, expand, translate};
use setdml_sql::{CompiledSql, Dialect, PostgreSql, SqlServer, Sqlite, emit};

fn catalog() -> Catalog {
	Catalog::new()
		.with(EntityMapping::builder("Item").table("Items").column("Id").column("Val").key(&["Id"]).build().unwrap())
		.with(EntityMapping::builder("Archive").column("Id").column("Val").key(&["Id"]).build().unwrap())
}

fn compile(query: &Query, operation: &Operation, dialect: &dyn Dialect, params: &Params) -> CompiledSql {
	let plan = translate(query, operation, &catalog()).unwrap();
	let (plan, _) = expand(&plan, params).unwrap();
	emit(&plan, dialect).unwrap()
}

fn rows(values: &[(i64, &str)]) -> Vec<Row> {
	values.iter().map(|(id, val)| Row::new().with("Id", *id).with("Val", *val)).collect()
}

fn keys(ids: &[i64]) -> Vec<Row> {
	ids.iter().map(|id| Row::new().with("Id", *id)).collect()
}

#[test]
fn test_delete_filtered() {
	let query = Query::from_entity("Item").filter(Expr::field("Val").equals("x"));
	let params = Params::new();

	let pg = compile(&query, &Operation::Delete, &PostgreSql, &params);
	assert_eq!(pg.sql(), "DELETE FROM \"Items\" AS \"t\"\nWHERE \"t\".\"Val\" = 'x'");

	let sqlite = compile(&query, &Operation::Delete, &Sqlite, &params);
	assert_eq!(sqlite.sql(), "DELETE FROM \"Items\" AS \"t\"\nWHERE \"t\".\"Val\" = 'x'");

	let mssql = compile(&query, &Operation::Delete, &SqlServer, &params);
	assert_eq!(mssql.sql(), "DELETE [t]\nFROM [Items] AS [t]\nWHERE [t].[Val] = 'x'");
}

#[test]
fn test_delete_joined_to_local_keys() {
	let query = Query::from_entity("Item").join(
		"k",
		RowSource::local("keys", &["Id"]),
		Expr::field("Id").equals(Expr::joined("k", "Id")),
	);
	let params = Params::new().with_rows("keys", keys(&[1, 2]));

	let pg = compile(&query, &Operation::Delete, &PostgreSql, &params);
	assert_eq!(
		pg.sql(),
		"DELETE FROM \"Items\" AS \"t\"\nUSING (VALUES\n    ($1),\n    ($2)\n) AS \"k\" (\"Id\")\nWHERE \"t\".\"Id\" = \"k\".\"Id\""
	);

	let sqlite = compile(&query, &Operation::Delete, &Sqlite, &params);
	assert_eq!(
		sqlite.sql(),
		"DELETE FROM \"Items\" AS \"t\"\nWHERE EXISTS (SELECT 1 FROM (SELECT column1 AS \"Id\" FROM (VALUES (?1), (?2))) AS \"k\" WHERE \"t\".\"Id\" = \"k\".\"Id\")"
	);

	let mssql = compile(&query, &Operation::Delete, &SqlServer, &params);
	assert_eq!(
		mssql.sql(),
		"DELETE [t]\nFROM [Items] AS [t]\nINNER JOIN (VALUES\n    (@p1),\n    (@p2)\n) AS [k] ([Id]) ON [t].[Id] = [k].[Id]"
	);

	let bound = pg.bind(&params).unwrap();
	assert_eq!(bound[0].params, vec![Value::Int8(1), Value::Int8(2)]);
}

#[test]
fn test_update_with_parameter() {
	let query = Query::from_entity("Item").filter(Expr::field("Id").gt(Expr::param("min")));
	let operation = Operation::Update(Shape::new().set("Val", Expr::field("Val").concat("!")));
	let params = Params::new().with_value("min", 5);

	let pg = compile(&query, &operation, &PostgreSql, &params);
	assert_eq!(pg.sql(), "UPDATE \"Items\" AS \"t\"\nSET \"Val\" = \"t\".\"Val\" || '!'\nWHERE \"t\".\"Id\" > $1");

	let mssql = compile(&query, &operation, &SqlServer, &params);
	assert_eq!(mssql.sql(), "UPDATE [t]\nSET [Val] = [t].[Val] + '!'\nFROM [Items] AS [t]\nWHERE [t].[Id] > @p1");

	let bound = mssql.bind(&params).unwrap();
	assert_eq!(bound[0].params, vec![Value::Int8(5)]);
}

#[test]
fn test_insert_into_select() {
	let query = Query::from_entity("Item").filter(Expr::field("Val").is_not_null());
	let operation = Operation::InsertInto {
		target: "Archive".to_string(),
	};

	let pg = compile(&query, &operation, &PostgreSql, &Params::new());
	assert_eq!(
		pg.sql(),
		"INSERT INTO \"Archive\" (\"Id\", \"Val\")\nSELECT \"src\".\"Id\" AS \"Id\", \"src\".\"Val\" AS \"Val\"\nFROM \"Items\" AS \"src\"\nWHERE \"src\".\"Val\" IS NOT NULL"
	);
}

fn upsert(update: bool) -> Operation {
	Operation::Upsert {
		target: "Item".to_string(),
		insert: Shape::identity(&["Id", "Val"]),
		update: update.then(|| Shape::from_inserted(&["Val"])),
	}
}

#[test]
fn test_upsert_values() {
	let query = Query::from_local("rows", &["Id", "Val"]);
	let params = Params::new().with_rows("rows", rows(&[(1, "a"), (2, "b")]));

	let pg = compile(&query, &upsert(true), &PostgreSql, &params);
	assert_eq!(
		pg.sql(),
		"INSERT INTO \"Items\" AS \"t\" (\"Id\", \"Val\")\nVALUES\n    ($1, $2),\n    ($3, $4)\nON CONFLICT ON CONSTRAINT \"PK_Items\" DO UPDATE SET \"Val\" = excluded.\"Val\""
	);

	let sqlite = compile(&query, &upsert(true), &Sqlite, &params);
	assert_eq!(
		sqlite.sql(),
		"INSERT INTO \"Items\" AS \"t\" (\"Id\", \"Val\")\nVALUES\n    (?1, ?2),\n    (?3, ?4)\nON CONFLICT (\"Id\") DO UPDATE SET \"Val\" = excluded.\"Val\""
	);

	let mssql = compile(&query, &upsert(true), &SqlServer, &params);
	assert_eq!(
		mssql.sql(),
		"MERGE INTO [Items] AS [t]\nUSING (VALUES\n    (@p1, @p2),\n    (@p3, @p4)\n) AS [s] ([Id], [Val])\nON [t].[Id] = [s].[Id]\nWHEN MATCHED THEN UPDATE SET [Val] = [s].[Val]\nWHEN NOT MATCHED THEN INSERT ([Id], [Val]) VALUES ([s].[Id], [s].[Val]);"
	);

	let bound = pg.bind(&params).unwrap();
	assert_eq!(bound[0].params, vec![Value::Int8(1), Value::utf8("a"), Value::Int8(2), Value::utf8("b")]);
}

#[test]
fn test_upsert_empty_list_without_update() {
	let query = Query::from_local("rows", &["Id", "Val"]);
	let params = Params::new().with_rows("rows", vec![]);

	let sqlite = compile(&query, &upsert(false), &Sqlite, &params);
	assert_eq!(
		sqlite.sql(),
		"INSERT INTO \"Items\" AS \"t\" (\"Id\", \"Val\")\nSELECT *\nFROM (SELECT NULL AS \"Id\", NULL AS \"Val\" WHERE false) AS \"s\"\nWHERE true\nON CONFLICT (\"Id\") DO NOTHING"
	);
	assert_eq!(sqlite.parameter_count(), 0);

	let pg = compile(&query, &upsert(false), &PostgreSql, &params);
	assert!(pg.sql().ends_with("ON CONFLICT ON CONSTRAINT \"PK_Items\" DO NOTHING"));
}

#[test]
fn test_placeholder_count_follows_list_length() {
	let query = Query::from_local("rows", &["Id", "Val"]);
	for n in [1usize, 3, 7] {
		let list: Vec<Row> = (0..n as i64).map(|i| Row::new().with("Id", i).with("Val", "v")).collect();
		let params = Params::new().with_rows("rows", list);
		let compiled = compile(&query, &upsert(false), &PostgreSql, &params);
		assert_eq!(compiled.parameter_count(), 2 * n);
	}
}

fn merge(delete_unmatched: bool) -> Operation {
	Operation::Merge {
		source: Query::from_local("rows", &["Id", "Val"]),
		insert: Shape::identity(&["Id", "Val"]),
		update: Shape::from_inserted(&["Val"]),
		delete_unmatched,
	}
}

#[test]
fn test_merge_native() {
	let params = Params::new().with_rows("rows", rows(&[(1, "b")]));
	let mssql = compile(&Query::from_entity("Item"), &merge(true), &SqlServer, &params);
	assert_eq!(mssql.statements.len(), 1);
	assert_eq!(
		mssql.sql(),
		"MERGE INTO [Items] AS [t]\nUSING (SELECT [src].[Id] AS [Id], [src].[Val] AS [Val]\nFROM (VALUES\n    (@p1, @p2)\n) AS [src] ([Id], [Val])) AS [s]\nON [t].[Id] = [s].[Id]\nWHEN MATCHED THEN UPDATE SET [Val] = [s].[Val]\nWHEN NOT MATCHED BY TARGET THEN INSERT ([Id], [Val]) VALUES ([s].[Id], [s].[Val])\nWHEN NOT MATCHED BY SOURCE THEN DELETE;"
	);
}

#[test]
fn test_merge_as_statement_sequence() {
	let params = Params::new().with_rows("rows", rows(&[(1, "b")]));
	let pg = compile(&Query::from_entity("Item"), &merge(true), &PostgreSql, &params);
	assert_eq!(pg.statements.len(), 3);

	let source = "(SELECT \"src\".\"Id\" AS \"Id\", \"src\".\"Val\" AS \"Val\"\nFROM (VALUES\n    ($1, $2)\n) AS \"src\" (\"Id\", \"Val\")) AS \"s\"";
	assert_eq!(
		pg.statements[0].sql,
		format!(
			"DELETE FROM \"Items\" AS \"t\"\nWHERE NOT EXISTS (SELECT 1 FROM {} WHERE \"t\".\"Id\" = \"s\".\"Id\")",
			source
		)
	);
	assert_eq!(
		pg.statements[1].sql,
		format!("UPDATE \"Items\" AS \"t\"\nSET \"Val\" = \"s\".\"Val\"\nFROM {}\nWHERE \"t\".\"Id\" = \"s\".\"Id\"", source)
	);
	assert_eq!(
		pg.statements[2].sql,
		format!(
			"INSERT INTO \"Items\" (\"Id\", \"Val\")\nSELECT \"s\".\"Id\", \"s\".\"Val\"\nFROM {}\nWHERE NOT EXISTS (SELECT 1 FROM \"Items\" AS \"t\" WHERE \"t\".\"Id\" = \"s\".\"Id\")",
			source
		)
	);

	// every statement numbers its placeholders from 1
	for statement in &pg.statements {
		assert_eq!(statement.parameters.len(), 2);
	}
}

#[test]
fn test_merge_without_delete_has_no_delete_statement() {
	let params = Params::new().with_rows("rows", rows(&[(1, "b")]));
	let sqlite = compile(&Query::from_entity("Item"), &merge(false), &Sqlite, &params);
	assert_eq!(sqlite.statements.len(), 2);
	assert!(sqlite.statements.iter().all(|s| !s.sql.starts_with("DELETE")));

	let mssql = compile(&Query::from_entity("Item"), &merge(false), &SqlServer, &params);
	assert!(!mssql.sql().contains("NOT MATCHED BY SOURCE"));
}

#[test]
fn test_negated_negative_constant() {
	let query = Query::from_entity("Item").filter(Expr::field("Id").equals(Expr::constant(-5).negated()));

	let sqlite = compile(&query, &Operation::Delete, &Sqlite, &Params::new());
	assert_eq!(sqlite.sql(), "DELETE FROM \"Items\" AS \"t\"\nWHERE \"t\".\"Id\" = -(-5)");

	let mssql = compile(&query, &Operation::Delete, &SqlServer, &Params::new());
	assert_eq!(mssql.sql(), "DELETE [t]\nFROM [Items] AS [t]\nWHERE [t].[Id] = -(-5)");
}

#[test]
fn test_null_test_compared_to_constant_is_parenthesized() {
	let query = Query::from_entity("Item").filter(Expr::field("Val").is_null().equals(false));

	let pg = compile(&query, &Operation::Delete, &PostgreSql, &Params::new());
	assert_eq!(pg.sql(), "DELETE FROM \"Items\" AS \"t\"\nWHERE (\"t\".\"Val\" IS NULL) = FALSE");
}

#[test]
fn test_infinite_constant_is_bound_not_inlined() {
	let query = Query::from_entity("Item");
	let operation = Operation::Update(Shape::new().set("Val", f64::INFINITY));

	let pg = compile(&query, &operation, &PostgreSql, &Params::new());
	assert_eq!(pg.sql(), "UPDATE \"Items\" AS \"t\"\nSET \"Val\" = $1");
	assert!(!pg.sql().contains("inf"));

	let bound = pg.bind(&Params::new()).unwrap();
	assert_eq!(bound[0].params, vec![Value::float8(f64::INFINITY)]);
}
