// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use setdml_catalog::{Catalog, EntityMapping, ValueConverter};
use setdml_core::{CancellationToken, ErrorKind, Row, Value};
use setdml_engine::{Engine, MemoryStore};
use setdml_plan::{Expr, Query, RowSource, Shape};

fn upper() -> ValueConverter {
	ValueConverter::new(
		"upper",
		|v| match v {
			Value::Utf8(s) => Value::Utf8(s.to_uppercase()),
			other => other.clone(),
		},
		|v| match v {
			Value::Utf8(s) => Value::Utf8(s.to_lowercase()),
			other => other.clone(),
		},
	)
}

fn catalog() -> Catalog {
	Catalog::new()
		.with(EntityMapping::builder("Item").table("Items").column("Id").column("Val").key(&["Id"]).build().unwrap())
		.with(EntityMapping::builder("Archive").column("Id").column("Val").key(&["Id"]).build().unwrap())
		.with(
			EntityMapping::builder("Order")
				.table("Orders")
				.property("Number", "OrderNo")
				.property("Status", "Status")
				.column("Seq")
				.identity("Seq")
				.key(&["OrderNo"])
				.converter("Status", upper())
				.build()
				.unwrap(),
		)
}

fn item(id: i64, val: &str) -> Row {
	Row::new().with("Id", id).with("Val", val)
}

fn setup(items: Vec<Row>) -> (Engine, MemoryStore) {
	let store = MemoryStore::new();
	store.seed("Items", items);
	store.create_table("Archive");
	store.create_table("Orders");
	let engine = Engine::builder().metadata(catalog()).store(store.clone()).build().unwrap();
	(engine, store)
}

fn sorted(mut rows: Vec<Row>) -> Vec<Row> {
	rows.sort_by_key(|row| row.value("Id").as_i64());
	rows
}

fn items() -> Query {
	Query::from_entity("Item")
}

fn source() -> Query {
	Query::from_local("src", &["Id", "Val"])
}

#[test]
fn test_delete_by_predicate() {
	let (engine, store) = setup(vec![item(1, "x"), item(2, "y")]);

	let affected = engine.batch(items().filter(Expr::field("Val").equals("x"))).delete().unwrap();

	assert_eq!(affected, 1);
	assert_eq!(store.rows("Items"), vec![item(2, "y")]);
}

#[test]
fn test_delete_by_negated_negative_constant() {
	let (engine, store) = setup(vec![item(5, "a"), item(6, "b")]);

	let affected = engine.batch(items().filter(Expr::field("Id").equals(Expr::constant(-5).negated()))).delete().unwrap();

	assert_eq!(affected, 1);
	assert_eq!(store.rows("Items"), vec![item(6, "b")]);
}

#[test]
fn test_delete_joined_to_local_keys_counts_rows_once() {
	let (engine, store) = setup(vec![item(1, "a"), item(2, "b"), item(3, "c")]);
	let query = items().join("k", RowSource::local("keys", &["Id"]), Expr::field("Id").equals(Expr::joined("k", "Id")));

	let keys = vec![Row::new().with("Id", 1), Row::new().with("Id", 1), Row::new().with("Id", 3)];
	let affected = engine.batch(query).rows("keys", keys).delete().unwrap();

	assert_eq!(affected, 2);
	assert_eq!(store.rows("Items"), vec![item(2, "b")]);
}

#[test]
fn test_update_with_parameter() {
	let (engine, store) = setup(vec![item(1, "a"), item(2, "b"), item(3, "c")]);

	let affected = engine
		.batch(items().filter(Expr::field("Id").gt_eq(Expr::param("min"))))
		.param("min", 2)
		.update(Shape::new().set("Val", Expr::field("Val").concat("!")))
		.unwrap();

	assert_eq!(affected, 2);
	assert_eq!(store.rows("Items"), vec![item(1, "a"), item(2, "b!"), item(3, "c!")]);
}

#[test]
fn test_update_from_joined_rows() {
	let (engine, store) = setup(vec![item(1, "a"), item(2, "b")]);
	let query = items().join(
		"n",
		RowSource::local("src", &["Id", "Val"]),
		Expr::field("Id").equals(Expr::joined("n", "Id")),
	);

	let affected = engine
		.batch(query)
		.rows("src", vec![item(2, "new")])
		.update(Shape::new().set("Val", Expr::joined("n", "Val")))
		.unwrap();

	assert_eq!(affected, 1);
	assert_eq!(store.rows("Items"), vec![item(1, "a"), item(2, "new")]);
}

#[test]
fn test_insert_into_default_projection() {
	let (engine, store) = setup(vec![item(1, "a"), item(2, "b")]);

	let affected = engine.batch(items().filter(Expr::field("Id").gt(1))).insert_into("Archive").unwrap();

	assert_eq!(affected, 1);
	assert_eq!(store.rows("Archive"), vec![item(2, "b")]);
	assert_eq!(store.rows("Items").len(), 2);
}

#[test]
fn test_insert_into_converts_and_generates_identity() {
	let (engine, store) = setup(vec![]);
	let query = Query::from_local("orders", &["No"]).select([
		("Number", Expr::field("No")),
		("Status", Expr::constant("open")),
	]);

	let orders = vec![Row::new().with("No", 10), Row::new().with("No", 11)];
	let affected = engine.batch(query).rows("orders", orders).insert_into("Order").unwrap();

	assert_eq!(affected, 2);
	let rows = store.rows("Orders");
	assert_eq!(rows[0].value("Status"), &Value::utf8("OPEN"));
	assert_eq!(rows[0].value("Seq"), &Value::Int8(1));
	assert_eq!(rows[1].value("Seq"), &Value::Int8(2));
}

#[test]
fn test_upsert_updates_existing_row() {
	let (engine, store) = setup(vec![item(1, "a")]);

	let affected = engine
		.batch(source())
		.rows("src", vec![item(1, "z")])
		.upsert("Item", Shape::identity(&["Id", "Val"]), Some(Shape::from_inserted(&["Val"])))
		.unwrap();

	assert_eq!(affected, 1);
	assert_eq!(store.rows("Items"), vec![item(1, "z")]);
}

#[test]
fn test_upsert_into_empty_target_inserts() {
	let (engine, store) = setup(vec![]);

	let affected = engine
		.batch(source())
		.rows("src", vec![item(1, "z")])
		.upsert("Item", Shape::identity(&["Id", "Val"]), Some(Shape::from_inserted(&["Val"])))
		.unwrap();

	assert_eq!(affected, 1);
	assert_eq!(store.rows("Items"), vec![item(1, "z")]);
}

#[test]
fn test_upsert_without_update_does_nothing_on_match() {
	let (engine, store) = setup(vec![item(1, "a")]);

	let affected = engine
		.batch(source())
		.rows("src", vec![item(1, "z"), item(2, "b")])
		.upsert("Item", Shape::identity(&["Id", "Val"]), None)
		.unwrap();

	assert_eq!(affected, 1);
	assert_eq!(sorted(store.rows("Items")), vec![item(1, "a"), item(2, "b")]);
}

#[test]
fn test_upsert_repeated_key_sees_earlier_rows() {
	let (engine, store) = setup(vec![]);

	let affected = engine
		.batch(source())
		.rows("src", vec![item(5, "first"), item(5, "second")])
		.upsert(
			"Item",
			Shape::identity(&["Id", "Val"]),
			Some(Shape::new().set("Val", Expr::existing("Val").concat("+").concat(Expr::inserted("Val")))),
		)
		.unwrap();

	assert_eq!(affected, 2);
	assert_eq!(store.rows("Items"), vec![item(5, "first+second")]);
}

#[test]
fn test_merge_updates_inserts_and_keeps_matched() {
	let (engine, store) = setup(vec![item(1, "a")]);

	let affected = engine
		.batch(items())
		.rows("src", vec![item(1, "b"), item(2, "c")])
		.merge(source(), Shape::identity(&["Id", "Val"]), Shape::from_inserted(&["Val"]), true)
		.unwrap();

	assert_eq!(affected, 2);
	assert_eq!(sorted(store.rows("Items")), vec![item(1, "b"), item(2, "c")]);
}

#[test]
fn test_merge_deletes_unmatched_when_enabled() {
	let (engine, store) = setup(vec![item(1, "a"), item(3, "x")]);

	let affected = engine
		.batch(items())
		.rows("src", vec![item(1, "b"), item(2, "c")])
		.merge(source(), Shape::identity(&["Id", "Val"]), Shape::from_inserted(&["Val"]), true)
		.unwrap();

	assert_eq!(affected, 3);
	assert_eq!(sorted(store.rows("Items")), vec![item(1, "b"), item(2, "c")]);
}

#[test]
fn test_merge_without_delete_never_removes() {
	let targets: Vec<Row> = (1..=50).map(|id| item(id, "old")).collect();
	let (engine, store) = setup(targets);

	let affected = engine
		.batch(items())
		.rows("src", vec![item(7, "new")])
		.merge(source(), Shape::identity(&["Id", "Val"]), Shape::from_inserted(&["Val"]), false)
		.unwrap();

	assert_eq!(affected, 1);
	let rows = store.rows("Items");
	assert_eq!(rows.len(), 50);
	assert_eq!(rows[6], item(7, "new"));
}

#[test]
fn test_merge_skips_source_rows_outside_the_filter() {
	let (engine, store) = setup(vec![item(1, "a"), item(2, "b")]);

	let affected = engine
		.batch(items().filter(Expr::field("Id").equals(1)))
		.rows("src", vec![item(2, "z")])
		.merge(source(), Shape::identity(&["Id", "Val"]), Shape::from_inserted(&["Val"]), true)
		.unwrap();

	// row 1 is inside the filter and unmatched; row 2 exists outside it
	assert_eq!(affected, 1);
	assert_eq!(store.rows("Items"), vec![item(2, "b")]);
}

#[test]
fn test_merge_rejects_duplicate_source_keys() {
	let (engine, store) = setup(vec![item(1, "a")]);

	let err = engine
		.batch(items())
		.rows("src", vec![item(1, "b"), item(1, "c")])
		.merge(source(), Shape::identity(&["Id", "Val"]), Shape::from_inserted(&["Val"]), false)
		.unwrap_err();

	assert_eq!(err.code, "EXECUTE_002");
	assert_eq!(err.kind(), ErrorKind::Execution);
	assert_eq!(store.rows("Items"), vec![item(1, "a")]);
}

#[test]
fn test_translation_errors_surface_before_reading() {
	let (engine, _) = setup(vec![item(1, "a")]);

	let err = engine.batch(items()).update(Shape::new().set("Missing", 1)).unwrap_err();
	assert_eq!(err.kind(), ErrorKind::Translation);
}

#[test]
fn test_scalar_bound_to_row_list_is_corrupted() {
	let (engine, _) = setup(vec![]);

	let err = engine
		.batch(source())
		.param("src", 1)
		.upsert("Item", Shape::identity(&["Id", "Val"]), None)
		.unwrap_err();
	assert_eq!(err.kind(), ErrorKind::ParameterBinding);
	assert_eq!(err.message, "Parameter value corrupted");
}

#[test]
fn test_commit_failure_leaves_store_untouched() {
	let (engine, store) = setup(vec![item(1, "a"), item(2, "b")]);

	let err = engine.batch(items().filter(Expr::field("Id").equals(2))).update(Shape::new().set("Id", 1)).unwrap_err();

	assert_eq!(err.code, "EXECUTE_001");
	assert_eq!(store.rows("Items"), vec![item(1, "a"), item(2, "b")]);
}

#[tokio::test]
async fn test_async_merge() {
	let (engine, store) = setup(vec![item(1, "a")]);
	let cancel = CancellationToken::new();

	let affected = engine
		.batch(items())
		.rows("src", vec![item(1, "b"), item(2, "c")])
		.merge_async(source(), Shape::identity(&["Id", "Val"]), Shape::from_inserted(&["Val"]), true, &cancel)
		.await
		.unwrap();

	assert_eq!(affected, 2);
	assert_eq!(sorted(store.rows("Items")), vec![item(1, "b"), item(2, "c")]);
}

#[tokio::test]
async fn test_cancelled_operation_does_not_commit() {
	let (engine, store) = setup(vec![item(1, "x")]);
	let cancel = CancellationToken::new();
	cancel.cancel();

	let err = engine.batch(items()).delete_async(&cancel).await.unwrap_err();

	assert_eq!(err.kind(), ErrorKind::Cancelled);
	assert_eq!(store.rows("Items"), vec![item(1, "x")]);
}

#[tokio::test]
async fn test_shutdown_cancels_async_operations() {
	let (engine, store) = setup(vec![item(1, "x")]);
	engine.shutdown();

	let err = engine.batch(items()).delete_async(&CancellationToken::new()).await.unwrap_err();

	assert_eq!(err.kind(), ErrorKind::Cancelled);
	assert_eq!(store.rows("Items").len(), 1);
}
