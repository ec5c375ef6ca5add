//! Integration tests for the query engine.

use std::collections::BTreeMap;
use std::rc::Rc;
use tabula_core::schema::{Column, TableBuilder};
use tabula_core::{CompareOp, DataType, Error, Row, Value};
use tabula_query::{Expr, Operand, Predicate, Query, SortOrder, Target};
use tabula_storage::{Store, StoreConfig};

fn insert(store: &mut Store, table: &str, fields: &[(&str, Value)]) {
    let row = store.table(table).unwrap().record(fields).unwrap();
    store.add(table, row).unwrap();
}

fn ids(rows: &[Rc<Row>]) -> Vec<i64> {
    rows.iter().filter_map(|r| r.get(0).and_then(Value::as_i64)).collect()
}

fn items_store(config: StoreConfig) -> Store {
    let mut store = Store::with_config(config);
    let items = TableBuilder::new("items")
        .unwrap()
        .add_column("id", DataType::Integer)
        .unwrap()
        .add_column("name", DataType::String)
        .unwrap()
        .column(Column::new("active", DataType::Boolean).default_value(true))
        .unwrap()
        .column(Column::new("score", DataType::Integer).nullable(true))
        .unwrap()
        .primary_key("id")
        .unwrap()
        .add_index("active")
        .unwrap()
        .add_index("score")
        .unwrap()
        .build()
        .unwrap();
    store.create_table(items).unwrap();
    store
}

/// ids 1..=4: foo(10), bar(20, inactive), baz(null), qux(30).
fn loaded(config: StoreConfig) -> Store {
    let mut store = items_store(config);
    insert(&mut store, "items", &[("name", "foo".into()), ("score", 10.into())]);
    insert(
        &mut store,
        "items",
        &[("name", "bar".into()), ("score", 20.into()), ("active", false.into())],
    );
    insert(&mut store, "items", &[("name", "baz".into())]);
    insert(&mut store, "items", &[("name", "qux".into()), ("score", 30.into())]);
    store.commit().unwrap();
    store
}

fn products_store() -> Store {
    let mut store = Store::new();
    let products = TableBuilder::new("products")
        .unwrap()
        .add_column("id", DataType::Integer)
        .unwrap()
        .add_column("category", DataType::String)
        .unwrap()
        .add_column("vendor_id", DataType::Integer)
        .unwrap()
        .primary_key("id")
        .unwrap()
        .build()
        .unwrap();
    store.create_table(products).unwrap();
    for (category, vendor) in [("A", 10), ("B", 10), ("B", 20)] {
        insert(
            &mut store,
            "products",
            &[("category", category.into()), ("vendor_id", vendor.into())],
        );
    }
    store.commit().unwrap();
    store
}

#[test]
fn test_like_then_delete_and_reinsert() {
    let mut store = items_store(StoreConfig::default());
    insert(&mut store, "items", &[("name", "foo".into())]);
    insert(&mut store, "items", &[("name", "bar".into())]);
    store.commit().unwrap();

    let found = Query::table("items")
        .filter(Predicate::like("name", "fo%"))
        .fetch(&store)
        .unwrap();
    assert_eq!(ids(&found), vec![1]);

    let deleted = Query::table("items")
        .filter(Predicate::eq("id", 1))
        .delete(&mut store)
        .unwrap();
    assert_eq!(deleted, 1);
    store.commit().unwrap();

    insert(&mut store, "items", &[("name", "baz".into())]);
    let outcome = store.commit().unwrap();
    assert_eq!(
        outcome.returning("items", &["id"]).unwrap(),
        vec![vec![Value::Integer(3)]]
    );
}

#[test]
fn test_indexed_boolean() {
    let store = loaded(StoreConfig::default());
    let active = Query::table("items")
        .filter(Predicate::eq("active", true))
        .fetch(&store)
        .unwrap();
    assert_eq!(ids(&active), vec![1, 3, 4]);
    assert_eq!(
        Query::table("items")
            .filter(Predicate::eq("active", false))
            .count(&store)
            .unwrap(),
        1
    );
}

#[test]
fn test_between_and_not_between() {
    let store = loaded(StoreConfig::default());
    let inside = Query::table("items")
        .filter(Predicate::between("id", 2, 4))
        .fetch(&store)
        .unwrap();
    assert_eq!(ids(&inside), vec![2, 3, 4]);

    let outside = Query::table("items")
        .filter(Predicate::not_between("id", 1, 3))
        .fetch(&store)
        .unwrap();
    assert_eq!(ids(&outside), vec![4]);
}

#[test]
fn test_null_semantics() {
    let store = loaded(StoreConfig::default());
    let fetch = |p: Predicate| ids(&Query::table("items").filter(p).fetch(&store).unwrap());

    assert_eq!(fetch(Predicate::is_null("score")), vec![3]);
    assert_eq!(fetch(Predicate::eq("score", Value::Null)), vec![3]);
    assert_eq!(fetch(Predicate::is_not_null("score")), vec![1, 2, 4]);
    assert_eq!(fetch(Predicate::lt("score", 25)), vec![1, 2]);
    assert_eq!(fetch(Predicate::between("score", 0, 100)), vec![1, 2, 4]);
    assert_eq!(fetch(Predicate::not_between("score", 15, 25)), vec![1, 3, 4]);
    assert_eq!(fetch(Predicate::ne("score", 10)), vec![2, 3, 4]);
}

#[test]
fn test_or_deduplicates_in_first_seen_order() {
    let store = loaded(StoreConfig::default());
    let rows = Query::table("items")
        .filter(Predicate::or(vec![
            Predicate::eq("name", "qux"),
            Predicate::ge("score", 20),
            Predicate::like("name", "ba_"),
        ]))
        .fetch(&store)
        .unwrap();
    assert_eq!(ids(&rows), vec![4, 2, 3]);
}

#[test]
fn test_not_and_in_lists() {
    let store = loaded(StoreConfig::default());
    let rows = Query::table("items")
        .filter(Predicate::not(Predicate::in_list(
            "name",
            vec!["foo".into(), "qux".into()],
        )))
        .fetch(&store)
        .unwrap();
    assert_eq!(ids(&rows), vec![2, 3]);

    let rows = Query::table("items")
        .filter(Predicate::not_in_list("score", vec![10.into(), 30.into()]))
        .fetch(&store)
        .unwrap();
    assert_eq!(ids(&rows), vec![2, 3]);
}

#[test]
fn test_filters_combine() {
    let store = loaded(StoreConfig::default());
    let rows = Query::table("items")
        .filter(Predicate::eq("active", true))
        .filter(Predicate::gt("score", 5))
        .filter(Predicate::not_like("name", "f%"))
        .fetch(&store)
        .unwrap();
    assert_eq!(ids(&rows), vec![4]);
}

#[test]
fn test_order_limit_offset() {
    let store = loaded(StoreConfig::default());
    let rows = Query::table("items")
        .order_by("active", SortOrder::Desc)
        .order_by("score", SortOrder::Desc)
        .fetch(&store)
        .unwrap();
    assert_eq!(ids(&rows), vec![4, 1, 3, 2]);

    let rows = Query::table("items")
        .order_by("id", SortOrder::Desc)
        .offset(1)
        .limit(2)
        .fetch(&store)
        .unwrap();
    assert_eq!(ids(&rows), vec![3, 2]);

    let first = Query::table("items")
        .order_by("name", SortOrder::Asc)
        .first(&store)
        .unwrap()
        .unwrap();
    assert_eq!(first.get(1), Some(&Value::from("bar")));
}

#[test]
fn test_projection_with_labels_and_arithmetic() {
    let store = loaded(StoreConfig::default());
    let result = Query::table("items")
        .filter(Predicate::is_not_null("score"))
        .select("name")
        .select(Expr::mul(Expr::column("score"), Expr::literal(2)).label("double"))
        .select(Expr::gt(Expr::column("score"), Expr::literal(15)).label("high"))
        .execute(&store)
        .unwrap();
    assert_eq!(
        result.columns(),
        &["name".to_string(), "double".to_string(), "high".to_string()]
    );
    assert_eq!(
        result.rows(),
        &[
            vec![Value::from("foo"), Value::Integer(20), Value::Boolean(false)],
            vec![Value::from("bar"), Value::Integer(40), Value::Boolean(true)],
            vec![Value::from("qux"), Value::Integer(60), Value::Boolean(true)],
        ]
    );
}

#[test]
fn test_rows_is_lazy_projection() {
    let store = loaded(StoreConfig::default());
    let mut rows = Query::table("items").select("name").rows(&store).unwrap();
    assert_eq!(rows.next(), Some(vec![Value::from("foo")]));
    assert_eq!(rows.count(), 3);
}

#[test]
fn test_case_sum() {
    let store = products_store();
    let case = Expr::case(
        vec![
            (
                Predicate::eq("category", "A"),
                Expr::sub(Expr::column("vendor_id"), Expr::column("id")),
            ),
            (
                Predicate::eq("category", "B"),
                Expr::sub(Expr::column("id"), Expr::column("vendor_id")),
            ),
        ],
        None,
    );
    let result = Query::table("products")
        .select(Expr::sum(Expr::mul(case, Expr::column("id"))).label("total"))
        .execute(&store)
        .unwrap();
    assert_eq!(result.get(0, "total"), Some(&Value::Integer(-58)));
}

#[test]
fn test_case_without_match_or_else() {
    let store = products_store();
    let case = Expr::case(
        vec![(Predicate::eq("category", "A"), Expr::literal("first"))],
        Some(Expr::literal("other")),
    );
    let bare = Expr::case(vec![(Predicate::eq("category", "C"), Expr::literal(1))], None);
    let result = Query::table("products")
        .select(case.label("kind"))
        .select(bare.label("none"))
        .execute(&store)
        .unwrap();
    assert_eq!(
        result.column("kind"),
        Some(vec!["first".into(), "other".into(), "other".into()])
    );
    assert_eq!(result.column("none"), Some(vec![Value::Null; 3]));
}

#[test]
fn test_aggregates_over_ids() {
    let store = products_store();
    let result = Query::table("products")
        .select(Expr::count_all())
        .select(Expr::min(Expr::column("id")))
        .select(Expr::max(Expr::column("id")))
        .select(Expr::avg(Expr::column("id")))
        .select(Expr::sum(Expr::column("id")))
        .execute(&store)
        .unwrap();
    assert_eq!(result.columns(), &["count", "min", "max", "avg", "sum"]);
    assert_eq!(
        result.rows(),
        &[vec![
            Value::Integer(3),
            Value::Integer(1),
            Value::Integer(3),
            Value::Float(2.0),
            Value::Integer(6),
        ]]
    );
}

#[test]
fn test_aggregate_over_no_matches() {
    let store = products_store();
    let result = Query::table("products")
        .filter(Predicate::eq("category", "Z"))
        .select(Expr::count_all())
        .select(Expr::sum(Expr::column("vendor_id")))
        .execute(&store)
        .unwrap();
    assert_eq!(result.rows(), &[vec![Value::Integer(0), Value::Null]]);
}

#[test]
fn test_group_by() {
    let store = products_store();
    let result = Query::table("products")
        .group_by("category")
        .select("category")
        .select(Expr::count_all().label("n"))
        .select(Expr::sum(Expr::column("vendor_id")).label("vendors"))
        .execute(&store)
        .unwrap();
    assert_eq!(
        result.rows(),
        &[
            vec![Value::from("A"), Value::Integer(1), Value::Integer(10)],
            vec![Value::from("B"), Value::Integer(2), Value::Integer(30)],
        ]
    );

    // Ordering decides which group is seen first; the window applies to groups.
    let result = Query::table("products")
        .order_by("id", SortOrder::Desc)
        .group_by("category")
        .limit(1)
        .execute(&store)
        .unwrap();
    assert_eq!(result.columns(), &["category"]);
    assert_eq!(result.rows(), &[vec![Value::from("B")]]);
}

#[test]
fn test_json_extract_and_date() {
    let mut store = Store::new();
    let events = TableBuilder::new("events")
        .unwrap()
        .add_column("id", DataType::Integer)
        .unwrap()
        .add_column("meta", DataType::Json)
        .unwrap()
        .add_column("at", DataType::DateTime)
        .unwrap()
        .primary_key("id")
        .unwrap()
        .build()
        .unwrap();
    store.create_table(events).unwrap();

    let day = 86_400_000i64;
    for (reference, at) in [("x", day + 5), ("y", day * 2), ("x", day * 2 + 7)] {
        let mut inner = BTreeMap::new();
        inner.insert("abc".to_string(), Value::from(reference));
        let mut meta = BTreeMap::new();
        meta.insert("ref".to_string(), Value::Object(inner));
        insert(
            &mut store,
            "events",
            &[("meta", Value::Object(meta)), ("at", Value::DateTime(at))],
        );
    }
    store.commit().unwrap();

    let rows = Query::table("events")
        .filter(Predicate::eq(Target::json_extract("meta", "$.ref.abc"), "x"))
        .fetch(&store)
        .unwrap();
    assert_eq!(ids(&rows), vec![1, 3]);

    let rows = Query::table("events")
        .filter(Predicate::eq(Target::date("at"), Value::Date(2)))
        .fetch(&store)
        .unwrap();
    assert_eq!(ids(&rows), vec![2, 3]);

    // A datetime literal compares by its calendar date.
    let rows = Query::table("events")
        .filter(Predicate::eq(Target::date("at"), Value::DateTime(day + 100)))
        .fetch(&store)
        .unwrap();
    assert_eq!(ids(&rows), vec![1]);

    let result = Query::table("events")
        .group_by(Expr::date("at"))
        .select(Expr::date("at").label("day"))
        .select(Expr::count_all())
        .execute(&store)
        .unwrap();
    assert_eq!(
        result.rows(),
        &[
            vec![Value::Date(1), Value::Integer(1)],
            vec![Value::Date(2), Value::Integer(2)],
        ]
    );
}

#[test]
fn test_update_statement() {
    let mut store = loaded(StoreConfig::default());
    let updated = Query::table("items")
        .filter(Predicate::is_null("score"))
        .update(&mut store, &[("score", 99.into())])
        .unwrap();
    assert_eq!(updated, 1);
    // Buffered only.
    assert_eq!(
        Query::table("items")
            .filter(Predicate::eq("score", 99))
            .count(&store)
            .unwrap(),
        0
    );
    store.commit().unwrap();
    let rows = Query::table("items")
        .filter(Predicate::eq("score", 99))
        .fetch(&store)
        .unwrap();
    assert_eq!(ids(&rows), vec![3]);
}

#[test]
fn test_statements_fail_before_buffering() {
    let mut store = loaded(StoreConfig::default());
    let err = Query::table("items")
        .filter(Predicate::eq("active", true))
        .update(&mut store, &[("missing", 1.into())])
        .unwrap_err();
    assert!(matches!(err, Error::SchemaViolation { .. }));

    let err = Query::table("items")
        .filter(Predicate::eq("active", true))
        .filter(Predicate::compare(
            "id",
            CompareOp::Between,
            Operand::Tuple(vec![1.into()]),
        ))
        .delete(&mut store)
        .unwrap_err();
    assert!(matches!(err, Error::UnsupportedPredicate { .. }));
    assert!(!store.dirty());
}

#[test]
fn test_index_selection_off_agrees() {
    let indexed = loaded(StoreConfig::default());
    let scanned = loaded(StoreConfig::new().index_selection(false));
    let predicates = vec![
        Predicate::eq("active", true),
        Predicate::in_list("score", vec![10.into(), 30.into(), Value::Null]),
        Predicate::and(vec![Predicate::ge("score", 10), Predicate::ne("id", 1)]),
        Predicate::not(Predicate::between("id", 2, 3)),
        Predicate::or(vec![Predicate::lt("score", 15), Predicate::is_null("score")]),
    ];
    for p in predicates {
        let query = Query::table("items").filter(p).order_by("id", SortOrder::Asc);
        assert_eq!(
            ids(&query.fetch(&indexed).unwrap()),
            ids(&query.fetch(&scanned).unwrap())
        );
    }
}
