//! Tests for table name collection and statement inspection.

mod common;
use common::*;

use shardline_sql::ast::Aggregate;

#[test]
fn test_tables_from_simple_select() {
    assert_eq!(tables("SELECT * FROM Orders"), vec!["orders"]);
}

#[test]
fn test_tables_from_joins_and_comma_lists() {
    assert_eq!(
        tables("SELECT * FROM a JOIN b ON a.id = b.id, c"),
        vec!["a", "b", "c"]
    );
}

#[test]
fn test_tables_from_nested_subqueries() {
    assert_eq!(
        tables(
            "SELECT (SELECT MAX(x) FROM s) FROM (SELECT * FROM d) t \
             WHERE id IN (SELECT id FROM w WHERE EXISTS (SELECT 1 FROM e))"
        ),
        vec!["d", "e", "s", "w"]
    );
}

#[test]
fn test_tables_from_dml() {
    assert_eq!(
        tables("INSERT INTO archive (id) SELECT id FROM orders"),
        vec!["archive", "orders"]
    );
    assert_eq!(
        tables("UPDATE orders SET total = (SELECT SUM(x) FROM items) WHERE id = 1"),
        vec!["items", "orders"]
    );
    assert_eq!(
        tables("DELETE FROM orders WHERE user_id IN (SELECT id FROM banned)"),
        vec!["banned", "orders"]
    );
}

#[test]
fn test_tables_ignore_schema_qualifier() {
    assert_eq!(tables("SELECT * FROM shop.orders"), vec!["orders"]);
}

#[test]
fn test_bound_tables_stay_at_own_level() {
    let stmt = parse("SELECT * FROM orders o JOIN users u ON o.uid = u.id WHERE o.id IN (SELECT id FROM x)");
    let bound = stmt.bound_tables();
    assert_eq!(bound.len(), 2);
    assert!(bound[0].answers_to("O"));
    assert!(bound[0].answers_to("orders"));
    assert!(!bound[0].answers_to("u"));
    assert!(bound[1].answers_to("users"));
}

#[test]
fn test_aggregate_detection() {
    assert_eq!(
        parse_select("SELECT COUNT(*) FROM t").aggregate(),
        Some(Aggregate::Count)
    );
    assert_eq!(
        parse_select("SELECT (sum(total)) AS s FROM t").aggregate(),
        Some(Aggregate::Sum)
    );
    assert_eq!(parse_select("SELECT MAX(a), MIN(b) FROM t").aggregate(), None);
    assert_eq!(parse_select("SELECT LOWER(a) FROM t").aggregate(), None);
    assert_eq!(parse_select("SELECT a FROM t").aggregate(), None);
}

#[test]
fn test_where_clause_and_kind_name() {
    let stmt = parse("DELETE FROM t WHERE id = 1");
    assert!(stmt.where_clause().is_some());
    assert_eq!(stmt.kind_name(), "DELETE");
    assert!(stmt.as_select().is_none());

    let stmt = parse("INSERT INTO t (id) VALUES (1)");
    assert!(stmt.where_clause().is_none());
    assert_eq!(stmt.kind_name(), "INSERT");
}
