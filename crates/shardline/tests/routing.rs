mod common;

use common::{pipeline, set, suffixes};
use shardline::{Parameters, ShardError, Value};

fn all(n: usize) -> Vec<String> {
    (0..n).map(|i| i.to_string()).collect()
}

#[test]
fn test_statement_without_where_visits_every_shard() {
    let p = pipeline(&[("t", "mod(id, 5)")]);
    let got = suffixes(&p, "t", "SELECT * FROM t", &Parameters::new());
    assert_eq!(got, set(&["0", "1", "2", "3", "4"]));

    let got = suffixes(&p, "t", "DELETE FROM t", &Parameters::new());
    assert_eq!(got.into_iter().collect::<Vec<_>>(), all(5));
}

#[test]
fn test_equality_pins_one_shard() {
    let p = pipeline(&[("t", "mod(id, 5)")]);
    assert_eq!(
        suffixes(&p, "t", "SELECT * FROM t WHERE id = 7", &Parameters::new()),
        set(&["2"])
    );
    assert_eq!(
        suffixes(&p, "t", "UPDATE t SET v = 1 WHERE 12 = id", &Parameters::new()),
        set(&["2"])
    );
}

#[test]
fn test_parameters_are_resolved() {
    let p = pipeline(&[("orders", "mod(user_id, 4)")]);
    let params = Parameters::new().bind("pending").bind(6_i64);
    let got = suffixes(
        &p,
        "orders",
        "SELECT * FROM orders WHERE status = ? AND user_id = ?",
        &params,
    );
    assert_eq!(got, set(&["2"]));

    let named = Parameters::new().bind_named("uid", 9);
    let got = suffixes(&p, "orders", "SELECT * FROM orders WHERE user_id = :uid", &named);
    assert_eq!(got, set(&["1"]));
}

#[test]
fn test_disjunctions_and_in_lists_union() {
    let p = pipeline(&[("orders", "mod(user_id, 4)")]);
    let params = Parameters::new().bind(1).bind(2);
    assert_eq!(
        suffixes(
            &p,
            "orders",
            "SELECT * FROM orders WHERE user_id = ? OR user_id = ?",
            &params
        ),
        set(&["1", "2"])
    );
    assert_eq!(
        suffixes(
            &p,
            "orders",
            "SELECT * FROM orders WHERE user_id IN (3, 7, 8)",
            &Parameters::new()
        ),
        set(&["0", "3"])
    );
}

#[test]
fn test_list_parameter_routes_each_element() {
    let p = pipeline(&[("orders", "mod(user_id, 4)")]);
    let params = Parameters::new().bind(Value::List(vec![Value::Int(5), Value::Int(10)]));
    assert_eq!(
        suffixes(&p, "orders", "SELECT * FROM orders WHERE user_id IN (?)", &params),
        set(&["1", "2"])
    );
}

#[test]
fn test_ambiguous_predicates_fail_open() {
    let p = pipeline(&[("orders", "mod(user_id, 4)")]);
    let cases = [
        "SELECT * FROM orders WHERE user_id > 3",
        "SELECT * FROM orders WHERE status = 'new'",
        "SELECT * FROM orders WHERE user_id = ?",
        "SELECT * FROM orders WHERE user_id = id + 1",
        "SELECT * FROM orders WHERE user_id IN (SELECT id FROM users)",
        "SELECT * FROM orders WHERE user_id = 1 OR user_id IN (SELECT id FROM users)",
    ];
    for sql in cases {
        let got = suffixes(&p, "orders", sql, &Parameters::new());
        assert_eq!(got.len(), 4, "{sql}");
    }
}

#[test]
fn test_qualified_columns_must_name_the_table() {
    let p = pipeline(&[("orders", "mod(user_id, 4)")]);
    let sql = "SELECT * FROM orders o JOIN users u ON o.user_id = u.id WHERE o.user_id = 5";
    assert_eq!(suffixes(&p, "orders", sql, &Parameters::new()), set(&["1"]));

    let sql = "SELECT * FROM orders o JOIN users u ON o.user_id = u.id WHERE u.user_id = 5";
    assert_eq!(suffixes(&p, "orders", sql, &Parameters::new()).len(), 4);
}

#[test]
fn test_scalar_subselect_is_routed_for_its_table() {
    let p = pipeline(&[("orders", "mod(user_id, 4)")]);
    let sql = "SELECT * FROM orders WHERE user_id = (SELECT MAX(user_id) FROM orders WHERE user_id = 6)";
    assert_eq!(suffixes(&p, "orders", sql, &Parameters::new()), set(&["2"]));

    let sql = "SELECT * FROM orders WHERE user_id = (SELECT MAX(user_id) FROM orders)";
    assert_eq!(suffixes(&p, "orders", sql, &Parameters::new()).len(), 4);

    let sql = "SELECT * FROM orders WHERE user_id = 1 AND user_id = (SELECT user_id FROM orders WHERE user_id = 6)";
    assert_eq!(suffixes(&p, "orders", sql, &Parameters::new()), set(&["1", "2"]));
}

#[test]
fn test_head_comment_overrides() {
    let p = pipeline(&[("orders", "mod(user_id, 4)")]);
    let got = suffixes(&p, "orders", "/* user_id:3 */ SELECT * FROM orders", &Parameters::new());
    assert_eq!(got, set(&["3"]));

    let params = Parameters::new().bind(5);
    let got = suffixes(
        &p,
        "orders",
        "/* user_id:?0 */ SELECT * FROM orders WHERE user_id = 2",
        &params,
    );
    assert_eq!(got, set(&["1", "2"]));

    let got = suffixes(&p, "orders", "/* tenant:3 */ SELECT * FROM orders", &Parameters::new());
    assert_eq!(got.len(), 4);
}

#[test]
fn test_month_strategy() {
    let p = pipeline(&[("events", "month(created)")]);
    assert_eq!(
        suffixes(&p, "events", "SELECT * FROM events", &Parameters::new()).len(),
        12
    );
    assert_eq!(
        suffixes(
            &p,
            "events",
            "SELECT * FROM events WHERE created = '2024-03-15 10:30:00'",
            &Parameters::new()
        ),
        set(&["3"])
    );
}

#[test]
fn test_value_strategy_has_no_full_set() {
    let p = pipeline(&[("users", "val(region)")]);
    assert_eq!(
        suffixes(&p, "users", "SELECT * FROM users WHERE region = 'eu'", &Parameters::new()),
        set(&["eu"])
    );
    assert!(suffixes(&p, "users", "SELECT * FROM users", &Parameters::new()).is_empty());
}

#[test]
fn test_null_matches_no_shard() {
    let p = pipeline(&[("orders", "mod(user_id, 4)")]);
    let params = Parameters::new().bind(Value::Null).bind(1);
    let got = suffixes(
        &p,
        "orders",
        "SELECT * FROM orders WHERE user_id = ? OR user_id = ?",
        &params,
    );
    assert_eq!(got, set(&["1"]));
}

#[test]
fn test_insert_routes_every_row() {
    let p = pipeline(&[("orders", "mod(user_id, 4)")]);
    let sql = "INSERT INTO orders (id, user_id) VALUES (1, 4), (2, 8)";
    assert_eq!(suffixes(&p, "orders", sql, &Parameters::new()), set(&["0"]));

    let sql = "INSERT INTO orders (id, total) VALUES (1, 4)";
    assert!(suffixes(&p, "orders", sql, &Parameters::new()).is_empty());
}

#[test]
fn test_unmappable_values_are_errors() {
    let p = pipeline(&[("orders", "mod(user_id, 4)")]);
    let parsed = p.prepare("SELECT * FROM orders WHERE user_id = 'abc'").unwrap();
    let err = p
        .rewriter()
        .routers()
        .get("orders")
        .unwrap()
        .sub_table_names(&parsed, &Parameters::new())
        .unwrap_err();
    assert!(matches!(err, ShardError::InvalidShardValue { .. }));
}
