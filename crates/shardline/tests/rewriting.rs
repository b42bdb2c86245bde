mod common;

use common::{pipeline, rewritten};
use shardline::{
    Configuration, Parameters, ShardError, ShardingPipeline, StatementCache, TableShards,
};

#[test]
fn test_rewrite_round_trips_through_the_parser() {
    let p = pipeline(&[("orders", "mod(id, 5)")]);
    let sql = rewritten(&p, "SELECT * FROM orders WHERE id=7", &Parameters::new());
    assert_eq!(sql, vec!["SELECT * FROM orders_2 WHERE id=7"]);

    let reparsed = StatementCache::new(4).get_or_parse(&sql[0]).unwrap();
    assert!(reparsed.table_names().contains("orders_2"));
    assert!(!reparsed.table_names().contains("orders"));
}

#[test]
fn test_join_of_two_sharded_tables_is_a_cartesian_product() {
    let p = pipeline(&[("a", "mod(k, 3)"), ("b", "mod(k, 4)")]);
    let sql = rewritten(
        &p,
        "SELECT a.v, b.v FROM a JOIN b ON a.k = b.k",
        &Parameters::new(),
    );
    assert_eq!(sql.len(), 12);
    assert_eq!(sql[0], "SELECT a_0.v, b_0.v FROM a_0 JOIN b_0 ON a_0.k = b_0.k");
    assert_eq!(sql[11], "SELECT a_2.v, b_3.v FROM a_2 JOIN b_3 ON a_2.k = b_3.k");

    let mut unique = sql.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), 12);
}

#[test]
fn test_rewrites_are_lazy_and_sized() {
    let p = pipeline(&[("a", "mod(k, 3)"), ("b", "mod(k, 4)")]);
    let parsed = p.prepare("SELECT * FROM a, b").unwrap();
    let mut rewrites = p.rewrite(&parsed, &Parameters::new()).unwrap();
    assert_eq!(rewrites.len(), 12);
    let first = rewrites.next().unwrap();
    assert_eq!(first.index, 0);
    assert_eq!(
        first.tables,
        vec![
            ("a".to_string(), "a_0".to_string()),
            ("b".to_string(), "b_0".to_string())
        ]
    );
    assert_eq!(rewrites.len(), 11);
    assert_eq!(rewrites.last().map(|s| s.index), Some(11));
}

#[test]
fn test_unrouted_statement_is_returned_unchanged() {
    let p = pipeline(&[("orders", "mod(id, 5)")]);
    let sql = "SELECT name FROM users WHERE id = 3";
    assert_eq!(rewritten(&p, sql, &Parameters::new()), vec![sql]);
}

#[test]
fn test_substitution_respects_token_boundaries() {
    let p = pipeline(&[("orders", "mod(id, 5)")]);
    let sql = rewritten(
        &p,
        "SELECT orders.id, o2.orders_total, 'orders' FROM orders, order_items o2 WHERE orders.id = 1 AND o2.k = 9",
        &Parameters::new(),
    );
    assert_eq!(
        sql,
        vec![
            "SELECT orders_1.id, o2.orders_total, 'orders' FROM orders_1, order_items o2 WHERE orders_1.id = 1 AND o2.k = 9"
        ]
    );
}

#[test]
fn test_columns_named_like_the_table_are_kept() {
    let p = pipeline(&[("orders", "mod(user_id, 4)")]);
    let sql = rewritten(
        &p,
        "SELECT o.orders FROM orders o WHERE user_id = 6",
        &Parameters::new(),
    );
    assert_eq!(sql, vec!["SELECT o.orders FROM orders_2 o WHERE user_id = 6"]);
}

#[test]
fn test_substitution_is_case_insensitive_and_reaches_hints() {
    let p = pipeline(&[("orders", "mod(id, 5)")]);
    let sql = rewritten(
        &p,
        "SELECT /*+ INDEX(Orders idx_user) */ id FROM Orders -- all orders\nWHERE id = 3",
        &Parameters::new(),
    );
    assert_eq!(
        sql,
        vec!["SELECT /*+ INDEX(orders_3 idx_user) */ id FROM orders_3 -- all orders\nWHERE id = 3"]
    );
}

#[test]
fn test_tables_in_subqueries_are_rewritten() {
    let p = pipeline(&[("orders", "mod(user_id, 2)")]);
    let sql = rewritten(
        &p,
        "SELECT * FROM users WHERE id IN (SELECT user_id FROM orders WHERE user_id = 3)",
        &Parameters::new(),
    );
    assert_eq!(
        sql,
        vec![
            "SELECT * FROM users WHERE id IN (SELECT user_id FROM orders_0 WHERE user_id = 3)",
            "SELECT * FROM users WHERE id IN (SELECT user_id FROM orders_1 WHERE user_id = 3)",
        ]
    );
}

#[test]
fn test_head_comment_is_not_part_of_the_rewrite() {
    let p = pipeline(&[("orders", "mod(user_id, 4)")]);
    let sql = rewritten(&p, "/* user_id:6 */ UPDATE orders SET paid = 1", &Parameters::new());
    assert_eq!(sql, vec!["UPDATE orders_2 SET paid = 1"]);
}

#[test]
fn test_insert_spanning_shards_is_rejected() {
    let p = pipeline(&[("orders", "mod(user_id, 4)")]);
    let parsed = p
        .prepare("INSERT INTO orders (user_id, total) VALUES (1, 10), (2, 20)")
        .unwrap();
    let err = p.rewrite(&parsed, &Parameters::new()).unwrap_err();
    assert!(matches!(
        err,
        ShardError::CrossShardInsert { ref table, shards: 2 } if table == "orders"
    ));
}

#[test]
fn test_insert_without_shard_value_depends_on_mandatory() {
    let sql = "INSERT INTO orders (id, total) VALUES (1, 10)";

    let relaxed = pipeline(&[("orders", "mod(user_id, 4)")]);
    assert_eq!(rewritten(&relaxed, sql, &Parameters::new()), vec![sql]);

    let strict = ShardingPipeline::new(
        Configuration::builder()
            .mandatory(true)
            .route("orders", "mod(user_id, 4)")
            .build()
            .unwrap(),
    );
    let parsed = strict.prepare(sql).unwrap();
    let err = strict.rewrite(&parsed, &Parameters::new()).unwrap_err();
    assert!(matches!(err, ShardError::MissingRouteTarget(ref t) if t == "orders"));
}

#[test]
fn test_insert_subselect_is_routed_for_its_own_table() {
    let p = pipeline(&[("orders", "mod(user_id, 4)"), ("staged", "mod(user_id, 2)")]);
    let params = Parameters::new().bind(5).bind(5);
    let sql = rewritten(
        &p,
        "INSERT INTO orders (user_id, total) VALUES (?, (SELECT SUM(total) FROM staged WHERE user_id = ?))",
        &params,
    );
    assert_eq!(
        sql,
        vec!["INSERT INTO orders_1 (user_id, total) VALUES (?, (SELECT SUM(total) FROM staged_1 WHERE user_id = ?))"]
    );

    let sql = rewritten(&p, "INSERT INTO archive SELECT * FROM staged", &Parameters::new());
    assert_eq!(
        sql,
        vec![
            "INSERT INTO archive SELECT * FROM staged_0",
            "INSERT INTO archive SELECT * FROM staged_1",
        ]
    );
}

#[test]
fn test_plan_lists_every_table() {
    let p = pipeline(&[("orders", "mod(user_id, 4)")]);
    let parsed = p
        .prepare("SELECT * FROM orders o JOIN users u ON u.id = o.user_id WHERE o.user_id = 7")
        .unwrap();
    let plan = p.rewriter().plan(&parsed, &Parameters::new()).unwrap();
    assert_eq!(
        plan,
        vec![
            TableShards {
                table: "orders".into(),
                suffixes: vec!["3".into()]
            },
            TableShards {
                table: "users".into(),
                suffixes: vec![]
            },
        ]
    );
}
