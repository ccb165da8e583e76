use pretty_assertions::assert_eq;
use tests::{record, MockDriver};

use saddle::{
    mapping::{Discriminator, ResultFlag, StatementKind},
    MappedStatement, ResultMap, ResultMapping, SessionFactory, Value,
};

const JOIN_SQL: &str =
    "SELECT u.id AS id, u.name AS name, o.id AS order_id, o.total AS total FROM users u LEFT JOIN orders o ON o.user_id = u.id";
const ORDERS_SQL: &str = "SELECT id, total FROM orders WHERE user_id = ?";
const USERS_SQL: &str = "SELECT id, name FROM users";
const SHAPES_SQL: &str = "SELECT kind, id, radius, side FROM shapes";

fn order_map() -> ResultMap {
    ResultMap::builder("Order.map", "Order")
        .mapping(
            ResultMapping::builder("id")
                .column("order_id")
                .flag(ResultFlag::Id)
                .build(),
        )
        .mapping(ResultMapping::builder("total").column("total").build())
        .build()
        .unwrap()
}

fn user_with_orders_map() -> ResultMap {
    ResultMap::builder("User.withOrders", "User")
        .mapping(
            ResultMapping::builder("id")
                .column("id")
                .flag(ResultFlag::Id)
                .build(),
        )
        .mapping(ResultMapping::builder("name").column("name").build())
        .mapping(
            ResultMapping::builder("orders")
                .nested_result_map("Order.map")
                .many()
                .build(),
        )
        .build()
        .unwrap()
}

#[tokio::test]
async fn nested_collection_groups_rows_by_identity() {
    let driver = MockDriver::new().rows(
        JOIN_SQL,
        &["id", "name", "order_id", "total"],
        vec![
            vec![Value::I64(1), "Ann".into(), Value::I64(10), Value::F64(5.0)],
            vec![Value::I64(1), "Ann".into(), Value::I64(11), Value::F64(7.5)],
            vec![Value::I64(2), "Bob".into(), Value::Null, Value::Null],
        ],
    );
    let factory = SessionFactory::builder()
        .driver(driver)
        .result_map(order_map())
        .result_map(user_with_orders_map())
        .statement(
            MappedStatement::builder("User.allWithOrders", StatementKind::Select)
                .sql(JOIN_SQL)
                .result_map("User.withOrders")
                .build(),
        )
        .auto_commit(true)
        .build()
        .unwrap();
    let mut session = factory.session().await.unwrap();

    let list = session
        .select_list("User.allWithOrders", Value::Null)
        .await
        .unwrap();
    assert_eq!(list.len(), 2);

    let ann = list[0].as_record().unwrap();
    assert_eq!(ann.get("name"), Some(&Value::from("Ann")));
    let Some(Value::List(orders)) = ann.get("orders") else {
        panic!("orders should be a list");
    };
    assert_eq!(orders.len(), 2);
    assert_eq!(
        orders[0],
        record(vec![("id", Value::I64(10)), ("total", Value::F64(5.0))])
    );

    // An outer-join miss keeps the collection present but empty.
    let bob = list[1].as_record().unwrap();
    assert_eq!(bob.get("orders"), Some(&Value::List(vec![])));
}

#[tokio::test]
async fn nested_collection_deduplicates_children_by_identity() {
    let driver = MockDriver::new().rows(
        JOIN_SQL,
        &["id", "name", "order_id", "total"],
        vec![
            vec![Value::I64(1), "Ann".into(), Value::I64(10), Value::F64(5.0)],
            vec![Value::I64(1), "Ann".into(), Value::I64(10), Value::F64(5.0)],
        ],
    );
    let factory = SessionFactory::builder()
        .driver(driver)
        .result_map(order_map())
        .result_map(user_with_orders_map())
        .statement(
            MappedStatement::builder("User.allWithOrders", StatementKind::Select)
                .sql(JOIN_SQL)
                .result_map("User.withOrders")
                .build(),
        )
        .auto_commit(true)
        .build()
        .unwrap();
    let mut session = factory.session().await.unwrap();

    let list = session
        .select_list("User.allWithOrders", Value::Null)
        .await
        .unwrap();
    assert_eq!(list.len(), 1);
    let Some(Value::List(orders)) = list[0].as_record().unwrap().get("orders") else {
        panic!("orders should be a list");
    };
    assert_eq!(orders.len(), 1);
}

#[tokio::test]
async fn nested_association_maps_from_the_same_row() {
    let sql = "SELECT o.id AS order_id, o.total AS total, u.id AS id, u.name AS name FROM orders o JOIN users u ON u.id = o.user_id";
    let user_map = ResultMap::builder("User.map", "User")
        .mapping(
            ResultMapping::builder("id")
                .column("id")
                .flag(ResultFlag::Id)
                .build(),
        )
        .mapping(ResultMapping::builder("name").column("name").build())
        .build()
        .unwrap();
    let order_with_user = ResultMap::builder("Order.withUser", "Order")
        .mapping(
            ResultMapping::builder("id")
                .column("order_id")
                .flag(ResultFlag::Id)
                .build(),
        )
        .mapping(ResultMapping::builder("total").column("total").build())
        .mapping(
            ResultMapping::builder("user")
                .nested_result_map("User.map")
                .build(),
        )
        .build()
        .unwrap();

    let driver = MockDriver::new().rows(
        sql,
        &["order_id", "total", "id", "name"],
        vec![vec![
            Value::I64(10),
            Value::F64(5.0),
            Value::I64(1),
            "Ann".into(),
        ]],
    );
    let factory = SessionFactory::builder()
        .driver(driver)
        .result_map(user_map)
        .result_map(order_with_user)
        .statement(
            MappedStatement::builder("Order.allWithUser", StatementKind::Select)
                .sql(sql)
                .result_map("Order.withUser")
                .build(),
        )
        .auto_commit(true)
        .build()
        .unwrap();
    let mut session = factory.session().await.unwrap();

    let list = session
        .select_list("Order.allWithUser", Value::Null)
        .await
        .unwrap();
    assert_eq!(list.len(), 1);
    let order = list[0].as_record().unwrap();
    assert_eq!(
        order.get("user"),
        Some(&record(vec![
            ("id", Value::I64(1)),
            ("name", "Ann".into())
        ]))
    );
}

#[tokio::test]
async fn nested_query_runs_eagerly_per_parent() {
    let driver = MockDriver::new()
        .rows(
            USERS_SQL,
            &["id", "name"],
            vec![
                vec![Value::I64(1), "Ann".into()],
                vec![Value::I64(2), "Bob".into()],
            ],
        )
        .rows(
            ORDERS_SQL,
            &["id", "total"],
            vec![vec![Value::I64(10), Value::F64(5.0)]],
        );
    let log = driver.log();

    let user_map = ResultMap::builder("User.withOrderQuery", "User")
        .mapping(
            ResultMapping::builder("id")
                .column("id")
                .flag(ResultFlag::Id)
                .build(),
        )
        .mapping(ResultMapping::builder("name").column("name").build())
        .mapping(
            ResultMapping::builder("orders")
                .column("id")
                .nested_query("Order.byUser")
                .many()
                .build(),
        )
        .build()
        .unwrap();

    let factory = SessionFactory::builder()
        .driver(driver)
        .result_map(user_map)
        .statement(
            MappedStatement::builder("User.all", StatementKind::Select)
                .sql(USERS_SQL)
                .result_map("User.withOrderQuery")
                .build(),
        )
        .statement(
            MappedStatement::builder("Order.byUser", StatementKind::Select)
                .sql(ORDERS_SQL)
                .param("user_id")
                .build(),
        )
        .auto_commit(true)
        .build()
        .unwrap();
    let mut session = factory.session().await.unwrap();

    let list = session.select_list("User.all", Value::Null).await.unwrap();
    assert_eq!(list.len(), 2);

    // One sub-select per distinct parent key.
    assert_eq!(log.execs_of(ORDERS_SQL), 2);

    let Some(Value::List(orders)) = list[0].as_record().unwrap().get("orders") else {
        panic!("orders should be a list");
    };
    assert_eq!(orders.len(), 1);
}

#[tokio::test]
async fn discriminator_selects_an_alternate_map_per_row() {
    let circle_map = ResultMap::builder("Shape.circle", "Circle")
        .mapping(
            ResultMapping::builder("id")
                .column("id")
                .flag(ResultFlag::Id)
                .build(),
        )
        .mapping(ResultMapping::builder("radius").column("radius").build())
        .build()
        .unwrap();
    let square_map = ResultMap::builder("Shape.square", "Square")
        .mapping(
            ResultMapping::builder("id")
                .column("id")
                .flag(ResultFlag::Id)
                .build(),
        )
        .mapping(ResultMapping::builder("side").column("side").build())
        .build()
        .unwrap();
    let shape_map = ResultMap::builder("Shape.map", "Shape")
        .mapping(
            ResultMapping::builder("id")
                .column("id")
                .flag(ResultFlag::Id)
                .build(),
        )
        .discriminator(
            Discriminator::new("kind")
                .case("circle", "Shape.circle")
                .case("square", "Shape.square"),
        )
        .build()
        .unwrap();

    let driver = MockDriver::new().rows(
        SHAPES_SQL,
        &["kind", "id", "radius", "side"],
        vec![
            vec!["circle".into(), Value::I64(1), Value::F64(2.0), Value::Null],
            vec!["square".into(), Value::I64(2), Value::Null, Value::F64(3.0)],
        ],
    );
    let factory = SessionFactory::builder()
        .driver(driver)
        .result_map(circle_map)
        .result_map(square_map)
        .result_map(shape_map)
        .statement(
            MappedStatement::builder("Shape.all", StatementKind::Select)
                .sql(SHAPES_SQL)
                .result_map("Shape.map")
                .build(),
        )
        .auto_commit(true)
        .build()
        .unwrap();
    let mut session = factory.session().await.unwrap();

    let list = session.select_list("Shape.all", Value::Null).await.unwrap();
    assert_eq!(
        list[0],
        record(vec![("id", Value::I64(1)), ("radius", Value::F64(2.0))])
    );
    assert_eq!(
        list[1],
        record(vec![("id", Value::I64(2)), ("side", Value::F64(3.0))])
    );
}

#[tokio::test]
async fn auto_mapping_fills_unmapped_columns_when_enabled() {
    let sql = "SELECT id, name, age FROM users";
    let partial_map = ResultMap::builder("User.partial", "User")
        .mapping(
            ResultMapping::builder("id")
                .column("id")
                .flag(ResultFlag::Id)
                .build(),
        )
        .auto_mapping(true)
        .build()
        .unwrap();
    let strict_map = ResultMap::builder("User.strict", "User")
        .mapping(
            ResultMapping::builder("id")
                .column("id")
                .flag(ResultFlag::Id)
                .build(),
        )
        .auto_mapping(false)
        .build()
        .unwrap();

    let driver = MockDriver::new().rows(
        sql,
        &["id", "name", "age"],
        vec![vec![Value::I64(1), "Ann".into(), Value::I64(40)]],
    );
    let factory = SessionFactory::builder()
        .driver(driver)
        .result_map(partial_map)
        .result_map(strict_map)
        .statement(
            MappedStatement::builder("User.partialSelect", StatementKind::Select)
                .sql(sql)
                .result_map("User.partial")
                .build(),
        )
        .statement(
            MappedStatement::builder("User.strictSelect", StatementKind::Select)
                .sql(sql)
                .result_map("User.strict")
                .build(),
        )
        .auto_commit(true)
        .build()
        .unwrap();
    let mut session = factory.session().await.unwrap();

    let list = session
        .select_list("User.partialSelect", Value::Null)
        .await
        .unwrap();
    assert_eq!(
        list[0],
        record(vec![
            ("id", Value::I64(1)),
            ("name", "Ann".into()),
            ("age", Value::I64(40)),
        ])
    );

    let list = session
        .select_list("User.strictSelect", Value::Null)
        .await
        .unwrap();
    assert_eq!(list[0], record(vec![("id", Value::I64(1))]));
}

#[tokio::test]
async fn statements_without_a_result_map_auto_map_every_column() {
    let driver = MockDriver::new().rows(
        USERS_SQL,
        &["id", "name"],
        vec![vec![Value::I64(1), "Ann".into()]],
    );
    let factory = SessionFactory::builder()
        .driver(driver)
        .statement(
            MappedStatement::builder("User.all", StatementKind::Select)
                .sql(USERS_SQL)
                .build(),
        )
        .auto_commit(true)
        .build()
        .unwrap();
    let mut session = factory.session().await.unwrap();

    let list = session.select_list("User.all", Value::Null).await.unwrap();
    assert_eq!(
        list[0],
        record(vec![("id", Value::I64(1)), ("name", "Ann".into())])
    );
}

#[tokio::test]
async fn constructor_mappings_materialize_first() {
    let sql = "SELECT name, id FROM users";
    let map = ResultMap::builder("User.ctor", "User")
        .mapping(ResultMapping::builder("name").column("name").build())
        .mapping(
            ResultMapping::builder("id")
                .column("id")
                .flag(ResultFlag::Constructor)
                .flag(ResultFlag::Id)
                .build(),
        )
        .build()
        .unwrap();

    let driver = MockDriver::new().rows(
        sql,
        &["name", "id"],
        vec![vec!["Ann".into(), Value::I64(1)]],
    );
    let factory = SessionFactory::builder()
        .driver(driver)
        .result_map(map)
        .statement(
            MappedStatement::builder("User.ctorSelect", StatementKind::Select)
                .sql(sql)
                .result_map("User.ctor")
                .build(),
        )
        .auto_commit(true)
        .build()
        .unwrap();
    let mut session = factory.session().await.unwrap();

    let list = session
        .select_list("User.ctorSelect", Value::Null)
        .await
        .unwrap();
    let keys: Vec<_> = list[0].as_record().unwrap().keys().map(str::to_string).collect();
    assert_eq!(keys, vec!["id", "name"]);
}

#[tokio::test]
async fn multi_result_set_mappings_are_rejected_explicitly() {
    let map = ResultMap::builder("User.multi", "User")
        .mapping(
            ResultMapping::builder("id")
                .column("id")
                .flag(ResultFlag::Id)
                .build(),
        )
        .mapping(
            ResultMapping::builder("orders")
                .nested_result_map("Order.map")
                .result_set("orders")
                .many()
                .build(),
        )
        .build()
        .unwrap();

    let driver = MockDriver::new().rows(
        USERS_SQL,
        &["id", "name"],
        vec![vec![Value::I64(1), "Ann".into()]],
    );
    let factory = SessionFactory::builder()
        .driver(driver)
        .result_map(order_map())
        .result_map(map)
        .statement(
            MappedStatement::builder("User.all", StatementKind::Select)
                .sql(USERS_SQL)
                .result_map("User.multi")
                .build(),
        )
        .auto_commit(true)
        .build()
        .unwrap();
    let mut session = factory.session().await.unwrap();

    let err = session
        .select_list("User.all", Value::Null)
        .await
        .unwrap_err();
    assert!(err
        .to_string()
        .contains("unsupported feature: multi-result-set mapping for property 'orders'"));
}
