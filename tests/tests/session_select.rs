use tests::{record, MockDriver};

use saddle::result::ListResultHandler;
use saddle::{
    mapping::{ResultFlag, StatementKind},
    DuplicateKeyPolicy, MappedStatement, ResultMap, ResultMapping, RowBounds, SessionFactory,
    Value,
};

const FIND_SQL: &str = "SELECT id, name FROM users WHERE id = ?";
const ALL_SQL: &str = "SELECT id, name FROM users";

fn user_map() -> ResultMap {
    ResultMap::builder("User.userMap", "User")
        .mapping(
            ResultMapping::builder("id")
                .column("id")
                .flag(ResultFlag::Id)
                .build(),
        )
        .mapping(ResultMapping::builder("name").column("name").build())
        .build()
        .unwrap()
}

fn factory(driver: MockDriver) -> SessionFactory {
    SessionFactory::builder()
        .driver(driver)
        .result_map(user_map())
        .statement(
            MappedStatement::builder("User.findById", StatementKind::Select)
                .sql(FIND_SQL)
                .param("id")
                .result_map("User.userMap")
                .build(),
        )
        .statement(
            MappedStatement::builder("User.all", StatementKind::Select)
                .sql(ALL_SQL)
                .result_map("User.userMap")
                .build(),
        )
        .auto_commit(true)
        .build()
        .unwrap()
}

fn ann() -> Vec<Value> {
    vec![Value::I64(7), "Ann".into()]
}

#[tokio::test]
async fn select_one_returns_none_for_zero_rows() {
    let driver = MockDriver::new().rows(FIND_SQL, &["id", "name"], vec![]);
    let factory = factory(driver);
    let mut session = factory.session().await.unwrap();

    let result = session.select_one("User.findById", 7i64).await.unwrap();
    assert_eq!(result, None);
}

#[tokio::test]
async fn select_one_returns_the_single_row() {
    let driver = MockDriver::new().rows(FIND_SQL, &["id", "name"], vec![ann()]);
    let factory = factory(driver);
    let mut session = factory.session().await.unwrap();

    let result = session.select_one("User.findById", 7i64).await.unwrap();
    assert_eq!(
        result,
        Some(record(vec![("id", Value::I64(7)), ("name", "Ann".into())]))
    );
}

#[tokio::test]
async fn select_one_fails_naming_the_count() {
    let driver = MockDriver::new().rows(
        FIND_SQL,
        &["id", "name"],
        vec![ann(), ann(), ann()],
    );
    let factory = factory(driver);
    let mut session = factory.session().await.unwrap();

    let err = session.select_one("User.findById", 7i64).await.unwrap_err();
    assert!(err.is_too_many_results());
    assert!(err.to_string().contains("found: 3"));
}

#[tokio::test]
async fn select_list_maps_every_row() {
    let driver = MockDriver::new().rows(
        ALL_SQL,
        &["id", "name"],
        vec![
            vec![Value::I64(1), "Ann".into()],
            vec![Value::I64(2), "Bob".into()],
        ],
    );
    let factory = factory(driver);
    let mut session = factory.session().await.unwrap();

    let list = session.select_list("User.all", Value::Null).await.unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(
        list[1],
        record(vec![("id", Value::I64(2)), ("name", "Bob".into())])
    );
}

#[tokio::test]
async fn row_bounds_window_the_result() {
    let driver = MockDriver::new().rows(
        ALL_SQL,
        &["id", "name"],
        vec![
            vec![Value::I64(1), "Ann".into()],
            vec![Value::I64(2), "Bob".into()],
            vec![Value::I64(3), "Cay".into()],
        ],
    );
    let factory = factory(driver);
    let mut session = factory.session().await.unwrap();

    let list = session
        .select_list_bounds("User.all", Value::Null, RowBounds::new(1, 1))
        .await
        .unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(
        list[0],
        record(vec![("id", Value::I64(2)), ("name", "Bob".into())])
    );
}

#[tokio::test]
async fn select_map_keys_rows_by_property() {
    let driver = MockDriver::new().rows(
        ALL_SQL,
        &["id", "name"],
        vec![
            vec![Value::I64(1), "Ann".into()],
            vec![Value::I64(2), "Bob".into()],
        ],
    );
    let factory = factory(driver);
    let mut session = factory.session().await.unwrap();

    let map = session
        .select_map("User.all", Value::Null, "id")
        .await
        .unwrap();
    assert_eq!(map.len(), 2);
    assert_eq!(
        map[&Value::I64(1)],
        record(vec![("id", Value::I64(1)), ("name", "Ann".into())])
    );
}

#[tokio::test]
async fn select_map_overwrites_duplicate_keys_by_default() {
    let driver = MockDriver::new().rows(
        ALL_SQL,
        &["id", "name"],
        vec![
            vec![Value::I64(1), "Ann".into()],
            vec![Value::I64(1), "Bob".into()],
        ],
    );
    let factory = factory(driver);
    let mut session = factory.session().await.unwrap();

    let map = session
        .select_map("User.all", Value::Null, "id")
        .await
        .unwrap();
    assert_eq!(map.len(), 1);
    assert_eq!(
        map[&Value::I64(1)],
        record(vec![("id", Value::I64(1)), ("name", "Bob".into())])
    );
}

#[tokio::test]
async fn select_map_strict_fails_on_duplicate_keys() {
    let driver = MockDriver::new().rows(
        ALL_SQL,
        &["id", "name"],
        vec![
            vec![Value::I64(1), "Ann".into()],
            vec![Value::I64(1), "Bob".into()],
        ],
    );
    let factory = factory(driver);
    let mut session = factory.session().await.unwrap();

    let err = session
        .select_map_with(
            "User.all",
            Value::Null,
            "id",
            RowBounds::DEFAULT,
            DuplicateKeyPolicy::Strict,
        )
        .await
        .unwrap_err();
    assert!(err.is_binding());
    assert!(err.to_string().contains("duplicate key '1'"));
}

#[tokio::test]
async fn select_with_handler_streams_rows_and_returns_nothing() {
    let driver = MockDriver::new().rows(
        ALL_SQL,
        &["id", "name"],
        vec![
            vec![Value::I64(1), "Ann".into()],
            vec![Value::I64(2), "Bob".into()],
        ],
    );
    let log = driver.log();
    let factory = factory(driver);
    let mut session = factory.session().await.unwrap();

    let mut handler = ListResultHandler::new();
    session
        .select("User.all", Value::Null, RowBounds::DEFAULT, &mut handler)
        .await
        .unwrap();
    assert_eq!(handler.into_list().len(), 2);

    // Handler selects bypass the cache in both directions: a later plain
    // select must hit the driver again.
    session.select_list("User.all", Value::Null).await.unwrap();
    assert_eq!(log.execs_of(ALL_SQL), 2);
}

#[tokio::test]
async fn unknown_statement_is_an_error_with_context() {
    let factory = factory(MockDriver::new());
    let mut session = factory.session().await.unwrap();

    let err = session
        .select_list("User.missing", Value::Null)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("unknown statement: User.missing"));
    assert!(err
        .to_string()
        .contains("error querying database; statement=User.missing"));
}
