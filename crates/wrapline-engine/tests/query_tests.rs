// Batched query tests

mod common;

use serde_json::json;
use wrapline_engine::{Client, QueryOptions, WrapErrorCode};

use common::{math_package, uri};

fn math_client() -> Client {
    Client::builder()
        .add_plugin(uri("wrap://test/math"), math_package())
        .build_client()
        .unwrap()
}

#[tokio::test]
async fn test_query_collects_data_and_errors() {
    let client = math_client();
    let query = r#"{
        "sum": { "method": "add", "args": { "a": "$x", "b": 2 } },
        "again": { "method": "add", "args": { "a": 10, "b": 10 } },
        "broken": { "method": "fail" },
        "lost": { "method": "add", "uri": "wrap://test/nowhere" }
    }"#;
    let options = QueryOptions::new(uri("wrap://test/math"), query).with_variable("x", json!(1));

    let result = client.query(options).await;
    assert_eq!(result.data.len(), 2);
    assert_eq!(result.errors.len(), 2);
    assert!(!result.is_ok());
    assert_eq!(result.data["sum"], json!(3));
    assert_eq!(result.data["again"], json!(20));

    let codes: Vec<WrapErrorCode> = result.errors.iter().map(|err| err.code()).collect();
    assert!(codes.contains(&WrapErrorCode::WrapperInvokeFail));
    assert!(codes.contains(&WrapErrorCode::UriNotFound));
}

#[tokio::test]
async fn test_query_selects_fields() {
    let client = math_client();
    let query = r#"{
        "info": { "method": "info", "select": { "name": true, "version": { "major": true }, "missing": true } }
    }"#;

    let result = client.query(QueryOptions::new(uri("wrap://test/math"), query)).await;
    assert!(result.is_ok());
    assert_eq!(
        result.data["info"],
        json!({ "name": "math", "version": { "major": 1 }, "missing": null })
    );
}

#[tokio::test]
async fn test_query_parse_failure_is_reported() {
    let client = math_client();

    let invalid = client.query(QueryOptions::new(uri("wrap://test/math"), "{ not json")).await;
    assert!(invalid.data.is_empty());
    assert_eq!(invalid.errors.len(), 1);
    assert_eq!(invalid.errors[0].code(), WrapErrorCode::WrapperArgsMalformed);

    let missing_variable = client
        .query(QueryOptions::new(
            uri("wrap://test/math"),
            r#"{ "sum": { "method": "add", "args": { "a": "$undefined" } } }"#,
        ))
        .await;
    assert_eq!(missing_variable.errors.len(), 1);
    assert!(missing_variable.errors[0].reason().contains("undefined"));
}

#[tokio::test]
async fn test_query_survives_module_panic() {
    let client = math_client();
    let query = r#"{
        "boom": { "method": "panic" },
        "fine": { "method": "add", "args": { "a": 1, "b": 1 } }
    }"#;

    let result = client.query(QueryOptions::new(uri("wrap://test/math"), query)).await;
    assert_eq!(result.data["fine"], json!(2));
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].code(), WrapErrorCode::WrapperInvokeFail);
}
