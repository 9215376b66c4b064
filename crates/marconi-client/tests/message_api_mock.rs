mod support;

use httpmock::Method::{DELETE, GET, POST};
use marconi_client::{MessageDraft, QueueClientError, StreamOptions};
use serde_json::json;
use support::{AUTH_TOKEN, CLIENT_ID, MockApiHarness, client_id};

#[tokio::test(flavor = "current_thread")]
async fn create_posts_json_array_with_client_id() {
    let harness = MockApiHarness::start("jclouds-test").await;
    let path = harness.messages_path();
    let resources = vec![
        harness.message_href("5292b7e6f2b6e9a87e6f41e3"),
        harness.message_href("5292b7e6f2b6e9a87e6f41e4"),
    ];
    let mock = harness
        .server
        .mock_async(|when, then| {
            when.method(POST)
                .path(path.as_str())
                .header("Client-ID", CLIENT_ID)
                .header("X-Auth-Token", AUTH_TOKEN)
                .header("Accept", "application/json")
                .header("Content-Type", "application/json")
                .json_body(json!([
                    {"ttl": 86400, "body": "{\"event\":\"BackupStarted\"}"},
                    {"ttl": 300, "body": "hello"}
                ]));
            then.status(201).json_body(json!({
                "partial": false,
                "resources": resources
            }));
        })
        .await;

    let created = harness
        .api()
        .create(
            client_id(),
            &[
                MessageDraft::new("{\"event\":\"BackupStarted\"}", 86400),
                MessageDraft::new("hello", 300),
            ],
        )
        .await
        .expect("create should succeed")
        .expect("queue should exist");

    mock.assert_async().await;
    assert_eq!(
        created.ids,
        vec!["5292b7e6f2b6e9a87e6f41e3", "5292b7e6f2b6e9a87e6f41e4"]
    );
    assert!(!created.partial);
}

#[tokio::test(flavor = "current_thread")]
async fn create_on_missing_queue_returns_none() {
    let harness = MockApiHarness::start("missing").await;
    let path = harness.messages_path();
    let mock = harness
        .server
        .mock_async(|when, then| {
            when.method(POST).path(path.as_str());
            then.status(404);
        })
        .await;

    let created = harness
        .api()
        .create(client_id(), &[MessageDraft::new("hello", 300)])
        .await
        .expect("404 should not be an error");

    mock.assert_async().await;
    assert_eq!(created, None);
}

#[tokio::test(flavor = "current_thread")]
async fn stream_sends_options_as_query_parameters() {
    let harness = MockApiHarness::start("jclouds-test").await;
    let path = harness.messages_path();
    let next = format!("{path}?marker=6244-244224-783&limit=2&echo=true");
    let first_href = harness.message_href("50b68a50d6f5b8c8a7c62b01");
    let second_href = harness.message_href("50b68a50d6f5b8c8a7c62b02");
    let mock = harness
        .server
        .mock_async(|when, then| {
            when.method(GET)
                .path(path.as_str())
                .header("Client-ID", CLIENT_ID)
                .query_param("limit", "2")
                .query_param("echo", "true")
                .query_param("marker", "6244-244224-782");
            then.status(200).json_body(json!({
                "links": [{"rel": "next", "href": next}],
                "messages": [
                    {"href": first_href, "ttl": 300, "age": 790, "body": "first"},
                    {"href": second_href, "ttl": 300, "age": 12, "body": "second"}
                ]
            }));
        })
        .await;

    let options = StreamOptions::new()
        .limit(2)
        .echo(true)
        .marker("6244-244224-782");
    let page = harness
        .api()
        .stream(client_id(), Some(&options))
        .await
        .expect("stream should succeed");

    mock.assert_async().await;
    assert_eq!(page.len(), 2);
    assert_eq!(page.messages[0].id, "50b68a50d6f5b8c8a7c62b01");
    assert_eq!(page.messages[1].body, json!("second"));
    assert_eq!(page.next_marker().as_deref(), Some("6244-244224-783"));
    let next_options = page.next_options(&options);
    assert_eq!(next_options.marker.as_deref(), Some("6244-244224-783"));
    assert_eq!(next_options.limit, Some(2));
}

#[tokio::test(flavor = "current_thread")]
async fn stream_with_no_content_is_an_empty_page() {
    let harness = MockApiHarness::start("jclouds-test").await;
    let path = harness.messages_path();
    let mock = harness
        .server
        .mock_async(|when, then| {
            when.method(GET).path(path.as_str());
            then.status(204);
        })
        .await;

    let page = harness
        .api()
        .stream(client_id(), None)
        .await
        .expect("stream should succeed");

    mock.assert_async().await;
    assert!(page.is_empty());
    assert_eq!(page.next_marker(), None);
}

#[tokio::test(flavor = "current_thread")]
async fn stream_on_missing_queue_is_an_empty_page() {
    let harness = MockApiHarness::start("missing").await;
    let path = harness.messages_path();
    harness
        .server
        .mock_async(|when, then| {
            when.method(GET).path(path.as_str());
            then.status(404);
        })
        .await;

    let page = harness
        .api()
        .stream(client_id(), None)
        .await
        .expect("404 should not be an error");
    assert!(page.is_empty());
}

#[tokio::test(flavor = "current_thread")]
async fn list_sends_comma_joined_ids() {
    let harness = MockApiHarness::start("jclouds-test").await;
    let path = harness.messages_path();
    let href = harness.message_href("52928896b04a584f24883adf");
    let mock = harness
        .server
        .mock_async(|when, then| {
            when.method(GET)
                .path(path.as_str())
                .header("Client-ID", CLIENT_ID)
                .query_param("ids", "52928896b04a584f24883adf,not-a-real-id");
            then.status(200).json_body(json!([
                {"href": href, "ttl": 300, "age": 5, "body": "kept"}
            ]));
        })
        .await;

    let messages = harness
        .api()
        .list(
            client_id(),
            ["52928896b04a584f24883adf", "not-a-real-id"],
        )
        .await
        .expect("list should succeed");

    mock.assert_async().await;
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].id, "52928896b04a584f24883adf");
}

#[tokio::test(flavor = "current_thread")]
async fn list_on_missing_queue_is_empty() {
    let harness = MockApiHarness::start("missing").await;
    let path = harness.messages_path();
    harness
        .server
        .mock_async(|when, then| {
            when.method(GET).path(path.as_str());
            then.status(404);
        })
        .await;

    let messages = harness
        .api()
        .list(client_id(), ["52928896b04a584f24883adf"])
        .await
        .expect("404 should not be an error");
    assert!(messages.is_empty());
}

#[tokio::test(flavor = "current_thread")]
async fn get_reads_message_by_path() {
    let harness = MockApiHarness::start("jclouds-test").await;
    let path = harness.message_path("50b68a50d6f5b8c8a7c62b01");
    let href = path.clone();
    let mock = harness
        .server
        .mock_async(|when, then| {
            when.method(GET)
                .path(path.as_str())
                .header("Client-ID", CLIENT_ID)
                .header("X-Auth-Token", AUTH_TOKEN);
            then.status(200).json_body(json!({
                "href": href,
                "ttl": 300,
                "age": 12,
                "body": "hello"
            }));
        })
        .await;

    let message = harness
        .api()
        .get(client_id(), "50b68a50d6f5b8c8a7c62b01")
        .await
        .expect("get should succeed")
        .expect("message should exist");

    mock.assert_async().await;
    assert_eq!(message.id, "50b68a50d6f5b8c8a7c62b01");
    assert_eq!(message.body, json!("hello"));
    assert!(message.ttl <= 300);
}

#[tokio::test(flavor = "current_thread")]
async fn get_missing_message_is_absent() {
    let harness = MockApiHarness::start("jclouds-test").await;
    let path = harness.message_path("does-not-exist");
    harness
        .server
        .mock_async(|when, then| {
            when.method(GET).path(path.as_str());
            then.status(404);
        })
        .await;

    let message = harness
        .api()
        .get(client_id(), "does-not-exist")
        .await
        .expect("404 should not be an error");
    assert_eq!(message, None);
}

#[tokio::test(flavor = "current_thread")]
async fn delete_sends_ids_and_reports_success() {
    let harness = MockApiHarness::start("jclouds-test").await;
    let path = harness.messages_path();
    let mock = harness
        .server
        .mock_async(|when, then| {
            when.method(DELETE)
                .path(path.as_str())
                .header("Client-ID", CLIENT_ID)
                .query_param("ids", "52928896b04a584f24883adf,52928896b04a584f24883ae0");
            then.status(204);
        })
        .await;

    let deleted = harness
        .api()
        .delete(
            client_id(),
            vec![
                "52928896b04a584f24883adf".to_string(),
                "52928896b04a584f24883ae0".to_string(),
            ],
        )
        .await
        .expect("delete should succeed");

    mock.assert_async().await;
    assert!(deleted);
}

#[tokio::test(flavor = "current_thread")]
async fn delete_on_missing_queue_is_false() {
    let harness = MockApiHarness::start("missing").await;
    let path = harness.messages_path();
    harness
        .server
        .mock_async(|when, then| {
            when.method(DELETE).path(path.as_str());
            then.status(404);
        })
        .await;

    let deleted = harness
        .api()
        .delete(client_id(), ["52928896b04a584f24883adf"])
        .await
        .expect("404 should not be an error");
    assert!(!deleted);
}

#[tokio::test(flavor = "current_thread")]
async fn server_error_propagates_as_status() {
    let harness = MockApiHarness::start("jclouds-test").await;
    let path = harness.messages_path();
    harness
        .server
        .mock_async(|when, then| {
            when.method(GET).path(path.as_str());
            then.status(500).body("internal error");
        })
        .await;

    let error = harness
        .api()
        .stream(client_id(), None)
        .await
        .unwrap_err();
    assert!(matches!(
        error,
        QueueClientError::Status { status: 500, ref body } if body == "internal error"
    ));
}

#[tokio::test(flavor = "current_thread")]
async fn malformed_body_propagates_as_decode_error() {
    let harness = MockApiHarness::start("jclouds-test").await;
    let path = harness.message_path("m1");
    harness
        .server
        .mock_async(|when, then| {
            when.method(GET).path(path.as_str());
            then.status(200).body("<html>not json</html>");
        })
        .await;

    let error = harness.api().get(client_id(), "m1").await.unwrap_err();
    assert!(matches!(error, QueueClientError::Decode(_)));
}

#[tokio::test(flavor = "current_thread")]
async fn unreachable_endpoint_is_a_transport_error() {
    let api = marconi_client::MessageApi::new(
        std::sync::Arc::new(marconi_client::ReqwestTransport::new()),
        "http://127.0.0.1:1/v1",
        "jclouds-test",
    );
    let error = api.stream(client_id(), None).await.unwrap_err();
    assert!(matches!(error, QueueClientError::Transport(_)));
}

#[tokio::test(flavor = "current_thread")]
async fn chained_stream_sends_decoded_marker_from_next_link() {
    let harness = MockApiHarness::start("jclouds-test").await;
    let path = harness.messages_path();
    let next = format!("{path}?marker=a%2Bb&limit=2");
    let href = harness.message_href("50b68a50d6f5b8c8a7c62b01");
    let first = harness
        .server
        .mock_async(|when, then| {
            when.method(GET)
                .path(path.as_str())
                .query_param("marker", "start")
                .query_param("limit", "2");
            then.status(200).json_body(json!({
                "links": [{"rel": "next", "href": next}],
                "messages": [{"href": href, "ttl": 300, "age": 1, "body": "first"}]
            }));
        })
        .await;
    let second = harness
        .server
        .mock_async(|when, then| {
            when.method(GET)
                .path(path.as_str())
                .query_param("marker", "a+b")
                .query_param("limit", "2");
            then.status(204);
        })
        .await;

    let api = harness.api();
    let options = StreamOptions::new().limit(2).marker("start");
    let page = api
        .stream(client_id(), Some(&options))
        .await
        .expect("first page should succeed");
    assert_eq!(page.next_marker().as_deref(), Some("a+b"));

    let rest = api
        .stream(client_id(), Some(&page.next_options(&options)))
        .await
        .expect("second page should succeed");

    first.assert_async().await;
    second.assert_async().await;
    assert!(rest.is_empty());
}
