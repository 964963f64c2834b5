//! Request-shape tests for the Elasticsearch-backed store, against a mock HTTP server

use article_index::config::{Config, ElasticsearchConfig};
use article_index::engine::{EndpointOutcome, HttpEngine};
use article_index::error::AppError;
use article_index::models::Article;
use article_index::provision::Provisioner;
use article_index::search::{ArticleQueryBuilder, SearchQuery};
use article_index::store::{
    connect_store, create_store, ArticleStore, EngineArticleStore, StoreTargets,
};
use chrono::{TimeZone, Utc};
use mockito::{Matcher, Server, ServerGuard};
use reqwest::Url;
use serde_json::json;
use std::sync::Arc;

fn engine_for(server: &ServerGuard) -> Arc<HttpEngine> {
    let url = Url::parse(&server.url()).unwrap();
    Arc::new(HttpEngine::new(vec![url], 5).unwrap())
}

fn store_for(server: &ServerGuard) -> EngineArticleStore<HttpEngine> {
    EngineArticleStore::new(
        engine_for(server),
        StoreTargets::new(
            Some("articles-w".to_string()),
            ["articles-a", "articles-b"],
        ),
    )
}

fn create_test_article(id: u32) -> Article {
    Article::builder()
        .url(format!("https://example.com/posts/{}", id))
        .title(format!("Post {}", id))
        .author("Jane Doe")
        .published(Utc.with_ymd_and_hms(2024, 2, id, 9, 0, 0).unwrap())
        .tag_pair("rust", "topic")
        .build()
}

#[tokio::test]
async fn test_index_puts_document_under_its_url() {
    let mut server = Server::new_async().await;
    let article = create_test_article(1);

    let mock = server
        .mock(
            "PUT",
            Matcher::Regex(r"^/articles-w/_doc/https:%2F%2Fexample\.com%2Fposts%2F1$".to_string()),
        )
        .match_body(Matcher::Json(article.to_document().unwrap()))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(r#"{"_id":"https://example.com/posts/1","result":"created"}"#)
        .create_async()
        .await;

    store_for(&server).index(&article).await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_engine_error_is_propagated() {
    let mut server = Server::new_async().await;

    let _mock = server
        .mock("PUT", Matcher::Any)
        .with_status(400)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "error": {
                    "type": "mapper_parsing_exception",
                    "reason": "failed to parse field [published]"
                },
                "status": 400
            })
            .to_string(),
        )
        .create_async()
        .await;

    let err = store_for(&server)
        .index(&create_test_article(1))
        .await
        .unwrap_err();

    match err {
        AppError::Engine { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "failed to parse field [published]");
        }
        other => panic!("expected engine error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_search_request_shape_and_hit_mapping() {
    let mut server = Server::new_async().await;
    let article = create_test_article(1);

    let expected_body = json!({
        "query": {
            "multi_match": {
                "query": "rust",
                "fields": ["URL", "content", "author", "title", "description", "source"]
            }
        },
        "post_filter": {
            "bool": { "filter": [{ "term": { "author.raw": "Jane Doe" } }] }
        },
        "from": 5,
        "size": 5
    });

    let mock = server
        .mock("POST", "/articles-a,articles-b/_search")
        .match_query(Matcher::UrlEncoded(
            "search_type".to_string(),
            "dfs_query_then_fetch".to_string(),
        ))
        .match_body(Matcher::Json(expected_body))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "took": 4,
                "hits": {
                    "total": { "value": 2, "relation": "eq" },
                    "max_score": 2.5,
                    "hits": [
                        {
                            "_index": "articles-a",
                            "_id": article.url,
                            "_score": 2.5,
                            "_source": article.to_document().unwrap()
                        },
                        {
                            "_index": "articles-b",
                            "_id": "legacy",
                            "_score": 1.0,
                            "_source": { "URL": "legacy", "published": "yesterday" }
                        }
                    ]
                }
            })
            .to_string(),
        )
        .create_async()
        .await;

    let query = ArticleQueryBuilder::new()
        .with_default_fields()
        .with_search_term("rust")
        .with_author("Jane Doe")
        .with_from(5)
        .with_limit(5)
        .build();
    let hits = store_for(&server).search(&query).await.unwrap();

    mock.assert_async().await;
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, article.url);
    assert_eq!(hits[0].search_score, 2.5);
    assert_eq!(hits[0].article, article);
}

#[tokio::test]
async fn test_match_all_request() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("POST", "/articles-a,articles-b/_search")
        .match_query(Matcher::Any)
        .match_body(Matcher::Json(json!({
            "query": { "match_all": {} },
            "from": 0,
            "size": 10
        })))
        .with_status(200)
        .with_body(r#"{"hits":{"hits":[]}}"#)
        .create_async()
        .await;

    let hits = store_for(&server)
        .search(&SearchQuery::match_all())
        .await
        .unwrap();

    mock.assert_async().await;
    assert!(hits.is_empty());
}

#[tokio::test]
async fn test_query_string_request() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("POST", "/articles-a,articles-b/_search")
        .match_query(Matcher::Any)
        .match_body(Matcher::Json(json!({
            "query": { "simple_query_string": { "query": "rust +async" } }
        })))
        .with_status(200)
        .with_body(r#"{"hits":{"hits":[]}}"#)
        .create_async()
        .await;

    store_for(&server)
        .search_query_string("rust +async")
        .await
        .unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_bulk_partial_failure() {
    let mut server = Server::new_async().await;
    let articles: Vec<Article> = (1..=3).map(create_test_article).collect();

    let mock = server
        .mock("POST", "/_bulk")
        .match_header("content-type", "application/x-ndjson")
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#""_index":"articles-w""#.to_string()),
            Matcher::Regex(r#""_id":"https://example.com/posts/3""#.to_string()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "took": 7,
                "errors": true,
                "items": [
                    { "index": { "_index": "articles-w", "_id": "https://example.com/posts/1", "status": 201, "result": "created" } },
                    { "index": {
                        "_index": "articles-w",
                        "_id": "https://example.com/posts/2",
                        "status": 400,
                        "error": { "type": "mapper_parsing_exception", "reason": "failed to parse field [published]" }
                    } },
                    { "index": { "_index": "articles-w", "_id": "https://example.com/posts/3", "status": 200, "result": "updated" } }
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let report = store_for(&server).index_all(&articles).await.unwrap();

    mock.assert_async().await;
    assert_eq!(report.total, 3);
    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].position, 1);
    assert_eq!(report.failures[0].id, "https://example.com/posts/2");
    assert_eq!(report.failures[0].reason, "failed to parse field [published]");
}

#[tokio::test]
async fn test_delete_missing_document_succeeds() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("DELETE", "/articles-w/_doc/gone")
        .with_status(404)
        .with_body(r#"{"_id":"gone","result":"not_found"}"#)
        .create_async()
        .await;

    store_for(&server).delete("gone").await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_delete_from_missing_index_fails() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("DELETE", "/articles-w/_doc/gone")
        .with_status(404)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"error":{"type":"index_not_found_exception","reason":"no such index [articles-w]"},"status":404}"#,
        )
        .create_async()
        .await;

    let err = store_for(&server).delete("gone").await.unwrap_err();
    mock.assert_async().await;
    match err {
        AppError::Engine { status, message } => {
            assert_eq!(status, 404);
            assert!(message.contains("no such index [articles-w]"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_targets_make_no_request() {
    let mut server = Server::new_async().await;

    let mut mocks = Vec::new();
    for method in ["POST", "PUT", "DELETE"] {
        mocks.push(
            server
                .mock(method, Matcher::Any)
                .expect(0)
                .create_async()
                .await,
        );
    }

    let store = EngineArticleStore::new(engine_for(&server), StoreTargets::default());
    assert!(matches!(
        store.search(&SearchQuery::match_all()).await,
        Err(AppError::Configuration(_))
    ));
    assert!(matches!(
        store.index_all(&[create_test_article(1)]).await,
        Err(AppError::Configuration(_))
    ));
    assert!(matches!(store.delete("x").await, Err(AppError::Configuration(_))));

    for mock in mocks {
        mock.assert_async().await;
    }
}

#[tokio::test]
async fn test_connect_reports_each_endpoint() {
    let mut server = Server::new_async().await;

    let probe = server
        .mock("GET", "/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"name":"node-1","cluster_name":"rss-cluster","version":{"number":"7.17.0"}}"#)
        .create_async()
        .await;

    let config = ElasticsearchConfig {
        cluster_name: Some("rss-cluster".to_string()),
        endpoints: vec![
            server.host_with_port(),
            "http://".to_string(),
            "127.0.0.1:1".to_string(),
        ],
        ..Default::default()
    };

    let (engine, statuses) = HttpEngine::connect(&config).await.unwrap();

    probe.assert_async().await;
    assert_eq!(statuses.len(), 3);
    assert!(statuses[0].is_connected());
    assert!(matches!(statuses[1].outcome, EndpointOutcome::Invalid { .. }));
    assert!(matches!(statuses[2].outcome, EndpointOutcome::Unreachable { .. }));
    assert_eq!(engine.endpoints().len(), 1);
}

#[tokio::test]
async fn test_connect_rejects_other_cluster() {
    let mut server = Server::new_async().await;

    let _probe = server
        .mock("GET", "/")
        .with_status(200)
        .with_body(r#"{"cluster_name":"someone-else"}"#)
        .create_async()
        .await;

    let config = ElasticsearchConfig {
        cluster_name: Some("rss-cluster".to_string()),
        endpoints: vec![server.host_with_port()],
        ..Default::default()
    };

    let result = HttpEngine::connect(&config).await;
    assert!(matches!(result, Err(AppError::Network(_))));
}

#[tokio::test]
async fn test_connect_without_endpoints() {
    let config = ElasticsearchConfig {
        endpoints: vec![],
        ..Default::default()
    };

    let result = HttpEngine::connect(&config).await;
    assert!(matches!(result, Err(AppError::Configuration(_))));
}

#[tokio::test]
async fn test_create_store_from_config() {
    let mut server = Server::new_async().await;

    let probe = server
        .mock("GET", "/")
        .with_status(200)
        .with_body(r#"{"cluster_name":"rss-cluster"}"#)
        .create_async()
        .await;
    let delete = server
        .mock("DELETE", "/articles-w/_doc/x")
        .with_status(200)
        .with_body(r#"{"result":"deleted"}"#)
        .create_async()
        .await;

    let config = Config::from_toml_str(&format!(
        r#"
        [elasticsearch]
        cluster_name = "rss-cluster"
        endpoints = "{}"
        write_index = "articles-w"
        search_indices = "articles-a, articles-b"
        "#,
        server.host_with_port()
    ))
    .unwrap();

    let store = create_store(&config).await.unwrap();
    store.delete("x").await.unwrap();

    probe.assert_async().await;
    delete.assert_async().await;
}

#[tokio::test]
async fn test_connect_store_reports_endpoint_statuses() {
    let mut server = Server::new_async().await;

    let probe = server
        .mock("GET", "/")
        .with_status(200)
        .with_body(r#"{"cluster_name":"rss-cluster"}"#)
        .create_async()
        .await;

    let config = Config::from_toml_str(&format!(
        r#"
        [elasticsearch]
        endpoints = "{}, 127.0.0.1:1"
        write_index = "articles-w"
        search_indices = "articles-a"
        "#,
        server.host_with_port()
    ))
    .unwrap();

    let (_store, statuses) = connect_store(&config).await.unwrap();

    probe.assert_async().await;
    assert_eq!(statuses.len(), 2);
    assert_eq!(statuses[0].endpoint, server.host_with_port());
    assert!(statuses[0].is_connected());
    assert!(matches!(statuses[1].outcome, EndpointOutcome::Unreachable { .. }));
}

#[tokio::test]
async fn test_provision_creates_missing_index() {
    let mut server = Server::new_async().await;

    let exists = server
        .mock("HEAD", "/articles-w")
        .with_status(404)
        .create_async()
        .await;
    let create = server
        .mock("PUT", "/articles-w")
        .match_body(Matcher::PartialJson(json!({
            "mappings": {
                "properties": {
                    "tags": { "type": "nested" },
                    "author": { "fields": { "raw": { "type": "keyword" } } }
                }
            }
        })))
        .with_status(200)
        .with_body(r#"{"acknowledged":true,"shards_acknowledged":true,"index":"articles-w"}"#)
        .create_async()
        .await;

    Provisioner::new(engine_for(&server))
        .provision("articles-w", false)
        .await
        .unwrap();

    exists.assert_async().await;
    create.assert_async().await;
}

#[tokio::test]
async fn test_provision_existing_index() {
    let mut server = Server::new_async().await;

    let _exists = server
        .mock("HEAD", "/articles-w")
        .with_status(200)
        .expect_at_least(1)
        .create_async()
        .await;
    let drop = server
        .mock("DELETE", "/articles-w")
        .with_status(200)
        .with_body(r#"{"acknowledged":true}"#)
        .create_async()
        .await;
    let create = server
        .mock("PUT", "/articles-w")
        .with_status(200)
        .with_body(r#"{"acknowledged":true}"#)
        .create_async()
        .await;

    let provisioner = Provisioner::new(engine_for(&server));

    let err = provisioner.provision("articles-w", false).await.unwrap_err();
    assert!(matches!(err, AppError::Configuration(_)));

    provisioner.provision("articles-w", true).await.unwrap();
    drop.assert_async().await;
    create.assert_async().await;
}
