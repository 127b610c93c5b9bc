//! HTTP transport tests against a local mock server.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use sitesearch_core::request::Filters;
use sitesearch_core::{
    EngineConfig, HttpProviderConfig, HttpTransport, ProviderKind, ProviderQuery,
    ProviderSelection, ProviderTransport, SearchCoordinator, SearchParams, StaticTenants,
    TenantConfig, Total, TransportError,
};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn query(text: &str, offset: u64, limit: u32) -> ProviderQuery {
    ProviderQuery {
        tenant: "nasa".into(),
        query: text.into(),
        offset,
        limit,
        filters: Filters::default(),
        enable_highlighting: true,
        geoip_info: None,
    }
}

fn transport(kind: ProviderKind, server: &MockServer, route: &str) -> HttpTransport {
    let config = HttpProviderConfig {
        endpoint: format!("{}{route}", server.uri()),
        api_key: Some("secret-key".into()),
        api_key_header: Some("Ocp-Apim-Subscription-Key".into()),
        tracking_header: Some("BingAPIs-TraceId".into()),
    };
    HttpTransport::new(kind, config, Duration::from_secs(2)).expect("transport")
}

#[tokio::test]
async fn sends_params_and_key_and_reads_tracking_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v7.0/search"))
        .and(query_param("q", "mars rover"))
        .and(query_param("count", "10"))
        .and(query_param("offset", "20"))
        .and(header("Ocp-Apim-Subscription-Key", "secret-key"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("BingAPIs-TraceId", "trace-123")
                .set_body_json(json!({"webPages": {"totalEstimatedMatches": 0, "value": []}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let web = transport(ProviderKind::WebApi, &server, "/v7.0/search");
    let payload = web.send(&query("mars rover", 20, 10)).await.expect("payload");
    assert_eq!(payload.tracking.as_deref(), Some("trace-123"));
    assert_eq!(payload.body["webPages"]["totalEstimatedMatches"], 0);
}

#[tokio::test]
async fn local_index_params_carry_tenant_handle() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/search"))
        .and(query_param("query", "moon"))
        .and(query_param("handle", "nasa"))
        .and(query_param("size", "20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "metadata": {"total": 0},
            "results": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let local = transport(ProviderKind::LocalIndex, &server, "/api/v1/search");
    let payload = local.send(&query("moon", 0, 20)).await.expect("payload");
    assert!(payload.tracking.is_none());
}

#[tokio::test]
async fn non_success_status_is_reported_with_code() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let web = transport(ProviderKind::WebApi, &server, "/v7.0/search");
    let err = web.send(&query("mars", 0, 10)).await.unwrap_err();
    assert!(matches!(err, TransportError::Status { code: 401, .. }));
    assert!(!err.is_transient());
}

#[tokio::test]
async fn invalid_json_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let web = transport(ProviderKind::WebApi, &server, "/v7.0/search");
    let err = web.send(&query("mars", 0, 10)).await.unwrap_err();
    assert!(matches!(err, TransportError::Malformed(_)), "got {err:?}");
}

#[tokio::test]
async fn refused_connection_is_transient() {
    // Bind then drop a listener so the port is known to be closed.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        listener.local_addr().expect("addr").port()
    };
    let config = HttpProviderConfig {
        endpoint: format!("http://127.0.0.1:{port}/search"),
        ..Default::default()
    };
    let web = HttpTransport::new(ProviderKind::WebApi, config, Duration::from_secs(1))
        .expect("transport");
    let err = web.send(&query("mars", 0, 10)).await.unwrap_err();
    assert!(matches!(err, TransportError::Connection(_)), "got {err:?}");
    assert!(err.is_transient());
}

#[tokio::test]
async fn blended_search_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v7.0/search"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("BingAPIs-TraceId", "trace-9")
                .set_body_json(json!({
                    "webPages": {
                        "totalEstimatedMatches": 2,
                        "value": [
                            {"name": "Mars \u{e000}rover\u{e001}", "url": "https://www.nasa.gov/rover", "snippet": "Rover news"},
                            {"name": "Mars facts", "url": "https://www.nasa.gov/facts.pdf", "snippet": "Facts"}
                        ]
                    }
                })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "metadata": {"total": 1},
            "results": [
                {"title": "Rover archive", "path": "https://archive.nasa.gov/rover", "snippet": "Old rovers"}
            ]
        })))
        .mount(&server)
        .await;

    let search = SearchCoordinator::new(
        EngineConfig::default(),
        Arc::new(StaticTenants::new([TenantConfig::new(
            "nasa",
            ProviderSelection::Blended,
        )])),
        transport(ProviderKind::WebApi, &server, "/v7.0/search"),
        transport(ProviderKind::LocalIndex, &server, "/api/v1/search"),
    )
    .expect("coordinator");

    let response = search
        .search(&SearchParams::new("nasa", "mars rover"))
        .await
        .expect("search");
    assert_eq!(response.total, Total::Exact(3));
    assert_eq!(response.results.len(), 3);
    assert_eq!(response.results[0].title, "Mars <strong>rover</strong>");
    assert_eq!(response.results[1].file_type.map(|t| t.extension()), Some("pdf"));
    assert_eq!(response.results[2].url, "https://archive.nasa.gov/rover");
    assert_eq!(response.diagnostics.tracking_information.as_deref(), Some("trace-9"));
}
