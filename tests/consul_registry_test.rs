//! Consul 注册客户端集成测试
//!
//! 使用 mockito 模拟 Consul agent HTTP API。

use consul_entrypoint::{
    ConsulRegistry, EntrypointError, ErrorCategory, HealthCheck, HealthCheckProtocol,
    ServiceRegistration, ServiceRegistry,
};
use mockito::{Matcher, Server};
use serde_json::json;
use std::collections::BTreeSet;
use std::time::Duration;

fn registration() -> ServiceRegistration {
    ServiceRegistration {
        id: "app-web-1".to_string(),
        name: "app".to_string(),
        address: "172.18.0.4".to_string(),
        port: 8000,
        tags: BTreeSet::from(["api".to_string(), "python".to_string()]),
        health_check: HealthCheck::for_target(
            HealthCheckProtocol::Http,
            "172.18.0.4",
            8000,
            "/",
            Duration::from_secs(10),
            Duration::from_secs(1),
        ),
    }
}

#[tokio::test]
async fn test_register_puts_service_definition() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("PUT", "/v1/agent/service/register")
        .match_body(Matcher::Json(json!({
            "ID": "app-web-1",
            "Name": "app",
            "Tags": ["api", "python"],
            "Address": "172.18.0.4",
            "Port": 8000,
            "Check": {
                "HTTP": "http://172.18.0.4:8000/",
                "Interval": "10s",
                "Timeout": "1s"
            }
        })))
        .with_status(200)
        .create_async()
        .await;

    let registry = ConsulRegistry::new(server.url(), None, None).unwrap();
    registry.register(&registration()).await.unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_repeated_register_is_identical_upsert() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("PUT", "/v1/agent/service/register")
        .match_body(Matcher::PartialJson(json!({ "ID": "app-web-1" })))
        .with_status(200)
        .expect(3)
        .create_async()
        .await;

    let registry = ConsulRegistry::new(server.url(), None, None).unwrap();
    let reg = registration();
    for _ in 0..3 {
        registry.register(&reg).await.unwrap();
    }

    mock.assert_async().await;
}

#[tokio::test]
async fn test_register_sends_acl_token() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("PUT", "/v1/agent/service/register")
        .match_header("x-consul-token", "secret")
        .with_status(200)
        .create_async()
        .await;

    let registry = ConsulRegistry::new(server.url(), Some("secret".to_string()), None).unwrap();
    registry.register(&registration()).await.unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_non_success_status_is_rejection() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("PUT", "/v1/agent/service/register")
        .with_status(400)
        .with_body("Invalid check: Interval must be > 0\n")
        .create_async()
        .await;

    let registry = ConsulRegistry::new(server.url(), None, None).unwrap();
    let err = registry.register(&registration()).await.unwrap_err();

    mock.assert_async().await;
    match err {
        EntrypointError::RegistryRejected { status, body } => {
            assert_eq!(status, 400);
            assert_eq!(body, "Invalid check: Interval must be > 0");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_unreachable_registry() {
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };

    let registry = ConsulRegistry::new(format!("http://{}", addr), None, None).unwrap();
    let err = registry.register(&registration()).await.unwrap_err();

    assert_eq!(err.category(), ErrorCategory::RegistryUnreachable);
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_request_timeout_counts_as_unreachable() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    // 接受连接但从不响应
    let _hold = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let registry = ConsulRegistry::new(
        format!("http://{}", addr),
        None,
        Some(Duration::from_millis(200)),
    )
    .unwrap();
    let err = registry.register(&registration()).await.unwrap_err();

    assert_eq!(err.category(), ErrorCategory::RegistryUnreachable);
}

#[tokio::test]
async fn test_deregister() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("PUT", "/v1/agent/service/deregister/app-web-1")
        .with_status(200)
        .create_async()
        .await;

    let registry = ConsulRegistry::new(server.url(), None, None).unwrap();
    registry.deregister("app-web-1").await.unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_deregister_encodes_service_id() {
    let mut server = Server::new_async().await;
    let encoded = server
        .mock("PUT", "/v1/agent/service/deregister/web%2F1%3Fx")
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    let registry = ConsulRegistry::new(server.url(), None, None).unwrap();
    registry.deregister("web/1?x").await.unwrap();

    encoded.assert_async().await;
}
