mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::Value;

#[tokio::test]
async fn health_endpoint_reports_store() -> Result<()> {
    let server = common::TestServer::spawn().await?;

    let (status, body) = server.get_json("/health", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["store"], "memory");
    Ok(())
}

#[tokio::test]
async fn root_lists_resources() -> Result<()> {
    let server = common::TestServer::spawn().await?;

    let (status, body) = server.get_json("/", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "TuneHub API");
    assert!(body["endpoints"]["playlists"].is_array());
    Ok(())
}

#[tokio::test]
async fn unmatched_route_is_page_not_found() -> Result<()> {
    let server = common::TestServer::spawn().await?;

    let (status, body) = server.get_json("/api/nothing/here", None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Page not found");
    Ok(())
}

#[tokio::test]
async fn guarded_route_without_token_is_unauthorized() -> Result<()> {
    let server = common::TestServer::spawn().await?;

    let res = server
        .client
        .post(server.url("/api/playlists"))
        .json(&serde_json::json!({ "name": "Mix" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await?;
    assert_eq!(body["message"], "Auth failed");

    let res = server
        .client
        .get(server.url("/api/users"))
        .bearer_auth("not.a.token")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn malformed_json_is_a_validation_error() -> Result<()> {
    let server = common::TestServer::spawn().await?;

    let res = server
        .client
        .post(server.url("/api/users/login"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = res.json().await?;
    assert_eq!(body["code"], "VALIDATION_ERROR");
    Ok(())
}

#[tokio::test]
async fn cors_preflight_is_answered() -> Result<()> {
    let server = common::TestServer::spawn().await?;

    let res = server
        .client
        .request(reqwest::Method::OPTIONS, server.url("/api/audios"))
        .header("origin", "http://localhost:3000")
        .header("access-control-request-method", "PATCH")
        .header("access-control-request-headers", "authorization")
        .send()
        .await?;

    assert!(res.status().is_success());
    assert_eq!(
        res.headers().get("access-control-allow-origin").and_then(|v| v.to_str().ok()),
        Some("*")
    );
    Ok(())
}
