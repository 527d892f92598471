mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::{text, TestServer, PASSWORD};

#[tokio::test]
async fn signup_creates_user_with_liked_playlist() -> Result<()> {
    let server = TestServer::spawn().await?;

    let body = server.signup("Ann", "ann@example.com").await?;
    assert_eq!(body["role"], "user");
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
    let user_id = text(&body["userId"]);
    let token = text(&body["token"]);

    let (status, body) = server
        .get_json(&format!("/api/playlists/user/{}", user_id), Some(&token))
        .await?;
    assert_eq!(status, StatusCode::OK);
    let playlists = body["userPlaylists"].as_array().cloned().unwrap_or_default();
    assert_eq!(playlists.len(), 1);
    assert_eq!(playlists[0]["name"], "Liked");
    assert_eq!(playlists[0]["tracks"], json!([]));
    assert_eq!(server.files_in("pictures"), 1);
    Ok(())
}

#[tokio::test]
async fn user_view_hides_password() -> Result<()> {
    let server = TestServer::spawn().await?;
    let body = server.signup("Ann", "ann@example.com").await?;

    let (status, body) = server
        .get_json(&format!("/api/users/{}", text(&body["userId"])), None)
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "ann@example.com");
    assert!(body["user"].get("password").is_none());
    assert!(text(&body["user"]["image"]).starts_with("uploads/pictures/"));
    Ok(())
}

#[tokio::test]
async fn duplicate_email_is_rejected_without_side_effects() -> Result<()> {
    let server = TestServer::spawn().await?;
    let admin = server.admin().await?;
    server.signup("Ann", "ann@example.com").await?;

    let res = server.signup_response("Other Ann", "ANN@example.com", PASSWORD).await?;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = res.json().await?;
    assert_eq!(body["message"], "User already exists");

    let (_, body) = server.get_json("/api/users", Some(&text(&admin["token"]))).await?;
    assert_eq!(body["users"].as_array().map(Vec::len), Some(2));
    // Only the two successful signups left a picture behind
    assert_eq!(server.files_in("pictures"), 2);
    Ok(())
}

#[tokio::test]
async fn signup_validates_inputs() -> Result<()> {
    let server = TestServer::spawn().await?;

    let short = server.signup_response("Ann", "ann@example.com", "short").await?;
    assert_eq!(short.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let bad_email = server.signup_response("Ann", "ann-at-example", PASSWORD).await?;
    assert_eq!(bad_email.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let no_name = server.signup_response("", "ann@example.com", PASSWORD).await?;
    assert_eq!(no_name.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let no_image = server
        .client
        .post(server.url("/api/users/signup"))
        .multipart(
            reqwest::multipart::Form::new()
                .text("name", "Ann")
                .text("email", "ann@example.com")
                .text("password", PASSWORD),
        )
        .send()
        .await?;
    assert_eq!(no_image.status(), StatusCode::UNPROCESSABLE_ENTITY);

    assert_eq!(server.files_in("pictures"), 0);
    Ok(())
}

#[tokio::test]
async fn login_does_not_leak_which_part_was_wrong() -> Result<()> {
    let server = TestServer::spawn().await?;
    server.signup("Ann", "ann@example.com").await?;

    let wrong_password = server.login("ann@example.com", "not-the-password").await?;
    let unknown_email = server.login("nobody@example.com", PASSWORD).await?;
    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_email.status(), StatusCode::UNAUTHORIZED);

    let a: Value = wrong_password.json().await?;
    let b: Value = unknown_email.json().await?;
    assert_eq!(a["message"], b["message"]);
    Ok(())
}

#[tokio::test]
async fn login_normalizes_email() -> Result<()> {
    let server = TestServer::spawn().await?;
    let signup = server.signup("Bob", "Bob@Example.com").await?;

    let res = server.login(" bob@example.COM", PASSWORD).await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["userId"], signup["userId"]);
    assert_eq!(body["email"], "bob@example.com");
    assert_eq!(body["role"], "user");
    Ok(())
}

#[tokio::test]
async fn banned_user_is_refused_until_unbanned() -> Result<()> {
    let server = TestServer::spawn().await?;
    let admin = server.admin().await?;
    let admin_token = text(&admin["token"]);
    let ann = server.signup("Ann", "ann@example.com").await?;

    let res = server
        .client
        .post(server.url("/api/users/ban"))
        .bearer_auth(&admin_token)
        .json(&json!({ "userId": ann["userId"], "type": "ban" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["message"], "Banned");

    let login = server.login("ann@example.com", PASSWORD).await?;
    assert_eq!(login.status(), StatusCode::FORBIDDEN);
    let body: Value = login.json().await?;
    assert_eq!(body["message"], "You have been banned");

    // A token issued before the ban no longer works on guarded routes
    let res = server
        .client
        .post(server.url("/api/playlists"))
        .bearer_auth(text(&ann["token"]))
        .json(&json!({ "name": "Mix" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = server
        .client
        .post(server.url("/api/users/ban"))
        .bearer_auth(&admin_token)
        .json(&json!({ "userId": ann["userId"], "type": "unban" }))
        .send()
        .await?;
    let body: Value = res.json().await?;
    assert_eq!(body["message"], "Unbanned");
    assert_eq!(server.login("ann@example.com", PASSWORD).await?.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn ban_requires_admin_and_known_type() -> Result<()> {
    let server = TestServer::spawn().await?;
    let admin = server.admin().await?;
    let ann = server.signup("Ann", "ann@example.com").await?;

    let res = server
        .client
        .post(server.url("/api/users/ban"))
        .bearer_auth(text(&ann["token"]))
        .json(&json!({ "userId": admin["userId"], "type": "ban" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = server
        .client
        .post(server.url("/api/users/ban"))
        .bearer_auth(text(&admin["token"]))
        .json(&json!({ "userId": ann["userId"], "type": "suspend" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    Ok(())
}

#[tokio::test]
async fn admin_cannot_ban_or_demote_themselves() -> Result<()> {
    let server = TestServer::spawn().await?;
    let admin = server.admin().await?;
    let token = text(&admin["token"]);
    assert_eq!(admin["role"], "admin");

    let res = server
        .client
        .post(server.url("/api/users/ban"))
        .bearer_auth(&token)
        .json(&json!({ "userId": admin["userId"], "type": "ban" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let res = server
        .client
        .patch(server.url(&format!("/api/users/{}", text(&admin["userId"]))))
        .bearer_auth(&token)
        .json(&json!({ "name": "Admin", "role": "user" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let (_, body) = server.get_json(&format!("/api/users/{}", text(&admin["userId"])), None).await?;
    assert_eq!(body["user"]["role"], "admin");
    assert_eq!(body["user"]["isBanned"], false);
    Ok(())
}

#[tokio::test]
async fn admin_edits_user() -> Result<()> {
    let server = TestServer::spawn().await?;
    let admin = server.admin().await?;
    let token = text(&admin["token"]);
    let ann = server.signup("Ann", "ann@example.com").await?;
    let path = format!("/api/users/{}", text(&ann["userId"]));

    let res = server
        .client
        .patch(server.url(&path))
        .bearer_auth(&token)
        .json(&json!({ "name": "Ann", "role": "superuser" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let res = server
        .client
        .patch(server.url(&path))
        .bearer_auth(&token)
        .json(&json!({ "name": "Ann Admin", "role": "admin" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await?;
    assert_eq!(body["user"]["name"], "Ann Admin");
    assert_eq!(body["user"]["role"], "admin");

    // Non-admins cannot list users; the promoted user now can
    let bob = server.signup("Bob", "bob@example.com").await?;
    let (status, _) = server.get_json("/api/users", Some(&text(&bob["token"]))).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = server.get_json("/api/users", Some(&text(&ann["token"]))).await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn unknown_user_is_not_found() -> Result<()> {
    let server = TestServer::spawn().await?;

    let (status, _) = server
        .get_json(&format!("/api/users/{}", uuid::Uuid::new_v4()), None)
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = server.get_json("/api/users/not-a-uuid", None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}
