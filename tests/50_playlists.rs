mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::{text, TestServer};

struct Fixture {
    server: TestServer,
    ann_token: String,
    ann_id: String,
    bob_token: String,
    audio_id: String,
}

async fn fixture() -> Result<Fixture> {
    let server = TestServer::spawn().await?;
    let admin = server.admin().await?;
    let admin_token = text(&admin["token"]);
    let category = server.create_category(&admin_token, "Folk").await?;
    let audio = server.upload_audio(&admin_token, &category, "Ballad").await?;
    let ann = server.signup("Ann", "ann@example.com").await?;
    let bob = server.signup("Bob", "bob@example.com").await?;

    Ok(Fixture {
        ann_token: text(&ann["token"]),
        ann_id: text(&ann["userId"]),
        bob_token: text(&bob["token"]),
        audio_id: text(&audio["id"]),
        server,
    })
}

impl Fixture {
    async fn create_playlist(&self, token: &str, name: &str) -> Result<reqwest::Response> {
        Ok(self
            .server
            .client
            .post(self.server.url("/api/playlists"))
            .bearer_auth(token)
            .json(&json!({ "name": name }))
            .send()
            .await?)
    }

    async fn add_track(&self, token: &str, playlist_id: &str) -> Result<reqwest::Response> {
        Ok(self
            .server
            .client
            .post(self.server.url(&format!("/api/playlists/{}", playlist_id)))
            .bearer_auth(token)
            .json(&json!({ "audioId": self.audio_id }))
            .send()
            .await?)
    }

    async fn like(&self, token: &str) -> Result<reqwest::Response> {
        Ok(self
            .server
            .client
            .post(self.server.url(&format!("/api/playlists/liked/add/{}", self.audio_id)))
            .bearer_auth(token)
            .send()
            .await?)
    }

    async fn liked_playlist_id(&self) -> Result<String> {
        let (_, body) = self
            .server
            .get_json(&format!("/api/playlists/user/{}", self.ann_id), Some(&self.ann_token))
            .await?;
        Ok(text(&body["userPlaylists"][0]["id"]))
    }
}

#[tokio::test]
async fn owner_manages_playlist() -> Result<()> {
    let f = fixture().await?;

    let res = f.create_playlist(&f.ann_token, "Road trip").await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await?;
    assert_eq!(body["playlistName"], "Road trip");
    let playlist_id = text(&body["playlistId"]);

    let res = f.add_track(&f.ann_token, &playlist_id).await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["playlist"]["tracks"], json!([f.audio_id]));

    let (status, body) = f
        .server
        .get_json(&format!("/api/playlists/{}", playlist_id), Some(&f.ann_token))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["playlist"]["playlistName"], "Road trip");
    assert_eq!(body["playlist"]["playlistTracks"][0]["title"], "Ballad");

    let (_, body) = f
        .server
        .get_json(&format!("/api/playlists/user/{}", f.ann_id), Some(&f.ann_token))
        .await?;
    assert_eq!(body["userPlaylists"].as_array().map(Vec::len), Some(2));
    Ok(())
}

#[tokio::test]
async fn other_users_are_forbidden() -> Result<()> {
    let f = fixture().await?;
    let body: Value = f.create_playlist(&f.ann_token, "Private").await?.json().await?;
    let playlist_id = text(&body["playlistId"]);
    let url = f.server.url(&format!("/api/playlists/{}", playlist_id));

    let (status, _) = f
        .server
        .get_json(&format!("/api/playlists/{}", playlist_id), Some(&f.bob_token))
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    assert_eq!(f.add_track(&f.bob_token, &playlist_id).await?.status(), StatusCode::FORBIDDEN);

    let res = f
        .server
        .client
        .patch(&url)
        .bearer_auth(&f.bob_token)
        .json(&json!({ "name": "Stolen" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = f.server.client.delete(&url).bearer_auth(&f.bob_token).send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // Missing playlists are reported before ownership
    let (status, _) = f
        .server
        .get_json(&format!("/api/playlists/{}", uuid::Uuid::new_v4()), Some(&f.bob_token))
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn ownership_is_checked_before_the_body() -> Result<()> {
    let f = fixture().await?;
    let body: Value = f.create_playlist(&f.ann_token, "Private").await?.json().await?;
    let url = f.server.url(&format!("/api/playlists/{}", text(&body["playlistId"])));

    for payload in [json!({}), json!({ "audioId": "" }), json!({ "audioId": "not-a-uuid" })] {
        let res = f.server.client.post(&url).bearer_auth(&f.bob_token).json(&payload).send().await?;
        assert_eq!(res.status(), StatusCode::FORBIDDEN, "add track with {}", payload);
    }

    for payload in [json!({}), json!({ "name": " " }), json!({ "name": "Liked" })] {
        let res = f.server.client.patch(&url).bearer_auth(&f.bob_token).json(&payload).send().await?;
        assert_eq!(res.status(), StatusCode::FORBIDDEN, "rename with {}", payload);
    }

    // The owner still gets the validation error
    let res = f.server.client.patch(&url).bearer_auth(&f.ann_token).json(&json!({})).send().await?;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    Ok(())
}

#[tokio::test]
async fn duplicate_track_is_rejected() -> Result<()> {
    let f = fixture().await?;
    let body: Value = f.create_playlist(&f.ann_token, "Repeat").await?.json().await?;
    let playlist_id = text(&body["playlistId"]);

    assert_eq!(f.add_track(&f.ann_token, &playlist_id).await?.status(), StatusCode::OK);
    let res = f.add_track(&f.ann_token, &playlist_id).await?;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = res.json().await?;
    assert_eq!(body["code"], "CONFLICT");

    let (_, body) = f
        .server
        .get_json(&format!("/api/playlists/{}", playlist_id), Some(&f.ann_token))
        .await?;
    assert_eq!(body["playlist"]["playlistTracks"].as_array().map(Vec::len), Some(1));
    Ok(())
}

#[tokio::test]
async fn like_once_per_track() -> Result<()> {
    let f = fixture().await?;

    let res = f.like(&f.ann_token).await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await?;
    assert_eq!(body["playlist"]["name"], "Liked");
    assert_eq!(body["playlist"]["tracks"], json!([f.audio_id]));

    let res = f.like(&f.ann_token).await?;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // Bob's like counts separately
    assert_eq!(f.like(&f.bob_token).await?.status(), StatusCode::CREATED);

    let (_, body) = f.server.get_json(&format!("/api/audios/{}", f.audio_id), None).await?;
    assert_eq!(body["audio"]["likes"], 2);

    let missing = f
        .server
        .client
        .post(f.server.url(&format!("/api/playlists/liked/add/{}", uuid::Uuid::new_v4())))
        .bearer_auth(&f.ann_token)
        .send()
        .await?;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn liked_playlist_is_protected() -> Result<()> {
    let f = fixture().await?;
    let liked_id = f.liked_playlist_id().await?;
    let url = f.server.url(&format!("/api/playlists/{}", liked_id));

    let res = f
        .server
        .client
        .patch(&url)
        .bearer_auth(&f.ann_token)
        .json(&json!({ "name": "Favourites" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let res = f.server.client.delete(&url).bearer_auth(&f.ann_token).send().await?;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let res = f.create_playlist(&f.ann_token, "Liked").await?;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = f
        .server
        .get_json(&format!("/api/playlists/{}", liked_id), Some(&f.ann_token))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["playlist"]["playlistName"], "Liked");
    Ok(())
}

#[tokio::test]
async fn rename_and_delete_playlist() -> Result<()> {
    let f = fixture().await?;
    let body: Value = f.create_playlist(&f.ann_token, "Draft").await?.json().await?;
    let playlist_id = text(&body["playlistId"]);
    let url = f.server.url(&format!("/api/playlists/{}", playlist_id));

    let res = f
        .server
        .client
        .patch(&url)
        .bearer_auth(&f.ann_token)
        .json(&json!({ "name": "Final" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await?;
    assert_eq!(body["playlist"]["name"], "Final");

    let res = f.server.client.delete(&url).bearer_auth(&f.ann_token).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["message"], "Playlist deleted");

    let (_, body) = f
        .server
        .get_json(&format!("/api/playlists/user/{}", f.ann_id), Some(&f.ann_token))
        .await?;
    let names: Vec<String> = body["userPlaylists"]
        .as_array()
        .cloned()
        .unwrap_or_default()
        .iter()
        .map(|p| text(&p["name"]))
        .collect();
    assert_eq!(names, vec!["Liked".to_string()]);

    let (status, _) = f
        .server
        .get_json(&format!("/api/playlists/{}", playlist_id), Some(&f.ann_token))
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}
