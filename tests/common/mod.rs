#![allow(dead_code)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use reqwest::multipart::{Form, Part};
use reqwest::{Response, StatusCode};
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::net::TcpListener;

use tunehub_api::config::AppConfig;
use tunehub_api::database::DatabaseManager;
use tunehub_api::{app, AppState};

pub const ADMIN_EMAIL: &str = "admin@tunehub.test";
pub const PASSWORD: &str = "password123";

/// In-process server on a free port with its own memory store and upload dir
pub struct TestServer {
    pub base_url: String,
    pub client: reqwest::Client,
    upload_dir: TempDir,
}

impl TestServer {
    pub async fn spawn() -> Result<Self> {
        let upload_dir = tempfile::tempdir().context("failed to create upload dir")?;
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;

        let mut config = AppConfig::testing(upload_dir.path().to_path_buf());
        config.server.port = port;
        config.security.admin_emails = vec![ADMIN_EMAIL.to_string()];

        let store = DatabaseManager::open(&config).await?;
        let listener = TcpListener::bind(config.bind_addr()).await?;
        let state = AppState::new(config, store).await?;

        tokio::spawn(async move {
            let _ = axum::serve(listener, app(state)).await;
        });

        Ok(Self {
            base_url: format!("http://127.0.0.1:{}", port),
            client: reqwest::Client::new(),
            upload_dir,
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Location on disk of a stored `uploads/...` path
    pub fn stored_file(&self, public_path: &str) -> PathBuf {
        let relative = public_path.trim_start_matches("uploads/");
        self.upload_dir.path().join(relative)
    }

    pub fn files_in(&self, subdirectory: &str) -> usize {
        std::fs::read_dir(self.upload_dir.path().join(subdirectory))
            .map(|entries| entries.count())
            .unwrap_or(0)
    }

    pub async fn signup_response(&self, name: &str, email: &str, password: &str) -> Result<Response> {
        let image = Part::bytes(b"\x89PNG fake".to_vec())
            .file_name("avatar.png")
            .mime_str("image/png")?;
        let form = Form::new()
            .text("name", name.to_string())
            .text("email", email.to_string())
            .text("password", password.to_string())
            .part("image", image);

        Ok(self.client.post(self.url("/api/users/signup")).multipart(form).send().await?)
    }

    /// Register and return the signup body (`userId`, `role`, `token`)
    pub async fn signup(&self, name: &str, email: &str) -> Result<Value> {
        let res = self.signup_response(name, email, PASSWORD).await?;
        anyhow::ensure!(res.status() == StatusCode::CREATED, "signup failed: {}", res.status());
        Ok(res.json().await?)
    }

    pub async fn admin(&self) -> Result<Value> {
        self.signup("Admin", ADMIN_EMAIL).await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Response> {
        Ok(self
            .client
            .post(self.url("/api/users/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?)
    }

    pub async fn create_category(&self, token: &str, name: &str) -> Result<String> {
        let res = self
            .client
            .post(self.url("/api/categories"))
            .bearer_auth(token)
            .json(&json!({ "name": name }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::CREATED, "create category failed: {}", res.status());
        let body: Value = res.json().await?;
        Ok(text(&body["ctgId"]))
    }

    pub async fn upload_audio_response(
        &self,
        token: &str,
        category_id: &str,
        title: &str,
        audio_file_name: &str,
    ) -> Result<Response> {
        let image = Part::bytes(b"\x89PNG cover".to_vec())
            .file_name("cover.png")
            .mime_str("image/png")?;
        let audio = Part::bytes(b"ID3 fake audio".to_vec()).file_name(audio_file_name.to_string());
        let form = Form::new()
            .text("title", title.to_string())
            .text("artist", "The Testers")
            .part("image", image)
            .part("audio", audio);

        Ok(self
            .client
            .post(self.url(&format!("/api/categories/{}", category_id)))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await?)
    }

    /// Upload an audio into a category and return the created record
    pub async fn upload_audio(&self, token: &str, category_id: &str, title: &str) -> Result<Value> {
        let res = self.upload_audio_response(token, category_id, title, "song.mp3").await?;
        anyhow::ensure!(res.status() == StatusCode::CREATED, "upload failed: {}", res.status());
        let body: Value = res.json().await?;
        Ok(body["audio"].clone())
    }

    pub async fn get_json(&self, path: &str, token: Option<&str>) -> Result<(StatusCode, Value)> {
        let mut req = self.client.get(self.url(path));
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        let res = req.send().await?;
        let status = res.status();
        Ok((status, res.json().await?))
    }
}

/// String value of a JSON field
pub fn text(value: &Value) -> String {
    value.as_str().unwrap_or_default().to_string()
}
