/// Request extractors whose rejections use the JSON error shape
use axum::{
    extract::{
        multipart::{Field, MultipartError, MultipartRejection},
        rejection::{JsonRejection, PathRejection},
        FromRequest, FromRequestParts, Multipart, Request,
    },
    http::{request::Parts, StatusCode},
    Json,
};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::ApiError;
use crate::services::UploadedFile;

/// `Json<T>` with 422 on malformed bodies and 413 on oversized ones
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(json_rejection(rejection)),
        }
    }
}

fn json_rejection(rejection: JsonRejection) -> ApiError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return ApiError::payload_too_large("Request body too large");
    }
    ApiError::validation(format!("Invalid inputs: {}", rejection.body_text()))
}

/// Single UUID path segment. Anything that is not a UUID cannot name a
/// record, so it is reported as not found.
#[derive(Debug, Clone, Copy)]
pub struct RecordId(pub Uuid);

#[axum::async_trait]
impl<S> FromRequestParts<S> for RecordId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let axum::extract::Path(raw) = axum::extract::Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e: PathRejection| {
                tracing::debug!("Unusable path parameter: {}", e.body_text());
                ApiError::not_found("Page not found")
            })?;

        Uuid::parse_str(&raw)
            .map(RecordId)
            .map_err(|_| ApiError::not_found("Resource not found"))
    }
}

/// Text and file parts of a multipart form, fully buffered
#[derive(Debug, Default)]
pub struct FormParts {
    fields: HashMap<String, String>,
    files: HashMap<String, UploadedFile>,
}

impl FormParts {
    pub async fn read(multipart: Result<Multipart, MultipartRejection>) -> Result<Self, ApiError> {
        let mut multipart = multipart.map_err(|e| {
            ApiError::validation(format!("Invalid inputs: {}", e.body_text()))
        })?;

        let mut parts = FormParts::default();
        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            parts.push(field).await?;
        }
        Ok(parts)
    }

    async fn push(&mut self, field: Field<'_>) -> Result<(), ApiError> {
        let Some(name) = field.name().map(str::to_string) else {
            return Ok(());
        };

        if field.file_name().is_some() {
            let upload = UploadedFile {
                file_name: field.file_name().map(str::to_string),
                content_type: field.content_type().map(str::to_string),
                data: field.bytes().await.map_err(multipart_error)?,
            };
            self.files.insert(name, upload);
        } else {
            let text = field.text().await.map_err(multipart_error)?;
            self.fields.insert(name, text);
        }
        Ok(())
    }

    pub fn text(&self, name: &str) -> Option<String> {
        self.fields.get(name).cloned()
    }

    pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        self.files.remove(name)
    }
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return ApiError::payload_too_large("Request body too large");
    }
    ApiError::validation(format!("Invalid inputs: {}", err.body_text()))
}
