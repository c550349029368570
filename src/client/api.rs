//! Typed client for the Darkroom JSON API.
//!
//! Every call maps a non-2xx response to [`ClientError::Api`] carrying the
//! server's `error` message. Nothing is retried.

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Url};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

use crate::models::{
    CreateImageRequest, CreateProjectRequest, Image, ImageUpdate, NoteType, Project,
    ProjectListing, ProjectWithImages, PublicUser, UpdateProjectRequest, User, UserDetail,
};
use crate::review::session::ReviewBackend;
use crate::services::{ConceptVariations, UploadRequest};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid base URL: {0}")]
    InvalidUrl(String),

    #[error("Unexpected response body: {0}")]
    Decode(String),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// HTTP client bound to one server. Cookies are kept, so a successful
/// `login` or `verify_code` authenticates later calls.
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let base_url =
            Url::parse(base_url).map_err(|e| ClientError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(base_url.to_string()));
        }

        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self { client, base_url })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .push("api")
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, ClientError> {
        Ok(self.client.request(method, self.endpoint(segments)?))
    }

    async fn send_raw(&self, request: RequestBuilder) -> Result<Value, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        let body: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        if !status.is_success() {
            let message = body
                .get("error")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("API error: {}", status));
            tracing::debug!("API call failed with {}: {}", status, message);
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(body)
    }

    /// Sends the request and decodes the `key` field of the response.
    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        key: &str,
    ) -> Result<T, ClientError> {
        let mut body = self.send_raw(request).await?;
        let field = body
            .get_mut(key)
            .map(Value::take)
            .ok_or_else(|| ClientError::Decode(format!("missing `{}`", key)))?;
        serde_json::from_value(field).map_err(|e| ClientError::Decode(e.to_string()))
    }

    async fn send_success(&self, request: RequestBuilder) -> Result<(), ClientError> {
        self.send_raw(request).await?;
        Ok(())
    }

    fn with_json<B: Serialize>(
        &self,
        method: Method,
        segments: &[&str],
        body: &B,
    ) -> Result<RequestBuilder, ClientError> {
        Ok(self.request(method, segments)?.json(body))
    }

    // Auth

    pub async fn signup(
        &self,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> Result<PublicUser, ClientError> {
        let body = json!({ "email": email, "password": password, "name": name });
        self.send(self.with_json(Method::POST, &["auth", "signup"], &body)?, "user")
            .await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<PublicUser, ClientError> {
        let body = json!({ "email": email, "password": password });
        self.send(self.with_json(Method::POST, &["auth", "login"], &body)?, "user")
            .await
    }

    pub async fn send_code(&self, email: &str) -> Result<(), ClientError> {
        let body = json!({ "email": email });
        self.send_success(self.with_json(Method::POST, &["auth", "send-code"], &body)?)
            .await
    }

    pub async fn verify_code(&self, email: &str, code: &str) -> Result<PublicUser, ClientError> {
        let body = json!({ "email": email, "code": code });
        self.send(
            self.with_json(Method::POST, &["auth", "verify-code"], &body)?,
            "user",
        )
        .await
    }

    pub async fn logout(&self) -> Result<(), ClientError> {
        self.send_success(self.request(Method::POST, &["auth", "logout"])?)
            .await
    }

    pub async fn me(&self) -> Result<PublicUser, ClientError> {
        self.send(self.request(Method::GET, &["auth", "me"])?, "user")
            .await
    }

    // Users

    pub async fn list_users(&self) -> Result<Vec<User>, ClientError> {
        self.send(self.request(Method::GET, &["users"])?, "users")
            .await
    }

    /// Returns the user for `email`, creating it if needed.
    pub async fn get_or_create_user(
        &self,
        email: &str,
        name: Option<&str>,
    ) -> Result<User, ClientError> {
        let body = json!({ "email": email, "name": name });
        self.send(self.with_json(Method::POST, &["users"], &body)?, "user")
            .await
    }

    pub async fn get_user(&self, id: &str) -> Result<UserDetail, ClientError> {
        self.send(self.request(Method::GET, &["users", id])?, "user")
            .await
    }

    /// `None` clears the name.
    pub async fn update_user_name(
        &self,
        id: &str,
        name: Option<&str>,
    ) -> Result<User, ClientError> {
        let body = json!({ "name": name });
        self.send(self.with_json(Method::PUT, &["users", id], &body)?, "user")
            .await
    }

    pub async fn delete_user(&self, id: &str) -> Result<(), ClientError> {
        self.send_success(self.request(Method::DELETE, &["users", id])?)
            .await
    }

    // Projects

    pub async fn list_projects(&self) -> Result<Vec<ProjectListing>, ClientError> {
        self.send(self.request(Method::GET, &["projects"])?, "projects")
            .await
    }

    pub async fn get_project(&self, id: &str) -> Result<ProjectWithImages, ClientError> {
        self.send(self.request(Method::GET, &["projects", id])?, "project")
            .await
    }

    pub async fn create_project(
        &self,
        request: &CreateProjectRequest,
    ) -> Result<Project, ClientError> {
        self.send(
            self.with_json(Method::POST, &["projects"], request)?,
            "project",
        )
        .await
    }

    pub async fn update_project(
        &self,
        id: &str,
        request: &UpdateProjectRequest,
    ) -> Result<Project, ClientError> {
        self.send(
            self.with_json(Method::PUT, &["projects", id], request)?,
            "project",
        )
        .await
    }

    pub async fn delete_project(&self, id: &str) -> Result<(), ClientError> {
        self.send_success(self.request(Method::DELETE, &["projects", id])?)
            .await
    }

    // Images

    pub async fn list_images(&self, project_id: Option<&str>) -> Result<Vec<Image>, ClientError> {
        let mut request = self.request(Method::GET, &["images"])?;
        if let Some(project_id) = project_id {
            request = request.query(&[("projectId", project_id)]);
        }
        self.send(request, "images").await
    }

    pub async fn get_image(&self, id: &str) -> Result<Image, ClientError> {
        self.send(self.request(Method::GET, &["images", id])?, "image")
            .await
    }

    pub async fn create_image(&self, request: &CreateImageRequest) -> Result<Image, ClientError> {
        self.send(self.with_json(Method::POST, &["images"], request)?, "image")
            .await
    }

    pub async fn update_image(&self, id: &str, update: &ImageUpdate) -> Result<Image, ClientError> {
        self.send(
            self.with_json(Method::PUT, &["images", id], update)?,
            "image",
        )
        .await
    }

    pub async fn update_note(
        &self,
        id: &str,
        note_type: NoteType,
        content: &str,
    ) -> Result<Image, ClientError> {
        let body = json!({ "type": note_type.as_str(), "content": content });
        self.send(
            self.with_json(Method::PUT, &["images", id, "notes"], &body)?,
            "image",
        )
        .await
    }

    pub async fn delete_image(&self, id: &str) -> Result<(), ClientError> {
        self.send_success(self.request(Method::DELETE, &["images", id])?)
            .await
    }

    pub async fn get_variations(&self, concept_id: &str) -> Result<ConceptVariations, ClientError> {
        let body = self
            .send_raw(self.request(Method::GET, &["images", concept_id, "variations"])?)
            .await?;
        serde_json::from_value(body).map_err(|e| ClientError::Decode(e.to_string()))
    }

    pub async fn select_variation(
        &self,
        concept_id: &str,
        variation_id: &str,
    ) -> Result<(), ClientError> {
        let body = json!({ "selectedVariationId": variation_id });
        self.send_success(self.with_json(
            Method::PUT,
            &["images", concept_id, "variations"],
            &body,
        )?)
        .await
    }

    /// Uploads a data-URL image and returns its public URL.
    pub async fn upload(&self, request: &UploadRequest) -> Result<String, ClientError> {
        self.send(self.with_json(Method::POST, &["upload"], request)?, "url")
            .await
    }
}

#[async_trait]
impl ReviewBackend for ApiClient {
    async fn list_images(&self, project_id: Option<String>) -> Result<Vec<Image>, ClientError> {
        ApiClient::list_images(self, project_id.as_deref()).await
    }

    async fn update_image(&self, id: &str, update: ImageUpdate) -> Result<Image, ClientError> {
        ApiClient::update_image(self, id, &update).await
    }

    async fn save_note(
        &self,
        id: &str,
        note_type: NoteType,
        content: Option<String>,
    ) -> Result<Image, ClientError> {
        match content.filter(|c| !c.is_empty()) {
            Some(content) => ApiClient::update_note(self, id, note_type, &content).await,
            // The notes endpoint rejects empty content; clearing goes through PUT
            None => {
                let update = ImageUpdate::default().with_note(note_type, None);
                ApiClient::update_image(self, id, &update).await
            }
        }
    }
}
