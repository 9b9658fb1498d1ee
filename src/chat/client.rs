//! Cliente HTTP da Google Chat API (`chat.googleapis.com/v1`).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use super::{ChatApi, ThreadRef};
use crate::auth::TokenProvider;
use crate::types::chat::{normalize_space_name, require_text, validate_message_name};
use crate::types::{
    CreateSpaceRequest, ListMessagesOptions, ListSpacesOptions, Membership, Message, Page, Space,
};
use crate::{GchatError, GchatResult};

/// Cliente da Google Chat API.
///
/// Não há retry interno: 429 vira [`GchatError::RateLimited`] com o
/// `Retry-After` recebido.
pub struct GoogleChatClient {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn TokenProvider>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListMessagesResponse {
    #[serde(default)]
    messages: Vec<Message>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListSpacesResponse {
    #[serde(default)]
    spaces: Vec<Space>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListMembershipsResponse {
    #[serde(default)]
    memberships: Vec<Membership>,
    #[serde(default)]
    next_page_token: Option<String>,
}

/// Corpo de erro padrão das APIs Google.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: String,
}

/// A API devolve `nextPageToken: ""` na última página.
fn page<T>(items: Vec<T>, next_page_token: Option<String>) -> Page<T> {
    Page {
        items,
        next_page_token: next_page_token.filter(|token| !token.is_empty()),
    }
}

fn page_params(page_size: Option<u32>, page_token: Option<&str>) -> Vec<(&'static str, String)> {
    let mut params = Vec::new();
    if let Some(size) = page_size {
        params.push(("pageSize", size.to_string()));
    }
    if let Some(token) = page_token.filter(|t| !t.is_empty()) {
        params.push(("pageToken", token.to_string()));
    }
    params
}

impl GoogleChatClient {
    /// Cria o cliente.
    ///
    /// `base_url` inclui a versão (`https://chat.googleapis.com/v1`).
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        tokens: Arc<dyn TokenProvider>,
    ) -> GchatResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("gchat-mcp/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GchatError::other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tokens,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, resource: &str) -> RequestBuilder {
        tracing::debug!(method = %method, resource, "Chat API request");
        self.http
            .request(method, format!("{}/{}", self.base_url, resource))
    }

    /// Autentica, envia e converte respostas não-2xx em erro.
    async fn execute(&self, request: RequestBuilder) -> GchatResult<Response> {
        let token = self.tokens.access_token().await?;
        let response = request.bearer_auth(token).send().await?;

        if response.status().is_success() {
            Ok(response)
        } else {
            Err(self.error_from(response).await)
        }
    }

    async fn execute_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> GchatResult<T> {
        let response = self.execute(request).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| GchatError::remote(None, format!("unparsable response body: {e}")))
    }

    async fn error_from(&self, response: Response) -> GchatError {
        let status = response.status();
        let retry_after_secs = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok());

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&body)
            .map(|b| b.error.message)
            .ok()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("unexpected status")
                    .to_string()
            });

        tracing::warn!(status = status.as_u16(), %message, "Chat API error");

        match status {
            StatusCode::UNAUTHORIZED => {
                self.tokens.invalidate().await;
                GchatError::auth(format!("access token rejected: {message}"))
            }
            StatusCode::FORBIDDEN => GchatError::auth(format!("permission denied: {message}")),
            StatusCode::NOT_FOUND => GchatError::NotFound(message),
            StatusCode::TOO_MANY_REQUESTS => GchatError::RateLimited {
                message,
                retry_after_secs,
            },
            other => GchatError::remote(Some(other.as_u16()), message),
        }
    }

    async fn create_message(
        &self,
        space: &str,
        text: &str,
        thread: Option<ThreadRef>,
    ) -> GchatResult<Message> {
        let space = normalize_space_name(space)?;
        require_text("text", text)?;

        let mut body = json!({ "text": text });
        let mut params = vec![("requestId", uuid::Uuid::new_v4().to_string())];

        if let Some(thread) = thread {
            body["thread"] = thread.to_json();
            params.push((
                "messageReplyOption",
                "REPLY_MESSAGE_FALLBACK_TO_NEW_THREAD".to_string(),
            ));
        }

        let request = self
            .request(Method::POST, &format!("{space}/messages"))
            .query(&params)
            .json(&body);

        let message: Message = self.execute_json(request).await?;
        tracing::info!(space = %space, message = %message.name, "Message created");
        Ok(message)
    }
}

#[async_trait]
impl ChatApi for GoogleChatClient {
    async fn send_message(&self, space: &str, text: &str) -> GchatResult<Message> {
        self.create_message(space, text, None).await
    }

    async fn reply_to_thread(
        &self,
        space: &str,
        thread: &str,
        text: &str,
    ) -> GchatResult<Message> {
        let thread = ThreadRef::parse(thread)?;
        self.create_message(space, text, Some(thread)).await
    }

    async fn list_messages(
        &self,
        space: &str,
        options: &ListMessagesOptions,
    ) -> GchatResult<Page<Message>> {
        let space = normalize_space_name(space)?;
        options.validate()?;

        let mut params = page_params(options.page_size, options.page_token.as_deref());
        params.push(("orderBy", options.order.order_by().to_string()));
        if let Some(filter) = options.filter() {
            params.push(("filter", filter));
        }
        if options.show_deleted {
            params.push(("showDeleted", "true".to_string()));
        }

        let request = self
            .request(Method::GET, &format!("{space}/messages"))
            .query(&params);
        let response: ListMessagesResponse = self.execute_json(request).await?;

        Ok(page(response.messages, response.next_page_token))
    }

    async fn get_message(&self, name: &str) -> GchatResult<Message> {
        let name = validate_message_name(name)?;
        self.execute_json(self.request(Method::GET, &name)).await
    }

    async fn update_message(&self, name: &str, text: &str) -> GchatResult<Message> {
        let name = validate_message_name(name)?;
        require_text("text", text)?;

        let request = self
            .request(Method::PATCH, &name)
            .query(&[("updateMask", "text")])
            .json(&json!({ "text": text }));

        self.execute_json(request).await
    }

    async fn delete_message(&self, name: &str) -> GchatResult<()> {
        let name = validate_message_name(name)?;
        self.execute(self.request(Method::DELETE, &name)).await?;
        tracing::info!(message = %name, "Message deleted");
        Ok(())
    }

    async fn list_spaces(&self, options: &ListSpacesOptions) -> GchatResult<Page<Space>> {
        let mut params = page_params(options.page_size, options.page_token.as_deref());
        if let Some(filter) = options.filter() {
            params.push(("filter", filter));
        }

        let request = self.request(Method::GET, "spaces").query(&params);
        let response: ListSpacesResponse = self.execute_json(request).await?;

        Ok(page(response.spaces, response.next_page_token))
    }

    async fn get_space(&self, space: &str) -> GchatResult<Space> {
        let space = normalize_space_name(space)?;
        self.execute_json(self.request(Method::GET, &space)).await
    }

    async fn create_space(&self, request: &CreateSpaceRequest) -> GchatResult<Space> {
        require_text("display_name", &request.display_name)?;

        let http_request = self
            .request(Method::POST, "spaces")
            .query(&[("requestId", uuid::Uuid::new_v4().to_string())])
            .json(&request.to_body());

        let space: Space = self.execute_json(http_request).await?;
        tracing::info!(space = %space.name, "Space created");
        Ok(space)
    }

    async fn list_members(
        &self,
        space: &str,
        page_size: Option<u32>,
        page_token: Option<&str>,
    ) -> GchatResult<Page<Membership>> {
        let space = normalize_space_name(space)?;

        let request = self
            .request(Method::GET, &format!("{space}/members"))
            .query(&page_params(page_size, page_token));
        let response: ListMembershipsResponse = self.execute_json(request).await?;

        Ok(page(response.memberships, response.next_page_token))
    }
}
