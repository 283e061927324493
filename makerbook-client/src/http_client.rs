use crate::config::ClientConfig;
use crate::error::{ClientError, TimedOperation};
use crate::interactions::InteractionApi;
use crate::loading::{LoadingGuard, LoadingSignal};
use crate::models::*;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

#[derive(Debug, Deserialize)]
struct BookmarksResponse {
    #[serde(default)]
    bookmarks: Vec<Post>,
}

#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    token: Arc<RwLock<Option<String>>>,
    request_timeout: Duration,
    ai_timeout: Duration,
    ai_detail_timeout: Duration,
    loading: Option<LoadingSignal>,
}

impl HttpClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_config(&ClientConfig::new(base_url))
    }

    pub fn with_config(config: &ClientConfig) -> Self {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: config.base_url.clone(),
            token: Arc::new(RwLock::new(None)),
            request_timeout: config.request_timeout,
            ai_timeout: config.ai_timeout,
            ai_detail_timeout: config.ai_detail_timeout,
            loading: None,
        }
    }

    /// Counts every request made through this client on `signal`.
    pub fn with_loading(mut self, signal: LoadingSignal) -> Self {
        self.loading = Some(signal);
        self
    }

    pub async fn set_token(&self, token: impl Into<String>) {
        *self.token.write().await = Some(token.into());
    }

    pub async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    pub async fn clear_token(&self) {
        *self.token.write().await = None;
    }

    pub async fn is_authenticated(&self) -> bool {
        self.token.read().await.is_some()
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Attaches the bearer token, or refuses before anything is sent.
    async fn authed(
        &self,
        request: RequestBuilder,
        action: &str,
    ) -> Result<RequestBuilder, ClientError> {
        match self.token.read().await.as_deref() {
            Some(token) => Ok(request.bearer_auth(token)),
            None => {
                tracing::warn!(action, "Blocked request without a login");
                Err(ClientError::AuthRequired(action.to_string()))
            }
        }
    }

    /// Attaches the bearer token when there is one, so responses carry the user's own flags.
    async fn maybe_authed(&self, request: RequestBuilder) -> RequestBuilder {
        match self.token.read().await.as_deref() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn loading_guard(&self) -> Option<LoadingGuard> {
        self.loading.as_ref().map(LoadingSignal::guard)
    }

    fn timeout_for(&self, operation: TimedOperation) -> Duration {
        match operation {
            TimedOperation::Request => self.request_timeout,
            TimedOperation::AiSuggestions => self.ai_timeout,
            TimedOperation::AiRecipeDetail => self.ai_detail_timeout,
        }
    }

    fn transport_error(
        &self,
        operation: TimedOperation,
    ) -> impl Fn(reqwest::Error) -> ClientError {
        let after = self.timeout_for(operation);
        move |e: reqwest::Error| {
            if e.is_timeout() {
                ClientError::Timeout { operation, after }
            } else {
                ClientError::HttpError(e)
            }
        }
    }

    async fn execute(
        &self,
        request: RequestBuilder,
        operation: TimedOperation,
    ) -> Result<Response, ClientError> {
        let to_error = self.transport_error(operation);
        let response = request
            .timeout(self.timeout_for(operation))
            .send()
            .await
            .map_err(&to_error)?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.map_err(&to_error)?;
        let err = ClientError::from_response(status.as_u16(), &body);
        tracing::warn!(%status, error = %err, "API rejected request");
        Err(err)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        operation: TimedOperation,
    ) -> Result<T, ClientError> {
        let _loading = self.loading_guard();
        let response = self.execute(request, operation).await?;
        response
            .json::<T>()
            .await
            .map_err(self.transport_error(operation))
    }

    async fn send_empty(&self, request: RequestBuilder) -> Result<(), ClientError> {
        let _loading = self.loading_guard();
        self.execute(request, TimedOperation::Request).await?;
        Ok(())
    }

    // ==================== Auth ====================

    pub async fn register(&self, req: &RegisterRequest) -> Result<AuthResponse, ClientError> {
        let request = self.client.post(self.url("/api/auth/register")).json(req);
        let auth: AuthResponse = self.send(request, TimedOperation::Request).await?;
        self.set_token(auth.token.clone()).await;
        tracing::info!(user = %auth.user.username, "Registered");
        Ok(auth)
    }

    pub async fn login(&self, req: &LoginRequest) -> Result<AuthResponse, ClientError> {
        let request = self.client.post(self.url("/api/auth/login")).json(req);
        let auth: AuthResponse = self.send(request, TimedOperation::Request).await?;
        self.set_token(auth.token.clone()).await;
        tracing::info!(user = %auth.user.username, "Logged in");
        Ok(auth)
    }

    pub async fn me(&self) -> Result<User, ClientError> {
        let request = self
            .authed(self.client.get(self.url("/api/auth/me")), "view your profile")
            .await?;
        self.send(request, TimedOperation::Request).await
    }

    // ==================== Posts ====================

    pub async fn list_posts(
        &self,
        page: u32,
        limit: u32,
        post_type: Option<PostType>,
    ) -> Result<PostsPage, ClientError> {
        let mut query = vec![("page", page.to_string()), ("limit", limit.to_string())];
        if let Some(post_type) = post_type {
            query.push(("type", post_type.to_string()));
        }
        let request = self
            .maybe_authed(self.client.get(self.url("/api/posts")).query(&query))
            .await;
        self.send(request, TimedOperation::Request).await
    }

    pub async fn get_post(&self, id: &str) -> Result<Post, ClientError> {
        let request = self
            .maybe_authed(self.client.get(self.url(&format!("/api/posts/{}", id))))
            .await;
        self.send(request, TimedOperation::Request).await
    }

    pub async fn create_post(&self, draft: &PostDraft) -> Result<Post, ClientError> {
        draft.validate()?;
        let request = self
            .authed(self.client.post(self.url("/api/posts")), "create a post")
            .await?
            .json(draft);
        let post: Post = self.send(request, TimedOperation::Request).await?;
        tracing::info!(post_id = %post.id, status = ?post.status, "Post created");
        Ok(post)
    }

    pub async fn update_post(&self, id: &str, draft: &PostDraft) -> Result<Post, ClientError> {
        draft.validate()?;
        let request = self
            .authed(
                self.client.put(self.url(&format!("/api/posts/{}", id))),
                "edit this post",
            )
            .await?
            .json(draft);
        self.send(request, TimedOperation::Request).await
    }

    pub async fn publish_post(&self, id: &str) -> Result<Post, ClientError> {
        let request = self
            .authed(
                self.client
                    .patch(self.url(&format!("/api/posts/{}/publish", id))),
                "publish this post",
            )
            .await?;
        let post: Post = self.send(request, TimedOperation::Request).await?;
        tracing::info!(post_id = %post.id, "Post published");
        Ok(post)
    }

    pub async fn delete_post(&self, id: &str) -> Result<(), ClientError> {
        let request = self
            .authed(
                self.client.delete(self.url(&format!("/api/posts/{}", id))),
                "delete this post",
            )
            .await?;
        self.send_empty(request).await?;
        tracing::info!(post_id = id, "Post deleted");
        Ok(())
    }

    // ==================== AI ====================

    pub async fn suggestions(
        &self,
        req: &SuggestionRequest,
    ) -> Result<SuggestionResponse, ClientError> {
        if req.prompt.trim().is_empty() {
            return Err(ClientError::Validation(
                "Describe what you would like to make".to_string(),
            ));
        }
        let request = self
            .authed(
                self.client.post(self.url("/api/ai/suggestions")),
                "get AI suggestions",
            )
            .await?
            .json(req);
        self.send(request, TimedOperation::AiSuggestions).await
    }

    pub async fn recipe_detail(&self, title: &str) -> Result<RecipeDetail, ClientError> {
        let request = self
            .authed(
                self.client.post(self.url("/api/ai/recipe-detail")),
                "generate a recipe",
            )
            .await?
            .json(&RecipeDetailRequest {
                title: title.to_string(),
            });
        self.send(request, TimedOperation::AiRecipeDetail).await
    }

    // ==================== Reports ====================

    pub async fn report(&self, req: &ReportRequest) -> Result<ReportReceipt, ClientError> {
        req.validate()?;
        let request = self
            .authed(self.client.post(self.url("/api/reports")), "report a user")
            .await?
            .json(req);
        let receipt: ReportReceipt = self.send(request, TimedOperation::Request).await?;
        tracing::info!(report_id = %receipt.id, "Report submitted");
        Ok(receipt)
    }

    pub async fn report_vendor(
        &self,
        req: &VendorReportRequest,
    ) -> Result<ReportReceipt, ClientError> {
        req.validate()?;
        let request = self
            .authed(
                self.client.post(self.url("/api/vendor-reports")),
                "report a vendor",
            )
            .await?
            .json(req);
        let receipt: ReportReceipt = self.send(request, TimedOperation::Request).await?;
        tracing::info!(report_id = %receipt.id, "Vendor report submitted");
        Ok(receipt)
    }

    // ==================== Media ====================

    pub async fn upload_media(&self, path: &Path) -> Result<UploadedMedia, ClientError> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let (kind, mime) = MediaKind::from_extension(ext).ok_or_else(|| {
            ClientError::Validation(format!("Unsupported media file: {}", path.display()))
        })?;

        let bytes = tokio::fs::read(path).await.map_err(|e| {
            ClientError::Validation(format!("Cannot read {}: {}", path.display(), e))
        })?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();

        let part = Part::bytes(bytes).file_name(file_name).mime_str(mime)?;
        let form = Form::new()
            .part("media", part)
            .text("type", kind.as_str());

        let request = self
            .authed(self.client.post(self.url("/api/upload")), "upload media")
            .await?
            .multipart(form);
        self.send(request, TimedOperation::Request).await
    }
}

#[async_trait]
impl InteractionApi for HttpClient {
    async fn toggle_like(&self, post_id: &str) -> Result<LikeResponse, ClientError> {
        let url = self.url(&format!("/api/interactions/{}/like", post_id));
        let request = self.authed(self.client.post(url), "like posts").await?;
        self.send(request, TimedOperation::Request).await
    }

    async fn toggle_bookmark(&self, post_id: &str) -> Result<BookmarkResponse, ClientError> {
        let url = self.url(&format!("/api/interactions/{}/bookmark", post_id));
        let request = self.authed(self.client.post(url), "bookmark posts").await?;
        self.send(request, TimedOperation::Request).await
    }

    async fn list_comments(&self, post_id: &str, page: u32) -> Result<CommentsPage, ClientError> {
        let url = self.url(&format!("/api/interactions/{}/comments", post_id));
        let request = self
            .maybe_authed(self.client.get(url).query(&[("page", page)]))
            .await;
        self.send(request, TimedOperation::Request).await
    }

    async fn add_comment(
        &self,
        post_id: &str,
        comment: &NewComment,
    ) -> Result<CommentAdded, ClientError> {
        let url = self.url(&format!("/api/interactions/{}/comments", post_id));
        let request = self
            .authed(self.client.post(url), "comment")
            .await?
            .json(comment);
        self.send(request, TimedOperation::Request).await
    }

    async fn edit_comment(&self, comment_id: &str, text: &str) -> Result<Comment, ClientError> {
        let url = self.url(&format!("/api/interactions/comments/{}", comment_id));
        let request = self
            .authed(self.client.put(url), "edit comments")
            .await?
            .json(&EditComment {
                text: text.to_string(),
            });
        self.send(request, TimedOperation::Request).await
    }

    async fn delete_comment(&self, comment_id: &str) -> Result<CommentDeleted, ClientError> {
        let url = self.url(&format!("/api/interactions/comments/{}", comment_id));
        let request = self
            .authed(self.client.delete(url), "delete comments")
            .await?;
        self.send(request, TimedOperation::Request).await
    }

    async fn toggle_comment_like(
        &self,
        comment_id: &str,
    ) -> Result<CommentLikeResponse, ClientError> {
        let url = self.url(&format!("/api/interactions/comments/{}/like", comment_id));
        let request = self.authed(self.client.post(url), "like comments").await?;
        self.send(request, TimedOperation::Request).await
    }

    async fn share(
        &self,
        post_id: &str,
        platform: SharePlatform,
    ) -> Result<ShareResponse, ClientError> {
        let url = self.url(&format!("/api/interactions/{}/share", post_id));
        let request = self
            .maybe_authed(self.client.post(url))
            .await
            .json(&ShareRequest { platform });
        self.send(request, TimedOperation::Request).await
    }

    async fn record_view(&self, post_id: &str) -> Result<ViewResponse, ClientError> {
        let url = self.url(&format!("/api/interactions/{}/view", post_id));
        let request = self.maybe_authed(self.client.post(url)).await;
        self.send(request, TimedOperation::Request).await
    }

    async fn engagement(&self, post_id: &str) -> Result<Interaction, ClientError> {
        let url = self.url(&format!("/api/interactions/{}/engagement", post_id));
        let request = self.maybe_authed(self.client.get(url)).await;
        self.send(request, TimedOperation::Request).await
    }

    async fn bookmarks(&self) -> Result<Vec<Post>, ClientError> {
        let url = self.url("/api/interactions/bookmarks");
        let request = self
            .authed(self.client.get(url), "see your bookmarks")
            .await?;
        let response: BookmarksResponse = self.send(request, TimedOperation::Request).await?;
        Ok(response.bookmarks)
    }
}
