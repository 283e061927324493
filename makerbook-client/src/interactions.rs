//! Per-post cache of likes, bookmarks, comments, shares and views.
//!
//! Every mutation waits for the server and then stores the values the
//! server returned. While a like or bookmark toggle is in flight,
//! [`InteractionStore::displayed`] shows the flipped value, but that guess is
//! never written into the cache.

use crate::error::ClientError;
use crate::models::{
    BookmarkResponse, Comment, CommentAdded, CommentDeleted, CommentLikeResponse, CommentsPage,
    Interaction, LikeResponse, NewComment, Post, SharePlatform, ShareResponse, ViewResponse,
};
use crate::notify::{Notification, Notifier};
use async_trait::async_trait;
use futures::future::join_all;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;

/// Remote side of the interaction endpoints.
#[async_trait]
pub trait InteractionApi: Send + Sync {
    async fn toggle_like(&self, post_id: &str) -> Result<LikeResponse, ClientError>;
    async fn toggle_bookmark(&self, post_id: &str) -> Result<BookmarkResponse, ClientError>;
    async fn list_comments(&self, post_id: &str, page: u32) -> Result<CommentsPage, ClientError>;
    async fn add_comment(
        &self,
        post_id: &str,
        comment: &NewComment,
    ) -> Result<CommentAdded, ClientError>;
    async fn edit_comment(&self, comment_id: &str, text: &str) -> Result<Comment, ClientError>;
    async fn delete_comment(&self, comment_id: &str) -> Result<CommentDeleted, ClientError>;
    async fn toggle_comment_like(
        &self,
        comment_id: &str,
    ) -> Result<CommentLikeResponse, ClientError>;
    async fn share(
        &self,
        post_id: &str,
        platform: SharePlatform,
    ) -> Result<ShareResponse, ClientError>;
    async fn record_view(&self, post_id: &str) -> Result<ViewResponse, ClientError>;
    async fn engagement(&self, post_id: &str) -> Result<Interaction, ClientError>;
    async fn bookmarks(&self) -> Result<Vec<Post>, ClientError>;
}

/// Which control a loading flag belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Like,
    Bookmark,
    Share,
    Engagement,
    LoadComments,
    AddComment,
    EditComment,
    DeleteComment,
    LikeComment,
}

#[derive(Debug, Clone, Default)]
struct CommentThread {
    comments: Vec<Comment>,
    page: u32,
    total_pages: u32,
}

#[derive(Debug, Default)]
struct State {
    records: HashMap<String, Interaction>,
    threads: HashMap<String, CommentThread>,
    // Requests outstanding per control; absent means idle.
    in_flight: HashMap<(String, Action), usize>,
    viewed: HashSet<String>,
}

struct Inner {
    api: Arc<dyn InteractionApi>,
    notifier: Arc<dyn Notifier>,
    state: Mutex<State>,
}

#[derive(Clone)]
pub struct InteractionStore {
    inner: Arc<Inner>,
}

/// Clears a loading flag when the request finishes or is abandoned.
struct InFlight<'a> {
    store: &'a InteractionStore,
    key: (String, Action),
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut state = self.store.state();
        if let Some(count) = state.in_flight.get_mut(&self.key) {
            *count -= 1;
            if *count == 0 {
                state.in_flight.remove(&self.key);
            }
        }
    }
}

impl InteractionStore {
    pub fn new(api: Arc<dyn InteractionApi>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            inner: Arc::new(Inner {
                api,
                notifier,
                state: Mutex::new(State::default()),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs one remote call under a loading flag and surfaces its failure.
    async fn run<T, F>(&self, id: &str, action: Action, call: F) -> Result<T, ClientError>
    where
        F: Future<Output = Result<T, ClientError>>,
    {
        let key = (id.to_string(), action);
        *self.state().in_flight.entry(key.clone()).or_default() += 1;
        let _flag = InFlight { store: self, key };

        let result = call.await;
        if let Err(e) = &result {
            tracing::warn!(id, ?action, error = %e, "Interaction request failed");
            self.inner.notifier.notify(Notification::from(e));
        }
        result
    }

    fn reject(&self, err: ClientError) -> ClientError {
        self.inner.notifier.notify(Notification::from(&err));
        err
    }

    /// Whether the control for `action` on `id` (a post or comment id) is waiting on the server.
    pub fn is_loading(&self, id: &str, action: Action) -> bool {
        self.state()
            .in_flight
            .contains_key(&(id.to_string(), action))
    }

    /// The last state the server confirmed.
    pub fn interaction(&self, post_id: &str) -> Option<Interaction> {
        self.state().records.get(post_id).copied()
    }

    /// The state a UI should render, including pending like/bookmark toggles.
    pub fn displayed(&self, post_id: &str) -> Interaction {
        let state = self.state();
        let mut record = state.records.get(post_id).copied().unwrap_or_default();
        let pending =
            |action: Action| state.in_flight.contains_key(&(post_id.to_string(), action));

        if pending(Action::Like) {
            record.like_count = flip_count(record.is_liked, record.like_count);
            record.is_liked = !record.is_liked;
        }
        if pending(Action::Bookmark) {
            record.bookmark_count = flip_count(record.is_bookmarked, record.bookmark_count);
            record.is_bookmarked = !record.is_bookmarked;
        }
        record
    }

    pub fn comments(&self, post_id: &str) -> Vec<Comment> {
        self.state()
            .threads
            .get(post_id)
            .map(|t| t.comments.clone())
            .unwrap_or_default()
    }

    /// Whether another page of comments is available for `post_id`.
    pub fn has_more_comments(&self, post_id: &str) -> bool {
        self.state()
            .threads
            .get(post_id)
            .is_some_and(|t| t.page < t.total_pages)
    }

    /// Replaces cached records with the counts carried by freshly loaded posts.
    pub fn seed(&self, posts: &[Post]) {
        let mut state = self.state();
        for post in posts {
            state
                .records
                .insert(post.id.clone(), Interaction::from(post));
        }
    }

    pub async fn load_engagement(&self, post_id: &str) -> Result<Interaction, ClientError> {
        let record = self
            .run(
                post_id,
                Action::Engagement,
                self.inner.api.engagement(post_id),
            )
            .await?;
        self.state().records.insert(post_id.to_string(), record);
        Ok(record)
    }

    /// Reloads several posts' engagement concurrently; failures are reported per post.
    pub async fn refresh_engagement(
        &self,
        post_ids: &[String],
    ) -> Vec<Result<Interaction, ClientError>> {
        join_all(post_ids.iter().map(|id| self.load_engagement(id))).await
    }

    pub async fn toggle_like(&self, post_id: &str) -> Result<Interaction, ClientError> {
        let response = self
            .run(post_id, Action::Like, self.inner.api.toggle_like(post_id))
            .await?;

        let mut state = self.state();
        let record = state.records.entry(post_id.to_string()).or_default();
        record.is_liked = response.is_liked;
        record.like_count = response.like_count;
        tracing::info!(post_id, liked = response.is_liked, "Like updated");
        Ok(*record)
    }

    pub async fn toggle_bookmark(&self, post_id: &str) -> Result<Interaction, ClientError> {
        let response = self
            .run(
                post_id,
                Action::Bookmark,
                self.inner.api.toggle_bookmark(post_id),
            )
            .await?;

        let mut state = self.state();
        let record = state.records.entry(post_id.to_string()).or_default();
        record.is_bookmarked = response.is_bookmarked;
        record.bookmark_count = response.bookmark_count;
        tracing::info!(post_id, bookmarked = response.is_bookmarked, "Bookmark updated");
        Ok(*record)
    }

    pub async fn share_post(
        &self,
        post_id: &str,
        platform: SharePlatform,
    ) -> Result<Interaction, ClientError> {
        let response = self
            .run(
                post_id,
                Action::Share,
                self.inner.api.share(post_id, platform),
            )
            .await?;

        let mut state = self.state();
        let record = state.records.entry(post_id.to_string()).or_default();
        record.share_count = response.share_count;
        tracing::info!(post_id, ?platform, "Post shared");
        Ok(*record)
    }

    /// Records a view once per session. Returns the spawned request, or
    /// `None` if this post was already viewed.
    pub fn increment_views(&self, post_id: &str) -> Option<JoinHandle<()>> {
        if !self.state().viewed.insert(post_id.to_string()) {
            return None;
        }

        let store = self.clone();
        let post_id = post_id.to_string();
        Some(tokio::spawn(async move {
            match store.inner.api.record_view(&post_id).await {
                Ok(response) => {
                    let mut state = store.state();
                    state.records.entry(post_id).or_default().views = response.views;
                }
                Err(e) => tracing::debug!(%post_id, error = %e, "View not recorded"),
            }
        }))
    }

    /// Forgets which posts were viewed, as when a new session begins.
    pub fn reset_session(&self) {
        self.state().viewed.clear();
    }

    pub async fn load_bookmarks(&self) -> Result<Vec<Post>, ClientError> {
        let posts = self.inner.api.bookmarks().await.map_err(|e| self.reject(e))?;

        let mut state = self.state();
        for post in &posts {
            let mut record = Interaction::from(post);
            record.is_bookmarked = true;
            state.records.insert(post.id.clone(), record);
        }
        Ok(posts)
    }

    /// Loads a page of comments. Page 1 replaces the cached list; later pages append.
    pub async fn load_comments(
        &self,
        post_id: &str,
        page: u32,
    ) -> Result<Vec<Comment>, ClientError> {
        let page = page.max(1);
        let response = self
            .run(
                post_id,
                Action::LoadComments,
                self.inner.api.list_comments(post_id, page),
            )
            .await?;

        let mut state = self.state();
        let thread = state.threads.entry(post_id.to_string()).or_default();
        if page == 1 {
            thread.comments = response.comments;
        } else {
            thread.comments.extend(response.comments);
        }
        thread.page = response.page;
        thread.total_pages = response.total_pages;
        Ok(thread.comments.clone())
    }

    pub async fn add_comment(
        &self,
        post_id: &str,
        text: &str,
        parent_id: Option<&str>,
    ) -> Result<Comment, ClientError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(self.reject(ClientError::Validation(
                "Comment cannot be empty".to_string(),
            )));
        }

        let request = NewComment {
            text: text.to_string(),
            parent_comment: parent_id.map(str::to_string),
        };
        let added = self
            .run(
                post_id,
                Action::AddComment,
                self.inner.api.add_comment(post_id, &request),
            )
            .await?;

        let mut state = self.state();
        state
            .threads
            .entry(post_id.to_string())
            .or_default()
            .comments
            .insert(0, added.comment.clone());
        state
            .records
            .entry(post_id.to_string())
            .or_default()
            .comment_count = added.comment_count;
        tracing::info!(post_id, comment_id = %added.comment.id, "Comment added");
        Ok(added.comment)
    }

    pub async fn edit_comment(
        &self,
        post_id: &str,
        comment_id: &str,
        text: &str,
    ) -> Result<Comment, ClientError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(self.reject(ClientError::Validation(
                "Comment cannot be empty".to_string(),
            )));
        }

        let updated = self
            .run(
                comment_id,
                Action::EditComment,
                self.inner.api.edit_comment(comment_id, text),
            )
            .await?;

        if let Some(thread) = self.state().threads.get_mut(post_id) {
            if let Some(slot) = thread.comments.iter_mut().find(|c| c.id == comment_id) {
                *slot = updated.clone();
            }
        }
        Ok(updated)
    }

    /// Deletes a comment together with its replies.
    pub async fn delete_comment(&self, post_id: &str, comment_id: &str) -> Result<(), ClientError> {
        let deleted = self
            .run(
                comment_id,
                Action::DeleteComment,
                self.inner.api.delete_comment(comment_id),
            )
            .await?;

        let mut state = self.state();
        if let Some(thread) = state.threads.get_mut(post_id) {
            thread.comments.retain(|c| {
                c.id != comment_id && c.parent_comment.as_deref() != Some(comment_id)
            });
        }
        state
            .records
            .entry(post_id.to_string())
            .or_default()
            .comment_count = deleted.comment_count;
        tracing::info!(post_id, comment_id, "Comment deleted");
        Ok(())
    }

    pub async fn toggle_comment_like(
        &self,
        post_id: &str,
        comment_id: &str,
    ) -> Result<CommentLikeResponse, ClientError> {
        let response = self
            .run(
                comment_id,
                Action::LikeComment,
                self.inner.api.toggle_comment_like(comment_id),
            )
            .await?;

        if let Some(thread) = self.state().threads.get_mut(post_id) {
            if let Some(comment) = thread.comments.iter_mut().find(|c| c.id == comment_id) {
                comment.is_liked = response.is_liked;
                comment.like_count = response.like_count;
            }
        }
        Ok(response)
    }
}

fn flip_count(currently_on: bool, count: u64) -> u64 {
    if currently_on {
        count.saturating_sub(1)
    } else {
        count + 1
    }
}
