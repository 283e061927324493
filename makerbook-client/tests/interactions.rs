use async_trait::async_trait;
use makerbook_client::models::*;
use makerbook_client::{
    Action, ClientError, InteractionApi, InteractionStore, Notification, Notifier,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

const PAGE_SIZE: usize = 2;

#[derive(Default)]
struct Backend {
    liked: bool,
    likes: u64,
    bookmarked: bool,
    bookmarks: u64,
    shares: u64,
    views: u64,
    comments: Vec<Comment>,
    next_comment: u32,
}

/// In-memory stand-in for the interaction endpoints. Other users keep
/// liking the post, so counts move by more than the caller's own toggle.
#[derive(Default)]
struct FakeApi {
    backend: Mutex<Backend>,
    fail: AtomicBool,
    calls: AtomicUsize,
    gate: Option<Arc<Notify>>,
}

impl FakeApi {
    fn gated(gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    fn with_comments(count: u32) -> Self {
        let api = Self::default();
        {
            let mut backend = api.backend.lock().unwrap();
            for i in 0..count {
                backend
                    .comments
                    .push(comment(&format!("c{}", i), &format!("comment {}", i), None));
            }
            backend.next_comment = count;
        }
        api
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn enter(&self) -> Result<(), ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(ClientError::Api {
                status: 500,
                message: "Server exploded".to_string(),
            });
        }
        Ok(())
    }
}

fn comment(id: &str, text: &str, parent: Option<&str>) -> Comment {
    Comment {
        id: id.to_string(),
        post_id: "p1".to_string(),
        author: Author {
            id: "u1".to_string(),
            username: "ana".to_string(),
            avatar: None,
        },
        text: text.to_string(),
        parent_comment: parent.map(str::to_string),
        like_count: 0,
        is_liked: false,
        is_edited: false,
        created_at: None,
        updated_at: None,
    }
}

#[async_trait]
impl InteractionApi for FakeApi {
    async fn toggle_like(&self, _post_id: &str) -> Result<LikeResponse, ClientError> {
        self.enter().await?;
        let mut b = self.backend.lock().unwrap();
        b.liked = !b.liked;
        b.likes = (if b.liked { b.likes + 1 } else { b.likes - 1 }) + 10;
        Ok(LikeResponse {
            is_liked: b.liked,
            like_count: b.likes,
        })
    }

    async fn toggle_bookmark(&self, _post_id: &str) -> Result<BookmarkResponse, ClientError> {
        self.enter().await?;
        let mut b = self.backend.lock().unwrap();
        b.bookmarked = !b.bookmarked;
        b.bookmarks = if b.bookmarked { b.bookmarks + 1 } else { b.bookmarks - 1 };
        Ok(BookmarkResponse {
            is_bookmarked: b.bookmarked,
            bookmark_count: b.bookmarks,
        })
    }

    async fn list_comments(&self, _post_id: &str, page: u32) -> Result<CommentsPage, ClientError> {
        self.enter().await?;
        let b = self.backend.lock().unwrap();
        let start = (page as usize - 1) * PAGE_SIZE;
        let comments = b.comments.iter().skip(start).take(PAGE_SIZE).cloned().collect();
        Ok(CommentsPage {
            comments,
            page,
            total_pages: b.comments.len().div_ceil(PAGE_SIZE) as u32,
            total: b.comments.len() as u64,
        })
    }

    async fn add_comment(
        &self,
        _post_id: &str,
        new: &NewComment,
    ) -> Result<CommentAdded, ClientError> {
        self.enter().await?;
        let mut b = self.backend.lock().unwrap();
        let id = format!("c{}", b.next_comment);
        b.next_comment += 1;
        let created = comment(&id, &new.text, new.parent_comment.as_deref());
        b.comments.insert(0, created.clone());
        Ok(CommentAdded {
            comment: created,
            comment_count: b.comments.len() as u64,
        })
    }

    async fn edit_comment(&self, comment_id: &str, text: &str) -> Result<Comment, ClientError> {
        self.enter().await?;
        let mut b = self.backend.lock().unwrap();
        let slot = b
            .comments
            .iter_mut()
            .find(|c| c.id == comment_id)
            .ok_or(ClientError::NotFound)?;
        slot.text = text.to_string();
        slot.is_edited = true;
        Ok(slot.clone())
    }

    async fn delete_comment(&self, comment_id: &str) -> Result<CommentDeleted, ClientError> {
        self.enter().await?;
        let mut b = self.backend.lock().unwrap();
        b.comments
            .retain(|c| c.id != comment_id && c.parent_comment.as_deref() != Some(comment_id));
        Ok(CommentDeleted {
            comment_count: b.comments.len() as u64,
        })
    }

    async fn toggle_comment_like(
        &self,
        comment_id: &str,
    ) -> Result<CommentLikeResponse, ClientError> {
        self.enter().await?;
        let mut b = self.backend.lock().unwrap();
        let c = b
            .comments
            .iter_mut()
            .find(|c| c.id == comment_id)
            .ok_or(ClientError::NotFound)?;
        c.is_liked = !c.is_liked;
        c.like_count = if c.is_liked { c.like_count + 1 } else { c.like_count - 1 };
        Ok(CommentLikeResponse {
            is_liked: c.is_liked,
            like_count: c.like_count,
        })
    }

    async fn share(
        &self,
        _post_id: &str,
        _platform: SharePlatform,
    ) -> Result<ShareResponse, ClientError> {
        self.enter().await?;
        let mut b = self.backend.lock().unwrap();
        b.shares += 1;
        Ok(ShareResponse {
            share_count: b.shares,
        })
    }

    async fn record_view(&self, _post_id: &str) -> Result<ViewResponse, ClientError> {
        self.enter().await?;
        let mut b = self.backend.lock().unwrap();
        b.views += 1;
        Ok(ViewResponse { views: b.views })
    }

    async fn engagement(&self, _post_id: &str) -> Result<Interaction, ClientError> {
        self.enter().await?;
        let b = self.backend.lock().unwrap();
        Ok(Interaction {
            is_liked: b.liked,
            like_count: b.likes,
            is_bookmarked: b.bookmarked,
            bookmark_count: b.bookmarks,
            comment_count: b.comments.len() as u64,
            share_count: b.shares,
            views: b.views,
        })
    }

    async fn bookmarks(&self) -> Result<Vec<Post>, ClientError> {
        self.enter().await?;
        Ok(vec![post("p7", 4)])
    }
}

fn post(id: &str, bookmark_count: u64) -> Post {
    Post {
        id: id.to_string(),
        title: "Sourdough".to_string(),
        description: String::new(),
        post_type: PostType::Recipe,
        status: PostStatus::Published,
        steps: Vec::new(),
        materials: Vec::new(),
        tags: Vec::new(),
        author: None,
        like_count: 3,
        bookmark_count,
        comment_count: 0,
        share_count: 0,
        views: 12,
        is_liked: true,
        is_bookmarked: false,
        created_at: None,
        updated_at: None,
    }
}

#[derive(Default)]
struct RecordingNotifier {
    seen: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    fn messages(&self) -> Vec<String> {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .map(|n| n.message.clone())
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.seen.lock().unwrap().push(notification);
    }
}

fn setup(api: FakeApi) -> (Arc<FakeApi>, Arc<RecordingNotifier>, InteractionStore) {
    let api = Arc::new(api);
    let notifier = Arc::new(RecordingNotifier::default());
    let store = InteractionStore::new(api.clone(), notifier.clone());
    (api, notifier, store)
}

#[tokio::test]
async fn like_state_always_matches_latest_server_response() {
    let (api, _, store) = setup(FakeApi::default());

    for n in 1..=5 {
        let returned = store.toggle_like("p1").await.unwrap();
        let b = api.backend.lock().unwrap();

        assert_eq!(returned.is_liked, b.liked, "after {} toggles", n);
        assert_eq!(returned.like_count, b.likes, "after {} toggles", n);
        assert_eq!(store.interaction("p1"), Some(returned));
    }
    assert!(!store.is_loading("p1", Action::Like));
}

#[tokio::test]
async fn failed_toggle_leaves_cache_and_notifies() {
    let (api, notifier, store) = setup(FakeApi::default());
    store.seed(&[post("p1", 2)]);
    let before = store.interaction("p1").unwrap();

    api.fail.store(true, Ordering::SeqCst);
    let err = store.toggle_bookmark("p1").await.unwrap_err();

    assert_eq!(err.to_string(), "Server exploded");
    assert_eq!(store.interaction("p1"), Some(before));
    assert_eq!(notifier.messages(), vec!["Server exploded"]);
    assert!(!store.is_loading("p1", Action::Bookmark));
}

#[tokio::test]
async fn pending_toggle_is_displayed_but_not_committed() {
    let gate = Arc::new(Notify::new());
    let (_, _, store) = setup(FakeApi::gated(gate.clone()));
    store.seed(&[post("p1", 0)]);

    let task = {
        let store = store.clone();
        tokio::spawn(async move { store.toggle_like("p1").await })
    };
    while !store.is_loading("p1", Action::Like) {
        tokio::task::yield_now().await;
    }

    let shown = store.displayed("p1");
    assert!(!shown.is_liked);
    assert_eq!(shown.like_count, 2);
    let cached = store.interaction("p1").unwrap();
    assert!(cached.is_liked);
    assert_eq!(cached.like_count, 3);

    gate.notify_one();
    let committed = task.await.unwrap().unwrap();

    assert!(!store.is_loading("p1", Action::Like));
    assert_eq!(store.displayed("p1"), committed);
    // The fake server started from its own state, not the seeded one.
    assert!(committed.is_liked);
    assert_eq!(committed.like_count, 11);
}

#[tokio::test]
async fn overlapping_toggles_stay_loading_until_the_last_returns() {
    let gate = Arc::new(Notify::new());
    let (api, _, store) = setup(FakeApi::gated(gate.clone()));

    let spawn_toggle = || {
        let store = store.clone();
        tokio::spawn(async move { store.toggle_like("p1").await })
    };
    let first = spawn_toggle();
    let second = spawn_toggle();
    while api.calls() < 2 {
        tokio::task::yield_now().await;
    }

    gate.notify_one();
    while !first.is_finished() && !second.is_finished() {
        tokio::task::yield_now().await;
    }
    assert!(store.is_loading("p1", Action::Like));

    gate.notify_one();
    first.await.unwrap().unwrap();
    second.await.unwrap().unwrap();
    assert!(!store.is_loading("p1", Action::Like));
}

#[tokio::test]
async fn first_page_replaces_and_later_pages_append() {
    let (_, _, store) = setup(FakeApi::with_comments(5));

    let first = store.load_comments("p1", 1).await.unwrap();
    assert_eq!(first.len(), 2);
    assert!(store.has_more_comments("p1"));

    let both = store.load_comments("p1", 2).await.unwrap();
    let ids: Vec<&str> = both.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["c0", "c1", "c2", "c3"]);

    store.load_comments("p1", 3).await.unwrap();
    assert_eq!(store.comments("p1").len(), 5);
    assert!(!store.has_more_comments("p1"));

    let reset = store.load_comments("p1", 1).await.unwrap();
    assert_eq!(reset.len(), 2);
    assert_eq!(store.comments("p1").len(), 2);
}

#[tokio::test]
async fn added_comment_is_prepended_with_server_count() {
    let (_, _, store) = setup(FakeApi::with_comments(3));
    store.load_comments("p1", 1).await.unwrap();

    let added = store.add_comment("p1", "  Lovely crumb!  ", None).await.unwrap();

    assert_eq!(added.text, "Lovely crumb!");
    assert_eq!(store.comments("p1")[0].id, added.id);
    assert_eq!(store.interaction("p1").unwrap().comment_count, 4);
}

#[tokio::test]
async fn blank_comment_never_reaches_the_server() {
    let (api, notifier, store) = setup(FakeApi::default());

    let err = store.add_comment("p1", "   ", None).await.unwrap_err();

    assert!(err.is_validation());
    assert_eq!(api.calls(), 0);
    assert_eq!(notifier.messages().len(), 1);
}

#[tokio::test]
async fn deleting_a_comment_drops_its_replies() {
    let (_, _, store) = setup(FakeApi::with_comments(1));
    store.add_comment("p1", "reply one", Some("c0")).await.unwrap();
    store.add_comment("p1", "unrelated", None).await.unwrap();
    store.load_comments("p1", 1).await.unwrap();
    store.load_comments("p1", 2).await.unwrap();
    assert_eq!(store.comments("p1").len(), 3);

    store.delete_comment("p1", "c0").await.unwrap();

    let texts: Vec<String> = store.comments("p1").into_iter().map(|c| c.text).collect();
    assert_eq!(texts, vec!["unrelated"]);
    assert_eq!(store.interaction("p1").unwrap().comment_count, 1);
}

#[tokio::test]
async fn edit_and_like_update_the_cached_comment() {
    let (_, _, store) = setup(FakeApi::with_comments(2));
    store.load_comments("p1", 1).await.unwrap();

    let edited = store.edit_comment("p1", "c1", "fixed typo").await.unwrap();
    assert!(edited.is_edited);

    let liked = store.toggle_comment_like("p1", "c1").await.unwrap();
    assert!(liked.is_liked);

    let cached = store
        .comments("p1")
        .into_iter()
        .find(|c| c.id == "c1")
        .unwrap();
    assert_eq!(cached.text, "fixed typo");
    assert_eq!(cached.like_count, 1);
    assert!(!store.is_loading("c1", Action::LikeComment));
}

#[tokio::test]
async fn views_are_counted_once_per_session() {
    let (api, _, store) = setup(FakeApi::default());

    store.increment_views("p1").unwrap().await.unwrap();
    assert!(store.increment_views("p1").is_none());
    assert_eq!(api.calls(), 1);
    assert_eq!(store.interaction("p1").unwrap().views, 1);

    store.reset_session();
    store.increment_views("p1").unwrap().await.unwrap();
    assert_eq!(store.interaction("p1").unwrap().views, 2);
}

#[tokio::test]
async fn failed_view_is_silent() {
    let (api, notifier, store) = setup(FakeApi::default());
    api.fail.store(true, Ordering::SeqCst);

    store.increment_views("p1").unwrap().await.unwrap();

    assert!(notifier.messages().is_empty());
    assert!(store.interaction("p1").is_none());
}

#[tokio::test]
async fn share_and_engagement_take_server_counts() {
    let (_, _, store) = setup(FakeApi::default());

    store.share_post("p1", SharePlatform::Pinterest).await.unwrap();
    let shared = store.share_post("p1", SharePlatform::CopyLink).await.unwrap();
    assert_eq!(shared.share_count, 2);

    store.seed(&[post("p1", 9)]);
    let fresh = store.load_engagement("p1").await.unwrap();
    assert_eq!(fresh.bookmark_count, 0);
    assert_eq!(fresh.share_count, 2);
    assert_eq!(store.interaction("p1"), Some(fresh));
}

#[tokio::test]
async fn loaded_bookmarks_are_marked_bookmarked() {
    let (_, _, store) = setup(FakeApi::default());

    let posts = store.load_bookmarks().await.unwrap();

    assert_eq!(posts.len(), 1);
    let record = store.interaction("p7").unwrap();
    assert!(record.is_bookmarked);
    assert_eq!(record.bookmark_count, 4);
}

#[tokio::test]
async fn refresh_reloads_every_post() {
    let (api, _, store) = setup(FakeApi::default());
    store.seed(&[post("p1", 9), post("p2", 9)]);

    let ids = vec!["p1".to_string(), "p2".to_string()];
    let results = store.refresh_engagement(&ids).await;

    assert!(results.iter().all(Result::is_ok));
    assert_eq!(api.calls(), 2);
    assert_eq!(store.interaction("p2").unwrap().bookmark_count, 0);
}
