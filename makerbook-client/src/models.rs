use crate::error::ClientError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Minimum length of a report reason, in characters, after trimming.
pub const MIN_REPORT_REASON_LEN: usize = 10;

// ==================== Users ====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(alias = "_id")]
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Author reference embedded in posts and comments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    #[serde(alias = "_id")]
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

// ==================== Posts ====================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostType {
    #[default]
    Recipe,
    Diy,
}

impl std::fmt::Display for PostType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Recipe => f.write_str("recipe"),
            Self::Diy => f.write_str("diy"),
        }
    }
}

impl std::str::FromStr for PostType {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "recipe" => Ok(Self::Recipe),
            "diy" => Ok(Self::Diy),
            other => Err(ClientError::Validation(format!(
                "Unknown post type '{}', expected 'recipe' or 'diy'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Draft,
    Published,
}

/// An ingredient (recipes) or material (DIY).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calories: Option<f64>,
}

impl Material {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub step_number: u32,
    #[serde(default)]
    pub title: String,
    pub instruction: String,
    /// Minutes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_time: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub materials: Vec<Material>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "PostRecord")]
pub struct Post {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub post_type: PostType,
    pub status: PostStatus,
    pub steps: Vec<Step>,
    pub materials: Vec<Material>,
    pub tags: Vec<String>,
    pub author: Option<Author>,
    pub like_count: u64,
    pub bookmark_count: u64,
    pub comment_count: u64,
    pub share_count: u64,
    pub views: u64,
    pub is_liked: bool,
    pub is_bookmarked: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Wire form of a post. The API may send the item list as `materials`,
/// `ingredients`, or both with one of them empty.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PostRecord {
    #[serde(alias = "_id")]
    id: String,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(rename = "type")]
    post_type: PostType,
    #[serde(default)]
    status: PostStatus,
    #[serde(default)]
    steps: Vec<Step>,
    #[serde(default)]
    materials: Vec<Material>,
    #[serde(default)]
    ingredients: Vec<Material>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    author: Option<Author>,
    #[serde(default)]
    like_count: u64,
    #[serde(default)]
    bookmark_count: u64,
    #[serde(default)]
    comment_count: u64,
    #[serde(default)]
    share_count: u64,
    #[serde(default)]
    views: u64,
    #[serde(default)]
    is_liked: bool,
    #[serde(default)]
    is_bookmarked: bool,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

impl From<PostRecord> for Post {
    fn from(record: PostRecord) -> Self {
        let materials = match record.post_type {
            PostType::Recipe => pick_items(record.ingredients, record.materials),
            PostType::Diy => pick_items(record.materials, record.ingredients),
        };
        Self {
            id: record.id,
            title: record.title,
            description: record.description,
            post_type: record.post_type,
            status: record.status,
            steps: record.steps,
            materials,
            tags: record.tags,
            author: record.author,
            like_count: record.like_count,
            bookmark_count: record.bookmark_count,
            comment_count: record.comment_count,
            share_count: record.share_count,
            views: record.views,
            is_liked: record.is_liked,
            is_bookmarked: record.is_bookmarked,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// The preferred list unless it is empty.
fn pick_items(preferred: Vec<Material>, fallback: Vec<Material>) -> Vec<Material> {
    if preferred.is_empty() {
        fallback
    } else {
        preferred
    }
}

impl Post {
    pub fn to_draft(&self) -> PostDraft {
        PostDraft {
            title: self.title.clone(),
            description: self.description.clone(),
            post_type: self.post_type,
            status: self.status,
            steps: self.steps.clone(),
            materials: self.materials.clone(),
            tags: self.tags.clone(),
        }
    }
}

/// Body of create and update requests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDraft {
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub post_type: PostType,
    pub status: PostStatus,
    pub steps: Vec<Step>,
    pub materials: Vec<Material>,
    pub tags: Vec<String>,
}

impl PostDraft {
    pub fn new(title: impl Into<String>, post_type: PostType) -> Self {
        Self {
            title: title.into(),
            post_type,
            ..Self::default()
        }
    }

    /// Appends a step; its number is assigned from its position.
    pub fn add_step(&mut self, mut step: Step) {
        step.step_number = self.steps.len() as u32 + 1;
        self.steps.push(step);
    }

    /// Removes the step at `index` (zero-based) and renumbers the rest 1..N.
    pub fn remove_step(&mut self, index: usize) -> Option<Step> {
        if index >= self.steps.len() {
            return None;
        }
        let removed = self.steps.remove(index);
        renumber_steps(&mut self.steps);
        Some(removed)
    }

    pub fn validate(&self) -> Result<(), ClientError> {
        if self.title.trim().is_empty() {
            return Err(ClientError::Validation("Title cannot be empty".to_string()));
        }
        if self.steps.is_empty() {
            return Err(ClientError::Validation(
                "Add at least one step".to_string(),
            ));
        }
        if self.steps.iter().any(|s| s.instruction.trim().is_empty()) {
            return Err(ClientError::Validation(
                "Every step needs an instruction".to_string(),
            ));
        }
        Ok(())
    }
}

pub fn renumber_steps(steps: &mut [Step]) {
    for (i, step) in steps.iter_mut().enumerate() {
        step.step_number = i as u32 + 1;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostsPage {
    pub posts: Vec<Post>,
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total: u64,
}

fn first_page() -> u32 {
    1
}

// ==================== Interactions ====================

/// Client-side cache of one post's engagement and the current user's relation to it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interaction {
    #[serde(default)]
    pub is_liked: bool,
    #[serde(default)]
    pub like_count: u64,
    #[serde(default)]
    pub is_bookmarked: bool,
    #[serde(default)]
    pub bookmark_count: u64,
    #[serde(default)]
    pub comment_count: u64,
    #[serde(default)]
    pub share_count: u64,
    #[serde(default)]
    pub views: u64,
}

impl From<&Post> for Interaction {
    fn from(post: &Post) -> Self {
        Self {
            is_liked: post.is_liked,
            like_count: post.like_count,
            is_bookmarked: post.is_bookmarked,
            bookmark_count: post.bookmark_count,
            comment_count: post.comment_count,
            share_count: post.share_count,
            views: post.views,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeResponse {
    pub is_liked: bool,
    pub like_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkResponse {
    pub is_bookmarked: bool,
    pub bookmark_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareResponse {
    pub share_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewResponse {
    pub views: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SharePlatform {
    Facebook,
    Twitter,
    Pinterest,
    Whatsapp,
    Email,
    CopyLink,
}

impl std::str::FromStr for SharePlatform {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "facebook" => Ok(Self::Facebook),
            "twitter" | "x" => Ok(Self::Twitter),
            "pinterest" => Ok(Self::Pinterest),
            "whatsapp" => Ok(Self::Whatsapp),
            "email" => Ok(Self::Email),
            "copy_link" | "copy-link" | "link" => Ok(Self::CopyLink),
            other => Err(ClientError::Validation(format!(
                "Unknown share platform '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ShareRequest {
    pub platform: SharePlatform,
}

// ==================== Comments ====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(alias = "post")]
    pub post_id: String,
    pub author: Author,
    pub text: String,
    #[serde(default)]
    pub parent_comment: Option<String>,
    #[serde(default)]
    pub like_count: u64,
    #[serde(default)]
    pub is_liked: bool,
    #[serde(default)]
    pub is_edited: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_comment: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EditComment {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentsPage {
    pub comments: Vec<Comment>,
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentAdded {
    pub comment: Comment,
    pub comment_count: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentDeleted {
    pub comment_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentLikeResponse {
    pub is_liked: bool,
    pub like_count: u64,
}

// ==================== Reports ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportCategory {
    Spam,
    Harassment,
    Inappropriate,
    Scam,
    Copyright,
    Other,
}

impl std::str::FromStr for ReportCategory {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "spam" => Ok(Self::Spam),
            "harassment" => Ok(Self::Harassment),
            "inappropriate" => Ok(Self::Inappropriate),
            "scam" => Ok(Self::Scam),
            "copyright" => Ok(Self::Copyright),
            "other" => Ok(Self::Other),
            other => Err(ClientError::Validation(format!(
                "Unknown report category '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    pub category: ReportCategory,
    pub reason: String,
    pub reported_user: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorReportRequest {
    pub category: ReportCategory,
    pub reason: String,
    pub vendor: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<String>,
}

fn validate_reason(reason: &str) -> Result<(), ClientError> {
    if reason.trim().chars().count() < MIN_REPORT_REASON_LEN {
        return Err(ClientError::Validation(format!(
            "Please describe the problem in at least {} characters",
            MIN_REPORT_REASON_LEN
        )));
    }
    Ok(())
}

impl ReportRequest {
    pub fn validate(&self) -> Result<(), ClientError> {
        if self.reported_user.trim().is_empty() {
            return Err(ClientError::Validation(
                "Choose who you are reporting".to_string(),
            ));
        }
        validate_reason(&self.reason)
    }
}

impl VendorReportRequest {
    pub fn validate(&self) -> Result<(), ClientError> {
        if self.vendor.trim().is_empty() {
            return Err(ClientError::Validation(
                "Choose the vendor you are reporting".to_string(),
            ));
        }
        validate_reason(&self.reason)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportReceipt {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub message: Option<String>,
}

// ==================== AI suggestions ====================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionRequest {
    pub prompt: String,
    #[serde(rename = "type")]
    pub post_type: PostType,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SuggestionResponse {
    #[serde(default)]
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecipeDetailRequest {
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RecipeDetailRecord")]
pub struct RecipeDetail {
    pub title: String,
    pub description: String,
    pub ingredients: Vec<Material>,
    pub steps: Vec<Step>,
}

#[derive(Deserialize)]
struct RecipeDetailRecord {
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    ingredients: Vec<Material>,
    #[serde(default)]
    materials: Vec<Material>,
    #[serde(default)]
    steps: Vec<Step>,
}

impl From<RecipeDetailRecord> for RecipeDetail {
    fn from(record: RecipeDetailRecord) -> Self {
        Self {
            title: record.title,
            description: record.description,
            ingredients: pick_items(record.ingredients, record.materials),
            steps: record.steps,
        }
    }
}

// ==================== Media ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
        }
    }

    /// Guesses the kind and MIME type from a file extension.
    pub fn from_extension(ext: &str) -> Option<(Self, &'static str)> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some((Self::Image, "image/jpeg")),
            "png" => Some((Self::Image, "image/png")),
            "gif" => Some((Self::Image, "image/gif")),
            "webp" => Some((Self::Image, "image/webp")),
            "mp4" => Some((Self::Video, "video/mp4")),
            "webm" => Some((Self::Video, "video/webm")),
            "mov" => Some((Self::Video, "video/quicktime")),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedMedia {
    pub url: String,
    #[serde(rename = "type")]
    pub kind: MediaKind,
}
