//! Data Transfer Objects - request/response types for the API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request to log in as the blog administrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response containing an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// The authenticated administrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminProfile {
    pub email: String,
    pub roles: Vec<String>,
    pub expires_at: i64,
}

/// `?page=&page_size=` (1-based).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageParams {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

/// `?limit=&days=` for featured, topic and popular listings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListParams {
    pub limit: Option<u64>,
    pub days: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThreadParams {
    #[serde(default)]
    pub threaded: bool,
    pub max_depth: Option<usize>,
}

/// A reader's comment; the post comes from the path.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateCommentRequest {
    #[serde(default)]
    pub author_name: String,
    #[serde(default)]
    pub author_email: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscribeRequest {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// An email given either in the query string or the body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmailParams {
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionStatus {
    pub email: String,
    /// `absent`, `active` or `unsubscribed`.
    pub state: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountResponse {
    pub count: u64,
}

/// Outcome of a like: `confirmed` with the stored count, or `reverted`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LikeResponse {
    pub state: String,
    pub like_count: u64,
}

/// Which email the dispatch endpoint should send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailKind {
    Test,
    Welcome,
    BlogNotification,
}

/// Body of `POST /api/email`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailDispatchRequest {
    #[serde(rename = "type")]
    pub kind: EmailKind,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub html: Option<String>,
    #[serde(default)]
    pub blog_data: Option<BlogData>,
    #[serde(default)]
    pub subscribers: Option<Vec<RecipientData>>,
}

/// A post as sent by clients of the dispatch endpoint. Accepts stored
/// column names as well as the API's own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlogData {
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default, alias = "blog_topic")]
    pub topic: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "one_minute", alias = "reading_time")]
    pub reading_time_minutes: u32,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

fn one_minute() -> u32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipientData {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}
