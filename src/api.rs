use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub role: String,
}

/// A post as returned by `GET /posts`. Extra fields the backend sends are
/// ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub content: String,
    pub slogan: String,
    pub likes: i64,
    #[serde(default)]
    pub comments_count: i64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub user: Option<User>,
}

impl Post {
    /// The author's username, if the backend attached a non-empty one.
    pub fn author(&self) -> Option<&str> {
        self.user
            .as_ref()
            .map(|u| u.username.as_str())
            .filter(|name| !name.is_empty())
    }
}

#[derive(Serialize, Deserialize)]
pub struct CreatePostReq {
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LikeRes {
    pub message: String,
    pub liked: bool,
}

#[derive(Serialize, Deserialize)]
pub struct LoginReq {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, Deserialize)]
pub struct RegisterReq {
    pub username: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// Answer to both login and registration; a new account is logged in
/// straight away.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRes {
    pub token: String,
    pub user: User,
}

/// Body the backend sends alongside a non-success status.
#[derive(Deserialize)]
pub struct ApiError {
    pub error: String,
}
