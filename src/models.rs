use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// SQLite INTEGER PRIMARY KEY
pub type Id = i64;

pub const DEFAULT_ROLE: &str = "student";
pub const DEFAULT_COMPLAINT_STATUS: &str = "pending";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Id,
    pub username: String,
    #[serde(skip_serializing)]
    #[sqlx(rename = "password")]
    pub password_hash: String, // PHC string, never leaves the server
    pub role: String,
    pub name: String,
}

/// Identity returned to clients after register / login.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct PublicUser {
    pub id: Id,
    pub username: String,
    pub role: String,
    pub name: String,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self { id: u.id, username: u.username, role: u.role, name: u.name }
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub role: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub user_id: Id,
    pub caption: String,
    pub image_path: String,
}

/// Lost-and-found row joined with the poster's display name.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LostFoundPost {
    pub id: Id,
    pub user_id: Id,
    pub user_name: String,
    pub caption: String,
    pub image_path: String,
    pub created_at: DateTime<Utc>,
}

/// Complaint row joined with the submitter's name and username.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Complaint {
    pub id: Id,
    pub user_id: Id,
    pub user_name: String,
    pub username: String,
    pub caption: String,
    pub image_path: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewMenuEntry {
    pub image_path: String,
    pub today_update: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MenuEntry {
    pub id: Id,
    pub image_path: String,
    pub today_update: String,
    pub updated_at: DateTime<Utc>,
}

// ---------------- request / response bodies ----------------

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub message: String,
    pub user: PublicUser,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct MenuTextRequest {
    pub today_update: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LostFoundItem {
    pub id: Id,
    pub user_name: String,
    pub caption: String,
    pub image: String, // base64
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ComplaintItem {
    pub id: Id,
    pub user_name: String,
    pub username: String,
    pub caption: String,
    pub image: String, // base64
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MenuItem {
    pub id: Id,
    pub image: String, // base64
    pub today_update: String,
    pub updated_at: DateTime<Utc>,
}
