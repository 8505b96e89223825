use crate::models::*;

#[derive(thiserror::Error, Debug)]
pub enum RepoError {
    #[error("not found")] NotFound,
    #[error("conflict")] Conflict,
    #[error("internal: {0}")] Internal(String),
}

pub type RepoResult<T> = Result<T, RepoError>;

use async_trait::async_trait;

#[async_trait]
pub trait UserRepo: Send + Sync {
    /// Fails with `Conflict` when the username is taken.
    async fn create_user(&self, new: NewUser) -> RepoResult<User>;
    async fn find_user_by_username(&self, username: &str) -> RepoResult<Option<User>>;
    /// Inserts unless the username exists; returns whether a row was written.
    async fn insert_user_if_absent(&self, new: NewUser) -> RepoResult<bool>;
}

#[async_trait]
pub trait LostFoundRepo: Send + Sync {
    async fn create_lost_found(&self, new: NewPost) -> RepoResult<Id>;
    /// Newest first.
    async fn list_lost_found(&self) -> RepoResult<Vec<LostFoundPost>>;
}

#[async_trait]
pub trait ComplaintRepo: Send + Sync {
    async fn create_complaint(&self, new: NewPost) -> RepoResult<Id>;
    /// Newest first.
    async fn list_complaints(&self) -> RepoResult<Vec<Complaint>>;
}

#[async_trait]
pub trait MenuRepo: Send + Sync {
    /// Appends a new entry; it becomes the current menu.
    async fn create_menu_entry(&self, new: NewMenuEntry) -> RepoResult<Id>;
    async fn current_menu(&self) -> RepoResult<Option<MenuEntry>>;
    /// Rewrites the current entry's text and bumps its timestamp.
    /// `NotFound` when no entry exists.
    async fn update_current_menu_text(&self, today_update: &str) -> RepoResult<MenuEntry>;
}

pub trait Repo: UserRepo + LostFoundRepo + ComplaintRepo + MenuRepo {}

impl<T> Repo for T where T: UserRepo + LostFoundRepo + ComplaintRepo + MenuRepo {}

pub mod sqlite {
    use super::*;
    use chrono::Utc;
    use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
    use sqlx::{Pool, Sqlite};
    use std::str::FromStr;
    use std::time::Duration;

    fn map_err(e: sqlx::Error) -> RepoError {
        match e {
            sqlx::Error::RowNotFound => RepoError::NotFound,
            sqlx::Error::Database(ref db) if db.is_unique_violation() => RepoError::Conflict,
            other => RepoError::Internal(other.to_string()),
        }
    }

    #[derive(Clone)]
    pub struct SqliteRepo { pool: Pool<Sqlite> }

    impl SqliteRepo {
        pub fn new(pool: Pool<Sqlite>) -> Self { Self { pool } }

        /// Open (creating if missing) the database and run embedded migrations.
        pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
            // user_id references are advisory: posts may name users that do not exist
            let options = SqliteConnectOptions::from_str(database_url)?
                .create_if_missing(true)
                .foreign_keys(false)
                .busy_timeout(Duration::from_secs(5));
            let pool = SqlitePoolOptions::new()
                .max_connections(5)
                .connect_with(options)
                .await?;
            sqlx::migrate!("./migrations").run(&pool).await?;
            Ok(Self::new(pool))
        }

        pub fn pool(&self) -> &Pool<Sqlite> { &self.pool }
    }

    #[async_trait]
    impl UserRepo for SqliteRepo {
        async fn create_user(&self, new: NewUser) -> RepoResult<User> {
            let id = sqlx::query("INSERT INTO users (username, password, role, name) VALUES (?, ?, ?, ?)")
                .bind(&new.username)
                .bind(&new.password_hash)
                .bind(&new.role)
                .bind(&new.name)
                .execute(&self.pool).await.map_err(map_err)?
                .last_insert_rowid();
            Ok(User {
                id,
                username: new.username,
                password_hash: new.password_hash,
                role: new.role,
                name: new.name,
            })
        }

        async fn find_user_by_username(&self, username: &str) -> RepoResult<Option<User>> {
            sqlx::query_as::<_, User>("SELECT id, username, password, role, name FROM users WHERE username = ?")
                .bind(username)
                .fetch_optional(&self.pool).await.map_err(map_err)
        }

        async fn insert_user_if_absent(&self, new: NewUser) -> RepoResult<bool> {
            let res = sqlx::query(
                "INSERT INTO users (username, password, role, name) VALUES (?, ?, ?, ?) ON CONFLICT (username) DO NOTHING"
            )
            .bind(&new.username)
            .bind(&new.password_hash)
            .bind(&new.role)
            .bind(&new.name)
            .execute(&self.pool).await.map_err(map_err)?;
            Ok(res.rows_affected() == 1)
        }
    }

    #[async_trait]
    impl LostFoundRepo for SqliteRepo {
        async fn create_lost_found(&self, new: NewPost) -> RepoResult<Id> {
            let id = sqlx::query("INSERT INTO lost_found (user_id, caption, image_path, created_at) VALUES (?, ?, ?, ?)")
                .bind(new.user_id)
                .bind(&new.caption)
                .bind(&new.image_path)
                .bind(Utc::now())
                .execute(&self.pool).await.map_err(map_err)?
                .last_insert_rowid();
            Ok(id)
        }

        async fn list_lost_found(&self) -> RepoResult<Vec<LostFoundPost>> {
            sqlx::query_as::<_, LostFoundPost>(r#"
                SELECT lf.id, lf.user_id, u.name AS user_name, lf.caption, lf.image_path, lf.created_at
                FROM lost_found lf
                JOIN users u ON lf.user_id = u.id
                ORDER BY lf.created_at DESC, lf.id DESC
            "#)
                .fetch_all(&self.pool).await.map_err(map_err)
        }
    }

    #[async_trait]
    impl ComplaintRepo for SqliteRepo {
        async fn create_complaint(&self, new: NewPost) -> RepoResult<Id> {
            let id = sqlx::query(
                "INSERT INTO complaints (user_id, caption, image_path, status, created_at) VALUES (?, ?, ?, ?, ?)"
            )
            .bind(new.user_id)
            .bind(&new.caption)
            .bind(&new.image_path)
            .bind(DEFAULT_COMPLAINT_STATUS)
            .bind(Utc::now())
            .execute(&self.pool).await.map_err(map_err)?
            .last_insert_rowid();
            Ok(id)
        }

        async fn list_complaints(&self) -> RepoResult<Vec<Complaint>> {
            sqlx::query_as::<_, Complaint>(r#"
                SELECT c.id, c.user_id, u.name AS user_name, u.username, c.caption, c.image_path,
                       c.status, c.created_at
                FROM complaints c
                JOIN users u ON c.user_id = u.id
                ORDER BY c.created_at DESC, c.id DESC
            "#)
                .fetch_all(&self.pool).await.map_err(map_err)
        }
    }

    const CURRENT_MENU_SQL: &str =
        "SELECT id, image_path, today_update, updated_at FROM menu ORDER BY updated_at DESC, id DESC LIMIT 1";

    #[async_trait]
    impl MenuRepo for SqliteRepo {
        async fn create_menu_entry(&self, new: NewMenuEntry) -> RepoResult<Id> {
            let id = sqlx::query("INSERT INTO menu (image_path, today_update, updated_at) VALUES (?, ?, ?)")
                .bind(&new.image_path)
                .bind(&new.today_update)
                .bind(Utc::now())
                .execute(&self.pool).await.map_err(map_err)?
                .last_insert_rowid();
            Ok(id)
        }

        async fn current_menu(&self) -> RepoResult<Option<MenuEntry>> {
            sqlx::query_as::<_, MenuEntry>(CURRENT_MENU_SQL)
                .fetch_optional(&self.pool).await.map_err(map_err)
        }

        async fn update_current_menu_text(&self, today_update: &str) -> RepoResult<MenuEntry> {
            // One statement, so concurrent edits take the write lock up front and wait on busy_timeout.
            sqlx::query_as::<_, MenuEntry>(r#"
                UPDATE menu SET today_update = ?, updated_at = ?
                WHERE id = (SELECT id FROM menu ORDER BY updated_at DESC, id DESC LIMIT 1)
                RETURNING id, image_path, today_update, updated_at
            "#)
                .bind(today_update)
                .bind(Utc::now())
                .fetch_optional(&self.pool).await.map_err(map_err)?
                .ok_or(RepoError::NotFound)
        }
    }
}
