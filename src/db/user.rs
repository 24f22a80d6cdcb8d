use sqlx::sqlite::SqlitePool;

use crate::auth::Identity;

#[derive(Clone)]
pub struct UserStore {
    pool: SqlitePool,
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    /// Argon2 PHC string
    pub password_hash: String,
    pub is_admin: bool,
    pub avatar: Option<String>,
}

impl User {
    /// Snapshot of this user for embedding in a session token.
    pub fn identity(&self) -> Identity {
        Identity {
            id: self.id,
            username: self.username.clone(),
            is_admin: self.is_admin,
            avatar: self.avatar.clone(),
        }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    email: String,
    password: String,
    is_admin: i32,
    avatar: Option<String>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            email: row.email,
            password_hash: row.password,
            is_admin: row.is_admin != 0,
            avatar: row.avatar,
        }
    }
}

/// Fields for inserting a new user.
#[derive(Debug, Clone, Copy)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub avatar: Option<&'a str>,
}

impl UserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new regular user. Returns the user ID.
    pub async fn create(&self, user: &NewUser<'_>) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO users (username, email, password, avatar) VALUES (?, ?, ?, ?)",
        )
        .bind(user.username)
        .bind(user.email)
        .bind(user.password_hash)
        .bind(user.avatar)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// Get a user by username.
    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>, sqlx::Error> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, username, email, password, is_admin, avatar FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    /// Check whether the username or the email is already registered.
    pub async fn is_taken(&self, username: &str, email: &str) -> Result<bool, sqlx::Error> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM users WHERE username = ? OR email = ?")
                .bind(username)
                .bind(email)
                .fetch_one(&self.pool)
                .await?;
        Ok(count.0 > 0)
    }

    /// Give a user the admin flag. Returns false if no such user exists.
    ///
    /// Sessions issued before the change keep the old flag until they are replaced by a new login.
    pub async fn grant_admin(&self, username: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET is_admin = 1 WHERE username = ?")
            .bind(username)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
