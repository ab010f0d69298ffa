use chrono::Utc;
use common::{RegisterPayload, UserProfile};

use crate::db::Db;

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
}

impl User {
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
        }
    }
}

const USER_COLUMNS: &str = "id, username, email, first_name, last_name, password_hash";

pub async fn find_by_id<'e, E>(executor: E, id: i64) -> Result<Option<User>, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Db>,
{
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
    sqlx::query_as::<_, User>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub async fn find_by_username<'e, E>(
    executor: E,
    username: &str,
) -> Result<Option<User>, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Db>,
{
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");
    sqlx::query_as::<_, User>(&sql)
        .bind(username)
        .fetch_optional(executor)
        .await
}

/// Inserts a new account. The caller hashes the password and checks the
/// username is free; the unique index still rejects a concurrent duplicate.
pub async fn insert<'e, E>(
    executor: E,
    payload: &RegisterPayload,
    password_hash: &str,
) -> Result<User, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Db>,
{
    let sql = format!(
        "INSERT INTO users (username, email, first_name, last_name, password_hash, date_joined)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING {USER_COLUMNS}"
    );
    sqlx::query_as::<_, User>(&sql)
        .bind(&payload.username)
        .bind(&payload.email)
        .bind(&payload.first_name)
        .bind(&payload.last_name)
        .bind(password_hash)
        .bind(Utc::now())
        .fetch_one(executor)
        .await
}

/// Removes an account together with everything it owns (leads, refresh token).
/// Returns false when no such user exists.
pub async fn delete<'e, E>(executor: E, id: i64) -> Result<bool, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Db>,
{
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}
