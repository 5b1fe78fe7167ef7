//! User registry.
//!
//! Users are keyed by the identity the chat SDK assigns. Registration is an
//! upsert, so the sign-in flow and every SDK reconnect can call it freely.

use crate::models::User;
use sqlx::PgPool;

/// Insert a user, or overwrite nickname and profile URL if the id exists.
pub async fn register_or_update(
    pool: &PgPool,
    user_id: &str,
    nickname: &str,
    profile_url: &str,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (user_id, nickname, profile_url)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id) DO UPDATE SET
            nickname = EXCLUDED.nickname,
            profile_url = EXCLUDED.profile_url,
            updated_at = now()
        RETURNING user_id, nickname, profile_url, deleted, created_at, updated_at
        "#,
    )
    .bind(user_id)
    .bind(nickname)
    .bind(profile_url)
    .fetch_one(pool)
    .await
}

/// Fetch a live user. Soft-deleted users are treated as absent.
pub async fn get(pool: &PgPool, user_id: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT user_id, nickname, profile_url, deleted, created_at, updated_at
        FROM users
        WHERE user_id = $1 AND deleted = FALSE
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

pub async fn update(
    pool: &PgPool,
    user_id: &str,
    nickname: &str,
    profile_url: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        UPDATE users
        SET nickname = $1, profile_url = $2, updated_at = now()
        WHERE user_id = $3 AND deleted = FALSE
        RETURNING user_id, nickname, profile_url, deleted, created_at, updated_at
        "#,
    )
    .bind(nickname)
    .bind(profile_url)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}
