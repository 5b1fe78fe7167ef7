//! Channel registry.
//!
//! Channels are keyed by the URL the chat SDK assigns. They are never removed:
//! deletion sets a tombstone, after which the message counter stops moving.

use crate::models::{Channel, ChannelDetail};
use sqlx::PgPool;

/// Create a channel. Re-creating an existing URL only refreshes `updated_at`;
/// the stored creator, chatmate and count win over the supplied ones.
pub async fn create_or_touch(
    pool: &PgPool,
    channel_url: &str,
    created_by: &str,
    chatmate_id: Option<&str>,
    initial_message_count: i32,
) -> Result<Channel, sqlx::Error> {
    sqlx::query_as::<_, Channel>(
        r#"
        INSERT INTO channels (channel_url, created_by, chatmate_id, message_count)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (channel_url) DO UPDATE SET
            updated_at = now()
        RETURNING channel_url, created_by, chatmate_id, message_count,
                  deleted, created_at, updated_at
        "#,
    )
    .bind(channel_url)
    .bind(created_by)
    .bind(chatmate_id)
    .bind(initial_message_count)
    .fetch_one(pool)
    .await
}

/// Fetch a channel with creator and chatmate nicknames. Tombstoned channels
/// are returned too.
pub async fn get(pool: &PgPool, channel_url: &str) -> Result<Option<ChannelDetail>, sqlx::Error> {
    sqlx::query_as::<_, ChannelDetail>(
        r#"
        SELECT c.channel_url, c.created_by, c.chatmate_id, c.message_count,
               c.deleted, c.created_at, c.updated_at,
               u1.nickname AS created_by_nickname,
               u2.nickname AS chatmate_nickname
        FROM channels c
        LEFT JOIN users u1 ON c.created_by = u1.user_id
        LEFT JOIN users u2 ON c.chatmate_id = u2.user_id
        WHERE c.channel_url = $1
        "#,
    )
    .bind(channel_url)
    .fetch_optional(pool)
    .await
}

/// All live channels, newest first.
pub async fn list(pool: &PgPool) -> Result<Vec<ChannelDetail>, sqlx::Error> {
    sqlx::query_as::<_, ChannelDetail>(
        r#"
        SELECT c.channel_url, c.created_by, c.chatmate_id, c.message_count,
               c.deleted, c.created_at, c.updated_at,
               u1.nickname AS created_by_nickname,
               u2.nickname AS chatmate_nickname
        FROM channels c
        LEFT JOIN users u1 ON c.created_by = u1.user_id
        LEFT JOIN users u2 ON c.chatmate_id = u2.user_id
        WHERE c.deleted = FALSE
        ORDER BY c.created_at DESC
        "#,
    )
    .fetch_all(pool)
    .await
}

/// Tombstone a channel. Deleting twice succeeds and re-touches the row.
pub async fn soft_delete(pool: &PgPool, channel_url: &str) -> Result<Option<Channel>, sqlx::Error> {
    sqlx::query_as::<_, Channel>(
        r#"
        UPDATE channels
        SET deleted = TRUE, updated_at = now()
        WHERE channel_url = $1
        RETURNING channel_url, created_by, chatmate_id, message_count,
                  deleted, created_at, updated_at
        "#,
    )
    .bind(channel_url)
    .fetch_optional(pool)
    .await
}

/// Bump the message counter of a live channel by one.
///
/// The increment happens inside the UPDATE so concurrent deliveries for the
/// same channel serialize on the row lock and none are lost.
pub async fn increment_message_count(
    pool: &PgPool,
    channel_url: &str,
) -> Result<Option<Channel>, sqlx::Error> {
    sqlx::query_as::<_, Channel>(
        r#"
        UPDATE channels
        SET message_count = message_count + 1,
            updated_at = now()
        WHERE channel_url = $1 AND deleted = FALSE
        RETURNING channel_url, created_by, chatmate_id, message_count,
                  deleted, created_at, updated_at
        "#,
    )
    .bind(channel_url)
    .fetch_optional(pool)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::users;
    use futures_util::future::join_all;

    #[sqlx::test(migrator = "crate::MIGRATOR")]
    #[ignore = "requires a Postgres DATABASE_URL"]
    async fn test_create_twice_keeps_original_fields(pool: PgPool) {
        let first = create_or_touch(&pool, "ch_1", "u1", Some("u2"), 0)
            .await
            .unwrap();
        let second = create_or_touch(&pool, "ch_1", "u9", None, 7).await.unwrap();

        assert_eq!(second.created_by, "u1");
        assert_eq!(second.chatmate_id.as_deref(), Some("u2"));
        assert_eq!(second.message_count, 0);
        assert_eq!(second.created_at, first.created_at);
        assert!(second.updated_at > first.updated_at);
    }

    #[sqlx::test(migrator = "crate::MIGRATOR")]
    #[ignore = "requires a Postgres DATABASE_URL"]
    async fn test_get_joins_nicknames(pool: PgPool) {
        users::register_or_update(&pool, "u1", "Alice", "").await.unwrap();
        create_or_touch(&pool, "ch_1", "u1", Some("u2"), 0)
            .await
            .unwrap();

        let detail = get(&pool, "ch_1").await.unwrap().unwrap();
        assert_eq!(detail.created_by_nickname.as_deref(), Some("Alice"));
        assert_eq!(detail.chatmate_nickname, None);
        assert_eq!(detail.channel.chatmate_id.as_deref(), Some("u2"));

        assert!(get(&pool, "ch_missing").await.unwrap().is_none());
    }

    #[sqlx::test(migrator = "crate::MIGRATOR")]
    #[ignore = "requires a Postgres DATABASE_URL"]
    async fn test_list_excludes_deleted_and_orders_newest_first(pool: PgPool) {
        create_or_touch(&pool, "ch_old", "u1", None, 0).await.unwrap();
        create_or_touch(&pool, "ch_gone", "u1", None, 0).await.unwrap();
        create_or_touch(&pool, "ch_new", "u1", None, 0).await.unwrap();
        sqlx::query(
            "UPDATE channels SET created_at = now() - interval '1 hour' WHERE channel_url = 'ch_old'",
        )
        .execute(&pool)
        .await
        .unwrap();
        soft_delete(&pool, "ch_gone").await.unwrap();

        let urls: Vec<String> = list(&pool)
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.channel.channel_url)
            .collect();
        assert_eq!(urls, vec!["ch_new".to_string(), "ch_old".to_string()]);
    }

    #[sqlx::test(migrator = "crate::MIGRATOR")]
    #[ignore = "requires a Postgres DATABASE_URL"]
    async fn test_soft_delete_is_idempotent(pool: PgPool) {
        create_or_touch(&pool, "ch_1", "u1", None, 0).await.unwrap();

        let first = soft_delete(&pool, "ch_1").await.unwrap().unwrap();
        let second = soft_delete(&pool, "ch_1").await.unwrap().unwrap();
        assert!(first.deleted);
        assert!(second.deleted);
        assert!(second.updated_at >= first.updated_at);

        assert!(soft_delete(&pool, "ch_missing").await.unwrap().is_none());
    }

    #[sqlx::test(migrator = "crate::MIGRATOR")]
    #[ignore = "requires a Postgres DATABASE_URL"]
    async fn test_concurrent_increments_are_not_lost(pool: PgPool) {
        create_or_touch(&pool, "ch_busy", "u1", None, 0).await.unwrap();

        let n = 50;
        let results = join_all((0..n).map(|_| {
            let pool = pool.clone();
            async move { increment_message_count(&pool, "ch_busy").await }
        }))
        .await;
        assert!(results.iter().all(|r| matches!(r, Ok(Some(_)))));

        let detail = get(&pool, "ch_busy").await.unwrap().unwrap();
        assert_eq!(detail.channel.message_count, n);
    }

    #[sqlx::test(migrator = "crate::MIGRATOR")]
    #[ignore = "requires a Postgres DATABASE_URL"]
    async fn test_increment_stops_after_soft_delete(pool: PgPool) {
        create_or_touch(&pool, "ch_1", "u1", None, 0).await.unwrap();
        increment_message_count(&pool, "ch_1").await.unwrap().unwrap();
        soft_delete(&pool, "ch_1").await.unwrap().unwrap();

        assert!(increment_message_count(&pool, "ch_1").await.unwrap().is_none());
        assert!(increment_message_count(&pool, "ch_missing")
            .await
            .unwrap()
            .is_none());

        let detail = get(&pool, "ch_1").await.unwrap().unwrap();
        assert_eq!(detail.channel.message_count, 1);
        assert!(detail.channel.deleted);
    }
}
