//! Append-only message-event log.
//!
//! Events reference channels and users by key only; neither is checked to
//! exist. The log is an audit trail and is not reconciled with
//! `channels.message_count`.

use crate::models::{MessageEvent, MessageEventEntry};
use sqlx::PgPool;

pub const RECENT_EVENTS_LIMIT: i64 = 100;

pub async fn record(
    pool: &PgPool,
    channel_url: &str,
    user_id: &str,
    message_type: &str,
) -> Result<MessageEvent, sqlx::Error> {
    sqlx::query_as::<_, MessageEvent>(
        r#"
        INSERT INTO message_events (channel_url, user_id, message_type)
        VALUES ($1, $2, $3)
        RETURNING id, channel_url, user_id, message_type, created_at
        "#,
    )
    .bind(channel_url)
    .bind(user_id)
    .bind(message_type)
    .fetch_one(pool)
    .await
}

/// The most recent events, newest first, capped at [`RECENT_EVENTS_LIMIT`].
pub async fn list_recent(pool: &PgPool) -> Result<Vec<MessageEventEntry>, sqlx::Error> {
    sqlx::query_as::<_, MessageEventEntry>(
        r#"
        SELECT me.id, me.channel_url, me.user_id, me.message_type, me.created_at,
               u.nickname AS user_nickname,
               c.created_by
        FROM message_events me
        LEFT JOIN users u ON me.user_id = u.user_id
        LEFT JOIN channels c ON me.channel_url = c.channel_url
        ORDER BY me.created_at DESC, me.id DESC
        LIMIT $1
        "#,
    )
    .bind(RECENT_EVENTS_LIMIT)
    .fetch_all(pool)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::{channels, users};

    #[sqlx::test(migrator = "crate::MIGRATOR")]
    #[ignore = "requires a Postgres DATABASE_URL"]
    async fn test_record_accepts_unknown_references(pool: PgPool) {
        let event = record(&pool, "ch_ghost", "nobody", "user").await.unwrap();
        assert_eq!(event.channel_url, "ch_ghost");
        assert_eq!(event.message_type, "user");

        let entries = list_recent(&pool).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].user_nickname, None);
        assert_eq!(entries[0].created_by, None);
    }

    #[sqlx::test(migrator = "crate::MIGRATOR")]
    #[ignore = "requires a Postgres DATABASE_URL"]
    async fn test_list_recent_joins_sender_and_creator(pool: PgPool) {
        users::register_or_update(&pool, "u2", "Bob", "").await.unwrap();
        channels::create_or_touch(&pool, "ch_1", "u1", Some("u2"), 0)
            .await
            .unwrap();
        record(&pool, "ch_1", "u2", "file").await.unwrap();

        let entries = list_recent(&pool).await.unwrap();
        assert_eq!(entries[0].user_nickname.as_deref(), Some("Bob"));
        assert_eq!(entries[0].created_by.as_deref(), Some("u1"));
        assert_eq!(entries[0].event.message_type, "file");
    }

    #[sqlx::test(migrator = "crate::MIGRATOR")]
    #[ignore = "requires a Postgres DATABASE_URL"]
    async fn test_list_recent_is_capped_and_newest_first(pool: PgPool) {
        for i in 0..120 {
            record(&pool, "ch_1", &format!("u{}", i), "user")
                .await
                .unwrap();
        }

        let entries = list_recent(&pool).await.unwrap();
        assert_eq!(entries.len(), RECENT_EVENTS_LIMIT as usize);
        assert_eq!(entries[0].event.user_id, "u119");
        assert!(entries.windows(2).all(|w| {
            (w[0].event.created_at, w[0].event.id) > (w[1].event.created_at, w[1].event.id)
        }));
    }
}
