use chrono::{DateTime, Utc};
use parley_core::types;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub user_id: String,
    pub nickname: String,
    pub profile_url: String,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Channel {
    pub channel_url: String,
    pub created_by: String,
    pub chatmate_id: Option<String>,
    pub message_count: i32,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ChannelDetail {
    #[sqlx(flatten)]
    pub channel: Channel,
    pub created_by_nickname: Option<String>,
    pub chatmate_nickname: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MessageEvent {
    pub id: i64,
    pub channel_url: String,
    pub user_id: String,
    pub message_type: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MessageEventEntry {
    #[sqlx(flatten)]
    pub event: MessageEvent,
    pub user_nickname: Option<String>,
    pub created_by: Option<String>,
}

impl From<User> for types::User {
    fn from(user: User) -> Self {
        Self {
            user_id: user.user_id,
            nickname: user.nickname,
            profile_url: user.profile_url,
            deleted: user.deleted,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

impl From<Channel> for types::Channel {
    fn from(channel: Channel) -> Self {
        Self {
            channel_url: channel.channel_url,
            created_by: channel.created_by,
            chatmate_id: channel.chatmate_id,
            message_count: channel.message_count,
            deleted: channel.deleted,
            created_at: channel.created_at,
            updated_at: channel.updated_at,
        }
    }
}

impl From<ChannelDetail> for types::ChannelDetail {
    fn from(detail: ChannelDetail) -> Self {
        Self {
            channel: detail.channel.into(),
            created_by_nickname: detail.created_by_nickname,
            chatmate_nickname: detail.chatmate_nickname,
        }
    }
}

impl From<MessageEvent> for types::MessageEvent {
    fn from(event: MessageEvent) -> Self {
        Self {
            id: event.id,
            channel_url: event.channel_url,
            user_id: event.user_id,
            message_type: event.message_type,
            created_at: event.created_at,
        }
    }
}

impl From<MessageEventEntry> for types::MessageEventEntry {
    fn from(entry: MessageEventEntry) -> Self {
        Self {
            event: entry.event.into(),
            user_nickname: entry.user_nickname,
            created_by: entry.created_by,
        }
    }
}
