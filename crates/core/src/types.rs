use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_MESSAGE_TYPE: &str = "user";

fn default_message_type() -> String {
    DEFAULT_MESSAGE_TYPE.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub user_id: String,
    pub nickname: String,
    pub profile_url: String,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Channel {
    pub channel_url: String,
    pub created_by: String,
    pub chatmate_id: Option<String>,
    pub message_count: i32,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A channel with the nicknames of its creator and chatmate, when known.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChannelDetail {
    #[serde(flatten)]
    pub channel: Channel,
    pub created_by_nickname: Option<String>,
    pub chatmate_nickname: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageEvent {
    pub id: i64,
    pub channel_url: String,
    pub user_id: String,
    pub message_type: String,
    pub created_at: DateTime<Utc>,
}

/// A logged event joined with the sender's nickname and the channel creator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageEventEntry {
    #[serde(flatten)]
    pub event: MessageEvent,
    pub user_nickname: Option<String>,
    pub created_by: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterUserRequest {
    pub user_id: String,
    pub nickname: String,
    #[serde(default)]
    pub profile_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateUserRequest {
    pub nickname: String,
    #[serde(default)]
    pub profile_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateChannelRequest {
    pub channel_url: String,
    pub created_by: String,
    #[serde(default)]
    pub chatmate_id: Option<String>,
    #[serde(default)]
    pub message_count: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageCountRequest {
    pub channel_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordMessageEventRequest {
    pub channel_url: String,
    pub user_id: String,
    #[serde(default = "default_message_type")]
    pub message_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub success: bool,
    pub user: User,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelResponse {
    pub success: bool,
    pub channel: Channel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelDetailResponse {
    pub success: bool,
    pub channel: ChannelDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelListResponse {
    pub success: bool,
    pub channels: Vec<ChannelDetail>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageEventResponse {
    pub success: bool,
    pub event: MessageEvent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageEventListResponse {
    pub success: bool,
    pub events: Vec<MessageEventEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub success: bool,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}
