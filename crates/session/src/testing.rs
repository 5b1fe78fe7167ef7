//! In-memory backend that records every call, for relay and sign-in tests.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use parley_core::types::{
    Channel, CreateChannelRequest, MessageEvent, RecordMessageEventRequest, RegisterUserRequest,
    UpdateUserRequest, User,
};

use crate::client::{ChatBackend, ClientError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    RegisterOrUpdate {
        user_id: String,
        nickname: String,
        profile_url: String,
    },
    UpdateUser {
        user_id: String,
        nickname: String,
        profile_url: String,
    },
    CreateChannel {
        channel_url: String,
        created_by: String,
        chatmate_id: Option<String>,
        message_count: i32,
    },
    IncrementMessageCount {
        channel_url: String,
    },
    RecordMessageEvent {
        channel_url: String,
        user_id: String,
        message_type: String,
    },
    DeleteChannel {
        channel_url: String,
    },
}

#[derive(Default)]
pub struct RecordingBackend {
    calls: Mutex<Vec<Call>>,
    fail_all: bool,
    missing_channels: bool,
}

impl RecordingBackend {
    /// Every call is recorded and then answered with a 500.
    pub fn failing() -> Self {
        Self {
            fail_all: true,
            ..Self::default()
        }
    }

    /// Channel-scoped calls answer 404, as for an unknown or deleted channel.
    pub fn missing_channels() -> Self {
        Self {
            missing_channels: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call, channel_scoped: bool) -> Result<(), ClientError> {
        self.calls.lock().unwrap().push(call);
        if self.fail_all {
            return Err(ClientError::Server("Failed".to_string()));
        }
        if channel_scoped && self.missing_channels {
            return Err(ClientError::NotFound("Channel not found".to_string()));
        }
        Ok(())
    }
}

fn channel(url: &str, created_by: &str, chatmate_id: Option<String>, count: i32) -> Channel {
    let now = Utc::now();
    Channel {
        channel_url: url.to_string(),
        created_by: created_by.to_string(),
        chatmate_id,
        message_count: count,
        deleted: false,
        created_at: now,
        updated_at: now,
    }
}

fn user(user_id: &str, nickname: &str, profile_url: &str) -> User {
    let now = Utc::now();
    User {
        user_id: user_id.to_string(),
        nickname: nickname.to_string(),
        profile_url: profile_url.to_string(),
        deleted: false,
        created_at: now,
        updated_at: now,
    }
}

#[async_trait]
impl ChatBackend for RecordingBackend {
    async fn register_or_update(&self, req: &RegisterUserRequest) -> Result<User, ClientError> {
        self.record(
            Call::RegisterOrUpdate {
                user_id: req.user_id.clone(),
                nickname: req.nickname.clone(),
                profile_url: req.profile_url.clone(),
            },
            false,
        )?;
        Ok(user(&req.user_id, &req.nickname, &req.profile_url))
    }

    async fn update_user(
        &self,
        user_id: &str,
        update: &UpdateUserRequest,
    ) -> Result<User, ClientError> {
        self.record(
            Call::UpdateUser {
                user_id: user_id.to_string(),
                nickname: update.nickname.clone(),
                profile_url: update.profile_url.clone(),
            },
            false,
        )?;
        Ok(user(user_id, &update.nickname, &update.profile_url))
    }

    async fn create_channel(&self, req: &CreateChannelRequest) -> Result<Channel, ClientError> {
        self.record(
            Call::CreateChannel {
                channel_url: req.channel_url.clone(),
                created_by: req.created_by.clone(),
                chatmate_id: req.chatmate_id.clone(),
                message_count: req.message_count,
            },
            false,
        )?;
        Ok(channel(
            &req.channel_url,
            &req.created_by,
            req.chatmate_id.clone(),
            req.message_count,
        ))
    }

    async fn increment_message_count(&self, channel_url: &str) -> Result<Channel, ClientError> {
        self.record(
            Call::IncrementMessageCount {
                channel_url: channel_url.to_string(),
            },
            true,
        )?;
        Ok(channel(channel_url, "u1", None, 1))
    }

    async fn record_message_event(
        &self,
        req: &RecordMessageEventRequest,
    ) -> Result<MessageEvent, ClientError> {
        self.record(
            Call::RecordMessageEvent {
                channel_url: req.channel_url.clone(),
                user_id: req.user_id.clone(),
                message_type: req.message_type.clone(),
            },
            false,
        )?;
        Ok(MessageEvent {
            id: 1,
            channel_url: req.channel_url.clone(),
            user_id: req.user_id.clone(),
            message_type: req.message_type.clone(),
            created_at: Utc::now(),
        })
    }

    async fn delete_channel(&self, channel_url: &str) -> Result<Channel, ClientError> {
        self.record(
            Call::DeleteChannel {
                channel_url: channel_url.to_string(),
            },
            true,
        )?;
        let mut deleted = channel(channel_url, "u1", None, 0);
        deleted.deleted = true;
        Ok(deleted)
    }
}
