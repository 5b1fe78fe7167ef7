//! Relays vendor chat SDK callbacks into the API.
//!
//! The SDK owns delivery and membership; the relay only mirrors what it
//! reports. Every write is best effort: a failed call is logged and the next
//! event is still handled.

use parley_core::types::{
    CreateChannelRequest, RecordMessageEventRequest, RegisterUserRequest, DEFAULT_MESSAGE_TYPE,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::client::ChatBackend;
use crate::session::Session;

/// One SDK lifecycle callback, as a line of NDJSON tagged by `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VendorEvent {
    Connected {
        #[serde(default)]
        nickname: Option<String>,
        #[serde(default)]
        profile_url: Option<String>,
    },
    ChannelCreated {
        channel_url: String,
        #[serde(default)]
        members: Vec<String>,
    },
    MessageReceived {
        channel_url: String,
        sender_id: String,
        #[serde(default)]
        message_type: Option<String>,
    },
    ChannelDeleted {
        channel_url: String,
    },
    UserLeft {
        channel_url: String,
        user_id: String,
    },
}

impl VendorEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            VendorEvent::Connected { .. } => "connected",
            VendorEvent::ChannelCreated { .. } => "channel_created",
            VendorEvent::MessageReceived { .. } => "message_received",
            VendorEvent::ChannelDeleted { .. } => "channel_deleted",
            VendorEvent::UserLeft { .. } => "user_left",
        }
    }
}

/// The first member that is not the signed-in user.
pub fn chatmate_of<'a>(members: &'a [String], self_id: &str) -> Option<&'a str> {
    members
        .iter()
        .map(String::as_str)
        .find(|member| *member != self_id)
}

pub struct Relay<B> {
    backend: B,
    selected_channel: Option<String>,
}

impl<B: ChatBackend> Relay<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            selected_channel: None,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn select_channel(&mut self, channel_url: Option<String>) {
        self.selected_channel = channel_url;
    }

    pub fn selected_channel(&self) -> Option<&str> {
        self.selected_channel.as_deref()
    }

    pub async fn handle(&mut self, session: &Session, event: VendorEvent) {
        debug!(kind = event.kind(), user_id = %session.id, "vendor event");
        match event {
            VendorEvent::Connected {
                nickname,
                profile_url,
            } => self.on_connected(session, nickname, profile_url).await,
            VendorEvent::ChannelCreated {
                channel_url,
                members,
            } => self.on_channel_created(session, channel_url, &members).await,
            VendorEvent::MessageReceived {
                channel_url,
                sender_id,
                message_type,
            } => {
                self.on_message_received(channel_url, sender_id, message_type)
                    .await
            }
            VendorEvent::ChannelDeleted { channel_url } => {
                self.on_channel_deleted(channel_url).await
            }
            VendorEvent::UserLeft {
                channel_url,
                user_id,
            } => self.on_user_left(session, &channel_url, &user_id),
        }
    }

    async fn on_connected(
        &self,
        session: &Session,
        nickname: Option<String>,
        profile_url: Option<String>,
    ) {
        let req = RegisterUserRequest {
            user_id: session.id.clone(),
            nickname: nickname.unwrap_or_else(|| session.nickname.clone()),
            profile_url: profile_url.unwrap_or_default(),
        };
        match self.backend.register_or_update(&req).await {
            Ok(user) => info!(user_id = %user.user_id, "user registered"),
            Err(err) => warn!(user_id = %req.user_id, error = %err, "failed to register user"),
        }
    }

    async fn on_channel_created(&self, session: &Session, channel_url: String, members: &[String]) {
        let req = CreateChannelRequest {
            chatmate_id: chatmate_of(members, &session.id).map(str::to_string),
            channel_url,
            created_by: session.id.clone(),
            message_count: 0,
        };
        match self.backend.create_channel(&req).await {
            Ok(channel) => info!(channel_url = %channel.channel_url, "channel recorded"),
            Err(err) => {
                warn!(channel_url = %req.channel_url, error = %err, "failed to record channel")
            }
        }
    }

    /// Counts first, then logs. Both are attempted whatever the other returns.
    async fn on_message_received(
        &self,
        channel_url: String,
        sender_id: String,
        message_type: Option<String>,
    ) {
        if let Err(err) = self.backend.increment_message_count(&channel_url).await {
            warn!(%channel_url, error = %err, "failed to increment message count");
        }

        let req = RecordMessageEventRequest {
            channel_url,
            user_id: sender_id,
            message_type: message_type.unwrap_or_else(|| DEFAULT_MESSAGE_TYPE.to_string()),
        };
        match self.backend.record_message_event(&req).await {
            Ok(event) => debug!(event_id = event.id, channel_url = %event.channel_url, "message logged"),
            Err(err) => {
                warn!(channel_url = %req.channel_url, error = %err, "failed to log message event")
            }
        }
    }

    async fn on_channel_deleted(&self, channel_url: String) {
        match self.backend.delete_channel(&channel_url).await {
            Ok(_) => info!(%channel_url, "channel deleted"),
            Err(err) => warn!(%channel_url, error = %err, "failed to delete channel"),
        }
    }

    fn on_user_left(&mut self, session: &Session, channel_url: &str, user_id: &str) {
        if user_id != session.id {
            return;
        }
        if self.selected_channel.as_deref() == Some(channel_url) {
            self.selected_channel = None;
            info!(%channel_url, "left selected channel");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, RecordingBackend};

    fn alice() -> Session {
        Session {
            id: "u1".to_string(),
            nickname: "Alice".to_string(),
        }
    }

    fn parse(line: &str) -> VendorEvent {
        serde_json::from_str(line).unwrap()
    }

    #[test]
    fn test_parse_event_lines() {
        assert_eq!(
            parse(r#"{"type":"connected"}"#),
            VendorEvent::Connected {
                nickname: None,
                profile_url: None
            }
        );
        assert_eq!(
            parse(r#"{"type":"channel_created","channel_url":"ch_1","members":["u1","u2"]}"#),
            VendorEvent::ChannelCreated {
                channel_url: "ch_1".to_string(),
                members: vec!["u1".to_string(), "u2".to_string()],
            }
        );
        assert_eq!(
            parse(r#"{"type":"message_received","channel_url":"ch_1","sender_id":"u2"}"#).kind(),
            "message_received"
        );
        assert!(serde_json::from_str::<VendorEvent>(r#"{"type":"typing_started"}"#).is_err());
        assert!(serde_json::from_str::<VendorEvent>(r#"{"type":"channel_deleted"}"#).is_err());
    }

    #[test]
    fn test_chatmate_is_first_other_member() {
        let members = vec!["u1".to_string(), "u3".to_string(), "u2".to_string()];
        assert_eq!(chatmate_of(&members, "u1"), Some("u3"));
        assert_eq!(chatmate_of(&members, "u3"), Some("u1"));
        assert_eq!(chatmate_of(&["u1".to_string()], "u1"), None);
        assert_eq!(chatmate_of(&[], "u1"), None);
    }

    #[tokio::test]
    async fn test_connected_registers_with_fallback_nickname() {
        let mut relay = Relay::new(RecordingBackend::default());
        relay
            .handle(
                &alice(),
                VendorEvent::Connected {
                    nickname: None,
                    profile_url: None,
                },
            )
            .await;
        relay
            .handle(
                &alice(),
                VendorEvent::Connected {
                    nickname: Some("Ali".to_string()),
                    profile_url: Some("/uploads/a.png".to_string()),
                },
            )
            .await;

        assert_eq!(
            relay.backend().calls(),
            vec![
                Call::RegisterOrUpdate {
                    user_id: "u1".to_string(),
                    nickname: "Alice".to_string(),
                    profile_url: String::new(),
                },
                Call::RegisterOrUpdate {
                    user_id: "u1".to_string(),
                    nickname: "Ali".to_string(),
                    profile_url: "/uploads/a.png".to_string(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_channel_created_derives_chatmate() {
        let mut relay = Relay::new(RecordingBackend::default());
        relay
            .handle(
                &alice(),
                VendorEvent::ChannelCreated {
                    channel_url: "ch_1".to_string(),
                    members: vec!["u1".to_string(), "u2".to_string()],
                },
            )
            .await;
        relay
            .handle(
                &alice(),
                VendorEvent::ChannelCreated {
                    channel_url: "ch_solo".to_string(),
                    members: vec!["u1".to_string()],
                },
            )
            .await;

        assert_eq!(
            relay.backend().calls(),
            vec![
                Call::CreateChannel {
                    channel_url: "ch_1".to_string(),
                    created_by: "u1".to_string(),
                    chatmate_id: Some("u2".to_string()),
                    message_count: 0,
                },
                Call::CreateChannel {
                    channel_url: "ch_solo".to_string(),
                    created_by: "u1".to_string(),
                    chatmate_id: None,
                    message_count: 0,
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_message_received_increments_then_records() {
        let mut relay = Relay::new(RecordingBackend::default());
        relay
            .handle(
                &alice(),
                VendorEvent::MessageReceived {
                    channel_url: "ch_1".to_string(),
                    sender_id: "u2".to_string(),
                    message_type: None,
                },
            )
            .await;

        assert_eq!(
            relay.backend().calls(),
            vec![
                Call::IncrementMessageCount {
                    channel_url: "ch_1".to_string()
                },
                Call::RecordMessageEvent {
                    channel_url: "ch_1".to_string(),
                    user_id: "u2".to_string(),
                    message_type: "user".to_string(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_message_still_logged_when_increment_fails() {
        let mut relay = Relay::new(RecordingBackend::missing_channels());
        relay
            .handle(
                &alice(),
                VendorEvent::MessageReceived {
                    channel_url: "ch_gone".to_string(),
                    sender_id: "u2".to_string(),
                    message_type: Some("file".to_string()),
                },
            )
            .await;

        let calls = relay.backend().calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(
            calls[1],
            Call::RecordMessageEvent {
                channel_url: "ch_gone".to_string(),
                user_id: "u2".to_string(),
                message_type: "file".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_failures_are_swallowed() {
        let mut relay = Relay::new(RecordingBackend::failing());
        let session = alice();
        for event in [
            VendorEvent::Connected {
                nickname: None,
                profile_url: None,
            },
            VendorEvent::ChannelCreated {
                channel_url: "ch_1".to_string(),
                members: vec![],
            },
            VendorEvent::MessageReceived {
                channel_url: "ch_1".to_string(),
                sender_id: "u2".to_string(),
                message_type: None,
            },
            VendorEvent::ChannelDeleted {
                channel_url: "ch_1".to_string(),
            },
        ] {
            relay.handle(&session, event).await;
        }
        assert_eq!(relay.backend().calls().len(), 5);
    }

    #[tokio::test]
    async fn test_channel_deleted_soft_deletes() {
        let mut relay = Relay::new(RecordingBackend::default());
        relay
            .handle(
                &alice(),
                VendorEvent::ChannelDeleted {
                    channel_url: "ch_1".to_string(),
                },
            )
            .await;
        assert_eq!(
            relay.backend().calls(),
            vec![Call::DeleteChannel {
                channel_url: "ch_1".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn test_user_left_resets_selection_only_for_self() {
        let mut relay = Relay::new(RecordingBackend::default());
        relay.select_channel(Some("ch_1".to_string()));

        let left = |user_id: &str, channel_url: &str| VendorEvent::UserLeft {
            channel_url: channel_url.to_string(),
            user_id: user_id.to_string(),
        };

        relay.handle(&alice(), left("u2", "ch_1")).await;
        assert_eq!(relay.selected_channel(), Some("ch_1"));

        relay.handle(&alice(), left("u1", "ch_other")).await;
        assert_eq!(relay.selected_channel(), Some("ch_1"));

        relay.handle(&alice(), left("u1", "ch_1")).await;
        assert_eq!(relay.selected_channel(), None);

        assert!(relay.backend().calls().is_empty());
    }
}
